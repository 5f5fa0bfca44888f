//! Low-level file framing messages (`fileformat.proto`).

/// Container for one serialized block, raw or zlib-deflated.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Blob {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub raw: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
    /// Uncompressed size of the payload, set for both encodings.
    #[prost(int32, optional, tag = "2")]
    pub raw_size: ::core::option::Option<i32>,
    #[prost(bytes = "vec", optional, tag = "3")]
    pub zlib_data: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
}

/// Precedes every [`Blob`] and carries its type tag and byte length.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlobHeader {
    #[prost(string, required, tag = "1")]
    pub r#type: ::prost::alloc::string::String,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub indexdata: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
    #[prost(int32, required, tag = "3")]
    pub datasize: i32,
}
