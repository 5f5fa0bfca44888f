use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    CompressionError(#[from] flate2::CompressError),

    // The uncompressed length of a Blob [..] must be less than 32 MiB.
    // https://wiki.openstreetmap.org/wiki/PBF_Format
    #[error("Invalid Output: the uncompressed size of the `Blob` ({0} bytes) is to large")]
    BlobDataToLarge(usize),

    #[error("Invalid call sequence: {0}")]
    SchemaError(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
