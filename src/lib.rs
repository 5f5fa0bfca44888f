//! A streaming writer for the OpenStreetMap PBF format (`*.osm.pbf`).
//!
//! Entities are handed to a [`PbfWriter`] through the accessor traits in
//! [`model`] and accumulated into size-bounded primitive blocks. Each block
//! carries its own string table (sorted by use count, so frequent strings
//! get short varint ids), dense nodes are delta-encoded column-wise, and
//! finished blocks are zlib-deflated and framed as length-prefixed blobs.
//!
//! # Example
//!
//! ```
//! use osm_pbf_writer::{HeaderMeta, Options, PbfWriter};
//!
//! # fn main() -> osm_pbf_writer::Result<()> {
//! let mut writer = PbfWriter::new(Vec::new(), Options::default());
//! writer.init(&HeaderMeta::default())?;
//! // writer.node(&n)?; writer.way(&w)?; writer.relation(&r)?;
//! writer.finish()?;
//! let bytes = writer.into_inner();
//! # assert!(!bytes.is_empty());
//! # Ok(())
//! # }
//! ```

mod blob;
mod block;
mod delta;
pub mod error;
pub mod header;
pub mod model;
pub mod proto;
mod scale;
mod strings;
pub mod writer;

pub use error::{Error, Result};
pub use model::{Bbox, Element, FileType, HeaderMeta, Member, MemberType, Meta, Node, Relation, Way};
pub use writer::{Options, OsmOutput, PbfWriter};
