use log::debug;
use std::io;

use crate::blob::{BlobType, BlobWriter, MAX_UNCOMPRESSED_DATA_SIZE};
use crate::block::PrimitiveBlockBuilder;
use crate::error::{Error, Result};
use crate::header::build_header_block;
use crate::model::{FileType, HeaderMeta, Node, Relation, Way};

/// Maximum number of entities in a primitive block.
///
/// A block may contain any number of entities as long as the blob size
/// limits are obeyed; 8k per block matches what Osmosis and Osmium emit.
const MAX_BLOCK_CONTENTS: u32 = 8000;

/// The block is flushed once its estimated size reaches this share of the
/// blob limit. The remainder is headroom for the string table, which
/// typically needs a fraction of a percent of the block size.
const BUFFER_FILL_PERCENT: usize = 95;

const BLOCK_SIZE_LIMIT: usize = MAX_UNCOMPRESSED_DATA_SIZE / 100 * BUFFER_FILL_PERCENT;

/// Configuration for a [`PbfWriter`].
#[derive(Clone, Debug)]
pub struct Options {
    dense_nodes: bool,
    compression: bool,
    metadata: bool,
    add_visible: Option<bool>,
    location_granularity: i32,
    date_granularity: i32,
    writing_program: String,
    file_type: FileType,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            dense_nodes: true,
            compression: true,
            metadata: true,
            add_visible: None,
            location_granularity: 100,
            date_granularity: 1000,
            writing_program: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))
                .to_owned(),
            file_type: FileType::Data,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store nodes in the dense column layout (default) or as individual
    /// node records.
    pub fn dense_nodes(mut self, dense_nodes: bool) -> Self {
        self.dense_nodes = dense_nodes;
        self
    }

    /// Deflate blob payloads with zlib. Disabling this speeds up writing a
    /// little, at two to three times the output size.
    pub fn compression(mut self, compression: bool) -> Self {
        self.compression = compression;
        self
    }

    /// Emit version/timestamp/changeset/uid/user info with every entity.
    pub fn metadata(mut self, metadata: bool) -> Self {
        self.metadata = metadata;
        self
    }

    /// Include the visible flag in entity info. When not set explicitly,
    /// the flag is included exactly for history input.
    pub fn add_visible(mut self, add_visible: bool) -> Self {
        self.add_visible = Some(add_visible);
        self
    }

    /// Nanodegrees per coordinate unit. The default of 100 corresponds to
    /// about 1cm at the equator, the resolution of the OSM database.
    pub fn location_granularity(mut self, granularity: i32) -> Self {
        self.location_granularity = granularity;
        self
    }

    /// Milliseconds per timestamp unit (default 1000).
    pub fn date_granularity(mut self, granularity: i32) -> Self {
        self.date_granularity = granularity;
        self
    }

    /// Program name stored in the header block.
    pub fn writing_program(mut self, writing_program: impl Into<String>) -> Self {
        self.writing_program = writing_program.into();
        self
    }

    pub fn file_type(mut self, file_type: FileType) -> Self {
        self.file_type = file_type;
        self
    }
}

/// Capability set of an OSM entity sink.
///
/// Output formats implement this instead of inheriting from a shared base;
/// picking a format is plain construction at the call site.
pub trait OsmOutput {
    fn init(&mut self, meta: &HeaderMeta) -> Result<()>;
    fn node(&mut self, node: &impl Node) -> Result<()>;
    fn way(&mut self, way: &impl Way) -> Result<()>;
    fn relation(&mut self, relation: &impl Relation) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}

/// Streaming `.osm.pbf` encoder.
///
/// Entities are buffered into one in-flight primitive block and flushed as
/// framed blobs once the block reaches its entity or size threshold.
/// [`init`](PbfWriter::init) must be called once before the first entity;
/// [`finish`](PbfWriter::finish) flushes the remainder.
///
/// The writer is a sequential state machine: it is not `Sync`-aware, no
/// operation suspends, and after any error the instance must be discarded
/// together with its partially written output.
pub struct PbfWriter<W: io::Write> {
    blob: BlobWriter<W>,
    block: PrimitiveBlockBuilder,
    dense_nodes: bool,
    history: bool,
    writing_program: String,
    header_written: bool,
    finished: bool,
}

impl<W: io::Write> PbfWriter<W> {
    pub fn new(out: W, options: Options) -> Self {
        let history = options.file_type.has_history();
        let add_visible = options.add_visible.unwrap_or(history);
        Self {
            blob: BlobWriter::new(out, options.compression),
            block: PrimitiveBlockBuilder::new(
                options.metadata,
                add_visible,
                options.location_granularity,
                options.date_granularity,
            ),
            dense_nodes: options.dense_nodes,
            history,
            writing_program: options.writing_program,
            header_written: false,
            finished: false,
        }
    }

    /// Writes the header blob: schema features, writing program, and the
    /// bounding box when `meta` carries one.
    pub fn init(&mut self, meta: &HeaderMeta) -> Result<()> {
        if self.finished {
            return Err(Error::SchemaError("the writer is already finished"));
        }
        if self.header_written {
            return Err(Error::SchemaError("the header block was already written"));
        }
        debug!("storing header block");
        let header =
            build_header_block(meta, self.dense_nodes, self.history, &self.writing_program);
        self.blob.emit(BlobType::OSMHeader, &header)?;
        self.header_written = true;
        Ok(())
    }

    pub fn node(&mut self, node: &impl Node) -> Result<()> {
        self.maybe_flush()?;
        if self.dense_nodes {
            self.block.append_dense_node(node);
        } else {
            self.block.append_node(node);
        }
        Ok(())
    }

    pub fn way(&mut self, way: &impl Way) -> Result<()> {
        self.maybe_flush()?;
        self.block.append_way(way);
        Ok(())
    }

    pub fn relation(&mut self, relation: &impl Relation) -> Result<()> {
        self.maybe_flush()?;
        self.block.append_relation(relation);
        Ok(())
    }

    /// Flushes the in-flight block if it has any contents and flushes the
    /// underlying sink. Further calls are no-ops.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        if !self.block.is_empty() {
            self.store_block()?;
        }
        self.blob.flush()?;
        self.finished = true;
        Ok(())
    }

    /// Returns the underlying sink.
    #[inline]
    pub fn into_inner(self) -> W {
        self.blob.into_inner()
    }

    /// Flushes the block when either threshold is reached, before the next
    /// entity is appended.
    fn maybe_flush(&mut self) -> Result<()> {
        if self.finished {
            return Err(Error::SchemaError("the writer is already finished"));
        }
        if !self.header_written {
            return Err(Error::SchemaError(
                "the header block must be written before any entity",
            ));
        }
        if self.block.contents() >= MAX_BLOCK_CONTENTS || self.block.size() >= BLOCK_SIZE_LIMIT {
            self.store_block()?;
        }
        Ok(())
    }

    fn store_block(&mut self) -> Result<()> {
        debug!(
            "storing primitive block with {} items ({} bytes)",
            self.block.contents(),
            self.block.size()
        );
        let block = self.block.finish();
        self.blob.emit(BlobType::OSMData, &block)
    }
}

impl<W: io::Write> OsmOutput for PbfWriter<W> {
    fn init(&mut self, meta: &HeaderMeta) -> Result<()> {
        PbfWriter::init(self, meta)
    }
    fn node(&mut self, node: &impl Node) -> Result<()> {
        PbfWriter::node(self, node)
    }
    fn way(&mut self, way: &impl Way) -> Result<()> {
        PbfWriter::way(self, way)
    }
    fn relation(&mut self, relation: &impl Relation) -> Result<()> {
        PbfWriter::relation(self, relation)
    }
    fn finish(&mut self) -> Result<()> {
        PbfWriter::finish(self)
    }
}
