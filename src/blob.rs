use byteorder::{BigEndian, WriteBytesExt};
use flate2::{Compress, Compression, FlushCompress, Status};
use log::debug;
use prost::Message;
use std::io;

use crate::error::{Error, Result};
use crate::proto::fileformat::{Blob as PbfBlob, BlobHeader as PbfBlobHeader};

pub(crate) const MAX_UNCOMPRESSED_DATA_SIZE: usize = 32 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlobType {
    OSMHeader,
    OSMData,
}

impl BlobType {
    fn as_str(&self) -> &'static str {
        match self {
            Self::OSMHeader => "OSMHeader",
            Self::OSMData => "OSMData",
        }
    }
}

/// Frames serialized block messages into the blob stream.
///
/// Every emitted blob is three consecutive writes: the big-endian 32-bit
/// length of the `BlobHeader`, the `BlobHeader` itself, and the `Blob`
/// payload. A failed write leaves the stream in an undefined state; the
/// writer must be discarded.
pub(crate) struct BlobWriter<W: io::Write> {
    out: W,
    compress: bool,
}

impl<W: io::Write> BlobWriter<W> {
    pub fn new(out: W, compress: bool) -> Self {
        Self { out, compress }
    }

    /// Serializes `msg`, optionally deflates it, and writes one framed blob.
    pub fn emit<M: Message>(&mut self, blob_type: BlobType, msg: &M) -> Result<()> {
        let raw = msg.encode_to_vec();
        if raw.len() > MAX_UNCOMPRESSED_DATA_SIZE {
            return Err(Error::BlobDataToLarge(raw.len()));
        }

        let blob = if self.compress {
            let compressed = zlib_compress(&raw)?;
            debug!(
                "pack {} bytes to {} bytes (1:{:.2})",
                raw.len(),
                compressed.len(),
                raw.len() as f64 / compressed.len() as f64
            );
            PbfBlob {
                raw: None,
                raw_size: Some(raw.len() as i32),
                zlib_data: Some(compressed),
            }
        } else {
            debug!("store uncompressed {} bytes", raw.len());
            PbfBlob {
                raw_size: Some(raw.len() as i32),
                raw: Some(raw),
                zlib_data: None,
            }
        };
        let blob_bytes = blob.encode_to_vec();

        let header = PbfBlobHeader {
            r#type: blob_type.as_str().to_owned(),
            indexdata: None,
            datasize: blob_bytes.len() as i32,
        };
        let hdr_bytes = header.encode_to_vec();

        self.out.write_u32::<BigEndian>(hdr_bytes.len() as u32)?;
        self.out.write_all(&hdr_bytes)?;
        self.out.write_all(&blob_bytes)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    #[inline]
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Deflates `raw` at the default level into a fresh buffer.
fn zlib_compress(raw: &[u8]) -> Result<Vec<u8>> {
    let mut deflate = Compress::new(Compression::default(), true);
    let mut out = Vec::with_capacity(raw.len() / 2 + 64);
    loop {
        let consumed = deflate.total_in() as usize;
        match deflate.compress_vec(&raw[consumed..], &mut out, FlushCompress::Finish)? {
            Status::StreamEnd => return Ok(out),
            // output buffer exhausted
            Status::Ok | Status::BufError => {
                let grow = out.capacity().max(4096);
                out.reserve(grow);
            }
        }
    }
}
