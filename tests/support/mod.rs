//! Shared fixtures: owned sample entities implementing the writer's accessor
//! traits, and a decoder that walks the framed blob stream back into blocks.

use byteorder::{BigEndian, ReadBytesExt};
use osm_pbf_writer::proto::fileformat::{Blob, BlobHeader};
use osm_pbf_writer::proto::osmformat::{HeaderBlock, PrimitiveBlock};
use osm_pbf_writer::{Element, Member, MemberType, Meta};
use prost::Message;
use std::io::Read;

#[derive(Clone, Debug)]
pub struct SampleMeta {
    pub version: i32,
    pub visible: bool,
    pub timestamp: i64,
    pub changeset: i64,
    pub uid: i32,
    pub user: String,
}

impl Default for SampleMeta {
    fn default() -> Self {
        Self {
            version: 1,
            visible: true,
            timestamp: 0,
            changeset: 0,
            uid: 0,
            user: String::new(),
        }
    }
}

impl SampleMeta {
    fn as_meta(&self) -> Meta<'_> {
        Meta {
            version: self.version,
            visible: self.visible,
            timestamp: self.timestamp,
            changeset: self.changeset,
            uid: self.uid,
            user: &self.user,
        }
    }
}

macro_rules! impl_element {
    ($kind:ty) => {
        impl Element for $kind {
            fn id(&self) -> i64 {
                self.id
            }
            fn meta(&self) -> Meta<'_> {
                self.meta.as_meta()
            }
            fn tags(&self) -> impl Iterator<Item = (&str, &str)> {
                self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
            }
        }
    };
}

#[derive(Clone, Debug)]
pub struct SampleNode {
    pub id: i64,
    pub lon: f64,
    pub lat: f64,
    pub tags: Vec<(String, String)>,
    pub meta: SampleMeta,
}

impl_element!(SampleNode);

impl osm_pbf_writer::Node for SampleNode {
    fn lat(&self) -> f64 {
        self.lat
    }
    fn lon(&self) -> f64 {
        self.lon
    }
}

#[derive(Clone, Debug)]
pub struct SampleWay {
    pub id: i64,
    pub refs: Vec<i64>,
    pub tags: Vec<(String, String)>,
    pub meta: SampleMeta,
}

impl_element!(SampleWay);

impl osm_pbf_writer::Way for SampleWay {
    fn refs(&self) -> impl Iterator<Item = i64> {
        self.refs.iter().copied()
    }
}

#[derive(Clone, Debug)]
pub struct SampleRelation {
    pub id: i64,
    pub members: Vec<(MemberType, i64, String)>,
    pub tags: Vec<(String, String)>,
    pub meta: SampleMeta,
}

impl_element!(SampleRelation);

impl osm_pbf_writer::Relation for SampleRelation {
    fn members(&self) -> impl Iterator<Item = Member<'_>> {
        self.members
            .iter()
            .map(|(member_type, member_id, role)| Member {
                member_type: *member_type,
                member_id: *member_id,
                role,
            })
    }
}

pub fn node(id: i64, lon: f64, lat: f64, tags: &[(&str, &str)]) -> SampleNode {
    SampleNode {
        id,
        lon,
        lat,
        tags: owned_tags(tags),
        meta: SampleMeta::default(),
    }
}

pub fn way(id: i64, refs: &[i64], tags: &[(&str, &str)]) -> SampleWay {
    SampleWay {
        id,
        refs: refs.to_vec(),
        tags: owned_tags(tags),
        meta: SampleMeta::default(),
    }
}

pub fn relation(
    id: i64,
    members: &[(MemberType, i64, &str)],
    tags: &[(&str, &str)],
) -> SampleRelation {
    SampleRelation {
        id,
        members: members
            .iter()
            .map(|(member_type, member_id, role)| (*member_type, *member_id, (*role).to_owned()))
            .collect(),
        tags: owned_tags(tags),
        meta: SampleMeta::default(),
    }
}

fn owned_tags(tags: &[(&str, &str)]) -> Vec<(String, String)> {
    tags.iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

/// One decoded frame: the blob type and the uncompressed payload.
pub struct Frame {
    pub blob_type: String,
    pub payload: Vec<u8>,
    pub compressed: bool,
}

/// Walks the framed stream: 4-byte big-endian header size, `BlobHeader`,
/// `Blob`; inflating zlib payloads and checking `raw_size` on the way.
pub fn read_frames(bytes: &[u8]) -> Vec<Frame> {
    let mut cursor = std::io::Cursor::new(bytes);
    let mut frames = Vec::new();
    while (cursor.position() as usize) < bytes.len() {
        let hdr_size = cursor.read_u32::<BigEndian>().unwrap() as usize;
        let mut hdr_bytes = vec![0; hdr_size];
        cursor.read_exact(&mut hdr_bytes).unwrap();
        let header = BlobHeader::decode(hdr_bytes.as_slice()).unwrap();

        let mut blob_bytes = vec![0; header.datasize as usize];
        cursor.read_exact(&mut blob_bytes).unwrap();
        let blob = Blob::decode(blob_bytes.as_slice()).unwrap();

        let (payload, compressed) = match (blob.raw, blob.zlib_data) {
            (Some(raw), None) => (raw, false),
            (None, Some(deflated)) => {
                let mut inflated = Vec::new();
                flate2::read::ZlibDecoder::new(deflated.as_slice())
                    .read_to_end(&mut inflated)
                    .unwrap();
                (inflated, true)
            }
            other => panic!("blob carries no usable payload: {other:?}"),
        };
        assert_eq!(blob.raw_size, Some(payload.len() as i32));
        frames.push(Frame {
            blob_type: header.r#type,
            payload,
            compressed,
        });
    }
    frames
}

/// Decodes a complete output file into its header and data blocks.
pub fn decode_file(bytes: &[u8]) -> (HeaderBlock, Vec<PrimitiveBlock>) {
    let frames = read_frames(bytes);
    let (first, rest) = frames.split_first().expect("missing header blob");
    assert_eq!(first.blob_type, "OSMHeader");
    let header = HeaderBlock::decode(first.payload.as_slice()).unwrap();
    let blocks = rest
        .iter()
        .map(|frame| {
            assert_eq!(frame.blob_type, "OSMData");
            PrimitiveBlock::decode(frame.payload.as_slice()).unwrap()
        })
        .collect();
    (header, blocks)
}

/// Undoes delta encoding.
pub fn cumulative(deltas: &[i64]) -> Vec<i64> {
    let mut sum = 0;
    deltas
        .iter()
        .map(|delta| {
            sum += delta;
            sum
        })
        .collect()
}

pub fn cumulative_i32(deltas: &[i32]) -> Vec<i64> {
    cumulative(&deltas.iter().map(|&d| d as i64).collect::<Vec<_>>())
}

pub fn table_strings(block: &PrimitiveBlock) -> Vec<String> {
    block
        .stringtable
        .s
        .iter()
        .map(|row| String::from_utf8(row.clone()).unwrap())
        .collect()
}
