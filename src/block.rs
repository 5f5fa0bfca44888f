use prost::encoding::encoded_len_varint;
use prost::Message;

use crate::delta::Delta;
use crate::model::{Element, MemberType, Node, Relation, Way};
use crate::proto::osmformat::{
    self, relation::MemberType as PbfMemberType, DenseInfo, DenseNodes, Info, PrimitiveBlock,
    PrimitiveGroup, StringTable,
};
use crate::scale::{lonlat_to_int, timestamp_to_int};
use crate::strings::StringTableBuilder;

/// The one in-flight primitive block.
///
/// Entities are appended with *interim* string ids and block-scoped delta
/// state; [`finish`](PrimitiveBlockBuilder::finish) finalizes the string
/// table, rewrites every stored interim id to its final id, stamps the
/// granularities onto the block and resets the builder for the next block.
pub(crate) struct PrimitiveBlockBuilder {
    groups: Vec<PrimitiveGroup>,
    // group cursors; each kind is created lazily and exists at most once
    nodes: Option<usize>,
    ways: Option<usize>,
    relations: Option<usize>,
    strings: StringTableBuilder,
    contents: u32,
    size: usize,

    metadata: bool,
    add_visible: bool,
    granularity: i32,
    date_granularity: i32,

    delta_id: Delta<i64>,
    delta_lat: Delta<i64>,
    delta_lon: Delta<i64>,
    delta_timestamp: Delta<i64>,
    delta_changeset: Delta<i64>,
    delta_uid: Delta<i64>,
    delta_user_sid: Delta<i64>,
}

impl PrimitiveBlockBuilder {
    pub fn new(metadata: bool, add_visible: bool, granularity: i32, date_granularity: i32) -> Self {
        Self {
            groups: Vec::new(),
            nodes: None,
            ways: None,
            relations: None,
            strings: StringTableBuilder::default(),
            contents: 0,
            size: 0,
            metadata,
            add_visible,
            granularity,
            date_granularity,
            delta_id: Delta::default(),
            delta_lat: Delta::default(),
            delta_lon: Delta::default(),
            delta_timestamp: Delta::default(),
            delta_changeset: Delta::default(),
            delta_uid: Delta::default(),
            delta_user_sid: Delta::default(),
        }
    }

    /// Number of entities appended since the last flush.
    #[inline]
    pub fn contents(&self) -> u32 {
        self.contents
    }

    /// Estimated serialized size of the block so far.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contents == 0
    }

    pub fn append_node<T: Node>(&mut self, node: &T) {
        let (keys, vals) = self.encode_tags(node);
        let info = self.encode_info(node);
        let pbf_node = osmformat::Node {
            id: node.id(),
            keys,
            vals,
            info,
            lat: lonlat_to_int(node.lat(), self.granularity),
            lon: lonlat_to_int(node.lon(), self.granularity),
        };
        self.size += embedded_len(&pbf_node);
        let idx = ensure_group(&mut self.nodes, &mut self.groups);
        self.groups[idx].nodes.push(pbf_node);
        self.contents += 1;
    }

    pub fn append_dense_node<T: Node>(&mut self, node: &T) {
        let id_delta = self.delta_id.update(node.id());
        let lon_delta = self
            .delta_lon
            .update(lonlat_to_int(node.lon(), self.granularity));
        let lat_delta = self
            .delta_lat
            .update(lonlat_to_int(node.lat(), self.granularity));
        let mut appended = sint64_len(id_delta) + sint64_len(lat_delta) + sint64_len(lon_delta);

        let idx = ensure_group(&mut self.nodes, &mut self.groups);
        let dense = self.groups[idx].dense.get_or_insert_with(DenseNodes::default);
        dense.id.push(id_delta);
        dense.lon.push(lon_delta);
        dense.lat.push(lat_delta);

        for (key, value) in node.tags() {
            let key_sid = self.strings.record(key) as i32;
            let value_sid = self.strings.record(value) as i32;
            dense.keys_vals.push(key_sid);
            dense.keys_vals.push(value_sid);
            appended += int32_len(key_sid) + int32_len(value_sid);
        }
        // every node is terminated, tagged or not
        dense.keys_vals.push(0);
        appended += 1;

        if self.metadata {
            let meta = node.meta();
            let timestamp_delta = self
                .delta_timestamp
                .update(timestamp_to_int(meta.timestamp, self.date_granularity));
            let changeset_delta = self.delta_changeset.update(meta.changeset);
            let uid_delta = self.delta_uid.update(meta.uid as i64) as i32;
            // recorded against the interim id; rewritten at finish
            let user_sid = self.strings.record(meta.user);
            let user_sid_delta = self.delta_user_sid.update(user_sid as i64) as i32;

            let denseinfo = dense.denseinfo.get_or_insert_with(DenseInfo::default);
            denseinfo.version.push(meta.version);
            if self.add_visible {
                denseinfo.visible.push(meta.visible);
                appended += 1;
            }
            denseinfo.timestamp.push(timestamp_delta);
            denseinfo.changeset.push(changeset_delta);
            denseinfo.uid.push(uid_delta);
            denseinfo.user_sid.push(user_sid_delta);
            appended += int32_len(meta.version)
                + sint64_len(timestamp_delta)
                + sint64_len(changeset_delta)
                + sint32_len(uid_delta)
                + sint32_len(user_sid_delta);
        }

        self.size += appended;
        self.contents += 1;
    }

    pub fn append_way<T: Way>(&mut self, way: &T) {
        let (keys, vals) = self.encode_tags(way);
        let info = self.encode_info(way);
        // way refs are delta-encoded locally, restarting at every way
        let mut delta_ref = Delta::default();
        let refs = way.refs().map(|id| delta_ref.update(id)).collect();
        let pbf_way = osmformat::Way {
            id: way.id(),
            keys,
            vals,
            info,
            refs,
        };
        self.size += embedded_len(&pbf_way);
        let idx = ensure_group(&mut self.ways, &mut self.groups);
        self.groups[idx].ways.push(pbf_way);
        self.contents += 1;
    }

    pub fn append_relation<T: Relation>(&mut self, relation: &T) {
        let (keys, vals) = self.encode_tags(relation);
        let info = self.encode_info(relation);
        let mut roles_sid = Vec::new();
        let mut memids = Vec::new();
        let mut types = Vec::new();
        let mut delta_memid = Delta::default();
        for member in relation.members() {
            roles_sid.push(self.strings.record(member.role) as i32);
            memids.push(delta_memid.update(member.member_id));
            let member_type = match member.member_type {
                MemberType::Node => PbfMemberType::Node,
                MemberType::Way => PbfMemberType::Way,
                MemberType::Relation => PbfMemberType::Relation,
            };
            types.push(member_type as i32);
        }
        let pbf_relation = osmformat::Relation {
            id: relation.id(),
            keys,
            vals,
            info,
            roles_sid,
            memids,
            types,
        };
        self.size += embedded_len(&pbf_relation);
        let idx = ensure_group(&mut self.relations, &mut self.groups);
        self.groups[idx].relations.push(pbf_relation);
        self.contents += 1;
    }

    /// Finalizes the string table, rewrites all interim string ids to final
    /// ids, and returns the completed block. The builder is reset and ready
    /// for the next block afterwards.
    pub fn finish(&mut self) -> PrimitiveBlock {
        let mut stringtable = StringTable::default();
        self.strings.finalize(&mut stringtable);
        self.remap_string_ids();

        let block = PrimitiveBlock {
            stringtable,
            primitivegroup: std::mem::take(&mut self.groups),
            granularity: Some(self.granularity),
            lat_offset: None,
            lon_offset: None,
            date_granularity: Some(self.date_granularity),
        };

        self.strings.clear();
        self.delta_id.clear();
        self.delta_lat.clear();
        self.delta_lon.clear();
        self.delta_timestamp.clear();
        self.delta_changeset.clear();
        self.delta_uid.clear();
        self.delta_user_sid.clear();
        self.contents = 0;
        self.size = 0;
        self.nodes = None;
        self.ways = None;
        self.relations = None;

        block
    }

    fn encode_tags<E: Element>(&mut self, element: &E) -> (Vec<u32>, Vec<u32>) {
        let mut keys = Vec::new();
        let mut vals = Vec::new();
        for (key, value) in element.tags() {
            keys.push(self.strings.record(key));
            vals.push(self.strings.record(value));
        }
        (keys, vals)
    }

    fn encode_info<E: Element>(&mut self, element: &E) -> Option<Info> {
        if !self.metadata {
            return None;
        }
        let meta = element.meta();
        Some(Info {
            version: Some(meta.version),
            timestamp: Some(timestamp_to_int(meta.timestamp, self.date_granularity)),
            changeset: Some(meta.changeset),
            uid: Some(meta.uid),
            user_sid: Some(self.strings.record(meta.user)),
            visible: self.add_visible.then_some(meta.visible),
        })
    }

    /// One pass over every stored interim string id, translating it to its
    /// final id.
    fn remap_string_ids(&mut self) {
        let strings = &self.strings;
        for group in &mut self.groups {
            for node in &mut group.nodes {
                remap_common(strings, &mut node.keys, &mut node.vals, node.info.as_mut());
            }
            if let Some(dense) = group.dense.as_mut() {
                // zero entries are node terminators, not string ids
                for key_value in &mut dense.keys_vals {
                    if *key_value != 0 {
                        *key_value = strings.map(*key_value as u32) as i32;
                    }
                }
                if let Some(denseinfo) = dense.denseinfo.as_mut() {
                    remap_dense_user_sids(strings, &mut denseinfo.user_sid);
                }
            }
            for way in &mut group.ways {
                remap_common(strings, &mut way.keys, &mut way.vals, way.info.as_mut());
            }
            for relation in &mut group.relations {
                remap_common(
                    strings,
                    &mut relation.keys,
                    &mut relation.vals,
                    relation.info.as_mut(),
                );
                for role_sid in &mut relation.roles_sid {
                    *role_sid = strings.map(*role_sid as u32) as i32;
                }
            }
        }
    }
}

fn remap_common(
    strings: &StringTableBuilder,
    keys: &mut [u32],
    vals: &mut [u32],
    info: Option<&mut Info>,
) {
    if let Some(info) = info {
        if let Some(user_sid) = info.user_sid {
            info.user_sid = Some(strings.map(user_sid));
        }
    }
    for key in keys {
        *key = strings.map(*key);
    }
    for value in vals {
        *value = strings.map(*value);
    }
}

/// The stored values are deltas over *interim* ids, which carry no ordering.
/// Undo the interim deltas and rebuild deltas over the final ids in a single
/// pass with two running sums.
fn remap_dense_user_sids(strings: &StringTableBuilder, user_sids: &mut [i32]) {
    let mut interim_prev: i64 = 0;
    let mut final_prev: i64 = 0;
    for stored in user_sids {
        let interim_cur = interim_prev + *stored as i64;
        let final_cur = strings.map(interim_cur as u32) as i64;
        *stored = (final_cur - final_prev) as i32;
        interim_prev = interim_cur;
        final_prev = final_cur;
    }
}

fn ensure_group(cursor: &mut Option<usize>, groups: &mut Vec<PrimitiveGroup>) -> usize {
    match *cursor {
        Some(idx) => idx,
        None => {
            groups.push(PrimitiveGroup::default());
            let idx = groups.len() - 1;
            *cursor = Some(idx);
            idx
        }
    }
}

/// Length of `msg` embedded as a length-delimited field.
fn embedded_len(msg: &impl Message) -> usize {
    let len = msg.encoded_len();
    1 + encoded_len_varint(len as u64) + len
}

#[inline]
fn sint64_len(value: i64) -> usize {
    encoded_len_varint(((value << 1) ^ (value >> 63)) as u64)
}

#[inline]
fn sint32_len(value: i32) -> usize {
    sint64_len(value as i64)
}

#[inline]
fn int32_len(value: i32) -> usize {
    encoded_len_varint(value as i64 as u64)
}
