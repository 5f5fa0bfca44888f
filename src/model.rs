//! Accessor interfaces through which entities are handed to the writer.
//!
//! The writer does not own an entity model; callers keep their own node,
//! way, and relation representations and expose them through these traits.
//! Entities are only borrowed for the duration of a single
//! [`PbfWriter`](crate::writer::PbfWriter) call.

/// Metadata common to all entity kinds, borrowed from the entity.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Meta<'l> {
    pub version: i32,
    pub visible: bool,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    pub changeset: i64,
    pub uid: i32,
    pub user: &'l str,
}

impl Default for Meta<'_> {
    #[inline]
    fn default() -> Self {
        Self {
            version: 0,
            visible: true,
            timestamp: 0,
            changeset: 0,
            uid: 0,
            user: "",
        }
    }
}

/// Accessors shared by nodes, ways and relations.
pub trait Element {
    fn id(&self) -> i64;
    fn meta(&self) -> Meta<'_>;
    fn tags(&self) -> impl Iterator<Item = (&str, &str)>;
}

pub trait Node: Element {
    /// Latitude in degrees.
    fn lat(&self) -> f64;
    /// Longitude in degrees.
    fn lon(&self) -> f64;
}

pub trait Way: Element {
    /// Ids of the member nodes, in order.
    fn refs(&self) -> impl Iterator<Item = i64>;
}

pub trait Relation: Element {
    fn members(&self) -> impl Iterator<Item = Member<'_>>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemberType {
    Node,
    Way,
    Relation,
}

/// One relation member, borrowed from the relation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Member<'l> {
    pub member_type: MemberType,
    pub member_id: i64,
    pub role: &'l str,
}

/// Classifies the input the entity stream was produced from.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FileType {
    #[default]
    Data,
    /// Multiple versions per object; readers must expect deleted entities.
    History,
}

impl FileType {
    #[inline]
    pub fn has_history(self) -> bool {
        matches!(self, FileType::History)
    }
}

/// Bounding box in degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bbox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

/// File-level metadata handed to [`PbfWriter::init`](crate::writer::PbfWriter::init).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeaderMeta {
    pub bbox: Option<Bbox>,
    /// Free-text provenance, e.g. the upstream data source.
    pub source: Option<String>,
}
