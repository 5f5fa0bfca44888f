//! Hand-maintained transcriptions of the published OSMPBF protobuf schemas
//! (`fileformat.proto` and `osmformat.proto`). Field numbers and wire types
//! are normative; only the messages this crate emits are transcribed.

pub mod fileformat;
pub mod osmformat;
