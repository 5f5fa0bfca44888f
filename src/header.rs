use crate::model::HeaderMeta;
use crate::proto::osmformat::{HeaderBBox, HeaderBlock as PbfHeaderBlock};
use crate::scale::lonlat_to_nano;

// REQUIRED FEATURES
pub const OSM_SCHEMA_V0_6: &str = "OsmSchema-V0.6";
pub const DENSE_NODES: &str = "DenseNodes";
pub const HISTORICAL_INFORMATION: &str = "HistoricalInformation";

/// Assembles the header block that precedes all data blobs.
///
/// Feature order is fixed (schema, dense nodes, history) so that identical
/// configurations produce identical headers.
pub(crate) fn build_header_block(
    meta: &HeaderMeta,
    dense_nodes: bool,
    history: bool,
    writing_program: &str,
) -> PbfHeaderBlock {
    let mut required_features = vec![OSM_SCHEMA_V0_6.to_owned()];
    if dense_nodes {
        required_features.push(DENSE_NODES.to_owned());
    }
    if history {
        required_features.push(HISTORICAL_INFORMATION.to_owned());
    }

    PbfHeaderBlock {
        bbox: meta.bbox.map(|bbox| HeaderBBox {
            left: lonlat_to_nano(bbox.min_lon),
            right: lonlat_to_nano(bbox.max_lon),
            top: lonlat_to_nano(bbox.max_lat),
            bottom: lonlat_to_nano(bbox.min_lat),
        }),
        required_features,
        optional_features: Vec::new(),
        writingprogram: Some(writing_program.to_owned()),
        source: meta.source.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Bbox;

    #[test]
    fn default_features_are_schema_and_dense_nodes() {
        let header = build_header_block(&HeaderMeta::default(), true, false, "test");
        assert_eq!(
            header.required_features,
            [OSM_SCHEMA_V0_6, DENSE_NODES]
        );
        assert!(header.bbox.is_none());
        assert_eq!(header.writingprogram.as_deref(), Some("test"));
        assert!(header.source.is_none());
    }

    #[test]
    fn sparse_history_file_advertises_history_only() {
        let header = build_header_block(&HeaderMeta::default(), false, true, "test");
        assert_eq!(
            header.required_features,
            [OSM_SCHEMA_V0_6, HISTORICAL_INFORMATION]
        );
    }

    #[test]
    fn bbox_corners_are_scaled_to_nanodegrees() {
        let meta = HeaderMeta {
            bbox: Some(Bbox {
                min_lon: -0.5,
                min_lat: 51.0,
                max_lon: 0.5,
                max_lat: 52.0,
            }),
            source: Some("test-fixture".to_owned()),
        };
        let header = build_header_block(&meta, true, false, "test");
        let bbox = header.bbox.expect("bbox");
        assert_eq!(bbox.left, -500_000_000);
        assert_eq!(bbox.right, 500_000_000);
        assert_eq!(bbox.top, 52_000_000_000);
        assert_eq!(bbox.bottom, 51_000_000_000);
        assert_eq!(header.source.as_deref(), Some("test-fixture"));
    }
}
