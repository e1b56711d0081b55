use assert_matches::assert_matches;
use serde_json::json;

use bids_channels::error::BidsError;
use bids_channels::suffix::{SuffixMapping, build_suffix_mapping, output_suffix};

#[test]
fn mapping_registers_overrides() {
    let config = json!({
        "loop_over": ["subject", "session"],
        "dwi_fullreverse": {"named_set": {}, "suffix_maps_to": "dwi"},
        "T1w": {"plain_set": {}}
    });
    let mapping = build_suffix_mapping(&config).unwrap();
    assert_eq!(mapping.len(), 1);
    assert_eq!(mapping.resolve_config_key("dwi"), "dwi_fullreverse");
    assert_eq!(mapping.resolve_config_key("T1w"), "T1w");
}

#[test]
fn empty_mapping_is_identity() {
    let mapping = SuffixMapping::build(&json!({})).unwrap();
    assert!(mapping.is_empty());
    assert_eq!(mapping.resolve_config_key("bold"), "bold");
}

#[test]
fn non_map_config_yields_empty_mapping() {
    let mapping = SuffixMapping::build(&json!(["T1w"])).unwrap();
    assert!(mapping.is_empty());
}

#[test]
fn colliding_targets_are_rejected() {
    let config = json!({
        "dwi_a": {"plain_set": {}, "suffix_maps_to": "dwi"},
        "dwi_b": {"plain_set": {}, "suffix_maps_to": "dwi"}
    });
    let err = build_suffix_mapping(&config).unwrap_err();
    assert_matches!(err, BidsError::SuffixCollision { ref suffix, .. } if suffix == "dwi");
    assert!(err.is_config_error());
}

#[test]
fn override_shadowing_base_entry_is_rejected() {
    let config = json!({
        "dwi": {"plain_set": {}},
        "dwi_fullreverse": {"named_set": {}, "suffix_maps_to": "dwi"}
    });
    let err = build_suffix_mapping(&config).unwrap_err();
    assert_matches!(
        err,
        BidsError::SuffixCollision { ref first, ref second, .. }
            if first == "dwi" && second == "dwi_fullreverse"
    );
}

#[test]
fn self_targeting_override_is_not_a_collision() {
    let config = json!({"dwi": {"plain_set": {}, "suffix_maps_to": "dwi"}});
    let mapping = build_suffix_mapping(&config).unwrap();
    assert_eq!(mapping.resolve_config_key("dwi"), "dwi");
}

#[test]
fn output_suffix_without_override_is_key() {
    assert_eq!(output_suffix("bold", &json!({"sequential_set": {}})), "bold");
    assert_eq!(output_suffix("bold", &json!("not a map")), "bold");
    assert_eq!(
        output_suffix("epi_ap", &json!({"plain_set": {}, "suffix_maps_to": "epi"})),
        "epi"
    );
}
