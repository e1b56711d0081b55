use serde_json::json;

use bids_channels::analysis::{
    analyze_configuration, configuration_summary, loop_over_entities, suffixes_with_set_type,
};
use bids_channels::config::SetType;

#[test]
fn flags_are_or_across_entries() {
    let flags = analyze_configuration(&json!({
        "T1w": {"plain_set": true},
        "dwi": {"named_set": {"ap": {}}}
    }));
    assert!(flags.has_plain_sets);
    assert!(flags.has_named_sets);
    assert!(!flags.has_sequential_sets);
    assert!(!flags.has_mixed_sets);
    assert!(flags.any());
}

#[test]
fn malformed_config_is_all_false() {
    for config in [json!(null), json!([1, 2]), json!("T1w"), json!({"T1w": 5})] {
        let flags = analyze_configuration(&config);
        assert!(!flags.any());
    }
}

#[test]
fn loop_over_forms() {
    assert_eq!(loop_over_entities(&json!({"loop_over": "subject"})), vec!["subject"]);
    assert_eq!(
        loop_over_entities(&json!({"loop_over": ["subject", "run"]})),
        vec!["subject", "run"]
    );
    assert_eq!(
        loop_over_entities(&json!({})),
        vec!["subject", "session", "run", "task"]
    );
    assert_eq!(
        loop_over_entities(&json!({"loop_over": 7})),
        vec!["subject", "session", "run", "task"]
    );
}

#[test]
fn summary_counts_per_set_type() {
    let config = json!({
        "loop_over": ["subject"],
        "T1w": {"plain_set": {}},
        "T2w": {"plain_set": {}},
        "bold": {"sequential_set": {}},
        "dwi": {"mixed_set": {}}
    });
    let summary = configuration_summary(&config);
    assert_eq!(summary.total, 4);
    assert_eq!(summary.loop_over, vec!["subject"]);
    let plain = summary.usage(SetType::Plain).unwrap();
    assert_eq!(plain.count, 2);
    assert_eq!(plain.suffixes, vec!["T1w", "T2w"]);
    assert_eq!(summary.usage(SetType::Named).unwrap().count, 0);
    assert_eq!(
        suffixes_with_set_type(&config, SetType::Mixed),
        vec!["dwi".to_string()]
    );
}
