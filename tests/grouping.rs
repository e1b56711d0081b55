use std::collections::BTreeMap;

use proptest::prelude::*;

use bids_channels::domain::FileRecord;
use bids_channels::entity::NA;
use bids_channels::grouping::{
    EntityGroups, create_comparison_key, create_grouping_key, extract_entity_values,
    filter_by_entities, group_by_entity, group_by_multiple_entities, has_consistent_entities,
    sort_by_entity,
};

fn record(path: &str, entities: &[(&str, &str)]) -> FileRecord {
    entities
        .iter()
        .fold(FileRecord::new(path, "bold"), |record, (name, value)| {
            record.with_entity(name, value)
        })
}

fn sample() -> Vec<FileRecord> {
    vec![
        record("a", &[("sub", "01"), ("ses", "01"), ("run", "1")]),
        record("b", &[("sub", "01"), ("ses", "02"), ("run", "10")]),
        record("c", &[("sub", "02"), ("ses", "01"), ("run", "2")]),
        record("d", &[("sub", "02")]),
    ]
}

fn paths(files: &[&FileRecord]) -> Vec<String> {
    files.iter().map(|file| file.path.clone()).collect()
}

#[test]
fn filter_treats_empty_and_na_as_wildcards() {
    let files = sample();
    let filter = BTreeMap::from([("sub", "02"), ("ses", NA), ("run", "")]);
    assert_eq!(paths(&filter_by_entities(&files, &filter)), vec!["c", "d"]);

    let strict = BTreeMap::from([("sub", "01"), ("ses", "02")]);
    assert_eq!(paths(&filter_by_entities(&files, &strict)), vec!["b"]);
}

#[test]
fn empty_filter_keeps_everything() {
    let files = sample();
    let filter = BTreeMap::<String, String>::new();
    assert_eq!(filter_by_entities(&files, &filter).len(), files.len());
}

#[test]
fn missing_values_land_in_na_bucket() {
    let files = sample();
    let groups = group_by_entity(&files, "ses");
    assert_eq!(paths(&groups["01"]), vec!["a", "c"]);
    assert_eq!(paths(&groups["02"]), vec!["b"]);
    assert_eq!(paths(&groups[NA]), vec!["d"]);
}

#[test]
fn nested_grouping_refines() {
    let files = sample();
    let groups = group_by_multiple_entities(&files, &["sub", "ses"]);
    assert_eq!(groups.file_count(), 4);

    let leaves = groups.leaves();
    let keys = leaves.iter().map(|(key, _)| key.clone()).collect::<Vec<_>>();
    assert_eq!(
        keys,
        vec![
            vec!["01", "01"],
            vec!["01", "02"],
            vec!["02", "01"],
            vec!["02", NA],
        ]
    );
}

#[test]
fn nested_grouping_without_names_is_identity() {
    let files = sample();
    let names: [&str; 0] = [];
    match group_by_multiple_entities(&files, &names) {
        EntityGroups::Files(leaf) => assert_eq!(paths(&leaf), vec!["a", "b", "c", "d"]),
        EntityGroups::Nested(_) => panic!("expected a single leaf"),
    }
}

#[test]
fn extraction_keeps_order_and_substitutes_na() {
    let files = sample();
    assert_eq!(
        extract_entity_values(&files[3], &["run", "sub", "ses"]),
        vec!["NA", "02", "NA"]
    );
    assert_eq!(create_grouping_key(&files[0], &["sub", "ses"]), vec!["01", "01"]);
    assert_eq!(create_comparison_key(&files[0], &["sub", "ses", "task"]), "01|01|NA");
}

#[test]
fn consistency_compares_against_first() {
    let files = sample();
    assert!(has_consistent_entities(&files[..2], &["sub"]));
    assert!(!has_consistent_entities(&files[..2], &["sub", "ses"]));
    assert!(has_consistent_entities(&files[..0], &["sub"]));
}

#[test]
fn sort_is_numeric_for_digit_values() {
    let files = sample();
    let sorted = sort_by_entity(&files, "run");
    assert_eq!(paths(&sorted), vec!["a", "c", "b", "d"]);
}

#[test]
fn sort_is_lexicographic_otherwise() {
    let files = vec![
        record("x", &[("acq", "b10")]),
        record("y", &[("acq", "b2")]),
        record("z", &[("acq", "a")]),
    ];
    assert_eq!(paths(&sort_by_entity(&files, "acq")), vec!["z", "x", "y"]);
}

fn arb_files() -> impl Strategy<Value = Vec<FileRecord>> {
    let value = prop_oneof![Just(""), Just("01"), Just("02"), Just("10")];
    prop::collection::vec((value.clone(), value.clone(), value), 0..40).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(idx, (sub, ses, run))| {
                record(&format!("f{idx}"), &[("sub", sub), ("ses", ses), ("run", run)])
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn group_by_entity_is_a_partition(files in arb_files()) {
        let groups = group_by_entity(&files, "ses");
        let total: usize = groups.values().map(Vec::len).sum();
        prop_assert_eq!(total, files.len());
    }

    #[test]
    fn nested_grouping_preserves_leaf_count(files in arb_files()) {
        let groups = group_by_multiple_entities(&files, &["sub", "ses", "run"]);
        prop_assert_eq!(groups.file_count(), files.len());
    }

    #[test]
    fn extraction_length_matches_names(files in arb_files()) {
        let names = ["sub", "task", "run"];
        for file in &files {
            let values = extract_entity_values(file, &names);
            prop_assert_eq!(values.len(), names.len());
            prop_assert_eq!(values[1].as_str(), NA);
        }
    }
}
