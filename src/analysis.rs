//! Lenient inspection of a raw channel configuration.
//!
//! Nothing here fails: missing or wrong-typed sections contribute `false` or
//! empty results. Strict validation lives in [`crate::config::ChannelConfig`].

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::config::{LOOP_OVER, SetType, default_loop_over};

/// Which set types occur anywhere in a configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTypeFlags {
    pub has_plain_sets: bool,
    pub has_named_sets: bool,
    pub has_sequential_sets: bool,
    pub has_mixed_sets: bool,
}

impl SetTypeFlags {
    pub fn contains(&self, set_type: SetType) -> bool {
        match set_type {
            SetType::Plain => self.has_plain_sets,
            SetType::Named => self.has_named_sets,
            SetType::Sequential => self.has_sequential_sets,
            SetType::Mixed => self.has_mixed_sets,
        }
    }

    fn set(&mut self, set_type: SetType) {
        match set_type {
            SetType::Plain => self.has_plain_sets = true,
            SetType::Named => self.has_named_sets = true,
            SetType::Sequential => self.has_sequential_sets = true,
            SetType::Mixed => self.has_mixed_sets = true,
        }
    }

    pub fn any(&self) -> bool {
        SetType::ALL.into_iter().any(|set_type| self.contains(set_type))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTypeUsage {
    pub suffixes: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationSummary {
    pub flags: SetTypeFlags,
    pub loop_over: Vec<String>,
    pub by_set_type: BTreeMap<SetType, SetTypeUsage>,
    pub total: usize,
}

impl ConfigurationSummary {
    pub fn usage(&self, set_type: SetType) -> Option<&SetTypeUsage> {
        self.by_set_type.get(&set_type)
    }
}

pub fn analyze_configuration(config: &Value) -> SetTypeFlags {
    let mut flags = SetTypeFlags::default();
    for (_, entry) in entries(config) {
        for set_type in SetType::markers_in(entry) {
            flags.set(set_type);
        }
    }
    flags
}

/// Ordered grouping entities; `[subject, session, run, task]` when unset.
pub fn loop_over_entities(config: &Value) -> Vec<String> {
    match config.get(LOOP_OVER) {
        Some(Value::String(single)) => vec![single.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => default_loop_over(),
    }
}

/// Config keys using `set_type`, sorted.
pub fn suffixes_with_set_type(config: &Value, set_type: SetType) -> Vec<String> {
    entries(config)
        .filter(|(_, entry)| SetType::markers_in(entry).contains(&set_type))
        .map(|(key, _)| key.clone())
        .collect()
}

pub fn configuration_summary(config: &Value) -> ConfigurationSummary {
    let mut by_set_type = BTreeMap::new();
    let mut total = 0;
    for set_type in SetType::ALL {
        let suffixes = suffixes_with_set_type(config, set_type);
        total += suffixes.len();
        by_set_type.insert(
            set_type,
            SetTypeUsage {
                count: suffixes.len(),
                suffixes,
            },
        );
    }
    ConfigurationSummary {
        flags: analyze_configuration(config),
        loop_over: loop_over_entities(config),
        by_set_type,
        total,
    }
}

fn entries(config: &Value) -> impl Iterator<Item = (&String, &Value)> {
    config
        .as_object()
        .into_iter()
        .flatten()
        .filter(|(key, entry)| key.as_str() != LOOP_OVER && entry.is_object())
}
