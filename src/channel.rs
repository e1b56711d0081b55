use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{NA, normalize_entity_name, short_to_long};

/// Per-group accumulator of suffix payloads, file paths and entity values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelData {
    data: BTreeMap<String, Value>,
    file_paths: Vec<String>,
    entities: BTreeMap<String, String>,
    parent_dir: String,
}

/// Rendered group: the grouping key plus its enriched record.
///
/// Serializes as `[groupingKey, record]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelTuple(pub Vec<String>, pub EnrichedRecord);

impl ChannelTuple {
    pub fn grouping_key(&self) -> &[String] {
        &self.0
    }

    pub fn record(&self) -> &EnrichedRecord {
        &self.1
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedRecord {
    pub data: BTreeMap<String, Value>,
    pub file_paths: Vec<String>,
    pub bids_parent_dir: String,
    /// Loop-over entities keyed by long name, valued `<short>-<value>` or `NA`.
    #[serde(flatten)]
    pub entities: BTreeMap<String, String>,
}

impl EnrichedRecord {
    pub fn entity(&self, long_name: &str) -> Option<&str> {
        self.entities.get(long_name).map(String::as_str)
    }
}

impl ChannelData {
    pub fn new(parent_dir: impl Into<String>) -> Self {
        Self {
            parent_dir: parent_dir.into(),
            ..Self::default()
        }
    }

    /// Stores `payload` under `suffix`; empty suffixes and null payloads are ignored.
    pub fn add_suffix_data(&mut self, suffix: &str, payload: Value) {
        if suffix.is_empty() || payload.is_null() {
            return;
        }
        self.data.insert(suffix.to_string(), payload);
    }

    pub fn add_file_path(&mut self, path: &str) {
        if path.is_empty() || self.file_paths.iter().any(|existing| existing == path) {
            return;
        }
        self.file_paths.push(path.to_string());
    }

    pub fn add_file_paths<'p>(&mut self, paths: impl IntoIterator<Item = &'p str>) {
        for path in paths {
            self.add_file_path(path);
        }
    }

    pub fn add_entity(&mut self, name: &str, value: &str) {
        if name.is_empty() || value.is_empty() {
            return;
        }
        self.entities.insert(name.to_string(), value.to_string());
    }

    pub fn is_valid(&self) -> bool {
        !self.data.is_empty() && !self.entities.is_empty()
    }

    pub fn data(&self) -> &BTreeMap<String, Value> {
        &self.data
    }

    pub fn file_paths(&self) -> &[String] {
        &self.file_paths
    }

    pub fn entities(&self) -> &BTreeMap<String, String> {
        &self.entities
    }

    pub fn parent_dir(&self) -> &str {
        &self.parent_dir
    }

    /// Consumes the accumulator and renders it.
    ///
    /// `loop_over` names may be short or long. The grouping key holds
    /// `<short>-<value>` or `NA` per name; the record carries the same values
    /// under the long names.
    pub fn to_channel_tuple<S: AsRef<str>>(self, loop_over: &[S]) -> ChannelTuple {
        let mut grouping_key = Vec::with_capacity(loop_over.len());
        let mut entities = BTreeMap::new();

        for name in loop_over {
            let short = normalize_entity_name(name.as_ref());
            let long = short_to_long(short);
            let rendered = self
                .entity_value(short, long)
                .map(|value| format!("{short}-{value}"))
                .unwrap_or_else(|| NA.to_string());
            entities.insert(long.to_string(), rendered.clone());
            grouping_key.push(rendered);
        }

        ChannelTuple(
            grouping_key,
            EnrichedRecord {
                data: self.data,
                file_paths: self.file_paths,
                bids_parent_dir: self.parent_dir,
                entities,
            },
        )
    }

    fn entity_value(&self, short: &str, long: &str) -> Option<&str> {
        self.entities
            .get(short)
            .or_else(|| self.entities.get(long))
            .map(String::as_str)
            .filter(|value| !value.is_empty() && *value != NA)
    }
}
