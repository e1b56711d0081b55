use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;

use crate::channel::{ChannelData, ChannelTuple};
use crate::config::{ChannelConfig, SetType, SuffixEntry};
use crate::domain::{Dataset, FileRecord};
use crate::entity::{NA, is_known_entity, normalize_entity_name};
use crate::error::BidsError;
use crate::grouping::{create_grouping_key, sort_by_entity};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingResult {
    pub channels: Vec<ChannelTuple>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Builds the payload a configuration entry contributes to one group.
///
/// The set-type policies plug in here; returning `None` leaves the suffix out
/// of the group.
pub trait PayloadBuilder {
    fn build(&self, entry: &SuffixEntry, files: &[&FileRecord]) -> Option<Value>;
}

/// Emits the file path for a single file, or the sorted path list otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathPayload;

impl PayloadBuilder for PathPayload {
    fn build(&self, _entry: &SuffixEntry, files: &[&FileRecord]) -> Option<Value> {
        match files {
            [] => None,
            [single] => Some(Value::String(single.path.clone())),
            many => {
                let ordered = sort_by_entity(many.iter().copied(), "run");
                Some(Value::Array(
                    ordered
                        .into_iter()
                        .map(|file| Value::String(file.path.clone()))
                        .collect(),
                ))
            }
        }
    }
}

#[derive(Clone)]
pub struct App<P: PayloadBuilder> {
    payloads: P,
}

impl<P: PayloadBuilder> App<P> {
    pub fn new(payloads: P) -> Self {
        Self { payloads }
    }

    pub fn group(
        &self,
        config: &ChannelConfig,
        dataset: &Dataset,
        sink: &dyn ProgressSink,
    ) -> Result<GroupingResult, BidsError> {
        let started = Instant::now();
        let names = config
            .loop_over
            .iter()
            .map(|name| normalize_entity_name(name).to_string())
            .collect::<Vec<_>>();

        for name in unknown_loop_over_entities(config) {
            tracing::warn!(entity = %name, "loop_over entity is not a known BIDS entity");
        }

        sink.event(ProgressEvent {
            message: format!(
                "phase=Resolve; {} files, loop_over={}",
                dataset.files.len(),
                names.join(",")
            ),
            elapsed: None,
        });

        // grouping key -> config key -> files
        let mut buckets = BTreeMap::<Vec<String>, BTreeMap<&str, Vec<&FileRecord>>>::new();
        let mut skipped = Vec::new();
        for file in &dataset.files {
            let Some(entry) = config.entry_for_suffix(&file.suffix) else {
                tracing::debug!(path = %file.path, suffix = %file.suffix, "no config entry for suffix");
                skipped.push(file.path.clone());
                continue;
            };
            if entry.set_type.is_none() {
                tracing::warn!(config_key = %entry.key, "config entry declares no set type");
                skipped.push(file.path.clone());
                continue;
            }
            buckets
                .entry(create_grouping_key(file, names.as_slice()))
                .or_default()
                .entry(entry.key.as_str())
                .or_default()
                .push(file);
        }

        sink.event(ProgressEvent {
            message: format!("phase=Group; {} groups", buckets.len()),
            elapsed: Some(started.elapsed()),
        });

        let parent_dir = dataset.parent_dir();
        let mut channels = Vec::with_capacity(buckets.len());
        for (key, by_config) in buckets {
            let mut channel = ChannelData::new(parent_dir.as_str());
            for (name, value) in names.iter().zip(&key) {
                if value != NA {
                    channel.add_entity(name, value);
                }
            }
            let mut bucket_paths = Vec::new();
            for (config_key, files) in by_config {
                bucket_paths.extend(files.iter().map(|file| file.path.clone()));
                let Some(entry) = config.entry(config_key) else {
                    continue;
                };
                channel.add_file_paths(files.iter().map(|file| file.path.as_str()));
                if let Some(payload) = self.payloads.build(entry, &files) {
                    channel.add_suffix_data(entry.output_suffix(), payload);
                }
            }
            if !channel.is_valid() {
                tracing::warn!(
                    key = ?key,
                    files = bucket_paths.len(),
                    "group has no loop_over entity or data"
                );
                skipped.extend(bucket_paths);
                continue;
            }
            channels.push(channel.to_channel_tuple(config.loop_over.as_slice()));
        }

        sink.event(ProgressEvent {
            message: format!("phase=Done; {} channels", channels.len()),
            elapsed: Some(started.elapsed()),
        });

        Ok(GroupingResult { channels, skipped })
    }
}

/// Configured `loop_over` names that match no known BIDS entity.
pub fn unknown_loop_over_entities(config: &ChannelConfig) -> Vec<String> {
    config
        .loop_over
        .iter()
        .filter(|name| !is_known_entity(name))
        .cloned()
        .collect()
}

/// Set types needed by the entries that actually govern files in `dataset`.
pub fn required_set_types(config: &ChannelConfig, dataset: &Dataset) -> Vec<SetType> {
    let mut needed = dataset
        .suffixes()
        .iter()
        .filter_map(|suffix| config.entry_for_suffix(suffix))
        .filter_map(|entry| entry.set_type)
        .collect::<Vec<_>>();
    needed.sort();
    needed.dedup();
    needed
}
