use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BidsError;
use crate::suffix::{SUFFIX_MAPS_TO, SuffixMapping};

pub const LOOP_OVER: &str = "loop_over";

pub const DEFAULT_LOOP_OVER: [&str; 4] = ["subject", "session", "run", "task"];

/// Aggregation policy selected for one configuration entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetType {
    Plain,
    Named,
    Sequential,
    Mixed,
}

impl SetType {
    pub const ALL: [SetType; 4] = [
        SetType::Plain,
        SetType::Named,
        SetType::Sequential,
        SetType::Mixed,
    ];

    pub fn marker(self) -> &'static str {
        match self {
            SetType::Plain => "plain_set",
            SetType::Named => "named_set",
            SetType::Sequential => "sequential_set",
            SetType::Mixed => "mixed_set",
        }
    }

    /// Markers present in `entry`, in declaration order of [`SetType::ALL`].
    pub fn markers_in(entry: &Value) -> Vec<SetType> {
        let Some(map) = entry.as_object() else {
            return Vec::new();
        };
        SetType::ALL
            .into_iter()
            .filter(|set_type| map.contains_key(set_type.marker()))
            .collect()
    }

    /// `Ok(None)` when the entry has no marker; an error when it has several.
    pub fn from_entry(key: &str, entry: &Value) -> Result<Option<SetType>, BidsError> {
        let markers = SetType::markers_in(entry);
        match markers.as_slice() {
            [] => Ok(None),
            [single] => Ok(Some(*single)),
            many => Err(BidsError::MultipleSetTypes {
                key: key.to_string(),
                markers: many
                    .iter()
                    .map(|set_type| set_type.marker())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }
}

impl fmt::Display for SetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.marker())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuffixEntry {
    pub key: String,
    pub set_type: Option<SetType>,
    pub maps_to: Option<String>,
    pub settings: Value,
}

impl SuffixEntry {
    /// Suffix this entry's payloads are stored under.
    pub fn output_suffix(&self) -> &str {
        self.maps_to.as_deref().unwrap_or(&self.key)
    }

    /// Body of the set-type marker, e.g. the `named_set` map.
    pub fn set_settings(&self) -> Option<&Value> {
        let set_type = self.set_type?;
        self.settings.get(set_type.marker())
    }
}

/// Validated view over a channel configuration map.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub loop_over: Vec<String>,
    pub entries: BTreeMap<String, SuffixEntry>,
    pub suffix_mapping: SuffixMapping,
    raw: Value,
}

impl ChannelConfig {
    pub fn from_value(value: Value) -> Result<Self, BidsError> {
        let Some(map) = value.as_object() else {
            return Err(BidsError::InvalidConfig(
                "top level must be a map of config entries".to_string(),
            ));
        };

        let loop_over = match map.get(LOOP_OVER) {
            None | Some(Value::Null) => default_loop_over(),
            Some(Value::String(single)) => vec![single.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        BidsError::InvalidConfig(format!("loop_over item is not a string: {item}"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(BidsError::InvalidConfig(format!(
                    "loop_over must be a string or a list of strings, got {other}"
                )));
            }
        };

        let mut entries = BTreeMap::new();
        for (key, entry) in map {
            if key == LOOP_OVER || !entry.is_object() {
                continue;
            }
            let set_type = SetType::from_entry(key, entry)?;
            let maps_to = match entry.get(SUFFIX_MAPS_TO) {
                None => None,
                Some(Value::String(target)) if !target.is_empty() => Some(target.clone()),
                Some(other) => {
                    return Err(BidsError::InvalidConfig(format!(
                        "{key}.{SUFFIX_MAPS_TO} must be a non-empty string, got {other}"
                    )));
                }
            };
            entries.insert(
                key.clone(),
                SuffixEntry {
                    key: key.clone(),
                    set_type,
                    maps_to,
                    settings: entry.clone(),
                },
            );
        }

        let suffix_mapping = SuffixMapping::build(&value)?;

        Ok(Self {
            loop_over,
            entries,
            suffix_mapping,
            raw: value,
        })
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn entry(&self, config_key: &str) -> Option<&SuffixEntry> {
        self.entries.get(config_key)
    }

    /// Entry governing files with `suffix`, after `suffix_maps_to` redirection.
    pub fn entry_for_suffix(&self, suffix: &str) -> Option<&SuffixEntry> {
        self.entries
            .get(self.suffix_mapping.resolve_config_key(suffix))
    }
}

pub fn default_loop_over() -> Vec<String> {
    DEFAULT_LOOP_OVER.iter().map(|name| name.to_string()).collect()
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads a JSON or YAML configuration file into a raw map.
    pub fn load_value(path: &Path) -> Result<Value, BidsError> {
        if !path.exists() {
            return Err(BidsError::ConfigNotFound(path.to_path_buf()));
        }
        let content =
            fs::read_to_string(path).map_err(|_| BidsError::ConfigRead(path.to_path_buf()))?;

        let extension = Utf8Path::from_path(path)
            .and_then(Utf8Path::extension)
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Self::parse_json(&content),
            _ => Self::parse_yaml(&content),
        }
    }

    pub fn load(path: &Path) -> Result<ChannelConfig, BidsError> {
        let value = Self::load_value(path)?;
        tracing::debug!(path = %path.display(), "config loaded");
        ChannelConfig::from_value(value)
    }

    pub fn parse_json(content: &str) -> Result<Value, BidsError> {
        serde_json::from_str(content).map_err(|err| BidsError::ConfigParse(err.to_string()))
    }

    pub fn parse_yaml(content: &str) -> Result<Value, BidsError> {
        serde_yaml::from_str(content).map_err(|err| BidsError::ConfigParse(err.to_string()))
    }
}
