use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::BidsError;

/// Config field that lets an entry answer for a different BIDS suffix.
pub const SUFFIX_MAPS_TO: &str = "suffix_maps_to";

/// Target suffix -> governing configuration key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuffixMapping {
    targets: BTreeMap<String, String>,
}

impl SuffixMapping {
    /// Scans every map-valued entry for `suffix_maps_to`.
    ///
    /// Each suffix is governed by a single entry: two overrides claiming the same
    /// target, or an override shadowing an entry keyed by that suffix, is an error.
    pub fn build(config: &Value) -> Result<Self, BidsError> {
        let mut targets = BTreeMap::<String, String>::new();
        let Some(entries) = config.as_object() else {
            return Ok(Self { targets });
        };

        for (key, value) in entries {
            let Some(suffix) = maps_to(value) else {
                continue;
            };
            if let Some(first) = targets.get(suffix) {
                return Err(BidsError::SuffixCollision {
                    suffix: suffix.to_string(),
                    first: first.clone(),
                    second: key.clone(),
                });
            }
            tracing::debug!(suffix, config_key = %key, "suffix mapped");
            targets.insert(suffix.to_string(), key.clone());
        }

        for (suffix, key) in &targets {
            let shadowed = entries
                .get(suffix)
                .is_some_and(|entry| entry.is_object() && suffix != key);
            if shadowed {
                return Err(BidsError::SuffixCollision {
                    suffix: suffix.clone(),
                    first: suffix.clone(),
                    second: key.clone(),
                });
            }
        }

        Ok(Self { targets })
    }

    /// Configuration key governing `suffix`; the suffix itself when no override exists.
    pub fn resolve_config_key<'a>(&'a self, suffix: &'a str) -> &'a str {
        self.targets.get(suffix).map(String::as_str).unwrap_or(suffix)
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }
}

pub fn build_suffix_mapping(config: &Value) -> Result<SuffixMapping, BidsError> {
    SuffixMapping::build(config)
}

/// Suffix written to output records for a configuration entry.
pub fn output_suffix(config_key: &str, config_value: &Value) -> String {
    maps_to(config_value).unwrap_or(config_key).to_string()
}

fn maps_to(value: &Value) -> Option<&str> {
    value
        .as_object()?
        .get(SUFFIX_MAPS_TO)?
        .as_str()
        .filter(|target| !target.is_empty())
}
