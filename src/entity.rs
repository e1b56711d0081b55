use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::BidsError;

/// Placeholder returned for entities a record does not carry.
pub const NA: &str = "NA";

/// Short entity codes paired with their long names.
pub const ENTITY_NAME_PAIRS: [(&str, &str); 17] = [
    ("sub", "subject"),
    ("ses", "session"),
    ("acq", "acquisition"),
    ("ce", "ceagent"),
    ("trc", "tracer"),
    ("rec", "reconstruction"),
    ("dir", "direction"),
    ("mod", "modality"),
    ("inv", "inversion"),
    ("mt", "mtransfer"),
    ("proc", "processing"),
    ("hemi", "hemisphere"),
    ("seg", "segmentation"),
    ("res", "resolution"),
    ("den", "density"),
    ("nuc", "nucleus"),
    ("voi", "volume"),
];

/// Entity codes recognised in BIDS filenames.
pub const KNOWN_ENTITIES: [&str; 33] = [
    "sub",
    "ses",
    "sample",
    "task",
    "tracksys",
    "acq",
    "nuc",
    "voi",
    "ce",
    "trc",
    "stain",
    "rec",
    "dir",
    "run",
    "mod",
    "echo",
    "flip",
    "inv",
    "mt",
    "part",
    "proc",
    "hemi",
    "space",
    "split",
    "recording",
    "chunk",
    "seg",
    "res",
    "den",
    "label",
    "desc",
    "atlas",
    "roi",
];

static SHORT_TO_LONG: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| ENTITY_NAME_PAIRS.iter().copied().collect());

static LONG_TO_SHORT: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    ENTITY_NAME_PAIRS
        .iter()
        .map(|(short, long)| (*long, *short))
        .collect()
});

/// Long form of an entity name; names outside the table map to themselves.
pub fn short_to_long(name: &str) -> &str {
    SHORT_TO_LONG.get(name).copied().unwrap_or(name)
}

/// Short form of an entity name; names outside the table map to themselves.
pub fn long_to_short(name: &str) -> &str {
    LONG_TO_SHORT.get(name).copied().unwrap_or(name)
}

/// Accepts either form and returns the short code.
pub fn normalize_entity_name(name: &str) -> &str {
    if SHORT_TO_LONG.contains_key(name) {
        name
    } else {
        long_to_short(name)
    }
}

pub fn is_known_entity(name: &str) -> bool {
    let short = normalize_entity_name(name);
    KNOWN_ENTITIES.contains(&short)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    name: String,
    value: String,
}

impl Entity {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Result<Self, BidsError> {
        let name = name.into();
        let value = value.into();
        if name.is_empty() || value.is_empty() {
            return Err(BidsError::InvalidEntity { name, value });
        }
        Ok(Self { name, value })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_known(&self) -> bool {
        is_known_entity(&self.name)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.value)
    }
}

impl FromStr for Entity {
    type Err = BidsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (name, rest) = value
            .trim()
            .split_once('-')
            .ok_or_else(|| BidsError::InvalidEntity {
                name: value.to_string(),
                value: String::new(),
            })?;
        Entity::new(name, rest)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn renders_name_value() {
        let entity = Entity::new("sub", "01").unwrap();
        assert_eq!(entity.to_string(), "sub-01");
    }

    #[test]
    fn rejects_empty_parts() {
        assert_matches!(Entity::new("", "01"), Err(BidsError::InvalidEntity { .. }));
        assert_matches!(Entity::new("sub", ""), Err(BidsError::InvalidEntity { .. }));
    }

    #[test]
    fn normalizes_either_form() {
        assert_eq!(normalize_entity_name("subject"), "sub");
        assert_eq!(normalize_entity_name("sub"), "sub");
        assert_eq!(normalize_entity_name("run"), "run");
    }
}
