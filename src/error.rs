use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum BidsError {
    #[error("invalid entity: name={name:?} value={value:?} (both must be non-empty)")]
    InvalidEntity { name: String, value: String },

    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse config: {0}")]
    ConfigParse(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("config entry {key} declares more than one set type: {markers}")]
    #[diagnostic(help("keep exactly one of plain_set, named_set, sequential_set, mixed_set"))]
    MultipleSetTypes { key: String, markers: String },

    #[error("suffix {suffix} is targeted by both {first} and {second}")]
    #[diagnostic(help("each suffix_maps_to target may be claimed by a single config entry"))]
    SuffixCollision {
        suffix: String,
        first: String,
        second: String,
    },

    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("failed to parse file records: {0}")]
    RecordsParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl BidsError {
    /// Configuration was readable but its content is unusable.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            BidsError::ConfigParse(_)
                | BidsError::InvalidConfig(_)
                | BidsError::MultipleSetTypes { .. }
                | BidsError::SuffixCollision { .. }
        )
    }

    pub fn is_missing_file(&self) -> bool {
        matches!(
            self,
            BidsError::ConfigNotFound(_) | BidsError::InputNotFound(_)
        )
    }
}
