use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::sync::LazyLock;

use camino::Utf8Path;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::entity::NA;

/// Extensions stripped before the suffix is read, longest first.
pub const KNOWN_EXTENSIONS: [&str; 22] = [
    ".dtseries.nii",
    ".func.gii",
    ".surf.gii",
    ".nii.gz",
    ".tsv.gz",
    ".ome.tif",
    ".nii",
    ".json",
    ".tsv",
    ".bval",
    ".bvec",
    ".edf",
    ".bdf",
    ".vhdr",
    ".vmrk",
    ".eeg",
    ".set",
    ".fdt",
    ".fif",
    ".snirf",
    ".mat",
    ".txt",
];

static ENTITY_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9]+)-([A-Za-z0-9+]+)$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// One parsed file from a BIDS tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub path: String,
    pub suffix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(default, deserialize_with = "deserialize_entities")]
    entities: BTreeMap<String, String>,
    #[serde(default)]
    pub associated_files: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidecar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FileMetadata>,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            suffix: suffix.into(),
            extension: None,
            entities: BTreeMap::new(),
            associated_files: BTreeSet::new(),
            sidecar: None,
            metadata: None,
        }
    }

    /// Builds a record from a BIDS filename such as
    /// `sub-01/ses-02/anat/sub-01_ses-02_run-1_T1w.nii.gz`.
    pub fn from_path(path: &str) -> Self {
        let file_name = Utf8Path::new(path).file_name().unwrap_or(path);
        let (stem, extension) = split_extension(file_name);

        let segments = stem.split('_').collect::<Vec<_>>();
        let (suffix, entity_segments) = match segments.split_last() {
            Some((last, rest)) if !ENTITY_SEGMENT.is_match(last) => (*last, rest),
            _ => ("", segments.as_slice()),
        };

        let mut record = FileRecord::new(path, suffix);
        for segment in entity_segments {
            if let Some(caps) = ENTITY_SEGMENT.captures(segment) {
                record.insert_entity(&caps[1], &caps[2]);
            }
        }

        if let Some(ext) = extension {
            if ext != ".json" {
                let sidecar = Utf8Path::new(path).with_file_name(format!("{stem}.json"));
                record.sidecar = Some(sidecar.into_string());
            }
            record.extension = Some(ext.to_string());
        }
        record
    }

    pub fn with_entity(mut self, name: &str, value: &str) -> Self {
        self.insert_entity(name, value);
        self
    }

    /// Stores an entity; empty or `NA` values are dropped so absence stays absence.
    pub fn insert_entity(&mut self, name: &str, value: &str) {
        if name.is_empty() || value.is_empty() || value == NA {
            return;
        }
        self.entities.insert(name.to_string(), value.to_string());
    }

    pub fn entity(&self, name: &str) -> &str {
        self.entities.get(name).map(String::as_str).unwrap_or(NA)
    }

    pub fn has_entity(&self, name: &str) -> bool {
        self.entities
            .get(name)
            .is_some_and(|value| value.as_str() != NA)
    }

    pub fn entities(&self) -> &BTreeMap<String, String> {
        &self.entities
    }

    pub fn parent_dir(&self) -> Option<&str> {
        Utf8Path::new(&self.path)
            .parent()
            .map(Utf8Path::as_str)
            .filter(|dir| !dir.is_empty())
    }

    /// Loads size and modification time. Failures leave `metadata` untouched.
    pub fn load_metadata(&mut self) {
        match fs::metadata(&self.path) {
            Ok(meta) => {
                let modified = meta.modified().ok().map(DateTime::<Utc>::from);
                self.metadata = Some(FileMetadata {
                    size: meta.len(),
                    modified,
                });
            }
            Err(err) => {
                tracing::debug!(path = %self.path, error = %err, "file metadata unavailable");
            }
        }
    }
}

fn split_extension(file_name: &str) -> (&str, Option<&str>) {
    for ext in KNOWN_EXTENSIONS {
        if let Some(stem) = file_name.strip_suffix(ext) {
            let start = file_name.len() - ext.len();
            return (stem, Some(&file_name[start..]));
        }
    }
    match file_name.find('.') {
        Some(idx) if idx > 0 => (&file_name[..idx], Some(&file_name[idx..])),
        _ => (file_name, None),
    }
}

fn deserialize_entities<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter(|(name, value)| !name.is_empty() && !value.is_empty() && value != NA)
        .collect())
}

/// A collection of parsed files plus the participants table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub files: Vec<FileRecord>,
    #[serde(default)]
    pub participants: Vec<BTreeMap<String, String>>,
}

impl Dataset {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            files: Vec::new(),
            participants: Vec::new(),
        }
    }

    pub fn from_files(path: impl Into<String>, files: Vec<FileRecord>) -> Self {
        Self {
            path: path.into(),
            files,
            participants: Vec::new(),
        }
    }

    pub fn add_file(&mut self, file: FileRecord) {
        self.files.push(file);
    }

    pub fn subjects(&self) -> Vec<String> {
        self.unique_values(|file| file.entity("sub"))
    }

    pub fn sessions(&self) -> Vec<String> {
        self.unique_values(|file| file.entity("ses"))
    }

    pub fn suffixes(&self) -> Vec<String> {
        self.unique_values(|file| file.suffix.as_str())
    }

    pub fn files_with_suffix(&self, suffix: &str) -> Vec<&FileRecord> {
        self.files.iter().filter(|file| file.suffix == suffix).collect()
    }

    /// Looks up a participants row; `01` and `sub-01` both match.
    pub fn participant(&self, subject: &str) -> Option<&BTreeMap<String, String>> {
        let wanted = subject.strip_prefix("sub-").unwrap_or(subject);
        self.participants.iter().find(|row| {
            row.get("participant_id")
                .map(|id| id.strip_prefix("sub-").unwrap_or(id) == wanted)
                .unwrap_or(false)
        })
    }

    /// Parent of the dataset root, as reported in rendered records.
    pub fn parent_dir(&self) -> String {
        Utf8Path::new(&self.path)
            .parent()
            .map(Utf8Path::as_str)
            .filter(|dir| !dir.is_empty())
            .unwrap_or(self.path.as_str())
            .to_string()
    }

    fn unique_values<'a>(&'a self, project: impl Fn(&'a FileRecord) -> &'a str) -> Vec<String> {
        self.files
            .iter()
            .map(project)
            .filter(|value| !value.is_empty() && *value != NA)
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Parses a `participants.tsv` table into one map per row.
pub fn parse_participants_tsv(content: &str) -> Vec<BTreeMap<String, String>> {
    let mut lines = content.lines().filter(|line| !line.trim().is_empty());
    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let columns = header.split('\t').map(str::trim).collect::<Vec<_>>();
    lines
        .map(|line| {
            columns
                .iter()
                .zip(line.split('\t'))
                .map(|(column, value)| (column.to_string(), value.trim().to_string()))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_from_filename() {
        let record = FileRecord::from_path("sub-01/anat/sub-01_ses-02_run-1_T1w.nii.gz");
        assert_eq!(record.suffix, "T1w");
        assert_eq!(record.extension.as_deref(), Some(".nii.gz"));
        assert_eq!(record.entity("sub"), "01");
        assert_eq!(record.entity("ses"), "02");
        assert_eq!(record.entity("run"), "1");
        assert_eq!(
            record.sidecar.as_deref(),
            Some("sub-01/anat/sub-01_ses-02_run-1_T1w.json")
        );
    }

    #[test]
    fn na_is_never_stored() {
        let record = FileRecord::new("a.nii", "T1w").with_entity("ses", NA);
        assert!(!record.has_entity("ses"));
        assert!(record.entities().is_empty());
        assert_eq!(record.entity("ses"), NA);
    }
}
