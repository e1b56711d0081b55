use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::domain::{Dataset, FileRecord, parse_participants_tsv};
use crate::error::BidsError;

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordsFile {
    Dataset(Dataset),
    Files(Vec<FileRecord>),
}

/// Reads parsed file records: either a bare JSON array or a dataset object.
pub fn read_dataset(path: &Path) -> Result<Dataset, BidsError> {
    let content = read_input(path)?;
    parse_dataset(&content, path)
}

pub fn parse_dataset(content: &str, path: &Path) -> Result<Dataset, BidsError> {
    let parsed: RecordsFile =
        serde_json::from_str(content).map_err(|err| BidsError::RecordsParse(err.to_string()))?;
    let dataset = match parsed {
        RecordsFile::Dataset(dataset) => dataset,
        RecordsFile::Files(files) => {
            let root = path
                .parent()
                .map(|dir| dir.to_string_lossy().into_owned())
                .unwrap_or_default();
            Dataset::from_files(root, files)
        }
    };
    tracing::debug!(files = dataset.files.len(), "records loaded");
    Ok(dataset)
}

pub fn read_participants(dataset: &mut Dataset, path: &Path) -> Result<(), BidsError> {
    let content = read_input(path)?;
    dataset.participants = parse_participants_tsv(&content);
    Ok(())
}

fn read_input(path: &Path) -> Result<String, BidsError> {
    if !path.exists() {
        return Err(BidsError::InputNotFound(path.to_path_buf()));
    }
    fs::read_to_string(path)
        .map_err(|err| BidsError::Filesystem(format!("read {}: {err}", path.display())))
}
