//! Entity-based filtering, bucketing and key extraction over file records.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::domain::FileRecord;
use crate::entity::NA;

/// Separator used by [`create_comparison_key`].
pub const COMPARISON_SEPARATOR: &str = "|";

/// Files bucketed by one or more entities, outermost entity first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityGroups<'a> {
    Files(Vec<&'a FileRecord>),
    Nested(BTreeMap<String, EntityGroups<'a>>),
}

impl<'a> EntityGroups<'a> {
    pub fn file_count(&self) -> usize {
        match self {
            EntityGroups::Files(files) => files.len(),
            EntityGroups::Nested(groups) => groups.values().map(EntityGroups::file_count).sum(),
        }
    }

    /// Leaf file lists paired with the entity values leading to them.
    pub fn leaves(&self) -> Vec<(Vec<&str>, &[&'a FileRecord])> {
        let mut out = Vec::new();
        self.collect_leaves(&mut Vec::new(), &mut out);
        out
    }

    fn collect_leaves<'s>(
        &'s self,
        path: &mut Vec<&'s str>,
        out: &mut Vec<(Vec<&'s str>, &'s [&'a FileRecord])>,
    ) {
        match self {
            EntityGroups::Files(files) => out.push((path.clone(), files.as_slice())),
            EntityGroups::Nested(groups) => {
                for (value, child) in groups {
                    path.push(value.as_str());
                    child.collect_leaves(path, out);
                    path.pop();
                }
            }
        }
    }
}

/// Keeps files matching every `(name, value)` pair. Empty or `NA` values match anything.
pub fn filter_by_entities<'a, K, V>(
    files: impl IntoIterator<Item = &'a FileRecord>,
    filter: &BTreeMap<K, V>,
) -> Vec<&'a FileRecord>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    files
        .into_iter()
        .filter(|file| {
            filter.iter().all(|(name, required)| {
                let required = required.as_ref();
                required.is_empty() || required == NA || file.entity(name.as_ref()) == required
            })
        })
        .collect()
}

/// Partitions files by the value of `name`; files lacking it land in the `NA` bucket.
pub fn group_by_entity<'a>(
    files: impl IntoIterator<Item = &'a FileRecord>,
    name: &str,
) -> BTreeMap<String, Vec<&'a FileRecord>> {
    let mut groups = BTreeMap::<String, Vec<&'a FileRecord>>::new();
    for file in files {
        groups
            .entry(file.entity(name).to_string())
            .or_default()
            .push(file);
    }
    groups
}

/// Recursive refinement of [`group_by_entity`]; with no names the input is returned as one leaf.
pub fn group_by_multiple_entities<'a, S: AsRef<str>>(
    files: impl IntoIterator<Item = &'a FileRecord>,
    names: &[S],
) -> EntityGroups<'a> {
    let Some((first, rest)) = names.split_first() else {
        return EntityGroups::Files(files.into_iter().collect());
    };
    let nested = group_by_entity(files, first.as_ref())
        .into_iter()
        .map(|(value, bucket)| (value, group_by_multiple_entities(bucket, rest)))
        .collect();
    EntityGroups::Nested(nested)
}

/// Values of `names` in order, `NA` for each missing entity.
pub fn extract_entity_values<S: AsRef<str>>(file: &FileRecord, names: &[S]) -> Vec<String> {
    names
        .iter()
        .map(|name| file.entity(name.as_ref()).to_string())
        .collect()
}

pub fn create_grouping_key<S: AsRef<str>>(file: &FileRecord, names: &[S]) -> Vec<String> {
    extract_entity_values(file, names)
}

/// True when every file projects to the same values as the first; vacuously true when empty.
pub fn has_consistent_entities<'a, S: AsRef<str>>(
    files: impl IntoIterator<Item = &'a FileRecord>,
    names: &[S],
) -> bool {
    let mut files = files.into_iter();
    let Some(first) = files.next() else {
        return true;
    };
    let reference = extract_entity_values(first, names);
    files.all(|file| extract_entity_values(file, names) == reference)
}

/// Stable sort by one entity. All-digit values on both sides compare numerically.
pub fn sort_by_entity<'a>(
    files: impl IntoIterator<Item = &'a FileRecord>,
    name: &str,
) -> Vec<&'a FileRecord> {
    let mut sorted = files.into_iter().collect::<Vec<_>>();
    sorted.sort_by(|a, b| compare_entity_values(a.entity(name), b.entity(name)));
    sorted
}

pub fn compare_entity_values(a: &str, b: &str) -> Ordering {
    if is_numeric(a) && is_numeric(b) {
        let a_digits = a.trim_start_matches('0');
        let b_digits = b.trim_start_matches('0');
        a_digits
            .len()
            .cmp(&b_digits.len())
            .then_with(|| a_digits.cmp(b_digits))
            .then_with(|| a.len().cmp(&b.len()))
    } else {
        a.cmp(b)
    }
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}

pub fn create_comparison_key<S: AsRef<str>>(file: &FileRecord, names: &[S]) -> String {
    extract_entity_values(file, names).join(COMPARISON_SEPARATOR)
}
