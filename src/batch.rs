//! Parallel sealing and opening of many files (folder mode)

use rayon::prelude::*;

use crate::envelope::{open, seal, SEALED_SUFFIX};
use crate::result::OperationResult;

/// One file's name and contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub contents: Vec<u8>,
}

impl FileEntry {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// Seal every entry. Results keep input order; failures don't stop the batch.
pub fn seal_batch(entries: &[FileEntry], key: &str) -> Vec<OperationResult> {
    entries
        .par_iter()
        .map(|entry| seal(&entry.contents, key, &entry.name))
        .collect()
}

/// Open every entry; names without the `.enc` suffix are reported, not opened.
pub fn open_batch(entries: &[FileEntry], key: &str) -> Vec<OperationResult> {
    entries
        .par_iter()
        .map(|entry| {
            if !entry.name.ends_with(SEALED_SUFFIX) {
                tracing::warn!(name = %entry.name, "skipping file without sealed suffix");
                return OperationResult::failure(format!("not a sealed file: {}", entry.name));
            }
            open(&entry.contents, key, &entry.name)
        })
        .collect()
}
