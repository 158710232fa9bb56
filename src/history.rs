//! Append-only log of completed translations.
//!
//! The whole log lives in memory and is rewritten to a single JSON array on
//! every append. Two processes appending to the same file race; the last
//! writer wins.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One completed translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub timestamp: DateTime<Utc>,
    pub original_text: String,
    pub translated_text: String,
    pub source_lang: String,
    pub target_lang: String,
}

/// Storage for the translation history.
pub trait HistoryStore: Send {
    /// (Re)load the log from storage and return the number of records.
    ///
    /// A missing or unreadable log loads as empty.
    fn load(&mut self) -> usize;

    /// Append a record and persist the whole log.
    ///
    /// The record's timestamp is raised to the previous record's if it is
    /// earlier, so the log stays in chronological order.
    fn append(&mut self, record: TranslationRecord) -> Result<()>;

    /// All records, oldest first.
    fn records(&self) -> &[TranslationRecord];

    /// The last `n` records, oldest first.
    fn recent(&self, n: usize) -> Vec<TranslationRecord> {
        let records = self.records();
        records[records.len().saturating_sub(n)..].to_vec()
    }
}

/// History shared between the pipeline and the interactive loop.
pub type SharedHistory = Arc<tokio::sync::Mutex<dyn HistoryStore>>;

/// Wrap a store for sharing.
pub fn shared<H: HistoryStore + 'static>(store: H) -> SharedHistory {
    Arc::new(tokio::sync::Mutex::new(store))
}

fn clamp_timestamp(records: &[TranslationRecord], mut record: TranslationRecord) -> TranslationRecord {
    if let Some(last) = records.last()
        && record.timestamp < last.timestamp
    {
        record.timestamp = last.timestamp;
    }
    record
}

/// History persisted as a pretty-printed JSON array.
#[derive(Debug)]
pub struct JsonHistoryStore {
    path: PathBuf,
    records: Vec<TranslationRecord>,
}

impl JsonHistoryStore {
    /// Open the log at `path`, loading whatever is there.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut store = Self {
            path: path.into(),
            records: Vec::new(),
        };
        let count = store.load();
        tracing::debug!(path = %store.path.display(), count, "loaded translation history");
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.records)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl HistoryStore for JsonHistoryStore {
    fn load(&mut self) -> usize {
        self.records = match fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        "history file is corrupt, starting empty: {e}"
                    );
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "history file is unreadable, starting empty: {e}"
                );
                Vec::new()
            }
        };
        self.records.len()
    }

    fn append(&mut self, record: TranslationRecord) -> Result<()> {
        let record = clamp_timestamp(&self.records, record);
        self.records.push(record);
        self.save()
    }

    fn records(&self) -> &[TranslationRecord] {
        &self.records
    }
}

/// History kept in memory only.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    records: Vec<TranslationRecord>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistory {
    fn load(&mut self) -> usize {
        self.records.len()
    }

    fn append(&mut self, record: TranslationRecord) -> Result<()> {
        let record = clamp_timestamp(&self.records, record);
        self.records.push(record);
        Ok(())
    }

    fn records(&self) -> &[TranslationRecord] {
        &self.records
    }
}
