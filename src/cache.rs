//! In-process memo of built corpora, keyed by the source file's fingerprint.

use crate::context::CorpusData;
use crate::data::corpus::CorpusLoader;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFingerprint {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl SourceFingerprint {
    /// `None` when the file does not exist.
    pub fn of(path: &Path) -> Result<Option<Self>, AppError> {
        let meta = match fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::IoError(format!(
                    "Failed to stat corpus {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        Ok(Some(SourceFingerprint {
            path: path.to_path_buf(),
            len: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        }))
    }
}

type Slot = Arc<OnceCell<Arc<CorpusData>>>;

#[derive(Default)]
pub struct CorpusCache {
    entries: Mutex<HashMap<SourceFingerprint, Slot>>,
}

impl CorpusCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load and aggregate `path` once; later calls for the unchanged file reuse the
    /// first result. Concurrent callers for the same file wait on a single build.
    pub fn get_or_load(
        &self,
        path: &Path,
        loader: &CorpusLoader,
        on_progress: impl FnMut(usize),
    ) -> Result<Option<Arc<CorpusData>>, AppError> {
        let Some(fingerprint) = SourceFingerprint::of(path)? else {
            return Ok(None);
        };

        let slot = {
            let mut entries = self
                .entries
                .lock()
                .map_err(|_| AppError::DataUnavailable("corpus cache lock poisoned".to_string()))?;
            entries.entry(fingerprint).or_default().clone()
        };

        let data = slot.get_or_try_init(|| {
            let (records, report) = loader
                .open(path, on_progress)?
                .ok_or_else(|| AppError::DataUnavailable(format!("{} vanished", path.display())))?;
            Ok::<_, AppError>(Arc::new(CorpusData::build(records, report)))
        })?;

        Ok(Some(Arc::clone(data)))
    }
}
