// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search history store.
//!
//! An ordered, duplicate-free list of past search terms, most recent first,
//! persisted as a JSON array. A record that cannot be parsed is treated as
//! empty history and is overwritten by the next save.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::errors::HistoryError;

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// In-memory list plus a revision bumped on every mutation.
#[derive(Debug, Default)]
struct Terms {
    list: Vec<String>,
    revision: u64,
}

impl Terms {
    fn replace(&mut self, list: Vec<String>) {
        self.list = list;
        self.revision += 1;
    }
}

/// Readers and `add_term` only ever contend on the in-memory list. Writers to
/// disk serialize on `persisted`, which remembers the revision on disk so an
/// older snapshot never replaces a newer one.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    limit: Option<usize>,
    terms: RwLock<Terms>,
    persisted: Mutex<Option<u64>>,
}

impl HistoryStore {
    /// Create an empty store backed by `path`. Nothing is read until [`load`](Self::load).
    pub fn new(path: impl Into<PathBuf>, limit: Option<usize>) -> Self {
        Self {
            path: path.into(),
            limit,
            terms: RwLock::new(Terms::default()),
            persisted: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the in-memory list with the durable record.
    ///
    /// A missing, empty, or unparsable record yields empty history and `Ok`.
    /// Any other read failure also leaves the history empty but is returned
    /// so the caller can report it.
    pub fn load(&self) -> Result<(), HistoryError> {
        let (loaded, result) = match fs::read(&self.path) {
            Ok(raw) => (self.parse_record(&raw), Ok(())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => (Vec::new(), Ok(())),
            Err(source) => (
                Vec::new(),
                Err(HistoryError::Read {
                    path: self.path.clone(),
                    source,
                }),
            ),
        };
        self.write_terms().replace(loaded);
        result
    }

    fn parse_record(&self, raw: &[u8]) -> Vec<String> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Vec::new();
        }
        match serde_json::from_slice::<Vec<String>>(raw) {
            Ok(mut loaded) => {
                dedup_keep_first(&mut loaded);
                if let Some(limit) = self.limit {
                    loaded.truncate(limit);
                }
                loaded
            }
            Err(err) => {
                tracing::debug!(
                    path = %self.path.display(),
                    error = %err,
                    "history record unreadable, starting fresh"
                );
                Vec::new()
            }
        }
    }

    /// Overwrite the durable record with the current list.
    ///
    /// The list is copied out before any file I/O, so `add_term` never waits
    /// on the disk. A save whose copy is older than what another save already
    /// wrote is skipped.
    pub fn save(&self) -> Result<(), HistoryError> {
        let (list, revision) = {
            let terms = self.read_terms();
            (terms.list.clone(), terms.revision)
        };
        let encoded = serde_json::to_vec_pretty(&list)?;

        let mut persisted = self.persisted.lock().unwrap_or_else(PoisonError::into_inner);
        if persisted.is_some_and(|written| written > revision) {
            tracing::trace!(revision, "newer history already on disk, skipping save");
            return Ok(());
        }
        self.write_record(&encoded)?;
        *persisted = Some(revision);
        Ok(())
    }

    /// Move `term` to the front, dropping its previous occurrence.
    pub fn add_term(&self, term: &str) {
        if term.is_empty() {
            return;
        }
        let mut terms = self.write_terms();
        let mut next = Vec::with_capacity(terms.list.len() + 1);
        next.push(term.to_string());
        next.extend(terms.list.drain(..).filter(|existing| existing != term));
        if let Some(limit) = self.limit {
            next.truncate(limit);
        }
        terms.replace(next);
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.read_terms().list.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.read_terms().list.is_empty()
    }

    pub fn clear(&self) {
        self.write_terms().replace(Vec::new());
    }

    /// Stage the record next to its destination, fsync, then rename over it.
    fn write_record(&self, bytes: &[u8]) -> Result<(), HistoryError> {
        let write_err = |source: io::Error| HistoryError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(write_err)?;

        let file_name = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("history");
        let staging = dir.join(format!(
            ".{}.{}-{}.tmp",
            file_name,
            std::process::id(),
            STAGING_SEQ.fetch_add(1, Ordering::Relaxed)
        ));

        let written = File::create(&staging)
            .and_then(|mut file| {
                file.write_all(bytes)?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&staging, &self.path));
        if written.is_err() {
            let _ = fs::remove_file(&staging);
        }
        written.map_err(write_err)
    }

    #[cfg(test)]
    pub(crate) fn lock_writer(&self) -> std::sync::MutexGuard<'_, Option<u64>> {
        self.persisted.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_terms(&self) -> RwLockReadGuard<'_, Terms> {
        self.terms.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_terms(&self) -> RwLockWriteGuard<'_, Terms> {
        self.terms.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn dedup_keep_first(entries: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::with_capacity(entries.len());
    entries.retain(|entry| !entry.is_empty() && seen.insert(entry.clone()));
}
