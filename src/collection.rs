use std::fs;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::Source;
use crate::error::ClioError;

/// Namespace key of the persisted collection.
pub const STORAGE_KEY: &str = "clio_saved_sources";

pub trait CollectionStorage {
    /// Persisted bytes, or `None` when nothing was stored yet.
    fn read(&self) -> Result<Option<Vec<u8>>, ClioError>;
    fn write(&self, bytes: &[u8]) -> Result<(), ClioError>;
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    path: Utf8PathBuf,
}

impl FileStorage {
    pub fn new() -> Result<Self, ClioError> {
        let data_dir = BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(dirs.data_dir().join("clio-archive")).ok()
            })
            .ok_or_else(|| {
                ClioError::Filesystem("unable to resolve data directory".to_string())
            })?;
        Ok(Self::in_dir(&data_dir))
    }

    pub fn in_dir(dir: &Utf8Path) -> Self {
        Self {
            path: dir.join(format!("{STORAGE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl CollectionStorage for FileStorage {
    fn read(&self) -> Result<Option<Vec<u8>>, ClioError> {
        match fs::read(self.path.as_std_path()) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(ClioError::Filesystem(format!("read {}: {err}", self.path))),
        }
    }

    fn write(&self, bytes: &[u8]) -> Result<(), ClioError> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| ClioError::Persistence("invalid storage path".to_string()))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| ClioError::Persistence(err.to_string()))?;
        let mut temp = tempfile::Builder::new()
            .prefix("clio-saved")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| ClioError::Persistence(err.to_string()))?;
        temp.write_all(bytes)
            .and_then(|_| temp.flush())
            .map_err(|err| ClioError::Persistence(err.to_string()))?;
        temp.persist(self.path.as_std_path())
            .map_err(|err| ClioError::Persistence(err.to_string()))?;
        Ok(())
    }
}

/// In-process storage. Clones share the same bytes, so a test can reload a collection
/// from what an earlier instance wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    bytes: Option<Vec<u8>>,
    fail_writes: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let storage = Self::default();
        storage.lock().bytes = Some(bytes.into());
        storage
    }

    pub fn bytes(&self) -> Option<Vec<u8>> {
        self.lock().bytes.clone()
    }

    /// Makes every following write fail, as a full quota would.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CollectionStorage for MemoryStorage {
    fn read(&self) -> Result<Option<Vec<u8>>, ClioError> {
        Ok(self.bytes())
    }

    fn write(&self, bytes: &[u8]) -> Result<(), ClioError> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(ClioError::Persistence("storage quota exceeded".to_string()));
        }
        state.bytes = Some(bytes.to_vec());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// A different record with the same URL was saved; the new one took its place.
    Replaced,
}

/// What happened to one selected result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SaveOutcome {
    Added,
    Removed,
    Replaced,
    /// Changed in memory only; the write to storage failed.
    NotPersisted,
    NoSuchResult,
}

impl From<ToggleOutcome> for SaveOutcome {
    fn from(outcome: ToggleOutcome) -> Self {
        match outcome {
            ToggleOutcome::Added => SaveOutcome::Added,
            ToggleOutcome::Removed => SaveOutcome::Removed,
            ToggleOutcome::Replaced => SaveOutcome::Replaced,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    /// 1-based position in the result list.
    pub position: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub outcome: SaveOutcome,
}

/// The user's saved sources, keyed by URL. Every mutation rewrites the whole collection
/// to storage before returning. When that write fails the in-memory change is kept and
/// the error returned: memory is authoritative for the session.
#[derive(Debug)]
pub struct SavedCollection<S: CollectionStorage> {
    storage: S,
    sources: Vec<Source>,
}

impl<S: CollectionStorage> SavedCollection<S> {
    pub fn load(storage: S) -> Self {
        let sources = match storage.read() {
            Ok(Some(bytes)) => decode_sources(&bytes),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "saved collection unreadable, starting empty");
                Vec::new()
            }
        };
        debug!(count = sources.len(), "saved collection loaded");
        Self { storage, sources }
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn is_saved(&self, url: &str) -> bool {
        self.position(url).is_some()
    }

    pub fn get(&self, url: &str) -> Option<&Source> {
        self.position(url).map(|index| &self.sources[index])
    }

    /// Saves `source` when its URL is absent and unsaves it when the identical record is
    /// present. A different record under the same URL replaces the saved one, so the
    /// latest toggle wins and URLs never repeat.
    pub fn toggle(&mut self, source: Source) -> Result<ToggleOutcome, ClioError> {
        let outcome = match self.position(&source.url) {
            Some(index) if self.sources[index] == source => {
                self.sources.remove(index);
                ToggleOutcome::Removed
            }
            Some(index) => {
                self.sources[index] = source;
                ToggleOutcome::Replaced
            }
            None => {
                self.sources.push(source);
                ToggleOutcome::Added
            }
        };
        self.persist()?;
        Ok(outcome)
    }

    pub fn remove(&mut self, url: &str) -> Result<Source, ClioError> {
        let index = self
            .position(url)
            .ok_or_else(|| ClioError::SourceNotFound(url.to_string()))?;
        let removed = self.sources.remove(index);
        self.persist()?;
        Ok(removed)
    }

    /// Toggles the results at the given 1-based `positions`. Every position is attempted
    /// and reported; the first persistence failure is returned alongside so the caller
    /// can still show the results before failing.
    pub fn toggle_positions(
        &mut self,
        results: &[Source],
        positions: &[usize],
    ) -> (Vec<SaveReport>, Option<ClioError>) {
        let mut reports = Vec::with_capacity(positions.len());
        let mut first_error = None;
        for &position in positions {
            let Some(source) = position
                .checked_sub(1)
                .and_then(|index| results.get(index))
            else {
                warn!(position, "no result at position");
                reports.push(SaveReport {
                    position,
                    url: None,
                    outcome: SaveOutcome::NoSuchResult,
                });
                continue;
            };
            let outcome = match self.toggle(source.clone()) {
                Ok(outcome) => outcome.into(),
                Err(err) => {
                    first_error.get_or_insert(err);
                    SaveOutcome::NotPersisted
                }
            };
            reports.push(SaveReport {
                position,
                url: Some(source.url.clone()),
                outcome,
            });
        }
        (reports, first_error)
    }

    fn position(&self, url: &str) -> Option<usize> {
        self.sources.iter().position(|saved| saved.url == url)
    }

    fn persist(&self) -> Result<(), ClioError> {
        let bytes = serde_json::to_vec(&self.sources)
            .map_err(|err| ClioError::Persistence(err.to_string()))?;
        self.storage.write(&bytes).inspect_err(|err| {
            warn!(error = %err, "saved collection kept in memory only");
        })
    }
}

fn decode_sources(bytes: &[u8]) -> Vec<Source> {
    match serde_json::from_slice::<Vec<Source>>(bytes) {
        Ok(sources) => dedup_by_url(sources),
        Err(err) => {
            warn!(error = %err, "saved collection undecodable, starting empty");
            Vec::new()
        }
    }
}

fn dedup_by_url(sources: Vec<Source>) -> Vec<Source> {
    let mut unique: Vec<Source> = Vec::with_capacity(sources.len());
    for source in sources {
        match unique.iter_mut().find(|saved| saved.url == source.url) {
            Some(saved) => *saved = source,
            None => unique.push(source),
        }
    }
    unique
}
