use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::StorageError;
use crate::types::storyboard::StoredRecord;

/// Fixed key the collection is stored under.
pub const STORAGE_KEY: &str = "storyboards";

/// Wholesale load/save of the persisted collection.
///
/// Both operations are fail-soft: `load` treats anything unreadable as an
/// empty collection and `save` reports failure through its return value.
pub trait RecordStore {
    fn load(&self) -> Vec<StoredRecord>;
    fn save(&self, records: &[StoredRecord]) -> bool;
}

/// Keeps the collection as a JSON array in `<dir>/storyboards.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{STORAGE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn try_load(&self) -> Result<Vec<StoredRecord>, StorageError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    fn try_save(&self, records: &[StoredRecord]) -> Result<(), StorageError> {
        let write_err = |source: std::io::Error| StorageError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        // write beside the target, then swap it in
        let tmp_path = self.path.with_extension("json.tmp");
        let file = File::create(&tmp_path).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, records)?;
        writer.flush().map_err(write_err)?;
        drop(writer);

        fs::rename(&tmp_path, &self.path).map_err(write_err)?;
        Ok(())
    }
}

impl RecordStore for JsonFileStore {
    fn load(&self) -> Vec<StoredRecord> {
        match self.try_load() {
            Ok(records) => {
                debug!(path = %self.path.display(), count = records.len(), "loaded stored records");
                records
            }
            Err(e) => {
                warn!("Error reading from storage: {}", e);
                Vec::new()
            }
        }
    }

    fn save(&self, records: &[StoredRecord]) -> bool {
        match self.try_save(records) {
            Ok(()) => {
                debug!(path = %self.path.display(), count = records.len(), "saved records");
                true
            }
            Err(e) => {
                warn!("Error saving to storage: {}", e);
                false
            }
        }
    }
}

/// In-process store, used by the headless paths and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RefCell<Vec<StoredRecord>>,
    fail_saves: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<StoredRecord>) -> Self {
        Self {
            records: RefCell::new(records),
            fail_saves: false,
        }
    }

    /// A store whose every save fails.
    pub fn failing() -> Self {
        Self {
            records: RefCell::default(),
            fail_saves: true,
        }
    }

    pub fn snapshot(&self) -> Vec<StoredRecord> {
        self.records.borrow().clone()
    }
}

impl RecordStore for MemoryStore {
    fn load(&self) -> Vec<StoredRecord> {
        self.records.borrow().clone()
    }

    fn save(&self, records: &[StoredRecord]) -> bool {
        if self.fail_saves {
            warn!("Error saving to storage: memory store rejects writes");
            return false;
        }
        *self.records.borrow_mut() = records.to_vec();
        true
    }
}
