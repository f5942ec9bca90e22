//! JSON file local store
//!
//! Keeps the client's persisted identifiers in `storage.json` inside the
//! shop directory. Reads hold a shared lock and rewrites an exclusive one,
//! so concurrent processes never see a torn file. Logical races between
//! them (two shells creating two carts) are not prevented.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::domain::result::{Error, Result};
use crate::ports::LocalStore;

pub const STORAGE_FILENAME: &str = "storage.json";

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store backed by `storage.json` in `dir`
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(STORAGE_FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read under a shared lock so a concurrent rewrite is never seen half-done
    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        FileExt::lock_shared(&file)
            .map_err(|e| Error::storage(format!("Failed to lock {}: {}", self.path.display(), e)))?;

        let mut content = String::new();
        let read = file.read_to_string(&mut content);
        let _ = FileExt::unlock(&file);
        read?;
        Ok(parse_entries(&content))
    }

    /// Read-modify-write the whole file under an exclusive lock
    fn update<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        file.lock_exclusive()
            .map_err(|e| Error::storage(format!("Failed to lock {}: {}", self.path.display(), e)))?;

        let result = rewrite(&mut file, apply);
        let _ = FileExt::unlock(&file);
        result
    }
}

fn parse_entries(content: &str) -> BTreeMap<String, String> {
    if content.trim().is_empty() {
        return BTreeMap::new();
    }
    // A corrupt file is treated as empty, like cleared browser storage
    serde_json::from_str(content).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "discarding unreadable local storage file");
        BTreeMap::new()
    })
}

fn rewrite<F>(file: &mut File, apply: F) -> Result<()>
where
    F: FnOnce(&mut BTreeMap<String, String>),
{
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    let mut entries = parse_entries(&content);

    apply(&mut entries);

    let serialized = serde_json::to_string_pretty(&entries)?;
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(serialized.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|entries| {
            entries.remove(key);
        })
    }
}
