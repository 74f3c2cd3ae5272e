//! JSON file key repository
//!
//! Loads entirely into memory on open. Every mutation is written through
//! before it becomes visible: the new map is serialized to a temp file next
//! to the store, renamed over it, and the directory entry is synced, so a
//! crash leaves either the old or the new file, never a partial one. A
//! destroy is durable once it returns. If the write fails the temp file is
//! removed and the in-memory entry is restored.
//!
//! Reads that need no mutation (`find`, `find_or_create` for a provisioned
//! subject, `destroy` of an unknown subject) never touch the disk.
//!
//! File layout:
//! ```text
//! { "<subject id>": { "generation": "<uuid>", "created_at": 0,
//!                     "details": { "encryption": "aes256gcm", "key": "<base64>" } } }
//! ```

use anyhow::Context;
use shred_core::SubjectId;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use crate::error::{KeyStoreError, KeyStoreResult};
use crate::record::KeyRecord;
use crate::repository::KeyRepository;

type Records = BTreeMap<SubjectId, KeyRecord>;

#[derive(Debug)]
pub struct JsonFileKeyRepository {
    path: PathBuf,
    records: RwLock<Records>,
}

impl JsonFileKeyRepository {
    /// Open or create a key store at the given path.
    /// A missing file starts an empty store; a malformed one is an error.
    pub fn open(path: &Path) -> KeyStoreResult<Self> {
        let records = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading key store: {}", path.display()))?;
            serde_json::from_str::<Records>(&content)
                .with_context(|| format!("parsing key store: {}", path.display()))?
        } else {
            Records::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            records: RwLock::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Set (`Some`) or remove (`None`) one subject's entry and persist the map.
    ///
    /// Must be called with the write lock held. Returns the previous entry.
    fn write_through(
        &self,
        records: &mut Records,
        subject: &SubjectId,
        entry: Option<KeyRecord>,
    ) -> KeyStoreResult<Option<KeyRecord>> {
        let previous = match entry {
            Some(record) => records.insert(subject.clone(), record),
            None => records.remove(subject),
        };

        if let Err(e) = persist(&self.path, records) {
            match previous {
                Some(record) => {
                    records.insert(subject.clone(), record);
                }
                None => {
                    records.remove(subject);
                }
            }
            return Err(e.into());
        }
        Ok(previous)
    }
}

/// Sibling temp file, `.<name>.tmp`, so it never aliases the store itself.
fn temp_path(path: &Path) -> PathBuf {
    let name = path.file_name().unwrap_or_default().to_string_lossy();
    path.with_file_name(format!(".{name}.tmp"))
}

fn persist(path: &Path, records: &Records) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent)
        .with_context(|| format!("creating key store dir: {}", parent.display()))?;

    let json = serde_json::to_vec_pretty(records).context("serializing key store")?;

    let tmp_path = temp_path(path);
    let replaced = replace_file(&tmp_path, path, &json);
    if replaced.is_err() {
        // The temp file holds every subject's key material.
        let _ = std::fs::remove_file(&tmp_path);
    }
    replaced?;

    // The new file is already in place, so memory must follow it either way.
    if let Err(e) = sync_dir(parent) {
        tracing::warn!(dir = %parent.display(), "key store directory sync failed: {e}");
    }
    Ok(())
}

fn replace_file(tmp_path: &Path, path: &Path, contents: &[u8]) -> anyhow::Result<()> {
    let mut file = open_private(tmp_path)
        .with_context(|| format!("creating key store temp: {}", tmp_path.display()))?;
    file.write_all(contents)
        .and_then(|()| file.sync_all())
        .with_context(|| format!("writing key store temp: {}", tmp_path.display()))?;
    drop(file);
    std::fs::rename(tmp_path, path)
        .with_context(|| format!("renaming key store: {}", path.display()))
}

/// Key material must not be world-readable.
#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<std::fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<std::fs::File> {
    std::fs::File::create(path)
}

/// Persist the rename itself, so a destroyed key cannot reappear after a crash.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

impl KeyRepository for JsonFileKeyRepository {
    fn find(&self, subject: &SubjectId) -> KeyStoreResult<KeyRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(subject)
            .cloned()
            .ok_or_else(|| KeyStoreError::NotFound(subject.clone()))
    }

    fn save(&self, subject: &SubjectId, record: KeyRecord) -> KeyStoreResult<()> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        self.write_through(&mut records, subject, Some(record))?;
        Ok(())
    }

    fn destroy(&self, subject: &SubjectId) -> KeyStoreResult<bool> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if !records.contains_key(subject) {
            return Ok(false);
        }
        self.write_through(&mut records, subject, None)?;
        Ok(true)
    }

    fn find_or_create(
        &self,
        subject: &SubjectId,
        create: &mut dyn FnMut() -> KeyStoreResult<KeyRecord>,
    ) -> KeyStoreResult<KeyRecord> {
        if let Ok(record) = self.find(subject) {
            return Ok(record);
        }

        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        // Another writer may have provisioned between the two locks.
        if let Some(record) = records.get(subject) {
            return Ok(record.clone());
        }
        let record = create()?;
        self.write_through(&mut records, subject, Some(record.clone()))?;
        Ok(record)
    }

    fn replace(&self, subject: &SubjectId, record: KeyRecord) -> KeyStoreResult<KeyRecord> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if !records.contains_key(subject) {
            return Err(KeyStoreError::NotFound(subject.clone()));
        }
        self.write_through(&mut records, subject, Some(record))?
            .ok_or_else(|| KeyStoreError::NotFound(subject.clone()))
    }

    fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
