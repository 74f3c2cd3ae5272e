//! Backend selection from configuration

use shred_core::config::{KeyStoreBackendKind, KeyStoreConfig};
use shred_core::SubjectId;

use crate::error::{KeyStoreError, KeyStoreResult};
use crate::file::JsonFileKeyRepository;
use crate::memory::InMemoryKeyRepository;
use crate::record::KeyRecord;
use crate::repository::KeyRepository;

/// Dispatch enum over the built-in repositories.
#[derive(Debug)]
pub enum KeyStoreBackend {
    Memory(InMemoryKeyRepository),
    Json(JsonFileKeyRepository),
}

impl KeyStoreBackend {
    pub fn open(config: &KeyStoreConfig) -> KeyStoreResult<Self> {
        match config.backend {
            KeyStoreBackendKind::Memory => {
                tracing::warn!("using in-memory key store: key material is lost on exit");
                Ok(Self::Memory(InMemoryKeyRepository::new()))
            }
            KeyStoreBackendKind::Json => {
                let path = config.path.as_deref().ok_or_else(|| {
                    KeyStoreError::Config("keystore.path is required for the json backend".into())
                })?;
                tracing::debug!(path = %path.display(), "opening json key store");
                Ok(Self::Json(JsonFileKeyRepository::open(path)?))
            }
        }
    }

    fn inner(&self) -> &dyn KeyRepository {
        match self {
            Self::Memory(repo) => repo,
            Self::Json(repo) => repo,
        }
    }
}

impl KeyRepository for KeyStoreBackend {
    fn find(&self, subject: &SubjectId) -> KeyStoreResult<KeyRecord> {
        self.inner().find(subject)
    }

    fn save(&self, subject: &SubjectId, record: KeyRecord) -> KeyStoreResult<()> {
        self.inner().save(subject, record)
    }

    fn destroy(&self, subject: &SubjectId) -> KeyStoreResult<bool> {
        self.inner().destroy(subject)
    }

    fn find_or_create(
        &self,
        subject: &SubjectId,
        create: &mut dyn FnMut() -> KeyStoreResult<KeyRecord>,
    ) -> KeyStoreResult<KeyRecord> {
        self.inner().find_or_create(subject, create)
    }

    fn replace(&self, subject: &SubjectId, record: KeyRecord) -> KeyStoreResult<KeyRecord> {
        self.inner().replace(subject, record)
    }

    fn len(&self) -> usize {
        self.inner().len()
    }
}
