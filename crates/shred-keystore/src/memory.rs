//! Process-local key repository

use shred_core::SubjectId;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::error::{KeyStoreError, KeyStoreResult};
use crate::record::KeyRecord;
use crate::repository::KeyRepository;

/// In-memory repository. Key material lives only as long as the process.
#[derive(Debug, Default)]
pub struct InMemoryKeyRepository {
    records: RwLock<HashMap<SubjectId, KeyRecord>>,
}

impl InMemoryKeyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyRepository for InMemoryKeyRepository {
    fn find(&self, subject: &SubjectId) -> KeyStoreResult<KeyRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(subject)
            .cloned()
            .ok_or_else(|| KeyStoreError::NotFound(subject.clone()))
    }

    fn save(&self, subject: &SubjectId, record: KeyRecord) -> KeyStoreResult<()> {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(subject.clone(), record);
        Ok(())
    }

    fn destroy(&self, subject: &SubjectId) -> KeyStoreResult<bool> {
        Ok(self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(subject)
            .is_some())
    }

    fn find_or_create(
        &self,
        subject: &SubjectId,
        create: &mut dyn FnMut() -> KeyStoreResult<KeyRecord>,
    ) -> KeyStoreResult<KeyRecord> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(record) = records.get(subject) {
            return Ok(record.clone());
        }
        let record = create()?;
        records.insert(subject.clone(), record.clone());
        Ok(record)
    }

    fn replace(&self, subject: &SubjectId, record: KeyRecord) -> KeyStoreResult<KeyRecord> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        match records.get_mut(subject) {
            Some(current) => Ok(std::mem::replace(current, record)),
            None => Err(KeyStoreError::NotFound(subject.clone())),
        }
    }

    fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
