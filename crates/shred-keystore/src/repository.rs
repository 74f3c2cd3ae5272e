//! Key repository contract

use shred_core::SubjectId;

use crate::error::KeyStoreResult;
use crate::record::KeyRecord;

/// Durable map from subject id to that subject's current key record.
///
/// The repository is the only stateful piece of the crypto-shredding model.
/// Implementations must make each mutation atomic per subject, so a
/// `destroy` racing a `find_or_create` either wins completely or not at all.
pub trait KeyRepository: Send + Sync {
    /// Current record for the subject, or `NotFound`.
    fn find(&self, subject: &SubjectId) -> KeyStoreResult<KeyRecord>;

    /// Store a record, replacing any existing one.
    fn save(&self, subject: &SubjectId, record: KeyRecord) -> KeyStoreResult<()>;

    /// Crypto-shred the subject. Idempotent: destroying a missing subject
    /// succeeds and returns `false`.
    fn destroy(&self, subject: &SubjectId) -> KeyStoreResult<bool>;

    /// Return the current record, provisioning one with `create` if absent.
    fn find_or_create(
        &self,
        subject: &SubjectId,
        create: &mut dyn FnMut() -> KeyStoreResult<KeyRecord>,
    ) -> KeyStoreResult<KeyRecord>;

    /// Swap in a new record for an existing subject, returning the previous
    /// one. `NotFound` if the subject has no record.
    fn replace(&self, subject: &SubjectId, record: KeyRecord) -> KeyStoreResult<KeyRecord>;

    /// Number of subjects with live key material.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
