//! Gallery Vault - Persistence
//!
//! Storage is behind the [`Repository`] trait. Each call is its own unit of
//! work; the core never needs a transaction that spans calls. Uniqueness of
//! usernames and of `(subject name, owner)` is enforced here, not by callers:
//! a duplicate insert must come back as `VaultError::Conflict`.

mod memory;
mod sqlite;

pub use memory::MemoryRepository;
pub use sqlite::SqliteRepository;

use crate::crypto::EncryptedBlob;
use crate::error::VaultResult;
use crate::models::{PhotoId, Subject, SubjectId, User, UserId};
use crate::store::Photo;

/// Storage backend for users, photos and subjects
pub trait Repository: Send + Sync {
    fn get_user_by_username(&self, username: &str) -> VaultResult<Option<User>>;

    /// Insert a user; `Conflict` if the username is taken
    fn create_user(&self, user: &User) -> VaultResult<()>;

    /// `None` when the photo is missing or belongs to another owner
    fn get_photo(&self, id: PhotoId, owner_id: UserId) -> VaultResult<Option<Photo>>;

    /// Insert a new photo row; `Conflict` if the id exists
    fn insert_photo(&self, photo: &Photo) -> VaultResult<()>;

    /// Replace the `current` envelope and `filter_applied`, nothing else.
    /// `NotFound` when the photo is missing or foreign.
    fn set_current(
        &self,
        id: PhotoId,
        owner_id: UserId,
        current: &EncryptedBlob,
        filter_applied: Option<&str>,
    ) -> VaultResult<()>;

    /// Replace `subject_id`, nothing else. `NotFound` when the photo is
    /// missing or foreign.
    fn set_subject(&self, id: PhotoId, owner_id: UserId, subject_id: Option<SubjectId>) -> VaultResult<()>;

    fn list_photos_for_owner(&self, owner_id: UserId) -> VaultResult<Vec<Photo>>;

    fn get_subject(&self, name: &str, owner_id: UserId) -> VaultResult<Option<Subject>>;

    fn get_subject_by_id(&self, id: SubjectId, owner_id: UserId) -> VaultResult<Option<Subject>>;

    /// Insert a subject; `Conflict` if `(name, owner_id)` already exists
    fn save_subject(&self, subject: &Subject) -> VaultResult<()>;

    fn list_subjects_for_owner(&self, owner_id: UserId) -> VaultResult<Vec<Subject>>;
}
