//! In-process repository, used by tests and embedders without a database.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::Repository;
use crate::crypto::EncryptedBlob;
use crate::error::{VaultError, VaultResult};
use crate::models::{PhotoId, Subject, SubjectId, User, UserId};
use crate::store::Photo;

/// Repository backed by hash maps
#[derive(Default)]
pub struct MemoryRepository {
    users: RwLock<HashMap<String, User>>,
    photos: RwLock<HashMap<PhotoId, Photo>>,
    subjects: RwLock<HashMap<SubjectId, Subject>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Repository for MemoryRepository {
    fn get_user_by_username(&self, username: &str) -> VaultResult<Option<User>> {
        Ok(self.users.read().get(username).cloned())
    }

    fn create_user(&self, user: &User) -> VaultResult<()> {
        let mut users = self.users.write();
        if users.contains_key(&user.username) {
            return Err(VaultError::Conflict(format!("username {}", user.username)));
        }
        users.insert(user.username.clone(), user.clone());
        Ok(())
    }

    fn get_photo(&self, id: PhotoId, owner_id: UserId) -> VaultResult<Option<Photo>> {
        Ok(self
            .photos
            .read()
            .get(&id)
            .filter(|p| p.owner_id() == owner_id)
            .cloned())
    }

    fn insert_photo(&self, photo: &Photo) -> VaultResult<()> {
        let mut photos = self.photos.write();
        if photos.contains_key(&photo.id()) {
            return Err(VaultError::Conflict(format!("photo {}", photo.id())));
        }
        photos.insert(photo.id(), photo.clone());
        Ok(())
    }

    fn set_current(
        &self,
        id: PhotoId,
        owner_id: UserId,
        current: &EncryptedBlob,
        filter_applied: Option<&str>,
    ) -> VaultResult<()> {
        let mut photos = self.photos.write();
        let photo = owned_mut(&mut photos, id, owner_id)?;
        photo.set_current(current.clone(), filter_applied.map(str::to_string));
        Ok(())
    }

    fn set_subject(&self, id: PhotoId, owner_id: UserId, subject_id: Option<SubjectId>) -> VaultResult<()> {
        let mut photos = self.photos.write();
        owned_mut(&mut photos, id, owner_id)?.subject_id = subject_id;
        Ok(())
    }

    fn list_photos_for_owner(&self, owner_id: UserId) -> VaultResult<Vec<Photo>> {
        let mut photos: Vec<Photo> = self
            .photos
            .read()
            .values()
            .filter(|p| p.owner_id() == owner_id)
            .cloned()
            .collect();
        photos.sort_by_key(|p| p.uploaded_at());
        Ok(photos)
    }

    fn get_subject(&self, name: &str, owner_id: UserId) -> VaultResult<Option<Subject>> {
        Ok(self
            .subjects
            .read()
            .values()
            .find(|s| s.name == name && s.owner_id == owner_id)
            .cloned())
    }

    fn get_subject_by_id(&self, id: SubjectId, owner_id: UserId) -> VaultResult<Option<Subject>> {
        Ok(self
            .subjects
            .read()
            .get(&id)
            .filter(|s| s.owner_id == owner_id)
            .cloned())
    }

    fn save_subject(&self, subject: &Subject) -> VaultResult<()> {
        let mut subjects = self.subjects.write();
        if subjects
            .values()
            .any(|s| s.name == subject.name && s.owner_id == subject.owner_id)
        {
            return Err(VaultError::Conflict(format!("subject {}", subject.name)));
        }
        subjects.insert(subject.id, subject.clone());
        Ok(())
    }

    fn list_subjects_for_owner(&self, owner_id: UserId) -> VaultResult<Vec<Subject>> {
        Ok(self
            .subjects
            .read()
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect())
    }
}

fn owned_mut(photos: &mut HashMap<PhotoId, Photo>, id: PhotoId, owner_id: UserId) -> VaultResult<&mut Photo> {
    photos
        .get_mut(&id)
        .filter(|p| p.owner_id() == owner_id)
        .ok_or(VaultError::NotFound("Photo"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::contract;

    #[test]
    fn test_users_are_unique() {
        contract::users_are_unique(&MemoryRepository::new());
    }

    #[test]
    fn test_photos_are_scoped_to_owner() {
        contract::photos_are_scoped_to_owner(&MemoryRepository::new());
    }

    #[test]
    fn test_photo_updates_keep_original() {
        contract::photo_updates_keep_original(&MemoryRepository::new());
    }

    #[test]
    fn test_targeted_writes_do_not_clobber() {
        contract::targeted_writes_do_not_clobber(&MemoryRepository::new());
    }

    #[test]
    fn test_targeted_writes_respect_owner() {
        contract::targeted_writes_respect_owner(&MemoryRepository::new());
    }

    #[test]
    fn test_subjects_are_unique_per_owner() {
        contract::subjects_are_unique_per_owner(&MemoryRepository::new());
    }
}
