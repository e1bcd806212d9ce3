//! Gallery Vault - Subject Catalog
//!
//! Per-owner subject names. The repository's uniqueness constraint on
//! `(name, owner)` is the source of truth; the lookup before each insert is
//! only a fast path. When two callers race to create the same subject the
//! loser's insert fails with `Conflict`, and [`SubjectCatalog::resolve_or_create`]
//! then returns the winner's row.

use std::sync::Arc;

use crate::error::{VaultError, VaultResult};
use crate::models::{Subject, UserId};
use crate::repository::Repository;

pub struct SubjectCatalog {
    repo: Arc<dyn Repository>,
}

impl SubjectCatalog {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Get-or-create by `(name, owner)`
    pub fn resolve_or_create(&self, name: &str, owner_id: UserId) -> VaultResult<Subject> {
        if let Some(existing) = self.repo.get_subject(name, owner_id)? {
            return Ok(existing);
        }

        let subject = Subject::new(name, owner_id);
        match self.repo.save_subject(&subject) {
            Ok(()) => {
                log::info!("Created subject '{}' ({})", subject.name, subject.id);
                Ok(subject)
            }
            Err(VaultError::Conflict(_)) => {
                log::debug!("Subject '{}' created concurrently, re-reading", name);
                self.repo
                    .get_subject(name, owner_id)?
                    .ok_or_else(|| VaultError::Internal(format!("subject '{}' vanished after conflict", name)))
            }
            Err(e) => Err(e),
        }
    }

    /// Strict create; `Conflict` if the owner already has this name
    pub fn create(&self, name: &str, owner_id: UserId) -> VaultResult<Subject> {
        if self.repo.get_subject(name, owner_id)?.is_some() {
            return Err(VaultError::Conflict("Subject already exists".into()));
        }

        let subject = Subject::new(name, owner_id);
        self.repo.save_subject(&subject).map_err(|e| match e {
            VaultError::Conflict(_) => VaultError::Conflict("Subject already exists".into()),
            other => other,
        })?;

        log::info!("Created subject '{}' ({})", subject.name, subject.id);
        Ok(subject)
    }

    pub fn list_for_owner(&self, owner_id: UserId) -> VaultResult<Vec<Subject>> {
        self.repo.list_subjects_for_owner(owner_id)
    }
}
