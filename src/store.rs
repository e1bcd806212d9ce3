//! Gallery Vault - Encrypted Object Store
//!
//! The [`Photo`] entity and its lifecycle. Every photo carries two envelopes:
//! `original`, sealed once at upload and never touched again, and `current`,
//! which is what readers get and what filters replace. Neither plaintext nor
//! the gallery password is ever kept on the entity.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use uuid::Uuid;

use crate::crypto::EncryptedBlob;
use crate::error::VaultResult;
use crate::models::{PhotoId, PhotoSummary, SubjectId, UserId};

/// Fallback MIME type for unrecognised content
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Plaintext handed in by an upload
pub struct NewPhoto<'a> {
    pub plaintext: &'a [u8],
    pub filename: &'a str,
    pub mime_type: &'a str,
    pub owner_id: UserId,
    pub subject_id: Option<SubjectId>,
}

/// Encrypted photo entity
#[derive(Debug, Clone)]
pub struct Photo {
    id: PhotoId,
    pub filename: String,
    pub mime_type: String,
    /// `None` while `current` still equals `original`
    pub filter_applied: Option<String>,
    pub subject_id: Option<SubjectId>,
    uploaded_at: DateTime<Utc>,
    owner_id: UserId,
    original: EncryptedBlob,
    current: EncryptedBlob,
}

impl Photo {
    // ═══════════════════════════════════════════════════════════════════════
    // TRANSITIONS
    // ═══════════════════════════════════════════════════════════════════════

    /// Encrypt an upload once and store the envelope as both `original` and
    /// `current`.
    pub fn create(new: NewPhoto<'_>, password: &SecretString) -> VaultResult<Self> {
        let blob = EncryptedBlob::seal(new.plaintext, password)?;

        Ok(Self {
            id: Uuid::new_v4(),
            filename: new.filename.to_string(),
            mime_type: new.mime_type.to_string(),
            filter_applied: None,
            subject_id: new.subject_id,
            uploaded_at: Utc::now(),
            owner_id: new.owner_id,
            original: blob.clone(),
            current: blob,
        })
    }

    /// Decrypt the `current` envelope.
    ///
    /// A wrong password and a corrupted envelope both surface as
    /// `VaultError::DecryptionFailed`.
    pub fn read(&self, password: &SecretString) -> VaultResult<Vec<u8>> {
        Ok(self.current.open(password)?)
    }

    /// Byte-for-byte copy under a new id, without re-encryption.
    pub fn duplicate(&self, new_owner: UserId) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: duplicated_filename(&self.filename),
            mime_type: self.mime_type.clone(),
            filter_applied: self.filter_applied.clone(),
            subject_id: self.subject_id,
            uploaded_at: Utc::now(),
            owner_id: new_owner,
            original: self.original.clone(),
            current: self.current.clone(),
        }
    }

    /// Point `current` back at the untouched upload.
    pub(crate) fn restore_original(&mut self) {
        self.current = self.original.clone();
        self.filter_applied = None;
    }

    /// Install a freshly sealed derived envelope.
    pub(crate) fn replace_current(&mut self, blob: EncryptedBlob, filter_name: &str) {
        self.set_current(blob, Some(filter_name.to_string()));
    }

    pub(crate) fn set_current(&mut self, blob: EncryptedBlob, filter_applied: Option<String>) {
        self.current = blob;
        self.filter_applied = filter_applied;
    }

    // ═══════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════

    /// Rebuild an entity from persisted columns
    #[allow(clippy::too_many_arguments)]
    pub fn from_storage(
        id: PhotoId,
        filename: String,
        mime_type: String,
        filter_applied: Option<String>,
        subject_id: Option<SubjectId>,
        uploaded_at: DateTime<Utc>,
        owner_id: UserId,
        original: EncryptedBlob,
        current: EncryptedBlob,
    ) -> Self {
        Self {
            id,
            filename,
            mime_type,
            filter_applied,
            subject_id,
            uploaded_at,
            owner_id,
            original,
            current,
        }
    }

    pub fn id(&self) -> PhotoId {
        self.id
    }

    pub fn uploaded_at(&self) -> DateTime<Utc> {
        self.uploaded_at
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn original(&self) -> &EncryptedBlob {
        &self.original
    }

    pub fn current(&self) -> &EncryptedBlob {
        &self.current
    }

    /// Listing view, with the subject name resolved by the caller
    pub fn summary(&self, subject_name: Option<String>) -> PhotoSummary {
        PhotoSummary {
            id: self.id,
            filename: self.filename.clone(),
            filter_applied: self.filter_applied.clone(),
            uploaded_at: self.uploaded_at,
            owner_id: self.owner_id,
            subject_id: self.subject_id,
            subject_name,
            mime_type: self.mime_type.clone(),
        }
    }
}

/// `holiday.v2.jpg` becomes `holiday.v2_duplicated.jpg`; names without a dot
/// just get the suffix.
pub fn duplicated_filename(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((base, ext)) => format!("{}_duplicated.{}", base, ext),
        None => format!("{}_duplicated", filename),
    }
}

/// Detect MIME type from file content
pub fn detect_mime(data: &[u8]) -> &'static str {
    if data.len() < 8 {
        return OCTET_STREAM;
    }

    match &data[0..8] {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A] => "image/png",
        [0x47, 0x49, 0x46, 0x38, ..] => "image/gif",
        [0x52, 0x49, 0x46, 0x46, ..] => {
            if data.len() >= 12 && &data[8..12] == b"WEBP" {
                "image/webp"
            } else {
                OCTET_STREAM
            }
        }
        _ => {
            if data.len() >= 12 && &data[4..8] == b"ftyp" {
                match &data[8..12] {
                    b"heic" | b"heix" => return "image/heic",
                    b"mif1" => return "image/heif",
                    _ => {}
                }
            }
            OCTET_STREAM
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VaultError;

    fn pw(s: &str) -> SecretString {
        SecretString::new(s.to_string())
    }

    fn upload(owner: UserId) -> Photo {
        Photo::create(
            NewPhoto {
                plaintext: b"redsquare",
                filename: "square.png",
                mime_type: "image/png",
                owner_id: owner,
                subject_id: None,
            },
            &pw("pw1"),
        )
        .unwrap()
    }

    #[test]
    fn test_create_stores_same_envelope_twice() {
        let owner = Uuid::new_v4();
        let photo = upload(owner);

        assert_eq!(photo.original(), photo.current());
        assert_eq!(photo.filter_applied, None);
        assert_eq!(photo.owner_id(), owner);
        assert_eq!(photo.read(&pw("pw1")).unwrap(), b"redsquare");
    }

    #[test]
    fn test_read_with_wrong_password() {
        let photo = upload(Uuid::new_v4());
        assert!(matches!(photo.read(&pw("nope")), Err(VaultError::DecryptionFailed)));
    }

    #[test]
    fn test_duplicate_copies_envelopes_verbatim() {
        let owner = Uuid::new_v4();
        let mut photo = upload(owner);
        photo.subject_id = Some(Uuid::new_v4());

        let mut copy = photo.duplicate(owner);
        assert_ne!(copy.id(), photo.id());
        assert_eq!(copy.filename, "square_duplicated.png");
        assert_eq!(copy.original(), photo.original());
        assert_eq!(copy.current(), photo.current());
        assert_eq!(copy.subject_id, photo.subject_id);
        assert!(copy.uploaded_at() >= photo.uploaded_at());

        copy.subject_id = None;
        assert!(photo.subject_id.is_some());
        assert_eq!(copy.read(&pw("pw1")).unwrap(), b"redsquare");
    }

    #[test]
    fn test_duplicated_filename_splits_on_last_dot() {
        assert_eq!(duplicated_filename("orig.jpg"), "orig_duplicated.jpg");
        assert_eq!(duplicated_filename("a.b.c.png"), "a.b.c_duplicated.png");
        assert_eq!(duplicated_filename("README"), "README_duplicated");
    }

    #[test]
    fn test_detect_mime() {
        assert_eq!(detect_mime(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0]), "image/jpeg");
        assert_eq!(
            detect_mime(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0]),
            "image/png"
        );
        assert_eq!(detect_mime(b"RIFF\0\0\0\0WEBPVP8 "), "image/webp");
        assert_eq!(detect_mime(b"\0\0\0\x18ftypheic"), "image/heic");
        assert_eq!(detect_mime(b"short"), OCTET_STREAM);
    }
}
