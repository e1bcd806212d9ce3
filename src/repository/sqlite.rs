//! SQLite repository.
//!
//! Photo rows carry both envelopes as separate columns. After the insert,
//! every write is an `UPDATE` of only the columns it owns; no statement ever
//! updates `original_*`, `owner_id` or `uploaded_at`.

use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::Repository;
use crate::crypto::{EncryptedBlob, NONCE_LEN, SALT_LEN, TAG_LEN};
use crate::error::{VaultError, VaultResult};
use crate::models::{PhotoId, Subject, SubjectId, User, UserId};
use crate::store::Photo;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS subjects (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        owner_id TEXT NOT NULL,
        UNIQUE (name, owner_id)
    );

    CREATE TABLE IF NOT EXISTS photos (
        id TEXT PRIMARY KEY,
        owner_id TEXT NOT NULL,
        subject_id TEXT,
        filename TEXT NOT NULL,
        mime_type TEXT NOT NULL,
        filter_applied TEXT,
        uploaded_at TEXT NOT NULL,
        original_ciphertext BLOB NOT NULL,
        original_salt BLOB NOT NULL,
        original_nonce BLOB NOT NULL,
        original_tag BLOB NOT NULL,
        ciphertext BLOB NOT NULL,
        salt BLOB NOT NULL,
        nonce BLOB NOT NULL,
        tag BLOB NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_photos_owner ON photos(owner_id);
    CREATE INDEX IF NOT EXISTS idx_subjects_owner ON subjects(owner_id);
"#;

const PHOTO_COLUMNS: &str = "id, owner_id, subject_id, filename, mime_type, filter_applied, \
     uploaded_at, original_ciphertext, original_salt, original_nonce, original_tag, \
     ciphertext, salt, nonce, tag";

/// Repository backed by a single SQLite connection
pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    /// Open (or create) a database file and apply the schema
    pub fn open<P: AsRef<Path>>(path: P) -> VaultResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    /// Private in-memory database
    pub fn in_memory() -> VaultResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> VaultResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn query_subjects(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> VaultResult<Vec<Subject>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut subjects = Vec::new();
        for row in rows {
            let (id, name, owner_id) = row?;
            subjects.push(Subject {
                id: parse_id(&id)?,
                name,
                owner_id: parse_id(&owner_id)?,
            });
        }
        Ok(subjects)
    }
}

impl Repository for SqliteRepository {
    fn get_user_by_username(&self, username: &str) -> VaultResult<Option<User>> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                "SELECT id, username, password_hash FROM users WHERE username = ?1",
                params![username],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, username, password_hash)| {
            Ok(User {
                id: parse_id(&id)?,
                username,
                password_hash,
            })
        })
        .transpose()
    }

    fn create_user(&self, user: &User) -> VaultResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO users (id, username, password_hash) VALUES (?1, ?2, ?3)",
            params![user.id.to_string(), user.username, user.password_hash],
        )?;
        Ok(())
    }

    fn get_photo(&self, id: PhotoId, owner_id: UserId) -> VaultResult<Option<Photo>> {
        let conn = self.conn.lock();
        let sql = format!("SELECT {} FROM photos WHERE id = ?1 AND owner_id = ?2", PHOTO_COLUMNS);
        let row = conn
            .query_row(
                &sql,
                params![id.to_string(), owner_id.to_string()],
                PhotoRow::read,
            )
            .optional()?;

        row.map(PhotoRow::into_photo).transpose()
    }

    fn insert_photo(&self, photo: &Photo) -> VaultResult<()> {
        let conn = self.conn.lock();
        let original = photo.original();
        let current = photo.current();

        conn.execute(
            &format!(
                "INSERT INTO photos ({}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                PHOTO_COLUMNS
            ),
            params![
                photo.id().to_string(),
                photo.owner_id().to_string(),
                photo.subject_id.map(|id| id.to_string()),
                photo.filename,
                photo.mime_type,
                photo.filter_applied,
                photo.uploaded_at().to_rfc3339(),
                original.ciphertext(),
                &original.salt()[..],
                &original.nonce()[..],
                &original.tag()[..],
                current.ciphertext(),
                &current.salt()[..],
                &current.nonce()[..],
                &current.tag()[..],
            ],
        )?;
        Ok(())
    }

    fn set_current(
        &self,
        id: PhotoId,
        owner_id: UserId,
        current: &EncryptedBlob,
        filter_applied: Option<&str>,
    ) -> VaultResult<()> {
        let conn = self.conn.lock();
        let updated = conn.execute(
            "UPDATE photos SET ciphertext = ?1, salt = ?2, nonce = ?3, tag = ?4, filter_applied = ?5 \
             WHERE id = ?6 AND owner_id = ?7",
            params![
                current.ciphertext(),
                &current.salt()[..],
                &current.nonce()[..],
                &current.tag()[..],
                filter_applied,
                id.to_string(),
                owner_id.to_string(),
            ],
        )?;
        expect_one_row(updated)
    }

    fn set_subject(&self, id: PhotoId, owner_id: UserId, subject_id: Option<SubjectId>) -> VaultResult<()> {
        let conn = self.conn.lock();
        let updated = conn.execute(
            "UPDATE photos SET subject_id = ?1 WHERE id = ?2 AND owner_id = ?3",
            params![subject_id.map(|s| s.to_string()), id.to_string(), owner_id.to_string()],
        )?;
        expect_one_row(updated)
    }

    fn list_photos_for_owner(&self, owner_id: UserId) -> VaultResult<Vec<Photo>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {} FROM photos WHERE owner_id = ?1 ORDER BY uploaded_at",
            PHOTO_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![owner_id.to_string()], PhotoRow::read)?;

        let mut photos = Vec::new();
        for row in rows {
            photos.push(row?.into_photo()?);
        }
        Ok(photos)
    }

    fn get_subject(&self, name: &str, owner_id: UserId) -> VaultResult<Option<Subject>> {
        let owner = owner_id.to_string();
        Ok(self
            .query_subjects(
                "SELECT id, name, owner_id FROM subjects WHERE name = ?1 AND owner_id = ?2",
                params![name, owner],
            )?
            .into_iter()
            .next())
    }

    fn get_subject_by_id(&self, id: SubjectId, owner_id: UserId) -> VaultResult<Option<Subject>> {
        let id = id.to_string();
        let owner = owner_id.to_string();
        Ok(self
            .query_subjects(
                "SELECT id, name, owner_id FROM subjects WHERE id = ?1 AND owner_id = ?2",
                params![id, owner],
            )?
            .into_iter()
            .next())
    }

    fn save_subject(&self, subject: &Subject) -> VaultResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO subjects (id, name, owner_id) VALUES (?1, ?2, ?3)",
            params![subject.id.to_string(), subject.name, subject.owner_id.to_string()],
        )?;
        Ok(())
    }

    fn list_subjects_for_owner(&self, owner_id: UserId) -> VaultResult<Vec<Subject>> {
        let owner = owner_id.to_string();
        self.query_subjects(
            "SELECT id, name, owner_id FROM subjects WHERE owner_id = ?1 ORDER BY name",
            params![owner],
        )
    }
}

/// Raw photo columns, converted outside the rusqlite row callback
struct PhotoRow {
    id: String,
    owner_id: String,
    subject_id: Option<String>,
    filename: String,
    mime_type: String,
    filter_applied: Option<String>,
    uploaded_at: String,
    original: [Vec<u8>; 4],
    current: [Vec<u8>; 4],
}

impl PhotoRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            subject_id: row.get(2)?,
            filename: row.get(3)?,
            mime_type: row.get(4)?,
            filter_applied: row.get(5)?,
            uploaded_at: row.get(6)?,
            original: [row.get(7)?, row.get(8)?, row.get(9)?, row.get(10)?],
            current: [row.get(11)?, row.get(12)?, row.get(13)?, row.get(14)?],
        })
    }

    fn into_photo(self) -> VaultResult<Photo> {
        let uploaded_at = DateTime::parse_from_rfc3339(&self.uploaded_at)
            .map_err(|e| VaultError::Database(format!("bad uploaded_at: {}", e)))?
            .with_timezone(&Utc);

        Ok(Photo::from_storage(
            parse_id(&self.id)?,
            self.filename,
            self.mime_type,
            self.filter_applied,
            self.subject_id.as_deref().map(parse_id).transpose()?,
            uploaded_at,
            parse_id(&self.owner_id)?,
            blob_from_columns(self.original)?,
            blob_from_columns(self.current)?,
        ))
    }
}

fn blob_from_columns([ciphertext, salt, nonce, tag]: [Vec<u8>; 4]) -> VaultResult<EncryptedBlob> {
    Ok(EncryptedBlob::from_parts(
        ciphertext,
        fixed::<SALT_LEN>(salt, "salt")?,
        fixed::<NONCE_LEN>(nonce, "nonce")?,
        fixed::<TAG_LEN>(tag, "tag")?,
    ))
}

fn fixed<const N: usize>(bytes: Vec<u8>, column: &str) -> VaultResult<[u8; N]> {
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| VaultError::Database(format!("{} has {} bytes, expected {}", column, b.len(), N)))
}

fn expect_one_row(updated: usize) -> VaultResult<()> {
    match updated {
        0 => Err(VaultError::NotFound("Photo")),
        _ => Ok(()),
    }
}

fn parse_id(raw: &str) -> VaultResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| VaultError::Database(format!("bad id {}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::contract;
    use tempfile::tempdir;

    #[test]
    fn test_users_are_unique() {
        contract::users_are_unique(&SqliteRepository::in_memory().unwrap());
    }

    #[test]
    fn test_photos_are_scoped_to_owner() {
        contract::photos_are_scoped_to_owner(&SqliteRepository::in_memory().unwrap());
    }

    #[test]
    fn test_photo_updates_keep_original() {
        contract::photo_updates_keep_original(&SqliteRepository::in_memory().unwrap());
    }

    #[test]
    fn test_targeted_writes_do_not_clobber() {
        contract::targeted_writes_do_not_clobber(&SqliteRepository::in_memory().unwrap());
    }

    #[test]
    fn test_targeted_writes_respect_owner() {
        contract::targeted_writes_respect_owner(&SqliteRepository::in_memory().unwrap());
    }

    #[test]
    fn test_subjects_are_unique_per_owner() {
        contract::subjects_are_unique_per_owner(&SqliteRepository::in_memory().unwrap());
    }

    #[test]
    fn test_reopen_file_database() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db").join("gallery.db");

        let user = User::new("carol", "hash".into());
        {
            let repo = SqliteRepository::open(&path).unwrap();
            repo.create_user(&user).unwrap();
        }

        let repo = SqliteRepository::open(&path).unwrap();
        assert_eq!(repo.get_user_by_username("carol").unwrap(), Some(user));
    }
}
