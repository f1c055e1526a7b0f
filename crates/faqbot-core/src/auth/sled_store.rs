//! Local user directory on sled.
//!
//! Two trees: `users` (username -> JSON [`UserRecord`]) and `user_emails`
//! (email -> username). Inserts touch both inside one transaction, so the
//! uniqueness of either key holds even under concurrent registrations.

use super::directory::{ConflictField, DirectoryError, UserDirectory, UserRecord};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};
use std::path::Path;

const USERS_TREE: &str = "users";
const EMAILS_TREE: &str = "user_emails";

pub struct SledUserDirectory {
    _db: Db,
    users: Tree,
    emails: Tree,
}

impl SledUserDirectory {
    /// Opens or creates the user DB at the given path.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, sled::Error> {
        Self::from_db(sled::open(path)?)
    }

    /// In-memory DB removed on drop; for tests and dry runs.
    pub fn temporary() -> Result<Self, sled::Error> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: Db) -> Result<Self, sled::Error> {
        let users = db.open_tree(USERS_TREE)?;
        let emails = db.open_tree(EMAILS_TREE)?;
        Ok(Self { _db: db, users, emails })
    }

    /// Number of registered users.
    pub fn count(&self) -> usize {
        self.users.len()
    }
}

#[async_trait::async_trait]
impl UserDirectory for SledUserDirectory {
    fn name(&self) -> &str {
        "sled"
    }

    async fn find_conflict(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<ConflictField>, DirectoryError> {
        if self.users.contains_key(username.as_bytes())? {
            return Ok(Some(ConflictField::Username));
        }
        if self.emails.contains_key(email.as_bytes())? {
            return Ok(Some(ConflictField::Email));
        }
        Ok(None)
    }

    async fn insert(&self, record: &UserRecord) -> Result<(), DirectoryError> {
        let bytes = record.to_bytes();
        let result = (&self.users, &self.emails).transaction(|(users, emails)| {
            if users.get(record.username.as_bytes())?.is_some() {
                return Err(ConflictableTransactionError::Abort(ConflictField::Username));
            }
            if emails.get(record.email.as_bytes())?.is_some() {
                return Err(ConflictableTransactionError::Abort(ConflictField::Email));
            }
            users.insert(record.username.as_bytes(), bytes.as_slice())?;
            emails.insert(record.email.as_bytes(), record.username.as_bytes())?;
            Ok::<(), ConflictableTransactionError<ConflictField>>(())
        });

        match result {
            Ok(()) => {
                tracing::info!(
                    target: "faqbot::auth",
                    backend = "sled",
                    username = %record.username,
                    "Inserted user '{}'",
                    record.username
                );
                Ok(())
            }
            Err(TransactionError::Abort(field)) => Err(DirectoryError::Conflict(field)),
            Err(TransactionError::Storage(e)) => Err(DirectoryError::Sled(e)),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, DirectoryError> {
        let Some(bytes) = self.users.get(username.as_bytes())? else {
            return Ok(None);
        };
        let record = serde_json::from_slice(&bytes)?;
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(username: &str, email: &str) -> UserRecord {
        UserRecord {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: format!("hash-of-{}", username),
        }
    }

    #[tokio::test]
    async fn insert_then_lookup() {
        let dir = SledUserDirectory::temporary().unwrap();
        dir.insert(&record("alice", "alice@x.com")).await.unwrap();
        let found = dir.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found, record("alice", "alice@x.com"));
        assert!(dir.find_by_username("bob").await.unwrap().is_none());
        assert_eq!(dir.count(), 1);
    }

    #[tokio::test]
    async fn find_conflict_reports_username_before_email() {
        let dir = SledUserDirectory::temporary().unwrap();
        dir.insert(&record("alice", "alice@x.com")).await.unwrap();
        assert_eq!(
            dir.find_conflict("alice", "alice@x.com").await.unwrap(),
            Some(ConflictField::Username)
        );
        assert_eq!(
            dir.find_conflict("bob", "alice@x.com").await.unwrap(),
            Some(ConflictField::Email)
        );
        assert_eq!(dir.find_conflict("bob", "bob@x.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn storage_layer_rejects_duplicates_and_keeps_existing_row() {
        let dir = SledUserDirectory::temporary().unwrap();
        dir.insert(&record("alice", "alice@x.com")).await.unwrap();

        let dup_user = UserRecord {
            password_hash: "other".to_string(),
            ..record("alice", "new@x.com")
        };
        assert!(matches!(
            dir.insert(&dup_user).await,
            Err(DirectoryError::Conflict(ConflictField::Username))
        ));
        assert!(matches!(
            dir.insert(&record("bob", "alice@x.com")).await,
            Err(DirectoryError::Conflict(ConflictField::Email))
        ));

        // Neither rejected insert left partial state behind.
        assert_eq!(dir.count(), 1);
        assert_eq!(dir.find_by_username("alice").await.unwrap().unwrap(), record("alice", "alice@x.com"));
        assert_eq!(dir.find_conflict("bob", "new@x.com").await.unwrap(), None);
    }
}
