//! User directory seam: the store behind registration and login.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A registered user. The password is only ever held as a salted hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl UserRecord {
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }
}

/// Which unique identity collided with an existing user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictField {
    Username,
    Email,
}

impl fmt::Display for ConflictField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Username => f.write_str("Username"),
            Self::Email => f.write_str("Email"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("user database error: {0}")]
    Sled(#[from] sled::Error),
    #[error("user service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("user service answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("undecodable user data: {0}")]
    Decode(#[from] serde_json::Error),
    /// The store's own uniqueness constraint rejected an insert.
    #[error("{0} already taken")]
    Conflict(ConflictField),
    #[error("user directory misconfigured: {0}")]
    Config(String),
}

/// Register/lookup capability used by the auth gateway.
///
/// Implementations must reject an `insert` that would duplicate a username or
/// email with [`DirectoryError::Conflict`], independent of any earlier
/// `find_conflict` call.
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    /// Backend name for logs and status output.
    fn name(&self) -> &str;

    /// Reports whether `username` or `email` is already registered (username checked first).
    async fn find_conflict(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<ConflictField>, DirectoryError>;

    async fn insert(&self, record: &UserRecord) -> Result<(), DirectoryError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, DirectoryError>;
}
