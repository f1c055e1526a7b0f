//! Auth gateway: registration and login against an injected [`UserDirectory`].

mod directory;
mod password;
mod rest;
mod sled_store;

pub use directory::{ConflictField, DirectoryError, UserDirectory, UserRecord};
pub use password::{hash_password, verify_password};
pub use rest::RestUserDirectory;
pub use sled_store::SledUserDirectory;

use crate::shared::{CoreConfig, UserBackend};
use std::sync::Arc;

const MIN_PASSWORD_LEN: usize = 6;

/// Malformed registration input. Display strings are shown to the user as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("All fields are required.")]
    MissingField,
    #[error("Password must be at least 6 characters.")]
    PasswordTooShort,
    #[error("Invalid email address.")]
    InvalidEmail,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0} already exists.")]
    Conflict(ConflictField),
    #[error("Invalid username or password")]
    AuthFailure,
    #[error("Service unavailable, please try again later.")]
    Directory(#[source] DirectoryError),
}

impl From<DirectoryError> for AuthError {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::Conflict(field) => Self::Conflict(field),
            other => Self::Directory(other),
        }
    }
}

/// Checks registration input in order: presence, password length, email shape.
pub fn validate_registration(username: &str, password: &str, email: &str) -> Result<(), ValidationError> {
    if username.is_empty() || password.is_empty() || email.is_empty() {
        return Err(ValidationError::MissingField);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    if !email.contains('@') {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

/// Opens the user directory selected by `config.user_backend`.
pub fn open_directory(config: &CoreConfig) -> Result<Arc<dyn UserDirectory>, DirectoryError> {
    match config.user_backend {
        UserBackend::Sled => Ok(Arc::new(SledUserDirectory::open_path(config.users_db_path())?)),
        UserBackend::Rest => {
            let url = config
                .rest_url
                .as_deref()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| DirectoryError::Config("rest_url is not set".to_string()))?;
            let key = config
                .rest_api_key
                .as_deref()
                .ok_or_else(|| DirectoryError::Config("rest_api_key is not set".to_string()))?;
            Ok(Arc::new(RestUserDirectory::new(url, key, &config.rest_table)?))
        }
    }
}

/// Validates, registers and verifies users. Holds no state of its own.
#[derive(Clone)]
pub struct AuthGateway {
    directory: Arc<dyn UserDirectory>,
}

impl AuthGateway {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    pub fn backend_name(&self) -> &str {
        self.directory.name()
    }

    /// Registers a new user. The pre-check gives a friendly conflict early; the
    /// directory's own uniqueness check on insert is what actually guards the row.
    pub async fn register(&self, username: &str, password: &str, email: &str) -> Result<(), AuthError> {
        validate_registration(username, password, email)?;

        if let Some(field) = self.directory.find_conflict(username, email).await? {
            tracing::info!(target: "faqbot::auth", username = username, conflict = %field, "Registration rejected");
            return Err(AuthError::Conflict(field));
        }

        let record = UserRecord {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password),
        };
        self.directory.insert(&record).await?;
        Ok(())
    }

    /// Returns true iff `username` exists and `password` matches its stored hash.
    pub async fn login(&self, username: &str, password: &str) -> Result<bool, AuthError> {
        let Some(record) = self.directory.find_by_username(username).await? else {
            return Ok(false);
        };
        Ok(verify_password(password, &record.password_hash))
    }
}
