//! faqbot-core: FAQ chatbot core library (fuzzy matcher, user directory, sessions, question log).
//!
//! The gateway add-on only talks to this crate through the re-exports below.

mod auth;
mod controller;
mod faq;
mod question_log;
mod session;
mod shared;

// Shared
pub use shared::{CoreConfig, UserBackend};

// FAQ store and matcher
pub use faq::{
    load_faq, similarity_ratio, FaqEntry, FaqError, MatchOutcome, Matcher, QuestionIndex,
    FALLBACK_ANSWER, SIMILARITY_THRESHOLD,
};

// Auth gateway and user directories
pub use auth::{
    hash_password, open_directory, validate_registration, verify_password, AuthError, AuthGateway,
    ConflictField, DirectoryError, RestUserDirectory, SledUserDirectory, UserDirectory, UserRecord,
    ValidationError,
};

// Sessions, controller, question log
pub use controller::{Answer, Controller, ControllerError};
pub use question_log::QuestionLog;
pub use session::{SessionId, SessionRegistry, SessionState};
