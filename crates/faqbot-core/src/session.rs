//! Per-session login state and the registry that owns it.
//!
//! Only logged-in sessions are stored: a successful login opens one, logout
//! closes it. Anyone without a live session is treated as logged out. Stored
//! sessions expire after sitting idle or reaching their maximum age, and the
//! registry holds a bounded number of them.

use crate::shared::CoreConfig;
use moka::sync::Cache;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses the textual id sent back by a client. Unknown formats yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s.trim()).ok().map(Self)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// LoggedOut (initial) or LoggedIn with a username.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    logged_in: bool,
    username: String,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    /// Username while logged in.
    pub fn username(&self) -> Option<&str> {
        self.logged_in.then_some(self.username.as_str())
    }

    pub(crate) fn log_in(&mut self, username: &str) {
        self.logged_in = true;
        self.username = username.to_string();
    }

    pub(crate) fn log_out(&mut self) {
        self.logged_in = false;
        self.username.clear();
    }
}

pub const DEFAULT_MAX_SESSIONS: u64 = 10_000;
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_SESSION_MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);

/// Live logged-in sessions keyed by id.
pub struct SessionRegistry {
    sessions: Cache<SessionId, SessionState>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_IDLE, DEFAULT_SESSION_MAX_AGE)
    }
}

impl SessionRegistry {
    pub fn new(max_sessions: u64, idle: Duration, max_age: Duration) -> Self {
        let sessions = Cache::builder()
            .max_capacity(max_sessions)
            .time_to_idle(idle)
            .time_to_live(max_age)
            .build();
        Self { sessions }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(
            config.max_sessions,
            Duration::from_secs(config.session_idle_secs),
            Duration::from_secs(config.session_max_age_secs),
        )
    }

    /// Stores a session for a user who just logged in.
    pub fn open(&self, state: SessionState) -> SessionId {
        let id = SessionId::new();
        self.sessions.insert(id, state);
        tracing::debug!(target: "faqbot::session", session = %id, "Session opened");
        id
    }

    /// Returns the live session for `id` (refreshing its idle timer), or a fresh
    /// logged-out state and `None` when `id` is absent, unknown or expired.
    /// Never stores anything.
    pub fn resolve(&self, id: Option<SessionId>) -> (Option<SessionId>, SessionState) {
        match id.and_then(|id| self.snapshot(id).map(|state| (id, state))) {
            Some((id, state)) => (Some(id), state),
            None => (None, SessionState::new()),
        }
    }

    pub fn snapshot(&self, id: SessionId) -> Option<SessionState> {
        self.sessions.get(&id)
    }

    /// Destroys the session. Returns whether it was live.
    pub fn close(&self, id: SessionId) -> bool {
        let existed = self.sessions.remove(&id).is_some();
        if existed {
            tracing::debug!(target: "faqbot::session", session = %id, "Session closed");
        }
        existed
    }

    /// Number of live sessions, after pending expiry and eviction have run.
    pub fn len(&self) -> usize {
        self.sessions.run_pending_tasks();
        self.sessions.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
