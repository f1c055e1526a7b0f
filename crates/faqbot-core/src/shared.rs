//! Shared configuration used by the core and the gateway.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which user directory backs the auth gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserBackend {
    /// Local sled database under `storage_path`.
    Sled,
    /// Hosted PostgREST-style table reached over HTTP.
    Rest,
}

impl UserBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sled => "sled",
            Self::Rest => "rest",
        }
    }
}

/// Global application configuration. Load from TOML or env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Title shown on every page (e.g. "STEM Obour FAQ Chatbot").
    pub app_name: String,
    /// Interface the gateway binds to.
    pub host: String,
    /// HTTP port for the gateway.
    pub port: u16,
    /// Base directory for the sled user database.
    pub storage_path: String,
    /// JSON file holding the FAQ entries.
    pub faq_path: String,
    /// Append-only question log.
    pub question_log_path: String,
    #[serde(default = "default_backend")]
    pub user_backend: UserBackend,
    /// Base URL of the hosted user table (required when `user_backend = "rest"`).
    #[serde(default)]
    pub rest_url: Option<String>,
    /// API key sent as `apikey` and bearer token.
    #[serde(default)]
    pub rest_api_key: Option<String>,
    #[serde(default = "default_table")]
    pub rest_table: String,
    /// Logged-in sessions expire after this many seconds without a request.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
    /// Hard limit on a session's lifetime, in seconds.
    #[serde(default = "default_session_max_age_secs")]
    pub session_max_age_secs: u64,
    /// Upper bound on live sessions held in memory.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u64,
}

fn default_backend() -> UserBackend {
    UserBackend::Sled
}

fn default_table() -> String {
    "users".to_string()
}

fn default_session_idle_secs() -> u64 {
    30 * 60
}

fn default_session_max_age_secs() -> u64 {
    12 * 60 * 60
}

fn default_max_sessions() -> u64 {
    10_000
}

impl CoreConfig {
    /// Location of the sled user database.
    pub fn users_db_path(&self) -> PathBuf {
        Path::new(&self.storage_path).join("faqbot_users")
    }

    /// Load config from file and environment. Precedence: env `FAQBOT_CONFIG` path > `config/faqbot.toml` > defaults.
    /// Individual keys can be overridden with `FAQBOT__<KEY>`.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("FAQBOT_CONFIG").unwrap_or_else(|_| "config/faqbot.toml".to_string());
        let builder = config::Config::builder()
            .set_default("app_name", "School FAQ Chatbot")?
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8001_i64)?
            .set_default("storage_path", "./data")?
            .set_default("faq_path", "config/faq.json")?
            .set_default("question_log_path", "./data/questions_log.txt")?
            .set_default("user_backend", "sled")?
            .set_default("rest_table", "users")?
            .set_default("session_idle_secs", default_session_idle_secs() as i64)?
            .set_default("session_max_age_secs", default_session_max_age_secs() as i64)?
            .set_default("max_sessions", default_max_sessions() as i64)?;

        let path = Path::new(&config_path);
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("FAQBOT").separator("__"))
            .build()?;

        built.try_deserialize()
    }
}
