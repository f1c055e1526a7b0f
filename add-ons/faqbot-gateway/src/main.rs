//! Axum-based FAQ chatbot gateway: form UI, sessions and health endpoints. Config-driven via CoreConfig.

mod handlers;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use faqbot_core::{
    load_faq, open_directory, AuthGateway, Controller, CoreConfig, Matcher, QuestionLog,
    SessionRegistry, UserBackend,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Pre-flight check: config loads, FAQ loads, user directory opens, port is free.
fn run_verify() -> Result<(), String> {
    let config = CoreConfig::load().map_err(|e| format!("Config load failed: {}", e))?;

    print!("Checking FAQ source {}... ", config.faq_path);
    let entries = load_faq(&config.faq_path).map_err(|e| e.to_string())?;
    println!("OK ({} entries)", entries.len());

    print!("Checking user directory ({})... ", config.user_backend.as_str());
    let directory = open_directory(&config).map_err(|e| format!("user directory unavailable: {}", e))?;
    drop(directory);
    match config.user_backend {
        UserBackend::Sled => println!("OK"),
        UserBackend::Rest => println!("OK (configured; reachability is checked on first request)"),
    }

    print!("Checking question log {}... ", config.question_log_path);
    QuestionLog::open(&config.question_log_path)
        .map_err(|e| format!("question log directory not writable: {}", e))?;
    println!("OK");

    let addr = format!("{}:{}", config.host, config.port);
    print!("Checking {}... ", addr);
    match std::net::TcpListener::bind(&addr) {
        Ok(listener) => {
            drop(listener);
            println!("OK (available)");
        }
        Err(e) => {
            return Err(format!("{} BLOCKED: {}", addr, e));
        }
    }

    println!("\n✅ SUCCESS: All systems GO. Ready to start gateway.");
    Ok(())
}

/// Loads the FAQ and opens the user directory and question log. Any failure is fatal.
fn build_state(config: CoreConfig) -> Result<AppState, String> {
    let entries = load_faq(&config.faq_path).map_err(|e| e.to_string())?;
    let matcher = Matcher::from_entries(&entries);
    let directory = open_directory(&config).map_err(|e| format!("user directory unavailable: {}", e))?;
    let log = QuestionLog::open(&config.question_log_path)
        .map_err(|e| format!("question log unavailable: {}", e))?;

    tracing::info!(
        target: "faqbot::gateway",
        entries = matcher.index().entry_count(),
        variants = matcher.index().variant_count(),
        backend = directory.name(),
        "FAQ index ready"
    );

    let sessions = SessionRegistry::from_config(&config);
    Ok(AppState {
        config: Arc::new(config),
        controller: Arc::new(Controller::new(matcher, AuthGateway::new(directory), log)),
        sessions: Arc::new(sessions),
    })
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[faqbot-gateway] .env not loaded: {} (using system environment)", e);
    }

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--verify") {
        match run_verify() {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("❌ PRE-FLIGHT FAILED: {}", e);
                std::process::exit(1);
            }
        }
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match CoreConfig::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Config load failed: {}", e);
            std::process::exit(1);
        }
    };
    let addr = format!("{}:{}", config.host, config.port);

    let state = match build_state(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("faqbot-gateway listening on http://{}", addr);
    if let Err(e) = axum::serve(listener, build_app(state)).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/login", post(handlers::login))
        .route("/register", post(handlers::register))
        .route("/ask", post(handlers::ask))
        .route("/logout", post(handlers::logout))
        .route("/v1/status", get(status))
        .route("/api/v1/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<CoreConfig>,
    pub(crate) controller: Arc<Controller>,
    pub(crate) sessions: Arc<SessionRegistry>,
}

/// GET /api/v1/health – liveness check for scripts.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

/// GET /v1/status – app identity, backend and FAQ size.
async fn status(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    let index = state.controller.matcher().index();
    axum::Json(serde_json::json!({
        "app_name": state.config.app_name,
        "port": state.config.port,
        "user_backend": state.controller.auth().backend_name(),
        "faq_entries": index.entry_count(),
        "faq_variants": index.variant_count(),
        "active_sessions": state.sessions.len(),
    }))
}
