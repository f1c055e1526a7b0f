//! Form handlers. Each one resolves the caller's session from the cookie, runs
//! one controller action against it and renders the page. Only a successful
//! login stores a session.

pub mod page;

use crate::AppState;
use axum::extract::{Form, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{Html, IntoResponse, Response};
use faqbot_core::{Answer, SessionId, SessionState};
use page::Flash;
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "faqbot_session";

/// Session id carried in the request's `Cookie` header, if any.
pub fn session_cookie(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| SessionId::parse(value))
}

fn set_cookie(id: SessionId) -> HeaderValue {
    let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id);
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

fn clear_cookie() -> HeaderValue {
    HeaderValue::from_static("faqbot_session=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

fn respond(
    state: &AppState,
    session: &SessionState,
    flash: Option<&Flash>,
    answer: Option<&Answer>,
    cookie: Option<HeaderValue>,
) -> Response {
    let html = page::render(&state.config.app_name, session, flash, answer);
    let mut res = Html(html).into_response();
    if let Some(cookie) = cookie {
        res.headers_mut().insert(SET_COOKIE, cookie);
    }
    res
}

#[derive(Debug, serde::Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    email: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct AskForm {
    #[serde(default)]
    question: String,
}

/// GET / – renders the current session without creating one.
pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (_, session) = state.sessions.resolve(session_cookie(&headers));
    respond(&state, &session, None, None, None)
}

/// Clears a cookie that names no live session so the browser stops sending it.
fn forget_stale(headers: &HeaderMap, live: Option<SessionId>) -> Option<HeaderValue> {
    match (session_cookie(headers), live) {
        (Some(_), None) => Some(clear_cookie()),
        _ => None,
    }
}

/// POST /login – a session is only created once the credentials check out.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let (live, mut session) = state.sessions.resolve(session_cookie(&headers));
    match state
        .controller
        .login(&mut session, &form.username, &form.password)
        .await
    {
        Ok(()) => {
            let id = state.sessions.open(session.clone());
            let flash = Flash::success(format!("Welcome back, {}!", form.username));
            respond(&state, &session, Some(&flash), None, Some(set_cookie(id)))
        }
        Err(e) => {
            let flash = Flash::error(e.to_string());
            respond(&state, &session, Some(&flash), None, forget_stale(&headers, live))
        }
    }
}

/// POST /register – never changes the session's login state.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<RegisterForm>,
) -> Response {
    let (live, session) = state.sessions.resolve(session_cookie(&headers));
    let flash = match state
        .controller
        .register(&session, &form.username, &form.password, &form.email)
        .await
    {
        Ok(()) => Flash::success("Account created! Please log in."),
        Err(e) => Flash::error(e.to_string()),
    };
    respond(&state, &session, Some(&flash), None, forget_stale(&headers, live))
}

/// POST /ask – matching and the question log write run on the blocking pool.
pub async fn ask(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<AskForm>,
) -> Response {
    let (live, session) = state.sessions.resolve(session_cookie(&headers));
    let cookie = forget_stale(&headers, live);
    let controller = Arc::clone(&state.controller);
    let asker = session.clone();
    let outcome = tokio::task::spawn_blocking(move || controller.ask(&asker, &form.question)).await;
    match outcome {
        Ok(Ok(answer)) => respond(&state, &session, None, answer.as_ref(), cookie),
        Ok(Err(e)) => respond(&state, &session, Some(&Flash::error(e.to_string())), None, cookie),
        Err(e) => {
            tracing::error!(target: "faqbot::gateway", error = %e, "Question task failed");
            let flash = Flash::error("Service unavailable, please try again later.");
            respond(&state, &session, Some(&flash), None, cookie)
        }
    }
}

/// POST /logout – destroys the session.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (live, mut session) = state.sessions.resolve(session_cookie(&headers));
    state.controller.logout(&mut session);
    if let Some(id) = live {
        state.sessions.close(id);
    }
    respond(
        &state,
        &session,
        Some(&Flash::info("You have been logged out.")),
        None,
        Some(clear_cookie()),
    )
}
