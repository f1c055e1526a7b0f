//! Session controller: the actions a user can take, checked against their session.
//!
//! | State     | login | register | ask | logout |
//! |-----------|-------|----------|-----|--------|
//! | LoggedOut | yes   | yes      | no  | no-op  |
//! | LoggedIn  | no    | no       | yes | yes    |

use crate::auth::{AuthError, AuthGateway};
use crate::faq::{MatchOutcome, Matcher};
use crate::question_log::QuestionLog;
use crate::session::SessionState;

/// Why an action was refused. `Display` is the user-visible message.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("Please log in first.")]
    NotLoggedIn,
    #[error("You are already logged in.")]
    AlreadyLoggedIn,
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// A resolved question.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    /// The question as the user typed it.
    pub question: String,
    pub outcome: MatchOutcome,
}

impl Answer {
    pub fn text(&self) -> &str {
        self.outcome.answer()
    }
}

pub struct Controller {
    matcher: Matcher,
    auth: AuthGateway,
    log: QuestionLog,
}

impl Controller {
    pub fn new(matcher: Matcher, auth: AuthGateway, log: QuestionLog) -> Self {
        Self { matcher, auth, log }
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn auth(&self) -> &AuthGateway {
        &self.auth
    }

    /// LoggedOut -> LoggedIn on valid credentials; the session is untouched otherwise.
    pub async fn login(
        &self,
        session: &mut SessionState,
        username: &str,
        password: &str,
    ) -> Result<(), ControllerError> {
        if session.is_logged_in() {
            return Err(ControllerError::AlreadyLoggedIn);
        }
        match self.auth.login(username, password).await {
            Ok(true) => {
                session.log_in(username);
                tracing::info!(target: "faqbot::controller", username = username, "Login succeeded");
                Ok(())
            }
            Ok(false) => {
                tracing::info!(target: "faqbot::controller", username = username, "Login failed");
                Err(AuthError::AuthFailure.into())
            }
            Err(e) => Err(report(e)),
        }
    }

    /// Creates an account. Does not log the user in.
    pub async fn register(
        &self,
        session: &SessionState,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<(), ControllerError> {
        if session.is_logged_in() {
            return Err(ControllerError::AlreadyLoggedIn);
        }
        self.auth
            .register(username, password, email)
            .await
            .map_err(report)?;
        tracing::info!(target: "faqbot::controller", username = username, "Account created");
        Ok(())
    }

    /// Answers `question` for a logged-in session and records it in the question
    /// log. An empty question is ignored (`Ok(None)`). A failed log write is
    /// reported through tracing and does not withhold the answer.
    pub fn ask(&self, session: &SessionState, question: &str) -> Result<Option<Answer>, ControllerError> {
        let username = session.username().ok_or(ControllerError::NotLoggedIn)?;
        if question.is_empty() {
            return Ok(None);
        }

        let outcome = self.matcher.resolve(question);
        tracing::debug!(
            target: "faqbot::controller",
            username = username,
            matched = outcome.is_match(),
            "Answered question"
        );

        if let Err(e) = self.log.append(username, question) {
            tracing::warn!(
                target: "faqbot::controller",
                path = %self.log.path().display(),
                error = %e,
                "Failed to append to question log"
            );
        }

        Ok(Some(Answer {
            question: question.to_string(),
            outcome,
        }))
    }

    /// LoggedIn -> LoggedOut. Harmless when already logged out.
    pub fn logout(&self, session: &mut SessionState) {
        if let Some(username) = session.username() {
            tracing::info!(target: "faqbot::controller", username = username, "Logged out");
        }
        session.log_out();
    }
}

fn report(e: AuthError) -> ControllerError {
    if let AuthError::Directory(ref source) = e {
        tracing::error!(target: "faqbot::controller", error = %source, "User directory unavailable");
    }
    ControllerError::Auth(e)
}
