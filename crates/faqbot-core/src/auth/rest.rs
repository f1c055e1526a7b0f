//! Hosted user table behind a PostgREST-style HTTP API.
//!
//! Every request carries the API key both as `apikey` and as a bearer token.
//! The table is expected to carry unique constraints on `username` and `email`;
//! a `409` from an insert is reported as [`DirectoryError::Conflict`].

use super::directory::{ConflictField, DirectoryError, UserDirectory, UserRecord};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct IdentityRow {
    username: String,
    #[serde(default)]
    email: String,
}

pub struct RestUserDirectory {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl RestUserDirectory {
    /// `base_url` is the service root (e.g. `https://xyz.example.co`); rows live at
    /// `<base_url>/rest/v1/<table>`.
    pub fn new(base_url: &str, api_key: &str, table: &str) -> Result<Self, DirectoryError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
            api_key: api_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, &self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn fetch_rows<T: serde::de::DeserializeOwned>(
        &self,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, DirectoryError> {
        let res = self.request(Method::GET).query(query).send().await?;
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(DirectoryError::Status { status: status.as_u16(), body });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// Quotes a value for use inside an `or=(...)` filter.
fn quote_filter_value(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// PostgREST error payload for a failed write.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Option<String>,
}

/// Name of the violated constraint in `... unique constraint "users_email_key"`.
fn violated_constraint(message: &str) -> Option<&str> {
    let (_, rest) = message.split_once("constraint \"")?;
    rest.split('"').next()
}

/// Works out which unique constraint a 409 refers to from the column named in
/// `details` (`Key (email)=(...)`) or the constraint name. The offending value
/// itself is never inspected. Defaults to username.
fn conflict_field_from_body(body: &str) -> ConflictField {
    let err: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let email_key = err
        .details
        .as_deref()
        .is_some_and(|d| d.starts_with("Key (email)="));
    let email_constraint = violated_constraint(&err.message).is_some_and(|c| c.ends_with("_email_key"));
    if email_key || email_constraint {
        ConflictField::Email
    } else {
        ConflictField::Username
    }
}

#[async_trait::async_trait]
impl UserDirectory for RestUserDirectory {
    fn name(&self) -> &str {
        "rest"
    }

    async fn find_conflict(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<ConflictField>, DirectoryError> {
        let filter = format!(
            "(username.eq.{},email.eq.{})",
            quote_filter_value(username),
            quote_filter_value(email)
        );
        let rows: Vec<IdentityRow> = self
            .fetch_rows(&[("select", "username,email".to_string()), ("or", filter)])
            .await?;
        if rows.iter().any(|r| r.username == username) {
            return Ok(Some(ConflictField::Username));
        }
        if rows.iter().any(|r| r.email == email) {
            return Ok(Some(ConflictField::Email));
        }
        Ok(None)
    }

    async fn insert(&self, record: &UserRecord) -> Result<(), DirectoryError> {
        let res = self
            .request(Method::POST)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await?;
        let status = res.status();
        if status == StatusCode::CONFLICT {
            let body = res.text().await.unwrap_or_default();
            return Err(DirectoryError::Conflict(conflict_field_from_body(&body)));
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(DirectoryError::Status { status: status.as_u16(), body });
        }
        tracing::info!(
            target: "faqbot::auth",
            backend = "rest",
            username = %record.username,
            "Inserted user '{}'",
            record.username
        );
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, DirectoryError> {
        let rows: Vec<UserRecord> = self
            .fetch_rows(&[
                ("select", "username,email,password_hash".to_string()),
                ("username", format!("eq.{}", username)),
                ("limit", "1".to_string()),
            ])
            .await?;
        Ok(rows.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::{HeaderMap, StatusCode as HttpStatus};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    const KEY: &str = "test-key";

    type Rows = Arc<Mutex<Vec<UserRecord>>>;

    fn authorized(headers: &HeaderMap) -> bool {
        headers.get("apikey").and_then(|v| v.to_str().ok()) == Some(KEY)
            && headers.get("authorization").and_then(|v| v.to_str().ok())
                == Some(&format!("Bearer {}", KEY)[..])
    }

    /// Values between double quotes, in order: `(username.eq."a",email.eq."b")` -> ["a", "b"].
    fn quoted_values(filter: &str) -> Vec<String> {
        filter.split('"').skip(1).step_by(2).map(str::to_string).collect()
    }

    async fn list(
        State(rows): State<Rows>,
        headers: HeaderMap,
        Query(q): Query<HashMap<String, String>>,
    ) -> axum::response::Response {
        if !authorized(&headers) {
            return HttpStatus::UNAUTHORIZED.into_response();
        }
        let rows = rows.lock().unwrap();
        let hits: Vec<serde_json::Value> = if let Some(filter) = q.get("or") {
            let values = quoted_values(filter);
            rows.iter()
                .filter(|r| r.username == values[0] || r.email == values[1])
                .map(|r| serde_json::json!({ "username": r.username, "email": r.email }))
                .collect()
        } else if let Some(eq) = q.get("username") {
            let wanted = eq.trim_start_matches("eq.");
            rows.iter()
                .filter(|r| r.username == wanted)
                .map(|r| serde_json::to_value(r).unwrap())
                .collect()
        } else {
            Vec::new()
        };
        Json(hits).into_response()
    }

    async fn create(
        State(rows): State<Rows>,
        headers: HeaderMap,
        Json(record): Json<UserRecord>,
    ) -> axum::response::Response {
        if !authorized(&headers) {
            return HttpStatus::UNAUTHORIZED.into_response();
        }
        let mut rows = rows.lock().unwrap();
        let violated = if rows.iter().any(|r| r.username == record.username) {
            Some(("username", record.username.as_str()))
        } else if rows.iter().any(|r| r.email == record.email) {
            Some(("email", record.email.as_str()))
        } else {
            None
        };
        if let Some((column, value)) = violated {
            let body = serde_json::json!({
                "code": "23505",
                "details": format!("Key ({})=({}) already exists.", column, value),
                "hint": null,
                "message": format!("duplicate key value violates unique constraint \"users_{}_key\"", column)
            });
            return (HttpStatus::CONFLICT, Json(body)).into_response();
        }
        rows.push(record);
        HttpStatus::CREATED.into_response()
    }

    async fn spawn_fake_service() -> (String, Rows) {
        let rows: Rows = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/rest/v1/users", get(list).post(create))
            .with_state(Arc::clone(&rows));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/", addr), rows)
    }

    fn record(username: &str, email: &str) -> UserRecord {
        UserRecord {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "pbkdf2-sha256$1$00$00".to_string(),
        }
    }

    #[test]
    fn endpoint_joins_base_and_table() {
        let dir = RestUserDirectory::new("https://db.example.co/", "k", "users").unwrap();
        assert_eq!(dir.endpoint(), "https://db.example.co/rest/v1/users");
    }

    #[test]
    fn filter_values_are_quoted() {
        assert_eq!(quote_filter_value("a,b"), "\"a,b\"");
        assert_eq!(quote_filter_value("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[tokio::test]
    async fn round_trip_against_service() {
        let (base, rows) = spawn_fake_service().await;
        let dir = RestUserDirectory::new(&base, KEY, "users").unwrap();

        assert_eq!(dir.find_conflict("alice", "alice@x.com").await.unwrap(), None);
        dir.insert(&record("alice", "alice@x.com")).await.unwrap();
        assert_eq!(rows.lock().unwrap().len(), 1);

        let found = dir.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found, record("alice", "alice@x.com"));
        assert!(dir.find_by_username("bob").await.unwrap().is_none());

        assert_eq!(
            dir.find_conflict("alice", "other@x.com").await.unwrap(),
            Some(ConflictField::Username)
        );
        assert_eq!(
            dir.find_conflict("bob", "alice@x.com").await.unwrap(),
            Some(ConflictField::Email)
        );
    }

    #[tokio::test]
    async fn unique_constraint_violation_maps_to_conflict() {
        let (base, rows) = spawn_fake_service().await;
        let dir = RestUserDirectory::new(&base, KEY, "users").unwrap();
        dir.insert(&record("alice", "alice@x.com")).await.unwrap();

        assert!(matches!(
            dir.insert(&record("alice", "new@x.com")).await,
            Err(DirectoryError::Conflict(ConflictField::Username))
        ));
        assert!(matches!(
            dir.insert(&record("bob", "alice@x.com")).await,
            Err(DirectoryError::Conflict(ConflictField::Email))
        ));
        assert_eq!(rows.lock().unwrap().len(), 1);
    }

    #[test]
    fn conflict_column_ignores_the_offending_value() {
        let username_hit = serde_json::json!({
            "code": "23505",
            "details": "Key (username)=(emailfan) already exists.",
            "message": "duplicate key value violates unique constraint \"users_username_key\""
        })
        .to_string();
        assert_eq!(conflict_field_from_body(&username_hit), ConflictField::Username);

        let email_hit = serde_json::json!({
            "code": "23505",
            "details": "Key (email)=(username@x.com) already exists.",
            "message": "duplicate key value violates unique constraint \"users_email_key\""
        })
        .to_string();
        assert_eq!(conflict_field_from_body(&email_hit), ConflictField::Email);

        // Without details the constraint name alone decides.
        let bare = r#"{"message":"duplicate key value violates unique constraint \"profiles_email_key\""}"#;
        assert_eq!(conflict_field_from_body(bare), ConflictField::Email);
        assert_eq!(conflict_field_from_body("not json"), ConflictField::Username);
    }

    #[tokio::test]
    async fn email_like_username_conflict_is_a_username_conflict() {
        let (base, _rows) = spawn_fake_service().await;
        let dir = RestUserDirectory::new(&base, KEY, "users").unwrap();
        dir.insert(&record("emailfan", "fan@x.com")).await.unwrap();
        assert!(matches!(
            dir.insert(&record("emailfan", "other@x.com")).await,
            Err(DirectoryError::Conflict(ConflictField::Username))
        ));
    }

    #[tokio::test]
    async fn rejected_key_surfaces_status() {
        let (base, _rows) = spawn_fake_service().await;
        let dir = RestUserDirectory::new(&base, "wrong", "users").unwrap();
        match dir.find_by_username("alice").await {
            Err(DirectoryError::Status { status, .. }) => assert_eq!(status, 401),
            other => panic!("expected status error, got {:?}", other.map(|_| ())),
        }
    }
}
