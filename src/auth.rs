//! # Auth session
//!
//! Sign-up and sign-in against a hosted identity service. The session is an
//! explicit [`SessionContext`] value: when the service is not configured every
//! operation fails with an `Auth` error instead of reaching for a global.
//! Auth failures never touch the face-swap wizard.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::error::{ClientError, ClientResult};

pub const NOT_CONFIGURED: &str = "authentication is not configured";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub access_token: String,
    pub user: AuthUser,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str, username: &str) -> ClientResult<AuthUser>;

    async fn sign_in(&self, email: &str, password: &str) -> ClientResult<AuthSession>;

    async fn sign_out(&self, access_token: &str) -> ClientResult<()>;
}

/// Username used when sign-up does not supply one.
pub fn default_username(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

pub enum SessionContext {
    NotConfigured,
    Configured {
        provider: Arc<dyn IdentityProvider>,
        session: Option<AuthSession>,
    },
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionContext::NotConfigured => f.write_str("NotConfigured"),
            SessionContext::Configured { session, .. } => f
                .debug_struct("Configured")
                .field("user", &session.as_ref().map(|s| &s.user))
                .finish_non_exhaustive(),
        }
    }
}

impl SessionContext {
    /// `NotConfigured` unless both the URL and the key are present.
    pub fn from_config(config: &AuthConfig) -> ClientResult<Self> {
        match (&config.url, &config.anon_key) {
            (Some(url), Some(key)) => {
                let provider = HostedAuth::new(url.clone(), key.clone())?;
                Ok(Self::with_provider(Arc::new(provider)))
            }
            _ => {
                debug!("auth not configured");
                Ok(Self::NotConfigured)
            }
        }
    }

    pub fn with_provider(provider: Arc<dyn IdentityProvider>) -> Self {
        Self::Configured { provider, session: None }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Configured { .. })
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Self::Configured { session: Some(s), .. } => Some(&s.user),
            _ => None,
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str, username: Option<&str>) -> ClientResult<AuthUser> {
        let provider = self.provider("sign up")?;
        check_credentials("sign up", email, password)?;
        let username = username
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| default_username(email));
        let user = provider.sign_up(email, password, username).await?;
        info!(user = %user.id, "signed up");
        Ok(user)
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> ClientResult<&AuthUser> {
        let Self::Configured { provider, session } = self else {
            return Err(ClientError::auth("sign in", NOT_CONFIGURED));
        };
        check_credentials("sign in", email, password)?;
        let signed_in = provider.sign_in(email, password).await?;
        info!(user = %signed_in.user.id, "signed in");
        Ok(&session.insert(signed_in).user)
    }

    /// Clears the stored user even when the provider call fails.
    pub async fn sign_out(&mut self) -> ClientResult<()> {
        let Self::Configured { provider, session } = self else {
            return Err(ClientError::auth("sign out", NOT_CONFIGURED));
        };
        let Some(current) = session.take() else {
            return Ok(());
        };
        provider.sign_out(&current.access_token).await?;
        info!(user = %current.user.id, "signed out");
        Ok(())
    }

    fn provider(&self, operation: &str) -> ClientResult<&Arc<dyn IdentityProvider>> {
        match self {
            Self::Configured { provider, .. } => Ok(provider),
            Self::NotConfigured => Err(ClientError::auth(operation, NOT_CONFIGURED)),
        }
    }
}

fn check_credentials(operation: &str, email: &str, password: &str) -> ClientResult<()> {
    if !email.contains('@') {
        return Err(ClientError::validation("email", "must contain '@'", email).with_operation(operation));
    }
    if password.is_empty() {
        return Err(ClientError::validation("password", "must not be empty", "").with_operation(operation));
    }
    Ok(())
}

/// GoTrue-style REST identity service.
#[derive(Debug, Clone)]
pub struct HostedAuth {
    client: Client,
    url: String,
    anon_key: String,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Value,
}

impl From<WireUser> for AuthUser {
    fn from(wire: WireUser) -> Self {
        Self {
            id: wire.id,
            email: wire.email,
            username: wire.user_metadata.get("username").and_then(Value::as_str).map(str::to_string),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireSession {
    access_token: String,
    user: WireUser,
}

impl HostedAuth {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> ClientResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| ClientError::auth("build auth client", e.to_string()))?;
        let url: String = url.into();
        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        })
    }

    async fn post(&self, operation: &str, path: &str, body: Value, bearer: Option<&str>) -> ClientResult<Value> {
        let url = format!("{}{}", self.url, path);
        debug!(operation, %url, "auth request");
        let mut request = self.client.post(&url).header("apikey", &self.anon_key).json(&body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(|e| {
            warn!(operation, error = %e, "auth request failed");
            ClientError::auth(operation, e.to_string())
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            warn!(operation, error = %e, "auth response body unreadable");
            ClientError::auth(operation, e.to_string())
        })?;
        if !status.is_success() {
            let reason = auth_error_message(&bytes);
            warn!(operation, status = status.as_u16(), %reason, "auth rejected");
            return Err(ClientError::auth(operation, reason).with_metadata("status", status.as_u16().to_string()));
        }
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| ClientError::auth(operation, format!("malformed response: {e}")))
    }
}

/// GoTrue puts the message in one of several fields depending on the endpoint.
fn auth_error_message(body: &[u8]) -> String {
    let parsed: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|k| parsed.get(k).and_then(Value::as_str))
        .filter(|m| !m.is_empty())
        .unwrap_or("authentication failed")
        .to_string()
}

fn decode<T: for<'de> Deserialize<'de>>(operation: &str, value: Value) -> ClientResult<T> {
    serde_json::from_value(value).map_err(|e| ClientError::auth(operation, format!("malformed response: {e}")))
}

#[async_trait]
impl IdentityProvider for HostedAuth {
    async fn sign_up(&self, email: &str, password: &str, username: &str) -> ClientResult<AuthUser> {
        const OP: &str = "sign up";
        let body = json!({ "email": email, "password": password, "data": { "username": username } });
        let mut value = self.post(OP, "/auth/v1/signup", body, None).await?;
        // With auto-confirm on, the user comes wrapped in a session.
        if let Some(user) = value.get_mut("user").filter(|u| u.is_object()).map(Value::take) {
            value = user;
        }
        Ok(decode::<WireUser>(OP, value)?.into())
    }

    async fn sign_in(&self, email: &str, password: &str) -> ClientResult<AuthSession> {
        const OP: &str = "sign in";
        let body = json!({ "email": email, "password": password });
        let value = self.post(OP, "/auth/v1/token?grant_type=password", body, None).await?;
        let wire: WireSession = decode(OP, value)?;
        Ok(AuthSession { access_token: wire.access_token, user: wire.user.into() })
    }

    async fn sign_out(&self, access_token: &str) -> ClientResult<()> {
        self.post("sign out", "/auth/v1/logout", json!({}), Some(access_token)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeProvider {
        signups: Mutex<Vec<String>>,
        fail_sign_out: bool,
    }

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        async fn sign_up(&self, email: &str, _password: &str, username: &str) -> ClientResult<AuthUser> {
            self.signups.lock().unwrap().push(username.to_string());
            Ok(AuthUser { id: "u1".into(), email: Some(email.into()), username: Some(username.into()) })
        }

        async fn sign_in(&self, email: &str, password: &str) -> ClientResult<AuthSession> {
            if password != "secret" {
                return Err(ClientError::auth("sign in", "Invalid login credentials"));
            }
            Ok(AuthSession {
                access_token: "tok".into(),
                user: AuthUser { id: "u1".into(), email: Some(email.into()), username: None },
            })
        }

        async fn sign_out(&self, _access_token: &str) -> ClientResult<()> {
            if self.fail_sign_out {
                return Err(ClientError::auth("sign out", "network down"));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn not_configured_fails_every_operation() {
        let config = AuthConfig::new(Some("https://auth.test".into()), None);
        let mut ctx = SessionContext::from_config(&config).unwrap();
        assert!(!ctx.is_configured());

        let mut errors = vec![ctx.sign_up("a@b.c", "pw", None).await.unwrap_err()];
        errors.push(ctx.sign_in("a@b.c", "pw").await.map(|_| ()).unwrap_err());
        errors.push(ctx.sign_out().await.unwrap_err());
        for err in errors {
            assert!(matches!(&err, ClientError::Auth { reason, .. } if reason == NOT_CONFIGURED));
        }
    }

    #[tokio::test]
    async fn sign_up_defaults_username_to_email_local_part() {
        let provider = Arc::new(FakeProvider::default());
        let ctx = SessionContext::with_provider(provider.clone());
        ctx.sign_up("jane.doe@example.com", "pw", None).await.unwrap();
        ctx.sign_up("x@example.com", "pw", Some("  ")).await.unwrap();
        ctx.sign_up("y@example.com", "pw", Some("yy")).await.unwrap();
        assert_eq!(*provider.signups.lock().unwrap(), vec!["jane.doe", "x", "yy"]);
    }

    #[tokio::test]
    async fn sign_in_stores_user_and_sign_out_clears_it() {
        let mut ctx = SessionContext::with_provider(Arc::new(FakeProvider::default()));
        assert!(ctx.sign_in("a@b.c", "wrong").await.is_err());
        assert!(!ctx.is_authenticated());

        let user = ctx.sign_in("a@b.c", "secret").await.unwrap().clone();
        assert_eq!(user.id, "u1");
        assert!(ctx.is_authenticated());

        ctx.sign_out().await.unwrap();
        assert!(!ctx.is_authenticated());
    }

    #[tokio::test]
    async fn failed_sign_out_still_forgets_user() {
        let provider = FakeProvider { fail_sign_out: true, ..Default::default() };
        let mut ctx = SessionContext::with_provider(Arc::new(provider));
        ctx.sign_in("a@b.c", "secret").await.unwrap();
        assert!(ctx.sign_out().await.is_err());
        assert!(ctx.user().is_none());
    }

    /// Accepts one request, then sends a 200 whose body stops short of its content-length.
    async fn truncated_body_server() -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(|v| v.trim().to_string()))
                        .and_then(|v| v.parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 200\r\n\r\n{\"access_")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn unreadable_success_body_is_an_auth_error() {
        let auth = HostedAuth::new(truncated_body_server().await, "anon").unwrap();
        let err = auth.sign_in("a@b.c", "secret").await.unwrap_err();
        match err {
            ClientError::Auth { reason, .. } => assert!(!reason.contains("malformed response"), "{reason}"),
            other => panic!("expected auth error, got {other}"),
        }
    }

    #[test]
    fn error_messages_from_any_field() {
        assert_eq!(auth_error_message(br#"{"error_description":"Invalid login credentials"}"#), "Invalid login credentials");
        assert_eq!(auth_error_message(br#"{"msg":"User already registered"}"#), "User already registered");
        assert_eq!(auth_error_message(b"oops"), "authentication failed");
    }

    #[test]
    fn wire_user_reads_username_metadata() {
        let wire: WireUser =
            serde_json::from_value(json!({"id": "1", "email": "a@b.c", "user_metadata": {"username": "ab"}})).unwrap();
        let user = AuthUser::from(wire);
        assert_eq!(user.username.as_deref(), Some("ab"));
    }
}
