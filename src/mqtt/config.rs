use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Deadline for a single connection attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Keep-alive announced in the CONNECT packet.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(5);

/// Username/password pair sent with the CONNECT packet.
///
/// Defaults to empty strings, which most brokers treat as anonymous access.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.username.is_empty() && self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    /// Password is never written to logs.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Parameters shared by every connection attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSettings {
    pub connect_timeout: Duration,
    pub keep_alive: Duration,
    pub credentials: Credentials,
    pub client_id_prefix: Option<String>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            keep_alive: DEFAULT_KEEP_ALIVE,
            credentials: Credentials::default(),
            client_id_prefix: None,
        }
    }
}

impl ConnectionSettings {
    /// Generates a fresh client identifier. Called once per attempt.
    pub fn client_id(&self) -> String {
        let id = Uuid::new_v4();
        match self.client_id_prefix.as_deref() {
            Some(prefix) if !prefix.trim().is_empty() => format!("{}-{}", prefix.trim(), id),
            _ => id.to_string(),
        }
    }
}
