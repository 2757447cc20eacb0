use std::env;
use std::fmt;

pub const DEFAULT_HOST: &str = "https://www.service-client.veoliaeau.fr";

/// Portal credentials and connection settings
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub username: String,
    pub password: String,
    /// Per-request timeout; `None` leaves the HTTP client's behaviour untouched
    pub timeout_seconds: Option<u64>,
}

impl Config {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            username: username.into(),
            password: password.into(),
            timeout_seconds: None,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }

    pub fn from_env() -> Result<Self, env::VarError> {
        let username = env::var("VEOLIA_USERNAME")?;
        let password = env::var("VEOLIA_PASSWORD")?;
        Ok(Config::new(username, password).with_env_overrides())
    }

    /// Apply `VEOLIA_HOST` and `VEOLIA_TIMEOUT_SECONDS` when they are set
    ///
    /// An unparseable timeout is ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = env::var("VEOLIA_HOST") {
            self.host = host;
        }
        if let Some(timeout) = env::var("VEOLIA_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.timeout_seconds = Some(timeout);
        }
        self
    }
}

// Keeps the password out of logs
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}
