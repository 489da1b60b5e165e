// Connection settings. Everything can come from environment variables so the
// interactive menu can pre-fill its prompts, the same way the gateway URL used
// to be read from `API_GATEWAY_URL`.

use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

pub const HOST_VAR: &str = "CLOUDSHELL_HOST";
pub const PORT_VAR: &str = "CLOUDSHELL_PORT";
pub const USERNAME_VAR: &str = "CLOUDSHELL_USERNAME";
pub const DOMAIN_VAR: &str = "CLOUDSHELL_DOMAIN";
pub const TIMEOUT_VAR: &str = "CLOUDSHELL_TIMEOUT_SECS";

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9000;
pub const DEFAULT_DOMAIN: &str = "Global";

/// Where the CloudShell server lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        ClientConfig {
            host: host.into(),
            port,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build a config from `CLOUDSHELL_HOST`, `CLOUDSHELL_PORT` and
    /// `CLOUDSHELL_TIMEOUT_SECS`, falling back to `localhost:9000`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = non_empty(lookup(HOST_VAR)).unwrap_or_else(|| DEFAULT_HOST.into());

        let port = match non_empty(lookup(PORT_VAR)) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort {
                var: PORT_VAR,
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let timeout = match non_empty(lookup(TIMEOUT_VAR)) {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidTimeout {
                    var: TIMEOUT_VAR,
                    value: raw,
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(ClientConfig { host, port, timeout })
    }

    /// Root of the REST API, e.g. `http://localhost:9000/API`.
    pub fn api_base(&self) -> String {
        format!("http://{}:{}/API", self.host, self.port)
    }
}

/// Login credentials. The password never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub domain: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
            domain: DEFAULT_DOMAIN.into(),
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .field("domain", &self.domain)
            .finish()
    }
}

/// Username to pre-fill in the login prompt, if any.
pub fn username_from_env() -> Option<String> {
    non_empty(std::env::var(USERNAME_VAR).ok())
}

/// Domain to pre-fill in the login prompt.
pub fn domain_from_env() -> String {
    non_empty(std::env::var(DOMAIN_VAR).ok()).unwrap_or_else(|| DEFAULT_DOMAIN.into())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
