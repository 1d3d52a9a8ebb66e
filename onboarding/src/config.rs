//! Configuration.
//!
//! Constants for the onboarding pipeline plus [`ClientConfig`], which reads
//! the employee API location and credentials from the environment
//! (a `.env` file is loaded by the binary before this runs).
//!
//! | Variable                   | Default                          |
//! |----------------------------|----------------------------------|
//! | `PODIUM_API_URL`           | `http://localhost:8000/api/v1`   |
//! | `PODIUM_API_TOKEN`         | none (no `Authorization` header) |
//! | `PODIUM_API_TIMEOUT_SECS`  | `10`                             |

use std::env;
use std::time::Duration;

use crate::error::ConfigError;

/// Employee API base URL used when `PODIUM_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// Request timeout used when `PODIUM_API_TIMEOUT_SECS` is not set.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Single employee creation endpoint, relative to the base URL.
pub const CREATE_EMPLOYEE_PATH: &str = "/employees";

/// Batch creation endpoint, relative to the base URL.
pub const BATCH_CREATE_PATH: &str = "/users/batch";

/// Prefix of the generated one-off passwords.
pub const PASSWORD_PREFIX: &str = "Podium#";

/// Random characters appended to [`PASSWORD_PREFIX`].
pub const PASSWORD_SUFFIX_LEN: usize = 8;

/// Size of each chunk when streaming the batch body (drives upload progress).
pub const UPLOAD_CHUNK_SIZE: usize = 16 * 1024;

/// Maximum CSV upload accepted by the HTTP service.
///
/// 10 MB limit.
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Employee API client settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL without trailing slash.
    pub base_url: String,
    /// Bearer token for the `Authorization` header.
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load from `PODIUM_API_URL`, `PODIUM_API_TOKEN` and `PODIUM_API_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut config = match get("PODIUM_API_URL") {
            Some(url) => {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(ConfigError::InvalidValue {
                        name: "PODIUM_API_URL".to_string(),
                        message: format!("'{}' is not an http(s) URL", url),
                    });
                }
                Self::new(url.trim())
            }
            None => Self::default(),
        };

        if let Some(token) = get("PODIUM_API_TOKEN") {
            config.token = Some(token.trim().to_string());
        }

        if let Some(secs) = get("PODIUM_API_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "PODIUM_API_TIMEOUT_SECS".to_string(),
                message: format!("'{}' is not a whole number of seconds", secs),
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Join an endpoint path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.endpoint(BATCH_CREATE_PATH), "http://localhost:8000/api/v1/users/batch");
    }

    #[test]
    fn test_from_vars() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("PODIUM_API_URL", "https://api.podium.test/api/v1/"),
            ("PODIUM_API_TOKEN", "abc"),
            ("PODIUM_API_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "https://api.podium.test/api/v1");
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_blank_token_is_unset() {
        let config = ClientConfig::from_lookup(lookup(&[("PODIUM_API_TOKEN", "  ")])).unwrap();
        assert!(config.token.is_none());
    }

    #[test]
    fn test_invalid_values() {
        let err = ClientConfig::from_lookup(lookup(&[("PODIUM_API_URL", "ftp://x")])).unwrap_err();
        assert!(err.to_string().contains("PODIUM_API_URL"));

        let err =
            ClientConfig::from_lookup(lookup(&[("PODIUM_API_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("PODIUM_API_TIMEOUT_SECS"));
    }
}
