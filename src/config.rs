//! Environment-scoped configuration.
//!
//! The upstream endpoint, its access token, and the operational knobs live
//! in the environment (`.env` is honored by the binaries via dotenvy):
//!
//! - `OCS_API_TOKEN` (required) upstream access token
//! - `OCS_API_URL` upstream query endpoint
//! - `OCS_TIMEOUT_SECS` per-request deadline for upstream calls
//! - `OCS_DEFAULT_START_DATE` report window start used when a request does
//!   not carry one
//!
//! The token authenticates every upstream call and must never appear in
//! logs; [`OcsConfig`] redacts it from `Debug` output.

use std::env;
use std::fmt;
use std::time::Duration;

use crate::error::OcsError;

pub const DEFAULT_API_URL: &str = "https://ocs-api.esimvault.cloud/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 8;
pub const DEFAULT_START_DATE: &str = "2025-06-01";

/// Runtime configuration shared by the server and the report CLI.
#[derive(Clone)]
pub struct OcsConfig {
    pub api_url: String,
    pub api_token: String,
    pub timeout_secs: u64,
    pub default_start_date: String,
}

impl OcsConfig {
    /// Load configuration from the environment.
    ///
    /// `OCS_API_TOKEN` is required; everything else falls back to a
    /// default. A present but non-integer `OCS_TIMEOUT_SECS` is a hard
    /// error rather than a silent fallback.
    pub fn from_env() -> Result<Self, OcsError> {
        let api_token = env::var("OCS_API_TOKEN")
            .map_err(|_| OcsError::Config("OCS_API_TOKEN environment variable not set".into()))?;
        let api_url = env::var("OCS_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let timeout_secs = match env::var("OCS_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| {
                OcsError::Config(format!("OCS_TIMEOUT_SECS must be an integer, got {raw:?}"))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };
        let default_start_date =
            env::var("OCS_DEFAULT_START_DATE").unwrap_or_else(|_| DEFAULT_START_DATE.to_string());

        Ok(Self {
            api_url,
            api_token,
            timeout_secs,
            default_start_date,
        })
    }

    /// The upstream deadline as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl fmt::Debug for OcsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcsConfig")
            .field("api_url", &self.api_url)
            .field("api_token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("default_start_date", &self.default_start_date)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so the process-wide environment is touched from one
    // place only.
    #[test]
    fn test_from_env_defaults_and_redaction() {
        env::remove_var("OCS_API_TOKEN");
        env::remove_var("OCS_API_URL");
        env::remove_var("OCS_TIMEOUT_SECS");
        env::remove_var("OCS_DEFAULT_START_DATE");

        let err = OcsConfig::from_env().unwrap_err();
        assert!(matches!(err, OcsError::Config(_)));

        env::set_var("OCS_API_TOKEN", "secret-token");
        let config = OcsConfig::from_env().unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.default_start_date, DEFAULT_START_DATE);
        assert_eq!(config.timeout(), Duration::from_secs(8));

        let dump = format!("{config:?}");
        assert!(!dump.contains("secret-token"));
        assert!(dump.contains("<redacted>"));

        env::set_var("OCS_TIMEOUT_SECS", "not a number");
        let err = OcsConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("OCS_TIMEOUT_SECS"));

        env::set_var("OCS_TIMEOUT_SECS", "3");
        env::set_var("OCS_API_URL", "http://localhost:9");
        let config = OcsConfig::from_env().unwrap();
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.api_url, "http://localhost:9");

        env::remove_var("OCS_API_TOKEN");
        env::remove_var("OCS_API_URL");
        env::remove_var("OCS_TIMEOUT_SECS");
    }
}
