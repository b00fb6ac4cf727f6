//! Runtime configuration for the EMS TUI.

use crate::client::DEFAULT_BASE_URL;

/// Environment variable naming the EMS backend base URL.
pub const API_URL_ENV_VAR: &str = "EMS_API_URL";

/// Configuration resolved at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the EMS backend.
    pub base_url: String,
}

impl Config {
    /// Resolve configuration from the environment.
    ///
    /// `EMS_API_URL` overrides the default.
    pub fn from_env() -> Self {
        let base_url = std::env::var(API_URL_ENV_VAR)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url: normalize_base_url(&base_url),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Trim trailing slashes so URL building stays uniform.
fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
