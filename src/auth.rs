//! Credentials storage for the EMS TUI.
//!
//! Loads and saves the bearer token from `~/.ems/.credentials.json`. The
//! token must be valid before a stream is opened; issuing or refreshing
//! tokens is the server's concern, not this client's.

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

/// The credentials directory name.
const CREDENTIALS_DIR: &str = ".ems";

/// The credentials file name.
const CREDENTIALS_FILE: &str = ".credentials.json";

/// Environment variable that overrides the stored token.
pub const TOKEN_ENV_VAR: &str = "EMS_TOKEN";

/// Authentication credentials for the EMS backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Credentials {
    /// Bearer token for API authentication.
    pub token: Option<String>,
    /// Token expiration time as Unix timestamp (seconds since epoch).
    pub expires_at: Option<i64>,
}

impl Credentials {
    /// Create new empty credentials.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the credentials have a token.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Check if the token is expired.
    ///
    /// Returns `true` if the token is expired or if there's no expiration
    /// time set.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let now = chrono::Utc::now().timestamp();
                now >= expires_at
            }
            None => true,
        }
    }

    /// Check if the credentials are valid (has token and not expired).
    pub fn is_valid(&self) -> bool {
        self.has_token() && !self.is_expired()
    }
}

/// Manages credential storage and retrieval.
#[derive(Debug)]
pub struct CredentialsManager {
    /// Path to the credentials file.
    credentials_path: PathBuf,
}

impl CredentialsManager {
    /// Create a new CredentialsManager.
    ///
    /// Returns `None` if the home directory cannot be determined.
    pub fn new() -> Option<Self> {
        let home = dirs::home_dir()?;
        let credentials_path = home.join(CREDENTIALS_DIR).join(CREDENTIALS_FILE);
        Some(Self { credentials_path })
    }

    /// Create a manager backed by an explicit path.
    pub fn with_path(credentials_path: PathBuf) -> Self {
        Self { credentials_path }
    }

    /// Get the path to the credentials file.
    pub fn credentials_path(&self) -> &PathBuf {
        &self.credentials_path
    }

    /// Load credentials from the credentials file.
    ///
    /// Returns default credentials if the file doesn't exist or can't be read.
    pub fn load(&self) -> Credentials {
        if !self.credentials_path.exists() {
            return Credentials::default();
        }

        let file = match File::open(&self.credentials_path) {
            Ok(f) => f,
            Err(_) => return Credentials::default(),
        };

        let reader = BufReader::new(file);
        match serde_json::from_reader(reader) {
            Ok(creds) => creds,
            Err(_) => Credentials::default(),
        }
    }

    /// Save credentials to the credentials file.
    ///
    /// Creates the parent directory if it doesn't exist.
    /// Returns `true` if successful, `false` otherwise.
    pub fn save(&self, credentials: &Credentials) -> bool {
        if let Some(parent) = self.credentials_path.parent() {
            if !parent.exists() && fs::create_dir_all(parent).is_err() {
                return false;
            }
        }

        let file = match File::create(&self.credentials_path) {
            Ok(f) => f,
            Err(_) => return false,
        };

        let mut writer = BufWriter::new(file);
        if serde_json::to_writer_pretty(&mut writer, credentials).is_err() {
            return false;
        }
        writer.flush().is_ok()
    }
}

/// Resolve the token to use for this run.
///
/// `EMS_TOKEN` wins over the stored credentials, which keeps scripted use
/// and development against a local backend simple.
pub fn resolve_token(manager: Option<&CredentialsManager>) -> Option<String> {
    if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
        if !token.is_empty() {
            return Some(token);
        }
    }

    let manager = manager?;
    let credentials = manager.load();
    if credentials.is_valid() {
        credentials.token
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_credentials_invalid() {
        let creds = Credentials::new();
        assert!(!creds.has_token());
        assert!(creds.is_expired());
        assert!(!creds.is_valid());
    }

    #[test]
    fn test_unexpired_token_is_valid() {
        let creds = Credentials {
            token: Some("abc".to_string()),
            expires_at: Some(chrono::Utc::now().timestamp() + 3600),
        };
        assert!(creds.is_valid());
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let creds = Credentials {
            token: Some("abc".to_string()),
            expires_at: Some(chrono::Utc::now().timestamp() - 1),
        };
        assert!(creds.has_token());
        assert!(!creds.is_valid());
    }

    #[test]
    fn test_token_without_expiry_is_invalid() {
        let creds = Credentials {
            token: Some("abc".to_string()),
            expires_at: None,
        };
        assert!(!creds.is_valid());
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CredentialsManager::with_path(dir.path().join(".credentials.json"));
        assert_eq!(manager.load(), Credentials::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CredentialsManager::with_path(dir.path().join("nested").join(".credentials.json"));

        let creds = Credentials {
            token: Some("secret".to_string()),
            expires_at: Some(1_900_000_000),
        };
        assert!(manager.save(&creds));
        assert_eq!(manager.load(), creds);
    }

    #[test]
    fn test_load_corrupt_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".credentials.json");
        std::fs::write(&path, "not json").unwrap();

        let manager = CredentialsManager::with_path(path);
        assert_eq!(manager.load(), Credentials::default());
    }
}
