//! Configuration management.
//!
//! Settings live in `~/.dradismd/config.json`. A missing file means
//! defaults; the API token and instance URL can also come from
//! `DRADIS_API_TOKEN` and `DRADIS_URL`, which win over the file.
//!
//! ```json
//! {
//!   "api_token": "abcdefghij0123456789",
//!   "instance_url": "https://dradis.example.com",
//!   "log_level": 1,
//!   "preferred_format": "markdown",
//!   "ssl_certificate": "",
//!   "custom_fields": ["Scope", "Start date"],
//!   "renaming_format": "[section_initials]_[count]_[caption]"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::convert::MarkupFormat;
use crate::error::{Error, Result};
use crate::remote::TlsVerification;

/// Environment variable overriding the API token.
pub const TOKEN_ENV: &str = "DRADIS_API_TOKEN";

/// Environment variable overriding the instance URL.
pub const URL_ENV: &str = "DRADIS_URL";

/// Environment variable pointing at another config file.
pub const CONFIG_ENV: &str = "DRADISMD_CONFIG";

/// Length of a Dradis API token.
pub const TOKEN_LENGTH: usize = 20;

/// Global dradismd directory (`~/.dradismd`).
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".dradismd"))
}

/// Resolve the config file path.
///
/// Priority:
/// 1. Explicit path (`--config` / `DRADISMD_CONFIG`)
/// 2. `~/.dradismd/config.json`
///
/// # Errors
///
/// Returns an error if no explicit path is given and the home directory
/// cannot be determined.
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    config_dir()
        .map(|dir| dir.join("config.json"))
        .ok_or_else(|| Error::Config("Could not determine home directory".into()))
}

/// dradismd settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_token: String,
    pub instance_url: String,

    /// 0 = errors, 1 = info, 2+ = debug.
    pub log_level: u8,

    /// Format used by `get` and `add-issue` when none is given.
    pub preferred_format: String,

    /// `"false"` disables verification, a path pins a CA, empty = system roots.
    pub ssl_certificate: String,

    /// Project custom fields shown as extra `list-projects` columns.
    pub custom_fields: Vec<String>,

    pub renaming_format: Option<String>,
    pub issue_template: Option<PathBuf>,
    pub evidence_template: Option<PathBuf>,

    /// HTTP request timeout.
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            instance_url: String::new(),
            log_level: 0,
            preferred_format: MarkupFormat::NATIVE.name().to_string(),
            ssl_certificate: String::new(),
            custom_fields: Vec::new(),
            renaming_format: None,
            issue_template: None,
            evidence_template: None,
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load the config file, then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = config_path(explicit)?;
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(
            std::env::var(TOKEN_ENV).ok(),
            std::env::var(URL_ENV).ok(),
        );
        Ok(config)
    }

    /// Load a config file without environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {e}")))
    }

    fn apply_overrides(&mut self, token: Option<String>, url: Option<String>) {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.api_token = token.trim().to_string();
        }
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.instance_url = url.trim().to_string();
        }
    }

    /// Check the token looks like a Dradis token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToken`] unless the token is exactly
    /// [`TOKEN_LENGTH`] characters.
    pub fn validate_token(&self) -> Result<()> {
        if self.api_token.chars().count() == TOKEN_LENGTH {
            Ok(())
        } else {
            Err(Error::InvalidToken)
        }
    }

    /// The instance URL without trailing slash.
    ///
    /// # Errors
    ///
    /// Returns an error if no URL is configured.
    pub fn instance_url(&self) -> Result<&str> {
        let url = self.instance_url.trim().trim_end_matches('/');
        if url.is_empty() {
            return Err(Error::Config(format!(
                "instance_url is not set (config file or {URL_ENV})"
            )));
        }
        Ok(url)
    }

    /// Preferred output format, falling back to textile when unsupported.
    #[must_use]
    pub fn preferred_format(&self) -> MarkupFormat {
        MarkupFormat::from_name(&self.preferred_format).unwrap_or_else(|| {
            warn!(format = %self.preferred_format, "Unsupported preferred_format, using textile");
            MarkupFormat::NATIVE
        })
    }

    /// Certificate verification mode from `ssl_certificate`.
    #[must_use]
    pub fn tls(&self) -> TlsVerification {
        let value = self.ssl_certificate.trim();
        if value.is_empty() {
            return TlsVerification::Default;
        }
        if value.eq_ignore_ascii_case("false") {
            warn!("SSL verification disabled, only use this for testing");
            return TlsVerification::Disabled;
        }

        let path = PathBuf::from(value);
        if path.is_file() {
            TlsVerification::CustomCa(path)
        } else {
            warn!(path = value, "SSL certificate not found, using default verification");
            TlsVerification::Default
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Configured custom-field columns, blanks removed.
    #[must_use]
    pub fn custom_columns(&self) -> Vec<&str> {
        self.custom_fields
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::from_file(&dir.path().join("config.json")).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.preferred_format(), MarkupFormat::Textile);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"api_token": "abcdefghij0123456789", "preferred_format": "markdown", "custom_fields": ["Scope", " "]}"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();

        assert!(config.validate_token().is_ok());
        assert_eq!(config.preferred_format(), MarkupFormat::Markdown);
        assert_eq!(config.custom_columns(), vec!["Scope"]);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(Config::from_file(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides_win() {
        let mut config = Config {
            api_token: "from-file".into(),
            instance_url: "https://file.test".into(),
            ..Config::default()
        };

        config.apply_overrides(Some("  ".into()), Some("https://env.test/".into()));

        assert_eq!(config.api_token, "from-file");
        assert_eq!(config.instance_url().unwrap(), "https://env.test");
    }

    #[test]
    fn test_token_validation() {
        let mut config = Config::default();
        assert!(matches!(config.validate_token(), Err(Error::InvalidToken)));

        config.api_token = "short".into();
        assert!(config.validate_token().is_err());

        config.api_token = "x".repeat(TOKEN_LENGTH);
        assert!(config.validate_token().is_ok());
    }

    #[test]
    fn test_tls_modes() {
        let dir = TempDir::new().unwrap();
        let cert = dir.path().join("ca.pem");
        fs::write(&cert, "pem").unwrap();

        let mut config = Config::default();
        assert_eq!(config.tls(), TlsVerification::Default);

        config.ssl_certificate = "False".into();
        assert_eq!(config.tls(), TlsVerification::Disabled);

        config.ssl_certificate = cert.display().to_string();
        assert_eq!(config.tls(), TlsVerification::CustomCa(cert));

        config.ssl_certificate = "/nonexistent/ca.pem".into();
        assert_eq!(config.tls(), TlsVerification::Default);
    }

    #[test]
    fn test_unsupported_format_falls_back() {
        let config = Config {
            preferred_format: "rtf".into(),
            ..Config::default()
        };
        assert_eq!(config.preferred_format(), MarkupFormat::Textile);
    }
}
