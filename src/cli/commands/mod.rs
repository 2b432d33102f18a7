//! Command implementations.

pub mod completions;
pub mod convert;
pub mod get;
pub mod library;
pub mod projects;
pub mod rename;
pub mod update;
pub mod version;

use tracing::debug;

use crate::config::Config;
use crate::convert::MarkupFormat;
use crate::error::{Error, Result};
use crate::remote::DradisClient;

/// Validate the token, build the client and check the instance answers.
///
/// Runs before any remote action so configuration problems abort early.
///
/// # Errors
///
/// Returns [`Error::InvalidToken`], a config error for a missing URL, or
/// [`Error::Unreachable`] if the instance does not answer.
pub fn connect(config: &Config) -> Result<DradisClient> {
    config.validate_token()?;
    let url = config.instance_url()?;

    let client = DradisClient::new(url, &config.api_token, &config.tls(), config.timeout())?;
    if !client.probe() {
        return Err(Error::Unreachable {
            url: url.to_string(),
        });
    }
    debug!(url, "Connected to Dradis");
    Ok(client)
}

/// Format named on the command line, or the configured preferred one.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for an unknown name.
pub fn resolve_format(name: Option<&str>, config: &Config) -> Result<MarkupFormat> {
    match name {
        Some(name) => MarkupFormat::from_name(name).ok_or_else(|| Error::UnsupportedFormat {
            format: name.to_string(),
            supported: MarkupFormat::names(),
        }),
        None => Ok(config.preferred_format()),
    }
}

/// Human-readable byte size (`512 B`, `1.2 kB`).
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["kB", "MB", "GB", "TB"];
    if bytes < 1000 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1000.0;
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if value < 1000.0 {
            break;
        }
        value /= 1000.0;
        unit = next;
    }
    format!("{value:.1} {unit}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_format() {
        let config = Config::default();
        assert_eq!(resolve_format(None, &config).unwrap(), MarkupFormat::Textile);
        assert_eq!(resolve_format(Some("MD"), &config).ok(), None);
        assert_eq!(
            resolve_format(Some("Markdown"), &config).unwrap(),
            MarkupFormat::Markdown
        );
        assert!(matches!(
            resolve_format(Some("rtf"), &config),
            Err(Error::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(999), "999 B");
        assert_eq!(format_size(1_240), "1.2 kB");
        assert_eq!(format_size(3_400_000), "3.4 MB");
    }

    #[test]
    fn test_connect_rejects_bad_token_before_network() {
        let config = Config {
            api_token: "short".into(),
            instance_url: "https://dradis.invalid".into(),
            ..Config::default()
        };
        assert!(matches!(connect(&config), Err(Error::InvalidToken)));
    }
}
