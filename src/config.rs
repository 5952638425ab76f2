use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;

use crate::access;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub manager_passcode: String,
    pub log_format: LogFormat,
}

impl Config {
    pub fn new(
        database_url: Option<String>,
        manager_passcode: String,
        log_format: LogFormat,
    ) -> anyhow::Result<Self> {
        let database_url = database_url
            .filter(|url| !url.trim().is_empty())
            .context("DATABASE_URL must be set to a production Postgres instance")?;
        if !access::is_valid_passcode(&manager_passcode) {
            bail!(
                "manager passcode must be exactly {} digits",
                access::PASSCODE_LEN
            );
        }
        Ok(Self {
            database_url,
            manager_passcode,
            log_format,
        })
    }
}

/// Logs go to stderr so command output on stdout stays clean.
/// `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_database_url() {
        let err = Config::new(None, "1234".to_string(), LogFormat::Text).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
        assert!(Config::new(Some("  ".to_string()), "1234".to_string(), LogFormat::Text).is_err());
    }

    #[test]
    fn rejects_malformed_manager_passcode() {
        let url = Some("postgres://localhost/scorecard".to_string());
        assert!(Config::new(url.clone(), "12345".to_string(), LogFormat::Text).is_err());
        assert!(Config::new(url.clone(), "12a4".to_string(), LogFormat::Text).is_err());

        let config = Config::new(url, "9876".to_string(), LogFormat::Json).unwrap();
        assert_eq!(config.manager_passcode, "9876");
    }
}
