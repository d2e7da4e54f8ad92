//! Runtime configuration: compiled-in defaults, an optional `config/default.toml`
//! and `STATEMENT_MAILER__*` environment overrides, layered in that order.

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const ENV_PREFIX: &str = "STATEMENT_MAILER";
pub const SENDER_EMAIL_VAR: &str = "SENDER_EMAIL";
pub const SENDER_PASSWORD_VAR: &str = "SENDER_PASSWORD";

/// The `Any` driver cannot decode postgres DATE or NUMERIC columns, and binds
/// the period as text, so the default call casts both ways.
const DEFAULT_QUERY: &str = concat!(
    r#"SELECT "Account Name"::text AS "Account Name", "Account Number"::text AS "Account Number", "#,
    r#""Account Type"::text AS "Account Type", "Currency"::text AS "Currency", "#,
    r#""Book Date"::text AS "Book Date", "Reference"::text AS "Reference", "#,
    r#""Narration"::text AS "Narration", "Value Date"::text AS "Value Date", "#,
    r#""Credit"::text AS "Credit", "Debit"::text AS "Debit", "Balance"::text AS "Balance" "#,
    "FROM account_statement($1, $2::date, $3::date)"
);
const DEFAULT_BODY: &str = "Dear Customer,\n\nPlease find attached your bank statement for the period from {{start}} to {{end}}.\n\nBest regards,\nYour Bank";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("Missing environment variable {0}")]
    MissingCredential(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub ledger: LedgerConfig,
    pub smtp: SmtpConfig,
    pub statement: StatementConfig,
    pub settings: SettingsConfig,
}

/// Where transaction rows come from. Either `url` is set directly or `profile`
/// names a connection profile from the settings store.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub url: Option<String>,
    pub profile: Option<String>,
    /// SQL text taking `$1` = account, `$2` = start date, `$3` = end date.
    pub query: String,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    pub url: Option<String>,
    pub profile: Option<String>,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
}

impl SmtpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatementConfig {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub work_dir: PathBuf,
    pub logo_path: Option<PathBuf>,
    pub subject: String,
    /// Handlebars template for the plain-text body.
    pub body_template: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettingsConfig {
    pub path: PathBuf,
}

impl Config {
    /// Loads `config/default.toml` from the working directory when present.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("config/default"))
    }

    /// Loads configuration using `file_stem` (without extension) as the optional
    /// file source.
    pub fn load_from(file_stem: &Path) -> Result<Self, ConfigError> {
        let builder = Self::defaults(config::Config::builder())?
            .add_source(config::File::from(file_stem).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"));

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Ok(builder
            .set_default("source.query", DEFAULT_QUERY)?
            .set_default("source.acquire_timeout_secs", 30)?
            .set_default("ledger.url", "sqlite://statement-mailer.db?mode=rwc")?
            .set_default("ledger.acquire_timeout_secs", 30)?
            .set_default("smtp.host", "smtp.office365.com")?
            .set_default("smtp.port", 587)?
            .set_default("smtp.timeout_secs", 30)?
            .set_default("statement.period_start", "2024-01-01")?
            .set_default("statement.period_end", "2024-11-20")?
            .set_default("statement.work_dir", ".")?
            .set_default("statement.subject", "Your Bank Statement")?
            .set_default("statement.body_template", DEFAULT_BODY)?
            .set_default("settings.path", "config.json")?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.statement.period_end < self.statement.period_start {
            return Err(ConfigError::Invalid(format!(
                "statement period ends ({}) before it starts ({})",
                self.statement.period_end, self.statement.period_start
            )));
        }
        if self.smtp.host.trim().is_empty() {
            return Err(ConfigError::Invalid("smtp.host is empty".into()));
        }
        Ok(())
    }
}

/// Login for the mail transport. Only ever read from the environment.
#[derive(Clone)]
pub struct MailCredentials {
    pub sender: String,
    pub password: String,
}

impl std::fmt::Debug for MailCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailCredentials")
            .field("sender", &self.sender)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl MailCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::MissingCredential(name))
        };
        Ok(Self {
            sender: read(SENDER_EMAIL_VAR)?,
            password: read(SENDER_PASSWORD_VAR)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("missing")).unwrap();
        assert_eq!(config.smtp.host, "smtp.office365.com");
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.smtp.timeout(), Duration::from_secs(30));
        assert_eq!(config.statement.subject, "Your Bank Statement");
        assert_eq!(
            config.statement.period_start,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert!(config.statement.body_template.contains("{{start}}"));
    }

    #[test]
    fn default_query_casts_for_the_any_driver() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("missing")).unwrap();
        let query = &config.source.query;
        assert!(query.contains("$2::date, $3::date"));
        for column in crate::source::REQUIRED_COLUMNS {
            let cast = format!("\"{0}\"::text AS \"{0}\"", column);
            assert!(query.contains(&cast), "{} is not cast to text", column);
        }
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("custom.toml"),
            "[smtp]\nport = 2525\n\n[statement]\nperiod_start = \"2024-02-01\"\nperiod_end = \"2024-02-29\"\n",
        )
        .unwrap();
        let config = Config::load_from(&dir.path().join("custom")).unwrap();
        assert_eq!(config.smtp.port, 2525);
        assert_eq!(
            config.statement.period_end,
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn inverted_period_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("bad.toml"),
            "[statement]\nperiod_start = \"2024-03-01\"\nperiod_end = \"2024-02-01\"\n",
        )
        .unwrap();
        assert!(matches!(
            Config::load_from(&dir.path().join("bad")),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn credentials_require_both_variables() {
        let missing = MailCredentials::from_lookup(|name| {
            (name == SENDER_EMAIL_VAR).then(|| "bank@example.com".to_string())
        });
        assert!(matches!(
            missing,
            Err(ConfigError::MissingCredential(SENDER_PASSWORD_VAR))
        ));

        let creds = MailCredentials::from_lookup(|_| Some("value".to_string())).unwrap();
        assert_eq!(creds.sender, "value");
        assert!(format!("{:?}", creds).contains("<redacted>"));
    }
}
