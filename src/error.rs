use crate::config::ConfigError;
use crate::delivery::MailError;
use crate::ledger::LedgerError;
use crate::settings::SettingsError;
use crate::source::SourceError;
use crate::statement::StatementError;
use thiserror::Error;

/// Any failure that can end a command of the statement mailer.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Row source error: {0}")]
    Source(#[from] SourceError),

    #[error("Statement error: {0}")]
    Statement(#[from] StatementError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
