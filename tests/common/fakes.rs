use async_trait::async_trait;
use statement_mailer::delivery::{MailError, Mailer, StatementEmail};
use statement_mailer::model::ReportingPeriod;
use statement_mailer::source::{RowSource, SourceError, SourceTable};
use std::collections::HashMap;
use std::sync::Mutex;

/// Serves prepared result sets per account; unknown accounts fail like a
/// broken connection.
#[derive(Default)]
pub struct FakeRowSource {
    tables: HashMap<String, SourceTable>,
}

impl FakeRowSource {
    pub fn with_table(mut self, account: &str, table: SourceTable) -> Self {
        self.tables.insert(account.to_string(), table);
        self
    }
}

#[async_trait]
impl RowSource for FakeRowSource {
    async fn fetch_table(
        &self,
        account: &str,
        _period: &ReportingPeriod,
    ) -> Result<SourceTable, SourceError> {
        self.tables
            .get(account)
            .cloned()
            .ok_or(SourceError::Database(sqlx::Error::PoolTimedOut))
    }
}

/// Captures sent emails instead of talking SMTP. `failing` makes every send
/// return a transport-style error.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<StatementEmail>>,
    pub failing: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn sent(&self) -> Vec<StatementEmail> {
        self.sent.lock().expect("mailer lock").clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: StatementEmail) -> Result<(), MailError> {
        if self.failing {
            return Err(MailError::Attachment(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "smtp connection refused",
            )));
        }
        self.sent.lock().expect("mailer lock").push(email);
        Ok(())
    }
}
