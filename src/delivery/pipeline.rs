use super::{MailError, Mailer, StatementEmail};
use crate::ledger::{LedgerError, StatusLedger};
use crate::model::{Customer, DeliveryStatus, ReportingPeriod};
use crate::settings::EmailSettings;
use crate::source::{RowSource, fetch_or_empty};
use crate::statement::StatementRenderer;
use handlebars::Handlebars;
use log::{error, info, warn};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const BODY_TEMPLATE: &str = "body";

/// What a batch run sends and where it stages files.
#[derive(Debug, Clone)]
pub struct DeliveryOptions {
    pub period: ReportingPeriod,
    pub work_dir: PathBuf,
    pub subject: String,
    /// Handlebars source; `{{start}}`, `{{end}}`, `{{name}}` and `{{account}}`
    /// are available.
    pub body_template: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub sent: usize,
    pub failed: usize,
    pub paused: bool,
}

impl RunSummary {
    fn record(&mut self, status: DeliveryStatus) {
        self.processed += 1;
        match status {
            DeliveryStatus::Sent => self.sent += 1,
            DeliveryStatus::Failed => self.failed += 1,
            DeliveryStatus::NotYet => {}
        }
    }
}

/// Renders, mails and records one statement per pending customer, one
/// customer at a time.
pub struct DeliveryPipeline {
    source: Arc<dyn RowSource>,
    ledger: Arc<dyn StatusLedger>,
    mailer: Arc<dyn Mailer>,
    renderer: Arc<StatementRenderer>,
    templates: Handlebars<'static>,
    options: DeliveryOptions,
}

impl DeliveryPipeline {
    pub fn new(
        source: Arc<dyn RowSource>,
        ledger: Arc<dyn StatusLedger>,
        mailer: Arc<dyn Mailer>,
        renderer: Arc<StatementRenderer>,
        options: DeliveryOptions,
    ) -> Result<Self, MailError> {
        let mut templates = Handlebars::new();
        templates.set_strict_mode(true);
        templates.register_escape_fn(handlebars::no_escape);
        templates
            .register_template_string(BODY_TEMPLATE, &options.body_template)
            .map_err(|e| MailError::Template(e.to_string()))?;

        Ok(Self {
            source,
            ledger,
            mailer,
            renderer,
            templates,
            options,
        })
    }

    /// Processes up to `settings.batch_size` NotYet customers in `recid` order.
    ///
    /// Individual failures are recorded as Failed and do not stop the run; only
    /// ledger errors do, since outcomes could no longer be recorded.
    pub async fn run(&self, settings: EmailSettings) -> Result<RunSummary, LedgerError> {
        if settings.paused {
            info!("Email delivery is paused; nothing to do");
            return Ok(RunSummary {
                paused: true,
                ..RunSummary::default()
            });
        }

        let limit = (settings.batch_size > 0).then_some(settings.batch_size);
        let customers = self
            .ledger
            .customers_with_status(DeliveryStatus::NotYet, limit)
            .await?;
        info!("{} customers pending delivery", customers.len());

        let mut summary = RunSummary::default();
        for customer in customers {
            let status = self.deliver(&customer).await;
            self.ledger.set_status(customer.recid, status).await?;
            summary.record(status);
        }

        info!(
            "Delivery run finished: {} processed, {} sent, {} failed",
            summary.processed, summary.sent, summary.failed
        );
        Ok(summary)
    }

    /// Runs one customer through fetch, render and send, returning the
    /// terminal status to record.
    pub async fn deliver(&self, customer: &Customer) -> DeliveryStatus {
        let Some(address) = customer.delivery_address() else {
            warn!("Customer {} has no email address", customer.recid);
            return DeliveryStatus::Failed;
        };

        let period = &self.options.period;
        let dataset = fetch_or_empty(self.source.as_ref(), &customer.account, period).await;
        let path = match self.renderer.write_statement(
            &dataset,
            &customer.account,
            period,
            &self.options.work_dir,
        ) {
            Ok(path) => path,
            Err(e) => {
                error!("No statement for customer {}: {}", customer.recid, e);
                return DeliveryStatus::Failed;
            }
        };

        let outcome = self.send_statement(customer, address, &path).await;

        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!("Could not delete {}: {}", path.display(), e);
        }

        match outcome {
            Ok(()) => {
                info!("Statement sent to customer {} <{}>", customer.recid, address);
                DeliveryStatus::Sent
            }
            Err(e) => {
                error!("Delivery to customer {} failed: {}", customer.recid, e);
                DeliveryStatus::Failed
            }
        }
    }

    pub fn render_body(&self, customer: &Customer) -> Result<String, MailError> {
        let data = json!({
            "start": self.options.period.start_iso(),
            "end": self.options.period.end_iso(),
            "name": customer.short_name,
            "account": customer.account,
        });
        self.templates
            .render(BODY_TEMPLATE, &data)
            .map_err(|e| MailError::Template(e.to_string()))
    }

    async fn send_statement(
        &self,
        customer: &Customer,
        address: &str,
        path: &Path,
    ) -> Result<(), MailError> {
        let attachment = tokio::fs::read(path).await?;
        let attachment_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "statement.pdf".to_string());

        let email = StatementEmail {
            to: address.to_string(),
            subject: self.options.subject.clone(),
            body: self.render_body(customer)?,
            attachment_name,
            attachment,
        };
        self.mailer.send(email).await
    }
}
