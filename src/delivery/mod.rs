//! Batch delivery: render each pending customer's statement, mail it and
//! record the outcome.

mod mailer;
mod pipeline;

pub use mailer::{MailError, Mailer, SmtpMailer, StatementEmail, build_message};
pub use pipeline::{DeliveryOptions, DeliveryPipeline, RunSummary};
