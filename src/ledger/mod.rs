//! Per-customer delivery status, keyed by `recid`.

mod sql;

pub use sql::SqlStatusLedger;

use crate::model::{Customer, DeliveryStats, DeliveryStatus};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Customer {0} not found")]
    NotFound(i64),

    #[error("Customer {recid} has unknown status code {code}")]
    UnknownStatus { recid: i64, code: i64 },
}

/// Status store abstraction. Every mutation is durable when the call returns.
#[async_trait]
pub trait StatusLedger: Send + Sync {
    /// Customers in `status`, ordered by `recid`, at most `limit` of them.
    async fn customers_with_status(
        &self,
        status: DeliveryStatus,
        limit: Option<usize>,
    ) -> Result<Vec<Customer>, LedgerError>;

    async fn customer(&self, recid: i64) -> Result<Option<Customer>, LedgerError>;

    async fn set_status(&self, recid: i64, status: DeliveryStatus) -> Result<(), LedgerError>;

    async fn counts(&self) -> Result<DeliveryStats, LedgerError>;

    /// Moves one Failed customer back to NotYet. Returns false when the
    /// customer exists but is not Failed.
    async fn requeue(&self, recid: i64) -> Result<bool, LedgerError>;

    /// Moves every Failed customer back to NotYet, returning how many moved.
    async fn requeue_failed(&self) -> Result<u64, LedgerError>;

    async fn insert(&self, customer: &Customer) -> Result<(), LedgerError>;

    /// Inserts the customer or refreshes its name, contact details and
    /// account. Either way the customer ends up NotYet; `customer_id` of an
    /// existing row is kept.
    async fn upsert(&self, customer: &Customer) -> Result<(), LedgerError>;

    /// Overwrites the contact details that are given and leaves the rest.
    async fn update_contact(
        &self,
        recid: i64,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<(), LedgerError>;

    /// Case-insensitive substring match on short name or customer id,
    /// ordered by short name.
    async fn search(&self, term: &str) -> Result<Vec<Customer>, LedgerError>;
}

/// Upserts every customer and returns how many were written.
pub async fn import_customers(
    ledger: &dyn StatusLedger,
    customers: &[Customer],
) -> Result<usize, LedgerError> {
    for customer in customers {
        ledger.upsert(customer).await?;
    }
    log::info!("Imported {} customers into the ledger", customers.len());
    Ok(customers.len())
}
