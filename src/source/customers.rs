use super::SourceError;
use crate::model::{Customer, DeliveryStatus};
use sqlx::any::AnyRow;
use sqlx::pool::PoolOptions;
use sqlx::{Any, AnyPool, Row};
use std::time::Duration;

/// Reads customer records from an external table.
///
/// The table must expose `recid`, `short_name`, `sms_d_1`, `email_d_1`,
/// `customer_id` and `account`. NULL names and ids come back empty; NULL
/// contact details stay absent.
pub struct SqlCustomerSource {
    pool: AnyPool,
    table: String,
}

impl SqlCustomerSource {
    pub async fn connect(
        url: &str,
        table: &str,
        acquire_timeout: Duration,
    ) -> Result<Self, SourceError> {
        check_table_name(table)?;
        sqlx::any::install_default_drivers();
        let pool = PoolOptions::<Any>::new()
            .max_connections(1)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await?;
        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    pub fn from_pool(pool: AnyPool, table: &str) -> Result<Self, SourceError> {
        check_table_name(table)?;
        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    /// Every customer in the table, ordered by `recid`, each marked NotYet.
    pub async fn fetch_customers(&self) -> Result<Vec<Customer>, SourceError> {
        let sql = format!(
            "SELECT recid, short_name, sms_d_1, email_d_1, customer_id, account FROM {} ORDER BY recid",
            self.table
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        log::info!("Fetched {} customers from {}", rows.len(), self.table);
        rows.iter().map(customer_from_row).collect()
    }
}

fn customer_from_row(row: &AnyRow) -> Result<Customer, SourceError> {
    let text = |column: &str| -> Result<String, SourceError> {
        Ok(row.try_get::<Option<String>, _>(column)?.unwrap_or_default())
    };
    Ok(Customer {
        recid: row.try_get("recid")?,
        short_name: text("short_name")?,
        phone: row.try_get("sms_d_1")?,
        email: row.try_get("email_d_1")?,
        customer_id: text("customer_id")?,
        account: text("account")?,
        status: DeliveryStatus::NotYet,
    })
}

/// Table names are spliced into SQL, so only `schema.table` shaped
/// identifiers are accepted.
fn check_table_name(table: &str) -> Result<(), SourceError> {
    let valid = !table.is_empty()
        && table.split('.').all(|part| {
            !part.is_empty()
                && !part.starts_with(|c: char| c.is_ascii_digit())
                && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    if valid {
        Ok(())
    } else {
        Err(SourceError::InvalidTableName(table.to_string()))
    }
}
