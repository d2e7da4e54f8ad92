use super::{LedgerError, StatusLedger};
use crate::model::{Customer, DeliveryStats, DeliveryStatus};
use async_trait::async_trait;
use sqlx::any::AnyRow;
use sqlx::pool::PoolOptions;
use sqlx::{Any, AnyPool, Row};
use std::time::Duration;

const CUSTOMER_COLUMNS: &str =
    "recid, short_name, sms_d_1, email_d_1, customer_id, account, status";

/// sqlx-backed ledger over the `retail_customers` table. Works with any URL
/// the `Any` driver accepts (postgres, sqlite).
pub struct SqlStatusLedger {
    pool: AnyPool,
}

impl SqlStatusLedger {
    /// Connects with a single connection: the pipeline is sequential, and an
    /// in-memory sqlite database lives only as long as its connection.
    pub async fn connect(url: &str, acquire_timeout: Duration) -> Result<Self, LedgerError> {
        sqlx::any::install_default_drivers();
        let pool = PoolOptions::<Any>::new()
            .max_connections(1)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: AnyPool) -> Self {
        Self { pool }
    }

    /// Creates the table and index when missing.
    pub async fn run_migrations(&self) -> Result<(), LedgerError> {
        let migration_sql = include_str!("../../migrations/001_init.sql");
        sqlx::raw_sql(migration_sql).execute(&self.pool).await?;
        log::debug!("Ledger migrations completed");
        Ok(())
    }

    fn customer_from_row(row: &AnyRow) -> Result<Customer, LedgerError> {
        let recid: i64 = row.try_get("recid")?;
        let code: i64 = row.try_get("status")?;
        let status =
            DeliveryStatus::from_code(code).ok_or(LedgerError::UnknownStatus { recid, code })?;
        Ok(Customer {
            recid,
            short_name: row.try_get("short_name")?,
            phone: row.try_get("sms_d_1")?,
            email: row.try_get("email_d_1")?,
            customer_id: row.try_get("customer_id")?,
            account: row.try_get("account")?,
            status,
        })
    }
}

#[async_trait]
impl StatusLedger for SqlStatusLedger {
    async fn customers_with_status(
        &self,
        status: DeliveryStatus,
        limit: Option<usize>,
    ) -> Result<Vec<Customer>, LedgerError> {
        let rows = match limit {
            Some(limit) => {
                let sql = format!(
                    "SELECT {} FROM retail_customers WHERE status = $1 ORDER BY recid LIMIT $2",
                    CUSTOMER_COLUMNS
                );
                sqlx::query(&sql)
                    .bind(status.code())
                    .bind(i64::try_from(limit).unwrap_or(i64::MAX))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM retail_customers WHERE status = $1 ORDER BY recid",
                    CUSTOMER_COLUMNS
                );
                sqlx::query(&sql)
                    .bind(status.code())
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(Self::customer_from_row).collect()
    }

    async fn customer(&self, recid: i64) -> Result<Option<Customer>, LedgerError> {
        let sql = format!(
            "SELECT {} FROM retail_customers WHERE recid = $1",
            CUSTOMER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(recid)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::customer_from_row).transpose()
    }

    async fn set_status(&self, recid: i64, status: DeliveryStatus) -> Result<(), LedgerError> {
        let result = sqlx::query("UPDATE retail_customers SET status = $1 WHERE recid = $2")
            .bind(status.code())
            .bind(recid)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound(recid));
        }
        log::debug!("Customer {} marked {}", recid, status);
        Ok(())
    }

    async fn counts(&self) -> Result<DeliveryStats, LedgerError> {
        let rows = sqlx::query(
            "SELECT status, COUNT(*) AS customers FROM retail_customers GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut stats = DeliveryStats::default();
        for row in rows {
            let code: i64 = row.try_get("status")?;
            let customers: i64 = row.try_get("customers")?;
            let customers = u64::try_from(customers).unwrap_or(0);
            match DeliveryStatus::from_code(code) {
                Some(DeliveryStatus::NotYet) => stats.remaining += customers,
                Some(DeliveryStatus::Sent) => stats.sent += customers,
                Some(DeliveryStatus::Failed) => stats.failed += customers,
                None => log::warn!("{} customers have unknown status code {}", customers, code),
            }
        }
        Ok(stats)
    }

    async fn requeue(&self, recid: i64) -> Result<bool, LedgerError> {
        let result =
            sqlx::query("UPDATE retail_customers SET status = $1 WHERE recid = $2 AND status = $3")
                .bind(DeliveryStatus::NotYet.code())
                .bind(recid)
                .bind(DeliveryStatus::Failed.code())
                .execute(&self.pool)
                .await?;
        if result.rows_affected() > 0 {
            return Ok(true);
        }
        match self.customer(recid).await? {
            Some(_) => Ok(false),
            None => Err(LedgerError::NotFound(recid)),
        }
    }

    async fn requeue_failed(&self) -> Result<u64, LedgerError> {
        let result = sqlx::query("UPDATE retail_customers SET status = $1 WHERE status = $2")
            .bind(DeliveryStatus::NotYet.code())
            .bind(DeliveryStatus::Failed.code())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert(&self, customer: &Customer) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            INSERT INTO retail_customers
                (recid, short_name, sms_d_1, email_d_1, customer_id, account, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(customer.recid)
        .bind(&customer.short_name)
        .bind(customer.phone.as_deref())
        .bind(customer.email.as_deref())
        .bind(&customer.customer_id)
        .bind(&customer.account)
        .bind(customer.status.code())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert(&self, customer: &Customer) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            INSERT INTO retail_customers
                (recid, short_name, sms_d_1, email_d_1, customer_id, account, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (recid) DO UPDATE SET
                short_name = excluded.short_name,
                sms_d_1 = excluded.sms_d_1,
                email_d_1 = excluded.email_d_1,
                account = excluded.account,
                status = excluded.status
            "#,
        )
        .bind(customer.recid)
        .bind(&customer.short_name)
        .bind(customer.phone.as_deref())
        .bind(customer.email.as_deref())
        .bind(&customer.customer_id)
        .bind(&customer.account)
        .bind(DeliveryStatus::NotYet.code())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_contact(
        &self,
        recid: i64,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<(), LedgerError> {
        let result = sqlx::query(
            r#"
            UPDATE retail_customers
            SET email_d_1 = COALESCE($1, email_d_1), sms_d_1 = COALESCE($2, sms_d_1)
            WHERE recid = $3
            "#,
        )
        .bind(email)
        .bind(phone)
        .bind(recid)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound(recid));
        }
        log::debug!("Customer {} contact details updated", recid);
        Ok(())
    }

    async fn search(&self, term: &str) -> Result<Vec<Customer>, LedgerError> {
        let sql = format!(
            "SELECT {} FROM retail_customers \
             WHERE LOWER(short_name) LIKE $1 OR LOWER(customer_id) LIKE $1 \
             ORDER BY short_name, recid",
            CUSTOMER_COLUMNS
        );
        let pattern = format!("%{}%", term.trim().to_lowercase());
        let rows = sqlx::query(&sql)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::customer_from_row).collect()
    }
}
