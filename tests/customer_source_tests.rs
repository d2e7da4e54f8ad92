mod common;

use common::fixtures::customer;
use common::{TestResult, init_logging, memory_ledger};
use sqlx::pool::PoolOptions;
use sqlx::{Any, AnyPool};
use statement_mailer::ledger::{StatusLedger, import_customers};
use statement_mailer::model::DeliveryStatus;
use statement_mailer::source::{SourceError, SqlCustomerSource};

async fn core_banking_pool() -> Result<AnyPool, sqlx::Error> {
    sqlx::any::install_default_drivers();
    let pool = PoolOptions::<Any>::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    sqlx::raw_sql(
        r#"
        CREATE TABLE customers (
            recid INTEGER PRIMARY KEY,
            short_name TEXT, sms_d_1 TEXT, email_d_1 TEXT, customer_id TEXT, account TEXT,
            branch TEXT
        );
        INSERT INTO customers VALUES
            (12, 'JOHN ROE', '+250700000012', 'john@example.com', 'C012', '100200312', 'KGL'),
            (11, 'JANE DOE', NULL, 'jane@example.com', 'C011', '100200311', 'KGL'),
            (13, NULL, NULL, NULL, 'C013', '100200313', 'HYE');
        "#,
    )
    .execute(&pool)
    .await?;
    Ok(pool)
}

#[tokio::test]
async fn test_fetch_reads_every_customer_in_recid_order() -> TestResult {
    init_logging();
    let source = SqlCustomerSource::from_pool(core_banking_pool().await?, "customers")?;

    let customers = source.fetch_customers().await?;
    let ids: Vec<i64> = customers.iter().map(|c| c.recid).collect();
    assert_eq!(ids, vec![11, 12, 13]);

    let jane = &customers[0];
    assert_eq!(jane.short_name, "JANE DOE");
    assert_eq!(jane.email.as_deref(), Some("jane@example.com"));
    assert_eq!(jane.phone, None);
    assert_eq!(jane.account, "100200311");
    assert_eq!(jane.status, DeliveryStatus::NotYet);

    let blank = &customers[2];
    assert_eq!(blank.short_name, "");
    assert_eq!(blank.email, None);
    Ok(())
}

#[tokio::test]
async fn test_fetched_customers_are_queued_in_the_ledger() -> TestResult {
    let source = SqlCustomerSource::from_pool(core_banking_pool().await?, "customers")?;
    let ledger = memory_ledger().await;
    let mut sent = customer(12, Some("stale@example.com"));
    sent.customer_id = "C012".into();
    ledger.insert(&sent).await?;
    ledger.set_status(12, DeliveryStatus::Sent).await?;

    let customers = source.fetch_customers().await?;
    assert_eq!(import_customers(&ledger, &customers).await?, 3);

    let john = ledger.customer(12).await?.ok_or("customer 12 missing")?;
    assert_eq!(john.email.as_deref(), Some("john@example.com"));
    assert_eq!(john.status, DeliveryStatus::NotYet);
    assert_eq!(ledger.counts().await?.remaining, 3);
    Ok(())
}

#[tokio::test]
async fn test_table_name_must_be_an_identifier() -> TestResult {
    let pool = core_banking_pool().await?;
    let result = SqlCustomerSource::from_pool(pool, "customers; DROP TABLE customers");
    assert!(matches!(result, Err(SourceError::InvalidTableName(_))));
    Ok(())
}

#[tokio::test]
async fn test_missing_table_is_a_database_error() -> TestResult {
    let source = SqlCustomerSource::from_pool(core_banking_pool().await?, "retail_export")?;
    let result = source.fetch_customers().await;
    assert!(matches!(result, Err(SourceError::Database(_))));
    Ok(())
}
