mod common;

use common::fixtures::{date, january_2024};
use common::{TestResult, init_logging};
use rust_decimal::Decimal;
use sqlx::pool::PoolOptions;
use sqlx::{Any, AnyPool};
use statement_mailer::source::{RowSource, SourceError, SqlRowSource, load_statement};

const STATEMENT_QUERY: &str = r#"
    SELECT account_name AS "Account Name",
           account_number AS "Account Number",
           account_type AS "Account Type",
           currency AS "Currency",
           book_date AS "Book Date",
           reference AS "Reference",
           narration AS "Narration",
           value_date AS "Value Date",
           credit AS "Credit",
           debit AS "Debit",
           balance AS "Balance"
    FROM statement_lines
    WHERE account_number = $1 AND book_date BETWEEN $2 AND $3
    ORDER BY line_no
"#;

async fn seeded_pool() -> Result<AnyPool, sqlx::Error> {
    sqlx::any::install_default_drivers();
    let pool = PoolOptions::<Any>::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    sqlx::raw_sql(
        r#"
        CREATE TABLE statement_lines (
            line_no INTEGER PRIMARY KEY,
            account_name TEXT, account_number TEXT, account_type TEXT, currency TEXT,
            book_date TEXT, reference TEXT, narration TEXT, value_date TEXT,
            credit TEXT, debit TEXT, balance TEXT
        );
        INSERT INTO statement_lines VALUES
            (1, 'JANE DOE', '100200300', 'Savings', 'RWF', '2024-01-01', '', 'Opening Balance', '', NULL, NULL, '1,000.00'),
            (2, 'JANE DOE', '100200300', 'Savings', 'RWF', '2024-01-05', 'FT2400001', 'Salary January 2024 from employer payroll account with a very long description', '2024-01-05', '2,500.00', NULL, '3,500.00'),
            (3, 'JANE DOE', '100200300', 'Savings', 'RWF', '2024-01-09', 'FT2400002', 'ATM withdrawal', '2024-01-09', NULL, '200.00', '3,300.00'),
            (4, 'JANE DOE', '100200300', 'Savings', 'RWF', '2024-01-31', '', 'Totals', '', '2,500.00', '200.00', NULL),
            (5, 'JANE DOE', '100200300', 'Savings', 'RWF', '2024-01-31', '', 'Closing Balance', '', '2,500.00', '200.00', '3,300.00'),
            (6, 'JOHN ROE', '999', 'Current', 'USD', '2024-01-02', 'X', 'Other account', '2024-01-02', '1.00', NULL, '1.00'),
            (7, 'JANE DOE', '100200300', 'Savings', 'RWF', '2024-02-03', 'FT2400003', 'Next month', '2024-02-03', '5.00', NULL, '3,305.00');
        "#,
    )
    .execute(&pool)
    .await?;
    Ok(pool)
}

#[tokio::test]
async fn test_query_binds_account_and_period() -> TestResult {
    init_logging();
    let source = SqlRowSource::from_pool(seeded_pool().await?, STATEMENT_QUERY);

    let table = source.fetch_table("100200300", &january_2024()).await?;
    assert_eq!(table.rows.len(), 5);
    assert_eq!(table.columns[0], "Account Name");
    Ok(())
}

#[tokio::test]
async fn test_statement_header_derived_from_rows() -> TestResult {
    let source = SqlRowSource::from_pool(seeded_pool().await?, STATEMENT_QUERY);

    let dataset = load_statement(&source, "100200300", &january_2024()).await?;
    let summary = &dataset.summary;
    assert_eq!(summary.account_name, "JANE DOE");
    assert_eq!(summary.account_number, "100200300");
    assert_eq!(summary.currency, "RWF");
    assert_eq!(summary.opening_balance, Some(Decimal::new(100_000, 2)));
    assert_eq!(summary.closing_balance, Some(Decimal::new(330_000, 2)));
    assert_eq!(summary.total_credits, Some(Decimal::new(250_000, 2)));
    assert_eq!(summary.total_debits, Some(Decimal::new(20_000, 2)));
    assert_eq!(summary.transaction_count, 2);
    assert_eq!(summary.period_start, Some(date(2024, 1, 1)));
    assert_eq!(summary.period_end, Some(date(2024, 1, 31)));

    let salary = &dataset.rows[1];
    assert_eq!(salary.credit, Some(Decimal::new(250_000, 2)));
    assert!(salary.narration.contains('\n'), "long narration not wrapped");
    assert!(salary.narration.lines().all(|line| line.chars().count() <= 57));
    assert_eq!(dataset.rows[0].value_date, None);
    Ok(())
}

#[tokio::test]
async fn test_unknown_account_yields_empty_dataset() -> TestResult {
    let source = SqlRowSource::from_pool(seeded_pool().await?, STATEMENT_QUERY);

    let dataset = load_statement(&source, "000", &january_2024()).await?;
    assert!(dataset.is_empty());
    assert_eq!(dataset.summary.account_number, "000");
    Ok(())
}

#[tokio::test]
async fn test_missing_column_is_reported() -> TestResult {
    let query = r#"SELECT account_name AS "Account Name" FROM statement_lines
                   WHERE account_number = $1 AND book_date BETWEEN $2 AND $3"#;
    let source = SqlRowSource::from_pool(seeded_pool().await?, query);

    let result = load_statement(&source, "100200300", &january_2024()).await;
    assert!(matches!(result, Err(SourceError::MissingColumn(_))));
    Ok(())
}

#[tokio::test]
async fn test_first_result_set_with_rows_wins() -> TestResult {
    let query = format!(
        r#"SELECT account_name AS "Account Name" FROM statement_lines
           WHERE account_number = $1 AND book_date BETWEEN $2 AND $3 AND 1 = 0;
           {}"#,
        STATEMENT_QUERY
    );
    let source = SqlRowSource::from_pool(seeded_pool().await?, query);

    let table = source.fetch_table("100200300", &january_2024()).await?;
    assert_eq!(table.rows.len(), 5);
    assert_eq!(table.columns.len(), 11);

    let dataset = load_statement(&source, "100200300", &january_2024()).await?;
    assert_eq!(dataset.summary.transaction_count, 2);
    Ok(())
}
