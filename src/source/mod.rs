//! Transaction data for one account and period.
//!
//! A [`RowSource`] returns an untyped [`SourceTable`]; [`SourceTable::into_dataset`]
//! validates it into the typed [`StatementDataset`] the renderer consumes.

mod customers;
mod sql;
mod wrap;

pub use customers::SqlCustomerSource;
pub use sql::SqlRowSource;
pub use wrap::{NARRATION_WIDTH, wrap_narration};

use crate::model::{ReportingPeriod, StatementDataset, StatementSummary, TransactionRow};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, error};
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// Lines the upstream procedure adds around the ledger lines: opening balance,
/// totals and closing balance.
pub const FRAMING_ROWS: usize = 3;

pub const COL_ACCOUNT_NAME: &str = "Account Name";
pub const COL_ACCOUNT_NUMBER: &str = "Account Number";
pub const COL_ACCOUNT_TYPE: &str = "Account Type";
pub const COL_CURRENCY: &str = "Currency";
pub const COL_BOOK_DATE: &str = "Book Date";
pub const COL_REFERENCE: &str = "Reference";
pub const COL_NARRATION: &str = "Narration";
pub const COL_VALUE_DATE: &str = "Value Date";
pub const COL_CREDIT: &str = "Credit";
pub const COL_DEBIT: &str = "Debit";
pub const COL_BALANCE: &str = "Balance";

pub const REQUIRED_COLUMNS: [&str; 11] = [
    COL_ACCOUNT_NAME,
    COL_ACCOUNT_NUMBER,
    COL_ACCOUNT_TYPE,
    COL_CURRENCY,
    COL_BOOK_DATE,
    COL_REFERENCE,
    COL_NARRATION,
    COL_VALUE_DATE,
    COL_CREDIT,
    COL_DEBIT,
    COL_BALANCE,
];

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Required column '{0}' is missing from the result")]
    MissingColumn(&'static str),

    #[error("Row {row}: column '{column}' holds an invalid date '{value}'")]
    BadDate {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("Row {row}: column '{column}' holds an invalid amount '{value}'")]
    BadAmount {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("Column '{0}' has a type that cannot be read")]
    UnsupportedType(String),

    #[error("'{0}' is not a valid table name")]
    InvalidTableName(String),
}

/// One heterogeneous scalar as read from the store.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Integer(i64),
    Real(f64),
}

impl CellValue {
    fn as_text(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Real(f) => f.to_string(),
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Text(s) => parse_date(s.trim()),
            // Banking cores commonly store dates as YYYYMMDD integers.
            CellValue::Integer(i) => NaiveDate::parse_from_str(&i.to_string(), "%Y%m%d").ok(),
            _ => None,
        }
    }

    fn as_amount(&self) -> Option<Decimal> {
        match self {
            CellValue::Text(s) => Decimal::from_str(&s.trim().replace(',', "")).ok(),
            CellValue::Integer(i) => Some(Decimal::from(*i)),
            CellValue::Real(f) => Decimal::try_from(*f).ok(),
            CellValue::Null => None,
        }
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    const FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y%m%d", "%d/%m/%Y"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        // Timestamps: keep the date part.
        .or_else(|| s.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

/// A result set as returned by the store: column names plus rows of cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

static NULL_CELL: CellValue = CellValue::Null;

struct ColumnIndex {
    positions: [usize; REQUIRED_COLUMNS.len()],
}

impl ColumnIndex {
    fn resolve(columns: &[String]) -> Result<Self, SourceError> {
        let mut positions = [0; REQUIRED_COLUMNS.len()];
        for (slot, required) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = columns
                .iter()
                .position(|c| c.trim().eq_ignore_ascii_case(required))
                .ok_or(SourceError::MissingColumn(required))?;
        }
        Ok(Self { positions })
    }

    fn cell<'a>(&self, row: &'a [CellValue], column: &str) -> &'a CellValue {
        REQUIRED_COLUMNS
            .iter()
            .position(|c| *c == column)
            .and_then(|i| row.get(self.positions[i]))
            .unwrap_or(&NULL_CELL)
    }
}

impl SourceTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Validates the table and derives the statement header from it.
    pub fn into_dataset(self, account: &str) -> Result<StatementDataset, SourceError> {
        if self.rows.is_empty() {
            return Ok(StatementDataset::empty(account));
        }
        let index = ColumnIndex::resolve(&self.columns)?;

        let mut rows = Vec::with_capacity(self.rows.len());
        for (n, cells) in self.rows.iter().enumerate() {
            rows.push(Self::transaction(&index, n, cells)?);
        }

        // Both exist: rows is non-empty.
        let first = &self.rows[0];
        let (first_row, last_row) = (&rows[0], &rows[rows.len() - 1]);
        let summary = StatementSummary {
            account_name: index.cell(first, COL_ACCOUNT_NAME).as_text(),
            account_number: index.cell(first, COL_ACCOUNT_NUMBER).as_text(),
            account_type: index.cell(first, COL_ACCOUNT_TYPE).as_text(),
            currency: index.cell(first, COL_CURRENCY).as_text(),
            opening_balance: first_row.balance,
            closing_balance: last_row.balance,
            total_credits: last_row.credit,
            total_debits: last_row.debit,
            transaction_count: rows.len().saturating_sub(FRAMING_ROWS),
            period_start: rows.iter().filter_map(|r| r.book_date).min(),
            period_end: rows.iter().filter_map(|r| r.book_date).max(),
        };

        Ok(StatementDataset { summary, rows })
    }

    fn transaction(
        index: &ColumnIndex,
        row: usize,
        cells: &[CellValue],
    ) -> Result<TransactionRow, SourceError> {
        let date = |column: &'static str| {
            let cell = index.cell(cells, column);
            cell.as_date().ok_or_else(|| SourceError::BadDate {
                row,
                column,
                value: cell.as_text(),
            })
        };
        let optional_date = |column: &'static str| {
            if index.cell(cells, column).is_blank() {
                Ok(None)
            } else {
                date(column).map(Some)
            }
        };
        let amount = |column: &'static str| {
            let cell = index.cell(cells, column);
            if cell.is_blank() {
                return Ok(None);
            }
            cell.as_amount()
                .map(Some)
                .ok_or_else(|| SourceError::BadAmount {
                    row,
                    column,
                    value: cell.as_text(),
                })
        };

        Ok(TransactionRow {
            book_date: optional_date(COL_BOOK_DATE)?,
            reference: index.cell(cells, COL_REFERENCE).as_text(),
            narration: wrap_narration(&index.cell(cells, COL_NARRATION).as_text()),
            value_date: optional_date(COL_VALUE_DATE)?,
            credit: amount(COL_CREDIT)?,
            debit: amount(COL_DEBIT)?,
            balance: amount(COL_BALANCE)?,
        })
    }
}

/// Supplies the statement result set for an account and period.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch_table(
        &self,
        account: &str,
        period: &ReportingPeriod,
    ) -> Result<SourceTable, SourceError>;
}

/// Fetches and validates one statement, propagating every failure.
pub async fn load_statement(
    source: &dyn RowSource,
    account: &str,
    period: &ReportingPeriod,
) -> Result<StatementDataset, SourceError> {
    let table = source.fetch_table(account, period).await?;
    debug!(
        "Fetched {} rows for account {} ({} to {})",
        table.rows.len(),
        account,
        period.start,
        period.end
    );
    table.into_dataset(account)
}

/// Like [`load_statement`], but any failure is logged and reported as an
/// empty dataset, which callers treat as "no document".
pub async fn fetch_or_empty(
    source: &dyn RowSource,
    account: &str,
    period: &ReportingPeriod,
) -> StatementDataset {
    match load_statement(source, account, period).await {
        Ok(dataset) => dataset,
        Err(e) => {
            error!("Could not load statement for account {}: {}", account, e);
            StatementDataset::empty(account)
        }
    }
}
