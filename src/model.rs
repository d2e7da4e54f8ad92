//! Domain types shared by the row source, renderer, ledger and delivery pipeline.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The inclusive date range a statement covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportingPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn start_iso(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_iso(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

/// One ledger line of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRow {
    /// Framing rows (opening, closing) may come without one.
    pub book_date: Option<NaiveDate>,
    pub reference: String,
    /// Already wrapped for display; lines are separated by `\n`.
    pub narration: String,
    pub value_date: Option<NaiveDate>,
    pub credit: Option<Decimal>,
    pub debit: Option<Decimal>,
    pub balance: Option<Decimal>,
}

/// Header block of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatementSummary {
    pub account_name: String,
    pub account_number: String,
    pub account_type: String,
    pub currency: String,
    pub opening_balance: Option<Decimal>,
    pub closing_balance: Option<Decimal>,
    pub total_credits: Option<Decimal>,
    pub total_debits: Option<Decimal>,
    pub transaction_count: usize,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

/// Everything needed to render one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementDataset {
    pub summary: StatementSummary,
    pub rows: Vec<TransactionRow>,
}

impl StatementDataset {
    pub fn empty(account_number: &str) -> Self {
        Self {
            summary: StatementSummary {
                account_number: account_number.to_string(),
                ..StatementSummary::default()
            },
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Delivery state of a customer's statement. The integer codes are the stored
/// representation in the ledger table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryStatus {
    NotYet,
    Sent,
    Failed,
}

impl DeliveryStatus {
    pub fn code(self) -> i64 {
        match self {
            DeliveryStatus::NotYet => 1,
            DeliveryStatus::Sent => 2,
            DeliveryStatus::Failed => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(DeliveryStatus::NotYet),
            2 => Some(DeliveryStatus::Sent),
            3 => Some(DeliveryStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryStatus::NotYet => write!(f, "not-yet"),
            DeliveryStatus::Sent => write!(f, "sent"),
            DeliveryStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not-yet" | "notyet" | "pending" => Ok(DeliveryStatus::NotYet),
            "sent" => Ok(DeliveryStatus::Sent),
            "failed" => Ok(DeliveryStatus::Failed),
            _ => Err(format!("Invalid delivery status: {}", s)),
        }
    }
}

/// A customer row of the status ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub recid: i64,
    pub customer_id: String,
    pub short_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub account: String,
    pub status: DeliveryStatus,
}

impl Customer {
    /// The email address to deliver to, if one is on file.
    pub fn delivery_address(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty())
    }
}

/// Counts of customers per delivery status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryStats {
    pub remaining: u64,
    pub sent: u64,
    pub failed: u64,
}

impl DeliveryStats {
    pub fn total(&self) -> u64 {
        self.remaining + self.sent + self.failed
    }
}
