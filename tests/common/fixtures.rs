use chrono::NaiveDate;
use rust_decimal::Decimal;
use statement_mailer::model::{
    Customer, DeliveryStatus, ReportingPeriod, StatementDataset, TransactionRow,
};
use statement_mailer::source::{CellValue, REQUIRED_COLUMNS, SourceTable};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn january_2024() -> ReportingPeriod {
    ReportingPeriod::new(date(2024, 1, 1), date(2024, 1, 31))
}

pub fn transaction(n: usize, narration: &str) -> TransactionRow {
    TransactionRow {
        book_date: Some(date(2024, 1, 1 + (n % 28) as u32)),
        reference: format!("FT24{:05}", n),
        narration: narration.to_string(),
        value_date: Some(date(2024, 1, 1 + (n % 28) as u32)),
        credit: (n % 2 == 0).then(|| Decimal::new(10_000 + n as i64, 2)),
        debit: (n % 2 == 1).then(|| Decimal::new(5_000 + n as i64, 2)),
        balance: Some(Decimal::new(1_000_000 + n as i64 * 100, 2)),
    }
}

/// A dataset of `rows` single-line transactions for `account`.
pub fn dataset(account: &str, rows: usize) -> StatementDataset {
    let mut dataset = StatementDataset::empty(account);
    dataset.summary.account_name = "JANE DOE".into();
    dataset.summary.account_type = "Savings".into();
    dataset.summary.currency = "RWF".into();
    dataset.summary.transaction_count = rows.saturating_sub(3);
    dataset.summary.period_start = Some(date(2024, 1, 1));
    dataset.summary.period_end = Some(date(2024, 1, 31));
    dataset.rows = (0..rows).map(|n| transaction(n, "Mobile transfer")).collect();
    dataset
}

fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

/// A raw result set as the statement procedure returns it: an opening line,
/// `lines` ledger lines, a totals line and a closing line.
pub fn statement_table(account: &str, lines: usize) -> SourceTable {
    let row = |book: &str, narration: &str, credit: CellValue, balance: CellValue| {
        vec![
            text("JANE DOE"),
            text(account),
            text("Savings"),
            text("RWF"),
            text(book),
            text("REF"),
            text(narration),
            text(book),
            credit,
            CellValue::Null,
            balance,
        ]
    };

    let mut rows = vec![row("2024-01-01", "Opening Balance", CellValue::Null, text("1000.00"))];
    for n in 0..lines {
        let day = format!("2024-01-{:02}", 2 + n % 27);
        let balance = 1000 + 10 * (n as i64 + 1);
        rows.push(row(
            &day,
            "Deposit",
            CellValue::Integer(10),
            text(&format!("{}.00", balance)),
        ));
    }
    let closing = text(&format!("{}.00", 1000 + 10 * lines as i64));
    rows.push(row(
        "2024-01-31",
        "Totals",
        text(&format!("{}.00", 10 * lines)),
        CellValue::Null,
    ));
    rows.push(row(
        "2024-01-31",
        "Closing Balance",
        text(&format!("{}.00", 10 * lines)),
        closing,
    ));

    SourceTable {
        columns: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    }
}

pub fn customer(recid: i64, email: Option<&str>) -> Customer {
    Customer {
        recid,
        customer_id: format!("CUST{}", recid),
        short_name: format!("Customer {}", recid),
        email: email.map(str::to_string),
        phone: Some("+250788000000".into()),
        account: format!("1000{}", recid),
        status: DeliveryStatus::NotYet,
    }
}
