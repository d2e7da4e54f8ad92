//! Fixed page furniture: letterhead, account summary grid and page footer.
//! Positions are in points on a US Letter page.

use super::layout::{format_amount, format_date};
use super::{BankIdentity, PageGeometry};
use crate::model::StatementSummary;
use statement_render_lopdf::{PageCanvas, StandardFont};
use statement_types::{Color, Rect};

const LETTERHEAD_RIGHT: f32 = 580.0;
const LOGO: Rect = Rect {
    x: 30.0,
    y: 700.0,
    width: 220.0,
    height: 55.0,
};

const SUMMARY_FONT_SIZE: f32 = 9.0;
const SUMMARY_LINE: f32 = 0.5;
const SUMMARY_LEFT: f32 = 40.0;
const SUMMARY_RIGHT: f32 = 580.0;

pub fn draw_letterhead(canvas: &mut PageCanvas, bank: &BankIdentity, logo: Option<&str>) {
    if let Some(name) = logo {
        canvas.image(name, LOGO);
    }

    let bold = StandardFont::HelveticaBold;
    canvas.text_right(LETTERHEAD_RIGHT, 750.0, bold, 18.0, bank.accent, &bank.name);
    canvas.text_right(
        LETTERHEAD_RIGHT - 180.0,
        630.0,
        bold,
        18.0,
        bank.accent,
        "BANK STATEMENT",
    );

    let contact_y = [735.0, 723.0, 711.0, 700.0, 688.0];
    for (line, y) in bank.contact_lines.iter().zip(contact_y) {
        canvas.text_right(LETTERHEAD_RIGHT, y, StandardFont::Helvetica, 9.0, bank.accent, line);
    }
}

/// Two-column key/value grid with the account on the left and balances on the
/// right, followed by the count and date strip.
pub fn draw_account_summary(
    canvas: &mut PageCanvas,
    bank: &BankIdentity,
    summary: &StatementSummary,
) {
    let color = bank.accent;
    let text = |canvas: &mut PageCanvas, x: f32, y: f32, value: &str| {
        canvas.text(x, y, StandardFont::Helvetica, SUMMARY_FONT_SIZE, color, value);
    };

    let left = [
        ("Account Name:", summary.account_name.clone()),
        ("Account:", summary.account_number.clone()),
        ("Account Type:", summary.account_type.clone()),
        ("Branch:", bank.branch.clone()),
        ("Currency:", summary.currency.clone()),
        ("IBN:", String::new()),
    ];
    let right = [
        ("Opening Balance:", format_amount(summary.opening_balance)),
        ("Total Credits:", format_amount(summary.total_credits)),
        ("Total Debits:", format_amount(summary.total_debits)),
        ("Closing Balance:", format_amount(summary.closing_balance)),
    ];

    let mut y = 600.0;
    for (key, value) in left {
        text(canvas, 50.0, y, key);
        text(canvas, 130.0, y, value.as_str());
        y -= 20.0;
    }
    let mut y = 600.0;
    for (key, value) in right {
        text(canvas, 350.0, y, key);
        text(canvas, 460.0, y, value.as_str());
        y -= 20.0;
    }

    let line = |canvas: &mut PageCanvas, from: (f32, f32), to: (f32, f32)| {
        canvas.line(from, to, SUMMARY_LINE, Color::BLACK);
    };

    // Outer box and column separators.
    line(canvas, (SUMMARY_LEFT, 620.0), (SUMMARY_RIGHT, 620.0));
    line(canvas, (SUMMARY_LEFT, 490.0), (SUMMARY_RIGHT, 490.0));
    line(canvas, (SUMMARY_LEFT, 490.0), (SUMMARY_LEFT, 620.0));
    line(canvas, (SUMMARY_RIGHT, 490.0), (SUMMARY_RIGHT, 620.0));
    for x in [120.0, 340.0, 430.0] {
        line(canvas, (x, 490.0), (x, 620.0));
    }
    for y in [595.0, 575.0, 555.0, 535.0] {
        line(canvas, (SUMMARY_LEFT, y), (SUMMARY_RIGHT, y));
    }
    line(canvas, (SUMMARY_LEFT, 515.0), (340.0, 515.0));

    // Count and date strip.
    line(canvas, (SUMMARY_LEFT, 465.0), (SUMMARY_RIGHT, 465.0));
    line(canvas, (SUMMARY_LEFT, 435.0), (SUMMARY_RIGHT, 435.0));
    for x in [SUMMARY_LEFT, 185.0, 395.0, SUMMARY_RIGHT] {
        line(canvas, (x, 465.0), (x, 435.0));
    }

    let date = |d: Option<chrono::NaiveDate>| d.map(format_date).unwrap_or_default();
    text(canvas, 45.0, 445.0, "Transaction Count :");
    text(canvas, 160.0, 445.0, summary.transaction_count.to_string().as_str());
    text(canvas, 190.0, 445.0, "Starting Date :");
    text(canvas, 280.0, 445.0, date(summary.period_start).as_str());
    text(canvas, 400.0, 445.0, "Ending Date :");
    text(canvas, 490.0, 445.0, date(summary.period_end).as_str());
}

pub fn draw_footer(canvas: &mut PageCanvas, geometry: &PageGeometry, page_number: usize) {
    let x = geometry.size().width - 40.0 - 50.0;
    canvas.text(
        x,
        15.0,
        StandardFont::Helvetica,
        9.0,
        Color::BLACK,
        &format!("Page {}", page_number),
    );
}
