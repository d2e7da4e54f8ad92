//! Measurement and drawing of the transactions table.

use crate::model::TransactionRow;
use rust_decimal::Decimal;
use statement_render_lopdf::{PageCanvas, StandardFont};
use statement_types::{Color, Rect};
use std::ops::Range;

pub const COLUMN_COUNT: usize = 7;

pub const TABLE_HEADERS: [&str; COLUMN_COUNT] = [
    "Book Date",
    "Reference",
    "Narration",
    "Value Date",
    "Credit",
    "Debit",
    "Balance",
];

/// Relative column widths, in units of `table_width / 7`.
const COLUMN_WEIGHTS: [f32; COLUMN_COUNT] = [0.5, 1.1, 2.5, 0.5, 0.75, 0.75, 0.75];

#[derive(Debug, Clone, PartialEq)]
pub struct TableStyle {
    pub font_size: f32,
    pub leading: f32,
    pub padding_left: f32,
    pub padding_right: f32,
    pub padding_top: f32,
    pub padding_bottom: f32,
    pub grid_width: f32,
    pub grid_color: Color,
    pub header_background: Color,
    pub header_text: Color,
    pub body_text: Color,
    /// Background of even global data rows (0, 2, 4, ...).
    pub stripe_even: Color,
    pub stripe_odd: Color,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            font_size: 6.0,
            leading: 7.2,
            padding_left: 5.0,
            padding_right: 5.0,
            padding_top: 3.0,
            padding_bottom: 12.0,
            grid_width: 0.5,
            grid_color: Color::WHITE,
            header_background: Color::rgb(11, 83, 157),
            header_text: Color::WHITE,
            body_text: Color::BLACK,
            stripe_even: Color::gray(0xF0),
            stripe_odd: Color::gray(0xE0),
        }
    }
}

impl TableStyle {
    pub fn row_height(&self, lines: usize) -> f32 {
        self.padding_top + lines.max(1) as f32 * self.leading + self.padding_bottom
    }

    pub fn stripe(&self, global_row: usize) -> Color {
        if global_row % 2 == 0 {
            self.stripe_even
        } else {
            self.stripe_odd
        }
    }
}

/// Column widths for a given table width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnPlan {
    pub widths: [f32; COLUMN_COUNT],
}

impl ColumnPlan {
    pub fn for_width(table_width: f32) -> Self {
        let unit = table_width / COLUMN_COUNT as f32;
        Self {
            widths: COLUMN_WEIGHTS.map(|weight| weight * unit),
        }
    }

    pub fn total_width(&self) -> f32 {
        self.widths.iter().sum()
    }

    /// Left edge of every column, relative to the table's left edge.
    pub fn offsets(&self) -> [f32; COLUMN_COUNT] {
        let mut offsets = [0.0; COLUMN_COUNT];
        let mut x = 0.0;
        for (offset, width) in offsets.iter_mut().zip(self.widths) {
            *offset = x;
            x += width;
        }
        offsets
    }
}

pub fn format_date(date: chrono::NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_amount(amount: Option<Decimal>) -> String {
    amount.map(|a| format!("{:.2}", a)).unwrap_or_default()
}

struct LaidOutRow {
    cells: [Vec<String>; COLUMN_COUNT],
    height: f32,
}

/// Cell text and row heights for every data row, computed once. Measuring any
/// run of rows is then a prefix-sum lookup, and drawing uses the same heights.
pub struct TableLayout {
    style: TableStyle,
    columns: ColumnPlan,
    header_height: f32,
    rows: Vec<LaidOutRow>,
    /// `offsets[i]` is the summed height of data rows `0..i`.
    offsets: Vec<f32>,
}

impl TableLayout {
    pub fn new(style: TableStyle, columns: ColumnPlan, rows: &[TransactionRow]) -> Self {
        let header_height = style.row_height(1);
        let rows: Vec<LaidOutRow> = rows
            .iter()
            .map(|row| {
                let cells = [
                    row.book_date.map(format_date).unwrap_or_default(),
                    row.reference.clone(),
                    row.narration.clone(),
                    row.value_date.map(format_date).unwrap_or_default(),
                    format_amount(row.credit),
                    format_amount(row.debit),
                    format_amount(row.balance),
                ]
                .map(|text| text.lines().map(str::to_string).collect::<Vec<_>>());
                let lines = cells.iter().map(Vec::len).max().unwrap_or(1);
                LaidOutRow {
                    cells,
                    height: style.row_height(lines),
                }
            })
            .collect();

        let mut offsets = Vec::with_capacity(rows.len() + 1);
        let mut total = 0.0;
        offsets.push(total);
        for row in &rows {
            total += row.height;
            offsets.push(total);
        }

        Self {
            style,
            columns,
            header_height,
            rows,
            offsets,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> &ColumnPlan {
        &self.columns
    }

    pub fn header_height(&self) -> f32 {
        self.header_height
    }

    pub fn row_height(&self, row: usize) -> f32 {
        self.rows.get(row).map_or(0.0, |r| r.height)
    }

    /// Height of the header plus data rows `range`.
    pub fn measure(&self, range: Range<usize>) -> f32 {
        let end = range.end.min(self.rows.len());
        let start = range.start.min(end);
        self.header_height + self.offsets[end] - self.offsets[start]
    }

    /// Draws the header row and data rows `range` with the table's top-left
    /// corner at `(x, top)`. Stripes follow the global row index, so parity
    /// carries over from the previous page.
    pub fn draw(&self, canvas: &mut PageCanvas, x: f32, top: f32, range: Range<usize>) {
        let style = &self.style;
        let width = self.columns.total_width();
        let offsets = self.columns.offsets();

        let header_cells: [Vec<String>; COLUMN_COUNT] = TABLE_HEADERS.map(|h| vec![h.to_string()]);
        let header_rect = Rect::from_top(x, top, width, self.header_height);
        canvas.fill_rect(header_rect, style.header_background);
        self.draw_cells(
            canvas,
            x,
            &offsets,
            header_rect,
            &header_cells,
            StandardFont::HelveticaBold,
            style.header_text,
        );

        let mut boundaries = vec![top, header_rect.y];
        let mut y = header_rect.y;
        for index in range {
            let Some(row) = self.rows.get(index) else {
                break;
            };
            let rect = Rect::from_top(x, y, width, row.height);
            canvas.fill_rect(rect, style.stripe(index));
            self.draw_cells(
                canvas,
                x,
                &offsets,
                rect,
                &row.cells,
                StandardFont::Helvetica,
                style.body_text,
            );
            y = rect.y;
            boundaries.push(y);
        }

        self.draw_grid(canvas, x, &offsets, &boundaries);
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_cells(
        &self,
        canvas: &mut PageCanvas,
        x: f32,
        offsets: &[f32; COLUMN_COUNT],
        rect: Rect,
        cells: &[Vec<String>; COLUMN_COUNT],
        font: StandardFont,
        color: Color,
    ) {
        let style = &self.style;
        for ((lines, offset), width) in cells.iter().zip(offsets).zip(self.columns.widths) {
            let inner = width - style.padding_left - style.padding_right;
            let center = x + offset + style.padding_left + inner / 2.0;
            // Bottom-aligned: the last line sits on the bottom padding.
            let last = lines.len().saturating_sub(1);
            for (i, line) in lines.iter().enumerate() {
                let baseline =
                    rect.y + style.padding_bottom + (last - i) as f32 * style.leading;
                canvas.text_centered(center, baseline, font, style.font_size, color, line);
            }
        }
    }

    fn draw_grid(
        &self,
        canvas: &mut PageCanvas,
        x: f32,
        offsets: &[f32; COLUMN_COUNT],
        boundaries: &[f32],
    ) {
        let style = &self.style;
        let (Some(&top), Some(&bottom)) = (boundaries.first(), boundaries.last()) else {
            return;
        };
        let right = x + self.columns.total_width();
        for &y in boundaries {
            canvas.line((x, y), (right, y), style.grid_width, style.grid_color);
        }
        for offset in offsets.iter().skip(1) {
            canvas.line((x + offset, top), (x + offset, bottom), style.grid_width, style.grid_color);
        }
        canvas.stroke_rect(
            Rect::new(x, bottom, right - x, top - bottom),
            style.grid_width,
            style.grid_color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(narration: &str) -> TransactionRow {
        TransactionRow {
            book_date: NaiveDate::from_ymd_opt(2024, 1, 2),
            reference: "FT24002".into(),
            narration: narration.into(),
            value_date: None,
            credit: Some(Decimal::new(1050, 1)),
            debit: None,
            balance: Some(Decimal::new(2000, 0)),
        }
    }

    #[test]
    fn column_plan_uses_weights() {
        let plan = ColumnPlan::for_width(552.0);
        let unit = 552.0 / 7.0;
        assert!((plan.widths[0] - 0.5 * unit).abs() < 1e-3);
        assert!((plan.widths[2] - 2.5 * unit).abs() < 1e-3);
        assert!((plan.total_width() - 6.85 * unit).abs() < 1e-2);
        assert_eq!(plan.offsets()[0], 0.0);
        assert!((plan.offsets()[1] - plan.widths[0]).abs() < 1e-4);
    }

    #[test]
    fn row_height_grows_with_wrapped_lines() {
        let style = TableStyle::default();
        let layout = TableLayout::new(
            style.clone(),
            ColumnPlan::for_width(552.0),
            &[row("one line"), row("first\nsecond\nthird")],
        );
        assert!((layout.row_height(0) - 22.2).abs() < 1e-4);
        assert!((layout.row_height(1) - (15.0 + 3.0 * 7.2)).abs() < 1e-4);
        assert!((layout.header_height() - style.row_height(1)).abs() < 1e-4);
    }

    #[test]
    fn measure_includes_header() {
        let rows: Vec<_> = (0..5).map(|_| row("x")).collect();
        let layout = TableLayout::new(TableStyle::default(), ColumnPlan::for_width(552.0), &rows);
        assert!((layout.measure(0..0) - 22.2).abs() < 1e-4);
        assert!((layout.measure(1..4) - 4.0 * 22.2).abs() < 1e-3);
        // Out-of-range ends are clamped.
        assert!((layout.measure(3..99) - 3.0 * 22.2).abs() < 1e-3);
    }

    #[test]
    fn stripes_alternate_on_global_index() {
        let style = TableStyle::default();
        assert_eq!(style.stripe(0), Color::gray(0xF0));
        assert_eq!(style.stripe(1), Color::gray(0xE0));
        assert_eq!(style.stripe(10), style.stripe(0));
    }

    #[test]
    fn amounts_use_two_decimals() {
        assert_eq!(format_amount(Some(Decimal::new(1050, 1))), "105.00");
        assert_eq!(format_amount(None), "");
    }
}
