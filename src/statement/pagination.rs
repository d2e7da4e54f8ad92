use super::{PageGeometry, StatementError, TableLayout};
use std::ops::Range;

/// The slice of the table placed on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// 1-based.
    pub page_number: usize,
    pub rows: Range<usize>,
    pub table_top: f32,
    pub available_height: f32,
    pub measured_height: f32,
}

/// Number of data rows, starting at `start`, that fit in `available` together
/// with the header row.
///
/// Binary search over the candidate row count (header included) for the
/// largest count whose measured height does not exceed `available`. Returns 0
/// when not even one data row fits.
pub fn fit_rows(layout: &TableLayout, start: usize, available: f32) -> usize {
    let remaining = layout.row_count().saturating_sub(start);
    if remaining == 0 {
        return 0;
    }

    let mut low = 2;
    let mut high = remaining + 1;
    let mut best = 1;
    while low <= high {
        let candidate = (low + high) / 2;
        if layout.measure(start..start + candidate - 1) <= available {
            best = candidate;
            low = candidate + 1;
        } else {
            high = candidate - 1;
        }
    }
    best - 1
}

/// Splits every row of `layout` across pages, in order.
pub fn paginate(
    layout: &TableLayout,
    geometry: &PageGeometry,
) -> Result<Vec<PageLayout>, StatementError> {
    let mut pages = Vec::new();
    let mut start = 0;
    while start < layout.row_count() {
        let page_index = pages.len();
        let available = geometry.available_height(page_index);
        let count = fit_rows(layout, start, available);
        if count == 0 {
            return Err(StatementError::InsufficientSpace {
                page: page_index + 1,
                available,
            });
        }

        let rows = start..start + count;
        log::trace!("Page {} takes rows {:?}", page_index + 1, rows);
        pages.push(PageLayout {
            page_number: page_index + 1,
            measured_height: layout.measure(rows.clone()),
            rows,
            table_top: geometry.table_top(page_index),
            available_height: available,
        });
        start += count;
    }
    Ok(pages)
}
