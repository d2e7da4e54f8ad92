//! Paginated PDF rendering of a [`StatementDataset`](crate::model::StatementDataset).
//!
//! Page 1 carries the letterhead, the account summary grid and the start of
//! the transactions table; following pages continue the table. Every page
//! repeats the table header and ends with a `Page N` footer. How many rows go
//! on a page is decided by [`pagination::paginate`], which measures with the
//! same [`TableLayout`] that later draws the rows.

mod chrome;
pub mod layout;
pub mod pagination;
mod renderer;

pub use layout::{ColumnPlan, TableLayout, TableStyle};
pub use pagination::{PageLayout, paginate};
pub use renderer::{StatementRenderer, statement_file_name};

use statement_render_lopdf::RenderError;
use statement_types::{Color, Size};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatementError {
    #[error("No transactions for account {account}; no statement produced")]
    Empty { account: String },

    #[error("Not even one table row fits on page {page} ({available:.1}pt available)")]
    InsufficientSpace { page: usize, available: f32 },

    #[error("PDF rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Page size and the fixed positions of the transactions table.
#[derive(Debug, Clone, PartialEq)]
pub struct PageGeometry {
    pub page_size: Size,
    pub table_x: f32,
    pub table_width: f32,
    /// Top edge of the table on page 1, below the account summary.
    pub first_table_top: f32,
    /// Top edge of the table on every following page.
    pub next_table_top: f32,
    pub bottom_margin: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        let page_size = Size::LETTER;
        Self {
            page_size,
            table_x: 40.0,
            table_width: page_size.width - 60.0,
            first_table_top: 415.0,
            next_table_top: 750.0,
            bottom_margin: 50.0,
        }
    }
}

impl PageGeometry {
    pub fn size(&self) -> Size {
        self.page_size
    }

    pub fn table_top(&self, page_index: usize) -> f32 {
        if page_index == 0 {
            self.first_table_top
        } else {
            self.next_table_top
        }
    }

    pub fn available_height(&self, page_index: usize) -> f32 {
        self.table_top(page_index) - self.bottom_margin
    }
}

/// The issuing bank as printed in the letterhead.
#[derive(Debug, Clone, PartialEq)]
pub struct BankIdentity {
    pub name: String,
    pub contact_lines: Vec<String>,
    pub branch: String,
    pub accent: Color,
}

impl Default for BankIdentity {
    fn default() -> Self {
        Self {
            name: "BANK OF KIGALI".into(),
            contact_lines: vec![
                "www.bk.rw".into(),
                "bk@bk.rw".into(),
                "(+350) 252 593 100".into(),
                "@Bank of Kigali".into(),
                "+250 788 319 112".into(),
            ],
            branch: "HQ".into(),
            accent: Color::rgb(11, 83, 157),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    pub geometry: PageGeometry,
    pub style: TableStyle,
    pub bank: BankIdentity,
    /// Drawn at the top left of page 1. A missing or unreadable file is
    /// logged and skipped.
    pub logo_path: Option<PathBuf>,
    pub compress: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::default(),
            style: TableStyle::default(),
            bank: BankIdentity::default(),
            logo_path: None,
            compress: true,
        }
    }
}

impl RendererConfig {
    pub fn with_logo(mut self, logo_path: Option<PathBuf>) -> Self {
        self.logo_path = logo_path;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_geometry() {
        let geometry = PageGeometry::default();
        assert_eq!(geometry.table_width, 552.0);
        assert_eq!(geometry.available_height(0), 365.0);
        assert_eq!(geometry.available_height(1), 700.0);
        assert_eq!(geometry.available_height(7), 700.0);
    }
}
