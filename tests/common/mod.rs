#![allow(dead_code)]

pub mod fakes;
pub mod fixtures;

use lopdf::Document as LopdfDocument;
use lopdf::Object;
use statement_mailer::ledger::SqlStatusLedger;
use std::time::Duration;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Wrapper around a rendered statement with helper methods
pub struct GeneratedPdf {
    pub bytes: Vec<u8>,
    pub doc: LopdfDocument,
}

impl GeneratedPdf {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, Box<dyn std::error::Error>> {
        let doc = LopdfDocument::load_mem(&bytes)?;
        Ok(Self { bytes, doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Every string shown with `Tj` on a page (1-based), in drawing order.
    pub fn page_strings(&self, page: u32) -> Vec<String> {
        let Some(page_id) = self.doc.get_pages().get(&page).copied() else {
            return Vec::new();
        };
        let Ok(content) = self.doc.get_and_decode_page_content(page_id) else {
            return Vec::new();
        };
        content
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
                _ => None,
            })
            .collect()
    }

    pub fn page_contains(&self, page: u32, text: &str) -> bool {
        self.page_strings(page).iter().any(|s| s == text)
    }
}

/// A migrated ledger in a private in-memory sqlite database.
pub async fn memory_ledger() -> SqlStatusLedger {
    let ledger = SqlStatusLedger::connect("sqlite::memory:", Duration::from_secs(5))
        .await
        .expect("in-memory sqlite ledger");
    ledger.run_migrations().await.expect("ledger migrations");
    ledger
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
