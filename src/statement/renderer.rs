use super::chrome::{draw_account_summary, draw_footer, draw_letterhead};
use super::{ColumnPlan, PageLayout, RendererConfig, StatementError, TableLayout, paginate};
use crate::model::{ReportingPeriod, StatementDataset};
use log::{debug, info, warn};
use statement_render_lopdf::{LoadedImage, PageCanvas, PdfDocumentBuilder};
use std::path::{Path, PathBuf};

/// `Bank_Statement_{account}_{start}_to_{end}.pdf`. Characters of the account
/// other than letters, digits, `-`, `_` and `.` become `_`, so the name never
/// leaves its directory.
pub fn statement_file_name(account: &str, period: &ReportingPeriod) -> String {
    let account: String = account
        .chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() => c,
            '-' | '_' | '.' => c,
            _ => '_',
        })
        .collect();
    format!(
        "Bank_Statement_{}_{}_to_{}.pdf",
        account,
        period.start_iso(),
        period.end_iso()
    )
}

/// Renders statements with a fixed configuration. The logo is decoded once.
pub struct StatementRenderer {
    config: RendererConfig,
    logo: Option<LoadedImage>,
}

impl StatementRenderer {
    pub fn new(config: RendererConfig) -> Self {
        let logo = config
            .logo_path
            .as_deref()
            .and_then(|path| match LoadedImage::from_path(path) {
                Ok(image) => Some(image),
                Err(e) => {
                    warn!("Skipping logo {}: {}", path.display(), e);
                    None
                }
            });
        Self { config, logo }
    }

    pub fn table_layout(&self, dataset: &StatementDataset) -> TableLayout {
        TableLayout::new(
            self.config.style.clone(),
            ColumnPlan::for_width(self.config.geometry.table_width),
            &dataset.rows,
        )
    }

    /// Decides which rows go on which page without drawing anything.
    pub fn plan(&self, dataset: &StatementDataset) -> Result<Vec<PageLayout>, StatementError> {
        if dataset.is_empty() {
            return Err(StatementError::Empty {
                account: dataset.summary.account_number.clone(),
            });
        }
        paginate(&self.table_layout(dataset), &self.config.geometry)
    }

    /// Renders the statement to PDF bytes. The same dataset always yields the
    /// same bytes.
    pub fn render(&self, dataset: &StatementDataset) -> Result<Vec<u8>, StatementError> {
        let pages = self.plan(dataset)?;
        let table = self.table_layout(dataset);
        let geometry = &self.config.geometry;

        let title = format!("Bank Statement {}", dataset.summary.account_number);
        let mut builder = PdfDocumentBuilder::new(&title).with_compression(self.config.compress);
        let logo = match &self.logo {
            Some(image) => Some(builder.add_image(image)?),
            None => None,
        };

        for page in &pages {
            let mut canvas = PageCanvas::new();
            if page.page_number == 1 {
                draw_letterhead(&mut canvas, &self.config.bank, logo.as_deref());
                draw_account_summary(&mut canvas, &self.config.bank, &dataset.summary);
            }
            table.draw(
                &mut canvas,
                geometry.table_x,
                page.table_top,
                page.rows.clone(),
            );
            draw_footer(&mut canvas, geometry, page.page_number);
            builder.add_page(geometry.size(), canvas)?;
        }

        debug!(
            "Rendered {} rows on {} pages for account {}",
            dataset.rows.len(),
            pages.len(),
            dataset.summary.account_number
        );
        Ok(builder.finish()?)
    }

    /// Renders into `dir` under [`statement_file_name`]. Nothing is written when
    /// rendering fails.
    pub fn write_statement(
        &self,
        dataset: &StatementDataset,
        account: &str,
        period: &ReportingPeriod,
        dir: &Path,
    ) -> Result<PathBuf, StatementError> {
        let bytes = self.render(dataset)?;
        std::fs::create_dir_all(dir)?;
        let path = dir.join(statement_file_name(account, period));
        std::fs::write(&path, &bytes)?;
        info!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn file_name_uses_iso_dates() {
        let period = ReportingPeriod::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 11, 20).unwrap(),
        );
        assert_eq!(
            statement_file_name("100200300", &period),
            "Bank_Statement_100200300_2024-01-01_to_2024-11-20.pdf"
        );
    }

    #[test]
    fn file_name_replaces_path_characters() {
        let period = ReportingPeriod::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );
        assert_eq!(
            statement_file_name("../etc/10 02", &period),
            "Bank_Statement_.._etc_10_02_2024-01-01_to_2024-01-31.pdf"
        );
        assert_eq!(
            statement_file_name("C:\\acct", &period),
            "Bank_Statement_C__acct_2024-01-01_to_2024-01-31.pdf"
        );
    }

    #[test]
    fn empty_dataset_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = StatementRenderer::new(RendererConfig::default());
        let period = ReportingPeriod::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );
        let result = renderer.write_statement(
            &StatementDataset::empty("42"),
            "42",
            &period,
            dir.path(),
        );
        assert!(matches!(result, Err(StatementError::Empty { .. })));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_logo_is_skipped() {
        let config = RendererConfig::default().with_logo(Some("does/not/exist.png".into()));
        let renderer = StatementRenderer::new(config);
        assert!(renderer.logo.is_none());
    }
}
