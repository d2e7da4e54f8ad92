use super::{CellValue, RowSource, SourceError, SourceTable};
use crate::model::ReportingPeriod;
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::any::AnyRow;
use sqlx::pool::PoolOptions;
use sqlx::{Any, AnyPool, Column, Either, Row};
use std::time::Duration;

/// Runs the configured statement query against any sqlx-supported database.
///
/// The query receives `$1` = account, `$2` = start date and `$3` = end date,
/// dates as ISO `YYYY-MM-DD` text. Procedures that emit several result sets
/// are handled by taking the first one that has rows.
pub struct SqlRowSource {
    pool: AnyPool,
    query: String,
}

impl SqlRowSource {
    pub async fn connect(
        url: &str,
        query: impl Into<String>,
        acquire_timeout: Duration,
    ) -> Result<Self, SourceError> {
        sqlx::any::install_default_drivers();
        let pool = PoolOptions::<Any>::new()
            .max_connections(1)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await?;
        Ok(Self::from_pool(pool, query))
    }

    pub fn from_pool(pool: AnyPool, query: impl Into<String>) -> Self {
        Self {
            pool,
            query: query.into(),
        }
    }

    fn read_row(row: &AnyRow) -> Result<Vec<CellValue>, SourceError> {
        (0..row.columns().len())
            .map(|i| {
                if let Ok(value) = row.try_get::<Option<String>, _>(i) {
                    return Ok(value.map_or(CellValue::Null, CellValue::Text));
                }
                if let Ok(value) = row.try_get::<Option<i64>, _>(i) {
                    return Ok(value.map_or(CellValue::Null, CellValue::Integer));
                }
                if let Ok(value) = row.try_get::<Option<f64>, _>(i) {
                    return Ok(value.map_or(CellValue::Null, CellValue::Real));
                }
                Err(SourceError::UnsupportedType(row.column(i).name().to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl RowSource for SqlRowSource {
    async fn fetch_table(
        &self,
        account: &str,
        period: &ReportingPeriod,
    ) -> Result<SourceTable, SourceError> {
        #[allow(deprecated)]
        let mut results = sqlx::query(&self.query)
            .bind(account)
            .bind(period.start_iso())
            .bind(period.end_iso())
            .fetch_many(&self.pool);

        // Rows of a result set arrive before its completion marker.
        let mut rows: Vec<AnyRow> = Vec::new();
        while let Some(item) = results.try_next().await? {
            match item {
                Either::Left(_) if !rows.is_empty() => break,
                Either::Left(_) => {}
                Either::Right(row) => rows.push(row),
            }
        }

        let Some(first) = rows.first() else {
            return Ok(SourceTable::default());
        };
        let columns = first
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        let rows = rows.iter().map(Self::read_row).collect::<Result<_, _>>()?;
        Ok(SourceTable { columns, rows })
    }
}
