use chrono::NaiveDateTime;
use polars::prelude::DataFrame;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::{PivotCache, WorksheetSnapshot};
use crate::config::SchemaConfig;
use crate::dictionary::extract_dimensions;
use crate::error::RecoverError;
use crate::normalize::{build_schema, build_schema_at};
use crate::records::{materialize_records, CacheTable};
use crate::remap::remap_table;
use crate::schema::target;

/// Output of one pivot rebuild, ready for the persistence layer.
#[derive(Debug, Clone)]
pub struct PivotRun {
    pub run_id: Uuid,
    /// Relation name the frame is written to.
    pub target: String,
    pub frame: DataFrame,
}

/// Human-readable source table of a cache: dictionaries applied, still wide.
pub fn recover_table(cache: &PivotCache) -> Result<CacheTable, RecoverError> {
    let dimensions = extract_dimensions(cache);
    let raw = materialize_records(cache, &dimensions)?;
    Ok(remap_table(&raw, &dimensions))
}

/// Full rebuild of one cache into the load schema.
pub fn rebuild_pivot(cache: &PivotCache, config: &SchemaConfig) -> Result<DataFrame, RecoverError> {
    let table = recover_table(cache)?;
    build_schema(&table, config)
}

/// Same as [`rebuild_pivot`] with a fixed `created_at`.
pub fn rebuild_pivot_at(
    cache: &PivotCache,
    config: &SchemaConfig,
    created_at: NaiveDateTime,
) -> Result<DataFrame, RecoverError> {
    let table = recover_table(cache)?;
    build_schema_at(&table, config, created_at)
}

/// Rebuild the pivot at `index` of a worksheet.
pub fn rebuild_worksheet_pivot(
    sheet: &WorksheetSnapshot,
    index: usize,
    config: &SchemaConfig,
) -> Result<PivotRun, RecoverError> {
    rebuild_worksheet_pivot_at(sheet, index, config, None)
}

/// Rebuild the pivot at `index` of a worksheet, stamping `created_at` when
/// given and the current local time otherwise.
pub fn rebuild_worksheet_pivot_at(
    sheet: &WorksheetSnapshot,
    index: usize,
    config: &SchemaConfig,
    created_at: Option<NaiveDateTime>,
) -> Result<PivotRun, RecoverError> {
    let run_id = Uuid::new_v4();
    let pivot = sheet.pivot(index)?;
    debug!(%run_id, worksheet = %sheet.name, pivot = %pivot.name, index, "rebuilding pivot");

    let frame = match created_at {
        Some(ts) => rebuild_pivot_at(&pivot.cache, config, ts)?,
        None => rebuild_pivot(&pivot.cache, config)?,
    };
    let target = target::for_index(index);
    info!(%run_id, %target, rows = frame.height(), "pivot rebuilt");

    Ok(PivotRun {
        run_id,
        target,
        frame,
    })
}
