use polars::prelude::*;
use tracing::debug;

use crate::cache::{CellValue, PivotCache};
use crate::dictionary::Dimensions;
use crate::error::RecoverError;

#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    pub name: String,
    pub values: Vec<CellValue>,
}

/// Column-oriented view of the cache records, before or after remapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheTable {
    pub columns: Vec<TableColumn>,
}

impl CacheTable {
    pub fn height(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Result<&TableColumn, RecoverError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| RecoverError::MissingColumn(name.to_string()))
    }

    pub fn row(&self, index: usize) -> Option<Vec<&CellValue>> {
        self.columns.iter().map(|c| c.values.get(index)).collect()
    }

    /// Export as a DataFrame for inspection.
    ///
    /// A column whose non-missing cells are all numeric becomes Float64, all
    /// boolean becomes Boolean; anything else is rendered as String.
    pub fn to_dataframe(&self) -> Result<DataFrame, RecoverError> {
        let columns: Vec<Column> = self.columns.iter().map(to_polars_column).collect();
        Ok(DataFrame::new(columns)?)
    }
}

pub(crate) fn to_polars_column(column: &TableColumn) -> Column {
    let present = || column.values.iter().filter(|v| !v.is_missing());
    let name = column.name.as_str();

    if present().all(|v| matches!(v, CellValue::Number(_) | CellValue::Index(_))) {
        let values: Vec<Option<f64>> = column.values.iter().map(CellValue::as_f64).collect();
        Column::new(name.into(), values)
    } else if present().all(|v| matches!(v, CellValue::Bool(_))) {
        let values: Vec<Option<bool>> = column
            .values
            .iter()
            .map(|v| match v {
                CellValue::Bool(b) => Some(*b),
                _ => None,
            })
            .collect();
        Column::new(name.into(), values)
    } else {
        let values: Vec<Option<String>> = column.values.iter().map(CellValue::to_text).collect();
        Column::new(name.into(), values)
    }
}

/// Lay the cache records out under the field headers, keeping every cell
/// verbatim. Short records are padded with `Missing`.
pub fn materialize_records(
    cache: &PivotCache,
    dimensions: &Dimensions,
) -> Result<CacheTable, RecoverError> {
    let fields = dimensions.headers.len();
    let mut columns: Vec<TableColumn> = dimensions
        .headers
        .iter()
        .map(|name| TableColumn {
            name: name.clone(),
            values: Vec::with_capacity(cache.records.len()),
        })
        .collect();

    let mut padded = 0usize;
    for (row, record) in cache.records.iter().enumerate() {
        if record.len() > fields {
            return Err(RecoverError::RecordWidth {
                row,
                width: record.len(),
                fields,
            });
        }
        if record.len() < fields {
            padded += 1;
        }
        for (i, column) in columns.iter_mut().enumerate() {
            column
                .values
                .push(record.get(i).cloned().unwrap_or(CellValue::Missing));
        }
    }

    debug!(
        rows = cache.records.len(),
        columns = fields,
        padded,
        "materialized cache records"
    );
    Ok(CacheTable { columns })
}
