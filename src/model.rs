use chrono::NaiveDateTime;
use pyo3::prelude::*;
use pyo3_polars::PyDataFrame;

use crate::cache::WorkbookSnapshot;
use crate::config::SchemaConfig;
use crate::error::RecoverError;
use crate::pipeline::{rebuild_worksheet_pivot_at, recover_table};

#[pyclass]
pub struct PivotWorkbook {
    snapshot: WorkbookSnapshot,
    config: SchemaConfig,
}

#[pymethods]
impl PivotWorkbook {
    /// Open a workbook snapshot (JSON) written by the workbook reader.
    ///
    /// `config_path` points to a JSON schema config; the fuel-sales layout
    /// is used when omitted.
    #[new]
    #[pyo3(signature = (path, config_path=None))]
    fn new(path: &str, config_path: Option<&str>) -> PyResult<Self> {
        let snapshot = WorkbookSnapshot::from_json_file(path)?;
        let config = match config_path {
            Some(p) => SchemaConfig::from_json_file(p)?,
            None => SchemaConfig::default(),
        };
        Ok(Self { snapshot, config })
    }

    /// Build from in-memory JSON strings.
    #[staticmethod]
    #[pyo3(signature = (snapshot_json, config_json=None))]
    fn from_json(snapshot_json: &str, config_json: Option<&str>) -> PyResult<Self> {
        let snapshot = WorkbookSnapshot::from_json_str(snapshot_json)?;
        let config = match config_json {
            Some(c) => SchemaConfig::from_json_str(c)?,
            None => SchemaConfig::default(),
        };
        Ok(Self { snapshot, config })
    }

    fn worksheet_names(&self) -> Vec<String> {
        self.snapshot
            .worksheet_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Pivot table names of a worksheet, in the order `index` refers to.
    fn pivot_names(&self, worksheet: &str) -> PyResult<Vec<String>> {
        let sheet = self.snapshot.worksheet(worksheet)?;
        Ok(sheet.pivot_names().into_iter().map(str::to_string).collect())
    }

    /// Wide, human-readable table behind a pivot (before the reshape).
    fn raw_table(&self, py: Python<'_>, worksheet: &str, index: usize) -> PyResult<PyDataFrame> {
        let sheet = self.snapshot.worksheet(worksheet)?;
        let cache = &sheet.pivot(index)?.cache;
        let df = py.allow_threads(|| recover_table(cache)?.to_dataframe())?;
        Ok(PyDataFrame(df))
    }

    /// Rebuild a pivot into the load schema.
    ///
    /// Returns `(target, frame)`, where `target` is the relation name for
    /// the persistence layer. `created_at` must be a naive datetime; the
    /// current local time is used when omitted.
    #[pyo3(signature = (worksheet, index, created_at=None))]
    fn rebuild(
        &self,
        py: Python<'_>,
        worksheet: &str,
        index: usize,
        created_at: Option<NaiveDateTime>,
    ) -> PyResult<(String, PyDataFrame)> {
        let sheet = self.snapshot.worksheet(worksheet)?;
        let config = &self.config;

        let run = py.allow_threads(|| -> Result<_, RecoverError> {
            rebuild_worksheet_pivot_at(sheet, index, config, created_at)
        })?;
        Ok((run.target, PyDataFrame(run.frame)))
    }
}
