pub mod cache;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod records;
pub mod remap;
pub mod schema;

#[cfg(feature = "python")]
mod model;

pub use cache::{CacheField, CellValue, PivotCache, PivotTableSnapshot, WorkbookSnapshot, WorksheetSnapshot};
pub use config::{IdentityColumns, MonthTable, SchemaConfig};
pub use dictionary::{extract_dimensions, DimensionDictionary, Dimensions};
pub use error::RecoverError;
pub use normalize::{build_schema, build_schema_at, unpivot_months, NormalizedRecord};
pub use pipeline::{
    rebuild_pivot, rebuild_pivot_at, rebuild_worksheet_pivot, rebuild_worksheet_pivot_at, recover_table,
    PivotRun,
};
pub use records::{materialize_records, CacheTable, TableColumn};
pub use remap::{remap_column, remap_table};

#[cfg(feature = "python")]
mod python {
    use pyo3::prelude::*;
    use pyo3::types::PyModule;
    use tracing_subscriber::EnvFilter;

    use crate::model::PivotWorkbook;
    use crate::schema;

    /// Export schema constants as Python submodules
    fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
        let columns = PyModule::new(m.py(), "columns")?;
        columns.add("PRODUCT", schema::output::PRODUCT)?;
        columns.add("YEAR_MONTH", schema::output::YEAR_MONTH)?;
        columns.add("UF", schema::output::UF)?;
        columns.add("UNIT", schema::output::UNIT)?;
        columns.add("VOLUME", schema::output::VOLUME)?;
        columns.add("CREATED_AT", schema::output::CREATED_AT)?;
        columns.add("ALL", schema::output::ALL.to_vec())?;
        m.add_submodule(&columns)?;
        Ok(())
    }

    #[pymodule]
    fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // A subscriber installed by the host process takes precedence.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .try_init();

        m.add_class::<PivotWorkbook>()?;
        add_schema_exports(m)?;
        Ok(())
    }
}
