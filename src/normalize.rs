//! Wide-to-long reshape of a remapped pivot table into the load schema.
//!
//! Every non-identity column is a month of volumes. Each one becomes a row
//! per source row, so the output height is `rows * month_columns`. Rows are
//! emitted month-major: all rows of the first month column, then the next.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use polars::datatypes::TimeUnit;
use polars::prelude::*;
use tracing::{debug, warn};

use crate::cache::CellValue;
use crate::config::SchemaConfig;
use crate::error::RecoverError;
use crate::records::{to_polars_column, CacheTable, TableColumn};
use crate::schema::{intermediate, output};

/// Days from 0001-01-01 (CE) to 1970-01-01.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

const YEAR_MONTH_FORMAT: &str = "%Y%m%d";

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub product: Option<String>,
    pub year_month: NaiveDate,
    pub uf: Option<String>,
    pub unit: Option<String>,
    pub volume: Option<f64>,
    pub created_at: NaiveDateTime,
}

impl NormalizedRecord {
    /// Read the rows back out of a normalized frame.
    pub fn from_frame(df: &DataFrame) -> Result<Vec<Self>, RecoverError> {
        let product = df.column(output::PRODUCT)?.str()?;
        let days = df.column(output::YEAR_MONTH)?.cast(&DataType::Int32)?;
        let days = days.i32()?;
        let uf = df.column(output::UF)?.str()?;
        let unit = df.column(output::UNIT)?.str()?;
        let volume = df.column(output::VOLUME)?.f64()?;
        let created = df.column(output::CREATED_AT)?.cast(&DataType::Int64)?;
        let created = created.i64()?;

        (0..df.height())
            .map(|i| {
                let year_month = days
                    .get(i)
                    .and_then(|d| NaiveDate::from_num_days_from_ce_opt(d + EPOCH_DAYS_FROM_CE))
                    .ok_or_else(|| RecoverError::InvalidData(format!("row {i}: no year_month")))?;
                let created_at = created
                    .get(i)
                    .and_then(DateTime::from_timestamp_micros)
                    .map(|dt| dt.naive_utc())
                    .ok_or_else(|| RecoverError::InvalidData(format!("row {i}: no created_at")))?;
                Ok(Self {
                    product: product.get(i).map(str::to_string),
                    year_month,
                    uf: uf.get(i).map(str::to_string),
                    unit: unit.get(i).map(str::to_string),
                    volume: volume.get(i),
                    created_at,
                })
            })
            .collect()
    }
}

/// Coerce a year cell to an integer. Fractional numbers are truncated.
///
/// Only four-digit years are accepted, so the `YYYYMM` key is always six
/// characters. An unresolved shared-item index is not a year.
pub fn coerce_year(value: &CellValue) -> Option<i64> {
    let year = match value {
        CellValue::Number(n) if n.is_finite() => n.trunc() as i64,
        CellValue::Text(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    (1000..=9999).contains(&year).then_some(year)
}

/// Month columns of the table paired with their `MM` form, in table order.
pub fn month_columns<'a>(
    table: &'a CacheTable,
    config: &SchemaConfig,
) -> Result<Vec<(&'a TableColumn, String)>, RecoverError> {
    table
        .columns
        .iter()
        .filter(|c| !config.identity.contains(&c.name))
        .map(|c| {
            config
                .months
                .two_digit(&c.name)
                .map(|mm| (c, mm))
                .ok_or_else(|| RecoverError::UnknownMonthLabel(c.name.clone()))
        })
        .collect()
}

fn text_column(column: &TableColumn) -> Column {
    let values: Vec<Option<String>> = column.values.iter().map(CellValue::to_text).collect();
    Column::new(column.name.as_str().into(), values)
}

/// Typed wide frame: identity columns as text (year as Int64, region and
/// total as inferred) and one Float64 column per month.
fn wide_frame(
    table: &CacheTable,
    config: &SchemaConfig,
    months: &[(&TableColumn, String)],
) -> Result<DataFrame, RecoverError> {
    let identity = &config.identity;
    let year = table.column(&identity.year)?;
    let years = year
        .values
        .iter()
        .enumerate()
        .map(|(row, v)| {
            coerce_year(v).ok_or_else(|| RecoverError::MalformedYear {
                row,
                value: v.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut columns = vec![
        text_column(table.column(&identity.product)?),
        to_polars_column(table.column(&identity.region)?),
        Column::new(identity.year.as_str().into(), years),
        text_column(table.column(&identity.state)?),
        text_column(table.column(&identity.unit)?),
        to_polars_column(table.column(&identity.total)?),
    ];

    let mut bad_volumes = 0usize;
    for (column, _) in months {
        let volumes: Vec<Option<f64>> = column
            .values
            .iter()
            .map(|cell| {
                let volume = cell.as_f64();
                if volume.is_none() && !cell.is_missing() {
                    bad_volumes += 1;
                }
                volume
            })
            .collect();
        columns.push(Column::new(column.name.as_str().into(), volumes));
    }
    if bad_volumes > 0 {
        warn!(bad_volumes, "non-numeric volumes loaded as null");
    }

    Ok(DataFrame::new(columns)?)
}

/// Unpivot the month columns and rename the identity columns to the load
/// schema. The plan carries the `MM` month in `month` and the year in
/// `year_month`; region and total are still present.
///
/// `None` when the table has no month columns.
pub fn unpivot_months(
    table: &CacheTable,
    config: &SchemaConfig,
) -> Result<Option<LazyFrame>, RecoverError> {
    let identity = &config.identity;
    for name in identity.all() {
        table.column(name)?;
    }
    let months = month_columns(table, config)?;
    let wide = wide_frame(table, config, &months)?;
    debug!(rows = wide.height(), month_columns = months.len(), "unpivoting month columns");

    if months.is_empty() {
        return Ok(None);
    }

    let frames: Vec<LazyFrame> = months
        .iter()
        .map(|(column, mm)| {
            let mut select: Vec<Expr> = identity.all().iter().map(|c| col(*c)).collect();
            select.push(lit(mm.as_str()).alias(intermediate::MONTH));
            select.push(col(column.name.as_str()).alias(output::VOLUME));
            wide.clone().lazy().select(select)
        })
        .collect();

    let long = concat(frames, UnionArgs::default())?.rename(
        [
            identity.product.as_str(),
            identity.year.as_str(),
            identity.state.as_str(),
            identity.unit.as_str(),
        ],
        [output::PRODUCT, output::YEAR_MONTH, output::UF, output::UNIT],
        true,
    );
    Ok(Some(long))
}

fn empty_output() -> Result<DataFrame, RecoverError> {
    let df = DataFrame::new(vec![
        Column::new(output::PRODUCT.into(), Vec::<Option<String>>::new()),
        Column::new(output::YEAR_MONTH.into(), Vec::<i32>::new()).cast(&DataType::Date)?,
        Column::new(output::UF.into(), Vec::<Option<String>>::new()),
        Column::new(output::UNIT.into(), Vec::<Option<String>>::new()),
        Column::new(output::VOLUME.into(), Vec::<Option<f64>>::new()),
        Column::new(output::CREATED_AT.into(), Vec::<i64>::new())
            .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?,
    ])?;
    Ok(df)
}

/// Join year and month into a `YYYYMM` key, parse it as the first of the
/// month, stamp the batch and keep exactly the output columns.
fn finish(
    long: LazyFrame,
    rows: usize,
    created_at: NaiveDateTime,
) -> Result<DataFrame, RecoverError> {
    let year_month = concat_str(
        [
            col(output::YEAR_MONTH).cast(DataType::String),
            col(intermediate::MONTH),
            lit("01"),
        ],
        "",
        false,
    )
    .str()
    .to_date(StrptimeOptions {
        format: Some(YEAR_MONTH_FORMAT.into()),
        strict: false,
        exact: true,
        ..Default::default()
    });

    let df = long
        .with_columns([
            year_month.alias(output::YEAR_MONTH),
            lit(created_at.and_utc().timestamp_micros())
                .cast(DataType::Datetime(TimeUnit::Microseconds, None))
                .alias(output::CREATED_AT),
        ])
        .select(output::ALL.iter().map(|c| col(*c)).collect::<Vec<_>>())
        .collect()?;

    // keys strptime could not read
    let year_month = df.column(output::YEAR_MONTH)?;
    let unparsed = year_month.null_count();
    if unparsed > 0 {
        let nulls = year_month.is_null();
        let position = nulls.into_iter().position(|v| v == Some(true)).unwrap_or_default();
        return Err(RecoverError::MalformedYear {
            row: position % rows.max(1),
            value: format!("{unparsed} unparseable year_month keys"),
        });
    }

    debug!(output_rows = df.height(), "normalized frame");
    Ok(df)
}

/// Normalize with a caller-supplied batch timestamp.
pub fn build_schema_at(
    table: &CacheTable,
    config: &SchemaConfig,
    created_at: NaiveDateTime,
) -> Result<DataFrame, RecoverError> {
    match unpivot_months(table, config)? {
        Some(long) => finish(long, table.height(), created_at),
        None => empty_output(),
    }
}

/// Normalize, stamping every row with one timestamp taken per batch.
pub fn build_schema(table: &CacheTable, config: &SchemaConfig) -> Result<DataFrame, RecoverError> {
    match unpivot_months(table, config)? {
        Some(long) => finish(long, table.height(), Local::now().naive_local()),
        None => empty_output(),
    }
}
