//! Pivot-cache snapshot handed over by the workbook reader.
//!
//! Values are tagged with the OOXML cache element letters, so a record cell
//! reads `{"x": 3}` for a shared-item reference and `{"n": 10.5}` for an
//! inline number. An empty cell is `"m"`.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::RecoverError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// Zero-based reference into the field's shared items.
    #[serde(rename = "x")]
    Index(u32),
    #[serde(rename = "n")]
    Number(f64),
    #[serde(rename = "s")]
    Text(String),
    #[serde(rename = "b")]
    Bool(bool),
    #[serde(rename = "d")]
    DateTime(NaiveDateTime),
    #[serde(rename = "e")]
    Error(String),
    #[serde(rename = "m")]
    Missing,
}

impl CellValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Numeric view of the cell. Unresolved indices count as numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Index(i) => Some(f64::from(*i)),
            CellValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Text view of the cell, `None` when missing.
    pub fn to_text(&self) -> Option<String> {
        match self {
            CellValue::Missing => None,
            CellValue::Text(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl From<Option<CellValue>> for CellValue {
    fn from(value: Option<CellValue>) -> Self {
        value.unwrap_or(CellValue::Missing)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Index(i) => write!(f, "{i}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Error(e) => f.write_str(e),
            CellValue::Missing => f.write_str("null"),
        }
    }
}

/// One pivot field as declared in the cache definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheField {
    pub name: String,
    /// Deduplicated values. `None` when the field carries no shared items;
    /// a `None` entry stands for a structurally empty item.
    #[serde(default)]
    pub shared_items: Option<Vec<Option<CellValue>>>,
}

impl CacheField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shared_items: None,
        }
    }

    pub fn with_items(name: impl Into<String>, items: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            shared_items: Some(items.into_iter().map(Some).collect()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PivotCache {
    pub fields: Vec<CacheField>,
    /// Cached source rows in cache order. Trailing empty cells may be omitted.
    #[serde(default)]
    pub records: Vec<Vec<CellValue>>,
}

impl PivotCache {
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotTableSnapshot {
    pub name: String,
    pub cache: PivotCache,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorksheetSnapshot {
    pub name: String,
    #[serde(default)]
    pub pivots: Vec<PivotTableSnapshot>,
}

impl WorksheetSnapshot {
    /// Pivot table names in sheet order.
    pub fn pivot_names(&self) -> Vec<&str> {
        self.pivots.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn pivot(&self, index: usize) -> Result<&PivotTableSnapshot, RecoverError> {
        self.pivots.get(index).ok_or(RecoverError::PivotNotFound {
            index,
            count: self.pivots.len(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkbookSnapshot {
    pub worksheets: Vec<WorksheetSnapshot>,
}

impl WorkbookSnapshot {
    pub fn from_json_str(json: &str) -> Result<Self, RecoverError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RecoverError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn worksheet_names(&self) -> Vec<&str> {
        self.worksheets.iter().map(|w| w.name.as_str()).collect()
    }

    pub fn worksheet(&self, name: &str) -> Result<&WorksheetSnapshot, RecoverError> {
        self.worksheets
            .iter()
            .find(|w| w.name == name)
            .ok_or_else(|| RecoverError::WorksheetNotFound(name.to_string()))
    }
}
