use tracing::debug;

use crate::cache::{CellValue, PivotCache};

/// Shared items of one field, keyed by their zero-based position.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionDictionary {
    pub field: String,
    entries: Vec<CellValue>,
}

impl DimensionDictionary {
    pub fn new(field: impl Into<String>, entries: Vec<CellValue>) -> Self {
        Self {
            field: field.into(),
            entries,
        }
    }

    pub fn get(&self, index: u32) -> Option<&CellValue> {
        self.entries.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CellValue] {
        &self.entries
    }
}

/// Column headers plus one dictionary per field, both in cache order.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimensions {
    pub headers: Vec<String>,
    pub dictionaries: Vec<DimensionDictionary>,
}

impl Dimensions {
    pub fn dictionary(&self, field: &str) -> Option<&DimensionDictionary> {
        self.dictionaries.iter().find(|d| d.field == field)
    }
}

/// Build the per-field dictionaries. An absent item list yields an empty
/// dictionary and an absent entry yields `Missing` at its index.
pub fn extract_dimensions(cache: &PivotCache) -> Dimensions {
    let mut headers = Vec::with_capacity(cache.fields.len());
    let mut dictionaries = Vec::with_capacity(cache.fields.len());

    for field in &cache.fields {
        headers.push(field.name.clone());

        let entries: Vec<CellValue> = field
            .shared_items
            .as_deref()
            .unwrap_or_default()
            .iter()
            .cloned()
            .map(CellValue::from)
            .collect();

        debug!(field = %field.name, items = entries.len(), "dimension dictionary");
        dictionaries.push(DimensionDictionary::new(field.name.clone(), entries));
    }

    Dimensions {
        headers,
        dictionaries,
    }
}
