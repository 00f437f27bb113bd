use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RecoverError;

pub const PT_BR_MONTH_LABELS: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

pub const EN_MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Month-column labels in calendar order. Position 0 is January.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct MonthTable {
    labels: [String; 12],
}

impl MonthTable {
    pub fn new(labels: [&str; 12]) -> Self {
        Self {
            labels: labels.map(str::to_string),
        }
    }

    pub fn pt_br() -> Self {
        Self::new(PT_BR_MONTH_LABELS)
    }

    pub fn en() -> Self {
        Self::new(EN_MONTH_LABELS)
    }

    /// Calendar month (1..=12) for a label.
    pub fn number(&self, label: &str) -> Option<u32> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| i as u32 + 1)
    }

    /// Two-digit `MM` form of a label, e.g. `"Fev"` -> `"02"`.
    pub fn two_digit(&self, label: &str) -> Option<String> {
        self.number(label).map(|m| format!("{m:02}"))
    }

    pub fn labels(&self) -> &[String; 12] {
        &self.labels
    }
}

impl Default for MonthTable {
    fn default() -> Self {
        Self::pt_br()
    }
}

impl TryFrom<Vec<String>> for MonthTable {
    type Error = RecoverError;

    fn try_from(labels: Vec<String>) -> Result<Self, Self::Error> {
        let count = labels.len();
        let labels: [String; 12] = labels.try_into().map_err(|_| {
            RecoverError::InvalidConfig(format!("month table needs 12 labels, got {count}"))
        })?;
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(RecoverError::InvalidConfig(format!(
                    "duplicate month label '{label}'"
                )));
            }
        }
        Ok(Self { labels })
    }
}

impl From<MonthTable> for Vec<String> {
    fn from(table: MonthTable) -> Self {
        table.labels.into()
    }
}

/// Source column names of the fixed (non-month) pivot fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityColumns {
    pub product: String,
    pub region: String,
    pub year: String,
    pub state: String,
    pub unit: String,
    pub total: String,
}

impl IdentityColumns {
    /// Identity columns in source order.
    pub fn all(&self) -> [&str; 6] {
        [
            self.product.as_str(),
            self.region.as_str(),
            self.year.as_str(),
            self.state.as_str(),
            self.unit.as_str(),
            self.total.as_str(),
        ]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.all().contains(&name)
    }
}

impl Default for IdentityColumns {
    fn default() -> Self {
        Self {
            product: "COMBUSTÍVEL".to_string(),
            region: "REGIÃO".to_string(),
            year: "ANO".to_string(),
            state: "ESTADO".to_string(),
            unit: "UNIDADE".to_string(),
            total: "TOTAL".to_string(),
        }
    }
}

/// Layout of a pivot cache's source table. Keys absent from a config file
/// fall back to the fuel-sales defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub identity: IdentityColumns,
    pub months: MonthTable,
}

impl SchemaConfig {
    pub fn from_json_str(json: &str) -> Result<Self, RecoverError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RecoverError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}
