use tracing::{debug, warn};

use crate::cache::CellValue;
use crate::dictionary::{DimensionDictionary, Dimensions};
use crate::records::{CacheTable, TableColumn};

/// Resolve shared-item references in one column against its own dictionary.
///
/// Anything that is not an `Index`, or an index the dictionary does not
/// hold, is returned unchanged.
pub fn remap_column(values: &[CellValue], dictionary: &DimensionDictionary) -> Vec<CellValue> {
    values
        .iter()
        .map(|value| match value {
            CellValue::Index(i) => dictionary.get(*i).unwrap_or(value).clone(),
            other => other.clone(),
        })
        .collect()
}

/// Remap every column with the dictionary at the same field position.
pub fn remap_table(table: &CacheTable, dimensions: &Dimensions) -> CacheTable {
    let columns = table
        .columns
        .iter()
        .enumerate()
        .map(|(pos, column)| {
            let dictionary = dimensions
                .dictionaries
                .get(pos)
                .filter(|d| d.field == column.name);

            let values = match dictionary {
                Some(dict) => {
                    let misses = column
                        .values
                        .iter()
                        .filter(|v| matches!(v, CellValue::Index(i) if dict.get(*i).is_none()))
                        .count();
                    if misses > 0 && !dict.is_empty() {
                        warn!(
                            column = %column.name,
                            misses,
                            "indices outside the shared items passed through"
                        );
                    }
                    remap_column(&column.values, dict)
                }
                None => column.values.clone(),
            };

            TableColumn {
                name: column.name.clone(),
                values,
            }
        })
        .collect();

    debug!(columns = table.width(), rows = table.height(), "remapped table");
    CacheTable { columns }
}
