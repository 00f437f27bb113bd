/// Column-name constants for the recovered pivot schema.
/// Single source of truth - exported to Python via PyO3.

// ── Output columns ──────────────────────────────────────────────────────────
pub mod output {
    pub const PRODUCT: &str = "product";
    pub const YEAR_MONTH: &str = "year_month";
    pub const UF: &str = "uf";
    pub const UNIT: &str = "unit";
    pub const VOLUME: &str = "volume";
    pub const CREATED_AT: &str = "created_at";

    pub const ALL: [&str; 6] = [PRODUCT, YEAR_MONTH, UF, UNIT, VOLUME, CREATED_AT];
}

// ── Intermediate columns ────────────────────────────────────────────────────
pub mod intermediate {
    /// Month label carried by each unpivoted row until it is folded into year_month.
    pub const MONTH: &str = "month";
}

// ── Output target naming ────────────────────────────────────────────────────
pub mod target {
    pub const PREFIX: &str = "Pivot";

    pub fn for_index(index: usize) -> String {
        format!("{PREFIX}{index}")
    }
}
