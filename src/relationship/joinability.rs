//! Joinability classifier (§4.6.1): decides whether a column is a plausible
//! join key, independent of whether any relationship is ever discovered
//! through it.

use crate::models::{DataTypeFamily, SchemaColumn};
use crate::schema_discoverer::ColumnStats;

/// `(is_joinable, reason)`, evaluated in the order given in §4.6.1.
pub fn classify_joinability(
    column: &SchemaColumn,
    family: DataTypeFamily,
    stats: Option<&ColumnStats>,
    row_count: Option<i64>,
) -> (bool, &'static str) {
    if column.is_pk {
        return (true, "pk");
    }
    if family.is_type_excluded_for_joining() {
        return (false, "type_excluded");
    }
    let Some(stats) = stats else {
        return (false, "no_stats");
    };
    if stats.distinct_count == stats.non_null_count && stats.non_null_count > 0 {
        return (true, "unique_values");
    }
    let Some(rows) = row_count.filter(|r| *r > 0) else {
        return (false, "no_stats");
    };
    if (stats.distinct_count as f64 / rows as f64) < 0.01 {
        // A column named like a foreign key (`_id`/`_uuid`/`_key`) can
        // legitimately reference a small target table and sit below the 1%
        // ratio without being a low-cardinality status/flag column — the
        // same exemption `discover_pk_match`'s candidate-source filter
        // already grants FK-like names over the stricter 5% ratio check.
        if !column.has_fk_like_name() {
            return (false, "low_cardinality");
        }
    }
    (true, "cardinality_ok")
}
