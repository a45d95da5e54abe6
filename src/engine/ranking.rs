//! Top-N selection with whole-table shares

use rust_decimal::Decimal;
use serde::Serialize;

use super::aggregate::share_pct;
use super::Row;

/// A selected row with its ranking value and its share of the whole table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<R> {
    pub row: R,
    pub value: Decimal,
    /// Percentage points of the total over *all* input rows
    pub pct: Decimal,
}

/// Select the `n` rows with the largest `measure`.
///
/// Ties keep input order. Shares are computed against the sum over every
/// input row, not over the selection. The result is ordered ascending by
/// value so the largest position comes last (top bar of a horizontal chart).
/// Rows with a missing value are never selected.
pub fn top_n<R: Row + Clone>(rows: &[R], measure: R::Measure, n: usize) -> Vec<Ranked<R>> {
    let mut candidates: Vec<(&R, Decimal)> = rows
        .iter()
        .filter_map(|r| r.value(measure).map(|v| (r, v)))
        .collect();
    let whole: Decimal = candidates.iter().map(|(_, v)| *v).sum();

    // stable: equal values stay in input order
    candidates.sort_by(|a, b| b.1.cmp(&a.1));
    candidates.truncate(n);
    candidates.sort_by(|a, b| a.1.cmp(&b.1));

    candidates
        .into_iter()
        .map(|(row, value)| Ranked {
            row: row.clone(),
            value,
            pct: share_pct(value, whole),
        })
        .collect()
}
