//! Grouped sums, shares of total, weighted rates and time slicing

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::{Metric, Row, Timed};
use crate::models::TimePoint;

/// One row of a grouped sum
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    /// Labels of the group-by columns, in the order they were requested
    pub key: Vec<String>,
    pub value: Decimal,
    /// Number of source rows in the group (including rows with a missing value)
    pub rows: usize,
}

/// A grouped sum with its share of the grand total, in percentage points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupShare {
    pub key: Vec<String>,
    pub value: Decimal,
    pub pct: Decimal,
}

/// A row with its share of the total of its own time point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionPoint<R> {
    pub row: R,
    pub total: Decimal,
    pub pct: Decimal,
}

/// `value / total` in percentage points; zero when the total is zero
pub fn share_pct(value: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        Decimal::ZERO
    } else {
        (value / total) * Decimal::ONE_HUNDRED
    }
}

/// Sum of `measure` over all rows, missing values counting as zero
pub fn column_total<R: Row>(rows: &[R], measure: R::Measure) -> Decimal {
    rows.iter().filter_map(|r| r.value(measure)).sum()
}

/// Sum `measure` per distinct combination of `by`, ordered by key.
///
/// Rows with a missing value add nothing but still make their group appear.
pub fn grouped_sum<R: Row>(rows: &[R], by: &[R::Column], measure: R::Measure) -> Vec<GroupTotal> {
    let mut groups: BTreeMap<Vec<String>, (Decimal, usize)> = BTreeMap::new();
    for row in rows {
        let key: Vec<String> = by.iter().map(|c| row.label(*c).to_string()).collect();
        let entry = groups.entry(key).or_insert((Decimal::ZERO, 0));
        entry.0 += row.value(measure).unwrap_or(Decimal::ZERO);
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(key, (value, rows))| GroupTotal { key, value, rows })
        .collect()
}

/// Each group's share of the sum of all groups
pub fn percentage_of_total(groups: &[GroupTotal]) -> Vec<GroupShare> {
    let total: Decimal = groups.iter().map(|g| g.value).sum();
    groups
        .iter()
        .map(|g| GroupShare {
            key: g.key.clone(),
            value: g.value,
            pct: share_pct(g.value, total),
        })
        .collect()
}

/// Investment-weighted average `Σ(rate·weight) / Σweight`.
///
/// Only pairs with a defined rate and a positive weight take part. With no
/// such pair the metric is undefined (and resolves to zero).
pub fn weighted_rate<I>(pairs: I) -> Metric
where
    I: IntoIterator<Item = (Option<Decimal>, Decimal)>,
{
    let mut weighted_sum = Decimal::ZERO;
    let mut weight_sum = Decimal::ZERO;
    for (rate, weight) in pairs {
        let Some(rate) = rate else { continue };
        if weight <= Decimal::ZERO {
            continue;
        }
        weighted_sum += rate * weight;
        weight_sum += weight;
    }
    Metric::ratio(weighted_sum, weight_sum)
}

/// [`weighted_rate`] over two measures of the same table
pub fn weighted_rate_of<R: Row>(rows: &[R], rate: R::Measure, weight: R::Measure) -> Metric {
    weighted_rate(
        rows.iter()
            .map(|r| (r.value(rate), r.value(weight).unwrap_or(Decimal::ZERO))),
    )
}

/// Latest time point present in `rows`
pub fn latest_time<T: Timed>(rows: &[T]) -> Option<TimePoint> {
    rows.iter().map(Timed::time).max()
}

/// Rows sitting on the latest time point of `rows` itself.
///
/// Pass the already filtered table: the maximum is taken from what is given.
pub fn latest_slice<T: Timed + Clone>(rows: &[T]) -> Vec<T> {
    match latest_time(rows) {
        Some(latest) => rows.iter().filter(|r| r.time() == latest).cloned().collect(),
        None => Vec::new(),
    }
}

/// For every time point independently, each row's share of that point's total
pub fn composition_over_time<R>(rows: &[R], measure: R::Measure) -> Vec<CompositionPoint<R>>
where
    R: Row + Timed + Clone,
{
    let mut totals: HashMap<TimePoint, Decimal> = HashMap::new();
    for row in rows {
        *totals.entry(row.time()).or_insert(Decimal::ZERO) +=
            row.value(measure).unwrap_or(Decimal::ZERO);
    }

    rows.iter()
        .map(|row| {
            let total = totals.get(&row.time()).copied().unwrap_or(Decimal::ZERO);
            let value = row.value(measure).unwrap_or(Decimal::ZERO);
            CompositionPoint {
                row: row.clone(),
                total,
                pct: share_pct(value, total),
            }
        })
        .collect()
}
