//! Reshape-and-aggregation engine
//!
//! Every operation here is a pure function from immutable input rows to a
//! new output table. Nothing is mutated in place and nothing is cached; the
//! views in `reports` recompute from the loaded tables on every request.

pub mod aggregate;
pub mod filter;
pub mod hierarchy;
pub mod ranking;
pub mod reshape;

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::hash::Hash;

use crate::models::{TimePoint, MISSING_LABEL};

pub use aggregate::{
    column_total, composition_over_time, grouped_sum, latest_slice, latest_time,
    percentage_of_total, share_pct, weighted_rate, weighted_rate_of, CompositionPoint,
    GroupShare, GroupTotal,
};
pub use filter::{distinct_values, FilterSpec, Filtered};
pub use hierarchy::{build_hierarchy, HierarchyNode, TreemapEntry};
pub use ranking::{top_n, Ranked};
pub use reshape::{reshape, Cell, ColumnHeader, WideAllocationRecord, WideAllocationTable};

/// A table row addressable through typed columns.
pub trait Row {
    /// Textual dimension columns (filter, group and path keys)
    type Column: Copy + Eq + Ord + Hash + fmt::Debug + fmt::Display;
    /// Numeric columns
    type Measure: Copy + fmt::Debug + fmt::Display;

    fn text(&self, column: Self::Column) -> Option<&str>;

    fn value(&self, measure: Self::Measure) -> Option<Decimal>;

    /// Dimension value with missing cells mapped to [`MISSING_LABEL`]
    fn label(&self, column: Self::Column) -> &str {
        self.text(column).unwrap_or(MISSING_LABEL)
    }
}

/// A row positioned on the time axis.
pub trait Timed {
    fn time(&self) -> TimePoint;
}

/// Why a filtered table came out empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmptyReason {
    /// One or more multi-select dimensions had nothing selected
    EmptySelection { columns: Vec<String> },
    /// The selection was non-empty but no row satisfied every predicate
    NoMatchingRows,
    /// The source table itself has no rows
    NoSourceRows,
}

/// Non-fatal "no data" signal for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmptyResultWarning {
    pub reason: EmptyReason,
}

impl EmptyResultWarning {
    pub fn new(reason: EmptyReason) -> Self {
        Self { reason }
    }
}

impl fmt::Display for EmptyResultWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            EmptyReason::EmptySelection { columns } => write!(
                f,
                "no data: nothing selected for {}; select at least one item in each filter",
                columns.join(", ")
            ),
            EmptyReason::NoMatchingRows => write!(f, "no data matches the selected filters"),
            EmptyReason::NoSourceRows => write!(f, "the source table has no rows"),
        }
    }
}

/// Outcome of a view render: either chart-ready data or an explicit empty state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum View<T> {
    Ready(T),
    Empty(EmptyResultWarning),
}

impl<T> View<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, View::Empty(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            View::Ready(data) => Some(data),
            View::Empty(_) => None,
        }
    }

    pub fn warning(&self) -> Option<&EmptyResultWarning> {
        match self {
            View::Ready(_) => None,
            View::Empty(warning) => Some(warning),
        }
    }
}

/// A derived metric that may have had no qualifying input.
///
/// `value()` resolves an undefined metric to zero; callers that want to show
/// "no input" differently from a computed zero check `is_defined()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Metric {
    Computed(Decimal),
    Undefined,
}

impl Metric {
    pub fn value(&self) -> Decimal {
        match self {
            Metric::Computed(v) => *v,
            Metric::Undefined => Decimal::ZERO,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Metric::Computed(_))
    }

    /// Transform a computed value; an undefined metric stays undefined
    pub fn map(self, f: impl FnOnce(Decimal) -> Decimal) -> Metric {
        match self {
            Metric::Computed(v) => Metric::Computed(f(v)),
            Metric::Undefined => Metric::Undefined,
        }
    }

    /// `numerator / denominator`, undefined when the denominator is not positive
    pub fn ratio(numerator: Decimal, denominator: Decimal) -> Metric {
        if denominator > Decimal::ZERO {
            Metric::Computed(numerator / denominator)
        } else {
            Metric::Undefined
        }
    }
}
