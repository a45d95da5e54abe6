// Reports module - the four dashboard views over the loaded tables

pub mod evolution;
pub mod performance;
pub mod positions;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::engine::Timed;
use crate::models::TimePoint;

pub use evolution::{
    build_evolution, evolution_dimensions, evolution_report, EvolutionReport, EvolutionSelection,
};
pub use performance::{annual_report, monthly_report, AnnualReport, MonthlyReport};
pub use positions::{position_dimensions, positions_report, PositionSelection, PositionsReport};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: TimePoint,
    pub value: Decimal,
}

/// A named line of a time-series chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub points: Vec<SeriesPoint>,
}

impl Series {
    /// One point per row with a value, in row order.
    /// Rows where `value` is `None` leave a gap in the line.
    pub fn from_rows<T, F>(name: &str, rows: &[T], value: F) -> Self
    where
        T: Timed,
        F: Fn(&T) -> Option<Decimal>,
    {
        Self {
            name: name.to_string(),
            points: rows
                .iter()
                .filter_map(|r| {
                    value(r).map(|value| SeriesPoint {
                        date: r.time(),
                        value,
                    })
                })
                .collect(),
        }
    }

    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    /// Value of the point at `date`, if the series has one
    pub fn value_at(&self, date: TimePoint) -> Option<Decimal> {
        self.points
            .iter()
            .find(|p| p.date == date)
            .map(|p| p.value)
    }
}

/// The values a filter can choose from, in order of appearance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dimension {
    pub column: String,
    pub values: Vec<String>,
    /// Values selected when the user gives no choice
    pub default: Vec<String>,
}

/// Fraction to percentage points
pub(crate) fn to_points(fraction: Decimal) -> Decimal {
    fraction * Decimal::ONE_HUNDRED
}
