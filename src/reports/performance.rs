//! Monthly and annual performance against the Ibovespa and Selic benchmarks
//!
//! Returns in the source sheets are fractions (`0.1234`); every series built
//! here is in percentage points so it can be charted as is. Summary fields
//! keep the raw fraction and leave the scaling to the formatter. A return
//! that is blank in the sheet stays `None` and drops out of its series.

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::{to_points, Series};
use crate::engine::{EmptyReason, EmptyResultWarning, Metric, View};
use crate::models::{AnnualSnapshot, MonthlySnapshot, TimePoint};

pub const PORTFOLIO_SERIES: &str = "Carteira";
pub const IBOVESPA_SERIES: &str = "Ibovespa";
pub const SELIC_SERIES: &str = "Selic";
pub const CONTRIBUTIONS_SERIES: &str = "Aportes Acumulados";
pub const INVESTED_SERIES: &str = "Capital Investido";
pub const MARKET_SERIES: &str = "Patrimônio Atual";

/// Figures of the latest month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    pub date: TimePoint,
    pub market_value: Decimal,
    pub invested: Decimal,
    /// Cumulative time-weighted return (fraction)
    pub twr_acc: Option<Decimal>,
    /// Market value minus invested capital
    pub profit: Decimal,
    /// Profit over invested capital (fraction); undefined with no capital
    pub profit_rate: Metric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReport {
    pub summary: MonthlySummary,
    /// Portfolio, Ibovespa and Selic cumulative returns
    pub benchmarks: Vec<Series>,
    /// Contributions, invested capital and market value
    pub patrimony: Vec<Series>,
}

/// Figures of the latest year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualSummary {
    pub date: TimePoint,
    pub market_value: Decimal,
    pub twr_acc: Option<Decimal>,
    pub twr_ano: Option<Decimal>,
    pub lucro: Option<Decimal>,
}

/// Period-only returns of one year, in percentage points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearComparison {
    pub year: i32,
    pub portfolio: Option<Decimal>,
    pub ibovespa: Option<Decimal>,
    pub selic: Option<Decimal>,
}

impl YearComparison {
    /// Portfolio return minus the better of the benchmarks known for the year
    pub fn excess_over_best(&self) -> Option<Decimal> {
        let best = match (self.ibovespa, self.selic) {
            (Some(ibov), Some(selic)) => ibov.max(selic),
            (Some(one), None) | (None, Some(one)) => one,
            (None, None) => return None,
        };
        self.portfolio.map(|p| p - best)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualReport {
    pub summary: AnnualSummary,
    pub cumulative: Vec<Series>,
    pub patrimony: Vec<Series>,
    pub yearly: Vec<YearComparison>,
}

fn no_rows<T>() -> View<T> {
    View::Empty(EmptyResultWarning::new(EmptyReason::NoSourceRows))
}

/// Monthly page: rows must be sorted ascending by date
pub fn monthly_report(rows: &[MonthlySnapshot]) -> View<MonthlyReport> {
    let Some(last) = rows.last() else {
        return no_rows();
    };
    debug!("Monthly report over {} rows, latest {}", rows.len(), last.date);

    let profit = last.vlr_mercado - last.vlr_investido;
    let summary = MonthlySummary {
        date: last.date,
        market_value: last.vlr_mercado,
        invested: last.vlr_investido,
        twr_acc: last.twr_acc,
        profit,
        profit_rate: Metric::ratio(profit, last.vlr_investido),
    };

    let benchmarks = vec![
        Series::from_rows(PORTFOLIO_SERIES, rows, |r| r.twr_acc.map(to_points)),
        Series::from_rows(IBOVESPA_SERIES, rows, |r| r.ibov_acc.map(to_points)),
        Series::from_rows(SELIC_SERIES, rows, |r| r.selic_acc.map(to_points)),
    ];

    let patrimony = vec![
        Series::from_rows(CONTRIBUTIONS_SERIES, rows, |r| r.fluxo_acc),
        Series::from_rows(INVESTED_SERIES, rows, |r| Some(r.vlr_investido)),
        Series::from_rows(MARKET_SERIES, rows, |r| Some(r.vlr_mercado)),
    ];

    View::Ready(MonthlyReport {
        summary,
        benchmarks,
        patrimony,
    })
}

/// Annual page: rows must be sorted ascending by date
pub fn annual_report(rows: &[AnnualSnapshot]) -> View<AnnualReport> {
    let Some(last) = rows.last() else {
        return no_rows();
    };
    debug!("Annual report over {} rows, latest {}", rows.len(), last.date);

    let summary = AnnualSummary {
        date: last.date,
        market_value: last.vlr_mercado,
        twr_acc: last.twr_acc,
        twr_ano: last.twr_ano,
        lucro: last.lucro,
    };

    let cumulative = vec![
        Series::from_rows(PORTFOLIO_SERIES, rows, |r| r.twr_acc.map(to_points)),
        Series::from_rows(IBOVESPA_SERIES, rows, |r| r.ibov_acc.map(to_points)),
        Series::from_rows(SELIC_SERIES, rows, |r| r.selic_acc.map(to_points)),
    ];

    let mut patrimony = Vec::with_capacity(3);
    // Contributions only exist on workbooks that carry the column
    let contributions = Series::from_rows(CONTRIBUTIONS_SERIES, rows, |r| r.fluxo_acc);
    if !contributions.points.is_empty() {
        patrimony.push(contributions);
    }
    patrimony.push(Series::from_rows(INVESTED_SERIES, rows, |r| Some(r.vlr_investido)));
    patrimony.push(Series::from_rows(MARKET_SERIES, rows, |r| Some(r.vlr_mercado)));

    let yearly = rows
        .iter()
        .map(|r| YearComparison {
            year: r.date.year(),
            portfolio: r.twr_ano.map(to_points),
            ibovespa: r.ibov_ano.map(to_points),
            selic: r.selic_ano.map(to_points),
        })
        .collect();

    View::Ready(AnnualReport {
        summary,
        cumulative,
        patrimony,
        yearly,
    })
}
