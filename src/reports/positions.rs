//! Current positions: per-asset table, treemap, largest positions and
//! return-versus-allocation scatter

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::{to_points, Dimension};
use crate::engine::{
    build_hierarchy, column_total, distinct_values, share_pct, top_n, weighted_rate_of, FilterSpec,
    Metric, Ranked, TreemapEntry, View,
};
use crate::models::{AssetPosition, PositionColumn, PositionMeasure};

/// Columns the asset search looks at
pub const SEARCH_COLUMNS: [PositionColumn; 2] = [PositionColumn::Ativo, PositionColumn::Nome];

/// Treemap path of the positions page
pub const TREEMAP_PATH: [PositionColumn; 3] =
    [PositionColumn::Tipo, PositionColumn::Classe, PositionColumn::Ativo];

/// User selection on the positions page. `None` selects every value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionSelection {
    pub tipo: Option<Vec<String>>,
    pub classe: Option<Vec<String>>,
    pub setor: Option<Vec<String>>,
    pub search: Option<String>,
}

impl PositionSelection {
    pub fn to_filter(&self) -> FilterSpec<PositionColumn> {
        let mut filter = FilterSpec::new();
        for (column, values) in [
            (PositionColumn::Tipo, &self.tipo),
            (PositionColumn::Classe, &self.classe),
            (PositionColumn::Setor, &self.setor),
        ] {
            if let Some(values) = values {
                filter = filter.allow(column, values.iter().cloned());
            }
        }
        if let Some(needle) = &self.search {
            filter = filter.search(needle, &SEARCH_COLUMNS);
        }
        filter
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionTotals {
    pub invested: Decimal,
    pub market_value: Decimal,
    pub profit: Decimal,
    /// Profit over invested capital, in percentage points
    pub profit_pct: Metric,
    /// Investment-weighted XIRR, in percentage points like the source column
    pub weighted_xirr: Metric,
}

/// A position with its share of the filtered portfolio's market value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionRow {
    #[serde(flatten)]
    pub position: AssetPosition,
    pub portfolio_pct: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub ativo: String,
    pub nome: Option<String>,
    /// Colour group
    pub tipo: Option<String>,
    /// x axis
    pub portfolio_pct: Decimal,
    /// y axis
    pub xirr: Decimal,
    /// Marker size
    pub market_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionsReport {
    pub totals: PositionTotals,
    pub table: Vec<PositionRow>,
    /// Tipo > classe > ativo sized by market value, coloured by profit %
    pub treemap: Vec<TreemapEntry>,
    /// Largest positions ascending, with whole-portfolio shares
    pub top: Vec<Ranked<AssetPosition>>,
    /// Positions with a defined XIRR
    pub scatter: Vec<ScatterPoint>,
}

/// Positions view for `filter`, with the `top` largest positions ranked
pub fn positions_report(
    positions: &[AssetPosition],
    filter: &FilterSpec<PositionColumn>,
    top: usize,
) -> View<PositionsReport> {
    let filtered = match filter.apply(positions).into_result() {
        Ok(rows) => rows,
        Err(warning) => {
            debug!("Positions view is empty: {}", warning);
            return View::Empty(warning);
        }
    };
    debug!("Positions view over {} of {} assets", filtered.len(), positions.len());

    let invested = column_total(&filtered, PositionMeasure::VlrInvestido);
    let market_value = column_total(&filtered, PositionMeasure::VlrMercado);
    let profit = column_total(&filtered, PositionMeasure::LucroTotal);

    let totals = PositionTotals {
        invested,
        market_value,
        profit,
        profit_pct: Metric::ratio(profit, invested).map(to_points),
        weighted_xirr: weighted_rate_of(&filtered, PositionMeasure::Xirr, PositionMeasure::VlrInvestido),
    };

    let table = filtered
        .iter()
        .map(|p| PositionRow {
            position: p.clone(),
            portfolio_pct: share_pct(p.vlr_mercado, market_value),
        })
        .collect();

    let treemap = build_hierarchy(
        &filtered,
        &TREEMAP_PATH,
        PositionMeasure::VlrMercado,
        Some(PositionMeasure::LucroTotalPct),
    )
    .to_treemap();

    let scatter = filtered
        .iter()
        .filter_map(|p| {
            p.xirr.map(|xirr| ScatterPoint {
                ativo: p.ativo.clone(),
                nome: p.nome.clone(),
                tipo: p.tipo.clone(),
                portfolio_pct: share_pct(p.vlr_mercado, market_value),
                xirr,
                market_value: p.vlr_mercado,
            })
        })
        .collect();

    View::Ready(PositionsReport {
        totals,
        table,
        treemap,
        top: top_n(&filtered, PositionMeasure::VlrMercado, top),
        scatter,
    })
}

/// Filter domains of the positions view
pub fn position_dimensions(positions: &[AssetPosition]) -> Vec<Dimension> {
    [PositionColumn::Tipo, PositionColumn::Classe, PositionColumn::Setor]
        .iter()
        .map(|column| {
            let values = distinct_values(positions, *column);
            Dimension {
                column: column.header().to_string(),
                default: values.clone(),
                values,
            }
        })
        .collect()
}
