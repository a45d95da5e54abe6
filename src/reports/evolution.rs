//! Allocation evolution: the historical table reshaped, filtered and sliced

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use super::{Dimension, Series, SeriesPoint};
use crate::engine::{
    build_hierarchy, column_total, composition_over_time, distinct_values, grouped_sum,
    latest_slice, latest_time, percentage_of_total, CompositionPoint, EmptyReason,
    EmptyResultWarning, FilterSpec, GroupShare, Row, TreemapEntry, View, WideAllocationTable,
};
use crate::models::{AllocationColumn, AllocationMeasure, LongAllocationPoint, TimePoint};

/// User selection on the three allocation dimensions.
///
/// `None` keeps the default: every Tipo, every Categoria and the first
/// `default_allocations` Alocação values in order of appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvolutionSelection {
    pub tipo: Option<Vec<String>>,
    pub categoria: Option<Vec<String>>,
    pub alocacao: Option<Vec<String>>,
    /// Select every Alocação instead of the default prefix
    pub all_allocations: bool,
}

impl EvolutionSelection {
    /// Resolve the selection against the available points
    pub fn to_filter(
        &self,
        points: &[LongAllocationPoint],
        default_allocations: usize,
    ) -> FilterSpec<AllocationColumn> {
        let mut filter = FilterSpec::new();

        if let Some(tipos) = &self.tipo {
            filter = filter.allow(AllocationColumn::Tipo, tipos.iter().cloned());
        }
        if let Some(categorias) = &self.categoria {
            filter = filter.allow(AllocationColumn::Categoria, categorias.iter().cloned());
        }

        let alocacoes = match &self.alocacao {
            Some(values) => Some(values.clone()),
            None if self.all_allocations => None,
            None => Some(
                distinct_values(points, AllocationColumn::Alocacao)
                    .into_iter()
                    .take(default_allocations)
                    .collect(),
            ),
        };
        if let Some(values) = alocacoes {
            filter = filter.allow(AllocationColumn::Alocacao, values);
        }
        filter
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvolutionTotals {
    /// Sum of the latest slice
    pub portfolio_total: Decimal,
    /// Distinct Tipo values in the latest slice
    pub types: usize,
    /// Distinct Alocação values in the latest slice
    pub allocations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvolutionReport {
    pub latest_date: TimePoint,
    pub totals: EvolutionTotals,
    /// One line per Alocação, points ascending by date
    pub allocation_series: Vec<Series>,
    /// Each point's share of its own date's total
    pub composition: Vec<CompositionPoint<LongAllocationPoint>>,
    /// Tipo > Categoria > Alocação of the latest slice
    pub treemap: Vec<TreemapEntry>,
    pub by_tipo: Vec<GroupShare>,
    pub by_categoria: Vec<GroupShare>,
    pub by_alocacao: Vec<GroupShare>,
}

/// Reshape the historical table and build the evolution view for `selection`
pub fn build_evolution(
    historical: &WideAllocationTable,
    selection: &EvolutionSelection,
    default_allocations: usize,
) -> View<EvolutionReport> {
    let points = historical.to_long();
    info!("Building evolution view over {} allocation points", points.len());
    let filter = selection.to_filter(&points, default_allocations);
    evolution_report(&points, &filter)
}

/// Evolution view over already reshaped points
pub fn evolution_report(
    points: &[LongAllocationPoint],
    filter: &FilterSpec<AllocationColumn>,
) -> View<EvolutionReport> {
    let filtered = match filter.apply(points).into_result() {
        Ok(rows) => rows,
        Err(warning) => {
            debug!("Evolution view is empty: {}", warning);
            return View::Empty(warning);
        }
    };

    let Some(latest_date) = latest_time(&filtered) else {
        return View::Empty(EmptyResultWarning::new(EmptyReason::NoMatchingRows));
    };
    let latest = latest_slice(&filtered);

    let totals = EvolutionTotals {
        portfolio_total: column_total(&latest, AllocationMeasure::Valor),
        types: distinct_count(&latest, AllocationColumn::Tipo),
        allocations: distinct_count(&latest, AllocationColumn::Alocacao),
    };

    let tree = build_hierarchy(&latest, &AllocationColumn::ALL, AllocationMeasure::Valor, None);

    let shares = |column: AllocationColumn| {
        percentage_of_total(&grouped_sum(&latest, &[column], AllocationMeasure::Valor))
    };

    View::Ready(EvolutionReport {
        latest_date,
        totals,
        allocation_series: allocation_series(&filtered),
        composition: composition_over_time(&filtered, AllocationMeasure::Valor),
        treemap: tree.to_treemap(),
        by_tipo: shares(AllocationColumn::Tipo),
        by_categoria: shares(AllocationColumn::Categoria),
        by_alocacao: shares(AllocationColumn::Alocacao),
    })
}

/// Filter domains of the evolution view, taken from the reshaped points
pub fn evolution_dimensions(
    historical: &WideAllocationTable,
    default_allocations: usize,
) -> Vec<Dimension> {
    let points = historical.to_long();
    AllocationColumn::ALL
        .iter()
        .map(|column| {
            let values = distinct_values(&points, *column);
            let default = match column {
                AllocationColumn::Alocacao => {
                    values.iter().take(default_allocations).cloned().collect()
                }
                _ => values.clone(),
            };
            Dimension {
                column: column.header().to_string(),
                values,
                default,
            }
        })
        .collect()
}

fn distinct_count(points: &[LongAllocationPoint], column: AllocationColumn) -> usize {
    points
        .iter()
        .map(|p| p.label(column))
        .collect::<BTreeSet<_>>()
        .len()
}

/// Value per Alocação over time; duplicate rows on the same date are summed
fn allocation_series(points: &[LongAllocationPoint]) -> Vec<Series> {
    let mut lines: BTreeMap<&str, BTreeMap<TimePoint, Decimal>> = BTreeMap::new();
    for point in points {
        *lines
            .entry(point.label(AllocationColumn::Alocacao))
            .or_default()
            .entry(point.date)
            .or_insert(Decimal::ZERO) += point.valor;
    }

    lines
        .into_iter()
        .map(|(name, values)| Series {
            name: name.to_string(),
            points: values
                .into_iter()
                .map(|(date, value)| SeriesPoint { date, value })
                .collect(),
        })
        .collect()
}
