//! Loading real `.xlsx` files end to end: sheets, schema checks and the
//! versioned load cache.

mod workbook_helpers;

use carteira::config::SheetNames;
use carteira::engine::{EmptyReason, Metric};
use carteira::error::DashboardError;
use carteira::loader::{SourceCache, SourceLoader, WorkbookLoader};
use carteira::reports::{
    annual_report, build_evolution, monthly_report, positions_report, EvolutionSelection,
    PositionSelection,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use workbook_helpers::{
    annual_rows, default_sheets, fixture_workbook, monthly_rows, position_rows, write_sheets,
    write_workbook, write_workbook_with_positions, V,
};

fn close(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < dec!(0.0000001)
}

#[test]
fn loads_all_four_sheets() {
    let (_dir, path) = fixture_workbook();
    let loader = WorkbookLoader::new(&path, SheetNames::default());
    let dataset = loader.load().unwrap();

    assert_eq!(dataset.monthly.len(), 2);
    assert_eq!(
        dataset.monthly[0].date,
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
    );
    assert_eq!(dataset.monthly[1].vlr_mercado, dec!(2300));

    assert_eq!(dataset.annual.len(), 2);
    assert_eq!(dataset.annual[1].fluxo_acc, Some(dec!(2000)));

    assert_eq!(
        dataset.historical.dates(),
        &[
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        ]
    );
    assert_eq!(dataset.historical.records().len(), 4);

    assert_eq!(dataset.positions.len(), 3);
    assert_eq!(dataset.positions[2].xirr, None);
}

#[test]
fn reshape_drops_zero_and_blank_cells() {
    let (_dir, path) = fixture_workbook();
    let dataset = WorkbookLoader::new(&path, SheetNames::default())
        .load()
        .unwrap();

    let points = dataset.historical.to_long();
    // 4 rows x 2 dates, minus LTN's blank and HGLG11's zero
    assert_eq!(points.len(), 6);
    assert!(points.iter().all(|p| p.valor > Decimal::ZERO));
}

#[test]
fn views_over_loaded_workbook() {
    let (_dir, path) = fixture_workbook();
    let dataset = WorkbookLoader::new(&path, SheetNames::default())
        .load()
        .unwrap();

    let monthly = monthly_report(&dataset.monthly).ready().unwrap();
    assert_eq!(monthly.summary.profit, dec!(300));
    assert!(close(monthly.summary.twr_acc.unwrap(), dec!(0.15)));

    let annual = annual_report(&dataset.annual).ready().unwrap();
    assert_eq!(annual.yearly.len(), 2);
    assert!(close(annual.yearly[1].ibovespa.unwrap(), dec!(-10)));

    let evolution = build_evolution(
        &dataset.historical,
        &EvolutionSelection {
            all_allocations: true,
            ..Default::default()
        },
        5,
    )
    .ready()
    .unwrap();
    assert_eq!(evolution.totals.portfolio_total, dec!(500));
    assert_eq!(evolution.totals.allocations, 3);

    let positions = positions_report(
        &dataset.positions,
        &PositionSelection::default().to_filter(),
        10,
    )
    .ready()
    .unwrap();
    assert_eq!(positions.totals.market_value, dec!(100));
    assert_eq!(positions.totals.weighted_xirr, Metric::Computed(dec!(17.5)));
    assert_eq!(positions.top.last().unwrap().row.ativo, "ITUB4");
    assert_eq!(positions.top.last().unwrap().pct, dec!(50));
}

#[test]
fn positions_empty_selection_is_a_warning() {
    let (_dir, path) = fixture_workbook();
    let dataset = WorkbookLoader::new(&path, SheetNames::default())
        .load()
        .unwrap();

    let selection = PositionSelection {
        classe: Some(Vec::new()),
        ..Default::default()
    };
    let view = positions_report(&dataset.positions, &selection.to_filter(), 10);
    assert!(view.is_empty());
    assert!(matches!(
        view.warning().map(|w| &w.reason),
        Some(EmptyReason::EmptySelection { columns }) if columns == &vec!["classe".to_string()]
    ));
}

#[test]
fn missing_sheet_is_schema_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("partial.xlsx");
    write_workbook(&path, Some("data_port_historico")).unwrap();

    let err = WorkbookLoader::new(&path, SheetNames::default())
        .load()
        .unwrap_err();
    let typed = err.downcast_ref::<DashboardError>().unwrap();
    assert!(typed.is_schema_error());
    assert!(err.to_string().contains("data_port_historico"));
}

#[test]
fn custom_sheet_names_are_honoured() {
    let (_dir, path) = fixture_workbook();
    let sheets = SheetNames {
        positions: "posicao".to_string(),
        ..SheetNames::default()
    };
    let err = WorkbookLoader::new(&path, sheets).load().unwrap_err();
    assert!(err.to_string().contains("posicao"));
}

#[test]
fn cache_reloads_only_when_content_changes() {
    let (_dir, path) = fixture_workbook();
    let loader = WorkbookLoader::new(&path, SheetNames::default());
    let mut cache = SourceCache::new();

    let first = cache.get_or_load(&loader).unwrap();
    let second = cache.get_or_load(&loader).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let mut positions = position_rows();
    positions.push(vec![
        V::S("WEGE3"),
        V::S("WEG"),
        V::S("Ações"),
        V::S("Indústria"),
        V::S("Bens Industriais"),
        V::N(40.0),
        V::N(60.0),
        V::N(20.0),
        V::N(50.0),
        V::N(15.0),
    ]);
    write_workbook_with_positions(&path, positions).unwrap();

    let third = cache.get_or_load(&loader).unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(third.positions.len(), 4);
    assert_eq!(first.positions.len(), 3);
    assert_eq!(cache.len(), 1);

    assert!(cache.invalidate(&loader.identity()));
    assert!(cache.is_empty());
}

#[test]
fn sparse_cells_do_not_block_the_load() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("sparse.xlsx");

    let mut monthly = monthly_rows();
    // latest month: Ibovespa not published yet
    monthly[1][4] = V::Blank;
    let mut annual = annual_rows();
    annual[2][8] = V::S("-");
    let mut positions = position_rows();
    positions[1][9] = V::S("-");
    positions[3][9] = V::S("N/A");

    let mut sheets = default_sheets();
    sheets[0].1 = monthly;
    sheets[1].1 = annual;
    sheets[3].1 = positions;
    write_sheets(&path, &sheets).unwrap();

    let dataset = WorkbookLoader::new(&path, SheetNames::default())
        .load()
        .unwrap();
    assert_eq!(dataset.monthly.len(), 2);
    assert_eq!(dataset.monthly[1].ibov_acc, None);
    assert_eq!(dataset.annual[1].selic_ano, None);
    assert_eq!(dataset.positions[0].xirr, None);
    assert_eq!(dataset.positions[1].xirr, Some(dec!(20)));
    assert_eq!(dataset.positions[2].xirr, None);

    let monthly = monthly_report(&dataset.monthly).ready().unwrap();
    assert_eq!(monthly.benchmarks[1].points.len(), 1);
    assert_eq!(monthly.summary.profit, dec!(300));

    let annual = annual_report(&dataset.annual).ready().unwrap();
    assert_eq!(annual.yearly[1].selic, None);
    assert!(close(annual.yearly[1].excess_over_best().unwrap(), dec!(18.5)));

    let positions = positions_report(
        &dataset.positions,
        &PositionSelection::default().to_filter(),
        10,
    )
    .ready()
    .unwrap();
    assert_eq!(positions.totals.weighted_xirr, Metric::Computed(dec!(20)));
}
