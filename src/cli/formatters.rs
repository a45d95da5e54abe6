//! Output formatting module for CLI display
//!
//! This module handles all terminal output formatting, separating
//! the concerns of data calculation from presentation.

use colored::{ColoredString, Colorize};
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

use crate::engine::{EmptyResultWarning, Metric, View};
use crate::models::{TimePoint, MISSING_LABEL};
use crate::reports::{
    AnnualReport, Dimension, EvolutionReport, MonthlyReport, PositionsReport, Series,
};
use crate::utils::{
    format_currency, format_date, format_metric, format_optional, format_percent, format_rate,
};

/// Pretty JSON of any view; empty views come out as `{"status": "empty", ...}`
pub fn format_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Friendly text for a view with no data
pub fn format_empty(warning: &EmptyResultWarning) -> String {
    format!("{} {}\n", "⚠".yellow().bold(), warning)
}

/// Render a view with `render`, or its empty-state warning
pub fn format_view<T>(view: &View<T>, render: impl Fn(&T) -> String) -> String {
    match view {
        View::Ready(data) => render(data),
        View::Empty(warning) => format_empty(warning),
    }
}

fn signed(text: String, value: Decimal) -> ColoredString {
    if value >= Decimal::ZERO {
        text.green()
    } else {
        text.red()
    }
}

fn signed_optional(value: Option<Decimal>, format: fn(Decimal) -> String) -> String {
    match value {
        Some(v) => signed(format(v), v).to_string(),
        None => MISSING_LABEL.to_string(),
    }
}

fn label(text: &str) -> ColoredString {
    format!("{:<22}", text).bold()
}

fn series_value(series: &[Series], index: usize, date: TimePoint) -> Option<Decimal> {
    series.get(index).and_then(|s| s.value_at(date))
}

/// Dates of the market-value series, which has a point for every row
fn row_dates(patrimony: &[Series]) -> Vec<TimePoint> {
    patrimony
        .last()
        .map(|s| s.points.iter().map(|p| p.date).collect())
        .unwrap_or_default()
}

fn right_aligned(rows: Table, from: usize) -> String {
    let mut table = rows;
    table.with(Style::modern());
    table.modify(Columns::new(from..), Alignment::right());
    table.to_string()
}

/// Monthly performance: summary lines plus one table row per month
pub fn format_monthly(report: &MonthlyReport) -> String {
    let mut output = String::new();
    let summary = &report.summary;

    output.push_str(&format!(
        "\n{} Performance Mensal - {}\n\n",
        "📊".cyan().bold(),
        format_date(summary.date)
    ));
    output.push_str(&format!(
        "{} {}\n",
        label("Patrimônio Atual:"),
        format_currency(summary.market_value)
    ));
    output.push_str(&format!(
        "{} {}\n",
        label("Rentabilidade Total:"),
        signed_optional(summary.twr_acc, format_rate)
    ));
    output.push_str(&format!(
        "{} {} ({})\n\n",
        label("Lucro Total:"),
        signed(format_currency(summary.profit), summary.profit),
        format_metric(summary.profit_rate, format_rate)
    ));

    #[derive(Tabled)]
    struct MonthRow {
        #[tabled(rename = "Data")]
        date: String,
        #[tabled(rename = "Carteira")]
        portfolio: String,
        #[tabled(rename = "Ibovespa")]
        ibovespa: String,
        #[tabled(rename = "Selic")]
        selic: String,
        #[tabled(rename = "Aportes")]
        contributions: String,
        #[tabled(rename = "Investido")]
        invested: String,
        #[tabled(rename = "Patrimônio")]
        market: String,
    }

    let rows: Vec<MonthRow> = row_dates(&report.patrimony)
        .into_iter()
        .map(|date| MonthRow {
            date: format_date(date),
            portfolio: format_optional(series_value(&report.benchmarks, 0, date), format_percent),
            ibovespa: format_optional(series_value(&report.benchmarks, 1, date), format_percent),
            selic: format_optional(series_value(&report.benchmarks, 2, date), format_percent),
            contributions: format_optional(
                series_value(&report.patrimony, 0, date),
                format_currency,
            ),
            invested: format_optional(series_value(&report.patrimony, 1, date), format_currency),
            market: format_optional(series_value(&report.patrimony, 2, date), format_currency),
        })
        .collect();

    output.push_str(&right_aligned(Table::new(&rows), 1));
    output.push('\n');
    output
}

/// Annual performance: summary lines plus the per-year comparison
pub fn format_annual(report: &AnnualReport) -> String {
    let mut output = String::new();
    let summary = &report.summary;

    output.push_str(&format!(
        "\n{} Performance Anual - {}\n\n",
        "📈".cyan().bold(),
        format_date(summary.date)
    ));
    output.push_str(&format!(
        "{} {}\n",
        label("Patrimônio:"),
        format_currency(summary.market_value)
    ));
    output.push_str(&format!(
        "{} {}\n",
        label("TWR Acumulado:"),
        signed_optional(summary.twr_acc, format_rate)
    ));
    output.push_str(&format!(
        "{} {}\n",
        label("TWR Ano:"),
        signed_optional(summary.twr_ano, format_rate)
    ));
    output.push_str(&format!(
        "{} {}\n\n",
        label("Lucro:"),
        signed_optional(summary.lucro, format_currency)
    ));

    #[derive(Tabled)]
    struct YearRow {
        #[tabled(rename = "Ano")]
        year: i32,
        #[tabled(rename = "Carteira")]
        portfolio: String,
        #[tabled(rename = "Ibovespa")]
        ibovespa: String,
        #[tabled(rename = "Selic")]
        selic: String,
        #[tabled(rename = "Acumulado")]
        cumulative: String,
        #[tabled(rename = "Patrimônio")]
        market: String,
    }

    let market = report.patrimony.len().saturating_sub(1);
    let rows: Vec<YearRow> = report
        .yearly
        .iter()
        .zip(row_dates(&report.patrimony))
        .map(|(y, date)| YearRow {
            year: y.year,
            portfolio: match (y.portfolio, y.excess_over_best()) {
                (Some(p), Some(excess)) => signed(format_percent(p), excess).to_string(),
                (p, _) => format_optional(p, format_percent),
            },
            ibovespa: format_optional(y.ibovespa, format_percent),
            selic: format_optional(y.selic, format_percent),
            cumulative: format_optional(series_value(&report.cumulative, 0, date), format_percent),
            market: format_optional(series_value(&report.patrimony, market, date), format_currency),
        })
        .collect();

    output.push_str(&right_aligned(Table::new(&rows), 1));
    output.push('\n');
    output
}

#[derive(Tabled)]
struct ShareRow {
    #[tabled(rename = "Grupo")]
    key: String,
    #[tabled(rename = "Valor")]
    value: String,
    #[tabled(rename = "Percentual")]
    pct: String,
}

/// Allocation evolution: totals, grouped shares and the latest slice tree
pub fn format_evolution(report: &EvolutionReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n{} Evolução por Alocação - {}\n\n",
        "🔄".cyan().bold(),
        format_date(report.latest_date)
    ));
    output.push_str(&format!(
        "{} {}\n",
        label("Total Portfólio:"),
        format_currency(report.totals.portfolio_total)
    ));
    output.push_str(&format!("{} {}\n", label("Tipos:"), report.totals.types));
    output.push_str(&format!(
        "{} {}\n",
        label("Alocações:"),
        report.totals.allocations
    ));

    for (title, groups) in [
        ("Tipo", &report.by_tipo),
        ("Categoria", &report.by_categoria),
        ("Alocação", &report.by_alocacao),
    ] {
        let rows: Vec<ShareRow> = groups
            .iter()
            .map(|g| ShareRow {
                key: g.key.join(" / "),
                value: format_currency(g.value),
                pct: format_percent(g.pct),
            })
            .collect();
        output.push_str(&format!("\n{}\n", title.bold()));
        output.push_str(&right_aligned(Table::new(&rows), 1));
        output.push('\n');
    }

    output.push_str(&format!("\n{}\n", "Evolução".bold()));
    for series in &report.allocation_series {
        let first = series.points.first();
        let last = series.last();
        if let (Some(first), Some(last)) = (first, last) {
            output.push_str(&format!(
                "  {:<24} {} ({}) -> {} ({})\n",
                series.name,
                format_currency(first.value),
                format_date(first.date),
                format_currency(last.value),
                format_date(last.date)
            ));
        }
    }
    output
}

/// Current positions: totals, asset table and largest positions
pub fn format_positions(report: &PositionsReport) -> String {
    let mut output = String::new();
    let totals = &report.totals;

    output.push_str(&format!("\n{} Posição Atual\n\n", "💼".cyan().bold()));

    #[derive(Tabled)]
    struct AssetRow {
        #[tabled(rename = "Ativo")]
        ativo: String,
        #[tabled(rename = "Nome")]
        nome: String,
        #[tabled(rename = "Tipo")]
        tipo: String,
        #[tabled(rename = "Investido")]
        invested: String,
        #[tabled(rename = "Valor Mercado")]
        market: String,
        #[tabled(rename = "Lucro")]
        profit: String,
        #[tabled(rename = "Lucro %")]
        profit_pct: String,
        #[tabled(rename = "XIRR")]
        xirr: String,
        #[tabled(rename = "% Carteira")]
        share: String,
    }

    let rows: Vec<AssetRow> = report
        .table
        .iter()
        .map(|row| {
            let p = &row.position;
            AssetRow {
                ativo: p.ativo.clone(),
                nome: p.nome.clone().unwrap_or_else(|| MISSING_LABEL.to_string()),
                tipo: p.tipo.clone().unwrap_or_else(|| MISSING_LABEL.to_string()),
                invested: format_currency(p.vlr_investido),
                market: format_currency(p.vlr_mercado),
                profit: signed(format_currency(p.lucro_total), p.lucro_total).to_string(),
                profit_pct: signed(format_percent(p.lucro_total_pct), p.lucro_total_pct)
                    .to_string(),
                xirr: format_optional(p.xirr, format_percent),
                share: format_percent(row.portfolio_pct),
            }
        })
        .collect();

    output.push_str(&right_aligned(Table::new(&rows), 3));

    output.push_str(&format!("\n\n{} Totais", "━".repeat(80).bright_black()));
    output.push_str(&format!(
        "\n{} {}",
        label("Total Investido:"),
        format_currency(totals.invested)
    ));
    output.push_str(&format!(
        "\n{} {}",
        label("Patrimônio Atual:"),
        format_currency(totals.market_value)
    ));
    output.push_str(&format!(
        "\n{} {} ({})",
        label("Lucro Total:"),
        signed(format_currency(totals.profit), totals.profit),
        format_metric(totals.profit_pct, format_percent)
    ));
    output.push_str(&format!(
        "\n{} {}\n",
        label("XIRR Médio:"),
        format_xirr(totals.weighted_xirr)
    ));

    if !report.top.is_empty() {
        output.push_str(&format!(
            "\n{} Maiores Posições\n",
            "🏆".cyan().bold()
        ));
        // ascending in the report; print the largest first
        for ranked in report.top.iter().rev() {
            output.push_str(&format!(
                "  {:<10} {:>8}  {}\n",
                ranked.row.ativo,
                format_percent(ranked.pct),
                format_currency(ranked.value)
            ));
        }
    }
    output
}

fn format_xirr(metric: Metric) -> String {
    if metric.is_defined() {
        format_metric(metric, format_percent)
    } else {
        format!("{} (sem XIRR)", format_metric(metric, format_percent))
    }
}

/// Filter domains, defaults marked with `*`
pub fn format_dimensions(dimensions: &[Dimension]) -> String {
    let mut output = String::new();
    for dimension in dimensions {
        output.push_str(&format!("{}\n", dimension.column.bold()));
        for value in &dimension.values {
            let marker = if dimension.default.contains(value) {
                "*"
            } else {
                " "
            };
            output.push_str(&format!("  {} {}\n", marker, value));
        }
    }
    output
}
