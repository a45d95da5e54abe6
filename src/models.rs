//! Typed rows for the four dashboard tables.
//!
//! Column names from the source workbook are mapped once, at the load
//! boundary, onto the enums below. Everything downstream addresses columns
//! through these enums instead of strings.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

use crate::engine::{Row, Timed};

/// A day-level date used as the x-axis and as a grouping key.
pub type TimePoint = NaiveDate;

/// Label used wherever a missing dimension value has to be displayed or
/// grouped.
pub const MISSING_LABEL: &str = "N/A";

/// One row of the monthly series (`data_mes`).
///
/// Returns and benchmarks may be blank for a month (a benchmark not yet
/// published, an `#N/A` formula); those stay `None` and are left out of the
/// corresponding series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySnapshot {
    pub date: TimePoint,
    pub vlr_investido: Decimal,
    pub vlr_mercado: Decimal,
    pub twr_acc: Option<Decimal>,
    pub ibov_acc: Option<Decimal>,
    pub selic_acc: Option<Decimal>,
    pub fluxo_acc: Option<Decimal>,
}

/// One row of the annual series (`data_ano`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualSnapshot {
    pub date: TimePoint,
    pub vlr_investido: Decimal,
    pub vlr_mercado: Decimal,
    pub twr_acc: Option<Decimal>,
    pub twr_ano: Option<Decimal>,
    pub ibov_acc: Option<Decimal>,
    pub ibov_ano: Option<Decimal>,
    pub selic_acc: Option<Decimal>,
    pub selic_ano: Option<Decimal>,
    pub lucro: Option<Decimal>,
    /// Not every workbook carries cumulative contributions on the annual sheet
    pub fluxo_acc: Option<Decimal>,
}

impl Timed for MonthlySnapshot {
    fn time(&self) -> TimePoint {
        self.date
    }
}

impl Timed for AnnualSnapshot {
    fn time(&self) -> TimePoint {
        self.date
    }
}

/// Dimension columns of the allocation tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AllocationColumn {
    Tipo,
    Categoria,
    Alocacao,
}

impl AllocationColumn {
    pub const ALL: [AllocationColumn; 3] = [
        AllocationColumn::Tipo,
        AllocationColumn::Categoria,
        AllocationColumn::Alocacao,
    ];

    /// Header text in the source sheet
    pub fn header(&self) -> &'static str {
        match self {
            AllocationColumn::Tipo => "Tipo",
            AllocationColumn::Categoria => "Categoria",
            AllocationColumn::Alocacao => "Alocação",
        }
    }
}

impl fmt::Display for AllocationColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// The single measure of a long allocation point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AllocationMeasure {
    Valor,
}

impl fmt::Display for AllocationMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Valor")
    }
}

/// (Tipo, Categoria, Alocação, Data, Valor) with `valor > 0`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongAllocationPoint {
    pub tipo: Option<String>,
    pub categoria: Option<String>,
    pub alocacao: Option<String>,
    pub date: TimePoint,
    pub valor: Decimal,
}

impl Row for LongAllocationPoint {
    type Column = AllocationColumn;
    type Measure = AllocationMeasure;

    fn text(&self, column: AllocationColumn) -> Option<&str> {
        match column {
            AllocationColumn::Tipo => self.tipo.as_deref(),
            AllocationColumn::Categoria => self.categoria.as_deref(),
            AllocationColumn::Alocacao => self.alocacao.as_deref(),
        }
    }

    fn value(&self, measure: AllocationMeasure) -> Option<Decimal> {
        match measure {
            AllocationMeasure::Valor => Some(self.valor),
        }
    }
}

impl Timed for LongAllocationPoint {
    fn time(&self) -> TimePoint {
        self.date
    }
}

/// Textual columns of the current-position table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PositionColumn {
    Ativo,
    Nome,
    Tipo,
    Classe,
    Setor,
}

impl PositionColumn {
    pub fn header(&self) -> &'static str {
        match self {
            PositionColumn::Ativo => "ativo",
            PositionColumn::Nome => "Nome",
            PositionColumn::Tipo => "Tipo",
            PositionColumn::Classe => "classe",
            PositionColumn::Setor => "setor",
        }
    }
}

impl fmt::Display for PositionColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Numeric columns of the current-position table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PositionMeasure {
    VlrInvestido,
    VlrMercado,
    LucroTotal,
    LucroTotalPct,
    Xirr,
}

impl PositionMeasure {
    pub fn header(&self) -> &'static str {
        match self {
            PositionMeasure::VlrInvestido => "vlr_investido",
            PositionMeasure::VlrMercado => "vlr_mercado",
            PositionMeasure::LucroTotal => "lucro_total",
            PositionMeasure::LucroTotalPct => "lucro_total_pct",
            PositionMeasure::Xirr => "xirr",
        }
    }
}

impl fmt::Display for PositionMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// One held asset (`data_port_mes`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetPosition {
    pub ativo: String,
    pub nome: Option<String>,
    pub tipo: Option<String>,
    pub classe: Option<String>,
    pub setor: Option<String>,
    pub vlr_investido: Decimal,
    pub vlr_mercado: Decimal,
    pub lucro_total: Decimal,
    pub lucro_total_pct: Decimal,
    /// Undefined when the asset has no usable cash-flow history
    pub xirr: Option<Decimal>,
}

impl Row for AssetPosition {
    type Column = PositionColumn;
    type Measure = PositionMeasure;

    fn text(&self, column: PositionColumn) -> Option<&str> {
        match column {
            PositionColumn::Ativo => Some(self.ativo.as_str()),
            PositionColumn::Nome => self.nome.as_deref(),
            PositionColumn::Tipo => self.tipo.as_deref(),
            PositionColumn::Classe => self.classe.as_deref(),
            PositionColumn::Setor => self.setor.as_deref(),
        }
    }

    fn value(&self, measure: PositionMeasure) -> Option<Decimal> {
        match measure {
            PositionMeasure::VlrInvestido => Some(self.vlr_investido),
            PositionMeasure::VlrMercado => Some(self.vlr_mercado),
            PositionMeasure::LucroTotal => Some(self.lucro_total),
            PositionMeasure::LucroTotalPct => Some(self.lucro_total_pct),
            PositionMeasure::Xirr => self.xirr,
        }
    }
}
