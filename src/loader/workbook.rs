//! `.xlsx` source loader built on calamine

use anyhow::{Context, Result};
use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fs;
use std::io::{Read, Seek};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::cells::{cell_text, parse_date, parse_sparse_decimal, to_cell, to_column_header};
use super::{Dataset, SourceLoader, SourceSnapshot};
use crate::config::SheetNames;
use crate::engine::{Cell, ColumnHeader, WideAllocationTable};
use crate::error::DashboardError;
use crate::models::{AnnualSnapshot, AssetPosition, MonthlySnapshot, PositionColumn, PositionMeasure};

static EMPTY_CELL: Data = Data::Empty;

const MONTHLY_COLUMNS: [&str; 7] = [
    "date",
    "vlr_investido",
    "vlr_mercado",
    "twr_acc",
    "ibov_acc",
    "selic_acc",
    "fluxo_acc",
];

const ANNUAL_COLUMNS: [&str; 10] = [
    "date",
    "vlr_investido",
    "vlr_mercado",
    "twr_acc",
    "twr_ano",
    "ibov_acc",
    "ibov_ano",
    "selic_acc",
    "selic_ano",
    "lucro",
];

/// Loads the four dashboard tables from one Excel workbook
#[derive(Debug, Clone)]
pub struct WorkbookLoader {
    path: PathBuf,
    sheets: SheetNames,
}

impl WorkbookLoader {
    pub fn new(path: impl Into<PathBuf>, sheets: SheetNames) -> Self {
        Self {
            path: path.into(),
            sheets,
        }
    }
}

impl SourceLoader for WorkbookLoader {
    fn identity(&self) -> String {
        fs::canonicalize(&self.path)
            .unwrap_or_else(|_| self.path.clone())
            .display()
            .to_string()
    }

    fn read(&self) -> Result<SourceSnapshot> {
        let bytes = fs::read(&self.path)
            .with_context(|| format!("Failed to read workbook {}", self.path.display()))?;
        Ok(SourceSnapshot::from_bytes(bytes))
    }

    fn parse(&self, snapshot: &SourceSnapshot) -> Result<Dataset> {
        info!("Loading workbook: {:?}", self.path);

        let cursor = std::io::Cursor::new(snapshot.bytes.as_slice());
        let mut workbook: Xlsx<_> = open_workbook_from_rs(cursor).map_err(|e| {
            DashboardError::WorkbookError(format!("{}: {}", self.path.display(), e))
        })?;

        let monthly_range = sheet_range(&mut workbook, &self.sheets.monthly)?;
        let annual_range = sheet_range(&mut workbook, &self.sheets.annual)?;
        let historical_range = sheet_range(&mut workbook, &self.sheets.historical)?;
        let positions_range = sheet_range(&mut workbook, &self.sheets.positions)?;

        let dataset = Dataset {
            monthly: parse_monthly(&self.sheets.monthly, &monthly_range)?,
            annual: parse_annual(&self.sheets.annual, &annual_range)?,
            historical: parse_historical(&historical_range)?,
            positions: parse_positions(&self.sheets.positions, &positions_range)?,
        };

        info!(
            "Loaded {} monthly rows, {} annual rows, {} allocation rows, {} positions",
            dataset.monthly.len(),
            dataset.annual.len(),
            dataset.historical.records().len(),
            dataset.positions.len()
        );
        Ok(dataset)
    }
}

fn sheet_range<RS: Read + Seek>(workbook: &mut Xlsx<RS>, name: &str) -> Result<Range<Data>> {
    let sheet_names = workbook.sheet_names();
    if !sheet_names.iter().any(|s| s == name) {
        return Err(DashboardError::schema(
            name,
            format!("sheet not found (workbook has: {:?})", sheet_names),
        )
        .into());
    }
    workbook
        .worksheet_range(name)
        .map_err(|e| anyhow::Error::from(DashboardError::WorkbookError(format!("{}: {}", name, e))))
}

/// Column positions of a sheet, from its first row
struct HeaderIndex {
    sheet: String,
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    fn from_range(sheet: &str, range: &Range<Data>) -> Result<Self> {
        let header = range
            .rows()
            .next()
            .ok_or_else(|| DashboardError::schema(sheet, "sheet is empty (no header row)"))?;

        let mut positions = HashMap::new();
        for (idx, cell) in header.iter().enumerate() {
            if let Some(text) = cell_text(cell) {
                positions.entry(text).or_insert(idx);
            }
        }
        debug!("{} header: {:?}", sheet, positions);

        Ok(Self {
            sheet: sheet.to_string(),
            positions,
        })
    }

    fn require_all(&self, columns: &[&str]) -> Result<()> {
        let missing: Vec<&str> = columns
            .iter()
            .copied()
            .filter(|c| !self.positions.contains_key(*c))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DashboardError::schema(
                &self.sheet,
                format!("missing required column(s): {}", missing.join(", ")),
            )
            .into())
        }
    }

    fn get(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }
}

/// Typed access to one data row
struct RowReader<'a> {
    header: &'a HeaderIndex,
    row: &'a [Data],
    line: usize,
}

impl<'a> RowReader<'a> {
    fn cell(&self, column: &str) -> &'a Data {
        self.header
            .get(column)
            .and_then(|idx| self.row.get(idx))
            .unwrap_or(&EMPTY_CELL)
    }

    fn context(&self, column: &str) -> String {
        format!("{} row {} column '{}'", self.header.sheet, self.line, column)
    }

    fn date(&self, column: &str) -> Result<chrono::NaiveDate> {
        parse_date(self.cell(column)).with_context(|| self.context(column))
    }

    /// Blank cells, Excel errors and `-`/`N/A` placeholders are `None`;
    /// other text that is not a number is a parse error
    fn optional_decimal(&self, column: &str) -> Result<Option<Decimal>> {
        parse_sparse_decimal(self.cell(column)).map_err(|e| {
            DashboardError::ParseError(format!("{}: {:#}", self.context(column), e)).into()
        })
    }

    /// Date and amounts a series row cannot do without; `None` when any is blank
    fn series_key(&self) -> Result<Option<(chrono::NaiveDate, Decimal, Decimal)>> {
        if cell_text(self.cell("date")).is_none() {
            return Ok(None);
        }
        let date = self.date("date")?;
        match (
            self.optional_decimal("vlr_investido")?,
            self.optional_decimal("vlr_mercado")?,
        ) {
            (Some(invested), Some(market)) => Ok(Some((date, invested, market))),
            _ => Ok(None),
        }
    }

    fn text(&self, column: &str) -> Option<String> {
        cell_text(self.cell(column))
    }
}

/// Data rows (header skipped, blank rows dropped) with their 1-based line numbers
fn data_rows(range: &Range<Data>) -> impl Iterator<Item = (usize, &[Data])> + '_ {
    range
        .rows()
        .enumerate()
        .skip(1)
        .filter(|(_, row)| !row.iter().all(|c| matches!(c, Data::Empty)))
        .map(|(idx, row)| (idx + 1, row))
}

pub(crate) fn parse_monthly(sheet: &str, range: &Range<Data>) -> Result<Vec<MonthlySnapshot>> {
    let header = HeaderIndex::from_range(sheet, range)?;
    header.require_all(&MONTHLY_COLUMNS)?;

    let mut rows = Vec::new();
    for (line, row) in data_rows(range) {
        let r = RowReader {
            header: &header,
            row,
            line,
        };
        let Some((date, vlr_investido, vlr_mercado)) = r.series_key()? else {
            warn!("Skipping {} row {}: no date, invested or market value", sheet, line);
            continue;
        };
        rows.push(MonthlySnapshot {
            date,
            vlr_investido,
            vlr_mercado,
            twr_acc: r.optional_decimal("twr_acc")?,
            ibov_acc: r.optional_decimal("ibov_acc")?,
            selic_acc: r.optional_decimal("selic_acc")?,
            fluxo_acc: r.optional_decimal("fluxo_acc")?,
        });
    }

    rows.sort_by_key(|r| r.date);
    Ok(rows)
}

pub(crate) fn parse_annual(sheet: &str, range: &Range<Data>) -> Result<Vec<AnnualSnapshot>> {
    let header = HeaderIndex::from_range(sheet, range)?;
    header.require_all(&ANNUAL_COLUMNS)?;

    let mut rows = Vec::new();
    for (line, row) in data_rows(range) {
        let r = RowReader {
            header: &header,
            row,
            line,
        };
        let Some((date, vlr_investido, vlr_mercado)) = r.series_key()? else {
            warn!("Skipping {} row {}: no date, invested or market value", sheet, line);
            continue;
        };
        rows.push(AnnualSnapshot {
            date,
            vlr_investido,
            vlr_mercado,
            twr_acc: r.optional_decimal("twr_acc")?,
            twr_ano: r.optional_decimal("twr_ano")?,
            ibov_acc: r.optional_decimal("ibov_acc")?,
            ibov_ano: r.optional_decimal("ibov_ano")?,
            selic_acc: r.optional_decimal("selic_acc")?,
            selic_ano: r.optional_decimal("selic_ano")?,
            lucro: r.optional_decimal("lucro")?,
            fluxo_acc: r.optional_decimal("fluxo_acc")?,
        });
    }

    rows.sort_by_key(|r| r.date);
    Ok(rows)
}

pub(crate) fn parse_historical(range: &Range<Data>) -> Result<WideAllocationTable> {
    let mut raw_rows = range.rows();
    let header: Vec<ColumnHeader> = raw_rows
        .next()
        .map(|row| row.iter().map(to_column_header).collect())
        .unwrap_or_default();
    let body: Vec<Vec<Cell>> = raw_rows
        .map(|row| row.iter().map(to_cell).collect())
        .collect();

    Ok(WideAllocationTable::from_grid(&header, &body)?)
}

pub(crate) fn parse_positions(sheet: &str, range: &Range<Data>) -> Result<Vec<AssetPosition>> {
    let header = HeaderIndex::from_range(sheet, range)?;
    let required: Vec<&str> = [
        PositionColumn::Ativo,
        PositionColumn::Nome,
        PositionColumn::Tipo,
        PositionColumn::Classe,
        PositionColumn::Setor,
    ]
    .iter()
    .map(|c| c.header())
    .chain(
        [
            PositionMeasure::VlrInvestido,
            PositionMeasure::VlrMercado,
            PositionMeasure::LucroTotal,
            PositionMeasure::LucroTotalPct,
            PositionMeasure::Xirr,
        ]
        .iter()
        .map(|m| m.header()),
    )
    .collect();
    header.require_all(&required)?;

    let mut positions = Vec::new();
    for (line, row) in data_rows(range) {
        let r = RowReader {
            header: &header,
            row,
            line,
        };

        let Some(ativo) = r.text(PositionColumn::Ativo.header()) else {
            warn!("Skipping {} row {}: no ticker", sheet, line);
            continue;
        };

        let amount = |measure: PositionMeasure| -> Result<Decimal> {
            Ok(r.optional_decimal(measure.header())?.unwrap_or(Decimal::ZERO))
        };

        positions.push(AssetPosition {
            nome: r.text(PositionColumn::Nome.header()),
            tipo: r.text(PositionColumn::Tipo.header()),
            classe: r.text(PositionColumn::Classe.header()),
            setor: r.text(PositionColumn::Setor.header()),
            vlr_investido: amount(PositionMeasure::VlrInvestido)?,
            vlr_mercado: amount(PositionMeasure::VlrMercado)?,
            lucro_total: amount(PositionMeasure::LucroTotal)?,
            lucro_total_pct: amount(PositionMeasure::LucroTotalPct)?,
            xirr: r.optional_decimal(PositionMeasure::Xirr.header())?,
            ativo,
        });
    }

    Ok(positions)
}
