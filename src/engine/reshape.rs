//! Wide-to-long reshaping of the historical allocation table

use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::debug;

use crate::error::DashboardError;
use crate::models::{AllocationColumn, LongAllocationPoint, TimePoint};

const TABLE_NAME: &str = "data_port_historico";

/// Header cell of a wide table: either a dimension name or a date
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnHeader {
    Text(String),
    Date(TimePoint),
}

/// Body cell of a wide table
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(Decimal),
    Text(String),
}

impl Cell {
    fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) => Some(n.normalize().to_string()),
            Cell::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }

    fn as_number(&self) -> Option<Decimal> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// One (Tipo, Categoria, Alocação) row with one value per date column.
/// The triple is not required to be unique.
#[derive(Debug, Clone, PartialEq)]
pub struct WideAllocationRecord {
    pub tipo: Option<String>,
    pub categoria: Option<String>,
    pub alocacao: Option<String>,
    pub values: Vec<Option<Decimal>>,
}

/// Validated wide allocation table
#[derive(Debug, Clone, PartialEq)]
pub struct WideAllocationTable {
    dates: Vec<TimePoint>,
    records: Vec<WideAllocationRecord>,
}

impl WideAllocationTable {
    /// Build from typed records. Every record must carry one value per date.
    pub fn new(
        dates: Vec<TimePoint>,
        records: Vec<WideAllocationRecord>,
    ) -> Result<Self, DashboardError> {
        if dates.is_empty() {
            return Err(DashboardError::schema(TABLE_NAME, "no date-valued columns found"));
        }
        if let Some((idx, record)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.values.len() != dates.len())
        {
            return Err(DashboardError::schema(
                TABLE_NAME,
                format!(
                    "row {} has {} values but the table has {} date columns",
                    idx + 1,
                    record.values.len(),
                    dates.len()
                ),
            ));
        }
        Ok(Self { dates, records })
    }

    /// Build from a raw header row and body grid.
    ///
    /// Date-valued headers become value columns; `Tipo`, `Categoria` and
    /// `Alocação` must be present among the remaining ones. Other text columns
    /// are ignored.
    pub fn from_grid(
        header: &[ColumnHeader],
        rows: &[Vec<Cell>],
    ) -> Result<Self, DashboardError> {
        let mut date_columns: Vec<(usize, TimePoint)> = Vec::new();
        for (idx, h) in header.iter().enumerate() {
            if let ColumnHeader::Date(date) = h {
                date_columns.push((idx, *date));
            }
        }
        if date_columns.is_empty() {
            return Err(DashboardError::schema(TABLE_NAME, "no date-valued columns found"));
        }

        let mut dimension_idx = [0usize; 3];
        for (slot, column) in AllocationColumn::ALL.iter().enumerate() {
            let position = header.iter().position(|h| match h {
                ColumnHeader::Text(name) => name.trim() == column.header(),
                ColumnHeader::Date(_) => false,
            });
            dimension_idx[slot] = position.ok_or_else(|| {
                DashboardError::schema(
                    TABLE_NAME,
                    format!("missing required column '{}'", column.header()),
                )
            })?;
        }

        let cell_at = |row: &[Cell], idx: usize| row.get(idx).cloned().unwrap_or(Cell::Empty);

        let records = rows
            .iter()
            .filter(|row| row.iter().any(|c| *c != Cell::Empty))
            .map(|row| WideAllocationRecord {
                tipo: cell_at(row, dimension_idx[0]).as_text(),
                categoria: cell_at(row, dimension_idx[1]).as_text(),
                alocacao: cell_at(row, dimension_idx[2]).as_text(),
                values: date_columns
                    .iter()
                    .map(|(idx, _)| cell_at(row, *idx).as_number())
                    .collect(),
            })
            .collect();

        Self::new(date_columns.into_iter().map(|(_, d)| d).collect(), records)
    }

    pub fn dates(&self) -> &[TimePoint] {
        &self.dates
    }

    pub fn records(&self) -> &[WideAllocationRecord] {
        &self.records
    }

    /// Unpivot into long points, dropping missing and non-positive values.
    ///
    /// Points come out date-major: every row's point for the first date
    /// column, then the second, and so on. First-seen order of a dimension
    /// over this output (the default Alocação choice) therefore puts an
    /// allocation that only starts holding later after the ones that existed
    /// before it, whatever its row position.
    pub fn to_long(&self) -> Vec<LongAllocationPoint> {
        let mut seen = HashSet::new();
        let duplicates = self
            .records
            .iter()
            .filter(|r| !seen.insert((&r.tipo, &r.categoria, &r.alocacao)))
            .count();
        if duplicates > 0 {
            debug!(
                "{} duplicate (Tipo, Categoria, Alocação) rows kept; they sum when aggregated",
                duplicates
            );
        }

        let mut points = Vec::with_capacity(self.records.len() * self.dates.len());
        for (idx, date) in self.dates.iter().enumerate() {
            for record in &self.records {
                let Some(valor) = record.values.get(idx).copied().flatten() else {
                    continue;
                };
                if valor <= Decimal::ZERO {
                    continue;
                }
                points.push(LongAllocationPoint {
                    tipo: record.tipo.clone(),
                    categoria: record.categoria.clone(),
                    alocacao: record.alocacao.clone(),
                    date: *date,
                    valor,
                });
            }
        }

        debug!(
            "Reshaped {} rows x {} dates into {} points",
            self.records.len(),
            self.dates.len(),
            points.len()
        );
        points
    }
}

/// Validate a raw wide grid and unpivot it in one step
pub fn reshape(
    header: &[ColumnHeader],
    rows: &[Vec<Cell>],
) -> Result<Vec<LongAllocationPoint>, DashboardError> {
    Ok(WideAllocationTable::from_grid(header, rows)?.to_long())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> TimePoint {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn header() -> Vec<ColumnHeader> {
        vec![
            ColumnHeader::Text("Tipo".to_string()),
            ColumnHeader::Text("Categoria".to_string()),
            ColumnHeader::Text("Alocação".to_string()),
            ColumnHeader::Date(date(2024, 1, 31)),
            ColumnHeader::Date(date(2024, 2, 29)),
        ]
    }

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn test_reshape_drops_missing_zero_and_negative() {
        let rows = vec![
            vec![
                text("Renda Fixa"),
                text("Pós"),
                text("CDB"),
                Cell::Number(dec!(1000)),
                Cell::Number(dec!(0)),
            ],
            vec![
                text("Renda Variável"),
                text("Ações"),
                text("PETR4"),
                Cell::Empty,
                Cell::Number(dec!(-5)),
            ],
            vec![
                text("Renda Variável"),
                text("FII"),
                text("HGLG11"),
                Cell::Number(dec!(300)),
                Cell::Number(dec!(350)),
            ],
        ];

        let points = reshape(&header(), &rows).unwrap();
        assert_eq!(points.len(), 3);
        assert!(points.iter().all(|p| p.valor > Decimal::ZERO));
        assert!(points.len() <= rows.len() * 2);

        let cdb: Vec<_> = points
            .iter()
            .filter(|p| p.alocacao.as_deref() == Some("CDB"))
            .collect();
        assert_eq!(cdb.len(), 1);
        assert_eq!(cdb[0].date, date(2024, 1, 31));
    }

    #[test]
    fn test_points_are_date_major() {
        let rows = vec![
            vec![
                text("RF"),
                text("Pós"),
                text("NOVA"),
                Cell::Empty,
                Cell::Number(dec!(10)),
            ],
            vec![
                text("RF"),
                text("Pós"),
                text("ANTIGA"),
                Cell::Number(dec!(5)),
                Cell::Number(dec!(5)),
            ],
        ];
        let points = reshape(&header(), &rows).unwrap();
        let order: Vec<(&str, TimePoint)> = points
            .iter()
            .map(|p| (p.alocacao.as_deref().unwrap(), p.date))
            .collect();
        assert_eq!(
            order,
            vec![
                ("ANTIGA", date(2024, 1, 31)),
                ("NOVA", date(2024, 2, 29)),
                ("ANTIGA", date(2024, 2, 29)),
            ]
        );
    }

    #[test]
    fn test_reshape_without_date_columns_is_schema_error() {
        let header = vec![
            ColumnHeader::Text("Tipo".to_string()),
            ColumnHeader::Text("Categoria".to_string()),
            ColumnHeader::Text("Alocação".to_string()),
            ColumnHeader::Text("Observação".to_string()),
        ];
        let err = reshape(&header, &[]).unwrap_err();
        assert!(err.is_schema_error());
        assert!(err.to_string().contains("no date-valued columns"));
    }

    #[test]
    fn test_reshape_missing_dimension_is_schema_error() {
        let header = vec![
            ColumnHeader::Text("Tipo".to_string()),
            ColumnHeader::Text("Alocação".to_string()),
            ColumnHeader::Date(date(2024, 1, 31)),
        ];
        let err = reshape(&header, &[]).unwrap_err();
        assert!(err.is_schema_error());
        assert!(err.to_string().contains("Categoria"));
    }

    #[test]
    fn test_duplicate_triples_are_kept() {
        let rows = vec![
            vec![
                text("RF"),
                text("Pós"),
                text("CDB"),
                Cell::Number(dec!(100)),
                Cell::Empty,
            ],
            vec![
                text("RF"),
                text("Pós"),
                text("CDB"),
                Cell::Number(dec!(50)),
                Cell::Empty,
            ],
        ];
        let points = reshape(&header(), &rows).unwrap();
        assert_eq!(points.len(), 2);
        let total: Decimal = points.iter().map(|p| p.valor).sum();
        assert_eq!(total, dec!(150));
    }

    #[test]
    fn test_new_rejects_ragged_records() {
        let record = WideAllocationRecord {
            tipo: Some("RF".to_string()),
            categoria: None,
            alocacao: None,
            values: vec![Some(dec!(1))],
        };
        let err =
            WideAllocationTable::new(vec![date(2024, 1, 31), date(2024, 2, 29)], vec![record])
                .unwrap_err();
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let rows = vec![vec![Cell::Empty, Cell::Empty, Cell::Empty, Cell::Empty, Cell::Empty]];
        let table = WideAllocationTable::from_grid(&header(), &rows).unwrap();
        assert!(table.records().is_empty());
        assert!(table.to_long().is_empty());
    }
}
