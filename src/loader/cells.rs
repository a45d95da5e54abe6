//! Cell-level conversions from calamine values

use anyhow::{anyhow, Context, Result};
use calamine::Data;
use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::engine::{Cell, ColumnHeader};

/// Parse date from various formats (Excel serials, ISO and Brazilian text)
pub fn parse_date(cell: &Data) -> Result<NaiveDate> {
    match cell {
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()),
        Data::Float(f) => excel_serial_to_date(*f),
        Data::Int(i) => excel_serial_to_date(*i as f64),
        Data::DateTimeIso(s) => parse_date_text(s),
        _ => parse_date_text(&cell.to_string()),
    }
}

fn excel_serial_to_date(serial: f64) -> Result<NaiveDate> {
    let days_since_epoch = serial.floor() as i64;
    let excel_epoch =
        NaiveDate::from_ymd_opt(1899, 12, 30).ok_or_else(|| anyhow!("Invalid Excel epoch"))?;
    excel_epoch
        .checked_add_signed(chrono::Duration::days(days_since_epoch))
        .ok_or_else(|| anyhow!("Date overflow"))
}

/// Parse `YYYY-MM-DD` (optionally followed by a time), `DD/MM/YYYY` or `DD-MM-YYYY`
pub fn parse_date_text(text: &str) -> Result<NaiveDate> {
    let text = text.trim();
    let date_part = text.get(..10).unwrap_or(text);

    if let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%d/%m/%Y") {
        return Ok(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%d-%m-%Y") {
        return Ok(date);
    }

    Err(anyhow!("Could not parse date: {}", text))
}

/// Parse decimal from cell (handles numbers and strings in Brazilian format).
/// Returns `Ok(None)` for an empty cell.
pub fn parse_decimal(cell: &Data) -> Result<Option<Decimal>> {
    match cell {
        Data::Empty => Ok(None),
        Data::Int(i) => Ok(Some(Decimal::from(*i))),
        Data::Float(f) => Decimal::from_f64(*f)
            .map(Some)
            .ok_or_else(|| anyhow!("Invalid decimal: {}", f)),
        Data::String(s) => parse_decimal_text(s),
        other => Err(anyhow!("Expected a number, found '{}'", other)),
    }
}

/// Text that spreadsheets use in place of a value that could not be computed
const MISSING_MARKERS: [&str; 5] = ["-", "n/a", "na", "nan", "#n/a"];

fn is_missing_marker(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    MISSING_MARKERS.contains(&text.as_str())
}

/// Like [`parse_decimal`], but Excel errors (`#NUM!`, `#DIV/0!`) and
/// placeholder text such as `-` or `N/A` read as a missing value
pub fn parse_sparse_decimal(cell: &Data) -> Result<Option<Decimal>> {
    match cell {
        Data::Error(_) => Ok(None),
        Data::String(s) if is_missing_marker(s) => Ok(None),
        other => parse_decimal(other),
    }
}

/// `1.234,56`, `R$ 1.234,56`, `1234.56` and `-0,5` are all accepted
pub fn parse_decimal_text(text: &str) -> Result<Option<Decimal>> {
    let cleaned = text.replace("R$", "").replace(' ', "");
    if cleaned.is_empty() {
        return Ok(None);
    }

    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };

    Decimal::from_str(&normalized)
        .map(Some)
        .with_context(|| format!("Failed to parse decimal '{}'", text))
}

/// Trimmed text of a cell, `None` when blank
pub fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        other => {
            let text = other.to_string();
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
    }
}

/// Header of the historical sheet: dates become value columns
pub fn to_column_header(cell: &Data) -> ColumnHeader {
    match cell {
        Data::DateTime(_) | Data::DateTimeIso(_) => match parse_date(cell) {
            Ok(date) => ColumnHeader::Date(date),
            Err(_) => ColumnHeader::Text(cell.to_string()),
        },
        Data::String(s) => match parse_date_text(s) {
            Ok(date) => ColumnHeader::Date(date),
            Err(_) => ColumnHeader::Text(s.trim().to_string()),
        },
        other => ColumnHeader::Text(other.to_string()),
    }
}

/// Body cell of the historical sheet
pub fn to_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Int(_) | Data::Float(_) => match parse_decimal(cell) {
            Ok(Some(value)) => Cell::Number(value),
            _ => Cell::Empty,
        },
        Data::String(s) if is_missing_marker(s) => Cell::Empty,
        Data::String(s) => match parse_decimal_text(s) {
            Ok(Some(value)) => Cell::Number(value),
            Ok(None) => Cell::Empty,
            Err(_) => Cell::Text(s.trim().to_string()),
        },
        other => Cell::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{CellErrorType, ExcelDateTime, ExcelDateTimeType};
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_decimal_brazilian_format() {
        let result = parse_decimal(&Data::String("1.234,56".to_string())).unwrap();
        assert_eq!(result, Some(dec!(1234.56)));

        let result = parse_decimal(&Data::String("R$ 10,5".to_string())).unwrap();
        assert_eq!(result, Some(dec!(10.5)));
    }

    #[test]
    fn test_parse_decimal_plain_and_numeric() {
        assert_eq!(
            parse_decimal(&Data::String("1234.56".to_string())).unwrap(),
            Some(dec!(1234.56))
        );
        assert_eq!(parse_decimal(&Data::Int(7)).unwrap(), Some(dec!(7)));
        assert_eq!(parse_decimal(&Data::Float(0.25)).unwrap(), Some(dec!(0.25)));
        assert_eq!(parse_decimal(&Data::Empty).unwrap(), None);
        assert!(parse_decimal(&Data::String("abc".to_string())).is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert_eq!(parse_date(&Data::String("15/03/2025".to_string())).unwrap(), expected);
        assert_eq!(parse_date(&Data::String("2025-03-15".to_string())).unwrap(), expected);
        assert_eq!(
            parse_date(&Data::DateTimeIso("2025-03-15T00:00:00".to_string())).unwrap(),
            expected
        );
        // 45731 is 2025-03-15 in the 1900 date system
        assert_eq!(parse_date(&Data::Float(45731.0)).unwrap(), expected);
    }

    #[test]
    fn test_header_detection() {
        assert_eq!(
            to_column_header(&Data::String("2024-01-31".to_string())),
            ColumnHeader::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
        );
        assert_eq!(
            to_column_header(&Data::String(" Tipo ".to_string())),
            ColumnHeader::Text("Tipo".to_string())
        );
        assert_eq!(
            to_column_header(&Data::Int(2024)),
            ColumnHeader::Text("2024".to_string())
        );
    }

    #[test]
    fn test_datetime_header_is_date_column() {
        // 45322 is 2024-01-31 in the 1900 date system
        let header = Data::DateTime(ExcelDateTime::new(
            45322.0,
            ExcelDateTimeType::DateTime,
            false,
        ));
        assert_eq!(
            to_column_header(&header),
            ColumnHeader::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
        );
    }

    #[test]
    fn test_sparse_decimal_markers_and_errors() {
        assert_eq!(parse_sparse_decimal(&Data::Error(CellErrorType::Num)).unwrap(), None);
        assert_eq!(parse_sparse_decimal(&Data::Error(CellErrorType::NA)).unwrap(), None);
        for marker in ["-", "N/A", " n/a ", "#N/A", "NaN"] {
            assert_eq!(
                parse_sparse_decimal(&Data::String(marker.to_string())).unwrap(),
                None,
                "{}",
                marker
            );
        }
        assert_eq!(
            parse_sparse_decimal(&Data::String("12,5".to_string())).unwrap(),
            Some(dec!(12.5))
        );
        assert!(parse_sparse_decimal(&Data::String("abc".to_string())).is_err());

        // the strict parser still rejects them
        assert!(parse_decimal(&Data::Error(CellErrorType::Num)).is_err());
        assert!(parse_decimal(&Data::String("-".to_string())).is_err());
    }

    #[test]
    fn test_body_cells() {
        assert_eq!(to_cell(&Data::Float(12.5)), Cell::Number(dec!(12.5)));
        assert_eq!(to_cell(&Data::String("".to_string())), Cell::Empty);
        assert_eq!(to_cell(&Data::String("CDB".to_string())), Cell::Text("CDB".to_string()));
        assert_eq!(cell_text(&Data::String("  ".to_string())), None);
        assert_eq!(to_cell(&Data::String("-".to_string())), Cell::Empty);
    }
}
