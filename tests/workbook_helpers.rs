#![allow(dead_code)]

use assert_cmd::cargo;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet, XlsxError};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A cell of a fixture sheet
pub enum V<'a> {
    S(&'a str),
    N(f64),
    /// `YYYY-MM-DD` written as a real date cell, the way pandas exports them
    D(&'a str),
    Blank,
}

fn write_sheet(sheet: &mut Worksheet, name: &str, rows: &[Vec<V>]) -> Result<(), XlsxError> {
    sheet.set_name(name)?;
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            match value {
                V::S(text) => {
                    sheet.write_string(r as u32, c as u16, *text)?;
                }
                V::N(number) => {
                    sheet.write_number(r as u32, c as u16, *number)?;
                }
                V::D(date) => {
                    let datetime = ExcelDateTime::parse_from_str(date)?;
                    sheet.write_datetime_with_format(r as u32, c as u16, &datetime, &date_format)?;
                }
                V::Blank => {}
            }
        }
    }
    Ok(())
}

fn header(names: &[&'static str]) -> Vec<V<'static>> {
    names.iter().map(|n| V::S(*n)).collect()
}

pub fn monthly_rows() -> Vec<Vec<V<'static>>> {
    vec![
        header(&[
            "date",
            "vlr_investido",
            "vlr_mercado",
            "twr_acc",
            "ibov_acc",
            "selic_acc",
            "fluxo_acc",
        ]),
        // out of order on purpose: the loader sorts by date
        vec![
            V::S("2024-02-29"),
            V::N(2000.0),
            V::N(2300.0),
            V::N(0.15),
            V::N(0.05),
            V::N(0.02),
            V::N(2000.0),
        ],
        vec![
            V::S("2024-01-31"),
            V::N(1000.0),
            V::N(1010.0),
            V::N(0.01),
            V::N(0.03),
            V::N(0.01),
            V::N(1000.0),
        ],
    ]
}

pub fn annual_rows() -> Vec<Vec<V<'static>>> {
    vec![
        header(&[
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
            "fluxo_acc",
        ]),
        vec![
            V::S("2023-12-31"),
            V::N(800.0),
            V::N(850.0),
            V::N(0.06),
            V::N(0.06),
            V::N(0.2),
            V::N(0.2),
            V::N(0.13),
            V::N(0.13),
            V::N(50.0),
            V::N(800.0),
        ],
        vec![
            V::S("2024-12-31"),
            V::N(2000.0),
            V::N(2300.0),
            V::N(0.15),
            V::N(0.085),
            V::N(0.05),
            V::N(-0.1),
            V::N(0.24),
            V::N(0.11),
            V::N(300.0),
            V::N(2000.0),
        ],
    ]
}

pub fn historical_rows() -> Vec<Vec<V<'static>>> {
    vec![
        vec![
            V::S("Tipo"),
            V::S("Categoria"),
            V::S("Alocação"),
            V::D("2024-01-31"),
            V::D("2024-02-29"),
        ],
        vec![V::S("RF"), V::S("Pós"), V::S("CDB"), V::N(100.0), V::N(150.0)],
        vec![V::S("RF"), V::S("Pré"), V::S("LTN"), V::N(50.0), V::Blank],
        vec![V::S("RV"), V::S("Ações"), V::S("BOVA11"), V::N(200.0), V::N(250.0)],
        vec![V::S("RV"), V::S("FII"), V::S("HGLG11"), V::N(0.0), V::N(100.0)],
    ]
}

pub fn position_rows() -> Vec<Vec<V<'static>>> {
    vec![
        header(&[
            "ativo",
            "Nome",
            "Tipo",
            "classe",
            "setor",
            "vlr_investido",
            "vlr_mercado",
            "lucro_total",
            "lucro_total_pct",
            "xirr",
        ]),
        vec![
            V::S("ITUB4"),
            V::S("Itaú Unibanco"),
            V::S("Ações"),
            V::S("Bancos"),
            V::S("Financeiro"),
            V::N(100.0),
            V::N(50.0),
            V::N(-50.0),
            V::N(-50.0),
            V::N(10.0),
        ],
        vec![
            V::S("BBAS3"),
            V::S("Banco do Brasil"),
            V::S("Ações"),
            V::S("Bancos"),
            V::S("Financeiro"),
            V::N(300.0),
            V::N(30.0),
            V::N(-270.0),
            V::N(-90.0),
            V::N(20.0),
        ],
        vec![
            V::S("HGLG11"),
            V::S("CSHG Logística"),
            V::S("FII"),
            V::S("Tijolo"),
            V::S("Logística"),
            V::N(20.0),
            V::N(20.0),
            V::N(0.0),
            V::N(0.0),
            V::Blank,
        ],
    ]
}

/// The four dashboard sheets with the default fixture rows
pub fn default_sheets() -> Vec<(&'static str, Vec<Vec<V<'static>>>)> {
    vec![
        ("data_mes", monthly_rows()),
        ("data_ano", annual_rows()),
        ("data_port_historico", historical_rows()),
        ("data_port_mes", position_rows()),
    ]
}

/// Write `sheets` in order to a new workbook
pub fn write_sheets(
    path: &Path,
    sheets: &[(&str, Vec<Vec<V<'static>>>)],
) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let sheet = workbook.add_worksheet();
        write_sheet(sheet, name, rows)?;
    }
    workbook.save(path)
}

/// Write a workbook with the four dashboard sheets, leaving out `skip`
pub fn write_workbook(path: &Path, skip: Option<&str>) -> Result<(), XlsxError> {
    let sheets: Vec<_> = default_sheets()
        .into_iter()
        .filter(|(name, _)| Some(*name) != skip)
        .collect();
    write_sheets(path, &sheets)
}

/// Same as [`write_workbook`] with a custom positions sheet
pub fn write_workbook_with_positions(
    path: &Path,
    positions: Vec<Vec<V<'static>>>,
) -> Result<(), XlsxError> {
    let mut sheets = default_sheets();
    sheets[3].1 = positions;
    write_sheets(path, &sheets)
}

/// Temp directory holding a complete `datainvest.xlsx`
pub fn fixture_workbook() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("datainvest.xlsx");
    write_workbook(&path, None).expect("failed to write fixture workbook");
    (dir, path)
}

/// The binary with an isolated HOME and config dir, no colours
pub fn base_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("carteira"));
    cmd.env("HOME", home);
    cmd.env("XDG_CONFIG_HOME", home.join(".config"));
    cmd.env_remove("CARTEIRA_WORKBOOK");
    cmd.env_remove("RUST_LOG");
    cmd.arg("--no-color");
    cmd
}
