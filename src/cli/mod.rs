use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod formatters;

#[derive(Parser, Debug)]
#[command(name = "carteira")]
#[command(version, about = "Personal investment dashboard over a portfolio workbook")]
#[command(
    long_about = "Monthly and annual performance against Ibovespa and Selic, allocation evolution and current positions, computed from the datainvest.xlsx workbook."
)]
pub struct Cli {
    /// Workbook to read (overrides CARTEIRA_WORKBOOK and the config file)
    #[arg(long, global = true, value_name = "PATH")]
    pub workbook: Option<PathBuf>,

    /// Settings file (default: <config dir>/carteira/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Filter flags take comma-separated or repeated values. A flag given with no
/// value selects nothing for that dimension.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Monthly performance against the benchmarks
    Monthly,

    /// Annual performance, cumulative and per year
    Annual,

    /// Allocation evolution from the historical sheet
    Evolution {
        /// Tipo values to keep (default: all)
        #[arg(long, num_args = 0.., value_delimiter = ',')]
        tipo: Option<Vec<String>>,

        /// Categoria values to keep (default: all)
        #[arg(long, num_args = 0.., value_delimiter = ',')]
        categoria: Option<Vec<String>>,

        /// Alocação values to keep (default: the first few in the sheet)
        #[arg(long, num_args = 0.., value_delimiter = ',', conflicts_with = "all_allocations")]
        alocacao: Option<Vec<String>>,

        /// Keep every Alocação
        #[arg(long)]
        all_allocations: bool,
    },

    /// Current positions per asset
    Positions {
        /// Tipo values to keep (default: all)
        #[arg(long, num_args = 0.., value_delimiter = ',')]
        tipo: Option<Vec<String>>,

        /// classe values to keep (default: all)
        #[arg(long, num_args = 0.., value_delimiter = ',')]
        classe: Option<Vec<String>>,

        /// setor values to keep (default: all)
        #[arg(long, num_args = 0.., value_delimiter = ',')]
        setor: Option<Vec<String>>,

        /// Case-insensitive search on ticker and name
        #[arg(short, long)]
        search: Option<String>,

        /// How many of the largest positions to rank (default from settings)
        #[arg(long)]
        top: Option<usize>,
    },

    /// List the values available to each filter
    Dimensions {
        #[arg(value_enum)]
        table: DimensionTable,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionTable {
    Evolution,
    Positions,
}
