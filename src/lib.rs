//! Carteira - personal investment dashboard engine
//!
//! Loads the portfolio workbook (monthly and annual series, historical
//! allocations, current positions) and turns it into filterable, aggregated
//! and hierarchical views ready for charting or terminal display.

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod loader;
pub mod models;
pub mod reports;
pub mod utils;
