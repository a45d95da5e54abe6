//! Error handling for Carteira
//!
//! Defines the typed errors raised by the loader and the engine, and
//! establishes a unified Result type using anyhow for context chaining at
//! the application layer.

use thiserror::Error;

/// Core error types for dashboard operations
#[derive(Error, Debug)]
pub enum DashboardError {
    /// A required column (or the set of date-valued columns) is absent.
    /// Fatal: aborts the current view.
    #[error("schema error in '{table}': {detail}")]
    SchemaError { table: String, detail: String },

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("workbook error: {0}")]
    WorkbookError(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    pub fn schema(table: impl Into<String>, detail: impl Into<String>) -> Self {
        DashboardError::SchemaError {
            table: table.into(),
            detail: detail.into(),
        }
    }

    pub fn is_schema_error(&self) -> bool {
        matches!(self, DashboardError::SchemaError { .. })
    }
}

/// Result type alias for application-level operations
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_names_table_and_detail() {
        let err = DashboardError::schema("data_port_historico", "no date-valued columns");
        assert_eq!(
            err.to_string(),
            "schema error in 'data_port_historico': no date-valued columns"
        );
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_anyhow_context_keeps_schema_error_downcastable() {
        use anyhow::Context;
        let result: Result<()> = Err(DashboardError::schema("data_mes", "missing column 'date'"))
            .context("failed to load workbook");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("failed to load workbook"));
        let inner = err.downcast_ref::<DashboardError>().expect("typed error in chain");
        assert!(inner.is_schema_error());
    }

    #[test]
    fn test_error_variants_are_readable() {
        assert!(DashboardError::ParseError("x".to_string())
            .to_string()
            .starts_with("parse error"));
        assert!(DashboardError::WorkbookError("x".to_string())
            .to_string()
            .starts_with("workbook error"));
        assert!(DashboardError::ConfigError("x".to_string())
            .to_string()
            .starts_with("config error"));
    }
}
