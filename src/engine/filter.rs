//! Set-membership and substring filtering over typed rows

use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::{EmptyReason, EmptyResultWarning, Row};

/// Case-insensitive substring predicate, OR-ed across `columns`
#[derive(Debug, Clone, PartialEq, Eq)]
struct Search<C> {
    needle: String,
    columns: Vec<C>,
}

/// Conjunction of per-column allowed sets plus an optional search predicate.
///
/// A column with no entry is unconstrained. A column whose allowed set is
/// empty rejects every row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec<C: Ord> {
    allowed: BTreeMap<C, BTreeSet<String>>,
    search: Option<Search<C>>,
}

impl<C: Ord> Default for FilterSpec<C> {
    fn default() -> Self {
        Self {
            allowed: BTreeMap::new(),
            search: None,
        }
    }
}

impl<C: Copy + Ord + std::fmt::Display> FilterSpec<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict `column` to `values`, replacing any previous set for it
    pub fn allow<I, S>(mut self, column: C, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed
            .insert(column, values.into_iter().map(Into::into).collect());
        self
    }

    /// Add a case-insensitive substring search over `columns`.
    /// A blank needle leaves the filter without a search predicate.
    pub fn search(mut self, needle: &str, columns: &[C]) -> Self {
        let needle = needle.trim();
        self.search = if needle.is_empty() {
            None
        } else {
            Some(Search {
                needle: needle.to_lowercase(),
                columns: columns.to_vec(),
            })
        };
        self
    }

    fn empty_selections(&self) -> Vec<String> {
        self.allowed
            .iter()
            .filter(|(_, values)| values.is_empty())
            .map(|(column, _)| column.to_string())
            .collect()
    }

    fn matches<R: Row<Column = C>>(&self, row: &R) -> bool {
        let members = self
            .allowed
            .iter()
            .all(|(column, values)| values.contains(row.label(*column)));
        if !members {
            return false;
        }
        match &self.search {
            None => true,
            Some(search) => search.columns.iter().any(|column| {
                row.text(*column)
                    .map(|text| text.to_lowercase().contains(&search.needle))
                    .unwrap_or(false)
            }),
        }
    }

    /// Return the rows satisfying every predicate as a new table
    pub fn apply<R: Row<Column = C> + Clone>(&self, rows: &[R]) -> Filtered<R> {
        let empty_columns = self.empty_selections();
        if !empty_columns.is_empty() {
            debug!("Empty selection for {:?}; rejecting all rows", empty_columns);
            return Filtered {
                rows: Vec::new(),
                warning: Some(EmptyResultWarning::new(EmptyReason::EmptySelection {
                    columns: empty_columns,
                })),
            };
        }

        if rows.is_empty() {
            return Filtered {
                rows: Vec::new(),
                warning: Some(EmptyResultWarning::new(EmptyReason::NoSourceRows)),
            };
        }

        let kept: Vec<R> = rows.iter().filter(|r| self.matches(*r)).cloned().collect();
        debug!("Filter kept {} of {} rows", kept.len(), rows.len());

        let warning = if kept.is_empty() {
            Some(EmptyResultWarning::new(EmptyReason::NoMatchingRows))
        } else {
            None
        };
        Filtered {
            rows: kept,
            warning,
        }
    }
}

/// Filter output: the kept rows and, when there are none, the reason why
#[derive(Debug, Clone, PartialEq)]
pub struct Filtered<R> {
    rows: Vec<R>,
    warning: Option<EmptyResultWarning>,
}

impl<R> Filtered<R> {
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn warning(&self) -> Option<&EmptyResultWarning> {
        self.warning.as_ref()
    }

    /// Split into rows or the empty-state warning
    pub fn into_result(self) -> Result<Vec<R>, EmptyResultWarning> {
        if self.rows.is_empty() {
            if let Some(warning) = self.warning {
                return Err(warning);
            }
        }
        Ok(self.rows)
    }
}

/// Distinct labels of `column` in first-seen order (the multi-select domain)
pub fn distinct_values<R: Row>(rows: &[R], column: R::Column) -> Vec<String> {
    rows.iter()
        .map(|r| r.label(column).to_string())
        .unique()
        .collect()
}
