//! Request and response types for search index operations.

use std::fmt;

use crate::errors::SearchIndexError;
use crate::utils::escape_query_value;

/// Delete-by-query request.
///
/// The query is a disjunction of exact `field:value` clauses. Values are
/// escaped when the query is rendered, so callers pass raw uids.
///
/// # Example
///
/// ```
/// use appointment_search_repository::DeleteQuery;
///
/// let query = DeleteQuery::field("uid", "site_1_appointment")
///     .or("uid_form_string", "site_1_appointment");
/// assert_eq!(
///     query.to_string(),
///     "uid:site_1_appointment OR uid_form_string:site_1_appointment"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteQuery {
    clauses: Vec<(String, String)>,
}

impl DeleteQuery {
    /// Create a query matching a single `field:value` clause.
    pub fn field(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            clauses: vec![(field.into(), value.into())],
        }
    }

    /// Add an alternative `field:value` clause.
    pub fn or(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    /// Reject queries that would match too much.
    ///
    /// An empty field or value would turn into a wildcard-like query on some
    /// backends, so both are required on every clause.
    pub fn validate(&self) -> Result<(), SearchIndexError> {
        if self.clauses.is_empty() {
            return Err(SearchIndexError::validation(
                "Delete query must have at least one clause",
            ));
        }
        for (field, value) in &self.clauses {
            if field.is_empty() || value.is_empty() {
                return Err(SearchIndexError::validation(format!(
                    "Delete query clause '{}:{}' has an empty part",
                    field, value
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for DeleteQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .clauses
            .iter()
            .map(|(field, value)| format!("{}:{}", field, escape_query_value(value)))
            .collect::<Vec<_>>()
            .join(" OR ");
        f.write_str(&rendered)
    }
}

/// Result of a batch operation for a single document.
#[derive(Debug, Clone)]
pub struct BatchOperationResult {
    /// The document uid.
    pub uid: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error if the operation failed.
    pub error: Option<SearchIndexError>,
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// Lets callers log partial failures without failing the whole batch.
#[derive(Debug, Clone, Default)]
pub struct BatchOperationSummary {
    /// Total number of documents in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each document.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    /// Record the outcome of one document.
    pub fn record(&mut self, uid: impl Into<String>, error: Option<SearchIndexError>) {
        self.total += 1;
        if error.is_some() {
            self.failed += 1;
        } else {
            self.succeeded += 1;
        }
        self.results.push(BatchOperationResult {
            uid: uid.into(),
            success: error.is_none(),
            error,
        });
    }
}
