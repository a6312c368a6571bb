//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (Solr, in-memory mocks, etc.).

use async_trait::async_trait;

use appointment_search_shared::SearchDocument;

use crate::errors::SearchIndexError;
use crate::types::{BatchOperationSummary, DeleteQuery};

/// Abstracts the underlying search index implementation.
///
/// Implementations are shared behind an `Arc` between the indexer and the
/// reindex coordinator tasks, so they must be `Send + Sync`.
///
/// # Note on Document Creation
///
/// There is no separate `update` function: documents are keyed by their uid,
/// so writing a document with an existing uid replaces the stored one.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Check that the backend answers before any document operation.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index is ready for use
    /// * `Err(SearchIndexError)` - If the backend cannot be reached
    async fn ensure_ready(&self) -> Result<(), SearchIndexError>;

    /// Write a batch of documents, replacing any document with the same uid.
    ///
    /// Documents are written sequentially; there is no multi-document
    /// transaction. A failure on one part of the batch does not roll back the
    /// parts already written.
    ///
    /// # Arguments
    ///
    /// * `documents` - The documents to write
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Per-document outcome
    /// * `Err(SearchIndexError)` - If the batch could not be sent at all
    async fn write_documents(
        &self,
        documents: &[SearchDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError>;

    /// Delete every document matching the query.
    ///
    /// Deleting documents that do not exist is a success.
    async fn delete_by_query(&self, query: &DeleteQuery) -> Result<(), SearchIndexError>;

    /// Write a single document.
    async fn write_document(&self, document: &SearchDocument) -> Result<(), SearchIndexError> {
        let summary = self.write_documents(std::slice::from_ref(document)).await?;
        match summary.results.into_iter().find(|r| !r.success) {
            Some(failed) => Err(failed
                .error
                .unwrap_or_else(|| SearchIndexError::write(document.uid.clone()))),
            None => Ok(()),
        }
    }
}
