//! Solr provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the Solr JSON update handler over HTTP.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use appointment_search_shared::SearchDocument;

use crate::config::SolrConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::solr::document::{stored_uid, to_solr_json};
use crate::types::{BatchOperationSummary, DeleteQuery};

/// Solr provider implementation.
///
/// # Example
///
/// ```ignore
/// use appointment_search_repository::{SolrConfig, SolrProvider, SearchIndexProvider};
///
/// let config = SolrConfig::new("http://localhost:8983/solr", "lutece", "lutece");
/// let provider = SolrProvider::new(config)?;
/// provider.ensure_ready().await?;
/// provider.write_document(&document).await?;
/// ```
pub struct SolrProvider {
    client: Client,
    config: SolrConfig,
    update_url: Url,
    ping_url: Url,
}

impl SolrProvider {
    /// Create a new Solr provider for the configured core.
    ///
    /// # Returns
    ///
    /// * `Ok(SolrProvider)` - A new provider instance
    /// * `Err(SearchIndexError)` - If the URL is invalid or the HTTP client cannot be built
    pub fn new(config: SolrConfig) -> Result<Self, SearchIndexError> {
        let core_url = format!("{}/{}", config.url.trim_end_matches('/'), config.core);

        let mut update_url = Url::parse(&format!("{}/update", core_url))
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;
        update_url
            .query_pairs_mut()
            .append_pair("commitWithin", &config.commit_within_ms.to_string())
            .append_pair("wt", "json");

        let mut ping_url = Url::parse(&format!("{}/admin/ping", core_url))
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;
        ping_url.query_pairs_mut().append_pair("wt", "json");

        let client = Client::builder()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        info!(
            url = %config.url,
            core = %config.core,
            site = %config.site,
            "Created Solr provider"
        );

        Ok(Self {
            client,
            config,
            update_url,
            ping_url,
        })
    }

    /// Post a JSON body to the update handler and check the response.
    async fn post_update(&self, body: &Value) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .post(self.update_url.clone())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Solr update request failed");
            return Err(SearchIndexError::write(format!(
                "Update failed with status {}: {}",
                status,
                Self::error_message(&error_body)
            )));
        }

        Ok(())
    }

    /// Extract `error.msg` from a Solr error body, falling back to the raw body.
    fn error_message(body: &str) -> String {
        serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v["error"]["msg"].as_str().map(str::to_string))
            .unwrap_or_else(|| body.to_string())
    }
}

#[async_trait]
impl SearchIndexProvider for SolrProvider {
    async fn ensure_ready(&self) -> Result<(), SearchIndexError> {
        let response = self.client.get(self.ping_url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchIndexError::connection(format!(
                "Ping of core '{}' failed with status {}",
                self.config.core, status
            )));
        }

        let body: Value = response.json().await?;
        match body["status"].as_str() {
            Some("OK") => {
                debug!(core = %self.config.core, "Solr core is ready");
                Ok(())
            }
            other => Err(SearchIndexError::connection(format!(
                "Ping of core '{}' returned status {:?}",
                self.config.core, other
            ))),
        }
    }

    /// Write documents in chunks of `max_batch_size`.
    ///
    /// A failed chunk marks all of its documents as failed and the remaining
    /// chunks are still sent.
    async fn write_documents(
        &self,
        documents: &[SearchDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let mut summary = BatchOperationSummary::default();

        for chunk in documents.chunks(self.config.max_batch_size) {
            let body = Value::Array(
                chunk
                    .iter()
                    .map(|doc| to_solr_json(doc, &self.config.site))
                    .collect(),
            );

            let outcome = self.post_update(&body).await;
            for doc in chunk {
                summary.record(
                    stored_uid(&self.config.site, &doc.uid),
                    outcome.as_ref().err().cloned(),
                );
            }

            debug!(
                count = chunk.len(),
                success = outcome.is_ok(),
                "Sent document chunk to Solr"
            );
        }

        Ok(summary)
    }

    async fn delete_by_query(&self, query: &DeleteQuery) -> Result<(), SearchIndexError> {
        query.validate()?;

        let rendered = query.to_string();
        self.post_update(&json!({ "delete": { "query": rendered } }))
            .await
            .map_err(|e| SearchIndexError::delete(e.to_string()))?;

        debug!(query = %rendered, "Deleted documents by query");
        Ok(())
    }
}
