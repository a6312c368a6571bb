//! HTTP booking source implementation.
//!
//! Reads forms, slots and categories from the booking backend's JSON API:
//!
//! - `GET {base}/forms?active=true`
//! - `GET {base}/forms/{id}`
//! - `GET {base}/forms/{id}/slots?start=YYYY-MM-DD&end=YYYY-MM-DD`
//! - `GET {base}/slots/{id}`
//! - `GET {base}/categories/{id}`

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use appointment_search_shared::{Form, Slot};

use crate::errors::BookingError;
use crate::source::BookingSource;

#[derive(Debug, Deserialize)]
struct Category {
    label: String,
}

/// Booking source backed by the booking backend's JSON API.
pub struct HttpBookingSource {
    client: Client,
    base_url: Url,
}

impl HttpBookingSource {
    /// Create a new source for the given API base URL.
    pub fn new(base_url: &str) -> Result<Self, BookingError> {
        // A trailing slash makes `Url::join` append instead of replacing the last segment.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|e| BookingError::request(e.to_string()))?;
        let client = Client::builder()
            .build()
            .map_err(|e| BookingError::request(e.to_string()))?;

        info!(base_url = %base_url, "Created booking source");

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BookingError> {
        self.base_url
            .join(path)
            .map_err(|e| BookingError::request(e.to_string()))
    }

    /// GET a JSON resource, mapping 404 to `None`.
    async fn get_optional<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, BookingError> {
        let response = self.client.get(url.clone()).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(url = %url, "Booking resource not found");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(BookingError::request(format!(
                "GET {} failed with status {}",
                url,
                response.status()
            )));
        }

        Ok(Some(response.json::<T>().await?))
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, BookingError> {
        let display = url.to_string();
        self.get_optional(url)
            .await?
            .ok_or_else(|| BookingError::not_found(display))
    }
}

#[async_trait]
impl BookingSource for HttpBookingSource {
    async fn active_forms(&self) -> Result<Vec<Form>, BookingError> {
        let mut url = self.endpoint("forms")?;
        url.query_pairs_mut().append_pair("active", "true");
        self.get(url).await
    }

    async fn find_form(&self, id_form: i32) -> Result<Option<Form>, BookingError> {
        let url = self.endpoint(&format!("forms/{}", id_form))?;
        self.get_optional(url).await
    }

    async fn find_slot(&self, id_slot: i32) -> Result<Option<Slot>, BookingError> {
        let url = self.endpoint(&format!("slots/{}", id_slot))?;
        self.get_optional(url).await
    }

    async fn build_slots(
        &self,
        id_form: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Slot>, BookingError> {
        let mut url = self.endpoint(&format!("forms/{}/slots", id_form))?;
        url.query_pairs_mut()
            .append_pair("start", &start.format("%Y-%m-%d").to_string())
            .append_pair("end", &end.format("%Y-%m-%d").to_string());
        // A form removed in the meantime has no slots left to index.
        Ok(self.get_optional(url).await?.unwrap_or_default())
    }

    async fn find_category_label(&self, id_category: i32) -> Result<Option<String>, BookingError> {
        let url = self.endpoint(&format!("categories/{}", id_category))?;
        Ok(self
            .get_optional::<Category>(url)
            .await?
            .map(|category| category.label))
    }
}
