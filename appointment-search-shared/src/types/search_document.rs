//! Search document types.
//!
//! This module defines the flat document written to the search engine. The
//! document has a fixed set of core fields and a map of typed dynamic fields;
//! backends decide how dynamic field names and types are laid out on the wire.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Geographic location attached to a document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoLocation {
    pub address: String,
    pub longitude: f64,
    pub latitude: f64,
    /// Free text shown on map markers, e.g. `appointment-3/10`.
    pub label: String,
}

/// Typed value of a dynamic field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Exact-match string, not tokenized by the search engine.
    String(String),
    /// Signed integer value.
    Long(i64),
    /// Local date-time value.
    Date(NaiveDateTime),
    /// Geographic point with its address.
    Geo(GeoLocation),
}

/// Document representation for the search index.
///
/// # Fields
///
/// - `uid`: Resource uid (`<resource id>_<type short name>`), unique per site
/// - `url`: Link to the resource in the front office
/// - `doc_type`: Type short name (`appointment` or `appointment-slot`)
/// - `site`: Name of the site the document belongs to
/// - `date`: Date used for sorting and faceting
/// - `hie_date`: Date hierarchy string (`YYYY/MM/DD`)
/// - `dynamic_fields`: Additional typed fields keyed by base name
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchDocument {
    pub uid: String,
    pub url: String,
    pub doc_type: String,
    pub site: String,
    pub title: String,
    pub summary: String,
    pub role: String,
    pub content: String,
    pub xml_content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hie_date: Option<String>,
    #[serde(default)]
    pub dynamic_fields: BTreeMap<String, FieldValue>,
}

impl SearchDocument {
    /// Add a string field that the search engine must not analyse.
    pub fn add_dynamic_field_not_analysed(&mut self, name: &str, value: impl Into<String>) {
        self.dynamic_fields
            .insert(name.to_string(), FieldValue::String(value.into()));
    }

    /// Add a numeric field.
    pub fn add_dynamic_field_long(&mut self, name: &str, value: i64) {
        self.dynamic_fields
            .insert(name.to_string(), FieldValue::Long(value));
    }

    /// Add a date field.
    pub fn add_dynamic_field_date(&mut self, name: &str, value: NaiveDateTime) {
        self.dynamic_fields
            .insert(name.to_string(), FieldValue::Date(value));
    }

    /// Add a geolocation field.
    pub fn add_dynamic_field_geoloc(
        &mut self,
        name: &str,
        address: &str,
        longitude: f64,
        latitude: f64,
        label: impl Into<String>,
    ) {
        self.dynamic_fields.insert(
            name.to_string(),
            FieldValue::Geo(GeoLocation {
                address: address.to_string(),
                longitude,
                latitude,
                label: label.into(),
            }),
        );
    }

    /// Look up a dynamic field by base name.
    pub fn dynamic_field(&self, name: &str) -> Option<&FieldValue> {
        self.dynamic_fields.get(name)
    }

    /// Numeric value of a dynamic field, if present and numeric.
    pub fn long_field(&self, name: &str) -> Option<i64> {
        match self.dynamic_fields.get(name) {
            Some(FieldValue::Long(value)) => Some(*value),
            _ => None,
        }
    }

    /// String value of a dynamic field, if present and a string.
    pub fn string_field(&self, name: &str) -> Option<&str> {
        match self.dynamic_fields.get(name) {
            Some(FieldValue::String(value)) => Some(value.as_str()),
            _ => None,
        }
    }
}
