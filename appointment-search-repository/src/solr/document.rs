//! Solr document layout.
//!
//! Maps a `SearchDocument` to the JSON accepted by the Solr update handler.
//! Dynamic fields follow the schema's suffix conventions: `_string` for exact
//! strings, `_long` for numbers, `_date` for dates, and `_geoloc` /
//! `_geojson` / `_address_text` for geolocations.

use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use serde_json::{json, Map, Value};

use appointment_search_shared::{FieldValue, GeoLocation, SearchDocument};

/// Solr format for date fields. Always rendered in UTC.
const SOLR_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Uid as stored in Solr: the site name followed by the resource uid.
pub fn stored_uid(site: &str, uid: &str) -> String {
    format!("{}_{}", site, uid)
}

/// Render a wall-clock date-time of `zone` as a Solr UTC instant.
///
/// Ambiguous times (DST fall-back) resolve to the earliest instant. Times in
/// a DST gap do not exist in `zone` and are rendered as if already UTC.
fn format_date<Tz: TimeZone>(date: &NaiveDateTime, zone: &Tz) -> String {
    let instant = match zone.from_local_datetime(date).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => date.and_utc(),
    };
    instant.format(SOLR_DATE_FORMAT).to_string()
}

fn geojson(geo: &GeoLocation) -> String {
    json!({
        "type": "Feature",
        "geometry": {
            "type": "Point",
            "coordinates": [geo.longitude, geo.latitude],
        },
        "properties": {
            "address": geo.address,
            "type": geo.label,
        },
    })
    .to_string()
}

fn insert_dynamic_field<Tz: TimeZone>(
    fields: &mut Map<String, Value>,
    name: &str,
    value: &FieldValue,
    zone: &Tz,
) {
    match value {
        FieldValue::String(s) => {
            fields.insert(format!("{}_string", name), json!(s));
        }
        FieldValue::Long(n) => {
            fields.insert(format!("{}_long", name), json!(n));
        }
        FieldValue::Date(d) => {
            fields.insert(format!("{}_date", name), json!(format_date(d, zone)));
        }
        FieldValue::Geo(geo) => {
            fields.insert(
                format!("{}_geoloc", name),
                json!(format!("{},{}", geo.latitude, geo.longitude)),
            );
            fields.insert(format!("{}_geojson", name), json!(geojson(geo)));
            fields.insert(format!("{}_address_text", name), json!(geo.address));
        }
    }
}

/// Build the Solr JSON object for a document.
///
/// Dates of the document are wall-clock times of the host's local zone.
///
/// # Arguments
///
/// * `document` - The mapped document
/// * `site` - The site name used to prefix the uid
pub fn to_solr_json(document: &SearchDocument, site: &str) -> Value {
    to_solr_json_in_zone(document, site, &Local)
}

/// Same as [`to_solr_json`], with dates read as wall-clock times of `zone`.
pub fn to_solr_json_in_zone<Tz: TimeZone>(
    document: &SearchDocument,
    site: &str,
    zone: &Tz,
) -> Value {
    let mut fields = Map::new();
    fields.insert("uid".to_string(), json!(stored_uid(site, &document.uid)));
    fields.insert("url".to_string(), json!(document.url));
    fields.insert("type".to_string(), json!(document.doc_type));
    fields.insert("site".to_string(), json!(document.site));
    fields.insert("title".to_string(), json!(document.title));
    fields.insert("summary".to_string(), json!(document.summary));
    fields.insert("role".to_string(), json!(document.role));
    fields.insert("content".to_string(), json!(document.content));
    fields.insert("xml_content".to_string(), json!(document.xml_content));
    if !document.categories.is_empty() {
        fields.insert("categorie".to_string(), json!(document.categories));
    }
    if let Some(ref date) = document.date {
        fields.insert("date".to_string(), json!(format_date(date, zone)));
    }
    if let Some(ref hie_date) = document.hie_date {
        fields.insert("hie_date".to_string(), json!(hie_date));
    }
    for (name, value) in &document.dynamic_fields {
        insert_dynamic_field(&mut fields, name, value, zone);
    }
    Value::Object(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};

    fn document() -> SearchDocument {
        SearchDocument {
            uid: "3_appointment".to_string(),
            url: "http://localhost/jsp/site/Portal.jsp?page=appointment".to_string(),
            doc_type: "appointment".to_string(),
            site: "lutece".to_string(),
            title: "Passports".to_string(),
            role: "none".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_uid_is_prefixed_with_site() {
        let value = to_solr_json(&document(), "lutece");
        assert_eq!(value["uid"], "lutece_3_appointment");
        assert_eq!(value["type"], "appointment");
        assert!(value.get("categorie").is_none());
        assert!(value.get("date").is_none());
    }

    #[test]
    fn test_dynamic_field_suffixes() {
        let mut doc = document();
        doc.add_dynamic_field_long("appointment_nb_places", 12);
        doc.add_dynamic_field_not_analysed("appointment_active", "true");
        doc.add_dynamic_field_date(
            "first_slot",
            NaiveDate::from_ymd_opt(2024, 3, 4)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
        );

        let value = to_solr_json_in_zone(&doc, "lutece", &Utc);
        assert_eq!(value["appointment_nb_places_long"], 12);
        assert_eq!(value["appointment_active_string"], "true");
        assert_eq!(value["first_slot_date"], "2024-03-04T09:30:00Z");
    }

    #[test]
    fn test_dates_are_converted_to_utc() {
        let paris_winter = FixedOffset::east_opt(3600).unwrap();
        let mut doc = document();
        let start = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        doc.date = Some(start);
        doc.add_dynamic_field_date("first_slot", start);

        let value = to_solr_json_in_zone(&doc, "lutece", &paris_winter);
        assert_eq!(value["date"], "2024-03-04T08:30:00Z");
        assert_eq!(value["first_slot_date"], "2024-03-04T08:30:00Z");

        // Crossing midnight backwards moves the day too.
        let early = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(0, 15, 0)
            .unwrap();
        doc.date = Some(early);
        let value = to_solr_json_in_zone(&doc, "lutece", &paris_winter);
        assert_eq!(value["date"], "2024-03-03T23:15:00Z");
    }

    #[test]
    fn test_local_zone_matches_chrono_conversion() {
        let start = NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap();
        let mut doc = document();
        doc.date = Some(start);

        let expected = Local
            .from_local_datetime(&start)
            .earliest()
            .map(|local| local.with_timezone(&Utc).format(SOLR_DATE_FORMAT).to_string())
            .unwrap_or_else(|| start.and_utc().format(SOLR_DATE_FORMAT).to_string());
        assert_eq!(to_solr_json(&doc, "lutece")["date"], expected);
    }

    #[test]
    fn test_geoloc_fields() {
        let mut doc = document();
        doc.add_dynamic_field_geoloc("appointment", "Paris", 2.5, 48.5, "appointment-1/4");

        let value = to_solr_json(&doc, "lutece");
        assert_eq!(value["appointment_geoloc"], "48.5,2.5");
        assert_eq!(value["appointment_address_text"], "Paris");

        let geojson: Value =
            serde_json::from_str(value["appointment_geojson"].as_str().unwrap()).unwrap();
        assert_eq!(geojson["geometry"]["coordinates"][0], 2.5);
        assert_eq!(geojson["properties"]["type"], "appointment-1/4");
    }
}
