//! Mapper module for the appointment indexer.
//!
//! Turns booking snapshots (forms and slots) into search documents.

mod consecutive;
mod document_mapper;
mod resource;

pub use consecutive::{affected_predecessors, consecutive_count};
pub use document_mapper::{aggregate_places, hie_date, DocumentMapper};
pub use resource::{
    build_resource_uid, form_uid, form_url, iso_local_date_time, site_form_uid, slot_resource_id,
    slot_uid, slot_url, ResourceType, SHORT_NAME_APPOINTMENT, SHORT_NAME_SLOT,
};
