//! Configuration and dependency wiring for the appointment indexer.

mod dependencies;
mod settings;

pub use dependencies::{ConnectionMode, Dependencies};
pub use settings::{CoordinatorConfig, IndexerConfig, SiteConfig};
