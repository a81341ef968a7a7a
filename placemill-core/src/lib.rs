//! Core domain types for the Placemill extraction engine.
//!
//! Responsibilities:
//! - Pure polygon geometry over closed rings.
//! - Controlled-vocabulary taxonomy tables and keyword classification.
//! - Normalization of free-form tags into typed attributes.
//! - The place record model and its stored document shape.
//!
//! Boundaries:
//! - No I/O; asset loading and persistence live in `placemill-data`.
//! - No global mutable state; taxonomies are constructed and injected.

use std::collections::HashMap;

pub mod attributes;
pub mod geometry;
pub mod keyword;
pub mod record;
pub mod taxonomy;

/// Free-form key/value tags attached to a source entity.
pub type Tags = HashMap<String, String>;

pub use attributes::{Address, AttributeBundle, AttributeNormalizer, Payment};
pub use keyword::{KeywordClassifier, KeywordSet};
pub use record::{
    EntityKind, Geometry, LinkExtractor, LinkedEntries, PlaceRecord, PlaceRecordError,
};
pub use taxonomy::{AssociationPolicy, AssociationRule, Taxonomy, TaxonomyBuilder};
