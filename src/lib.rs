//! Facade crate for the Placemill extraction engine.
//!
//! This crate re-exports the core domain types and exposes the streaming
//! ingestion pipeline behind the `ingest` feature flag.

#![forbid(unsafe_code)]

pub use placemill_core::{
    AssociationPolicy, AssociationRule, AttributeBundle, AttributeNormalizer, EntityKind,
    Geometry, KeywordClassifier, KeywordSet, LinkExtractor, LinkedEntries, PlaceRecord,
    PlaceRecordError, Tags, Taxonomy,
};

#[cfg(feature = "ingest")]
pub use placemill_data::{
    AreaEntity, BoundingBox, ExtractError, ExtractReader, InspectError, Inspector,
    MemoryPlaceSink, PipelineError, PlaceSink, PlaceStream, PointEntity, Position,
    PositionCache, RawEntity, SqlitePlaceSink, TaxonomyAssetError, load_taxonomy,
};
