//! Ingestion pipeline for the Placemill extraction engine.
//!
//! Responsibilities:
//! - Decode `.osm.pbf` extracts into an ordered entity stream.
//! - Load the taxonomy vocabulary assets from disk.
//! - Drive entities through inspection into place records.
//! - Persist records idempotently in batches.
//!
//! Boundaries:
//! - Domain rules (classification, normalization, geometry) live in
//!   `placemill-core`; this crate only orchestrates them.
//! - The core runs a single forward pass: the position cache requires points
//!   to be seen before the areas that reference them.

mod assets;
mod cache;
mod crs;
mod entity;
mod inspect;
mod pbf;
mod sink;
mod stream;

pub use assets::{TaxonomyAssetError, load_taxonomy};
pub use cache::{Position, PositionCache};
pub use crs::{BOUND_LAT, BOUND_LON, within_window};
pub use entity::{AreaEntity, PointEntity, RawEntity};
pub use inspect::{InspectError, Inspector};
pub use pbf::{ExtractError, ExtractReader};
pub use sink::{MemoryPlaceSink, PlaceSink, SinkOpenError, SqlitePlaceSink};
pub use stream::{BoundingBox, PipelineError, PlaceStream};
