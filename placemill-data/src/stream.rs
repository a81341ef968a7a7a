//! Streaming assembly of place records from the ordered entity stream.

use geo::{Coord, Rect};
use log::info;
use thiserror::Error;

use placemill_core::PlaceRecord;

use crate::crs;
use crate::entity::RawEntity;
use crate::inspect::{InspectError, Inspector};
use crate::pbf::ExtractError;

/// Entities between two progress checkpoints.
const PROGRESS_INTERVAL: u64 = 100_000;

/// Normalized geographic filter for point entities.
///
/// The corners may be supplied in any order; construction sorts them so that
/// `left <= right` and `bottom <= top`. The default box covers the whole
/// coordinate validity window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    rect: Rect<f64>,
}

impl BoundingBox {
    /// Box spanning two opposite corners, supplied in any order.
    #[must_use]
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            rect: Rect::new(Coord { x: x0, y: y0 }, Coord { x: x1, y: y1 }),
        }
    }

    /// The full coordinate validity window.
    #[must_use]
    pub fn world() -> Self {
        Self::new(-crs::BOUND_LON, -crs::BOUND_LAT, crs::BOUND_LON, crs::BOUND_LAT)
    }

    /// Whether a coordinate lies inside the box, edges included.
    #[must_use]
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let min = self.rect.min();
        let max = self.rect.max();
        (min.x..=max.x).contains(&lon) && (min.y..=max.y).contains(&lat)
    }

    /// Western edge.
    #[must_use]
    pub fn left(&self) -> f64 {
        self.rect.min().x
    }

    /// Eastern edge.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.rect.max().x
    }

    /// Northern edge.
    #[must_use]
    pub fn top(&self) -> f64 {
        self.rect.max().y
    }

    /// Southern edge.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.rect.min().y
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::world()
    }
}

/// Errors that terminate the record stream.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The source extract could not be decoded further.
    #[error(transparent)]
    Extract(#[from] ExtractError),
    /// An entity violated a source invariant.
    #[error(transparent)]
    Inspect(#[from] InspectError),
}

/// Lazy, forward-only sequence of place records.
///
/// Drives the decoder output through the bounding-box pre-filter and the
/// [`Inspector`], yielding every classified record. Relations are dropped
/// before inspection, and points outside the box are skipped entirely — they
/// are neither cached nor classified, which bounds memory for regional
/// extracts. The stream fuses after the first error.
#[derive(Debug)]
pub struct PlaceStream<'a, S> {
    source: S,
    inspector: Inspector<'a>,
    bbox: BoundingBox,
    processed: u64,
    failed: bool,
}

impl<'a, S> PlaceStream<'a, S>
where
    S: Iterator<Item = Result<RawEntity, ExtractError>>,
{
    /// Assemble a stream over decoder output.
    pub fn new(source: S, inspector: Inspector<'a>, bbox: BoundingBox) -> Self {
        Self {
            source,
            inspector,
            bbox,
            processed: 0,
            failed: false,
        }
    }

    /// Number of source entities pulled so far.
    #[must_use]
    pub fn processed(&self) -> u64 {
        self.processed
    }
}

impl<S> Iterator for PlaceStream<'_, S>
where
    S: Iterator<Item = Result<RawEntity, ExtractError>>,
{
    type Item = Result<PlaceRecord, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let entity = match self.source.next()? {
                Ok(entity) => entity,
                Err(source) => {
                    self.failed = true;
                    return Some(Err(source.into()));
                }
            };

            self.processed += 1;
            if self.processed % PROGRESS_INTERVAL == 0 {
                info!("still working, {} entities processed", self.processed);
            }

            match &entity {
                RawEntity::Relation { .. } => continue,
                RawEntity::Point(point) if !self.bbox.contains(point.lon, point.lat) => {
                    continue;
                }
                RawEntity::Point(_) | RawEntity::Area(_) => {}
            }

            match self.inspector.inspect(entity) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => {}
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err.into()));
                }
            }
        }
    }
}
