//! Typed entities produced by the extract decoder.

use placemill_core::Tags;

/// A single coordinate with optional tags (source "node").
#[derive(Debug, Clone, PartialEq)]
pub struct PointEntity {
    /// Source identifier.
    pub id: i64,
    /// Longitude in WGS84 degrees.
    pub lon: f64,
    /// Latitude in WGS84 degrees.
    pub lat: f64,
    /// Free-form tags; may be empty.
    pub tags: Tags,
}

/// A candidate area referencing an ordered list of point ids (source "way").
///
/// The boundary is only a closed ring when the first reference equals the
/// last; the inspector rejects open and degenerate boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaEntity {
    /// Source identifier.
    pub id: i64,
    /// Ordered point references forming the boundary.
    pub boundary: Vec<i64>,
    /// Free-form tags; may be empty.
    pub tags: Tags,
}

/// One decoded entity from the ordered source stream.
///
/// Relations are carried only so the stream assembler can drop and count
/// them; they never reach the inspector.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEntity {
    /// A tagged coordinate.
    Point(PointEntity),
    /// A boundary candidate.
    Area(AreaEntity),
    /// A composite entity, always ignored.
    Relation {
        /// Source identifier.
        id: i64,
    },
}
