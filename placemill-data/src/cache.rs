//! Append-only cache of point positions for area resolution.

use std::collections::HashMap;

/// A cached WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// Longitude in degrees.
    pub lon: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

/// Maps point identifiers to their positions for the lifetime of a run.
///
/// Entries are written once per point, in stream order, before any area that
/// references them is processed; the ordering is an invariant of the source
/// stream and is not enforced here. Nothing is ever evicted.
///
/// This is the dominant memory cost of the pipeline: positions are stored
/// inline (16 bytes each, no per-entry allocation), so a run over `n` cached
/// points needs roughly `n * 24` bytes of payload plus hash-table overhead —
/// about 3 GiB per 100 million points.
#[derive(Debug, Default)]
pub struct PositionCache {
    positions: HashMap<i64, Position>,
}

impl PositionCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a point's position.
    pub fn insert(&mut self, id: i64, position: Position) {
        self.positions.insert(id, position);
    }

    /// Look up a previously registered point.
    #[must_use]
    pub fn get(&self, id: i64) -> Option<Position> {
        self.positions.get(&id).copied()
    }

    /// Number of cached points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether no point has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_returns_registered_position() {
        let mut cache = PositionCache::new();
        cache.insert(7, Position { lon: 1.5, lat: -2.5 });

        assert_eq!(cache.get(7), Some(Position { lon: 1.5, lat: -2.5 }));
        assert_eq!(cache.get(8), None);
        assert_eq!(cache.len(), 1);
    }
}
