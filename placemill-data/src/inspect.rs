//! Per-entity inspection: validation, caching, classification, assembly.

use geo::Coord;
use log::warn;
use thiserror::Error;

use placemill_core::geometry::{centroid, is_counter_clockwise, signed_area};
use placemill_core::{
    AssociationPolicy, AttributeNormalizer, EntityKind, Geometry, KeywordClassifier, KeywordSet,
    LinkExtractor, PlaceRecord, PlaceRecordError, Taxonomy,
};

use crate::cache::{Position, PositionCache};
use crate::crs;
use crate::entity::{AreaEntity, PointEntity, RawEntity};

/// Fatal source-integrity errors.
///
/// Any of these means the extract violates the ordering or validity
/// invariants, so the cache and the record stream can no longer be trusted;
/// the run aborts instead of skipping the entity.
#[derive(Debug, Error)]
pub enum InspectError {
    /// A point lies outside the coordinate validity window.
    #[error("point {id} lies outside the validity window at ({lon}, {lat})")]
    OutOfWindow {
        /// Source identifier of the point.
        id: i64,
        /// Offending longitude.
        lon: f64,
        /// Offending latitude.
        lat: f64,
    },
    /// An area carries fewer than two boundary references.
    #[error("area {id} carries only {references} boundary reference(s)")]
    TruncatedBoundary {
        /// Source identifier of the area.
        id: i64,
        /// Number of references present.
        references: usize,
    },
    /// An area references a point that never appeared in the stream.
    #[error("area {id} references unknown point {reference}")]
    UnresolvedReference {
        /// Source identifier of the area.
        id: i64,
        /// The missing point reference.
        reference: i64,
    },
    /// A record failed its construction invariant.
    #[error("rejected place record")]
    InvalidRecord(#[from] PlaceRecordError),
}

/// Classifies one entity at a time into a [`PlaceRecord`] or nothing.
///
/// Owns the position cache; point entities register their coordinates here
/// so later areas can resolve their boundaries.
#[derive(Debug)]
pub struct Inspector<'a> {
    classifier: KeywordClassifier<'a>,
    normalizer: AttributeNormalizer<'a>,
    links: LinkExtractor,
    cache: PositionCache,
}

impl<'a> Inspector<'a> {
    /// Inspector over the given taxonomy with the default association policy.
    #[must_use]
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Self::with_policy(taxonomy, AssociationPolicy::default())
    }

    /// Inspector with an explicit association policy.
    #[must_use]
    pub fn with_policy(taxonomy: &'a Taxonomy, policy: AssociationPolicy) -> Self {
        Self {
            classifier: KeywordClassifier::with_policy(taxonomy, policy),
            normalizer: AttributeNormalizer::new(taxonomy),
            links: LinkExtractor::new(),
            cache: PositionCache::new(),
        }
    }

    /// Read access to the position cache.
    #[must_use]
    pub fn cache(&self) -> &PositionCache {
        &self.cache
    }

    /// Inspect one entity; `Ok(None)` means "not a place of interest".
    ///
    /// # Errors
    /// Returns an [`InspectError`] when the entity violates a source
    /// invariant; the caller is expected to abort the run.
    pub fn inspect(&mut self, entity: RawEntity) -> Result<Option<PlaceRecord>, InspectError> {
        match entity {
            RawEntity::Point(point) => self.inspect_point(point),
            RawEntity::Area(area) => self.inspect_area(area),
            RawEntity::Relation { .. } => Ok(None),
        }
    }

    fn inspect_point(&mut self, point: PointEntity) -> Result<Option<PlaceRecord>, InspectError> {
        if !crs::within_window(point.lon, point.lat) {
            return Err(InspectError::OutOfWindow {
                id: point.id,
                lon: point.lon,
                lat: point.lat,
            });
        }

        // Untagged points still matter: later areas resolve through them.
        self.cache.insert(
            point.id,
            Position {
                lon: point.lon,
                lat: point.lat,
            },
        );

        if point.tags.is_empty() {
            return Ok(None);
        }
        let keywords = self.classifier.classify(&point.tags);
        if keywords.is_empty() {
            return Ok(None);
        }

        let mut attributes = self.normalizer.normalize(&point.tags);
        let name = attributes
            .name
            .clone()
            .unwrap_or_else(|| fallback_name(&keywords));
        attributes.name = Some(name.clone());

        let linked = self.links.extract(EntityKind::Node, point.id, &point.tags);
        let coord = Coord {
            x: point.lon,
            y: point.lat,
        };
        let record = PlaceRecord::new(
            name,
            Geometry::Point(coord),
            coord,
            keywords,
            attributes,
            linked,
        )?;
        Ok(Some(record))
    }

    fn inspect_area(&mut self, area: AreaEntity) -> Result<Option<PlaceRecord>, InspectError> {
        if area.boundary.len() < 2 {
            return Err(InspectError::TruncatedBoundary {
                id: area.id,
                references: area.boundary.len(),
            });
        }

        // Open ways and tiny rings are never places.
        let closed = area.boundary.first() == area.boundary.last();
        if area.boundary.len() < 4 || !closed || area.tags.is_empty() {
            return Ok(None);
        }

        let mut ring = Vec::with_capacity(area.boundary.len());
        for &reference in &area.boundary {
            let Some(position) = self.cache.get(reference) else {
                return Err(InspectError::UnresolvedReference {
                    id: area.id,
                    reference,
                });
            };
            ring.push(Coord {
                x: position.lon,
                y: position.lat,
            });
        }

        let keywords = self.classifier.classify(&area.tags);
        if keywords.is_empty() {
            return Ok(None);
        }

        if signed_area(&ring) == 0.0 {
            warn!("skipped degenerate zero-area ring for area {}", area.id);
            return Ok(None);
        }
        if !is_counter_clockwise(&ring) {
            ring.reverse();
        }
        let centre = centroid(&ring);

        let mut attributes = self.normalizer.normalize(&area.tags);
        let name = attributes
            .name
            .clone()
            .unwrap_or_else(|| fallback_name(&keywords));
        attributes.name = Some(name.clone());

        let linked = self.links.extract(EntityKind::Way, area.id, &area.tags);
        let record = PlaceRecord::new(
            name,
            Geometry::Ring(ring),
            centre,
            keywords,
            attributes,
            linked,
        )?;
        Ok(Some(record))
    }
}

/// Human-cased name derived from the lexicographically smallest keyword.
fn fallback_name(keywords: &KeywordSet) -> String {
    let Some(keyword) = keywords.first() else {
        return String::new();
    };
    let spaced = keyword.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use placemill_core::Tags;
    use rstest::{fixture, rstest};

    fn tags(entries: &[(&str, &str)]) -> Tags {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn point(id: i64, lon: f64, lat: f64, entries: &[(&str, &str)]) -> RawEntity {
        RawEntity::Point(PointEntity {
            id,
            lon,
            lat,
            tags: tags(entries),
        })
    }

    fn area(id: i64, boundary: &[i64], entries: &[(&str, &str)]) -> RawEntity {
        RawEntity::Area(AreaEntity {
            id,
            boundary: boundary.to_vec(),
            tags: tags(entries),
        })
    }

    #[fixture]
    fn taxonomy() -> Taxonomy {
        Taxonomy::builder()
            .allow("tourism", ["museum"])
            .allow("shop", ["bakery"])
            .allow("amenity", ["fountain"])
            .build()
    }

    /// Square with corners at (0,0) and (2,2), ids 1..=4, clockwise order.
    fn feed_square_corners(inspector: &mut Inspector<'_>) {
        let corners = [
            (1, 0.0, 0.0),
            (2, 0.0, 2.0),
            (3, 2.0, 2.0),
            (4, 2.0, 0.0),
        ];
        for (id, lon, lat) in corners {
            let outcome = inspector
                .inspect(point(id, lon, lat, &[]))
                .expect("corner in bounds");
            assert!(outcome.is_none(), "untagged corner produced a record");
        }
    }

    #[rstest]
    fn tagged_point_becomes_a_record(taxonomy: Taxonomy) {
        let mut inspector = Inspector::new(&taxonomy);
        let record = inspector
            .inspect(point(42, 24.7, 59.4, &[("tourism", "museum"), ("name", "Maritime Museum")]))
            .expect("in bounds")
            .expect("classified");

        assert_eq!(record.name, "Maritime Museum");
        assert_eq!(record.geometry, Geometry::Point(Coord { x: 24.7, y: 59.4 }));
        assert_eq!(record.centroid, Coord { x: 24.7, y: 59.4 });
        assert!(record.keywords.contains("museum"));
        assert_eq!(record.linked.osm, "https://www.openstreetmap.org/node/42");
    }

    #[rstest]
    fn unclassified_point_is_cached_but_not_emitted(taxonomy: Taxonomy) {
        let mut inspector = Inspector::new(&taxonomy);
        let outcome = inspector
            .inspect(point(9, 1.0, 2.0, &[("highway", "crossing")]))
            .expect("in bounds");

        assert!(outcome.is_none());
        assert_eq!(inspector.cache().get(9), Some(Position { lon: 1.0, lat: 2.0 }));
    }

    #[rstest]
    fn out_of_window_point_is_fatal(taxonomy: Taxonomy) {
        let mut inspector = Inspector::new(&taxonomy);
        let err = inspector
            .inspect(point(5, 12.0, 88.0, &[]))
            .expect_err("latitude beyond the mercator cut-off");
        assert!(matches!(err, InspectError::OutOfWindow { id: 5, .. }));
    }

    #[rstest]
    fn nameless_point_falls_back_to_keyword(taxonomy: Taxonomy) {
        let mut inspector = Inspector::new(&taxonomy);
        let record = inspector
            .inspect(point(3, 1.0, 1.0, &[("amenity", "fountain")]))
            .expect("in bounds")
            .expect("classified");
        assert_eq!(record.name, "Fountain");
        assert_eq!(record.attributes.name.as_deref(), Some("Fountain"));
    }

    #[rstest]
    fn closed_way_becomes_ccw_ring(taxonomy: Taxonomy) {
        let mut inspector = Inspector::new(&taxonomy);
        feed_square_corners(&mut inspector);

        // 1 → 2 → 3 → 4 → 1 walks the square clockwise.
        let record = inspector
            .inspect(area(70, &[1, 2, 3, 4, 1], &[("shop", "bakery")]))
            .expect("resolvable boundary")
            .expect("classified");

        let Geometry::Ring(ring) = &record.geometry else {
            panic!("expected ring geometry");
        };
        let expected = [
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 2.0, y: 0.0 },
            Coord { x: 2.0, y: 2.0 },
            Coord { x: 0.0, y: 2.0 },
            Coord { x: 0.0, y: 0.0 },
        ];
        assert_eq!(ring.as_slice(), expected.as_slice());
        assert!(placemill_core::geometry::is_counter_clockwise(ring));
        assert_eq!(record.centroid, Coord { x: 1.0, y: 1.0 });
        assert!(record.keywords.contains("bakery"));
        assert_eq!(record.linked.osm, "https://www.openstreetmap.org/way/70");
    }

    #[rstest]
    fn ccw_ring_is_left_untouched(taxonomy: Taxonomy) {
        let mut inspector = Inspector::new(&taxonomy);
        feed_square_corners(&mut inspector);

        let record = inspector
            .inspect(area(71, &[1, 4, 3, 2, 1], &[("shop", "bakery")]))
            .expect("resolvable boundary")
            .expect("classified");

        let Geometry::Ring(ring) = &record.geometry else {
            panic!("expected ring geometry");
        };
        let expected = [
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 2.0, y: 0.0 },
            Coord { x: 2.0, y: 2.0 },
            Coord { x: 0.0, y: 2.0 },
            Coord { x: 0.0, y: 0.0 },
        ];
        assert_eq!(ring.as_slice(), expected.as_slice());
    }

    #[rstest]
    fn open_way_yields_nothing(taxonomy: Taxonomy) {
        let mut inspector = Inspector::new(&taxonomy);
        feed_square_corners(&mut inspector);
        let outcome = inspector
            .inspect(area(72, &[1, 2, 3, 4], &[("shop", "bakery")]))
            .expect("open ways are skipped, not fatal");
        assert!(outcome.is_none());
    }

    #[rstest]
    fn short_boundary_is_fatal(taxonomy: Taxonomy) {
        let mut inspector = Inspector::new(&taxonomy);
        let err = inspector
            .inspect(area(73, &[1], &[("shop", "bakery")]))
            .expect_err("single-reference boundary is malformed");
        assert!(matches!(err, InspectError::TruncatedBoundary { id: 73, .. }));
    }

    #[rstest]
    fn unresolved_reference_is_fatal(taxonomy: Taxonomy) {
        let mut inspector = Inspector::new(&taxonomy);
        feed_square_corners(&mut inspector);
        let err = inspector
            .inspect(area(74, &[1, 2, 99, 4, 1], &[("shop", "bakery")]))
            .expect_err("reference 99 never appeared");
        assert!(matches!(
            err,
            InspectError::UnresolvedReference {
                id: 74,
                reference: 99
            }
        ));
    }

    #[rstest]
    fn zero_area_ring_yields_nothing(taxonomy: Taxonomy) {
        let mut inspector = Inspector::new(&taxonomy);
        for id in 1..=3 {
            inspector
                .inspect(point(id, 1.0, 1.0, &[]))
                .expect("in bounds");
        }
        let outcome = inspector
            .inspect(area(75, &[1, 2, 3, 1], &[("shop", "bakery")]))
            .expect("degenerate rings are skipped, not fatal");
        assert!(outcome.is_none());
    }

    #[rstest]
    fn untagged_area_yields_nothing(taxonomy: Taxonomy) {
        let mut inspector = Inspector::new(&taxonomy);
        feed_square_corners(&mut inspector);
        let outcome = inspector
            .inspect(area(76, &[1, 2, 3, 4, 1], &[]))
            .expect("untagged areas are skipped");
        assert!(outcome.is_none());
    }

    #[test]
    fn fallback_name_is_human_cased() {
        let keywords = KeywordSet::from(["drinking_water".to_owned(), "fountain".to_owned()]);
        assert_eq!(fallback_name(&keywords), "Drinking water");
    }
}
