//! The normalized place record and its stored document shape.

use geo::Coord;
use regex::Regex;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::attributes::AttributeBundle;
use crate::keyword::KeywordSet;
use crate::Tags;

const OSM_BASE_URL: &str = "https://www.openstreetmap.org/";
const WIKIDATA_BASE_URL: &str = "https://www.wikidata.org/wiki/";

/// Kind of the source entity, used to build the origin URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A single tagged coordinate.
    Node,
    /// A closed ring of node references.
    Way,
}

impl EntityKind {
    fn segment(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
        }
    }
}

/// Stable references back to the source datasets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedEntries {
    /// Origin URI encoding entity kind and identifier; the upsert key.
    pub osm: String,
    /// Wikidata item URI, when the entity carries a well-formed reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wikidata: Option<String>,
}

/// Builds [`LinkedEntries`] from raw tags.
#[derive(Debug)]
pub struct LinkExtractor {
    wikidata: Regex,
}

impl LinkExtractor {
    /// Extractor with the Wikidata item-id pattern compiled once.
    #[must_use]
    pub fn new() -> Self {
        Self {
            wikidata: Regex::new(r"^Q[1-9][0-9]*$").expect("pattern is valid"),
        }
    }

    /// Origin URI plus an optional Wikidata link.
    #[must_use]
    pub fn extract(&self, kind: EntityKind, id: i64, tags: &Tags) -> LinkedEntries {
        let wikidata = tags
            .get("wikidata")
            .filter(|value| self.wikidata.is_match(value))
            .map(|value| format!("{WIKIDATA_BASE_URL}{value}"));

        LinkedEntries {
            osm: format!("{OSM_BASE_URL}{}/{id}", kind.segment()),
            wikidata,
        }
    }
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Geometry of a place: a coordinate or a closed counter-clockwise ring.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Coordinates are WGS84 with `x = longitude`, `y = latitude`.
    Point(Coord<f64>),
    /// Closed exterior ring, first vertex equal to the last, CCW winding.
    Ring(Vec<Coord<f64>>),
}

impl Serialize for Geometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct LonLat {
            lon: f64,
            lat: f64,
        }

        match self {
            Self::Point(coord) => LonLat {
                lon: coord.x,
                lat: coord.y,
            }
            .serialize(serializer),
            Self::Ring(ring) => {
                let mut seq = serializer.serialize_seq(Some(ring.len()))?;
                for coord in ring {
                    seq.serialize_element(&[coord.x, coord.y])?;
                }
                seq.end()
            }
        }
    }
}

fn serialize_geojson_point<S: Serializer>(
    coord: &Coord<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct GeoJsonPoint {
        r#type: &'static str,
        coordinates: [f64; 2],
    }

    GeoJsonPoint {
        r#type: "Point",
        coordinates: [coord.x, coord.y],
    }
    .serialize(serializer)
}

/// Errors returned by [`PlaceRecord::new`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaceRecordError {
    /// No keywords were supplied; such entities are not places.
    #[error("place record must carry at least one keyword")]
    EmptyKeywords,
}

/// One fully classified place, ready for the sink.
///
/// Immutable once constructed; the keyword set is guaranteed non-empty.
/// Serializes to the stored JSON document: `name`, `location`, `position`
/// (GeoJSON-style point), `keywords`, `attributes` and `linked`, with
/// unresolved fields omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceRecord {
    /// Display name, resolved from tags or derived from a keyword.
    pub name: String,
    /// Point or exterior ring.
    #[serde(rename = "location")]
    pub geometry: Geometry,
    /// Ring centroid, or the point itself for point entities.
    #[serde(rename = "position", serialize_with = "serialize_geojson_point")]
    pub centroid: Coord<f64>,
    /// Controlled-vocabulary keywords; never empty.
    pub keywords: KeywordSet,
    /// Typed attribute bundle.
    pub attributes: AttributeBundle,
    /// Source dataset references; `linked.osm` keys the upsert.
    pub linked: LinkedEntries,
}

impl PlaceRecord {
    /// Validates and constructs a [`PlaceRecord`].
    ///
    /// # Errors
    /// Returns [`PlaceRecordError::EmptyKeywords`] when the keyword set is
    /// empty; callers are expected to have dropped such entities already.
    pub fn new(
        name: String,
        geometry: Geometry,
        centroid: Coord<f64>,
        keywords: KeywordSet,
        attributes: AttributeBundle,
        linked: LinkedEntries,
    ) -> Result<Self, PlaceRecordError> {
        if keywords.is_empty() {
            return Err(PlaceRecordError::EmptyKeywords);
        }
        Ok(Self {
            name,
            geometry,
            centroid,
            keywords,
            attributes,
            linked,
        })
    }
}
