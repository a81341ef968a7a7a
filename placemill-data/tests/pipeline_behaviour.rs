//! End-to-end behaviour of the extraction pipeline over synthetic streams.

use geo::Coord;
use placemill_core::{Geometry, Tags, Taxonomy};
use placemill_data::{
    AreaEntity, BoundingBox, Inspector, MemoryPlaceSink, PlaceSink, PlaceStream, PointEntity,
    RawEntity,
};
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
        .allow("tourism", ["museum", "viewpoint"])
        .allow("shop", ["bakery"])
        .cuisine(["pizza"])
        .build()
}

/// A small town: four untagged corner nodes, a tagged node, a bakery way,
/// a relation and an unclassifiable node.
fn town_entities() -> Vec<RawEntity> {
    vec![
        point(1, 0.0, 0.0, &[]),
        point(2, 0.0, 2.0, &[]),
        point(3, 2.0, 2.0, &[]),
        point(4, 2.0, 0.0, &[]),
        point(
            5,
            1.0,
            1.0,
            &[("tourism", "museum"), ("name", "Town Museum")],
        ),
        point(6, 1.5, 1.5, &[("highway", "crossing")]),
        RawEntity::Relation { id: 900 },
        area(
            70,
            &[1, 2, 3, 4, 1],
            &[("shop", "bakery"), ("cuisine", "pizza;sushi")],
        ),
    ]
}

#[rstest]
fn pipeline_emits_classified_places_only(taxonomy: Taxonomy) {
    let stream = PlaceStream::new(
        town_entities().into_iter().map(Ok),
        Inspector::new(&taxonomy),
        BoundingBox::world(),
    );

    let mut sink = MemoryPlaceSink::new();
    for outcome in stream {
        sink.consume(outcome.expect("clean synthetic input"));
    }
    sink.complete();

    assert_eq!(sink.records.len(), 2);

    let museum = &sink.records[0];
    assert_eq!(museum.name, "Town Museum");
    assert_eq!(museum.linked.osm, "https://www.openstreetmap.org/node/5");

    let bakery = &sink.records[1];
    assert!(bakery.keywords.contains("bakery"));
    assert_eq!(bakery.linked.osm, "https://www.openstreetmap.org/way/70");
    let Geometry::Ring(ring) = &bakery.geometry else {
        panic!("way must produce ring geometry");
    };
    assert!(placemill_core::geometry::is_counter_clockwise(ring));
    assert_eq!(bakery.centroid, Coord { x: 1.0, y: 1.0 });
    assert_eq!(
        bakery.attributes.cuisine,
        Some(std::collections::BTreeSet::from(["pizza".to_owned()]))
    );
}

#[rstest]
fn regional_bbox_drops_outside_points(taxonomy: Taxonomy) {
    let entities = vec![
        point(1, 1.0, 1.0, &[("tourism", "museum")]),
        point(2, 50.0, 1.0, &[("tourism", "museum")]),
    ];

    // Corners given in swapped order; normalization makes them equivalent.
    let stream = PlaceStream::new(
        entities.into_iter().map(Ok),
        Inspector::new(&taxonomy),
        BoundingBox::new(10.0, 10.0, -10.0, -10.0),
    );
    let records: Vec<_> = stream
        .map(|outcome| outcome.expect("clean synthetic input"))
        .collect();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].linked.osm, "https://www.openstreetmap.org/node/1");
}

#[rstest]
fn record_document_shape_is_stable(taxonomy: Taxonomy) {
    let entities = vec![point(
        5,
        24.7,
        59.4,
        &[
            ("tourism", "museum"),
            ("name", "Maritime Museum"),
            ("wikidata", "Q123"),
            ("website", "example.org"),
        ],
    )];
    let mut stream = PlaceStream::new(
        entities.into_iter().map(Ok),
        Inspector::new(&taxonomy),
        BoundingBox::world(),
    );

    let record = stream
        .next()
        .expect("one record")
        .expect("clean synthetic input");
    let json = serde_json::to_value(&record).expect("serialize record");

    assert_eq!(json["name"], "Maritime Museum");
    assert_eq!(json["location"]["lon"], 24.7);
    assert_eq!(json["position"]["coordinates"][0], 24.7);
    assert_eq!(json["attributes"]["website"], "http://example.org");
    assert_eq!(
        json["linked"]["wikidata"],
        "https://www.wikidata.org/wiki/Q123"
    );
    assert_eq!(json["keywords"], serde_json::json!(["museum", "tourism"]));
}
