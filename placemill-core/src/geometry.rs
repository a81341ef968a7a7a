//! Planar measures over closed polygon rings.
//!
//! A ring is an ordered slice of coordinates whose first element equals its
//! last. Callers validate closure and the minimum length of four vertices;
//! these functions do not re-check either property.

use geo::Coord;

/// Signed area of a closed ring via the shoelace formula.
///
/// Positive for counter-clockwise vertex order, negative for clockwise.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use placemill_core::geometry::signed_area;
///
/// let square = [
///     Coord { x: 0.0, y: 0.0 },
///     Coord { x: 2.0, y: 0.0 },
///     Coord { x: 2.0, y: 2.0 },
///     Coord { x: 0.0, y: 2.0 },
///     Coord { x: 0.0, y: 0.0 },
/// ];
/// assert_eq!(signed_area(&square), 4.0);
/// ```
#[must_use]
pub fn signed_area(ring: &[Coord<f64>]) -> f64 {
    let doubled: f64 = ring
        .windows(2)
        .map(|pair| pair[0].x * pair[1].y - pair[0].y * pair[1].x)
        .sum();
    0.5 * doubled
}

/// Whether the ring's exterior winds counter-clockwise.
#[must_use]
pub fn is_counter_clockwise(ring: &[Coord<f64>]) -> bool {
    signed_area(ring) > 0.0
}

/// Centroid of a closed ring.
///
/// Accumulates the doubled cross terms of the shoelace traversal and divides
/// by six times the signed area. Undefined for a degenerate ring whose signed
/// area is zero; callers must not pass one.
#[must_use]
pub fn centroid(ring: &[Coord<f64>]) -> Coord<f64> {
    let mut doubled = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;

    for pair in ring.windows(2) {
        let (p0, p1) = (pair[0], pair[1]);
        let cross = p0.x * p1.y - p0.y * p1.x;
        doubled += cross;
        cx += (p0.x + p1.x) * cross;
        cy += (p0.y + p1.y) * cross;
    }

    // 6 * signed_area == 3 * doubled
    let divisor = 3.0 * doubled;
    Coord {
        x: cx / divisor,
        y: cy / divisor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn unit_square() -> Vec<Coord<f64>> {
        vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 2.0, y: 0.0 },
            Coord { x: 2.0, y: 2.0 },
            Coord { x: 0.0, y: 2.0 },
            Coord { x: 0.0, y: 0.0 },
        ]
    }

    #[rstest]
    fn square_has_positive_area(unit_square: Vec<Coord<f64>>) {
        assert_eq!(signed_area(&unit_square), 4.0);
        assert!(is_counter_clockwise(&unit_square));
    }

    #[rstest]
    fn reversed_square_has_negative_area(unit_square: Vec<Coord<f64>>) {
        let mut reversed = unit_square;
        reversed.reverse();
        assert_eq!(signed_area(&reversed), -4.0);
        assert!(!is_counter_clockwise(&reversed));
    }

    #[rstest]
    fn square_centroid_is_centre(unit_square: Vec<Coord<f64>>) {
        let c = centroid(&unit_square);
        assert_eq!(c, Coord { x: 1.0, y: 1.0 });
    }

    #[rstest]
    fn centroid_is_orientation_independent(unit_square: Vec<Coord<f64>>) {
        let mut reversed = unit_square.clone();
        reversed.reverse();
        assert_eq!(centroid(&reversed), centroid(&unit_square));
    }

    #[rstest]
    fn triangle_centroid_matches_vertex_mean() {
        let triangle = [
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 3.0, y: 0.0 },
            Coord { x: 0.0, y: 3.0 },
            Coord { x: 0.0, y: 0.0 },
        ];
        assert_eq!(signed_area(&triangle), 4.5);
        assert_eq!(centroid(&triangle), Coord { x: 1.0, y: 1.0 });
    }
}
