//! EPSG:3857 coordinate validity window, see <https://epsg.io/3857>.

/// Largest representable longitude, degrees.
pub const BOUND_LON: f64 = 180.0;

/// Largest representable latitude, degrees (Web-Mercator cut-off).
pub const BOUND_LAT: f64 = 85.06;

/// Whether a coordinate lies inside the validity window.
#[must_use]
pub fn within_window(lon: f64, lat: f64) -> bool {
    (-BOUND_LON..=BOUND_LON).contains(&lon) && (-BOUND_LAT..=BOUND_LAT).contains(&lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_edges_are_inclusive() {
        assert!(within_window(180.0, 85.06));
        assert!(within_window(-180.0, -85.06));
        assert!(!within_window(180.1, 0.0));
        assert!(!within_window(0.0, 89.0));
    }
}
