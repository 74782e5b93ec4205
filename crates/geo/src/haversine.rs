//! Haversine distance calculation.
//!
//! The Haversine formula calculates the great-circle distance between two points
//! on a sphere given their longitudes and latitudes. It drives snap-to-close
//! detection and the spherical perimeter.

use crate::Coordinate;

/// Earth's mean radius in kilometers (IUGG mean radius of WGS-84).
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Calculates the great-circle distance between two coordinates in kilometers.
///
/// # Example
/// ```
/// use osm_extractor_geo::{haversine_distance, Coordinate};
///
/// let berlin = Coordinate::new(13.4050, 52.5200);
/// let paris = Coordinate::new(2.3522, 48.8566);
///
/// let distance = haversine_distance(&berlin, &paris);
/// assert!((distance - 878.0).abs() < 10.0);
/// ```
#[inline]
pub fn haversine_distance(from: &Coordinate, to: &Coordinate) -> f64 {
    let (lat1, lon1) = from.to_radians();
    let (lat2, lon2) = to.to_radians();

    let d_lat = lat2 - lat1;
    let d_lon = lon2 - lon1;

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Sum of the great-circle lengths of consecutive segments, in kilometers.
///
/// Pass a closed ring to get a perimeter.
pub fn path_length(path: &[Coordinate]) -> f64 {
    path.windows(2)
        .map(|pair| haversine_distance(&pair[0], &pair[1]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BERLIN: Coordinate = Coordinate::new(13.4050, 52.5200);
    const PARIS: Coordinate = Coordinate::new(2.3522, 48.8566);
    const NEW_YORK: Coordinate = Coordinate::new(-74.0060, 40.7128);
    const TOKYO: Coordinate = Coordinate::new(139.6503, 35.6762);

    #[test]
    fn test_berlin_to_paris() {
        let distance = haversine_distance(&BERLIN, &PARIS);
        assert!((distance - 878.0).abs() < 5.0, "Berlin-Paris: {}", distance);
    }

    #[test]
    fn test_new_york_to_tokyo() {
        let distance = haversine_distance(&NEW_YORK, &TOKYO);
        assert!((distance - 10838.0).abs() < 50.0, "NYC-Tokyo: {}", distance);
    }

    #[test]
    fn test_same_point_zero_distance() {
        assert!(haversine_distance(&BERLIN, &BERLIN).abs() < 0.001);
    }

    #[test]
    fn test_symmetry() {
        let d1 = haversine_distance(&BERLIN, &PARIS);
        let d2 = haversine_distance(&PARIS, &BERLIN);
        assert!((d1 - d2).abs() < 0.001);
    }

    #[test]
    fn test_one_degree_of_meridian() {
        let d = haversine_distance(&Coordinate::new(0.0, 0.0), &Coordinate::new(0.0, 1.0));
        assert!((d - 111.195).abs() < 0.01, "1 degree: {}", d);
    }

    #[test]
    fn test_path_length_sums_segments() {
        let path = [BERLIN, PARIS, BERLIN];
        let expected = 2.0 * haversine_distance(&BERLIN, &PARIS);
        assert!((path_length(&path) - expected).abs() < 1e-9);
        assert_eq!(path_length(&[BERLIN]), 0.0);
        assert_eq!(path_length(&[]), 0.0);
    }
}
