use geo_types::Point;
use rstar::AABB;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
const LATITUDE_DEGREE_METERS: f64 = 110574.0;
const LONGITUDE_DEGREE_METERS: f64 = 111320.0;

/// Great-circle distance in meters between two points (x = lng, y = lat).
pub fn haversine(a: Point<f64>, b: Point<f64>) -> f64 {
    let lat1 = a.y().to_radians();
    let lat2 = b.y().to_radians();
    let dlat = (b.y() - a.y()).to_radians();
    let dlng = (b.x() - a.x()).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * h.sqrt().asin() * EARTH_RADIUS_METERS
}

/// Index of the polyline vertex nearest to `point`, with its distance in
/// meters. Linear scan, O(|polyline|).
pub fn nearest_index(point: Point<f64>, polyline: &[Point<f64>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (i, vertex) in polyline.iter().enumerate() {
        let d = haversine(point, *vertex);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

/// Total length of a polyline in meters.
pub fn polyline_length(polyline: &[Point<f64>]) -> f64 {
    polyline
        .windows(2)
        .map(|pair| haversine(pair[0], pair[1]))
        .sum()
}

/// Along-path distance between two stops, in meters.
///
/// Both stops are projected to their nearest polyline vertex and the
/// vertex-to-vertex distances are summed between the two projections. The
/// partial segments before the first projection and after the second are
/// ignored, which bounds the error by one segment length; the polyline is
/// assumed to be stored in traversal order.
pub fn path_length_between(a: Point<f64>, b: Point<f64>, polyline: &[Point<f64>]) -> f64 {
    let (i, _) = nearest_index(a, polyline);
    let (j, _) = nearest_index(b, polyline);
    let (lo, hi) = (i.min(j), i.max(j));
    polyline[lo..=hi]
        .windows(2)
        .map(|pair| haversine(pair[0], pair[1]))
        .sum()
}

/// Axis-aligned box around a point that contains every location within
/// `radius` meters. Used to prefilter spatial queries; exact distances are
/// checked with [`haversine`] afterwards.
pub fn compute_envelope(point: Point<f64>, radius: f64) -> AABB<[f64; 2]> {
    let lat_radius = radius / LATITUDE_DEGREE_METERS;
    let lon_radius = radius / (LONGITUDE_DEGREE_METERS * point.y().to_radians().cos());
    AABB::from_corners(
        [point.x() - lon_radius, point.y() - lat_radius],
        [point.x() + lon_radius, point.y() + lat_radius],
    )
}
