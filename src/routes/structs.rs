use std::collections::HashSet;

use geo_types::Point;

/// A physical stop, unioned across every variant that serves it.
///
/// `routes` is the set of route ids calling at the stop; the walk-link
/// builder uses it to reject walks between stops that already share a route.
#[derive(Debug, Clone)]
pub struct Stop {
    pub stop_id: i64,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub routes: HashSet<i64>,
}

impl Stop {
    /// Location as a point with x = lng, y = lat.
    pub fn point(&self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }
}

#[derive(Debug, Clone)]
pub struct Route {
    pub route_id: i64,
    pub route_no: String,
    /// Selects the per-stop dwell time from the configured mapping.
    pub bus_type: String,
}

/// A directional service pattern: ordered stop sequence plus the path
/// polyline the vehicle follows, with the timetables dispatched on it.
#[derive(Debug, Clone)]
pub struct Variant {
    pub route_id: i64,
    pub variant_id: i64,
    pub variant_name: String,
    /// Ordered stop ids; coordinates live in the catalog's stop table.
    pub stops: Vec<i64>,
    /// Path geometry, x = lng, y = lat.
    pub polyline: Vec<Point<f64>>,
    pub timetables: Vec<Timetable>,
}

#[derive(Debug, Clone)]
pub struct Timetable {
    pub timetable_id: i64,
    pub trips: Vec<TripWindow>,
}

/// A single scheduled dispatch with unparsed `"HH:MM"` wall-clock times.
#[derive(Debug, Clone)]
pub struct TripWindow {
    pub trip_id: i64,
    pub start_time: String,
    pub end_time: String,
}
