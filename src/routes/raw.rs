use crate::routes::error::Error;

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Raw routes dump: one record per route, keyed by route name.
pub type RawNetwork = HashMap<String, RawRoute>;

/// A single route as served by the agency API dump. Every section is
/// optional or defaulted; the catalog builder decides what is usable.
#[derive(Debug, Deserialize)]
pub struct RawRoute {
    #[serde(rename = "getroutebyid")]
    pub info: Option<RawRouteInfo>,
    #[serde(rename = "getvarsbyroute", default)]
    pub variants: Vec<RawVariant>,
    /// Ordered stop sequence per variant, keyed by the variant id as a string.
    #[serde(rename = "getstopsbyvar", default)]
    pub stops_by_variant: HashMap<String, Vec<RawStop>>,
    /// Path polyline per variant, keyed by the variant id as a string.
    #[serde(rename = "getpathsbyvar", default)]
    pub paths_by_variant: HashMap<String, RawPath>,
    #[serde(rename = "gettimetablebyroute", default)]
    pub timetables: Vec<RawTimetable>,
    /// Trips per timetable, keyed by the timetable id as a string.
    #[serde(rename = "gettripsbytimetable", default)]
    pub trips_by_timetable: HashMap<String, Vec<RawTrip>>,
}

#[derive(Debug, Deserialize)]
pub struct RawRouteInfo {
    #[serde(rename = "RouteId")]
    pub route_id: i64,
    #[serde(rename = "RouteNo", default)]
    pub route_no: String,
    #[serde(rename = "Type", default)]
    pub bus_type: String,
}

/// A directional service pattern of a route (outbound vs. inbound).
#[derive(Debug, Deserialize)]
pub struct RawVariant {
    #[serde(rename = "RouteVarId")]
    pub variant_id: i64,
    #[serde(rename = "RouteVarName", default)]
    pub variant_name: String,
}

#[derive(Debug, Deserialize)]
pub struct RawStop {
    #[serde(rename = "StopId")]
    pub stop_id: i64,
    #[serde(rename = "Lat")]
    pub lat: f64,
    #[serde(rename = "Lng")]
    pub lng: f64,
    #[serde(rename = "Name", default)]
    pub name: String,
}

/// Path geometry as parallel coordinate arrays.
#[derive(Debug, Deserialize)]
pub struct RawPath {
    #[serde(rename = "lat", default)]
    pub lat: Vec<f64>,
    #[serde(rename = "lng", default)]
    pub lng: Vec<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RawTimetable {
    #[serde(rename = "TimeTableId")]
    pub timetable_id: i64,
    #[serde(rename = "RouteVarId")]
    pub variant_id: i64,
}

/// A single scheduled dispatch. Times are wall-clock `"HH:MM"` strings;
/// parsing is deferred to the trip expander so one bad trip only drops
/// itself.
#[derive(Debug, Deserialize)]
pub struct RawTrip {
    #[serde(rename = "TripId")]
    pub trip_id: i64,
    #[serde(rename = "StartTime", default)]
    pub start_time: String,
    #[serde(rename = "EndTime", default)]
    pub end_time: String,
}

/// Read the full routes dump from a JSON file.
pub fn read_network<P: AsRef<Path>>(path: P) -> Result<RawNetwork, Error> {
    let p = path.as_ref();
    if !p.is_file() {
        return Err(Error::MissingFile(format!("{}", p.display())));
    }
    let file = std::fs::File::open(p)?;
    serde_json::from_reader(std::io::BufReader::new(file)).map_err(|e| Error::JsonError {
        file_name: format!("{}", p.display()),
        source: e,
    })
}
