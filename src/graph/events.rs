use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::graph::geo_util;
use crate::routes::catalog::Catalog;
use crate::routes::structs::{Stop, Variant};

/// Hard ceiling on plausible average trip speed, ~80 km/h. Trips faster than
/// this carry broken timetable data and are dropped, never clamped.
pub const MAX_AVG_SPEED: f64 = 22.2;

/// What happened at a stop: the vehicle arrived or departed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "ARRIVAL")]
    Arrival,
    #[serde(rename = "DEPARTURE")]
    Departure,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Arrival => "ARRIVAL",
            EventKind::Departure => "DEPARTURE",
        }
    }
}

/// One vertex of the time-expanded graph: a specific trip arriving at or
/// departing from a specific stop at a specific second.
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally monotonic, assigned from 1 in emission order.
    pub node_id: i64,
    pub route_id: i64,
    pub route_no: String,
    pub variant_id: i64,
    pub trip_id: i64,
    pub stop_id: i64,
    pub stop_name: String,
    /// Seconds since midnight; exceeds 86400 on overnight trips.
    pub timestamp: i64,
    pub kind: EventKind,
}

#[derive(Debug, Default)]
pub struct ExpandStats {
    pub variants_expanded: usize,
    pub variants_skipped: usize,
    pub trips_expanded: usize,
    pub trips_skipped: usize,
}

/// Parse a `"HH:MM"` wall-clock string into seconds since midnight.
fn parse_hhmm(value: &str) -> Option<i64> {
    let (hours, minutes) = value.split_once(':')?;
    let hours: i64 = hours.trim().parse().ok()?;
    let minutes: i64 = minutes.trim().parse().ok()?;
    if hours < 0 || !(0..60).contains(&minutes) {
        return None;
    }
    Some(hours * 3600 + minutes * 60)
}

/// Expand every trip of every variant into its event stream.
///
/// Events come out in catalog order (variant order, then timetable and trip
/// order within the variant) with node ids assigned from 1. Trips that fail
/// temporal or physical validation are logged and dropped; structural
/// defects drop the whole variant. Nothing here aborts the pipeline.
pub fn expand(catalog: &Catalog, config: &Config) -> (Vec<Event>, ExpandStats) {
    let mut events = Vec::new();
    let mut stats = ExpandStats::default();
    let mut next_node_id: i64 = 1;

    for variant in &catalog.variants {
        match expand_variant(catalog, variant, config, &mut next_node_id, &mut events) {
            Ok(trip_stats) => {
                stats.variants_expanded += 1;
                stats.trips_expanded += trip_stats.0;
                stats.trips_skipped += trip_stats.1;
            }
            Err(reason) => {
                log::warn!(
                    "route {} variant {}: {}, skipping variant",
                    variant.route_id,
                    variant.variant_id,
                    reason
                );
                stats.variants_skipped += 1;
            }
        }
    }
    (events, stats)
}

/// Expand one variant. Returns `(trips_expanded, trips_skipped)`, or the
/// reason the whole variant is unusable.
fn expand_variant(
    catalog: &Catalog,
    variant: &Variant,
    config: &Config,
    next_node_id: &mut i64,
    events: &mut Vec<Event>,
) -> Result<(usize, usize), String> {
    let route = catalog
        .routes
        .get(&variant.route_id)
        .ok_or("unknown route")?;
    let dwell = config.dwell_for(&route.bus_type);

    let stops: Vec<&Stop> = variant
        .stops
        .iter()
        .map(|id| {
            catalog
                .stops
                .get(id)
                .ok_or_else(|| format!("stop {} missing from stop table", id))
        })
        .collect::<Result<_, _>>()?;

    let is_loop = is_loop_variant(&stops);

    // Per-segment along-path distances; a loop variant has no usable
    // interior geometry ordering, so only its total length matters.
    let stop_distances: Vec<f64> = if is_loop {
        Vec::new()
    } else {
        stops
            .windows(2)
            .map(|pair| geo_util::path_length_between(pair[0].point(), pair[1].point(), &variant.polyline))
            .collect()
    };
    let total_distance = if is_loop {
        geo_util::polyline_length(&variant.polyline)
    } else {
        stop_distances.iter().sum()
    };
    if total_distance <= 0.0 {
        return Err("non-positive total distance".to_string());
    }

    let mut expanded = 0;
    let mut skipped = 0;
    for timetable in &variant.timetables {
        for trip in &timetable.trips {
            let (Some(start), Some(mut end)) =
                (parse_hhmm(&trip.start_time), parse_hhmm(&trip.end_time))
            else {
                log::warn!(
                    "route {} variant {} trip {}: unparseable time '{}'..'{}'",
                    variant.route_id,
                    variant.variant_id,
                    trip.trip_id,
                    trip.start_time,
                    trip.end_time
                );
                skipped += 1;
                continue;
            };
            // end at or before start means the trip runs past midnight
            if end <= start {
                end += 86_400;
            }

            let total_dwell = (stops.len() as i64 - 1) * dwell;
            let travel = end - start - total_dwell;
            if travel <= 0 {
                log::warn!(
                    "route {} variant {} trip {}: no travel time left after dwell",
                    variant.route_id,
                    variant.variant_id,
                    trip.trip_id
                );
                skipped += 1;
                continue;
            }

            let speed = total_distance / travel as f64;
            if speed < config.min_avg_speed || speed > MAX_AVG_SPEED {
                log::warn!(
                    "route {} variant {} trip {}: implausible speed {:.1} m/s",
                    variant.route_id,
                    variant.variant_id,
                    trip.trip_id,
                    speed
                );
                skipped += 1;
                continue;
            }

            emit_trip(
                variant,
                &route.route_no,
                trip.trip_id,
                &stops,
                &stop_distances,
                is_loop,
                start,
                end,
                speed,
                dwell,
                next_node_id,
                events,
            );
            expanded += 1;
        }
    }
    Ok((expanded, skipped))
}

/// A loop variant has exactly two stops at the same coordinates; it is
/// represented by its endpoint events only.
fn is_loop_variant(stops: &[&Stop]) -> bool {
    stops.len() == 2 && stops[0].lat == stops[1].lat && stops[0].lng == stops[1].lng
}

#[allow(clippy::too_many_arguments)]
fn emit_trip(
    variant: &Variant,
    route_no: &str,
    trip_id: i64,
    stops: &[&Stop],
    stop_distances: &[f64],
    is_loop: bool,
    start: i64,
    end: i64,
    speed: f64,
    dwell: i64,
    next_node_id: &mut i64,
    events: &mut Vec<Event>,
) {
    let mut push = |stop: &Stop, timestamp: i64, kind: EventKind| {
        events.push(Event {
            node_id: *next_node_id,
            route_id: variant.route_id,
            route_no: route_no.to_string(),
            variant_id: variant.variant_id,
            trip_id,
            stop_id: stop.stop_id,
            stop_name: stop.name.clone(),
            timestamp,
            kind,
        });
        *next_node_id += 1;
    };

    if is_loop {
        push(stops[0], start, EventKind::Departure);
        push(stops[1], end, EventKind::Arrival);
        return;
    }

    let mut time = start as f64;
    push(stops[0], start, EventKind::Departure);
    for i in 1..stops.len() {
        time += stop_distances[i - 1] / speed;
        push(stops[i], time.round() as i64, EventKind::Arrival);
        if i < stops.len() - 1 {
            time += dwell as f64;
            push(stops[i], time.round() as i64, EventKind::Departure);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::raw::RawNetwork;

    fn network_json(trips: serde_json::Value) -> RawNetwork {
        // three collinear stops ~1095 m apart on a shared parallel
        serde_json::from_value(serde_json::json!({
            "Route 1": {
                "getroutebyid": {"RouteId": 1, "RouteNo": "01", "Type": "Standard"},
                "getvarsbyroute": [{"RouteVarId": 11, "RouteVarName": "Outbound"}],
                "getstopsbyvar": {
                    "11": [
                        {"StopId": 100, "Lat": 10.0, "Lng": 106.0, "Name": "A"},
                        {"StopId": 101, "Lat": 10.0, "Lng": 106.01, "Name": "B"},
                        {"StopId": 102, "Lat": 10.0, "Lng": 106.02, "Name": "C"}
                    ]
                },
                "getpathsbyvar": {
                    "11": {"lat": [10.0, 10.0, 10.0], "lng": [106.0, 106.01, 106.02]}
                },
                "gettimetablebyroute": [{"TimeTableId": 7, "RouteVarId": 11}],
                "gettripsbytimetable": {"7": trips}
            }
        }))
        .unwrap()
    }

    fn expand_network(raw: &RawNetwork) -> (Vec<Event>, ExpandStats) {
        let catalog = Catalog::from_raw(raw, None);
        expand(&catalog, &Config::default())
    }

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(parse_hhmm("07:00"), Some(25200));
        assert_eq!(parse_hhmm("00:00"), Some(0));
        assert_eq!(parse_hhmm("23:59"), Some(86340));
        assert_eq!(parse_hhmm("7:5"), Some(25500));
        assert_eq!(parse_hhmm(""), None);
        assert_eq!(parse_hhmm("0700"), None);
        assert_eq!(parse_hhmm("07:60"), None);
        assert_eq!(parse_hhmm("ab:cd"), None);
    }

    #[test]
    fn test_single_trip_line() {
        let raw = network_json(serde_json::json!([
            {"TripId": 1, "StartTime": "07:00", "EndTime": "07:10"}
        ]));
        let (events, stats) = expand_network(&raw);
        assert_eq!(stats.trips_expanded, 1);
        assert_eq!(events.len(), 4);

        // DEP@A, ARR@B, DEP@B, ARR@C; no departure from the terminal stop
        let expected = [
            (100, 25200, EventKind::Departure),
            (101, 25470, EventKind::Arrival),
            (101, 25500, EventKind::Departure),
            (102, 25770, EventKind::Arrival),
        ];
        for (event, (stop_id, timestamp, kind)) in events.iter().zip(expected) {
            assert_eq!(event.stop_id, stop_id);
            assert_eq!(event.timestamp, timestamp);
            assert_eq!(event.kind, kind);
        }

        // node ids are dense and monotonic from 1
        for (i, event) in events.iter().enumerate() {
            assert_eq!(event.node_id, i as i64 + 1);
        }

        // interior dwell is exactly the configured waiting time
        assert_eq!(events[2].timestamp - events[1].timestamp, 30);
    }

    #[test]
    fn test_timestamps_non_decreasing() {
        let raw = network_json(serde_json::json!([
            {"TripId": 1, "StartTime": "05:00", "EndTime": "05:12"},
            {"TripId": 2, "StartTime": "05:15", "EndTime": "05:27"}
        ]));
        let (events, stats) = expand_network(&raw);
        assert_eq!(stats.trips_expanded, 2);
        for trip in events.chunks(4) {
            assert!(trip.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        }
    }

    #[test]
    fn test_speed_rejection() {
        // ~2190 m in 1 minute of travel gives ~36 m/s, over the ceiling
        let raw = network_json(serde_json::json!([
            {"TripId": 1, "StartTime": "07:00", "EndTime": "07:02"}
        ]));
        let (events, stats) = expand_network(&raw);
        assert!(events.is_empty());
        assert_eq!(stats.trips_skipped, 1);
    }

    #[test]
    fn test_too_slow_rejection() {
        // ~2190 m spread over nearly 24 h is far below MIN_AVG_SPEED
        let raw = network_json(serde_json::json!([
            {"TripId": 1, "StartTime": "00:10", "EndTime": "23:50"}
        ]));
        let (events, stats) = expand_network(&raw);
        assert!(events.is_empty());
        assert_eq!(stats.trips_skipped, 1);
    }

    #[test]
    fn test_unparseable_time_drops_trip_only() {
        let raw = network_json(serde_json::json!([
            {"TripId": 1, "StartTime": "garbage", "EndTime": "07:10"},
            {"TripId": 2, "StartTime": "07:20", "EndTime": "07:30"}
        ]));
        let (events, stats) = expand_network(&raw);
        assert_eq!(stats.trips_skipped, 1);
        assert_eq!(stats.trips_expanded, 1);
        assert!(events.iter().all(|e| e.trip_id == 2));
    }

    #[test]
    fn test_overnight_trip() {
        // two stops ~3599 m apart: 23:30 -> 00:30 crosses midnight
        let raw: RawNetwork = serde_json::from_value(serde_json::json!({
            "Route 9": {
                "getroutebyid": {"RouteId": 9, "RouteNo": "09", "Type": "Standard"},
                "getvarsbyroute": [{"RouteVarId": 91, "RouteVarName": "Night"}],
                "getstopsbyvar": {
                    "91": [
                        {"StopId": 100, "Lat": 10.0, "Lng": 106.0, "Name": "A"},
                        {"StopId": 101, "Lat": 10.03237, "Lng": 106.0, "Name": "B"}
                    ]
                },
                "getpathsbyvar": {
                    "91": {"lat": [10.0, 10.03237], "lng": [106.0, 106.0]}
                },
                "gettimetablebyroute": [{"TimeTableId": 5, "RouteVarId": 91}],
                "gettripsbytimetable": {
                    "5": [{"TripId": 1, "StartTime": "23:30", "EndTime": "00:30"}]
                }
            }
        }))
        .unwrap();
        let (events, stats) = expand_network(&raw);
        assert_eq!(stats.trips_expanded, 1);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].timestamp, 84_600);
        assert_eq!(events[0].kind, EventKind::Departure);
        // arrival lands past midnight: end (88200) minus the dwell allowance
        assert!(events[1].timestamp >= 86_400);
        assert_eq!(events[1].timestamp, 88_170);
    }

    #[test]
    fn test_loop_variant_two_events() {
        let raw: RawNetwork = serde_json::from_value(serde_json::json!({
            "Loop": {
                "getroutebyid": {"RouteId": 5, "RouteNo": "05", "Type": "Standard"},
                "getvarsbyroute": [{"RouteVarId": 51, "RouteVarName": "Circle"}],
                "getstopsbyvar": {
                    "51": [
                        {"StopId": 100, "Lat": 10.0, "Lng": 106.0, "Name": "Depot"},
                        {"StopId": 100, "Lat": 10.0, "Lng": 106.0, "Name": "Depot"}
                    ]
                },
                "getpathsbyvar": {
                    // out and back, ~2190 m around
                    "51": {"lat": [10.0, 10.0, 10.0], "lng": [106.0, 106.01, 106.0]}
                },
                "gettimetablebyroute": [{"TimeTableId": 3, "RouteVarId": 51}],
                "gettripsbytimetable": {
                    "3": [{"TripId": 1, "StartTime": "08:00", "EndTime": "08:10"}]
                }
            }
        }))
        .unwrap();
        let (events, stats) = expand_network(&raw);
        assert_eq!(stats.trips_expanded, 1);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::Departure);
        assert_eq!(events[0].timestamp, 28_800);
        assert_eq!(events[1].kind, EventKind::Arrival);
        assert_eq!(events[1].timestamp, 29_400);
    }

    #[test]
    fn test_no_travel_time_left() {
        // 07:00 -> 07:01 with 60 s of dwell leaves nothing to drive in
        let raw = network_json(serde_json::json!([
            {"TripId": 1, "StartTime": "07:00", "EndTime": "07:01"}
        ]));
        let (events, stats) = expand_network(&raw);
        assert!(events.is_empty());
        assert_eq!(stats.trips_skipped, 1);
    }
}
