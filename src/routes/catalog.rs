use std::collections::HashMap;

use geo_types::Point;

use crate::routes::raw::{RawNetwork, RawRoute};
use crate::routes::structs::{Route, Stop, Timetable, TripWindow, Variant};

/// Normalized view of the raw routes dump: usable variants in a stable
/// order plus the global stop table.
///
/// Structural defects in the input (missing stops or paths, too-short
/// sequences, dangling variant references) are logged and skipped; the
/// catalog never fails to build.
#[derive(Debug, Default)]
pub struct Catalog {
    /// Routes by `route_id`
    pub routes: HashMap<i64, Route>,
    /// Variants in ingestion order: route key order, then variant order
    /// within the route. Node ids depend on this order being stable.
    pub variants: Vec<Variant>,
    /// Stops by `stop_id`, unioned across all variants
    pub stops: HashMap<i64, Stop>,
}

impl Catalog {
    pub fn print_stats(&self) {
        println!("Route catalog:");
        println!("  Routes: {}", self.routes.len());
        println!("  Variants: {}", self.variants.len());
        println!("  Stops: {}", self.stops.len());
    }

    /// Build a catalog from the raw dump.
    ///
    /// Routes are visited in sorted key order so that downstream id
    /// assignment is reproducible across runs. `route_limit` caps how many
    /// routes are ingested, counted after sorting.
    pub fn from_raw(raw: &RawNetwork, route_limit: Option<usize>) -> Catalog {
        let mut catalog = Catalog::default();

        let mut keys: Vec<&String> = raw.keys().collect();
        keys.sort();
        if let Some(limit) = route_limit {
            keys.truncate(limit);
        }

        for key in keys {
            catalog.ingest_route(key, &raw[key]);
        }
        catalog
    }

    fn ingest_route(&mut self, key: &str, raw: &RawRoute) {
        let info = match &raw.info {
            Some(info) => info,
            None => {
                log::warn!("route {}: missing route info, skipping", key);
                return;
            }
        };
        let route_id = info.route_id;

        for variant in &raw.variants {
            let variant_key = variant.variant_id.to_string();

            let stops = match raw.stops_by_variant.get(&variant_key) {
                Some(stops) if stops.len() >= 2 => stops,
                Some(_) => {
                    log::warn!(
                        "route {} variant {}: fewer than two stops, skipping",
                        route_id,
                        variant.variant_id
                    );
                    continue;
                }
                None => {
                    log::warn!(
                        "route {} variant {}: missing stops, skipping",
                        route_id,
                        variant.variant_id
                    );
                    continue;
                }
            };

            let polyline = match raw.paths_by_variant.get(&variant_key) {
                Some(path) => {
                    let polyline: Vec<Point<f64>> = path
                        .lat
                        .iter()
                        .zip(path.lng.iter())
                        .map(|(&lat, &lng)| Point::new(lng, lat))
                        .collect();
                    if polyline.len() < 2 {
                        log::warn!(
                            "route {} variant {}: polyline has fewer than two vertices, skipping",
                            route_id,
                            variant.variant_id
                        );
                        continue;
                    }
                    polyline
                }
                None => {
                    log::warn!(
                        "route {} variant {}: missing path, skipping",
                        route_id,
                        variant.variant_id
                    );
                    continue;
                }
            };

            let timetables: Vec<Timetable> = raw
                .timetables
                .iter()
                .filter(|t| t.variant_id == variant.variant_id)
                .map(|t| Timetable {
                    timetable_id: t.timetable_id,
                    trips: raw
                        .trips_by_timetable
                        .get(&t.timetable_id.to_string())
                        .map(|trips| {
                            trips
                                .iter()
                                .map(|trip| TripWindow {
                                    trip_id: trip.trip_id,
                                    start_time: trip.start_time.clone(),
                                    end_time: trip.end_time.clone(),
                                })
                                .collect()
                        })
                        .unwrap_or_default(),
                })
                .collect();

            // Union the variant's stops into the global table
            for stop in stops {
                self.stops
                    .entry(stop.stop_id)
                    .or_insert_with(|| Stop {
                        stop_id: stop.stop_id,
                        lat: stop.lat,
                        lng: stop.lng,
                        name: stop.name.clone(),
                        routes: Default::default(),
                    })
                    .routes
                    .insert(route_id);
            }

            self.variants.push(Variant {
                route_id,
                variant_id: variant.variant_id,
                variant_name: variant.variant_name.clone(),
                stops: stops.iter().map(|s| s.stop_id).collect(),
                polyline,
                timetables,
            });
        }

        // timetables pointing at a variant the dump never declares
        for timetable in &raw.timetables {
            if !raw.variants.iter().any(|v| v.variant_id == timetable.variant_id) {
                log::warn!(
                    "route {} timetable {}: references unknown variant {}",
                    route_id,
                    timetable.timetable_id,
                    timetable.variant_id
                );
            }
        }

        self.routes.insert(
            route_id,
            Route {
                route_id,
                route_no: info.route_no.clone(),
                bus_type: info.bus_type.clone(),
            },
        );
    }
}
