use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::time::Instant;

use crate::config::Config;
use crate::graph::error::Error;
use crate::graph::events::EventKind;
use crate::graph::link_table::{LinkMode, LinkWriter};
use crate::graph::node_table::NodeRecord;
use crate::graph::stop_index::StopIndex;
use crate::routes::structs::Stop;

/// Rides longer than this are treated as timetable anomalies and dropped.
/// Well-formed trips never get close; legacy data occasionally does.
const MAX_RIDE_DURATION: i64 = 1800;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub bus: u64,
    pub wait: u64,
    pub transfer: u64,
    pub walk: u64,
}

impl LinkStats {
    pub fn total(&self) -> u64 {
        self.bus + self.wait + self.transfer + self.walk
    }

    pub fn print_stats(&self) {
        println!("Link table:");
        println!("  bus: {}", self.bus);
        println!("  wait: {}", self.wait);
        println!("  transfer: {}", self.transfer);
        println!("  walk: {}", self.walk);
        println!("  total: {}", self.total());
    }
}

/// Run all four builders against one writer, in the committed output order:
/// bus, wait, transfer, walk. The node table is read-only from here on;
/// memory is bounded by the writer's chunking, not the edge count.
pub fn build_links<W: Write>(
    nodes: &[NodeRecord],
    stops: &HashMap<i64, Stop>,
    config: &Config,
    writer: &mut LinkWriter<W>,
) -> Result<LinkStats, Error> {
    let mut stats = LinkStats::default();

    let started = Instant::now();
    stats.bus = ride_links(nodes, writer)?;
    log::info!("created {} bus links in {:.1?}", stats.bus, started.elapsed());

    let started = Instant::now();
    stats.wait = wait_links(nodes, writer)?;
    log::info!("created {} wait links in {:.1?}", stats.wait, started.elapsed());

    let started = Instant::now();
    stats.transfer = transfer_links(nodes, config, writer)?;
    log::info!(
        "created {} transfer links in {:.1?}",
        stats.transfer,
        started.elapsed()
    );

    let started = Instant::now();
    stats.walk = walk_links(nodes, stops, config, writer)?;
    log::info!("created {} walk links in {:.1?}", stats.walk, started.elapsed());

    Ok(stats)
}

/// Split a group into its arrivals and departures, each sorted by
/// `(timestamp, node_id)` so every downstream scan is reproducible.
fn split_sorted<'a>(
    group: &[&'a NodeRecord],
) -> (Vec<&'a NodeRecord>, Vec<&'a NodeRecord>) {
    let mut arrivals: Vec<&NodeRecord> = group
        .iter()
        .filter(|n| n.event == EventKind::Arrival)
        .copied()
        .collect();
    let mut departures: Vec<&NodeRecord> = group
        .iter()
        .filter(|n| n.event == EventKind::Departure)
        .copied()
        .collect();
    arrivals.sort_by_key(|n| (n.timestamp, n.node_id));
    departures.sort_by_key(|n| (n.timestamp, n.node_id));
    (arrivals, departures)
}

/// Ride links (`bus`): per trip, each DEPARTURE to the first ARRIVAL
/// strictly after it.
pub fn ride_links<W: Write>(
    nodes: &[NodeRecord],
    writer: &mut LinkWriter<W>,
) -> Result<u64, Error> {
    let mut groups: BTreeMap<(i64, i64), Vec<&NodeRecord>> = BTreeMap::new();
    for node in nodes {
        groups
            .entry((node.route_id, node.trip_id))
            .or_default()
            .push(node);
    }

    let mut count = 0;
    for group in groups.values() {
        let (arrivals, departures) = split_sorted(group);
        for departure in &departures {
            let next = arrivals.partition_point(|a| a.timestamp <= departure.timestamp);
            if let Some(arrival) = arrivals.get(next) {
                let duration = arrival.timestamp - departure.timestamp;
                if duration < MAX_RIDE_DURATION {
                    writer.push(departure.node_id, arrival.node_id, duration, LinkMode::Bus)?;
                    count += 1;
                }
            }
        }
    }
    Ok(count)
}

/// Wait links: per (stop, route), each ARRIVAL to every later DEPARTURE.
/// Deliberately unbounded; downstream queries apply their own budgets.
pub fn wait_links<W: Write>(
    nodes: &[NodeRecord],
    writer: &mut LinkWriter<W>,
) -> Result<u64, Error> {
    let mut groups: BTreeMap<(i64, i64), Vec<&NodeRecord>> = BTreeMap::new();
    for node in nodes {
        groups
            .entry((node.stop_id, node.route_id))
            .or_default()
            .push(node);
    }

    let mut count = 0;
    for group in groups.values() {
        let (arrivals, departures) = split_sorted(group);
        for arrival in &arrivals {
            let start = departures.partition_point(|d| d.timestamp <= arrival.timestamp);
            for departure in &departures[start..] {
                writer.push(
                    arrival.node_id,
                    departure.node_id,
                    departure.timestamp - arrival.timestamp,
                    LinkMode::Wait,
                )?;
                count += 1;
            }
        }
    }
    Ok(count)
}

/// Transfer links: per stop, each ARRIVAL to later DEPARTUREs of *other*
/// routes within the configured transfer window.
pub fn transfer_links<W: Write>(
    nodes: &[NodeRecord],
    config: &Config,
    writer: &mut LinkWriter<W>,
) -> Result<u64, Error> {
    let mut groups: BTreeMap<i64, Vec<&NodeRecord>> = BTreeMap::new();
    for node in nodes {
        groups.entry(node.stop_id).or_default().push(node);
    }

    let mut count = 0;
    for group in groups.values() {
        let (arrivals, departures) = split_sorted(group);
        for arrival in &arrivals {
            let start = departures.partition_point(|d| d.timestamp <= arrival.timestamp);
            for departure in &departures[start..] {
                let duration = departure.timestamp - arrival.timestamp;
                if duration > config.max_transfer_time {
                    break;
                }
                if duration >= config.min_transfer_time && departure.route_id != arrival.route_id {
                    writer.push(arrival.node_id, departure.node_id, duration, LinkMode::Transfer)?;
                    count += 1;
                }
            }
        }
    }
    Ok(count)
}

/// Walk links: each ARRIVAL to departures at stops within walking radius,
/// but only between stops with disjoint route sets, and only when the
/// departure leaves time to walk there and falls inside the combined
/// walk + wait budget. `duration` is the full elapsed time, walk included.
pub fn walk_links<W: Write>(
    nodes: &[NodeRecord],
    stops: &HashMap<i64, Stop>,
    config: &Config,
    writer: &mut LinkWriter<W>,
) -> Result<u64, Error> {
    let index = StopIndex::build(stops.values());

    let mut departures_by_stop: BTreeMap<i64, Vec<&NodeRecord>> = BTreeMap::new();
    for node in nodes {
        if node.event == EventKind::Departure {
            departures_by_stop.entry(node.stop_id).or_default().push(node);
        }
    }
    for departures in departures_by_stop.values_mut() {
        departures.sort_by_key(|n| (n.timestamp, n.node_id));
    }

    let mut count = 0;
    for arrival in nodes.iter().filter(|n| n.event == EventKind::Arrival) {
        let Some(stop) = stops.get(&arrival.stop_id) else {
            log::warn!("arrival node {} at unknown stop {}", arrival.node_id, arrival.stop_id);
            continue;
        };

        for (neighbor_id, distance) in index.within_radius(stop, config.walking_radius) {
            let Some(neighbor) = stops.get(&neighbor_id) else {
                continue;
            };
            // a walk between stops that share a route is never preferable
            // to waiting at the current one
            if !stop.routes.is_disjoint(&neighbor.routes) {
                continue;
            }
            let Some(departures) = departures_by_stop.get(&neighbor_id) else {
                continue;
            };

            let earliest = arrival.timestamp as f64 + distance / config.walking_speed;
            let start = departures.partition_point(|d| (d.timestamp as f64) < earliest);
            for departure in &departures[start..] {
                let duration = departure.timestamp - arrival.timestamp;
                if duration > config.max_walk_wait_time {
                    break;
                }
                if duration > 0 {
                    writer.push(arrival.node_id, departure.node_id, duration, LinkMode::Walk)?;
                    count += 1;
                }
            }
        }
    }
    Ok(count)
}
