use geo_types::Point;
use rstar::{Envelope, PointDistance, RTree, RTreeObject, AABB};

use crate::graph::geo_util;
use crate::routes::structs::Stop;

/// A stop wrapped for the R-tree.
#[derive(Debug, Clone, PartialEq)]
pub struct StopNode {
    envelope: AABB<[f64; 2]>,
    pub stop_id: i64,
    pub point: Point<f64>,
}

impl RTreeObject for StopNode {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl PointDistance for StopNode {
    fn distance_2(&self, point: &<Self::Envelope as Envelope>::Point) -> f64 {
        self.envelope.distance_2(point)
    }
}

/// Spatial index over the stop table for walk-neighbor queries.
///
/// Queries prefilter with a degree-space envelope and confirm with exact
/// haversine distance, so the envelope slack never leaks into results.
pub struct StopIndex {
    tree: RTree<StopNode>,
}

impl StopIndex {
    pub fn build<'a, I>(stops: I) -> StopIndex
    where
        I: IntoIterator<Item = &'a Stop>,
    {
        let nodes: Vec<StopNode> = stops
            .into_iter()
            .map(|stop| StopNode {
                envelope: AABB::from_point([stop.lng, stop.lat]),
                stop_id: stop.stop_id,
                point: stop.point(),
            })
            .collect();
        StopIndex {
            tree: RTree::bulk_load(nodes),
        }
    }

    /// Stops within `radius` meters of `center`, excluding `center` itself.
    /// Sorted by stop id so callers iterate in a reproducible order.
    pub fn within_radius(&self, center: &Stop, radius: f64) -> Vec<(i64, f64)> {
        let envelope = geo_util::compute_envelope(center.point(), radius);
        let mut found: Vec<(i64, f64)> = self
            .tree
            .locate_in_envelope(&envelope)
            .filter(|node| node.stop_id != center.stop_id)
            .filter_map(|node| {
                let distance = geo_util::haversine(center.point(), node.point);
                (distance <= radius).then_some((node.stop_id, distance))
            })
            .collect();
        found.sort_by_key(|&(stop_id, _)| stop_id);
        found
    }
}
