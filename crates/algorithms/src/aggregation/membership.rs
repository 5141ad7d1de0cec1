//! Assignment of survey clusters to zones
//!
//! Published cluster coordinates are displaced by up to 2 km (urban) or
//! 5 km (rural), so a cluster belongs to every zone its displacement
//! buffer intersects.

use crate::geodesy::{geodesic_area, geodesic_buffer};
use crate::maybe_rayon::*;
use covmap_core::{SampleLocation, Zone};
use geo::{BooleanOps, BoundingRect, Intersects, MultiPolygon, Polygon};
use rstar::{RTree, RTreeObject, AABB};
use serde::Serialize;

#[derive(Debug, Clone)]
struct ZoneEnvelope {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for ZoneEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Cluster/zone incidence in both directions.
///
/// Cluster indices refer to the sample slice the membership was built from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ZoneMembership {
    zone_clusters: Vec<Vec<usize>>,
    cluster_zones: Vec<Vec<usize>>,
}

impl ZoneMembership {
    /// Build from zone → clusters lists over `clusters` samples.
    pub fn from_zone_clusters(zone_clusters: Vec<Vec<usize>>, clusters: usize) -> Self {
        let mut cluster_zones = vec![Vec::new(); clusters];
        for (zone, members) in zone_clusters.iter().enumerate() {
            for &c in members {
                if let Some(zones) = cluster_zones.get_mut(c) {
                    zones.push(zone);
                }
            }
        }
        Self {
            zone_clusters,
            cluster_zones,
        }
    }

    pub fn zone_count(&self) -> usize {
        self.zone_clusters.len()
    }

    pub fn cluster_count(&self) -> usize {
        self.cluster_zones.len()
    }

    /// Clusters whose buffer touches `zone`, ascending.
    pub fn clusters_of(&self, zone: usize) -> &[usize] {
        self.zone_clusters.get(zone).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Zones touched by the buffer of `cluster`, ascending.
    pub fn zones_of(&self, cluster: usize) -> &[usize] {
        self.cluster_zones.get(cluster).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Zones holding at least one cluster.
    pub fn occupied_zones(&self) -> Vec<usize> {
        self.zone_clusters
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_empty())
            .map(|(z, _)| z)
            .collect()
    }

    pub fn zone_clusters(&self) -> &[Vec<usize>] {
        &self.zone_clusters
    }
}

/// Match every sample's displacement buffer against the zone polygons.
pub fn assign_clusters_to_zones(samples: &[SampleLocation], zones: &[Zone]) -> ZoneMembership {
    let entries: Vec<ZoneEnvelope> = zones
        .iter()
        .enumerate()
        .filter_map(|(index, zone)| {
            let b = zone.bounds()?;
            Some(ZoneEnvelope {
                index,
                envelope: AABB::from_corners([b.min().x, b.min().y], [b.max().x, b.max().y]),
            })
        })
        .collect();
    let tree = RTree::bulk_load(entries);

    let cluster_zones: Vec<Vec<usize>> = (0..samples.len())
        .into_par_iter()
        .map(|i| {
            let s = &samples[i];
            let buffer = geodesic_buffer(s.coord, s.area_type.buffer_radius_m());
            let Some(b) = buffer.bounding_rect() else {
                return Vec::new();
            };
            let query = AABB::from_corners([b.min().x, b.min().y], [b.max().x, b.max().y]);
            let mut hits: Vec<usize> = tree
                .locate_in_envelope_intersecting(&query)
                .map(|e| e.index)
                .filter(|&z| buffer.intersects(&zones[z].geometry))
                .collect();
            hits.sort_unstable();
            hits
        })
        .collect();

    let mut zone_clusters = vec![Vec::new(); zones.len()];
    for (cluster, hits) in cluster_zones.iter().enumerate() {
        for &z in hits {
            zone_clusters[z].push(cluster);
        }
    }

    let unmatched = cluster_zones.iter().filter(|z| z.is_empty()).count();
    if unmatched > 0 {
        tracing::debug!("{} of {} clusters touch no zone", unmatched, samples.len());
    }

    ZoneMembership {
        zone_clusters,
        cluster_zones,
    }
}

/// Share of the area of `shape` covered by `other`, on the sphere.
///
/// 0 for a shape without area.
pub fn overlap_fraction(shape: &Polygon<f64>, other: &MultiPolygon<f64>) -> f64 {
    let shape = MultiPolygon::new(vec![shape.clone()]);
    let total = geodesic_area(&shape);
    if total <= 0.0 || !shape.intersects(other) {
        return 0.0;
    }
    geodesic_area(&shape.intersection(other)) / total
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use covmap_core::AreaType;
    use geo::{coord, Rect};

    fn square(id: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> Zone {
        Zone::from_polygon(id, Rect::new(coord! { x: x0, y: y0 }, coord! { x: x1, y: y1 }).to_polygon()).unwrap()
    }

    #[test]
    fn test_buffer_reaches_neighbouring_zone() {
        // 0.03 deg of longitude at the equator is about 3.3 km
        let zones = vec![square("west", 0.0, 0.0, 1.0, 1.0), square("east", 1.0, 0.0, 2.0, 1.0)];
        let samples = vec![
            SampleLocation::new(1, 0.97, 0.5, 0.5, AreaType::Urban),
            SampleLocation::new(2, 0.97, 0.5, 0.5, AreaType::Rural),
            SampleLocation::new(3, 1.5, 0.5, 0.5, AreaType::Urban),
        ];

        let m = assign_clusters_to_zones(&samples, &zones);
        assert_eq!(m.zones_of(0), &[0]);
        assert_eq!(m.zones_of(1), &[0, 1]);
        assert_eq!(m.zones_of(2), &[1]);
        assert_eq!(m.clusters_of(0), &[0, 1]);
        assert_eq!(m.clusters_of(1), &[1, 2]);
        assert_eq!(m.occupied_zones(), vec![0, 1]);
    }

    #[test]
    fn test_far_cluster_is_unassigned() {
        let zones = vec![square("a", 0.0, 0.0, 1.0, 1.0)];
        let samples = vec![SampleLocation::new(1, 3.0, 3.0, 0.5, AreaType::Rural)];
        let m = assign_clusters_to_zones(&samples, &zones);
        assert!(m.zones_of(0).is_empty());
        assert!(m.occupied_zones().is_empty());
        assert_eq!(m.cluster_count(), 1);
        assert_eq!(m.zone_count(), 1);
    }

    #[test]
    fn test_from_zone_clusters_inverts() {
        let m = ZoneMembership::from_zone_clusters(vec![vec![0, 2], vec![2], vec![]], 3);
        assert_eq!(m.zones_of(2), &[0, 1]);
        assert!(m.zones_of(1).is_empty());
        assert!(m.clusters_of(7).is_empty());
    }

    #[test]
    fn test_overlap_fraction() {
        let shape = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 0.1, y: 0.1 }).to_polygon();
        let half = square("h", 0.05, -1.0, 1.0, 1.0).geometry;
        assert_abs_diff_eq!(overlap_fraction(&shape, &half), 0.5, epsilon = 1e-3);

        let whole = square("w", -1.0, -1.0, 1.0, 1.0).geometry;
        assert_abs_diff_eq!(overlap_fraction(&shape, &whole), 1.0, epsilon = 1e-6);

        let apart = square("x", 5.0, 5.0, 6.0, 6.0).geometry;
        assert_eq!(overlap_fraction(&shape, &apart), 0.0);
    }
}
