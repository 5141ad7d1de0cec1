//! Adjacency network of Voronoi regions
//!
//! Two regions are neighbours when their polygons intersect, shared edges
//! and single touching vertices included.

use crate::maybe_rayon::*;
use crate::tessellation::{geometry_gap, VoronoiRegion, SNAP_TOLERANCE};
use geo::{BoundingRect, Coord, Intersects, Rect};
use serde::Serialize;
use std::collections::BTreeSet;

/// Symmetric neighbour lists indexed like the regions they were built from.
///
/// With self-loops every list starts with its own index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjacencyNetwork {
    neighbors: Vec<Vec<usize>>,
    self_loops: bool,
}

impl AdjacencyNetwork {
    /// Wrap raw neighbour lists; symmetry is not checked here.
    pub fn from_lists(neighbors: Vec<Vec<usize>>, self_loops: bool) -> Self {
        Self { neighbors, self_loops }
    }

    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    pub fn has_self_loops(&self) -> bool {
        self.self_loops
    }

    /// Neighbours of node `i` (empty for an unknown node)
    pub fn neighbors(&self, i: usize) -> &[usize] {
        self.neighbors.get(i).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_edge(&self, i: usize, j: usize) -> bool {
        self.neighbors(i).contains(&j)
    }

    /// `j ∈ net[i]` if and only if `i ∈ net[j]`, for all `i != j`.
    pub fn is_symmetric(&self) -> bool {
        self.neighbors.iter().enumerate().all(|(i, list)| {
            list.iter()
                .all(|&j| j == i || (j < self.len() && self.neighbors[j].contains(&i)))
        })
    }

    /// Number of undirected edges, self-loops excluded
    pub fn edge_count(&self) -> usize {
        let directed: usize = self
            .neighbors
            .iter()
            .enumerate()
            .map(|(i, list)| list.iter().filter(|&&j| j != i).count())
            .sum();
        directed / 2
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.neighbors.iter().enumerate().map(|(i, l)| (i, l.as_slice()))
    }

    pub fn into_lists(self) -> Vec<Vec<usize>> {
        self.neighbors
    }
}

fn grown(rect: Rect<f64>) -> Rect<f64> {
    Rect::new(
        Coord {
            x: rect.min().x - SNAP_TOLERANCE,
            y: rect.min().y - SNAP_TOLERANCE,
        },
        Coord {
            x: rect.max().x + SNAP_TOLERANCE,
            y: rect.max().y + SNAP_TOLERANCE,
        },
    )
}

fn regions_touch(a: &VoronoiRegion, b: &VoronoiRegion) -> bool {
    a.polygon.intersects(&b.polygon) || geometry_gap(&a.polygon, &b.polygon, SNAP_TOLERANCE) <= SNAP_TOLERANCE
}

/// Build the region adjacency network.
///
/// Every unordered pair is tested once, bounding boxes first. Lists come
/// out as `[self, ascending neighbours]`.
pub fn build_network(regions: &[VoronoiRegion], include_self_loop: bool) -> AdjacencyNetwork {
    let n = regions.len();
    let boxes: Vec<Option<Rect<f64>>> = regions
        .iter()
        .map(|r| r.polygon.bounding_rect().map(grown))
        .collect();

    // Upper-triangle hits per row
    let upper: Vec<Vec<usize>> = (0..n)
        .into_par_iter()
        .map(|i| {
            let Some(bi) = boxes[i] else {
                return Vec::new();
            };
            ((i + 1)..n)
                .filter(|&j| {
                    boxes[j].map_or(false, |bj| bi.intersects(&bj)) && regions_touch(&regions[i], &regions[j])
                })
                .collect()
        })
        .collect();

    let mut neighbors: Vec<Vec<usize>> = (0..n)
        .map(|i| if include_self_loop { vec![i] } else { Vec::new() })
        .collect();
    let mut lower: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, hits) in upper.iter().enumerate() {
        for &j in hits {
            lower[j].push(i);
        }
    }
    for i in 0..n {
        neighbors[i].extend_from_slice(&lower[i]);
        neighbors[i].extend_from_slice(&upper[i]);
    }

    tracing::debug!(
        "adjacency network: {} regions, {} edges",
        n,
        upper.iter().map(Vec::len).sum::<usize>()
    );

    AdjacencyNetwork::from_lists(neighbors, include_self_loop)
}

/// Link zones that share a member cluster, or where a network neighbour of
/// one zone's clusters is a member of the other.
///
/// `zone_clusters[z]` lists the cluster indices (network nodes) of zone
/// `z`. The result has no self-loops and sorted, duplicate-free lists.
pub fn settlement_network(zone_clusters: &[Vec<usize>], network: &AdjacencyNetwork) -> AdjacencyNetwork {
    let n = zone_clusters.len();
    let members: Vec<BTreeSet<usize>> = zone_clusters
        .iter()
        .map(|c| c.iter().copied().collect())
        .collect();
    let reach: Vec<BTreeSet<usize>> = members
        .iter()
        .map(|m| {
            m.iter()
                .flat_map(|&c| network.neighbors(c).iter().copied())
                .filter(|c| !m.contains(c))
                .collect()
        })
        .collect();

    let mut links: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
    for i in 0..n {
        for j in (i + 1)..n {
            let linked = !members[i].is_disjoint(&members[j]) || !reach[i].is_disjoint(&members[j]);
            if linked {
                links[i].insert(j);
                links[j].insert(i);
            }
        }
    }

    AdjacencyNetwork::from_lists(links.into_iter().map(|s| s.into_iter().collect()).collect(), false)
}
