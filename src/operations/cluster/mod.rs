//! Density-based grouping of items under a caller-supplied adjacency predicate.
//!
//! Expansion is breadth-first from each unvisited core item, visiting items in
//! input order, so membership order is fully determined by the input order.

use std::collections::VecDeque;

use crate::geometry::Segment;
use crate::math::{Point3, Tolerance};

/// Result of a clustering pass.
///
/// `clusters` partition every item that is reachable from a core item;
/// `noise` holds the items whose neighbourhood never reached the minimum
/// count and that no cluster claimed.
#[derive(Debug, Clone, PartialEq)]
pub struct Clusters<T> {
    pub clusters: Vec<Vec<T>>,
    pub noise: Vec<T>,
}

impl<T> Clusters<T> {
    /// Returns all groups, with each noise item appended as a singleton.
    #[must_use]
    pub fn with_noise_as_singletons(self) -> Vec<Vec<T>> {
        let mut groups = self.clusters;
        groups.extend(self.noise.into_iter().map(|item| vec![item]));
        groups
    }
}

/// Clustering parameters.
///
/// `min_neighbors` counts the item itself, so `1` makes every item a core
/// item and isolated items become singleton clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clustering {
    pub min_neighbors: usize,
}

impl Default for Clustering {
    fn default() -> Self {
        Self { min_neighbors: 1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    Noise,
    Assigned,
}

impl Clustering {
    /// Creates clustering parameters.
    #[must_use]
    pub fn new(min_neighbors: usize) -> Self {
        Self { min_neighbors }
    }

    /// Groups item indices under `adjacent`.
    pub fn group_indices<T, F>(&self, items: &[T], adjacent: F) -> Clusters<usize>
    where
        F: Fn(&T, &T) -> bool,
    {
        let n = items.len();
        let neighbors: Vec<Vec<usize>> = (0..n)
            .map(|i| {
                (0..n)
                    .filter(|&j| j != i && adjacent(&items[i], &items[j]))
                    .collect()
            })
            .collect();
        let is_core = |i: usize| neighbors[i].len() + 1 >= self.min_neighbors;

        let mut state = vec![Visit::Unvisited; n];
        let mut clusters: Vec<Vec<usize>> = Vec::new();

        for seed in 0..n {
            if state[seed] != Visit::Unvisited {
                continue;
            }
            if !is_core(seed) {
                state[seed] = Visit::Noise;
                continue;
            }

            let mut members = vec![seed];
            state[seed] = Visit::Assigned;
            let mut queue: VecDeque<usize> = neighbors[seed].iter().copied().collect();

            while let Some(q) = queue.pop_front() {
                match state[q] {
                    Visit::Assigned => continue,
                    // Border item: claimed, but does not expand further.
                    Visit::Noise => {
                        state[q] = Visit::Assigned;
                        members.push(q);
                    }
                    Visit::Unvisited => {
                        state[q] = Visit::Assigned;
                        members.push(q);
                        if is_core(q) {
                            queue.extend(
                                neighbors[q]
                                    .iter()
                                    .copied()
                                    .filter(|&r| state[r] != Visit::Assigned),
                            );
                        }
                    }
                }
            }
            clusters.push(members);
        }

        let noise = (0..n).filter(|&i| state[i] == Visit::Noise).collect();
        Clusters { clusters, noise }
    }

    /// Groups items under `adjacent`, returning clones of the items.
    pub fn group<T, F>(&self, items: &[T], adjacent: F) -> Clusters<T>
    where
        T: Clone,
        F: Fn(&T, &T) -> bool,
    {
        let indices = self.group_indices(items, adjacent);
        Clusters {
            clusters: indices
                .clusters
                .iter()
                .map(|c| c.iter().map(|&i| items[i].clone()).collect())
                .collect(),
            noise: indices.noise.iter().map(|&i| items[i].clone()).collect(),
        }
    }
}

/// Clusters items under a binary adjacency predicate.
pub fn cluster_by<T, F>(items: &[T], adjacent: F, min_neighbors: usize) -> Clusters<T>
where
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    Clustering::new(min_neighbors).group(items, adjacent)
}

/// Clusters points whose mutual distance is at most `threshold`.
#[must_use]
pub fn cluster_points(points: &[Point3], threshold: f64, min_neighbors: usize) -> Clusters<Point3> {
    let threshold_sq = threshold * threshold;
    cluster_by(
        points,
        |a, b| (a - b).norm_squared() <= threshold_sq,
        min_neighbors,
    )
}

/// Groups segments into connected components: two segments are adjacent
/// when any pair of their endpoints coincides within tolerance.
#[must_use]
pub fn cluster_segments(segments: &[Segment], tol: &Tolerance) -> Vec<Vec<Segment>> {
    cluster_by(segments, |a, b| a.touches(b, tol), 1).with_noise_as_singletons()
}

/// Collapses points lying within tolerance of each other, keeping the first
/// point of every cluster as its representative.
#[must_use]
pub fn cull_duplicate_points(points: &[Point3], tol: &Tolerance) -> Vec<Point3> {
    cluster_points(points, tol.distance, 1)
        .with_noise_as_singletons()
        .into_iter()
        .filter_map(|c| c.first().copied())
        .collect()
}
