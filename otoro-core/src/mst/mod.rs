//! Mutual-reachability minimum spanning tree construction.
//!
//! The tree is built with a dense Prim scan over the mutual-reachability
//! distance `max(d(a, b), core(a), core(b))`. The scan starts from the last
//! point index, keeps the best attached neighbour per unattached point, and
//! attaches the globally nearest candidate each round. Among equal candidate
//! distances the first point index encountered in the ascending scan wins, so
//! the result is deterministic for a fixed input.
//!
//! When requested, one self-edge per point (weight = that point's own core
//! distance) is appended after the tree edges; the hierarchy driver uses them
//! to model a point surviving as a singleton down to its own density level.

use std::cmp::Ordering;

use crate::{DistanceSource, bitset::BitSet, error::DistanceSourceError};

/// Errors returned while computing the mutual-reachability spanning tree.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
#[non_exhaustive]
pub enum MstError {
    /// The algorithm requires at least two points.
    #[error("MST construction requires at least 2 points (got {items})")]
    TooFewPoints {
        /// Number of points supplied.
        items: usize,
    },
    /// Core distance array length did not match the source length.
    #[error("source has {items} points but {core_distances} core distances were given")]
    CoreDistanceLengthMismatch {
        /// Number of points in the source.
        items: usize,
        /// Number of core distances supplied.
        core_distances: usize,
    },
    /// A pairwise distance was negative or non-finite.
    #[error("distance between {left} and {right} is not a valid metric value")]
    InvalidDistance {
        /// Left-hand point index of the offending pair.
        left: usize,
        /// Right-hand point index of the offending pair.
        right: usize,
    },
    /// The distance source failed mid-scan.
    #[error("distance source failed: {0}")]
    DataSource(#[from] DistanceSourceError),
    /// An internal invariant was violated, indicating a logic error.
    #[error("MST invariant violated: {invariant}")]
    InvariantViolation {
        /// Name of the violated invariant to assist debugging.
        invariant: &'static str,
    },
}

impl MstError {
    /// Returns a stable, machine-readable error code for the variant.
    #[must_use]
    pub const fn code(&self) -> MstErrorCode {
        match self {
            Self::TooFewPoints { .. } => MstErrorCode::TooFewPoints,
            Self::CoreDistanceLengthMismatch { .. } => MstErrorCode::CoreDistanceLengthMismatch,
            Self::InvalidDistance { .. } => MstErrorCode::InvalidDistance,
            Self::DataSource(_) => MstErrorCode::DataSource,
            Self::InvariantViolation { .. } => MstErrorCode::InvariantViolation,
        }
    }
}

/// Machine-readable error codes for [`MstError`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MstErrorCode {
    /// The algorithm requires at least two points.
    TooFewPoints,
    /// Core distance array length did not match the source length.
    CoreDistanceLengthMismatch,
    /// A pairwise distance was negative or non-finite.
    InvalidDistance,
    /// The distance source failed mid-scan.
    DataSource,
    /// An internal invariant was violated.
    InvariantViolation,
}

impl MstErrorCode {
    /// Returns the symbolic identifier for logging surfaces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TooFewPoints => "TOO_FEW_POINTS",
            Self::CoreDistanceLengthMismatch => "CORE_DISTANCE_LENGTH_MISMATCH",
            Self::InvalidDistance => "INVALID_DISTANCE",
            Self::DataSource => "DATA_SOURCE",
            Self::InvariantViolation => "INVARIANT_VIOLATION",
        }
    }
}

/// A single edge of the mutual-reachability graph.
///
/// Tree edges are canonicalised to `source <= target`; self-edges have
/// `source == target`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GraphEdge {
    source: usize,
    target: usize,
    weight: f32,
}

impl GraphEdge {
    /// Returns the smaller endpoint id.
    #[must_use]
    #[rustfmt::skip]
    pub fn source(&self) -> usize { self.source }

    /// Returns the larger endpoint id.
    #[must_use]
    #[rustfmt::skip]
    pub fn target(&self) -> usize { self.target }

    /// Returns the mutual-reachability weight of the edge.
    #[must_use]
    #[rustfmt::skip]
    pub fn weight(&self) -> f32 { self.weight }

    /// Returns whether the edge is a self-edge.
    #[must_use]
    pub fn is_self_edge(&self) -> bool {
        self.source == self.target
    }
}

impl Eq for GraphEdge {}

impl Ord for GraphEdge {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .total_cmp(&other.weight)
            .then_with(|| self.source.cmp(&other.source))
            .then_with(|| self.target.cmp(&other.target))
    }
}

impl PartialOrd for GraphEdge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The undirected graph produced by MST construction.
///
/// Holds exactly `N - 1` tree edges, followed by `N` self-edges when those
/// were requested. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct MutualReachabilityGraph {
    node_count: usize,
    edges: Vec<GraphEdge>,
}

impl MutualReachabilityGraph {
    /// Returns the number of points the graph spans.
    #[must_use]
    #[rustfmt::skip]
    pub fn node_count(&self) -> usize { self.node_count }

    /// Returns the graph edges: tree edges first, then any self-edges.
    #[must_use]
    #[rustfmt::skip]
    pub fn edges(&self) -> &[GraphEdge] { &self.edges }
}

/// Builds the mutual-reachability MST over every point of the source.
///
/// # Errors
/// Returns [`MstError::TooFewPoints`] for fewer than two points,
/// [`MstError::CoreDistanceLengthMismatch`] when the core distance array does
/// not match the source, [`MstError::InvalidDistance`] for negative or
/// non-finite distances, and [`MstError::DataSource`] when the source itself
/// fails.
pub fn build_mutual_reachability_mst<D: DistanceSource>(
    source: &D,
    core_distances: &[f32],
    self_edges: bool,
) -> Result<MutualReachabilityGraph, MstError> {
    let items = source.len();
    if items < 2 {
        return Err(MstError::TooFewPoints { items });
    }
    if core_distances.len() != items {
        return Err(MstError::CoreDistanceLengthMismatch {
            items,
            core_distances: core_distances.len(),
        });
    }

    let capacity = items - 1 + if self_edges { items } else { 0 };
    let mut edges = Vec::with_capacity(capacity);

    let mut attached = BitSet::with_capacity(items);
    let mut nearest_neighbour = vec![0usize; items];
    let mut nearest_distance = vec![f32::INFINITY; items];

    let mut current = items - 1;
    attached.insert(current);
    let mut attached_count = 1;

    while attached_count < items {
        let mut best_point = None;
        let mut best_distance = f32::INFINITY;

        for neighbour in 0..items {
            if neighbour == current || attached.contains(neighbour) {
                continue;
            }
            let distance = source.distance(current, neighbour)?;
            if !distance.is_finite() || distance < 0.0 {
                return Err(MstError::InvalidDistance {
                    left: current,
                    right: neighbour,
                });
            }
            let reachability = distance
                .max(core_distances[current])
                .max(core_distances[neighbour]);
            if reachability < nearest_distance[neighbour] {
                nearest_distance[neighbour] = reachability;
                nearest_neighbour[neighbour] = current;
            }
            if nearest_distance[neighbour] < best_distance {
                best_distance = nearest_distance[neighbour];
                best_point = Some(neighbour);
            }
        }

        let next = best_point.ok_or(MstError::InvariantViolation {
            invariant: "an unattached point must remain reachable",
        })?;
        let partner = nearest_neighbour[next];
        edges.push(GraphEdge {
            source: next.min(partner),
            target: next.max(partner),
            weight: nearest_distance[next],
        });
        attached.insert(next);
        attached_count += 1;
        current = next;
    }

    if self_edges {
        for point in 0..items {
            edges.push(GraphEdge {
                source: point,
                target: point,
                weight: core_distances[point],
            });
        }
    }

    Ok(MutualReachabilityGraph {
        node_count: items,
        edges,
    })
}

#[cfg(test)]
mod property;
#[cfg(test)]
mod tests;
