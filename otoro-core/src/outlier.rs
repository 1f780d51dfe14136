//! Per-point outlier scoring from the propagated cluster tree.
//!
//! A point's score compares the level at which it fell to noise against the
//! lowest level any part of its last cluster survived to:
//! `1 - (lowest_child_death_level / noise_level)`. Points that never became
//! noise score 0. Scores are written directly into a result vector indexed by
//! point, then sorted descending.

use std::cmp::Ordering;

use crate::tree::ClusterTree;

/// Errors returned by outlier scoring.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
#[non_exhaustive]
pub enum OutlierError {
    /// The cluster tree has not been propagated yet.
    #[error("outlier scores require a propagated cluster tree")]
    NotPropagated,
    /// Input array lengths disagreed.
    #[error(
        "per-point arrays disagree: {noise_levels} noise levels, {last_clusters} last clusters, {core_distances} core distances"
    )]
    LengthMismatch {
        /// Number of noise level entries supplied.
        noise_levels: usize,
        /// Number of last-cluster entries supplied.
        last_clusters: usize,
        /// Number of core distance entries supplied.
        core_distances: usize,
    },
    /// A last-cluster entry did not refer to a live cluster.
    #[error("point {index} names last cluster {label}, which does not exist")]
    UnknownCluster {
        /// The point whose last-cluster entry is dangling.
        index: usize,
        /// The unresolved cluster label.
        label: usize,
    },
}

impl OutlierError {
    /// Returns a stable, machine-readable error code for the variant.
    #[must_use]
    pub const fn code(&self) -> OutlierErrorCode {
        match self {
            Self::NotPropagated => OutlierErrorCode::NotPropagated,
            Self::LengthMismatch { .. } => OutlierErrorCode::LengthMismatch,
            Self::UnknownCluster { .. } => OutlierErrorCode::UnknownCluster,
        }
    }
}

/// Machine-readable error codes for [`OutlierError`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OutlierErrorCode {
    /// The cluster tree has not been propagated yet.
    NotPropagated,
    /// Input array lengths disagreed.
    LengthMismatch,
    /// A last-cluster entry did not refer to a live cluster.
    UnknownCluster,
}

impl OutlierErrorCode {
    /// Returns the symbolic identifier for logging surfaces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotPropagated => "NOT_PROPAGATED",
            Self::LengthMismatch => "LENGTH_MISMATCH",
            Self::UnknownCluster => "UNKNOWN_CLUSTER",
        }
    }
}

/// One point's outlier record.
///
/// Orders descending by score, breaking ties by descending core distance and
/// then ascending point index, so a sorted list is deterministic.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutlierScore {
    score: f32,
    core_distance: f32,
    index: usize,
}

impl OutlierScore {
    /// Returns the outlier score in `(-inf, 1]`; larger is more anomalous.
    #[must_use]
    #[rustfmt::skip]
    pub fn score(&self) -> f32 { self.score }

    /// Returns the point's core distance.
    #[must_use]
    #[rustfmt::skip]
    pub fn core_distance(&self) -> f32 { self.core_distance }

    /// Returns the point index the record describes.
    #[must_use]
    #[rustfmt::skip]
    pub fn index(&self) -> usize { self.index }
}

impl Eq for OutlierScore {}

impl Ord for OutlierScore {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.core_distance.total_cmp(&self.core_distance))
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl PartialOrd for OutlierScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Derives outlier scores for every point and returns them sorted descending.
///
/// `point_noise_levels[i]` is the mutual-reachability level at which point
/// `i` fell to noise (0 if it never did) and `point_last_clusters[i]` the
/// label it held just before.
///
/// # Errors
/// Returns [`OutlierError::NotPropagated`] when the tree has not been
/// propagated, [`OutlierError::LengthMismatch`] when the per-point arrays
/// disagree, and [`OutlierError::UnknownCluster`] for dangling last-cluster
/// labels.
pub fn score_outliers(
    tree: &ClusterTree,
    point_noise_levels: &[f32],
    point_last_clusters: &[usize],
    core_distances: &[f32],
) -> Result<Vec<OutlierScore>, OutlierError> {
    if !tree.is_propagated() {
        return Err(OutlierError::NotPropagated);
    }
    if point_noise_levels.len() != point_last_clusters.len()
        || point_noise_levels.len() != core_distances.len()
    {
        return Err(OutlierError::LengthMismatch {
            noise_levels: point_noise_levels.len(),
            last_clusters: point_last_clusters.len(),
            core_distances: core_distances.len(),
        });
    }

    let mut scores = Vec::with_capacity(point_noise_levels.len());
    for (index, (&epsilon, (&last_cluster, &core_distance))) in point_noise_levels
        .iter()
        .zip(point_last_clusters.iter().zip(core_distances.iter()))
        .enumerate()
    {
        let score = if epsilon == 0.0 {
            0.0
        } else {
            let epsilon_max = tree
                .cluster(last_cluster)
                .ok_or(OutlierError::UnknownCluster {
                    index,
                    label: last_cluster,
                })?
                .propagated_lowest_child_death_level();
            1.0 - epsilon_max / epsilon
        };
        scores.push(OutlierScore {
            score,
            core_distance,
            index,
        });
    }

    scores.sort_unstable();
    Ok(scores)
}
