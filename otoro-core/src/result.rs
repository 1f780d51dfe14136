//! Result types for clustering operations.

use crate::outlier::OutlierScore;

/// Represents the output of an [`crate::Otoro::run`] invocation.
///
/// Labels are contiguous from 1; label `0` marks noise. The outlier records
/// are sorted descending by score.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusteringResult {
    labels: Vec<usize>,
    cluster_count: usize,
    membership_strengths: Vec<f32>,
    outlier_scores: Vec<OutlierScore>,
}

impl ClusteringResult {
    pub(crate) fn new(
        labels: Vec<usize>,
        cluster_count: usize,
        membership_strengths: Vec<f32>,
        outlier_scores: Vec<OutlierScore>,
    ) -> Self {
        debug_assert_eq!(labels.len(), membership_strengths.len());
        debug_assert_eq!(labels.len(), outlier_scores.len());
        Self {
            labels,
            cluster_count,
            membership_strengths,
            outlier_scores,
        }
    }

    /// Returns the per-point cluster labels; `0` marks noise.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Returns the number of clusters in the flat partition.
    #[must_use]
    #[rustfmt::skip]
    pub fn cluster_count(&self) -> usize { self.cluster_count }

    /// Returns each point's membership strength in `[0, 1]`; noise scores 0.
    #[must_use]
    pub fn membership_strengths(&self) -> &[f32] {
        &self.membership_strengths
    }

    /// Returns the outlier records, sorted descending by score.
    #[must_use]
    pub fn outlier_scores(&self) -> &[OutlierScore] {
        &self.outlier_scores
    }

    /// Counts the points labelled as noise.
    #[must_use]
    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|&&label| label == 0).count()
    }

    /// Returns whether the given point was labelled as noise.
    ///
    /// Out-of-range indices answer `false`.
    #[must_use]
    pub fn is_noise(&self, index: usize) -> bool {
        self.labels.get(index).is_some_and(|&label| label == 0)
    }
}
