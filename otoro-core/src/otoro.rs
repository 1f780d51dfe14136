//! Core clustering orchestration for the Otoro library.
//!
//! Provides the [`Otoro`] runtime entry point: a validated configuration that
//! runs the density-clustering pipeline against a caller-supplied
//! [`DistanceSource`].

use std::num::NonZeroUsize;

use tracing::{info, instrument};

use crate::{
    Constraint, DistanceSource, Result,
    pipeline::{PipelineOutput, run_pipeline},
    result::ClusteringResult,
};

/// Entry point for running the clustering pipeline.
///
/// # Examples
/// ```
/// use otoro_core::{DenseDistanceMatrix, OtoroBuilder};
///
/// // Two tight pairs far apart.
/// let matrix = DenseDistanceMatrix::try_new(vec![
///     vec![0.0, 1.0, 14.142136, 14.866069],
///     vec![1.0, 0.0, 13.453624, 14.142136],
///     vec![14.142136, 13.453624, 0.0, 1.0],
///     vec![14.866069, 14.142136, 1.0, 0.0],
/// ])?;
///
/// let otoro = OtoroBuilder::new()
///     .with_min_points(2)
///     .with_min_cluster_size(2)
///     .build()
///     .expect("builder must succeed");
/// let result = otoro.run(&matrix).expect("run must succeed");
///
/// assert_eq!(result.cluster_count(), 2);
/// assert_eq!(result.labels()[0], result.labels()[1]);
/// assert_eq!(result.labels()[2], result.labels()[3]);
/// assert_ne!(result.labels()[0], result.labels()[2]);
/// assert_eq!(result.noise_count(), 0);
/// # Ok::<(), otoro_core::DistanceSourceError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Otoro {
    min_points: NonZeroUsize,
    min_cluster_size: NonZeroUsize,
    self_edges: bool,
}

impl Otoro {
    pub(crate) fn new(
        min_points: NonZeroUsize,
        min_cluster_size: NonZeroUsize,
        self_edges: bool,
    ) -> Self {
        Self {
            min_points,
            min_cluster_size,
            self_edges,
        }
    }

    /// Returns the neighbourhood size used for core distances.
    #[must_use]
    pub fn min_points(&self) -> NonZeroUsize {
        self.min_points
    }

    /// Returns the minimum cluster size configured for this instance.
    #[must_use]
    pub fn min_cluster_size(&self) -> NonZeroUsize {
        self.min_cluster_size
    }

    /// Returns whether the spanning tree will carry per-point self-edges.
    #[must_use]
    pub fn self_edges(&self) -> bool {
        self.self_edges
    }

    /// Executes the clustering pipeline against the provided [`DistanceSource`].
    ///
    /// # Errors
    /// Returns [`crate::OtoroError::EmptySource`] when the source is empty,
    /// [`crate::OtoroError::TooFewItems`] for a single point,
    /// [`crate::OtoroError::InsufficientItems`] when the source does not
    /// satisfy `min_cluster_size`, and the stage failure variants when a
    /// pipeline stage rejects its input.
    pub fn run<D: DistanceSource + Sync>(&self, source: &D) -> Result<ClusteringResult> {
        Ok(self.run_detailed(source, &[])?.into_result())
    }

    /// Like [`Self::run`], scoring the given pairwise constraints while the
    /// hierarchy is built.
    ///
    /// # Errors
    /// As [`Self::run`], plus
    /// [`crate::OtoroError::ConstraintOutOfBounds`] when a constraint names a
    /// point outside the source.
    pub fn run_with_constraints<D: DistanceSource + Sync>(
        &self,
        source: &D,
        constraints: &[Constraint],
    ) -> Result<ClusteringResult> {
        Ok(self.run_detailed(source, constraints)?.into_result())
    }

    /// Runs the pipeline and returns the full output, including the
    /// propagated cluster tree for custom selection stages.
    ///
    /// # Errors
    /// As [`Self::run_with_constraints`].
    #[instrument(
        name = "core.run",
        err,
        skip(self, source, constraints),
        fields(
            data_source = %source.name(),
            items = source.len(),
            min_cluster_size = %self.min_cluster_size,
        ),
    )]
    pub fn run_detailed<D: DistanceSource + Sync>(
        &self,
        source: &D,
        constraints: &[Constraint],
    ) -> Result<PipelineOutput> {
        let output = run_pipeline(source, self, constraints)?;
        info!(
            clusters = output.result().cluster_count(),
            noise = output.result().noise_count(),
            "clustering completed"
        );
        Ok(output)
    }
}
