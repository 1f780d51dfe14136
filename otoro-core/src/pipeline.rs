//! Pipeline orchestration.
//!
//! Centralises the engine's stages so they can be reused across [`Otoro`]
//! orchestration and tests:
//!
//! - Compute core distances from the caller's pairwise distances.
//! - Build the mutual-reachability MST, with optional self-edges.
//! - Construct the cluster tree by removing MST edges level by level,
//!   accounting constraints per round.
//! - Propagate the tree, then extract the flat clustering and outlier scores.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::{
    Constraint, DistanceSource, Otoro,
    core_distance::compute_core_distances,
    error::{OtoroError, Result},
    hierarchy::{
        Hierarchy, HierarchyError, build_hierarchy, extract_flat_clustering,
    },
    mst::{MstError, build_mutual_reachability_mst},
    outlier::{OutlierError, score_outliers},
    result::ClusteringResult,
    tree::{PropagationReport, TreeError, propagate_tree},
};

/// Everything a run produces beyond the flat [`ClusteringResult`].
///
/// The propagated cluster tree inside [`Self::hierarchy`] is the input for
/// any custom cluster-selection stage.
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    result: ClusteringResult,
    hierarchy: Hierarchy,
    report: PropagationReport,
}

impl PipelineOutput {
    /// Returns the flat clustering result.
    #[must_use]
    #[rustfmt::skip]
    pub fn result(&self) -> &ClusteringResult { &self.result }

    /// Returns the propagated hierarchy with its noise bookkeeping.
    #[must_use]
    #[rustfmt::skip]
    pub fn hierarchy(&self) -> &Hierarchy { &self.hierarchy }

    /// Returns the propagation report, including the degenerate-input flag.
    #[must_use]
    #[rustfmt::skip]
    pub fn report(&self) -> &PropagationReport { &self.report }

    /// Consumes the output, keeping only the flat clustering result.
    #[must_use]
    pub fn into_result(self) -> ClusteringResult {
        self.result
    }
}

/// Runs the whole pipeline end-to-end for the provided [`DistanceSource`].
///
/// # Errors
/// Returns the same errors as [`Otoro::run`], including empty or undersized
/// sources, out-of-bounds constraints, distance source failures, and stage
/// failures.
#[instrument(
    name = "pipeline.run",
    err,
    skip(source, otoro, constraints),
    fields(
        data_source = %source.name(),
        items = source.len(),
        min_points = %otoro.min_points(),
        min_cluster_size = %otoro.min_cluster_size(),
        constraints = constraints.len(),
    ),
)]
pub(crate) fn run_pipeline<D: DistanceSource + Sync>(
    source: &D,
    otoro: &Otoro,
    constraints: &[Constraint],
) -> Result<PipelineOutput> {
    let items = source.len();
    validate_inputs(source, otoro, constraints, items)?;

    if otoro.min_points().get() > items - 1 {
        warn!(
            min_points = otoro.min_points().get(),
            items,
            "min_points exceeds the available neighbours; core distances fall back to the farthest neighbour"
        );
    }

    let core_distances = compute_core_distances(source, otoro.min_points())
        .map_err(|error| wrap_source_error(source, error))?;

    let graph = build_mutual_reachability_mst(source, &core_distances, otoro.self_edges())
        .map_err(|error| map_mst_error(source, error))?;
    debug!(edges = graph.edges().len(), "mutual-reachability MST built");

    let mut hierarchy = build_hierarchy(&graph, otoro.min_cluster_size(), constraints)
        .map_err(map_hierarchy_error)?;

    let report = propagate_tree(hierarchy.tree_mut()).map_err(map_tree_error)?;
    if report.infinite_stability() {
        warn!(
            "at least one cluster has infinite stability; the input contains zero-distance structure"
        );
    }

    let flat = extract_flat_clustering(&hierarchy).map_err(map_hierarchy_error)?;
    let outlier_scores = score_outliers(
        hierarchy.tree(),
        hierarchy.point_noise_levels(),
        hierarchy.point_last_clusters(),
        &core_distances,
    )
    .map_err(map_outlier_error)?;

    let (labels, cluster_count, membership_strengths) = flat.into_parts();
    let result = ClusteringResult::new(labels, cluster_count, membership_strengths, outlier_scores);

    Ok(PipelineOutput {
        result,
        hierarchy,
        report,
    })
}

fn validate_inputs<D: DistanceSource>(
    source: &D,
    otoro: &Otoro,
    constraints: &[Constraint],
    items: usize,
) -> Result<()> {
    if items == 0 {
        warn!(
            data_source = source.name(),
            "distance source is empty, returning error"
        );
        return Err(OtoroError::EmptySource {
            data_source: Arc::from(source.name()),
        });
    }
    if items < 2 {
        return Err(OtoroError::TooFewItems {
            data_source: Arc::from(source.name()),
            items,
        });
    }
    if items < otoro.min_cluster_size().get() {
        return Err(OtoroError::InsufficientItems {
            data_source: Arc::from(source.name()),
            items,
            min_cluster_size: otoro.min_cluster_size(),
        });
    }
    for constraint in constraints {
        let worst = constraint.point_a().max(constraint.point_b());
        if worst >= items {
            return Err(OtoroError::ConstraintOutOfBounds {
                index: worst,
                items,
            });
        }
    }
    Ok(())
}

fn wrap_source_error<D: DistanceSource>(
    source: &D,
    error: crate::DistanceSourceError,
) -> OtoroError {
    OtoroError::DataSource {
        data_source: Arc::from(source.name()),
        error,
    }
}

fn map_mst_error<D: DistanceSource>(source: &D, error: MstError) -> OtoroError {
    match error {
        MstError::DataSource(error) => wrap_source_error(source, error),
        other => OtoroError::MstFailure {
            code: Arc::from(other.code().as_str()),
            message: Arc::from(other.to_string()),
        },
    }
}

fn map_hierarchy_error(error: HierarchyError) -> OtoroError {
    OtoroError::HierarchyFailure {
        code: Arc::from(error.code().as_str()),
        message: Arc::from(error.to_string()),
    }
}

fn map_tree_error(error: TreeError) -> OtoroError {
    OtoroError::TreeFailure {
        code: Arc::from(error.code().as_str()),
        message: Arc::from(error.to_string()),
    }
}

fn map_outlier_error(error: OutlierError) -> OtoroError {
    OtoroError::OutlierFailure {
        code: Arc::from(error.code().as_str()),
        message: Arc::from(error.to_string()),
    }
}
