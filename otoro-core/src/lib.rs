//! Otoro core library: hierarchical density-based clustering (HDBSCAN*)
//! over caller-supplied pairwise distances.
//!
//! The pipeline computes per-point core distances, builds a minimum spanning
//! tree under the mutual-reachability metric, condenses the tree into a
//! cluster hierarchy with stability accounting, and derives a flat labelling
//! plus per-point outlier scores. Must-link/cannot-link constraints are
//! tallied per cluster as the hierarchy forms.

mod bitset;
mod builder;
mod constraint;
mod core_distance;
mod datasource;
mod error;
mod hierarchy;
mod mst;
mod otoro;
mod outlier;
mod pipeline;
mod result;
mod tree;

pub use crate::{
    builder::OtoroBuilder,
    constraint::{Constraint, ConstraintKind, tally_constraints},
    core_distance::compute_core_distances,
    datasource::{DenseDistanceMatrix, DistanceSource},
    error::{
        DistanceSourceError, DistanceSourceErrorCode, OtoroError, OtoroErrorCode, Result,
    },
    hierarchy::{
        FlatClustering, Hierarchy, HierarchyError, HierarchyErrorCode, build_hierarchy,
        extract_flat_clustering,
    },
    mst::{
        GraphEdge, MstError, MstErrorCode, MutualReachabilityGraph,
        build_mutual_reachability_mst,
    },
    otoro::Otoro,
    outlier::{OutlierError, OutlierErrorCode, OutlierScore, score_outliers},
    pipeline::PipelineOutput,
    result::ClusteringResult,
    tree::{
        Cluster, ClusterTree, PropagationReport, TreeError, TreeErrorCode, propagate_tree,
    },
};
