//! Hierarchy construction from the mutual-reachability MST.
//!
//! The driver walks the MST's edges in decreasing weight order, removing
//! every edge of equal weight as one level. Each cluster touched by a removal
//! is re-explored: components that still satisfy `min_cluster_size` and keep
//! at least one edge become child clusters when two or more such components
//! exist, spurious components fall to noise, and a lone surviving component
//! keeps its parent's label. Every level's freshly created clusters feed one
//! constraint accounting round.
//!
//! Per point, the driver records the level at which it fell to noise and the
//! cluster it last belonged to; the outlier scorer consumes both.

use std::{collections::BTreeSet, num::NonZeroUsize};

use tracing::{debug, instrument};

use crate::{
    Constraint,
    mst::{GraphEdge, MutualReachabilityGraph},
    tree::{ClusterTree, TreeError},
};

use self::adjacency::Adjacency;

mod adjacency;

/// Errors returned by hierarchy construction and flat extraction.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
#[non_exhaustive]
pub enum HierarchyError {
    /// The configured minimum cluster size exceeds the dataset size.
    #[error("min_cluster_size {min_cluster_size} exceeds node_count {node_count}")]
    MinClusterSizeTooLarge {
        /// Number of points in the dataset.
        node_count: usize,
        /// Minimum cluster size requested by the caller.
        min_cluster_size: usize,
    },
    /// An MST edge weight was invalid for hierarchy construction.
    #[error("invalid MST edge weight {weight} for edge ({left}, {right})")]
    InvalidEdgeWeight {
        /// Smaller endpoint id for the offending edge.
        left: usize,
        /// Larger endpoint id for the offending edge.
        right: usize,
        /// Invalid weight value observed on the edge.
        weight: f32,
    },
    /// An edge referenced a node id that is not present in the graph.
    #[error("edge references node {node}, but node_count is {node_count}")]
    InvalidNodeId {
        /// The invalid node id referenced by an edge.
        node: usize,
        /// The number of nodes in the graph.
        node_count: usize,
    },
    /// A cluster tree operation failed.
    #[error("cluster tree operation failed: {source}")]
    Tree {
        /// Underlying cluster tree error.
        #[from]
        source: TreeError,
    },
}

impl HierarchyError {
    /// Returns a stable, machine-readable error code for the variant.
    #[must_use]
    pub const fn code(&self) -> HierarchyErrorCode {
        match self {
            Self::MinClusterSizeTooLarge { .. } => HierarchyErrorCode::MinClusterSizeTooLarge,
            Self::InvalidEdgeWeight { .. } => HierarchyErrorCode::InvalidEdgeWeight,
            Self::InvalidNodeId { .. } => HierarchyErrorCode::InvalidNodeId,
            Self::Tree { .. } => HierarchyErrorCode::Tree,
        }
    }
}

/// Machine-readable error codes for [`HierarchyError`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum HierarchyErrorCode {
    /// The configured minimum cluster size exceeds the dataset size.
    MinClusterSizeTooLarge,
    /// An MST edge weight was invalid for hierarchy construction.
    InvalidEdgeWeight,
    /// An edge referenced a node id that is not present in the graph.
    InvalidNodeId,
    /// A cluster tree operation failed.
    Tree,
}

impl HierarchyErrorCode {
    /// Returns the symbolic identifier for logging surfaces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MinClusterSizeTooLarge => "MIN_CLUSTER_SIZE_TOO_LARGE",
            Self::InvalidEdgeWeight => "INVALID_EDGE_WEIGHT",
            Self::InvalidNodeId => "INVALID_NODE_ID",
            Self::Tree => "TREE",
        }
    }
}

/// The cluster tree plus the per-point noise bookkeeping the driver collects.
#[derive(Clone, Debug)]
pub struct Hierarchy {
    tree: ClusterTree,
    point_noise_levels: Vec<f32>,
    point_last_clusters: Vec<usize>,
}

impl Hierarchy {
    /// Returns the cluster tree.
    #[must_use]
    #[rustfmt::skip]
    pub fn tree(&self) -> &ClusterTree { &self.tree }

    /// Returns the cluster tree mutably, e.g. for propagation.
    #[rustfmt::skip]
    pub fn tree_mut(&mut self) -> &mut ClusterTree { &mut self.tree }

    /// Returns the level at which each point fell to noise (0 if it never did).
    #[must_use]
    pub fn point_noise_levels(&self) -> &[f32] {
        &self.point_noise_levels
    }

    /// Returns the cluster each point last belonged to before falling to noise.
    #[must_use]
    pub fn point_last_clusters(&self) -> &[usize] {
        &self.point_last_clusters
    }
}

/// Builds the cluster tree by removing MST edges in decreasing weight order.
///
/// # Errors
/// Returns [`HierarchyError::MinClusterSizeTooLarge`] when the dataset cannot
/// hold one cluster, [`HierarchyError::InvalidNodeId`] or
/// [`HierarchyError::InvalidEdgeWeight`] for malformed graphs, and
/// [`HierarchyError::Tree`] when a split violates a tree invariant.
#[instrument(
    name = "hierarchy.build",
    err,
    skip(graph, constraints),
    fields(
        node_count = graph.node_count(),
        edges = graph.edges().len(),
        min_cluster_size = %min_cluster_size,
        constraints = constraints.len(),
    ),
)]
pub fn build_hierarchy(
    graph: &MutualReachabilityGraph,
    min_cluster_size: NonZeroUsize,
    constraints: &[Constraint],
) -> Result<Hierarchy, HierarchyError> {
    let node_count = graph.node_count();
    if min_cluster_size.get() > node_count {
        return Err(HierarchyError::MinClusterSizeTooLarge {
            node_count,
            min_cluster_size: min_cluster_size.get(),
        });
    }
    validate_edges(graph)?;

    let mut adjacency = Adjacency::from_edges(node_count, graph.edges());
    let mut sorted: Vec<GraphEdge> = graph.edges().to_vec();
    sorted.sort_unstable();

    let mut tree = ClusterTree::new();
    let root = tree.create_root((0..node_count).collect());
    let mut labels = vec![root; node_count];
    let mut point_noise_levels = vec![0.0f32; node_count];
    let mut point_last_clusters = vec![0usize; node_count];
    let mut next_label = root + 1;

    // The root participates in accounting before any edge is removed.
    crate::constraint::tally_constraints(
        &BTreeSet::from([root]),
        &mut tree,
        constraints,
        &labels,
    )?;

    let mut cursor = sorted.len();
    while cursor > 0 {
        let level = sorted[cursor - 1].weight();

        // Remove every edge tied at this weight and note what it touched.
        let mut affected_vertices = BTreeSet::new();
        let mut affected_labels = BTreeSet::new();
        while cursor > 0 && sorted[cursor - 1].weight() == level {
            let edge = sorted[cursor - 1];
            cursor -= 1;
            adjacency.remove(edge.source(), edge.target());
            if labels[edge.source()] == 0 {
                continue;
            }
            affected_vertices.insert(edge.source());
            affected_vertices.insert(edge.target());
            affected_labels.insert(labels[edge.source()]);
        }
        if affected_labels.is_empty() {
            continue;
        }

        let mut new_labels = BTreeSet::new();
        while let Some(examined) = affected_labels.pop_last() {
            let mut seeds: BTreeSet<usize> = affected_vertices
                .iter()
                .copied()
                .filter(|&vertex| labels[vertex] == examined)
                .collect();
            affected_vertices.retain(|&vertex| labels[vertex] != examined);

            // Explore the remaining components of the examined cluster.
            let mut components: Vec<(BTreeSet<usize>, bool)> = Vec::new();
            while let Some(seed) = seeds.pop_last() {
                let (members, any_edges) = adjacency.component_of(seed, &mut seeds);
                components.push((members, any_edges));
            }

            let is_valid = |members: &BTreeSet<usize>, any_edges: bool| {
                any_edges && members.len() >= min_cluster_size.get()
            };
            let valid_count = components
                .iter()
                .filter(|(members, any_edges)| is_valid(members, *any_edges))
                .count();

            for (members, any_edges) in &components {
                if valid_count >= 2 && is_valid(members, *any_edges) {
                    let label = next_label;
                    next_label += 1;
                    tree.split_cluster(members, &mut labels, examined, label, level)?;
                    new_labels.insert(label);
                } else if !is_valid(members, *any_edges) {
                    tree.split_cluster(members, &mut labels, examined, 0, level)?;
                    for &point in members {
                        point_noise_levels[point] = level;
                        point_last_clusters[point] = examined;
                    }
                }
                // A lone valid component keeps the examined cluster's label.
            }
        }

        if !new_labels.is_empty() {
            crate::constraint::tally_constraints(&new_labels, &mut tree, constraints, &labels)?;
            debug!(
                level = f64::from(level),
                clusters = new_labels.len(),
                "level produced new clusters"
            );
        }
    }

    Ok(Hierarchy {
        tree,
        point_noise_levels,
        point_last_clusters,
    })
}

fn validate_edges(graph: &MutualReachabilityGraph) -> Result<(), HierarchyError> {
    let node_count = graph.node_count();
    for edge in graph.edges() {
        let node = edge.source().max(edge.target());
        if node >= node_count {
            return Err(HierarchyError::InvalidNodeId { node, node_count });
        }
        let weight = edge.weight();
        if !weight.is_finite() || weight < 0.0 {
            return Err(HierarchyError::InvalidEdgeWeight {
                left: edge.source(),
                right: edge.target(),
                weight,
            });
        }
    }
    Ok(())
}

/// A flat partition extracted from a propagated hierarchy.
#[derive(Clone, Debug, PartialEq)]
pub struct FlatClustering {
    labels: Vec<usize>,
    cluster_count: usize,
    membership_strengths: Vec<f32>,
}

impl FlatClustering {
    /// Returns the per-point labels; `0` marks noise.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Returns the number of selected clusters.
    #[must_use]
    #[rustfmt::skip]
    pub fn cluster_count(&self) -> usize { self.cluster_count }

    /// Returns each point's membership strength in `[0, 1]`; noise scores 0.
    #[must_use]
    pub fn membership_strengths(&self) -> &[f32] {
        &self.membership_strengths
    }

    pub(crate) fn into_parts(self) -> (Vec<usize>, usize, Vec<f32>) {
        (self.labels, self.cluster_count, self.membership_strengths)
    }
}

/// Extracts the flat clustering selected by propagated stability.
///
/// The winners are the roots' propagated descendants; each winner's birth
/// membership is relabelled contiguously from 1 in ascending creation order.
/// A point's membership strength is its cluster's lowest surviving level
/// divided by the point's own noise level, clamped to `[0, 1]`.
///
/// # Errors
/// Returns [`TreeError::NotPropagated`] when [`crate::propagate_tree`] has
/// not run on the hierarchy's tree.
pub fn extract_flat_clustering(hierarchy: &Hierarchy) -> Result<FlatClustering, HierarchyError> {
    let tree = hierarchy.tree();
    if !tree.is_propagated() {
        return Err(HierarchyError::Tree {
            source: TreeError::NotPropagated,
        });
    }

    let mut winners: Vec<usize> = tree
        .roots()
        .flat_map(|root| root.propagated_descendants().iter().copied())
        .collect();
    winners.sort_unstable();
    winners.dedup();

    let node_count = hierarchy.point_noise_levels().len();
    let mut labels = vec![0usize; node_count];
    let mut membership_strengths = vec![0.0f32; node_count];

    for (position, &winner) in winners.iter().enumerate() {
        let Some(cluster) = tree.cluster(winner) else {
            return Err(HierarchyError::Tree {
                source: TreeError::UnknownLabel { label: winner },
            });
        };
        let flat_label = position + 1;
        let floor = cluster.propagated_lowest_child_death_level();
        for &point in cluster.birth_members() {
            labels[point] = flat_label;
            let epsilon = hierarchy.point_noise_levels()[point];
            membership_strengths[point] = if epsilon == 0.0 {
                1.0
            } else {
                (floor / epsilon).clamp(0.0, 1.0)
            };
        }
    }

    Ok(FlatClustering {
        labels,
        cluster_count: winners.len(),
        membership_strengths,
    })
}
