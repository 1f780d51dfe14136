//! Bottom-up propagation of stability, constraints, and death levels.
//!
//! The pass seeds a work queue with every leaf cluster and walks towards the
//! roots. Labels grow monotonically down the tree (children are always
//! created after their parent), so popping the largest queued label
//! guarantees every child is processed before its parent. A parent is
//! enqueued the first time any of its children is processed; a bitset tracks
//! what has been enqueued so each cluster is visited exactly once.

use std::collections::BTreeSet;

use tracing::debug;

use crate::bitset::BitSet;

use super::{ClusterTree, TreeError};

/// Outcome of a propagation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropagationReport {
    infinite_stability: bool,
    clusters_visited: usize,
}

impl PropagationReport {
    /// Returns whether any cluster carries infinite stability.
    ///
    /// Infinite stability arises from clusters born at weight 0 and marks the
    /// run as degenerate; downstream selection should treat the affected
    /// subtree with suspicion.
    #[must_use]
    #[rustfmt::skip]
    pub fn infinite_stability(&self) -> bool { self.infinite_stability }

    /// Returns how many clusters the pass visited.
    #[must_use]
    #[rustfmt::skip]
    pub fn clusters_visited(&self) -> usize { self.clusters_visited }
}

/// Propagates stability, constraint counts, and lowest child death levels
/// from the leaves to the roots.
///
/// Must be called exactly once, after hierarchy construction has finished and
/// before cluster selection or outlier scoring. Each cluster decides whether
/// it beats the sum of its children's winning subtrees — more satisfied
/// constraints win outright, stability breaks ties, and a childless cluster
/// always nominates itself. Roots never nominate themselves: an "everything
/// is one cluster" answer is not a clustering, so a root only accumulates its
/// children's winners.
///
/// # Errors
/// Returns [`TreeError::AlreadyPropagated`] when called a second time.
pub fn propagate_tree(tree: &mut ClusterTree) -> Result<PropagationReport, TreeError> {
    if tree.is_propagated() {
        return Err(TreeError::AlreadyPropagated);
    }

    let mut queue = BTreeSet::new();
    let mut enqueued = BitSet::with_capacity(tree.len());
    for cluster in tree.clusters() {
        if !cluster.has_children() {
            queue.insert(cluster.label());
            enqueued.insert(cluster.label());
        }
    }

    let mut infinite_stability = false;
    let mut clusters_visited = 0;

    while let Some(label) = queue.pop_last() {
        let cluster = tree.cluster_mut(label)?;

        if cluster.propagated_lowest_child_death_level.is_infinite() {
            cluster.propagated_lowest_child_death_level = cluster.death_level;
        }

        if cluster.parent.is_none() {
            // Roots never nominate themselves; they only aggregate winners.
        } else if !cluster.has_children {
            // A leaf's subtree is itself plus any virtual-child credits that
            // already sit in the propagated counter.
            cluster.propagated_stability += cluster.stability;
            cluster.propagated_constraints_satisfied += cluster.constraints_satisfied;
            cluster.propagated_descendants = vec![label];
        } else {
            let self_wins = if cluster.constraints_satisfied
                != cluster.propagated_constraints_satisfied
            {
                cluster.constraints_satisfied > cluster.propagated_constraints_satisfied
            } else {
                cluster.stability >= cluster.propagated_stability
            };
            if self_wins {
                cluster.propagated_stability = cluster.stability;
                cluster.propagated_constraints_satisfied = cluster.constraints_satisfied;
                cluster.propagated_descendants = vec![label];
            }
        }

        if cluster.stability.is_infinite() {
            infinite_stability = true;
        }
        clusters_visited += 1;

        let parent = cluster.parent;
        let propagated_stability = cluster.propagated_stability;
        let propagated_constraints = cluster.propagated_constraints_satisfied;
        let propagated_lowest = cluster.propagated_lowest_child_death_level;
        let winners = cluster.propagated_descendants.clone();

        if let Some(parent_label) = parent {
            let parent_cluster = tree.cluster_mut(parent_label)?;
            parent_cluster.propagated_stability += propagated_stability;
            parent_cluster.propagated_constraints_satisfied += propagated_constraints;
            if propagated_lowest < parent_cluster.propagated_lowest_child_death_level {
                parent_cluster.propagated_lowest_child_death_level = propagated_lowest;
            }
            parent_cluster.propagated_descendants.extend(winners);
            if !enqueued.contains(parent_label) {
                queue.insert(parent_label);
                enqueued.insert(parent_label);
            }
        }
    }

    tree.mark_propagated();
    debug!(clusters_visited, infinite_stability, "tree propagation completed");
    Ok(PropagationReport {
        infinite_stability,
        clusters_visited,
    })
}
