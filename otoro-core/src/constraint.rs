//! Pairwise constraints and per-round satisfaction accounting.
//!
//! A must-link constraint is satisfied when both endpoints share a label and
//! counts double (one credit per endpoint). A cannot-link constraint is
//! satisfied per endpoint when the endpoints end up in different clusters or
//! in noise; noise endpoints are attributed to the parent whose virtual child
//! cluster absorbed the point, first match wins. Virtual child records are
//! single-use and released at the end of every accounting round.

use std::collections::BTreeSet;

use crate::tree::{ClusterTree, TreeError};

/// The two kinds of pairwise clustering constraint.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ConstraintKind {
    /// The two points should share a cluster.
    MustLink,
    /// The two points should not share a cluster.
    CannotLink,
}

/// An immutable pairwise constraint between two point indices.
///
/// # Examples
/// ```
/// use otoro_core::{Constraint, ConstraintKind};
///
/// let link = Constraint::new(3, 7, ConstraintKind::MustLink);
/// assert_eq!(link.point_a(), 3);
/// assert_eq!(link.point_b(), 7);
/// assert_eq!(link.kind(), ConstraintKind::MustLink);
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Constraint {
    point_a: usize,
    point_b: usize,
    kind: ConstraintKind,
}

impl Constraint {
    /// Creates a constraint between two point indices.
    #[must_use]
    pub fn new(point_a: usize, point_b: usize, kind: ConstraintKind) -> Self {
        Self {
            point_a,
            point_b,
            kind,
        }
    }

    /// Returns the first point index.
    #[must_use]
    #[rustfmt::skip]
    pub fn point_a(&self) -> usize { self.point_a }

    /// Returns the second point index.
    #[must_use]
    #[rustfmt::skip]
    pub fn point_b(&self) -> usize { self.point_b }

    /// Returns the constraint kind.
    #[must_use]
    #[rustfmt::skip]
    pub fn kind(&self) -> ConstraintKind { self.kind }
}

/// Tallies the constraints satisfied by one round of newly created clusters.
///
/// `new_labels` holds the labels created by the round's splits; credits for
/// noise endpoints go to the distinct parents of those clusters via their
/// virtual child records, which are cleared before returning. No-op when
/// `constraints` is empty.
///
/// # Errors
/// Returns [`TreeError::UnknownLabel`] when a label does not resolve to a
/// live cluster and [`TreeError::PointOutOfBounds`] when a constraint names a
/// point with no label entry.
pub fn tally_constraints(
    new_labels: &BTreeSet<usize>,
    tree: &mut ClusterTree,
    constraints: &[Constraint],
    labels: &[usize],
) -> Result<(), TreeError> {
    if constraints.is_empty() {
        return Ok(());
    }

    // Distinct parents of the new clusters, in first-seen order.
    let mut parents: Vec<usize> = Vec::new();
    for &label in new_labels {
        let parent = tree
            .cluster(label)
            .ok_or(TreeError::UnknownLabel { label })?
            .parent();
        if let Some(parent) = parent {
            if !parents.contains(&parent) {
                parents.push(parent);
            }
        }
    }

    for constraint in constraints {
        let label_a = label_of(labels, constraint.point_a())?;
        let label_b = label_of(labels, constraint.point_b())?;

        match constraint.kind() {
            ConstraintKind::MustLink if label_a == label_b => {
                if new_labels.contains(&label_a) {
                    tree.add_constraints_satisfied(label_a, 2)?;
                }
            }
            ConstraintKind::CannotLink if label_a != label_b || label_a == 0 => {
                if label_a != 0 && new_labels.contains(&label_a) {
                    tree.add_constraints_satisfied(label_a, 1)?;
                }
                if label_b != 0 && new_labels.contains(&label_b) {
                    tree.add_constraints_satisfied(label_b, 1)?;
                }
                if label_a == 0 {
                    credit_first_matching_parent(tree, &parents, constraint.point_a())?;
                }
                if label_b == 0 {
                    credit_first_matching_parent(tree, &parents, constraint.point_b())?;
                }
            }
            _ => {}
        }
    }

    for parent in parents {
        tree.release_virtual_child(parent)?;
    }
    Ok(())
}

fn label_of(labels: &[usize], point: usize) -> Result<usize, TreeError> {
    labels
        .get(point)
        .copied()
        .ok_or(TreeError::PointOutOfBounds {
            index: point,
            items: labels.len(),
        })
}

fn credit_first_matching_parent(
    tree: &mut ClusterTree,
    parents: &[usize],
    point: usize,
) -> Result<(), TreeError> {
    for &parent in parents {
        if tree.virtual_child_contains(parent, point) {
            tree.add_virtual_child_constraints_satisfied(parent, 1)?;
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{Constraint, ConstraintKind, tally_constraints};
    use crate::tree::ClusterTree;

    /// Builds a tree with a root over six points, split into cluster 2
    /// (points 0..3), cluster 3 (points 3..5), and noise (point 5).
    fn split_tree() -> (ClusterTree, Vec<usize>) {
        let mut tree = ClusterTree::new();
        let root = tree.create_root((0..6).collect());
        let mut labels = vec![root; 6];

        tree.split_cluster(
            &BTreeSet::from([5]),
            &mut labels,
            root,
            0,
            4.0,
        )
        .expect("noise split must succeed");
        tree.split_cluster(
            &BTreeSet::from([0, 1, 2]),
            &mut labels,
            root,
            2,
            2.0,
        )
        .expect("first split must succeed");
        tree.split_cluster(
            &BTreeSet::from([3, 4]),
            &mut labels,
            root,
            3,
            2.0,
        )
        .expect("second split must succeed");

        (tree, labels)
    }

    #[test]
    fn must_link_in_one_new_cluster_counts_double() {
        let (mut tree, labels) = split_tree();
        let constraints = [Constraint::new(0, 1, ConstraintKind::MustLink)];

        tally_constraints(
            &BTreeSet::from([2, 3]),
            &mut tree,
            &constraints,
            &labels,
        )
        .expect("tally must succeed");

        assert_eq!(tree.cluster(2).expect("cluster 2").constraints_satisfied(), 2);
        assert_eq!(tree.cluster(3).expect("cluster 3").constraints_satisfied(), 0);
    }

    #[test]
    fn cannot_link_across_new_clusters_credits_both_sides() {
        let (mut tree, labels) = split_tree();
        let constraints = [Constraint::new(1, 4, ConstraintKind::CannotLink)];

        tally_constraints(
            &BTreeSet::from([2, 3]),
            &mut tree,
            &constraints,
            &labels,
        )
        .expect("tally must succeed");

        assert_eq!(tree.cluster(2).expect("cluster 2").constraints_satisfied(), 1);
        assert_eq!(tree.cluster(3).expect("cluster 3").constraints_satisfied(), 1);
    }

    #[test]
    fn cannot_link_noise_endpoint_credits_parent_virtual_child() {
        let (mut tree, labels) = split_tree();
        let constraints = [Constraint::new(0, 5, ConstraintKind::CannotLink)];

        tally_constraints(
            &BTreeSet::from([2, 3]),
            &mut tree,
            &constraints,
            &labels,
        )
        .expect("tally must succeed");

        // Point 0 sits in new cluster 2; point 5 is noise attributed to the
        // root's virtual child.
        assert_eq!(tree.cluster(2).expect("cluster 2").constraints_satisfied(), 1);
        assert_eq!(
            tree.cluster(1)
                .expect("root")
                .propagated_constraints_satisfied(),
            1
        );
    }

    #[test]
    fn virtual_children_are_released_after_the_round() {
        let (mut tree, labels) = split_tree();
        let constraints = [Constraint::new(0, 5, ConstraintKind::CannotLink)];

        tally_constraints(&BTreeSet::from([2, 3]), &mut tree, &constraints, &labels)
            .expect("tally must succeed");

        // A second round can no longer attribute the noise point.
        tally_constraints(&BTreeSet::from([2, 3]), &mut tree, &constraints, &labels)
            .expect("tally must succeed");
        assert_eq!(
            tree.cluster(1)
                .expect("root")
                .propagated_constraints_satisfied(),
            1,
            "released virtual child must not be credited again"
        );
    }

    #[test]
    fn no_constraints_is_a_no_op() {
        let (mut tree, labels) = split_tree();
        tally_constraints(&BTreeSet::from([2, 3]), &mut tree, &[], &labels)
            .expect("tally must succeed");
        assert_eq!(tree.cluster(2).expect("cluster 2").constraints_satisfied(), 0);
    }

    #[test]
    fn must_link_split_apart_earns_nothing() {
        let (mut tree, labels) = split_tree();
        let constraints = [Constraint::new(0, 3, ConstraintKind::MustLink)];

        tally_constraints(&BTreeSet::from([2, 3]), &mut tree, &constraints, &labels)
            .expect("tally must succeed");

        assert_eq!(tree.cluster(2).expect("cluster 2").constraints_satisfied(), 0);
        assert_eq!(tree.cluster(3).expect("cluster 3").constraints_satisfied(), 0);
    }
}
