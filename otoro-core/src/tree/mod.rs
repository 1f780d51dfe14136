//! Cluster tree data structure with stability accounting.
//!
//! Clusters live in an arena addressed by label; a cluster's parent is stored
//! as a label, never as an owning reference, and every mutation goes through
//! the arena. Label `0` is reserved for noise and never holds a cluster, so
//! the slot at index 0 stays vacant.
//!
//! Stability accumulates as points detach: `n × (1/death_weight −
//! 1/birth_weight)` per detachment event. A cluster born at weight 0 gets
//! infinite stability at creation — a signalled degenerate case, reported by
//! the propagation pass rather than treated as an error.

mod propagate;

use std::collections::BTreeSet;

pub use self::propagate::{PropagationReport, propagate_tree};

/// Errors returned by cluster tree operations.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
#[non_exhaustive]
pub enum TreeError {
    /// A label did not refer to a live cluster in the arena.
    #[error("label {label} does not refer to a cluster")]
    UnknownLabel {
        /// The unresolved cluster label.
        label: usize,
    },
    /// A new cluster label did not match the next free arena slot.
    #[error("new cluster label {label} must equal the next arena slot {expected}")]
    LabelOutOfSequence {
        /// The label requested by the caller.
        label: usize,
        /// The next free arena slot.
        expected: usize,
    },
    /// More points were detached from a cluster than it still holds.
    #[error("cluster {label} holds {remaining} points but {detached} were detached")]
    DetachExceedsPopulation {
        /// Label of the cluster being detached from.
        label: usize,
        /// Points remaining in the cluster before the detach.
        remaining: usize,
        /// Points the caller attempted to detach.
        detached: usize,
    },
    /// A constraint referenced a point with no label entry.
    #[error("point {index} has no label entry ({items} labels present)")]
    PointOutOfBounds {
        /// The out-of-range point index.
        index: usize,
        /// Number of label entries present.
        items: usize,
    },
    /// The tree was already propagated.
    #[error("the cluster tree has already been propagated")]
    AlreadyPropagated,
    /// The tree has not been propagated yet.
    #[error("the cluster tree has not been propagated yet")]
    NotPropagated,
}

impl TreeError {
    /// Returns a stable, machine-readable error code for the variant.
    #[must_use]
    pub const fn code(&self) -> TreeErrorCode {
        match self {
            Self::UnknownLabel { .. } => TreeErrorCode::UnknownLabel,
            Self::LabelOutOfSequence { .. } => TreeErrorCode::LabelOutOfSequence,
            Self::DetachExceedsPopulation { .. } => TreeErrorCode::DetachExceedsPopulation,
            Self::PointOutOfBounds { .. } => TreeErrorCode::PointOutOfBounds,
            Self::AlreadyPropagated => TreeErrorCode::AlreadyPropagated,
            Self::NotPropagated => TreeErrorCode::NotPropagated,
        }
    }
}

/// Machine-readable error codes for [`TreeError`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TreeErrorCode {
    /// A label did not refer to a live cluster in the arena.
    UnknownLabel,
    /// A new cluster label did not match the next free arena slot.
    LabelOutOfSequence,
    /// More points were detached from a cluster than it still holds.
    DetachExceedsPopulation,
    /// A constraint referenced a point with no label entry.
    PointOutOfBounds,
    /// The tree was already propagated.
    AlreadyPropagated,
    /// The tree has not been propagated yet.
    NotPropagated,
}

impl TreeErrorCode {
    /// Returns the symbolic identifier for logging surfaces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownLabel => "UNKNOWN_LABEL",
            Self::LabelOutOfSequence => "LABEL_OUT_OF_SEQUENCE",
            Self::DetachExceedsPopulation => "DETACH_EXCEEDS_POPULATION",
            Self::PointOutOfBounds => "POINT_OUT_OF_BOUNDS",
            Self::AlreadyPropagated => "ALREADY_PROPAGATED",
            Self::NotPropagated => "NOT_PROPAGATED",
        }
    }
}

/// A node of the cluster tree.
#[derive(Clone, Debug)]
pub struct Cluster {
    label: usize,
    parent: Option<usize>,
    birth_level: f32,
    death_level: f32,
    points_remaining: usize,
    birth_members: Vec<usize>,
    stability: f32,
    has_children: bool,
    constraints_satisfied: usize,
    propagated_stability: f32,
    propagated_constraints_satisfied: usize,
    propagated_lowest_child_death_level: f32,
    propagated_descendants: Vec<usize>,
    virtual_child: Option<BTreeSet<usize>>,
}

impl Cluster {
    fn new(label: usize, parent: Option<usize>, birth_level: f32, birth_members: Vec<usize>) -> Self {
        let stability = if birth_level == 0.0 { f32::INFINITY } else { 0.0 };
        Self {
            label,
            parent,
            birth_level,
            death_level: 0.0,
            points_remaining: birth_members.len(),
            birth_members,
            stability,
            has_children: false,
            constraints_satisfied: 0,
            propagated_stability: 0.0,
            propagated_constraints_satisfied: 0,
            propagated_lowest_child_death_level: f32::INFINITY,
            propagated_descendants: Vec::new(),
            virtual_child: None,
        }
    }

    /// Returns the cluster label.
    #[must_use]
    #[rustfmt::skip]
    pub fn label(&self) -> usize { self.label }

    /// Returns the parent cluster's label, or `None` for a root.
    #[must_use]
    #[rustfmt::skip]
    pub fn parent(&self) -> Option<usize> { self.parent }

    /// Returns the mutual-reachability level at which the cluster was born.
    #[must_use]
    #[rustfmt::skip]
    pub fn birth_level(&self) -> f32 { self.birth_level }

    /// Returns the level at which the cluster lost its last point (0 while alive).
    #[must_use]
    #[rustfmt::skip]
    pub fn death_level(&self) -> f32 { self.death_level }

    /// Returns whether a real (non-noise) child was ever split off.
    #[must_use]
    #[rustfmt::skip]
    pub fn has_children(&self) -> bool { self.has_children }

    /// Returns the number of points the cluster held at birth.
    #[must_use]
    pub fn birth_size(&self) -> usize {
        self.birth_members.len()
    }

    /// Returns the accumulated stability.
    #[must_use]
    #[rustfmt::skip]
    pub fn stability(&self) -> f32 { self.stability }

    /// Returns the directly satisfied constraint count.
    #[must_use]
    #[rustfmt::skip]
    pub fn constraints_satisfied(&self) -> usize { self.constraints_satisfied }

    /// Returns the propagated stability. Valid only after propagation.
    #[must_use]
    #[rustfmt::skip]
    pub fn propagated_stability(&self) -> f32 { self.propagated_stability }

    /// Returns the propagated constraint count. Valid only after propagation.
    #[must_use]
    #[rustfmt::skip]
    pub fn propagated_constraints_satisfied(&self) -> usize { self.propagated_constraints_satisfied }

    /// Returns the lowest death level among descendants. Valid only after
    /// propagation.
    #[must_use]
    #[rustfmt::skip]
    pub fn propagated_lowest_child_death_level(&self) -> f32 { self.propagated_lowest_child_death_level }

    /// Returns the winning descendant labels. Valid only after propagation.
    #[must_use]
    pub fn propagated_descendants(&self) -> &[usize] {
        &self.propagated_descendants
    }

    pub(crate) fn birth_members(&self) -> &[usize] {
        &self.birth_members
    }

    fn detach_points(&mut self, count: usize, level: f32) -> Result<(), TreeError> {
        if count > self.points_remaining {
            return Err(TreeError::DetachExceedsPopulation {
                label: self.label,
                remaining: self.points_remaining,
                detached: count,
            });
        }
        self.points_remaining -= count;
        if level == 0.0 {
            self.stability = f32::INFINITY;
        } else if self.stability.is_finite() {
            // 1/birth_level is 0 for a root born at infinity.
            self.stability += count as f32 * (1.0 / level - 1.0 / self.birth_level);
        }
        if self.points_remaining == 0 {
            self.death_level = level;
        }
        Ok(())
    }
}

/// Arena of [`Cluster`] nodes addressed by label.
#[derive(Clone, Debug, Default)]
pub struct ClusterTree {
    clusters: Vec<Option<Cluster>>,
    propagated: bool,
}

impl ClusterTree {
    /// Creates an empty tree with the noise slot reserved.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clusters: vec![None],
            propagated: false,
        }
    }

    /// Returns the number of arena slots, including the reserved noise slot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Returns whether the tree holds no clusters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.len() <= 1
    }

    /// Returns whether [`propagate_tree`] has completed on this tree.
    #[must_use]
    pub fn is_propagated(&self) -> bool {
        self.propagated
    }

    /// Returns the cluster stored under `label`, if any.
    #[must_use]
    pub fn cluster(&self, label: usize) -> Option<&Cluster> {
        self.clusters.get(label).and_then(Option::as_ref)
    }

    /// Iterates over the live clusters in ascending label order.
    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter().filter_map(Option::as_ref)
    }

    /// Iterates over the root clusters in ascending label order.
    pub fn roots(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters().filter(|cluster| cluster.parent.is_none())
    }

    /// Creates a root cluster spanning `members` and returns its label.
    ///
    /// The root is born at infinite weight, so its stability accumulates as
    /// `Σ n/death_weight` without a birth term.
    pub fn create_root(&mut self, members: Vec<usize>) -> usize {
        let label = self.clusters.len();
        self.clusters
            .push(Some(Cluster::new(label, None, f32::INFINITY, members)));
        label
    }

    /// Removes `points` from `parent` at `edge_weight` and reassigns their
    /// labels to `new_label`.
    ///
    /// With a non-zero `new_label` a new cluster node is created and its
    /// label returned. With `new_label == 0` the points become noise: no node
    /// is created and the set is registered as the parent's virtual child
    /// cluster for the next constraint accounting round.
    ///
    /// # Errors
    /// Returns [`TreeError::UnknownLabel`] when `parent` is not live,
    /// [`TreeError::LabelOutOfSequence`] when a non-zero `new_label` is not
    /// the next free arena slot, and
    /// [`TreeError::DetachExceedsPopulation`] when the parent holds fewer
    /// points than are being removed.
    pub fn split_cluster(
        &mut self,
        points: &BTreeSet<usize>,
        labels: &mut [usize],
        parent: usize,
        new_label: usize,
        edge_weight: f32,
    ) -> Result<Option<usize>, TreeError> {
        if new_label != 0 && new_label != self.clusters.len() {
            return Err(TreeError::LabelOutOfSequence {
                label: new_label,
                expected: self.clusters.len(),
            });
        }
        let remaining = self
            .cluster(parent)
            .ok_or(TreeError::UnknownLabel { label: parent })?
            .points_remaining;
        if points.len() > remaining {
            return Err(TreeError::DetachExceedsPopulation {
                label: parent,
                remaining,
                detached: points.len(),
            });
        }
        if let Some(&out_of_bounds) = points.iter().find(|&&point| point >= labels.len()) {
            return Err(TreeError::PointOutOfBounds {
                index: out_of_bounds,
                items: labels.len(),
            });
        }

        for &point in points {
            labels[point] = new_label;
        }

        let parent_cluster = self.cluster_mut(parent)?;
        parent_cluster.detach_points(points.len(), edge_weight)?;

        if new_label == 0 {
            parent_cluster
                .virtual_child
                .get_or_insert_with(BTreeSet::new)
                .extend(points.iter().copied());
            return Ok(None);
        }

        parent_cluster.has_children = true;
        self.clusters.push(Some(Cluster::new(
            new_label,
            Some(parent),
            edge_weight,
            points.iter().copied().collect(),
        )));
        Ok(Some(new_label))
    }

    /// Credits directly satisfied constraints to a cluster.
    pub(crate) fn add_constraints_satisfied(
        &mut self,
        label: usize,
        count: usize,
    ) -> Result<(), TreeError> {
        self.cluster_mut(label)?.constraints_satisfied += count;
        Ok(())
    }

    /// Credits constraints satisfied by a cluster's virtual (noise) child.
    ///
    /// The virtual child is conceptually a child cluster, so the credit lands
    /// in the propagated counter where child contributions accumulate.
    pub(crate) fn add_virtual_child_constraints_satisfied(
        &mut self,
        label: usize,
        count: usize,
    ) -> Result<(), TreeError> {
        self.cluster_mut(label)?.propagated_constraints_satisfied += count;
        Ok(())
    }

    pub(crate) fn virtual_child_contains(&self, label: usize, point: usize) -> bool {
        self.cluster(label)
            .and_then(|cluster| cluster.virtual_child.as_ref())
            .is_some_and(|members| members.contains(&point))
    }

    /// Drops a cluster's virtual child record after an accounting round.
    pub(crate) fn release_virtual_child(&mut self, label: usize) -> Result<(), TreeError> {
        self.cluster_mut(label)?.virtual_child = None;
        Ok(())
    }

    pub(crate) fn cluster_mut(&mut self, label: usize) -> Result<&mut Cluster, TreeError> {
        self.clusters
            .get_mut(label)
            .and_then(Option::as_mut)
            .ok_or(TreeError::UnknownLabel { label })
    }

    pub(crate) fn mark_propagated(&mut self) {
        self.propagated = true;
    }
}
