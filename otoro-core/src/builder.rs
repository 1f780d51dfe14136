//! Builder utilities for configuring Otoro runs.
//!
//! Exposes the tuning surface (neighbourhood size, minimum cluster size,
//! self-edges) and the validation performed before constructing [`Otoro`]
//! instances.

use std::num::NonZeroUsize;

use crate::{Result, error::OtoroError, otoro::Otoro};

/// Configures and constructs [`Otoro`] instances.
///
/// # Examples
/// ```
/// use otoro_core::OtoroBuilder;
///
/// let otoro = OtoroBuilder::new()
///     .with_min_points(4)
///     .with_min_cluster_size(8)
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(otoro.min_points().get(), 4);
/// assert_eq!(otoro.min_cluster_size().get(), 8);
/// ```
#[derive(Debug, Clone)]
pub struct OtoroBuilder {
    min_points: usize,
    min_cluster_size: usize,
    self_edges: bool,
}

impl Default for OtoroBuilder {
    fn default() -> Self {
        Self {
            min_points: 5,
            min_cluster_size: 5,
            self_edges: true,
        }
    }
}

impl OtoroBuilder {
    /// Creates a builder populated with default parameters.
    ///
    /// # Examples
    /// ```
    /// use otoro_core::OtoroBuilder;
    ///
    /// let builder = OtoroBuilder::new();
    /// assert_eq!(builder.min_points(), 5);
    /// assert_eq!(builder.min_cluster_size(), 5);
    /// assert!(builder.self_edges());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the neighbourhood size used for core distances.
    ///
    /// A point's core distance is its distance to the `min_points`-th nearest
    /// neighbour, counting the point itself; `1` turns every core distance
    /// into zero.
    #[must_use]
    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    /// Returns the configured neighbourhood size.
    #[must_use]
    pub fn min_points(&self) -> usize {
        self.min_points
    }

    /// Overrides the minimum number of points a cluster must hold.
    #[must_use]
    pub fn with_min_cluster_size(mut self, size: usize) -> Self {
        self.min_cluster_size = size;
        self
    }

    /// Returns the configured minimum cluster size.
    #[must_use]
    pub fn min_cluster_size(&self) -> usize {
        self.min_cluster_size
    }

    /// Controls whether the spanning tree carries per-point self-edges.
    ///
    /// Self-edges let a point survive as a singleton down to its own core
    /// distance, which sharpens the noise levels behind outlier scores.
    #[must_use]
    pub fn with_self_edges(mut self, self_edges: bool) -> Self {
        self.self_edges = self_edges;
        self
    }

    /// Returns whether self-edges will be generated.
    #[must_use]
    pub fn self_edges(&self) -> bool {
        self.self_edges
    }

    /// Validates the configuration and constructs an [`Otoro`] instance.
    ///
    /// # Errors
    /// Returns [`OtoroError::InvalidMinPoints`] or
    /// [`OtoroError::InvalidMinClusterSize`] when either parameter is zero.
    ///
    /// # Examples
    /// ```
    /// use otoro_core::OtoroBuilder;
    ///
    /// let err = OtoroBuilder::new().with_min_points(0).build();
    /// assert!(err.is_err());
    /// ```
    pub fn build(self) -> Result<Otoro> {
        let min_points = NonZeroUsize::new(self.min_points).ok_or(OtoroError::InvalidMinPoints {
            got: self.min_points,
        })?;
        let min_cluster_size = NonZeroUsize::new(self.min_cluster_size).ok_or(
            OtoroError::InvalidMinClusterSize {
                got: self.min_cluster_size,
            },
        )?;

        Ok(Otoro::new(min_points, min_cluster_size, self.self_edges))
    }
}
