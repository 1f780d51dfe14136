//! Distance source abstractions for the Otoro core runtime.
//!
//! The engine never computes distances from raw feature vectors; it consumes
//! pairwise distances through the [`DistanceSource`] trait. The caller owns
//! the data and the metric. [`DenseDistanceMatrix`] adapts a pre-computed
//! square matrix to the trait with up-front validation.

use crate::error::DistanceSourceError;

/// Abstraction over a collection of points that can yield pairwise distances.
///
/// # Examples
/// ```
/// use otoro_core::{DistanceSource, DistanceSourceError};
///
/// struct Line(Vec<f32>);
///
/// impl DistanceSource for Line {
///     fn len(&self) -> usize { self.0.len() }
///     fn name(&self) -> &str { "line" }
///     fn distance(&self, i: usize, j: usize) -> Result<f32, DistanceSourceError> {
///         let a = self.0.get(i).ok_or(DistanceSourceError::OutOfBounds { index: i })?;
///         let b = self.0.get(j).ok_or(DistanceSourceError::OutOfBounds { index: j })?;
///         Ok((a - b).abs())
///     }
/// }
///
/// let src = Line(vec![1.0, 2.0, 4.0]);
/// assert_eq!(src.len(), 3);
/// assert_eq!(src.distance(0, 2)?, 3.0);
/// # Ok::<(), DistanceSourceError>(())
/// ```
pub trait DistanceSource {
    /// Returns the number of points in the source.
    fn len(&self) -> usize;

    /// Returns whether the source contains no points.
    #[must_use]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a human-readable name for diagnostics.
    fn name(&self) -> &str;

    /// Computes the distance between two points.
    ///
    /// Implementations must return [`DistanceSourceError::OutOfBounds`] for
    /// invalid indices and must not yield negative or non-finite distances.
    fn distance(&self, i: usize, j: usize) -> Result<f32, DistanceSourceError>;
}

/// A caller-supplied square distance matrix, validated once at construction.
///
/// The matrix is read-only for the lifetime of a run. The diagonal is unused
/// by the engine and is not validated beyond finiteness.
///
/// # Examples
/// ```
/// use otoro_core::{DenseDistanceMatrix, DistanceSource};
///
/// let matrix = DenseDistanceMatrix::try_new(vec![
///     vec![0.0, 1.0],
///     vec![1.0, 0.0],
/// ])?;
/// assert_eq!(matrix.len(), 2);
/// assert_eq!(matrix.distance(0, 1)?, 1.0);
/// # Ok::<(), otoro_core::DistanceSourceError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DenseDistanceMatrix {
    rows: Vec<Vec<f32>>,
    name: String,
}

impl DenseDistanceMatrix {
    /// Validates and wraps a square matrix of pairwise distances.
    ///
    /// # Errors
    /// Returns [`DistanceSourceError::EmptyData`] for an empty matrix,
    /// [`DistanceSourceError::RaggedRow`] when any row length differs from
    /// the row count, and [`DistanceSourceError::InvalidDistance`] when an
    /// entry is negative or non-finite.
    pub fn try_new(rows: Vec<Vec<f32>>) -> Result<Self, DistanceSourceError> {
        Self::try_with_name(rows, "dense-matrix")
    }

    /// Like [`Self::try_new`] but with a caller-chosen diagnostic name.
    ///
    /// # Errors
    /// Same as [`Self::try_new`].
    pub fn try_with_name(
        rows: Vec<Vec<f32>>,
        name: impl Into<String>,
    ) -> Result<Self, DistanceSourceError> {
        if rows.is_empty() {
            return Err(DistanceSourceError::EmptyData);
        }
        let expected = rows.len();
        for (row_index, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(DistanceSourceError::RaggedRow {
                    row: row_index,
                    len: row.len(),
                    rows: expected,
                });
            }
            for (column, &value) in row.iter().enumerate() {
                if !value.is_finite() || value < 0.0 {
                    return Err(DistanceSourceError::InvalidDistance {
                        left: row_index,
                        right: column,
                        value,
                    });
                }
            }
        }
        Ok(Self {
            rows,
            name: name.into(),
        })
    }
}

impl DistanceSource for DenseDistanceMatrix {
    fn len(&self) -> usize {
        self.rows.len()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn distance(&self, i: usize, j: usize) -> Result<f32, DistanceSourceError> {
        let row = self
            .rows
            .get(i)
            .ok_or(DistanceSourceError::OutOfBounds { index: i })?;
        row.get(j)
            .copied()
            .ok_or(DistanceSourceError::OutOfBounds { index: j })
    }
}
