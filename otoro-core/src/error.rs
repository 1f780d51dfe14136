//! Error types for the Otoro core library.
//!
//! Defines error enums exposed by the public API and a convenient result alias.

use std::{fmt, num::NonZeroUsize, sync::Arc};

use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced by [`crate::DistanceSource`] operations.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DistanceSourceError {
    /// Requested index was outside the source's bounds.
    #[error("index {index} is out of bounds")]
    OutOfBounds {
        /// The requested row that exceeded the source bounds.
        index: usize,
    },
    /// A distance value was negative or non-finite.
    #[error("distance between {left} and {right} is not a valid metric value: {value}")]
    InvalidDistance {
        /// Left-hand point index of the offending pair.
        left: usize,
        /// Right-hand point index of the offending pair.
        right: usize,
        /// The offending distance value.
        value: f32,
    },
    /// A matrix row had a different length from the number of rows.
    #[error("row {row} has length {len} but the matrix has {rows} rows")]
    RaggedRow {
        /// Index of the offending row.
        row: usize,
        /// Length of the offending row.
        len: usize,
        /// Number of rows in the matrix.
        rows: usize,
    },
    /// Distance source contained no points.
    #[error("distance source contains no points")]
    EmptyData,
}

define_error_codes! {
    /// Stable codes describing [`DistanceSourceError`] variants.
    enum DistanceSourceErrorCode for DistanceSourceError {
        /// Requested index was outside the source's bounds.
        OutOfBounds => OutOfBounds { .. } => "DISTANCE_SOURCE_OUT_OF_BOUNDS",
        /// A distance value was negative or non-finite.
        InvalidDistance => InvalidDistance { .. } => "DISTANCE_SOURCE_INVALID_DISTANCE",
        /// A matrix row had a different length from the number of rows.
        RaggedRow => RaggedRow { .. } => "DISTANCE_SOURCE_RAGGED_ROW",
        /// Distance source contained no points.
        EmptyData => EmptyData => "DISTANCE_SOURCE_EMPTY",
    }
}

/// Error type produced when constructing or running [`crate::Otoro`].
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum OtoroError {
    /// The neighbourhood size used for core distances must be at least 1.
    #[error("min_points must be at least 1 (got {got})")]
    InvalidMinPoints {
        /// The invalid neighbourhood size supplied by the caller.
        got: usize,
    },
    /// Minimum cluster size must be greater than zero.
    #[error("min_cluster_size must be at least 1 (got {got})")]
    InvalidMinClusterSize {
        /// The invalid minimum cluster size supplied by the caller.
        got: usize,
    },
    /// The supplied [`crate::DistanceSource`] contained no points.
    #[error("distance source `{data_source}` contains no points")]
    EmptySource {
        /// Identifier for the empty distance source.
        data_source: Arc<str>,
    },
    /// The supplied [`crate::DistanceSource`] held fewer than two points.
    #[error("distance source `{data_source}` has {items} items but clustering requires at least 2")]
    TooFewItems {
        /// Identifier for the undersized distance source.
        data_source: Arc<str>,
        /// Number of items available in the distance source.
        items: usize,
    },
    /// The [`crate::DistanceSource`] did not contain enough items for the
    /// configured `min_cluster_size`.
    #[error(
        "distance source `{data_source}` has {items} items but min_cluster_size requires {min_cluster_size}"
    )]
    InsufficientItems {
        /// Identifier for the distance source that lacked sufficient items.
        data_source: Arc<str>,
        /// Number of items available in the distance source.
        items: usize,
        /// Minimum cluster size required by the algorithm.
        min_cluster_size: NonZeroUsize,
    },
    /// A pairwise constraint referenced a point outside the data set.
    #[error("constraint references point {index} but the data set has {items} points")]
    ConstraintOutOfBounds {
        /// The out-of-range point index named by the constraint.
        index: usize,
        /// Number of points in the data set.
        items: usize,
    },
    /// A [`crate::DistanceSource`] operation failed while running the algorithm.
    #[error("distance source `{data_source}` failed: {error}")]
    DataSource {
        /// Identifier for the distance source that produced the error.
        data_source: Arc<str>,
        #[source]
        /// Underlying distance source error bubbled up by the algorithm.
        error: DistanceSourceError,
    },
    /// The spanning tree stage failed.
    #[error("MST construction failed [{code}]: {message}")]
    MstFailure {
        /// Machine-readable code of the underlying MST error.
        code: Arc<str>,
        /// Rendered message of the underlying MST error.
        message: Arc<str>,
    },
    /// The hierarchy construction stage failed.
    #[error("hierarchy construction failed [{code}]: {message}")]
    HierarchyFailure {
        /// Machine-readable code of the underlying hierarchy error.
        code: Arc<str>,
        /// Rendered message of the underlying hierarchy error.
        message: Arc<str>,
    },
    /// The cluster tree rejected an operation.
    #[error("cluster tree operation failed [{code}]: {message}")]
    TreeFailure {
        /// Machine-readable code of the underlying tree error.
        code: Arc<str>,
        /// Rendered message of the underlying tree error.
        message: Arc<str>,
    },
    /// Outlier scoring failed.
    #[error("outlier scoring failed [{code}]: {message}")]
    OutlierFailure {
        /// Machine-readable code of the underlying outlier error.
        code: Arc<str>,
        /// Rendered message of the underlying outlier error.
        message: Arc<str>,
    },
}

define_error_codes! {
    /// Stable codes describing [`OtoroError`] variants.
    enum OtoroErrorCode for OtoroError {
        /// The neighbourhood size used for core distances must be at least 1.
        InvalidMinPoints => InvalidMinPoints { .. } => "OTORO_INVALID_MIN_POINTS",
        /// Minimum cluster size must be greater than zero.
        InvalidMinClusterSize => InvalidMinClusterSize { .. } => "OTORO_INVALID_MIN_CLUSTER_SIZE",
        /// The supplied [`crate::DistanceSource`] contained no points.
        EmptySource => EmptySource { .. } => "OTORO_EMPTY_SOURCE",
        /// The supplied [`crate::DistanceSource`] held fewer than two points.
        TooFewItems => TooFewItems { .. } => "OTORO_TOO_FEW_ITEMS",
        /// The [`crate::DistanceSource`] did not satisfy the configured
        /// minimum cluster size.
        InsufficientItems => InsufficientItems { .. } => "OTORO_INSUFFICIENT_ITEMS",
        /// A pairwise constraint referenced a point outside the data set.
        ConstraintOutOfBounds => ConstraintOutOfBounds { .. } => "OTORO_CONSTRAINT_OUT_OF_BOUNDS",
        /// A [`crate::DistanceSource`] operation failed while running the algorithm.
        DataSourceFailure => DataSource { .. } => "OTORO_DATA_SOURCE_FAILURE",
        /// The spanning tree stage failed.
        MstFailure => MstFailure { .. } => "OTORO_MST_FAILURE",
        /// The hierarchy construction stage failed.
        HierarchyFailure => HierarchyFailure { .. } => "OTORO_HIERARCHY_FAILURE",
        /// The cluster tree rejected an operation.
        TreeFailure => TreeFailure { .. } => "OTORO_TREE_FAILURE",
        /// Outlier scoring failed.
        OutlierFailure => OutlierFailure { .. } => "OTORO_OUTLIER_FAILURE",
    }
}

impl OtoroError {
    /// Retrieve the inner [`DistanceSourceErrorCode`] when the error
    /// originated in a [`crate::DistanceSource`].
    pub const fn data_source_code(&self) -> Option<DistanceSourceErrorCode> {
        match self {
            Self::DataSource { error, .. } => Some(error.code()),
            _ => None,
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, OtoroError>;
