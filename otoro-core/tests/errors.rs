//! Error-path tests for the public API.

use otoro_core::{
    Constraint, ConstraintKind, DenseDistanceMatrix, DistanceSource, DistanceSourceError,
    OtoroBuilder, OtoroError, OtoroErrorCode,
};

fn pair_matrix() -> DenseDistanceMatrix {
    DenseDistanceMatrix::try_new(vec![vec![0.0, 1.0], vec![1.0, 0.0]]).expect("valid matrix")
}

#[test]
fn builder_rejects_zero_min_points() {
    let err = OtoroBuilder::new()
        .with_min_points(0)
        .build()
        .expect_err("min_points 0 must fail");
    assert!(matches!(err, OtoroError::InvalidMinPoints { got: 0 }));
    assert_eq!(err.code(), OtoroErrorCode::InvalidMinPoints);
}

#[test]
fn builder_rejects_zero_min_cluster_size() {
    let err = OtoroBuilder::new()
        .with_min_cluster_size(0)
        .build()
        .expect_err("min_cluster_size 0 must fail");
    assert!(matches!(err, OtoroError::InvalidMinClusterSize { got: 0 }));
}

#[test]
fn run_rejects_empty_sources() {
    struct Empty;
    impl DistanceSource for Empty {
        fn len(&self) -> usize {
            0
        }
        fn name(&self) -> &str {
            "empty"
        }
        fn distance(&self, _: usize, _: usize) -> Result<f32, DistanceSourceError> {
            Ok(0.0)
        }
    }

    let otoro = OtoroBuilder::new().build().expect("builder must succeed");
    let err = otoro.run(&Empty).expect_err("empty source must fail");
    assert!(matches!(err, OtoroError::EmptySource { .. }));
    assert_eq!(err.code(), OtoroErrorCode::EmptySource);
}

#[test]
fn run_rejects_single_points() {
    struct One;
    impl DistanceSource for One {
        fn len(&self) -> usize {
            1
        }
        fn name(&self) -> &str {
            "one"
        }
        fn distance(&self, _: usize, _: usize) -> Result<f32, DistanceSourceError> {
            Ok(0.0)
        }
    }

    let otoro = OtoroBuilder::new()
        .with_min_cluster_size(1)
        .build()
        .expect("builder must succeed");
    let err = otoro.run(&One).expect_err("one point must fail");
    assert!(matches!(err, OtoroError::TooFewItems { items: 1, .. }));
}

#[test]
fn run_rejects_sources_smaller_than_min_cluster_size() {
    let otoro = OtoroBuilder::new()
        .with_min_cluster_size(5)
        .build()
        .expect("builder must succeed");
    let err = otoro
        .run(&pair_matrix())
        .expect_err("two points cannot satisfy min_cluster_size 5");
    assert!(matches!(
        err,
        OtoroError::InsufficientItems { items: 2, .. }
    ));
    assert_eq!(err.code(), OtoroErrorCode::InsufficientItems);
}

#[test]
fn run_rejects_out_of_bounds_constraints() {
    let otoro = OtoroBuilder::new()
        .with_min_points(2)
        .with_min_cluster_size(2)
        .build()
        .expect("builder must succeed");
    let constraints = [Constraint::new(0, 9, ConstraintKind::MustLink)];

    let err = otoro
        .run_with_constraints(&pair_matrix(), &constraints)
        .expect_err("constraint on point 9 must fail");
    assert!(matches!(
        err,
        OtoroError::ConstraintOutOfBounds { index: 9, items: 2 }
    ));
}

#[test]
fn distance_source_failures_carry_the_source_name() {
    struct Faulty;
    impl DistanceSource for Faulty {
        fn len(&self) -> usize {
            4
        }
        fn name(&self) -> &str {
            "faulty"
        }
        fn distance(&self, i: usize, _: usize) -> Result<f32, DistanceSourceError> {
            Err(DistanceSourceError::OutOfBounds { index: i })
        }
    }

    let otoro = OtoroBuilder::new()
        .with_min_points(2)
        .with_min_cluster_size(2)
        .build()
        .expect("builder must succeed");
    let err = otoro.run(&Faulty).expect_err("faulty source must fail");

    match err {
        OtoroError::DataSource { data_source, error } => {
            assert_eq!(&*data_source, "faulty");
            assert!(matches!(error, DistanceSourceError::OutOfBounds { .. }));
        }
        other => panic!("expected DataSource error, got {other:?}"),
    }
}

#[test]
fn error_codes_are_stable_strings() {
    assert_eq!(OtoroErrorCode::EmptySource.as_str(), "OTORO_EMPTY_SOURCE");
    assert_eq!(OtoroErrorCode::MstFailure.as_str(), "OTORO_MST_FAILURE");
    assert_eq!(
        OtoroErrorCode::ConstraintOutOfBounds.as_str(),
        "OTORO_CONSTRAINT_OUT_OF_BOUNDS"
    );
}
