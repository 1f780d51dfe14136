//! Unit tests for mutual-reachability MST construction.

use std::num::NonZeroUsize;

use rstest::rstest;

use crate::{DenseDistanceMatrix, compute_core_distances};

use super::{GraphEdge, MstError, build_mutual_reachability_mst};

fn euclidean_matrix(points: &[(f32, f32)]) -> DenseDistanceMatrix {
    let rows = points
        .iter()
        .map(|&(ax, ay)| {
            points
                .iter()
                .map(|&(bx, by)| ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt())
                .collect()
        })
        .collect();
    DenseDistanceMatrix::try_new(rows).expect("valid matrix")
}

fn core_distances(source: &DenseDistanceMatrix, min_points: usize) -> Vec<f32> {
    compute_core_distances(source, NonZeroUsize::new(min_points).expect("non-zero"))
        .expect("core distances")
}

fn check_spanning(node_count: usize, edges: &[GraphEdge]) {
    let mut parent: Vec<usize> = (0..node_count).collect();

    fn find(parent: &mut [usize], node: usize) -> usize {
        let mut current = node;
        while parent[current] != current {
            parent[current] = parent[parent[current]];
            current = parent[current];
        }
        current
    }

    for edge in edges.iter().filter(|edge| !edge.is_self_edge()) {
        let left = find(&mut parent, edge.source());
        let right = find(&mut parent, edge.target());
        assert_ne!(left, right, "tree edges must not form cycles");
        parent[right] = left;
    }

    let root = find(&mut parent, 0);
    for node in 1..node_count {
        assert_eq!(find(&mut parent, node), root, "tree must be connected");
    }
}

#[test]
fn rejects_single_point() {
    let source = DenseDistanceMatrix::try_new(vec![vec![0.0]]).expect("valid matrix");
    let result = build_mutual_reachability_mst(&source, &[0.0], false);
    assert!(matches!(result, Err(MstError::TooFewPoints { items: 1 })));
}

#[test]
fn rejects_mismatched_core_distances() {
    let source = euclidean_matrix(&[(0.0, 0.0), (1.0, 0.0)]);
    let result = build_mutual_reachability_mst(&source, &[0.0], false);
    assert!(matches!(
        result,
        Err(MstError::CoreDistanceLengthMismatch {
            items: 2,
            core_distances: 1
        })
    ));
}

#[rstest]
#[case(false, 3)]
#[case(true, 7)]
fn edge_count_is_n_minus_one_plus_optional_self_edges(
    #[case] self_edges: bool,
    #[case] expected: usize,
) {
    let source = euclidean_matrix(&[(0.0, 0.0), (0.0, 1.0), (10.0, 10.0), (10.0, 11.0)]);
    let core = core_distances(&source, 2);
    let graph =
        build_mutual_reachability_mst(&source, &core, self_edges).expect("MST must succeed");

    assert_eq!(graph.node_count(), 4);
    assert_eq!(graph.edges().len(), expected);
    check_spanning(4, graph.edges());
}

#[test]
fn edge_weights_equal_mutual_reachability_of_endpoints() {
    let source = euclidean_matrix(&[(0.0, 0.0), (0.5, 0.0), (3.0, 4.0), (9.0, 1.0), (4.0, 4.0)]);
    let core = core_distances(&source, 3);
    let graph = build_mutual_reachability_mst(&source, &core, false).expect("MST must succeed");

    use crate::DistanceSource;
    for edge in graph.edges() {
        let distance = source
            .distance(edge.source(), edge.target())
            .expect("distance lookup");
        let expected = distance.max(core[edge.source()]).max(core[edge.target()]);
        assert_eq!(edge.weight(), expected);
    }
}

#[test]
fn two_pair_scenario_produces_short_edges_and_one_bridge() {
    let source = euclidean_matrix(&[(0.0, 0.0), (0.0, 1.0), (10.0, 10.0), (10.0, 11.0)]);
    let core = core_distances(&source, 2);
    assert_eq!(core, vec![1.0; 4]);

    let graph = build_mutual_reachability_mst(&source, &core, true).expect("MST must succeed");
    let tree: Vec<_> = graph
        .edges()
        .iter()
        .filter(|edge| !edge.is_self_edge())
        .collect();
    let self_loops: Vec<_> = graph
        .edges()
        .iter()
        .filter(|edge| edge.is_self_edge())
        .collect();

    assert_eq!(tree.len(), 3);
    assert_eq!(self_loops.len(), 4);
    for edge in &self_loops {
        assert_eq!(edge.weight(), 1.0);
    }

    let mut weights: Vec<f32> = tree.iter().map(|edge| edge.weight()).collect();
    weights.sort_by(f32::total_cmp);
    assert_eq!(weights[0], 1.0);
    assert_eq!(weights[1], 1.0);
    // The bridge is the shortest cross-pair distance, (0, 1) -> (10, 10).
    let bridge = (10.0f32.powi(2) + 9.0f32.powi(2)).sqrt();
    assert_eq!(weights[2], bridge);
}

#[test]
fn tie_break_prefers_first_point_index() {
    // Three equidistant points: every mutual-reachability distance is 1.
    let source = DenseDistanceMatrix::try_new(vec![
        vec![0.0, 1.0, 1.0],
        vec![1.0, 0.0, 1.0],
        vec![1.0, 1.0, 0.0],
    ])
    .expect("valid matrix");
    let graph =
        build_mutual_reachability_mst(&source, &[0.0; 3], false).expect("MST must succeed");

    // Prim starts at point 2; the first equal candidate in the ascending scan
    // is point 0. Point 1 keeps its original best neighbour 2 because the
    // later equal offer from point 0 does not displace it.
    let endpoints: Vec<(usize, usize)> = graph
        .edges()
        .iter()
        .map(|edge| (edge.source(), edge.target()))
        .collect();
    assert_eq!(endpoints, vec![(0, 2), (1, 2)]);
}

#[test]
fn propagates_source_failures() {
    use crate::{DistanceSource, DistanceSourceError};

    struct Faulty;
    impl DistanceSource for Faulty {
        fn len(&self) -> usize {
            3
        }
        fn name(&self) -> &str {
            "faulty"
        }
        fn distance(&self, i: usize, j: usize) -> Result<f32, DistanceSourceError> {
            Err(DistanceSourceError::OutOfBounds { index: i.max(j) })
        }
    }

    let result = build_mutual_reachability_mst(&Faulty, &[0.0; 3], false);
    assert!(matches!(result, Err(MstError::DataSource(_))));
}
