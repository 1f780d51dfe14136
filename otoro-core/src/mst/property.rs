//! Property tests for mutual-reachability MST construction.
//!
//! Random symmetric distance matrices must always yield a connected, acyclic
//! tree whose weights equal the mutual-reachability distance of the
//! endpoints.

use std::num::NonZeroUsize;

use proptest::prelude::*;

use crate::{DenseDistanceMatrix, DistanceSource, compute_core_distances};

use super::build_mutual_reachability_mst;

fn symmetric_matrix(max_points: usize) -> impl Strategy<Value = Vec<Vec<f32>>> {
    (2..=max_points)
        .prop_flat_map(|n| {
            (
                Just(n),
                proptest::collection::vec(0.01f32..100.0, n * (n - 1) / 2),
            )
        })
        .prop_map(|(n, upper)| {
            let mut rows = vec![vec![0.0f32; n]; n];
            let mut cursor = 0;
            for i in 0..n {
                for j in (i + 1)..n {
                    rows[i][j] = upper[cursor];
                    rows[j][i] = upper[cursor];
                    cursor += 1;
                }
            }
            rows
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn spanning_tree_structure_holds((rows, min_points) in (symmetric_matrix(12), 1usize..=4)) {
        let source = DenseDistanceMatrix::try_new(rows).expect("generated matrix is valid");
        let items = source.len();
        let core = compute_core_distances(
            &source,
            NonZeroUsize::new(min_points).expect("non-zero"),
        )
        .expect("core distances");

        let graph = build_mutual_reachability_mst(&source, &core, true)
            .expect("MST must succeed for valid inputs");

        let tree: Vec<_> = graph.edges().iter().filter(|e| !e.is_self_edge()).collect();
        let self_loops: Vec<_> = graph.edges().iter().filter(|e| e.is_self_edge()).collect();
        prop_assert_eq!(tree.len(), items - 1);
        prop_assert_eq!(self_loops.len(), items);

        // Acyclic and connected via union-find.
        let mut parent: Vec<usize> = (0..items).collect();
        fn find(parent: &mut [usize], node: usize) -> usize {
            let mut current = node;
            while parent[current] != current {
                parent[current] = parent[parent[current]];
                current = parent[current];
            }
            current
        }
        for edge in &tree {
            let left = find(&mut parent, edge.source());
            let right = find(&mut parent, edge.target());
            prop_assert_ne!(left, right, "tree edge closed a cycle");
            parent[right] = left;
        }
        let root = find(&mut parent, 0);
        for node in 1..items {
            prop_assert_eq!(find(&mut parent, node), root, "tree is disconnected");
        }

        // Weight correctness against the symmetric mutual-reachability metric.
        for edge in &tree {
            let distance = source.distance(edge.source(), edge.target()).expect("lookup");
            let reverse = source.distance(edge.target(), edge.source()).expect("lookup");
            prop_assert_eq!(distance, reverse);
            let expected = distance.max(core[edge.source()]).max(core[edge.target()]);
            prop_assert_eq!(edge.weight(), expected);
        }
        for (point, edge) in self_loops.iter().enumerate() {
            prop_assert_eq!(edge.source(), point);
            prop_assert_eq!(edge.weight(), core[point]);
        }
    }
}
