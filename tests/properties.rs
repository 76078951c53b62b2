//! Property-based tests for the index.
//!
//! Small graphs searched with a beam at least as wide as the index must
//! return exactly the brute-force answer, ordered by distance then id.

use proptest::prelude::*;
use simsearch::graph::cosine_distance;
use simsearch::{Config, DocumentPayload, ExternalId, IndexManager};

const DIM: usize = 6;

/// Up to 30 vectors of dimension [`DIM`].
fn vectors_strategy() -> impl Strategy<Value = Vec<Vec<f32>>> {
    prop::collection::vec(prop::collection::vec(-1.0f32..1.0, DIM), 1..=30)
}

/// Builds an index with `m = 16`, so layer 0 (cap 32) never prunes a node
/// of a graph this small.
fn build(vectors: &[Vec<f32>]) -> IndexManager {
    let index = IndexManager::new(Config::default()).unwrap();
    index
        .add_batch(
            vectors.to_vec(),
            (0..vectors.len())
                .map(|i| ExternalId::new(format!("v{}", i)))
                .collect(),
            vec![DocumentPayload::new(); vectors.len()],
            64,
            16,
        )
        .unwrap();
    index
}

/// Exhaustive k-nearest by (distance, id).
fn brute_force(vectors: &[Vec<f32>], query: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = vectors
        .iter()
        .enumerate()
        .map(|(i, v)| (i, cosine_distance(query, v)))
        .collect();
    scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    scored.truncate(k);
    scored
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_wide_beam_matches_brute_force(
        vectors in vectors_strategy(),
        query in prop::collection::vec(-1.0f32..1.0, DIM),
        k in 1usize..40,
        extra_ef in 0usize..20,
    ) {
        let index = build(&vectors);
        let hits = index.search(&query, k, 30 + extra_ef).unwrap();

        let expected = brute_force(&vectors, &query, k);
        prop_assert_eq!(hits.len(), expected.len());
        for (hit, (id, distance)) in hits.iter().zip(&expected) {
            prop_assert_eq!(hit.internal_id.index(), *id);
            prop_assert_eq!(hit.distance, *distance);
        }
    }

    #[test]
    fn prop_results_sorted_and_bounded(
        vectors in vectors_strategy(),
        query in prop::collection::vec(-1.0f32..1.0, DIM),
        k in 0usize..40,
        ef in 1usize..40,
    ) {
        let index = build(&vectors);
        let hits = index.search(&query, k, ef).unwrap();

        prop_assert!(hits.len() <= k);
        prop_assert!(hits.len() <= vectors.len());
        for pair in hits.windows(2) {
            prop_assert!(
                pair[0].distance < pair[1].distance
                    || (pair[0].distance == pair[1].distance
                        && pair[0].internal_id < pair[1].internal_id)
            );
        }
        for hit in &hits {
            prop_assert!((-1e-6..=2.0 + 1e-6).contains(&hit.distance));
            let expected_id = format!("v{}", hit.internal_id.index());
            prop_assert_eq!(hit.external_id.as_str(), expected_id.as_str());
        }
    }

    #[test]
    fn prop_wrong_dimension_batch_rejected(
        vectors in vectors_strategy(),
        bad_at in 0usize..30,
        bad_dim in (1usize..12).prop_filter("must differ", |d| *d != DIM),
    ) {
        let index = build(&vectors);
        let before = index.stats().unwrap();

        let mut batch: Vec<Vec<f32>> = vectors.clone();
        let bad_at = bad_at % batch.len();
        batch[bad_at] = vec![0.5; bad_dim];
        let n = batch.len();

        let err = index
            .add_batch(
                batch,
                (0..n).map(|i| ExternalId::new(format!("x{}", i))).collect(),
                vec![DocumentPayload::new(); n],
                64,
                16,
            )
            .unwrap_err();
        prop_assert!(err.is_dimension_mismatch());
        prop_assert_eq!(index.stats().unwrap(), before);
    }
}
