//! Arbitrary batches and queries must never panic the index.

#![no_main]

use libfuzzer_sys::fuzz_target;
use simsearch::{Config, DocumentPayload, ExternalId, IndexManager};

const DIM: usize = 4;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let k = data[0] as usize % 32;
    let ef = data[1] as usize;

    let floats: Vec<f32> = data[2..]
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    let vectors: Vec<Vec<f32>> = floats.chunks_exact(DIM).map(<[f32]>::to_vec).collect();
    let Some((query, docs)) = vectors.split_last() else {
        return;
    };

    let index = IndexManager::new(Config::default()).unwrap();
    let n = docs.len();
    let added = index.add_batch(
        docs.to_vec(),
        (0..n).map(|i| ExternalId::new(i.to_string())).collect(),
        vec![DocumentPayload::new(); n],
        16,
        4,
    );
    if added.is_err() {
        return;
    }

    if let Ok(hits) = index.search(query, k, ef) {
        assert!(hits.len() <= k.min(n));
    }
    let _ = index.search_with_threshold(query, k, 0.5, ef);
});
