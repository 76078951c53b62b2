//! Integration tests for concurrent readers and writers.
//!
//! Readers must only ever observe whole batches: counts move in batch-sized
//! steps and every hit's catalog entry is present.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use simsearch::{Config, DocumentPayload, ExternalId, IndexManager};

const DIM: usize = 16;
const BATCH: usize = 10;

/// Generates a deterministic embedding from a seed.
fn make_embedding(seed: u64) -> Vec<f32> {
    (0..DIM)
        .map(|i| (seed as f32 * 0.37 + i as f32 * 0.11).sin())
        .collect()
}

/// Batch `b` holds documents `b * BATCH .. (b + 1) * BATCH`.
fn add_batch(index: &IndexManager, b: usize) {
    let range = b * BATCH..(b + 1) * BATCH;
    index
        .add_batch(
            range.clone().map(|i| make_embedding(i as u64)).collect(),
            range
                .clone()
                .map(|i| ExternalId::new(format!("doc_{}", i)))
                .collect(),
            range
                .map(|i| DocumentPayload::new().with("n", i as i64))
                .collect(),
            64,
            8,
        )
        .unwrap();
}

#[test]
fn test_readers_see_whole_batches() {
    let index = Arc::new(IndexManager::new(Config::default()).unwrap());
    add_batch(&index, 0);

    let done = Arc::new(AtomicBool::new(false));
    let readers: Vec<_> = (0..4)
        .map(|r| {
            let index = Arc::clone(&index);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut observations = 0usize;
                loop {
                    let finished = done.load(Ordering::Acquire);
                    let stats = index.stats().unwrap();
                    assert_eq!(stats.current_count % BATCH, 0, "saw a partial batch");
                    assert_eq!(stats.total_documents, stats.current_count);

                    let hits = index.search(&make_embedding(r as u64 * 7), 5, 32).unwrap();
                    for hit in &hits {
                        let n = hit.payload.get("n").and_then(|v| v.as_integer()).unwrap();
                        assert_eq!(hit.external_id.as_str(), format!("doc_{}", n));
                        assert_eq!(hit.internal_id.index() as i64, n);
                    }
                    observations += 1;
                    if finished {
                        break;
                    }
                }
                observations
            })
        })
        .collect();

    for b in 1..30 {
        add_batch(&index, b);
    }
    done.store(true, Ordering::Release);

    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }
    assert_eq!(index.len(), 30 * BATCH);
}

#[test]
fn test_concurrent_writers_are_serialized() {
    let index = Arc::new(IndexManager::new(Config::default()).unwrap());

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let index = Arc::clone(&index);
            thread::spawn(move || {
                for i in 0..5 {
                    let seed = (w * 100 + i) as u64;
                    index
                        .add_batch(
                            vec![make_embedding(seed); 2],
                            vec![ExternalId::new(format!("w{}_{}", w, i)); 2],
                            vec![DocumentPayload::new(); 2],
                            64,
                            8,
                        )
                        .unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    assert_eq!(index.len(), 40);
    let stats = index.stats().unwrap();
    assert_eq!(stats.current_count, 40);

    // Both copies of a batch are adjacent rows
    for w in 0..4 {
        for i in 0..5 {
            let found = index.find_by_external_id(&format!("w{}_{}", w, i)).unwrap();
            assert_eq!(found.len(), 2);
            assert_eq!(found[1].0.index(), found[0].0.index() + 1);
        }
    }
}

#[test]
fn test_rebuild_is_atomic_for_readers() {
    let index = Arc::new(IndexManager::new(Config::default()).unwrap());
    for b in 0..5 {
        add_batch(&index, b);
    }

    let done = Arc::new(AtomicBool::new(false));
    let reader = {
        let index = Arc::clone(&index);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !done.load(Ordering::Acquire) {
                let count = index.stats().unwrap().current_count;
                assert!(count == 5 * BATCH || count == 3, "unexpected count {}", count);
            }
        })
    };

    for _ in 0..10 {
        index
            .rebuild(
                (0..3).map(make_embedding).collect(),
                (0..3).map(|i| ExternalId::new(format!("r{}", i))).collect(),
                vec![DocumentPayload::new(); 3],
                64,
                8,
            )
            .unwrap();
        index
            .rebuild(
                (0..5 * BATCH as u64).map(make_embedding).collect(),
                (0..5 * BATCH).map(|i| ExternalId::new(format!("doc_{}", i))).collect(),
                vec![DocumentPayload::new(); 5 * BATCH],
                64,
                8,
            )
            .unwrap();
    }
    done.store(true, Ordering::Release);
    reader.join().unwrap();
}

#[test]
fn test_index_manager_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<IndexManager>();
    assert_send_sync::<simsearch::QueryService>();
}
