//! Loading arbitrary snapshot files must fail cleanly, never panic.
//!
//! The first input byte picks how the rest is split between the graph file
//! and the metadata sidecar.

#![no_main]

use libfuzzer_sys::fuzz_target;
use simsearch::index::{GRAPH_FILE, META_FILE};
use simsearch::{Config, IndexManager};

fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let split = (split as usize * rest.len()) / 255;
    let (graph, meta) = rest.split_at(split);

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(GRAPH_FILE), graph).unwrap();
    std::fs::write(dir.path().join(META_FILE), meta).unwrap();

    let index = IndexManager::new(Config::default()).unwrap();
    if let Ok(true) = index.load_snapshot(dir.path()) {
        // Whatever loaded must be searchable
        if let Some(dim) = index.dimension() {
            let _ = index.search(&vec![1.0; dim], 5, 16);
        }
    }
});
