//! Snapshot persistence.
//!
//! A snapshot is a directory holding two files:
//!
//! ```text
//! <dir>/
//! ├── index.graph       bincode: params, graph topology, flat vectors
//! └── index.meta.json   pretty JSON: external ids, payloads, counts
//! ```
//!
//! Both files are written to a `.tmp` sibling first and renamed into place.
//! The JSON sidecar can be read on its own for diagnostics.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::state::IndexState;
use crate::catalog::{DocumentCatalog, DocumentPayload};
use crate::error::{Result, SnapshotError};
use crate::graph::{GraphNode, GraphParams, HnswGraph};
use crate::store::VectorStore;
use crate::types::ExternalId;

/// Snapshot format version written by this build.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// File name of the bincode graph blob.
pub const GRAPH_FILE: &str = "index.graph";

/// File name of the JSON metadata sidecar.
pub const META_FILE: &str = "index.meta.json";

/// Binary graph blob. The version is the first field so it can be read
/// before the rest is trusted.
#[derive(Serialize, Deserialize)]
struct GraphBlob {
    version: u32,
    m: usize,
    m0: usize,
    ef_construction: usize,
    level_multiplier: f64,
    seed: u64,
    dimension: Option<usize>,
    capacity: usize,
    entry_point: Option<usize>,
    max_layer: usize,
    nodes: Vec<GraphNode>,
    vectors: Vec<f32>,
}

/// Contents of the JSON metadata sidecar.
///
/// `external_ids[i]` and `payloads[i]` describe the document with internal
/// id `i`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Format version.
    pub version: u32,
    /// External ids in internal id order.
    pub external_ids: Vec<ExternalId>,
    /// Payloads in internal id order.
    pub payloads: Vec<DocumentPayload>,
    /// Vector dimension, if the index was initialized.
    pub dimension: Option<usize>,
    /// Whether any vector had been indexed.
    pub initialized: bool,
    /// Number of documents.
    pub count: usize,
    /// Max neighbors per node on upper layers.
    pub m: usize,
    /// Construction beam width.
    pub ef_construction: usize,
}

pub(crate) fn graph_path(dir: &Path) -> PathBuf {
    dir.join(GRAPH_FILE)
}

pub(crate) fn meta_path(dir: &Path) -> PathBuf {
    dir.join(META_FILE)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Writes `bytes` to `path` via a synced temporary file and a rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = tmp_path(path);
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Serializes `state` into `dir`, creating the directory if needed.
pub(crate) fn write(dir: &Path, state: &IndexState) -> Result<()> {
    fs::create_dir_all(dir)?;

    let params = state.graph.params();
    let blob = GraphBlob {
        version: SNAPSHOT_FORMAT_VERSION,
        m: params.m,
        m0: params.m0,
        ef_construction: params.ef_construction,
        level_multiplier: params.level_multiplier,
        seed: params.seed,
        dimension: state.dimension(),
        capacity: state.capacity,
        entry_point: state.graph.entry_point(),
        max_layer: state.graph.max_layer(),
        nodes: state.graph.nodes().to_vec(),
        vectors: state
            .vectors
            .as_ref()
            .map(|v| v.as_flat().to_vec())
            .unwrap_or_default(),
    };
    let metadata = SnapshotMetadata {
        version: SNAPSHOT_FORMAT_VERSION,
        external_ids: state.catalog.external_ids().to_vec(),
        payloads: state.catalog.payloads().to_vec(),
        dimension: state.dimension(),
        initialized: state.vectors.is_some(),
        count: state.len(),
        m: params.m,
        ef_construction: params.ef_construction,
    };

    let graph_bytes =
        bincode::serialize(&blob).map_err(|e| SnapshotError::Encode(e.to_string()))?;
    let meta_json = serde_json::to_string_pretty(&metadata)
        .map_err(|e| SnapshotError::Encode(e.to_string()))?;

    write_atomic(&graph_path(dir), &graph_bytes)?;
    write_atomic(&meta_path(dir), meta_json.as_bytes())?;
    Ok(())
}

/// Reads only the JSON sidecar.
///
/// Returns `Ok(None)` if the sidecar does not exist.
pub(crate) fn read_metadata(dir: &Path) -> Result<Option<SnapshotMetadata>> {
    let path = meta_path(dir);
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(&path)?;
    Ok(Some(parse_metadata(&json)?))
}

fn parse_metadata(json: &str) -> std::result::Result<SnapshotMetadata, SnapshotError> {
    let metadata: SnapshotMetadata = serde_json::from_str(json)?;
    if metadata.version != SNAPSHOT_FORMAT_VERSION {
        return Err(SnapshotError::VersionMismatch {
            expected: SNAPSHOT_FORMAT_VERSION,
            found: metadata.version,
        });
    }
    Ok(metadata)
}

/// Reads and cross-checks both snapshot files.
///
/// Returns `Ok(None)` if either file is missing; nothing is parsed in that
/// case.
pub(crate) fn read(dir: &Path) -> Result<Option<IndexState>> {
    let graph_file = graph_path(dir);
    let meta_file = meta_path(dir);
    if !graph_file.exists() || !meta_file.exists() {
        return Ok(None);
    }

    let graph_bytes = fs::read(&graph_file)?;
    let meta_json = fs::read_to_string(&meta_file)?;
    Ok(Some(decode(&graph_bytes, &meta_json)?))
}

/// Decodes snapshot contents into a fresh state.
///
/// Every inconsistency between the two files is reported as a
/// [`SnapshotError`]; a state is only returned if it is fully usable.
pub(crate) fn decode(
    graph_bytes: &[u8],
    meta_json: &str,
) -> std::result::Result<IndexState, SnapshotError> {
    let version: u32 = bincode::deserialize(graph_bytes)?;
    if version != SNAPSHOT_FORMAT_VERSION {
        return Err(SnapshotError::VersionMismatch {
            expected: SNAPSHOT_FORMAT_VERSION,
            found: version,
        });
    }
    let blob: GraphBlob = bincode::deserialize(graph_bytes)?;
    let metadata = parse_metadata(meta_json)?;

    let count = metadata.count;
    if metadata.external_ids.len() != count || metadata.payloads.len() != count {
        return Err(SnapshotError::corrupted(format!(
            "metadata count {} but {} external ids and {} payloads",
            count,
            metadata.external_ids.len(),
            metadata.payloads.len()
        )));
    }
    if blob.nodes.len() != count {
        return Err(SnapshotError::corrupted(format!(
            "graph has {} nodes but metadata lists {} documents",
            blob.nodes.len(),
            count
        )));
    }
    if blob.dimension != metadata.dimension || metadata.initialized != blob.dimension.is_some() {
        return Err(SnapshotError::corrupted(format!(
            "dimension mismatch between graph ({:?}) and metadata ({:?}, initialized: {})",
            blob.dimension, metadata.dimension, metadata.initialized
        )));
    }
    if blob.m != metadata.m || blob.ef_construction != metadata.ef_construction {
        return Err(SnapshotError::corrupted(
            "graph parameters differ between graph and metadata",
        ));
    }
    if blob.m < 2 || blob.m0 < blob.m || blob.ef_construction == 0 {
        return Err(SnapshotError::corrupted(format!(
            "invalid graph parameters m={} m0={} ef_construction={}",
            blob.m, blob.m0, blob.ef_construction
        )));
    }
    if !blob.level_multiplier.is_finite() || blob.level_multiplier <= 0.0 {
        return Err(SnapshotError::corrupted("invalid level multiplier"));
    }

    let vectors = match blob.dimension {
        Some(dimension) => {
            let store = VectorStore::from_flat(dimension, blob.vectors)
                .map_err(|e| SnapshotError::corrupted(e.to_string()))?;
            if store.len() != count {
                return Err(SnapshotError::corrupted(format!(
                    "{} vectors stored for {} documents",
                    store.len(),
                    count
                )));
            }
            Some(store)
        }
        None if count == 0 && blob.vectors.is_empty() => None,
        None => {
            return Err(SnapshotError::corrupted(
                "uninitialized snapshot contains documents",
            ))
        }
    };

    let params = GraphParams {
        m: blob.m,
        m0: blob.m0,
        ef_construction: blob.ef_construction,
        level_multiplier: blob.level_multiplier,
        seed: blob.seed,
    };
    let graph = HnswGraph::from_parts(params, blob.nodes, blob.entry_point, blob.max_layer);
    graph.check_structure().map_err(SnapshotError::Corrupted)?;

    let catalog = DocumentCatalog::from_parts(metadata.external_ids, metadata.payloads)
        .map_err(|e| SnapshotError::corrupted(e.to_string()))?;

    Ok(IndexState {
        vectors,
        graph,
        catalog,
        capacity: blob.capacity.max(count).max(1),
    })
}

/// Removes snapshot files and any leftover temporaries from `dir`.
pub(crate) fn remove(dir: &Path) -> Result<()> {
    for path in [graph_path(dir), meta_path(dir)] {
        for candidate in [tmp_path(&path), path] {
            if candidate.exists() {
                fs::remove_file(&candidate)?;
            }
        }
    }
    Ok(())
}
