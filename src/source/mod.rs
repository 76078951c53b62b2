//! Document sources feeding the index.
//!
//! A [`DocumentSource`] yields [`SourceDocument`]s: an external id, the
//! payload stored alongside the vector, and the text handed to the embedder.
//!
//! - [`JsonCorpusSource`] reads a local corpus file
//! - [`SyntheticSource`] generates a deterministic demo corpus
//! - [`CombinedSource`] concatenates several sources and drops repeated titles

mod synthetic;

pub use synthetic::SyntheticSource;

use std::collections::HashSet;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::catalog::{DocumentPayload, FieldValue};
use crate::error::{NotFoundError, Result, ValidationError};
use crate::types::ExternalId;

/// One document ready for embedding and indexing.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceDocument {
    /// Caller-facing document id.
    pub id: ExternalId,
    /// Fields stored with the vector and returned with search hits.
    pub payload: DocumentPayload,
    /// Text to embed.
    pub text: String,
}

impl SourceDocument {
    /// Builds a document from a paper-shaped JSON object.
    ///
    /// The `"id"` field (string or number) becomes the external id, falling
    /// back to `doc_{index}`. The id stays in the payload too.
    pub fn from_json_object(index: usize, object: serde_json::Map<String, Value>) -> Self {
        let id = match object.get("id") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => format!("doc_{}", index),
        };
        let payload = DocumentPayload::from_json_object(object);
        let text = embedding_text(&payload);
        Self {
            id: ExternalId::new(id),
            payload,
            text,
        }
    }

    /// Title used for de-duplication, if present.
    pub fn title(&self) -> Option<&str> {
        self.payload.text("title")
    }
}

/// Text handed to the embedder: `title + ". " + abstract`, or whichever of
/// the two exists.
pub fn embedding_text(payload: &DocumentPayload) -> String {
    let title = payload.text("title").map(str::trim).unwrap_or("");
    let abstract_ = payload.text("abstract").map(str::trim).unwrap_or("");
    match (title.is_empty(), abstract_.is_empty()) {
        (false, false) => format!("{}. {}", title, abstract_),
        (false, true) => title.to_string(),
        (true, false) => abstract_.to_string(),
        (true, true) => String::new(),
    }
}

/// Producer of documents to index.
pub trait DocumentSource: Send + Sync {
    /// Short name used in logs and corpus metadata.
    fn name(&self) -> &str;

    /// Loads every document.
    fn documents(&self) -> Result<Vec<SourceDocument>>;
}

/// Corpus stored as a local JSON file.
///
/// Accepts either a top-level array of paper objects or an object with a
/// `"papers"` array (the layout [`save_corpus`] writes). Entries that are
/// not objects are skipped with a warning.
#[derive(Clone, Debug)]
pub struct JsonCorpusSource {
    path: PathBuf,
}

impl JsonCorpusSource {
    /// Creates a source reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the corpus file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentSource for JsonCorpusSource {
    fn name(&self) -> &str {
        "local"
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn documents(&self) -> Result<Vec<SourceDocument>> {
        if !self.path.exists() {
            return Err(NotFoundError::File(self.path.clone()).into());
        }
        let json = fs::read_to_string(&self.path)?;
        let invalid = |reason: String| {
            ValidationError::invalid_field(self.path.display().to_string(), reason)
        };

        let value: Value = serde_json::from_str(&json).map_err(|e| invalid(e.to_string()))?;
        let entries = match value {
            Value::Array(entries) => entries,
            Value::Object(mut object) => match object.remove("papers") {
                Some(Value::Array(entries)) => entries,
                _ => return Err(invalid("expected a \"papers\" array".to_string()).into()),
            },
            _ => {
                return Err(
                    invalid("expected an array or an object with \"papers\"".to_string()).into(),
                )
            }
        };

        let total = entries.len();
        let docs: Vec<SourceDocument> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(i, entry)| match entry {
                Value::Object(object) => Some(SourceDocument::from_json_object(i, object)),
                other => {
                    warn!(index = i, kind = json_kind(&other), "Skipping non-object corpus entry");
                    None
                }
            })
            .collect();

        info!(loaded = docs.len(), skipped = total - docs.len(), "Loaded corpus file");
        Ok(docs)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Several sources loaded in order, then de-duplicated by title.
#[derive(Default)]
pub struct CombinedSource {
    sources: Vec<Box<dyn DocumentSource>>,
}

impl CombinedSource {
    /// Creates an empty combination.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a source; documents keep the order sources were added in.
    pub fn with(mut self, source: impl DocumentSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }
}

impl DocumentSource for CombinedSource {
    fn name(&self) -> &str {
        "combined"
    }

    fn documents(&self) -> Result<Vec<SourceDocument>> {
        let mut all = Vec::new();
        for source in &self.sources {
            let docs = source.documents()?;
            info!(source = source.name(), documents = docs.len(), "Source loaded");
            all.extend(docs);
        }
        Ok(dedup_by_title(all))
    }
}

/// Keeps the first document of each title.
///
/// Titles compare case-insensitively after trimming. Documents with an
/// empty or missing title are dropped.
pub fn dedup_by_title(docs: Vec<SourceDocument>) -> Vec<SourceDocument> {
    let mut seen = HashSet::new();
    docs.into_iter()
        .filter(|doc| {
            let key = doc.title().map(|t| t.trim().to_lowercase()).unwrap_or_default();
            !key.is_empty() && seen.insert(key)
        })
        .collect()
}

/// Writes `docs` as `{"papers": [...], "metadata": {...}}`.
///
/// The output is readable by [`JsonCorpusSource`]. Each paper is its
/// payload, with `"id"` added when the payload lacks one.
#[instrument(skip(docs), fields(path = %path.as_ref().display(), documents = docs.len()))]
pub fn save_corpus(docs: &[SourceDocument], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let papers: Vec<DocumentPayload> = docs
        .iter()
        .map(|doc| {
            let mut paper = doc.payload.clone();
            if paper.get("id").is_none() {
                paper.insert("id", FieldValue::Text(doc.id.to_string()));
            }
            paper
        })
        .collect();

    let mut sources: Vec<&str> = docs
        .iter()
        .map(|doc| doc.payload.text("source").unwrap_or("unknown"))
        .collect();
    sources.sort_unstable();
    sources.dedup();

    let corpus = json!({
        "papers": papers,
        "metadata": {
            "totalPapers": docs.len(),
            "sources": sources,
            "indexType": "HNSW",
        }
    });

    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), &corpus).map_err(std::io::Error::from)?;
    info!("Corpus saved");
    Ok(())
}
