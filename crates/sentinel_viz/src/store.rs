//! On-disk explanation artifacts.
//!
//! The explainer pipeline writes one graph document per window and one
//! explanation document per sequence:
//!
//! ```text
//! data/model_ready/graphs/window_0001.json   graph of sequence 0's centre window
//! explanations/explanation_0.json            explanation of sequence 0
//! ```
//!
//! Sequence `n` is centred on window `n + 1`, hence the offset in
//! [`ArtifactStore::graph_path`].

use crate::error::{Error, Result};
use sentinel_story::{Explanation, Graph};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Default directory holding `window_NNNN.json` graph documents.
pub const DEFAULT_GRAPH_DIR: &str = "data/model_ready/graphs";

/// Default directory holding `explanation_N.json` documents.
pub const DEFAULT_EXPLANATION_DIR: &str = "explanations";

/// Reads graph and explanation documents by sequence id.
///
/// # Examples
///
/// ```
/// use sentinel_viz::ArtifactStore;
/// use std::path::Path;
///
/// let store = ArtifactStore::new("graphs", "explanations");
/// assert_eq!(store.graph_path(0).unwrap(), Path::new("graphs/window_0001.json"));
/// assert_eq!(store.explanation_path(0), Path::new("explanations/explanation_0.json"));
/// ```
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    graph_dir: PathBuf,
    explanation_dir: PathBuf,
}

impl Default for ArtifactStore {
    fn default() -> Self {
        Self::new(DEFAULT_GRAPH_DIR, DEFAULT_EXPLANATION_DIR)
    }
}

impl ArtifactStore {
    /// Creates a store over the two directories.
    pub fn new(graph_dir: impl Into<PathBuf>, explanation_dir: impl Into<PathBuf>) -> Self {
        Self {
            graph_dir: graph_dir.into(),
            explanation_dir: explanation_dir.into(),
        }
    }

    /// Path of the graph document for a sequence.
    ///
    /// `None` for the last representable id, which has no centre window.
    pub fn graph_path(&self, seq_id: u64) -> Option<PathBuf> {
        let window = seq_id.checked_add(1)?;
        Some(self.graph_dir.join(format!("window_{:04}.json", window)))
    }

    /// Path of the explanation document for a sequence.
    pub fn explanation_path(&self, seq_id: u64) -> PathBuf {
        self.explanation_dir.join(format!("explanation_{}.json", seq_id))
    }

    /// Loads the graph of a sequence's centre window.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the file does not exist, [`Error::Serialization`]
    /// when it is not a graph document.
    pub async fn load_graph(&self, seq_id: u64) -> Result<Graph> {
        let path = self
            .graph_path(seq_id)
            .ok_or_else(|| Error::NotFound(format!("graph for sequence {}", seq_id)))?;
        read_json(&path, "graph", seq_id).await
    }

    /// Loads the explanation of a sequence.
    ///
    /// The stored `sequence_id` is filled in when the document lacks one.
    pub async fn load_explanation(&self, seq_id: u64) -> Result<Explanation> {
        let mut explanation: Explanation =
            read_json(&self.explanation_path(seq_id), "explanation", seq_id).await?;
        explanation.sequence_id.get_or_insert(seq_id);
        Ok(explanation)
    }

    /// Counts the explanation documents present.
    pub async fn explanation_count(&self) -> Result<usize> {
        let mut entries = match tokio::fs::read_dir(&self.explanation_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut count = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with("explanation_") && name.ends_with(".json") {
                count += 1;
            }
        }
        Ok(count)
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path, kind: &str, seq_id: u64) -> Result<T> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::NotFound(format!("{} for sequence {}", kind, seq_id)));
        }
        Err(e) => return Err(e.into()),
    };
    log::debug!("Loaded {} ({} bytes)", path.display(), raw.len());
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    fn store_in(dir: &TempDir) -> ArtifactStore {
        ArtifactStore::new(dir.path(), dir.path())
    }

    #[test]
    fn test_default_paths() {
        let store = ArtifactStore::default();
        assert_eq!(
            store.graph_path(41).unwrap(),
            Path::new("data/model_ready/graphs/window_0042.json")
        );
        assert!(store.graph_path(u64::MAX).is_none());
        assert_eq!(
            store.explanation_path(41),
            Path::new("explanations/explanation_41.json")
        );
    }

    #[tokio::test]
    async fn test_load_graph() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "window_0003.json",
            r#"{"nodes": [{"id": "A", "node_type": "subject", "node_type_flag": 1}], "links": []}"#,
        );

        let graph = store_in(&dir).load_graph(2).await.unwrap();
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].id, "A");
    }

    #[tokio::test]
    async fn test_load_explanation_fills_sequence_id() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "explanation_5.json",
            r#"{"prediction": 1, "temporal_attention": [[0.2, 0.3, 0.5]], "node_importance": [[0.1]]}"#,
        );

        let explanation = store_in(&dir).load_explanation(5).await.unwrap();
        assert_eq!(explanation.sequence_id, Some(5));
        assert_eq!(explanation.temporal_attention, vec![0.2, 0.3, 0.5]);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = store_in(&dir).load_graph(0).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(err.to_string(), "Not found: graph for sequence 0");
    }

    #[tokio::test]
    async fn test_last_sequence_id_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = store_in(&dir).load_graph(u64::MAX).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "explanation_0.json", "{ not json");
        let err = store_in(&dir).load_explanation(0).await.unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[tokio::test]
    async fn test_explanation_count() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "explanation_0.json", "{}");
        write(dir.path(), "explanation_1.json", "{}");
        write(dir.path(), "window_0001.json", "{}");

        assert_eq!(store_in(&dir).explanation_count().await.unwrap(), 2);

        let missing = ArtifactStore::new("nowhere", "nowhere/either");
        assert_eq!(missing.explanation_count().await.unwrap(), 0);
    }
}
