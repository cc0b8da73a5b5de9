//! HTTP client for a Sentinel backend.
//!
//! Fetches the graph and explanation documents of a sequence and runs the
//! story transform on them, so tools never have to talk to the endpoints
//! by hand.

use crate::error::{Error, Result};
use crate::scene::{Scene, SceneConfig};
use sentinel_story::{Explanation, Graph, IncidentReport, Story, StoryConfig, StoryGenerator};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Configuration for the backend client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend (e.g., "http://127.0.0.1:8000").
    pub base_url: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_ms: 5000,
        }
    }
}

impl ClientConfig {
    /// Default settings against another base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// Response of `GET /status`.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendStatus {
    /// `"ok"` when the backend is healthy.
    pub status: String,
    /// Free-text detail.
    #[serde(default)]
    pub message: String,
}

/// Everything the UI shows for one sequence.
#[derive(Debug, Clone)]
pub struct SequenceView {
    /// The graph of the sequence's centre window.
    pub graph: Graph,
    /// The model explanation.
    pub explanation: Explanation,
    /// The derived narrative.
    pub story: Story,
}

impl SequenceView {
    /// Lays the graph out for drawing.
    pub fn scene(&self, config: &SceneConfig) -> Scene {
        Scene::build(&self.graph, &self.explanation, config)
    }
}

/// Typed access to a backend serving `/graph/{id}` and `/explain/{id}`.
pub struct BackendClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl BackendClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Fails when the underlying HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self { config, http })
    }

    /// The settings in use.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        log::debug!("GET {}", url);

        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(url));
        }
        if !status.is_success() {
            return Err(Error::Backend {
                status: status.as_u16(),
                url,
            });
        }

        Ok(resp.json().await?)
    }

    /// Checks that the backend is up.
    pub async fn status(&self) -> Result<BackendStatus> {
        self.get_json("/status").await
    }

    /// Fetches the graph of a sequence.
    pub async fn fetch_graph(&self, seq_id: u64) -> Result<Graph> {
        self.get_json(&format!("/graph/{}", seq_id)).await
    }

    /// Fetches the explanation of a sequence.
    pub async fn fetch_explanation(&self, seq_id: u64) -> Result<Explanation> {
        self.get_json(&format!("/explain/{}", seq_id)).await
    }

    /// Fetches the backend's incident report of a sequence.
    pub async fn fetch_report(&self, seq_id: u64) -> Result<IncidentReport> {
        self.get_json(&format!("/story/{}", seq_id)).await
    }

    /// Fetches both documents of a sequence and derives its story.
    ///
    /// # Errors
    ///
    /// Propagates fetch failures and [`Error::Story`] when the transform
    /// rejects the explanation.
    pub async fn load_sequence(&self, seq_id: u64, config: &StoryConfig) -> Result<SequenceView> {
        let graph = self.fetch_graph(seq_id).await?;
        let explanation = self.fetch_explanation(seq_id).await?;

        log::info!(
            "Sequence {}: {} nodes, {} edges, {} timesteps",
            seq_id,
            graph.nodes.len(),
            graph.edges.len(),
            explanation.node_importance.len()
        );

        let story = StoryGenerator::new(config.clone()).generate(&graph, &explanation)?;
        Ok(SequenceView {
            graph,
            explanation,
            story,
        })
    }

    /// Fetches a sequence and returns only its story.
    pub async fn load_story(&self, seq_id: u64, config: &StoryConfig) -> Result<Story> {
        Ok(self.load_sequence(seq_id, config).await?.story)
    }
}
