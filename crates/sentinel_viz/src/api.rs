//! REST API endpoints for the visualization server.
//!
//! This module provides the HTTP API layer built on [axum](https://docs.rs/axum).
//!
//! # API Endpoints
//!
//! ## Backend documents
//!
//! - `GET /status` - Health check with the number of explained sequences
//! - `GET /graph/{id}` - Graph of the sequence's centre window
//! - `GET /explain/{id}` - Model explanation of the sequence
//! - `GET /story/{id}` - Incident report (severity, technique hints)
//!
//! ## Visualization
//!
//! - `GET /api/story/{id}?utc=true` - Narrative story
//! - `GET /api/scene/{id}` - Render-ready layout
//! - `GET /api/scene/{id}/node?id=N` - Inspector details of node `N`
//!
//! ## Static Assets
//!
//! - `GET /` - Main HTML interface

use crate::error::{Error, Result};
use crate::scene::{NodeDetails, Scene, SceneConfig};
use crate::store::ArtifactStore;

use axum::{
    extract::{Path, Query, State},
    response::{Html, Json},
    routing::get,
    Router,
};
use sentinel_story::{
    Explanation, Graph, IncidentReport, Story, StoryConfig, StoryGenerator, TimelineClock,
};
use serde::Deserialize;
use std::sync::Arc;

/// The shared state for the Axum web application.
///
/// Everything in it is read-only after startup, so handlers share it
/// without locking.
///
/// # Examples
///
/// ```
/// use sentinel_viz::{ApiState, ArtifactStore, SceneConfig};
///
/// let state = ApiState::new(ArtifactStore::new("graphs", "explanations"))
///     .with_scene_config(SceneConfig { width: 1200.0, ..SceneConfig::default() });
/// assert_eq!(state.scene_config().width, 1200.0);
/// ```
#[derive(Clone)]
pub struct ApiState {
    store: Arc<ArtifactStore>,
    story: Arc<StoryConfig>,
    scene: Arc<SceneConfig>,
}

impl ApiState {
    /// Creates state over an artifact store with default story and scene settings.
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            store: Arc::new(store),
            story: Arc::new(StoryConfig::default()),
            scene: Arc::new(SceneConfig::default()),
        }
    }

    /// Replaces the story settings.
    pub fn with_story_config(mut self, config: StoryConfig) -> Self {
        self.story = Arc::new(config);
        self
    }

    /// Replaces the scene settings.
    pub fn with_scene_config(mut self, config: SceneConfig) -> Self {
        self.scene = Arc::new(config);
        self
    }

    /// The artifact store.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// The story settings.
    pub fn story_config(&self) -> &StoryConfig {
        &self.story
    }

    /// The scene settings.
    pub fn scene_config(&self) -> &SceneConfig {
        &self.scene
    }

    async fn load(&self, seq_id: u64) -> Result<(Graph, Explanation)> {
        let graph = self.store.load_graph(seq_id).await?;
        let explanation = self.store.load_explanation(seq_id).await?;
        Ok((graph, explanation))
    }
}

impl Default for ApiState {
    fn default() -> Self {
        Self::new(ArtifactStore::default())
    }
}

/// Query parameters for `GET /api/story/{id}`.
#[derive(Debug, Deserialize)]
pub struct StoryQuery {
    /// Render timeline times in UTC instead of the server's local zone.
    #[serde(default)]
    pub utc: bool,
}

/// Query parameters for `GET /api/scene/{id}/node`.
///
/// Node ids are often file paths, so they travel in the query string.
#[derive(Debug, Deserialize)]
pub struct NodeQuery {
    /// The node id.
    pub id: String,
}

/// Constructs the main Axum [`Router`] for the visualization server.
///
/// # Examples
///
/// ```rust,ignore
/// use sentinel_viz::{api::create_router, ApiState};
///
/// let router = create_router(ApiState::default());
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
/// axum::serve(listener, router).await?;
/// ```
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        // Backend documents
        .route("/status", get(get_status))
        .route("/graph/{id}", get(get_graph))
        .route("/explain/{id}", get(get_explanation))
        .route("/story/{id}", get(get_report))
        // Visualization
        .route("/api/story/{id}", get(get_story))
        .route("/api/scene/{id}", get(get_scene))
        .route("/api/scene/{id}/node", get(get_node_details))
        // Web UI
        .route("/", get(serve_index))
        .with_state(state)
}

/// API handler for `GET /status`.
async fn get_status(State(state): State<ApiState>) -> Result<Json<serde_json::Value>> {
    let sequences = state.store.explanation_count().await?;
    Ok(Json(serde_json::json!({
        "status": "ok",
        "message": "Sentinel backend running",
        "sequences": sequences,
    })))
}

/// API handler for `GET /graph/{id}`.
async fn get_graph(State(state): State<ApiState>, Path(id): Path<u64>) -> Result<Json<Graph>> {
    Ok(Json(state.store.load_graph(id).await?))
}

/// API handler for `GET /explain/{id}`.
async fn get_explanation(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
) -> Result<Json<Explanation>> {
    Ok(Json(state.store.load_explanation(id).await?))
}

/// API handler for `GET /story/{id}`.
async fn get_report(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
) -> Result<Json<IncidentReport>> {
    let explanation = state.store.load_explanation(id).await?;
    Ok(Json(IncidentReport::from_explanation(&explanation, id)))
}

/// API handler for `GET /api/story/{id}`.
async fn get_story(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
    Query(query): Query<StoryQuery>,
) -> Result<Json<Story>> {
    let (graph, explanation) = state.load(id).await?;

    let mut config = state.story_config().clone();
    if query.utc {
        config.clock = TimelineClock::Utc;
    }

    let story = StoryGenerator::new(config).generate(&graph, &explanation)?;
    if story.skipped_events > 0 {
        log::warn!(
            "Sequence {}: {} events left out of the timeline",
            id,
            story.skipped_events
        );
    }
    Ok(Json(story))
}

/// API handler for `GET /api/scene/{id}`.
async fn get_scene(State(state): State<ApiState>, Path(id): Path<u64>) -> Result<Json<Scene>> {
    let (graph, explanation) = state.load(id).await?;
    Ok(Json(Scene::build(&graph, &explanation, state.scene_config())))
}

/// API handler for `GET /api/scene/{id}/node`.
async fn get_node_details(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
    Query(query): Query<NodeQuery>,
) -> Result<Json<NodeDetails>> {
    let (graph, explanation) = state.load(id).await?;
    NodeDetails::lookup(&graph, &explanation, state.scene_config(), &query.id)
        .map(Json)
        .ok_or_else(|| Error::NotFound(format!("node {} in sequence {}", query.id, id)))
}

/// Serves the main `index.html` page.
async fn serve_index() -> Html<&'static str> {
    Html(include_str!("../web/index.html"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    const GRAPH: &str = r#"{
        "nodes": [
            {"id": "bash", "node_type": "process", "node_type_flag": 1, "degree": 2},
            {"id": "/etc/passwd", "node_type": "file", "node_type_flag": 0, "degree": 1},
            {"id": "10.0.0.8:443", "node_type": "socket", "node_type_flag": 0, "degree": 1}
        ],
        "edges": [
            {"source": "bash", "target": "10.0.0.8:443", "event": "EVENT_SENDTO", "ts": "2018-04-06 11:20:05"},
            {"source": "bash", "target": "/etc/passwd", "event": "EVENT_READ", "ts": "2018-04-06 11:20:01"}
        ]
    }"#;

    const EXPLANATION: &str = r#"{
        "sequence_id": 0,
        "prediction": 1,
        "temporal_attention": [[0.2, 0.3, 0.5]],
        "node_importance": [[0.1, 0.2, 0.3], [0.05, 0.9, 0.4], [0.0, 0.1, 0.2]],
        "edge_importance": [[0.5, 0.5]]
    }"#;

    fn fixture() -> (TempDir, ApiState) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("window_0001.json"), GRAPH).unwrap();
        std::fs::write(dir.path().join("explanation_0.json"), EXPLANATION).unwrap();
        std::fs::write(dir.path().join("window_0002.json"), GRAPH).unwrap();
        std::fs::write(
            dir.path().join("explanation_1.json"),
            r#"{"prediction": 0, "temporal_attention": [0.5], "node_importance": []}"#,
        )
        .unwrap();
        let state = ApiState::new(ArtifactStore::new(dir.path(), dir.path()));
        (dir, state)
    }

    async fn get(state: ApiState, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = create_router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let (_dir, state) = fixture();
        let (status, json) = get(state, "/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["sequences"], 2);
    }

    #[tokio::test]
    async fn test_graph_endpoint() {
        let (_dir, state) = fixture();
        let (status, json) = get(state, "/graph/0").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(json["edges"][0]["event"], "EVENT_SENDTO");
    }

    #[tokio::test]
    async fn test_graph_not_found() {
        let (_dir, state) = fixture();
        let (status, json) = get(state, "/graph/7").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_graph_max_id_is_not_found() {
        let (_dir, state) = fixture();
        let (status, json) = get(state.clone(), "/graph/18446744073709551615").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "NOT_FOUND");

        let (status, _) = get(state, "/api/scene/18446744073709551615").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_graph_invalid_id() {
        let (_dir, state) = fixture();
        let (status, _) = get(state, "/graph/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_explain_endpoint_flattens_temporal() {
        let (_dir, state) = fixture();
        let (status, json) = get(state, "/explain/0").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["sequence_id"], 0);
        assert_eq!(json["prediction"], 1);
        assert_eq!(json["temporal_attention"], serde_json::json!([0.2, 0.3, 0.5]));
        assert_eq!(json["edge_importance"], serde_json::json!([[0.5, 0.5]]));
    }

    #[tokio::test]
    async fn test_report_endpoint() {
        let (_dir, state) = fixture();
        let (status, json) = get(state, "/story/0").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["sequence_id"], 0);
        assert_eq!(json["severity_score"], 0.5);
        assert_eq!(json["mitre_techniques"][0], "T1059 Command Execution");
        // every timestep has a score above the spike threshold
        assert_eq!(json["mitre_techniques"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_story_endpoint() {
        let (_dir, state) = fixture();
        let (status, json) = get(state, "/api/story/0?utc=true").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["prediction"], "MALICIOUS");
        assert_eq!(json["temporalSummary"], "T1: 20.0% | T2: 30.0% | T3: 50.0%");
        assert_eq!(json["topNodes"][0]["node"], "/etc/passwd");
        assert_eq!(json["topNodes"].as_array().unwrap().len(), 5);
        assert_eq!(json["timeline"][0], "11:20:01 AM → bash EVENT_READ /etc/passwd");
        assert_eq!(json["timeline"][1], "11:20:05 AM → bash EVENT_SENDTO 10.0.0.8:443");
    }

    #[tokio::test]
    async fn test_story_endpoint_short_temporal_vector() {
        let (_dir, state) = fixture();
        let (status, json) = get(state, "/api/story/1").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["code"], "STORY_ERROR");
    }

    #[tokio::test]
    async fn test_scene_endpoint() {
        let (_dir, state) = fixture();
        let (status, json) = get(state, "/api/scene/0").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(json["links"].as_array().unwrap().len(), 2);
        // timestep 1 scores: passwd is the hottest node
        assert_eq!(json["nodes"][1]["heat"], 1.0);
    }

    #[tokio::test]
    async fn test_node_details_endpoint() {
        let (_dir, state) = fixture();
        let (status, json) = get(state.clone(), "/api/scene/0/node?id=%2Fetc%2Fpasswd").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["node_type"], "file");
        assert_eq!(json["importance"], 0.9);

        let (status, _) = get(state, "/api/scene/0/node?id=ghost").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_index_served() {
        let (_dir, state) = fixture();
        let response = create_router(state)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let page = String::from_utf8(bytes.to_vec()).unwrap();
        // hot nodes use d3's own ramp, top-node scores show as percentages
        assert!(page.contains("d3.interpolateReds(d.heat)"));
        assert!(page.contains("(t.score * 100).toFixed(2)"));
    }
}
