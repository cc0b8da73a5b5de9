//! # Sentinel Story
//!
//! Data model and narrative transform for explained security-event graphs.
//!
//! ## Overview
//!
//! A temporal graph model classifies a sequence of provenance-graph windows
//! and explains its decision with per-node importance scores and per-timestep
//! attention weights. This crate holds the documents involved and turns them
//! into something an analyst can read:
//!
//! - [`Graph`] - nodes (subjects and objects) and timestamped edge events
//! - [`Explanation`] - prediction, node importance, temporal attention
//! - [`Story`] - label, attention summary, top nodes, timeline
//! - [`IncidentReport`] - severity score and technique hints
//!
//! Everything here is synchronous and side-effect free.
//!
//! ## Quick Start
//!
//! ```
//! use sentinel_story::{story_from_json, StoryConfig};
//!
//! let graph = serde_json::json!({
//!     "nodes": [
//!         {"id": "A", "node_type": "process", "node_type_flag": 1, "degree": 1},
//!         {"id": "B", "node_type": "file", "node_type_flag": 0, "degree": 1}
//!     ],
//!     "edges": [
//!         {"source": "A", "target": "B", "event": "WRITE", "ts": "2024-01-01T00:00:00Z"}
//!     ]
//! });
//! let explanation = serde_json::json!({
//!     "prediction": 1,
//!     "temporal_attention": [0.2, 0.5, 0.3],
//!     "node_importance": [[0.1, 0.9]]
//! });
//!
//! let story = story_from_json(&graph, &explanation, &StoryConfig::utc()).unwrap();
//! assert_eq!(story.timeline, vec!["12:00:00 AM → A WRITE B"]);
//! ```

pub mod error;
pub mod explanation;
pub mod graph;
pub mod incident;
pub mod story;
pub mod time;

pub use error::{Error, Result};
pub use explanation::{Explanation, ScoredNode, Verdict};
pub use graph::{Edge, Graph, GraphStats, Node, NodeBuilder};
pub use incident::IncidentReport;
pub use story::{
    format_percent, generate_story, story_from_json, ShortTemporalPolicy, Story, StoryConfig,
    StoryGenerator, TopNode,
};
pub use time::{EventTime, TimelineClock};

/// Version information from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
