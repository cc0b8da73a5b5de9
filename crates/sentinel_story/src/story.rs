//! The story transform: turns a graph and its explanation into a narrative.
//!
//! A [`Story`] bundles four things an analyst reads first:
//!
//! - the classification label (`MALICIOUS` / `BENIGN`),
//! - the temporal attention summary (`T1: 20.0% | T2: 50.0% | T3: 30.0%`),
//! - the most important nodes across all timesteps,
//! - the chronological list of edge events.
//!
//! The transform is pure. Stories are recomputed on every call and never stored.
//!
//! # Examples
//!
//! ```
//! use sentinel_story::{generate_story, Edge, Explanation, Graph, NodeBuilder};
//!
//! let mut graph = Graph::new();
//! graph.add_node(NodeBuilder::subject("A").node_type("process").build());
//! graph.add_node(NodeBuilder::object("B").node_type("file").build());
//! graph.add_edge(Edge::new("A", "B", "WRITE", "2024-01-01T00:00:00Z"));
//!
//! let explanation = Explanation {
//!     prediction: 1,
//!     temporal_attention: vec![0.2, 0.5, 0.3],
//!     node_importance: vec![vec![0.1, 0.9]],
//!     ..Default::default()
//! };
//!
//! let story = generate_story(&graph, &explanation).unwrap();
//! assert_eq!(story.prediction.as_str(), "MALICIOUS");
//! assert_eq!(story.temporal_summary, "T1: 20.0% | T2: 50.0% | T3: 30.0%");
//! assert_eq!(story.top_nodes[0].node.as_deref(), Some("B"));
//! assert!(story.timeline[0].ends_with("→ A WRITE B"));
//! ```

use crate::error::{Error, Result};
use crate::explanation::{Explanation, Verdict};
use crate::graph::Graph;
use crate::time::TimelineClock;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of nodes listed in [`Story::top_nodes`] by default.
pub const DEFAULT_TOP_K: usize = 5;

/// Number of temporal attention weights reported by default.
pub const DEFAULT_TEMPORAL_SLOTS: usize = 3;

/// What to do when the temporal attention vector is shorter than the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortTemporalPolicy {
    /// Fail with [`Error::ShortTemporalVector`].
    #[default]
    Fail,
    /// Report the missing slots as `0.0%`.
    PadZero,
}

/// Settings for the story transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryConfig {
    /// How many nodes to keep in the ranking.
    pub top_k: usize,
    /// How many temporal attention weights the summary reports.
    pub temporal_slots: usize,
    /// Handling of temporal vectors shorter than `temporal_slots`.
    pub short_temporal: ShortTemporalPolicy,
    /// Clock used to render timeline entries.
    pub clock: TimelineClock,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            temporal_slots: DEFAULT_TEMPORAL_SLOTS,
            short_temporal: ShortTemporalPolicy::Fail,
            clock: TimelineClock::Local,
        }
    }
}

impl StoryConfig {
    /// The default settings rendering times in UTC.
    pub fn utc() -> Self {
        Self {
            clock: TimelineClock::Utc,
            ..Self::default()
        }
    }
}

/// One ranked node-importance entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopNode {
    /// Node id; `None` when the score has no node at its position.
    pub node: Option<String>,
    /// Node type; `None` when the score has no node at its position.
    #[serde(rename = "type")]
    pub node_type: Option<String>,
    /// Importance score.
    pub score: f64,
}

/// The narrative derived from a graph and its explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    /// Classification label.
    pub prediction: Verdict,
    /// `T1: a% | T2: b% | T3: c%`.
    pub temporal_summary: String,
    /// Highest node-importance scores, best first.
    pub top_nodes: Vec<TopNode>,
    /// `<time> → <source> <event> <target>`, oldest first.
    pub timeline: Vec<String>,
    /// Edges left out of the timeline because their timestamp did not parse.
    #[serde(default)]
    pub skipped_events: usize,
}

/// Derives stories with a fixed [`StoryConfig`].
#[derive(Debug, Clone, Default)]
pub struct StoryGenerator {
    config: StoryConfig,
}

impl StoryGenerator {
    /// Creates a generator.
    pub fn new(config: StoryConfig) -> Self {
        Self { config }
    }

    /// The settings in use.
    pub fn config(&self) -> &StoryConfig {
        &self.config
    }

    /// Derives the story.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShortTemporalVector`] when the temporal attention
    /// vector is too short and the policy is [`ShortTemporalPolicy::Fail`].
    pub fn generate(&self, graph: &Graph, explanation: &Explanation) -> Result<Story> {
        let temporal_summary = self.temporal_summary(&explanation.temporal_attention)?;
        let top_nodes = self.top_nodes(graph, explanation);
        let (timeline, skipped_events) = self.timeline(graph);

        Ok(Story {
            prediction: explanation.verdict(),
            temporal_summary,
            top_nodes,
            timeline,
            skipped_events,
        })
    }

    /// Formats the first `temporal_slots` weights as `T1: x% | T2: y% | ...`.
    pub fn temporal_summary(&self, weights: &[f64]) -> Result<String> {
        let slots = self.config.temporal_slots;
        if weights.len() < slots && self.config.short_temporal == ShortTemporalPolicy::Fail {
            return Err(Error::ShortTemporalVector {
                expected: slots,
                actual: weights.len(),
            });
        }

        let parts: Vec<String> = (0..slots)
            .map(|i| {
                let weight = weights.get(i).copied().unwrap_or(0.0);
                format!("T{}: {}", i + 1, format_percent(weight))
            })
            .collect();
        Ok(parts.join(" | "))
    }

    /// Ranks every score of every timestep and keeps the best `top_k`.
    ///
    /// Ties keep their flattening order (timestep-major, then node position).
    pub fn top_nodes(&self, graph: &Graph, explanation: &Explanation) -> Vec<TopNode> {
        let mut scored = explanation.scored_nodes(graph);
        // sort_by is stable
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));

        scored
            .into_iter()
            .take(self.config.top_k)
            .map(|entry| TopNode {
                node: entry.node.map(|n| n.id.clone()),
                node_type: entry.node.map(|n| n.node_type.clone()),
                score: entry.score,
            })
            .collect()
    }

    /// Renders the edges oldest first, returning the entries and how many edges were skipped.
    pub fn timeline(&self, graph: &Graph) -> (Vec<String>, usize) {
        let mut events: Vec<(DateTime<Utc>, &str, &str, &str)> =
            Vec::with_capacity(graph.edges.len());
        let mut skipped = 0;

        for edge in &graph.edges {
            match edge.ts.resolve(self.config.clock) {
                Some(ts) => events.push((
                    ts,
                    edge.source.as_str(),
                    edge.target.as_str(),
                    edge.event.as_str(),
                )),
                None => {
                    log::warn!(
                        "Skipping {} -> {} ({}): unparseable timestamp {:?}",
                        edge.source,
                        edge.target,
                        edge.event,
                        edge.ts.to_string()
                    );
                    skipped += 1;
                }
            }
        }

        events.sort_by_key(|(ts, ..)| *ts);

        let timeline = events
            .into_iter()
            .map(|(ts, source, target, event)| {
                format!("{} → {} {} {}", self.config.clock.format(&ts), source, event, target)
            })
            .collect();
        (timeline, skipped)
    }
}

/// Renders a weight as a percentage with one fractional digit, e.g. `0.627` → `62.7%`.
///
/// Exact halves round away from zero (`0.0025` → `0.3%`), as `toFixed` does.
///
/// # Examples
///
/// ```
/// use sentinel_story::format_percent;
///
/// assert_eq!(format_percent(0.627), "62.7%");
/// assert_eq!(format_percent(0.2), "20.0%");
/// assert_eq!(format_percent(1.0), "100.0%");
/// ```
pub fn format_percent(weight: f64) -> String {
    let percent = weight * 100.0;
    format!("{:.1}%", (percent * 10.0).round() / 10.0)
}

/// Derives a story with the default settings.
///
/// # Errors
///
/// Fails when fewer than three temporal attention weights are present.
pub fn generate_story(graph: &Graph, explanation: &Explanation) -> Result<Story> {
    StoryGenerator::default().generate(graph, explanation)
}

/// Derives a story straight from the two backend JSON documents.
///
/// # Errors
///
/// Returns [`Error::MissingInput`] when either document is `null`, and
/// [`Error::Serialization`] when a document has the wrong shape.
pub fn story_from_json(
    graph: &serde_json::Value,
    explanation: &serde_json::Value,
    config: &StoryConfig,
) -> Result<Story> {
    if graph.is_null() {
        return Err(Error::MissingInput("graph"));
    }
    if explanation.is_null() {
        return Err(Error::MissingInput("explanation"));
    }

    let graph: Graph = serde_json::from_value(graph.clone())?;
    let explanation: Explanation = serde_json::from_value(explanation.clone())?;
    StoryGenerator::new(config.clone()).generate(&graph, &explanation)
}
