//! Render-ready layout of an explained graph.
//!
//! The browser only draws what [`Scene::build`] computes: subjects in the
//! left column, objects in the right one, edges coloured by event kind and
//! nodes heated by their importance at one timestep.
//!
//! # Examples
//!
//! ```
//! use sentinel_story::{Edge, Explanation, Graph, NodeBuilder};
//! use sentinel_viz::{Scene, SceneConfig};
//!
//! let mut graph = Graph::new();
//! graph.add_node(NodeBuilder::subject("bash").build());
//! graph.add_node(NodeBuilder::object("/etc/shadow").build());
//! graph.add_edge(Edge::new("bash", "/etc/shadow", "EVENT_READ", "2024-01-01"));
//!
//! let explanation = Explanation {
//!     node_importance: vec![vec![], vec![0.1, 0.9]],
//!     ..Default::default()
//! };
//!
//! let scene = Scene::build(&graph, &explanation, &SceneConfig::default());
//! assert_eq!(scene.links[0].color, "#66ff66");
//! assert!(scene.nodes[0].x < scene.nodes[1].x);
//! ```

use sentinel_story::{Explanation, Graph, Node};
use serde::{Deserialize, Serialize};

/// Colour of subjects below the heat threshold.
pub const SUBJECT_COLOR: &str = "#4da6ff";

/// Colour of objects below the heat threshold.
pub const OBJECT_COLOR: &str = "#cccccc";

/// Colour of edges whose event matches no known kind.
pub const DEFAULT_EDGE_COLOR: &str = "#888";

/// Relative importance above which a node is drawn in red.
pub const HEAT_THRESHOLD: f64 = 0.6;

/// Floor of the normalising maximum, so all-zero scores stay cold.
const MIN_MAX_IMPORTANCE: f64 = 0.00001;

/// Event substrings and their edge colours, first match wins.
const EVENT_COLORS: &[(&str, &str)] = &[
    ("EXEC", "#ff4d4d"),
    ("WRITE", "#ffcc00"),
    ("READ", "#66ff66"),
    ("SEND", "#ff8800"),
];

/// Nine-step sequential red palette, light to dark.
const REDS: [[u8; 3]; 9] = [
    [0xff, 0xf5, 0xf0],
    [0xfe, 0xe0, 0xd2],
    [0xfc, 0xbb, 0xa1],
    [0xfc, 0x92, 0x72],
    [0xfb, 0x6a, 0x4a],
    [0xef, 0x3b, 0x2c],
    [0xcb, 0x18, 0x1d],
    [0xa5, 0x0f, 0x15],
    [0x67, 0x00, 0x0d],
];

/// Canvas geometry and the timestep used for heat colouring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Canvas width in pixels.
    pub width: f64,
    /// Canvas height in pixels.
    pub height: f64,
    /// Y of the first row.
    pub top: f64,
    /// Vertical distance between rows.
    pub row_spacing: f64,
    /// Timestep whose node importance colours the nodes.
    ///
    /// The graph document is the sequence's centre window, so this defaults to `1`.
    pub importance_timestep: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 640.0,
            top: 100.0,
            row_spacing: 50.0,
            importance_timestep: 1,
        }
    }
}

/// A positioned, coloured node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    /// Node id.
    pub id: String,
    /// Node type.
    pub node_type: String,
    /// Whether the node sits in the subject column.
    pub subject: bool,
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Importance at the configured timestep, `0` when absent.
    pub importance: f64,
    /// Importance relative to the most important node.
    pub heat: f64,
    /// Fill colour.
    pub color: String,
}

/// An edge between two positioned nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneLink {
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    /// Event label.
    pub event: String,
    /// Stroke colour.
    pub color: String,
}

/// Everything the web UI needs to draw one sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Canvas width.
    pub width: f64,
    /// Canvas height.
    pub height: f64,
    /// Nodes in graph order.
    pub nodes: Vec<SceneNode>,
    /// Edges whose endpoints both resolve.
    pub links: Vec<SceneLink>,
}

/// What the inspector panel shows for one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDetails {
    /// Node id.
    pub id: String,
    /// Node type.
    pub node_type: String,
    /// Degree.
    pub degree: u64,
    /// Importance at the configured timestep, `0` when absent.
    pub importance: f64,
    /// The node document as exported.
    pub raw: serde_json::Value,
}

impl Scene {
    /// Lays out and colours a graph.
    pub fn build(graph: &Graph, explanation: &Explanation, config: &SceneConfig) -> Self {
        let scores = explanation.importance_at(config.importance_timestep);
        let max_importance = scores
            .iter()
            .copied()
            .fold(MIN_MAX_IMPORTANCE, f64::max);
        let column_width = config.width / 3.0;

        let mut subject_row = 0usize;
        let mut object_row = 0usize;
        let nodes: Vec<SceneNode> = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let subject = node.is_subject();
                let (column, row) = if subject {
                    subject_row += 1;
                    (0.7, subject_row - 1)
                } else {
                    object_row += 1;
                    (1.7, object_row - 1)
                };

                let importance = scores.get(i).copied().unwrap_or(0.0);
                let heat = importance / max_importance;
                let color = if heat > HEAT_THRESHOLD {
                    heat_color(heat)
                } else if subject {
                    SUBJECT_COLOR.to_string()
                } else {
                    OBJECT_COLOR.to_string()
                };

                SceneNode {
                    id: node.id.clone(),
                    node_type: node.node_type.clone(),
                    subject,
                    x: column_width * column,
                    y: config.top + row as f64 * config.row_spacing,
                    importance,
                    heat,
                    color,
                }
            })
            .collect();

        let links = graph
            .edges
            .iter()
            .filter(|edge| {
                let resolved =
                    graph.get_node(&edge.source).is_some() && graph.get_node(&edge.target).is_some();
                if !resolved {
                    log::debug!("Dropping edge {} -> {}: unknown endpoint", edge.source, edge.target);
                }
                resolved
            })
            .map(|edge| SceneLink {
                source: edge.source.clone(),
                target: edge.target.clone(),
                event: edge.event.clone(),
                color: edge_color(&edge.event).to_string(),
            })
            .collect();

        Self {
            width: config.width,
            height: config.height,
            nodes,
            links,
        }
    }
}

impl NodeDetails {
    /// Collects the inspector data of the node with the given id.
    ///
    /// Returns `None` when the graph has no such node.
    pub fn lookup(
        graph: &Graph,
        explanation: &Explanation,
        config: &SceneConfig,
        node_id: &str,
    ) -> Option<Self> {
        let index = graph.index_of(node_id)?;
        let node: &Node = &graph.nodes[index];
        let importance = explanation
            .importance_at(config.importance_timestep)
            .get(index)
            .copied()
            .unwrap_or(0.0);

        Some(Self {
            id: node.id.clone(),
            node_type: node.node_type.clone(),
            degree: node.degree,
            importance,
            raw: serde_json::to_value(node).unwrap_or(serde_json::Value::Null),
        })
    }
}

/// Stroke colour for an event label.
///
/// # Examples
///
/// ```
/// use sentinel_viz::scene::edge_color;
///
/// assert_eq!(edge_color("EVENT_EXECUTE"), "#ff4d4d");
/// assert_eq!(edge_color("EVENT_SENDTO"), "#ff8800");
/// assert_eq!(edge_color("EVENT_FORK"), "#888");
/// ```
pub fn edge_color(event: &str) -> &'static str {
    EVENT_COLORS
        .iter()
        .find(|(needle, _)| event.contains(needle))
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_EDGE_COLOR)
}

/// Sequential red for `t` in `[0, 1]`, interpolated linearly between palette steps.
///
/// This approximates d3's `interpolateReds` spline; the web UI recolours hot
/// nodes with d3 itself and clients without d3 use this value.
pub fn heat_color(t: f64) -> String {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 1.0 };
    let scaled = t * (REDS.len() - 1) as f64;
    let lower = (scaled.floor() as usize).min(REDS.len() - 2);
    let frac = scaled - lower as f64;

    let channel = |c: usize| {
        let a = REDS[lower][c] as f64;
        let b = REDS[lower + 1][c] as f64;
        (a + (b - a) * frac).round() as u8
    };
    format!("#{:02x}{:02x}{:02x}", channel(0), channel(1), channel(2))
}
