//! The security-event graph: nodes, edges and their JSON shape.
//!
//! A [`Graph`] is the document served by the backend's `/graph/{id}` endpoint.
//! Node order matters: explanation scores are aligned to [`Graph::nodes`] by
//! position, not by identifier. Edges reference nodes by id and are resolved
//! by lookup.
//!
//! # Quick Start
//!
//! ```
//! use sentinel_story::{Edge, Graph, NodeBuilder};
//!
//! let mut graph = Graph::new();
//! graph.add_node(NodeBuilder::subject("bash").node_type("process").build());
//! graph.add_node(NodeBuilder::object("/etc/passwd").node_type("file").build());
//! graph.add_edge(Edge::new("bash", "/etc/passwd", "EVENT_READ", "2024-01-01T00:00:00Z"));
//!
//! assert_eq!(graph.stats().subject_count, 1);
//! assert_eq!(graph.edges_for_node("bash").len(), 1);
//! ```

use crate::time::EventTime;
use serde::{Deserialize, Serialize};

/// Value of `node_type_flag` marking a subject (an actor such as a process).
pub const SUBJECT_FLAG: i64 = 1;

/// Value of `node_type_flag` marking an object (a file, socket, ...).
pub const OBJECT_FLAG: i64 = 0;

/// A single entity in the event graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Identifier, unique within one graph.
    pub id: String,

    /// Category label, e.g. `subject`, `object`, `process`, `file`.
    #[serde(default)]
    pub node_type: String,

    /// `1` for subjects, `0` for objects.
    #[serde(default)]
    pub node_type_flag: i64,

    /// Number of incident edges as computed by the feature pipeline.
    #[serde(default)]
    pub degree: u64,

    /// Every other feature the exporter attached to the node.
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl Node {
    /// Returns `true` if the node is flagged as a subject.
    pub fn is_subject(&self) -> bool {
        self.node_type_flag == SUBJECT_FLAG
    }
}

/// A timestamped interaction between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Id of the acting node.
    pub source: String,

    /// Id of the node acted upon.
    pub target: String,

    /// Free-text event label, e.g. `EVENT_WRITE`.
    #[serde(default)]
    pub event: String,

    /// When the event happened.
    #[serde(default)]
    pub ts: EventTime,
}

impl Edge {
    /// Creates an edge.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        event: impl Into<String>,
        ts: impl Into<EventTime>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            event: event.into(),
            ts: ts.into(),
        }
    }
}

/// An ordered node sequence plus an edge collection.
///
/// Missing `nodes` or `edges` keys deserialize as empty. The networkx
/// node-link key `links` is accepted in place of `edges`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    /// Nodes, in the order the explanation scores refer to.
    #[serde(default)]
    pub nodes: Vec<Node>,

    /// Edges, in document order.
    #[serde(default, alias = "links")]
    pub edges: Vec<Edge>,
}

/// Counts describing a [`Graph`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    /// The total number of nodes.
    pub node_count: usize,
    /// The total number of edges.
    pub edge_count: usize,
    /// Nodes flagged as subjects.
    pub subject_count: usize,
    /// Nodes not flagged as subjects.
    pub object_count: usize,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node; its position becomes its score index.
    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Appends an edge.
    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// Gets a node by its id.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_story::{Graph, NodeBuilder};
    ///
    /// let mut graph = Graph::new();
    /// graph.add_node(NodeBuilder::subject("sshd").build());
    ///
    /// assert!(graph.get_node("sshd").is_some());
    /// assert!(graph.get_node("nginx").is_none());
    /// ```
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Gets a node by its position in the node sequence.
    pub fn node_at(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Returns the position of the node with the given id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    /// Returns all subjects, in node order.
    pub fn subjects(&self) -> Vec<&Node> {
        self.nodes.iter().filter(|n| n.is_subject()).collect()
    }

    /// Returns all objects, in node order.
    pub fn objects(&self) -> Vec<&Node> {
        self.nodes.iter().filter(|n| !n.is_subject()).collect()
    }

    /// Returns all edges where the node is the source or the target.
    pub fn edges_for_node(&self, node_id: &str) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|e| e.source == node_id || e.target == node_id)
            .collect()
    }

    /// Computes summary counts.
    pub fn stats(&self) -> GraphStats {
        let subject_count = self.nodes.iter().filter(|n| n.is_subject()).count();
        GraphStats {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            subject_count,
            object_count: self.nodes.len() - subject_count,
        }
    }
}

/// A builder for [`Node`]s.
///
/// # Examples
///
/// ```
/// use sentinel_story::NodeBuilder;
///
/// let node = NodeBuilder::subject("bash")
///     .node_type("process")
///     .degree(4)
///     .attribute("in_degree", serde_json::json!(1))
///     .build();
///
/// assert!(node.is_subject());
/// assert_eq!(node.degree, 4);
/// assert_eq!(node.attributes.len(), 1);
/// ```
pub struct NodeBuilder {
    node: Node,
}

impl NodeBuilder {
    /// Starts a node with the given id and flag and an empty type.
    pub fn new(id: impl Into<String>, node_type_flag: i64) -> Self {
        Self {
            node: Node {
                id: id.into(),
                node_type: String::new(),
                node_type_flag,
                degree: 0,
                attributes: serde_json::Map::new(),
            },
        }
    }

    /// Starts a subject node of type `subject`.
    pub fn subject(id: impl Into<String>) -> Self {
        Self::new(id, SUBJECT_FLAG).node_type("subject")
    }

    /// Starts an object node of type `object`.
    pub fn object(id: impl Into<String>) -> Self {
        Self::new(id, OBJECT_FLAG).node_type("object")
    }

    /// Sets the category label.
    pub fn node_type(mut self, node_type: impl Into<String>) -> Self {
        self.node.node_type = node_type.into();
        self
    }

    /// Sets the degree.
    pub fn degree(mut self, degree: u64) -> Self {
        self.node.degree = degree;
        self
    }

    /// Adds an extra attribute.
    pub fn attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.node.attributes.insert(key.into(), value);
        self
    }

    /// Builds the node.
    pub fn build(self) -> Node {
        self.node
    }
}
