//! Model explanations: the prediction, node importance and temporal attention.
//!
//! An [`Explanation`] is the document served by `/explain/{id}`. Node scores
//! come as one array per timestep, aligned by position with
//! [`Graph::nodes`](crate::Graph::nodes). [`Explanation::scored_nodes`] pairs
//! every score with the node it belongs to so callers never index the
//! arrays by hand.

use crate::graph::{Graph, Node};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The binary classification of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// The model flagged the sequence as an attack.
    Malicious,
    /// Anything else.
    Benign,
}

impl Verdict {
    /// Maps a raw prediction; only `1` is malicious.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_story::Verdict;
    ///
    /// assert_eq!(Verdict::from_prediction(1), Verdict::Malicious);
    /// assert_eq!(Verdict::from_prediction(0), Verdict::Benign);
    /// assert_eq!(Verdict::from_prediction(2), Verdict::Benign);
    /// ```
    pub fn from_prediction(prediction: i64) -> Self {
        if prediction == 1 {
            Verdict::Malicious
        } else {
            Verdict::Benign
        }
    }

    /// The label shown to analysts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Malicious => "MALICIOUS",
            Verdict::Benign => "BENIGN",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A model explanation for one sequence of graph windows.
///
/// Missing keys deserialize as zero / empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// The sequence this explanation belongs to, when the producer recorded it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_id: Option<u64>,

    /// Raw model output; `1` means malicious.
    #[serde(default)]
    pub prediction: i64,

    /// One weight per timestep. A nested `[[w1, w2, ...]]` is read as its first row.
    #[serde(default, deserialize_with = "deserialize_temporal")]
    pub temporal_attention: Vec<f64>,

    /// Per timestep, one score per node position.
    #[serde(default)]
    pub node_importance: Vec<Vec<f64>>,

    /// Per timestep, one score per edge position.
    #[serde(default)]
    pub edge_importance: Vec<Vec<f64>>,
}

/// A node-importance score paired with the node it is aligned to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredNode<'a> {
    /// Timestep the score was produced for.
    pub timestep: usize,
    /// Position of the score within its timestep.
    pub index: usize,
    /// The node at that position, `None` when the graph is shorter.
    pub node: Option<&'a Node>,
    /// The score.
    pub score: f64,
}

impl Explanation {
    /// The classification.
    pub fn verdict(&self) -> Verdict {
        Verdict::from_prediction(self.prediction)
    }

    /// Node scores for one timestep; empty when the timestep does not exist.
    pub fn importance_at(&self, timestep: usize) -> &[f64] {
        self.node_importance
            .get(timestep)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of node scores across all timesteps.
    pub fn score_count(&self) -> usize {
        self.node_importance.iter().map(Vec::len).sum()
    }

    /// Every score of every timestep, paired with its node.
    ///
    /// Order is timestep-major, then node position.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_story::{Explanation, Graph, NodeBuilder};
    ///
    /// let mut graph = Graph::new();
    /// graph.add_node(NodeBuilder::subject("A").build());
    ///
    /// let explanation = Explanation {
    ///     node_importance: vec![vec![0.4, 0.6]],
    ///     ..Default::default()
    /// };
    ///
    /// let scored = explanation.scored_nodes(&graph);
    /// assert_eq!(scored.len(), 2);
    /// assert_eq!(scored[0].node.unwrap().id, "A");
    /// assert!(scored[1].node.is_none());
    /// ```
    pub fn scored_nodes<'a>(&self, graph: &'a Graph) -> Vec<ScoredNode<'a>> {
        self.node_importance
            .iter()
            .enumerate()
            .flat_map(|(timestep, scores)| {
                scores.iter().enumerate().map(move |(index, &score)| ScoredNode {
                    timestep,
                    index,
                    node: graph.node_at(index),
                    score,
                })
            })
            .collect()
    }

    /// Scores of one timestep keyed by node id.
    ///
    /// Scores without a matching node are left out.
    pub fn importance_by_node(&self, graph: &Graph, timestep: usize) -> BTreeMap<String, f64> {
        self.importance_at(timestep)
            .iter()
            .zip(graph.nodes.iter())
            .map(|(&score, node)| (node.id.clone(), score))
            .collect()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TemporalShape {
    Flat(Vec<f64>),
    Nested(Vec<Vec<f64>>),
}

fn deserialize_temporal<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let shape = Option::<TemporalShape>::deserialize(deserializer)?;
    Ok(match shape {
        Some(TemporalShape::Flat(weights)) => weights,
        Some(TemporalShape::Nested(rows)) => rows.into_iter().next().unwrap_or_default(),
        None => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeBuilder;

    #[test]
    fn test_verdict_labels() {
        assert_eq!(Verdict::Malicious.to_string(), "MALICIOUS");
        assert_eq!(Verdict::Benign.to_string(), "BENIGN");
        assert_eq!(Verdict::from_prediction(-1), Verdict::Benign);
        assert_eq!(serde_json::to_value(Verdict::Malicious).unwrap(), "MALICIOUS");
    }

    #[test]
    fn test_deserialize_flat_temporal() {
        let explanation: Explanation = serde_json::from_value(serde_json::json!({
            "prediction": 1,
            "temporal_attention": [0.2, 0.5, 0.3],
            "node_importance": [[0.1, 0.9]]
        }))
        .unwrap();

        assert_eq!(explanation.verdict(), Verdict::Malicious);
        assert_eq!(explanation.temporal_attention, vec![0.2, 0.5, 0.3]);
        assert!(explanation.sequence_id.is_none());
        assert!(explanation.edge_importance.is_empty());
    }

    #[test]
    fn test_deserialize_nested_temporal() {
        let explanation: Explanation = serde_json::from_value(serde_json::json!({
            "sequence_id": 4,
            "prediction": 0,
            "temporal_attention": [[0.1, 0.3, 0.6]],
            "node_importance": [],
            "edge_importance": [[0.5]]
        }))
        .unwrap();

        assert_eq!(explanation.sequence_id, Some(4));
        assert_eq!(explanation.temporal_attention, vec![0.1, 0.3, 0.6]);
        assert_eq!(explanation.edge_importance, vec![vec![0.5]]);
    }

    #[test]
    fn test_deserialize_missing_and_null_fields() {
        let explanation: Explanation =
            serde_json::from_value(serde_json::json!({"temporal_attention": null})).unwrap();
        assert_eq!(explanation, Explanation::default());
    }

    #[test]
    fn test_importance_at_out_of_range() {
        let explanation = Explanation {
            node_importance: vec![vec![0.5]],
            ..Default::default()
        };
        assert_eq!(explanation.importance_at(0), &[0.5]);
        assert!(explanation.importance_at(7).is_empty());
    }

    #[test]
    fn test_scored_nodes_order_and_alignment() {
        let mut graph = Graph::new();
        graph.add_node(NodeBuilder::subject("A").build());
        graph.add_node(NodeBuilder::object("B").build());

        let explanation = Explanation {
            node_importance: vec![vec![0.1, 0.2], vec![0.3, 0.4, 0.5]],
            ..Default::default()
        };

        let scored = explanation.scored_nodes(&graph);
        assert_eq!(scored.len(), explanation.score_count());
        assert_eq!(scored[2].timestep, 1);
        assert_eq!(scored[2].index, 0);
        assert_eq!(scored[3].node.map(|n| n.id.as_str()), Some("B"));
        assert!(scored[4].node.is_none());
    }

    #[test]
    fn test_importance_by_node() {
        let mut graph = Graph::new();
        graph.add_node(NodeBuilder::subject("A").build());
        graph.add_node(NodeBuilder::object("B").build());

        let explanation = Explanation {
            node_importance: vec![vec![], vec![0.7, 0.2, 0.9]],
            ..Default::default()
        };

        let by_node = explanation.importance_by_node(&graph, 1);
        assert_eq!(by_node.len(), 2);
        assert_eq!(by_node["A"], 0.7);
        assert!(explanation.importance_by_node(&graph, 0).is_empty());
    }
}
