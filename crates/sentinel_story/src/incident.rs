//! Incident reports: a severity score and technique hints for one sequence.
//!
//! Unlike a [`Story`](crate::Story), a report needs only the explanation.
//! It is what the backend serves on `/story/{id}`.

use crate::explanation::{Explanation, Verdict};
use serde::{Deserialize, Serialize};

/// Technique reported when a timestep shows a strong importance spike.
pub const COMMAND_EXECUTION: &str = "T1059 Command Execution";

/// Importance above which a timestep counts as a spike.
pub const SPIKE_THRESHOLD: f64 = 0.05;

/// Severity multiplier applied to benign sequences.
const BENIGN_DAMPING: f64 = 0.3;

/// A short, scored summary of one explained sequence.
///
/// # Examples
///
/// ```
/// use sentinel_story::{Explanation, IncidentReport};
///
/// let explanation = Explanation {
///     prediction: 1,
///     temporal_attention: vec![0.1, 0.2, 0.7],
///     node_importance: vec![vec![0.01], vec![0.3]],
///     ..Default::default()
/// };
///
/// let report = IncidentReport::from_explanation(&explanation, 12);
/// assert_eq!(report.severity_score, 0.7);
/// assert_eq!(report.mitre_techniques, vec!["T1059 Command Execution"]);
/// assert!(report.story.starts_with("Sequence 12 is classified as MALICIOUS."));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentReport {
    /// The sequence the report describes.
    pub sequence_id: u64,
    /// Four-line plain-text summary.
    pub story: String,
    /// Last temporal weight, damped for benign sequences, rounded to 2 decimals.
    pub severity_score: f64,
    /// Technique hints, one per timestep with an importance spike.
    pub mitre_techniques: Vec<String>,
}

impl IncidentReport {
    /// Builds the report for `sequence_id`.
    pub fn from_explanation(explanation: &Explanation, sequence_id: u64) -> Self {
        let verdict = explanation.verdict();
        let severity_score = severity(explanation);
        let mitre_techniques = techniques(explanation);

        let peak = explanation
            .temporal_attention
            .iter()
            .copied()
            .fold(None, |acc: Option<f64>, w| Some(acc.map_or(w, |a| a.max(w))))
            .unwrap_or(0.0);

        let listed = if mitre_techniques.is_empty() {
            "None detected".to_string()
        } else {
            mitre_techniques.join(", ")
        };

        let story = format!(
            "Sequence {} is classified as {}.\n\
             Highest importance occurred at timestep with weight {:.3}.\n\
             Severity Score: {}.\n\
             Possible MITRE Techniques: {}.",
            sequence_id,
            verdict,
            peak,
            display_score(severity_score),
            listed
        );

        Self {
            sequence_id,
            story,
            severity_score,
            mitre_techniques,
        }
    }
}

fn severity(explanation: &Explanation) -> f64 {
    let factor = match explanation.verdict() {
        Verdict::Malicious => 1.0,
        Verdict::Benign => BENIGN_DAMPING,
    };
    let last = explanation.temporal_attention.last().copied().unwrap_or(0.0);
    (last * factor * 100.0).round() / 100.0
}

fn techniques(explanation: &Explanation) -> Vec<String> {
    explanation
        .node_importance
        .iter()
        .filter(|scores| scores.iter().any(|&s| s > SPIKE_THRESHOLD))
        .map(|_| COMMAND_EXECUTION.to_string())
        .collect()
}

/// Whole numbers keep one decimal (`1.0`), others print as-is (`0.27`).
fn display_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{:.1}", score)
    } else {
        format!("{}", score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn explanation(prediction: i64, temporal: Vec<f64>, importance: Vec<Vec<f64>>) -> Explanation {
        Explanation {
            prediction,
            temporal_attention: temporal,
            node_importance: importance,
            ..Default::default()
        }
    }

    #[test]
    fn test_malicious_report() {
        let report = IncidentReport::from_explanation(
            &explanation(1, vec![0.25, 0.5, 0.25], vec![vec![0.2, 0.01]]),
            3,
        );

        assert_eq!(report.sequence_id, 3);
        assert_eq!(report.severity_score, 0.25);
        assert_eq!(
            report.story,
            "Sequence 3 is classified as MALICIOUS.\n\
             Highest importance occurred at timestep with weight 0.500.\n\
             Severity Score: 0.25.\n\
             Possible MITRE Techniques: T1059 Command Execution."
        );
    }

    #[test]
    fn test_benign_report_is_damped() {
        let report = IncidentReport::from_explanation(
            &explanation(0, vec![0.1, 0.0, 0.9], vec![vec![0.01, 0.02]]),
            0,
        );

        assert_eq!(report.severity_score, 0.27);
        assert!(report.mitre_techniques.is_empty());
        assert!(report.story.contains("classified as BENIGN"));
        assert!(report.story.ends_with("Possible MITRE Techniques: None detected."));
    }

    #[test]
    fn test_one_technique_per_spiking_timestep() {
        let report = IncidentReport::from_explanation(
            &explanation(1, vec![1.0], vec![vec![0.9], vec![0.01], vec![0.8], vec![]]),
            1,
        );
        assert_eq!(
            report.mitre_techniques,
            vec![COMMAND_EXECUTION, COMMAND_EXECUTION]
        );
        assert!(report.story.contains("Severity Score: 1.0."));
        assert!(report
            .story
            .ends_with("T1059 Command Execution, T1059 Command Execution."));
    }

    #[test]
    fn test_empty_explanation() {
        let report = IncidentReport::from_explanation(&Explanation::default(), 9);
        assert_eq!(report.severity_score, 0.0);
        assert!(report.story.contains("weight 0.000"));
    }

    #[test]
    fn test_serialized_shape() {
        let report = IncidentReport::from_explanation(&explanation(1, vec![0.5], vec![]), 2);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["sequence_id"], 2);
        assert_eq!(json["severity_score"], 0.5);
        assert!(json["mitre_techniques"].as_array().unwrap().is_empty());
    }
}
