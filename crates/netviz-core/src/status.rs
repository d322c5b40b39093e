//! Wire types for the training backend. Every response arrives wrapped in
//! `{ success, data?, message? }`.

use crate::snapshot::{Matrix, Snapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// `data` on success, otherwise the backend's message (or a generic one).
    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(self
                .message
                .unwrap_or_else(|| "response carried no data".to_string())),
            (false, _) => Err(self
                .message
                .unwrap_or_else(|| "request was not successful".to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionBoundary {
    pub epoch: u32,
    /// Base64 PNG.
    pub image: String,
}

/// The backend sends either a bare image string or `{epoch, image}`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
enum RawDecisionBoundary {
    Image(String),
    Tagged(DecisionBoundary),
}

impl RawDecisionBoundary {
    fn normalize(self, epoch: u32) -> DecisionBoundary {
        match self {
            RawDecisionBoundary::Image(image) => DecisionBoundary { epoch, image },
            RawDecisionBoundary::Tagged(b) => b,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTrainingStatus")]
pub struct TrainingStatus {
    pub is_training: bool,
    pub epoch: u32,
    pub total_epochs: u32,
    pub loss: f64,
    pub accuracy: f64,
    pub progress_percentage: f64,
    pub current_weights: BTreeMap<String, Matrix>,
    pub current_biases: BTreeMap<String, Matrix>,
    pub decision_boundary: Option<DecisionBoundary>,
}

#[derive(Deserialize)]
struct RawTrainingStatus {
    #[serde(default)]
    is_training: bool,
    #[serde(default)]
    epoch: u32,
    #[serde(default)]
    total_epochs: u32,
    #[serde(default)]
    loss: f64,
    #[serde(default)]
    accuracy: f64,
    #[serde(default)]
    progress_percentage: f64,
    #[serde(default, alias = "weights")]
    current_weights: Option<BTreeMap<String, Matrix>>,
    #[serde(default, alias = "biases")]
    current_biases: Option<BTreeMap<String, Matrix>>,
    #[serde(default)]
    decision_boundary: Option<RawDecisionBoundary>,
}

impl From<RawTrainingStatus> for TrainingStatus {
    fn from(raw: RawTrainingStatus) -> Self {
        Self {
            is_training: raw.is_training,
            epoch: raw.epoch,
            total_epochs: raw.total_epochs,
            loss: raw.loss,
            accuracy: raw.accuracy,
            progress_percentage: raw.progress_percentage,
            current_weights: raw.current_weights.unwrap_or_default(),
            current_biases: raw.current_biases.unwrap_or_default(),
            decision_boundary: raw.decision_boundary.map(|b| b.normalize(raw.epoch)),
        }
    }
}

impl TrainingStatus {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.current_weights.clone(), self.current_biases.clone())
    }

    /// True once the backend has produced any parameters.
    pub fn has_parameters(&self) -> bool {
        !self.current_weights.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawModelState")]
pub struct ModelState {
    pub weights: BTreeMap<String, Matrix>,
    pub biases: BTreeMap<String, Matrix>,
    pub decision_boundary: Option<DecisionBoundary>,
}

#[derive(Deserialize)]
struct RawModelState {
    #[serde(default, alias = "current_weights")]
    weights: Option<BTreeMap<String, Matrix>>,
    #[serde(default, alias = "current_biases")]
    biases: Option<BTreeMap<String, Matrix>>,
    #[serde(default)]
    decision_boundary: Option<RawDecisionBoundary>,
}

impl From<RawModelState> for ModelState {
    fn from(raw: RawModelState) -> Self {
        Self {
            weights: raw.weights.unwrap_or_default(),
            biases: raw.biases.unwrap_or_default(),
            // a bare image on the model state belongs to the initial model
            decision_boundary: raw.decision_boundary.map(|b| b.normalize(0)),
        }
    }
}

impl ModelState {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.weights.clone(), self.biases.clone())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainRequest {
    pub learning_rate: f64,
    pub epochs: u32,
}

/// `POST /api/train` replies unwrapped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportDescriptor {
    pub filename: String,
    pub download_url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    pub learning_rate: f64,
    pub epochs: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_units: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    #[serde(default)]
    pub hyperparameters: Hyperparameters,
    #[serde(default)]
    pub timestamp: String,
}

/// One recorded training run; `weights[i]`/`biases[i]` belong to epoch `i + 1`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub session_id: String,
    #[serde(default)]
    pub hyperparameters: Hyperparameters,
    #[serde(default)]
    pub weights: Vec<BTreeMap<String, Matrix>>,
    #[serde(default)]
    pub biases: Vec<BTreeMap<String, Matrix>>,
    #[serde(default)]
    pub losses: Vec<f64>,
    #[serde(default)]
    pub accuracies: Vec<f64>,
    #[serde(default)]
    pub decision_boundaries: Vec<DecisionBoundary>,
    #[serde(default)]
    pub timestamp: String,
}

impl SessionData {
    pub fn epoch_count(&self) -> usize {
        self.weights.len()
    }

    /// Snapshot for a zero-based recorded epoch. Missing biases read as empty.
    pub fn snapshot_at(&self, index: usize) -> Option<Snapshot> {
        let weights = self.weights.get(index)?.clone();
        let biases = self.biases.get(index).cloned().unwrap_or_default();
        Some(Snapshot::new(weights, biases))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_decision_boundary_takes_status_epoch() {
        let status: TrainingStatus = serde_json::from_str(
            r#"{"is_training": true, "epoch": 12, "total_epochs": 100, "loss": 0.4,
                "accuracy": 0.8, "progress_percentage": 12.0,
                "current_weights": {"W1": [[0.1]]}, "decision_boundary": "iVBOR"}"#,
        )
        .unwrap();
        assert_eq!(
            status.decision_boundary,
            Some(DecisionBoundary {
                epoch: 12,
                image: "iVBOR".to_string()
            })
        );
        assert!(status.current_biases.is_empty());
        assert!(status.has_parameters());
    }

    #[test]
    fn tagged_decision_boundary_and_nulls() {
        let status: TrainingStatus = serde_json::from_str(
            r#"{"epoch": 3, "current_weights": null, "current_biases": null,
                "decision_boundary": {"epoch": 2, "image": "abc"}}"#,
        )
        .unwrap();
        assert_eq!(status.decision_boundary.unwrap().epoch, 2);
        assert!(status.current_weights.is_empty());
        assert!(!status.is_training);
    }

    #[test]
    fn legacy_weight_keys_are_accepted() {
        let status: TrainingStatus =
            serde_json::from_str(r#"{"weights": {"W1": [[1.0]], "W2": [[2.0]]}}"#).unwrap();
        assert_eq!(status.snapshot().weights.len(), 2);
    }

    #[test]
    fn envelope_failure_carries_message() {
        let env: ApiEnvelope<TrainingStatus> =
            serde_json::from_str(r#"{"success": false, "message": "busy"}"#).unwrap();
        assert_eq!(env.into_result(), Err("busy".to_string()));
    }

    #[test]
    fn model_state_bare_boundary_is_epoch_zero() {
        let state: ModelState = serde_json::from_str(
            r#"{"weights": {"W1": [[1.0]]}, "biases": {}, "decision_boundary": "png"}"#,
        )
        .unwrap();
        assert_eq!(state.decision_boundary.unwrap().epoch, 0);
    }

    #[test]
    fn session_snapshots_by_epoch() {
        let session: SessionData = serde_json::from_str(
            r#"{"session_id": "s1", "hyperparameters": {"learning_rate": 0.1, "epochs": 2},
                "weights": [{"W1": [[1.0]], "W2": [[1.0]]}, {"W1": [[2.0]], "W2": [[2.0]]}],
                "biases": [{"b1": [[0.0]]}],
                "losses": [0.7, 0.6], "accuracies": [0.5, 0.6], "timestamp": "t"}"#,
        )
        .unwrap();
        assert_eq!(session.epoch_count(), 2);
        assert_eq!(session.snapshot_at(1).unwrap().weights["W1"], vec![vec![2.0]]);
        assert!(session.snapshot_at(1).unwrap().biases.is_empty());
        assert!(session.snapshot_at(2).is_none());
    }
}
