use crate::status::{SessionData, TrainingStatus};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub epoch: u32,
    pub loss: f64,
    pub accuracy: f64,
}

/// Loss/accuracy curve accumulated from polled statuses.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    samples: Vec<TrainingSample>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded sessions store one entry per epoch, starting at epoch 1.
    pub fn from_session(session: &SessionData) -> Self {
        let samples = session
            .losses
            .iter()
            .zip(&session.accuracies)
            .enumerate()
            .map(|(i, (&loss, &accuracy))| TrainingSample {
                epoch: i as u32 + 1,
                loss,
                accuracy,
            })
            .collect();
        Self { samples }
    }

    /// Append a sample. Repeats of the latest epoch are ignored and an epoch
    /// lower than the latest starts a new run. Returns whether it was kept.
    pub fn record(&mut self, sample: TrainingSample) -> bool {
        if !(sample.loss.is_finite() && sample.accuracy.is_finite()) {
            return false;
        }
        if let Some(last) = self.samples.last() {
            if sample.epoch == last.epoch {
                return false;
            }
            if sample.epoch < last.epoch {
                self.samples.clear();
            }
        }
        self.samples.push(sample);
        true
    }

    /// Record a polled status; epoch 0 means nothing has been trained yet.
    pub fn record_status(&mut self, status: &TrainingStatus) -> bool {
        if status.epoch == 0 {
            return false;
        }
        self.record(TrainingSample {
            epoch: status.epoch,
            loss: status.loss,
            accuracy: status.accuracy,
        })
    }

    pub fn samples(&self) -> &[TrainingSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&TrainingSample> {
        self.samples.last()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(epoch: u32, loss: f64) -> TrainingSample {
        TrainingSample {
            epoch,
            loss,
            accuracy: 1.0 - loss,
        }
    }

    #[test]
    fn repeated_epochs_are_ignored() {
        let mut h = TrainingHistory::new();
        assert!(h.record(sample(1, 0.7)));
        assert!(!h.record(sample(1, 0.69)));
        assert!(h.record(sample(2, 0.6)));
        assert_eq!(h.len(), 2);
        assert_eq!(h.latest().unwrap().loss, 0.6);
    }

    #[test]
    fn going_backwards_starts_a_new_run() {
        let mut h = TrainingHistory::new();
        for e in 1..=5 {
            h.record(sample(e, 0.5));
        }
        assert!(h.record(sample(1, 0.9)));
        assert_eq!(h.samples(), &[sample(1, 0.9)]);
    }

    #[test]
    fn idle_status_is_not_recorded() {
        let mut h = TrainingHistory::new();
        assert!(!h.record_status(&TrainingStatus::default()));
        assert!(!h.record(TrainingSample {
            epoch: 3,
            loss: f64::NAN,
            accuracy: 0.5
        }));
        assert!(h.is_empty());
    }

    #[test]
    fn session_losses_become_samples() {
        let session = SessionData {
            losses: vec![0.7, 0.5, 0.4],
            accuracies: vec![0.5, 0.7],
            ..SessionData::default()
        };
        let h = TrainingHistory::from_session(&session);
        assert_eq!(h.len(), 2);
        assert_eq!(h.samples()[1].epoch, 2);
    }
}
