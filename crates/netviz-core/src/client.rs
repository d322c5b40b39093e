//! Backend access and status polling with bounded exponential backoff.

use crate::config::ConfigError;
use crate::status::{
    ApiEnvelope, ExportDescriptor, ModelState, SessionData, SessionSummary, TrainRequest,
    TrainResponse, TrainingStatus,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{error::Error, fmt};
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub base_url: String,
    pub interval_ms: u64,
    /// Upper bound for the delay after consecutive failures.
    pub max_backoff_ms: u64,
    pub timeout_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            interval_ms: 1000,
            max_backoff_ms: 16_000,
            timeout_ms: 5000,
        }
    }
}

impl PollConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if self.interval_ms == 0 {
            return Err(ConfigError::ZeroInterval {
                field: "interval_ms",
            });
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroInterval {
                field: "timeout_ms",
            });
        }
        if self.max_backoff_ms < self.interval_ms {
            return Err(ConfigError::InvalidRange {
                field: "poll_backoff_ms",
                min: self.interval_ms as f64,
                max: self.max_backoff_ms as f64,
            });
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    Transport(String),
    Status { code: u16, path: String },
    Decode(String),
    /// The backend answered with `success: false`.
    Rejected(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(msg) => write!(f, "backend unreachable: {msg}"),
            ClientError::Status { code, path } => write!(f, "{path} returned HTTP {code}"),
            ClientError::Decode(msg) => write!(f, "malformed backend response: {msg}"),
            ClientError::Rejected(msg) => write!(f, "backend rejected request: {msg}"),
        }
    }
}

impl Error for ClientError {}

impl From<ureq::Error> for ClientError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => ClientError::Status {
                code,
                path: response.get_url().to_string(),
            },
            ureq::Error::Transport(t) => ClientError::Transport(t.to_string()),
        }
    }
}

/// The training backend's REST surface.
pub trait Backend {
    fn training_status(&self) -> Result<TrainingStatus, ClientError>;
    fn model_state(&self) -> Result<ModelState, ClientError>;
    fn start_training(&self, request: &TrainRequest) -> Result<TrainResponse, ClientError>;
    fn save_model(&self) -> Result<ExportDescriptor, ClientError>;
    fn sessions(&self) -> Result<Vec<SessionSummary>, ClientError>;
    fn replay_session(&self, session_id: &str) -> Result<SessionData, ClientError>;
}

/// Blocking HTTP backend.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &PollConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build();
        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        debug!(path, "GET");
        let response = self.agent.get(&self.url(path)).call()?;
        response
            .into_json()
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.get::<ApiEnvelope<T>>(path)?
            .into_result()
            .map_err(ClientError::Rejected)
    }
}

impl Backend for HttpBackend {
    fn training_status(&self) -> Result<TrainingStatus, ClientError> {
        self.get_data("/api/train/status")
    }

    fn model_state(&self) -> Result<ModelState, ClientError> {
        self.get_data("/api/model/state")
    }

    fn start_training(&self, request: &TrainRequest) -> Result<TrainResponse, ClientError> {
        debug!(path = "/api/train", "POST");
        let response: TrainResponse = self
            .agent
            .post(&self.url("/api/train"))
            .send_json(request)?
            .into_json()
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        if !response.success {
            return Err(ClientError::Rejected(response.message));
        }
        Ok(response)
    }

    fn save_model(&self) -> Result<ExportDescriptor, ClientError> {
        self.get_data("/api/save-model")
    }

    fn sessions(&self) -> Result<Vec<SessionSummary>, ClientError> {
        self.get_data("/api/sessions")
    }

    fn replay_session(&self, session_id: &str) -> Result<SessionData, ClientError> {
        self.get_data(&format!("/api/replay-session/{session_id}"))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PollOutcome {
    Updated(TrainingStatus),
    /// The previous status is kept; try again after `retry_in`.
    Failed {
        error: ClientError,
        retry_in: Duration,
    },
}

/// Tracks the latest status and the delay before the next poll.
#[derive(Clone, Debug)]
pub struct Poller {
    interval: Duration,
    max_backoff: Duration,
    consecutive_failures: u32,
    last: Option<TrainingStatus>,
}

impl Poller {
    pub fn new(config: &PollConfig) -> Self {
        Self {
            interval: config.interval(),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
            consecutive_failures: 0,
            last: None,
        }
    }

    pub fn poll<B: Backend + ?Sized>(&mut self, backend: &B) -> PollOutcome {
        match backend.training_status() {
            Ok(status) => {
                self.consecutive_failures = 0;
                self.last = Some(status.clone());
                PollOutcome::Updated(status)
            }
            Err(error) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                let retry_in = self.next_delay();
                warn!(
                    error = %error,
                    failures = self.consecutive_failures,
                    retry_ms = retry_in.as_millis() as u64,
                    "polling failed"
                );
                PollOutcome::Failed { error, retry_in }
            }
        }
    }

    /// `interval` while healthy, doubling per consecutive failure up to the cap.
    pub fn next_delay(&self) -> Duration {
        let shift = self.consecutive_failures.min(16);
        let delay = self.interval.saturating_mul(1u32 << shift);
        delay.min(self.max_backoff)
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Last good status, if any poll has succeeded yet.
    pub fn last(&self) -> Option<&TrainingStatus> {
        self.last.as_ref()
    }

    /// Last good status, or the idle default before the first success.
    pub fn status(&self) -> TrainingStatus {
        self.last.clone().unwrap_or_default()
    }
}
