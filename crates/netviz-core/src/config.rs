use crate::animation::AnimationConfig;
use crate::client::PollConfig;
use crate::draw::NeuronLabels;
use crate::layout::LayoutConfig;
use crate::snapshot::WeightOrientation;
use crate::style::Style;
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub width: f64,
    pub height: f64,
    pub layout: LayoutConfig,
    pub style: Style,
    pub animation: AnimationConfig,
    /// How `W1`/`W2` rows and columns map onto source and target neurons.
    pub orientation: WeightOrientation,
    pub labels: NeuronLabels,
    pub poll: PollConfig,
    pub show_weights_on_arrows: bool,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 400.0,
            layout: LayoutConfig::default(),
            style: Style::default(),
            animation: AnimationConfig::default(),
            orientation: WeightOrientation::default(),
            labels: NeuronLabels::default(),
            poll: PollConfig::default(),
            show_weights_on_arrows: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidCanvas { width: f64, height: f64 },
    CanvasTooLarge { max: f64, width: f64, height: f64 },
    InvalidPadding(f64),
    InvalidProbability { field: &'static str, value: f64 },
    InvalidRange { field: &'static str, min: f64, max: f64 },
    NonPositive { field: &'static str, value: f64 },
    Negative { field: &'static str, value: f64 },
    ZeroInterval { field: &'static str },
    EmptyBaseUrl,
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidCanvas { width, height } => {
                write!(f, "canvas size must be positive and finite, got {width}x{height}")
            }
            ConfigError::CanvasTooLarge { max, width, height } => {
                write!(f, "canvas {width}x{height} exceeds supported maximum ({max} per side)")
            }
            ConfigError::InvalidPadding(v) => {
                write!(f, "padding_fraction must be in [0, 0.5), got {v}")
            }
            ConfigError::InvalidProbability { field, value } => {
                write!(f, "{field} must be in [0, 1], got {value}")
            }
            ConfigError::InvalidRange { field, min, max } => {
                write!(f, "{field} range is invalid: min {min}, max {max}")
            }
            ConfigError::NonPositive { field, value } => {
                write!(f, "{field} must be positive, got {value}")
            }
            ConfigError::Negative { field, value } => {
                write!(f, "{field} must be non-negative, got {value}")
            }
            ConfigError::ZeroInterval { field } => write!(f, "{field} must be positive"),
            ConfigError::EmptyBaseUrl => write!(f, "poll.base_url must not be empty"),
            ConfigError::Parse(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl VizConfig {
    pub const MAX_CANVAS_SIDE: f64 = 16_384.0;
    pub const MAX_PADDING_FRACTION: f64 = 0.5;

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_canvas(self.width, self.height)?;
        self.validate_drawing()?;
        self.animation.validate()?;
        self.poll.validate()?;
        Ok(())
    }

    /// The subset a renderer depends on: layout padding and style.
    pub fn validate_drawing(&self) -> Result<(), ConfigError> {
        let p = self.layout.padding_fraction;
        if !(p.is_finite() && (0.0..Self::MAX_PADDING_FRACTION).contains(&p)) {
            return Err(ConfigError::InvalidPadding(p));
        }
        self.style.validate()
    }

    /// Parse and validate. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

pub fn validate_canvas(width: f64, height: f64) -> Result<(), ConfigError> {
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(ConfigError::InvalidCanvas { width, height });
    }
    if width > VizConfig::MAX_CANVAS_SIDE || height > VizConfig::MAX_CANVAS_SIDE {
        return Err(ConfigError::CanvasTooLarge {
            max: VizConfig::MAX_CANVAS_SIDE,
            width,
            height,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(VizConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = VizConfig::from_json_str(
            r#"{"width": 1024, "orientation": "target_major", "style": {"neuron_radius": 30}}"#,
        )
        .unwrap();
        assert_eq!(config.width, 1024.0);
        assert_eq!(config.height, 400.0);
        assert_eq!(config.orientation, WeightOrientation::TargetMajor);
        assert_eq!(config.style.neuron_radius, 30.0);
        assert_eq!(config.style.font_size, Style::default().font_size);
    }

    #[test]
    fn rejects_bad_canvas_and_padding() {
        let too_big = VizConfig {
            width: VizConfig::MAX_CANVAS_SIDE + 1.0,
            ..VizConfig::default()
        };
        assert!(matches!(
            too_big.validate(),
            Err(ConfigError::CanvasTooLarge { .. })
        ));
        let zero = VizConfig {
            height: 0.0,
            ..VizConfig::default()
        };
        assert!(matches!(zero.validate(), Err(ConfigError::InvalidCanvas { .. })));
        let padded = VizConfig {
            layout: LayoutConfig {
                padding_fraction: 0.5,
            },
            ..VizConfig::default()
        };
        assert_eq!(padded.validate(), Err(ConfigError::InvalidPadding(0.5)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            VizConfig::from_json_str("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
