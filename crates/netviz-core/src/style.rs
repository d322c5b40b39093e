use crate::architecture::NeuronKind;
use crate::config::ConfigError;
use crate::palette::Rgba;
use serde::{Deserialize, Serialize};

/// Every colour, radius and line width the drawing engine uses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    pub background: Rgba,
    pub grid_color: Rgba,
    pub grid_cell: f64,
    pub grid_line_width: f64,

    pub neuron_radius: f64,
    /// Glow radius as a multiple of `neuron_radius`.
    pub glow_scale: f64,
    pub input_color: Rgba,
    pub hidden_color: Rgba,
    pub output_color: Rgba,
    pub border_color: Rgba,
    pub border_width: f64,

    pub positive_edge: Rgba,
    pub negative_edge: Rgba,
    /// Magnitudes above this are drawn as if they were exactly at the cap.
    pub weight_cap: f64,
    pub min_edge_opacity: f32,
    pub max_edge_opacity: f32,
    pub min_edge_width: f64,
    pub max_edge_width: f64,
    pub arrow_length: f64,
    pub arrow_half_width: f64,

    pub font_family: String,
    pub font_size: f64,
    pub text_color: Rgba,
    pub label_color: Rgba,
    pub plaque_color: Rgba,

    pub particle_color: Rgba,
    pub particle_radius: f64,

    pub error_color: Rgba,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            background: Rgba::rgb(15, 15, 26),
            grid_color: Rgba::rgba(255, 255, 255, 0.04),
            grid_cell: 40.0,
            grid_line_width: 1.0,

            neuron_radius: 24.0,
            glow_scale: 1.8,
            input_color: Rgba::rgb(76, 175, 80),
            hidden_color: Rgba::rgb(156, 39, 176),
            output_color: Rgba::rgb(255, 152, 0),
            border_color: Rgba::WHITE,
            border_width: 2.0,

            positive_edge: Rgba::rgb(0, 191, 255),
            negative_edge: Rgba::rgb(255, 87, 34),
            weight_cap: 2.0,
            min_edge_opacity: 0.15,
            max_edge_opacity: 0.95,
            min_edge_width: 0.5,
            max_edge_width: 6.0,
            arrow_length: 10.0,
            arrow_half_width: 5.0,

            font_family: "Inter, Helvetica, Arial, sans-serif".to_string(),
            font_size: 12.0,
            text_color: Rgba::WHITE,
            label_color: Rgba::rgb(200, 214, 229),
            plaque_color: Rgba::rgba(0, 0, 0, 0.6),

            particle_color: Rgba::rgb(255, 255, 255),
            particle_radius: 3.0,

            error_color: Rgba::rgb(244, 67, 54),
        }
    }
}

/// Colour family used for an edge; positive weights are cool, negative warm.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HueFamily {
    Cool,
    Warm,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStyle {
    pub hue: HueFamily,
    pub color: Rgba,
    pub width: f64,
}

impl Style {
    pub fn neuron_color(&self, kind: NeuronKind) -> Rgba {
        match kind {
            NeuronKind::Input => self.input_color,
            NeuronKind::Hidden => self.hidden_color,
            NeuronKind::Output => self.output_color,
        }
    }

    /// Sign picks the hue; `min(|w|, cap)` scales opacity and width linearly.
    pub fn edge_style(&self, weight: f64) -> EdgeStyle {
        let magnitude = if self.weight_cap > 0.0 {
            (weight.abs().min(self.weight_cap) / self.weight_cap).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let (hue, base) = if weight >= 0.0 {
            (HueFamily::Cool, self.positive_edge)
        } else {
            (HueFamily::Warm, self.negative_edge)
        };
        let opacity = self.min_edge_opacity
            + (self.max_edge_opacity - self.min_edge_opacity) * magnitude as f32;
        EdgeStyle {
            hue,
            color: base.with_alpha(opacity),
            width: self.min_edge_width + (self.max_edge_width - self.min_edge_width) * magnitude,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("neuron_radius", self.neuron_radius),
            ("grid_cell", self.grid_cell),
            ("weight_cap", self.weight_cap),
            ("font_size", self.font_size),
            ("glow_scale", self.glow_scale),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        let non_negative = [
            ("border_width", self.border_width),
            ("grid_line_width", self.grid_line_width),
            ("arrow_length", self.arrow_length),
            ("arrow_half_width", self.arrow_half_width),
            ("particle_radius", self.particle_radius),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Negative { field, value });
            }
        }
        if !(0.0..=1.0).contains(&self.min_edge_opacity)
            || !(0.0..=1.0).contains(&self.max_edge_opacity)
            || self.min_edge_opacity > self.max_edge_opacity
        {
            return Err(ConfigError::InvalidRange {
                field: "edge_opacity",
                min: self.min_edge_opacity as f64,
                max: self.max_edge_opacity as f64,
            });
        }
        if !(self.min_edge_width >= 0.0 && self.min_edge_width <= self.max_edge_width) {
            return Err(ConfigError::InvalidRange {
                field: "edge_width",
                min: self.min_edge_width,
                max: self.max_edge_width,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_picks_hue_family_and_magnitude_picks_strength() {
        let style = Style::default();
        let pos = style.edge_style(0.5);
        let neg = style.edge_style(-0.5);
        assert_eq!(pos.hue, HueFamily::Cool);
        assert_eq!(neg.hue, HueFamily::Warm);
        assert_eq!(pos.color.a, neg.color.a);
        assert_eq!(pos.width, neg.width);

        let hue = |c: Rgba| c.hue();
        assert!((180.0..=240.0).contains(&hue(pos.color)), "blue-cyan");
        assert!(hue(neg.color) <= 40.0, "red-orange");
    }

    #[test]
    fn strength_grows_with_magnitude_and_saturates_at_cap() {
        let style = Style::default();
        let faint = style.edge_style(0.01);
        let mid = style.edge_style(1.0);
        let capped = style.edge_style(style.weight_cap);
        let beyond = style.edge_style(style.weight_cap * 10.0);
        assert!(faint.width < mid.width && mid.width < capped.width);
        assert!(faint.color.a < mid.color.a && mid.color.a < capped.color.a);
        assert_eq!(capped, beyond);
        assert!((capped.width - style.max_edge_width).abs() < 1e-9);
    }

    #[test]
    fn zero_weight_is_cool_and_faintest() {
        let style = Style::default();
        let zero = style.edge_style(0.0);
        assert_eq!(zero.hue, HueFamily::Cool);
        assert!((zero.width - style.min_edge_width).abs() < 1e-9);
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(Style::default().validate().is_ok());
        let style = Style {
            neuron_radius: 0.0,
            ..Style::default()
        };
        assert!(matches!(
            style.validate(),
            Err(ConfigError::NonPositive { field: "neuron_radius", .. })
        ));
        let style = Style {
            min_edge_opacity: 0.9,
            max_edge_opacity: 0.1,
            ..Style::default()
        };
        assert!(style.validate().is_err());
    }
}
