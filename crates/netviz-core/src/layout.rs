use crate::architecture::NetworkGraph;
use crate::geometry::Point;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Fraction of the width (and height) left empty on each side.
    pub padding_fraction: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            padding_fraction: 0.15,
        }
    }
}

/// Drawable region after padding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    pub horizontal_padding: f64,
    pub vertical_padding: f64,
    pub usable_width: f64,
    pub usable_height: f64,
}

impl Frame {
    pub fn new(width: f64, height: f64, config: &LayoutConfig) -> Self {
        let horizontal_padding = width * config.padding_fraction;
        let vertical_padding = height * config.padding_fraction;
        Self {
            horizontal_padding,
            vertical_padding,
            usable_width: (width - 2.0 * horizontal_padding).max(0.0),
            usable_height: (height - 2.0 * vertical_padding).max(0.0),
        }
    }

    /// Layers are evenly spaced; a lone layer sits in the middle.
    pub fn layer_x(&self, layer_index: usize, layer_count: usize) -> f64 {
        if layer_count <= 1 {
            return self.horizontal_padding + self.usable_width / 2.0;
        }
        self.horizontal_padding
            + self.usable_width * layer_index as f64 / (layer_count - 1) as f64
    }

    /// Vertically centred positions for `count` neurons.
    pub fn layer_ys(&self, count: usize) -> Vec<f64> {
        let spacing = self.usable_height / count.saturating_sub(1).max(1) as f64;
        let group_height = spacing * count.saturating_sub(1) as f64;
        let top = self.vertical_padding + (self.usable_height - group_height) / 2.0;
        (0..count).map(|i| top + spacing * i as f64).collect()
    }
}

/// Assign positions to every neuron for a `width × height` surface.
/// Recomputes everything; calling it twice with the same inputs is a no-op.
pub fn apply(graph: &mut NetworkGraph, width: f64, height: f64, config: &LayoutConfig) {
    let frame = Frame::new(width, height, config);
    let layers = graph.layers_mut();
    let layer_count = layers.len();
    for (layer_index, layer) in layers.iter_mut().enumerate() {
        let x = frame.layer_x(layer_index, layer_count);
        let ys = frame.layer_ys(layer.neurons.len());
        for (neuron, y) in layer.neurons.iter_mut().zip(ys) {
            neuron.position = Point::new(x, y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Snapshot, WeightOrientation};
    use std::collections::BTreeMap;

    fn laid_out(width: f64, height: f64) -> NetworkGraph {
        let mut g = NetworkGraph::build(
            &crate::test_support::example_snapshot(),
            WeightOrientation::SourceMajor,
            None,
        )
        .unwrap();
        apply(&mut g, width, height, &LayoutConfig::default());
        g
    }

    #[test]
    fn layout_is_idempotent() {
        let mut g = laid_out(800.0, 400.0);
        let first: Vec<Point> = g.neurons().map(|n| n.position).collect();
        apply(&mut g, 800.0, 400.0, &LayoutConfig::default());
        let second: Vec<Point> = g.neurons().map(|n| n.position).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn single_neuron_is_vertically_centred() {
        let g = laid_out(800.0, 400.0);
        let frame = Frame::new(800.0, 400.0, &LayoutConfig::default());
        let out = g.layers()[2].neurons[0].position;
        assert!((out.y - (frame.vertical_padding + frame.usable_height / 2.0)).abs() < 1e-9);
        assert!((out.y - 200.0).abs() < 1e-9);
    }

    #[test]
    fn layers_span_padded_width() {
        let g = laid_out(1000.0, 500.0);
        let xs: Vec<f64> = g.layers().iter().map(|l| l.neurons[0].position.x).collect();
        let hidden: Vec<f64> = g.layers()[1].neurons.iter().map(|n| n.position.y).collect();
        for (got, want) in xs.iter().zip([150.0, 500.0, 850.0]) {
            assert!((got - want).abs() < 1e-9, "x {got} != {want}");
        }
        for (got, want) in hidden.iter().zip([75.0, 425.0]) {
            assert!((got - want).abs() < 1e-9, "y {got} != {want}");
        }
    }

    #[test]
    fn larger_layers_are_evenly_spaced_within_usable_height() {
        let mut weights = BTreeMap::new();
        weights.insert("W1".to_string(), vec![vec![0.1; 4]; 2]);
        weights.insert("W2".to_string(), vec![vec![0.1]; 4]);
        let mut g = NetworkGraph::build(
            &Snapshot::new(weights, BTreeMap::new()),
            WeightOrientation::SourceMajor,
            None,
        )
        .unwrap();
        apply(&mut g, 100.0, 100.0, &LayoutConfig::default());
        let ys: Vec<f64> = g.layers()[1].neurons.iter().map(|n| n.position.y).collect();
        assert!((ys[0] - 15.0).abs() < 1e-9);
        assert!((ys[3] - 85.0).abs() < 1e-9);
        let gap = ys[1] - ys[0];
        assert!(ys.windows(2).all(|w| (w[1] - w[0] - gap).abs() < 1e-9));
    }

    #[test]
    fn resize_recomputes_positions() {
        let mut g = laid_out(800.0, 400.0);
        apply(&mut g, 400.0, 200.0, &LayoutConfig::default());
        assert_eq!(g, laid_out(400.0, 200.0));
    }
}
