use crate::geometry::Point;
use crate::nn;
use crate::snapshot::{Snapshot, SnapshotError, ValidatedSnapshot, WeightOrientation};
use serde::Serialize;

/// Input, hidden, output.
pub const LAYER_COUNT: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NeuronKey {
    pub layer: usize,
    pub index: usize,
}

impl NeuronKey {
    pub const fn new(layer: usize, index: usize) -> Self {
        Self { layer, index }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NeuronKind {
    Input,
    Hidden,
    Output,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Neuron {
    pub key: NeuronKey,
    pub kind: NeuronKind,
    /// Only populated for input and output neurons.
    pub activation: Option<f64>,
    /// Always `None` for input neurons.
    pub bias: Option<f64>,
    /// Assigned by the layout engine; origin until then.
    pub position: Point,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Layer {
    pub kind: NeuronKind,
    pub neurons: Vec<Neuron>,
}

impl Layer {
    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Connection {
    pub source: NeuronKey,
    pub target: NeuronKey,
    pub weight: f64,
}

/// Neuron/connection graph derived from one snapshot. Rebuilt, never patched.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NetworkGraph {
    layers: [Layer; LAYER_COUNT],
    connections: Vec<Connection>,
}

impl NetworkGraph {
    /// Validate `snapshot` and build its graph. Nothing is produced on error.
    pub fn build(
        snapshot: &Snapshot,
        orientation: WeightOrientation,
        input_values: Option<&[f64]>,
    ) -> Result<Self, SnapshotError> {
        let params = snapshot.validate(orientation)?;
        Ok(Self::from_validated(&params, input_values))
    }

    pub fn from_validated(params: &ValidatedSnapshot, input_values: Option<&[f64]>) -> Self {
        let n = params.input_count();
        let h = params.hidden_count();
        let o = params.output_count();

        let mut inputs = vec![0.0; n];
        if let Some(values) = input_values {
            for (slot, &v) in inputs.iter_mut().zip(values) {
                *slot = v;
            }
        }
        let outputs = input_values.map(|_| nn::forward(params, &inputs).output);

        let input_layer = Layer {
            kind: NeuronKind::Input,
            neurons: inputs
                .iter()
                .enumerate()
                .map(|(i, &a)| Neuron {
                    key: NeuronKey::new(0, i),
                    kind: NeuronKind::Input,
                    activation: Some(a),
                    bias: None,
                    position: Point::default(),
                })
                .collect(),
        };
        let hidden_layer = Layer {
            kind: NeuronKind::Hidden,
            neurons: (0..h)
                .map(|i| Neuron {
                    key: NeuronKey::new(1, i),
                    kind: NeuronKind::Hidden,
                    activation: None,
                    bias: params.hidden_bias[i],
                    position: Point::default(),
                })
                .collect(),
        };
        let output_layer = Layer {
            kind: NeuronKind::Output,
            neurons: (0..o)
                .map(|i| Neuron {
                    key: NeuronKey::new(2, i),
                    kind: NeuronKind::Output,
                    activation: outputs.as_ref().map(|out| out[i]),
                    bias: params.output_bias[i],
                    position: Point::default(),
                })
                .collect(),
        };

        let mut connections = Vec::with_capacity(n * h + h * o);
        for i in 0..n {
            for j in 0..h {
                connections.push(Connection {
                    source: NeuronKey::new(0, i),
                    target: NeuronKey::new(1, j),
                    weight: params.input_hidden.get(i, j),
                });
            }
        }
        for i in 0..h {
            for j in 0..o {
                connections.push(Connection {
                    source: NeuronKey::new(1, i),
                    target: NeuronKey::new(2, j),
                    weight: params.hidden_output.get(i, j),
                });
            }
        }

        Self {
            layers: [input_layer, hidden_layer, output_layer],
            connections,
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn neurons(&self) -> impl Iterator<Item = &Neuron> {
        self.layers.iter().flat_map(|l| l.neurons.iter())
    }

    pub fn neuron_count(&self) -> usize {
        self.layers.iter().map(Layer::len).sum()
    }

    pub fn neuron(&self, key: NeuronKey) -> Option<&Neuron> {
        self.layers.get(key.layer)?.neurons.get(key.index)
    }

    pub fn position(&self, key: NeuronKey) -> Option<Point> {
        self.neuron(key).map(|n| n.position)
    }
}
