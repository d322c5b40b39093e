//! Forward pass of the placement classifier: inputs → sigmoid hidden → sigmoid output.
//!
//! Used only to annotate the output neuron with the value the network would
//! produce for the displayed input activations. Units without a bias use 0.

use crate::snapshot::ValidatedSnapshot;

/// Logistic function, clipped so very large pre-activations do not overflow `exp`.
pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z.clamp(-500.0, 500.0)).exp())
}

#[derive(Clone, Debug, PartialEq)]
pub struct Activations {
    pub hidden: Vec<f64>,
    pub output: Vec<f64>,
}

/// Missing inputs read as 0; extra inputs are ignored.
pub fn forward(params: &ValidatedSnapshot, input: &[f64]) -> Activations {
    // Hidden layer
    let mut hidden: Vec<f64> = params
        .hidden_bias
        .iter()
        .map(|b| b.unwrap_or(0.0))
        .collect();
    for (i, &x) in input.iter().take(params.input_count()).enumerate() {
        for (j, h) in hidden.iter_mut().enumerate() {
            *h += x * params.input_hidden.get(i, j);
        }
    }
    for h in &mut hidden {
        *h = sigmoid(*h);
    }

    // Output layer
    let mut output: Vec<f64> = params
        .output_bias
        .iter()
        .map(|b| b.unwrap_or(0.0))
        .collect();
    for (i, &h) in hidden.iter().enumerate() {
        for (j, o) in output.iter_mut().enumerate() {
            *o += h * params.hidden_output.get(i, j);
        }
    }
    for o in &mut output {
        *o = sigmoid(*o);
    }

    Activations { hidden, output }
}
