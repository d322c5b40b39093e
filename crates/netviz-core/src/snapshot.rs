use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{error::Error, fmt};

/// Nested row-major numeric array as delivered over the wire.
pub type Matrix = Vec<Vec<f64>>;

pub const INPUT_HIDDEN_WEIGHTS: &str = "W1";
pub const HIDDEN_OUTPUT_WEIGHTS: &str = "W2";
pub const HIDDEN_BIASES: &str = "b1";
pub const OUTPUT_BIASES: &str = "b2";

/// One immutable set of network parameters at a point in training.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, alias = "current_weights")]
    pub weights: BTreeMap<String, Matrix>,
    #[serde(default, alias = "current_biases")]
    pub biases: BTreeMap<String, Matrix>,
}

/// How weight matrices are indexed.
///
/// `SourceMajor` reads `W1` as `[input][hidden]`; `TargetMajor` reads it as
/// `[hidden][input]`, which is how the training backend stores parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightOrientation {
    #[default]
    SourceMajor,
    TargetMajor,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotError {
    MissingWeights {
        key: &'static str,
    },
    EmptyMatrix {
        key: &'static str,
    },
    RaggedMatrix {
        key: &'static str,
        row: usize,
        expected: usize,
        actual: usize,
    },
    ShapeMismatch {
        hidden_from_input: usize,
        hidden_from_output: usize,
    },
    NonFinite {
        key: &'static str,
        row: usize,
        col: usize,
    },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::MissingWeights { key } => {
                write!(f, "snapshot is missing required weight matrix {key}")
            }
            SnapshotError::EmptyMatrix { key } => write!(f, "weight matrix {key} is empty"),
            SnapshotError::RaggedMatrix {
                key,
                row,
                expected,
                actual,
            } => write!(
                f,
                "weight matrix {key} is ragged: row {row} has {actual} columns, expected {expected}"
            ),
            SnapshotError::ShapeMismatch {
                hidden_from_input,
                hidden_from_output,
            } => write!(
                f,
                "{INPUT_HIDDEN_WEIGHTS} feeds {hidden_from_input} hidden units but {HIDDEN_OUTPUT_WEIGHTS} reads {hidden_from_output}"
            ),
            SnapshotError::NonFinite { key, row, col } => {
                write!(f, "{key}[{row}][{col}] is not a finite number")
            }
        }
    }
}

impl Error for SnapshotError {}

/// Dense `rows × cols` matrix, indexed `[source][target]` after validation.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    fn from_nested(
        key: &'static str,
        nested: &Matrix,
        orientation: WeightOrientation,
    ) -> Result<Self, SnapshotError> {
        let rows = nested.len();
        let cols = nested.first().map(Vec::len).unwrap_or(0);
        if rows == 0 || cols == 0 {
            return Err(SnapshotError::EmptyMatrix { key });
        }
        let mut data = Vec::with_capacity(rows * cols);
        for (r, row) in nested.iter().enumerate() {
            if row.len() != cols {
                return Err(SnapshotError::RaggedMatrix {
                    key,
                    row: r,
                    expected: cols,
                    actual: row.len(),
                });
            }
            for (c, &v) in row.iter().enumerate() {
                if !v.is_finite() {
                    return Err(SnapshotError::NonFinite { key, row: r, col: c });
                }
                data.push(v);
            }
        }
        let matrix = Self { rows, cols, data };
        Ok(match orientation {
            WeightOrientation::SourceMajor => matrix,
            WeightOrientation::TargetMajor => matrix.transposed(),
        })
    }

    fn transposed(&self) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for c in 0..self.cols {
            for r in 0..self.rows {
                data.push(self.data[r * self.cols + c]);
            }
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }
}

/// A snapshot whose shapes have been checked once; downstream code indexes
/// it without further optionality.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedSnapshot {
    pub input_hidden: DenseMatrix,
    pub hidden_output: DenseMatrix,
    pub hidden_bias: Vec<Option<f64>>,
    pub output_bias: Vec<Option<f64>>,
}

impl ValidatedSnapshot {
    pub fn input_count(&self) -> usize {
        self.input_hidden.rows()
    }

    pub fn hidden_count(&self) -> usize {
        self.input_hidden.cols()
    }

    pub fn output_count(&self) -> usize {
        self.hidden_output.cols()
    }
}

impl Snapshot {
    pub fn new(weights: BTreeMap<String, Matrix>, biases: BTreeMap<String, Matrix>) -> Self {
        Self { weights, biases }
    }

    pub fn validate(
        &self,
        orientation: WeightOrientation,
    ) -> Result<ValidatedSnapshot, SnapshotError> {
        let w1 = self
            .weights
            .get(INPUT_HIDDEN_WEIGHTS)
            .ok_or(SnapshotError::MissingWeights {
                key: INPUT_HIDDEN_WEIGHTS,
            })?;
        let w2 = self
            .weights
            .get(HIDDEN_OUTPUT_WEIGHTS)
            .ok_or(SnapshotError::MissingWeights {
                key: HIDDEN_OUTPUT_WEIGHTS,
            })?;
        let input_hidden = DenseMatrix::from_nested(INPUT_HIDDEN_WEIGHTS, w1, orientation)?;
        let hidden_output = DenseMatrix::from_nested(HIDDEN_OUTPUT_WEIGHTS, w2, orientation)?;
        if input_hidden.cols() != hidden_output.rows() {
            return Err(SnapshotError::ShapeMismatch {
                hidden_from_input: input_hidden.cols(),
                hidden_from_output: hidden_output.rows(),
            });
        }
        let hidden_bias = self.bias_column(HIDDEN_BIASES, input_hidden.cols())?;
        let output_bias = self.bias_column(OUTPUT_BIASES, hidden_output.cols())?;
        Ok(ValidatedSnapshot {
            input_hidden,
            hidden_output,
            hidden_bias,
            output_bias,
        })
    }

    /// Missing or short bias vectors leave the affected units without a bias.
    fn bias_column(
        &self,
        key: &'static str,
        len: usize,
    ) -> Result<Vec<Option<f64>>, SnapshotError> {
        let mut column = vec![None; len];
        let Some(rows) = self.biases.get(key) else {
            return Ok(column);
        };
        for (row, (slot, values)) in column.iter_mut().zip(rows).enumerate() {
            if let Some(&v) = values.first() {
                if !v.is_finite() {
                    return Err(SnapshotError::NonFinite { key, row, col: 0 });
                }
                *slot = Some(v);
            }
        }
        Ok(column)
    }

    /// Pretty JSON for diagnostics.
    pub fn dump(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{self:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        crate::test_support::example_snapshot()
    }

    #[test]
    fn validates_consistent_shapes() {
        let v = sample().validate(WeightOrientation::SourceMajor).unwrap();
        assert_eq!(
            (v.input_count(), v.hidden_count(), v.output_count()),
            (2, 2, 1)
        );
        assert_eq!(v.input_hidden.get(0, 1), -0.2);
        assert_eq!(v.hidden_bias, vec![Some(0.05), Some(-0.1)]);
        assert_eq!(v.output_bias, vec![Some(0.01)]);
    }

    #[test]
    fn missing_weights_are_rejected() {
        let mut s = sample();
        s.weights.remove("W2");
        assert_eq!(
            s.validate(WeightOrientation::SourceMajor),
            Err(SnapshotError::MissingWeights { key: "W2" })
        );
        s.weights.remove("W1");
        assert_eq!(
            s.validate(WeightOrientation::SourceMajor),
            Err(SnapshotError::MissingWeights { key: "W1" })
        );
    }

    #[test]
    fn ragged_and_mismatched_shapes_are_rejected() {
        let mut s = sample();
        s.weights
            .insert("W1".to_string(), vec![vec![0.1, 0.2], vec![0.3]]);
        assert!(matches!(
            s.validate(WeightOrientation::SourceMajor),
            Err(SnapshotError::RaggedMatrix { row: 1, .. })
        ));

        let mut s = sample();
        s.weights
            .insert("W2".to_string(), vec![vec![0.5], vec![-0.6], vec![0.7]]);
        assert_eq!(
            s.validate(WeightOrientation::SourceMajor),
            Err(SnapshotError::ShapeMismatch {
                hidden_from_input: 2,
                hidden_from_output: 3
            })
        );
    }

    #[test]
    fn missing_biases_are_tolerated() {
        let mut s = sample();
        s.biases.clear();
        let v = s.validate(WeightOrientation::SourceMajor).unwrap();
        assert_eq!(v.hidden_bias, vec![None, None]);
        assert_eq!(v.output_bias, vec![None]);
    }

    #[test]
    fn target_major_matrices_are_transposed() {
        let mut weights = BTreeMap::new();
        // Backend layout: W1 is [hidden][input], W2 is [output][hidden].
        weights.insert("W1".to_string(), vec![vec![0.1, 0.3], vec![-0.2, 0.4]]);
        weights.insert("W2".to_string(), vec![vec![0.5, -0.6]]);
        let s = Snapshot::new(weights, BTreeMap::new());
        let v = s.validate(WeightOrientation::TargetMajor).unwrap();
        assert_eq!(v.input_hidden.row(0), &[0.1, -0.2]);
        assert_eq!(v.input_hidden.row(1), &[0.3, 0.4]);
        assert_eq!(v.hidden_output.rows(), 2);
        assert_eq!(v.hidden_output.get(1, 0), -0.6);
    }

    #[test]
    fn deserializes_status_style_keys() {
        let s: Snapshot = serde_json::from_str(
            r#"{"current_weights": {"W1": [[1.0]], "W2": [[2.0]]}, "current_biases": {}}"#,
        )
        .unwrap();
        assert_eq!(s.weights.len(), 2);
        assert!(s.validate(WeightOrientation::SourceMajor).is_ok());
    }

    #[test]
    fn empty_matrices_are_rejected() {
        let mut s = sample();
        s.weights.insert("W1".to_string(), vec![]);
        assert_eq!(
            s.validate(WeightOrientation::SourceMajor),
            Err(SnapshotError::EmptyMatrix { key: "W1" })
        );
        let mut s = sample();
        s.weights.insert("W2".to_string(), vec![vec![], vec![]]);
        assert_eq!(
            s.validate(WeightOrientation::SourceMajor),
            Err(SnapshotError::EmptyMatrix { key: "W2" })
        );
    }

    #[test]
    fn non_finite_weights_and_biases_are_rejected() {
        let mut s = sample();
        s.weights
            .insert("W2".to_string(), vec![vec![0.5], vec![f64::NAN]]);
        assert_eq!(
            s.validate(WeightOrientation::SourceMajor),
            Err(SnapshotError::NonFinite {
                key: "W2",
                row: 1,
                col: 0
            })
        );

        let mut s = sample();
        s.biases
            .insert("b1".to_string(), vec![vec![f64::INFINITY], vec![0.0]]);
        let err = s.validate(WeightOrientation::SourceMajor).unwrap_err();
        assert_eq!(
            err,
            SnapshotError::NonFinite {
                key: "b1",
                row: 0,
                col: 0
            }
        );
        assert!(err.to_string().contains("b1"));
    }
}
