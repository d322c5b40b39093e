use netviz_core::config::VizConfig;
use netviz_core::renderer::{self, RenderOutcome, RenderRequest};
use netviz_core::snapshot::{Snapshot, WeightOrientation};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

/// PyO3 module exposing netviz-core rendering to the Python training backend.
#[pyfunction]
fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

fn parse_config(config_json: Option<&str>) -> PyResult<VizConfig> {
    match config_json {
        Some(json) => VizConfig::from_json_str(json).map_err(|e| PyValueError::new_err(e.to_string())),
        None => Ok(VizConfig::default()),
    }
}

fn parse_snapshot(snapshot_json: &str) -> PyResult<Snapshot> {
    serde_json::from_str(snapshot_json)
        .map_err(|e| PyValueError::new_err(format!("snapshot is not valid JSON: {e}")))
}

fn parse_orientation(orientation: &str) -> PyResult<WeightOrientation> {
    match orientation {
        "source_major" => Ok(WeightOrientation::SourceMajor),
        "target_major" => Ok(WeightOrientation::TargetMajor),
        other => Err(PyValueError::new_err(format!(
            "orientation must be 'source_major' or 'target_major', got '{other}'"
        ))),
    }
}

/// Render `{"weights": ..., "biases": ...}` to an SVG string.
///
/// An invalid snapshot still yields an SVG (the diagnostic panel); set
/// `strict=True` to raise `ValueError` instead.
#[pyfunction]
#[pyo3(signature = (snapshot_json, width=800.0, height=400.0, epoch=None, show_weights=None, input_values=None, config_json=None, strict=false))]
#[allow(clippy::too_many_arguments)]
fn render_svg(
    snapshot_json: &str,
    width: f64,
    height: f64,
    epoch: Option<u32>,
    show_weights: Option<bool>,
    input_values: Option<Vec<f64>>,
    config_json: Option<&str>,
    strict: bool,
) -> PyResult<String> {
    let config = parse_config(config_json)?;
    let request = RenderRequest {
        epoch,
        show_weights_on_arrows: show_weights,
        input_values,
        ..RenderRequest::new(parse_snapshot(snapshot_json)?, width, height)
    };
    let (outcome, svg) = renderer::render_svg(&request, &config);
    match outcome {
        RenderOutcome::Diagnostic(d) if strict => Err(PyValueError::new_err(d.message)),
        _ => Ok(svg),
    }
}

/// `None` when the snapshot can be drawn, otherwise the reason it cannot.
#[pyfunction]
#[pyo3(signature = (snapshot_json, orientation="source_major"))]
fn validate_snapshot(snapshot_json: &str, orientation: &str) -> PyResult<Option<String>> {
    let snapshot = parse_snapshot(snapshot_json)?;
    let orientation = parse_orientation(orientation)?;
    Ok(snapshot.validate(orientation).err().map(|e| e.to_string()))
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(version, m)?)?;
    m.add_function(wrap_pyfunction!(render_svg, m)?)?;
    m.add_function(wrap_pyfunction!(validate_snapshot, m)?)?;
    Ok(())
}
