//! Host-facing entry point. Owns the surface and the current graph; every
//! `render` call rebuilds the graph from scratch.

use crate::architecture::{NetworkGraph, NeuronKey};
use crate::config::{self, ConfigError, VizConfig};
use crate::draw::{self, DrawOptions};
use crate::gate::{self, Diagnostic};
use crate::geometry::Point;
use crate::layout;
use crate::snapshot::Snapshot;
use crate::spatial::{self, NeuronLocation};
use crate::style::Style;
use crate::surface::{Surface, SvgSurface};
use rstar::RTree;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub epoch: Option<u32>,
    /// Falls back to the configured default when absent.
    #[serde(default)]
    pub show_weights_on_arrows: Option<bool>,
    #[serde(default)]
    pub input_values: Option<Vec<f64>>,
}

impl RenderRequest {
    pub fn new(snapshot: Snapshot, width: f64, height: f64) -> Self {
        Self {
            snapshot,
            width,
            height,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RenderOutcome {
    Drawn { neurons: usize, connections: usize },
    Diagnostic(Diagnostic),
}

impl RenderOutcome {
    pub fn is_drawn(&self) -> bool {
        matches!(self, RenderOutcome::Drawn { .. })
    }
}

enum Current {
    Empty,
    Network {
        graph: NetworkGraph,
        index: RTree<NeuronLocation>,
    },
    Invalid(Diagnostic),
}

pub struct NetworkDiagramRenderer<S: Surface> {
    surface: S,
    config: VizConfig,
    options: DrawOptions,
    current: Current,
}

impl<S: Surface> NetworkDiagramRenderer<S> {
    /// Does not validate `config`; a bad style surfaces as a diagnostic
    /// from `render`. Use [`Self::try_new`] to reject it up front.
    pub fn new(surface: S, config: VizConfig) -> Self {
        let options = DrawOptions {
            show_weights_on_arrows: config.show_weights_on_arrows,
            epoch: None,
            labels: config.labels.clone(),
        };
        Self {
            surface,
            config,
            options,
            current: Current::Empty,
        }
    }

    pub fn try_new(surface: S, config: VizConfig) -> Result<Self, ConfigError> {
        config.validate_drawing()?;
        Ok(Self::new(surface, config))
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn config(&self) -> &VizConfig {
        &self.config
    }

    pub fn style(&self) -> &Style {
        &self.config.style
    }

    pub fn options(&self) -> &DrawOptions {
        &self.options
    }

    pub fn graph(&self) -> Option<&NetworkGraph> {
        match &self.current {
            Current::Network { graph, .. } => Some(graph),
            _ => None,
        }
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match &self.current {
            Current::Invalid(d) => Some(d),
            _ => None,
        }
    }

    /// Validate, build, lay out and draw. An invalid snapshot replaces the
    /// diagram with a diagnostic; the previous graph is discarded either way.
    pub fn render(&mut self, request: &RenderRequest) -> RenderOutcome {
        self.options.epoch = request.epoch;
        self.options.show_weights_on_arrows = request
            .show_weights_on_arrows
            .unwrap_or(self.config.show_weights_on_arrows);

        if let Err(e) = config::validate_canvas(request.width, request.height)
            .and_then(|()| self.config.validate_drawing())
        {
            let diagnostic = Diagnostic {
                message: e.to_string(),
                dump: request.snapshot.dump(),
            };
            return self.fail(diagnostic);
        }
        self.surface.resize(request.width, request.height);

        let params = match gate::check(&request.snapshot, self.config.orientation) {
            Ok(params) => params,
            Err(diagnostic) => return self.fail(diagnostic),
        };
        let mut graph = NetworkGraph::from_validated(&params, request.input_values.as_deref());
        layout::apply(&mut graph, request.width, request.height, &self.config.layout);
        debug!(
            neurons = graph.neuron_count(),
            connections = graph.connections().len(),
            "rebuilt network graph"
        );

        let outcome = RenderOutcome::Drawn {
            neurons: graph.neuron_count(),
            connections: graph.connections().len(),
        };
        let index = spatial::build_index(&graph);
        self.current = Current::Network { graph, index };
        self.redraw();
        outcome
    }

    fn fail(&mut self, diagnostic: Diagnostic) -> RenderOutcome {
        self.current = Current::Invalid(diagnostic.clone());
        self.redraw();
        RenderOutcome::Diagnostic(diagnostic)
    }

    /// Recompute layout for the new size and redraw synchronously.
    /// Invalid sizes are ignored.
    pub fn resize(&mut self, width: f64, height: f64) {
        if config::validate_canvas(width, height).is_err() {
            debug!(width, height, "ignoring invalid resize");
            return;
        }
        self.surface.resize(width, height);
        if let Current::Network { graph, index } = &mut self.current {
            layout::apply(graph, width, height, &self.config.layout);
            *index = spatial::build_index(graph);
        }
        self.redraw();
    }

    /// Repaint the current state without touching layout.
    pub fn redraw(&mut self) {
        match &self.current {
            Current::Empty => self.surface.clear(self.config.style.background),
            Current::Network { graph, .. } => {
                draw::draw_network(&mut self.surface, graph, &self.config.style, &self.options);
            }
            Current::Invalid(d) => d.draw(&mut self.surface, &self.config.style),
        }
    }

    pub fn neuron_at(&self, at: Point) -> Option<NeuronKey> {
        match &self.current {
            Current::Network { index, .. } => {
                spatial::neuron_at(index, at, self.config.style.neuron_radius)
            }
            _ => None,
        }
    }

    /// Borrow everything an animation frame needs. `None` unless a valid
    /// network is on screen.
    pub fn frame_context(&mut self) -> Option<FrameContext<'_, S>> {
        match &self.current {
            Current::Network { graph, .. } => Some(FrameContext {
                graph,
                style: &self.config.style,
                options: &self.options,
                surface: &mut self.surface,
            }),
            _ => None,
        }
    }
}

pub struct FrameContext<'a, S> {
    pub graph: &'a NetworkGraph,
    pub style: &'a Style,
    pub options: &'a DrawOptions,
    pub surface: &'a mut S,
}

/// One-shot render to a standalone SVG document.
pub fn render_svg(request: &RenderRequest, config: &VizConfig) -> (RenderOutcome, String) {
    let surface = SvgSurface::new(request.width, request.height)
        .with_font_family(config.style.font_family.clone());
    let mut renderer = NetworkDiagramRenderer::new(surface, config.clone());
    let outcome = renderer.render(request);
    (outcome, renderer.surface().to_svg())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCommand, RecordingSurface};

    fn renderer() -> NetworkDiagramRenderer<RecordingSurface> {
        NetworkDiagramRenderer::new(RecordingSurface::new(800.0, 400.0), VizConfig::default())
    }

    fn request() -> RenderRequest {
        RenderRequest::new(crate::test_support::example_snapshot(), 800.0, 400.0)
    }

    #[test]
    fn valid_snapshot_is_drawn() {
        let mut r = renderer();
        let outcome = r.render(&RenderRequest {
            epoch: Some(7),
            ..request()
        });
        assert_eq!(
            outcome,
            RenderOutcome::Drawn {
                neurons: 5,
                connections: 6
            }
        );
        assert!(r.surface().texts().contains(&"Epoch 7"));
        assert!(r.graph().is_some());
    }

    #[test]
    fn invalid_snapshot_is_a_diagnostic_not_a_panic() {
        let mut r = renderer();
        r.render(&request());
        let mut bad = request();
        bad.snapshot.weights.remove("W2");
        let outcome = r.render(&bad);
        assert!(matches!(outcome, RenderOutcome::Diagnostic(_)));
        assert!(r.graph().is_none(), "previous graph discarded");
        assert_eq!(
            r.surface()
                .count(|c| matches!(c, DrawCommand::Polygon { .. })),
            0
        );
        assert!(r.surface().texts().contains(&"Invalid network snapshot"));
    }

    #[test]
    fn zero_sized_canvas_is_a_diagnostic() {
        let mut r = renderer();
        let outcome = r.render(&RenderRequest {
            width: 0.0,
            ..request()
        });
        assert!(matches!(outcome, RenderOutcome::Diagnostic(d) if d.message.contains("canvas")));
    }

    #[test]
    fn resize_relayouts_and_is_idempotent() {
        let mut r = renderer();
        r.render(&request());
        r.resize(400.0, 200.0);
        let once = r.graph().cloned();
        let cmds = r.surface().commands().to_vec();
        r.resize(400.0, 200.0);
        assert_eq!(r.graph().cloned(), once);
        assert_eq!(r.surface().commands(), cmds.as_slice());

        let output = r.graph().unwrap().position(NeuronKey::new(2, 0)).unwrap();
        assert!((output.x - 340.0).abs() < 1e-9);
        assert!((output.y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn hit_testing_follows_layout() {
        let mut r = renderer();
        assert_eq!(r.neuron_at(Point::new(400.0, 200.0)), None);
        r.render(&request());
        let hidden = r.graph().unwrap().position(NeuronKey::new(1, 0)).unwrap();
        assert_eq!(r.neuron_at(hidden), Some(NeuronKey::new(1, 0)));
    }

    #[test]
    fn request_overrides_weight_labels() {
        let mut r = renderer();
        r.render(&RenderRequest {
            show_weights_on_arrows: Some(true),
            ..request()
        });
        assert!(r.surface().texts().contains(&"-0.60"));
        r.render(&request());
        assert!(!r.surface().texts().contains(&"-0.60"));
    }

    #[test]
    fn request_parses_from_status_shaped_json() {
        let req: RenderRequest = serde_json::from_str(
            r#"{"current_weights": {"W1": [[1.0]], "W2": [[2.0]]}, "width": 300, "height": 200, "epoch": 3}"#,
        )
        .unwrap();
        assert_eq!(req.epoch, Some(3));
        assert_eq!(req.snapshot.weights.len(), 2);
    }

    #[test]
    fn degenerate_grid_cell_is_a_diagnostic() {
        let config: VizConfig = serde_json::from_str(r#"{"style": {"grid_cell": 0}}"#).unwrap();
        let (outcome, svg) = render_svg(&request(), &config);
        assert!(
            matches!(&outcome, RenderOutcome::Diagnostic(d) if d.message.contains("grid_cell")),
            "{outcome:?}"
        );
        assert!(svg.contains("Invalid network snapshot"));
    }

    #[test]
    fn try_new_rejects_invalid_style() {
        let mut config = VizConfig::default();
        config.style.grid_cell = -5.0;
        assert!(matches!(
            NetworkDiagramRenderer::try_new(RecordingSurface::new(800.0, 400.0), config),
            Err(ConfigError::NonPositive {
                field: "grid_cell",
                ..
            })
        ));
        assert!(
            NetworkDiagramRenderer::try_new(RecordingSurface::new(800.0, 400.0), VizConfig::default())
                .is_ok()
        );
    }
}
