use netviz_core::animation::{AnimationController, SimulatedScheduler};
use netviz_core::config::VizConfig;
use netviz_core::renderer::{self, NetworkDiagramRenderer, RenderOutcome, RenderRequest};
use netviz_core::status::{ApiEnvelope, TrainingStatus};
use netviz_core::surface::{DrawCommand, RecordingSurface};
use netviz_core::{NeuronKey, Snapshot, WeightOrientation};
use std::collections::BTreeMap;
use std::time::Duration;

fn placement_snapshot() -> Snapshot {
    let weights = BTreeMap::from([
        ("W1".to_string(), vec![vec![0.1, -0.2], vec![0.3, 0.4]]),
        ("W2".to_string(), vec![vec![0.5], vec![-0.6]]),
    ]);
    let biases = BTreeMap::from([
        ("b1".to_string(), vec![vec![0.05], vec![-0.1]]),
        ("b2".to_string(), vec![vec![0.01]]),
    ]);
    Snapshot::new(weights, biases)
}

#[test]
fn placement_network_renders_as_expected() {
    let mut r =
        NetworkDiagramRenderer::new(RecordingSurface::new(800.0, 400.0), VizConfig::default());
    let outcome = r.render(&RenderRequest::new(placement_snapshot(), 800.0, 400.0));
    assert_eq!(
        outcome,
        RenderOutcome::Drawn {
            neurons: 5,
            connections: 6
        }
    );

    let graph = r.graph().unwrap();
    let sizes: Vec<usize> = graph.layers().iter().map(|l| l.len()).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
    let weights: Vec<f64> = graph.connections().iter().map(|c| c.weight).collect();
    assert_eq!(weights, vec![0.1, -0.2, 0.3, 0.4, 0.5, -0.6]);

    let hidden = graph.neuron(NeuronKey::new(1, 1)).unwrap();
    assert_eq!(hidden.bias, Some(-0.1));
    assert!(graph.neuron(NeuronKey::new(0, 0)).unwrap().bias.is_none());

    let output = graph.position(NeuronKey::new(2, 0)).unwrap();
    assert!((output.y - 200.0).abs() < 1e-9, "single output is centred");
}

#[test]
fn polled_status_feeds_the_renderer() {
    let body = r#"{
        "success": true,
        "data": {
            "is_training": true, "epoch": 5, "total_epochs": 50,
            "loss": 0.61, "accuracy": 0.7, "progress_percentage": 10.0,
            "current_weights": {"W1": [[0.1, -0.2], [0.3, 0.4]], "W2": [[0.5], [-0.6]]},
            "current_biases": {"b1": [[0.05], [-0.1]], "b2": [[0.01]]},
            "decision_boundary": null
        }
    }"#;
    let envelope: ApiEnvelope<TrainingStatus> = serde_json::from_str(body).unwrap();
    let status = envelope.into_result().unwrap();
    let request = RenderRequest {
        epoch: Some(status.epoch),
        ..RenderRequest::new(status.snapshot(), 640.0, 320.0)
    };
    let (outcome, svg) = renderer::render_svg(&request, &VizConfig::default());
    assert!(outcome.is_drawn());
    assert!(svg.contains("Epoch 5"));
    assert_eq!(svg.matches("<polygon").count(), 6);
}

#[test]
fn backend_orientation_is_configurable() {
    let weights = BTreeMap::from([
        ("W1".to_string(), vec![vec![0.1, 0.3], vec![-0.2, 0.4]]),
        ("W2".to_string(), vec![vec![0.5, -0.6]]),
    ]);
    let snapshot = Snapshot::new(weights, BTreeMap::new());
    let config = VizConfig {
        orientation: WeightOrientation::TargetMajor,
        ..VizConfig::default()
    };
    let mut r = NetworkDiagramRenderer::new(RecordingSurface::new(800.0, 400.0), config);
    assert!(r.render(&RenderRequest::new(snapshot, 800.0, 400.0)).is_drawn());
    let weights: Vec<f64> = r
        .graph()
        .unwrap()
        .connections()
        .iter()
        .map(|c| c.weight)
        .collect();
    assert_eq!(weights, vec![0.1, -0.2, 0.3, 0.4, 0.5, -0.6]);
}

#[test]
fn animation_survives_resize_and_stops_cleanly() {
    let config = VizConfig::default();
    let mut r = NetworkDiagramRenderer::new(RecordingSurface::new(800.0, 400.0), config.clone());
    r.render(&RenderRequest::new(placement_snapshot(), 800.0, 400.0));

    let scheduler =
        SimulatedScheduler::new(Duration::from_millis(config.animation.frame_interval_ms));
    let mut controller = AnimationController::new(scheduler, config.animation.clone());
    controller.start();

    {
        let ctx = r.frame_context().unwrap();
        controller.advance(
            Duration::from_millis(300),
            ctx.graph,
            ctx.style,
            ctx.options,
            ctx.surface,
            |_| {},
        );
    }
    r.resize(400.0, 200.0);
    {
        let ctx = r.frame_context().unwrap();
        let frames = controller.advance(
            Duration::from_millis(100),
            ctx.graph,
            ctx.style,
            ctx.options,
            ctx.surface,
            |_| {},
        );
        assert!(frames > 0);
        for p in controller.particles() {
            assert!(p.position.x <= 400.0 && p.position.y <= 200.0);
        }
        controller.stop(ctx.graph, ctx.style, ctx.options, ctx.surface);
    }

    assert!(controller.particles().is_empty());
    assert_eq!(controller.scheduler().pending_frame(), None);
    let circles = r
        .surface()
        .count(|c| matches!(c, DrawCommand::FillCircle { .. }));
    assert_eq!(circles, 15, "static redraw carries no particles");
}
