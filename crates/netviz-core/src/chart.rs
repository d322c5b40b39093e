use crate::draw::format_value;
use crate::geometry::Point;
use crate::history::TrainingHistory;
use crate::palette::Rgba;
use crate::style::Style;
use crate::surface::{Surface, TextStyle};

pub const LOSS_COLOR: Rgba = Rgba::rgb(255, 87, 34);
pub const ACCURACY_COLOR: Rgba = Rgba::rgb(0, 191, 255);

/// Plot region inside the surface, leaving room for tick labels.
#[derive(Clone, Copy, Debug, PartialEq)]
struct PlotArea {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

impl PlotArea {
    fn new(width: f64, height: f64, font_size: f64) -> Self {
        let margin = font_size * 3.5;
        Self {
            left: margin,
            top: font_size * 2.5,
            right: (width - font_size * 1.5).max(margin + 1.0),
            bottom: (height - margin).max(font_size * 2.5 + 1.0),
        }
    }

    fn map(&self, x: f64, y: f64) -> Point {
        Point::new(
            self.left + (self.right - self.left) * x,
            self.bottom - (self.bottom - self.top) * y,
        )
    }
}

/// Loss (scaled to its own maximum) and accuracy (0..1) against epoch.
pub fn draw_training_chart<S: Surface + ?Sized>(
    surface: &mut S,
    history: &TrainingHistory,
    style: &Style,
) {
    surface.clear(style.background);
    let area = PlotArea::new(surface.width(), surface.height(), style.font_size);
    let small = TextStyle::centred(style.label_color, style.font_size * 0.9);

    surface.line(
        area.map(0.0, 0.0),
        area.map(1.0, 0.0),
        style.label_color,
        1.0,
    );
    surface.line(
        area.map(0.0, 0.0),
        area.map(0.0, 1.0),
        style.label_color,
        1.0,
    );

    let samples = history.samples();
    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        surface.text(
            area.map(0.5, 0.5),
            "Waiting for training data…",
            &TextStyle::centred(style.label_color, style.font_size),
        );
        return;
    };

    let span = f64::from(last.epoch.saturating_sub(first.epoch)).max(1.0);
    let max_loss = samples
        .iter()
        .map(|s| s.loss)
        .fold(0.0_f64, f64::max)
        .max(f64::EPSILON);
    let x_of = |epoch: u32| f64::from(epoch.saturating_sub(first.epoch)) / span;

    let loss: Vec<Point> = samples
        .iter()
        .map(|s| area.map(x_of(s.epoch), (s.loss / max_loss).clamp(0.0, 1.0)))
        .collect();
    let accuracy: Vec<Point> = samples
        .iter()
        .map(|s| area.map(x_of(s.epoch), s.accuracy.clamp(0.0, 1.0)))
        .collect();
    surface.polyline(&loss, LOSS_COLOR, 2.0);
    surface.polyline(&accuracy, ACCURACY_COLOR, 2.0);

    let below = style.font_size;
    let origin = area.map(0.0, 0.0);
    let end = area.map(1.0, 0.0);
    surface.text(
        Point::new(origin.x, origin.y + below),
        &first.epoch.to_string(),
        &small,
    );
    surface.text(Point::new(end.x, end.y + below), &last.epoch.to_string(), &small);
    surface.text(
        Point::new((origin.x + end.x) / 2.0, origin.y + below * 2.2),
        "Epoch",
        &small,
    );

    let legend = TextStyle::left(style.label_color, style.font_size);
    surface.text(
        Point::new(area.left, style.font_size),
        &format!("Loss {}", format_value(last.loss)),
        &TextStyle {
            color: LOSS_COLOR,
            ..legend
        },
    );
    surface.text(
        Point::new(area.left + style.font_size * 9.0, style.font_size),
        &format!("Accuracy {}", format_value(last.accuracy)),
        &TextStyle {
            color: ACCURACY_COLOR,
            ..legend
        },
    );
}
