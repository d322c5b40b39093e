use super::{Paint, Surface, TextStyle};
use crate::geometry::Point;
use crate::palette::Rgba;

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear(Rgba),
    Line {
        from: Point,
        to: Point,
        color: Rgba,
        width: f64,
    },
    Polyline {
        points: Vec<Point>,
        color: Rgba,
        width: f64,
    },
    Polygon {
        points: Vec<Point>,
        fill: Rgba,
    },
    FillCircle {
        center: Point,
        radius: f64,
        paint: Paint,
    },
    StrokeCircle {
        center: Point,
        radius: f64,
        color: Rgba,
        width: f64,
    },
    FillRect {
        origin: Point,
        width: f64,
        height: f64,
        fill: Rgba,
    },
    Text {
        at: Point,
        text: String,
        style: TextStyle,
    },
}

/// Headless surface that records every call since the last `clear`.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    width: f64,
    height: f64,
    commands: Vec<DrawCommand>,
    clears: usize,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of times the surface has been cleared, i.e. full redraws.
    pub fn clear_count(&self) -> usize {
        self.clears
    }

    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn polygons(&self) -> Vec<&[Point]> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Polygon { points, .. } => Some(points.as_slice()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    fn clear(&mut self, color: Rgba) {
        self.commands.clear();
        self.clears += 1;
        self.commands.push(DrawCommand::Clear(color));
    }

    fn line(&mut self, from: Point, to: Point, color: Rgba, width: f64) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            color,
            width,
        });
    }

    fn polyline(&mut self, points: &[Point], color: Rgba, width: f64) {
        self.commands.push(DrawCommand::Polyline {
            points: points.to_vec(),
            color,
            width,
        });
    }

    fn polygon(&mut self, points: &[Point], fill: Rgba) {
        self.commands.push(DrawCommand::Polygon {
            points: points.to_vec(),
            fill,
        });
    }

    fn fill_circle(&mut self, center: Point, radius: f64, paint: &Paint) {
        self.commands.push(DrawCommand::FillCircle {
            center,
            radius,
            paint: paint.clone(),
        });
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, color: Rgba, width: f64) {
        self.commands.push(DrawCommand::StrokeCircle {
            center,
            radius,
            color,
            width,
        });
    }

    fn fill_rect(&mut self, origin: Point, width: f64, height: f64, fill: Rgba, _corner_radius: f64) {
        self.commands.push(DrawCommand::FillRect {
            origin,
            width,
            height,
            fill,
        });
    }

    fn text(&mut self, at: Point, text: &str, style: &TextStyle) {
        self.commands.push(DrawCommand::Text {
            at,
            text: text.to_string(),
            style: *style,
        });
    }
}
