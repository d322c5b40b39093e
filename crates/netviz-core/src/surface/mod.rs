//! Drawing surfaces.
//!
//! The drawing engine only talks to [`Surface`]. [`SvgSurface`] produces a
//! standalone SVG document; [`RecordingSurface`] keeps the command list for
//! inspection.

mod recording;
mod svg;

pub use recording::{DrawCommand, RecordingSurface};
pub use svg::SvgSurface;

use crate::geometry::Point;
use crate::palette::Rgba;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Rgba,
}

/// Radial gradient spanning the filled disc. `focus` is the highlight centre
/// in fractions of the disc's bounding box (0.5, 0.5 is the centre).
#[derive(Clone, Debug, PartialEq)]
pub struct RadialGradient {
    pub focus: (f64, f64),
    pub stops: Vec<GradientStop>,
}

impl RadialGradient {
    pub fn centred(stops: Vec<GradientStop>) -> Self {
        Self {
            focus: (0.5, 0.5),
            stops,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    Radial(RadialGradient),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub color: Rgba,
    pub size: f64,
    pub anchor: TextAnchor,
    pub bold: bool,
}

impl TextStyle {
    pub fn centred(color: Rgba, size: f64) -> Self {
        Self {
            color,
            size,
            anchor: TextAnchor::Middle,
            bold: false,
        }
    }

    pub fn left(color: Rgba, size: f64) -> Self {
        Self {
            anchor: TextAnchor::Start,
            ..Self::centred(color, size)
        }
    }

    pub fn bold(self) -> Self {
        Self { bold: true, ..self }
    }
}

/// A 2D drawing target owned by one renderer at a time.
pub trait Surface {
    fn width(&self) -> f64;
    fn height(&self) -> f64;
    fn resize(&mut self, width: f64, height: f64);
    /// Discard everything drawn so far and fill with `color`.
    fn clear(&mut self, color: Rgba);
    fn line(&mut self, from: Point, to: Point, color: Rgba, width: f64);
    fn polyline(&mut self, points: &[Point], color: Rgba, width: f64);
    fn polygon(&mut self, points: &[Point], fill: Rgba);
    fn fill_circle(&mut self, center: Point, radius: f64, paint: &Paint);
    fn stroke_circle(&mut self, center: Point, radius: f64, color: Rgba, width: f64);
    fn fill_rect(&mut self, origin: Point, width: f64, height: f64, fill: Rgba, corner_radius: f64);
    /// `at` is the text baseline anchor, vertically centred on the glyphs.
    fn text(&mut self, at: Point, text: &str, style: &TextStyle);
}
