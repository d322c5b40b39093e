use super::{Paint, RadialGradient, Surface, TextAnchor, TextStyle};
use crate::geometry::Point;
use crate::palette::Rgba;
use std::fmt::Write;

/// Accumulates drawing calls into an SVG document.
#[derive(Clone, Debug)]
pub struct SvgSurface {
    width: f64,
    height: f64,
    font_family: String,
    body: String,
    next_gradient: usize,
}

impl SvgSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            font_family: "sans-serif".to_string(),
            body: String::new(),
            next_gradient: 0,
        }
    }

    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    /// The complete document for everything drawn since the last `clear`.
    pub fn to_svg(&self) -> String {
        let mut out = String::with_capacity(self.body.len() + 256);
        let _ = write!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{font}">"#,
            w = fmt_num(self.width),
            h = fmt_num(self.height),
            font = escape(&self.font_family),
        );
        out.push('\n');
        out.push_str(&self.body);
        out.push_str("</svg>\n");
        out
    }

    fn define_gradient(&mut self, gradient: &RadialGradient) -> String {
        let id = format!("g{}", self.next_gradient);
        self.next_gradient += 1;
        let _ = write!(
            self.body,
            r#"<defs><radialGradient id="{id}" cx="0.5" cy="0.5" r="0.5" fx="{fx}" fy="{fy}">"#,
            fx = fmt_num(gradient.focus.0),
            fy = fmt_num(gradient.focus.1),
        );
        for stop in &gradient.stops {
            let _ = write!(
                self.body,
                r#"<stop offset="{}" stop-color="{}" stop-opacity="{}"/>"#,
                fmt_num(stop.offset),
                stop.color.hex(),
                fmt_alpha(stop.color.a),
            );
        }
        self.body.push_str("</radialGradient></defs>\n");
        id
    }
}

fn fmt_num(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn fmt_alpha(a: f32) -> String {
    fmt_num(a.clamp(0.0, 1.0) as f64)
}

fn fmt_points(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", fmt_num(p.x), fmt_num(p.y)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

impl Surface for SvgSurface {
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
        self.body.clear();
        self.next_gradient = 0;
        let _ = writeln!(
            self.body,
            r#"<rect x="0" y="0" width="{}" height="{}" fill="{}" fill-opacity="{}"/>"#,
            fmt_num(self.width),
            fmt_num(self.height),
            color.hex(),
            fmt_alpha(color.a),
        );
    }

    fn line(&mut self, from: Point, to: Point, color: Rgba, width: f64) {
        let _ = writeln!(
            self.body,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-opacity="{}" stroke-width="{}" stroke-linecap="round"/>"#,
            fmt_num(from.x),
            fmt_num(from.y),
            fmt_num(to.x),
            fmt_num(to.y),
            color.hex(),
            fmt_alpha(color.a),
            fmt_num(width),
        );
    }

    fn polyline(&mut self, points: &[Point], color: Rgba, width: f64) {
        if points.len() < 2 {
            return;
        }
        let _ = writeln!(
            self.body,
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-opacity="{}" stroke-width="{}" stroke-linejoin="round"/>"#,
            fmt_points(points),
            color.hex(),
            fmt_alpha(color.a),
            fmt_num(width),
        );
    }

    fn polygon(&mut self, points: &[Point], fill: Rgba) {
        if points.len() < 3 {
            return;
        }
        let _ = writeln!(
            self.body,
            r#"<polygon points="{}" fill="{}" fill-opacity="{}"/>"#,
            fmt_points(points),
            fill.hex(),
            fmt_alpha(fill.a),
        );
    }

    fn fill_circle(&mut self, center: Point, radius: f64, paint: &Paint) {
        let fill = match paint {
            Paint::Solid(color) => format!(
                r#"fill="{}" fill-opacity="{}""#,
                color.hex(),
                fmt_alpha(color.a)
            ),
            Paint::Radial(gradient) => {
                let id = self.define_gradient(gradient);
                format!(r#"fill="url(#{id})""#)
            }
        };
        let _ = writeln!(
            self.body,
            r#"<circle cx="{}" cy="{}" r="{}" {fill}/>"#,
            fmt_num(center.x),
            fmt_num(center.y),
            fmt_num(radius),
        );
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, color: Rgba, width: f64) {
        let _ = writeln!(
            self.body,
            r#"<circle cx="{}" cy="{}" r="{}" fill="none" stroke="{}" stroke-opacity="{}" stroke-width="{}"/>"#,
            fmt_num(center.x),
            fmt_num(center.y),
            fmt_num(radius),
            color.hex(),
            fmt_alpha(color.a),
            fmt_num(width),
        );
    }

    fn fill_rect(&mut self, origin: Point, width: f64, height: f64, fill: Rgba, corner_radius: f64) {
        let _ = writeln!(
            self.body,
            r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" fill="{}" fill-opacity="{}"/>"#,
            fmt_num(origin.x),
            fmt_num(origin.y),
            fmt_num(width),
            fmt_num(height),
            fmt_num(corner_radius),
            fill.hex(),
            fmt_alpha(fill.a),
        );
    }

    fn text(&mut self, at: Point, text: &str, style: &TextStyle) {
        let anchor = match style.anchor {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        };
        let weight = if style.bold { "bold" } else { "normal" };
        let _ = writeln!(
            self.body,
            r#"<text x="{}" y="{}" font-size="{}" font-weight="{weight}" text-anchor="{anchor}" dominant-baseline="central" fill="{}" fill-opacity="{}">{}</text>"#,
            fmt_num(at.x),
            fmt_num(at.y),
            fmt_num(style.size),
            style.color.hex(),
            fmt_alpha(style.color.a),
            escape(text),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::GradientStop;

    #[test]
    fn document_has_dimensions_and_background() {
        let mut s = SvgSurface::new(800.0, 400.0);
        s.clear(Rgba::rgb(15, 15, 26));
        let svg = s.to_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"width="800" height="400""#));
        assert!(svg.contains(r##"fill="#0f0f1a""##));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn clear_discards_previous_content() {
        let mut s = SvgSurface::new(10.0, 10.0);
        s.line(Point::new(0.0, 0.0), Point::new(5.0, 5.0), Rgba::WHITE, 1.0);
        s.clear(Rgba::BLACK);
        assert!(!s.to_svg().contains("<line"));
    }

    #[test]
    fn text_is_escaped() {
        let mut s = SvgSurface::new(10.0, 10.0);
        s.text(
            Point::new(1.0, 1.0),
            "a < b & \"c\"",
            &TextStyle::centred(Rgba::WHITE, 12.0),
        );
        assert!(s.to_svg().contains("a &lt; b &amp; &quot;c&quot;"));
    }

    #[test]
    fn gradients_get_unique_ids() {
        let mut s = SvgSurface::new(10.0, 10.0);
        let paint = Paint::Radial(RadialGradient::centred(vec![
            GradientStop {
                offset: 0.0,
                color: Rgba::WHITE,
            },
            GradientStop {
                offset: 1.0,
                color: Rgba::BLACK.with_alpha(0.0),
            },
        ]));
        s.fill_circle(Point::new(2.0, 2.0), 1.0, &paint);
        s.fill_circle(Point::new(5.0, 5.0), 1.0, &paint);
        let svg = s.to_svg();
        assert!(svg.contains(r#"id="g0""#) && svg.contains(r#"id="g1""#));
        assert!(svg.contains("url(#g1)"));
    }

    #[test]
    fn numbers_are_compact() {
        assert_eq!(fmt_num(12.0), "12");
        assert_eq!(fmt_num(0.5), "0.5");
        assert_eq!(fmt_num(-0.001), "0");
        assert_eq!(fmt_num(1.23456), "1.23");
    }
}
