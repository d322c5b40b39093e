use crate::architecture::{Connection, NetworkGraph, Neuron, NeuronKind};
use crate::geometry::{EdgeGeometry, Point};
use crate::palette::Rgba;
use crate::style::Style;
use crate::surface::{GradientStop, Paint, RadialGradient, Surface, TextStyle};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Captions drawn under neurons. Hidden neurons are always `H1..Hn`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuronLabels {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl Default for NeuronLabels {
    fn default() -> Self {
        Self {
            inputs: vec!["CGPA".to_string(), "IQ".to_string()],
            outputs: vec!["Placed?".to_string()],
        }
    }
}

impl NeuronLabels {
    pub fn label(&self, neuron: &Neuron) -> String {
        let i = neuron.key.index;
        match neuron.kind {
            NeuronKind::Input => self
                .inputs
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("X{}", i + 1)),
            NeuronKind::Hidden => format!("H{}", i + 1),
            NeuronKind::Output => self
                .outputs
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("Y{}", i + 1)),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawOptions {
    pub show_weights_on_arrows: bool,
    pub epoch: Option<u32>,
    pub labels: NeuronLabels,
}

/// Two decimals, with negative zero printed as `0.00`.
pub fn format_value(v: f64) -> String {
    let s = format!("{v:.2}");
    if s == "-0.00" {
        "0.00".to_string()
    } else {
        s
    }
}

/// Full static redraw: clear, grid, edges, neurons, caption. Returns the
/// number of edges skipped because their endpoint discs overlap.
pub fn draw_network<S: Surface + ?Sized>(
    surface: &mut S,
    graph: &NetworkGraph,
    style: &Style,
    options: &DrawOptions,
) -> usize {
    surface.clear(style.background);
    draw_grid(surface, style);
    let skipped = graph
        .connections()
        .iter()
        .filter(|c| !draw_connection(surface, graph, c, style, options.show_weights_on_arrows))
        .count();
    if skipped > 0 {
        debug!(skipped, "neurons overlap, edges not drawn");
    }
    for neuron in graph.neurons() {
        draw_neuron(surface, neuron, style, &options.labels);
    }
    if let Some(epoch) = options.epoch {
        surface.text(
            Point::new(style.font_size, style.font_size * 1.5),
            &format!("Epoch {epoch}"),
            &TextStyle::left(style.label_color, style.font_size * 1.2).bold(),
        );
    }
    skipped
}

pub fn draw_grid<S: Surface + ?Sized>(surface: &mut S, style: &Style) {
    if !(style.grid_cell > 0.0) {
        return;
    }
    let (w, h) = (surface.width(), surface.height());
    let mut x = style.grid_cell;
    while x < w {
        surface.line(Point::new(x, 0.0), Point::new(x, h), style.grid_color, style.grid_line_width);
        x += style.grid_cell;
    }
    let mut y = style.grid_cell;
    while y < h {
        surface.line(Point::new(0.0, y), Point::new(w, y), style.grid_color, style.grid_line_width);
        y += style.grid_cell;
    }
}

/// Draws one edge and reports whether anything was drawn. Edges between
/// overlapping neurons have no visible length and are skipped.
pub fn draw_connection<S: Surface + ?Sized>(
    surface: &mut S,
    graph: &NetworkGraph,
    connection: &Connection,
    style: &Style,
    show_weight: bool,
) -> bool {
    let (Some(from), Some(to)) = (graph.position(connection.source), graph.position(connection.target))
    else {
        return false;
    };
    let Some(edge) = EdgeGeometry::between(from, to, style.neuron_radius) else {
        return false;
    };
    let edge_style = style.edge_style(connection.weight);

    // Stop the shaft at the arrow base so the tip stays sharp. An edge
    // shorter than the arrowhead gets no shaft at all.
    let visible = edge.start.distance(edge.end);
    if visible > style.arrow_length {
        let shaft_end = edge.end - edge.direction * style.arrow_length;
        surface.line(edge.start, shaft_end, edge_style.color, edge_style.width);
    }
    surface.polygon(
        &edge.arrowhead(style.arrow_length, style.arrow_half_width),
        edge_style.color,
    );

    if show_weight {
        let text = format_value(connection.weight);
        let mid = edge.midpoint();
        let size = style.font_size * 0.9;
        let plaque_w = size * 0.6 * text.chars().count() as f64 + 8.0;
        let plaque_h = size + 6.0;
        surface.fill_rect(
            Point::new(mid.x - plaque_w / 2.0, mid.y - plaque_h / 2.0),
            plaque_w,
            plaque_h,
            style.plaque_color,
            3.0,
        );
        surface.text(mid, &text, &TextStyle::centred(style.text_color, size));
    }
    true
}

pub fn draw_neuron<S: Surface + ?Sized>(
    surface: &mut S,
    neuron: &Neuron,
    style: &Style,
    labels: &NeuronLabels,
) {
    let r = style.neuron_radius;
    let c = neuron.position;
    let base = style.neuron_color(neuron.kind);

    // glow
    surface.fill_circle(
        c,
        r * style.glow_scale,
        &Paint::Radial(RadialGradient::centred(vec![
            GradientStop {
                offset: 0.0,
                color: base.with_alpha(0.45),
            },
            GradientStop {
                offset: 1.0,
                color: base.with_alpha(0.0),
            },
        ])),
    );

    // body
    surface.fill_circle(
        c,
        r,
        &Paint::Radial(RadialGradient {
            focus: (0.35, 0.35),
            stops: vec![
                GradientStop {
                    offset: 0.0,
                    color: base.lighten(0.45),
                },
                GradientStop {
                    offset: 0.7,
                    color: base,
                },
                GradientStop {
                    offset: 1.0,
                    color: base.darken(0.35),
                },
            ],
        }),
    );
    surface.stroke_circle(c, r, style.border_color, style.border_width);

    // specular highlight
    surface.fill_circle(
        Point::new(c.x - r * 0.35, c.y - r * 0.35),
        r * 0.25,
        &Paint::Solid(Rgba::WHITE.with_alpha(0.35)),
    );

    let value = match neuron.kind {
        NeuronKind::Input => neuron.activation,
        NeuronKind::Hidden | NeuronKind::Output => neuron.bias,
    };
    if let Some(v) = value {
        surface.text(
            c,
            &format_value(v),
            &TextStyle::centred(style.text_color, style.font_size).bold(),
        );
    }
    surface.text(
        Point::new(c.x, c.y + r + style.font_size),
        &labels.label(neuron),
        &TextStyle::centred(style.label_color, style.font_size),
    );
    if let (NeuronKind::Output, Some(a)) = (neuron.kind, neuron.activation) {
        surface.text(
            Point::new(c.x, c.y + r + style.font_size * 2.2),
            &format!("p = {}", format_value(a)),
            &TextStyle::centred(style.label_color, style.font_size * 0.9),
        );
    }
}

/// Terminal error panel: title, message, then as much of `dump` as fits.
pub fn draw_diagnostic<S: Surface + ?Sized>(
    surface: &mut S,
    style: &Style,
    message: &str,
    dump: &str,
) {
    surface.clear(style.background);
    let margin = style.font_size * 1.5;
    let line_height = style.font_size * 1.4;
    let mut y = margin;
    surface.text(
        Point::new(margin, y),
        "Invalid network snapshot",
        &TextStyle::left(style.error_color, style.font_size * 1.4).bold(),
    );
    y += line_height * 1.5;
    surface.text(
        Point::new(margin, y),
        message,
        &TextStyle::left(style.text_color, style.font_size),
    );
    y += line_height * 1.5;

    let dump_style = TextStyle::left(style.label_color, style.font_size * 0.85);
    let lines: Vec<&str> = dump.lines().collect();
    let room = ((surface.height() - y - margin) / line_height).floor().max(0.0) as usize;
    for (i, line) in lines.iter().enumerate() {
        if i + 1 == room && lines.len() > room {
            surface.text(Point::new(margin, y), "…", &dump_style);
            break;
        }
        if i >= room {
            break;
        }
        surface.text(Point::new(margin, y), line, &dump_style);
        y += line_height;
    }
}
