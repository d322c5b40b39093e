pub mod animation;
pub mod architecture;
pub mod chart;
pub mod client;
pub mod config;
pub mod draw;
pub mod gate;
pub mod geometry;
pub mod history;
pub mod layout;
pub mod nn;
pub mod palette;
pub mod renderer;
pub mod replay;
pub mod snapshot;
pub mod spatial;
pub mod status;
pub mod style;
pub mod surface;

pub use architecture::{Connection, NetworkGraph, Neuron, NeuronKey, NeuronKind};
pub use config::{ConfigError, VizConfig};
pub use renderer::{NetworkDiagramRenderer, RenderOutcome, RenderRequest};
pub use snapshot::{Snapshot, SnapshotError, WeightOrientation};
