//! Renders every epoch of a recorded session. Frames are independent, so
//! each rayon worker builds its own renderer and surface.

use crate::config::VizConfig;
use crate::renderer::{self, RenderOutcome, RenderRequest};
use crate::status::SessionData;
use rayon::prelude::*;
use tracing::debug;

#[derive(Clone, Debug, PartialEq)]
pub struct ReplayFrame {
    /// 1-based.
    pub epoch: u32,
    pub loss: Option<f64>,
    pub accuracy: Option<f64>,
    pub outcome: RenderOutcome,
    pub svg: String,
}

impl ReplayFrame {
    pub fn file_name(&self) -> String {
        format!("epoch_{:05}.svg", self.epoch)
    }
}

/// One frame per recorded epoch, in epoch order. An epoch with a malformed
/// snapshot yields a diagnostic frame rather than aborting the replay.
pub fn render_session(session: &SessionData, config: &VizConfig) -> Vec<ReplayFrame> {
    debug!(
        session = %session.session_id,
        epochs = session.epoch_count(),
        "rendering session replay"
    );
    (0..session.epoch_count())
        .into_par_iter()
        .filter_map(|i| {
            let snapshot = session.snapshot_at(i)?;
            let epoch = i as u32 + 1;
            let request = RenderRequest {
                epoch: Some(epoch),
                ..RenderRequest::new(snapshot, config.width, config.height)
            };
            let (outcome, svg) = renderer::render_svg(&request, config);
            Some(ReplayFrame {
                epoch,
                loss: session.losses.get(i).copied(),
                accuracy: session.accuracies.get(i).copied(),
                outcome,
                svg,
            })
        })
        .collect()
}
