//! Snapshot validity gate: nothing is laid out or drawn until a snapshot has
//! passed shape validation. Failures become a terminal diagnostic.

use crate::draw;
use crate::snapshot::{Snapshot, SnapshotError, ValidatedSnapshot, WeightOrientation};
use crate::style::Style;
use crate::surface::Surface;
use serde::Serialize;
use tracing::warn;

/// What the host shows instead of the diagram.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagnostic {
    pub message: String,
    /// Pretty-printed raw snapshot as received.
    pub dump: String,
}

impl Diagnostic {
    pub fn from_error(error: &SnapshotError, snapshot: &Snapshot) -> Self {
        Self {
            message: error.to_string(),
            dump: snapshot.dump(),
        }
    }

    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S, style: &Style) {
        draw::draw_diagnostic(surface, style, &self.message, &self.dump);
    }
}

pub fn check(
    snapshot: &Snapshot,
    orientation: WeightOrientation,
) -> Result<ValidatedSnapshot, Diagnostic> {
    snapshot.validate(orientation).map_err(|e| {
        warn!(error = %e, "rejecting network snapshot");
        Diagnostic::from_error(&e, snapshot)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCommand, RecordingSurface};

    #[test]
    fn valid_snapshot_passes() {
        assert!(check(
            &crate::test_support::example_snapshot(),
            WeightOrientation::SourceMajor
        )
        .is_ok());
    }

    #[test]
    fn invalid_snapshot_yields_message_and_dump() {
        let mut s = crate::test_support::example_snapshot();
        s.weights.remove("W1");
        let diag = check(&s, WeightOrientation::SourceMajor).unwrap_err();
        assert!(diag.message.contains("W1"));
        assert!(diag.dump.contains("\"W2\""));
        assert!(diag.dump.contains("\"b1\""));

        let mut surface = RecordingSurface::new(800.0, 400.0);
        diag.draw(&mut surface, &Style::default());
        assert_eq!(
            surface.count(|c| matches!(c, DrawCommand::FillCircle { .. } | DrawCommand::Polygon { .. })),
            0,
            "no partial network"
        );
        assert!(surface.texts().contains(&diag.message.as_str()));
    }
}
