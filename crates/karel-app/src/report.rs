//! Serializable summary of a finished run.

use karel_core::{Direction, Karel, Position, SnapshotRenderer};
use serde::Serialize;

use crate::script::{QueryRecord, RunReport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameRecord {
    pub step: u64,
    pub frame: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub line: usize,
    pub error: String,
}

/// Final agent state plus the retained frames, ready for `serde_json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub world_width: u32,
    pub world_height: u32,
    pub position: Position,
    pub direction: Direction,
    pub carried_beepers: Option<u32>,
    pub beepers_on_grid: u32,
    pub step: u64,
    pub executed: usize,
    pub evicted_frames: u64,
    pub queries: Vec<QueryRecord>,
    pub failure: Option<FailureRecord>,
    pub frames: Vec<FrameRecord>,
}

impl RunSummary {
    /// Collects the summary. `describe` turns each artifact into text.
    pub fn collect<R, F>(karel: &Karel<R>, report: &RunReport, mut describe: F) -> Self
    where
        R: SnapshotRenderer,
        F: FnMut(&R::Artifact) -> String,
    {
        Self {
            world_width: karel.world().width(),
            world_height: karel.world().height(),
            position: karel.position(),
            direction: karel.direction(),
            carried_beepers: karel.carried_beepers(),
            beepers_on_grid: karel.beepers().values().sum(),
            step: karel.step().0,
            executed: report.executed,
            evicted_frames: karel.history().evicted(),
            queries: report.queries.clone(),
            failure: report.failure.as_ref().map(|failure| FailureRecord {
                line: failure.line,
                error: failure.error.to_string(),
            }),
            frames: karel
                .history()
                .iter()
                .map(|frame| FrameRecord {
                    step: frame.step.0,
                    frame: describe(&frame.artifact),
                })
                .collect(),
        }
    }
}
