use serde::Deserialize;
use tokio::sync::mpsc;
use url::Url;

use crate::{sequencer::SeekTarget, time::MediaTime, EntryId};

fn default_rate() -> f64 {
    1.
}

/// Events reported by the media engine.
///
/// Positions are physical positions inside the media of `entry_id`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    SegmentEnded {
        entry_id: EntryId,
        position: f64,
        #[serde(default = "default_rate")]
        rate: f64,
        #[serde(default)]
        is_not_played: bool,
        #[serde(default)]
        is_end_of_sequence: bool,
    },
    BufferingStalled {
        entry_id: EntryId,
    },
    BufferingEnded {
        entry_id: EntryId,
        position: f64,
        #[serde(default = "default_rate")]
        rate: f64,
    },
    PlaybackError {
        entry_id: EntryId,
        code: String,
        position: f64,
        #[serde(default = "default_rate")]
        rate: f64,
        #[serde(default)]
        is_not_played: bool,
        #[serde(default)]
        is_end_of_sequence: bool,
    },
    SeekRequested {
        target: SeekTarget,
    },
    SeekCompleted,
    PositionChanged {
        entry_id: EntryId,
        position: f64,
        #[serde(default = "default_rate")]
        rate: f64,
    },
}

/// Commands sent to the media engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    LoadSegment {
        entry_id: EntryId,
        clip_uri: Url,
        media_time: MediaTime,
    },
    Pause,
    SetRate(f64),
}

pub trait MediaEngine {
    fn execute(&mut self, command: EngineCommand);
}

/// Records commands in order.
impl MediaEngine for Vec<EngineCommand> {
    fn execute(&mut self, command: EngineCommand) {
        self.push(command);
    }
}

/// Forwards commands to an engine running on another task.
impl MediaEngine for mpsc::UnboundedSender<EngineCommand> {
    fn execute(&mut self, command: EngineCommand) {
        if self.send(command).is_err() {
            tracing::warn!("Media engine is gone, dropping command");
        }
    }
}
