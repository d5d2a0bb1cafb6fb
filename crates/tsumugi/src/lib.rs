pub mod config;
pub mod engine;
pub mod error;
pub mod handle;
pub mod manifest;
pub mod notify;
pub mod playlist;
pub mod resolver;
pub mod scheduler;
pub mod sequencer;
pub mod session;
pub mod time;

pub use error::*;
pub use playlist::EntryId;

pub use config::SequencerConfig;
pub use engine::{EngineCommand, EngineEvent, MediaEngine};
pub use handle::SessionHandle;
pub use notify::{Notification, Subscribers};
pub use sequencer::{Phase, PlaybackSegment, SeekTarget, Sequencer};
pub use session::Session;
