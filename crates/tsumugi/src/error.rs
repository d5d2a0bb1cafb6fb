use thiserror::Error;

use crate::EntryId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TsumugiError {
    #[error("Playlist entry not found: {0}")]
    NotFound(EntryId),

    #[error("Invalid pod reference: {0:?}")]
    InvalidReference(Option<EntryId>),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Manifest parse error: {0}")]
    ParseError(String),

    #[error("Playback error on entry {entry_id}: {code}")]
    PlaybackError { entry_id: EntryId, code: String },

    #[error("No playable creative found in manifest")]
    NoPlayableCreative,

    #[error("Invalid media time window: [{begin}, {end:?}]")]
    InvalidMediaTime { begin: f64, end: Option<f64> },

    #[error("Invalid time offset: {0}")]
    InvalidTimeOffset(String),

    #[error("Session closed")]
    SessionClosed,
}

impl From<reqwest::Error> for TsumugiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::ParseError(e.to_string())
        } else {
            Self::NetworkError(e.to_string())
        }
    }
}

impl From<serde_json::Error> for TsumugiError {
    fn from(e: serde_json::Error) -> Self {
        Self::ParseError(e.to_string())
    }
}

pub type TsumugiResult<T> = Result<T, TsumugiError>;
