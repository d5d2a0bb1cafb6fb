use serde::{Deserialize, Serialize};
use url::Url;

use crate::{TsumugiError, TsumugiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// Single-segment Smooth/HLS/DASH/progressive media
    #[default]
    Media,
    /// Static page shown for a fixed duration
    Static,
    /// VAST manifest the host resolves to a media URI
    Vast,
    /// Live media to seek back to the start of, or nothing for on-demand
    SeekToStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdType {
    Preroll,
    Midroll,
    Postroll,
    /// Subsequent ad in an ad pod
    Pod,
}

/// Anchor of an entry on the linear timeline.
///
/// `duration == None` marks an open-ended live entry whose end is not known yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearSpan {
    pub start: f64,
    pub duration: Option<f64>,
}

impl LinearSpan {
    pub fn end(&self) -> Option<f64> {
        self.duration.map(|d| self.start + d)
    }

    /// End of the span, treating an open end as unbounded.
    pub fn end_or_inf(&self) -> f64 {
        self.end().unwrap_or(f64::INFINITY)
    }

    pub fn contains(&self, linear: f64) -> bool {
        self.start <= linear && linear < self.end_or_inf()
    }
}

/// Window inside the physical media resource that an entry plays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediaWindow {
    pub clip_begin: f64,
    #[serde(default)]
    pub clip_end: Option<f64>,
}

impl MediaWindow {
    pub fn new(clip_begin: f64, clip_end: f64) -> Self {
        Self {
            clip_begin,
            clip_end: Some(clip_end),
        }
    }

    pub fn open_ended(clip_begin: f64) -> Self {
        Self {
            clip_begin,
            clip_end: None,
        }
    }

    pub fn duration(&self) -> Option<f64> {
        self.clip_end.map(|end| end - self.clip_begin)
    }

    pub(crate) fn validate(&self) -> TsumugiResult<()> {
        let valid = self.clip_begin.is_finite()
            && self.clip_begin >= 0.
            && self.clip_end.map_or(true, |end| end.is_finite() && end >= self.clip_begin);
        if valid {
            Ok(())
        } else {
            Err(TsumugiError::InvalidMediaTime {
                begin: self.clip_begin,
                end: self.clip_end,
            })
        }
    }
}

/// Rules governing how a segment may be played, skipped and dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackPolicy {
    /// The user may seek into or past the segment freely.
    pub skippable: bool,
    /// The segment plays again when a seek moves playback back over it.
    pub replay_on_seek_back: bool,
    /// A playback error skips the segment instead of terminating the session.
    pub droppable_on_error: bool,
    /// The segment may be cancelled while it is playing.
    pub cancelable_while_playing: bool,
    /// The segment occupies seekbar time. Hidden segments contribute zero width.
    pub seekbar_visible: bool,
    /// Number of buffering stalls tolerated. The stall after the last tolerated one abandons the
    /// segment.
    pub buffering_budget: Option<u32>,
}

impl PlaybackPolicy {
    pub fn content() -> Self {
        Self {
            skippable: true,
            replay_on_seek_back: true,
            droppable_on_error: false,
            cancelable_while_playing: true,
            seekbar_visible: true,
            buffering_budget: None,
        }
    }

    /// Policy of an ad: locked until played, hidden from the seekbar, dropped on error.
    ///
    /// Three buffering stalls are tolerated; the fourth abandons the ad.
    pub fn advertisement() -> Self {
        Self {
            skippable: false,
            replay_on_seek_back: false,
            droppable_on_error: true,
            cancelable_while_playing: false,
            seekbar_visible: false,
            buffering_budget: Some(3),
        }
    }

    pub fn with_skippable(mut self, skippable: bool) -> Self {
        self.skippable = skippable;
        self
    }

    pub fn with_seekbar_visible(mut self, visible: bool) -> Self {
        self.seekbar_visible = visible;
        self
    }
}

impl Default for PlaybackPolicy {
    fn default() -> Self {
        Self::content()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistEntry {
    pub r#type: EntryType,
    pub entry_id: EntryId,
    /// Id of the entry this one was split from, or its own id.
    pub original_id: EntryId,
    pub linear: LinearSpan,
    pub clip_uri: Url,
    pub media_time: MediaWindow,
    pub is_advertisement: bool,
    pub delete_after_played: bool,
    pub playback_policy: PlaybackPolicy,
    /// Part of an ad pod, so later pod ads may be appended after it.
    pub pod_member: bool,
    pub(crate) played: bool,
}

impl PlaylistEntry {
    pub fn has_played(&self) -> bool {
        self.played
    }

    pub fn is_open_ended(&self) -> bool {
        self.linear.duration.is_none()
    }

    /// Whether the entry's duration is hidden from seekbar time.
    pub fn is_concealed(&self) -> bool {
        self.is_advertisement && !self.playback_policy.seekbar_visible
    }

    /// Whether a seek or playback crossing this entry again must pass over it.
    pub(crate) fn is_spent(&self) -> bool {
        self.is_advertisement && self.played && !self.playback_policy.replay_on_seek_back
    }

    /// Whether a pod ad may be appended after this entry.
    pub fn accepts_pod(&self) -> bool {
        if self.r#type == EntryType::SeekToStart {
            return false;
        }
        !self.is_advertisement || self.pod_member
    }

    pub(crate) fn is_locked(&self) -> bool {
        self.is_advertisement && !self.playback_policy.skippable && !self.is_spent()
    }
}

/// Everything needed to create a playlist entry, before the store assigns its id and anchor.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub r#type: EntryType,
    pub clip_uri: Url,
    pub media_time: MediaWindow,
    pub is_advertisement: bool,
    pub delete_after_played: bool,
    pub playback_policy: PlaybackPolicy,
    pub pod_member: bool,
}

impl NewEntry {
    pub fn content(clip_uri: Url, media_time: MediaWindow) -> Self {
        Self {
            r#type: EntryType::Media,
            clip_uri,
            media_time,
            is_advertisement: false,
            delete_after_played: false,
            playback_policy: PlaybackPolicy::content(),
            pod_member: false,
        }
    }
}

/// Transient ad insertion request, consumed by the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdInfo {
    pub clip_url: Url,
    pub media_time: MediaWindow,
    #[serde(default = "PlaybackPolicy::advertisement")]
    pub policy: PlaybackPolicy,
    #[serde(default)]
    pub delete_after_played: bool,
    pub r#type: AdType,
    /// Entry the ad is appended after, for [`AdType::Pod`].
    #[serde(default)]
    pub append_to: Option<EntryId>,
}

impl AdInfo {
    pub fn new(clip_url: Url, media_time: MediaWindow, r#type: AdType) -> Self {
        Self {
            clip_url,
            media_time,
            policy: PlaybackPolicy::advertisement(),
            delete_after_played: false,
            r#type,
            append_to: None,
        }
    }

    pub fn pod(clip_url: Url, media_time: MediaWindow, append_to: EntryId) -> Self {
        Self {
            append_to: Some(append_to),
            ..Self::new(clip_url, media_time, AdType::Pod)
        }
    }

    pub fn with_policy(mut self, policy: PlaybackPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn delete_after_played(mut self, delete: bool) -> Self {
        self.delete_after_played = delete;
        self
    }
}
