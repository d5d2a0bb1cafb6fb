//! Conversions between media time, linear time and seekbar time.
//!
//! - Media time is the position inside the physical resource of one entry.
//! - Linear time is the position on the merged content and ad timeline.
//! - Seekbar time is what the user sees: linear time with the duration of concealed ads removed,
//!   clamped to the DVR window of a live presentation.
//!
//! ```text
//! linear   0        40   50                110
//!          |content |ad  |content            |
//! seekbar  0        40   40                100
//! ```
use serde::{Deserialize, Serialize};

use crate::playlist::{EntryId, Playlist, PlaylistEntry, TIME_EPSILON};

/// Position shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeekbarTime {
    pub position: f64,
    /// The position currently falls inside an advertisement.
    pub in_advertisement: bool,
}

/// Position inside the physical media resource, clamped to the clip window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediaTime {
    pub current_playback_position: f64,
    pub clip_begin_media_time: f64,
    pub clip_end_media_time: Option<f64>,
}

/// Seekable window of a live presentation, in seekbar time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DvrWindow {
    /// Earliest position still reachable.
    pub left_dvr_edge: Option<f64>,
    /// Current live position.
    pub live_position: Option<f64>,
    pub live_ended: bool,
}

impl DvrWindow {
    pub fn is_live(&self) -> bool {
        self.left_dvr_edge.is_some() || self.live_position.is_some()
    }

    /// Clamps a seekbar position into the window, reporting whether it had to move.
    pub fn clamp(&self, seekbar: f64) -> (f64, bool) {
        let mut position = seekbar;
        let mut exceeded = false;
        if let Some(left) = self.left_dvr_edge {
            if position < left {
                position = left;
                exceeded = true;
            }
        }
        if let Some(live) = self.live_position {
            if position > live {
                position = live;
                exceeded = true;
            }
        }
        (position, exceeded)
    }
}

pub fn linear_to_seekbar(linear: f64, playlist: &Playlist, dvr: &DvrWindow) -> SeekbarTime {
    let mut concealed = playlist.trimmed_concealed();
    let mut in_advertisement = false;

    for entry in playlist.iter() {
        if entry.linear.start > linear {
            break;
        }
        if entry.is_advertisement && entry.linear.contains(linear) {
            in_advertisement = true;
        }
        if entry.is_concealed() {
            concealed += linear.min(entry.linear.end_or_inf()) - entry.linear.start;
        }
    }

    let (position, _) = dvr.clamp(linear - concealed);
    SeekbarTime {
        position,
        in_advertisement,
    }
}

/// Inverse of [`linear_to_seekbar`].
///
/// A seekbar position sitting on a concealed ad resolves to the content after it.
pub fn seekbar_to_linear(seekbar: f64, playlist: &Playlist, dvr: &DvrWindow) -> f64 {
    let (seekbar, _) = dvr.clamp(seekbar);
    let mut cursor = playlist.timeline_start() - playlist.trimmed_concealed();
    if seekbar < cursor {
        return playlist.timeline_start() + (seekbar - cursor);
    }

    for entry in playlist.iter() {
        if entry.is_concealed() {
            continue;
        }
        let width = entry.linear.duration.unwrap_or(f64::INFINITY);
        if seekbar < cursor + width {
            return entry.linear.start + (seekbar - cursor);
        }
        cursor += width;
    }

    match playlist.timeline_end() {
        Some(end) => end + (seekbar - cursor),
        None => seekbar,
    }
}

pub fn media_time_in_clip(entry: &PlaylistEntry, physical_position: f64) -> MediaTime {
    let begin = entry.media_time.clip_begin;
    let end = entry.media_time.clip_end;
    let mut position = physical_position.max(begin);
    if let Some(end) = end {
        position = position.min(end);
    }
    MediaTime {
        current_playback_position: position,
        clip_begin_media_time: begin,
        clip_end_media_time: end,
    }
}

pub fn media_to_linear(entry: &PlaylistEntry, physical_position: f64) -> f64 {
    let media = media_time_in_clip(entry, physical_position);
    entry.linear.start + (media.current_playback_position - media.clip_begin_media_time)
}

pub fn linear_to_media(entry: &PlaylistEntry, linear: f64) -> MediaTime {
    media_time_in_clip(
        entry,
        entry.media_time.clip_begin + (linear - entry.linear.start),
    )
}

/// Where a seek ends up once playback policy has been applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekResolution {
    pub entry_id: EntryId,
    pub linear: f64,
    /// The target fell inside a locked ad and was moved to its start.
    pub redirected: bool,
    /// The target was outside the known timeline and has been clamped.
    pub range_exceeded: bool,
}

/// Resolves a linear seek target to an entry.
///
/// Spent ads (played, not replayable) are passed over. A target inside a locked ad is redirected
/// to the ad's start. Targets beyond the known timeline resolve to its last entry.
pub fn resolve_linear_seek(linear: f64, playlist: &Playlist) -> Option<SeekResolution> {
    let entries = playlist.entries();
    if entries.is_empty() {
        return None;
    }

    let mut range_exceeded = false;
    let mut linear = linear;
    if linear < playlist.timeline_start() {
        linear = playlist.timeline_start();
        range_exceeded = true;
    }

    let mut index = match entries.iter().position(|e| e.linear.contains(linear)) {
        Some(index) => index,
        None => {
            range_exceeded = true;
            let last = entries.len() - 1;
            linear = entries[last].linear.end_or_inf();
            last
        }
    };

    while entries[index].is_spent() {
        let Some(end) = entries[index].linear.end() else {
            break;
        };
        if index + 1 == entries.len() {
            linear = end;
            range_exceeded = true;
            break;
        }
        index += 1;
        linear = end;
    }

    let entry = &entries[index];
    let mut redirected = false;
    if entry.is_locked() && linear > entry.linear.start + TIME_EPSILON {
        linear = entry.linear.start;
        redirected = true;
    }

    Some(SeekResolution {
        entry_id: entry.entry_id,
        linear,
        redirected,
        range_exceeded,
    })
}
