//! Playback state machine.
//!
//! Every transition consumes the [`Sequencer`] and hands it back inside a [`Transition`] together
//! with its output and the actions the host has to carry out. Nothing here performs I/O or starts
//! timers; the host feeds media engine events in, one at a time.
use serde::Deserialize;
use url::Url;

use crate::{
    engine::EngineCommand,
    manifest::{VastDocument, VmapDocument},
    notify::Notification,
    playlist::{
        AdInfo, EntryId, EntryType, MediaWindow, PlaybackPolicy, Playlist, PlaylistEntry,
        TIME_EPSILON,
    },
    scheduler::{ScheduledBreak, Scheduler},
    time::{
        linear_to_media, linear_to_seekbar, media_time_in_clip, media_to_linear,
        resolve_linear_seek, seekbar_to_linear, DvrWindow, MediaTime, SeekbarTime,
    },
    TsumugiError, TsumugiResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Ready,
    Playing,
    Seeking,
    Buffering,
    Error,
    Ended,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Engine(EngineCommand),
    Notify(Notification),
}

/// Result of a transition: the next state, the value asked for and the actions to carry out.
#[must_use]
#[derive(Debug)]
pub struct Transition<T> {
    pub state: Sequencer,
    pub output: T,
    pub actions: Vec<Action>,
}

/// The entry to play and the media position to start it from.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSegment {
    pub entry: PlaylistEntry,
    pub media_time: MediaTime,
}

impl PlaybackSegment {
    pub fn entry_id(&self) -> EntryId {
        self.entry.entry_id
    }

    pub fn linear_time(&self) -> f64 {
        let offset =
            self.media_time.current_playback_position - self.media_time.clip_begin_media_time;
        self.entry.linear.start + offset
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeekTarget {
    Linear(f64),
    Seekbar(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeekOutcome {
    pub segment: PlaybackSegment,
    /// The target was inside a locked ad and playback starts at the ad instead.
    pub redirected: bool,
    pub range_exceeded: bool,
}

/// Answer to a seekbar time query.
#[derive(Debug, Clone, PartialEq)]
pub struct SeekbarReport {
    pub seekbar_time: SeekbarTime,
    pub policy: PlaybackPolicy,
    pub range_exceeded: bool,
}

#[derive(Debug, Clone)]
pub struct Sequencer {
    playlist: Playlist,
    scheduler: Scheduler,
    phase: Phase,
    current: Option<EntryId>,
    /// Last known linear position within `current`.
    position: f64,
    dvr: DvrWindow,
    rate: f64,
    stalls: u32,
    error_reported: bool,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new(Scheduler::default())
    }
}

impl Sequencer {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            playlist: Playlist::new(),
            scheduler,
            phase: Phase::Idle,
            current: None,
            position: 0.,
            dvr: DvrWindow::default(),
            rate: 1.,
            stalls: 0,
            error_reported: false,
        }
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current(&self) -> Option<EntryId> {
        self.current
    }

    pub fn dvr_window(&self) -> &DvrWindow {
        &self.dvr
    }

    /// Records the media position the engine reported for `entry_id`.
    ///
    /// Positions of anything but the current entry are ignored.
    pub fn track_position(&mut self, entry_id: EntryId, position: f64) {
        if self.current != Some(entry_id) {
            return;
        }
        if let Some(entry) = self.playlist.find(entry_id) {
            self.position = media_to_linear(entry, position);
        }
    }

    fn ensure_usable(&self) -> TsumugiResult<()> {
        if self.phase == Phase::Error {
            return Err(TsumugiError::InvalidState(
                "sequencer is in a terminal error state".to_string(),
            ));
        }
        Ok(())
    }

    fn playing_entry(&self) -> Option<EntryId> {
        match self.phase {
            Phase::Playing | Phase::Seeking | Phase::Buffering => self.current,
            _ => None,
        }
    }

    pub fn schedule_clip(
        &mut self,
        ad: AdInfo,
        at: f64,
        entry_type: EntryType,
    ) -> TsumugiResult<EntryId> {
        self.ensure_usable()?;
        self.scheduler
            .schedule_clip(&mut self.playlist, ad, at, entry_type)
    }

    pub fn schedule_vast_clip(
        &mut self,
        ad: AdInfo,
        manifest: &VastDocument,
        at: f64,
    ) -> TsumugiResult<EntryId> {
        self.ensure_usable()?;
        self.scheduler
            .schedule_vast_clip(&mut self.playlist, ad, manifest, at)
    }

    pub fn schedule_vmap(&mut self, manifest: &VmapDocument) -> TsumugiResult<Vec<ScheduledBreak>> {
        self.ensure_usable()?;
        self.scheduler.schedule_vmap(&mut self.playlist, manifest)
    }

    pub fn append_content_clip(
        &mut self,
        clip_uri: Url,
        media_time: MediaWindow,
    ) -> TsumugiResult<EntryId> {
        self.ensure_usable()?;
        self.scheduler
            .append_content_clip(&mut self.playlist, clip_uri, media_time)
    }

    fn finish<T>(self, output: T, actions: Vec<Action>) -> Transition<T> {
        Transition {
            state: self,
            output,
            actions,
        }
    }

    fn reject<T>(self, error: TsumugiError) -> Transition<TsumugiResult<T>> {
        tracing::warn!(phase = ?self.phase, %error, "Event rejected");
        self.finish(Err(error), Vec::new())
    }

    /// Checks that an event refers to the segment being played.
    fn check_current(&self, entry_id: EntryId) -> TsumugiResult<()> {
        self.ensure_usable()?;
        if matches!(self.phase, Phase::Idle | Phase::Ended) {
            return Err(TsumugiError::InvalidState(format!(
                "no segment is playing in phase {:?}",
                self.phase
            )));
        }
        if self.current != Some(entry_id) {
            return Err(TsumugiError::InvalidState(format!(
                "event for {entry_id} while {} is current",
                self.current
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "nothing".to_string())
            )));
        }
        Ok(())
    }

    /// First entry after `entry_id` that playback does not pass over.
    fn next_playable(&self, entry_id: EntryId) -> Option<&PlaylistEntry> {
        let mut next = self.playlist.next_after(entry_id);
        while let Some(entry) = next {
            if !entry.is_spent() {
                return Some(entry);
            }
            next = self.playlist.next_after(entry.entry_id);
        }
        None
    }

    fn previous_playable(&self, entry_id: EntryId) -> Option<&PlaylistEntry> {
        let mut previous = self.playlist.previous_before(entry_id);
        while let Some(entry) = previous {
            if !entry.is_spent() {
                return Some(entry);
            }
            previous = self.playlist.previous_before(entry.entry_id);
        }
        None
    }

    /// Makes `entry_id` current, starting at `linear`, and emits what the host needs to play it.
    fn enter(
        &mut self,
        entry_id: EntryId,
        linear: f64,
        actions: &mut Vec<Action>,
    ) -> TsumugiResult<PlaybackSegment> {
        let entry = self
            .playlist
            .find(entry_id)
            .ok_or(TsumugiError::NotFound(entry_id))?
            .clone();
        let media_time = linear_to_media(&entry, linear);
        let changed = self.current != Some(entry_id);
        self.current = Some(entry_id);
        self.position = linear;
        self.stalls = 0;

        actions.push(Action::Engine(EngineCommand::LoadSegment {
            entry_id,
            clip_uri: entry.clip_uri.clone(),
            media_time,
        }));
        if entry.is_advertisement && self.rate != 1. {
            self.rate = 1.;
            actions.push(Action::Engine(EngineCommand::SetRate(1.)));
        }
        if changed {
            actions.push(Action::Notify(Notification::PlaylistEntryChanged {
                current_entry: entry_id,
                next_entry: self.next_playable(entry_id).map(|e| e.entry_id),
                current_playback_time: linear,
            }));
        }

        tracing::info!(
            entry_id = %entry_id,
            linear,
            is_advertisement = entry.is_advertisement,
            "Segment entered"
        );
        Ok(PlaybackSegment { entry, media_time })
    }

    fn end_sequence(&mut self, actions: &mut Vec<Action>) {
        tracing::info!(current = ?self.current, "Sequence ended");
        self.phase = Phase::Ended;
        actions.push(Action::Engine(EngineCommand::Pause));
    }

    /// Leaves `entry_id` forwards, returning the segment to play next.
    ///
    /// With nothing left to play, the sequence ends if `is_end_of_sequence` is set. Otherwise the
    /// timeline may still grow and the current entry is kept. A played entry that deletes itself
    /// stays in the playlist until playback has somewhere else to go, so `current` always names an
    /// existing entry.
    fn advance(
        &mut self,
        entry_id: EntryId,
        is_end_of_sequence: bool,
        actions: &mut Vec<Action>,
    ) -> TsumugiResult<Option<PlaybackSegment>> {
        let next = self
            .next_playable(entry_id)
            .map(|e| e.entry_id);

        if next.is_some() {
            if let Some(entry) = self.playlist.find(entry_id) {
                if entry.delete_after_played && entry.has_played() {
                    self.playlist.remove(entry_id)?;
                    self.scheduler.forget(entry_id);
                }
            }
        }

        match next {
            Some(next) => {
                let start = self
                    .playlist
                    .find(next)
                    .map(|e| e.linear.start)
                    .ok_or(TsumugiError::NotFound(next))?;
                self.phase = Phase::Playing;
                self.enter(next, start, actions).map(Some)
            }
            None if is_end_of_sequence => {
                self.end_sequence(actions);
                Ok(None)
            }
            None => {
                tracing::debug!(entry_id = %entry_id, "Nothing scheduled after the current entry yet");
                Ok(None)
            }
        }
    }

    /// Idle → Ready.
    pub fn ready(mut self) -> Transition<TsumugiResult<()>> {
        if self.phase != Phase::Idle {
            let error = TsumugiError::InvalidState(format!("ready in phase {:?}", self.phase));
            return self.reject(error);
        }
        if self.playlist.is_empty() {
            return self.reject(TsumugiError::InvalidState(
                "the playlist is empty".to_string(),
            ));
        }
        self.phase = Phase::Ready;
        tracing::info!(entries = self.playlist.len(), "Sequencer ready");
        self.finish(Ok(()), vec![Action::Notify(Notification::SequencerReady)])
    }

    /// Ready → Playing, loading the first entry that can be played.
    pub fn start(mut self) -> Transition<TsumugiResult<PlaybackSegment>> {
        if self.phase != Phase::Ready {
            let error = TsumugiError::InvalidState(format!("start in phase {:?}", self.phase));
            return self.reject(error);
        }
        let Some(resolution) = resolve_linear_seek(self.playlist.timeline_start(), &self.playlist)
        else {
            return self.reject(TsumugiError::InvalidState(
                "the playlist is empty".to_string(),
            ));
        };

        let mut actions = Vec::new();
        self.phase = Phase::Playing;
        let output = self.enter(resolution.entry_id, resolution.linear, &mut actions);
        self.finish(output, actions)
    }

    /// Projects the playback position of `current` onto the seekbar.
    ///
    /// `range_exceeded` is set when the position had to be clamped: outside the clip window, past
    /// the known timeline, or outside the DVR window in the direction of `rate`.
    pub fn get_seekbar_time(
        &self,
        media_time: &MediaTime,
        rate: f64,
        current: EntryId,
    ) -> TsumugiResult<SeekbarReport> {
        let entry = self
            .playlist
            .find(current)
            .ok_or(TsumugiError::NotFound(current))?;
        let position = media_time.current_playback_position;
        let linear = media_to_linear(entry, position);

        let mut range_exceeded = position < entry.media_time.clip_begin
            || entry.media_time.clip_end.is_some_and(|end| position > end);
        if let Some(end) = self.playlist.timeline_end() {
            range_exceeded |= linear > end;
        }

        let unclamped = linear_to_seekbar(linear, &self.playlist, &DvrWindow::default());
        let seekbar_time = linear_to_seekbar(linear, &self.playlist, &self.dvr);
        if seekbar_time.position != unclamped.position {
            range_exceeded = true;
        }
        if rate > 0. {
            range_exceeded |= self
                .dvr
                .live_position
                .is_some_and(|live| seekbar_time.position >= live);
        } else if rate < 0. {
            range_exceeded |= self
                .dvr
                .left_dvr_edge
                .is_some_and(|left| seekbar_time.position <= left);
        }

        Ok(SeekbarReport {
            seekbar_time,
            policy: entry.playback_policy.clone(),
            range_exceeded,
        })
    }

    pub fn get_linear_time(&self, media_time: &MediaTime, current: EntryId) -> TsumugiResult<f64> {
        let entry = self
            .playlist
            .find(current)
            .ok_or(TsumugiError::NotFound(current))?;
        Ok(media_to_linear(entry, media_time.current_playback_position))
    }

    /// Resolves a seek and loads the segment it lands in.
    pub fn get_segment_after_seek(
        mut self,
        target: SeekTarget,
    ) -> Transition<TsumugiResult<SeekOutcome>> {
        if let Err(e) = self.ensure_usable() {
            return self.reject(e);
        }
        if self.phase == Phase::Idle {
            return self.reject(TsumugiError::InvalidState(
                "seek before the sequencer is ready".to_string(),
            ));
        }

        let (linear, clamped) = match target {
            SeekTarget::Linear(linear) if self.dvr.is_live() => {
                let unbounded = DvrWindow::default();
                let seekbar = linear_to_seekbar(linear, &self.playlist, &unbounded).position;
                match self.dvr.clamp(seekbar) {
                    (seekbar, true) => (seekbar_to_linear(seekbar, &self.playlist, &self.dvr), true),
                    (_, false) => (linear, false),
                }
            }
            SeekTarget::Linear(linear) => (linear, false),
            SeekTarget::Seekbar(seekbar) => {
                let (seekbar, clamped) = self.dvr.clamp(seekbar);
                (seekbar_to_linear(seekbar, &self.playlist, &self.dvr), clamped)
            }
        };
        let Some(resolution) = resolve_linear_seek(linear, &self.playlist) else {
            return self.reject(TsumugiError::InvalidState(
                "the playlist is empty".to_string(),
            ));
        };

        tracing::info!(
            ?target,
            entry_id = %resolution.entry_id,
            linear = resolution.linear,
            redirected = resolution.redirected,
            "Seek resolved"
        );

        let mut actions = Vec::new();
        self.phase = Phase::Seeking;
        let output = self
            .enter(resolution.entry_id, resolution.linear, &mut actions)
            .map(|segment| SeekOutcome {
                segment,
                redirected: resolution.redirected,
                range_exceeded: clamped || resolution.range_exceeded,
            });
        self.finish(output, actions)
    }

    /// Seeking → Playing.
    pub fn on_seek_completed(mut self) -> Transition<TsumugiResult<()>> {
        if let Err(e) = self.ensure_usable() {
            return self.reject(e);
        }
        if self.phase == Phase::Seeking {
            self.phase = Phase::Playing;
        } else {
            tracing::debug!(phase = ?self.phase, "Seek completed outside of a seek, ignoring");
        }
        self.finish(Ok(()), Vec::new())
    }

    /// Moves past the end of `current`.
    ///
    /// With a negative `rate` the previous entry is played from its end instead.
    /// `is_not_played` tells that the segment ended without being played, so it is not consumed.
    pub fn get_segment_on_end_of_media(
        mut self,
        current: EntryId,
        position: f64,
        rate: f64,
        is_not_played: bool,
        is_end_of_sequence: bool,
    ) -> Transition<TsumugiResult<Option<PlaybackSegment>>> {
        if let Err(e) = self.check_current(current) {
            return self.reject(e);
        }
        tracing::debug!(entry_id = %current, position, rate, "End of media");
        self.rate = rate;
        if !is_not_played {
            self.playlist.mark_played(current);
        }

        let mut actions = Vec::new();
        if rate < 0. {
            let previous = self
                .previous_playable(current)
                .and_then(|e| e.linear.end().map(|end| (e.entry_id, end)));
            let output = match previous {
                Some((previous, end)) => {
                    self.phase = Phase::Playing;
                    self.enter(previous, end, &mut actions).map(Some)
                }
                None => {
                    tracing::debug!(entry_id = %current, "Rewound to the start of the timeline");
                    actions.push(Action::Engine(EngineCommand::Pause));
                    Ok(None)
                }
            };
            return self.finish(output, actions);
        }

        let output = self.advance(current, is_end_of_sequence, &mut actions);
        self.finish(output, actions)
    }

    /// Playing → Buffering.
    pub fn on_buffering_stalled(mut self, current: EntryId) -> Transition<TsumugiResult<()>> {
        if let Err(e) = self.check_current(current) {
            return self.reject(e);
        }
        self.stalls += 1;
        self.phase = Phase::Buffering;
        tracing::info!(entry_id = %current, stalls = self.stalls, "Buffering stalled");
        self.finish(Ok(()), Vec::new())
    }

    /// Leaves Buffering.
    ///
    /// The same segment is kept unless it stalled more often than its buffering budget allows, in
    /// which case playback moves past it.
    pub fn get_segment_on_end_of_buffering(
        mut self,
        current: EntryId,
        position: f64,
        rate: f64,
    ) -> Transition<TsumugiResult<Option<PlaybackSegment>>> {
        if let Err(e) = self.check_current(current) {
            return self.reject(e);
        }
        self.rate = rate;
        let Some(entry) = self.playlist.find(current).cloned() else {
            return self.reject(TsumugiError::NotFound(current));
        };

        let exhausted = entry
            .playback_policy
            .buffering_budget
            .is_some_and(|budget| self.stalls > budget);
        let mut actions = Vec::new();
        if !exhausted {
            self.phase = Phase::Playing;
            let media_time = media_time_in_clip(&entry, position);
            return self.finish(Ok(Some(PlaybackSegment { entry, media_time })), actions);
        }

        tracing::warn!(
            entry_id = %current,
            stalls = self.stalls,
            "Buffering budget exhausted, abandoning segment"
        );
        if entry.is_advertisement {
            self.playlist.mark_played(current);
        }
        let output = self.advance(current, false, &mut actions);
        self.finish(output, actions)
    }

    /// Handles a playback error of `current`.
    ///
    /// A failed ad first falls back to another creative of the same ad, then is dropped. Content is
    /// skipped when its policy marks it droppable. Anything else is fatal.
    pub fn get_segment_on_error(
        mut self,
        current: EntryId,
        position: f64,
        rate: f64,
        error: &str,
        is_not_played: bool,
        is_end_of_sequence: bool,
    ) -> Transition<TsumugiResult<Option<PlaybackSegment>>> {
        if let Err(e) = self.check_current(current) {
            return self.reject(e);
        }
        let Some(entry) = self.playlist.find(current).cloned() else {
            return self.reject(TsumugiError::NotFound(current));
        };
        self.rate = rate;
        let mut actions = Vec::new();
        tracing::warn!(entry_id = %current, code = error, position, "Playback error");

        if entry.is_advertisement {
            match self.scheduler.apply_fallback(&mut self.playlist, current) {
                Ok(true) => {
                    let start = entry.linear.start;
                    self.phase = Phase::Playing;
                    let output = self.enter(current, start, &mut actions).map(Some);
                    return self.finish(output, actions);
                }
                Ok(false) => {}
                Err(e) => tracing::warn!(entry_id = %current, error = %e, "Fallback creative rejected"),
            }
        }

        if entry.is_advertisement || entry.playback_policy.droppable_on_error {
            let next = self.next_playable(current).map(|e| e.entry_id);
            if entry.is_advertisement {
                self.scheduler.forget(current);
                if next.is_some() {
                    if let Err(e) = self.playlist.remove(current) {
                        return self.reject(e);
                    }
                    tracing::info!(entry_id = %current, "Failed ad dropped");
                } else if let Some(failed) = self.playlist.find_mut(current) {
                    // still current, dropped once playback moves on
                    failed.played = true;
                    failed.delete_after_played = true;
                    tracing::info!(entry_id = %current, "Failed ad dropped once playback moves on");
                }
            } else if !is_not_played {
                self.playlist.mark_played(current);
            }

            let output = match next {
                Some(next) => {
                    let start = self.playlist.find(next).map(|e| e.linear.start);
                    match start {
                        Some(start) => {
                            self.phase = Phase::Playing;
                            self.enter(next, start, &mut actions).map(Some)
                        }
                        None => Err(TsumugiError::NotFound(next)),
                    }
                }
                None => {
                    if is_end_of_sequence {
                        self.end_sequence(&mut actions);
                    }
                    Ok(None)
                }
            };
            return self.finish(output, actions);
        }

        let failure = TsumugiError::PlaybackError {
            entry_id: current,
            code: error.to_string(),
        };
        tracing::error!(entry_id = %current, code = error, "Fatal playback error");
        self.phase = Phase::Error;
        actions.push(Action::Engine(EngineCommand::Pause));
        if !self.error_reported {
            self.error_reported = true;
            actions.push(Action::Notify(Notification::SequencerError {
                entry_id: current,
                error: failure.clone(),
            }));
        }
        self.finish(Err(failure), actions)
    }

    /// Cancels a scheduled entry.
    ///
    /// Cancelling the entry being played moves playback to what follows it. Cancelling the entry
    /// announced as next announces its replacement.
    pub fn cancel_clip(mut self, entry_id: EntryId) -> Transition<TsumugiResult<Option<PlaybackSegment>>> {
        if let Err(e) = self.ensure_usable() {
            return self.reject(e);
        }
        let playing = self.playing_entry();
        let next = self.next_playable(entry_id).map(|e| e.entry_id);
        let announced = playing.and_then(|id| self.next_playable(id).map(|e| e.entry_id));
        if let Err(e) = self
            .scheduler
            .cancel_clip(&mut self.playlist, entry_id, playing)
        {
            return self.reject(e);
        }

        let mut actions = Vec::new();
        if self.current != Some(entry_id) {
            if let Some(current) = playing.filter(|_| announced == Some(entry_id)) {
                actions.push(Action::Notify(Notification::PlaylistEntryChanged {
                    current_entry: current,
                    next_entry: self.next_playable(current).map(|e| e.entry_id),
                    current_playback_time: self.position,
                }));
            }
            return self.finish(Ok(None), actions);
        }
        if playing.is_none() {
            // not started yet or already ended, nothing to reload
            self.current = next;
            return self.finish(Ok(None), actions);
        }

        let output = match next.and_then(|id| self.playlist.find(id).map(|e| (id, e.linear.start))) {
            Some((next, start)) => {
                self.phase = Phase::Playing;
                self.current = None;
                self.enter(next, start, &mut actions).map(Some)
            }
            None => {
                self.current = None;
                self.end_sequence(&mut actions);
                Ok(None)
            }
        };
        self.finish(output, actions)
    }

    /// Applies a new DVR window.
    ///
    /// Once the live presentation has ended, entries outside the window are dropped and an
    /// open-ended entry is closed at the live position.
    pub fn update_dvr_window(mut self, dvr: DvrWindow) -> Transition<TsumugiResult<()>> {
        if let Err(e) = self.ensure_usable() {
            return self.reject(e);
        }
        tracing::debug!(?dvr, "DVR window updated");

        if dvr.live_ended {
            let unbounded = DvrWindow::default();
            let current_span = self
                .current
                .and_then(|id| self.playlist.find(id))
                .map(|e| e.linear);

            if let Some(left) = dvr.left_dvr_edge {
                let mut left = seekbar_to_linear(left, &self.playlist, &unbounded);
                if let Some(span) = current_span {
                    left = left.min(span.start);
                }
                let removed = self.playlist.remove_entries_before(left);
                for id in &removed {
                    self.scheduler.forget(*id);
                }
                if !removed.is_empty() {
                    tracing::info!(count = removed.len(), "Entries behind the DVR window dropped");
                }
            }
            if let Some(live) = dvr.live_position {
                let mut live = seekbar_to_linear(live, &self.playlist, &unbounded);
                if let Some(span) = current_span {
                    live = live.max(span.start + TIME_EPSILON);
                }
                let removed = self.playlist.remove_entries_after(live);
                for id in &removed {
                    self.scheduler.forget(*id);
                }
                tracing::info!(
                    count = removed.len(),
                    timeline_end = ?self.playlist.timeline_end(),
                    "Live presentation ended"
                );
            }
        }

        self.dvr = dvr;
        self.finish(Ok(()), Vec::new())
    }
}
