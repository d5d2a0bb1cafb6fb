use crate::{
    engine::{EngineEvent, MediaEngine},
    notify::{Notification, Subscribers},
    playlist::EntryId,
    sequencer::{Action, PlaybackSegment, SeekbarReport, Sequencer, Transition},
    time::{DvrWindow, MediaTime},
    TsumugiError, TsumugiResult,
};

/// A playback session: the sequencer, the engine it drives and whoever listens to it.
#[derive(Debug)]
pub struct Session<E> {
    sequencer: Sequencer,
    engine: E,
    subscribers: Subscribers,
}

impl<E> Session<E>
where
    E: MediaEngine,
{
    pub fn new(sequencer: Sequencer, engine: E) -> Self {
        Self {
            sequencer,
            engine,
            subscribers: Subscribers::new(),
        }
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// Scheduling goes through here.
    pub fn sequencer_mut(&mut self) -> &mut Sequencer {
        &mut self.sequencer
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn subscribers_mut(&mut self) -> &mut Subscribers {
        &mut self.subscribers
    }

    pub fn into_parts(self) -> (Sequencer, E) {
        (self.sequencer, self.engine)
    }

    fn apply<T>(&mut self, transition: impl FnOnce(Sequencer) -> Transition<T>) -> T {
        let sequencer = std::mem::take(&mut self.sequencer);
        let Transition {
            state,
            output,
            actions,
        } = transition(sequencer);
        self.sequencer = state;
        self.dispatch(actions);
        output
    }

    fn dispatch(&mut self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Engine(command) => self.engine.execute(command),
                Action::Notify(notification) => self.subscribers.publish(notification),
            }
        }
    }

    /// Marks the sequencer ready and loads the first segment.
    pub fn start(&mut self) -> TsumugiResult<PlaybackSegment> {
        self.apply(Sequencer::ready)?;
        self.apply(Sequencer::start)
    }

    pub fn cancel_clip(&mut self, entry_id: EntryId) -> TsumugiResult<Option<PlaybackSegment>> {
        self.apply(|s| s.cancel_clip(entry_id))
    }

    pub fn update_dvr_window(&mut self, dvr: DvrWindow) -> TsumugiResult<()> {
        self.apply(|s| s.update_dvr_window(dvr))
    }

    /// Seekbar time of a physical position inside `entry_id`.
    pub fn seekbar_time(
        &self,
        entry_id: EntryId,
        position: f64,
        rate: f64,
    ) -> TsumugiResult<SeekbarReport> {
        let entry = self
            .sequencer
            .playlist()
            .find(entry_id)
            .ok_or(TsumugiError::NotFound(entry_id))?;
        // unclamped, so a position past the clip is reported as exceeded
        let media_time = MediaTime {
            current_playback_position: position,
            clip_begin_media_time: entry.media_time.clip_begin,
            clip_end_media_time: entry.media_time.clip_end,
        };
        self.sequencer.get_seekbar_time(&media_time, rate, entry_id)
    }

    /// Feeds one media engine event through the sequencer.
    pub fn handle(&mut self, event: EngineEvent) -> TsumugiResult<()> {
        match event {
            EngineEvent::SegmentEnded {
                entry_id,
                position,
                rate,
                is_not_played,
                is_end_of_sequence,
            } => self
                .apply(|s| {
                    s.get_segment_on_end_of_media(
                        entry_id,
                        position,
                        rate,
                        is_not_played,
                        is_end_of_sequence,
                    )
                })
                .map(drop),
            EngineEvent::BufferingStalled { entry_id } => {
                self.apply(|s| s.on_buffering_stalled(entry_id))
            }
            EngineEvent::BufferingEnded {
                entry_id,
                position,
                rate,
            } => self
                .apply(|s| s.get_segment_on_end_of_buffering(entry_id, position, rate))
                .map(drop),
            EngineEvent::PlaybackError {
                entry_id,
                code,
                position,
                rate,
                is_not_played,
                is_end_of_sequence,
            } => self
                .apply(|s| {
                    s.get_segment_on_error(
                        entry_id,
                        position,
                        rate,
                        &code,
                        is_not_played,
                        is_end_of_sequence,
                    )
                })
                .map(drop),
            EngineEvent::SeekRequested { target } => self
                .apply(|s| s.get_segment_after_seek(target))
                .map(drop),
            EngineEvent::SeekCompleted => self.apply(Sequencer::on_seek_completed),
            EngineEvent::PositionChanged {
                entry_id,
                position,
                rate,
            } => {
                self.sequencer.track_position(entry_id, position);
                let report = self.seekbar_time(entry_id, position, rate)?;
                self.subscribers.publish(Notification::SeekbarTimeUpdated {
                    seekbar_time: report.seekbar_time,
                    range_exceeded: report.range_exceeded,
                });
                Ok(())
            }
        }
    }
}
