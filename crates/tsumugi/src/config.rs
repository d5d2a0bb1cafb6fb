use serde::Deserialize;

use crate::{
    playlist::PlaybackPolicy,
    resolver::PlayableMediaSelector,
    scheduler::Scheduler,
    sequencer::Sequencer,
};

/// Session settings, usually read from the host's configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// MIME types the media engine can play, in order of preference.
    pub mime_types: Vec<String>,
    /// Highest creative bitrate in kbps.
    pub max_bitrate: Option<u32>,
    /// Buffering stalls tolerated in an ad before it is abandoned.
    pub ad_buffering_budget: Option<u32>,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        let selector = PlayableMediaSelector::default();
        Self {
            mime_types: selector.mime_types,
            max_bitrate: selector.max_bitrate,
            ad_buffering_budget: PlaybackPolicy::advertisement().buffering_budget,
        }
    }
}

impl SequencerConfig {
    pub fn selector(&self) -> PlayableMediaSelector {
        PlayableMediaSelector::new(self.mime_types.clone(), self.max_bitrate)
    }

    /// Policy given to ads that do not bring their own.
    pub fn ad_policy(&self) -> PlaybackPolicy {
        PlaybackPolicy {
            buffering_budget: self.ad_buffering_budget,
            ..PlaybackPolicy::advertisement()
        }
    }

    pub fn build(&self) -> Sequencer {
        let scheduler = Scheduler::with_selector(self.selector()).with_ad_policy(self.ad_policy());
        Sequencer::new(scheduler)
    }
}
