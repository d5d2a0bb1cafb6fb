use std::path::{Path, PathBuf};

use serde::Deserialize;
use tsumugi::{
    engine::EngineEvent,
    manifest::VmapDocument,
    playlist::{AdInfo, EntryType, MediaWindow},
    resolver::{resolve_ad_tags, HttpManifestResolver},
    time::DvrWindow,
    Sequencer, SequencerConfig,
};
use url::Url;

/// A scripted playback session.
#[derive(Debug, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub config: SequencerConfig,
    /// JSON rendering of a VMAP document, relative to the plan file.
    #[serde(default)]
    pub vmap: Option<PathBuf>,
    #[serde(default)]
    pub content: Vec<ContentClip>,
    #[serde(default)]
    pub ads: Vec<AdClip>,
    /// DVR window applied once playback has started.
    #[serde(default)]
    pub dvr: Option<DvrWindow>,
    #[serde(default)]
    pub events: Vec<EngineEvent>,
}

#[derive(Debug, Deserialize)]
pub struct ContentClip {
    pub uri: Url,
    #[serde(flatten)]
    pub media_time: MediaWindow,
}

#[derive(Debug, Deserialize)]
pub struct AdClip {
    #[serde(flatten)]
    pub ad: AdInfo,
    #[serde(default)]
    pub at: f64,
    #[serde(default)]
    pub entry_type: EntryType,
}

impl Plan {
    pub fn load(file: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(file)?;
        let plan = toml::from_str(&data)?;
        Ok(plan)
    }

    fn load_vmap(&self, base: &Path) -> anyhow::Result<Option<VmapDocument>> {
        let Some(path) = &self.vmap else {
            return Ok(None);
        };
        let data = std::fs::read_to_string(base.join(path))?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    /// Builds a sequencer with everything the plan schedules.
    ///
    /// Ads that can not be scheduled are logged and left out.
    pub async fn schedule(&self, base: &Path) -> anyhow::Result<Sequencer> {
        let mut sequencer = self.config.build();

        for clip in &self.content {
            let entry_id = sequencer.append_content_clip(clip.uri.clone(), clip.media_time)?;
            tracing::debug!(entry_id = %entry_id, uri = %clip.uri, "Content scheduled");
        }

        if let Some(mut vmap) = self.load_vmap(base)? {
            for error in resolve_ad_tags(&HttpManifestResolver::default(), &mut vmap).await {
                tracing::warn!(%error, "Ad tag could not be resolved");
            }
            for scheduled in sequencer.schedule_vmap(&vmap)? {
                tracing::info!(
                    break_id = ?scheduled.break_id,
                    anchor = scheduled.anchor,
                    entries = ?scheduled.entries,
                    "Ad break scheduled"
                );
            }
        }

        for clip in &self.ads {
            if let Err(error) = sequencer.schedule_clip(clip.ad.clone(), clip.at, clip.entry_type) {
                tracing::warn!(%error, uri = %clip.ad.clip_url, "Ad dropped");
            }
        }

        Ok(sequencer)
    }
}
