use std::{collections::HashMap, sync::Arc};

use url::Url;

use crate::{
    manifest::{BreakType, Linear, MediaFile, TimeOffset, VastDocument, VmapDocument},
    playlist::{
        AdInfo, AdType, EntryId, EntryType, MediaWindow, NewEntry, PlaybackPolicy, Playlist,
        PlaylistEntry,
    },
    resolver::{CreativeSelector, PlayableMediaSelector},
    TsumugiError, TsumugiResult,
};

/// A creative kept aside when another one was scheduled in its place.
#[derive(Debug, Clone)]
struct Fallback {
    duration: f64,
    media_files: Vec<MediaFile>,
}

/// Outcome of scheduling one VMAP ad break.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledBreak {
    pub break_id: Option<String>,
    /// Timeline position the break was inserted at.
    pub anchor: f64,
    pub entries: Vec<EntryId>,
}

/// Everything about an ad except the media it plays.
struct Placement {
    ad_type: AdType,
    append_to: Option<EntryId>,
    at: f64,
    policy: PlaybackPolicy,
    delete_after_played: bool,
    pod_member: bool,
}

/// Turns ad and content requests into playlist entries.
#[derive(Clone)]
pub struct Scheduler {
    selector: Arc<dyn CreativeSelector>,
    /// Policy of ads coming from a VMAP manifest.
    ad_policy: PlaybackPolicy,
    fallbacks: HashMap<EntryId, Vec<Fallback>>,
}

impl Scheduler {
    pub fn new(selector: Arc<dyn CreativeSelector>) -> Self {
        Self {
            selector,
            ad_policy: PlaybackPolicy::advertisement(),
            fallbacks: HashMap::new(),
        }
    }

    pub fn with_ad_policy(mut self, ad_policy: PlaybackPolicy) -> Self {
        self.ad_policy = ad_policy;
        self
    }

    pub fn with_selector<S>(selector: S) -> Self
    where
        S: CreativeSelector + 'static,
    {
        Self::new(Arc::new(selector))
    }

    pub fn selector(&self) -> &dyn CreativeSelector {
        self.selector.as_ref()
    }

    fn place(
        &self,
        playlist: &mut Playlist,
        new: NewEntry,
        placement: &Placement,
    ) -> TsumugiResult<EntryId> {
        if new.media_time.clip_end.is_none() {
            return Err(TsumugiError::InvalidMediaTime {
                begin: new.media_time.clip_begin,
                end: None,
            });
        }

        let entry_id = match placement.ad_type {
            AdType::Preroll => {
                // after the prerolls already in place, before the first content
                let first_content = playlist
                    .iter()
                    .find(|e| !e.is_advertisement)
                    .map(|e| e.entry_id);
                match first_content {
                    Some(anchor) => playlist.insert_before(anchor, new)?,
                    None => playlist.push_back(new)?,
                }
            }
            AdType::Midroll => playlist.insert_at(placement.at, new)?,
            AdType::Postroll => playlist.push_back(new)?,
            AdType::Pod => {
                let anchor = placement
                    .append_to
                    .ok_or(TsumugiError::InvalidReference(None))?;
                // content or an earlier member of the same pod
                match playlist.find(anchor) {
                    Some(entry) if entry.accepts_pod() => playlist.insert_after(anchor, new)?,
                    _ => return Err(TsumugiError::InvalidReference(Some(anchor))),
                }
            }
        };

        tracing::info!(
            entry_id = %entry_id,
            ad_type = ?placement.ad_type,
            at = placement.at,
            "Ad scheduled"
        );
        Ok(entry_id)
    }

    /// Schedules a single ad clip.
    pub fn schedule_clip(
        &mut self,
        playlist: &mut Playlist,
        ad: AdInfo,
        at: f64,
        entry_type: EntryType,
    ) -> TsumugiResult<EntryId> {
        let placement = Placement {
            ad_type: ad.r#type,
            append_to: ad.append_to,
            at,
            policy: ad.policy,
            delete_after_played: ad.delete_after_played,
            pod_member: ad.r#type == AdType::Pod,
        };
        let new = NewEntry {
            r#type: entry_type,
            clip_uri: ad.clip_url,
            media_time: ad.media_time,
            is_advertisement: true,
            delete_after_played: placement.delete_after_played,
            playback_policy: placement.policy.clone(),
            pod_member: placement.pod_member,
        };
        self.place(playlist, new, &placement)
    }

    /// Schedules the first playable creative among `candidates`, keeping the others as fallbacks.
    fn schedule_creatives(
        &mut self,
        playlist: &mut Playlist,
        candidates: &[&Linear],
        placement: &Placement,
    ) -> TsumugiResult<EntryId> {
        let chosen = candidates.iter().enumerate().find_map(|(index, linear)| {
            self.selector
                .select(&linear.media_files)
                .map(|file| (index, *linear, file.clone()))
        });
        let Some((chosen_index, linear, file)) = chosen else {
            tracing::warn!(
                candidates = candidates.len(),
                "None of the linear creatives can be played"
            );
            return Err(TsumugiError::NoPlayableCreative);
        };

        let begin = file.media_time_offset.unwrap_or(0.);
        let mut policy = placement.policy.clone();
        if linear.skip_offset.is_some() {
            policy.skippable = true;
        }
        let new = NewEntry {
            r#type: EntryType::Media,
            clip_uri: file.uri.clone(),
            media_time: MediaWindow::new(begin, begin + linear.duration),
            is_advertisement: true,
            delete_after_played: placement.delete_after_played,
            playback_policy: policy,
            pod_member: placement.pod_member,
        };
        let entry_id = self.place(playlist, new, placement)?;

        let fallbacks: Vec<Fallback> = candidates
            .iter()
            .enumerate()
            .filter_map(|(index, candidate)| {
                let media_files = if index == chosen_index {
                    let position = candidate.media_files.iter().position(|f| *f == file)?;
                    candidate.media_files[position + 1..].to_vec()
                } else {
                    candidate.media_files.clone()
                };
                (!media_files.is_empty()).then_some(Fallback {
                    duration: candidate.duration,
                    media_files,
                })
            })
            .collect();
        if !fallbacks.is_empty() {
            tracing::debug!(entry_id = %entry_id, count = fallbacks.len(), "Fallback creatives recorded");
            self.fallbacks.insert(entry_id, fallbacks);
        }
        Ok(entry_id)
    }

    /// Schedules the first playable creative of a resolved VAST manifest.
    ///
    /// The clip URL and media window of `ad` are replaced by the creative's own.
    pub fn schedule_vast_clip(
        &mut self,
        playlist: &mut Playlist,
        ad: AdInfo,
        manifest: &VastDocument,
        at: f64,
    ) -> TsumugiResult<EntryId> {
        let candidates: Vec<&Linear> = manifest
            .pod()
            .into_iter()
            .flat_map(|inline| inline.linear_creatives())
            .collect();
        let placement = Placement {
            ad_type: ad.r#type,
            append_to: ad.append_to,
            at,
            policy: ad.policy,
            delete_after_played: ad.delete_after_played,
            pod_member: ad.r#type == AdType::Pod,
        };
        self.schedule_creatives(playlist, &candidates, &placement)
    }

    /// Schedules every linear ad break of a resolved VMAP manifest.
    ///
    /// Percentages are taken of the content duration, so ads do not count towards them. The
    /// resulting offset is a position on the merged timeline. A break whose ads cannot be placed
    /// is dropped without failing the others.
    pub fn schedule_vmap(
        &mut self,
        playlist: &mut Playlist,
        manifest: &VmapDocument,
    ) -> TsumugiResult<Vec<ScheduledBreak>> {
        if playlist.iter().all(|e| e.is_advertisement) {
            return Err(TsumugiError::InvalidState(
                "VMAP scheduling requires content in the playlist".to_string(),
            ));
        }
        let content_duration = playlist.content_duration();
        let mut scheduled = Vec::new();

        for ad_break in &manifest.breaks {
            if ad_break.break_type != BreakType::Linear {
                tracing::debug!(break_id = ?ad_break.id, break_type = ?ad_break.break_type, "Ignoring non-linear ad break");
                continue;
            }
            let Some(vast) = ad_break.vast() else {
                tracing::warn!(break_id = ?ad_break.id, "Ad break has no resolved VAST data, dropping");
                continue;
            };

            let (ad_type, anchor, append_to) = match ad_break.time_offset {
                TimeOffset::Start => (AdType::Preroll, 0., None),
                TimeOffset::Clock(seconds) => (AdType::Midroll, seconds, None),
                TimeOffset::Position(entry_id) => (AdType::Pod, 0., Some(entry_id)),
                TimeOffset::End | TimeOffset::Percentage(_) if content_duration.is_none() => {
                    tracing::warn!(break_id = ?ad_break.id, offset = ?ad_break.time_offset, "Content duration unknown, dropping ad break");
                    continue;
                }
                TimeOffset::End => (AdType::Postroll, content_duration.unwrap_or_default(), None),
                TimeOffset::Percentage(percentage) => (
                    AdType::Midroll,
                    content_duration.unwrap_or_default() * percentage / 100.,
                    None,
                ),
            };
            let mut inlines = vast.pod();
            if !ad_break.allows_multiple_ads() {
                inlines.truncate(1);
            }
            let pod_member = inlines.len() > 1 || append_to.is_some();

            let mut entries = Vec::new();
            let mut previous = append_to;
            for inline in inlines {
                let placement = Placement {
                    ad_type: if previous.is_some() {
                        AdType::Pod
                    } else {
                        ad_type
                    },
                    append_to: previous,
                    at: anchor,
                    policy: self.ad_policy.clone(),
                    delete_after_played: false,
                    pod_member,
                };
                let candidates: Vec<&Linear> = inline.linear_creatives().collect();
                match self.schedule_creatives(playlist, &candidates, &placement) {
                    Ok(entry_id) => {
                        entries.push(entry_id);
                        previous = Some(entry_id);
                    }
                    Err(e) => {
                        tracing::warn!(break_id = ?ad_break.id, ad_title = %inline.ad_title, error = %e, "Dropping ad");
                    }
                }
            }

            scheduled.push(ScheduledBreak {
                break_id: ad_break.id.clone(),
                anchor,
                entries,
            });
        }

        Ok(scheduled)
    }

    /// Appends a content clip at the end of the known timeline.
    pub fn append_content_clip(
        &mut self,
        playlist: &mut Playlist,
        clip_uri: Url,
        media_time: MediaWindow,
    ) -> TsumugiResult<EntryId> {
        let entry_id = playlist.push_back(NewEntry::content(clip_uri, media_time))?;
        tracing::info!(entry_id = %entry_id, "Content clip appended");
        Ok(entry_id)
    }

    /// Removes a scheduled entry.
    ///
    /// `playing` is the entry currently being played, which may only be cancelled if its policy
    /// allows it.
    pub fn cancel_clip(
        &mut self,
        playlist: &mut Playlist,
        entry_id: EntryId,
        playing: Option<EntryId>,
    ) -> TsumugiResult<PlaylistEntry> {
        let entry = playlist
            .find(entry_id)
            .ok_or(TsumugiError::NotFound(entry_id))?;
        if playing == Some(entry_id) && !entry.playback_policy.cancelable_while_playing {
            return Err(TsumugiError::InvalidState(format!(
                "entry {entry_id} can not be cancelled while playing"
            )));
        }

        let removed = playlist.remove(entry_id)?;
        self.fallbacks.remove(&entry_id);
        tracing::info!(entry_id = %entry_id, "Clip cancelled");
        Ok(removed)
    }

    /// Swaps the next playable fallback creative into a failed entry.
    ///
    /// Returns false when no fallback is left.
    pub(crate) fn apply_fallback(
        &mut self,
        playlist: &mut Playlist,
        entry_id: EntryId,
    ) -> TsumugiResult<bool> {
        let Some(fallbacks) = self.fallbacks.get_mut(&entry_id) else {
            return Ok(false);
        };

        while !fallbacks.is_empty() {
            let fallback = fallbacks.remove(0);
            let Some(file) = self.selector.select(&fallback.media_files) else {
                continue;
            };
            let begin = file.media_time_offset.unwrap_or(0.);
            playlist.replace_clip(
                entry_id,
                file.uri.clone(),
                MediaWindow::new(begin, begin + fallback.duration),
            )?;
            tracing::info!(entry_id = %entry_id, uri = %file.uri, "Switched to fallback creative");
            return Ok(true);
        }

        self.fallbacks.remove(&entry_id);
        Ok(false)
    }

    pub(crate) fn forget(&mut self, entry_id: EntryId) {
        self.fallbacks.remove(&entry_id);
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::with_selector(PlayableMediaSelector::default())
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("ad_policy", &self.ad_policy)
            .field("fallbacks", &self.fallbacks)
            .finish_non_exhaustive()
    }
}
