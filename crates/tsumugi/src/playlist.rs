mod entry;

pub use entry::*;

use crate::{TsumugiError, TsumugiResult};

/// Two linear positions closer than this are the same position.
pub(crate) const TIME_EPSILON: f64 = 1e-6;

/// Ordered store of scheduled content and ad entries.
///
/// Entries are sorted by linear start and contiguous: each entry starts where the previous one
/// ends. Only the last entry may be open-ended. Ids come from a counter that never goes back, so an
/// id is never handed out twice within one playlist.
#[derive(Debug, Clone)]
pub struct Playlist {
    entries: Vec<PlaylistEntry>,
    next_id: u64,
    /// Concealed ad time removed from the front of a live timeline.
    trimmed_concealed: f64,
}

impl Playlist {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
            trimmed_concealed: 0.,
        }
    }

    fn allocate_id(&mut self) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        id
    }

    fn index_of(&self, entry_id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.entry_id == entry_id)
    }

    fn index_of_or_err(&self, entry_id: EntryId) -> TsumugiResult<usize> {
        self.index_of(entry_id)
            .ok_or(TsumugiError::NotFound(entry_id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in linear time order.
    pub fn iter(&self) -> impl Iterator<Item = &PlaylistEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[PlaylistEntry] {
        &self.entries
    }

    pub fn find(&self, entry_id: EntryId) -> Option<&PlaylistEntry> {
        self.entries.iter().find(|e| e.entry_id == entry_id)
    }

    pub(crate) fn find_mut(&mut self, entry_id: EntryId) -> Option<&mut PlaylistEntry> {
        self.entries.iter_mut().find(|e| e.entry_id == entry_id)
    }

    /// The entry containing `linear`, or the nearest one starting after it.
    pub fn find_by_linear_time(&self, linear: f64) -> Option<&PlaylistEntry> {
        self.entries
            .iter()
            .find(|e| e.linear.end_or_inf() > linear || e.linear.start >= linear)
    }

    /// The entry whose span contains `linear`.
    pub fn entry_containing(&self, linear: f64) -> Option<&PlaylistEntry> {
        self.entries.iter().find(|e| e.linear.contains(linear))
    }

    pub fn next_after(&self, entry_id: EntryId) -> Option<&PlaylistEntry> {
        let index = self.index_of(entry_id)?;
        self.entries.get(index + 1)
    }

    pub fn previous_before(&self, entry_id: EntryId) -> Option<&PlaylistEntry> {
        let index = self.index_of(entry_id)?;
        index.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    pub fn timeline_start(&self) -> f64 {
        self.entries.first().map(|e| e.linear.start).unwrap_or(0.)
    }

    /// End of the known timeline, or `None` while the last entry is open-ended.
    pub fn timeline_end(&self) -> Option<f64> {
        match self.entries.last() {
            Some(last) => last.linear.end(),
            None => Some(0.),
        }
    }

    /// Total duration of content entries, or `None` if any of them is open-ended.
    pub fn content_duration(&self) -> Option<f64> {
        self.entries
            .iter()
            .filter(|e| !e.is_advertisement)
            .map(|e| e.linear.duration)
            .sum()
    }

    pub(crate) fn trimmed_concealed(&self) -> f64 {
        self.trimmed_concealed
    }

    pub(crate) fn mark_played(&mut self, entry_id: EntryId) {
        if let Some(entry) = self.find_mut(entry_id) {
            entry.played = true;
        }
    }

    fn build(&self, entry_id: EntryId, new: NewEntry, start: f64) -> PlaylistEntry {
        PlaylistEntry {
            r#type: new.r#type,
            entry_id,
            original_id: entry_id,
            linear: LinearSpan {
                start,
                duration: new.media_time.duration(),
            },
            clip_uri: new.clip_uri,
            media_time: new.media_time,
            is_advertisement: new.is_advertisement,
            delete_after_played: new.delete_after_played,
            playback_policy: new.playback_policy,
            pod_member: new.pod_member,
            played: false,
        }
    }

    fn shift_from(&mut self, index: usize, delta: f64) {
        if delta == 0. {
            return;
        }
        for entry in self.entries.iter_mut().skip(index) {
            entry.linear.start += delta;
        }
    }

    /// Places a new entry at `index`, starting at `start`, moving everything from `index` on.
    fn place(&mut self, index: usize, new: NewEntry, start: f64) -> TsumugiResult<EntryId> {
        new.media_time.validate()?;
        let duration = new.media_time.duration();
        if duration.is_none() && index < self.entries.len() {
            return Err(TsumugiError::InvalidState(
                "only the last entry may be open-ended".to_string(),
            ));
        }

        let entry_id = self.allocate_id();
        let entry = self.build(entry_id, new, start);
        self.shift_from(index, duration.unwrap_or(0.));
        self.entries.insert(index, entry);
        tracing::debug!(entry_id = %entry_id, start, ?duration, "Playlist entry inserted");
        Ok(entry_id)
    }

    /// Appends an entry at the end of the known timeline.
    pub fn push_back(&mut self, new: NewEntry) -> TsumugiResult<EntryId> {
        let Some(start) = self.timeline_end() else {
            return Err(TsumugiError::InvalidState(
                "can not append after an open-ended entry".to_string(),
            ));
        };
        self.place(self.entries.len(), new, start)
    }

    /// Inserts an entry immediately after `anchor`. Existing entries keep their ids.
    pub fn insert_after(&mut self, anchor: EntryId, new: NewEntry) -> TsumugiResult<EntryId> {
        let index = self.index_of_or_err(anchor)?;
        let Some(start) = self.entries[index].linear.end() else {
            return Err(TsumugiError::InvalidState(format!(
                "can not insert after open-ended entry {anchor}"
            )));
        };
        self.place(index + 1, new, start)
    }

    /// Inserts an entry immediately before `anchor`, taking over its start.
    pub fn insert_before(&mut self, anchor: EntryId, new: NewEntry) -> TsumugiResult<EntryId> {
        let index = self.index_of_or_err(anchor)?;
        let start = self.entries[index].linear.start;
        self.place(index, new, start)
    }

    /// Inserts an entry at a linear position.
    ///
    /// A position strictly inside a content entry splits it in two; the tail gets a fresh id and
    /// remembers the head in `original_id`. Ads are never split, the new entry follows them.
    pub fn insert_at(&mut self, linear: f64, new: NewEntry) -> TsumugiResult<EntryId> {
        if self.entries.is_empty() {
            return self.push_back(new);
        }
        if linear <= self.timeline_start() + TIME_EPSILON {
            return self.place(0, new, self.timeline_start());
        }
        let Some(index) = self.entries.iter().position(|e| e.linear.contains(linear)) else {
            return self.push_back(new);
        };

        let current = &self.entries[index];
        if (linear - current.linear.start).abs() <= TIME_EPSILON {
            let start = current.linear.start;
            return self.place(index, new, start);
        }
        if current.is_advertisement {
            let Some(start) = current.linear.end() else {
                return Err(TsumugiError::InvalidState(
                    "can not insert after an open-ended advertisement".to_string(),
                ));
            };
            return self.place(index + 1, new, start);
        }
        if let Some(end) = current.linear.end() {
            if (end - linear).abs() <= TIME_EPSILON {
                return self.place(index + 1, new, end);
            }
        }

        // split the content entry around the insertion point
        new.media_time.validate()?;
        let Some(inserted_duration) = new.media_time.duration() else {
            return Err(TsumugiError::InvalidState(
                "can not split an entry around an open-ended entry".to_string(),
            ));
        };
        let offset = linear - current.linear.start;
        let mut tail = current.clone();

        let head = &mut self.entries[index];
        let head_id = head.entry_id;
        head.linear.duration = Some(offset);
        head.media_time.clip_end = Some(head.media_time.clip_begin + offset);

        let entry_id = self.allocate_id();
        let inserted = self.build(entry_id, new, linear);

        tail.entry_id = self.allocate_id();
        tail.linear.start = linear + inserted_duration;
        tail.linear.duration = tail.linear.duration.map(|d| d - offset);
        tail.media_time.clip_begin += offset;

        tracing::debug!(
            head = %head_id,
            tail = %tail.entry_id,
            entry_id = %entry_id,
            at = linear,
            "Playlist entry split for insertion"
        );

        self.shift_from(index + 1, inserted_duration);
        self.entries.insert(index + 1, inserted);
        self.entries.insert(index + 2, tail);
        Ok(entry_id)
    }

    /// Removes an entry, closing the gap it leaves behind.
    pub fn remove(&mut self, entry_id: EntryId) -> TsumugiResult<PlaylistEntry> {
        let index = self.index_of_or_err(entry_id)?;
        let entry = self.entries.remove(index);
        if let Some(duration) = entry.linear.duration {
            self.shift_from(index, -duration);
        }
        tracing::debug!(entry_id = %entry_id, "Playlist entry removed");
        Ok(entry)
    }

    /// Swaps the media of an entry, moving followers if its duration changes.
    pub(crate) fn replace_clip(
        &mut self,
        entry_id: EntryId,
        clip_uri: url::Url,
        media_time: MediaWindow,
    ) -> TsumugiResult<()> {
        media_time.validate()?;
        let index = self.index_of_or_err(entry_id)?;
        let entry = &mut self.entries[index];
        let delta = match (media_time.duration(), entry.linear.duration) {
            (Some(new), Some(old)) => new - old,
            _ => {
                return Err(TsumugiError::InvalidState(format!(
                    "can not replace the media of open-ended entry {entry_id}"
                )))
            }
        };
        entry.clip_uri = clip_uri;
        entry.media_time = media_time;
        entry.linear.duration = media_time.duration();
        self.shift_from(index + 1, delta);
        Ok(())
    }

    /// Drops entries that end at or before `linear`. Later entries keep their position.
    pub fn remove_entries_before(&mut self, linear: f64) -> Vec<EntryId> {
        let mut removed = Vec::new();
        while let Some(first) = self.entries.first() {
            match first.linear.end() {
                Some(end) if end <= linear + TIME_EPSILON => {
                    if first.is_concealed() {
                        self.trimmed_concealed += end - first.linear.start;
                    }
                    removed.push(first.entry_id);
                    self.entries.remove(0);
                }
                _ => break,
            }
        }
        removed
    }

    /// Drops entries starting at or after `linear` and closes an open-ended entry at `linear`.
    pub fn remove_entries_after(&mut self, linear: f64) -> Vec<EntryId> {
        let mut removed = Vec::new();
        while let Some(last) = self.entries.last() {
            if last.linear.start + TIME_EPSILON >= linear && self.entries.len() > 1 {
                removed.push(last.entry_id);
                self.entries.pop();
            } else {
                break;
            }
        }

        if let Some(last) = self.entries.last_mut() {
            if last.linear.duration.is_none() && last.linear.start < linear {
                let duration = linear - last.linear.start;
                last.linear.duration = Some(duration);
                last.media_time.clip_end = Some(last.media_time.clip_begin + duration);
                tracing::debug!(entry_id = %last.entry_id, duration, "Open-ended entry resolved");
            }
        }
        removed
    }
}

impl Default for Playlist {
    fn default() -> Self {
        Self::new()
    }
}
