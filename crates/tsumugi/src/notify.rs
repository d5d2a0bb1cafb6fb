use tokio::sync::mpsc;

use crate::{time::SeekbarTime, EntryId, TsumugiError};

/// Notifications published to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    SeekbarTimeUpdated {
        seekbar_time: SeekbarTime,
        /// The position was clamped, the host should stop advancing it.
        range_exceeded: bool,
    },
    PlaylistEntryChanged {
        current_entry: EntryId,
        next_entry: Option<EntryId>,
        /// Linear position playback resumes from.
        current_playback_time: f64,
    },
    /// A fatal error. Published once per session.
    SequencerError {
        entry_id: EntryId,
        error: TsumugiError,
    },
    SequencerReady,
}

type Callback = Box<dyn Fn(&Notification) + Send + Sync>;

/// Receivers of one session's notifications.
#[derive(Default)]
pub struct Subscribers {
    callbacks: Vec<Callback>,
    channels: Vec<mpsc::UnboundedSender<Notification>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Opens a channel receiving every notification published from now on.
    pub fn channel(&mut self) -> mpsc::UnboundedReceiver<Notification> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.channels.push(sender);
        receiver
    }

    pub fn publish(&mut self, notification: Notification) {
        for callback in &self.callbacks {
            callback(&notification);
        }
        self.channels
            .retain(|sender| sender.send(notification.clone()).is_ok());
    }

    pub fn len(&self) -> usize {
        self.callbacks.len() + self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("callbacks", &self.callbacks.len())
            .field("channels", &self.channels.len())
            .finish()
    }
}
