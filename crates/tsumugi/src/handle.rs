use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use url::Url;

use crate::{
    engine::{EngineEvent, MediaEngine},
    manifest::{VastDocument, VmapDocument},
    notify::Notification,
    playlist::{AdInfo, EntryId, EntryType, MediaWindow, PlaylistEntry},
    scheduler::ScheduledBreak,
    sequencer::{PlaybackSegment, SeekbarReport},
    session::Session,
    time::DvrWindow,
    TsumugiError, TsumugiResult,
};

type Reply<T> = oneshot::Sender<TsumugiResult<T>>;

enum Command {
    Start(Reply<PlaybackSegment>),
    Event(EngineEvent, Reply<()>),
    ScheduleClip(AdInfo, f64, EntryType, Reply<EntryId>),
    ScheduleVastClip(AdInfo, Box<VastDocument>, f64, Reply<EntryId>),
    ScheduleVmap(Box<VmapDocument>, Reply<Vec<ScheduledBreak>>),
    AppendContentClip(Url, MediaWindow, Reply<EntryId>),
    CancelClip(EntryId, Reply<Option<PlaybackSegment>>),
    UpdateDvrWindow(DvrWindow, Reply<()>),
    SeekbarTime(EntryId, f64, f64, Reply<SeekbarReport>),
    Entries(Reply<Vec<PlaylistEntry>>),
    Subscribe(oneshot::Sender<mpsc::UnboundedReceiver<Notification>>),
}

/// Cloneable handle to a session running on its own task.
///
/// The task owns the session, so every call is applied in the order it was received.
/// The session task stops once every handle is dropped and returns the session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<Command>,
}

impl SessionHandle {
    pub fn spawn<E>(session: Session<E>) -> (Self, JoinHandle<Session<E>>)
    where
        E: MediaEngine + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel(32);
        let task = tokio::spawn(run(session, receiver));
        (Self { sender }, task)
    }

    async fn request<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> TsumugiResult<T> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(command(reply))
            .await
            .map_err(|_| TsumugiError::SessionClosed)?;
        response.await.map_err(|_| TsumugiError::SessionClosed)?
    }

    pub async fn start(&self) -> TsumugiResult<PlaybackSegment> {
        self.request(Command::Start).await
    }

    pub async fn handle_event(&self, event: EngineEvent) -> TsumugiResult<()> {
        self.request(|reply| Command::Event(event, reply)).await
    }

    pub async fn schedule_clip(
        &self,
        ad: AdInfo,
        at: f64,
        entry_type: EntryType,
    ) -> TsumugiResult<EntryId> {
        self.request(|reply| Command::ScheduleClip(ad, at, entry_type, reply))
            .await
    }

    pub async fn schedule_vast_clip(
        &self,
        ad: AdInfo,
        manifest: VastDocument,
        at: f64,
    ) -> TsumugiResult<EntryId> {
        self.request(|reply| Command::ScheduleVastClip(ad, Box::new(manifest), at, reply))
            .await
    }

    pub async fn schedule_vmap(&self, manifest: VmapDocument) -> TsumugiResult<Vec<ScheduledBreak>> {
        self.request(|reply| Command::ScheduleVmap(Box::new(manifest), reply))
            .await
    }

    pub async fn append_content_clip(
        &self,
        clip_uri: Url,
        media_time: MediaWindow,
    ) -> TsumugiResult<EntryId> {
        self.request(|reply| Command::AppendContentClip(clip_uri, media_time, reply))
            .await
    }

    pub async fn cancel_clip(&self, entry_id: EntryId) -> TsumugiResult<Option<PlaybackSegment>> {
        self.request(|reply| Command::CancelClip(entry_id, reply))
            .await
    }

    pub async fn update_dvr_window(&self, dvr: DvrWindow) -> TsumugiResult<()> {
        self.request(|reply| Command::UpdateDvrWindow(dvr, reply))
            .await
    }

    /// Seekbar time of a physical position inside `entry_id`.
    pub async fn seekbar_time(
        &self,
        entry_id: EntryId,
        position: f64,
        rate: f64,
    ) -> TsumugiResult<SeekbarReport> {
        self.request(|reply| Command::SeekbarTime(entry_id, position, rate, reply))
            .await
    }

    /// Snapshot of the playlist.
    pub async fn entries(&self) -> TsumugiResult<Vec<PlaylistEntry>> {
        self.request(Command::Entries).await
    }

    pub async fn subscribe(&self) -> TsumugiResult<mpsc::UnboundedReceiver<Notification>> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Command::Subscribe(reply))
            .await
            .map_err(|_| TsumugiError::SessionClosed)?;
        response.await.map_err(|_| TsumugiError::SessionClosed)
    }
}

async fn run<E>(mut session: Session<E>, mut receiver: mpsc::Receiver<Command>) -> Session<E>
where
    E: MediaEngine,
{
    while let Some(command) = receiver.recv().await {
        // a caller that stopped waiting for its reply is not an error
        match command {
            Command::Start(reply) => {
                let _ = reply.send(session.start());
            }
            Command::Event(event, reply) => {
                let _ = reply.send(session.handle(event));
            }
            Command::ScheduleClip(ad, at, entry_type, reply) => {
                let result = session.sequencer_mut().schedule_clip(ad, at, entry_type);
                let _ = reply.send(result);
            }
            Command::ScheduleVastClip(ad, manifest, at, reply) => {
                let result = session
                    .sequencer_mut()
                    .schedule_vast_clip(ad, &manifest, at);
                let _ = reply.send(result);
            }
            Command::ScheduleVmap(manifest, reply) => {
                let _ = reply.send(session.sequencer_mut().schedule_vmap(&manifest));
            }
            Command::AppendContentClip(clip_uri, media_time, reply) => {
                let result = session
                    .sequencer_mut()
                    .append_content_clip(clip_uri, media_time);
                let _ = reply.send(result);
            }
            Command::CancelClip(entry_id, reply) => {
                let _ = reply.send(session.cancel_clip(entry_id));
            }
            Command::UpdateDvrWindow(dvr, reply) => {
                let _ = reply.send(session.update_dvr_window(dvr));
            }
            Command::SeekbarTime(entry_id, position, rate, reply) => {
                let _ = reply.send(session.seekbar_time(entry_id, position, rate));
            }
            Command::Entries(reply) => {
                let entries = session.sequencer().playlist().entries().to_vec();
                let _ = reply.send(Ok(entries));
            }
            Command::Subscribe(reply) => {
                let _ = reply.send(session.subscribers_mut().channel());
            }
        }
    }

    tracing::debug!("Session handles dropped, stopping session task");
    session
}
