use std::path::PathBuf;

use clap::Parser;
use clap_handler::handler;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tsumugi::{EngineCommand, Notification, Session, SessionHandle};

use super::timeline::print_timeline;
use crate::plan::Plan;

#[derive(Parser, Clone, Debug)]
#[clap(name = "simulate", visible_alias = "sim")]
/// Replay the scripted media engine events of a plan
pub struct SimulateCommand {
    /// Session plan in TOML
    plan: PathBuf,

    /// Stop at the first rejected event
    #[clap(long)]
    strict: bool,
}

struct Output {
    commands: UnboundedReceiver<EngineCommand>,
    notifications: UnboundedReceiver<Notification>,
}

impl Output {
    /// Prints what the session produced so far.
    ///
    /// The session answers a request only after dispatching its actions, so everything caused by
    /// the last request is already queued.
    fn flush(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            println!("  engine  {command:?}");
        }
        while let Ok(notification) = self.notifications.try_recv() {
            println!("  notify  {notification:?}");
        }
    }
}

#[handler(SimulateCommand)]
pub async fn simulate(me: SimulateCommand) -> anyhow::Result<()> {
    let plan = Plan::load(&me.plan)?;
    let base = me.plan.parent().map(PathBuf::from).unwrap_or_default();
    let sequencer = plan.schedule(&base).await?;

    let (engine, commands) = mpsc::unbounded_channel();
    let (handle, task) = SessionHandle::spawn(Session::new(sequencer, engine));
    let mut output = Output {
        commands,
        notifications: handle.subscribe().await?,
    };

    println!("start");
    handle.start().await?;
    output.flush();

    if let Some(dvr) = plan.dvr {
        println!("dvr     {dvr:?}");
        handle.update_dvr_window(dvr).await?;
        output.flush();
    }

    for event in plan.events {
        println!("event   {event:?}");
        let result = handle.handle_event(event).await;
        output.flush();
        match result {
            Ok(()) => {}
            Err(error) if me.strict => return Err(error.into()),
            Err(error) => tracing::warn!(%error, "Event rejected"),
        }
    }

    drop(handle);
    let session = task.await?;
    println!("phase   {:?}", session.sequencer().phase());
    print_timeline(session.sequencer());
    Ok(())
}
