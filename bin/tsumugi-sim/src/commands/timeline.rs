use std::path::PathBuf;

use clap::Parser;
use clap_handler::handler;
use tsumugi::{time::linear_to_seekbar, Sequencer};

use crate::plan::Plan;

#[derive(Parser, Clone, Debug)]
#[clap(name = "timeline", visible_alias = "tl")]
/// Schedule a plan and print the resulting timeline
pub struct TimelineCommand {
    /// Session plan in TOML
    plan: PathBuf,
}

pub(crate) fn print_timeline(sequencer: &Sequencer) {
    let playlist = sequencer.playlist();
    let dvr = sequencer.dvr_window();

    println!(
        "{:>6} {:>6} {:>10} {:>10} {:>10}  {:<3} uri",
        "entry", "from", "start", "end", "seekbar", "ad"
    );
    for entry in playlist.iter() {
        let end = entry
            .linear
            .end()
            .map(|end| format!("{end:.3}"))
            .unwrap_or_else(|| "live".to_string());
        let seekbar = linear_to_seekbar(entry.linear.start, playlist, dvr);
        println!(
            "{:>6} {:>6} {:>10.3} {:>10} {:>10.3}  {:<3} {}",
            entry.entry_id.to_string(),
            entry.original_id.to_string(),
            entry.linear.start,
            end,
            seekbar.position,
            if entry.is_advertisement { "yes" } else { "" },
            entry.clip_uri
        );
    }
}

#[handler(TimelineCommand)]
pub async fn timeline(me: TimelineCommand) -> anyhow::Result<()> {
    let plan = Plan::load(&me.plan)?;
    let base = me.plan.parent().map(PathBuf::from).unwrap_or_default();
    let sequencer = plan.schedule(&base).await?;
    print_timeline(&sequencer);
    Ok(())
}
