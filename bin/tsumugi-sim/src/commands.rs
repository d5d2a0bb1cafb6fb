use clap::Subcommand;
use clap_handler::Handler;

mod simulate;
mod timeline;

#[derive(Subcommand, Clone, Handler)]
pub enum SimCommand {
    Simulate(simulate::SimulateCommand),
    Timeline(timeline::TimelineCommand),
}
