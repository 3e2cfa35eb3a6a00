//! Command dispatch: bridges CLI args -> reconciliation driver -> output.

pub mod apply;
pub mod config_cmd;
pub mod inspect;
pub mod listen;
pub mod show;
pub mod topic;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::config::Config;
use crate::error::CliError;

/// Dispatch a store-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Apply(args) => apply::handle(args, cfg, global).await,
        Command::Listen(args) => listen::handle(args, cfg, global).await,
        Command::Show(args) => show::handle(&args, cfg, global),
        Command::Topic(args) => topic::handle(&args, cfg, global),
        // Inspect, Config and Completions are handled before dispatch
        Command::Inspect(_) | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
