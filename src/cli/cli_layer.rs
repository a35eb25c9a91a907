// The cli module adapts the moderation service to a command line.
// Argument parsing lives in `commands`, execution in `handlers`.

#[path = "commands.rs"]
mod commands;
#[path = "handlers.rs"]
mod handlers;

pub use commands::{Cli, Commands};
pub use handlers::{exit_code, run_command, watch_sweeps, CliContext};
