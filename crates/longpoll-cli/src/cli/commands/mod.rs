//! CLI command handlers. Each command is in its own file.

mod config;
mod poll;
mod sim_reset;

pub use config::run_show_config;
pub use poll::run_poll;
pub use sim_reset::run_sim_reset;
