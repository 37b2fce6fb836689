//! `longpoll config` – show config path and effective values.

use anyhow::Result;
use longpoll_core::config::{self, PollConfig};

pub fn run_show_config(cfg: &PollConfig) -> Result<()> {
    println!("# {}", config::config_path()?.display());
    print!("{}", toml::to_string_pretty(cfg)?);
    if let Err(e) = cfg.validate() {
        println!("# warning: {}", e);
    }
    Ok(())
}
