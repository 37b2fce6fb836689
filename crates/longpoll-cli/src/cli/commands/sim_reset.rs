//! `longpoll sim-reset` – reconfigure the simulation server.

use anyhow::{Context, Result};
use longpoll_core::sim::{self, SimConfig};

pub async fn run_sim_reset(
    base: &str,
    sim_time: u64,
    err_rate: Option<f64>,
    server_wait: Option<u64>,
) -> Result<()> {
    let cfg = SimConfig {
        sim_time,
        err_rate,
        server_wait,
    };
    tokio::task::spawn_blocking({
        let base = base.to_string();
        let cfg = cfg.clone();
        move || sim::reset(&base, &cfg)
    })
    .await
    .context("reset task join")??;
    println!("Simulation reset: sim_time={}s", cfg.sim_time);
    Ok(())
}
