//! `longpoll poll` – run one polling session and print the result.

use anyhow::{Context, Result};
use longpoll_core::config::PollConfig;
use longpoll_core::engine::PollingEngine;
use longpoll_core::state::{PollState, PollStatus};
use longpoll_core::transport::CurlTransport;

use crate::cli::PollArgs;

fn print_state(state: &PollState) {
    println!(
        "  {:>9}  {:>6}  {:>7}  {:>10}  {}",
        "Status", "Polls", "Retries", "Time(ms)", "Detail"
    );
    println!(
        "  {}  {}  {}  {}  {}",
        "---------", "------", "-------", "----------", "------"
    );
    println!(
        "  {:>9}  {:>6}  {:>7}  {:>10}  {}",
        state.status,
        state.poll_count,
        state.retry_count,
        state.elapsed_ms,
        state.error_detail.as_deref().unwrap_or("-")
    );
    if let Some(body) = &state.last_response {
        println!("Last response: {}", body);
    }
}

pub async fn run_poll(mut cfg: PollConfig, args: &PollArgs) -> Result<i32> {
    args.apply(&mut cfg)?;
    cfg.validate()?;
    tracing::info!("polling {}", cfg.url);

    let state = tokio::task::spawn_blocking(move || {
        let transport = CurlTransport::from_config(&cfg);
        PollingEngine::new(cfg, transport).run()
    })
    .await
    .context("poll task join")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        print_state(&state);
    }
    Ok(if state.status == PollStatus::Complete { 0 } else { 2 })
}
