//! CLI for the longpoll status-endpoint polling client.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use longpoll_core::config::{self, PollConfig, WindowConfig};
use longpoll_core::logging;
use std::path::PathBuf;

use commands::{run_poll, run_show_config, run_sim_reset};

/// Top-level CLI for longpoll.
#[derive(Debug, Parser)]
#[command(name = "longpoll")]
#[command(about = "longpoll: poll a status endpoint until it completes", long_about = None)]
pub struct Cli {
    /// Write logs here instead of the XDG state directory.
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Poll the status endpoint until it completes, errors, or the budget runs out.
    Poll(PollArgs),

    /// Show the config file path and the effective configuration.
    Config,

    /// Reset the simulation server (manual testing).
    SimReset {
        /// Seconds until the simulated job completes.
        #[arg(long)]
        sim_time: u64,
        /// Probability that a status response is marked as error.
        #[arg(long)]
        err_rate: Option<f64>,
        /// Server-side delay per status request, in milliseconds.
        #[arg(long, value_name = "MS")]
        server_wait: Option<u64>,
        /// Base URL of the simulation server.
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        base: String,
    },
}

/// Overrides for the loaded config; unset flags keep the file values.
#[derive(Debug, Args)]
pub struct PollArgs {
    /// Status endpoint URL.
    #[arg(long)]
    pub url: Option<String>,
    /// Base delay between pending polls.
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,
    /// Maximum polls per retry cycle.
    #[arg(long, value_name = "N")]
    pub max_polls: Option<u32>,
    /// Maximum retry counter (0 = a single cycle).
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,
    /// Delay before each retry cycle.
    #[arg(long, value_name = "MS")]
    pub initial_delay_ms: Option<u64>,
    /// Exponential backoff base.
    #[arg(long, value_name = "BASE")]
    pub exp_backoff: Option<f64>,
    /// Per-request timeout.
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,
    /// HTTP method for status requests.
    #[arg(long)]
    pub method: Option<String>,
    /// Extra request header, "Name: value". Repeatable.
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    pub headers: Vec<String>,
    /// Window start offset for a windowed schedule. Repeatable.
    #[arg(long = "window-start", value_name = "MS")]
    pub window_starts: Vec<u64>,
    /// Polls per window; required with --window-start.
    #[arg(long, value_name = "N", requires = "window_starts")]
    pub polls_per_window: Option<u32>,
    /// Print the result as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

impl PollArgs {
    /// Applies the flags on top of `cfg`.
    pub fn apply(&self, cfg: &mut PollConfig) -> Result<()> {
        if let Some(url) = &self.url {
            cfg.url = url.clone();
        }
        if let Some(v) = self.interval_ms {
            cfg.poll_interval_ms = v;
        }
        if let Some(v) = self.max_polls {
            cfg.max_polls = v;
        }
        if let Some(v) = self.max_retries {
            cfg.max_retries = v;
        }
        if let Some(v) = self.initial_delay_ms {
            cfg.initial_delay_ms = v;
        }
        if let Some(v) = self.exp_backoff {
            cfg.exp_backoff = Some(v);
        }
        if let Some(v) = self.timeout_ms {
            cfg.timeout_ms = v;
        }
        if let Some(m) = &self.method {
            cfg.request.method = m.clone();
        }
        for h in &self.headers {
            let (name, value) = h.split_once(':').ok_or_else(|| {
                anyhow::anyhow!("invalid header {:?} (expected \"Name: value\")", h)
            })?;
            cfg.request
                .headers
                .insert(name.trim().to_string(), value.trim().to_string());
        }
        if !self.window_starts.is_empty() {
            let polls_per_window = self
                .polls_per_window
                .ok_or_else(|| anyhow::anyhow!("--window-start needs --polls-per-window"))?;
            cfg.windows = Some(WindowConfig {
                window_starts_ms: self.window_starts.clone(),
                polls_per_window,
            });
        }
        Ok(())
    }
}

/// File logging at `path` or the XDG default; falls back to stderr if the file is unusable.
fn init_logging(path: Option<&std::path::Path>) {
    let res = match path {
        Some(p) => logging::init_logging_at(p),
        None => logging::init_logging(),
    };
    if let Err(err) = res {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable: {:#}", err);
    }
}

/// Loads the user config; only commands that poll or show it call this.
fn load_config() -> Result<PollConfig> {
    let cfg = config::load_or_init()?;
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

impl CliCommand {
    /// Parses arguments, sets up logging and runs the command. Returns the process exit code.
    pub async fn run_from_args() -> Result<i32> {
        let cli = Cli::parse();
        init_logging(cli.log_file.as_deref());
        cli.command.dispatch(load_config).await
    }

    /// Runs the command. `load` is only called by commands that need the user config.
    async fn dispatch<F>(self, load: F) -> Result<i32>
    where
        F: FnOnce() -> Result<PollConfig>,
    {
        match self {
            CliCommand::Poll(args) => run_poll(load()?, &args).await,
            CliCommand::Config => {
                run_show_config(&load()?)?;
                Ok(0)
            }
            CliCommand::SimReset {
                sim_time,
                err_rate,
                server_wait,
                base,
            } => {
                run_sim_reset(&base, sim_time, err_rate, server_wait).await?;
                Ok(0)
            }
        }
    }
}

#[cfg(test)]
mod tests;
