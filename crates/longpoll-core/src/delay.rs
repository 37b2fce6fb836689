//! Inter-poll delay strategies.
//!
//! The engine asks a [`DelayStrategy`] how long to wait after every pending
//! response. Strategies are pure: they only look at the current run state and
//! the configuration, so callers can swap in their own schedule without
//! touching the polling loop.

use crate::config::{PollConfig, WindowConfig};
use crate::state::PollState;
use std::time::Duration;

/// Maps the current run state and configuration to a wait duration.
pub trait DelayStrategy: Send + Sync {
    fn delay(&self, state: &PollState, config: &PollConfig) -> Duration;
}

impl<F> DelayStrategy for F
where
    F: Fn(&PollState, &PollConfig) -> Duration + Send + Sync,
{
    fn delay(&self, state: &PollState, config: &PollConfig) -> Duration {
        self(state, config)
    }
}

/// Constant interval, or `interval * base^poll_count` when `exp_backoff` is set.
///
/// The exponent is the run-wide poll count, so backoff keeps growing across
/// retry cycles.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDelay;

impl DelayStrategy for DefaultDelay {
    fn delay(&self, state: &PollState, config: &PollConfig) -> Duration {
        let interval = config.poll_interval();
        match config.exp_backoff {
            None => interval,
            Some(base) => {
                let exp = i32::try_from(state.poll_count).unwrap_or(i32::MAX);
                let ms = config.poll_interval_ms as f64 * base.powi(exp);
                if ms.is_nan() || ms <= 0.0 {
                    Duration::ZERO
                } else if ms >= u64::MAX as f64 {
                    Duration::MAX
                } else {
                    Duration::from_millis(ms.round() as u64)
                }
            }
        }
    }
}

/// Fixed interval inside numbered windows, with a long gap when crossing into the next window.
///
/// After `polls_per_window` pending polls the next delay is
/// `start[i] - start[i-1] - interval * (polls_per_window - 1)`, which lands the
/// next poll at the start of window `i`.
#[derive(Debug, Clone)]
pub struct WindowedDelay {
    pub window_starts: Vec<Duration>,
    pub polls_per_window: u32,
}

impl WindowedDelay {
    pub fn from_config(w: &WindowConfig) -> Self {
        Self {
            window_starts: w
                .window_starts_ms
                .iter()
                .map(|&ms| Duration::from_millis(ms))
                .collect(),
            polls_per_window: w.polls_per_window,
        }
    }
}

impl DelayStrategy for WindowedDelay {
    fn delay(&self, state: &PollState, config: &PollConfig) -> Duration {
        let interval = config.poll_interval();
        if self.polls_per_window == 0 {
            return interval;
        }
        let n = state.poll_count;
        let idx = (n / self.polls_per_window) as usize;
        if n % self.polls_per_window == 0 && idx > 0 && idx < self.window_starts.len() {
            let gap = self.window_starts[idx].saturating_sub(self.window_starts[idx - 1]);
            return gap.saturating_sub(interval.saturating_mul(self.polls_per_window - 1));
        }
        interval
    }
}

/// Strategy selected by the configuration: windowed when `[windows]` is present.
pub fn strategy_for(config: &PollConfig) -> Box<dyn DelayStrategy> {
    match &config.windows {
        Some(w) => Box::new(WindowedDelay::from_config(w)),
        None => Box::new(DefaultDelay),
    }
}
