//! Retry-of-polls loop.
//!
//! A run is a sequence of retry cycles. Each cycle waits the initial delay and
//! then polls up to `max_polls` times, sleeping for the injected
//! [`DelayStrategy`] after every pending response. The first complete or error
//! outcome ends the whole run; running out of cycles while still pending is
//! reported as an error too. `run` never fails: every outcome lands in the
//! returned [`PollState`].

use crate::config::PollConfig;
use crate::delay::{self, DelayStrategy};
use crate::state::PollState;
use crate::transport::{CancelToken, Outcome, RequestError, Transport};
use std::thread;
use std::time::{Duration, Instant};

/// Detail recorded when all retry cycles end without a terminal response.
pub const MAX_POLLS_REACHED: &str = "Max polling limit reached";

pub struct PollingEngine<T> {
    config: PollConfig,
    transport: T,
    delay: Box<dyn DelayStrategy>,
}

impl<T: Transport> PollingEngine<T> {
    /// Engine with the delay strategy selected by `config` (see [`delay::strategy_for`]).
    pub fn new(config: PollConfig, transport: T) -> Self {
        let delay = delay::strategy_for(&config);
        Self {
            config,
            transport,
            delay,
        }
    }

    /// Replaces the delay strategy.
    pub fn with_delay(mut self, strategy: impl DelayStrategy + 'static) -> Self {
        self.delay = Box::new(strategy);
        self
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Polls until complete, error, or budget exhaustion, with a fresh cancel token.
    pub fn run(&mut self) -> PollState {
        self.run_with_cancel(&CancelToken::new())
    }

    /// Like [`run`](Self::run), but the caller can trip `cancel` to stop the run.
    ///
    /// The same token is handed to every request of the run; a request timeout
    /// trips it, which is fine because any error ends the run.
    pub fn run_with_cancel(&mut self, cancel: &CancelToken) -> PollState {
        let mut state = PollState::new();
        let start = Instant::now();
        let max_retries = i64::from(self.config.max_retries);
        let _span = tracing::info_span!("poll_run", url = %self.config.url).entered();

        tracing::debug!(
            url = %self.config.url,
            max_polls = self.config.max_polls,
            max_retries = self.config.max_retries,
            "polling started"
        );

        // Any terminal outcome ends the run, remaining cycles included.
        while state.retry_count < max_retries && state.is_pending() {
            state.retry_count += 1;
            sleep(self.config.initial_delay());

            let mut polls_this_cycle = 0u32;
            while polls_this_cycle < self.config.max_polls && state.is_pending() {
                if cancel.is_cancelled() {
                    state.fail(RequestError::Cancelled.to_string());
                    break;
                }
                self.poll_once(&mut state, cancel);
                polls_this_cycle += 1;
            }
        }

        if state.is_pending() {
            state.fail(MAX_POLLS_REACHED);
        }
        state.elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        match &state.error_detail {
            Some(detail) => tracing::warn!(
                url = %self.config.url,
                polls = state.poll_count,
                retries = state.retry_count,
                elapsed_ms = state.elapsed_ms,
                "polling failed: {}",
                detail
            ),
            None => tracing::info!(
                url = %self.config.url,
                polls = state.poll_count,
                retries = state.retry_count,
                elapsed_ms = state.elapsed_ms,
                "polling complete"
            ),
        }
        state
    }

    fn poll_once(&mut self, state: &mut PollState, cancel: &CancelToken) {
        let outcome = self.transport.request(
            &self.config.url,
            &self.config.request,
            self.config.timeout(),
            cancel,
        );
        if let Some(body) = outcome.body() {
            state.last_response = Some(body.to_string());
        }
        match outcome {
            Outcome::Pending { .. } => {
                state.poll_count += 1;
                let wait = self.delay.delay(state, &self.config);
                tracing::debug!(
                    poll = state.poll_count,
                    retry = state.retry_count,
                    "pending, next poll in {:?}",
                    wait
                );
                sleep(wait);
            }
            Outcome::Complete { .. } => {
                state.poll_count += 1;
                state.complete();
            }
            Outcome::Error(e) => {
                tracing::debug!(retry = state.retry_count, "request failed: {}", e);
                state.fail(e.to_string());
            }
        }
    }
}

fn sleep(d: Duration) {
    if !d.is_zero() {
        thread::sleep(d);
    }
}
