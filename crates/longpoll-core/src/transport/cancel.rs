//! Run-wide cancel token and the per-request timer that trips it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Shared cancellation flag. Cloning shares the flag.
///
/// One token spans a whole polling run. The transport aborts an in-flight
/// request as soon as the token is tripped.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Timer that trips a [`CancelToken`] once `timeout` elapses.
///
/// Dropping the guard disarms the timer and joins its thread, so every exit
/// path of a request clears it.
pub struct TimeoutGuard {
    disarm: Option<mpsc::Sender<()>>,
    fired: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl TimeoutGuard {
    pub fn arm(token: &CancelToken, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::channel::<()>();
        let fired = Arc::new(AtomicBool::new(false));
        let fired_in_timer = Arc::clone(&fired);
        let token = token.clone();
        let spawned = thread::Builder::new()
            .name("longpoll-timeout".to_string())
            .spawn(move || {
                if let Err(mpsc::RecvTimeoutError::Timeout) = rx.recv_timeout(timeout) {
                    fired_in_timer.store(true, Ordering::Relaxed);
                    token.cancel();
                }
            });
        let handle = match spawned {
            Ok(h) => Some(h),
            Err(e) => {
                // The transport's own timeout still bounds the request.
                tracing::warn!("could not start timeout timer: {}", e);
                None
            }
        };
        Self {
            disarm: Some(tx),
            fired,
            handle,
        }
    }

    /// True if the timer expired and tripped the token.
    pub fn fired(&self) -> bool {
        self.fired.load(Ordering::Relaxed)
    }

    /// Stops the timer and reports whether it fired.
    ///
    /// The timer thread is joined first, so a `false` result means the token
    /// was not and will not be tripped by this guard.
    pub fn disarm(mut self) -> bool {
        self.stop();
        self.fired()
    }

    fn stop(&mut self) {
        // Disconnecting the channel wakes the timer thread without firing.
        drop(self.disarm.take());
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

impl Drop for TimeoutGuard {
    fn drop(&mut self) {
        self.stop();
    }
}
