//! Curl-backed status transport.
//!
//! Runs in the current thread; call from `spawn_blocking` if used from async code.

use super::{
    classify, CancelToken, Classifier, Outcome, RequestError, ResultField, TimeoutGuard, Transport,
};
use crate::config::{PollConfig, RequestOptions};
use std::str;
use std::time::Duration;

/// Issues each poll with a fresh curl `Easy` handle and classifies the JSON body.
pub struct CurlTransport {
    classifier: Box<dyn Classifier>,
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self::with_classifier(ResultField::default())
    }
}

impl CurlTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport using the `[classify]` section of the config.
    pub fn from_config(cfg: &PollConfig) -> Self {
        Self::with_classifier(ResultField::from_config(&cfg.classify))
    }

    pub fn with_classifier(classifier: impl Classifier + 'static) -> Self {
        Self {
            classifier: Box::new(classifier),
        }
    }
}

impl Transport for CurlTransport {
    fn request(
        &mut self,
        url: &str,
        options: &RequestOptions,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Outcome {
        let guard = TimeoutGuard::arm(cancel, timeout);
        let result = fetch(url, options, timeout, cancel);
        let timed_out = guard.disarm();

        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        if timed_out {
            // The token is tripped now, so report the timeout even if the body raced in.
            return Outcome::Error(RequestError::Timeout { timeout_ms });
        }

        match result {
            Ok(resp) => {
                if !(200..300).contains(&resp.status) {
                    return Outcome::Error(RequestError::Server {
                        status: resp.status,
                        status_text: resp.status_text,
                    });
                }
                let body = String::from_utf8_lossy(&resp.body);
                classify(&body, self.classifier.as_ref())
            }
            Err(FetchError::Setup(e)) => Outcome::Error(RequestError::Setup(e)),
            Err(FetchError::Transfer(e)) => {
                if e.is_operation_timedout() {
                    Outcome::Error(RequestError::Timeout { timeout_ms })
                } else if e.is_aborted_by_callback() && cancel.is_cancelled() {
                    Outcome::Error(RequestError::Cancelled)
                } else {
                    Outcome::Error(RequestError::Network(e))
                }
            }
        }
    }
}

struct RawResponse {
    status: u32,
    status_text: String,
    body: Vec<u8>,
}

enum FetchError {
    Setup(curl::Error),
    Transfer(curl::Error),
}

fn fetch(
    url: &str,
    options: &RequestOptions,
    timeout: Duration,
    cancel: &CancelToken,
) -> Result<RawResponse, FetchError> {
    let mut body = Vec::new();
    let mut status_line = String::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(FetchError::Setup)?;
    easy.follow_location(true).map_err(FetchError::Setup)?;
    easy.connect_timeout(timeout).map_err(FetchError::Setup)?;
    // Backstop for the timer thread; curl reports it as an operation timeout.
    easy.timeout(timeout).map_err(FetchError::Setup)?;
    easy.progress(true).map_err(FetchError::Setup)?;

    let method = options.method.trim().to_ascii_uppercase();
    match method.as_str() {
        "" | "GET" => easy.get(true),
        "HEAD" => easy.nobody(true),
        other => easy.custom_request(other),
    }
    .map_err(FetchError::Setup)?;

    let mut list = curl::easy::List::new();
    for (k, v) in &options.headers {
        list.append(&format!("{}: {}", k.trim(), v.trim()))
            .map_err(FetchError::Setup)?;
    }
    if !options.headers.is_empty() {
        easy.http_headers(list).map_err(FetchError::Setup)?;
    }

    {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                // Keep the last status line so redirects report the final response.
                if let Ok(s) = str::from_utf8(data) {
                    if s.starts_with("HTTP/") {
                        status_line = s.trim_end().to_string();
                    }
                }
                true
            })
            .map_err(FetchError::Setup)?;
        transfer
            .write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(FetchError::Setup)?;
        transfer
            .progress_function(|_, _, _, _| !cancel.is_cancelled())
            .map_err(FetchError::Setup)?;
        transfer.perform().map_err(FetchError::Transfer)?;
    }

    let status = easy.response_code().map_err(FetchError::Transfer)?;
    Ok(RawResponse {
        status,
        status_text: reason_phrase(&status_line),
        body,
    })
}

/// Reason phrase from a status line, e.g. "HTTP/1.1 404 Not Found" -> "Not Found".
/// HTTP/2 status lines carry none.
fn reason_phrase(status_line: &str) -> String {
    status_line
        .splitn(3, ' ')
        .nth(2)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}
