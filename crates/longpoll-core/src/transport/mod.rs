//! One bounded-time status request per poll, classified as pending, complete or error.
//!
//! The [`Transport`] trait is the seam the polling engine talks to. The
//! production implementation is [`CurlTransport`]; tests substitute scripted
//! transports.

mod cancel;
mod classify;
mod error;
mod http;

pub use self::cancel::{CancelToken, TimeoutGuard};
pub use self::classify::{classify, Classifier, ResultField};
pub use self::error::RequestError;
pub use self::http::CurlTransport;

use crate::config::RequestOptions;
use std::time::Duration;

/// Classified result of one status request.
#[derive(Debug)]
pub enum Outcome {
    /// The awaited operation is still in progress.
    Pending { body: String },
    /// The endpoint reported completion.
    Complete { body: String },
    /// The request failed or the body marked itself as errored.
    Error(RequestError),
}

impl Outcome {
    /// Raw response body, when one was received and parsed.
    pub fn body(&self) -> Option<&str> {
        match self {
            Outcome::Pending { body } | Outcome::Complete { body } => Some(body.as_str()),
            Outcome::Error(RequestError::MarkedError { body }) => Some(body.as_str()),
            Outcome::Error(_) => None,
        }
    }
}

/// Performs one request and classifies it.
///
/// Implementations must return within roughly `timeout` and report expiry as
/// [`RequestError::Timeout`]. Failures are reported as `Outcome::Error`, never panics.
pub trait Transport {
    fn request(
        &mut self,
        url: &str,
        options: &RequestOptions,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Outcome;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn request(
        &mut self,
        url: &str,
        options: &RequestOptions,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Outcome {
        (**self).request(url, options, timeout, cancel)
    }
}
