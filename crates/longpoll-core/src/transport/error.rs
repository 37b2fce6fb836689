//! Request failure type. Its `Display` text becomes the run's `error_detail`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    /// HTTP response had a non-2xx status.
    #[error("Server Error: {status} - {status_text}")]
    Server { status: u32, status_text: String },
    /// Body parsed fine but the classifier marked it as errored.
    #[error("Response marked as error")]
    MarkedError { body: String },
    /// The per-request timer fired before a response arrived.
    #[error("Request timeout limit reached: {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    /// The run's cancel token was tripped by someone other than this request's timer.
    #[error("Request cancelled")]
    Cancelled,
    /// Curl reported a transfer error (connection refused, DNS, etc.).
    #[error("{0}")]
    Network(#[source] curl::Error),
    /// Body was not valid JSON.
    #[error("Invalid JSON body: {0}")]
    Parse(#[from] serde_json::Error),
    /// Building the request failed (bad URL, bad header, unsupported option).
    #[error("Request setup failed: {0}")]
    Setup(#[source] curl::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_error_details() {
        let e = RequestError::Server {
            status: 404,
            status_text: "Not Found".to_string(),
        };
        assert_eq!(e.to_string(), "Server Error: 404 - Not Found");
        assert_eq!(
            RequestError::Timeout { timeout_ms: 100 }.to_string(),
            "Request timeout limit reached: 100ms"
        );
        assert_eq!(
            RequestError::MarkedError {
                body: "{}".to_string()
            }
            .to_string(),
            "Response marked as error"
        );
    }

    #[test]
    fn parse_error_wraps_serde_message() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let e = RequestError::from(serde_err);
        assert!(e.to_string().starts_with("Invalid JSON body: "));
    }
}
