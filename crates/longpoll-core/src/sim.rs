//! Client for the simulation server's reset endpoint.
//!
//! Manual-testing support only: the polling engine never calls this.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::time::Duration;

/// Simulation parameters posted to `<base>/reset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Seconds until the simulated job completes.
    pub sim_time: u64,
    /// Probability (0.0..=1.0) that a status response is marked as error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err_rate: Option<f64>,
    /// Artificial server-side delay per status request, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_wait: Option<u64>,
}

/// URL of the reset endpoint for a server base URL.
pub fn reset_url(base: &str) -> String {
    format!("{}/reset", base.trim_end_matches('/'))
}

/// POSTs `cfg` as JSON to `<base>/reset`. Fails on transfer errors and non-2xx responses.
pub fn reset(base: &str, cfg: &SimConfig) -> Result<()> {
    let url = reset_url(base);
    let payload = serde_json::to_vec(cfg)?;
    let mut data = payload.as_slice();

    let mut easy = curl::easy::Easy::new();
    easy.url(&url).context("invalid URL")?;
    easy.post(true)?;
    easy.post_field_size(payload.len() as u64)?;
    easy.connect_timeout(Duration::from_secs(5))?;
    easy.timeout(Duration::from_secs(10))?;

    let mut list = curl::easy::List::new();
    list.append("Content-Type: application/json")?;
    easy.http_headers(list)?;

    {
        let mut transfer = easy.transfer();
        transfer.read_function(|buf| Ok(data.read(buf).unwrap_or(0)))?;
        transfer.write_function(|d| Ok(d.len()))?;
        transfer.perform().context("reset request failed")?;
    }

    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        anyhow::bail!("POST {} returned HTTP {}", url, code);
    }
    tracing::info!("simulation reset: {:?}", cfg);
    Ok(())
}
