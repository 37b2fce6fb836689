//! Minimal HTTP/1.1 status server for integration tests.
//!
//! `GET /status` answers `{"result":"pending"}` for the first `pending_polls`
//! requests and `{"result":<final_result>}` afterwards. `POST /reset` accepts
//! any JSON body and records it. Every other path is 404.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct StatusServerOptions {
    /// Number of status requests answered as pending before the final result.
    pub pending_polls: usize,
    /// Value of `result` once the pending phase is over.
    pub final_result: &'static str,
    /// Sleep before answering each status request.
    pub server_wait: Duration,
}

impl Default for StatusServerOptions {
    fn default() -> Self {
        Self {
            pending_polls: 0,
            final_result: "completed",
            server_wait: Duration::ZERO,
        }
    }
}

pub struct StatusServer {
    /// Base URL, e.g. "http://127.0.0.1:12345".
    pub base: String,
    status_hits: Arc<AtomicUsize>,
    resets: Arc<Mutex<Vec<String>>>,
}

impl StatusServer {
    pub fn status_url(&self) -> String {
        format!("{}/status", self.base)
    }

    pub fn status_hits(&self) -> usize {
        self.status_hits.load(Ordering::SeqCst)
    }

    pub fn reset_bodies(&self) -> Vec<String> {
        self.resets.lock().unwrap().clone()
    }
}

/// Starts a server in a background thread. The server runs until the process exits.
pub fn start(opts: StatusServerOptions) -> StatusServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let status_hits = Arc::new(AtomicUsize::new(0));
    let resets = Arc::new(Mutex::new(Vec::new()));
    let server = StatusServer {
        base: format!("http://127.0.0.1:{}", port),
        status_hits: Arc::clone(&status_hits),
        resets: Arc::clone(&resets),
    };
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let opts = opts.clone();
            let hits = Arc::clone(&status_hits);
            let resets = Arc::clone(&resets);
            thread::spawn(move || handle(stream, &opts, &hits, &resets));
        }
    });
    server
}

fn handle(
    mut stream: TcpStream,
    opts: &StatusServerOptions,
    hits: &AtomicUsize,
    resets: &Mutex<Vec<String>>,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let Some((method, path, body)) = read_request(&mut stream) else {
        return;
    };
    match (method.as_str(), path.as_str()) {
        ("GET", "/status") => {
            if !opts.server_wait.is_zero() {
                thread::sleep(opts.server_wait);
            }
            let n = hits.fetch_add(1, Ordering::SeqCst);
            let result = if n < opts.pending_polls {
                "pending"
            } else {
                opts.final_result
            };
            let json = format!(r#"{{"result":"{}"}}"#, result);
            respond(&mut stream, "200 OK", &json);
        }
        ("POST", "/reset") => {
            resets.lock().unwrap().push(body);
            respond(
                &mut stream,
                "200 OK",
                r#"{"message":"Fields updated successfully"}"#,
            );
        }
        _ => respond(&mut stream, "404 Not Found", "404 page not found"),
    }
}

fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}

/// Reads the request head and a Content-Length body. Returns (method, path, body).
fn read_request(stream: &mut TcpStream) -> Option<(String, String, String)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let content_length = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < head_end + content_length {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let end = (head_end + content_length).min(buf.len());
    let body = String::from_utf8_lossy(&buf[head_end..end]).to_string();
    Some((method, path, body))
}
