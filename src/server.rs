//! HTTP API
//!
//! Routes:
//! - `GET  /api/wallpaper?token=<token>` and `GET /api/wallpaper/<token>`: PNG
//! - `POST /api/wallpaper/token`: settings JSON in, `{"data":{"token":...}}` out
//! - `GET  /api/devices`, `GET /api/themes`, `GET /api/countries`, `GET /health`
//!
//! Errors always use the `{"error":{"message":...,"code":...}}` envelope.
//! Requests are independent; workers share only the immutable [`Engine`].

use crate::codec;
use crate::country::COUNTRIES;
use crate::runtime::Engine;
use crate::settings::parse_settings_json;
use crate::theme::theme_catalog;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::io::{self, Read};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::time::Instant;
use tiny_http::{Header, Request, Response};

/// Largest accepted request body
pub const MAX_BODY_BYTES: u64 = 64 * 1024;

/// A response before it is handed to the HTTP layer
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    fn json(status: u16, value: serde_json::Value) -> Self {
        Self {
            status,
            headers: vec![("Content-Type", "application/json".to_string())],
            body: value.to_string().into_bytes(),
        }
    }

    fn data(value: serde_json::Value) -> Self {
        Self::json(200, json!({ "data": value }))
    }

    fn error(status: u16, message: &str, code: &str) -> Self {
        Self::json(status, json!({ "error": { "message": message, "code": code } }))
    }

    fn png(bytes: Vec<u8>, filename: &str) -> Self {
        Self {
            status: 200,
            headers: vec![
                ("Content-Type", "image/png".to_string()),
                ("Content-Disposition", format!("inline; filename=\"{}\"", filename)),
                ("Cache-Control", "no-cache, no-store, must-revalidate".to_string()),
            ],
            body: bytes,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Shared, read-only state behind every worker
#[derive(Debug)]
pub struct AppState {
    pub engine: Engine,
    pub download_name: String,
}

/// Dispatch one request. `url` is the request target (path plus query).
pub fn route(state: &AppState, method: &str, url: &str, body: &[u8], now: DateTime<Utc>) -> ApiResponse {
    let parsed = match url::Url::parse(&format!("http://localhost{}", url)) {
        Ok(parsed) => parsed,
        Err(_) => return ApiResponse::error(400, "Malformed request URL", "BAD_REQUEST"),
    };
    let path = parsed.path().trim_end_matches('/');

    match path {
        "/api/wallpaper" => {
            if method != "GET" {
                return method_not_allowed();
            }
            let token = parsed
                .query_pairs()
                .find(|(key, _)| key == "token")
                .map(|(_, value)| value.into_owned());
            match token {
                Some(token) if !token.is_empty() => wallpaper(state, &token, now),
                _ => ApiResponse::error(400, "Missing token", "MISSING_TOKEN"),
            }
        }
        "/api/wallpaper/token" => {
            if method != "POST" {
                return method_not_allowed();
            }
            create_token(body)
        }
        "/api/devices" if method == "GET" => {
            let devices = state.engine.devices();
            ApiResponse::data(json!({
                "fallback": devices.fallback().id,
                "devices": devices.iter().collect::<Vec<_>>(),
            }))
        }
        "/api/themes" if method == "GET" => ApiResponse::data(json!(theme_catalog())),
        "/api/countries" if method == "GET" => ApiResponse::data(json!(COUNTRIES)),
        "/health" if method == "GET" => ApiResponse::data(json!({ "status": "ok" })),
        "/api/devices" | "/api/themes" | "/api/countries" | "/health" => method_not_allowed(),
        _ => match path.strip_prefix("/api/wallpaper/") {
            Some(token) if !token.contains('/') => {
                if method != "GET" {
                    return method_not_allowed();
                }
                wallpaper(state, token, now)
            }
            _ => ApiResponse::error(404, "Not found", "NOT_FOUND"),
        },
    }
}

fn method_not_allowed() -> ApiResponse {
    ApiResponse::error(405, "Method not allowed", "METHOD_NOT_ALLOWED")
}

fn wallpaper(state: &AppState, token: &str, now: DateTime<Utc>) -> ApiResponse {
    let settings = match codec::decode(token) {
        Ok(settings) => settings,
        Err(err) => {
            log::debug!("Rejected token: {}", err);
            return ApiResponse::error(400, "Invalid token", "INVALID_TOKEN");
        }
    };
    match state.engine.render_png(&settings, now) {
        Ok(png) => ApiResponse::png(png, &state.download_name),
        Err(err) => {
            log::error!("Wallpaper generation error: {}", err);
            ApiResponse::error(500, "Failed to generate wallpaper", "GENERATION_ERROR")
        }
    }
}

fn create_token(body: &[u8]) -> ApiResponse {
    let settings = std::str::from_utf8(body)
        .map_err(|e| e.to_string())
        .and_then(|text| parse_settings_json(text).map_err(|e| e.to_string()));
    match settings {
        Ok(settings) => ApiResponse::data(json!({ "token": codec::encode(&settings) })),
        Err(reason) => {
            log::debug!("Rejected settings: {}", reason);
            ApiResponse::error(400, "Invalid settings", "INVALID_SETTINGS")
        }
    }
}

/// A bound HTTP listener; call [`Server::spawn`] or [`Server::run`] to serve
pub struct Server {
    http: Arc<tiny_http::Server>,
    state: Arc<AppState>,
}

impl Server {
    pub fn bind(addr: &str, state: AppState) -> Result<Self> {
        let http = tiny_http::Server::http(addr)
            .map_err(|e| anyhow!("Failed to bind {}: {}", addr, e))?;
        Ok(Self {
            http: Arc::new(http),
            state: Arc::new(state),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.http
            .server_addr()
            .to_ip()
            .context("Server is not listening on an IP socket")
    }

    /// Start `workers` threads pulling requests off the shared listener.
    ///
    /// A worker that fails to receive stops and sends its error on the
    /// returned channel.
    pub fn spawn(&self, workers: usize) -> Receiver<io::Error> {
        let (stopped, receiver) = mpsc::channel();
        for _ in 0..workers.max(1) {
            let http = Arc::clone(&self.http);
            let state = Arc::clone(&self.state);
            let stopped = stopped.clone();
            std::thread::spawn(move || loop {
                match http.recv() {
                    Ok(request) => serve(&state, request),
                    Err(err) => {
                        log::error!("Failed to receive request: {}", err);
                        let _ = stopped.send(err);
                        break;
                    }
                }
            });
        }
        receiver
    }

    /// Serve until a worker stops, then return the error that stopped it
    pub fn run(self, workers: usize) -> Result<()> {
        let addr = self.local_addr()?;
        log::info!("Listening on http://{} with {} workers", addr, workers.max(1));
        match self.spawn(workers).recv() {
            Ok(err) => Err(anyhow::Error::new(err).context("Request worker stopped")),
            Err(_) => Err(anyhow!("All request workers exited")),
        }
    }
}

fn serve(state: &AppState, mut request: Request) {
    let started = Instant::now();
    let method = request.method().as_str().to_string();
    let url = request.url().to_string();

    let mut body = Vec::new();
    let read = request
        .as_reader()
        .take(MAX_BODY_BYTES + 1)
        .read_to_end(&mut body);
    let response = match read {
        Err(err) => {
            log::warn!("Failed to read request body: {}", err);
            ApiResponse::error(400, "Unreadable request body", "BAD_REQUEST")
        }
        Ok(_) if body.len() as u64 > MAX_BODY_BYTES => {
            ApiResponse::error(413, "Request body too large", "PAYLOAD_TOO_LARGE")
        }
        Ok(_) => route(state, &method, &url, &body, Utc::now()),
    };

    log::info!(
        "{} {} -> {} in {:?}",
        method,
        url.split('?').next().unwrap_or(""),
        response.status,
        started.elapsed()
    );

    let status = response.status;
    let mut http_response = Response::from_data(response.body).with_status_code(status);
    for (name, value) in &response.headers {
        if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            http_response.add_header(header);
        }
    }
    if let Err(err) = request.respond(http_response) {
        log::warn!("Failed to send response: {}", err);
    }
}
