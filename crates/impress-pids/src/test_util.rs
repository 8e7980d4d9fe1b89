//! Shared fixtures for unit tests
//!
//! Integration tests cannot reach `#[cfg(test)]` items, so `tests/common`
//! carries its own transport with queued replies. This one stays a fixed
//! reply plus a request log.

use std::sync::Mutex;
use std::time::Duration;

use crate::config::CrossrefConfig;
use crate::http::{DepositTransport, HttpError, HttpResponse, MultipartForm};

/// Transport that answers every request with the same scripted result and
/// records what was sent.
pub struct ScriptedTransport {
    reply: std::result::Result<HttpResponse, HttpError>,
    requests: Mutex<Vec<(String, MultipartForm)>>,
}

impl ScriptedTransport {
    pub fn respond(status: u16, body: &str) -> Self {
        Self {
            reply: Ok(HttpResponse::new(status, body)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn success() -> Self {
        Self::respond(200, "<html><body><h2>SUCCESS</h2></body></html>")
    }

    pub fn fail(error: HttpError) -> Self {
        Self {
            reply: Err(error),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(String, MultipartForm)> {
        self.requests.lock().unwrap().clone()
    }
}

impl DepositTransport for ScriptedTransport {
    fn post_multipart(
        &self,
        url: &str,
        form: &MultipartForm,
        _timeout: Duration,
    ) -> std::result::Result<HttpResponse, HttpError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), form.clone()));
        self.reply.clone()
    }
}

pub fn crossref_config() -> CrossrefConfig {
    CrossrefConfig {
        enabled: true,
        username: Some("account".to_string()),
        password: Some("secret".to_string()),
        depositor: Some("Impress Data Repository".to_string()),
        email: Some("pids@example.org".to_string()),
        registrant: Some("Impress".to_string()),
        prefix: Some("10.1234".to_string()),
        additional_prefixes: vec!["10.5678".to_string()],
        test_mode: true,
        landing_page_template: Some("https://repo.example.org/records/{id}".to_string()),
        ..Default::default()
    }
}
