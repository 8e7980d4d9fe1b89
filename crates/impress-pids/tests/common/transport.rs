//! Scripted deposit transport

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use impress_pids::{DepositTransport, HttpError, HttpResponse, MultipartForm};

type Reply = Result<HttpResponse, HttpError>;

pub const SUCCESS_BODY: &str = "<html><body><h2>SUCCESS</h2><p>Your batch submission was successfully received.</p></body></html>";

/// Answers queued replies first, then the fallback; records every request.
pub struct ScriptedTransport {
    queued: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    sent: Mutex<Vec<(String, MultipartForm)>>,
}

impl ScriptedTransport {
    pub fn new(fallback: Reply) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            fallback,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn success() -> Self {
        Self::new(Ok(HttpResponse::new(200, SUCCESS_BODY)))
    }

    pub fn respond(status: u16, body: &str) -> Self {
        Self::new(Ok(HttpResponse::new(status, body)))
    }

    pub fn fail(error: HttpError) -> Self {
        Self::new(Err(error))
    }

    /// Queue a one-off reply ahead of the fallback
    pub fn then(&self, reply: Reply) -> &Self {
        self.queued.lock().unwrap().push_back(reply);
        self
    }

    pub fn sent(&self) -> Vec<(String, MultipartForm)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// The deposit document of the last request
    pub fn last_document(&self) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .last()
            .and_then(|(_, form)| form.file_part("fname").cloned())
            .map(|part| String::from_utf8_lossy(&part.content).into_owned())
    }
}

impl DepositTransport for ScriptedTransport {
    fn post_multipart(
        &self,
        url: &str,
        form: &MultipartForm,
        _timeout: Duration,
    ) -> Result<HttpResponse, HttpError> {
        self.sent
            .lock()
            .unwrap()
            .push((url.to_string(), form.clone()));
        self.queued
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}
