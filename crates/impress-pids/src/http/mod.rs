//! HTTP transport used by registry clients

#[cfg(feature = "native")]
pub mod native;

#[cfg(feature = "native")]
pub use native::*;

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    #[error("Request failed: {message}")]
    RequestFailed { message: String },
    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },
    #[error("Timeout")]
    Timeout,
    #[error("Rate limited")]
    RateLimited,
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Parse error: {message}")]
    ParseError { message: String },
}

impl HttpError {
    /// Whether retrying the same request later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            HttpError::RequestFailed { .. } | HttpError::Timeout | HttpError::RateLimited => true,
            HttpError::Status { status, .. } => *status >= 500,
            HttpError::InvalidUrl { .. } | HttpError::ParseError { .. } => false,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: HashMap::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into `HttpError::Status` (429 into `RateLimited`)
    pub fn error_for_status(self) -> Result<Self, HttpError> {
        match self.status {
            429 => Err(HttpError::RateLimited),
            _ if self.is_success() => Ok(self),
            status => Err(HttpError::Status {
                status,
                body: self.body,
            }),
        }
    }
}

/// A file attached to a multipart form
#[derive(Clone, Debug)]
pub struct FilePart {
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// A `multipart/form-data` body: text fields plus named file parts
#[derive(Clone, Debug, Default)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub files: Vec<(String, FilePart)>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.fields.push((name.to_string(), value.to_string()));
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, content: Vec<u8>) -> Self {
        self.files.push((
            name.to_string(),
            FilePart {
                file_name: file_name.to_string(),
                content_type: content_type.to_string(),
                content,
            },
        ));
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn file_part(&self, name: &str) -> Option<&FilePart> {
        self.files.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }
}

/// Blocking transport for registry deposits.
///
/// Returns `Ok` for every response the server produced (any status code);
/// classification is left to the caller.
pub trait DepositTransport: Send + Sync {
    fn post_multipart(
        &self,
        url: &str,
        form: &MultipartForm,
        timeout: Duration,
    ) -> Result<HttpResponse, HttpError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(HttpError::Timeout, true)]
    #[case(HttpError::RateLimited, true)]
    #[case(HttpError::RequestFailed { message: "connection refused".into() }, true)]
    #[case(HttpError::Status { status: 503, body: String::new() }, true)]
    #[case(HttpError::Status { status: 401, body: String::new() }, false)]
    #[case(HttpError::InvalidUrl { url: "::".into() }, false)]
    fn test_is_transient(#[case] error: HttpError, #[case] expected: bool) {
        assert_eq!(error.is_transient(), expected);
    }

    #[test]
    fn test_error_for_status() {
        assert!(HttpResponse::new(200, "ok").error_for_status().is_ok());
        assert_eq!(
            HttpResponse::new(429, "").error_for_status().unwrap_err(),
            HttpError::RateLimited
        );
        assert!(matches!(
            HttpResponse::new(404, "missing").error_for_status(),
            Err(HttpError::Status { status: 404, .. })
        ));
    }

    #[test]
    fn test_form_lookup() {
        let form = MultipartForm::new()
            .text("operation", "doMDUpload")
            .file("fname", "batch.xml", "application/xml", b"<doi_batch/>".to_vec());
        assert_eq!(form.field("operation"), Some("doMDUpload"));
        assert_eq!(form.field("login_id"), None);
        assert_eq!(form.file_part("fname").unwrap().file_name, "batch.xml");
    }
}
