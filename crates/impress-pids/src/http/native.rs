//! Native HTTP transport using reqwest's blocking client
//!
//! Must not be called from inside an async runtime; wrap calls in
//! `spawn_blocking` there.

use std::time::Duration;

use reqwest::blocking::{multipart, Client};

use super::{DepositTransport, HttpError, HttpResponse, MultipartForm};

pub struct HttpClient {
    client: Client,
    user_agent: String,
}

impl HttpClient {
    pub fn new(user_agent: &str) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| HttpError::RequestFailed {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
        })
    }

    fn build_form(form: &MultipartForm) -> Result<multipart::Form, HttpError> {
        let mut body = multipart::Form::new();
        for (name, value) in &form.fields {
            body = body.text(name.clone(), value.clone());
        }
        for (name, file) in &form.files {
            let part = multipart::Part::bytes(file.content.clone())
                .file_name(file.file_name.clone())
                .mime_str(&file.content_type)
                .map_err(|e| HttpError::RequestFailed {
                    message: e.to_string(),
                })?;
            body = body.part(name.clone(), part);
        }
        Ok(body)
    }
}

fn request_error(e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        HttpError::Timeout
    } else {
        HttpError::RequestFailed {
            message: e.to_string(),
        }
    }
}

impl DepositTransport for HttpClient {
    fn post_multipart(
        &self,
        url: &str,
        form: &MultipartForm,
        timeout: Duration,
    ) -> Result<HttpResponse, HttpError> {
        let url = reqwest::Url::parse(url).map_err(|_| HttpError::InvalidUrl {
            url: url.to_string(),
        })?;

        let response = self
            .client
            .post(url)
            .header("User-Agent", &self.user_agent)
            .timeout(timeout)
            .multipart(Self::build_form(form)?)
            .send()
            .map_err(request_error)?;

        let status = response.status().as_u16();

        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();

        let body = response.text().map_err(|e| HttpError::ParseError {
            message: e.to_string(),
        })?;

        Ok(HttpResponse {
            status,
            body,
            headers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_is_rejected_before_sending() {
        let client = HttpClient::new("impress-pids/test").unwrap();
        let err = client
            .post_multipart("not a url", &MultipartForm::new(), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, HttpError::InvalidUrl { .. }));
    }

    #[test]
    fn test_build_form_rejects_bad_mime() {
        let form = MultipartForm::new().file("fname", "a.xml", "not a mime", Vec::new());
        assert!(HttpClient::build_form(&form).is_err());
    }
}
