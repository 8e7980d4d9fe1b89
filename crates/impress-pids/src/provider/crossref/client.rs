//! Crossref deposit client

use std::sync::Arc;
use std::time::Duration;

use impress_identifiers::doi_has_prefix;

use crate::config::CrossrefConfig;
use crate::error::{PidError, Result};
use crate::http::{DepositTransport, MultipartForm};

/// How a deposit attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepositOutcome {
    /// The registry accepted the deposit
    Deposited,
    /// Worth retrying later (timeouts, connection errors, 5xx, 429)
    TransientFailure(String),
    /// Retrying the same deposit will not help
    PermanentFailure(String),
}

impl DepositOutcome {
    pub fn is_deposited(&self) -> bool {
        matches!(self, DepositOutcome::Deposited)
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, DepositOutcome::TransientFailure(_))
    }
}

impl std::fmt::Display for DepositOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DepositOutcome::Deposited => write!(f, "deposited"),
            DepositOutcome::TransientFailure(reason) => write!(f, "transient failure: {}", reason),
            DepositOutcome::PermanentFailure(reason) => write!(f, "permanent failure: {}", reason),
        }
    }
}

const BODY_EXCERPT: usize = 200;

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(BODY_EXCERPT) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}

/// Stateless per call: credentials are read from the config on each deposit.
pub struct CrossrefClient {
    config: CrossrefConfig,
    transport: Arc<dyn DepositTransport>,
}

impl CrossrefClient {
    pub fn new(config: CrossrefConfig, transport: Arc<dyn DepositTransport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &CrossrefConfig {
        &self.config
    }

    /// Whether every required setting is present. Logs the missing ones.
    pub fn check_credentials(&self) -> bool {
        let missing = self.config.missing_settings();
        if missing.is_empty() {
            return true;
        }
        tracing::warn!(
            missing = %missing.join(", "),
            "Crossref settings incomplete, skipping registry operation"
        );
        false
    }

    /// `{prefix}/{record_id}`, with `prefix` defaulting to the configured one.
    pub fn generate_doi(&self, record_id: &str, prefix: Option<&str>) -> Result<String> {
        let default_prefix = self
            .config
            .prefix
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| PidError::Configuration("Crossref DOI prefix is not configured".to_string()))?;

        let prefix = match prefix {
            None => default_prefix,
            Some(requested) if self.config.allowed_prefixes().iter().any(|p| p == requested) => requested,
            Some(requested) => {
                return Err(PidError::Configuration(format!(
                    "DOI prefix '{}' is not one of the configured Crossref prefixes",
                    requested
                )))
            }
        };

        Ok(format!("{}/{}", prefix, record_id))
    }

    /// Whether `doi` sits under one of the configured prefixes
    pub fn is_allowed_doi(&self, doi: &str) -> bool {
        doi_has_prefix(doi, &self.config.allowed_prefixes())
    }

    /// Upload a deposit document. Transport errors never escape.
    pub fn deposit(&self, xml: &str) -> DepositOutcome {
        let (Some(username), Some(password)) = (
            self.config.username.as_deref(),
            self.config.password.as_deref(),
        ) else {
            return DepositOutcome::PermanentFailure("Crossref credentials are incomplete".to_string());
        };

        let form = MultipartForm::new()
            .text("operation", "doMDUpload")
            .text("login_id", username)
            .text("login_passwd", password)
            .file("fname", "crossref_deposit.xml", "application/xml", xml.as_bytes().to_vec());

        let endpoint = self.config.deposit_endpoint();
        let timeout = Duration::from_secs(self.config.timeout_secs);

        let outcome = match self
            .transport
            .post_multipart(endpoint, &form, timeout)
            .and_then(|response| response.error_for_status())
        {
            Ok(response) if response.body.contains("SUCCESS") => DepositOutcome::Deposited,
            Ok(response) => DepositOutcome::PermanentFailure(format!(
                "deposit rejected: {}",
                excerpt(&response.body)
            )),
            Err(e) if e.is_transient() => DepositOutcome::TransientFailure(e.to_string()),
            Err(e) => DepositOutcome::PermanentFailure(e.to_string()),
        };

        tracing::debug!(endpoint, %outcome, "Crossref deposit finished");
        outcome
    }
}
