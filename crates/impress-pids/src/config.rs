//! Configuration for the PID subsystem
//!
//! Built once at startup and passed explicitly to the registry and providers.
//! Loaded from TOML (or JSON) with the following structure:
//!
//! ```toml
//! required_schemes = ["doi"]
//!
//! [schemes.doi]
//! label = "DOI"
//! syntax = "doi"
//! default = "crossref"
//!
//! [[schemes.doi.providers]]
//! name = "crossref"
//! kind = "crossref"
//!
//! [[schemes.doi.providers]]
//! name = "external"
//! kind = "external"
//! blocked_prefixes = ["10.1234"]
//!
//! [schemes.oai]
//! label = "OAI"
//! syntax = "oai"
//! required = true
//! default = "oai"
//!
//! [[schemes.oai.providers]]
//! name = "oai"
//! kind = "oai"
//!
//! [crossref]
//! enabled = true
//! username = "account"
//! password = "secret"
//! depositor = "Impress Data Repository"
//! email = "pids@example.org"
//! registrant = "Impress"
//! prefix = "10.1234"
//! additional_prefixes = ["10.5678"]
//! landing_page_template = "https://repo.example.org/records/{id}"
//!
//! [oai]
//! id_prefix = "repo.example.org"
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use impress_identifiers::{is_valid_doi_prefix, is_valid_oai_repository, IdentifierSyntax};
use serde::{Deserialize, Serialize};

/// Crossref deposit endpoint
pub const CROSSREF_DEPOSIT_URL: &str = "https://doi.crossref.org/servlet/deposit";
/// Crossref test-system deposit endpoint
pub const CROSSREF_TEST_DEPOSIT_URL: &str = "https://test.crossref.org/servlet/deposit";

/// Complete PID configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PidsConfig {
    /// Schemes every record must carry
    #[serde(default)]
    pub required_schemes: Vec<String>,
    /// Per-scheme provider tables
    #[serde(default)]
    pub schemes: BTreeMap<String, SchemeConfig>,
    /// Crossref account settings
    #[serde(default)]
    pub crossref: CrossrefConfig,
    /// OAI identifier settings
    #[serde(default)]
    pub oai: OaiConfig,
}

/// Configuration of one PID scheme
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemeConfig {
    /// Human-readable label used in messages ("DOI")
    pub label: String,
    /// Identifier syntax checked before providers are consulted
    #[serde(default)]
    pub syntax: IdentifierSyntax,
    /// Equivalent to listing the scheme in `required_schemes`
    #[serde(default)]
    pub required: bool,
    /// Name of the default provider
    pub default: String,
    pub providers: Vec<ProviderConfig>,
}

/// Kind of provider implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Managed DOIs deposited with Crossref
    Crossref,
    /// Unmanaged identifiers supplied by the depositor
    External,
    /// Managed local OAI identifiers
    Oai,
}

/// One provider entry of a scheme
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub kind: ProviderKind,
    /// Registration client name (defaults to the provider kind's account)
    #[serde(default)]
    pub client: Option<String>,
    /// DOI prefixes external identifiers may not use
    #[serde(default)]
    pub blocked_prefixes: Vec<String>,
}

fn default_timeout_secs() -> u64 {
    30
}

/// Crossref account configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct CrossrefConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Depositor name sent in the deposit head
    #[serde(default)]
    pub depositor: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub registrant: Option<String>,
    /// Default DOI prefix
    #[serde(default)]
    pub prefix: Option<String>,
    /// Further prefixes callers may request explicitly
    #[serde(default)]
    pub additional_prefixes: Vec<String>,
    #[serde(default)]
    pub test_mode: bool,
    /// Overrides the production/test endpoint
    #[serde(default)]
    pub deposit_url: Option<String>,
    /// Landing page URL with an `{id}` placeholder
    #[serde(default)]
    pub landing_page_template: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CrossrefConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            username: None,
            password: None,
            depositor: None,
            email: None,
            registrant: None,
            prefix: None,
            additional_prefixes: Vec::new(),
            test_mode: false,
            deposit_url: None,
            landing_page_template: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for CrossrefConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossrefConfig")
            .field("enabled", &self.enabled)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("depositor", &self.depositor)
            .field("email", &self.email)
            .field("registrant", &self.registrant)
            .field("prefix", &self.prefix)
            .field("additional_prefixes", &self.additional_prefixes)
            .field("test_mode", &self.test_mode)
            .field("deposit_url", &self.deposit_url)
            .field("landing_page_template", &self.landing_page_template)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

impl CrossrefConfig {
    /// Names of required settings that are missing or blank
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let required = [
            ("username", &self.username),
            ("password", &self.password),
            ("depositor", &self.depositor),
            ("email", &self.email),
            ("registrant", &self.registrant),
            ("prefix", &self.prefix),
        ];
        for (name, value) in required {
            if is_blank(value) {
                missing.push(name);
            }
        }
        missing
    }

    /// The default prefix followed by the additional ones
    pub fn allowed_prefixes(&self) -> Vec<String> {
        self.prefix
            .iter()
            .chain(self.additional_prefixes.iter())
            .cloned()
            .collect()
    }

    pub fn deposit_endpoint(&self) -> &str {
        match &self.deposit_url {
            Some(url) => url,
            None if self.test_mode => CROSSREF_TEST_DEPOSIT_URL,
            None => CROSSREF_DEPOSIT_URL,
        }
    }

    /// Landing page URL for a record, if a template is configured
    pub fn landing_page(&self, record_id: &str) -> Option<String> {
        self.landing_page_template
            .as_ref()
            .map(|template| template.replace("{id}", record_id))
    }
}

/// OAI identifier configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OaiConfig {
    /// Repository identifier, e.g. `repo.example.org`
    #[serde(default)]
    pub id_prefix: Option<String>,
}

impl PidsConfig {
    /// Create a new, empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a `.toml` or `.json` file and validate it
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content)?,
            _ => Self::from_toml(&content)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn scheme(&self, scheme: &str) -> Option<&SchemeConfig> {
        self.schemes.get(scheme)
    }

    /// `required_schemes` plus schemes flagged `required`, without duplicates
    pub fn effective_required_schemes(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.required_schemes
            .iter()
            .cloned()
            .chain(
                self.schemes
                    .iter()
                    .filter(|(_, s)| s.required)
                    .map(|(name, _)| name.clone()),
            )
            .filter(|scheme| seen.insert(scheme.clone()))
            .collect()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (scheme, settings) in &self.schemes {
            if settings.providers.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "scheme '{}' has no providers",
                    scheme
                )));
            }

            let mut names = HashSet::new();
            for provider in &settings.providers {
                if !names.insert(provider.name.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "duplicate provider '{}' in scheme '{}'",
                        provider.name, scheme
                    )));
                }
                if let Some(prefix) = provider
                    .blocked_prefixes
                    .iter()
                    .find(|p| !is_valid_doi_prefix(p))
                {
                    return Err(ConfigError::Invalid(format!(
                        "invalid blocked prefix '{}' for provider '{}'",
                        prefix, provider.name
                    )));
                }
            }

            if !names.contains(settings.default.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "default provider '{}' of scheme '{}' is not configured",
                    settings.default, scheme
                )));
            }
        }

        for scheme in &self.required_schemes {
            if !self.schemes.contains_key(scheme) {
                return Err(ConfigError::Invalid(format!(
                    "required scheme '{}' is not configured",
                    scheme
                )));
            }
        }

        if let Some(prefix) = self
            .crossref
            .allowed_prefixes()
            .into_iter()
            .find(|p| !is_valid_doi_prefix(p))
        {
            return Err(ConfigError::Invalid(format!(
                "invalid Crossref prefix '{}'",
                prefix
            )));
        }

        if self.crossref.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "crossref.timeout_secs must be positive".to_string(),
            ));
        }

        if let Some(prefix) = &self.oai.id_prefix {
            if !is_valid_oai_repository(prefix) {
                return Err(ConfigError::Invalid(format!(
                    "invalid OAI identifier prefix '{}'",
                    prefix
                )));
            }
        }

        Ok(())
    }
}

/// Configuration loading or validation error
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
