//! Unmanaged provider for identifiers minted elsewhere

use std::sync::Arc;

use impress_identifiers::{doi_has_prefix, doi_prefix};

use super::{PidProvider, ProviderBase};
use crate::error::Result;
use crate::record::Record;
use crate::store::PidStore;

/// Accepts identifiers supplied by the depositor. The value is authoritative
/// in some other registry, so every lifecycle step is local only.
#[derive(Debug)]
pub struct ExternalProvider {
    base: ProviderBase,
    blocked_prefixes: Vec<String>,
}

impl ExternalProvider {
    pub fn new(name: &str, scheme: &str, label: &str, store: Arc<dyn PidStore>) -> Self {
        Self {
            base: ProviderBase::new(name, scheme, store)
                .with_label(label)
                .managed(false),
            blocked_prefixes: Vec::new(),
        }
    }

    /// Refuse DOIs under these prefixes (typically the repository's own).
    pub fn with_blocked_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.blocked_prefixes = prefixes;
        self
    }
}

impl PidProvider for ExternalProvider {
    fn base(&self) -> &ProviderBase {
        &self.base
    }

    fn validate(
        &self,
        record: &Record,
        identifier: Option<&str>,
        provider: Option<&str>,
    ) -> Result<(bool, Vec<String>)> {
        let mut errors = self.base.validate_common(record, identifier, provider)?;

        match identifier {
            None => errors.push(format!("Missing {} for required field.", self.label())),
            Some(identifier) if doi_has_prefix(identifier, &self.blocked_prefixes) => {
                errors.push(format!(
                    "The prefix '{}' is managed by the repository. Please supply an external {} or select the repository's own provider.",
                    doi_prefix(identifier).unwrap_or_default(),
                    self.label()
                ));
            }
            Some(_) => {}
        }

        Ok((errors.is_empty(), errors))
    }

    fn validate_restriction_level(&self, _record: &Record, _identifier: Option<&str>) -> Result<()> {
        Ok(())
    }
}
