//! Local OAI identifiers (`oai:{repository}:{record id}`)

use std::sync::Arc;

use impress_identifiers::{oai_identifier, oai_repository};

use super::{PidProvider, ProviderBase};
use crate::config::{OaiConfig, PidsConfig};
use crate::error::{PidError, Result};
use crate::pid::Pid;
use crate::record::Record;
use crate::store::PidStore;

#[derive(Debug)]
pub struct OaiProvider {
    base: ProviderBase,
    config: OaiConfig,
}

impl OaiProvider {
    pub fn new(name: &str, scheme: &str, label: &str, config: OaiConfig, store: Arc<dyn PidStore>) -> Self {
        Self {
            base: ProviderBase::new(name, scheme, store).with_label(label),
            config,
        }
    }

    fn id_prefix(&self) -> Option<&str> {
        self.config
            .id_prefix
            .as_deref()
            .filter(|prefix| !prefix.is_empty())
    }
}

impl PidProvider for OaiProvider {
    fn base(&self) -> &ProviderBase {
        &self.base
    }

    fn is_enabled(&self, config: &PidsConfig) -> bool {
        config.oai.id_prefix.is_some()
    }

    fn generate_id(&self, record: &Record) -> Result<String> {
        let prefix = self.id_prefix().ok_or_else(|| {
            PidError::Configuration("OAI identifier prefix is not configured".to_string())
        })?;
        Ok(oai_identifier(prefix, &record.id))
    }

    fn validate(
        &self,
        record: &Record,
        identifier: Option<&str>,
        provider: Option<&str>,
    ) -> Result<(bool, Vec<String>)> {
        let mut errors = self.base.validate_common(record, identifier, provider)?;

        if let (Some(identifier), Some(prefix)) = (identifier, self.id_prefix()) {
            if oai_repository(identifier) != Some(prefix) {
                errors.push(format!(
                    "{} must start with oai:{}:.",
                    self.label(),
                    prefix
                ));
            }
        }

        Ok((errors.is_empty(), errors))
    }

    /// OAI identifiers are local only, so even registered ones may go.
    fn delete(&self, pid: &mut Pid, _soft_delete: bool) -> Result<bool> {
        self.base.delete_pid(pid, true)
    }

    fn can_modify(&self, _pid: &Pid) -> bool {
        true
    }

    fn validate_restriction_level(&self, _record: &Record, _identifier: Option<&str>) -> Result<()> {
        Ok(())
    }
}
