//! Crossref DOI provider
//!
//! DOIs are `{prefix}/{record id}`. Registration and updates mark the PID
//! registered locally first and then deposit the metadata; a failed deposit
//! is logged and reported as `Ok(false)` while the local state is kept, so a
//! reconciliation task can retry it with [`CrossrefProvider::deposit_metadata`].

mod client;
pub mod xml;

pub use client::{CrossrefClient, DepositOutcome};

use std::sync::Arc;

use chrono::Utc;
use impress_identifiers::is_valid_doi;

use super::{PidProvider, ProviderBase};
use crate::config::{CrossrefConfig, PidsConfig};
use crate::error::Result;
use crate::http::DepositTransport;
use crate::pid::{Pid, PidStatus};
use crate::record::Record;
use crate::store::PidStore;
use xml::DepositHead;

pub struct CrossrefProvider {
    base: ProviderBase,
    client: CrossrefClient,
}

impl CrossrefProvider {
    pub fn new(
        name: &str,
        scheme: &str,
        label: &str,
        client_name: Option<String>,
        config: CrossrefConfig,
        transport: Arc<dyn DepositTransport>,
        store: Arc<dyn PidStore>,
    ) -> Self {
        Self {
            base: ProviderBase::new(name, scheme, store)
                .with_label(label)
                .with_client(client_name),
            client: CrossrefClient::new(config, transport),
        }
    }

    pub fn client(&self) -> &CrossrefClient {
        &self.client
    }

    /// DOI for `record` under `prefix` (or the default prefix)
    pub fn generate_doi(&self, record: &Record, prefix: Option<&str>) -> Result<String> {
        self.client.generate_doi(&record.id, prefix)
    }

    /// Build and upload the deposit document for `pid`.
    ///
    /// Never fails: every problem is folded into the outcome.
    pub fn deposit_metadata(&self, pid: &Pid, record: &Record, url: Option<&str>) -> DepositOutcome {
        let config = self.client.config();
        let Some(url) = url
            .map(str::to_string)
            .or_else(|| config.landing_page(&record.id))
        else {
            return DepositOutcome::PermanentFailure(format!(
                "no landing page URL for {}",
                pid.identifier
            ));
        };

        let batch_id = uuid::Uuid::new_v4().to_string();
        let timestamp = Utc::now().format("%Y%m%d%H%M%S").to_string();
        let head = DepositHead {
            batch_id: &batch_id,
            timestamp: &timestamp,
            depositor: config.depositor.as_deref().unwrap_or_default(),
            email: config.email.as_deref().unwrap_or_default(),
            registrant: config.registrant.as_deref().unwrap_or_default(),
        };

        match xml::dataset_deposit(&head, record, &pid.identifier, &url) {
            Ok(document) => self.client.deposit(&document),
            Err(e) => DepositOutcome::PermanentFailure(e.to_string()),
        }
    }

    fn deposit_logged(&self, pid: &Pid, record: &Record, url: Option<&str>, operation: &str) -> bool {
        if !self.client.check_credentials() {
            return false;
        }
        let outcome = self.deposit_metadata(pid, record, url);
        if !outcome.is_deposited() {
            tracing::error!(
                doi = %pid.identifier,
                operation,
                retryable = outcome.is_retryable(),
                "Crossref deposit failed: {}",
                outcome
            );
        }
        outcome.is_deposited()
    }
}

impl PidProvider for CrossrefProvider {
    fn base(&self) -> &ProviderBase {
        &self.base
    }

    fn is_enabled(&self, config: &PidsConfig) -> bool {
        config.crossref.enabled
    }

    fn generate_id(&self, record: &Record) -> Result<String> {
        self.generate_doi(record, None)
    }

    fn register(&self, pid: &mut Pid, record: &Record, url: Option<&str>) -> Result<bool> {
        if !self.base.register_pid(pid)? {
            return Ok(false);
        }
        Ok(self.deposit_logged(pid, record, url, "register"))
    }

    fn update(&self, pid: &mut Pid, record: &Record, url: Option<&str>) -> Result<bool> {
        if !pid.is_registered() {
            tracing::warn!(doi = %pid.identifier, status = %pid.status, "cannot update an unregistered DOI");
            return Ok(false);
        }
        Ok(self.deposit_logged(pid, record, url, "update"))
    }

    fn validate(
        &self,
        record: &Record,
        identifier: Option<&str>,
        provider: Option<&str>,
    ) -> Result<(bool, Vec<String>)> {
        let mut errors = self.base.validate_common(record, identifier, provider)?;

        if let Some(identifier) = identifier {
            if !is_valid_doi(identifier) {
                errors.push(format!("Invalid DOI {}.", identifier));
            } else if !self.client.is_allowed_doi(identifier) {
                errors.push(format!(
                    "Wrong DOI prefix provided, it should be one of: {}.",
                    self.client.config().allowed_prefixes().join(", ")
                ));
            }
        }

        if record.publisher().is_none() {
            errors.push("Missing publisher field required for DOI registration.".to_string());
        }

        Ok((errors.is_empty(), errors))
    }

    fn create_and_reserve(&self, record: &Record) -> Result<Option<Pid>> {
        let existing = match record.pid(self.scheme()) {
            Some(attrs) => self.get(&attrs.identifier)?,
            None => self.get_for_record(record)?,
        };

        let mut pid = match existing {
            Some(pid) if !pid.is_deleted() => pid,
            _ => self.create(record, None, Some(PidStatus::Reserved))?,
        };
        self.reserve(&mut pid, record)?;
        Ok(Some(pid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Creator;
    use crate::store::InMemoryPidStore;
    use crate::test_util::{crossref_config, ScriptedTransport};

    fn provider(transport: ScriptedTransport) -> (CrossrefProvider, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        let provider = CrossrefProvider::new(
            "crossref",
            "doi",
            "DOI",
            Some("crossref".to_string()),
            crossref_config(),
            transport.clone(),
            Arc::new(InMemoryPidStore::new()),
        );
        (provider, transport)
    }

    fn record() -> Record {
        Record::draft("abcd-1234", "Ocean temperatures")
            .with_publisher("Impress Data")
            .with_creator(Creator::person("Ada", "Lovelace"))
            .with_publication_date("2024")
    }

    #[test]
    fn test_generate_id_uses_record_id() {
        let (provider, _) = provider(ScriptedTransport::success());
        assert_eq!(provider.generate_id(&record()).unwrap(), "10.1234/abcd-1234");
    }

    #[test]
    fn test_register_deposits() {
        let (provider, transport) = provider(ScriptedTransport::success());
        let record = record();
        let mut pid = provider.create(&record, None, None).unwrap();
        assert!(provider.register(&mut pid, &record, None).unwrap());
        assert!(pid.is_registered());

        let requests = transport.requests();
        let xml = &requests[0].1.file_part("fname").unwrap().content;
        let xml = String::from_utf8(xml.clone()).unwrap();
        assert!(xml.contains("<resource>https://repo.example.org/records/abcd-1234</resource>"));
    }

    #[test]
    fn test_register_with_failed_deposit_keeps_local_state() {
        let (provider, _) = provider(ScriptedTransport::respond(200, "FAILURE"));
        let record = record();
        let mut pid = provider.create(&record, None, None).unwrap();
        assert!(!provider.register(&mut pid, &record, None).unwrap());
        assert!(provider.get(&pid.identifier).unwrap().unwrap().is_registered());
    }

    #[test]
    fn test_register_with_incomplete_credentials() {
        let transport = Arc::new(ScriptedTransport::success());
        let mut config = crossref_config();
        config.username = None;
        let provider = CrossrefProvider::new(
            "crossref",
            "doi",
            "DOI",
            None,
            config,
            transport.clone(),
            Arc::new(InMemoryPidStore::new()),
        );
        let record = record();
        let mut pid = provider.create(&record, None, None).unwrap();
        assert!(!provider.register(&mut pid, &record, None).unwrap());
        assert!(pid.is_registered());
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_update_requires_registered() {
        let (provider, transport) = provider(ScriptedTransport::success());
        let record = record();
        let mut pid = provider.create(&record, None, None).unwrap();
        assert!(!provider.update(&mut pid, &record, None).unwrap());
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_missing_landing_page_is_permanent() {
        let transport = Arc::new(ScriptedTransport::success());
        let mut config = crossref_config();
        config.landing_page_template = None;
        let provider = CrossrefProvider::new(
            "crossref",
            "doi",
            "DOI",
            None,
            config,
            transport,
            Arc::new(InMemoryPidStore::new()),
        );
        let pid = Pid::new("doi", "10.1234/abcd-1234", "crossref");
        assert!(matches!(
            provider.deposit_metadata(&pid, &record(), None),
            DepositOutcome::PermanentFailure(_)
        ));
        assert!(provider
            .deposit_metadata(&pid, &record(), Some("https://elsewhere.example.org/r"))
            .is_deposited());
    }

    #[test]
    fn test_validate() {
        let (provider, _) = provider(ScriptedTransport::success());
        let (ok, errors) = provider
            .validate(&record(), Some("10.1234/abcd-1234"), None)
            .unwrap();
        assert!(ok, "{:?}", errors);

        let (ok, errors) = provider
            .validate(&record(), Some("10.9999/abcd-1234"), None)
            .unwrap();
        assert!(!ok);
        assert!(errors[0].starts_with("Wrong DOI prefix"));

        let (ok, errors) = provider
            .validate(&Record::draft("r1", "T"), None, None)
            .unwrap();
        assert!(!ok);
        assert_eq!(
            errors,
            vec!["Missing publisher field required for DOI registration.".to_string()]
        );
    }

    #[test]
    fn test_create_and_reserve_is_idempotent() {
        let (provider, _) = provider(ScriptedTransport::success());
        let mut record = record();
        let pid = provider.create_and_reserve(&record).unwrap().unwrap();
        assert!(pid.is_reserved());
        assert_eq!(pid.identifier, "10.1234/abcd-1234");

        record.pids.insert("doi".to_string(), pid.attrs());
        let again = provider.create_and_reserve(&record).unwrap().unwrap();
        assert_eq!(again, pid);
    }
}
