//! PID providers
//!
//! A provider is one identifier-issuing authority for one scheme. Every
//! provider owns a [`ProviderBase`] holding its descriptor and the shared PID
//! table; the trait's default methods run the base lifecycle, and concrete
//! providers override only what their registry needs (network deposits,
//! extra validation).

pub mod crossref;
pub mod external;
pub mod oai;
pub mod registry;

pub use crossref::CrossrefProvider;
pub use external::ExternalProvider;
pub use oai::OaiProvider;
pub use registry::ProviderRegistry;

use std::sync::Arc;

use crate::config::PidsConfig;
use crate::error::{PidError, Result};
use crate::pid::{Pid, PidStatus};
use crate::record::Record;
use crate::store::PidStore;

/// Descriptor and base lifecycle shared by all providers
pub struct ProviderBase {
    name: String,
    scheme: String,
    label: String,
    client: Option<String>,
    managed: bool,
    default_status: PidStatus,
    restore_status: PidStatus,
    store: Arc<dyn PidStore>,
}

impl std::fmt::Debug for ProviderBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderBase")
            .field("name", &self.name)
            .field("scheme", &self.scheme)
            .field("client", &self.client)
            .field("managed", &self.managed)
            .finish()
    }
}

impl ProviderBase {
    /// A managed provider with `New` as default status and `Reserved` as
    /// restore status. The label defaults to the upper-cased scheme.
    pub fn new(name: &str, scheme: &str, store: Arc<dyn PidStore>) -> Self {
        Self {
            name: name.to_string(),
            scheme: scheme.to_string(),
            label: scheme.to_uppercase(),
            client: None,
            managed: true,
            default_status: PidStatus::New,
            restore_status: PidStatus::Reserved,
            store,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn with_client(mut self, client: Option<String>) -> Self {
        self.client = client;
        self
    }

    pub fn managed(mut self, managed: bool) -> Self {
        self.managed = managed;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn client(&self) -> Option<&str> {
        self.client.as_deref()
    }

    pub fn is_managed(&self) -> bool {
        self.managed
    }

    pub fn lookup(&self, identifier: &str) -> Result<Option<Pid>> {
        Ok(self.store.get(&self.scheme, identifier)?)
    }

    /// The live (not deleted) PID of this scheme attached to a record
    pub fn attached_to(&self, record_id: &str) -> Result<Option<Pid>> {
        Ok(self
            .store
            .list_for_record(record_id)?
            .into_iter()
            .find(|pid| pid.scheme == self.scheme && !pid.is_deleted()))
    }

    /// Insert a PID row for `record`, or re-activate a soft-deleted one.
    pub fn create_pid(
        &self,
        record: &Record,
        identifier: &str,
        status: Option<PidStatus>,
    ) -> Result<Pid> {
        let status = status.unwrap_or(self.default_status);

        match self.lookup(identifier)? {
            Some(mut pid) if pid.is_deleted() => {
                pid.transition(status)?;
                pid.provider = self.name.clone();
                pid.client = self.client.clone();
                pid.record_id = Some(record.id.clone());
                self.store.update(&pid)?;
                tracing::info!(scheme = %self.scheme, identifier, "re-activated deleted PID");
                Ok(pid)
            }
            Some(_) => Err(PidError::AlreadyExists {
                scheme: self.scheme.clone(),
                identifier: identifier.to_string(),
            }),
            None => {
                let pid = Pid::new(&self.scheme, identifier, &self.name)
                    .with_client(self.client.clone())
                    .with_status(status)
                    .attached_to(&record.id);
                self.store.insert(&pid)?;
                tracing::debug!(scheme = %self.scheme, identifier, %status, "created PID");
                Ok(pid)
            }
        }
    }

    /// `New → Reserved`. Already reserved is a no-op success.
    pub fn reserve_pid(&self, pid: &mut Pid) -> Result<bool> {
        match pid.status {
            PidStatus::Reserved => Ok(true),
            PidStatus::New => {
                pid.transition(PidStatus::Reserved)?;
                self.store.update(pid)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Mark the PID registered in the local table.
    pub fn register_pid(&self, pid: &mut Pid) -> Result<bool> {
        match pid.status {
            PidStatus::Registered => Ok(true),
            PidStatus::New | PidStatus::Reserved => {
                pid.transition(PidStatus::Registered)?;
                self.store.update(pid)?;
                tracing::info!(scheme = %pid.scheme, identifier = %pid.identifier, "PID registered locally");
                Ok(true)
            }
            PidStatus::Deleted => Ok(false),
        }
    }

    /// Soft delete keeps the row as `Deleted`. A hard delete removes `New`
    /// rows, marks `Reserved` ones deleted and refuses `Registered` ones.
    pub fn delete_pid(&self, pid: &mut Pid, soft_delete: bool) -> Result<bool> {
        match pid.status {
            PidStatus::Deleted => Ok(true),
            PidStatus::New => {
                self.store.remove(&pid.scheme, &pid.identifier)?;
                tracing::debug!(identifier = %pid.identifier, "removed new PID");
                Ok(true)
            }
            PidStatus::Registered if !soft_delete => Ok(false),
            PidStatus::Reserved | PidStatus::Registered => {
                pid.transition(PidStatus::Deleted)?;
                self.store.update(pid)?;
                Ok(true)
            }
        }
    }

    pub fn restore_pid(&self, pid: &mut Pid) -> Result<bool> {
        if !pid.is_deleted() {
            return Ok(false);
        }
        pid.transition(self.restore_status)?;
        self.store.update(pid)?;
        tracing::info!(identifier = %pid.identifier, status = %pid.status, "restored PID");
        Ok(true)
    }

    /// Checks every provider shares: the provider hint and ownership of the
    /// identifier.
    pub fn validate_common(
        &self,
        record: &Record,
        identifier: Option<&str>,
        provider: Option<&str>,
    ) -> Result<Vec<String>> {
        let mut errors = Vec::new();

        if let Some(provider) = provider {
            if provider != self.name {
                errors.push(format!(
                    "Provider name {} does not match {}.",
                    provider, self.name
                ));
            }
        }

        if let Some(identifier) = identifier {
            if let Some(pid) = self.lookup(identifier)? {
                if !pid.is_deleted() && pid.belongs_to_other(&record.id) {
                    errors.push(format!("{} {} already exists.", self.label, identifier));
                }
            }
        }

        Ok(errors)
    }

    /// Restricted records may not hold this scheme's identifiers.
    pub fn check_restriction(&self, record: &Record) -> Result<()> {
        if record.is_restricted() {
            return Err(PidError::field(
                format!("pids.{}", self.scheme),
                format!("Cannot create a {} for a restricted record.", self.label),
            ));
        }
        Ok(())
    }
}

/// One identifier-issuing authority for one scheme.
///
/// Data problems are reported through return values (`Ok(false)`, error
/// message lists); `Err` is reserved for local failures and configuration
/// defects.
pub trait PidProvider: Send + Sync {
    fn base(&self) -> &ProviderBase;

    fn name(&self) -> &str {
        self.base().name()
    }

    fn scheme(&self) -> &str {
        self.base().scheme()
    }

    fn label(&self) -> &str {
        self.base().label()
    }

    fn client_name(&self) -> Option<&str> {
        self.base().client()
    }

    fn is_managed(&self) -> bool {
        self.base().is_managed()
    }

    /// Whether the provider is active under `config`
    fn is_enabled(&self, _config: &PidsConfig) -> bool {
        true
    }

    /// Synthesize an identifier for a managed provider.
    fn generate_id(&self, _record: &Record) -> Result<String> {
        Err(PidError::Configuration(format!(
            "provider '{}' does not generate identifiers",
            self.name()
        )))
    }

    fn get(&self, identifier: &str) -> Result<Option<Pid>> {
        self.base().lookup(identifier)
    }

    /// The live PID of this scheme attached to `record`, if any
    fn get_for_record(&self, record: &Record) -> Result<Option<Pid>> {
        self.base().attached_to(&record.id)
    }

    /// Allocate a PID locally. Without a value the provider must be managed.
    fn create(
        &self,
        record: &Record,
        pid_value: Option<&str>,
        status: Option<PidStatus>,
    ) -> Result<Pid> {
        let identifier = match pid_value {
            Some(value) => value.to_string(),
            None if self.is_managed() => self.generate_id(record)?,
            None => {
                return Err(PidError::Configuration(format!(
                    "unmanaged provider '{}' requires an identifier value",
                    self.name()
                )))
            }
        };
        self.base().create_pid(record, &identifier, status)
    }

    fn reserve(&self, pid: &mut Pid, _record: &Record) -> Result<bool> {
        self.base().reserve_pid(pid)
    }

    fn register(&self, pid: &mut Pid, _record: &Record, _url: Option<&str>) -> Result<bool> {
        self.base().register_pid(pid)
    }

    fn update(&self, pid: &mut Pid, _record: &Record, _url: Option<&str>) -> Result<bool> {
        Ok(pid.is_registered())
    }

    fn delete(&self, pid: &mut Pid, soft_delete: bool) -> Result<bool> {
        self.base().delete_pid(pid, soft_delete)
    }

    fn restore(&self, pid: &mut Pid) -> Result<bool> {
        self.base().restore_pid(pid)
    }

    /// Returns `(success, messages)`.
    fn validate(
        &self,
        record: &Record,
        identifier: Option<&str>,
        provider: Option<&str>,
    ) -> Result<(bool, Vec<String>)> {
        let errors = self.base().validate_common(record, identifier, provider)?;
        Ok((errors.is_empty(), errors))
    }

    fn can_modify(&self, pid: &Pid) -> bool {
        !pid.is_registered()
    }

    fn validate_restriction_level(&self, record: &Record, _identifier: Option<&str>) -> Result<()> {
        self.base().check_restriction(record)
    }

    /// Create, reserve and return a PID for `record` in one step.
    /// `Ok(None)` means the provider has no such composite.
    fn create_and_reserve(&self, _record: &Record) -> Result<Option<Pid>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AccessLevel;
    use crate::store::InMemoryPidStore;

    struct PlainProvider {
        base: ProviderBase,
    }

    impl PidProvider for PlainProvider {
        fn base(&self) -> &ProviderBase {
            &self.base
        }

        fn generate_id(&self, record: &Record) -> Result<String> {
            Ok(format!("local-{}", record.id))
        }
    }

    fn provider() -> PlainProvider {
        let store: Arc<dyn PidStore> = Arc::new(InMemoryPidStore::new());
        PlainProvider {
            base: ProviderBase::new("local", "local", store).with_label("Local ID"),
        }
    }

    #[test]
    fn test_create_generates_and_stores() {
        let provider = provider();
        let record = Record::draft("r1", "T");
        let pid = provider.create(&record, None, None).unwrap();
        assert_eq!(pid.identifier, "local-r1");
        assert!(pid.is_new());
        assert_eq!(provider.get("local-r1").unwrap(), Some(pid));
    }

    #[test]
    fn test_create_existing_fails() {
        let provider = provider();
        let record = Record::draft("r1", "T");
        provider.create(&record, Some("x"), None).unwrap();
        assert!(matches!(
            provider.create(&record, Some("x"), None),
            Err(PidError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn test_create_reactivates_deleted() {
        let provider = provider();
        let mut pid = provider
            .create(&Record::draft("r1", "T"), Some("x"), Some(PidStatus::Reserved))
            .unwrap();
        assert!(provider.delete(&mut pid, true).unwrap());

        let pid = provider
            .create(&Record::draft("r2", "T"), Some("x"), Some(PidStatus::Reserved))
            .unwrap();
        assert!(pid.is_reserved());
        assert_eq!(pid.record_id.as_deref(), Some("r2"));
    }

    #[test]
    fn test_unmanaged_without_value_is_configuration_error() {
        let store: Arc<dyn PidStore> = Arc::new(InMemoryPidStore::new());
        let provider = PlainProvider {
            base: ProviderBase::new("ext", "local", store).managed(false),
        };
        let err = provider
            .create(&Record::draft("r1", "T"), None, None)
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_reserve_only_from_new() {
        let provider = provider();
        let record = Record::draft("r1", "T");
        let mut pid = provider.create(&record, None, None).unwrap();
        assert!(provider.reserve(&mut pid, &record).unwrap());
        assert!(provider.reserve(&mut pid, &record).unwrap());
        assert!(pid.is_reserved());

        provider.register(&mut pid, &record, None).unwrap();
        assert!(!provider.reserve(&mut pid, &record).unwrap());
        assert!(pid.is_registered());
    }

    #[test]
    fn test_delete_rules() {
        let provider = provider();
        let record = Record::draft("r1", "T");

        let mut new_pid = provider.create(&record, Some("a"), None).unwrap();
        assert!(provider.delete(&mut new_pid, true).unwrap());
        assert!(provider.get("a").unwrap().is_none());

        let mut reserved = provider
            .create(&record, Some("b"), Some(PidStatus::Reserved))
            .unwrap();
        assert!(provider.delete(&mut reserved, false).unwrap());
        assert!(provider.get("b").unwrap().unwrap().is_deleted());

        let mut registered = provider
            .create(&record, Some("c"), Some(PidStatus::Registered))
            .unwrap();
        assert!(!provider.can_modify(&registered));
        assert!(!provider.delete(&mut registered, false).unwrap());
        assert!(registered.is_registered());
        assert!(provider.delete(&mut registered, true).unwrap());
        assert!(registered.is_deleted());
    }

    #[test]
    fn test_restore_to_reserved() {
        let provider = provider();
        let record = Record::draft("r1", "T");
        let mut pid = provider
            .create(&record, Some("a"), Some(PidStatus::Reserved))
            .unwrap();
        assert!(!provider.restore(&mut pid).unwrap());
        provider.delete(&mut pid, true).unwrap();
        assert!(provider.restore(&mut pid).unwrap());
        assert!(pid.is_reserved());
        assert!(provider.get("a").unwrap().unwrap().is_reserved());
    }

    #[test]
    fn test_validate_common() {
        let provider = provider();
        provider
            .create(&Record::draft("r1", "T"), Some("a"), None)
            .unwrap();

        let (ok, errors) = provider
            .validate(&Record::draft("r2", "T"), Some("a"), Some("other"))
            .unwrap();
        assert!(!ok);
        assert_eq!(
            errors,
            vec![
                "Provider name other does not match local.".to_string(),
                "Local ID a already exists.".to_string()
            ]
        );

        let (ok, _) = provider
            .validate(&Record::draft("r1", "T"), Some("a"), Some("local"))
            .unwrap();
        assert!(ok);
    }

    #[test]
    fn test_restricted_record_rejected() {
        let provider = provider();
        let record = Record::draft("r1", "T").with_access(AccessLevel::Restricted);
        let err = provider.validate_restriction_level(&record, None).unwrap_err();
        assert_eq!(err.field_errors()[0].field, "pids.local");
        assert!(provider
            .validate_restriction_level(&Record::draft("r1", "T"), None)
            .is_ok());
    }

    #[test]
    fn test_get_for_record_ignores_deleted() {
        let provider = provider();
        let record = Record::draft("r1", "T");
        let mut pid = provider
            .create(&record, Some("a"), Some(PidStatus::Reserved))
            .unwrap();
        assert!(provider.get_for_record(&record).unwrap().is_some());
        provider.delete(&mut pid, true).unwrap();
        assert!(provider.get_for_record(&record).unwrap().is_none());
    }
}
