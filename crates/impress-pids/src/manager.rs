//! PID manager: orchestrates providers across schemes for a record/draft
//!
//! The manager performs no I/O of its own. Results come back as values
//! (`PidAttrs`, `PidMap`, normalized request maps); the only operation that
//! writes into a caller's structure is [`PidManager::create_and_reserve`],
//! which takes the record by `&mut`.

use std::collections::BTreeMap;
use std::sync::Arc;

use impress_identifiers::IdentifierSyntax;

use crate::config::PidsConfig;
use crate::error::{FieldError, PidError, Result};
use crate::http::DepositTransport;
use crate::pid::{Pid, PidAttrs, PidMap, PidRequestMap, PidStatus};
use crate::provider::{PidProvider, ProviderRegistry};
use crate::record::Record;
use crate::store::PidStore;

/// Per-scheme settings the manager itself needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeSettings {
    pub label: String,
    pub syntax: IdentifierSyntax,
}

impl SchemeSettings {
    pub fn new(label: &str, syntax: IdentifierSyntax) -> Self {
        Self {
            label: label.to_string(),
            syntax,
        }
    }
}

fn scheme_field(scheme: &str) -> String {
    format!("pids.{}", scheme)
}

pub struct PidManager {
    registry: Arc<ProviderRegistry>,
    settings: BTreeMap<String, SchemeSettings>,
    required_schemes: Vec<String>,
}

impl PidManager {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        settings: BTreeMap<String, SchemeSettings>,
        required_schemes: Vec<String>,
    ) -> Self {
        Self {
            registry,
            settings,
            required_schemes,
        }
    }

    /// Build the registry and scheme settings from configuration.
    ///
    /// Required schemes whose providers are all disabled are a configuration
    /// error.
    pub fn from_config(
        config: &PidsConfig,
        store: Arc<dyn PidStore>,
        transport: Arc<dyn DepositTransport>,
    ) -> Result<Self> {
        let registry = ProviderRegistry::from_config(config, store, transport)?;

        let required_schemes = config.effective_required_schemes();
        let unavailable: Vec<String> = required_schemes
            .iter()
            .filter(|scheme| !registry.contains(scheme))
            .cloned()
            .collect();
        if !unavailable.is_empty() {
            return Err(PidError::Configuration(format!(
                "required PID scheme(s) have no enabled provider: {}",
                unavailable.join(", ")
            )));
        }

        let settings = config
            .schemes
            .iter()
            .filter(|(scheme, _)| registry.contains(scheme))
            .map(|(scheme, s)| (scheme.clone(), SchemeSettings::new(&s.label, s.syntax)))
            .collect();

        Ok(Self::new(Arc::new(registry), settings, required_schemes))
    }

    pub fn required_schemes(&self) -> &[String] {
        &self.required_schemes
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.registry
    }

    fn label<'a>(&'a self, scheme: &'a str) -> &'a str {
        self.settings
            .get(scheme)
            .map(|s| s.label.as_str())
            .unwrap_or(scheme)
    }

    fn syntax(&self, scheme: &str) -> IdentifierSyntax {
        self.settings
            .get(scheme)
            .map(|s| s.syntax)
            .unwrap_or_default()
    }

    fn provider(&self, scheme: &str, name: Option<&str>) -> Result<Arc<dyn PidProvider>> {
        self.registry.get(scheme, name)
    }

    fn require_pid(&self, provider: &dyn PidProvider, identifier: &str) -> Result<Pid> {
        provider
            .get(identifier)?
            .ok_or_else(|| PidError::DoesNotExist {
                scheme: provider.scheme().to_string(),
                identifier: identifier.to_string(),
            })
    }

    /// Validate requested PIDs for `record`.
    ///
    /// Unknown schemes fail immediately. Identifier syntax problems and
    /// provider validation messages are appended to `errors`. Returns the
    /// requests with normalized identifiers; with `raise_errors` a non-empty
    /// error list is returned as one `PidError::Validation`.
    pub fn validate(
        &self,
        pids: &PidRequestMap,
        record: &Record,
        errors: &mut Vec<FieldError>,
        raise_errors: bool,
    ) -> Result<PidRequestMap> {
        let unknown: Vec<String> = pids
            .keys()
            .filter(|scheme| !self.registry.contains(scheme))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(PidError::SchemeNotSupported(unknown));
        }

        let mut normalized = PidRequestMap::new();
        for (scheme, request) in pids {
            let mut request = request.clone();
            let mut syntax_ok = true;
            request.identifier = match request
                .identifier
                .take()
                .filter(|identifier| !identifier.trim().is_empty())
            {
                Some(identifier) => match self.syntax(scheme).check(&identifier) {
                    Some(value) => Some(value),
                    None => {
                        syntax_ok = false;
                        errors.push(FieldError::new(
                            format!("pids.{}.identifier", scheme),
                            format!("Invalid {} {}.", self.label(scheme), identifier),
                        ));
                        Some(identifier)
                    }
                },
                None => None,
            };

            if syntax_ok {
                let provider = self.provider(scheme, request.provider.as_deref())?;
                let (success, messages) = provider.validate(
                    record,
                    request.identifier.as_deref(),
                    request.provider.as_deref(),
                )?;
                if !success {
                    errors.push(FieldError::with_messages(scheme_field(scheme), messages));
                }
            }

            normalized.insert(scheme.clone(), request);
        }

        if raise_errors && !errors.is_empty() {
            return Err(PidError::Validation(errors.clone()));
        }
        Ok(normalized)
    }

    /// Look up a PID; absence is an error here.
    pub fn read(&self, scheme: &str, identifier: &str, provider_name: Option<&str>) -> Result<Pid> {
        let provider = self.provider(scheme, provider_name)?;
        self.require_pid(provider.as_ref(), identifier)
    }

    /// Create a PID for `draft` and return the attrs the caller should store.
    ///
    /// With an identifier this is idempotent: an existing PID of the same
    /// provider attached to the draft is returned as is, a missing or
    /// soft-deleted one is (re-)created as reserved.
    pub fn create(
        &self,
        draft: &Record,
        scheme: &str,
        identifier: Option<&str>,
        provider_name: Option<&str>,
    ) -> Result<PidAttrs> {
        let provider = self.provider(scheme, provider_name)?;

        let pid = match identifier {
            Some(identifier) => match provider.get(identifier)? {
                Some(pid)
                    if !pid.is_deleted()
                        && pid.provider == provider.name()
                        && !pid.belongs_to_other(&draft.id) =>
                {
                    pid
                }
                Some(pid) if !pid.is_deleted() => {
                    return Err(PidError::AlreadyExists {
                        scheme: scheme.to_string(),
                        identifier: identifier.to_string(),
                    })
                }
                _ => provider.create(draft, Some(identifier), Some(PidStatus::Reserved))?,
            },
            None => {
                if draft.pids.contains_key(scheme) || provider.get_for_record(draft)?.is_some() {
                    return Err(PidError::field(
                        scheme_field(scheme),
                        format!("A PID already exists for type {}.", self.label(scheme)),
                    ));
                }
                if !provider.is_managed() {
                    return Err(PidError::field(
                        scheme_field(scheme),
                        format!("The {} must be provided.", self.label(scheme)),
                    ));
                }
                provider.create(draft, None, None)?
            }
        };

        Ok(pid.attrs())
    }

    /// Create every requested PID, then every scheme in `schemes` (the
    /// required schemes when `None`) that was not requested explicitly.
    /// Schemes the draft already holds are carried over instead of created.
    pub fn create_all(
        &self,
        draft: &Record,
        pids: Option<&PidRequestMap>,
        schemes: Option<&[String]>,
    ) -> Result<PidMap> {
        let mut result = PidMap::new();

        if let Some(pids) = pids {
            for (scheme, request) in pids {
                let attrs = self.create(
                    draft,
                    scheme,
                    request.identifier.as_deref(),
                    request.provider.as_deref(),
                )?;
                result.insert(scheme.clone(), attrs);
            }
        }

        let schemes = schemes.unwrap_or(self.required_schemes.as_slice());
        for scheme in schemes {
            if result.contains_key(scheme) {
                continue;
            }
            let attrs = match draft.pid(scheme) {
                Some(existing) => existing.clone(),
                None => self.create(draft, scheme, None, None)?,
            };
            result.insert(scheme.clone(), attrs);
        }

        Ok(result)
    }

    fn reserve_attrs(&self, draft: &Record, scheme: &str, attrs: &PidAttrs) -> Result<bool> {
        let provider = self.provider(scheme, Some(&attrs.provider))?;
        let mut pid = self.require_pid(provider.as_ref(), &attrs.identifier)?;
        if !pid.is_new() {
            return Ok(false);
        }
        provider.reserve(&mut pid, draft)
    }

    /// Reserve the draft's PID of `scheme`. PIDs past `New` are left alone
    /// and reported as `false`.
    pub fn reserve(&self, draft: &Record, scheme: &str) -> Result<bool> {
        let attrs = draft.pid(scheme).ok_or_else(|| {
            PidError::field(
                scheme_field(scheme),
                format!("No {} to reserve on the draft.", self.label(scheme)),
            )
        })?;
        self.reserve_attrs(draft, scheme, attrs)
    }

    /// Reserve every PID in `pids` (the draft's own when `None`).
    pub fn reserve_all(&self, draft: &Record, pids: Option<&PidMap>) -> Result<()> {
        for (scheme, attrs) in pids.unwrap_or(&draft.pids) {
            self.reserve_attrs(draft, scheme, attrs)?;
        }
        Ok(())
    }

    fn record_pid(&self, record: &Record, scheme: &str) -> Result<(Arc<dyn PidProvider>, Pid)> {
        let attrs = record.pid(scheme).ok_or_else(|| {
            PidError::field(
                scheme_field(scheme),
                format!("No {} is present on the record.", self.label(scheme)),
            )
        })?;
        let provider = self.provider(scheme, Some(&attrs.provider))?;
        let pid = self.require_pid(provider.as_ref(), &attrs.identifier)?;
        Ok((provider, pid))
    }

    /// Register the record's PID of `scheme` with its authority.
    ///
    /// `Ok(false)` means the registry side failed; the local state is kept.
    pub fn register(&self, record: &Record, scheme: &str, url: Option<&str>) -> Result<bool> {
        let (provider, mut pid) = self.record_pid(record, scheme)?;
        provider.register(&mut pid, record, url)
    }

    /// Re-submit the record's metadata for its PID of `scheme`.
    pub fn update(&self, record: &Record, scheme: &str, url: Option<&str>) -> Result<bool> {
        let (provider, mut pid) = self.record_pid(record, scheme)?;
        provider.update(&mut pid, record, url)
    }

    fn discard_pid(&self, provider: &dyn PidProvider, pid: &mut Pid, soft_delete: bool) -> Result<bool> {
        let field = scheme_field(&pid.scheme);
        let refused = || {
            PidError::field(
                field.clone(),
                "Cannot discard a reserved or registered persistent identifier.",
            )
        };
        if !provider.can_modify(pid) && !soft_delete {
            return Err(refused());
        }
        if provider.delete(pid, soft_delete)? {
            Ok(true)
        } else {
            Err(refused())
        }
    }

    /// Discard a PID. Registered PIDs of providers that protect them can only
    /// be soft-deleted.
    pub fn discard(
        &self,
        scheme: &str,
        identifier: &str,
        provider_name: Option<&str>,
        soft_delete: bool,
    ) -> Result<bool> {
        let provider = self.provider(scheme, provider_name)?;
        let mut pid = self.require_pid(provider.as_ref(), identifier)?;
        self.discard_pid(provider.as_ref(), &mut pid, soft_delete)
    }

    /// Discard every PID in `pids`; PIDs that do not exist are skipped.
    pub fn discard_all(&self, pids: &PidMap, soft_delete: bool) -> Result<()> {
        for (scheme, attrs) in pids {
            let provider = self.provider(scheme, Some(&attrs.provider))?;
            match provider.get(&attrs.identifier)? {
                Some(mut pid) => {
                    self.discard_pid(provider.as_ref(), &mut pid, soft_delete)?;
                }
                None => {
                    tracing::debug!(scheme = %scheme, identifier = %attrs.identifier, "PID not stored, nothing to discard");
                }
            }
        }
        Ok(())
    }

    pub fn restore(&self, scheme: &str, identifier: &str, provider_name: Option<&str>) -> Result<bool> {
        let provider = self.provider(scheme, provider_name)?;
        let mut pid = self.require_pid(provider.as_ref(), identifier)?;
        provider.restore(&mut pid)
    }

    /// Restore every PID in `pids`; PIDs that do not exist are skipped.
    pub fn restore_all(&self, pids: &PidMap) -> Result<()> {
        for (scheme, attrs) in pids {
            let provider = self.provider(scheme, Some(&attrs.provider))?;
            match provider.get(&attrs.identifier)? {
                Some(mut pid) => {
                    provider.restore(&mut pid)?;
                }
                None => {
                    tracing::debug!(scheme = %scheme, identifier = %attrs.identifier, "PID not stored, nothing to restore");
                }
            }
        }
        Ok(())
    }

    /// Ask each provider whether the record's access level allows its PID.
    /// All refusals are returned together.
    pub fn validate_restriction_level(&self, record: &Record) -> Result<()> {
        let mut errors = Vec::new();
        for (scheme, attrs) in &record.pids {
            let provider = self.provider(scheme, Some(&attrs.provider))?;
            match provider.validate_restriction_level(record, Some(&attrs.identifier)) {
                Ok(()) => {}
                Err(PidError::Validation(field_errors)) => errors.extend(field_errors),
                Err(e) => return Err(e),
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(PidError::Validation(errors))
        }
    }

    /// For every scheme the record holds or the manager requires, let the
    /// provider create and reserve its PID, and attach the result.
    pub fn create_and_reserve(&self, record: &mut Record) -> Result<()> {
        let mut schemes: Vec<String> = record.pids.keys().cloned().collect();
        for scheme in &self.required_schemes {
            if !schemes.contains(scheme) {
                schemes.push(scheme.clone());
            }
        }

        for scheme in schemes {
            let provider_name = record.pid(&scheme).map(|attrs| attrs.provider.clone());
            let provider = self.provider(&scheme, provider_name.as_deref())?;
            if let Some(pid) = provider.create_and_reserve(record)? {
                record.pids.insert(scheme, pid.attrs());
            }
        }
        Ok(())
    }
}
