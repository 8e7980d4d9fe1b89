//! Scheme → provider table

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{CrossrefProvider, ExternalProvider, OaiProvider, PidProvider};
use crate::config::{PidsConfig, ProviderConfig, ProviderKind, SchemeConfig};
use crate::error::{PidError, Result};
use crate::http::DepositTransport;
use crate::store::PidStore;

#[derive(Default)]
struct SchemeProviders {
    providers: BTreeMap<String, Arc<dyn PidProvider>>,
    default: Option<String>,
}

/// Providers per scheme, with one default per scheme.
///
/// Built once at startup; read-only afterwards and shared via `Arc`.
#[derive(Default)]
pub struct ProviderRegistry {
    schemes: BTreeMap<String, SchemeProviders>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every enabled provider named in `config`.
    pub fn from_config(
        config: &PidsConfig,
        store: Arc<dyn PidStore>,
        transport: Arc<dyn DepositTransport>,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|e| PidError::Configuration(e.to_string()))?;

        let mut registry = Self::new();
        for (scheme, settings) in &config.schemes {
            let mut enabled = Vec::new();
            for provider_config in &settings.providers {
                let provider = build_provider(
                    scheme,
                    settings,
                    provider_config,
                    config,
                    store.clone(),
                    transport.clone(),
                );
                if provider.is_enabled(config) {
                    enabled.push(provider);
                } else {
                    tracing::info!(scheme = %scheme, provider = %provider_config.name, "PID provider disabled, skipping");
                }
            }

            if enabled.is_empty() {
                tracing::info!(scheme = %scheme, "no enabled PID providers, scheme not available");
                continue;
            }
            if !enabled.iter().any(|p| p.name() == settings.default) {
                return Err(PidError::Configuration(format!(
                    "default provider '{}' of scheme '{}' is disabled",
                    settings.default, scheme
                )));
            }

            for provider in enabled {
                registry.register(provider)?;
            }
            registry.set_default(scheme, &settings.default)?;
        }

        Ok(registry)
    }

    /// Register a provider under its scheme. The first provider of a scheme
    /// becomes its default.
    pub fn register(&mut self, provider: Arc<dyn PidProvider>) -> Result<()> {
        let entry = self
            .schemes
            .entry(provider.scheme().to_string())
            .or_default();
        if entry.providers.contains_key(provider.name()) {
            return Err(PidError::Configuration(format!(
                "provider '{}' registered twice for scheme '{}'",
                provider.name(),
                provider.scheme()
            )));
        }
        if entry.default.is_none() {
            entry.default = Some(provider.name().to_string());
        }
        entry
            .providers
            .insert(provider.name().to_string(), provider);
        Ok(())
    }

    pub fn set_default(&mut self, scheme: &str, name: &str) -> Result<()> {
        let entry = self
            .schemes
            .get_mut(scheme)
            .ok_or_else(|| PidError::SchemeNotSupported(vec![scheme.to_string()]))?;
        if !entry.providers.contains_key(name) {
            return Err(PidError::ProviderNotSupported {
                scheme: scheme.to_string(),
                provider: name.to_string(),
            });
        }
        entry.default = Some(name.to_string());
        Ok(())
    }

    /// The named provider of `scheme`, or its default when `name` is `None`.
    pub fn get(&self, scheme: &str, name: Option<&str>) -> Result<Arc<dyn PidProvider>> {
        let entry = self
            .schemes
            .get(scheme)
            .ok_or_else(|| PidError::SchemeNotSupported(vec![scheme.to_string()]))?;
        let name = match name.or(entry.default.as_deref()) {
            Some(name) => name,
            None => {
                return Err(PidError::Configuration(format!(
                    "scheme '{}' has no default provider",
                    scheme
                )))
            }
        };
        entry
            .providers
            .get(name)
            .cloned()
            .ok_or_else(|| PidError::ProviderNotSupported {
                scheme: scheme.to_string(),
                provider: name.to_string(),
            })
    }

    pub fn default_provider(&self, scheme: &str) -> Result<Arc<dyn PidProvider>> {
        self.get(scheme, None)
    }

    pub fn contains(&self, scheme: &str) -> bool {
        self.schemes.contains_key(scheme)
    }

    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.schemes.keys().map(String::as_str)
    }

    /// All providers of a scheme, ordered by name
    pub fn providers(&self, scheme: &str) -> Vec<Arc<dyn PidProvider>> {
        self.schemes
            .get(scheme)
            .map(|entry| entry.providers.values().cloned().collect())
            .unwrap_or_default()
    }
}

fn build_provider(
    scheme: &str,
    settings: &SchemeConfig,
    provider: &ProviderConfig,
    config: &PidsConfig,
    store: Arc<dyn PidStore>,
    transport: Arc<dyn DepositTransport>,
) -> Arc<dyn PidProvider> {
    match provider.kind {
        ProviderKind::Crossref => Arc::new(CrossrefProvider::new(
            &provider.name,
            scheme,
            &settings.label,
            Some(
                provider
                    .client
                    .clone()
                    .unwrap_or_else(|| "crossref".to_string()),
            ),
            config.crossref.clone(),
            transport,
            store,
        )),
        ProviderKind::External => Arc::new(
            ExternalProvider::new(&provider.name, scheme, &settings.label, store)
                .with_blocked_prefixes(provider.blocked_prefixes.clone()),
        ),
        ProviderKind::Oai => Arc::new(OaiProvider::new(
            &provider.name,
            scheme,
            &settings.label,
            config.oai.clone(),
            store,
        )),
    }
}
