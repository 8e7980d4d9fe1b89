//! # impress-pids
//!
//! Persistent identifier lifecycle for impress records and drafts.
//!
//! ## Overview
//!
//! A [`PidManager`] validates, creates, reserves, registers, updates,
//! discards and restores identifiers (DOIs, OAI identifiers, identifiers
//! minted elsewhere) through a [`ProviderRegistry`] of pluggable
//! [`PidProvider`]s. Local PID state lives in a [`PidStore`]; only the
//! Crossref provider talks to a remote registry.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use impress_pids::{HttpClient, InMemoryPidStore, PidManager, PidsConfig, Record};
//!
//! let config = PidsConfig::load(std::path::Path::new("pids.toml"))?;
//! let manager = PidManager::from_config(
//!     &config,
//!     Arc::new(InMemoryPidStore::new()),
//!     Arc::new(HttpClient::new("impress-pids/0.1")?),
//! )?;
//!
//! let draft = Record::draft("abcd-1234", "Ocean temperatures");
//! let pids = manager.create_all(&draft, None, None)?;
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod manager;
pub mod pid;
pub mod provider;
pub mod record;
pub mod store;

#[cfg(test)]
mod test_util;

pub use config::{
    ConfigError, CrossrefConfig, OaiConfig, PidsConfig, ProviderConfig, ProviderKind,
    SchemeConfig,
};
pub use error::{FieldError, PidError, Result};
pub use http::{DepositTransport, HttpError, HttpResponse, MultipartForm};
#[cfg(feature = "native")]
pub use http::HttpClient;
pub use manager::{PidManager, SchemeSettings};
pub use pid::{Pid, PidAttrs, PidMap, PidRequest, PidRequestMap, PidStatus};
pub use provider::crossref::{CrossrefClient, DepositOutcome};
pub use provider::{
    CrossrefProvider, ExternalProvider, OaiProvider, PidProvider, ProviderBase, ProviderRegistry,
};
pub use record::{AccessLevel, Creator, Record, RecordKind, RecordMetadata};
pub use store::{InMemoryPidStore, PidStore, StoreError};
#[cfg(feature = "sqlite")]
pub use store::SqlitePidStore;

pub use impress_identifiers::IdentifierSyntax;
