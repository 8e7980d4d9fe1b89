//! The parts of a record/draft that PID providers read
//!
//! Records and drafts are owned by the record service; this is the minimal
//! view the PID subsystem needs: the id, the access level, the attached PIDs
//! and the metadata a registry deposit carries.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::pid::{PidAttrs, PidMap};

/// Whether the aggregate is a mutable draft or a published record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    #[default]
    Draft,
    Published,
}

/// Record-level visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    #[default]
    Public,
    Restricted,
}

/// A creator of a record: a person (with a family name) or an organization
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Creator {
    pub name: String,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub orcid: Option<String>,
}

impl Creator {
    pub fn person(given_name: &str, family_name: &str) -> Self {
        Self {
            name: format!("{}, {}", family_name, given_name),
            given_name: Some(given_name.to_string()),
            family_name: Some(family_name.to_string()),
            orcid: None,
        }
    }

    pub fn organization(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_orcid(mut self, orcid: &str) -> Self {
        self.orcid = Some(orcid.to_string());
        self
    }
}

/// Descriptive metadata used in registry deposits
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub title: String,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub creators: Vec<Creator>,
    /// ISO 8601 date (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`)
    #[serde(default)]
    pub publication_date: Option<String>,
}

/// A record or draft as seen by the PID subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub kind: RecordKind,
    #[serde(default)]
    pub access: AccessLevel,
    #[serde(default)]
    pub pids: PidMap,
    #[serde(default)]
    pub metadata: RecordMetadata,
}

impl Record {
    /// Create a new draft with no PIDs
    pub fn draft(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: RecordKind::Draft,
            access: AccessLevel::Public,
            pids: PidMap::new(),
            metadata: RecordMetadata {
                title: title.into(),
                ..Default::default()
            },
        }
    }

    /// Publish: the same aggregate with its PIDs, as an immutable record
    pub fn published(&self) -> Self {
        Self {
            kind: RecordKind::Published,
            ..self.clone()
        }
    }

    pub fn with_publisher(mut self, publisher: &str) -> Self {
        self.metadata.publisher = Some(publisher.to_string());
        self
    }

    pub fn with_creator(mut self, creator: Creator) -> Self {
        self.metadata.creators.push(creator);
        self
    }

    pub fn with_publication_date(mut self, date: &str) -> Self {
        self.metadata.publication_date = Some(date.to_string());
        self
    }

    pub fn with_access(mut self, access: AccessLevel) -> Self {
        self.access = access;
        self
    }

    pub fn with_pids(mut self, pids: PidMap) -> Self {
        self.pids = pids;
        self
    }

    pub fn is_draft(&self) -> bool {
        self.kind == RecordKind::Draft
    }

    pub fn is_restricted(&self) -> bool {
        self.access == AccessLevel::Restricted
    }

    pub fn pid(&self, scheme: &str) -> Option<&PidAttrs> {
        self.pids.get(scheme)
    }

    /// Publisher, if present and non-blank
    pub fn publisher(&self) -> Option<&str> {
        self.metadata
            .publisher
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Publication date as `(year, month, day)`. Only `YYYY`, `YYYY-MM` and
    /// valid `YYYY-MM-DD` dates parse; free text and ranges give `None`.
    pub fn publication_date_parts(&self) -> Option<(i32, Option<u32>, Option<u32>)> {
        let date = self.metadata.publication_date.as_deref()?.trim();
        let parts: Vec<&str> = date.split('-').collect();
        let digits = |part: &str, len: usize| {
            part.len() == len && part.bytes().all(|b| b.is_ascii_digit())
        };

        match parts[..] {
            [year] if digits(year, 4) => Some((year.parse().ok()?, None, None)),
            [year, month] if digits(year, 4) && digits(month, 2) => {
                let year = year.parse().ok()?;
                let month = month.parse().ok()?;
                NaiveDate::from_ymd_opt(year, month, 1)?;
                Some((year, Some(month), None))
            }
            [year, month, day] if digits(year, 4) && digits(month, 2) && digits(day, 2) => {
                let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
                Some((date.year(), Some(date.month()), Some(date.day())))
            }
            _ => None,
        }
    }

    pub fn publication_year(&self) -> Option<i32> {
        self.publication_date_parts().map(|(year, _, _)| year)
    }
}
