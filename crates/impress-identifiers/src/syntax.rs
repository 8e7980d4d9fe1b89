//! Identifier syntaxes a PID scheme can be configured with

use serde::{Deserialize, Serialize};

use crate::validators::{is_valid_doi, is_valid_oai, normalize_doi, normalize_oai};

/// The syntax rules applied to identifiers of a scheme before any provider
/// sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierSyntax {
    /// Digital Object Identifier (`10.1234/abc`)
    Doi,
    /// OAI-PMH item identifier (`oai:repo.example.org:abc`)
    Oai,
    /// Any non-blank string
    #[default]
    Any,
}

impl IdentifierSyntax {
    /// Normalize an identifier into its canonical form
    pub fn normalize(&self, value: &str) -> String {
        match self {
            IdentifierSyntax::Doi => normalize_doi(value),
            IdentifierSyntax::Oai => normalize_oai(value),
            IdentifierSyntax::Any => value.trim().to_string(),
        }
    }

    /// Check an already-normalized identifier
    pub fn is_valid(&self, value: &str) -> bool {
        match self {
            IdentifierSyntax::Doi => is_valid_doi(value),
            IdentifierSyntax::Oai => is_valid_oai(value),
            IdentifierSyntax::Any => !value.trim().is_empty(),
        }
    }

    /// Normalize, then validate. Returns the normalized value if it is valid.
    pub fn check(&self, value: &str) -> Option<String> {
        let normalized = self.normalize(value);
        if self.is_valid(&normalized) {
            Some(normalized)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IdentifierSyntax::Doi => "doi",
            IdentifierSyntax::Oai => "oai",
            IdentifierSyntax::Any => "any",
        }
    }
}

impl std::fmt::Display for IdentifierSyntax {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
