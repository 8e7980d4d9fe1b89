//! Identifier validation and normalization functions

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // DOI: 10.<registrant>[.<sub>]/<suffix>
    static ref DOI_PATTERN: Regex = Regex::new(r"^10\.\d{4,9}(\.\d+)*/\S+$").unwrap();

    static ref DOI_PREFIX_PATTERN: Regex = Regex::new(r"^10\.\d{4,9}(\.\d+)*$").unwrap();

    // OAI identifier: oai:<repository-identifier>:<local-identifier>
    // The repository identifier is a domain name, so it needs at least one dot.
    static ref OAI_PATTERN: Regex = Regex::new(
        r"^oai:[a-zA-Z][a-zA-Z0-9\-]*(\.[a-zA-Z][a-zA-Z0-9\-]*)+:[a-zA-Z0-9\-_\.!~\*'\(\);/\?:@&=\+\$,%]+$"
    ).unwrap();

    static ref OAI_REPOSITORY_PATTERN: Regex = Regex::new(
        r"^[a-zA-Z][a-zA-Z0-9\-]*(\.[a-zA-Z][a-zA-Z0-9\-]*)+$"
    ).unwrap();
}

const DOI_URL_PREFIXES: [&str; 6] = [
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi:",
    "info:doi/",
];

/// Check if a string is a bare DOI (no resolver URL or `doi:` prefix)
pub fn is_valid_doi(doi: &str) -> bool {
    DOI_PATTERN.is_match(doi)
}

/// Check if a string is a DOI prefix such as `10.1234`
pub fn is_valid_doi_prefix(prefix: &str) -> bool {
    DOI_PREFIX_PATTERN.is_match(prefix)
}

/// Normalize a DOI to its bare form.
///
/// Strips resolver URLs and the `doi:` scheme (case-insensitively), surrounding
/// whitespace and trailing punctuation. Case of the DOI itself is preserved.
pub fn normalize_doi(doi: &str) -> String {
    let mut result = doi.trim();

    let lowered = result.to_ascii_lowercase();
    for prefix in DOI_URL_PREFIXES {
        if lowered.starts_with(prefix) {
            result = &result[prefix.len()..];
            break;
        }
    }

    result
        .trim()
        .trim_end_matches(['.', ',', ';'])
        .to_string()
}

/// Get the prefix (`10.xxxx`) of a DOI, if it has one
pub fn doi_prefix(doi: &str) -> Option<&str> {
    let (prefix, suffix) = doi.split_once('/')?;
    if suffix.is_empty() || !is_valid_doi_prefix(prefix) {
        return None;
    }
    Some(prefix)
}

/// Check if a DOI lives under one of the given prefixes
pub fn doi_has_prefix<S: AsRef<str>>(doi: &str, prefixes: &[S]) -> bool {
    match doi_prefix(doi) {
        Some(prefix) => prefixes.iter().any(|p| p.as_ref() == prefix),
        None => false,
    }
}

/// Check if a string is a valid OAI identifier
pub fn is_valid_oai(identifier: &str) -> bool {
    OAI_PATTERN.is_match(identifier)
}

/// Check if a string can be used as the repository part of an OAI identifier
pub fn is_valid_oai_repository(repository: &str) -> bool {
    OAI_REPOSITORY_PATTERN.is_match(repository)
}

/// Normalize an OAI identifier (the `oai` scheme is case-insensitive)
pub fn normalize_oai(identifier: &str) -> String {
    let trimmed = identifier.trim();
    match trimmed.get(..4) {
        Some(scheme) if scheme.eq_ignore_ascii_case("oai:") => format!("oai:{}", &trimmed[4..]),
        _ => trimmed.to_string(),
    }
}

/// Build an OAI identifier from a repository identifier and a local id
pub fn oai_identifier(repository: &str, local_id: &str) -> String {
    format!("oai:{}:{}", repository, local_id)
}

/// Get the repository part of an OAI identifier
pub fn oai_repository(identifier: &str) -> Option<&str> {
    let rest = identifier.strip_prefix("oai:")?;
    let (repository, local) = rest.split_once(':')?;
    if local.is_empty() {
        return None;
    }
    Some(repository)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_valid_dois() {
        assert!(is_valid_doi("10.1038/nature12373"));
        assert!(is_valid_doi("10.1126/science.1234567"));
        assert!(is_valid_doi("10.1000.10/182"));
        assert!(is_valid_doi("10.5281/zenodo.1234"));
    }

    #[test]
    fn test_invalid_dois() {
        assert!(!is_valid_doi("11.1038/nature12373")); // Wrong directory
        assert!(!is_valid_doi("10.12/test")); // Registrant too short
        assert!(!is_valid_doi("nature12373"));
        assert!(!is_valid_doi("10.1038/"));
        assert!(!is_valid_doi("https://doi.org/10.1038/nature12373"));
    }

    #[rstest]
    #[case("10.1038/nature12373", "10.1038/nature12373")]
    #[case("doi:10.1038/nature12373", "10.1038/nature12373")]
    #[case("DOI:10.1038/nature12373", "10.1038/nature12373")]
    #[case("https://doi.org/10.1038/nature12373", "10.1038/nature12373")]
    #[case("HTTPS://DX.DOI.ORG/10.1038/nature12373", "10.1038/nature12373")]
    #[case("  10.1038/nature12373. ", "10.1038/nature12373")]
    #[case("10.1234/ABC.def", "10.1234/ABC.def")]
    fn test_normalize_doi(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_doi(input), expected);
    }

    #[test]
    fn test_doi_prefix() {
        assert_eq!(doi_prefix("10.1234/abc"), Some("10.1234"));
        assert_eq!(doi_prefix("10.1234.5/abc/def"), Some("10.1234.5"));
        assert_eq!(doi_prefix("10.1234/"), None);
        assert_eq!(doi_prefix("abc/def"), None);
        assert_eq!(doi_prefix("10.1234"), None);
    }

    #[test]
    fn test_doi_has_prefix() {
        let allowed = vec!["10.1234".to_string(), "10.5678".to_string()];
        assert!(doi_has_prefix("10.1234/abc", &allowed));
        assert!(doi_has_prefix("10.5678/abc", &allowed));
        assert!(!doi_has_prefix("10.9999/abc", &allowed));
        assert!(!doi_has_prefix("garbage", &allowed));
    }

    #[test]
    fn test_valid_oai() {
        assert!(is_valid_oai("oai:repo.example.org:1234"));
        assert!(is_valid_oai("oai:zenodo.org:abcd-1234"));
        assert!(!is_valid_oai("oai:localhost:1234")); // Repository needs a domain
        assert!(!is_valid_oai("oai:repo.example.org:"));
        assert!(!is_valid_oai("repo.example.org:1234"));
    }

    #[test]
    fn test_normalize_oai() {
        assert_eq!(normalize_oai(" OAI:repo.example.org:1 "), "oai:repo.example.org:1");
        assert_eq!(normalize_oai("oai:repo.example.org:1"), "oai:repo.example.org:1");
        assert_eq!(normalize_oai("x"), "x");
    }

    #[test]
    fn test_oai_parts() {
        let id = oai_identifier("repo.example.org", "abc");
        assert_eq!(id, "oai:repo.example.org:abc");
        assert_eq!(oai_repository(&id), Some("repo.example.org"));
        assert_eq!(oai_repository("oai:repo.example.org:"), None);
        assert!(is_valid_oai_repository("repo.example.org"));
        assert!(!is_valid_oai_repository("localhost"));
    }
}
