//! Configuration loading and manager construction tests

mod common;

use std::io::Write;
use std::sync::Arc;

use common::fixtures::{fixture_path, load_config, load_fixture};
use common::transport::ScriptedTransport;
use impress_pids::{
    ConfigError, IdentifierSyntax, InMemoryPidStore, PidManager, PidsConfig, ProviderKind,
};

fn manager(config: &PidsConfig) -> impress_pids::Result<PidManager> {
    PidManager::from_config(
        config,
        Arc::new(InMemoryPidStore::new()),
        Arc::new(ScriptedTransport::success()),
    )
}

#[test]
fn test_load_toml_fixture() {
    let config = load_config("pids.toml");
    assert_eq!(config.required_schemes, vec!["doi"]);
    let doi = config.scheme("doi").unwrap();
    assert_eq!(doi.syntax, IdentifierSyntax::Doi);
    assert_eq!(doi.default, "crossref");
    assert_eq!(doi.providers[0].kind, ProviderKind::Crossref);
    assert_eq!(config.crossref.timeout_secs, 5);
    assert_eq!(
        config.crossref.landing_page("r1").as_deref(),
        Some("https://repo.example.org/records/r1")
    );
}

#[test]
fn test_load_json_fixture() {
    let config = load_config("pids.json");
    assert_eq!(config.effective_required_schemes(), vec!["oai"]);
    let manager = manager(&config).unwrap();
    assert_eq!(manager.required_schemes(), &["oai".to_string()]);
    assert!(!config.crossref.enabled);
}

#[test]
fn test_load_rejects_invalid_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[schemes.doi]\nlabel = \"DOI\"\ndefault = \"crossref\"\nproviders = []").unwrap();

    let err = PidsConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_load_reports_parse_and_io_errors() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "required_schemes = doi").unwrap();
    assert!(matches!(
        PidsConfig::load(file.path()),
        Err(ConfigError::Parse(_))
    ));

    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        PidsConfig::load(&dir.path().join("missing.toml")),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn test_toml_and_saved_copy_agree() {
    let config = load_config("pids.toml");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saved.toml");
    std::fs::write(&path, config.to_toml().unwrap()).unwrap();

    let reloaded = PidsConfig::load(&path).unwrap();
    assert_eq!(reloaded.schemes.len(), config.schemes.len());
    assert_eq!(reloaded.crossref.allowed_prefixes(), config.crossref.allowed_prefixes());
    assert!(fixture_path("pids.toml").exists());
    assert!(load_fixture("pids.toml").contains("[crossref]"));
}

#[test]
fn test_required_scheme_without_enabled_provider() {
    let mut config = load_config("pids.toml");
    config.crossref.enabled = false;
    config
        .schemes
        .get_mut("doi")
        .unwrap()
        .providers
        .retain(|p| p.kind == ProviderKind::Crossref);

    let err = manager(&config).err().unwrap();
    assert!(err.is_configuration());
}

#[test]
fn test_disabled_optional_scheme_is_dropped() {
    let mut config = load_config("pids.toml");
    config.oai.id_prefix = None;

    let manager = manager(&config).unwrap();
    assert!(!manager.providers().contains("oai"));
    assert!(manager.providers().contains("doi"));
}
