//! End-to-end tests for loading, validating and freezing the standard stack.

use confstack_config::{
    ConfigError, ConfigManager, DatabaseDetails, ErrorKind, LayerScope, LoadOptions, LogLevel,
    RedactionPolicy, ValidationCheck, ValidationRules,
};
use confstack_test_utils::ConfigFixture;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn load(fixture: &ConfigFixture, environment: &str) -> ConfigManager {
    ConfigManager::load(LoadOptions::from_dir(fixture.path()).with_environment(environment))
        .expect("load")
}

#[test]
fn development_stack_merges_defaults_and_overrides() {
    let fixture = ConfigFixture::sample();
    let manager = load(&fixture, "development");

    assert_eq!(manager.environment(), "development");
    assert_eq!(manager.get("log_level"), Some(&json!("DEBUG")));
    assert_eq!(manager.get("model_type"), Some(&json!("gpt-like")));
    assert_eq!(manager.get("features.enable_feature_x"), Some(&json!(true)));
    assert_eq!(manager.get("features.debug_toolbar"), Some(&json!(true)));
    assert_eq!(
        manager.get("cloud_details.sample_domain.region"),
        Some(&json!("us-east-1"))
    );
    assert_eq!(
        manager.get("database.sample_domain.host"),
        Some(&json!("localhost"))
    );
    assert_eq!(manager.log_level(), Some(LogLevel::Debug));
    assert_eq!(manager.layers().len(), 4);
    assert!(
        manager
            .layers()
            .iter()
            .all(|layer| layer.scopes.contains(&LayerScope::Default))
    );
}

#[test]
fn production_stack_hides_development_keys() {
    let fixture = ConfigFixture::sample();
    let manager = load(&fixture, "production");

    assert_eq!(manager.get("log_level"), Some(&json!("WARNING")));
    assert_eq!(manager.get("features.debug_toolbar"), None);
    assert_eq!(
        manager.get("cloud_details.sample_domain.region"),
        Some(&json!("eu-west-1"))
    );
    assert_eq!(
        manager.get("cloud_details.sample_domain.provider"),
        Some(&json!("aws"))
    );
    assert_eq!(
        manager.get("database.sample_domain.host"),
        Some(&json!("db.prod.internal"))
    );
    assert_eq!(manager.get("database.sample_domain.port"), Some(&json!(5432)));
    assert_eq!(manager.log_level(), Some(LogLevel::Warn));
}

#[test]
fn validation_freezes_and_reports_placeholder_warning() {
    let fixture = ConfigFixture::sample();
    let mut manager = load(&fixture, "development");
    assert!(!manager.is_frozen());

    let report = manager
        .validate(&ValidationRules::default())
        .expect("valid");
    assert!(manager.is_frozen());
    assert_eq!(report.error_count(), 0);
    assert_eq!(report.warning_count(), 1);
    assert!(report.mentions(ValidationCheck::Placeholders, "cloud_secrets.sample_domain.api_key"));
}

#[test]
fn production_validation_is_clean() {
    let fixture = ConfigFixture::sample();
    let mut manager = load(&fixture, "production");
    let report = manager
        .validate(&ValidationRules::default().require_domain("sample_domain"))
        .expect("valid");
    assert!(report.findings().is_empty(), "{report}");
}

#[test]
fn strict_mode_makes_placeholder_fatal() {
    let fixture = ConfigFixture::sample();
    let mut manager = load(&fixture, "development");

    let err = manager
        .validate(&ValidationRules::default().strict(true))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let report = err.report().expect("report");
    assert!(report.mentions(ValidationCheck::Placeholders, "REPLACE_ME"));
    assert!(!manager.is_frozen());
}

#[test]
fn database_domain_without_cloud_entry_fails_validation() {
    let fixture = ConfigFixture::sample();
    fixture.write(
        "database.yaml",
        "default:\n  database:\n    sample_domain:\n      port: 5432\n    billing:\n      port: 5433\n",
    );
    let mut manager = load(&fixture, "production");

    let err = manager.validate(&ValidationRules::default()).unwrap_err();
    let report = err.report().expect("report");
    assert_eq!(report.error_count(), 1);
    assert!(report.mentions(ValidationCheck::DomainMatching, "'billing'"));
    assert!(err.to_string().contains("database.billing"));
}

#[test]
fn missing_required_key_fails_validation() {
    let fixture = ConfigFixture::sample();
    fixture.write("app.yaml", "default:\n  model_type: gpt-like\n");
    let mut manager = load(&fixture, "production");

    let err = manager.validate(&ValidationRules::default()).unwrap_err();
    let report = err.report().expect("report");
    assert!(report.mentions(ValidationCheck::RequiredKeys, "log_level"));
}

#[test]
fn missing_required_domain_is_named() {
    let fixture = ConfigFixture::sample();
    let mut manager = load(&fixture, "production");
    let err = manager
        .validate(&ValidationRules::default().require_domain("search"))
        .unwrap_err();
    let report = err.report().expect("report");
    assert!(report.mentions(ValidationCheck::DomainPresence, "search"));
}

#[test]
fn missing_file_fails_load() {
    let fixture = ConfigFixture::sample();
    fixture.remove("secrets.yaml");
    let err = ConfigManager::load(LoadOptions::from_dir(fixture.path())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Load);
    assert!(err.to_string().contains("secrets.yaml"));
}

#[test]
fn get_returns_default_for_missing_keys() {
    let fixture = ConfigFixture::sample();
    let manager = load(&fixture, "production");

    assert_eq!(manager.get("nope.deeper.still"), None);
    assert_eq!(manager.get_or("cache.ttl", json!(300)), json!(300));
    assert_eq!(manager.get_or("model_type", json!("fallback")), json!("gpt-like"));
    assert_eq!(manager.get_as::<u64>("cache.ttl").expect("absent"), None);
}

#[test]
fn get_required_names_the_missing_key() {
    let fixture = ConfigFixture::sample();
    let manager = load(&fixture, "production");

    let err = manager.get_required("cloud_details.billing.provider").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Key);
    match err {
        ConfigError::MissingKey(key) => assert_eq!(key, "cloud_details.billing.provider"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        manager
            .get_required("Cloud_Details.Sample_Domain.Provider")
            .expect("present"),
        &json!("aws")
    );
}

#[test]
fn typed_access_decodes_values() {
    let fixture = ConfigFixture::sample();
    let manager = load(&fixture, "production");

    let port: u16 = manager
        .get_required_as("database.sample_domain.port")
        .expect("port");
    assert_eq!(port, 5432);

    let details: DatabaseDetails = manager
        .get_required_as("database.sample_domain")
        .expect("details");
    assert_eq!(details.host.as_deref(), Some("db.prod.internal"));

    let err = manager
        .get_as::<u16>("cloud_details.sample_domain.provider")
        .unwrap_err();
    assert!(matches!(err, ConfigError::DecodeFailed { .. }));

    let app = manager.typed().expect("typed");
    assert!(app.feature_enabled("enable_feature_x"));
    assert_eq!(app.api_key("sample_domain"), Some("sk-prod-4f9a8b7c6d5e"));
}

#[test]
fn mutation_fails_after_freeze() {
    let fixture = ConfigFixture::sample();
    let mut manager = load(&fixture, "development");

    manager.set("cache.ttl", 60).expect("set before freeze");
    assert_eq!(manager.get("cache.ttl"), Some(&json!(60)));

    manager.freeze();
    manager.freeze();
    assert!(manager.is_frozen());

    let err = manager.set("cache.ttl", 120).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Frozen);
    assert!(matches!(err, ConfigError::Frozen(ref key) if key == "cache.ttl"));
    assert_eq!(manager.get("cache.ttl"), Some(&json!(60)));
}

#[test]
fn bootstrap_returns_frozen_handle() {
    let fixture = ConfigFixture::sample();
    let (manager, report) = ConfigManager::bootstrap(
        LoadOptions::from_dir(fixture.path()).with_environment("production"),
        &ValidationRules::default(),
    )
    .expect("bootstrap");
    assert!(manager.is_frozen());
    assert!(!report.has_errors());

    let shared = Arc::new(manager);
    let reader = Arc::clone(&shared);
    let handle = std::thread::spawn(move || reader.get_or("model_type", json!(null)));
    assert_eq!(handle.join().expect("join"), json!("gpt-like"));
}

#[test]
fn redacted_view_masks_api_keys() {
    let fixture = ConfigFixture::sample();
    let manager = load(&fixture, "production");
    let redacted = manager.redacted(&RedactionPolicy::default());
    assert_eq!(
        redacted["cloud_secrets"]["sample_domain"]["api_key"],
        json!("[REDACTED]")
    );
    assert_eq!(redacted["database"]["sample_domain"]["port"], json!(5432));
}
