// SPDX-License-Identifier: MIT OR Apache-2.0
//! Deep validation tests for `errata-config`.

use errata_config::{
    Catalog, CatalogConfig, ConfigError, ConfigWarning, DomainEntry, KindEntry, SectionEntry,
    load_config, merge_configs, parse_toml, validate_config,
};
use errata_error::Sensitivity;
use std::collections::BTreeMap;
use std::io::Write;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn kind(title: &str, friendly: &str) -> KindEntry {
    KindEntry {
        title: title.into(),
        friendly: friendly.into(),
        technical: None,
        sensitivity: None,
    }
}

fn section(title: &str, kinds: &[(&str, KindEntry)]) -> SectionEntry {
    SectionEntry {
        title: title.into(),
        kinds: kinds
            .iter()
            .map(|(code, k)| (code.to_string(), k.clone()))
            .collect(),
    }
}

fn domain(title: &str, sections: &[(&str, SectionEntry)]) -> DomainEntry {
    DomainEntry {
        title: title.into(),
        default_sensitivity: None,
        sections: sections
            .iter()
            .map(|(key, s)| (key.to_string(), s.clone()))
            .collect(),
    }
}

/// Fully-specified catalog with no validation warnings.
fn fully_valid_config() -> CatalogConfig {
    CatalogConfig {
        domains: BTreeMap::from([(
            "svc".to_string(),
            domain(
                "Service",
                &[(
                    "db",
                    section(
                        "Database",
                        &[
                            ("ConnFailed", kind("Connection failed", "Could not connect to {{host}}.")),
                            ("Timeout", kind("Timed out", "No answer after {{ms}}ms.")),
                        ],
                    ),
                )],
            ),
        )]),
        ..Default::default()
    }
}

/// Extract error reasons from a `ConfigError::ValidationError`.
fn validation_reasons(err: ConfigError) -> Vec<String> {
    match err {
        ConfigError::ValidationError { reasons } => reasons,
        other => panic!("expected ValidationError, got {other:?}"),
    }
}

// ===========================================================================
// 1. Valid catalogs
// ===========================================================================

#[test]
fn fully_specified_catalog_has_no_warnings() {
    let warnings = validate_config(&fully_valid_config()).unwrap();
    assert!(warnings.is_empty(), "expected zero warnings: {warnings:?}");
}

#[test]
fn every_failure_level_is_accepted() {
    for level in ["debug", "info", "warn", "warning", "error", "WARN"] {
        let mut cfg = fully_valid_config();
        cfg.render.failure_level = Some(level.into());
        validate_config(&cfg).unwrap_or_else(|e| panic!("{level}: {e}"));
    }
}

#[test]
fn helper_heavy_templates_validate() {
    let mut cfg = fully_valid_config();
    cfg.domains.get_mut("svc").unwrap().sections.insert(
        "net".into(),
        section(
            "Network",
            &[(
                "Unreachable",
                KindEntry {
                    technical: Some(
                        "{{#enum hops}}{{pre this}}{{#if @last}} (last){{/if}}{{/enum}}".into(),
                    ),
                    ..kind("Unreachable", "Tried {{#join hosts}}{{em this}}{{/join}}.")
                },
            )],
        ),
    );
    assert!(validate_config(&cfg).unwrap().is_empty());
}

// ===========================================================================
// 2. Hard errors
// ===========================================================================

#[test]
fn empty_and_punctuated_keys_are_rejected() {
    let mut cfg = fully_valid_config();
    let svc = cfg.domains["svc"].clone();
    cfg.domains.insert(String::new(), svc.clone());
    cfg.domains.insert("svc.v2".into(), svc);
    let reasons = validation_reasons(validate_config(&cfg).unwrap_err());
    assert!(reasons.iter().any(|r| r.contains("domain key ''")));
    assert!(reasons.iter().any(|r| r.contains("domain key 'svc.v2'")));
}

#[test]
fn bad_section_keys_and_codes_are_rejected() {
    let cfg = CatalogConfig {
        domains: BTreeMap::from([(
            "svc".to_string(),
            domain(
                "Service",
                &[("d b", section("Spaces", &[("Conn Failed", kind("t", "f"))]))],
            ),
        )]),
        ..Default::default()
    };
    let reasons = validation_reasons(validate_config(&cfg).unwrap_err());
    assert_eq!(reasons.len(), 2, "{reasons:?}");
    assert!(reasons[0].contains("section key 'svc.d b'"));
    assert!(reasons[1].contains("code 'svc.d b.Conn Failed'"));
}

#[test]
fn colliding_ids_are_rejected() {
    let cfg = CatalogConfig {
        domains: BTreeMap::from([
            (
                "a_b".to_string(),
                domain("AB", &[("c", section("C", &[("X", kind("x", "x"))]))]),
            ),
            (
                "a".to_string(),
                domain("A", &[("b_c", section("BC", &[("X", kind("x", "x"))]))]),
            ),
        ]),
        ..Default::default()
    };
    let reasons = validation_reasons(validate_config(&cfg).unwrap_err());
    assert_eq!(reasons.len(), 1);
    assert!(reasons[0].contains("a_b_c_X"));
}

#[test]
fn every_broken_template_is_reported() {
    let mut cfg = fully_valid_config();
    let db = cfg
        .domains
        .get_mut("svc")
        .and_then(|d| d.sections.get_mut("db"))
        .unwrap();
    db.kinds.get_mut("ConnFailed").unwrap().friendly = "{{#each x}}".into();
    db.kinds.get_mut("Timeout").unwrap().technical = Some("{{/if}}".into());
    let reasons = validation_reasons(validate_config(&cfg).unwrap_err());
    assert_eq!(reasons.len(), 2);
    assert!(reasons[0].contains("svc.db.ConnFailed': friendly template"));
    assert!(reasons[1].contains("svc.db.Timeout': technical template"));
}

#[test]
fn unknown_helpers_are_not_a_validation_error() {
    let mut cfg = fully_valid_config();
    cfg.domains
        .get_mut("svc")
        .and_then(|d| d.sections.get_mut("db"))
        .and_then(|s| s.kinds.get_mut("Timeout"))
        .unwrap()
        .friendly = "{{custom_helper ms}}".into();
    assert!(validate_config(&cfg).is_ok());
}

// ===========================================================================
// 3. Warnings
// ===========================================================================

#[test]
fn whitespace_titles_warn() {
    let mut cfg = fully_valid_config();
    cfg.domains.get_mut("svc").unwrap().title = "   ".into();
    let warnings = validate_config(&cfg).unwrap();
    assert_eq!(
        warnings,
        vec![ConfigWarning::MissingTitle { path: "svc".into() }]
    );
}

#[test]
fn warnings_display_their_path() {
    let cfg = parse_toml("[domains.svc.sections.db]\ntitle = \"Database\"").unwrap();
    let warnings = validate_config(&cfg).unwrap();
    let text: Vec<String> = warnings.iter().map(ToString::to_string).collect();
    assert!(text.contains(&"'svc' has no title".to_string()));
    assert!(text.contains(&"section 'svc.db' declares no kinds".to_string()));
}

// ===========================================================================
// 4. Files, merging and the registry
// ===========================================================================

#[test]
fn load_merge_and_build() {
    let mut base = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        base,
        r#"
[domains.svc]
title = "Service"
default_sensitivity = "bug"

[domains.svc.sections.db]
title = "Database"

[domains.svc.sections.db.kinds.ConnFailed]
title = "Connection failed"
friendly = "Could not connect to {{{{host}}}}."
"#
    )
    .unwrap();
    let overlay = parse_toml(
        r#"
        default_sensitivity = "none"

        [domains.svc.sections.db.kinds.Timeout]
        title = "Timed out"
        friendly = "No answer."
        sensitivity = "edge"
        "#,
    )
    .unwrap();

    let merged = merge_configs(load_config(Some(base.path())).unwrap(), overlay);
    let catalog = Catalog::from_config(&merged).unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(
        catalog.get("svc_db_ConnFailed").unwrap().sensitivity(),
        Sensitivity::Bug
    );
    assert_eq!(
        catalog.get("svc_db_Timeout").unwrap().sensitivity(),
        Sensitivity::Edge
    );

    let err = catalog
        .error("svc_db_ConnFailed")
        .unwrap()
        .with_argument("host", "db1");
    assert_eq!(err.description().friendly(), "Could not connect to db1.");
    assert_eq!(err.sensitivity(), Sensitivity::Bug);
}

#[test]
fn config_round_trips_through_toml() {
    let cfg = fully_valid_config();
    let text = toml::to_string(&cfg).unwrap();
    assert_eq!(parse_toml(&text).unwrap(), cfg);
}

#[test]
fn config_serialises_to_json() {
    let json = serde_json::to_value(fully_valid_config()).unwrap();
    assert_eq!(
        json["domains"]["svc"]["sections"]["db"]["kinds"]["Timeout"]["title"],
        "Timed out"
    );
    assert!(json.get("default_sensitivity").is_none());
}
