// SPDX-License-Identifier: MIT OR Apache-2.0
//! Catalogs loaded from TOML files on disk, layered, and used to raise
//! errors.

use std::io::Write;

use errata_config::{
    Catalog, ConfigError, apply_overrides_from, load_config, merge_configs, parse_toml,
};
use errata_error::{ErrataError, HttpMetadata, Sensitivity};
use tempfile::NamedTempFile;

const BASE: &str = r#"
[render]
failure_level = "debug"

[domains.svc]
title = "Service"

[domains.svc.sections.db]
title = "Database"

[domains.svc.sections.db.kinds.ConnFailed]
title = "Connection failed"
friendly = "Could not reach {{#join hosts}}{{em this}}{{/join}}."
technical = "connect() to {{#enum hosts}}{{pre this}}{{/enum}} failed"

[domains.svc.sections.db.kinds.Timeout]
title = "Timed out"
friendly = "No answer after {{ms}}ms."
sensitivity = "none"
"#;

const OVERLAY: &str = r#"
default_sensitivity = "bug"

[domains.svc.sections.db.kinds.Timeout]
title = "Timed out"
friendly = "Gave up after {{ms}}ms."
sensitivity = "none"

[domains.auth]
title = "Auth"

[domains.auth.sections.token]
title = "Tokens"

[domains.auth.sections.token.kinds.Expired]
title = "Expired"
friendly = "Token for {{quote user}} expired."
"#;

fn write_toml(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn base_file_builds_a_usable_catalog() {
    let file = write_toml(BASE);
    let config = load_config(Some(file.path())).unwrap();
    let catalog = Catalog::from_config(&config).unwrap();

    assert_eq!(catalog.len(), 2);
    let err = catalog
        .error("svc_db_ConnFailed")
        .unwrap()
        .with_argument("hosts", vec!["a", "b", "c"])
        .with_metadata(HttpMetadata::new(503));

    assert_eq!(err.description().friendly(), "Could not reach *a*, *b*, and *c*.");
    assert_eq!(
        err.description().technical(),
        "connect() to * `a`\n* `b`\n* `c` failed"
    );
    assert_eq!(err.sensitivity(), Sensitivity::Edge);
    assert_eq!(err.metadata().http().map(|h| h.status), Some(503));
}

#[test]
fn overlay_replaces_kinds_and_adds_domains() {
    let base = parse_toml(BASE).unwrap();
    let overlay = parse_toml(OVERLAY).unwrap();
    let merged = merge_configs(base, overlay);
    let catalog = Catalog::from_config(&merged).unwrap();

    assert_eq!(catalog.len(), 3);
    let ids: Vec<_> = catalog.ids().collect();
    assert_eq!(ids, ["auth_token_Expired", "svc_db_ConnFailed", "svc_db_Timeout"]);

    let timeout = catalog.error("svc_db_Timeout").unwrap().with_argument("ms", 250u64);
    assert_eq!(timeout.description().friendly(), "Gave up after 250ms.");
    assert_eq!(timeout.sensitivity(), Sensitivity::None);

    // Catalog-wide default from the overlay.
    let expired = catalog.get("auth_token_Expired").unwrap();
    assert_eq!(expired.sensitivity(), Sensitivity::Bug);
    // Render settings survive the merge.
    assert_eq!(merged.render.failure_level.as_deref(), Some("debug"));
}

#[test]
fn technical_defaults_to_friendly() {
    let catalog = Catalog::from_config(&parse_toml(BASE).unwrap()).unwrap();
    let err = catalog.error("svc_db_Timeout").unwrap().with_argument("ms", 5u64);
    assert_eq!(err.description().technical(), err.description().friendly());
}

#[test]
fn overrides_apply_on_top_of_file() {
    let mut config = parse_toml(BASE).unwrap();
    apply_overrides_from(&mut config, |key| match key {
        "ERRATA_DEFAULT_SENSITIVITY" => Some("all".into()),
        "ERRATA_FAILURE_LEVEL" => Some("error".into()),
        _ => None,
    })
    .unwrap();
    let catalog = Catalog::from_config(&config).unwrap();
    assert_eq!(
        catalog.get("svc_db_ConnFailed").unwrap().sensitivity(),
        Sensitivity::All
    );
    assert_eq!(
        catalog.get("svc_db_Timeout").unwrap().sensitivity(),
        Sensitivity::None
    );
}

#[test]
fn bad_override_is_rejected() {
    let mut config = parse_toml(BASE).unwrap();
    let err = apply_overrides_from(&mut config, |key| {
        (key == "ERRATA_DEFAULT_SENSITIVITY").then(|| "extreme".into())
    })
    .unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn missing_file_and_bad_toml() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(matches!(
        load_config(Some(&missing)),
        Err(ConfigError::FileNotFound { .. })
    ));

    let file = write_toml("[domains.svc\ntitle = ");
    assert!(matches!(
        load_config(Some(file.path())),
        Err(ConfigError::ParseError { .. })
    ));
}

#[test]
fn catalog_errors_nest_with_foreign_causes() {
    let catalog = Catalog::from_config(&parse_toml(BASE).unwrap()).unwrap();
    let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "read timed out");
    let err: ErrataError = catalog
        .error("svc_db_Timeout")
        .unwrap()
        .with_argument("ms", 30_000u64)
        .with_cause(io);
    assert_eq!(err.causes().len(), 1);
    assert_eq!(err.causes()[0].description().friendly(), "read timed out");
    assert_eq!(err.causes()[0].sensitivity(), Sensitivity::Edge);
}
