// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error catalogs: loading, validation and merging of TOML declarations,
//! plus the runtime [`Catalog`] registry built from them.
//!
//! A catalog declares domains, their sections and the error kinds inside
//! each section. [`Catalog::from_config`] turns a validated
//! [`CatalogConfig`] into an explicit map from error ID to
//! [`ErrorKind`](errata_error::ErrorKind).
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod catalog;

pub use catalog::Catalog;

use errata_error::{Sensitivity, compose_id, is_word_token};
use errata_template::FailureLevel;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during catalog loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested catalog file was not found.
    #[error("catalog file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file, or an environment override, could not be parsed.
    #[error("failed to parse catalog: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("catalog validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory issues that do not prevent building a [`Catalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A domain, section or kind has no title.
    MissingTitle {
        /// Dotted path of the entry, e.g. `svc.db.ConnFailed`.
        path: String,
    },
    /// A kind has an empty friendly template, so end users see nothing.
    EmptyFriendly {
        /// Dotted path of the kind.
        path: String,
    },
    /// A section declares no kinds.
    EmptySection {
        /// Dotted path of the section.
        path: String,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::MissingTitle { path } => write!(f, "'{path}' has no title"),
            ConfigWarning::EmptyFriendly { path } => {
                write!(f, "'{path}' has an empty friendly description")
            }
            ConfigWarning::EmptySection { path } => write!(f, "section '{path}' declares no kinds"),
        }
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// A complete error catalog.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Rendering settings.
    #[serde(default)]
    pub render: RenderSettings,

    /// Sensitivity for kinds whose domain and entry leave it unset.
    /// Falls back to `edge`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sensitivity: Option<Sensitivity>,

    /// Domains keyed by domain key.
    #[serde(default)]
    pub domains: BTreeMap<String, DomainEntry>,
}

/// How descriptions are rendered.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct RenderSettings {
    /// Level at which template failures are logged: `debug`, `info`,
    /// `warn` (default) or `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_level: Option<String>,
}

impl RenderSettings {
    /// The configured failure level, `warn` when unset.
    pub fn failure_level(&self) -> Result<FailureLevel, ConfigError> {
        match &self.failure_level {
            None => Ok(FailureLevel::default()),
            Some(level) => level
                .parse()
                .map_err(|reason| ConfigError::ValidationError {
                    reasons: vec![format!("render.failure_level: {reason}")],
                }),
        }
    }
}

/// One domain.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DomainEntry {
    /// Human-readable name.
    #[serde(default)]
    pub title: String,

    /// Sensitivity for kinds in this domain that leave it unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sensitivity: Option<Sensitivity>,

    /// Sections keyed by section key.
    #[serde(default)]
    pub sections: BTreeMap<String, SectionEntry>,
}

/// One section within a domain.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct SectionEntry {
    /// Human-readable name.
    #[serde(default)]
    pub title: String,

    /// Kinds keyed by code.
    #[serde(default)]
    pub kinds: BTreeMap<String, KindEntry>,
}

/// One error kind.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct KindEntry {
    /// Short human label.
    #[serde(default)]
    pub title: String,

    /// End-user description template.
    #[serde(default)]
    pub friendly: String,

    /// Operator-facing description template. Defaults to `friendly`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical: Option<String>,

    /// Default sensitivity. Falls back to the domain's, then the catalog's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<Sensitivity>,
}

impl CatalogConfig {
    /// Sensitivity a kind starts at: the kind's own, else its domain's, else
    /// the catalog default, else [`Sensitivity::Edge`].
    pub fn resolve_sensitivity(&self, domain: &DomainEntry, kind: &KindEntry) -> Sensitivity {
        kind.sensitivity
            .or(domain.default_sensitivity)
            .or(self.default_sensitivity)
            .unwrap_or(Sensitivity::Edge)
    }

    /// Number of kinds across all domains and sections.
    pub fn kind_count(&self) -> usize {
        self.domains
            .values()
            .flat_map(|d| d.sections.values())
            .map(|s| s.kinds.len())
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a [`CatalogConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, starts from an empty catalog.
///
/// Environment variable overrides are applied on top in both cases.
pub fn load_config(path: Option<&Path>) -> Result<CatalogConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => CatalogConfig::default(),
    };
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Parse a TOML string into a [`CatalogConfig`].
pub fn parse_toml(content: &str) -> Result<CatalogConfig, ConfigError> {
    toml::from_str::<CatalogConfig>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Overrides the failure level.
pub const ENV_FAILURE_LEVEL: &str = "ERRATA_FAILURE_LEVEL";

/// Overrides the catalog-wide default sensitivity.
pub const ENV_DEFAULT_SENSITIVITY: &str = "ERRATA_DEFAULT_SENSITIVITY";

/// Apply environment variable overrides.
///
/// Recognised variables:
/// - `ERRATA_FAILURE_LEVEL`
/// - `ERRATA_DEFAULT_SENSITIVITY`
pub fn apply_env_overrides(config: &mut CatalogConfig) -> Result<(), ConfigError> {
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

/// [`apply_env_overrides`] with an arbitrary variable source.
pub fn apply_overrides_from(
    config: &mut CatalogConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(val) = lookup(ENV_FAILURE_LEVEL) {
        config.render.failure_level = Some(val);
    }
    if let Some(val) = lookup(ENV_DEFAULT_SENSITIVITY) {
        let sensitivity = val.parse().map_err(|e| ConfigError::ParseError {
            reason: format!("{ENV_DEFAULT_SENSITIVITY}: {e}"),
        })?;
        config.default_sensitivity = Some(sensitivity);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed catalog, returning advisory warnings.
///
/// Hard errors (malformed keys or codes, unparseable templates, colliding
/// IDs, unknown failure level) are returned as a
/// [`ConfigError::ValidationError`]; soft issues come back as warnings.
pub fn validate_config(config: &CatalogConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();
    let mut ids: BTreeMap<String, String> = BTreeMap::new();

    if let Some(ref level) = config.render.failure_level
        && level.parse::<FailureLevel>().is_err()
    {
        errors.push(format!(
            "invalid render.failure_level '{level}' (expected one of {})",
            FailureLevel::NAMES.join(", ")
        ));
    }

    for (domain_key, domain) in &config.domains {
        if !is_word_token(domain_key) {
            errors.push(format!(
                "domain key '{domain_key}' must be non-empty ASCII letters, digits or '_'"
            ));
        }
        if domain.title.trim().is_empty() {
            warnings.push(ConfigWarning::MissingTitle {
                path: domain_key.clone(),
            });
        }

        for (section_key, section) in &domain.sections {
            let section_path = format!("{domain_key}.{section_key}");
            if !is_word_token(section_key) {
                errors.push(format!(
                    "section key '{section_path}' must be non-empty ASCII letters, digits or '_'"
                ));
            }
            if section.title.trim().is_empty() {
                warnings.push(ConfigWarning::MissingTitle {
                    path: section_path.clone(),
                });
            }
            if section.kinds.is_empty() {
                warnings.push(ConfigWarning::EmptySection {
                    path: section_path.clone(),
                });
            }

            for (code, kind) in &section.kinds {
                let path = format!("{section_path}.{code}");
                if !is_word_token(code) {
                    errors.push(format!(
                        "code '{path}' must be non-empty ASCII letters, digits or '_'"
                    ));
                }
                if kind.title.trim().is_empty() {
                    warnings.push(ConfigWarning::MissingTitle { path: path.clone() });
                }
                if kind.friendly.trim().is_empty() {
                    warnings.push(ConfigWarning::EmptyFriendly { path: path.clone() });
                }

                if let Err(e) = errata_template::parse(&kind.friendly) {
                    errors.push(format!("'{path}': friendly template: {e}"));
                }
                if let Some(ref technical) = kind.technical
                    && let Err(e) = errata_template::parse(technical)
                {
                    errors.push(format!("'{path}': technical template: {e}"));
                }

                let id = compose_id(domain_key, section_key, code);
                if let Some(previous) = ids.insert(id.clone(), path.clone()) {
                    errors.push(format!(
                        "'{path}' and '{previous}' both produce the id '{id}'"
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge two catalogs. Values in `overlay` take precedence over `base`.
///
/// Domains and sections are merged recursively; non-empty overlay titles
/// replace base titles. Kinds are replaced whole on code collisions.
pub fn merge_configs(base: CatalogConfig, overlay: CatalogConfig) -> CatalogConfig {
    let mut domains = base.domains;
    for (key, over) in overlay.domains {
        let merged = match domains.remove(&key) {
            Some(under) => merge_domain(under, over),
            None => over,
        };
        domains.insert(key, merged);
    }
    CatalogConfig {
        render: RenderSettings {
            failure_level: overlay
                .render
                .failure_level
                .or(base.render.failure_level),
        },
        default_sensitivity: overlay.default_sensitivity.or(base.default_sensitivity),
        domains,
    }
}

fn merge_domain(base: DomainEntry, overlay: DomainEntry) -> DomainEntry {
    let mut sections = base.sections;
    for (key, over) in overlay.sections {
        let merged = match sections.remove(&key) {
            Some(under) => merge_section(under, over),
            None => over,
        };
        sections.insert(key, merged);
    }
    DomainEntry {
        title: prefer_non_empty(overlay.title, base.title),
        default_sensitivity: overlay.default_sensitivity.or(base.default_sensitivity),
        sections,
    }
}

fn merge_section(base: SectionEntry, overlay: SectionEntry) -> SectionEntry {
    let mut kinds = base.kinds;
    kinds.extend(overlay.kinds);
    SectionEntry {
        title: prefer_non_empty(overlay.title, base.title),
        kinds,
    }
}

fn prefer_non_empty(overlay: String, base: String) -> String {
    if overlay.is_empty() { base } else { overlay }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
