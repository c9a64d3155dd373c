// SPDX-License-Identifier: MIT OR Apache-2.0
//! The runtime registry built from a [`CatalogConfig`].

use std::collections::BTreeMap;
use std::sync::Arc;

use errata_error::{Domain, ErrataError, ErrorKind, Section};
use errata_template::{Engine, TracingSink};

use crate::{CatalogConfig, ConfigError, validate_config};

/// Explicit map from error ID to [`ErrorKind`], plus the engine that
/// renders their descriptions.
#[derive(Debug, Clone)]
pub struct Catalog {
    kinds: BTreeMap<String, ErrorKind>,
    engine: Arc<Engine>,
}

impl Catalog {
    /// Validate `config` and build the registry. Template failures are
    /// logged through `tracing` at the configured `render.failure_level`.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, ConfigError> {
        let level = config.render.failure_level()?;
        let engine = Engine::builder().sink(TracingSink::new(level)).build();
        Self::from_config_with_engine(config, Arc::new(engine))
    }

    /// Like [`from_config`](Self::from_config), rendering with `engine`.
    pub fn from_config_with_engine(
        config: &CatalogConfig,
        engine: Arc<Engine>,
    ) -> Result<Self, ConfigError> {
        let warnings = validate_config(config)?;
        for warning in &warnings {
            tracing::warn!(target: "errata.config", %warning, "catalog warning");
        }

        let mut kinds = BTreeMap::new();
        for (domain_key, domain_entry) in &config.domains {
            let domain = Domain::new(domain_key.clone(), domain_entry.title.clone());
            for (section_key, section_entry) in &domain_entry.sections {
                let section = Section::new(section_key.clone(), section_entry.title.clone());
                for (code, entry) in &section_entry.kinds {
                    let technical = entry.technical.as_ref().unwrap_or(&entry.friendly);
                    let kind = ErrorKind::new(
                        domain.clone(),
                        section.clone(),
                        code.clone(),
                        entry.title.clone(),
                    )
                    .with_friendly(entry.friendly.clone())
                    .with_technical(technical.clone())
                    .with_sensitivity(config.resolve_sensitivity(domain_entry, entry));
                    kinds.insert(kind.id(), kind);
                }
            }
        }

        tracing::debug!(
            target: "errata.config",
            kinds = kinds.len(),
            warnings = warnings.len(),
            "catalog built"
        );
        Ok(Self { kinds, engine })
    }

    /// Kind registered under `id`.
    pub fn get(&self, id: &str) -> Option<&ErrorKind> {
        self.kinds.get(id)
    }

    /// New error of the kind registered under `id`, rendered with this
    /// catalog's engine.
    pub fn error(&self, id: &str) -> Option<ErrataError> {
        self.get(id)
            .map(|kind| ErrataError::new(kind).with_engine(Arc::clone(&self.engine)))
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.kinds.contains_key(id)
    }

    /// Registered IDs, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    /// Registered kinds, sorted by ID.
    pub fn iter(&self) -> impl Iterator<Item = &ErrorKind> {
        self.kinds.values()
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether no kind is registered.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Engine used for descriptions.
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }
}
