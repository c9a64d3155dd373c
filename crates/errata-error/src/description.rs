// SPDX-License-Identifier: MIT OR Apache-2.0
//! Raw and rendered views of an error's description templates.

use std::borrow::Cow;
use std::sync::{Arc, OnceLock};

use errata_template::{Arguments, Engine};

/// The description templates exactly as authored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnformattedDescription<'a> {
    friendly: &'a str,
    technical: &'a str,
}

impl<'a> UnformattedDescription<'a> {
    pub(crate) fn new(friendly: &'a str, technical: &'a str) -> Self {
        Self {
            friendly,
            technical,
        }
    }

    /// Raw end-user template.
    pub fn friendly(&self) -> &'a str {
        self.friendly
    }

    /// Raw operator-facing template.
    pub fn technical(&self) -> &'a str {
        self.technical
    }
}

/// Rendered description, computed lazily and cached.
///
/// Each of [`friendly`](Self::friendly) and [`technical`](Self::technical)
/// renders its template at most once per instance, even when many threads
/// ask at the same time; every caller sees the same string. Rendering
/// failures never surface here: the engine reports them to its sink and the
/// raw template is cached instead.
///
/// The arguments are a snapshot taken at construction. Errors build a new
/// description whenever their arguments or engine change.
#[derive(Debug)]
pub struct FormattedDescription {
    friendly_template: Cow<'static, str>,
    technical_template: Cow<'static, str>,
    arguments: Arc<Arguments>,
    engine: Arc<Engine>,
    friendly: OnceLock<String>,
    technical: OnceLock<String>,
}

impl FormattedDescription {
    /// Description over the given templates and argument snapshot.
    pub fn new(
        friendly: impl Into<Cow<'static, str>>,
        technical: impl Into<Cow<'static, str>>,
        arguments: Arc<Arguments>,
        engine: Arc<Engine>,
    ) -> Self {
        Self {
            friendly_template: friendly.into(),
            technical_template: technical.into(),
            arguments,
            engine,
            friendly: OnceLock::new(),
            technical: OnceLock::new(),
        }
    }

    /// Rendered end-user text.
    pub fn friendly(&self) -> &str {
        self.friendly
            .get_or_init(|| self.engine.render_or_raw(&self.friendly_template, &self.arguments))
    }

    /// Rendered operator-facing text.
    pub fn technical(&self) -> &str {
        self.technical
            .get_or_init(|| self.engine.render_or_raw(&self.technical_template, &self.arguments))
    }

    /// The templates behind this description.
    pub fn unformatted(&self) -> UnformattedDescription<'_> {
        UnformattedDescription::new(&self.friendly_template, &self.technical_template)
    }

    /// Whether [`friendly`](Self::friendly) has been rendered yet.
    pub fn is_friendly_rendered(&self) -> bool {
        self.friendly.get().is_some()
    }

    /// Whether [`technical`](Self::technical) has been rendered yet.
    pub fn is_technical_rendered(&self) -> bool {
        self.technical.get().is_some()
    }

    /// Engine used for rendering.
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Argument snapshot used for rendering.
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }
}
