// SPDX-License-Identifier: MIT OR Apache-2.0
//! Description templates for errata errors.
//!
//! A small, handlebars-compatible template language rendered to plain text /
//! Markdown (nothing is HTML-escaped). Parsing and execution are pure
//! functions of the template source, the registered helpers and the
//! [`Arguments`]; the only side effect is reporting failures to the
//! engine's [`FailureSink`] from [`Engine::render_or_raw`].
//!
//! ```
//! use errata_template::{Arguments, Engine, Value};
//!
//! let engine = Engine::new();
//! let mut args = Arguments::new();
//! args.insert("hosts".into(), Value::from(vec!["db1", "db2", "db3"]));
//! let text = engine.render_or_raw("Tried {{#join hosts}}{{pre this}}{{/join}}.", &args);
//! assert_eq!(text, "Tried `db1`, `db2`, and `db3`.");
//! ```
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod helpers;
mod parser;
mod render;
mod sink;
mod value;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

pub use error::TemplateError;
pub use helpers::{Helper, emphasize, inline_code, natural_join, quote};
pub use render::{Frame, HelperCall};
pub use sink::{
    CollectingSink, FailureLevel, FailureSink, FailureStage, NullSink, RenderFailure, TracingSink,
};
pub use value::{Arguments, Value};

use helpers::FnHelper;
use parser::Node;
use render::{Renderer, Scope};

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

/// A parsed template, reusable across executions.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    nodes: Vec<Node>,
}

impl Template {
    /// The source this template was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Parse `source` without executing it.
///
/// Helper names are resolved at execution time, so this only checks syntax.
pub fn parse(source: &str) -> Result<Template, TemplateError> {
    Ok(Template {
        source: source.to_owned(),
        nodes: parser::parse(source)?,
    })
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Helper registry plus the sink that receives rendering failures.
#[derive(Clone)]
pub struct Engine {
    helpers: HashMap<String, Arc<dyn Helper>>,
    sink: Arc<dyn FailureSink>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.helpers.keys().collect();
        names.sort();
        f.debug_struct("Engine")
            .field("helpers", &names)
            .field("sink", &self.sink)
            .finish()
    }
}

impl Engine {
    /// Engine with the built-in helpers, reporting failures via
    /// [`TracingSink`] at `WARN`.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start configuring an engine. The builder already holds the built-in
    /// helpers.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Process-wide default engine, built on first use.
    ///
    /// Failures go to `tracing`, so the host's subscriber still decides
    /// where they are written.
    pub fn shared() -> Arc<Engine> {
        static SHARED: OnceLock<Arc<Engine>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(Engine::new())))
    }

    /// Whether a helper is registered under `name`.
    pub fn has_helper(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    pub(crate) fn helper(&self, name: &str) -> Option<&Arc<dyn Helper>> {
        self.helpers.get(name)
    }

    /// The failure sink in use.
    pub fn sink(&self) -> &Arc<dyn FailureSink> {
        &self.sink
    }

    /// Parse `source`. Equivalent to the free function [`parse`].
    pub fn parse(&self, source: &str) -> Result<Template, TemplateError> {
        parse(source)
    }

    /// Execute a parsed template. The output is trimmed.
    pub fn execute(&self, template: &Template, args: &Arguments) -> Result<String, TemplateError> {
        let root = Value::Map(args.clone());
        let scope = Scope::root(&root);
        let mut out = String::new();
        Renderer::new(self).render_nodes(&template.nodes, &scope, &mut out)?;
        Ok(out.trim().to_owned())
    }

    /// Parse and execute in one step.
    pub fn render(&self, source: &str, args: &Arguments) -> Result<String, TemplateError> {
        self.execute(&self.parse(source)?, args)
    }

    /// Render `source`, or on any failure report it to the sink and return
    /// the trimmed raw source.
    pub fn render_or_raw(&self, source: &str, args: &Arguments) -> String {
        let template = match self.parse(source) {
            Ok(template) => template,
            Err(error) => return self.fall_back(FailureStage::Parse, source, error),
        };
        match self.execute(&template, args) {
            Ok(text) => text,
            Err(error) => self.fall_back(FailureStage::Render, source, error),
        }
    }

    fn fall_back(&self, stage: FailureStage, source: &str, error: TemplateError) -> String {
        self.sink.report(&RenderFailure {
            stage,
            template: source.to_owned(),
            error,
        });
        source.trim().to_owned()
    }
}

// ---------------------------------------------------------------------------
// EngineBuilder
// ---------------------------------------------------------------------------

/// Builder for [`Engine`].
pub struct EngineBuilder {
    helpers: HashMap<String, Arc<dyn Helper>>,
    sink: Arc<dyn FailureSink>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            helpers: helpers::builtins()
                .into_iter()
                .map(|(name, helper)| (name.to_owned(), helper))
                .collect(),
            sink: Arc::new(TracingSink::default()),
        }
    }
}

impl EngineBuilder {
    /// Register (or replace) a helper.
    pub fn helper(mut self, name: impl Into<String>, helper: impl Helper + 'static) -> Self {
        self.helpers.insert(name.into(), Arc::new(helper));
        self
    }

    /// Register (or replace) a closure helper.
    pub fn helper_fn<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&HelperCall<'_>) -> Result<String, TemplateError> + Send + Sync + 'static,
    {
        self.helper(name, FnHelper(f))
    }

    /// Remove a helper, built-in or not.
    pub fn without_helper(mut self, name: &str) -> Self {
        self.helpers.remove(name);
        self
    }

    /// Report failures to `sink`.
    pub fn sink(mut self, sink: impl FailureSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Report failures to an already shared sink.
    pub fn shared_sink(mut self, sink: Arc<dyn FailureSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Finish building.
    pub fn build(self) -> Engine {
        Engine {
            helpers: self.helpers,
            sink: self.sink,
        }
    }
}
