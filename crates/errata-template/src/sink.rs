// SPDX-License-Identifier: MIT OR Apache-2.0
//! Failure reporting for templates that could not be rendered.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::TemplateError;

/// Which step of rendering failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureStage {
    /// The template source could not be parsed.
    Parse,
    /// Execution against the arguments failed.
    Render,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Parse => "parse",
            Self::Render => "render",
        })
    }
}

/// One template that fell back to its raw source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFailure {
    /// Failing step.
    pub stage: FailureStage,
    /// Raw template source.
    pub template: String,
    /// Underlying error.
    pub error: TemplateError,
}

/// Receives template failures. The engine never surfaces them to callers of
/// [`Engine::render_or_raw`](crate::Engine::render_or_raw).
pub trait FailureSink: Send + Sync + fmt::Debug {
    /// Record one failure. Must not panic.
    fn report(&self, failure: &RenderFailure);
}

// ---------------------------------------------------------------------------
// TracingSink
// ---------------------------------------------------------------------------

/// Level at which [`TracingSink`] emits failure events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FailureLevel {
    /// `tracing::Level::DEBUG`
    Debug,
    /// `tracing::Level::INFO`
    Info,
    /// `tracing::Level::WARN`
    #[default]
    Warn,
    /// `tracing::Level::ERROR`
    Error,
}

impl FailureLevel {
    /// Accepted spellings, lowercase.
    pub const NAMES: &'static [&'static str] = &["debug", "info", "warn", "error"];
}

impl FromStr for FailureLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown failure level '{other}'")),
        }
    }
}

/// Reports failures as `tracing` events on target `errata.template`.
///
/// Whatever subscriber the host installed decides where they end up.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink {
    level: FailureLevel,
}

impl TracingSink {
    /// Sink emitting at `level`.
    pub fn new(level: FailureLevel) -> Self {
        Self { level }
    }

    /// Configured level.
    pub fn level(&self) -> FailureLevel {
        self.level
    }
}

impl FailureSink for TracingSink {
    fn report(&self, failure: &RenderFailure) {
        let stage = failure.stage;
        let template = failure.template.as_str();
        let error = &failure.error;
        match self.level {
            FailureLevel::Debug => tracing::debug!(
                target: "errata.template",
                %stage, template, %error,
                "template failed; using raw source"
            ),
            FailureLevel::Info => tracing::info!(
                target: "errata.template",
                %stage, template, %error,
                "template failed; using raw source"
            ),
            FailureLevel::Warn => tracing::warn!(
                target: "errata.template",
                %stage, template, %error,
                "template failed; using raw source"
            ),
            FailureLevel::Error => tracing::error!(
                target: "errata.template",
                %stage, template, %error,
                "template failed; using raw source"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// NullSink / CollectingSink
// ---------------------------------------------------------------------------

/// Discards every failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl FailureSink for NullSink {
    fn report(&self, _failure: &RenderFailure) {}
}

/// Keeps failures in memory. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    inner: Arc<Mutex<Vec<RenderFailure>>>,
}

impl CollectingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn failures(&self) -> Vec<RenderFailure> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of failures reported.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been reported.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget everything reported so far.
    pub fn clear(&self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl FailureSink for CollectingSink {
    fn report(&self, failure: &RenderFailure) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(failure.clone());
    }
}
