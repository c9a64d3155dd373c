// SPDX-License-Identifier: MIT OR Apache-2.0
//! The [`ErrataError`] value.

use std::any::type_name;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use errata_template::{Arguments, Engine, Value};
use serde::Serialize;

use crate::description::{FormattedDescription, UnformattedDescription};
use crate::identity::{Domain, FOREIGN_DOMAIN, FOREIGN_SECTION, Section, derive_code};
use crate::kind::ErrorKind;
use crate::metadata::{Capability, Metadata};
use crate::sensitivity::Sensitivity;

type BoxedError = Box<dyn StdError + Send + Sync>;

/// Argument under which wrapped foreign errors expose their message.
pub const MESSAGE_ARGUMENT: &str = "message";

/// A classified error: kind, arguments, sensitivity, bug flag and causes.
///
/// Builder methods consume the value and return the updated one. Clone
/// first to keep the original:
///
/// ```
/// use errata_error::{ErrataError, Sensitivity};
///
/// let base = ErrataError::wrap(std::fmt::Error);
/// let escalated = base.clone().with_sensitivity(Sensitivity::All);
/// assert_eq!(base.sensitivity(), Sensitivity::Edge);
/// assert_eq!(escalated.sensitivity(), Sensitivity::All);
/// assert_eq!(base.id(), "err_rust_core__fmt__Error");
/// ```
///
/// Clones share the lazily rendered [`FormattedDescription`] until their
/// arguments or engine diverge.
#[derive(Clone)]
pub struct ErrataError {
    kind: ErrorKind,
    arguments: Arc<Arguments>,
    sensitivity: Sensitivity,
    buggy: bool,
    causes: Vec<ErrataError>,
    source: Option<Arc<dyn StdError + Send + Sync>>,
    metadata: Metadata,
    engine: Arc<Engine>,
    description: Arc<FormattedDescription>,
}

impl ErrataError {
    /// New error of `kind`, starting at the kind's default sensitivity and
    /// rendered with [`Engine::shared`].
    pub fn new(kind: &ErrorKind) -> Self {
        Self::from_kind(kind.clone())
    }

    fn from_kind(kind: ErrorKind) -> Self {
        let arguments = Arc::new(Arguments::new());
        let engine = Engine::shared();
        let description = Self::describe(&kind, &arguments, &engine);
        Self {
            sensitivity: kind.sensitivity(),
            kind,
            arguments,
            buggy: false,
            causes: Vec::new(),
            source: None,
            metadata: Metadata::new(),
            engine,
            description,
        }
    }

    fn describe(
        kind: &ErrorKind,
        arguments: &Arc<Arguments>,
        engine: &Arc<Engine>,
    ) -> Arc<FormattedDescription> {
        let (friendly, technical) = kind.templates();
        Arc::new(FormattedDescription::new(
            friendly,
            technical,
            Arc::clone(arguments),
            Arc::clone(engine),
        ))
    }

    fn refresh_description(&mut self) {
        self.description = Self::describe(&self.kind, &self.arguments, &self.engine);
    }

    /// Wrap a foreign error.
    ///
    /// The result lives in domain `err`, section `rust`, with a code derived
    /// from the error's type name (see [`derive_code`]). Its description
    /// templates surface the wrapped error's message and its sensitivity is
    /// [`Sensitivity::Edge`]. Type names are not guaranteed stable across
    /// compiler versions; use [`wrap_as`](Self::wrap_as) with a declared
    /// kind when the ID matters.
    ///
    /// An [`ErrataError`], also behind `Box` or `Arc`, is returned as is.
    pub fn wrap<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        match Self::native(Box::new(err)) {
            Ok(native) => native,
            Err(foreign) => {
                let name = type_name::<E>();
                Self::wrap_boxed(foreign, derive_code(name), name)
            }
        }
    }

    /// Recover an [`ErrataError`] from a boxed error, directly or through
    /// `Box` / `Arc`. Anything else is handed back untouched.
    fn native(boxed: BoxedError) -> Result<Self, BoxedError> {
        let boxed = match boxed.downcast::<Self>() {
            Ok(native) => return Ok(*native),
            Err(other) => other,
        };
        let boxed = match boxed.downcast::<Box<Self>>() {
            Ok(native) => return Ok(**native),
            Err(other) => other,
        };
        boxed
            .downcast::<Arc<Self>>()
            .map(|shared| Self::clone(&shared))
    }

    /// Wrap a foreign error under a declared kind. The error's message is
    /// available to the kind's templates as `{{message}}`.
    pub fn wrap_as<E>(kind: &ErrorKind, err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::new(kind)
            .with_argument(MESSAGE_ARGUMENT, err.to_string())
            .with_source(Arc::new(err))
    }

    fn wrap_boxed(err: BoxedError, code: String, title: &str) -> Self {
        let kind = ErrorKind::new(FOREIGN_DOMAIN, FOREIGN_SECTION, code, title.to_owned())
            .with_friendly("{{message}}")
            .with_technical("{{message}}")
            .with_sensitivity(Sensitivity::Edge);
        Self::from_kind(kind)
            .with_argument(MESSAGE_ARGUMENT, err.to_string())
            .with_source(Arc::from(err))
    }

    fn with_source(mut self, source: Arc<dyn StdError + Send + Sync>) -> Self {
        self.source = Some(source);
        self
    }

    // -- Arguments, engine, metadata -------------------------------------

    /// Set one template argument.
    #[must_use]
    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Arc::make_mut(&mut self.arguments).insert(key.into(), value.into());
        self.refresh_description();
        self
    }

    /// Set one template argument from any serialisable value.
    ///
    /// If serialisation fails the argument is skipped.
    #[must_use]
    pub fn with_serialized_argument(self, key: impl Into<String>, value: impl Serialize) -> Self {
        match Value::from_serialize(value) {
            Ok(value) => self.with_argument(key, value),
            Err(_) => self,
        }
    }

    /// Merge several arguments at once; later keys win.
    #[must_use]
    pub fn with_arguments(mut self, arguments: impl IntoIterator<Item = (String, Value)>) -> Self {
        Arc::make_mut(&mut self.arguments).extend(arguments);
        self.refresh_description();
        self
    }

    /// Render descriptions with `engine` instead of [`Engine::shared`].
    #[must_use]
    pub fn with_engine(mut self, engine: Arc<Engine>) -> Self {
        self.engine = engine;
        self.refresh_description();
        self
    }

    /// Attach a metadata capability.
    #[must_use]
    pub fn with_metadata<T: Capability>(mut self, capability: T) -> Self {
        self.metadata.insert(capability);
        self
    }

    // -- Sensitivity and bug state ---------------------------------------

    /// Raise sensitivity to at least `sensitivity`. Never lowers it.
    #[must_use]
    pub fn with_sensitivity(mut self, sensitivity: Sensitivity) -> Self {
        self.sensitivity = self.sensitivity.max(sensitivity);
        self
    }

    /// Flag as an implementation defect; sensitivity becomes at least
    /// [`Sensitivity::Bug`].
    #[must_use]
    pub fn bug(mut self) -> Self {
        self.buggy = true;
        self.with_sensitivity(Sensitivity::Bug)
    }

    // -- Causes ----------------------------------------------------------

    /// Attach a cause.
    ///
    /// An [`ErrataError`] (also behind `Box` or `Arc`) is attached as is;
    /// anything else is wrapped as by [`wrap`](Self::wrap). A buggy cause
    /// makes this error buggy too.
    #[must_use]
    pub fn with_cause<E>(self, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.attach(Self::wrap(cause))
    }

    /// Attach an already boxed cause. Foreign errors get the code
    /// `BoxedError`, since their concrete type is erased.
    #[must_use]
    pub fn with_boxed_cause(self, cause: BoxedError) -> Self {
        let cause = match Self::native(cause) {
            Ok(native) => native,
            Err(foreign) => {
                Self::wrap_boxed(foreign, "BoxedError".to_owned(), "Box<dyn Error + Send + Sync>")
            }
        };
        self.attach(cause)
    }

    fn attach(mut self, cause: ErrataError) -> Self {
        if cause.is_bug() {
            self.buggy = true;
        }
        self.causes.push(cause);
        self
    }

    // -- Accessors -------------------------------------------------------

    /// The declared kind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Owning domain.
    pub fn domain(&self) -> &Domain {
        self.kind.domain()
    }

    /// Section within the domain.
    pub fn section(&self) -> &Section {
        self.kind.section()
    }

    /// Code within the section.
    pub fn code(&self) -> &str {
        self.kind.code()
    }

    /// `domain_section_code`.
    pub fn id(&self) -> String {
        self.kind.id()
    }

    /// Whether this error's ID is `id`.
    pub fn is(&self, id: &str) -> bool {
        self.kind.is(id)
    }

    /// Short human label.
    pub fn title(&self) -> &str {
        self.kind.title()
    }

    /// Template arguments.
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// One template argument.
    pub fn argument(&self, key: &str) -> Option<&Value> {
        self.arguments.get(key)
    }

    /// Current sensitivity.
    pub fn sensitivity(&self) -> Sensitivity {
        self.sensitivity
    }

    /// Whether this error is flagged as an implementation defect.
    pub fn is_bug(&self) -> bool {
        self.buggy
    }

    /// Direct causes, in attachment order.
    pub fn causes(&self) -> &[ErrataError] {
        &self.causes
    }

    /// This error followed by all transitive causes, depth-first.
    pub fn chain(&self) -> Chain<'_> {
        Chain { stack: vec![self] }
    }

    /// Environment-specific metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Engine used for the cached description.
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Lazily rendered description, shared by clones.
    pub fn description(&self) -> &FormattedDescription {
        &self.description
    }

    /// Raw description templates.
    pub fn unformatted(&self) -> UnformattedDescription<'_> {
        UnformattedDescription::new(self.kind.friendly(), self.kind.technical())
    }

    /// A fresh, uncached description rendered with another engine.
    pub fn describe_with(&self, engine: Arc<Engine>) -> FormattedDescription {
        let (friendly, technical) = self.kind.templates();
        FormattedDescription::new(friendly, technical, Arc::clone(&self.arguments), engine)
    }

    /// Wrapped foreign error, when this value came from wrapping one.
    pub fn foreign_source(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// First non-empty of technical text, friendly text and title.
    fn headline(&self) -> &str {
        let description = self.description();
        [description.technical(), description.friendly()]
            .into_iter()
            .find(|text| !text.is_empty())
            .unwrap_or_else(|| self.title())
    }

    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(
            f,
            "{:indent$}[{}] {}",
            "",
            self.id(),
            self.headline(),
            indent = depth * 2
        )?;
        for cause in &self.causes {
            f.write_str("\n")?;
            cause.fmt_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

/// `false` for `None`, otherwise [`ErrataError::is_bug`].
pub fn is_bug(err: Option<&ErrataError>) -> bool {
    err.is_some_and(ErrataError::is_bug)
}

impl fmt::Display for ErrataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}

impl fmt::Debug for ErrataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("ErrataError");
        d.field("id", &self.id());
        d.field("sensitivity", &self.sensitivity);
        d.field("bug", &self.buggy);
        if !self.arguments.is_empty() {
            d.field("arguments", &self.arguments);
        }
        if let Some(ref src) = self.source {
            d.field("source", &src.to_string());
        }
        if !self.metadata.is_empty() {
            d.field("metadata", &self.metadata);
        }
        if !self.causes.is_empty() {
            d.field("causes", &self.causes);
        }
        d.finish()
    }
}

impl StdError for ErrataError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.source {
            Some(src) => Some(src.as_ref() as &(dyn StdError + 'static)),
            None => self
                .causes
                .first()
                .map(|cause| cause as &(dyn StdError + 'static)),
        }
    }
}

/// Depth-first iterator over an error and its transitive causes.
#[derive(Debug, Clone)]
pub struct Chain<'a> {
    stack: Vec<&'a ErrataError>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a ErrataError;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.causes.iter().rev());
        Some(next)
    }
}
