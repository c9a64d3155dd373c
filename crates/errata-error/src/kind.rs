// SPDX-License-Identifier: MIT OR Apache-2.0
//! Declared error kinds and the [`declare_kinds!`](crate::declare_kinds) registry macro.

use std::borrow::Cow;

use crate::identity::{Domain, Section, compose_id, id_matches};
use crate::sensitivity::Sensitivity;

/// The static half of an error: identity, title, description templates and
/// default sensitivity.
///
/// Kinds are usually declared as constants, either with
/// [`ErrorKind::declare`] or in bulk with [`declare_kinds!`](crate::declare_kinds);
/// catalogs loaded at runtime build them with [`ErrorKind::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ErrorKind {
    domain: Domain,
    section: Section,
    code: Cow<'static, str>,
    title: Cow<'static, str>,
    friendly: Cow<'static, str>,
    technical: Cow<'static, str>,
    sensitivity: Sensitivity,
}

impl ErrorKind {
    /// Declare a kind from literals.
    ///
    /// ```
    /// use errata_error::{Domain, ErrorKind, Section, Sensitivity};
    ///
    /// const CONN_FAILED: ErrorKind = ErrorKind::declare(
    ///     Domain::from_static("svc", "Service"),
    ///     Section::from_static("db", "Database"),
    ///     "ConnFailed",
    ///     "Connection failed",
    ///     "Could not connect to {{host}}.",
    ///     "connect({{quote host}}) failed",
    ///     Sensitivity::Edge,
    /// );
    /// assert_eq!(CONN_FAILED.id(), "svc_db_ConnFailed");
    /// ```
    #[allow(clippy::too_many_arguments)]
    pub const fn declare(
        domain: Domain,
        section: Section,
        code: &'static str,
        title: &'static str,
        friendly: &'static str,
        technical: &'static str,
        sensitivity: Sensitivity,
    ) -> Self {
        Self {
            domain,
            section,
            code: Cow::Borrowed(code),
            title: Cow::Borrowed(title),
            friendly: Cow::Borrowed(friendly),
            technical: Cow::Borrowed(technical),
            sensitivity,
        }
    }

    /// Kind with empty templates and [`Sensitivity::Edge`].
    pub fn new(
        domain: Domain,
        section: Section,
        code: impl Into<Cow<'static, str>>,
        title: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            domain,
            section,
            code: code.into(),
            title: title.into(),
            friendly: Cow::Borrowed(""),
            technical: Cow::Borrowed(""),
            sensitivity: Sensitivity::Edge,
        }
    }

    /// Replace the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<Cow<'static, str>>) -> Self {
        self.title = title.into();
        self
    }

    /// Replace the end-user template.
    #[must_use]
    pub fn with_friendly(mut self, template: impl Into<Cow<'static, str>>) -> Self {
        self.friendly = template.into();
        self
    }

    /// Replace the operator-facing template.
    #[must_use]
    pub fn with_technical(mut self, template: impl Into<Cow<'static, str>>) -> Self {
        self.technical = template.into();
        self
    }

    /// Replace the default sensitivity. Unlike
    /// [`ErrataError::with_sensitivity`](crate::ErrataError::with_sensitivity)
    /// this may lower it: a declaration is not an escalation.
    #[must_use]
    pub fn with_sensitivity(mut self, sensitivity: Sensitivity) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Owning domain.
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Section within the domain.
    pub fn section(&self) -> &Section {
        &self.section
    }

    /// Code within the section.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Short human label.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Raw end-user template.
    pub fn friendly(&self) -> &str {
        &self.friendly
    }

    /// Raw operator-facing template.
    pub fn technical(&self) -> &str {
        &self.technical
    }

    /// Sensitivity errors of this kind start at.
    pub fn sensitivity(&self) -> Sensitivity {
        self.sensitivity
    }

    /// `domain_section_code`.
    pub fn id(&self) -> String {
        compose_id(self.domain.key(), self.section.key(), &self.code)
    }

    /// Whether this kind's ID is `id`.
    pub fn is(&self, id: &str) -> bool {
        id_matches(id, self.domain.key(), self.section.key(), &self.code)
    }

    pub(crate) fn templates(&self) -> (Cow<'static, str>, Cow<'static, str>) {
        (self.friendly.clone(), self.technical.clone())
    }
}

/// Declare a block of [`ErrorKind`] constants sharing a domain and section,
/// plus a `KINDS` slice listing them in declaration order.
///
/// `sensitivity` names a [`Sensitivity`] variant and defaults to `Edge`.
/// Use one invocation per module, since each defines `KINDS`.
///
/// ```
/// use errata_error::{Domain, Section, declare_kinds};
///
/// const SVC: Domain = Domain::from_static("svc", "Service");
/// const DB: Section = Section::from_static("db", "Database");
///
/// declare_kinds! {
///     domain: SVC, section: DB;
///
///     /// The database refused the connection.
///     CONN_FAILED = "ConnFailed" {
///         title: "Connection failed",
///         friendly: "Could not connect to {{host}}.",
///         technical: "connect({{quote host}}) failed",
///     }
///     CORRUPT_PAGE = "CorruptPage" {
///         title: "Corrupt page",
///         friendly: "The database is damaged.",
///         technical: "page {{page}} failed its checksum",
///         sensitivity: Bug,
///     }
/// }
///
/// assert_eq!(KINDS.len(), 2);
/// assert_eq!(CORRUPT_PAGE.id(), "svc_db_CorruptPage");
/// ```
#[macro_export]
macro_rules! declare_kinds {
    (
        domain: $domain:expr, section: $section:expr;
        $(
            $(#[$meta:meta])*
            $name:ident = $code:literal {
                title: $title:literal,
                friendly: $friendly:literal,
                technical: $technical:literal
                $(, sensitivity: $sensitivity:ident)?
                $(,)?
            }
        )*
    ) => {
        $(
            $(#[$meta])*
            pub const $name: $crate::ErrorKind = $crate::ErrorKind::declare(
                $domain,
                $section,
                $code,
                $title,
                $friendly,
                $technical,
                $crate::declare_kinds!(@sensitivity $($sensitivity)?),
            );
        )*

        /// Every kind declared in this block, in declaration order.
        pub const KINDS: &[$crate::ErrorKind] = &[$($name),*];
    };
    (@sensitivity) => {
        $crate::Sensitivity::Edge
    };
    (@sensitivity $sensitivity:ident) => {
        $crate::Sensitivity::$sensitivity
    };
}
