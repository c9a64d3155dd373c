// SPDX-License-Identifier: MIT OR Apache-2.0
//! Classified, hierarchical errors with stable IDs and templated
//! descriptions.
//!
//! Every [`ErrataError`] is identified by a (domain, section, code) triple
//! rendered as `domain_section_code`. On top of that identity it carries
//! template [`Arguments`], a [`Sensitivity`] that only ever rises, a bug flag
//! that propagates one level up through cause chains, and a lazily rendered
//! [`FormattedDescription`].
//!
//! ```
//! use errata_error::{Domain, ErrataError, ErrorKind, Section, Sensitivity};
//!
//! const CONN_FAILED: ErrorKind = ErrorKind::declare(
//!     Domain::from_static("svc", "Service"),
//!     Section::from_static("db", "Database"),
//!     "ConnFailed",
//!     "Connection failed",
//!     "Could not connect to {{host}}.",
//!     "connect({{quote host}}) failed",
//!     Sensitivity::Edge,
//! );
//!
//! let err = ErrataError::new(&CONN_FAILED)
//!     .with_argument("host", "db1")
//!     .with_cause(std::io::Error::other("connection refused"));
//!
//! assert_eq!(err.id(), "svc_db_ConnFailed");
//! assert_eq!(err.description().friendly(), "Could not connect to db1.");
//! assert_eq!(err.causes().len(), 1);
//! ```
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod description;
mod dto;
mod error;
mod identity;
mod kind;
mod metadata;
mod sensitivity;

pub use description::{FormattedDescription, UnformattedDescription};
pub use dto::ErrataErrorDto;
pub use error::{Chain, ErrataError, MESSAGE_ARGUMENT, is_bug};
pub use identity::{
    Domain, FOREIGN_DOMAIN, FOREIGN_SECTION, Section, compose_id, derive_code, is_word_token,
};
pub use kind::ErrorKind;
pub use metadata::{Capability, HttpMetadata, Metadata};
pub use sensitivity::{ParseSensitivityError, Sensitivity};

pub use errata_template::{Arguments, Engine, Value};
