// SPDX-License-Identifier: MIT OR Apache-2.0
//! Serialisable snapshot of an [`ErrataError`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use errata_template::Arguments;

use crate::error::ErrataError;
use crate::sensitivity::Sensitivity;

/// Everything about an [`ErrataError`] that survives serialisation, with
/// descriptions already rendered. The opaque foreign source is reduced to
/// its message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ErrataErrorDto {
    /// `domain_section_code`.
    pub id: String,
    /// Domain key.
    pub domain: String,
    /// Section key.
    pub section: String,
    /// Code within the section.
    pub code: String,
    /// Short human label.
    pub title: String,
    /// Sensitivity at snapshot time.
    pub sensitivity: Sensitivity,
    /// Bug flag.
    pub bug: bool,
    /// Template arguments.
    #[serde(default, skip_serializing_if = "Arguments::is_empty")]
    pub arguments: Arguments,
    /// Rendered end-user description.
    pub friendly: String,
    /// Rendered operator-facing description.
    pub technical: String,
    /// HTTP status from metadata, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    /// Message of the wrapped foreign error, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_message: Option<String>,
    /// Snapshots of the direct causes, in attachment order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<ErrataErrorDto>,
}

impl ErrataErrorDto {
    /// Whether this snapshot or any transitive cause is flagged as a bug.
    pub fn any_bug(&self) -> bool {
        self.bug || self.causes.iter().any(Self::any_bug)
    }
}

impl From<&ErrataError> for ErrataErrorDto {
    fn from(err: &ErrataError) -> Self {
        let description = err.description();
        Self {
            id: err.id(),
            domain: err.domain().key().to_owned(),
            section: err.section().key().to_owned(),
            code: err.code().to_owned(),
            title: err.title().to_owned(),
            sensitivity: err.sensitivity(),
            bug: err.is_bug(),
            arguments: err.arguments().clone(),
            friendly: description.friendly().to_owned(),
            technical: description.technical().to_owned(),
            http_status: err.metadata().http().map(|h| h.status),
            source_message: err.foreign_source().map(ToString::to_string),
            causes: err.causes().iter().map(Self::from).collect(),
        }
    }
}
