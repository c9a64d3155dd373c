// SPDX-License-Identifier: MIT OR Apache-2.0
//! Template parse and execution errors.

/// Errors produced while parsing or executing a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// The template source is malformed.
    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        /// 1-based line of the offending tag.
        line: usize,
        /// 1-based column of the offending tag.
        column: usize,
        /// What went wrong.
        message: String,
    },

    /// A block helper was opened but never closed.
    #[error("unclosed block `{name}` opened at {line}:{column}")]
    UnclosedBlock {
        /// Name the block was opened with.
        name: String,
        /// 1-based line of the opening tag.
        line: usize,
        /// 1-based column of the opening tag.
        column: usize,
    },

    /// A closing tag does not match the innermost open block.
    #[error("expected closing tag for `{expected}`, found `{found}` at {line}:{column}")]
    MismatchedClose {
        /// Name of the innermost open block (empty at top level).
        expected: String,
        /// Name found in the closing tag.
        found: String,
        /// 1-based line of the closing tag.
        line: usize,
        /// 1-based column of the closing tag.
        column: usize,
    },

    /// A call with arguments names a helper that is not registered.
    #[error("unknown helper `{name}`")]
    UnknownHelper {
        /// Requested helper name.
        name: String,
    },

    /// A helper rejected its input.
    #[error("helper `{name}` failed: {message}")]
    Helper {
        /// Helper name.
        name: String,
        /// Failure detail.
        message: String,
    },
}

impl TemplateError {
    /// Shorthand for [`TemplateError::Helper`].
    pub fn helper(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Helper {
            name: name.into(),
            message: message.into(),
        }
    }

    pub(crate) fn parse_at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_column(source, offset);
        Self::Parse {
            line,
            column,
            message: message.into(),
        }
    }
}

/// 1-based line and column (in chars) of a byte offset.
pub(crate) fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let column = before
        .rsplit('\n')
        .next()
        .map_or(0, |l| l.chars().count())
        + 1;
    (line, column)
}
