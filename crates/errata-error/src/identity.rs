// SPDX-License-Identifier: MIT OR Apache-2.0
//! Domain and section descriptors, and the rules that turn them into IDs.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

macro_rules! descriptor {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name {
            key: Cow<'static, str>,
            #[serde(default)]
            title: Cow<'static, str>,
        }

        impl $name {
            /// Descriptor from string literals, usable in `const` items.
            pub const fn from_static(key: &'static str, title: &'static str) -> Self {
                Self {
                    key: Cow::Borrowed(key),
                    title: Cow::Borrowed(title),
                }
            }

            /// Descriptor from runtime strings.
            pub fn new(key: impl Into<Cow<'static, str>>, title: impl Into<Cow<'static, str>>) -> Self {
                Self {
                    key: key.into(),
                    title: title.into(),
                }
            }

            /// Stable machine token.
            pub fn key(&self) -> &str {
                &self.key
            }

            /// Human-readable name. May be empty.
            pub fn title(&self) -> &str {
                &self.title
            }

            /// Whether this descriptor's key is `key`.
            pub fn is(&self, key: &str) -> bool {
                self.key == key
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.key)
            }
        }
    };
}

descriptor! {
    /// Top-level namespace for a family of errors, e.g. a subsystem.
    Domain
}

descriptor! {
    /// Sub-namespace within a [`Domain`].
    Section
}

/// Domain of errors produced by wrapping foreign [`std::error::Error`] values.
pub const FOREIGN_DOMAIN: Domain = Domain::from_static("err", "Error");

/// Section of errors produced by wrapping foreign [`std::error::Error`] values.
pub const FOREIGN_SECTION: Section = Section::from_static("rust", "Rust");

/// Derive a code from a fully-qualified type name: every character that is
/// not an ASCII letter or digit becomes `_`.
///
/// ```
/// assert_eq!(errata_error::derive_code("std::io::Error"), "std__io__Error");
/// ```
pub fn derive_code(type_name: &str) -> String {
    type_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// `domain_section_code`.
pub fn compose_id(domain: &str, section: &str, code: &str) -> String {
    let mut id = String::with_capacity(domain.len() + section.len() + code.len() + 2);
    id.push_str(domain);
    id.push('_');
    id.push_str(section);
    id.push('_');
    id.push_str(code);
    id
}

/// Compare `id` against `domain_section_code` without allocating.
pub(crate) fn id_matches(id: &str, domain: &str, section: &str, code: &str) -> bool {
    id.strip_prefix(domain)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|rest| rest.strip_prefix(section))
        .and_then(|rest| rest.strip_prefix('_'))
        .is_some_and(|rest| rest == code)
}

/// Non-empty and made only of ASCII letters, digits and `_`.
pub fn is_word_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_compare_by_key() {
        let d = Domain::new("svc".to_string(), "Service");
        assert!(d.is("svc"));
        assert!(!d.is("SVC"));
        assert_eq!(d.title(), "Service");
        assert_eq!(d.to_string(), "svc");
        assert_eq!(Section::from_static("db", "").title(), "");
    }

    #[test]
    fn derive_code_maps_non_alphanumerics() {
        assert_eq!(derive_code("core::fmt::Error"), "core__fmt__Error");
        assert_eq!(
            derive_code("alloc::vec::Vec<u8>"),
            "alloc__vec__Vec_u8_"
        );
        assert_eq!(derive_code("naïve"), "na_ve");
        assert_eq!(derive_code(""), "");
    }

    #[test]
    fn derived_codes_are_word_tokens() {
        assert!(is_word_token(&derive_code("std::io::Error")));
        assert!(!is_word_token(""));
        assert!(!is_word_token("a-b"));
    }

    #[test]
    fn id_matching() {
        assert_eq!(compose_id("svc", "db", "ConnFailed"), "svc_db_ConnFailed");
        assert!(id_matches("svc_db_ConnFailed", "svc", "db", "ConnFailed"));
        assert!(!id_matches("svc_db_ConnFailedX", "svc", "db", "ConnFailed"));
        assert!(!id_matches("svc_dbConnFailed", "svc", "db", "ConnFailed"));
        assert!(!id_matches("", "svc", "db", "ConnFailed"));
    }
}
