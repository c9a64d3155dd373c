// SPDX-License-Identifier: MIT OR Apache-2.0
//! Environment-specific side data attached to errors.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A typed piece of metadata. Each capability type occupies one slot.
pub trait Capability: Any + Send + Sync + fmt::Debug {}

/// Transport-protocol metadata: the HTTP status an error maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct HttpMetadata {
    /// HTTP status code.
    pub status: u16,
}

impl HttpMetadata {
    /// Metadata for `status`.
    pub fn new(status: u16) -> Self {
        Self { status }
    }

    /// 4xx.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// 5xx.
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

impl Capability for HttpMetadata {}

#[derive(Clone)]
struct Entry {
    name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

/// Capability-keyed extension map. Absent capabilities are `None`.
#[derive(Clone, Default)]
pub struct Metadata {
    entries: HashMap<TypeId, Entry>,
}

impl Metadata {
    /// Empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `capability`, replacing any earlier value of the same type.
    pub fn insert<T: Capability>(&mut self, capability: T) {
        self.entries.insert(
            TypeId::of::<T>(),
            Entry {
                name: type_name::<T>(),
                value: Arc::new(capability),
            },
        );
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with<T: Capability>(mut self, capability: T) -> Self {
        self.insert(capability);
        self
    }

    /// Look up a capability by type.
    pub fn get<T: Capability>(&self) -> Option<&T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.value.downcast_ref::<T>())
    }

    /// Whether a capability of type `T` is present.
    pub fn contains<T: Capability>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// HTTP metadata, if attached.
    pub fn http(&self) -> Option<&HttpMetadata> {
        self.get::<HttpMetadata>()
    }

    /// Number of capabilities present.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no capability is present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.entries.values().map(|e| e.name).collect();
        names.sort_unstable();
        f.debug_set().entries(names).finish()
    }
}
