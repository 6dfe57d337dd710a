// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-local key tree used for local development and tests.

use dashmap::DashMap;
use serde_json::Value;
use std::collections::BTreeMap;

/// In-memory `collection/id → JSON` tree.
///
/// Writes replace the whole value at a path, matching the hosted store's
/// `set` semantics.
#[derive(Debug, Default)]
pub struct MemoryTree {
    collections: DashMap<String, BTreeMap<String, Value>>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, collection: &str, id: &str) -> Option<Value> {
        self.collections
            .get(collection)
            .and_then(|docs| docs.get(id).cloned())
    }

    pub fn contains(&self, collection: &str, id: &str) -> bool {
        self.collections
            .get(collection)
            .is_some_and(|docs| docs.contains_key(id))
    }

    pub fn set(&self, collection: &str, id: &str, value: Value) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), value);
    }

    /// All children of a collection, in key order.
    pub fn list(&self, collection: &str) -> Vec<(String, Value)> {
        self.collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, value)| (id.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}
