// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Insertion-ordered registry of image records

use std::collections::HashMap;

use super::record::ImageRecord;

/// Maps identifiers to records while remembering the order they arrived in.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    records: HashMap<String, ImageRecord>,
    order: Vec<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. Returns false and leaves the registry untouched if
    /// the identifier is already present.
    pub fn insert(&mut self, record: ImageRecord) -> bool {
        if self.records.contains_key(&record.id) {
            return false;
        }
        self.order.push(record.id.clone());
        self.records.insert(record.id.clone(), record);
        true
    }

    pub fn get(&self, id: &str) -> Option<&ImageRecord> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ImageRecord> {
        self.records.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Identifiers in insertion order
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    /// Records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &ImageRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
