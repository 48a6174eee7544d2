//! The shared component inventory: serving counts move between here and
//! the slot grid, one serving per assignment.

use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

use crate::models::Component;
use crate::sync::DirtyHandle;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("component name must not be empty")]
    EmptyName,
    #[error("a component named '{0}' already exists")]
    DuplicateName(String),
}

/// Owns the component records for one user, keyed by name.
///
/// Serving adjustments saturate at zero rather than failing: a stale or
/// racing caller can over-decrement, and losing exact accounting in that
/// case is an accepted approximation.
pub struct InventoryStore {
    owner_id: Uuid,
    components: BTreeMap<String, Component>,
    dirty: DirtyHandle,
}

impl InventoryStore {
    pub fn new(owner_id: Uuid, dirty: DirtyHandle) -> Self {
        Self {
            owner_id,
            components: BTreeMap::new(),
            dirty,
        }
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    /// Adds a component record. The name is trimmed; empty and duplicate
    /// names are rejected.
    pub fn add(&mut self, mut component: Component) -> Result<&Component, InventoryError> {
        component.name = component.name.trim().to_string();
        if component.name.is_empty() {
            return Err(InventoryError::EmptyName);
        }
        if self.components.contains_key(&component.name) {
            return Err(InventoryError::DuplicateName(component.name));
        }

        let name = component.name.clone();
        self.components.insert(name.clone(), component);
        self.dirty.mark();
        Ok(&self.components[&name])
    }

    /// Applies a serving delta, saturating at zero. Returns the new count,
    /// or `None` (and no mutation) when the name is unknown.
    pub fn adjust_servings(&mut self, name: &str, delta: i32) -> Option<u32> {
        let component = self.components.get_mut(name)?;
        let servings = component.adjust_servings(delta);
        self.dirty.mark();
        Some(servings)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Component> {
        self.components.get(name)
    }

    /// Explicit delete; slot references to the name are left to dangle.
    pub fn remove(&mut self, name: &str) -> Option<Component> {
        let removed = self.components.remove(name);
        if removed.is_some() {
            self.dirty.mark();
        }
        removed
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Replaces the in-memory set from persisted records without marking
    /// dirty; used when a session hydrates from the repository.
    pub fn load(&mut self, components: Vec<Component>) {
        self.components = components
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();
    }

    /// Owned copy of every record, for persistence.
    pub fn snapshot(&self) -> Vec<Component> {
        self.components.values().cloned().collect()
    }
}
