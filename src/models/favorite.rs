use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::meal_slot::MealSlot;

/// A named meal snapshot detached from any grid position.
///
/// Created by explicitly favoriting a slot or automatically when a
/// favorited slot is cleared. Its lifecycle is independent of the slot it
/// came from: clearing the slot never deletes the snapshot and deleting
/// the snapshot never touches the slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteMeal {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub components: Vec<String>,
    pub toppings: Vec<String>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl FavoriteMeal {
    pub fn new(owner_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            components: Vec::new(),
            toppings: Vec::new(),
            notes: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_components(mut self, components: Vec<String>) -> Self {
        self.components = components;
        self
    }

    pub fn with_toppings(mut self, toppings: Vec<String>) -> Self {
        self.toppings = toppings;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Snapshots a slot's content, stripping grid identity.
    pub fn from_slot(slot: &MealSlot) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: slot.owner_id,
            name: slot.name.clone(),
            components: slot.components.clone(),
            toppings: slot.toppings.clone(),
            notes: slot.notes.clone(),
            created_at: Utc::now(),
        }
    }
}

impl fmt::Display for FavoriteMeal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.components.is_empty() {
            write!(f, " [{}]", self.components.join(", "))?;
        }
        Ok(())
    }
}
