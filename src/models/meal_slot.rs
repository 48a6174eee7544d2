use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::day_of_week::DayOfWeek;
use super::meal_type::MealType;

/// One cell of the 7-day x 3-meal weekly grid.
///
/// The grid logically always holds 21 slots per owner; a slot without a
/// stored record is represented by an empty placeholder carrying the same
/// synthesized id, so identity is stable whether or not the slot has ever
/// been written. Components are referenced by name and may dangle if the
/// component was deleted; readers treat unresolved names as invalid rather
/// than erroring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealSlot {
    pub id: String,
    pub owner_id: Uuid,
    pub day_of_week: DayOfWeek,
    pub meal_type: MealType,
    pub name: String,
    pub components: Vec<String>,
    pub toppings: Vec<String>,
    pub notes: String,
    pub favorite: bool,
    pub updated_at: DateTime<Utc>,
}

impl MealSlot {
    /// Deterministic slot identity derived from position, not content.
    pub fn slot_id(owner_id: Uuid, day: DayOfWeek, meal_type: MealType) -> String {
        format!("{}:{}:{}", owner_id, day, meal_type)
    }

    /// An empty slot for a grid position that has no stored record.
    pub fn placeholder(owner_id: Uuid, day: DayOfWeek, meal_type: MealType) -> Self {
        Self {
            id: Self::slot_id(owner_id, day, meal_type),
            owner_id,
            day_of_week: day,
            meal_type,
            name: String::new(),
            components: Vec::new(),
            toppings: Vec::new(),
            notes: String::new(),
            favorite: false,
            updated_at: Utc::now(),
        }
    }

    /// A slot counts as empty when it has neither components nor a name.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.name.is_empty()
    }

    /// Resets all mutable content, preserving identity fields.
    pub fn reset(&mut self) {
        self.name.clear();
        self.components.clear();
        self.toppings.clear();
        self.notes.clear();
        self.favorite = false;
        self.updated_at = Utc::now();
    }

    /// Shallow-merges a patch; identity fields cannot be patched.
    pub fn apply(&mut self, patch: SlotPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(components) = patch.components {
            self.components = components;
        }
        if let Some(toppings) = patch.toppings {
            self.toppings = toppings;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        if let Some(favorite) = patch.favorite {
            self.favorite = favorite;
        }
        self.updated_at = Utc::now();
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.day_of_week, self.meal_type)?;
        if !self.name.is_empty() {
            write!(f, ": {}", self.name)?;
        }
        if !self.components.is_empty() {
            write!(f, " [{}]", self.components.join(", "))?;
        }
        Ok(())
    }
}

/// Partial update for a slot's mutable fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotPatch {
    pub name: Option<String>,
    pub components: Option<Vec<String>>,
    pub toppings: Option<Vec<String>>,
    pub notes: Option<String>,
    pub favorite: Option<bool>,
}

impl SlotPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn components(mut self, components: Vec<String>) -> Self {
        self.components = Some(components);
        self
    }

    pub fn toppings(mut self, toppings: Vec<String>) -> Self {
        self.toppings = Some(toppings);
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn favorite(mut self, favorite: bool) -> Self {
        self.favorite = Some(favorite);
        self
    }
}
