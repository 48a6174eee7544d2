use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Per-serving nutrition facts as stored; the library never computes
/// derived values from these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fat: u32,
}

/// A pre-prepared food item with a finite serving count.
///
/// Meal slots and favorites reference components by name (live lookup)
/// rather than embedding the component data, so a component can be edited
/// without touching the meals that use it. Names are unique per owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub servings: u32,
    pub ingredients: Vec<String>,
    pub prep_time_minutes: u32,
    pub nutrition: Nutrition,
    pub dietary_restrictions: String,
    pub notes: String,
    pub favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Component {
    pub fn new(owner_id: Uuid, name: impl Into<String>, servings: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            servings,
            ingredients: Vec::new(),
            prep_time_minutes: 0,
            nutrition: Nutrition::default(),
            dietary_restrictions: String::new(),
            notes: String::new(),
            favorite: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_ingredients(mut self, ingredients: Vec<String>) -> Self {
        self.ingredients = ingredients;
        self
    }

    pub fn with_prep_time(mut self, minutes: u32) -> Self {
        self.prep_time_minutes = minutes;
        self
    }

    pub fn with_nutrition(mut self, nutrition: Nutrition) -> Self {
        self.nutrition = nutrition;
        self
    }

    pub fn with_dietary_restrictions(mut self, restrictions: impl Into<String>) -> Self {
        self.dietary_restrictions = restrictions.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Applies a serving delta, saturating at zero.
    ///
    /// Decrements below zero are truncated rather than rejected, so a
    /// stale caller cannot drive the count negative. Returns the new count.
    pub fn adjust_servings(&mut self, delta: i32) -> u32 {
        self.servings = self.servings.saturating_add_signed(delta);
        self.updated_at = Utc::now();
        self.servings
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "=".repeat(self.name.len()))?;
        writeln!(f, "Servings: {}", self.servings)?;

        if self.prep_time_minutes > 0 {
            writeln!(f, "Prep time: {} min", self.prep_time_minutes)?;
        }

        if !self.dietary_restrictions.is_empty() {
            writeln!(f, "Dietary: {}", self.dietary_restrictions)?;
        }

        if !self.ingredients.is_empty() {
            writeln!(f, "\nIngredients:")?;
            for ingredient in &self.ingredients {
                writeln!(f, "  - {}", ingredient)?;
            }
        }

        if !self.notes.is_empty() {
            writeln!(f, "\nNotes:\n{}", self.notes)?;
        }

        Ok(())
    }
}
