//! The transaction engine: every movement of a serving between the
//! inventory and the grid goes through here.
//!
//! Failed preconditions (a component out of servings) are silent no-ops —
//! the UI is expected to have gated the action — while malformed
//! references (unknown favorite id, out-of-range index) come back as
//! structured errors. Nothing in this module panics on caller input.

use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::favorites::FavoritesStore;
use crate::grid::SlotGrid;
use crate::inventory::{InventoryError, InventoryStore};
use crate::models::{Component, DayOfWeek, FavoriteMeal, MealSlot, MealType};
use crate::suggest::MealSuggestion;
use crate::sync::DirtyHandle;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("no component named '{0}' in the inventory")]
    UnknownComponent(String),
    #[error("no favorite with id {0}")]
    UnknownFavorite(Uuid),
    #[error("no entry at index {index} in {day} {meal_type}")]
    InvalidIndex {
        day: DayOfWeek,
        meal_type: MealType,
        index: usize,
    },
}

/// How a transition turned out. `Skipped` is not an error: the operation
/// was well-formed but its precondition did not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxOutcome {
    Applied,
    Skipped(SkipReason),
    /// Bulk transitions that landed some entries and skipped others.
    Partial { applied: u32, skipped: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    OutOfServings,
}

/// Result of clearing a single slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotClearReport {
    /// Component names restored to the inventory, one serving each.
    pub restored: Vec<String>,
    /// Snapshot created for a favorited slot, if one was.
    pub favorite_saved: Option<Uuid>,
}

/// Result of clearing the whole week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekClearReport {
    /// Aggregated serving restorations, name to count.
    pub restored: BTreeMap<String, u32>,
    pub favorites_saved: usize,
}

/// Result of accepting a meal suggestion into a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionOutcome {
    pub assigned: u32,
    pub skipped: u32,
}

/// Owns the in-memory stores and applies the serving-conserving
/// transitions between them.
pub struct TransactionEngine {
    inventory: InventoryStore,
    grid: SlotGrid,
    favorites: FavoritesStore,
}

impl TransactionEngine {
    pub fn new(owner_id: Uuid, dirty: DirtyHandle) -> Self {
        Self {
            inventory: InventoryStore::new(owner_id, dirty.clone()),
            grid: SlotGrid::new(owner_id, dirty.clone()),
            favorites: FavoritesStore::new(owner_id, dirty),
        }
    }

    pub fn owner_id(&self) -> Uuid {
        self.inventory.owner_id()
    }

    pub fn inventory(&self) -> &InventoryStore {
        &self.inventory
    }

    pub fn inventory_mut(&mut self) -> &mut InventoryStore {
        &mut self.inventory
    }

    pub fn grid(&self) -> &SlotGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut SlotGrid {
        &mut self.grid
    }

    pub fn favorites(&self) -> &FavoritesStore {
        &self.favorites
    }

    pub fn favorites_mut(&mut self) -> &mut FavoritesStore {
        &mut self.favorites
    }

    /// Replaces all in-memory state from persisted records. Does not mark
    /// the sync handle dirty: the state just came from the repository.
    pub fn hydrate(
        &mut self,
        components: Vec<Component>,
        slots: Vec<MealSlot>,
        favorites: Vec<FavoriteMeal>,
    ) {
        self.inventory.load(components);
        self.grid.load(slots);
        self.favorites.load(favorites);
    }

    /// Explicit add into the inventory.
    pub fn add_component(
        &mut self,
        name: &str,
        servings: u32,
    ) -> Result<(), InventoryError> {
        let component = Component::new(self.owner_id(), name, servings);
        self.inventory.add(component)?;
        Ok(())
    }

    /// Sidebar-to-slot: consumes one serving and appends the name to the
    /// slot. Zero servings is a silent skip, not an error.
    pub fn assign(
        &mut self,
        name: &str,
        day: DayOfWeek,
        meal_type: MealType,
    ) -> Result<TxOutcome, EngineError> {
        let component = self
            .inventory
            .find_by_name(name)
            .ok_or_else(|| EngineError::UnknownComponent(name.to_string()))?;

        if component.servings == 0 {
            return Ok(TxOutcome::Skipped(SkipReason::OutOfServings));
        }

        self.inventory.adjust_servings(name, -1);
        self.grid
            .slot_mut(day, meal_type)
            .components
            .push(name.to_string());
        Ok(TxOutcome::Applied)
    }

    /// Slot-to-slot: repositions one entry. Total inventory is unchanged.
    pub fn move_component(
        &mut self,
        from_day: DayOfWeek,
        from_meal: MealType,
        index: usize,
        to_day: DayOfWeek,
        to_meal: MealType,
    ) -> Result<TxOutcome, EngineError> {
        let source = self.grid.slot(from_day, from_meal);
        if index >= source.components.len() {
            return Err(EngineError::InvalidIndex {
                day: from_day,
                meal_type: from_meal,
                index,
            });
        }

        let name = self
            .grid
            .slot_mut(from_day, from_meal)
            .components
            .remove(index);
        self.grid.slot_mut(to_day, to_meal).components.push(name);
        Ok(TxOutcome::Applied)
    }

    /// Favorite-to-slot: bulk assign of a snapshot's components.
    ///
    /// Resolvable components are each charged one serving (saturating) and
    /// appended; names that no longer resolve are logged and skipped.
    /// Toppings ride along without inventory accounting, and the slot's
    /// name and notes are filled from the favorite only when still empty.
    pub fn assign_favorite(
        &mut self,
        favorite_id: Uuid,
        day: DayOfWeek,
        meal_type: MealType,
    ) -> Result<TxOutcome, EngineError> {
        let favorite = self
            .favorites
            .find(favorite_id)
            .ok_or(EngineError::UnknownFavorite(favorite_id))?
            .clone();

        let mut applied = 0u32;
        let mut skipped = 0u32;
        for name in &favorite.components {
            if self.inventory.find_by_name(name).is_none() {
                warn!(component = %name, "skipping unresolved component reference");
                skipped += 1;
                continue;
            }
            self.inventory.adjust_servings(name, -1);
            self.grid
                .slot_mut(day, meal_type)
                .components
                .push(name.clone());
            applied += 1;
        }

        let slot = self.grid.slot_mut(day, meal_type);
        slot.toppings.extend(favorite.toppings.iter().cloned());
        if slot.name.is_empty() {
            slot.name = favorite.name.clone();
        }
        if slot.notes.is_empty() {
            slot.notes = favorite.notes.clone();
        }

        Ok(if skipped == 0 {
            TxOutcome::Applied
        } else {
            TxOutcome::Partial { applied, skipped }
        })
    }

    /// Removes the entry at `index` and returns its serving to the
    /// inventory. Restoring a name that no longer resolves is tolerated.
    pub fn remove_component(
        &mut self,
        day: DayOfWeek,
        meal_type: MealType,
        index: usize,
    ) -> Result<TxOutcome, EngineError> {
        let slot = self.grid.slot(day, meal_type);
        if index >= slot.components.len() {
            return Err(EngineError::InvalidIndex {
                day,
                meal_type,
                index,
            });
        }

        let name = self.grid.slot_mut(day, meal_type).components.remove(index);
        if self.inventory.adjust_servings(&name, 1).is_none() {
            warn!(component = %name, "removed entry no longer has an inventory record");
        }
        Ok(TxOutcome::Applied)
    }

    /// Toppings are never inventory-backed; add and remove touch the slot
    /// only.
    pub fn add_topping(&mut self, day: DayOfWeek, meal_type: MealType, topping: &str) {
        self.grid
            .slot_mut(day, meal_type)
            .toppings
            .push(topping.to_string());
    }

    pub fn remove_topping(
        &mut self,
        day: DayOfWeek,
        meal_type: MealType,
        index: usize,
    ) -> Result<TxOutcome, EngineError> {
        let slot = self.grid.slot(day, meal_type);
        if index >= slot.toppings.len() {
            return Err(EngineError::InvalidIndex {
                day,
                meal_type,
                index,
            });
        }

        self.grid.slot_mut(day, meal_type).toppings.remove(index);
        Ok(TxOutcome::Applied)
    }

    /// Clears one slot. Order matters: servings are restored and the
    /// favorite snapshot captured before the content is reset.
    pub fn clear_slot(&mut self, day: DayOfWeek, meal_type: MealType) -> SlotClearReport {
        let previous = self.grid.slot(day, meal_type);

        for name in &previous.components {
            self.inventory.adjust_servings(name, 1);
        }

        let favorite_saved = self.preserve_if_favorited(&previous);
        self.grid.clear(day, meal_type);

        SlotClearReport {
            restored: previous.components,
            favorite_saved,
        }
    }

    /// Clears the whole week. Restorations are aggregated into one batch
    /// and every qualifying snapshot is captured before any slot is reset,
    /// so favorites survive even if a later step fails.
    pub fn clear_week(&mut self) -> WeekClearReport {
        let slots = self.grid.all_slots();

        let mut restored: BTreeMap<String, u32> = BTreeMap::new();
        for slot in &slots {
            for name in &slot.components {
                *restored.entry(name.clone()).or_default() += 1;
            }
        }

        let mut favorites_saved = 0;
        for slot in &slots {
            if self.preserve_if_favorited(slot).is_some() {
                favorites_saved += 1;
            }
        }

        for slot in &slots {
            if self.grid.has_record(slot.day_of_week, slot.meal_type) {
                self.grid.clear(slot.day_of_week, slot.meal_type);
            }
        }

        for (name, count) in &restored {
            self.inventory.adjust_servings(name, *count as i32);
        }

        WeekClearReport {
            restored,
            favorites_saved,
        }
    }

    /// Applies an accepted suggestion through the normal assignment path:
    /// each component is charged a serving (or skipped when exhausted or
    /// unknown), extras become toppings, and the slot is named after the
    /// suggestion when it has no name yet.
    pub fn accept_suggestion(
        &mut self,
        suggestion: &MealSuggestion,
        day: DayOfWeek,
        meal_type: MealType,
    ) -> SuggestionOutcome {
        let mut assigned = 0u32;
        let mut skipped = 0u32;

        for name in &suggestion.components {
            match self.assign(name, day, meal_type) {
                Ok(TxOutcome::Applied) => assigned += 1,
                Ok(_) => skipped += 1,
                Err(EngineError::UnknownComponent(_)) => {
                    warn!(component = %name, "suggestion referenced a component not in the inventory");
                    skipped += 1;
                }
                Err(_) => skipped += 1,
            }
        }

        let slot = self.grid.slot_mut(day, meal_type);
        slot.toppings
            .extend(suggestion.additional_ingredients.iter().cloned());
        if slot.name.is_empty() {
            slot.name = suggestion.meal_name.clone();
        }
        if slot.notes.is_empty() {
            slot.notes = suggestion.preparation_instructions.clone();
        }

        SuggestionOutcome { assigned, skipped }
    }

    /// Snapshot a favorited, named slot unless a favorite with the same
    /// name already exists.
    fn preserve_if_favorited(&mut self, slot: &MealSlot) -> Option<Uuid> {
        if !slot.favorite || slot.name.is_empty() || self.favorites.contains_name(&slot.name) {
            return None;
        }
        let snapshot = FavoriteMeal::from_slot(slot);
        let id = snapshot.id;
        self.favorites.add(snapshot);
        Some(id)
    }
}
