//! The fixed 7x3 weekly grid of meal slots.

use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::{DayOfWeek, MealSlot, MealType, SlotPatch};
use crate::sync::DirtyHandle;

/// Addressable grid of the current week's 21 meal slots.
///
/// Only slots that have been written are stored; reads of untouched
/// positions synthesize an empty placeholder with the same identity, so
/// callers always see the full 7x3 shape. Slots are never removed, only
/// reset to empty.
pub struct SlotGrid {
    owner_id: Uuid,
    slots: BTreeMap<(DayOfWeek, MealType), MealSlot>,
    dirty: DirtyHandle,
}

impl SlotGrid {
    pub fn new(owner_id: Uuid, dirty: DirtyHandle) -> Self {
        Self {
            owner_id,
            slots: BTreeMap::new(),
            dirty,
        }
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    /// The slot at a position; an empty placeholder if nothing is stored.
    pub fn slot(&self, day: DayOfWeek, meal_type: MealType) -> MealSlot {
        self.slots
            .get(&(day, meal_type))
            .cloned()
            .unwrap_or_else(|| MealSlot::placeholder(self.owner_id, day, meal_type))
    }

    /// Whether the position has a stored record (vs a placeholder).
    pub fn has_record(&self, day: DayOfWeek, meal_type: MealType) -> bool {
        self.slots.contains_key(&(day, meal_type))
    }

    /// Shallow-merges a patch into the slot, creating the record if the
    /// position was still a placeholder.
    pub fn set(&mut self, day: DayOfWeek, meal_type: MealType, patch: SlotPatch) -> &MealSlot {
        let slot = self.slot_mut(day, meal_type);
        slot.apply(patch);
        &self.slots[&(day, meal_type)]
    }

    /// Resets a slot's content to empty, keeping its identity. Returns the
    /// content as it was before the reset.
    pub fn clear(&mut self, day: DayOfWeek, meal_type: MealType) -> MealSlot {
        let previous = self.slot(day, meal_type);
        if let Some(slot) = self.slots.get_mut(&(day, meal_type)) {
            slot.reset();
            self.dirty.mark();
        }
        previous
    }

    /// All 21 slots in day-major order, placeholders included.
    pub fn all_slots(&self) -> Vec<MealSlot> {
        let mut slots = Vec::with_capacity(21);
        for day in DayOfWeek::ALL {
            for meal_type in MealType::ALL {
                slots.push(self.slot(day, meal_type));
            }
        }
        slots
    }

    /// Only the stored records, for persistence.
    pub fn snapshot(&self) -> Vec<MealSlot> {
        self.slots.values().cloned().collect()
    }

    /// Replaces the stored records from persisted state without marking
    /// dirty. Records for another owner are ignored.
    pub fn load(&mut self, slots: Vec<MealSlot>) {
        self.slots = slots
            .into_iter()
            .filter(|s| s.owner_id == self.owner_id)
            .map(|s| ((s.day_of_week, s.meal_type), s))
            .collect();
    }

    /// Mutable access to a slot, materializing the record and marking the
    /// grid dirty. Internal: all external mutation goes through the
    /// transaction engine or `set`.
    pub(crate) fn slot_mut(&mut self, day: DayOfWeek, meal_type: MealType) -> &mut MealSlot {
        self.dirty.mark();
        let owner_id = self.owner_id;
        self.slots
            .entry((day, meal_type))
            .or_insert_with(|| MealSlot::placeholder(owner_id, day, meal_type))
    }
}
