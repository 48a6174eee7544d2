//! Turning the current week into a reusable template.

use std::collections::{BTreeMap, HashSet};
use tracing::warn;

use crate::engine::TransactionEngine;
use crate::inventory::InventoryStore;
use crate::models::{
    ComponentRef, DayOfWeek, MealContent, MealSlot, MealType, PrepComponent, Template,
    TemplateDay, TemplateMeal,
};

/// Builds a template from a set of slots and the live inventory.
///
/// Empty slots are left out. Grouping goes through a keyed map, so if the
/// input carries duplicate (day, meal) pairs the last one wins and the
/// template never contains duplicate positions. The prep list is the
/// deduplicated set of referenced components that still resolve against
/// the inventory; names without a record are dropped.
pub fn build_template(
    name: &str,
    description: &str,
    slots: &[MealSlot],
    inventory: &InventoryStore,
) -> Template {
    let mut grouped: BTreeMap<(DayOfWeek, MealType), &MealSlot> = BTreeMap::new();
    for slot in slots.iter().filter(|s| !s.is_empty()) {
        grouped.insert((slot.day_of_week, slot.meal_type), slot);
    }

    let mut days: BTreeMap<DayOfWeek, TemplateDay> = BTreeMap::new();
    for ((day, meal_type), slot) in &grouped {
        days.entry(*day)
            .or_insert_with(|| TemplateDay {
                day_of_week: day.label().to_string(),
                meals: Vec::new(),
            })
            .meals
            .push(TemplateMeal {
                meal_type: meal_type.to_string(),
                meal: MealContent {
                    name: slot.name.clone(),
                    components: slot
                        .components
                        .iter()
                        .map(|n| ComponentRef::Name(n.clone()))
                        .collect(),
                    toppings: slot.toppings.clone(),
                    notes: slot.notes.clone(),
                },
            });
    }

    let components_to_prepare = collect_prep_components(grouped.values().copied(), inventory);

    Template::new(inventory.owner_id(), name)
        .with_description(description)
        .with_days(days.into_values().collect())
        .with_components_to_prepare(components_to_prepare)
}

/// Convenience wrapper over the live grid.
pub fn export_template(engine: &TransactionEngine, name: &str, description: &str) -> Template {
    build_template(name, description, &engine.grid().all_slots(), engine.inventory())
}

fn collect_prep_components<'a>(
    slots: impl Iterator<Item = &'a MealSlot>,
    inventory: &InventoryStore,
) -> Vec<PrepComponent> {
    let mut seen = HashSet::new();
    let mut prep = Vec::new();

    for slot in slots {
        for name in &slot.components {
            if !seen.insert(name.clone()) {
                continue;
            }
            match inventory.find_by_name(name) {
                Some(component) => prep.push(PrepComponent {
                    name: component.name.clone(),
                    description: component.notes.clone(),
                    prep_time_minutes: component.prep_time_minutes,
                    storage_life_days: 0,
                    base_ingredients: component.ingredients.clone(),
                }),
                None => {
                    warn!(component = %name, "dropping referenced component with no inventory record")
                }
            }
        }
    }

    prep
}
