//! Projecting a stored template onto the current week.

use chrono::{Datelike, Days, NaiveDate};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::config::PlannerConfig;
use crate::engine::TransactionEngine;
use crate::models::{Component, DayOfWeek, MealSlot, MealType, SlotPatch, Template};
use crate::repo::{MealSlotRepository, RepoError, TemplateRepository};

use super::resolve_refs;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("no template with id {0}")]
    TemplateNotFound(Uuid),
    #[error(transparent)]
    Repository(#[from] RepoError),
}

/// Aggregate outcome of a template import.
///
/// `slots` is the full 21-slot working copy after the merge, so the caller
/// can replace its view wholesale instead of reconciling individual
/// updates.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub components_added: u32,
    pub slots_created: u32,
    pub slots_updated: u32,
    pub slots: Vec<MealSlot>,
}

/// The seven concrete days starting from "today".
///
/// Templates carry weekday labels with no absolute dates; resolving a
/// label through the window pins it to the next occurrence of that
/// weekday, so a Tuesday label imported on a Thursday lands on the
/// upcoming Tuesday rather than the past one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    days: [(NaiveDate, DayOfWeek); 7],
}

impl WeekWindow {
    pub fn starting(today: NaiveDate) -> Self {
        let days = std::array::from_fn(|offset| {
            let date = today + Days::new(offset as u64);
            (date, DayOfWeek::from(date.weekday()))
        });
        Self { days }
    }

    pub fn days(&self) -> &[(NaiveDate, DayOfWeek); 7] {
        &self.days
    }

    /// Case-insensitive weekday label lookup within the window.
    pub fn resolve_label(&self, label: &str) -> Option<(NaiveDate, DayOfWeek)> {
        let label = label.trim();
        self.days
            .iter()
            .copied()
            .find(|(_, day)| day.label().eq_ignore_ascii_case(label))
    }
}

/// Merges a template into the current week.
///
/// Components restock existing records or create new ones; meals update
/// the slot at their (day, meal) position in place when a record exists
/// and create one otherwise, which is what keeps repeated imports from
/// duplicating slots. Each slot write is persisted inside its own failure
/// boundary: a failed write is logged and skipped and the in-memory grid
/// is left untouched for that meal.
pub async fn apply_template(
    engine: &mut TransactionEngine,
    slot_repo: &dyn MealSlotRepository,
    template: &Template,
    today: NaiveDate,
    config: &PlannerConfig,
) -> ImportReport {
    let mut components_added = 0u32;
    let mut slots_created = 0u32;
    let mut slots_updated = 0u32;

    // Restock-or-create for every component the template calls for.
    for prep in &template.components_to_prepare {
        if engine.inventory().find_by_name(&prep.name).is_some() {
            engine
                .inventory_mut()
                .adjust_servings(&prep.name, config.restock_servings as i32);
            continue;
        }

        let component = Component::new(engine.owner_id(), prep.name.clone(), config.seed_servings)
            .with_ingredients(prep.base_ingredients.clone())
            .with_prep_time(prep.prep_time_minutes)
            .with_notes(prep.description.clone());
        match engine.inventory_mut().add(component) {
            Ok(_) => components_added += 1,
            Err(e) => warn!(component = %prep.name, error = %e, "skipping template component"),
        }
    }

    let window = WeekWindow::starting(today);
    for template_day in &template.days {
        let day = match window.resolve_label(&template_day.day_of_week) {
            Some((_, day)) => day,
            // Window lookup covers every weekday name; falling back to a
            // direct parse keeps a label usable even if it somehow missed.
            None => match template_day.day_of_week.parse::<DayOfWeek>() {
                Ok(day) => day,
                Err(_) => {
                    warn!(label = %template_day.day_of_week, "skipping day with unrecognized label");
                    continue;
                }
            },
        };

        for template_meal in &template_day.meals {
            let meal_type = match template_meal.meal_type.parse::<MealType>() {
                Ok(meal_type) => meal_type,
                Err(_) => {
                    warn!(label = %template_meal.meal_type, "skipping meal with unrecognized type");
                    continue;
                }
            };

            let content = &template_meal.meal;
            let patch = SlotPatch::new()
                .name(content.name.clone())
                .components(resolve_refs(&content.components, engine.inventory()))
                .toppings(content.toppings.clone())
                .notes(content.notes.clone());

            let existed = engine.grid().has_record(day, meal_type);
            let mut slot = engine.grid().slot(day, meal_type);
            slot.apply(patch.clone());

            let persisted = if existed {
                slot_repo.update(&slot).await
            } else {
                slot_repo.create(&slot).await
            };

            match persisted {
                Ok(()) => {
                    engine.grid_mut().set(day, meal_type, patch);
                    if existed {
                        slots_updated += 1;
                    } else {
                        slots_created += 1;
                    }
                }
                Err(e) => {
                    warn!(%day, %meal_type, error = %e, "failed to persist meal, skipping");
                }
            }
        }
    }

    ImportReport {
        components_added,
        slots_created,
        slots_updated,
        slots: engine.grid().all_slots(),
    }
}

/// Repository-backed import: resolves the template id, then merges.
pub async fn import_template(
    engine: &mut TransactionEngine,
    template_repo: &dyn TemplateRepository,
    slot_repo: &dyn MealSlotRepository,
    template_id: Uuid,
    today: NaiveDate,
    config: &PlannerConfig,
) -> Result<ImportReport, ImportError> {
    let template = template_repo
        .find_by_id(template_id)
        .await?
        .ok_or(ImportError::TemplateNotFound(template_id))?;

    Ok(apply_template(engine, slot_repo, &template, today, config).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MealContent, PrepComponent, TemplateDay, TemplateMeal};
    use crate::repo::{MemoryRepository, RepoError};
    use crate::sync::DirtyHandle;
    use async_trait::async_trait;

    fn sample_template(owner: Uuid) -> Template {
        Template::new(owner, "Prep Week")
            .with_components_to_prepare(vec![
                PrepComponent {
                    name: "Chicken".to_string(),
                    description: "Grilled in bulk".to_string(),
                    prep_time_minutes: 25,
                    storage_life_days: 4,
                    base_ingredients: vec!["chicken breast".to_string()],
                },
                PrepComponent {
                    name: "Rice".to_string(),
                    description: String::new(),
                    prep_time_minutes: 20,
                    storage_life_days: 5,
                    base_ingredients: vec![],
                },
            ])
            .with_days(vec![TemplateDay {
                day_of_week: "Tuesday".to_string(),
                meals: vec![TemplateMeal {
                    meal_type: "Lunch".to_string(),
                    meal: MealContent {
                        name: "Chicken Bowl".to_string(),
                        components: vec!["Chicken".into(), "Rice".into()],
                        toppings: vec!["salsa".to_string()],
                        notes: String::new(),
                    },
                }],
            }])
    }

    fn engine() -> TransactionEngine {
        TransactionEngine::new(Uuid::new_v4(), DirtyHandle::new())
    }

    // 2025-01-09 is a Thursday.
    fn thursday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 9).unwrap()
    }

    #[test]
    fn test_week_window_covers_seven_days() {
        let window = WeekWindow::starting(thursday());

        assert_eq!(window.days()[0].1, DayOfWeek::Thursday);
        assert_eq!(window.days()[6].1, DayOfWeek::Wednesday);
    }

    #[test]
    fn test_week_window_resolves_to_upcoming_day() {
        let window = WeekWindow::starting(thursday());

        let (date, day) = window.resolve_label("tuesday").unwrap();
        assert_eq!(day, DayOfWeek::Tuesday);
        // The upcoming Tuesday, not the one two days past.
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 1, 14).unwrap());
    }

    #[test]
    fn test_week_window_unknown_label() {
        let window = WeekWindow::starting(thursday());
        assert!(window.resolve_label("someday").is_none());
    }

    #[tokio::test]
    async fn test_import_creates_components_and_slots() {
        let mut engine = engine();
        let repo = MemoryRepository::new();
        let template = sample_template(engine.owner_id());
        let config = PlannerConfig::default();

        let report = apply_template(&mut engine, &repo, &template, thursday(), &config).await;

        assert_eq!(report.components_added, 2);
        assert_eq!(report.slots_created, 1);
        assert_eq!(report.slots_updated, 0);
        assert_eq!(report.slots.len(), 21);

        assert_eq!(
            engine.inventory().find_by_name("Chicken").unwrap().servings,
            config.seed_servings
        );

        let slot = engine.grid().slot(DayOfWeek::Tuesday, MealType::Lunch);
        assert_eq!(slot.name, "Chicken Bowl");
        assert_eq!(slot.components, vec!["Chicken".to_string(), "Rice".to_string()]);
        assert_eq!(slot.toppings, vec!["salsa".to_string()]);
        assert_eq!(repo.slot_count(), 1);
    }

    #[tokio::test]
    async fn test_import_restocks_existing_components() {
        let mut engine = engine();
        let owner = engine.owner_id();
        engine
            .inventory_mut()
            .add(Component::new(owner, "Chicken", 1))
            .unwrap();
        let repo = MemoryRepository::new();
        let template = sample_template(owner);
        let config = PlannerConfig::default();

        let report = apply_template(&mut engine, &repo, &template, thursday(), &config).await;

        // Chicken restocked, Rice created.
        assert_eq!(report.components_added, 1);
        assert_eq!(
            engine.inventory().find_by_name("Chicken").unwrap().servings,
            1 + config.restock_servings
        );
    }

    #[tokio::test]
    async fn test_import_twice_is_idempotent_on_slots() {
        let mut engine = engine();
        let repo = MemoryRepository::new();
        let template = sample_template(engine.owner_id());
        let config = PlannerConfig::default();

        let first = apply_template(&mut engine, &repo, &template, thursday(), &config).await;
        let servings_after_first =
            engine.inventory().find_by_name("Chicken").unwrap().servings;
        let second = apply_template(&mut engine, &repo, &template, thursday(), &config).await;

        assert_eq!(first.slots_created, 1);
        assert_eq!(second.slots_created, 0);
        assert_eq!(second.slots_updated, 1);

        // Slot content is stable; no duplicates accumulate.
        let slot = engine.grid().slot(DayOfWeek::Tuesday, MealType::Lunch);
        assert_eq!(slot.components, vec!["Chicken".to_string(), "Rice".to_string()]);
        assert_eq!(repo.slot_count(), 1);

        // Servings keep growing: import restocks.
        assert_eq!(
            engine.inventory().find_by_name("Chicken").unwrap().servings,
            servings_after_first + config.restock_servings
        );
    }

    #[tokio::test]
    async fn test_import_skips_unrecognized_labels() {
        let mut engine = engine();
        let repo = MemoryRepository::new();
        let mut template = sample_template(engine.owner_id());
        template.days.push(TemplateDay {
            day_of_week: "Feast Day".to_string(),
            meals: vec![TemplateMeal {
                meal_type: "lunch".to_string(),
                meal: MealContent {
                    name: "Lost".to_string(),
                    components: vec![],
                    toppings: vec![],
                    notes: String::new(),
                },
            }],
        });
        template.days[0].meals.push(TemplateMeal {
            meal_type: "second breakfast".to_string(),
            meal: MealContent {
                name: "Also Lost".to_string(),
                components: vec![],
                toppings: vec![],
                notes: String::new(),
            },
        });

        let report =
            apply_template(&mut engine, &repo, &template, thursday(), &PlannerConfig::default())
                .await;

        assert_eq!(report.slots_created, 1);
        assert!(engine
            .grid()
            .all_slots()
            .iter()
            .all(|s| s.name != "Lost" && s.name != "Also Lost"));
    }

    struct FailingSlotRepo;

    #[async_trait]
    impl MealSlotRepository for FailingSlotRepo {
        async fn find(&self, _owner_id: Uuid) -> Result<Vec<MealSlot>, RepoError> {
            Ok(Vec::new())
        }

        async fn create(&self, slot: &MealSlot) -> Result<(), RepoError> {
            if slot.day_of_week == DayOfWeek::Tuesday {
                Err(RepoError::Storage("disk full".to_string()))
            } else {
                Ok(())
            }
        }

        async fn update(&self, _slot: &MealSlot) -> Result<(), RepoError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_import_continues_past_slot_write_failures() {
        let mut engine = engine();
        let mut template = sample_template(engine.owner_id());
        template.days.push(TemplateDay {
            day_of_week: "Friday".to_string(),
            meals: vec![TemplateMeal {
                meal_type: "dinner".to_string(),
                meal: MealContent {
                    name: "Tacos".to_string(),
                    components: vec!["Chicken".into()],
                    toppings: vec![],
                    notes: String::new(),
                },
            }],
        });

        let report = apply_template(
            &mut engine,
            &FailingSlotRepo,
            &template,
            thursday(),
            &PlannerConfig::default(),
        )
        .await;

        // Tuesday's write failed and was skipped; Friday's landed.
        assert_eq!(report.slots_created, 1);
        assert!(engine.grid().slot(DayOfWeek::Tuesday, MealType::Lunch).is_empty());
        assert_eq!(engine.grid().slot(DayOfWeek::Friday, MealType::Dinner).name, "Tacos");
    }

    #[tokio::test]
    async fn test_import_template_by_id() {
        let mut engine = engine();
        let repo = MemoryRepository::new();
        let template = sample_template(engine.owner_id());
        crate::repo::TemplateRepository::create(&repo, &template)
            .await
            .unwrap();

        let report = import_template(
            &mut engine,
            &repo,
            &repo,
            template.id,
            thursday(),
            &PlannerConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.slots_created, 1);
    }

    #[tokio::test]
    async fn test_import_template_unknown_id() {
        let mut engine = engine();
        let repo = MemoryRepository::new();
        let missing = Uuid::new_v4();

        let err = import_template(
            &mut engine,
            &repo,
            &repo,
            missing,
            thursday(),
            &PlannerConfig::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ImportError::TemplateNotFound(id) if id == missing));
    }
}
