//! Prepgrid Core Library
//!
//! Shared state and logic for weekly meal prep planning: a component
//! inventory with serving counts, the fixed 7x3 grid of meal slots,
//! detached favorite snapshots, the transaction engine that moves
//! servings between inventory and grid, template export/import, and a
//! background sync scheduler that persists dirty state.

pub mod config;
pub mod db;
pub mod engine;
pub mod favorites;
pub mod grid;
pub mod inventory;
pub mod models;
pub mod repo;
pub mod suggest;
pub mod sync;
pub mod template;

pub use config::{PlannerConfig, SyncConfig};
pub use engine::{
    EngineError, SkipReason, SlotClearReport, SuggestionOutcome, TransactionEngine, TxOutcome,
    WeekClearReport,
};
pub use favorites::FavoritesStore;
pub use grid::SlotGrid;
pub use inventory::{InventoryError, InventoryStore};
pub use models::{
    Component, ComponentRef, DayOfWeek, FavoriteMeal, MealContent, MealSlot, MealType, Nutrition,
    PrepComponent, SlotPatch, Template, TemplateDay, TemplateMeal,
};
pub use repo::{
    ComponentRepository, FavoriteRepository, MealSlotRepository, MemoryRepository, RepoError,
    TemplateFilter, TemplateRepository,
};
pub use suggest::{MealSuggestion, RecommendationProvider, SuggestionError};
pub use sync::{DirtyHandle, SyncError, SyncScheduler, SyncStatus};
pub use template::{
    apply_template, build_template, export_template, import_template, ImportError, ImportReport,
    WeekWindow,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
