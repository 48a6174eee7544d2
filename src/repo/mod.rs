//! Abstract persistence consumed by the sync scheduler and the template
//! merge engine. Implementations live in `db` (SQLite) and in
//! [`MemoryRepository`] for in-process use.

mod memory;

pub use memory::MemoryRepository;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Component, FavoriteMeal, MealSlot, Template};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("record not found: {0}")]
    NotFound(Uuid),
    #[error("storage error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait ComponentRepository: Send + Sync {
    async fn find(&self, owner_id: Uuid) -> Result<Vec<Component>, RepoError>;
    async fn create(&self, component: &Component) -> Result<(), RepoError>;
    async fn update(&self, component: &Component) -> Result<(), RepoError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait MealSlotRepository: Send + Sync {
    async fn find(&self, owner_id: Uuid) -> Result<Vec<MealSlot>, RepoError>;
    async fn create(&self, slot: &MealSlot) -> Result<(), RepoError>;
    async fn update(&self, slot: &MealSlot) -> Result<(), RepoError>;
}

#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    async fn find(&self, owner_id: Uuid) -> Result<Vec<FavoriteMeal>, RepoError>;
    async fn create(&self, favorite: &FavoriteMeal) -> Result<(), RepoError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;
}

/// Filter for template listing; `None` fields match everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateFilter {
    pub owner_id: Option<Uuid>,
    pub is_public: Option<bool>,
}

impl TemplateFilter {
    pub fn owned_by(owner_id: Uuid) -> Self {
        Self {
            owner_id: Some(owner_id),
            is_public: None,
        }
    }

    pub fn public() -> Self {
        Self {
            owner_id: None,
            is_public: Some(true),
        }
    }

    pub fn matches(&self, template: &Template) -> bool {
        self.owner_id.map_or(true, |o| template.owner_id == o)
            && self.is_public.map_or(true, |p| template.is_public == p)
    }
}

#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn find(&self, filter: TemplateFilter) -> Result<Vec<Template>, RepoError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Template>, RepoError>;
    async fn create(&self, template: &Template) -> Result<(), RepoError>;
    async fn update(&self, template: &Template) -> Result<(), RepoError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;
}
