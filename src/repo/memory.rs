//! In-process repository backed by plain maps.
//!
//! Serves as the test double for the scheduler and import paths and as
//! the reference for repository semantics. Not a cache: when a database
//! is configured, the SQLite implementations are the source of truth.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::models::{Component, FavoriteMeal, MealSlot, Template};

use super::{
    ComponentRepository, FavoriteRepository, MealSlotRepository, RepoError, TemplateFilter,
    TemplateRepository,
};

#[derive(Default)]
pub struct MemoryRepository {
    components: Mutex<HashMap<Uuid, Component>>,
    slots: Mutex<HashMap<String, MealSlot>>,
    favorites: Mutex<HashMap<Uuid, FavoriteMeal>>,
    templates: Mutex<HashMap<Uuid, Template>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn component_count(&self) -> usize {
        self.components.lock().unwrap().len()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.lock().unwrap().len()
    }

    pub fn favorite_count(&self) -> usize {
        self.favorites.lock().unwrap().len()
    }
}

#[async_trait]
impl ComponentRepository for MemoryRepository {
    async fn find(&self, owner_id: Uuid) -> Result<Vec<Component>, RepoError> {
        let components = self.components.lock().unwrap();
        Ok(components
            .values()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn create(&self, component: &Component) -> Result<(), RepoError> {
        self.components
            .lock()
            .unwrap()
            .insert(component.id, component.clone());
        Ok(())
    }

    async fn update(&self, component: &Component) -> Result<(), RepoError> {
        let mut components = self.components.lock().unwrap();
        if !components.contains_key(&component.id) {
            return Err(RepoError::NotFound(component.id));
        }
        components.insert(component.id, component.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.components
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound(id))
    }
}

#[async_trait]
impl MealSlotRepository for MemoryRepository {
    async fn find(&self, owner_id: Uuid) -> Result<Vec<MealSlot>, RepoError> {
        let slots = self.slots.lock().unwrap();
        Ok(slots
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn create(&self, slot: &MealSlot) -> Result<(), RepoError> {
        self.slots
            .lock()
            .unwrap()
            .insert(slot.id.clone(), slot.clone());
        Ok(())
    }

    async fn update(&self, slot: &MealSlot) -> Result<(), RepoError> {
        self.slots
            .lock()
            .unwrap()
            .insert(slot.id.clone(), slot.clone());
        Ok(())
    }
}

#[async_trait]
impl FavoriteRepository for MemoryRepository {
    async fn find(&self, owner_id: Uuid) -> Result<Vec<FavoriteMeal>, RepoError> {
        let favorites = self.favorites.lock().unwrap();
        Ok(favorites
            .values()
            .filter(|f| f.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn create(&self, favorite: &FavoriteMeal) -> Result<(), RepoError> {
        self.favorites
            .lock()
            .unwrap()
            .insert(favorite.id, favorite.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.favorites
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound(id))
    }
}

#[async_trait]
impl TemplateRepository for MemoryRepository {
    async fn find(&self, filter: TemplateFilter) -> Result<Vec<Template>, RepoError> {
        let templates = self.templates.lock().unwrap();
        Ok(templates
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Template>, RepoError> {
        Ok(self.templates.lock().unwrap().get(&id).cloned())
    }

    async fn create(&self, template: &Template) -> Result<(), RepoError> {
        self.templates
            .lock()
            .unwrap()
            .insert(template.id, template.clone());
        Ok(())
    }

    async fn update(&self, template: &Template) -> Result<(), RepoError> {
        let mut templates = self.templates.lock().unwrap();
        if !templates.contains_key(&template.id) {
            return Err(RepoError::NotFound(template.id));
        }
        templates.insert(template.id, template.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.templates
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound(id))
    }
}
