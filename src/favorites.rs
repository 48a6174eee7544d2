//! Detached favorite meal snapshots, independent of any grid position.

use uuid::Uuid;

use crate::models::FavoriteMeal;
use crate::sync::DirtyHandle;

/// Holds one owner's favorite snapshots.
///
/// The store itself does not deduplicate; the transaction engine checks
/// `contains_name` before preserving a cleared slot so repeated clears of
/// the same meal do not pile up copies.
pub struct FavoritesStore {
    owner_id: Uuid,
    favorites: Vec<FavoriteMeal>,
    dirty: DirtyHandle,
}

impl FavoritesStore {
    pub fn new(owner_id: Uuid, dirty: DirtyHandle) -> Self {
        Self {
            owner_id,
            favorites: Vec::new(),
            dirty,
        }
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    pub fn add(&mut self, favorite: FavoriteMeal) -> &FavoriteMeal {
        self.favorites.push(favorite);
        self.dirty.mark();
        self.favorites.last().unwrap()
    }

    pub fn remove(&mut self, id: Uuid) -> Option<FavoriteMeal> {
        let position = self.favorites.iter().position(|f| f.id == id)?;
        let removed = self.favorites.remove(position);
        self.dirty.mark();
        Some(removed)
    }

    pub fn list(&self) -> &[FavoriteMeal] {
        &self.favorites
    }

    pub fn find(&self, id: Uuid) -> Option<&FavoriteMeal> {
        self.favorites.iter().find(|f| f.id == id)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.favorites
            .iter()
            .any(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Hydrates from persisted records without marking dirty.
    pub fn load(&mut self, favorites: Vec<FavoriteMeal>) {
        self.favorites = favorites;
    }

    pub fn snapshot(&self) -> Vec<FavoriteMeal> {
        self.favorites.clone()
    }
}
