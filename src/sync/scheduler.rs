//! The background save loop.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::SyncConfig;
use crate::engine::TransactionEngine;
use crate::repo::{ComponentRepository, FavoriteRepository, MealSlotRepository, RepoError};

use super::{DirtyHandle, SyncError};

/// Observable persistence state, for a "saving… / saved" indicator.
/// Failures never escalate past `Stalled`; there is no hard error state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Clean { last_saved: Option<DateTime<Utc>> },
    Dirty,
    Saving,
    /// Retries exhausted; waiting for the next mutation before trying
    /// again.
    Stalled { attempts: u32 },
}

impl SyncStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, SyncStatus::Clean { .. })
    }
}

/// Flushes dirty in-memory state to the repository.
///
/// State machine: Clean -> Dirty (any store mutation) -> Saving -> Clean,
/// or back to Dirty on failure. Mutations that land while a save is in
/// flight re-mark the handle, and the loop runs a follow-up save
/// immediately, so no write is silently dropped. Consecutive failures are
/// capped: after `max_attempts` the loop stalls until the next mutation
/// instead of retrying forever.
pub struct SyncScheduler {
    engine: Arc<Mutex<TransactionEngine>>,
    components: Arc<dyn ComponentRepository>,
    slots: Arc<dyn MealSlotRepository>,
    favorites: Arc<dyn FavoriteRepository>,
    handle: DirtyHandle,
    config: SyncConfig,
    status_tx: watch::Sender<SyncStatus>,
}

impl SyncScheduler {
    pub fn new(
        engine: Arc<Mutex<TransactionEngine>>,
        components: Arc<dyn ComponentRepository>,
        slots: Arc<dyn MealSlotRepository>,
        favorites: Arc<dyn FavoriteRepository>,
        handle: DirtyHandle,
        config: SyncConfig,
    ) -> Self {
        let (status_tx, _) = watch::channel(SyncStatus::Clean { last_saved: None });
        Self {
            engine,
            components,
            slots,
            favorites,
            handle,
            config,
            status_tx,
        }
    }

    /// Subscribes to status transitions.
    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.status_tx.subscribe()
    }

    /// Runs until the task is dropped. Spawn this once per session.
    pub async fn run(&self) {
        loop {
            self.handle.wait_dirty().await;
            self.set_status(SyncStatus::Dirty);
            // Let bursts of edits settle into a single write.
            tokio::time::sleep(self.config.debounce()).await;

            let mut attempts = 0u32;
            loop {
                self.handle.clear();
                self.set_status(SyncStatus::Saving);

                match self.flush().await {
                    Ok(()) => {
                        if self.handle.is_dirty() {
                            // Mutated while saving; save again right away.
                            attempts = 0;
                            continue;
                        }
                        self.set_status(SyncStatus::Clean {
                            last_saved: Some(Utc::now()),
                        });
                        break;
                    }
                    Err(e) => {
                        attempts += 1;
                        warn!(error = %e, attempts, "save failed");
                        if attempts >= self.config.max_attempts {
                            self.set_status(SyncStatus::Stalled { attempts });
                            break;
                        }
                        self.set_status(SyncStatus::Dirty);
                        tokio::time::sleep(self.config.retry_delay()).await;
                    }
                }
            }
        }
    }

    /// Explicit save, for teardown or a user-triggered "save now".
    pub async fn flush_now(&self) -> Result<(), SyncError> {
        self.handle.clear();
        self.set_status(SyncStatus::Saving);
        match self.flush().await {
            Ok(()) => {
                self.set_status(SyncStatus::Clean {
                    last_saved: Some(Utc::now()),
                });
                Ok(())
            }
            Err(e) => {
                self.handle.mark();
                self.set_status(SyncStatus::Dirty);
                Err(e.into())
            }
        }
    }

    fn set_status(&self, status: SyncStatus) {
        // send_replace never fails; plain send would once all receivers drop.
        self.status_tx.send_replace(status);
    }

    /// Snapshots the stores under a short lock, then reconciles the
    /// repository: components and slots are upserted, favorites are
    /// created/deleted to match, components removed in memory are removed
    /// from storage.
    async fn flush(&self) -> Result<(), RepoError> {
        let (owner_id, components, slots, favorites) = {
            let engine = self.engine.lock().await;
            (
                engine.owner_id(),
                engine.inventory().snapshot(),
                engine.grid().snapshot(),
                engine.favorites().snapshot(),
            )
        };

        debug!(
            components = components.len(),
            slots = slots.len(),
            favorites = favorites.len(),
            "flushing planner state"
        );

        let existing: HashSet<Uuid> = self
            .components
            .find(owner_id)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();
        for component in &components {
            if existing.contains(&component.id) {
                self.components.update(component).await?;
            } else {
                self.components.create(component).await?;
            }
        }
        let live: HashSet<Uuid> = components.iter().map(|c| c.id).collect();
        for id in existing.iter().filter(|id| !live.contains(*id)) {
            self.components.delete(*id).await?;
        }

        let existing_slots: HashSet<String> = self
            .slots
            .find(owner_id)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();
        for slot in &slots {
            if existing_slots.contains(&slot.id) {
                self.slots.update(slot).await?;
            } else {
                self.slots.create(slot).await?;
            }
        }

        let existing_favorites: HashSet<Uuid> = self
            .favorites
            .find(owner_id)
            .await?
            .into_iter()
            .map(|f| f.id)
            .collect();
        for favorite in &favorites {
            if !existing_favorites.contains(&favorite.id) {
                self.favorites.create(favorite).await?;
            }
        }
        let live_favorites: HashSet<Uuid> = favorites.iter().map(|f| f.id).collect();
        for id in existing_favorites
            .iter()
            .filter(|id| !live_favorites.contains(*id))
        {
            self.favorites.delete(*id).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Component, DayOfWeek, FavoriteMeal, MealType};
    use crate::repo::MemoryRepository;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn fast_config(max_attempts: u32) -> SyncConfig {
        SyncConfig {
            debounce_ms: 10,
            retry_delay_ms: 10,
            max_attempts,
        }
    }

    fn scheduler_with(
        repo: Arc<MemoryRepository>,
        config: SyncConfig,
    ) -> (Arc<SyncScheduler>, Arc<Mutex<TransactionEngine>>, DirtyHandle) {
        let handle = DirtyHandle::new();
        let engine = Arc::new(Mutex::new(TransactionEngine::new(
            Uuid::new_v4(),
            handle.clone(),
        )));
        let scheduler = Arc::new(SyncScheduler::new(
            engine.clone(),
            repo.clone(),
            repo.clone(),
            repo,
            handle.clone(),
            config,
        ));
        (scheduler, engine, handle)
    }

    async fn wait_for_saved(scheduler: &SyncScheduler) {
        let mut status = scheduler.status();
        // The channel starts out Clean { last_saved: None }; only a
        // completed save carries a timestamp.
        tokio::time::timeout(
            Duration::from_secs(5),
            status.wait_for(|s| matches!(s, SyncStatus::Clean { last_saved: Some(_) })),
        )
        .await
        .unwrap()
        .unwrap();
    }

    #[tokio::test]
    async fn test_flush_now_persists_all_stores() {
        let repo = Arc::new(MemoryRepository::new());
        let (scheduler, engine, _) = scheduler_with(repo.clone(), fast_config(3));

        {
            let mut engine = engine.lock().await;
            let owner = engine.owner_id();
            engine
                .inventory_mut()
                .add(Component::new(owner, "Chicken", 3))
                .unwrap();
            engine.assign("Chicken", DayOfWeek::Monday, MealType::Lunch).unwrap();
            engine.favorites_mut().add(FavoriteMeal::new(owner, "Bowl"));
        }

        scheduler.flush_now().await.unwrap();

        assert_eq!(repo.component_count(), 1);
        assert_eq!(repo.slot_count(), 1);
        assert_eq!(repo.favorite_count(), 1);
        assert!(scheduler.status().borrow().is_saved());
    }

    #[tokio::test]
    async fn test_flush_reconciles_deletions() {
        let repo = Arc::new(MemoryRepository::new());
        let (scheduler, engine, _) = scheduler_with(repo.clone(), fast_config(3));

        let favorite_id = {
            let mut engine = engine.lock().await;
            let owner = engine.owner_id();
            engine
                .inventory_mut()
                .add(Component::new(owner, "Chicken", 3))
                .unwrap();
            engine.favorites_mut().add(FavoriteMeal::new(owner, "Bowl")).id
        };
        scheduler.flush_now().await.unwrap();

        {
            let mut engine = engine.lock().await;
            engine.inventory_mut().remove("Chicken");
            engine.favorites_mut().remove(favorite_id);
        }
        scheduler.flush_now().await.unwrap();

        assert_eq!(repo.component_count(), 0);
        assert_eq!(repo.favorite_count(), 0);
    }

    #[tokio::test]
    async fn test_run_saves_after_mutation() {
        let repo = Arc::new(MemoryRepository::new());
        let (scheduler, engine, _) = scheduler_with(repo.clone(), fast_config(3));

        let worker = scheduler.clone();
        let task = tokio::spawn(async move { worker.run().await });

        {
            let mut engine = engine.lock().await;
            let owner = engine.owner_id();
            engine
                .inventory_mut()
                .add(Component::new(owner, "Rice", 2))
                .unwrap();
        }

        wait_for_saved(&scheduler).await;
        assert_eq!(repo.component_count(), 1);

        task.abort();
    }

    /// Fails the first N component finds, then behaves.
    struct FlakyRepo {
        inner: MemoryRepository,
        failures_left: AtomicU32,
    }

    impl FlakyRepo {
        fn new(failures: u32) -> Self {
            Self {
                inner: MemoryRepository::new(),
                failures_left: AtomicU32::new(failures),
            }
        }
    }

    #[async_trait]
    impl ComponentRepository for FlakyRepo {
        async fn find(&self, owner_id: Uuid) -> Result<Vec<Component>, RepoError> {
            let left = self.failures_left.load(Ordering::Acquire);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::Release);
                return Err(RepoError::Storage("connection reset".to_string()));
            }
            ComponentRepository::find(&self.inner, owner_id).await
        }

        async fn create(&self, component: &Component) -> Result<(), RepoError> {
            ComponentRepository::create(&self.inner, component).await
        }

        async fn update(&self, component: &Component) -> Result<(), RepoError> {
            ComponentRepository::update(&self.inner, component).await
        }

        async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
            ComponentRepository::delete(&self.inner, id).await
        }
    }

    #[tokio::test]
    async fn test_run_retries_after_failure() {
        let flaky = Arc::new(FlakyRepo::new(1));
        let side = Arc::new(MemoryRepository::new());
        let handle = DirtyHandle::new();
        let engine = Arc::new(Mutex::new(TransactionEngine::new(
            Uuid::new_v4(),
            handle.clone(),
        )));
        let scheduler = Arc::new(SyncScheduler::new(
            engine.clone(),
            flaky.clone(),
            side.clone(),
            side,
            handle,
            fast_config(3),
        ));

        let worker = scheduler.clone();
        let task = tokio::spawn(async move { worker.run().await });

        {
            let mut engine = engine.lock().await;
            let owner = engine.owner_id();
            engine
                .inventory_mut()
                .add(Component::new(owner, "Rice", 2))
                .unwrap();
        }

        wait_for_saved(&scheduler).await;
        assert_eq!(flaky.inner.component_count(), 1);

        task.abort();
    }

    #[tokio::test]
    async fn test_run_stalls_after_max_attempts() {
        let flaky = Arc::new(FlakyRepo::new(u32::MAX));
        let side = Arc::new(MemoryRepository::new());
        let handle = DirtyHandle::new();
        let engine = Arc::new(Mutex::new(TransactionEngine::new(
            Uuid::new_v4(),
            handle.clone(),
        )));
        let scheduler = Arc::new(SyncScheduler::new(
            engine.clone(),
            flaky,
            side.clone(),
            side,
            handle,
            fast_config(2),
        ));

        let worker = scheduler.clone();
        let task = tokio::spawn(async move { worker.run().await });

        {
            let mut engine = engine.lock().await;
            let owner = engine.owner_id();
            engine
                .inventory_mut()
                .add(Component::new(owner, "Rice", 2))
                .unwrap();
        }

        let mut status = scheduler.status();
        let stalled = tokio::time::timeout(
            Duration::from_secs(5),
            status.wait_for(|s| matches!(s, SyncStatus::Stalled { .. })),
        )
        .await
        .unwrap()
        .unwrap()
        .clone();

        assert_eq!(stalled, SyncStatus::Stalled { attempts: 2 });

        task.abort();
    }

    #[tokio::test]
    async fn test_flush_now_failure_keeps_state_dirty() {
        let flaky = Arc::new(FlakyRepo::new(u32::MAX));
        let side = Arc::new(MemoryRepository::new());
        let handle = DirtyHandle::new();
        let engine = Arc::new(Mutex::new(TransactionEngine::new(
            Uuid::new_v4(),
            handle.clone(),
        )));
        let scheduler = SyncScheduler::new(
            engine,
            flaky,
            side.clone(),
            side,
            handle.clone(),
            fast_config(2),
        );

        assert!(scheduler.flush_now().await.is_err());
        assert!(handle.is_dirty());
        assert_eq!(*scheduler.status().borrow(), SyncStatus::Dirty);
    }

    #[tokio::test]
    async fn test_flush_persists_slot_updates() {
        let repo = Arc::new(MemoryRepository::new());
        let (scheduler, engine, _) = scheduler_with(repo.clone(), fast_config(3));
        let owner = { engine.lock().await.owner_id() };

        {
            let mut engine = engine.lock().await;
            engine
                .inventory_mut()
                .add(Component::new(owner, "Chicken", 3))
                .unwrap();
            engine.assign("Chicken", DayOfWeek::Monday, MealType::Lunch).unwrap();
        }
        scheduler.flush_now().await.unwrap();

        {
            let mut engine = engine.lock().await;
            engine.assign("Chicken", DayOfWeek::Monday, MealType::Lunch).unwrap();
        }
        scheduler.flush_now().await.unwrap();

        let slots = MealSlotRepository::find(repo.as_ref(), owner).await.unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].components.len(), 2);
    }

    #[test]
    fn test_status_is_saved() {
        assert!(SyncStatus::Clean { last_saved: None }.is_saved());
        assert!(!SyncStatus::Dirty.is_saved());
        assert!(!SyncStatus::Saving.is_saved());
    }
}
