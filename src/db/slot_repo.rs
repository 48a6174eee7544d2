use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{DayOfWeek, MealSlot, MealType};
use crate::repo::{MealSlotRepository, RepoError};

use super::component_repo::{parse_timestamp, parse_uuid};

pub struct SqliteSlotRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct SlotRow {
    id: String,
    owner_id: String,
    day_of_week: String,
    meal_type: String,
    name: String,
    components: String,
    toppings: String,
    notes: String,
    favorite: bool,
    updated_at: String,
}

impl SqliteSlotRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn hydrate(row: SlotRow) -> Result<MealSlot, RepoError> {
        Ok(MealSlot {
            id: row.id,
            owner_id: parse_uuid(&row.owner_id)?,
            day_of_week: row.day_of_week.parse().unwrap_or(DayOfWeek::Monday),
            meal_type: row.meal_type.parse().unwrap_or(MealType::Dinner),
            name: row.name,
            components: serde_json::from_str(&row.components).unwrap_or_default(),
            toppings: serde_json::from_str(&row.toppings).unwrap_or_default(),
            notes: row.notes,
            favorite: row.favorite,
            updated_at: parse_timestamp(&row.updated_at),
        })
    }
}

#[async_trait]
impl MealSlotRepository for SqliteSlotRepository {
    async fn find(&self, owner_id: Uuid) -> Result<Vec<MealSlot>, RepoError> {
        let rows: Vec<SlotRow> = sqlx::query_as("SELECT * FROM meal_slots WHERE owner_id = ?")
            .bind(owner_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::hydrate).collect()
    }

    async fn create(&self, slot: &MealSlot) -> Result<(), RepoError> {
        let components =
            serde_json::to_string(&slot.components).map_err(|e| RepoError::Storage(e.to_string()))?;
        let toppings =
            serde_json::to_string(&slot.toppings).map_err(|e| RepoError::Storage(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO meal_slots (
                id, owner_id, day_of_week, meal_type, name, components,
                toppings, notes, favorite, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&slot.id)
        .bind(slot.owner_id.to_string())
        .bind(slot.day_of_week.to_string())
        .bind(slot.meal_type.to_string())
        .bind(&slot.name)
        .bind(&components)
        .bind(&toppings)
        .bind(&slot.notes)
        .bind(slot.favorite)
        .bind(slot.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, slot: &MealSlot) -> Result<(), RepoError> {
        let components =
            serde_json::to_string(&slot.components).map_err(|e| RepoError::Storage(e.to_string()))?;
        let toppings =
            serde_json::to_string(&slot.toppings).map_err(|e| RepoError::Storage(e.to_string()))?;

        // Slot identity is positional, so an update that finds no row is
        // treated as first write rather than an error.
        let result = sqlx::query(
            r#"
            UPDATE meal_slots
            SET name = ?, components = ?, toppings = ?, notes = ?,
                favorite = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&slot.name)
        .bind(&components)
        .bind(&toppings)
        .bind(&slot.notes)
        .bind(slot.favorite)
        .bind(slot.updated_at.to_rfc3339())
        .bind(&slot.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return self.create(slot).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use tempfile::TempDir;

    async fn setup() -> (SqliteSlotRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(temp_dir.path().join("test.db")).await.unwrap();
        (SqliteSlotRepository::new(pool), temp_dir)
    }

    fn slot(owner: Uuid) -> MealSlot {
        let mut slot = MealSlot::placeholder(owner, DayOfWeek::Monday, MealType::Lunch);
        slot.name = "Bowl".to_string();
        slot.components = vec!["Chicken".into(), "Rice".into()];
        slot.toppings = vec!["salsa".into()];
        slot
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let (repo, _dir) = setup().await;
        let owner = Uuid::new_v4();

        repo.create(&slot(owner)).await.unwrap();

        let found = repo.find(owner).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Bowl");
        assert_eq!(found[0].day_of_week, DayOfWeek::Monday);
        assert_eq!(found[0].meal_type, MealType::Lunch);
        assert_eq!(found[0].components, vec!["Chicken".to_string(), "Rice".to_string()]);
    }

    #[tokio::test]
    async fn test_update_existing_row() {
        let (repo, _dir) = setup().await;
        let owner = Uuid::new_v4();
        let mut record = slot(owner);
        repo.create(&record).await.unwrap();

        record.components.push("Beans".to_string());
        record.favorite = true;
        repo.update(&record).await.unwrap();

        let found = repo.find(owner).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].components.len(), 3);
        assert!(found[0].favorite);
    }

    #[tokio::test]
    async fn test_update_missing_row_creates_it() {
        let (repo, _dir) = setup().await;
        let owner = Uuid::new_v4();

        repo.update(&slot(owner)).await.unwrap();

        let found = repo.find(owner).await.unwrap();
        assert_eq!(found.len(), 1);
    }
}
