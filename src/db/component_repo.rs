use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{Component, Nutrition};
use crate::repo::{ComponentRepository, RepoError};

pub struct SqliteComponentRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct ComponentRow {
    id: String,
    owner_id: String,
    name: String,
    servings: i64,
    ingredients: String,
    prep_time_minutes: i64,
    calories: i64,
    protein: i64,
    carbs: i64,
    fat: i64,
    dietary_restrictions: String,
    notes: String,
    favorite: bool,
    created_at: String,
    updated_at: String,
}

impl SqliteComponentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn hydrate(row: ComponentRow) -> Result<Component, RepoError> {
        Ok(Component {
            id: parse_uuid(&row.id)?,
            owner_id: parse_uuid(&row.owner_id)?,
            name: row.name,
            servings: row.servings.max(0) as u32,
            ingredients: serde_json::from_str(&row.ingredients).unwrap_or_default(),
            prep_time_minutes: row.prep_time_minutes.max(0) as u32,
            nutrition: Nutrition {
                calories: row.calories.max(0) as u32,
                protein: row.protein.max(0) as u32,
                carbs: row.carbs.max(0) as u32,
                fat: row.fat.max(0) as u32,
            },
            dietary_restrictions: row.dietary_restrictions,
            notes: row.notes,
            favorite: row.favorite,
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
        })
    }
}

pub(super) fn parse_uuid(raw: &str) -> Result<Uuid, RepoError> {
    Uuid::parse_str(raw).map_err(|e| RepoError::Storage(format!("invalid uuid '{}': {}", raw, e)))
}

pub(super) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[async_trait]
impl ComponentRepository for SqliteComponentRepository {
    async fn find(&self, owner_id: Uuid) -> Result<Vec<Component>, RepoError> {
        let rows: Vec<ComponentRow> =
            sqlx::query_as("SELECT * FROM components WHERE owner_id = ? ORDER BY name")
                .bind(owner_id.to_string())
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Self::hydrate).collect()
    }

    async fn create(&self, component: &Component) -> Result<(), RepoError> {
        let ingredients = serde_json::to_string(&component.ingredients)
            .map_err(|e| RepoError::Storage(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO components (
                id, owner_id, name, servings, ingredients, prep_time_minutes,
                calories, protein, carbs, fat, dietary_restrictions, notes,
                favorite, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(component.id.to_string())
        .bind(component.owner_id.to_string())
        .bind(&component.name)
        .bind(component.servings as i64)
        .bind(&ingredients)
        .bind(component.prep_time_minutes as i64)
        .bind(component.nutrition.calories as i64)
        .bind(component.nutrition.protein as i64)
        .bind(component.nutrition.carbs as i64)
        .bind(component.nutrition.fat as i64)
        .bind(&component.dietary_restrictions)
        .bind(&component.notes)
        .bind(component.favorite)
        .bind(component.created_at.to_rfc3339())
        .bind(component.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, component: &Component) -> Result<(), RepoError> {
        let ingredients = serde_json::to_string(&component.ingredients)
            .map_err(|e| RepoError::Storage(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE components
            SET name = ?, servings = ?, ingredients = ?, prep_time_minutes = ?,
                calories = ?, protein = ?, carbs = ?, fat = ?,
                dietary_restrictions = ?, notes = ?, favorite = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&component.name)
        .bind(component.servings as i64)
        .bind(&ingredients)
        .bind(component.prep_time_minutes as i64)
        .bind(component.nutrition.calories as i64)
        .bind(component.nutrition.protein as i64)
        .bind(component.nutrition.carbs as i64)
        .bind(component.nutrition.fat as i64)
        .bind(&component.dietary_restrictions)
        .bind(&component.notes)
        .bind(component.favorite)
        .bind(component.updated_at.to_rfc3339())
        .bind(component.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(component.id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM components WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use tempfile::TempDir;

    async fn setup() -> (SqliteComponentRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(temp_dir.path().join("test.db")).await.unwrap();
        (SqliteComponentRepository::new(pool), temp_dir)
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let (repo, _dir) = setup().await;
        let owner = Uuid::new_v4();
        let component = Component::new(owner, "Chicken", 4)
            .with_ingredients(vec!["chicken breast".into(), "oil".into()])
            .with_prep_time(25)
            .with_nutrition(Nutrition {
                calories: 220,
                protein: 30,
                carbs: 0,
                fat: 10,
            });

        repo.create(&component).await.unwrap();

        let found = repo.find(owner).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Chicken");
        assert_eq!(found[0].servings, 4);
        assert_eq!(found[0].ingredients.len(), 2);
        assert_eq!(found[0].nutrition.protein, 30);
    }

    #[tokio::test]
    async fn test_find_filters_by_owner() {
        let (repo, _dir) = setup().await;
        let owner = Uuid::new_v4();

        repo.create(&Component::new(owner, "Mine", 1)).await.unwrap();
        repo.create(&Component::new(Uuid::new_v4(), "Theirs", 1))
            .await
            .unwrap();

        let found = repo.find(owner).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Mine");
    }

    #[tokio::test]
    async fn test_update() {
        let (repo, _dir) = setup().await;
        let owner = Uuid::new_v4();
        let mut component = Component::new(owner, "Rice", 4);
        repo.create(&component).await.unwrap();

        component.servings = 2;
        component.notes = "getting low".to_string();
        repo.update(&component).await.unwrap();

        let found = repo.find(owner).await.unwrap();
        assert_eq!(found[0].servings, 2);
        assert_eq!(found[0].notes, "getting low");
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let (repo, _dir) = setup().await;
        let component = Component::new(Uuid::new_v4(), "Ghost", 1);

        let err = repo.update(&component).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete() {
        let (repo, _dir) = setup().await;
        let owner = Uuid::new_v4();
        let component = Component::new(owner, "Beans", 2);
        repo.create(&component).await.unwrap();

        repo.delete(component.id).await.unwrap();
        assert!(repo.find(owner).await.unwrap().is_empty());

        let err = repo.delete(component.id).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }
}
