use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::FavoriteMeal;
use crate::repo::{FavoriteRepository, RepoError};

use super::component_repo::{parse_timestamp, parse_uuid};

pub struct SqliteFavoriteRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct FavoriteRow {
    id: String,
    owner_id: String,
    name: String,
    components: String,
    toppings: String,
    notes: String,
    created_at: String,
}

impl SqliteFavoriteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn hydrate(row: FavoriteRow) -> Result<FavoriteMeal, RepoError> {
        Ok(FavoriteMeal {
            id: parse_uuid(&row.id)?,
            owner_id: parse_uuid(&row.owner_id)?,
            name: row.name,
            components: serde_json::from_str(&row.components).unwrap_or_default(),
            toppings: serde_json::from_str(&row.toppings).unwrap_or_default(),
            notes: row.notes,
            created_at: parse_timestamp(&row.created_at),
        })
    }
}

#[async_trait]
impl FavoriteRepository for SqliteFavoriteRepository {
    async fn find(&self, owner_id: Uuid) -> Result<Vec<FavoriteMeal>, RepoError> {
        let rows: Vec<FavoriteRow> =
            sqlx::query_as("SELECT * FROM favorites WHERE owner_id = ? ORDER BY name")
                .bind(owner_id.to_string())
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Self::hydrate).collect()
    }

    async fn create(&self, favorite: &FavoriteMeal) -> Result<(), RepoError> {
        let components = serde_json::to_string(&favorite.components)
            .map_err(|e| RepoError::Storage(e.to_string()))?;
        let toppings = serde_json::to_string(&favorite.toppings)
            .map_err(|e| RepoError::Storage(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO favorites (id, owner_id, name, components, toppings, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(favorite.id.to_string())
        .bind(favorite.owner_id.to_string())
        .bind(&favorite.name)
        .bind(&components)
        .bind(&toppings)
        .bind(&favorite.notes)
        .bind(favorite.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM favorites WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}
