use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::Template;
use crate::repo::{RepoError, TemplateFilter, TemplateRepository};

use super::component_repo::{parse_timestamp, parse_uuid};

pub struct SqliteTemplateRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct TemplateRow {
    id: String,
    owner_id: String,
    name: String,
    description: String,
    is_public: bool,
    days: String,
    components_to_prepare: String,
    tags: String,
    dietary_preferences: String,
    created_at: String,
    updated_at: String,
}

impl SqliteTemplateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn hydrate(row: TemplateRow) -> Result<Template, RepoError> {
        Ok(Template {
            id: parse_uuid(&row.id)?,
            owner_id: parse_uuid(&row.owner_id)?,
            name: row.name,
            description: row.description,
            is_public: row.is_public,
            days: serde_json::from_str(&row.days).unwrap_or_default(),
            components_to_prepare: serde_json::from_str(&row.components_to_prepare)
                .unwrap_or_default(),
            tags: serde_json::from_str(&row.tags).unwrap_or_default(),
            dietary_preferences: row.dietary_preferences,
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
        })
    }

    fn encode(
        template: &Template,
    ) -> Result<(String, String, String), RepoError> {
        let days = serde_json::to_string(&template.days)
            .map_err(|e| RepoError::Storage(e.to_string()))?;
        let components = serde_json::to_string(&template.components_to_prepare)
            .map_err(|e| RepoError::Storage(e.to_string()))?;
        let tags = serde_json::to_string(&template.tags)
            .map_err(|e| RepoError::Storage(e.to_string()))?;
        Ok((days, components, tags))
    }
}

#[async_trait]
impl TemplateRepository for SqliteTemplateRepository {
    async fn find(&self, filter: TemplateFilter) -> Result<Vec<Template>, RepoError> {
        let rows: Vec<TemplateRow> = match (filter.owner_id, filter.is_public) {
            (Some(owner), Some(public)) => {
                sqlx::query_as(
                    "SELECT * FROM templates WHERE owner_id = ? AND is_public = ? ORDER BY name",
                )
                .bind(owner.to_string())
                .bind(public)
                .fetch_all(&self.pool)
                .await?
            }
            (Some(owner), None) => {
                sqlx::query_as("SELECT * FROM templates WHERE owner_id = ? ORDER BY name")
                    .bind(owner.to_string())
                    .fetch_all(&self.pool)
                    .await?
            }
            (None, Some(public)) => {
                sqlx::query_as("SELECT * FROM templates WHERE is_public = ? ORDER BY name")
                    .bind(public)
                    .fetch_all(&self.pool)
                    .await?
            }
            (None, None) => {
                sqlx::query_as("SELECT * FROM templates ORDER BY name")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter().map(Self::hydrate).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Template>, RepoError> {
        let row: Option<TemplateRow> = sqlx::query_as("SELECT * FROM templates WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::hydrate).transpose()
    }

    async fn create(&self, template: &Template) -> Result<(), RepoError> {
        let (days, components, tags) = Self::encode(template)?;

        sqlx::query(
            r#"
            INSERT INTO templates (
                id, owner_id, name, description, is_public, days,
                components_to_prepare, tags, dietary_preferences,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(template.id.to_string())
        .bind(template.owner_id.to_string())
        .bind(&template.name)
        .bind(&template.description)
        .bind(template.is_public)
        .bind(&days)
        .bind(&components)
        .bind(&tags)
        .bind(&template.dietary_preferences)
        .bind(template.created_at.to_rfc3339())
        .bind(template.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, template: &Template) -> Result<(), RepoError> {
        let (days, components, tags) = Self::encode(template)?;

        let result = sqlx::query(
            r#"
            UPDATE templates
            SET name = ?, description = ?, is_public = ?, days = ?,
                components_to_prepare = ?, tags = ?, dietary_preferences = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&template.name)
        .bind(&template.description)
        .bind(template.is_public)
        .bind(&days)
        .bind(&components)
        .bind(&tags)
        .bind(&template.dietary_preferences)
        .bind(template.updated_at.to_rfc3339())
        .bind(template.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(template.id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM templates WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}
