//! Collaborator interface for externally generated meal suggestions.
//!
//! The provider is opaque to this crate: given the owner's available
//! components and dietary notes it returns structured suggestions. An
//! accepted suggestion flows through the transaction engine's normal
//! assignment path, so serving accounting is identical to a manual drag.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Component;

/// One suggested meal, as returned by a recommendation provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealSuggestion {
    pub meal_name: String,
    /// Names of components from the owner's inventory.
    #[serde(default)]
    pub components: Vec<String>,
    /// Free-text extras that are not inventory-backed.
    #[serde(default)]
    pub additional_ingredients: Vec<String>,
    #[serde(default)]
    pub preparation_instructions: String,
    #[serde(default)]
    pub nutritional_info: String,
}

#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("recommendation provider unavailable: {0}")]
    Unavailable(String),
    #[error("malformed suggestion payload: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait RecommendationProvider: Send + Sync {
    async fn suggest(
        &self,
        available: &[Component],
        dietary_preferences: &str,
    ) -> Result<Vec<MealSuggestion>, SuggestionError>;
}
