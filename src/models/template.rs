use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A portable weekly plan: day-keyed meals plus the deduplicated list of
/// components the week needs. Built by exporting the current week or by an
/// external generator; import consumes it without mutating it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub is_public: bool,
    pub days: Vec<TemplateDay>,
    pub components_to_prepare: Vec<PrepComponent>,
    pub tags: Vec<String>,
    pub dietary_preferences: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Template {
    pub fn new(owner_id: Uuid, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            description: String::new(),
            is_public: false,
            days: Vec::new(),
            components_to_prepare: Vec::new(),
            tags: Vec::new(),
            dietary_preferences: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_days(mut self, days: Vec<TemplateDay>) -> Self {
        self.days = days;
        self
    }

    pub fn with_components_to_prepare(mut self, components: Vec<PrepComponent>) -> Self {
        self.components_to_prepare = components;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn public(mut self) -> Self {
        self.is_public = true;
        self
    }
}

/// One weekday's meals. The day is a free label ("Monday") rather than an
/// enum because templates have no absolute dates; import re-projects labels
/// onto the current week, keeping unrecognized labels out rather than
/// failing the whole import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDay {
    pub day_of_week: String,
    pub meals: Vec<TemplateMeal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateMeal {
    pub meal_type: String,
    pub meal: MealContent,
}

/// The content half of a template meal, position-independent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealContent {
    pub name: String,
    #[serde(default)]
    pub components: Vec<ComponentRef>,
    #[serde(default)]
    pub toppings: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

/// A component reference as it may appear in template data.
///
/// Externally produced templates are not consistent about shape: entries
/// arrive as a bare name, an object carrying a name, or an object carrying
/// only an id. Everything is normalized to a name string at ingestion;
/// id-only references must resolve against the live inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComponentRef {
    Name(String),
    Named { name: String },
    Id { id: Uuid },
}

impl ComponentRef {
    /// The name carried directly by this reference, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            ComponentRef::Name(name) => Some(name),
            ComponentRef::Named { name } => Some(name),
            ComponentRef::Id { .. } => None,
        }
    }

    pub fn id(&self) -> Option<Uuid> {
        match self {
            ComponentRef::Id { id } => Some(*id),
            _ => None,
        }
    }
}

impl From<&str> for ComponentRef {
    fn from(name: &str) -> Self {
        ComponentRef::Name(name.to_string())
    }
}

/// A deduplicated entry in a template's prep list, denormalized from the
/// components referenced across the template's days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepComponent {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub prep_time_minutes: u32,
    #[serde(default)]
    pub storage_life_days: u32,
    #[serde(default)]
    pub base_ingredients: Vec<String>,
}
