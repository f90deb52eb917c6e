use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CatalogError;
use crate::value_objects::CategoryId;

/// A catalog category. Categories may nest under one or more parents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: String,
    #[serde(default)]
    pub parent_ids: Vec<CategoryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Builds a new category from a validated payload.
    pub fn create(payload: NewCategory, slug: String, now: DateTime<Utc>) -> Self {
        Self {
            id: CategoryId::new(),
            name: payload.name,
            slug,
            description: payload.description,
            parent_ids: payload.parent_ids,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Payload for creating a category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent_ids: Vec<CategoryId>,
}

impl NewCategory {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::NameRequired);
        }
        Ok(())
    }
}

/// Partial update of a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent_ids: Option<Vec<CategoryId>>,
}

impl CategoryPatch {
    /// Checks the supplied fields for the category being patched.
    pub fn validate(&self, id: CategoryId) -> Result<(), CatalogError> {
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            return Err(CatalogError::NameRequired);
        }
        if self
            .parent_ids
            .as_ref()
            .is_some_and(|parents| parents.contains(&id))
        {
            return Err(CatalogError::SelfParent);
        }
        Ok(())
    }
}
