//! Category types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use atelier_core::CategoryId;

use super::image;

/// A product category with its tile image.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub image: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// Category as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub id: CategoryId,
    pub category: String,
    pub img: String,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            category: category.name.clone(),
            img: image::to_data_url(&category.image),
        }
    }
}

/// Body of the category create and edit endpoints.
///
/// Edits may omit either field to keep its current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryInput {
    pub category: Option<String>,
    pub img: Option<String>,
}

/// Validated category changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub image: Option<Vec<u8>>,
}

impl CategoryInput {
    /// Validate for an edit: present fields must be usable.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message if a present field is blank or the
    /// image cannot be decoded.
    pub fn into_changes(self) -> Result<CategoryChanges, String> {
        let name = match self.category {
            Some(name) if name.trim().is_empty() => {
                return Err("Category name cannot be empty".to_string());
            }
            other => other.map(|n| n.trim().to_string()),
        };
        let image = self
            .img
            .as_deref()
            .map(image::decode)
            .transpose()
            .map_err(|e| e.to_string())?;
        Ok(CategoryChanges { name, image })
    }

    /// Validate for a create: both fields are required.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message if either field is missing or invalid.
    pub fn into_new(self) -> Result<(String, Vec<u8>), String> {
        match self.into_changes()? {
            CategoryChanges {
                name: Some(name),
                image: Some(image),
            } => Ok((name, image)),
            _ => Err("Category and image are required".to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_into_new_requires_both_fields() {
        let missing_image = CategoryInput {
            category: Some("Shirts".to_string()),
            img: None,
        };
        assert_eq!(
            missing_image.into_new().unwrap_err(),
            "Category and image are required"
        );

        let complete = CategoryInput {
            category: Some(" Shirts ".to_string()),
            img: Some("aGVsbG8=".to_string()),
        };
        let (name, image) = complete.into_new().unwrap();
        assert_eq!(name, "Shirts");
        assert_eq!(image, b"hello");
    }

    #[test]
    fn test_into_changes_allows_partial_edit() {
        let changes = CategoryInput {
            category: Some("Mugs".to_string()),
            img: None,
        }
        .into_changes()
        .unwrap();
        assert_eq!(changes.name.as_deref(), Some("Mugs"));
        assert!(changes.image.is_none());

        assert!(
            CategoryInput {
                category: Some("  ".to_string()),
                img: None
            }
            .into_changes()
            .is_err()
        );
    }
}
