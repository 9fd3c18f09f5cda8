use serde::{Deserialize, Serialize};

/// A user-authored recipe as stored in the recipes slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Stable identifier. Empty only for records written before ids existed;
    /// the store assigns one the first time it sees them.
    #[serde(default)]
    pub id: String,
    pub title: String,
    /// Image URL, empty when the recipe has no picture
    #[serde(rename = "image", default)]
    pub image_url: String,
    pub description: String,
}

impl Recipe {
    /// Build a stored recipe from form input, giving it a fresh id
    pub fn from_draft(draft: RecipeDraft) -> Self {
        Self {
            id: new_recipe_id(),
            title: draft.title,
            image_url: draft.image_url,
            description: draft.description,
        }
    }

    /// Overwrite the editable fields, keeping the id
    pub fn apply(&mut self, draft: RecipeDraft) {
        self.title = draft.title;
        self.image_url = draft.image_url;
        self.description = draft.description;
    }

    pub fn has_image(&self) -> bool {
        !self.image_url.is_empty()
    }

    /// Description cut down to `max_chars` characters for list views
    pub fn excerpt(&self, max_chars: usize) -> String {
        if self.description.chars().count() > max_chars {
            let cut: String = self.description.chars().take(max_chars).collect();
            format!("{}...", cut)
        } else {
            self.description.clone()
        }
    }
}

/// The editable fields of a recipe, as collected by a form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeDraft {
    pub title: String,
    pub image_url: String,
    pub description: String,
}

impl RecipeDraft {
    pub fn new(
        title: impl Into<String>,
        image_url: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            image_url: image_url.into(),
            description: description.into(),
        }
    }

    /// Title and description are required
    pub fn validate(&self) -> crate::Result<()> {
        if self.title.is_empty() {
            return Err(crate::Error::Validation { field: "title" });
        }
        if self.description.is_empty() {
            return Err(crate::Error::Validation {
                field: "description",
            });
        }
        Ok(())
    }
}

impl From<&Recipe> for RecipeDraft {
    fn from(recipe: &Recipe) -> Self {
        Self {
            title: recipe.title.clone(),
            image_url: recipe.image_url.clone(),
            description: recipe.description.clone(),
        }
    }
}

/// Curated recipe supplied by the content provider. Read-only for us.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecipe {
    #[serde(alias = "idFood")]
    pub recipe_id: String,
    pub recipe_name: String,
    #[serde(default)]
    pub recipe_image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_instructions: Option<String>,
}

impl CatalogRecipe {
    /// Instructions for display, with a stand-in when the provider sent none
    pub fn instructions_or_default(&self) -> &str {
        self.recipe_instructions
            .as_deref()
            .unwrap_or("No description available")
    }
}

/// User recipes can be favorited alongside catalog ones
impl From<&Recipe> for CatalogRecipe {
    fn from(recipe: &Recipe) -> Self {
        Self {
            recipe_id: recipe.id.clone(),
            recipe_name: recipe.title.clone(),
            recipe_image: recipe.image_url.clone(),
            recipe_instructions: Some(recipe.description.clone()),
        }
    }
}

pub(crate) fn new_recipe_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
