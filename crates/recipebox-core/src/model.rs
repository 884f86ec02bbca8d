//! Persisted entities: users, tags, ingredients and recipes.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{CoreError, Result};
use crate::id::{ChildId, RecipeId, UserId};
use crate::price::Price;
use crate::MAX_TEXT_LENGTH;

/// An account. Every tag, ingredient and recipe is owned by exactly one user.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    /// Normalized, unique email address used as the login name.
    pub email: String,
    pub name: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: OffsetDateTime,
}

/// Attributes of a user that is about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl NewUser {
    pub fn new(email: impl Into<String>, name: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            password_hash: password_hash.into(),
            is_staff: false,
            is_superuser: false,
        }
    }

    /// Marks the user as staff and superuser.
    #[must_use]
    pub fn superuser(mut self) -> Self {
        self.is_staff = true;
        self.is_superuser = true;
        self
    }
}

/// The two kinds of child entity a recipe links to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildKind {
    Tag,
    Ingredient,
}

impl ChildKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Ingredient => "ingredient",
        }
    }

    /// The recipe relation that holds children of this kind.
    pub fn relation(&self) -> Relation {
        match self {
            Self::Tag => Relation::Tags,
            Self::Ingredient => Relation::Ingredients,
        }
    }
}

impl fmt::Display for ChildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A many-to-many relation on a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Tags,
    Ingredients,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tags => "tags",
            Self::Ingredients => "ingredients",
        }
    }

    /// Kind of child entity stored in this relation.
    pub fn kind(&self) -> ChildKind {
        match self {
            Self::Tags => ChildKind::Tag,
            Self::Ingredients => ChildKind::Ingredient,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tag or an ingredient. `name` is unique per owner within a kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Child {
    pub id: ChildId,
    pub kind: ChildKind,
    pub owner: UserId,
    pub name: String,
}

impl fmt::Display for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The writable scalar attributes of a recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeFields {
    pub title: String,
    pub time_minutes: i32,
    pub price: Price,
    pub link: String,
    pub description: String,
}

impl RecipeFields {
    pub fn new(title: impl Into<String>, time_minutes: i32, price: Price) -> Self {
        Self {
            title: title.into(),
            time_minutes,
            price,
            link: String::new(),
            description: String::new(),
        }
    }

    /// Trims text fields and checks column limits.
    pub fn validate(mut self) -> Result<Self> {
        self.title = self.title.trim().to_string();
        self.link = self.link.trim().to_string();
        if self.title.is_empty() {
            return Err(CoreError::invalid_field("title", "This field may not be blank."));
        }
        check_length("title", &self.title)?;
        check_length("link", &self.link)?;
        if self.time_minutes < 0 {
            return Err(CoreError::invalid_field(
                "time_minutes",
                "Ensure this value is greater than or equal to 0.",
            ));
        }
        Ok(self)
    }
}

pub(crate) fn check_length(field: &str, value: &str) -> Result<()> {
    if value.chars().count() > MAX_TEXT_LENGTH {
        return Err(CoreError::invalid_field(
            field,
            format!("Ensure this field has no more than {MAX_TEXT_LENGTH} characters."),
        ));
    }
    Ok(())
}

/// A recipe with its scalar attributes and both relation sets.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: RecipeId,
    pub owner: UserId,
    pub title: String,
    pub time_minutes: i32,
    pub price: Price,
    pub link: String,
    pub description: String,
    /// Path of the uploaded image relative to the media root.
    pub image: Option<String>,
    /// Ordered by id.
    pub tags: Vec<Child>,
    /// Ordered by id.
    pub ingredients: Vec<Child>,
}

impl Recipe {
    pub fn fields(&self) -> RecipeFields {
        RecipeFields {
            title: self.title.clone(),
            time_minutes: self.time_minutes,
            price: self.price.clone(),
            link: self.link.clone(),
            description: self.description.clone(),
        }
    }

    pub fn relation(&self, relation: Relation) -> &[Child] {
        match relation {
            Relation::Tags => &self.tags,
            Relation::Ingredients => &self.ingredients,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price() -> Price {
        Price::parse("5.00").unwrap()
    }

    #[test]
    fn child_displays_its_name() {
        let tag = Child {
            id: ChildId::new(1),
            kind: ChildKind::Tag,
            owner: UserId::new(1),
            name: "Tag1".into(),
        };
        assert_eq!(tag.to_string(), "Tag1");
    }

    #[test]
    fn relation_and_kind_map_both_ways() {
        for kind in [ChildKind::Tag, ChildKind::Ingredient] {
            assert_eq!(kind.relation().kind(), kind);
        }
        assert_eq!(Relation::Ingredients.to_string(), "ingredients");
    }

    #[test]
    fn fields_validation_trims_and_rejects_blank_title() {
        let fields = RecipeFields::new("  Pongal ", 60, price()).validate().unwrap();
        assert_eq!(fields.title, "Pongal");

        let err = RecipeFields::new("   ", 10, price()).validate().unwrap_err();
        assert_eq!(err.field(), Some("title"));
    }

    #[test]
    fn fields_validation_checks_limits() {
        let long = "x".repeat(MAX_TEXT_LENGTH + 1);
        assert!(RecipeFields::new(long, 10, price()).validate().is_err());
        assert!(RecipeFields::new("ok", -1, price()).validate().is_err());
    }

    #[test]
    fn superuser_sets_both_flags() {
        let user = NewUser::new("a@example.com", "", "hash").superuser();
        assert!(user.is_staff);
        assert!(user.is_superuser);
    }
}
