//! Query types for the recipebox storage abstraction layer.

use recipebox_core::ChildId;

/// Membership filter for recipe listings.
///
/// A recipe matches when, for every list that is set, it is attached to at
/// least one of the listed ids. An empty list matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    /// Keep recipes carrying any of these tags.
    pub tags: Option<Vec<ChildId>>,
    /// Keep recipes using any of these ingredients.
    pub ingredients: Option<Vec<ChildId>>,
}

impl RecipeFilter {
    /// Creates a filter that matches every recipe.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the listing to recipes with any of the given tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<ChildId>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Restricts the listing to recipes with any of the given ingredients.
    #[must_use]
    pub fn with_ingredients(mut self, ingredients: Vec<ChildId>) -> Self {
        self.ingredients = Some(ingredients);
        self
    }

    /// Returns `true` if no restriction is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_none() && self.ingredients.is_none()
    }
}

/// Filter for tag and ingredient listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChildFilter {
    /// Keep only children attached to at least one of the owner's recipes.
    pub assigned_only: bool,
}

impl ChildFilter {
    /// Creates a filter that matches every child.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the assigned-only flag.
    #[must_use]
    pub fn with_assigned_only(mut self, assigned_only: bool) -> Self {
        self.assigned_only = assigned_only;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipe_filter_builder() {
        let filter = RecipeFilter::new();
        assert!(filter.is_empty());

        let filter = filter
            .with_tags(vec![ChildId::new(1), ChildId::new(2)])
            .with_ingredients(vec![ChildId::new(3)]);
        assert!(!filter.is_empty());
        assert_eq!(filter.tags.as_deref().map(<[_]>::len), Some(2));
        assert_eq!(filter.ingredients, Some(vec![ChildId::new(3)]));
    }

    #[test]
    fn child_filter_builder() {
        assert!(!ChildFilter::new().assigned_only);
        assert!(ChildFilter::new().with_assigned_only(true).assigned_only);
    }
}
