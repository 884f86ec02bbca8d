//! Storage traits for the recipebox storage abstraction layer.
//!
//! This module defines the core traits that all storage backends must implement.

use async_trait::async_trait;
use recipebox_core::{Child, ChildId, ChildKind, Recipe, RecipeFields, RecipeId, Relation, UserId};

use crate::error::StorageError;
use crate::types::{ChildFilter, RecipeFilter};

/// Primitives the nested-collection reconciler is built on.
///
/// Every lookup and insert is scoped to an owner. Implementations must
/// enforce uniqueness of `(owner, name)` per [`ChildKind`] so that a losing
/// concurrent insert fails with `StorageError::AlreadyExists` instead of
/// producing a duplicate row.
#[async_trait]
pub trait ChildStore: Send {
    /// Finds the child of `kind` owned by `owner` whose name equals `name`.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing rows.
    async fn find_child(
        &mut self,
        kind: ChildKind,
        owner: UserId,
        name: &str,
    ) -> Result<Option<Child>, StorageError>;

    /// Inserts a new child.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if `owner` already has a child of
    /// `kind` named `name`.
    async fn create_child(
        &mut self,
        kind: ChildKind,
        owner: UserId,
        name: &str,
    ) -> Result<Child, StorageError>;

    /// Detaches every member of `relation` from `recipe`. Children are kept.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the recipe does not exist.
    async fn clear_relation(
        &mut self,
        recipe: RecipeId,
        relation: Relation,
    ) -> Result<(), StorageError>;

    /// Attaches `child` to `recipe`'s `relation`. Attaching twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the recipe or child does not exist.
    /// Returns `StorageError::InvalidRelation` if the child is owned by a
    /// different user than the recipe.
    async fn add_to_relation(
        &mut self,
        recipe: RecipeId,
        relation: Relation,
        child: ChildId,
    ) -> Result<(), StorageError>;
}

/// A unit of work over recipes and their relations.
///
/// Operations are isolated from other writers until commit. Dropping a
/// transaction without committing rolls it back.
///
/// # Example
///
/// ```ignore
/// let mut tx = storage.begin_transaction().await?;
/// let recipe = tx.create_recipe(owner, fields).await?;
/// let thai = tx.create_child(ChildKind::Tag, owner, "Thai").await?;
/// tx.add_to_relation(recipe.id, Relation::Tags, thai.id).await?;
/// tx.commit().await?;
/// ```
#[async_trait]
pub trait Transaction: ChildStore + Sync {
    /// Inserts a recipe with empty relations.
    async fn create_recipe(
        &mut self,
        owner: UserId,
        fields: RecipeFields,
    ) -> Result<Recipe, StorageError>;

    /// Replaces the scalar fields of an owned recipe. Relations and image are kept.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the recipe does not exist for `owner`.
    async fn update_recipe(
        &mut self,
        owner: UserId,
        id: RecipeId,
        fields: RecipeFields,
    ) -> Result<Recipe, StorageError>;

    /// Reads a recipe as seen from inside this transaction.
    async fn read_recipe(
        &self,
        owner: UserId,
        id: RecipeId,
    ) -> Result<Option<Recipe>, StorageError>;

    /// Commits all operations in this transaction.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::TransactionError` if the commit fails.
    async fn commit(self: Box<Self>) -> Result<(), StorageError>;

    /// Rolls back all operations in this transaction.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::TransactionError` if the rollback fails.
    async fn rollback(self: Box<Self>) -> Result<(), StorageError>;
}

/// The main storage trait that all recipebox backends implement.
///
/// Every method is scoped to an owner: rows belonging to another user are
/// invisible and behave as missing. Implementations must be thread-safe.
#[async_trait]
pub trait RecipeStorage: Send + Sync {
    // ==================== Transactions ====================

    /// Begins a new transaction for recipe writes.
    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>, StorageError>;

    // ==================== Recipes ====================

    /// Reads one recipe with both relations populated.
    async fn read_recipe(
        &self,
        owner: UserId,
        id: RecipeId,
    ) -> Result<Option<Recipe>, StorageError>;

    /// Lists the owner's recipes matching `filter`, newest id first, each once.
    async fn list_recipes(
        &self,
        owner: UserId,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, StorageError>;

    /// Deletes a recipe and its relation rows, returning what was removed.
    ///
    /// Tags and ingredients survive.
    async fn delete_recipe(&self, owner: UserId, id: RecipeId) -> Result<Recipe, StorageError>;

    /// Sets or clears the image path of a recipe, returning the previous path.
    async fn set_recipe_image(
        &self,
        owner: UserId,
        id: RecipeId,
        image: Option<String>,
    ) -> Result<Option<String>, StorageError>;

    // ==================== Tags & Ingredients ====================

    /// Lists the owner's children of `kind`, ordered by name descending, each once.
    async fn list_children(
        &self,
        kind: ChildKind,
        owner: UserId,
        filter: &ChildFilter,
    ) -> Result<Vec<Child>, StorageError>;

    /// Reads a single child.
    async fn read_child(
        &self,
        kind: ChildKind,
        owner: UserId,
        id: ChildId,
    ) -> Result<Option<Child>, StorageError>;

    /// Renames a child.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if the owner has another child of
    /// the same kind with that name.
    async fn rename_child(
        &self,
        kind: ChildKind,
        owner: UserId,
        id: ChildId,
        name: &str,
    ) -> Result<Child, StorageError>;

    /// Deletes a child and detaches it from every recipe.
    async fn delete_child(
        &self,
        kind: ChildKind,
        owner: UserId,
        id: ChildId,
    ) -> Result<(), StorageError>;

    // ==================== Metadata ====================

    /// Returns the name of this storage backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}
