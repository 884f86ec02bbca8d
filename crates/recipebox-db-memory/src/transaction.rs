//! Snapshot transactions for the in-memory backend.
//!
//! A transaction owns the tables' write lock from `begin` until it is
//! committed, rolled back or dropped, so writers are fully serialized. The
//! tables are cloned at begin; rollback swaps the clone back in.

use std::sync::Arc;

use async_trait::async_trait;
use recipebox_core::{Child, ChildId, ChildKind, Recipe, RecipeFields, RecipeId, Relation, UserId};
use recipebox_storage::{ChildStore, StorageError, Transaction};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::tables::Tables;

/// A unit of work against [`InMemoryStorage`](crate::InMemoryStorage).
pub struct InMemoryTransaction {
    tables: OwnedRwLockWriteGuard<Tables>,
    /// State at begin. `None` once committed.
    snapshot: Option<Tables>,
}

impl InMemoryTransaction {
    pub(crate) async fn begin(tables: Arc<RwLock<Tables>>) -> Self {
        let tables = tables.write_owned().await;
        let snapshot = Some(tables.clone());
        Self { tables, snapshot }
    }

    fn restore(&mut self) -> bool {
        match self.snapshot.take() {
            Some(snapshot) => {
                *self.tables = snapshot;
                true
            }
            None => false,
        }
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if self.restore() {
            tracing::debug!("Uncommitted transaction dropped, changes discarded");
        }
    }
}

#[async_trait]
impl ChildStore for InMemoryTransaction {
    async fn find_child(
        &mut self,
        kind: ChildKind,
        owner: UserId,
        name: &str,
    ) -> Result<Option<Child>, StorageError> {
        Ok(self.tables.find_child(kind, owner, name))
    }

    async fn create_child(
        &mut self,
        kind: ChildKind,
        owner: UserId,
        name: &str,
    ) -> Result<Child, StorageError> {
        self.tables.insert_child(kind, owner, name)
    }

    async fn clear_relation(
        &mut self,
        recipe: RecipeId,
        relation: Relation,
    ) -> Result<(), StorageError> {
        self.tables.clear_relation(recipe, relation)
    }

    async fn add_to_relation(
        &mut self,
        recipe: RecipeId,
        relation: Relation,
        child: ChildId,
    ) -> Result<(), StorageError> {
        self.tables.add_to_relation(recipe, relation, child)
    }
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn create_recipe(
        &mut self,
        owner: UserId,
        fields: RecipeFields,
    ) -> Result<Recipe, StorageError> {
        let id = self.tables.insert_recipe(owner, fields);
        self.tables
            .recipe(owner, id)
            .ok_or_else(|| StorageError::internal(format!("recipe {id} vanished after insert")))
    }

    async fn update_recipe(
        &mut self,
        owner: UserId,
        id: RecipeId,
        fields: RecipeFields,
    ) -> Result<Recipe, StorageError> {
        self.tables.owned_recipe_mut(owner, id)?.fields = fields;
        self.tables
            .recipe(owner, id)
            .ok_or_else(|| StorageError::not_found("recipe", id))
    }

    async fn read_recipe(
        &self,
        owner: UserId,
        id: RecipeId,
    ) -> Result<Option<Recipe>, StorageError> {
        Ok(self.tables.recipe(owner, id))
    }

    async fn commit(mut self: Box<Self>) -> Result<(), StorageError> {
        if self.snapshot.take().is_none() {
            return Err(StorageError::transaction_error("transaction already finished"));
        }
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), StorageError> {
        if !self.restore() {
            return Err(StorageError::transaction_error("transaction already finished"));
        }
        tracing::debug!("Transaction rolled back");
        Ok(())
    }
}
