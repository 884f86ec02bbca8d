use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use papaya::HashMap as PapayaHashMap;
use recipebox_auth::{AuthError, AuthResult, UserStorage};
use recipebox_core::{Child, ChildId, ChildKind, NewUser, Recipe, RecipeId, User, UserId};
use recipebox_storage::{ChildFilter, RecipeFilter, RecipeStorage, StorageError, Transaction};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::query;
use crate::tables::Tables;
use crate::transaction::InMemoryTransaction;

/// In-memory recipebox storage backend.
///
/// This storage implementation provides:
/// - Owner-scoped recipes, tags and ingredients
/// - Serialized snapshot transactions with rollback on drop
/// - Lock-free account and token lookup via papaya::HashMap
#[derive(Debug)]
pub struct InMemoryStorage {
    tables: Arc<RwLock<Tables>>,
    users: PapayaHashMap<UserId, User>,
    /// Normalized email -> owner, enforces email uniqueness
    emails: PapayaHashMap<String, UserId>,
    /// SHA-256 token digest -> owner
    tokens: PapayaHashMap<String, UserId>,
    user_seq: AtomicI64,
}

impl InMemoryStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            users: PapayaHashMap::new(),
            emails: PapayaHashMap::new(),
            tokens: PapayaHashMap::new(),
            user_seq: AtomicI64::new(0),
        }
    }

    /// Number of registered users.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecipeStorage for InMemoryStorage {
    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>, StorageError> {
        Ok(Box::new(InMemoryTransaction::begin(self.tables.clone()).await))
    }

    async fn read_recipe(
        &self,
        owner: UserId,
        id: RecipeId,
    ) -> Result<Option<Recipe>, StorageError> {
        Ok(self.tables.read().await.recipe(owner, id))
    }

    async fn list_recipes(
        &self,
        owner: UserId,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, StorageError> {
        let tables = self.tables.read().await;
        Ok(query::list_recipes(&tables, owner, filter))
    }

    async fn delete_recipe(&self, owner: UserId, id: RecipeId) -> Result<Recipe, StorageError> {
        self.tables.write().await.remove_recipe(owner, id)
    }

    async fn set_recipe_image(
        &self,
        owner: UserId,
        id: RecipeId,
        image: Option<String>,
    ) -> Result<Option<String>, StorageError> {
        let mut tables = self.tables.write().await;
        let row = tables.owned_recipe_mut(owner, id)?;
        Ok(std::mem::replace(&mut row.image, image))
    }

    async fn list_children(
        &self,
        kind: ChildKind,
        owner: UserId,
        filter: &ChildFilter,
    ) -> Result<Vec<Child>, StorageError> {
        let tables = self.tables.read().await;
        Ok(query::list_children(&tables, kind, owner, filter))
    }

    async fn read_child(
        &self,
        kind: ChildKind,
        owner: UserId,
        id: ChildId,
    ) -> Result<Option<Child>, StorageError> {
        Ok(self.tables.read().await.owned_child(kind, owner, id))
    }

    async fn rename_child(
        &self,
        kind: ChildKind,
        owner: UserId,
        id: ChildId,
        name: &str,
    ) -> Result<Child, StorageError> {
        self.tables.write().await.rename_child(kind, owner, id, name)
    }

    async fn delete_child(
        &self,
        kind: ChildKind,
        owner: UserId,
        id: ChildId,
    ) -> Result<(), StorageError> {
        self.tables.write().await.remove_child(kind, owner, id)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl UserStorage for InMemoryStorage {
    async fn create_user(&self, user: NewUser) -> AuthResult<User> {
        let id = UserId::new(self.user_seq.fetch_add(1, Ordering::SeqCst) + 1);
        if self.emails.pin().try_insert(user.email.clone(), id).is_err() {
            return Err(AuthError::email_taken(user.email));
        }
        let user = User {
            id,
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            is_active: true,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            created_at: OffsetDateTime::now_utc(),
        };
        self.users.pin().insert(id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let Some(id) = self.emails.pin().get(email).copied() else {
            return Ok(None);
        };
        Ok(self.users.pin().get(&id).cloned())
    }

    async fn read_user(&self, id: UserId) -> AuthResult<Option<User>> {
        Ok(self.users.pin().get(&id).cloned())
    }

    async fn update_user(&self, user: &User) -> AuthResult<User> {
        let users = self.users.pin();
        let previous = users
            .get(&user.id)
            .cloned()
            .ok_or_else(|| AuthError::storage(format!("user {} not found", user.id)))?;

        if previous.email != user.email {
            let emails = self.emails.pin();
            if let Err(occupied) = emails.try_insert(user.email.clone(), user.id)
                && *occupied.current != user.id
            {
                return Err(AuthError::email_taken(user.email.clone()));
            }
            emails.remove(&previous.email);
        }

        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn store_token(&self, token_hash: &str, user: UserId) -> AuthResult<()> {
        self.tokens.pin().insert(token_hash.to_string(), user);
        Ok(())
    }

    async fn find_token_user(&self, token_hash: &str) -> AuthResult<Option<UserId>> {
        Ok(self.tokens.pin().get(token_hash).copied())
    }
}
