//! In-memory storage backend for the recipebox server.
//!
//! This crate implements `RecipeStorage` from `recipebox-storage` and
//! `UserStorage` from `recipebox-auth`. Relational tables sit behind a single
//! tokio `RwLock`; a transaction holds the write half for its whole lifetime
//! and restores a snapshot if it is not committed. Accounts and tokens live in
//! papaya lock-free maps.
//!
//! # Example
//!
//! ```ignore
//! use recipebox_db_memory::InMemoryStorage;
//! use recipebox_storage::RecipeStorage;
//!
//! let storage = InMemoryStorage::new();
//! let mut tx = storage.begin_transaction().await?;
//! let recipe = tx.create_recipe(owner, fields).await?;
//! tx.commit().await?;
//! ```

mod query;
pub mod storage;
mod tables;
pub mod transaction;

pub use recipebox_storage::{RecipeStorage, StorageError};

pub use storage::InMemoryStorage;
pub use transaction::InMemoryTransaction;

/// Creates a new shared in-memory storage instance.
pub fn create_storage() -> std::sync::Arc<InMemoryStorage> {
    std::sync::Arc::new(InMemoryStorage::new())
}
