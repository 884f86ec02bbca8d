//! # recipebox-storage
//!
//! Storage abstraction layer for the recipebox server.
//!
//! This crate defines the traits and types that storage backends implement.
//! It does not contain any implementations; those live in separate crates.
//!
//! ## Overview
//!
//! - [`ChildStore`] is the narrow interface the tag/ingredient reconciler
//!   consumes: look up a child by natural key, create one, clear a recipe
//!   relation, attach a child to it.
//! - [`Transaction`] extends it with recipe writes plus commit/rollback, so a
//!   recipe write and its reconciliations land together.
//! - [`RecipeStorage`] is the shared handle: owner-scoped reads, listing with
//!   filters, deletes, and transaction start.
//!
//! ## Example
//!
//! ```ignore
//! use recipebox_storage::{RecipeStorage, RecipeFilter};
//!
//! async fn vegan_recipes(
//!     storage: &dyn RecipeStorage,
//!     owner: UserId,
//!     vegan: ChildId,
//! ) -> Result<Vec<Recipe>, StorageError> {
//!     let filter = RecipeFilter::new().with_tags(vec![vegan]);
//!     storage.list_recipes(owner, &filter).await
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use traits::{ChildStore, RecipeStorage, Transaction};
pub use types::{ChildFilter, RecipeFilter};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shared storage trait object.
pub type DynStorage = std::sync::Arc<dyn RecipeStorage>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use recipebox_storage::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ErrorCategory, StorageError};
    pub use crate::traits::{ChildStore, RecipeStorage, Transaction};
    pub use crate::types::{ChildFilter, RecipeFilter};
    pub use crate::{DynStorage, StorageResult};
}
