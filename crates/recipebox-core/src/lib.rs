pub mod email;
pub mod error;
pub mod id;
pub mod model;
pub mod payload;
pub mod price;

pub use email::normalize_email;
pub use error::{CoreError, ErrorCategory, Result};
pub use id::{ChildId, RecipeId, UserId};
pub use model::{Child, ChildKind, NewUser, Recipe, RecipeFields, Relation, User};
pub use payload::{ChildDescriptor, RelationUpdate, WriteMode, non_null};
pub use price::Price;

/// Maximum length of short text columns (names, titles, links).
pub const MAX_TEXT_LENGTH: usize = 255;
