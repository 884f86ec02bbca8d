//! Integer identifiers for persisted entities.
//!
//! Each table allocates its own sequence starting at 1. The newtypes keep a
//! recipe id from being passed where a tag id is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|_| CoreError::invalid_id(s))
            }
        }
    };
}

entity_id!(
    /// Identifier of a user (the owner of every other entity).
    UserId
);
entity_id!(
    /// Identifier of a recipe.
    RecipeId
);
entity_id!(
    /// Identifier of a tag or ingredient. Each kind has its own sequence.
    ChildId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays() {
        let id: RecipeId = " 42 ".parse().unwrap();
        assert_eq!(id, RecipeId::new(42));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn rejects_non_integers() {
        let err = "x1".parse::<ChildId>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidId(ref s) if s == "x1"));
    }

    #[test]
    fn serializes_transparently() {
        let json = serde_json::to_string(&UserId::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: UserId = serde_json::from_str("7").unwrap();
        assert_eq!(back.get(), 7);
    }
}
