//! HTTP handlers, one module per resource.

pub mod children;
pub mod health;
pub mod recipes;
pub mod users;
