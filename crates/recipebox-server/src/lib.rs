pub mod bootstrap;
pub mod config;
pub mod filters;
pub mod handlers;
pub mod media;
pub mod middleware;
pub mod observability;
pub mod reconcile;
pub mod server;

pub use config::AppConfig;
pub use observability::init_tracing;
pub use reconcile::{ReconcileError, RequestContext, apply_relation_update, reconcile};
pub use server::{AppState, RecipeboxServer, ServerBuilder, build_app, build_router};
