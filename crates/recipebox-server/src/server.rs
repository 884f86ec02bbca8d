use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    middleware,
    routing::{get, post},
};
use recipebox_auth::{AuthState, DynUserStorage};
use recipebox_core::ChildKind;
use recipebox_storage::{DynStorage, RecipeStorage};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};

use crate::{
    bootstrap, config::AppConfig, handlers, media::MediaStore, middleware as app_middleware,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub storage: DynStorage,
    pub users: DynUserStorage,
    pub auth: AuthState,
    pub media: Arc<MediaStore>,
    pub config: Arc<AppConfig>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

pub struct RecipeboxServer {
    addr: SocketAddr,
    app: Router,
}

/// Builds the application with a fresh in-memory backend.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let backend = recipebox_db_memory::create_storage();
    tracing::info!(backend = backend.backend_name(), "Storage initialized");

    bootstrap::bootstrap_admin_user(backend.as_ref(), cfg).await?;

    let users: DynUserStorage = backend.clone();
    let state = AppState {
        storage: backend,
        auth: AuthState::new(users.clone()),
        users,
        media: Arc::new(MediaStore::new(&cfg.media)),
        config: Arc::new(cfg.clone()),
    };
    Ok(build_router(state, cfg))
}

pub fn build_router(state: AppState, cfg: &AppConfig) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    let api = Router::new()
        // Accounts
        .route("/user/create", post(handlers::users::create_user))
        .route("/user/token", post(handlers::users::create_token))
        .route(
            "/user/me",
            get(handlers::users::read_me)
                .put(handlers::users::replace_me)
                .patch(handlers::users::update_me),
        )
        // Recipes
        .route(
            "/recipe/recipes",
            get(handlers::recipes::list_recipes).post(handlers::recipes::create_recipe),
        )
        .route(
            "/recipe/recipes/{id}",
            get(handlers::recipes::read_recipe)
                .put(handlers::recipes::replace_recipe)
                .patch(handlers::recipes::update_recipe)
                .delete(handlers::recipes::delete_recipe),
        )
        .route(
            "/recipe/recipes/{id}/upload-image",
            post(handlers::recipes::upload_image),
        )
        // Tags and ingredients
        .merge(handlers::children::children_routes(ChildKind::Tag))
        .merge(handlers::children::children_routes(ChildKind::Ingredient))
        // JSON negotiation covers the API only; media files keep their own types
        .layer(middleware::from_fn(app_middleware::content_negotiation));

    Router::new()
        // Health endpoints
        .route("/healthz", get(handlers::health::healthz))
        .route("/readyz", get(handlers::health::readyz))
        .nest("/api", api)
        .nest_service(&cfg.media.url_prefix, ServeDir::new(&cfg.media.root))
        .with_state(state)
        // Middleware stack (outermost last: request id -> trace -> cors/compression -> body limit)
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<app_middleware::RequestId>()
                        .map(|id| id.as_str().to_string())
                        .unwrap_or_default();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        span.record("http.status_code", tracing::field::display(res.status().as_u16()));
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub async fn build(self) -> anyhow::Result<RecipeboxServer> {
        let app = build_app(&self.config).await?;

        Ok(RecipeboxServer {
            addr: self.addr,
            app,
        })
    }
}

impl RecipeboxServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
