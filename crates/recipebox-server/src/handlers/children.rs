//! Tag and ingredient endpoints.
//!
//! Both kinds share these handlers; the router scopes each copy with an
//! `Extension<ChildKind>`.

use axum::{
    Extension, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    routing::get,
};
use recipebox_api::{ApiError, ApiJson, ApiPath, ApiResponse};
use recipebox_auth::{AuthContext, OwnerAuth};
use recipebox_core::{Child, ChildDescriptor, ChildId, ChildKind, CoreError};
use serde::{Deserialize, Serialize};

use crate::filters::ChildListQuery;
use crate::server::AppState;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChildView {
    pub id: ChildId,
    pub name: String,
}

impl From<&Child> for ChildView {
    fn from(child: &Child) -> Self {
        Self {
            id: child.id,
            name: child.name.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RenamePayload {
    pub name: Option<String>,
}

fn collection(kind: ChildKind) -> &'static str {
    match kind {
        ChildKind::Tag => "tags",
        ChildKind::Ingredient => "ingredients",
    }
}

/// Routes for one child kind under `/recipe/<tags|ingredients>`.
pub fn children_routes(kind: ChildKind) -> Router<AppState> {
    let base = format!("/recipe/{}", collection(kind));
    Router::new()
        .route(&base, get(list_children))
        .route(
            &format!("{base}/{{id}}"),
            get(read_child)
                .put(replace_child)
                .patch(update_child)
                .delete(delete_child),
        )
        .layer(Extension(kind))
}

pub async fn list_children(
    State(state): State<AppState>,
    Extension(kind): Extension<ChildKind>,
    OwnerAuth(auth): OwnerAuth,
    query: Result<Query<ChildListQuery>, QueryRejection>,
) -> Result<ApiResponse<Vec<ChildView>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let filter = query.to_filter()?;
    let children = state
        .storage
        .list_children(kind, auth.owner(), &filter)
        .await?;
    Ok(ApiResponse::ok(children.iter().map(ChildView::from).collect()))
}

pub async fn read_child(
    State(state): State<AppState>,
    Extension(kind): Extension<ChildKind>,
    OwnerAuth(auth): OwnerAuth,
    ApiPath(id): ApiPath<ChildId>,
) -> Result<ApiResponse<ChildView>, ApiError> {
    let child = state
        .storage
        .read_child(kind, auth.owner(), id)
        .await?
        .ok_or_else(|| not_found(kind, id))?;
    Ok(ApiResponse::ok(ChildView::from(&child)))
}

pub async fn replace_child(
    State(state): State<AppState>,
    Extension(kind): Extension<ChildKind>,
    OwnerAuth(auth): OwnerAuth,
    ApiPath(id): ApiPath<ChildId>,
    ApiJson(payload): ApiJson<RenamePayload>,
) -> Result<ApiResponse<ChildView>, ApiError> {
    let name = payload.name.ok_or_else(|| CoreError::missing_field("name"))?;
    rename(&state, kind, &auth, id, name).await
}

pub async fn update_child(
    State(state): State<AppState>,
    Extension(kind): Extension<ChildKind>,
    OwnerAuth(auth): OwnerAuth,
    ApiPath(id): ApiPath<ChildId>,
    ApiJson(payload): ApiJson<RenamePayload>,
) -> Result<ApiResponse<ChildView>, ApiError> {
    match payload.name {
        Some(name) => rename(&state, kind, &auth, id, name).await,
        None => read_child(State(state), Extension(kind), OwnerAuth(auth), ApiPath(id)).await,
    }
}

pub async fn delete_child(
    State(state): State<AppState>,
    Extension(kind): Extension<ChildKind>,
    OwnerAuth(auth): OwnerAuth,
    ApiPath(id): ApiPath<ChildId>,
) -> Result<StatusCode, ApiError> {
    state.storage.delete_child(kind, auth.owner(), id).await?;
    tracing::info!(kind = %kind, child_id = %id, owner = %auth.owner(), "Child deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn rename(
    state: &AppState,
    kind: ChildKind,
    auth: &AuthContext,
    id: ChildId,
    name: String,
) -> Result<ApiResponse<ChildView>, ApiError> {
    let descriptor = ChildDescriptor::new(name);
    let name = descriptor.natural_key()?;
    let child = state
        .storage
        .rename_child(kind, auth.owner(), id, name)
        .await?;
    Ok(ApiResponse::ok(ChildView::from(&child)))
}

fn not_found(kind: ChildKind, id: ChildId) -> ApiError {
    ApiError::not_found(format!("{kind} {id} not found"))
}
