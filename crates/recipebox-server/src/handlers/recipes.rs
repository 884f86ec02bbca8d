//! Recipe endpoints.
//!
//! Writes run in one storage transaction: scalar fields, both nested
//! relations and the read-back commit together or not at all.

use axum::{
    extract::{Multipart, Query, State, multipart::MultipartRejection, rejection::QueryRejection},
    http::StatusCode,
};
use recipebox_api::{ApiError, ApiJson, ApiPath, ApiResponse};
use recipebox_auth::{AuthContext, OwnerAuth};
use recipebox_core::{
    ChildDescriptor, CoreError, Price, Recipe, RecipeFields, RecipeId, Relation, RelationUpdate,
    WriteMode, non_null,
};
use recipebox_storage::Transaction;
use serde::{Deserialize, Serialize};

use crate::filters::RecipeListQuery;
use crate::handlers::children::ChildView;
use crate::media::MediaStore;
use crate::reconcile::{RequestContext, apply_relation_update};
use crate::server::AppState;

// ---- Payloads ----

/// Body of recipe create and update requests.
///
/// Missing scalar fields are required for create and PUT, and fall back to
/// the stored values for PATCH. An explicit `null` is rejected.
#[derive(Debug, Deserialize)]
pub struct RecipePayload {
    #[serde(default, deserialize_with = "non_null")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub time_minutes: Option<i32>,
    #[serde(default, deserialize_with = "non_null")]
    pub price: Option<Price>,
    #[serde(default, deserialize_with = "non_null")]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: RelationUpdate<ChildDescriptor>,
    #[serde(default)]
    pub ingredients: RelationUpdate<ChildDescriptor>,
}

impl RecipePayload {
    fn fields(&self, base: Option<&RecipeFields>) -> Result<RecipeFields, CoreError> {
        let fields = match base {
            None => RecipeFields {
                title: self
                    .title
                    .clone()
                    .ok_or_else(|| CoreError::missing_field("title"))?,
                time_minutes: self
                    .time_minutes
                    .ok_or_else(|| CoreError::missing_field("time_minutes"))?,
                price: self
                    .price
                    .clone()
                    .ok_or_else(|| CoreError::missing_field("price"))?,
                link: self.link.clone().unwrap_or_default(),
                description: self.description.clone().unwrap_or_default(),
            },
            Some(base) => RecipeFields {
                title: self.title.clone().unwrap_or_else(|| base.title.clone()),
                time_minutes: self.time_minutes.unwrap_or(base.time_minutes),
                price: self.price.clone().unwrap_or_else(|| base.price.clone()),
                link: self.link.clone().unwrap_or_else(|| base.link.clone()),
                description: self
                    .description
                    .clone()
                    .unwrap_or_else(|| base.description.clone()),
            },
        };
        fields.validate()
    }
}

// ---- Representations ----

#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: RecipeId,
    pub title: String,
    pub time_minutes: i32,
    pub price: Price,
    pub link: String,
    pub tags: Vec<ChildView>,
    pub ingredients: Vec<ChildView>,
}

impl From<&Recipe> for RecipeSummary {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title.clone(),
            time_minutes: recipe.time_minutes,
            price: recipe.price.clone(),
            link: recipe.link.clone(),
            tags: recipe.tags.iter().map(ChildView::from).collect(),
            ingredients: recipe.ingredients.iter().map(ChildView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub summary: RecipeSummary,
    pub description: String,
    /// Public URL of the uploaded image.
    pub image: Option<String>,
}

impl RecipeDetail {
    fn new(recipe: &Recipe, media: &MediaStore) -> Self {
        Self {
            summary: RecipeSummary::from(recipe),
            description: recipe.description.clone(),
            image: recipe.image.as_deref().map(|path| media.url_for(path)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeImage {
    pub id: RecipeId,
    pub image: String,
}

// ---- Handlers ----

pub async fn list_recipes(
    State(state): State<AppState>,
    OwnerAuth(auth): OwnerAuth,
    query: Result<Query<RecipeListQuery>, QueryRejection>,
) -> Result<ApiResponse<Vec<RecipeSummary>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let filter = query.to_filter()?;
    let recipes = state.storage.list_recipes(auth.owner(), &filter).await?;
    Ok(ApiResponse::ok(
        recipes.iter().map(RecipeSummary::from).collect(),
    ))
}

pub async fn read_recipe(
    State(state): State<AppState>,
    OwnerAuth(auth): OwnerAuth,
    ApiPath(id): ApiPath<RecipeId>,
) -> Result<ApiResponse<RecipeDetail>, ApiError> {
    let recipe = state
        .storage
        .read_recipe(auth.owner(), id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(ApiResponse::ok(RecipeDetail::new(&recipe, &state.media)))
}

pub async fn create_recipe(
    State(state): State<AppState>,
    OwnerAuth(auth): OwnerAuth,
    ApiJson(payload): ApiJson<RecipePayload>,
) -> Result<ApiResponse<RecipeDetail>, ApiError> {
    let ctx = RequestContext::from(&auth);
    let owner = ctx.owner()?;
    let fields = payload.fields(None)?;

    let mut tx = state.storage.begin_transaction().await?;
    let created = tx.create_recipe(owner, fields).await?;
    apply_relations(tx.as_mut(), &ctx, created.id, &payload, WriteMode::Full).await?;
    let recipe = read_back(tx.as_ref(), &auth, created.id).await?;
    tx.commit().await?;

    tracing::info!(recipe_id = %recipe.id, owner = %owner, "Recipe created");
    Ok(ApiResponse::created(RecipeDetail::new(&recipe, &state.media)))
}

/// PUT: every field is replaced; a missing relation is cleared.
pub async fn replace_recipe(
    State(state): State<AppState>,
    OwnerAuth(auth): OwnerAuth,
    ApiPath(id): ApiPath<RecipeId>,
    ApiJson(payload): ApiJson<RecipePayload>,
) -> Result<ApiResponse<RecipeDetail>, ApiError> {
    write_update(&state, &auth, id, payload, WriteMode::Full).await
}

/// PATCH: only supplied fields change.
pub async fn update_recipe(
    State(state): State<AppState>,
    OwnerAuth(auth): OwnerAuth,
    ApiPath(id): ApiPath<RecipeId>,
    ApiJson(payload): ApiJson<RecipePayload>,
) -> Result<ApiResponse<RecipeDetail>, ApiError> {
    write_update(&state, &auth, id, payload, WriteMode::Partial).await
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    OwnerAuth(auth): OwnerAuth,
    ApiPath(id): ApiPath<RecipeId>,
) -> Result<StatusCode, ApiError> {
    let removed = state.storage.delete_recipe(auth.owner(), id).await?;
    if let Some(image) = removed.image.as_deref() {
        state.media.remove(image).await;
    }
    tracing::info!(recipe_id = %id, owner = %auth.owner(), "Recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Stores the multipart `image` field and points the recipe at it.
pub async fn upload_image(
    State(state): State<AppState>,
    OwnerAuth(auth): OwnerAuth,
    ApiPath(id): ApiPath<RecipeId>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<RecipeImage>, ApiError> {
    let mut multipart =
        multipart.map_err(|e| multipart_error(e.status(), e.body_text()))?;
    let owner = auth.owner();

    if state.storage.read_recipe(owner, id).await?.is_none() {
        return Err(not_found(id));
    }

    let mut image = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e.status(), e.body_text()))?
    {
        if field.name() == Some("image") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| multipart_error(e.status(), e.body_text()))?;
            image = Some(bytes);
            break;
        }
    }
    let bytes = image.ok_or_else(|| ApiError::field("image", "No file was submitted."))?;

    let relative = state.media.store_recipe_image(&bytes).await?;
    let previous = match state
        .storage
        .set_recipe_image(owner, id, Some(relative.clone()))
        .await
    {
        Ok(previous) => previous,
        Err(e) => {
            state.media.remove(&relative).await;
            return Err(e.into());
        }
    };
    if let Some(previous) = previous.as_deref() {
        state.media.remove(previous).await;
    }

    tracing::info!(recipe_id = %id, path = %relative, "Recipe image uploaded");
    Ok(ApiResponse::ok(RecipeImage {
        id,
        image: state.media.url_for(&relative),
    }))
}

// ---- Helpers ----

async fn write_update(
    state: &AppState,
    auth: &AuthContext,
    id: RecipeId,
    payload: RecipePayload,
    mode: WriteMode,
) -> Result<ApiResponse<RecipeDetail>, ApiError> {
    let ctx = RequestContext::from(auth);
    let owner = ctx.owner()?;

    let mut tx = state.storage.begin_transaction().await?;
    let existing = read_back(tx.as_ref(), auth, id).await?;
    let fields = match mode {
        WriteMode::Full => payload.fields(None)?,
        WriteMode::Partial => payload.fields(Some(&existing.fields()))?,
    };
    tx.update_recipe(owner, id, fields).await?;
    apply_relations(tx.as_mut(), &ctx, id, &payload, mode).await?;
    let recipe = read_back(tx.as_ref(), auth, id).await?;
    tx.commit().await?;

    tracing::info!(recipe_id = %id, owner = %owner, mode = ?mode, "Recipe updated");
    Ok(ApiResponse::ok(RecipeDetail::new(&recipe, &state.media)))
}

async fn apply_relations(
    tx: &mut dyn Transaction,
    ctx: &RequestContext,
    id: RecipeId,
    payload: &RecipePayload,
    mode: WriteMode,
) -> Result<(), ApiError> {
    apply_relation_update(&mut *tx, ctx, id, Relation::Tags, &payload.tags, mode).await?;
    apply_relation_update(&mut *tx, ctx, id, Relation::Ingredients, &payload.ingredients, mode)
        .await?;
    Ok(())
}

async fn read_back(
    tx: &dyn Transaction,
    auth: &AuthContext,
    id: RecipeId,
) -> Result<Recipe, ApiError> {
    tx.read_recipe(auth.owner(), id)
        .await?
        .ok_or_else(|| not_found(id))
}

fn multipart_error(status: StatusCode, body: String) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(body)
    } else {
        ApiError::bad_request(body)
    }
}

fn not_found(id: RecipeId) -> ApiError {
    ApiError::not_found(format!("recipe {id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: serde_json::Value) -> RecipePayload {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn full_write_requires_scalars() {
        let err = payload(serde_json::json!({ "title": "Soup" }))
            .fields(None)
            .unwrap_err();
        assert_eq!(err.field(), Some("time_minutes"));

        let fields = payload(serde_json::json!({
            "title": "Soup",
            "time_minutes": 20,
            "price": "4.50"
        }))
        .fields(None)
        .unwrap();
        assert_eq!(fields.link, "");
        assert_eq!(fields.price.to_string(), "4.50");
    }

    #[test]
    fn partial_write_keeps_stored_values() {
        let base = RecipeFields::new("Soup", 20, Price::parse("4.50").unwrap());
        let fields = payload(serde_json::json!({ "time_minutes": 30 }))
            .fields(Some(&base))
            .unwrap();
        assert_eq!(fields.title, "Soup");
        assert_eq!(fields.time_minutes, 30);
    }

    #[test]
    fn relation_fields_keep_their_tri_state() {
        let absent = payload(serde_json::json!({}));
        assert!(absent.tags.is_unchanged());

        let empty = payload(serde_json::json!({ "tags": [] }));
        assert_eq!(empty.tags, RelationUpdate::Replace(vec![]));

        assert!(serde_json::from_value::<RecipePayload>(serde_json::json!({ "tags": null })).is_err());
    }

    #[test]
    fn null_scalars_are_rejected() {
        for field in ["title", "time_minutes", "price", "link", "description"] {
            let body = serde_json::json!({ field: null });
            assert!(
                serde_json::from_value::<RecipePayload>(body).is_err(),
                "{field}: null should not deserialize"
            );
        }
    }
}
