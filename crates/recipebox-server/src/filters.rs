//! Query-string filters for list endpoints.

use recipebox_api::ApiError;
use recipebox_core::ChildId;
use recipebox_storage::{ChildFilter, RecipeFilter};
use serde::Deserialize;

/// `?tags=1,2&ingredients=3`
#[derive(Debug, Default, Deserialize)]
pub struct RecipeListQuery {
    pub tags: Option<String>,
    pub ingredients: Option<String>,
}

impl RecipeListQuery {
    pub fn to_filter(&self) -> Result<RecipeFilter, ApiError> {
        let mut filter = RecipeFilter::new();
        if let Some(tags) = parse_id_list("tags", self.tags.as_deref())? {
            filter = filter.with_tags(tags);
        }
        if let Some(ingredients) = parse_id_list("ingredients", self.ingredients.as_deref())? {
            filter = filter.with_ingredients(ingredients);
        }
        Ok(filter)
    }
}

/// `?assigned_only=1`
#[derive(Debug, Default, Deserialize)]
pub struct ChildListQuery {
    pub assigned_only: Option<String>,
}

impl ChildListQuery {
    pub fn to_filter(&self) -> Result<ChildFilter, ApiError> {
        let assigned_only = match self.assigned_only.as_deref().map(str::trim) {
            None | Some("") => false,
            Some(raw) => raw
                .parse::<i64>()
                .map(|v| v != 0)
                .map_err(|_| ApiError::field("assigned_only", "A valid integer is required."))?,
        };
        Ok(ChildFilter::new().with_assigned_only(assigned_only))
    }
}

/// Parses a comma separated id list. Empty segments are skipped; a blank
/// parameter counts as not supplied.
fn parse_id_list(param: &str, raw: Option<&str>) -> Result<Option<Vec<ChildId>>, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };
    raw.split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            segment.parse::<ChildId>().map_err(|_| {
                ApiError::field(param, format!("'{segment}' is not a valid integer id."))
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}
