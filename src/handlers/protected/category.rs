use std::collections::HashMap;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::Category;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::validation::validate_name;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// GET /api/categories
pub async fn categories_get(State(state): State<AppState>) -> ApiResult<Vec<Category>> {
    let categories = state.catalog.list_categories().await?;
    Ok(ApiResponse::success(categories))
}

/// POST /api/categories - ROLE_ADMIN, enforced by the access policy
pub async fn categories_post(
    State(state): State<AppState>,
    payload: Result<Json<NewCategory>, JsonRejection>,
) -> ApiResult<Category> {
    let Json(request) = payload?;

    if let Err(msg) = validate_name(&request.name) {
        let field_errors = HashMap::from([("name".to_string(), msg)]);
        return Err(ApiError::validation_error("Invalid category", Some(field_errors)));
    }

    let category = Category {
        id: Uuid::new_v4(),
        name: request.name.trim().to_string(),
        description: request.description,
    };
    state.catalog.insert_category(&category).await?;

    tracing::info!("Created category {} ({})", category.id, category.name);
    Ok(ApiResponse::created(category))
}

/// DELETE /api/categories/:id - ROLE_ADMIN
///
/// Products in the category stay listed, without a category.
pub async fn category_delete(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = path?;
    state.catalog.delete_category(id).await?;
    Ok(ApiResponse::no_content())
}
