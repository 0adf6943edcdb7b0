/// Category endpoints
///
/// Any member can list; only admins can write.
///
/// - `GET /categories` - list with task counts
/// - `POST /categories` - create
/// - `PUT /categories` - rename/recolor, body carries the `id`
/// - `DELETE /categories?id=X` - delete; its tasks lose the tag

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, ApiQuery},
    routes::{message, success, validate, ActionQuery, Envelope, Message},
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use choreboard_shared::{
    auth::context::RequestContext,
    models::category::{Category, CategoryWithCount},
    registry::{self, CategoryInput, CategoryPatch},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 50, message = "Category name must be 1-50 characters"))]
    pub name: String,

    /// `#RRGGBB`
    pub color: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    pub id: Uuid,

    #[validate(length(min = 1, max = 50, message = "Category name must be 1-50 characters"))]
    pub name: Option<String>,

    pub color: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CategoryPayload {
    pub category: Category,
}

#[derive(Debug, Serialize)]
pub struct CategoriesPayload {
    pub categories: Vec<CategoryWithCount>,
}

pub async fn list_categories(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Json<Envelope<CategoriesPayload>>> {
    let categories = registry::list_categories(&state.db, &ctx).await?;
    Ok(success(CategoriesPayload { categories }))
}

/// Create a category (admin only)
///
/// # Endpoint
///
/// ```text
/// POST /categories
/// Content-Type: application/json
///
/// { "name": "Kitchen", "color": "#E67E22" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: bad name or color
/// - `403 Forbidden`: not an admin of the current team
/// - `409 Conflict`: name already used in this team
pub async fn create_category(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ApiJson(req): ApiJson<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<CategoryPayload>>)> {
    validate(&req)?;

    let category = registry::create_category(
        &state.db,
        &ctx,
        CategoryInput {
            name: req.name,
            color: req.color,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, success(CategoryPayload { category })))
}

pub async fn update_category(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ApiJson(req): ApiJson<UpdateCategoryRequest>,
) -> ApiResult<Json<Envelope<CategoryPayload>>> {
    validate(&req)?;

    let category = registry::update_category(
        &state.db,
        &ctx,
        req.id,
        CategoryPatch {
            name: req.name,
            color: req.color,
        },
    )
    .await?;

    Ok(success(CategoryPayload { category }))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ApiQuery(query): ApiQuery<ActionQuery>,
) -> ApiResult<Json<Envelope<Message>>> {
    registry::delete_category(&state.db, &ctx, query.require_id()?).await?;
    Ok(message("Category deleted"))
}
