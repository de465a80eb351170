//! Category management.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use autocatalog_core::CategoryId;

use super::{present, write_error};
use crate::db::CategoryRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::category::{Category, CategoryDetail, NewCategory};
use crate::routes::categories::CategoryListQuery;
use crate::state::AppState;

/// Create/replace body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    /// Absent or empty means a top-level category.
    pub parent_id: Option<String>,
}

impl CategoryRequest {
    fn validate(self, id: Option<&CategoryId>) -> Result<NewCategory> {
        let (Some(name), Some(slug)) = (present(self.name.as_deref()), present(self.slug.as_deref()))
        else {
            return Err(AppError::BadRequest("Name and slug are required".to_owned()));
        };
        let parent_id = present(self.parent_id.as_deref()).map(CategoryId::new);
        if parent_id.is_some() && parent_id.as_ref() == id {
            return Err(AppError::BadRequest(
                "A category cannot be its own parent".to_owned(),
            ));
        }
        Ok(NewCategory {
            name,
            slug,
            description: present(self.description.as_deref()),
            image: present(self.image.as_deref()),
            parent_id,
        })
    }
}

/// All categories; product counts include inactive products.
#[instrument(skip(state, _admin))]
pub async fn index(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<CategoryListQuery>,
) -> Result<Json<Vec<CategoryDetail>>> {
    let categories = CategoryRepository::new(state.pool())
        .list(&query.into_query(false))
        .await?;
    Ok(Json(categories))
}

/// Create a category.
#[instrument(skip(state, admin, payload), fields(admin_id = %admin.user.id))]
pub async fn create(
    admin: RequireAdmin,
    State(state): State<AppState>,
    payload: std::result::Result<Json<CategoryRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(body) = payload?;
    let input = body.validate(None)?;

    let category: Category = CategoryRepository::new(state.pool())
        .create(&input)
        .await
        .map_err(write_error("Category"))?;

    tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// One category with parent, children, products and counts.
#[instrument(skip(state, _admin))]
pub async fn show(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CategoryDetail>> {
    let category = CategoryRepository::new(state.pool())
        .get(&CategoryId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_owned()))?;
    Ok(Json(category))
}

/// Replace a category's fields.
#[instrument(skip(state, admin, payload), fields(admin_id = %admin.user.id))]
pub async fn update(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<CategoryRequest>, JsonRejection>,
) -> Result<Json<Category>> {
    let Json(body) = payload?;
    let id = CategoryId::new(id);
    let input = body.validate(Some(&id))?;

    let category = CategoryRepository::new(state.pool())
        .update(&id, &input)
        .await
        .map_err(write_error("Category"))?;
    Ok(Json(category))
}

/// Delete an empty category.
///
/// A category that still owns products or subcategories is kept, and the
/// two cases are reported separately.
#[instrument(skip(state, admin), fields(admin_id = %admin.user.id))]
pub async fn destroy(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = CategoryId::new(id);
    let repo = CategoryRepository::new(state.pool());

    let counts = repo
        .counts(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_owned()))?;
    if counts.products > 0 {
        return Err(AppError::BadRequest(
            "Cannot delete category with products. Move or delete products first.".to_owned(),
        ));
    }
    if counts.children > 0 {
        return Err(AppError::BadRequest(
            "Cannot delete category with subcategories. Delete subcategories first.".to_owned(),
        ));
    }

    repo.delete(&id).await.map_err(write_error("Category"))?;

    tracing::info!(category_id = %id, "Category deleted");
    Ok(Json(json!({ "message": "Category deleted successfully" })))
}
