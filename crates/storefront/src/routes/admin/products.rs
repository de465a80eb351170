//! Product management.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use autocatalog_core::{CategoryId, Discount, Pagination, ProductId, ProductType};

use super::{present, write_error};
use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::product::{NewProduct, Product, ProductDetails, ProductUpdate};
use crate::routes::products::{ProductListQuery, ProductPage};
use crate::state::AppState;

/// Default page size of the admin product table.
const DEFAULT_PAGE_SIZE: u32 = 10;

/// Create/update body. Every field is optional on update.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub discount: Option<Discount>,
    pub images: Option<Vec<String>>,
    #[serde(flatten)]
    pub details: ProductDetails,
    pub product_type: Option<ProductType>,
    pub category_id: Option<String>,
    pub is_active: Option<bool>,
    pub featured: Option<bool>,
}

fn check_price(price: Option<f64>) -> Result<Option<f64>> {
    match price {
        Some(p) if !p.is_finite() || p < 0.0 => Err(AppError::BadRequest(
            "Price must be a non-negative number".to_owned(),
        )),
        other => Ok(other),
    }
}

impl ProductRequest {
    /// Input for a new product; name, slug, price, category and product
    /// type must all be present.
    fn into_new(self) -> Result<NewProduct> {
        let price = check_price(self.price)?;
        let (Some(name), Some(slug), Some(price), Some(category_id), Some(product_type)) = (
            present(self.name.as_deref()),
            present(self.slug.as_deref()),
            price,
            present(self.category_id.as_deref()),
            self.product_type,
        ) else {
            return Err(AppError::BadRequest(
                "Name, slug, price, category, and product type are required".to_owned(),
            ));
        };

        Ok(NewProduct {
            name,
            slug,
            description: present(self.description.as_deref()),
            price,
            discount: self.discount.unwrap_or(Discount::NONE),
            images: self.images.unwrap_or_default(),
            details: self.details,
            product_type,
            category_id: CategoryId::new(category_id),
            is_active: self.is_active.unwrap_or(true),
            featured: self.featured.unwrap_or(false),
        })
    }

    /// Partial update; blank strings count as absent.
    fn into_update(self) -> Result<ProductUpdate> {
        Ok(ProductUpdate {
            price: check_price(self.price)?,
            name: present(self.name.as_deref()),
            slug: present(self.slug.as_deref()),
            description: self.description,
            discount: self.discount,
            images: self.images,
            details: self.details,
            product_type: self.product_type,
            category_id: present(self.category_id.as_deref()).map(CategoryId::new),
            is_active: self.is_active,
            featured: self.featured,
        })
    }
}

/// All products, active or not, with their categories.
#[instrument(skip(state, _admin))]
pub async fn index(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ProductPage<Product>>> {
    let page = query.page(DEFAULT_PAGE_SIZE);
    let (products, total) = ProductRepository::new(state.pool())
        .list(&query.filter(false), page)
        .await?;
    Ok(Json(ProductPage {
        products,
        pagination: Pagination::new(page, total),
    }))
}

/// Create a product.
#[instrument(skip(state, admin, payload), fields(admin_id = %admin.user.id))]
pub async fn create(
    admin: RequireAdmin,
    State(state): State<AppState>,
    payload: std::result::Result<Json<ProductRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(body) = payload?;
    let input = body.into_new()?;

    let product = ProductRepository::new(state.pool())
        .create(&input)
        .await
        .map_err(write_error("Product"))?;

    tracing::info!(product_id = %product.id, slug = %product.slug, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// One product, active or not.
#[instrument(skip(state, _admin))]
pub async fn show(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get(&ProductId::new(id), false)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;
    Ok(Json(product))
}

/// Change some of a product's fields.
#[instrument(skip(state, admin, payload), fields(admin_id = %admin.user.id))]
pub async fn update(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<ProductRequest>, JsonRejection>,
) -> Result<Json<Product>> {
    let Json(body) = payload?;
    let update = body.into_update()?;

    let product = ProductRepository::new(state.pool())
        .update(&ProductId::new(id), update)
        .await
        .map_err(write_error("Product"))?;
    Ok(Json(product))
}

/// Delete a product. Past orders keep their line names.
#[instrument(skip(state, admin), fields(admin_id = %admin.user.id))]
pub async fn destroy(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = ProductId::new(id);
    ProductRepository::new(state.pool())
        .delete(&id)
        .await
        .map_err(write_error("Product"))?;

    tracing::info!(product_id = %id, "Product deleted");
    Ok(Json(json!({ "message": "Product deleted successfully" })))
}
