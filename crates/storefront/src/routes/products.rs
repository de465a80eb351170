//! Public catalog product handlers.
//!
//! Only active products are visible here; inactive ones answer 404.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use autocatalog_core::{CategoryId, PageRequest, Pagination, ProductId};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::product::{CatalogProduct, ProductFilter, ProductSort};
use crate::state::AppState;

/// Default page size of the public catalog.
const DEFAULT_PAGE_SIZE: u32 = 12;

/// Default number of "latest arrivals".
const DEFAULT_LATEST_LIMIT: u32 = 8;

/// Query string of the product lists.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub category_id: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub featured: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl ProductListQuery {
    /// Repository filter. `categoryId=all` means no category filter.
    #[must_use]
    pub fn filter(&self, active_only: bool) -> ProductFilter {
        ProductFilter {
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            category_id: self
                .category_id
                .as_deref()
                .filter(|id| !id.is_empty() && *id != "all")
                .map(CategoryId::new),
            min_price: self.min_price,
            max_price: self.max_price,
            featured_only: self.featured.as_deref() == Some("true"),
            active_only,
            sort: ProductSort::parse(self.sort_by.as_deref(), self.sort_order.as_deref()),
        }
    }

    /// Requested page, falling back to `default_limit` rows.
    #[must_use]
    pub fn page(&self, default_limit: u32) -> PageRequest {
        PageRequest::new(self.page, self.limit, default_limit)
    }
}

/// A page of products.
#[derive(Debug, Serialize)]
pub struct ProductPage<T> {
    pub products: Vec<T>,
    pub pagination: Pagination,
}

/// `?limit=` of the latest arrivals.
#[derive(Debug, Deserialize)]
pub struct LatestQuery {
    pub limit: Option<i64>,
}

/// List active products.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ProductPage<CatalogProduct>>> {
    let page = query.page(DEFAULT_PAGE_SIZE);
    let (products, total) = ProductRepository::new(state.pool())
        .list(&query.filter(true), page)
        .await?;

    Ok(Json(ProductPage {
        products: products.into_iter().map(CatalogProduct::listing).collect(),
        pagination: Pagination::new(page, total),
    }))
}

/// Newest active products with the discount applied.
#[instrument(skip(state))]
pub async fn latest(
    State(state): State<AppState>,
    Query(query): Query<LatestQuery>,
) -> Result<Json<Vec<CatalogProduct>>> {
    let limit = PageRequest::new(None, query.limit, DEFAULT_LATEST_LIMIT).limit();
    let products = ProductRepository::new(state.pool()).latest(limit).await?;
    Ok(Json(
        products.into_iter().map(CatalogProduct::latest).collect(),
    ))
}

/// One active product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CatalogProduct>> {
    let product = ProductRepository::new(state.pool())
        .get(&ProductId::new(id), true)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;
    Ok(Json(CatalogProduct::listing(product)))
}
