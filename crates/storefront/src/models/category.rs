//! Category tree types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use autocatalog_core::{CategoryId, ProductId};

/// A `category` row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `{id, name, slug}` reference to a related category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

impl From<&Category> for CategoryRef {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.clone(),
            name: category.name.clone(),
            slug: category.slug.clone(),
        }
    }
}

/// A product listed under a category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategoryProduct {
    pub id: ProductId,
    #[serde(skip)]
    pub category_id: CategoryId,
    pub name: String,
    pub slug: String,
    pub price: f64,
    pub is_active: bool,
    pub featured: bool,
}

/// Product and child counts, serialized as `_count`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub products: u64,
    pub children: u64,
}

/// A category with its parent, direct children and counts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub parent: Option<CategoryRef>,
    pub children: Vec<CategoryRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<CategoryProduct>>,
    #[serde(rename = "_count")]
    pub count: CategoryCounts,
}

/// Which categories to list and how to count their products.
#[derive(Debug, Clone, Default)]
pub struct CategoryQuery {
    /// Only direct children of this category.
    pub parent_id: Option<CategoryId>,
    /// Attach the product list to each category.
    pub include_products: bool,
    /// Count and list only active products (public catalog).
    pub active_only: bool,
}

/// Validated input for creating or replacing a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub parent_id: Option<CategoryId>,
}
