//! Product types: the stored row, admin and catalog views, and list filters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use autocatalog_core::{CategoryId, Discount, ProductId, ProductType};

use super::category::CategoryRef;

/// Optional file and vehicle metadata of a catalog product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    pub download_url: Option<String>,
    pub file_size: Option<String>,
    pub version: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<String>,
    pub engine_type: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
}

/// A product row joined with its category, as returned to admins.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    /// Pre-discount unit price.
    pub price: f64,
    #[sqlx(try_from = "f64")]
    pub discount: Discount,
    pub images: Json<Vec<String>>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub details: ProductDetails,
    pub product_type: ProductType,
    pub category_id: CategoryId,
    pub is_active: bool,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub category: ProductCategory,
}

/// The joined category columns of a product query, serialized as
/// `{id, name, slug}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ProductCategory {
    #[serde(rename = "id")]
    pub category_ref_id: CategoryId,
    #[serde(rename = "name")]
    pub category_name: String,
    #[serde(rename = "slug")]
    pub category_slug: String,
}

impl Product {
    /// `{id, name, slug}` of the owning category.
    #[must_use]
    pub fn category_ref(&self) -> CategoryRef {
        CategoryRef {
            id: self.category.category_ref_id.clone(),
            name: self.category.category_name.clone(),
            slug: self.category.category_slug.clone(),
        }
    }

    /// First image, used as the cart/wishlist thumbnail.
    #[must_use]
    pub fn thumbnail(&self) -> Option<&str> {
        self.images.0.first().map(String::as_str)
    }
}

/// Validated input for a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: f64,
    pub discount: Discount,
    pub images: Vec<String>,
    pub details: ProductDetails,
    pub product_type: ProductType,
    pub category_id: CategoryId,
    pub is_active: bool,
    pub featured: bool,
}

/// Partial update; `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub discount: Option<Discount>,
    pub images: Option<Vec<String>>,
    pub details: ProductDetails,
    pub product_type: Option<ProductType>,
    pub category_id: Option<CategoryId>,
    pub is_active: Option<bool>,
    pub featured: Option<bool>,
}

impl ProductUpdate {
    /// Merge this update over `current`.
    #[must_use]
    pub fn apply(self, current: &Product) -> NewProduct {
        let d = self.details;
        let c = &current.details;
        NewProduct {
            name: self.name.unwrap_or_else(|| current.name.clone()),
            slug: self.slug.unwrap_or_else(|| current.slug.clone()),
            description: self.description.or_else(|| current.description.clone()),
            price: self.price.unwrap_or(current.price),
            discount: self.discount.unwrap_or(current.discount),
            images: self.images.unwrap_or_else(|| current.images.0.clone()),
            details: ProductDetails {
                download_url: d.download_url.or_else(|| c.download_url.clone()),
                file_size: d.file_size.or_else(|| c.file_size.clone()),
                version: d.version.or_else(|| c.version.clone()),
                make: d.make.or_else(|| c.make.clone()),
                model: d.model.or_else(|| c.model.clone()),
                year: d.year.or_else(|| c.year.clone()),
                engine_type: d.engine_type.or_else(|| c.engine_type.clone()),
                fuel_type: d.fuel_type.or_else(|| c.fuel_type.clone()),
                transmission: d.transmission.or_else(|| c.transmission.clone()),
            },
            product_type: self.product_type.unwrap_or(current.product_type),
            category_id: self.category_id.unwrap_or_else(|| current.category_id.clone()),
            is_active: self.is_active.unwrap_or(current.is_active),
            featured: self.featured.unwrap_or(current.featured),
        }
    }
}

/// Sort order for product lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    /// Newest first.
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
    Name,
    /// Featured first, then newest.
    Featured,
}

impl ProductSort {
    /// Interpret the `sortBy` / `sortOrder` query pair. Unknown keys fall
    /// back to creation time.
    #[must_use]
    pub fn parse(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        match sort_by {
            Some("price-asc") => Self::PriceAsc,
            Some("price-desc") => Self::PriceDesc,
            Some("name") => Self::Name,
            Some("featured") => Self::Featured,
            _ if sort_order == Some("asc") => Self::Oldest,
            _ => Self::Newest,
        }
    }

    pub(crate) const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "p.created_at DESC, p.rowid DESC",
            Self::Oldest => "p.created_at ASC, p.rowid ASC",
            Self::PriceAsc => "p.price ASC, p.rowid ASC",
            Self::PriceDesc => "p.price DESC, p.rowid DESC",
            Self::Name => "p.name ASC",
            Self::Featured => "p.featured DESC, p.created_at DESC, p.rowid DESC",
        }
    }
}

/// Filters shared by the public and admin product lists.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring over name, description, make and model.
    pub search: Option<String>,
    pub category_id: Option<CategoryId>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub featured_only: bool,
    pub active_only: bool,
    pub sort: ProductSort,
}

/// A product as shown in the public catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProduct {
    pub id: ProductId,
    pub title: String,
    pub slug: String,
    pub price: f64,
    pub original_price: Option<f64>,
    /// Label such as `"15%"`.
    pub discount: Option<String>,
    pub images: Vec<String>,
    pub description: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<String>,
    pub engine_type: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub file_size: Option<String>,
    pub version: Option<String>,
    pub category: CategoryRef,
    pub product_type: ProductType,
    pub featured: bool,
}

impl CatalogProduct {
    /// Listing view: the stored price is the selling price and the original
    /// is back-computed from the discount.
    #[must_use]
    pub fn listing(product: Product) -> Self {
        let original_price = product.discount.original_for(product.price);
        let price = product.price;
        Self::build(product, price, original_price)
    }

    /// "Latest arrivals" view: the discount is applied to the stored price,
    /// which becomes the original.
    #[must_use]
    pub fn latest(product: Product) -> Self {
        let price = product.discount.apply(product.price);
        let original_price = product.discount.is_active().then_some(product.price);
        Self::build(product, price, original_price)
    }

    fn build(product: Product, price: f64, original_price: Option<f64>) -> Self {
        let category = product.category_ref();
        let discount = product.discount.label();
        let details = product.details;
        Self {
            id: product.id,
            title: product.name,
            slug: product.slug,
            price,
            original_price,
            discount,
            images: product.images.0,
            description: product.description,
            make: details.make,
            model: details.model,
            year: details.year,
            engine_type: details.engine_type,
            fuel_type: details.fuel_type,
            transmission: details.transmission,
            file_size: details.file_size,
            version: details.version,
            category,
            product_type: product.product_type,
            featured: product.featured,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parse() {
        assert_eq!(ProductSort::parse(None, None), ProductSort::Newest);
        assert_eq!(ProductSort::parse(Some("createdAt"), Some("asc")), ProductSort::Oldest);
        assert_eq!(ProductSort::parse(Some("price-desc"), Some("asc")), ProductSort::PriceDesc);
        assert_eq!(ProductSort::parse(Some("bogus"), None), ProductSort::Newest);
    }
}
