//! Product repository: catalog listings and admin CRUD.

use chrono::Utc;
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use autocatalog_core::{PageRequest, ProductId};

use super::{RepositoryError, like_pattern};
use crate::models::product::{NewProduct, Product, ProductFilter, ProductSort, ProductUpdate};

/// Product columns joined with the owning category's reference columns.
const PRODUCT_SELECT: &str = r"
    SELECT p.id, p.name, p.slug, p.description, p.price, p.discount, p.images,
           p.download_url, p.file_size, p.version, p.make, p.model, p.year,
           p.engine_type, p.fuel_type, p.transmission, p.product_type,
           p.category_id, p.is_active, p.featured, p.created_at, p.updated_at,
           c.id AS category_ref_id, c.name AS category_name, c.slug AS category_slug
    FROM product p
    JOIN category c ON c.id = p.category_id
";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// One page of products matching `filter`, plus the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<(Vec<Product>, u64), RepositoryError> {
        let mut count: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM product p WHERE 1 = 1");
        push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut select: QueryBuilder<'_, Sqlite> = QueryBuilder::new(PRODUCT_SELECT);
        select.push(" WHERE 1 = 1");
        push_filter(&mut select, filter);
        select.push(" ORDER BY ").push(filter.sort.order_by());
        select
            .push(" LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));

        let products: Vec<Product> = select.build_query_as().fetch_all(self.pool).await?;
        Ok((products, total.unsigned_abs()))
    }

    /// The newest active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest(&self, limit: u32) -> Result<Vec<Product>, RepositoryError> {
        let filter = ProductFilter {
            active_only: true,
            sort: ProductSort::Newest,
            ..ProductFilter::default()
        };
        let (products, _) = self
            .list(&filter, PageRequest::new(Some(1), Some(i64::from(limit)), limit))
            .await?;
        Ok(products)
    }

    /// A product by id; with `active_only`, inactive products are hidden.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        id: &ProductId,
        active_only: bool,
    ) -> Result<Option<Product>, RepositoryError> {
        let product: Option<Product> = sqlx::query_as(&format!(
            "{PRODUCT_SELECT} WHERE p.id = ? AND (? = 0 OR p.is_active = 1)"
        ))
        .bind(id)
        .bind(active_only)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict("slug")` on a duplicate slug.
    /// Returns `RepositoryError::ForeignKey("category")` for an unknown category.
    pub async fn create(&self, input: &NewProduct) -> Result<Product, RepositoryError> {
        let id = ProductId::generate();
        let now = Utc::now();

        sqlx::query(
            r"
            INSERT INTO product (
                id, name, slug, description, price, discount, images,
                download_url, file_size, version, make, model, year,
                engine_type, fuel_type, transmission, product_type,
                category_id, is_active, featured, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.discount.percent())
        .bind(Json(&input.images))
        .bind(&input.details.download_url)
        .bind(&input.details.file_size)
        .bind(&input.details.version)
        .bind(&input.details.make)
        .bind(&input.details.model)
        .bind(&input.details.year)
        .bind(&input.details.engine_type)
        .bind(&input.details.fuel_type)
        .bind(&input.details.transmission)
        .bind(input.product_type)
        .bind(&input.category_id)
        .bind(input.is_active)
        .bind(input.featured)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "slug", "category"))?;

        self.get(&id, false).await?.ok_or(RepositoryError::NotFound)
    }

    /// Merge `update` over the stored product and write it back.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist,
    /// plus the same constraint errors as [`Self::create`].
    pub async fn update(
        &self,
        id: &ProductId,
        update: ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let current = self.get(id, false).await?.ok_or(RepositoryError::NotFound)?;
        let next = update.apply(&current);

        sqlx::query(
            r"
            UPDATE product
            SET name = ?, slug = ?, description = ?, price = ?, discount = ?, images = ?,
                download_url = ?, file_size = ?, version = ?, make = ?, model = ?, year = ?,
                engine_type = ?, fuel_type = ?, transmission = ?, product_type = ?,
                category_id = ?, is_active = ?, featured = ?, updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(&next.name)
        .bind(&next.slug)
        .bind(&next.description)
        .bind(next.price)
        .bind(next.discount.percent())
        .bind(Json(&next.images))
        .bind(&next.details.download_url)
        .bind(&next.details.file_size)
        .bind(&next.details.version)
        .bind(&next.details.make)
        .bind(&next.details.model)
        .bind(&next.details.year)
        .bind(&next.details.engine_type)
        .bind(&next.details.fuel_type)
        .bind(&next.details.transmission)
        .bind(next.product_type)
        .bind(&next.category_id)
        .bind(next.is_active)
        .bind(next.featured)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "slug", "category"))?;

        self.get(id, false).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product. Cart and wishlist rows go with it; order lines keep
    /// their name snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM product WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Number of products, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product")
            .fetch_one(self.pool)
            .await?;
        Ok(count.unsigned_abs())
    }
}

/// Append the `AND ...` clauses for `filter`; expects a preceding `WHERE`.
fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &ProductFilter) {
    if filter.active_only {
        builder.push(" AND p.is_active = 1");
    }
    if filter.featured_only {
        builder.push(" AND p.featured = 1");
    }
    if let Some(category_id) = &filter.category_id {
        builder.push(" AND p.category_id = ").push_bind(category_id.clone());
    }
    if let Some(min) = filter.min_price {
        builder.push(" AND p.price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        builder.push(" AND p.price <= ").push_bind(max);
    }
    if let Some(term) = filter.search.as_deref().filter(|t| !t.trim().is_empty()) {
        let pattern = like_pattern(term.trim());
        builder.push(" AND (");
        for (i, column) in ["p.name", "p.description", "p.make", "p.model"]
            .into_iter()
            .enumerate()
        {
            if i > 0 {
                builder.push(" OR ");
            }
            builder
                .push("LOWER(COALESCE(")
                .push(column)
                .push(", '')) LIKE ")
                .push_bind(pattern.clone())
                .push(r" ESCAPE '\'");
        }
        builder.push(")");
    }
}
