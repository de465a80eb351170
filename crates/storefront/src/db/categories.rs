//! Category tree repository.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqlitePool;

use autocatalog_core::CategoryId;

use super::RepositoryError;
use crate::models::category::{
    Category, CategoryCounts, CategoryDetail, CategoryProduct, CategoryQuery, CategoryRef,
    NewCategory,
};

const CATEGORY_COLUMNS: &str =
    "id, name, slug, description, image, parent_id, created_at, updated_at";

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List categories by name with parent, children and counts attached.
    ///
    /// The tree is small, so all rows are loaded once and related in memory.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, query: &CategoryQuery) -> Result<Vec<CategoryDetail>, RepositoryError> {
        let all = self.all().await?;
        let product_counts = self.product_counts(query.active_only).await?;
        let mut products = if query.include_products {
            Some(self.products(None, query.active_only).await?)
        } else {
            None
        };

        let selected = all
            .iter()
            .filter(|c| {
                query
                    .parent_id
                    .as_ref()
                    .is_none_or(|parent| c.parent_id.as_ref() == Some(parent))
            })
            .cloned()
            .collect::<Vec<_>>();

        Ok(selected
            .into_iter()
            .map(|category| {
                let listed = products
                    .as_mut()
                    .map(|by_category| by_category.remove(&category.id).unwrap_or_default());
                relate(category, &all, &product_counts, listed)
            })
            .collect())
    }

    /// A single category with all of its products, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: &CategoryId) -> Result<Option<CategoryDetail>, RepositoryError> {
        let all = self.all().await?;
        let Some(category) = all.iter().find(|c| &c.id == id).cloned() else {
            return Ok(None);
        };

        let product_counts = self.product_counts(false).await?;
        let listed = self
            .products(Some(id), false)
            .await?
            .remove(id)
            .unwrap_or_default();

        Ok(Some(relate(category, &all, &product_counts, Some(listed))))
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict("slug")` on a duplicate slug.
    /// Returns `RepositoryError::ForeignKey("parent")` if the parent is missing.
    pub async fn create(&self, input: &NewCategory) -> Result<Category, RepositoryError> {
        let id = CategoryId::generate();
        let now = Utc::now();

        sqlx::query(
            r"
            INSERT INTO category (id, name, slug, description, image, parent_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.image)
        .bind(&input.parent_id)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "slug", "parent"))?;

        self.get_row(&id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Replace a category's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist,
    /// plus the same constraint errors as [`Self::create`].
    pub async fn update(
        &self,
        id: &CategoryId,
        input: &NewCategory,
    ) -> Result<Category, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE category
            SET name = ?, slug = ?, description = ?, image = ?, parent_id = ?, updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.image)
        .bind(&input.parent_id)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "slug", "parent"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_row(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Product and child counts, or `None` if the category does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn counts(&self, id: &CategoryId) -> Result<Option<CategoryCounts>, RepositoryError> {
        let row: Option<(i64, i64)> = sqlx::query_as(
            r"
            SELECT
                (SELECT COUNT(*) FROM product WHERE category_id = c.id),
                (SELECT COUNT(*) FROM category WHERE parent_id = c.id)
            FROM category c
            WHERE c.id = ?
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(products, children)| CategoryCounts {
            products: products.unsigned_abs(),
            children: children.unsigned_abs(),
        }))
    }

    /// Delete a category. Callers check [`Self::counts`] first; the foreign
    /// keys still refuse to orphan products or children.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    /// Returns `RepositoryError::ForeignKey` if it still owns rows.
    pub async fn delete(&self, id: &CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM category WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "category", "category"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn get_row(&self, id: &CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row: Option<Category> = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    async fn all(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows: Vec<Category> = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category ORDER BY name ASC, rowid ASC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    async fn product_counts(
        &self,
        active_only: bool,
    ) -> Result<HashMap<CategoryId, u64>, RepositoryError> {
        let sql = if active_only {
            "SELECT category_id, COUNT(*) FROM product WHERE is_active = 1 GROUP BY category_id"
        } else {
            "SELECT category_id, COUNT(*) FROM product GROUP BY category_id"
        };

        let rows: Vec<(CategoryId, i64)> = sqlx::query_as(sql).fetch_all(self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, count.unsigned_abs()))
            .collect())
    }

    async fn products(
        &self,
        category: Option<&CategoryId>,
        active_only: bool,
    ) -> Result<HashMap<CategoryId, Vec<CategoryProduct>>, RepositoryError> {
        let rows: Vec<CategoryProduct> = sqlx::query_as(
            r"
            SELECT id, category_id, name, slug, price, is_active, featured
            FROM product
            WHERE (?1 IS NULL OR category_id = ?1)
              AND (?2 = 0 OR is_active = 1)
            ORDER BY name ASC, rowid ASC
            ",
        )
        .bind(category)
        .bind(active_only)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<CategoryId, Vec<CategoryProduct>> = HashMap::new();
        for row in rows {
            grouped.entry(row.category_id.clone()).or_default().push(row);
        }
        Ok(grouped)
    }
}

fn relate(
    category: Category,
    all: &[Category],
    product_counts: &HashMap<CategoryId, u64>,
    products: Option<Vec<CategoryProduct>>,
) -> CategoryDetail {
    let parent = category
        .parent_id
        .as_ref()
        .and_then(|parent_id| all.iter().find(|c| &c.id == parent_id))
        .map(CategoryRef::from);
    let children: Vec<CategoryRef> = all
        .iter()
        .filter(|c| c.parent_id.as_ref() == Some(&category.id))
        .map(CategoryRef::from)
        .collect();

    let count = CategoryCounts {
        products: product_counts.get(&category.id).copied().unwrap_or(0),
        children: children.len() as u64,
    };

    CategoryDetail {
        category,
        parent,
        children,
        products,
        count,
    }
}
