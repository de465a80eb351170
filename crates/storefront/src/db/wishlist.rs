//! Saved products per user.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use autocatalog_core::{ProductId, UserId, WishlistItemId};

use super::RepositoryError;

/// A wishlist row joined with its product and category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub id: WishlistItemId,
    pub product_id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: f64,
    /// Discount percentage, `0` when none.
    pub discount: f64,
    /// Category name.
    pub category: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

const WISHLIST_SELECT: &str = r"
    SELECT w.id, p.id AS product_id, p.name, p.slug, p.price, p.discount,
           c.name AS category, json_extract(p.images, '$[0]') AS image, w.created_at
    FROM wishlist_item w
    JOIN product p ON p.id = w.product_id
    JOIN category c ON c.id = p.category_id
";

/// Repository for wishlist database operations.
pub struct WishlistRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Save a product; saving it twice keeps the first entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::ForeignKey("product")` for an unknown product.
    pub async fn add(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
    ) -> Result<WishlistItem, RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO wishlist_item (id, user_id, product_id, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (user_id, product_id) DO NOTHING
            ",
        )
        .bind(WishlistItemId::generate())
        .bind(user_id)
        .bind(product_id)
        .bind(Utc::now())
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "product", "product"))?;

        let item: Option<WishlistItem> = sqlx::query_as(&format!(
            "{WISHLIST_SELECT} WHERE w.user_id = ? AND w.product_id = ?"
        ))
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;

        item.ok_or(RepositoryError::NotFound)
    }

    /// The user's wishlist, newest first; `limit` caps the result.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        user_id: &UserId,
        limit: Option<u32>,
    ) -> Result<Vec<WishlistItem>, RepositoryError> {
        let items: Vec<WishlistItem> = sqlx::query_as(&format!(
            "{WISHLIST_SELECT} WHERE w.user_id = ? ORDER BY w.created_at DESC, w.rowid DESC LIMIT ?"
        ))
        .bind(user_id)
        .bind(limit.map_or(-1, i64::from))
        .fetch_all(self.pool)
        .await?;
        Ok(items)
    }

    /// Remove one of the user's entries. Returns `false` if the user owns no
    /// entry with that id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        user_id: &UserId,
        item_id: &WishlistItemId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM wishlist_item WHERE id = ? AND user_id = ?")
            .bind(item_id)
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of saved products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, user_id: &UserId) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM wishlist_item WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count.unsigned_abs())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{ProductRepository, test_support};

    #[tokio::test]
    async fn test_add_is_idempotent_and_scoped_to_owner() {
        let pool = test_support::pool().await;
        let owner = test_support::user(&pool, "owner@example.com").await;
        let other = test_support::user(&pool, "other@example.com").await;
        let category = test_support::category(&pool, "toyota").await;
        let product = ProductRepository::new(&pool)
            .create(&test_support::new_product("techstream", &category, 35.0))
            .await
            .unwrap();

        let wishlist = WishlistRepository::new(&pool);
        let first = wishlist.add(&owner, &product.id).await.unwrap();
        let second = wishlist.add(&owner, &product.id).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.category, "TOYOTA");
        assert_eq!(wishlist.count(&owner).await.unwrap(), 1);

        assert!(!wishlist.remove(&other, &first.id).await.unwrap());
        assert!(wishlist.remove(&owner, &first.id).await.unwrap());
        assert!(wishlist.list(&owner, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product_is_rejected() {
        let pool = test_support::pool().await;
        let owner = test_support::user(&pool, "w@example.com").await;
        let err = WishlistRepository::new(&pool)
            .add(&owner, &ProductId::new("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ForeignKey(_)));
    }
}
