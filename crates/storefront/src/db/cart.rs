//! Server copy of each user's cart.
//!
//! The client pushes its whole cart on every mutation and the server
//! replaces what it holds; there is no per-item diffing.

use chrono::Utc;
use sqlx::SqlitePool;

use autocatalog_core::{CartItemId, LineItem, ProductId, SyncItem, UserId};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    product_id: ProductId,
    name: String,
    price: f64,
    quantity: i64,
    image: Option<String>,
}

impl TryFrom<CartRow> for LineItem {
    type Error = RepositoryError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!("cart quantity out of range: {}", row.quantity))
        })?;

        Ok(Self {
            id: row.product_id,
            name: row.name,
            price: row.price,
            quantity,
            image: row.image,
        })
    }
}

/// Repository for the server-side cart mirror.
pub struct CartRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// The user's cart as line items, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, user_id: &UserId) -> Result<Vec<LineItem>, RepositoryError> {
        let rows: Vec<CartRow> = sqlx::query_as(
            r"
            SELECT p.id AS product_id, p.name, p.price, ci.quantity,
                   json_extract(p.images, '$[0]') AS image
            FROM cart_item ci
            JOIN product p ON p.id = ci.product_id
            WHERE ci.user_id = ?
            ORDER BY ci.rowid ASC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(LineItem::try_from).collect()
    }

    /// Replace the user's cart with `items` in one transaction.
    ///
    /// Entries naming the same product are merged by summing quantities,
    /// capped at `u32::MAX`. Callers reject quantities outside `1..=u32::MAX`
    /// beforehand.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::ForeignKey("product")` if an entry names an
    /// unknown product; the previous cart is then left untouched.
    pub async fn replace(&self, user_id: &UserId, items: &[SyncItem]) -> Result<(), RepositoryError> {
        let merged = merge(items);
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cart_item WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for (product_id, quantity) in &merged {
            sqlx::query(
                r"
                INSERT INTO cart_item (id, user_id, product_id, quantity, created_at)
                VALUES (?, ?, ?, ?, ?)
                ",
            )
            .bind(CartItemId::generate())
            .bind(user_id)
            .bind(product_id)
            .bind(quantity)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_write(e, "product", "product"))?;
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Largest quantity a cart line can hold; reads decode it as `u32`.
const MAX_LINE_QUANTITY: i64 = 0xFFFF_FFFF;

/// Fold duplicate product ids into one entry, keeping first-seen order.
///
/// Summed quantities are capped at [`MAX_LINE_QUANTITY`].
fn merge(items: &[SyncItem]) -> Vec<(&ProductId, i64)> {
    let mut merged: Vec<(&ProductId, i64)> = Vec::with_capacity(items.len());
    for item in items {
        let quantity = item.quantity.min(MAX_LINE_QUANTITY);
        match merged.iter_mut().find(|(id, _)| *id == &item.product_id) {
            Some((_, total)) => *total = total.saturating_add(quantity).min(MAX_LINE_QUANTITY),
            None => merged.push((&item.product_id, quantity)),
        }
    }
    merged
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{ProductRepository, test_support};

    fn sync(product_id: &ProductId, quantity: i64) -> SyncItem {
        SyncItem {
            product_id: product_id.clone(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_replace_is_full_replace() {
        let pool = test_support::pool().await;
        let user = test_support::user(&pool, "cart@example.com").await;
        let category = test_support::category(&pool, "ford").await;
        let products = ProductRepository::new(&pool);
        let mut etis = test_support::new_product("etis", &category, 25.0);
        etis.images = vec!["/img/etis.png".to_owned()];
        let etis = products.create(&etis).await.unwrap();
        let ids = products
            .create(&test_support::new_product("ids", &category, 60.0))
            .await
            .unwrap();

        let cart = CartRepository::new(&pool);
        cart.replace(&user, &[sync(&etis.id, 2), sync(&ids.id, 1), sync(&etis.id, 1)])
            .await
            .unwrap();

        let items = cart.items(&user).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, etis.id);
        assert_eq!(items[0].quantity, 3);
        assert_eq!(items[0].image.as_deref(), Some("/img/etis.png"));
        assert_eq!(items[1].image, None);

        cart.replace(&user, &[]).await.unwrap();
        assert!(cart.items(&user).await.unwrap().is_empty());
    }

    #[test]
    fn test_merge_caps_summed_quantities() {
        let id = ProductId::new("p1");
        let max = i64::from(u32::MAX);
        let items = [sync(&id, max), sync(&id, 5)];
        let merged = merge(&items);
        assert_eq!(merged, vec![(&id, max)]);
    }

    #[tokio::test]
    async fn test_large_merged_quantity_reads_back() {
        let pool = test_support::pool().await;
        let user = test_support::user(&pool, "cart3@example.com").await;
        let category = test_support::category(&pool, "fiat").await;
        let elearn = ProductRepository::new(&pool)
            .create(&test_support::new_product("elearn", &category, 9.0))
            .await
            .unwrap();

        let cart = CartRepository::new(&pool);
        let max = i64::from(u32::MAX);
        cart.replace(&user, &[sync(&elearn.id, max), sync(&elearn.id, max)])
            .await
            .unwrap();

        let items = cart.items(&user).await.unwrap();
        assert_eq!(items[0].quantity, u32::MAX);
    }

    #[tokio::test]
    async fn test_unknown_product_keeps_previous_cart() {
        let pool = test_support::pool().await;
        let user = test_support::user(&pool, "cart2@example.com").await;
        let category = test_support::category(&pool, "opel").await;
        let tis = ProductRepository::new(&pool)
            .create(&test_support::new_product("tis2web", &category, 15.0))
            .await
            .unwrap();

        let cart = CartRepository::new(&pool);
        cart.replace(&user, &[sync(&tis.id, 1)]).await.unwrap();

        let err = cart
            .replace(&user, &[sync(&ProductId::new("ghost"), 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ForeignKey(_)));
        assert_eq!(cart.items(&user).await.unwrap().len(), 1);
    }
}
