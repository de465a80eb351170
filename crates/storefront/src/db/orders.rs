//! Order repository: checkout persistence, customer history and admin lists.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use autocatalog_core::{OrderId, OrderItemId, OrderStatus, PageRequest, UserId};

use super::RepositoryError;
use crate::models::order::{NewOrder, Order, OrderItem, OrderWithItems};

const ORDER_COLUMNS: &str = r"
    id, order_number, user_id, status, total_amount, payment_method, transaction_id,
    customer_email, customer_name, download_links, created_at, updated_at
";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record an order and its lines in one transaction.
    ///
    /// Lines naming a product that no longer exists keep their name snapshot
    /// with no product reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict("order number")` on a duplicate
    /// order number, `RepositoryError::ForeignKey("user")` for an unknown user.
    pub async fn create(&self, order: &NewOrder) -> Result<OrderWithItems, RepositoryError> {
        let id = OrderId::generate();
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO customer_order (
                id, order_number, user_id, status, total_amount, payment_method,
                transaction_id, customer_email, customer_name, download_links,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&id)
        .bind(&order.order_number)
        .bind(&order.user_id)
        .bind(order.status)
        .bind(order.total_amount)
        .bind(order.payment_method.as_str())
        .bind(&order.transaction_id)
        .bind(&order.customer_email)
        .bind(&order.customer_name)
        .bind(Json(&order.download_links))
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_write(e, "order number", "user"))?;

        for item in &order.items {
            sqlx::query(
                r"
                INSERT INTO order_item (id, order_id, product_id, product_name, quantity, price)
                VALUES (?, ?, (SELECT id FROM product WHERE id = ?), ?, ?, ?)
                ",
            )
            .bind(OrderItemId::generate())
            .bind(&id)
            .bind(&item.product_id)
            .bind(&item.name)
            .bind(item.quantity)
            .bind(item.price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get(&id).await?.ok_or(RepositoryError::NotFound)
    }

    /// An order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: &OrderId) -> Result<Option<OrderWithItems>, RepositoryError> {
        let order: Option<Order> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM customer_order WHERE id = ?"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        match order {
            Some(order) => Ok(self.attach_items(vec![order]).await?.pop()),
            None => Ok(None),
        }
    }

    /// A customer's orders, newest first; `limit` caps the result.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: Option<u32>,
    ) -> Result<Vec<OrderWithItems>, RepositoryError> {
        let orders: Vec<Order> = sqlx::query_as(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM customer_order
            WHERE user_id = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "
        ))
        .bind(user_id)
        .bind(limit.map_or(-1, i64::from))
        .fetch_all(self.pool)
        .await?;

        self.attach_items(orders).await
    }

    /// One page of all orders, newest first, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<(Vec<OrderWithItems>, u64), RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM customer_order WHERE (?1 IS NULL OR status = ?1)",
        )
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        let orders: Vec<Order> = sqlx::query_as(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM customer_order
            WHERE (?1 IS NULL OR status = ?1)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2 OFFSET ?3
            "
        ))
        .bind(status)
        .bind(i64::from(page.limit()))
        .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
        .fetch_all(self.pool)
        .await?;

        Ok((self.attach_items(orders).await?, total.unsigned_abs()))
    }

    /// Move an order to `status`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<OrderWithItems, RepositoryError> {
        let result =
            sqlx::query("UPDATE customer_order SET status = ?, updated_at = ? WHERE id = ?")
                .bind(status)
                .bind(Utc::now())
                .bind(id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Number of the user's orders created in `[from, until)`; open bounds
    /// are unbounded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_for_user(
        &self,
        user_id: &UserId,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM customer_order
            WHERE user_id = ?1
              AND (?2 IS NULL OR created_at >= ?2)
              AND (?3 IS NULL OR created_at < ?3)
            ",
        )
        .bind(user_id)
        .bind(from)
        .bind(until)
        .fetch_one(self.pool)
        .await?;
        Ok(count.unsigned_abs())
    }

    /// Sum of the user's non-cancelled order totals created in `[from, until)`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn spent_by_user(
        &self,
        user_id: &UserId,
        from: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> Result<f64, RepositoryError> {
        let spent: f64 = sqlx::query_scalar(
            r"
            SELECT COALESCE(SUM(total_amount), 0.0) FROM customer_order
            WHERE user_id = ?1
              AND status <> 'CANCELLED'
              AND created_at >= ?2
              AND (?3 IS NULL OR created_at < ?3)
            ",
        )
        .bind(user_id)
        .bind(from)
        .bind(until)
        .fetch_one(self.pool)
        .await?;
        Ok(spent)
    }

    async fn attach_items(
        &self,
        orders: Vec<Order>,
    ) -> Result<Vec<OrderWithItems>, RepositoryError> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            r"
            SELECT oi.id, oi.order_id, oi.product_id, oi.product_name, oi.quantity, oi.price,
                   p.download_url
            FROM order_item oi
            LEFT JOIN product p ON p.id = oi.product_id
            WHERE oi.order_id IN (
            ",
        );
        let mut ids = builder.separated(", ");
        for order in &orders {
            ids.push_bind(order.id.clone());
        }
        builder.push(") ORDER BY oi.rowid ASC");

        let mut items: Vec<OrderItem> = builder.build_query_as().fetch_all(self.pool).await?;

        Ok(orders
            .into_iter()
            .map(|order| {
                let (mine, rest): (Vec<_>, Vec<_>) =
                    items.drain(..).partition(|item| item.order_id == order.id);
                items = rest;
                OrderWithItems { order, items: mine }
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use chrono::Duration;

    use autocatalog_core::{PaymentMethod, ProductId};

    use super::*;
    use crate::db::{ProductRepository, test_support};
    use crate::models::order::{DownloadLink, NewOrderItem};

    fn new_order(user_id: &UserId, number: &str, lines: Vec<NewOrderItem>) -> NewOrder {
        let total = lines.iter().map(|l| l.price * f64::from(l.quantity)).sum();
        NewOrder {
            order_number: number.to_owned(),
            user_id: user_id.clone(),
            status: OrderStatus::Completed,
            total_amount: total,
            payment_method: PaymentMethod::Visa,
            transaction_id: format!("txn_{number}"),
            customer_email: Some("buyer@example.com".to_owned()),
            customer_name: None,
            download_links: Vec::new(),
            items: lines,
        }
    }

    fn line(product_id: &ProductId, price: f64) -> NewOrderItem {
        NewOrderItem {
            product_id: product_id.clone(),
            name: "Snapshot name".to_owned(),
            quantity: 1,
            price,
        }
    }

    #[tokio::test]
    async fn test_create_keeps_snapshot_for_unknown_product() {
        let pool = test_support::pool().await;
        let user = test_support::user(&pool, "buyer@example.com").await;
        let category = test_support::category(&pool, "volvo").await;
        let mut vida = test_support::new_product("vida-dice", &category, 80.0);
        vida.details.download_url = Some("https://files.example.com/vida.zip".to_owned());
        let vida = ProductRepository::new(&pool).create(&vida).await.unwrap();

        let mut order = new_order(
            &user,
            "ORD-1",
            vec![line(&vida.id, 80.0), line(&ProductId::new("gone"), 5.0)],
        );
        order.download_links = vec![DownloadLink {
            product_id: vida.id.clone(),
            download_url: "https://dl.example.com/vida".to_owned(),
            expires_at: Utc::now(),
        }];

        let orders = OrderRepository::new(&pool);
        let created = orders.create(&order).await.unwrap();
        assert_eq!(created.order.total_amount, 85.0);
        assert_eq!(created.order.download_links.0.len(), 1);
        assert_eq!(created.items.len(), 2);
        assert_eq!(
            created.items[0].download_url.as_deref(),
            Some("https://files.example.com/vida.zip")
        );
        assert_eq!(created.items[1].product_id, None);
        assert_eq!(created.items[1].product_name, "Snapshot name");
    }

    #[tokio::test]
    async fn test_user_history_and_status_filter() {
        let pool = test_support::pool().await;
        let user = test_support::user(&pool, "history@example.com").await;
        let orders = OrderRepository::new(&pool);
        let product = ProductId::new("none");

        orders.create(&new_order(&user, "ORD-A", vec![line(&product, 10.0)])).await.unwrap();
        let second = orders
            .create(&new_order(&user, "ORD-B", vec![line(&product, 30.0)]))
            .await
            .unwrap();
        orders.update_status(&second.order.id, OrderStatus::Cancelled).await.unwrap();

        let history = orders.list_for_user(&user, None).await.unwrap();
        assert_eq!(history[0].order.order_number, "ORD-B");
        assert_eq!(history.len(), 2);

        let (cancelled, total) = orders
            .list(Some(OrderStatus::Cancelled), PageRequest::new(None, None, 10))
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(cancelled[0].order.status, OrderStatus::Cancelled);

        let start = Utc::now() - Duration::days(1);
        assert_eq!(orders.count_for_user(&user, Some(start), None).await.unwrap(), 2);
        assert_eq!(orders.spent_by_user(&user, start, None).await.unwrap(), 10.0);

        let err = orders
            .create(&new_order(&user, "ORD-A", Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }
}
