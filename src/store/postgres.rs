//! PostgreSQL store
//!
//! Multi-row writes run inside one transaction. Checkout locks the buyer's
//! cart rows with `SELECT ... FOR UPDATE` before comparing them against the
//! snapshot that was priced, so two concurrent checkouts cannot both succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Period, SlugScope, Store};
use crate::domain::aggregates::{
    CartEntry, CartLine, Category, Item, ItemStats, Order, OrderLine, PlacedOrder, Review, Role, Shop,
    ShopOrder, ShopOrderStatus, Subscription, User,
};
use crate::domain::value_objects::{Money, Slug};
use crate::{AppError, Result};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self> {
        let role = Role::parse(&row.role)
            .ok_or_else(|| AppError::Internal(format!("unknown role {:?} for user {}", row.role, row.id)))?;
        Ok(User {
            id: row.id, first_name: row.first_name, last_name: row.last_name, username: row.username,
            email: row.email, password_hash: row.password_hash, role, is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ShopOrderRow {
    id: Uuid,
    shop_id: Uuid,
    order_id: Uuid,
    buyer_id: Uuid,
    total_paid: Money,
    billing_status: bool,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ShopOrderRow> for ShopOrder {
    type Error = AppError;

    fn try_from(row: ShopOrderRow) -> Result<Self> {
        let status = ShopOrderStatus::parse(&row.status)
            .ok_or_else(|| AppError::Internal(format!("unknown status {:?} for shop order {}", row.status, row.id)))?;
        Ok(ShopOrder {
            id: row.id, shop_id: row.shop_id, order_id: row.order_id, buyer_id: row.buyer_id,
            total_paid: row.total_paid, billing_status: row.billing_status, status, created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CartEntryRow {
    #[sqlx(flatten)]
    line: CartLine,
    shop_id: Uuid,
}

fn users(rows: Vec<UserRow>) -> Result<Vec<User>> {
    rows.into_iter().map(User::try_from).collect()
}

fn shop_orders(rows: Vec<ShopOrderRow>) -> Result<Vec<ShopOrder>> {
    rows.into_iter().map(ShopOrder::try_from).collect()
}

/// Turns a unique-constraint failure into a 409 with `message`.
fn on_duplicate(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| match e.as_database_error() {
        Some(db) if db.is_unique_violation() => AppError::conflict(message),
        _ => AppError::Database(e),
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: &User, shop: Option<&Shop>) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO users (id, first_name, last_name, username, email, password_hash, role, is_active, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.created_at)
        .execute(&mut *tx)
        .await
        .map_err(on_duplicate("User already exists."))?;

        if let Some(shop) = shop {
            sqlx::query(
                "INSERT INTO shops (id, owner_id, shop_name, slug, description, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(shop.id)
            .bind(shop.owner_id)
            .bind(&shop.shop_name)
            .bind(&shop.slug)
            .bind(&shop.description)
            .bind(shop.created_at)
            .execute(&mut *tx)
            .await
            .map_err(on_duplicate("Shop name is already taken."))?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "UPDATE users SET first_name = $2, last_name = $3, username = $4, email = $5,
                password_hash = $6, is_active = $7
             WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .execute(&self.pool)
        .await
        .map_err(on_duplicate("Email or username is already taken."))?;
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn slug_taken(&self, scope: SlugScope, slug: &Slug) -> Result<bool> {
        let table = match scope {
            SlugScope::Shop => "shops",
            SlugScope::Category => "categories",
            SlugScope::Item => "items",
        };
        let taken: bool = sqlx::query_scalar(&format!("SELECT EXISTS (SELECT 1 FROM {table} WHERE slug = $1)"))
            .bind(slug)
            .fetch_one(&self.pool)
            .await?;
        Ok(taken)
    }

    async fn shop_by_owner(&self, owner_id: Uuid) -> Result<Option<Shop>> {
        Ok(sqlx::query_as("SELECT * FROM shops WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn shop_by_slug(&self, slug: &Slug) -> Result<Option<Shop>> {
        Ok(sqlx::query_as("SELECT * FROM shops WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn shop_by_name(&self, shop_name: &str) -> Result<Option<Shop>> {
        Ok(sqlx::query_as("SELECT * FROM shops WHERE shop_name = $1")
            .bind(shop_name)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_shop(&self, shop: &Shop) -> Result<()> {
        sqlx::query(
            "UPDATE shops SET shop_name = $2, slug = $3, description = $4, modified_at = $5 WHERE id = $1",
        )
        .bind(shop.id)
        .bind(&shop.shop_name)
        .bind(&shop.slug)
        .bind(&shop.description)
        .bind(shop.modified_at)
        .execute(&self.pool)
        .await
        .map_err(on_duplicate("Shop name is already taken."))?;
        Ok(())
    }

    async fn insert_category(&self, category: &Category) -> Result<()> {
        sqlx::query("INSERT INTO categories (id, shop_id, name, slug, is_available) VALUES ($1, $2, $3, $4, $5)")
            .bind(category.id)
            .bind(category.shop_id)
            .bind(&category.name)
            .bind(&category.slug)
            .bind(category.is_available)
            .execute(&self.pool)
            .await
            .map_err(on_duplicate("Category name is already taken."))?;
        Ok(())
    }

    async fn category_by_slug(&self, shop_id: Uuid, slug: &Slug) -> Result<Option<Category>> {
        Ok(sqlx::query_as("SELECT * FROM categories WHERE shop_id = $1 AND slug = $2")
            .bind(shop_id)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn category_by_name(&self, shop_id: Uuid, name: &str) -> Result<Option<Category>> {
        Ok(sqlx::query_as("SELECT * FROM categories WHERE shop_id = $1 AND name = $2")
            .bind(shop_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn categories_for_shop(&self, shop_id: Uuid) -> Result<Vec<Category>> {
        Ok(sqlx::query_as("SELECT * FROM categories WHERE shop_id = $1 ORDER BY name")
            .bind(shop_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_category(&self, category: &Category) -> Result<()> {
        sqlx::query("UPDATE categories SET name = $2, slug = $3, is_available = $4 WHERE id = $1")
            .bind(category.id)
            .bind(&category.name)
            .bind(&category.slug)
            .bind(category.is_available)
            .execute(&self.pool)
            .await
            .map_err(on_duplicate("Category name is already taken."))?;
        Ok(())
    }

    async fn delete_category(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_item(&self, item: &Item) -> Result<()> {
        sqlx::query(
            "INSERT INTO items (id, shop_id, category_id, name, slug, image, title, description, price, is_available, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(item.id)
        .bind(item.shop_id)
        .bind(item.category_id)
        .bind(&item.name)
        .bind(&item.slug)
        .bind(&item.image)
        .bind(&item.title)
        .bind(&item.description)
        .bind(item.price)
        .bind(item.is_available)
        .bind(item.created_at)
        .execute(&self.pool)
        .await
        .map_err(on_duplicate("Item name is already taken."))?;
        Ok(())
    }

    async fn item_by_slug(&self, slug: &Slug) -> Result<Option<Item>> {
        Ok(sqlx::query_as("SELECT * FROM items WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn item_by_name(&self, shop_id: Uuid, name: &str) -> Result<Option<Item>> {
        Ok(sqlx::query_as("SELECT * FROM items WHERE shop_id = $1 AND name = $2")
            .bind(shop_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn items_for_shop(&self, shop_id: Uuid) -> Result<Vec<Item>> {
        Ok(sqlx::query_as("SELECT * FROM items WHERE shop_id = $1 ORDER BY created_at")
            .bind(shop_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_item(&self, item: &Item) -> Result<()> {
        sqlx::query(
            "UPDATE items SET category_id = $2, name = $3, slug = $4, image = $5, title = $6,
                description = $7, price = $8, is_available = $9
             WHERE id = $1",
        )
        .bind(item.id)
        .bind(item.category_id)
        .bind(&item.name)
        .bind(&item.slug)
        .bind(&item.image)
        .bind(&item.title)
        .bind(&item.description)
        .bind(item.price)
        .bind(item.is_available)
        .execute(&self.pool)
        .await
        .map_err(on_duplicate("Item name is already taken."))?;
        Ok(())
    }

    async fn delete_item(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_review(&self, review: &Review) -> Result<()> {
        sqlx::query(
            "INSERT INTO reviews (id, item_id, user_id, stars, comment, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(review.id)
        .bind(review.item_id)
        .bind(review.user_id)
        .bind(review.stars)
        .bind(&review.comment)
        .bind(review.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn reviews_for_item(&self, item_id: Uuid) -> Result<Vec<Review>> {
        Ok(sqlx::query_as("SELECT * FROM reviews WHERE item_id = $1 ORDER BY created_at")
            .bind(item_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn toggle_wish(&self, user_id: Uuid, item_id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query("DELETE FROM wish_list WHERE user_id = $1 AND item_id = $2")
            .bind(user_id)
            .bind(item_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if removed == 0 {
            sqlx::query("INSERT INTO wish_list (user_id, item_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(item_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(removed == 0)
    }

    async fn wish_list(&self, user_id: Uuid) -> Result<Vec<Item>> {
        Ok(sqlx::query_as(
            "SELECT i.* FROM items i JOIN wish_list w ON w.item_id = i.id WHERE w.user_id = $1 ORDER BY i.name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn cart_line(&self, user_id: Uuid, item_id: Uuid) -> Result<Option<CartLine>> {
        Ok(sqlx::query_as("SELECT * FROM cart_items WHERE user_id = $1 AND item_id = $2")
            .bind(user_id)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn add_cart_unit(&self, user_id: Uuid, item: &Item) -> Result<CartLine> {
        Ok(sqlx::query_as(
            "INSERT INTO cart_items (user_id, item_id, quantity, line_total) VALUES ($1, $2, 1, $3)
             ON CONFLICT (user_id, item_id) DO UPDATE
                SET quantity = cart_items.quantity + 1,
                    line_total = (cart_items.quantity + 1) * EXCLUDED.line_total
             RETURNING user_id, item_id, quantity, line_total",
        )
        .bind(user_id)
        .bind(item.id)
        .bind(item.price)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn save_cart_line(&self, line: &CartLine) -> Result<()> {
        sqlx::query(
            "INSERT INTO cart_items (user_id, item_id, quantity, line_total) VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, item_id) DO UPDATE SET quantity = EXCLUDED.quantity, line_total = EXCLUDED.line_total",
        )
        .bind(line.user_id())
        .bind(line.item_id())
        .bind(line.quantity())
        .bind(line.line_total())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_cart_line(&self, user_id: Uuid, item_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND item_id = $2")
            .bind(user_id)
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn cart_entries(&self, user_id: Uuid) -> Result<Vec<CartEntry>> {
        let rows: Vec<CartEntryRow> = sqlx::query_as(
            "SELECT c.user_id, c.item_id, c.quantity, c.line_total, i.shop_id
             FROM cart_items c JOIN items i ON i.id = c.item_id
             WHERE c.user_id = $1 ORDER BY c.item_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| CartEntry { line: r.line, shop_id: r.shop_id }).collect())
    }

    async fn place_order(&self, placed: &PlacedOrder, consumed: &[CartLine]) -> Result<()> {
        let order = &placed.order;
        let mut tx = self.pool.begin().await?;

        let current: Vec<CartLine> = sqlx::query_as(
            "SELECT * FROM cart_items WHERE user_id = $1 ORDER BY item_id FOR UPDATE",
        )
        .bind(order.buyer_id)
        .fetch_all(&mut *tx)
        .await?;
        let unchanged = current.len() == consumed.len() && consumed.iter().all(|line| current.contains(line));
        if !unchanged {
            return Err(AppError::conflict("Cart changed during checkout."));
        }

        sqlx::query(
            "INSERT INTO orders (id, buyer_id, first_name, last_name, phone_number, address, country, city, pin_code,
                total_paid, billing_status, payment_reference, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(order.id)
        .bind(order.buyer_id)
        .bind(&order.shipping.first_name)
        .bind(&order.shipping.last_name)
        .bind(&order.shipping.phone_number)
        .bind(&order.shipping.address)
        .bind(&order.shipping.country)
        .bind(&order.shipping.city)
        .bind(&order.shipping.pin_code)
        .bind(order.total_paid)
        .bind(order.billing_status)
        .bind(&order.payment_reference)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        for line in &placed.lines {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, item_id, shop_id, quantity, unit_price, line_total)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(line.id)
            .bind(line.order_id)
            .bind(line.item_id)
            .bind(line.shop_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.line_total)
            .execute(&mut *tx)
            .await?;
        }

        for shop_order in &placed.shop_orders {
            sqlx::query(
                "INSERT INTO shop_orders (id, shop_id, order_id, buyer_id, total_paid, billing_status, status, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(shop_order.id)
            .bind(shop_order.shop_id)
            .bind(shop_order.order_id)
            .bind(shop_order.buyer_id)
            .bind(shop_order.total_paid)
            .bind(shop_order.billing_status)
            .bind(shop_order.status.as_str())
            .bind(shop_order.created_at)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(order.buyer_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn orders_for_buyer(&self, buyer_id: Uuid) -> Result<Vec<Order>> {
        Ok(sqlx::query_as("SELECT * FROM orders WHERE buyer_id = $1 ORDER BY created_at")
            .bind(buyer_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn order_for_buyer(&self, buyer_id: Uuid, order_id: Uuid) -> Result<Option<Order>> {
        Ok(sqlx::query_as("SELECT * FROM orders WHERE id = $1 AND buyer_id = $2")
            .bind(order_id)
            .bind(buyer_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn order_lines(&self, order_id: Uuid) -> Result<Vec<OrderLine>> {
        Ok(sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn order_by_payment_reference(&self, reference: &str) -> Result<Option<Order>> {
        Ok(sqlx::query_as("SELECT * FROM orders WHERE payment_reference = $1")
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn confirm_payment(&self, order_id: Uuid) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query("UPDATE orders SET billing_status = TRUE WHERE id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(AppError::not_found("Order"));
        }
        let touched = sqlx::query("UPDATE shop_orders SET billing_status = TRUE WHERE order_id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(touched as usize)
    }

    async fn shop_orders_for_shop(&self, shop_id: Uuid) -> Result<Vec<ShopOrder>> {
        let rows: Vec<ShopOrderRow> = sqlx::query_as("SELECT * FROM shop_orders WHERE shop_id = $1 ORDER BY created_at")
            .bind(shop_id)
            .fetch_all(&self.pool)
            .await?;
        shop_orders(rows)
    }

    async fn shop_order(&self, shop_id: Uuid, shop_order_id: Uuid) -> Result<Option<ShopOrder>> {
        let row: Option<ShopOrderRow> = sqlx::query_as("SELECT * FROM shop_orders WHERE id = $1 AND shop_id = $2")
            .bind(shop_order_id)
            .bind(shop_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(ShopOrder::try_from).transpose()
    }

    async fn shop_orders_for_buyer(&self, shop_id: Uuid, buyer_id: Uuid) -> Result<Vec<ShopOrder>> {
        let rows: Vec<ShopOrderRow> = sqlx::query_as(
            "SELECT * FROM shop_orders WHERE shop_id = $1 AND buyer_id = $2 ORDER BY created_at",
        )
        .bind(shop_id)
        .bind(buyer_id)
        .fetch_all(&self.pool)
        .await?;
        shop_orders(rows)
    }

    async fn set_shop_order_status(&self, shop_order_id: Uuid, status: ShopOrderStatus) -> Result<()> {
        sqlx::query("UPDATE shop_orders SET status = $2 WHERE id = $1")
            .bind(shop_order_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn shop_revenue(&self, shop_id: Uuid, period: Option<Period>) -> Result<Money> {
        let total: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_paid), 0) FROM shop_orders
             WHERE shop_id = $1
               AND ($2::timestamptz IS NULL OR created_at >= $2)
               AND ($3::timestamptz IS NULL OR created_at <= $3)",
        )
        .bind(shop_id)
        .bind(period.map(|p| p.from))
        .bind(period.map(|p| p.to))
        .fetch_one(&self.pool)
        .await?;
        Ok(Money::new(total))
    }

    async fn shop_customers(&self, shop_id: Uuid) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT DISTINCT u.* FROM users u JOIN shop_orders so ON so.buyer_id = u.id WHERE so.shop_id = $1",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;
        users(rows)
    }

    async fn item_stats(&self, shop_id: Uuid) -> Result<Vec<ItemStats>> {
        Ok(sqlx::query_as(
            "SELECT i.id AS item_id, i.name,
                    COALESCE(sold.quantity, 0) AS quantity,
                    COALESCE(sold.revenue, 0) AS price,
                    (SELECT COUNT(*) FROM wish_list w WHERE w.item_id = i.id) AS wish_list_count
             FROM items i
             LEFT JOIN (
                 SELECT item_id, SUM(quantity)::BIGINT AS quantity, SUM(line_total) AS revenue
                 FROM order_items WHERE shop_id = $1 GROUP BY item_id
             ) sold ON sold.item_id = i.id
             WHERE i.shop_id = $1
             ORDER BY i.name",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn subscription_by_email(&self, email: &str) -> Result<Option<Subscription>> {
        Ok(sqlx::query_as("SELECT * FROM newsletters WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn save_subscription(&self, subscription: &Subscription) -> Result<()> {
        sqlx::query(
            "INSERT INTO newsletters (id, email, is_active, created_at) VALUES ($1, $2, $3, $4)
             ON CONFLICT (email) DO UPDATE SET is_active = EXCLUDED.is_active",
        )
        .bind(subscription.id)
        .bind(&subscription.email)
        .bind(subscription.is_active)
        .bind(subscription.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
