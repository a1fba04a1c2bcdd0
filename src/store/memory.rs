//! In-memory store
//!
//! All tables live behind one `RwLock`, so every method observes and writes a
//! consistent snapshot. Used by the test suite and when no `DATABASE_URL` is set.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{Period, SlugScope, Store};
use crate::domain::aggregates::{
    CartEntry, CartLine, Category, Item, ItemStats, Order, OrderLine, PlacedOrder, Review, Shop, ShopOrder,
    ShopOrderStatus, Subscription, User,
};
use crate::domain::value_objects::{Money, Slug};
use crate::{AppError, Result};

#[derive(Default)]
struct Tables {
    users: BTreeMap<Uuid, User>,
    shops: BTreeMap<Uuid, Shop>,
    categories: BTreeMap<Uuid, Category>,
    items: BTreeMap<Uuid, Item>,
    reviews: Vec<Review>,
    wishes: BTreeSet<(Uuid, Uuid)>,
    cart: BTreeMap<(Uuid, Uuid), CartLine>,
    orders: BTreeMap<Uuid, Order>,
    order_lines: Vec<OrderLine>,
    shop_orders: BTreeMap<Uuid, ShopOrder>,
    subscriptions: HashMap<String, Subscription>,
}

impl Tables {
    fn cart_of(&self, user_id: Uuid) -> impl Iterator<Item = &CartLine> {
        self.cart.range((user_id, Uuid::nil())..=(user_id, Uuid::from_u128(u128::MAX))).map(|(_, line)| line)
    }

    fn drop_item(&mut self, item_id: Uuid) {
        self.items.remove(&item_id);
        self.cart.retain(|(_, item), _| *item != item_id);
        self.wishes.retain(|(_, item)| *item != item_id);
        self.reviews.retain(|r| r.item_id != item_id);
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: &User, shop: Option<&Shop>) -> Result<()> {
        let mut t = self.tables.write();
        if t.users.values().any(|u| u.email == user.email || u.username == user.username) {
            return Err(AppError::conflict("User already exists."));
        }
        if let Some(shop) = shop {
            if t.shops.values().any(|s| s.shop_name == shop.shop_name || s.slug == shop.slug) {
                return Err(AppError::conflict("Shop name is already taken."));
            }
            t.shops.insert(shop.id, shop.clone());
        }
        t.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.tables.read().users.values().find(|u| u.email == email).cloned())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.tables.read().users.values().find(|u| u.username == username).cloned())
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let mut t = self.tables.write();
        match t.users.get_mut(&user.id) {
            Some(existing) => { *existing = user.clone(); Ok(()) }
            None => Err(AppError::not_found("User")),
        }
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let mut t = self.tables.write();
        if t.users.remove(&id).is_none() { return Ok(false); }
        let owned: Vec<Uuid> = t.shops.values().filter(|s| s.owner_id == id).map(|s| s.id).collect();
        for shop_id in owned {
            let items: Vec<Uuid> = t.items.values().filter(|i| i.shop_id == shop_id).map(|i| i.id).collect();
            for item_id in items { t.drop_item(item_id); }
            t.categories.retain(|_, c| c.shop_id != shop_id);
            t.shops.remove(&shop_id);
        }
        t.cart.retain(|(user, _), _| *user != id);
        t.wishes.retain(|(user, _)| *user != id);
        t.reviews.retain(|r| r.user_id != id);
        Ok(true)
    }

    async fn slug_taken(&self, scope: SlugScope, slug: &Slug) -> Result<bool> {
        let t = self.tables.read();
        Ok(match scope {
            SlugScope::Shop => t.shops.values().any(|s| &s.slug == slug),
            SlugScope::Category => t.categories.values().any(|c| &c.slug == slug),
            SlugScope::Item => t.items.values().any(|i| &i.slug == slug),
        })
    }

    async fn shop_by_owner(&self, owner_id: Uuid) -> Result<Option<Shop>> {
        Ok(self.tables.read().shops.values().find(|s| s.owner_id == owner_id).cloned())
    }

    async fn shop_by_slug(&self, slug: &Slug) -> Result<Option<Shop>> {
        Ok(self.tables.read().shops.values().find(|s| &s.slug == slug).cloned())
    }

    async fn shop_by_name(&self, shop_name: &str) -> Result<Option<Shop>> {
        Ok(self.tables.read().shops.values().find(|s| s.shop_name == shop_name).cloned())
    }

    async fn update_shop(&self, shop: &Shop) -> Result<()> {
        self.tables.write().shops.insert(shop.id, shop.clone());
        Ok(())
    }

    async fn insert_category(&self, category: &Category) -> Result<()> {
        self.tables.write().categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn category_by_slug(&self, shop_id: Uuid, slug: &Slug) -> Result<Option<Category>> {
        Ok(self.tables.read().categories.values().find(|c| c.shop_id == shop_id && &c.slug == slug).cloned())
    }

    async fn category_by_name(&self, shop_id: Uuid, name: &str) -> Result<Option<Category>> {
        Ok(self.tables.read().categories.values().find(|c| c.shop_id == shop_id && c.name == name).cloned())
    }

    async fn categories_for_shop(&self, shop_id: Uuid) -> Result<Vec<Category>> {
        Ok(self.tables.read().categories.values().filter(|c| c.shop_id == shop_id).cloned().collect())
    }

    async fn update_category(&self, category: &Category) -> Result<()> {
        self.tables.write().categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn delete_category(&self, id: Uuid) -> Result<()> {
        let mut t = self.tables.write();
        let items: Vec<Uuid> = t.items.values().filter(|i| i.category_id == id).map(|i| i.id).collect();
        for item_id in items { t.drop_item(item_id); }
        t.categories.remove(&id);
        Ok(())
    }

    async fn insert_item(&self, item: &Item) -> Result<()> {
        self.tables.write().items.insert(item.id, item.clone());
        Ok(())
    }

    async fn item_by_slug(&self, slug: &Slug) -> Result<Option<Item>> {
        Ok(self.tables.read().items.values().find(|i| &i.slug == slug).cloned())
    }

    async fn item_by_name(&self, shop_id: Uuid, name: &str) -> Result<Option<Item>> {
        Ok(self.tables.read().items.values().find(|i| i.shop_id == shop_id && i.name == name).cloned())
    }

    async fn items_for_shop(&self, shop_id: Uuid) -> Result<Vec<Item>> {
        Ok(self.tables.read().items.values().filter(|i| i.shop_id == shop_id).cloned().collect())
    }

    async fn update_item(&self, item: &Item) -> Result<()> {
        self.tables.write().items.insert(item.id, item.clone());
        Ok(())
    }

    async fn delete_item(&self, id: Uuid) -> Result<()> {
        self.tables.write().drop_item(id);
        Ok(())
    }

    async fn insert_review(&self, review: &Review) -> Result<()> {
        self.tables.write().reviews.push(review.clone());
        Ok(())
    }

    async fn reviews_for_item(&self, item_id: Uuid) -> Result<Vec<Review>> {
        Ok(self.tables.read().reviews.iter().filter(|r| r.item_id == item_id).cloned().collect())
    }

    async fn toggle_wish(&self, user_id: Uuid, item_id: Uuid) -> Result<bool> {
        let mut t = self.tables.write();
        if t.wishes.remove(&(user_id, item_id)) { return Ok(false); }
        t.wishes.insert((user_id, item_id));
        Ok(true)
    }

    async fn wish_list(&self, user_id: Uuid) -> Result<Vec<Item>> {
        let t = self.tables.read();
        Ok(t.wishes.iter()
            .filter(|(user, _)| *user == user_id)
            .filter_map(|(_, item)| t.items.get(item).cloned())
            .collect())
    }

    async fn cart_line(&self, user_id: Uuid, item_id: Uuid) -> Result<Option<CartLine>> {
        Ok(self.tables.read().cart.get(&(user_id, item_id)).cloned())
    }

    async fn add_cart_unit(&self, user_id: Uuid, item: &Item) -> Result<CartLine> {
        let mut t = self.tables.write();
        let line = match t.cart.get(&(user_id, item.id)) {
            Some(current) => {
                let mut line = current.clone();
                line.add_one(item.price)?;
                line
            }
            None => CartLine::open(user_id, item),
        };
        t.cart.insert((user_id, item.id), line.clone());
        Ok(line)
    }

    async fn save_cart_line(&self, line: &CartLine) -> Result<()> {
        self.tables.write().cart.insert((line.user_id(), line.item_id()), line.clone());
        Ok(())
    }

    async fn delete_cart_line(&self, user_id: Uuid, item_id: Uuid) -> Result<()> {
        self.tables.write().cart.remove(&(user_id, item_id));
        Ok(())
    }

    async fn cart_entries(&self, user_id: Uuid) -> Result<Vec<CartEntry>> {
        let t = self.tables.read();
        Ok(t.cart_of(user_id)
            .filter_map(|line| {
                t.items.get(&line.item_id()).map(|item| CartEntry { line: line.clone(), shop_id: item.shop_id })
            })
            .collect())
    }

    async fn place_order(&self, placed: &PlacedOrder, consumed: &[CartLine]) -> Result<()> {
        let mut t = self.tables.write();
        let buyer = placed.order.buyer_id;
        let current: Vec<&CartLine> = t.cart_of(buyer).collect();
        let unchanged = current.len() == consumed.len() && consumed.iter().all(|line| current.contains(&line));
        if !unchanged {
            return Err(AppError::conflict("Cart changed during checkout."));
        }

        t.orders.insert(placed.order.id, placed.order.clone());
        t.order_lines.extend(placed.lines.iter().cloned());
        for shop_order in &placed.shop_orders {
            t.shop_orders.insert(shop_order.id, shop_order.clone());
        }
        t.cart.retain(|(user, _), _| *user != buyer);
        Ok(())
    }

    async fn orders_for_buyer(&self, buyer_id: Uuid) -> Result<Vec<Order>> {
        Ok(self.tables.read().orders.values().filter(|o| o.buyer_id == buyer_id).cloned().collect())
    }

    async fn order_for_buyer(&self, buyer_id: Uuid, order_id: Uuid) -> Result<Option<Order>> {
        Ok(self.tables.read().orders.get(&order_id).filter(|o| o.buyer_id == buyer_id).cloned())
    }

    async fn order_lines(&self, order_id: Uuid) -> Result<Vec<OrderLine>> {
        Ok(self.tables.read().order_lines.iter().filter(|l| l.order_id == order_id).cloned().collect())
    }

    async fn order_by_payment_reference(&self, reference: &str) -> Result<Option<Order>> {
        Ok(self.tables.read().orders.values().find(|o| o.payment_reference == reference).cloned())
    }

    async fn confirm_payment(&self, order_id: Uuid) -> Result<usize> {
        let mut t = self.tables.write();
        let order = t.orders.get_mut(&order_id).ok_or_else(|| AppError::not_found("Order"))?;
        order.billing_status = true;
        let mut touched = 0;
        for shop_order in t.shop_orders.values_mut().filter(|so| so.order_id == order_id) {
            shop_order.billing_status = true;
            touched += 1;
        }
        Ok(touched)
    }

    async fn shop_orders_for_shop(&self, shop_id: Uuid) -> Result<Vec<ShopOrder>> {
        Ok(self.tables.read().shop_orders.values().filter(|so| so.shop_id == shop_id).cloned().collect())
    }

    async fn shop_order(&self, shop_id: Uuid, shop_order_id: Uuid) -> Result<Option<ShopOrder>> {
        Ok(self.tables.read().shop_orders.get(&shop_order_id).filter(|so| so.shop_id == shop_id).cloned())
    }

    async fn shop_orders_for_buyer(&self, shop_id: Uuid, buyer_id: Uuid) -> Result<Vec<ShopOrder>> {
        Ok(self.tables.read().shop_orders.values()
            .filter(|so| so.shop_id == shop_id && so.buyer_id == buyer_id)
            .cloned()
            .collect())
    }

    async fn set_shop_order_status(&self, shop_order_id: Uuid, status: ShopOrderStatus) -> Result<()> {
        let mut t = self.tables.write();
        let shop_order = t.shop_orders.get_mut(&shop_order_id).ok_or_else(|| AppError::not_found("Order"))?;
        shop_order.status = status;
        Ok(())
    }

    async fn shop_revenue(&self, shop_id: Uuid, period: Option<Period>) -> Result<Money> {
        let t = self.tables.read();
        let paid = t.shop_orders.values()
            .filter(|so| so.shop_id == shop_id)
            .filter(|so| period.map_or(true, |p| p.contains(so.created_at)))
            .map(|so| so.total_paid);
        Ok(Money::try_sum(paid)?)
    }

    async fn shop_customers(&self, shop_id: Uuid) -> Result<Vec<User>> {
        let t = self.tables.read();
        let buyers: BTreeSet<Uuid> = t.shop_orders.values()
            .filter(|so| so.shop_id == shop_id)
            .map(|so| so.buyer_id)
            .collect();
        Ok(buyers.iter().filter_map(|id| t.users.get(id).cloned()).collect())
    }

    async fn item_stats(&self, shop_id: Uuid) -> Result<Vec<ItemStats>> {
        let t = self.tables.read();
        let mut stats = Vec::new();
        for item in t.items.values().filter(|i| i.shop_id == shop_id) {
            let sold: Vec<&OrderLine> = t.order_lines.iter().filter(|l| l.item_id == item.id).collect();
            stats.push(ItemStats {
                item_id: item.id,
                name: item.name.clone(),
                quantity: sold.iter().map(|l| i64::from(l.quantity.value())).sum(),
                price: Money::try_sum(sold.iter().map(|l| l.line_total))?,
                wish_list_count: t.wishes.iter().filter(|(_, wished)| *wished == item.id).count() as i64,
            });
        }
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(stats)
    }

    async fn subscription_by_email(&self, email: &str) -> Result<Option<Subscription>> {
        Ok(self.tables.read().subscriptions.get(email).cloned())
    }

    async fn save_subscription(&self, subscription: &Subscription) -> Result<()> {
        self.tables.write().subscriptions.insert(subscription.email.clone(), subscription.clone());
        Ok(())
    }
}
