//! ShopOrder Aggregate: the part of an order that one shop has to fulfil

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::value_objects::Money;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShopOrderStatus {
    #[default]
    New,
    #[serde(rename = "In Process")]
    InProcess,
    Sent,
}

impl ShopOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::New => "New", Self::InProcess => "In Process", Self::Sent => "Sent" }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value { "New" => Some(Self::New), "In Process" => Some(Self::InProcess), "Sent" => Some(Self::Sent), _ => None }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ShopOrder {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub order_id: Uuid,
    #[serde(rename = "user_id")]
    pub buyer_id: Uuid,
    pub total_paid: Money,
    pub billing_status: bool,
    pub status: ShopOrderStatus,
    pub created_at: DateTime<Utc>,
}

impl ShopOrder {
    pub fn open(shop_id: Uuid, order_id: Uuid, buyer_id: Uuid, total_paid: Money, billing_status: bool, created_at: DateTime<Utc>) -> Self {
        Self { id: Uuid::now_v7(), shop_id, order_id, buyer_id, total_paid, billing_status, status: ShopOrderStatus::New, created_at }
    }
}
