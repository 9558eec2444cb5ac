//! Order domain types.
//!
//! Orders are write-once snapshots: they are created at checkout and never
//! mutated by this system afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wildthread_core::{OrderStatus, Price, UserId};

use crate::models::CartItem;

/// An order snapshot submitted at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// User who placed the order.
    pub user_id: UserId,
    /// The cart contents at the time of checkout.
    pub items: Vec<CartItem>,
    /// Sum of line totals at the time of checkout.
    pub total: Price,
    /// Lifecycle status; always `Pending` when written here.
    pub status: OrderStatus,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Snapshot a pending order from the given cart contents.
    #[must_use]
    pub fn pending(user_id: UserId, items: Vec<CartItem>) -> Self {
        let total = items.iter().map(CartItem::line_total).sum();
        Self {
            user_id,
            items,
            total,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        }
    }
}
