//! # Status Module
//!
//! Read-only projection of an order's status onto the tracking pipeline.
//!
//! The pipeline is fixed: Order Placed → Approved → Processing → Shipped →
//! Delivered. A step is completed when it sits at or before the order's
//! position; it is current on an exact match. `cancelled` has no position, so
//! a cancelled order renders five incomplete steps.

use crate::order::{Order, OrderStatus};
use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The five pipeline states with their display labels.
pub const PIPELINE: [(OrderStatus, &str); 5] = [
    (OrderStatus::Pending, "Order Placed"),
    (OrderStatus::Approved, "Approved"),
    (OrderStatus::Processing, "Processing"),
    (OrderStatus::Shipped, "Shipped"),
    (OrderStatus::Delivered, "Delivered"),
];

/// One step of the tracking widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusStep {
    pub status: OrderStatus,
    pub label: String,
    pub completed: bool,
    pub current: bool,
}

/// Project `status` onto the pipeline. Always five steps.
#[must_use]
pub fn status_steps(status: OrderStatus) -> Vec<StatusStep> {
    let position = status.pipeline_index();

    PIPELINE
        .iter()
        .enumerate()
        .map(|(index, (step, label))| StatusStep {
            status: *step,
            label: (*label).to_string(),
            completed: position.is_some_and(|p| index <= p),
            current: position == Some(index),
        })
        .collect()
}

// =============================================================================
// STATS
// =============================================================================

/// Counters shown above the order list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStats {
    pub total: usize,
    pub pending: usize,
    /// Approved, processing or shipped.
    pub in_progress: usize,
    pub delivered: usize,
}

impl OrderStats {
    #[must_use]
    pub fn from_orders(orders: &[Order]) -> Self {
        orders.iter().fold(Self::default(), |mut stats, order| {
            stats.total += 1;
            match order.status {
                OrderStatus::Pending => stats.pending += 1,
                OrderStatus::Delivered => stats.delivered += 1,
                s if s.is_in_progress() => stats.in_progress += 1,
                _ => {}
            }
            stats
        })
    }
}

// =============================================================================
// TABS
// =============================================================================

/// The order-list tab: everything, or one status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusTab {
    #[default]
    All,
    Only(OrderStatus),
}

impl StatusTab {
    #[must_use]
    pub fn matches(self, order: &Order) -> bool {
        match self {
            StatusTab::All => true,
            StatusTab::Only(status) => order.status == status,
        }
    }

    /// Heading and explanation for an empty tab.
    #[must_use]
    pub fn empty_message(self) -> (String, String) {
        match self {
            StatusTab::All => (
                "No orders found".to_string(),
                "You haven't placed any orders yet".to_string(),
            ),
            StatusTab::Only(status) => (
                format!("No {status} orders"),
                format!("You don't have any {status} orders"),
            ),
        }
    }
}

impl FromStr for StatusTab {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == crate::catalog::ALL {
            Ok(StatusTab::All)
        } else {
            s.parse().map(StatusTab::Only)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
