//! # Order Module
//!
//! Order records and the drafting of a new order from a validated form.
//!
//! An order is created exactly once, at placement, with status `pending`.
//! Every later transition happens in a back-office process the portal never
//! sees; the portal only reads the status back.

use crate::CoreError;
use crate::device::Device;
use crate::pricing::{total_cost, upgrade_cost};
use crate::user::User;
use crate::validation::{FieldErrors, OrderForm};
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Days between placement and the estimated delivery date.
pub const DELIVERY_ESTIMATE_DAYS: u64 = 7;

/// Prefix of every order number.
pub const ORDER_NUMBER_PREFIX: &str = "ORD-";

// =============================================================================
// ENUMERATIONS
// =============================================================================

/// Why the employee is ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    #[default]
    New,
    Upgrade,
    Replacement,
}

impl OrderType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OrderType::New => "new",
            OrderType::Upgrade => "upgrade",
            OrderType::Replacement => "replacement",
        }
    }

    /// Label used in the order-type picker.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            OrderType::New => "New Device",
            OrderType::Upgrade => "Upgrade Current Device",
            OrderType::Replacement => "Replace Damaged Device",
        }
    }
}

impl FromStr for OrderType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "new" => Ok(OrderType::New),
            "upgrade" => Ok(OrderType::Upgrade),
            "replacement" => Ok(OrderType::Replacement),
            other => Err(CoreError::unknown("order type", other)),
        }
    }
}

/// Order lifecycle state.
///
/// `Pending` through `Delivered` form a linear pipeline; `Cancelled` is
/// absorbing and sits outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Approved,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Approved,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Position in the linear pipeline, `None` for `Cancelled`.
    #[must_use]
    pub fn pipeline_index(self) -> Option<usize> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Approved => Some(1),
            OrderStatus::Processing => Some(2),
            OrderStatus::Shipped => Some(3),
            OrderStatus::Delivered => Some(4),
            OrderStatus::Cancelled => None,
        }
    }

    /// Approved, processing or shipped.
    #[must_use]
    pub fn is_in_progress(self) -> bool {
        matches!(
            self,
            OrderStatus::Approved | OrderStatus::Processing | OrderStatus::Shipped
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| CoreError::unknown("order status", s))
    }
}

// =============================================================================
// SHIPPING ADDRESS
// =============================================================================

/// Delivery address. `building` is optional, the rest is required at placement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub building: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
}

impl ShippingAddress {
    #[must_use]
    pub fn new(
        street: impl Into<String>,
        building: impl Into<String>,
        city: impl Into<String>,
        postal_code: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            building: building.into(),
            city: city.into(),
            postal_code: postal_code.into(),
        }
    }

    /// Single-line rendering: "street, building, city postal_code".
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut line = format!("{}, ", self.street);
        if !self.building.trim().is_empty() {
            line.push_str(&format!("{}, ", self.building));
        }
        line.push_str(&format!("{} {}", self.city, self.postal_code));
        line
    }
}

// =============================================================================
// ORDER RECORDS
// =============================================================================

/// An order before the platform has assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_number: String,
    pub user_id: String,
    pub device_id: String,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub total_cost: u64,
    pub upgrade_fee: u64,
    pub justification: String,
    pub shipping_address: ShippingAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub user_id: String,
    pub device_id: String,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub total_cost: u64,
    #[serde(default)]
    pub upgrade_fee: u64,
    #[serde(default)]
    pub justification: String,
    #[serde(default)]
    pub shipping_address: ShippingAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
}

impl Order {
    /// Materialize a new order with the id and timestamp the store assigned.
    #[must_use]
    pub fn from_new(id: impl Into<String>, new: NewOrder, created_date: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            order_number: new.order_number,
            user_id: new.user_id,
            device_id: new.device_id,
            order_type: new.order_type,
            status: new.status,
            total_cost: new.total_cost,
            upgrade_fee: new.upgrade_fee,
            justification: new.justification,
            shipping_address: new.shipping_address,
            estimated_delivery: new.estimated_delivery,
            tracking_number: new.tracking_number,
            created_date: Some(created_date),
        }
    }
}

// =============================================================================
// DRAFTING
// =============================================================================

/// Builds the order record for a placement.
pub struct OrderDraft;

impl OrderDraft {
    /// Validate `form` and draft the order `user` places for `device` at `now`.
    ///
    /// Returns the field errors without drafting anything if the form is
    /// incomplete.
    pub fn build(
        user: &User,
        device: &Device,
        form: &OrderForm,
        now: DateTime<Utc>,
    ) -> Result<NewOrder, FieldErrors> {
        form.validate()?;

        Ok(NewOrder {
            order_number: order_number(now),
            user_id: user.id.clone(),
            device_id: device.id.clone(),
            order_type: form.order_type,
            status: OrderStatus::Pending,
            total_cost: total_cost(device, user),
            upgrade_fee: upgrade_cost(device, user),
            justification: form.justification.clone(),
            shipping_address: form.shipping_address.clone(),
            estimated_delivery: Some(estimated_delivery(now)),
            tracking_number: None,
        })
    }
}

/// `ORD-<unix millis>`. Two placements in the same millisecond collide.
#[must_use]
pub fn order_number(now: DateTime<Utc>) -> String {
    format!("{ORDER_NUMBER_PREFIX}{}", now.timestamp_millis())
}

/// Placement date plus [`DELIVERY_ESTIMATE_DAYS`].
#[must_use]
pub fn estimated_delivery(now: DateTime<Utc>) -> NaiveDate {
    let today = now.date_naive();
    today
        .checked_add_days(Days::new(DELIVERY_ESTIMATE_DAYS))
        .unwrap_or(today)
}

// =============================================================================
// TESTS
// =============================================================================
