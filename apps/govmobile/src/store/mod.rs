//! # Store Module
//!
//! The data-access contract the portal needs from its backend.
//!
//! The hosted platform owns authentication and persistence for the three
//! record kinds (User, Device, Order). The portal only ever talks to it
//! through [`DataStore`], which has three implementations:
//!
//! - [`memory::InMemoryStore`]: a seeded fake, used by tests and local runs
//! - [`platform::PlatformStore`]: the hosted platform's REST surface
//! - [`demo::DemoStore`]: fixture user over any store, writes never persist
//!
//! Every operation takes the caller's [`Session`]. There are no retries and
//! no idempotency keys; a duplicated `create_order` creates two orders.

use async_trait::async_trait;
use govmobile_core::catalog::DeviceSort;
use govmobile_core::{
    Availability, Device, DeviceCategory, NewOrder, Order, OrderStatus, RoleLevel, User,
    UserPatch,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod demo;
pub mod memory;
pub mod platform;
pub mod seed;
pub mod sessions;

pub use demo::DemoStore;
pub use memory::InMemoryStore;
pub use platform::PlatformStore;
pub use seed::{Seed, SeedIssue};
pub use sessions::{DEFAULT_SESSION_TTL, MAX_SESSIONS};

// =============================================================================
// ERRORS
// =============================================================================

/// Errors from a data-access backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Missing, expired or unknown session.
    #[error("not authenticated")]
    Unauthenticated,

    /// A record the call addressed does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The backend refused the input.
    #[error("invalid request: {0}")]
    Invalid(String),

    /// The backend cannot perform this operation at all.
    #[error("not supported by the {backend} backend: {operation}")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },

    /// The platform answered with an unexpected status.
    #[error("platform returned HTTP {status}: {message}")]
    Remote { status: u16, message: String },

    /// The platform could not be reached.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A body could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A seed file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// SESSION & CREDENTIALS
// =============================================================================

/// An authenticated session, identified by its bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Sessions opened by [`DemoStore`] carry the `demo.` prefix.
    pub fn is_demo(&self) -> bool {
        self.token.starts_with(demo::DEMO_TOKEN_PREFIX)
    }
}

/// What a caller presents to `login`.
///
/// `trusted` credentials were already verified by the portal itself (the
/// ERP/CRM directory sign-in) and carry no secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip)]
    pub trusted: bool,
}

impl Credentials {
    pub fn password(email: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            secret: Some(secret.into()),
            full_name: None,
            trusted: false,
        }
    }

    pub fn trusted(email: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            secret: None,
            full_name: Some(full_name.into()),
            trusted: true,
        }
    }
}

// =============================================================================
// FILTERS & SORT KEYS
// =============================================================================

/// Predicate fields for `filter_devices`. Absent fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<DeviceCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<Availability>,
    /// Only devices this role may order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<RoleLevel>,
}

impl DeviceFilter {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn eligible_for(role: RoleLevel) -> Self {
        Self {
            role: Some(role),
            ..Self::default()
        }
    }

    pub fn matches(&self, device: &Device) -> bool {
        self.id.as_ref().is_none_or(|id| device.id == *id)
            && self.brand.as_ref().is_none_or(|b| device.brand == *b)
            && self.category.is_none_or(|c| device.category == c)
            && self.availability.is_none_or(|a| device.availability == a)
            && self.role.is_none_or(|r| device.allows(Some(r)))
    }
}

/// Predicate fields for `filter_orders`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, order: &Order) -> bool {
        self.id.as_ref().is_none_or(|v| order.id == *v)
            && self.user_id.as_ref().is_none_or(|v| order.user_id == *v)
            && self.device_id.as_ref().is_none_or(|v| order.device_id == *v)
            && self.order_number.as_ref().is_none_or(|v| order.order_number == *v)
            && self.status.is_none_or(|s| order.status == s)
    }
}

/// Sort keys for orders, in the platform's sort syntax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSort {
    /// `created_date`: oldest first.
    #[serde(rename = "created_date")]
    Oldest,
    /// `-created_date`: newest first.
    #[default]
    #[serde(rename = "-created_date")]
    Newest,
}

impl OrderSort {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderSort::Oldest => "created_date",
            OrderSort::Newest => "-created_date",
        }
    }
}

// =============================================================================
// SHARED QUERY EVALUATION
// =============================================================================

/// Filter, sort (stable) and truncate a device list the way the platform does.
pub fn query_devices(
    devices: impl IntoIterator<Item = Device>,
    filter: &DeviceFilter,
    sort: Option<DeviceSort>,
    limit: Option<usize>,
) -> Vec<Device> {
    let mut matched: Vec<Device> = devices.into_iter().filter(|d| filter.matches(d)).collect();
    if let Some(sort) = sort {
        matched.sort_by(|a, b| sort.compare(a, b));
    }
    if let Some(limit) = limit {
        matched.truncate(limit);
    }
    matched
}

/// Filter, sort and truncate orders. Ties on `created_date` keep insertion order
/// (reversed for newest-first), so the newest insertion wins.
pub fn query_orders(
    orders: impl IntoIterator<Item = Order>,
    filter: &OrderFilter,
    sort: Option<OrderSort>,
    limit: Option<usize>,
) -> Vec<Order> {
    let mut matched: Vec<(usize, Order)> = orders
        .into_iter()
        .filter(|o| filter.matches(o))
        .enumerate()
        .collect();

    if let Some(sort) = sort {
        matched.sort_by(|(ia, a), (ib, b)| {
            let oldest_first = a.created_date.cmp(&b.created_date).then(ia.cmp(ib));
            match sort {
                OrderSort::Oldest => oldest_first,
                OrderSort::Newest => oldest_first.reverse(),
            }
        });
    }

    let mut matched: Vec<Order> = matched.into_iter().map(|(_, o)| o).collect();
    if let Some(limit) = limit {
        matched.truncate(limit);
    }
    matched
}

// =============================================================================
// THE CONTRACT
// =============================================================================

/// The operations the portal needs from its backend.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    async fn login(&self, credentials: &Credentials) -> Result<Session, StoreError>;

    async fn logout(&self, session: &Session) -> Result<(), StoreError>;

    async fn current_user(&self, session: &Session) -> Result<User, StoreError>;

    /// Apply `patch` to the session's user. No optimistic locking.
    async fn update_current_user(
        &self,
        session: &Session,
        patch: &UserPatch,
    ) -> Result<User, StoreError>;

    /// The full catalog, no pagination.
    async fn list_devices(&self, session: &Session) -> Result<Vec<Device>, StoreError>;

    async fn filter_devices(
        &self,
        session: &Session,
        filter: &DeviceFilter,
        sort: Option<DeviceSort>,
        limit: Option<usize>,
    ) -> Result<Vec<Device>, StoreError>;

    async fn list_orders(&self, session: &Session) -> Result<Vec<Order>, StoreError>;

    async fn filter_orders(
        &self,
        session: &Session,
        filter: &OrderFilter,
        sort: Option<OrderSort>,
        limit: Option<usize>,
    ) -> Result<Vec<Order>, StoreError>;

    async fn create_order(&self, session: &Session, order: &NewOrder)
    -> Result<Order, StoreError>;
}

// =============================================================================
// TESTS
// =============================================================================
