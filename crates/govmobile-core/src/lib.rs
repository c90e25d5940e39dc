//! # GovMobile Core
//!
//! The business rules of the government mobile-device ordering portal.
//!
//! The hosted platform owns persistence and authentication; everything the
//! portal itself decides lives here:
//! - Which catalog entries an employee may see (role eligibility)
//! - What an order costs the employee (upgrade fee against remaining budget)
//! - How a catalog listing is searched, filtered and sorted
//! - How an order status projects onto the five-step tracking pipeline
//! - Whether an order form is complete, and what order record it produces
//! - Who may sign in through the ERP/CRM directory exports
//!
//! ## Constraints
//!
//! - No async, no network, no file I/O. The app crate does all of that.
//! - No wall clock. Operations that depend on time take `now` as a parameter.
//! - Amounts are whole currency units (`u64`), never floats.

use thiserror::Error;

pub mod catalog;
pub mod demo;
pub mod device;
pub mod directory;
pub mod order;
pub mod page;
pub mod pricing;
pub mod status;
pub mod user;
pub mod validation;

pub use catalog::{CatalogQuery, CatalogView, DeviceCard, DeviceSort, brands, eligible_devices};
pub use device::{Availability, Device, DeviceCategory, SpecRow};
pub use directory::{Directory, DirectoryError, Identity};
pub use order::{NewOrder, Order, OrderDraft, OrderStatus, OrderType, ShippingAddress};
pub use page::{Page, Redirect};
pub use pricing::{Quote, eligible, total_cost, upgrade_cost};
pub use status::{OrderStats, StatusStep, StatusTab, status_steps};
pub use user::{RoleLevel, User, UserPatch};
pub use validation::{FieldErrors, OrderForm};

// =============================================================================
// ERROR TYPE
// =============================================================================

/// Errors raised by the core when parsing user-supplied values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A string did not name any variant of an enumerated field.
    #[error("unknown {kind}: '{value}'")]
    UnknownVariant {
        /// Which enumeration was being parsed (e.g. "role level").
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}

impl CoreError {
    pub(crate) fn unknown(kind: &'static str, value: &str) -> Self {
        Self::UnknownVariant {
            kind,
            value: value.to_string(),
        }
    }
}
