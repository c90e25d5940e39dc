//! # Pricing Module
//!
//! Eligibility and cost computation for a device/user pair.
//!
//! The employee's remaining budget covers as much of the device price as it
//! can. Whatever is left is the upgrade fee, paid by the employee. The order
//! total is the device price itself; the fee is a share of it, not a
//! surcharge on top.

use crate::device::Device;
use crate::user::User;
use serde::{Deserialize, Serialize};

/// `user.role_level ∈ device.role_eligibility`.
#[must_use]
pub fn eligible(device: &Device, user: &User) -> bool {
    device.allows(user.role_level)
}

/// `max(0, device.price − user.remaining_budget)`.
#[must_use]
pub fn upgrade_cost(device: &Device, user: &User) -> u64 {
    device.price.saturating_sub(user.remaining_budget)
}

/// The order total: the device price.
#[must_use]
pub fn total_cost(device: &Device, _user: &User) -> u64 {
    device.price
}

/// The part of the price the remaining budget absorbs.
#[must_use]
pub fn covered_by_budget(device: &Device, user: &User) -> u64 {
    device.price.min(user.remaining_budget)
}

/// Full price breakdown shown next to a device and on the order form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub price: u64,
    pub monthly_cost: u64,
    pub remaining_budget: u64,
    pub covered_by_budget: u64,
    pub upgrade_fee: u64,
    pub total_cost: u64,
}

impl Quote {
    /// Price `device` for `user`.
    #[must_use]
    pub fn for_device(device: &Device, user: &User) -> Self {
        Self {
            price: device.price,
            monthly_cost: device.monthly_cost,
            remaining_budget: user.remaining_budget,
            covered_by_budget: covered_by_budget(device, user),
            upgrade_fee: upgrade_cost(device, user),
            total_cost: total_cost(device, user),
        }
    }

    /// True when the budget covers the whole price.
    #[must_use]
    pub fn fully_covered(&self) -> bool {
        self.upgrade_fee == 0
    }
}

// =============================================================================
// TESTS
// =============================================================================
