//! # Validation Module
//!
//! Field-level checks on the order form, run before anything is submitted.

use crate::order::{OrderType, ShippingAddress};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub const JUSTIFICATION_REQUIRED: &str = "Please provide a justification for this order";
pub const STREET_REQUIRED: &str = "Street address is required";
pub const CITY_REQUIRED: &str = "City is required";
pub const POSTAL_CODE_REQUIRED: &str = "Postal code is required";

/// Field name -> message, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("order form has {} invalid field(s)", .0.len())]
pub struct FieldErrors(pub BTreeMap<String, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// What the employee fills in on the order page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderForm {
    #[serde(default)]
    pub order_type: OrderType,
    #[serde(default)]
    pub justification: String,
    #[serde(default)]
    pub shipping_address: ShippingAddress,
}

impl OrderForm {
    /// Check every required field. Whitespace-only input counts as missing.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        let address = &self.shipping_address;

        if is_blank(&self.justification) {
            errors.insert("justification", JUSTIFICATION_REQUIRED);
        }
        if is_blank(&address.street) {
            errors.insert("street", STREET_REQUIRED);
        }
        if is_blank(&address.city) {
            errors.insert("city", CITY_REQUIRED);
        }
        if is_blank(&address.postal_code) {
            errors.insert("postal_code", POSTAL_CODE_REQUIRED);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

// =============================================================================
// TESTS
// =============================================================================
