//! # Device Module
//!
//! Catalog entries. Read-only from the portal's point of view: the platform's
//! data store owns their lifecycle.

use crate::CoreError;
use crate::user::RoleLevel;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Specification keys shown on the overview tab, in display order.
pub const HEADLINE_SPECS: [(&str, &str); 6] = [
    ("screen_size", "Screen Size"),
    ("storage", "Storage"),
    ("camera", "Camera"),
    ("battery", "Battery"),
    ("processor", "Processor"),
    ("operating_system", "OS"),
];

/// Shown in place of a missing headline specification.
pub const MISSING_SPEC: &str = "N/A";

// =============================================================================
// ENUMERATIONS
// =============================================================================

/// Stock level of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    Limited,
    OutOfStock,
}

impl Availability {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Availability::Available => "available",
            Availability::Limited => "limited",
            Availability::OutOfStock => "out_of_stock",
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of handset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCategory {
    Smartphone,
    BasicPhone,
    RuggedPhone,
}

impl DeviceCategory {
    pub const ALL: [DeviceCategory; 3] = [
        DeviceCategory::Smartphone,
        DeviceCategory::BasicPhone,
        DeviceCategory::RuggedPhone,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceCategory::Smartphone => "smartphone",
            DeviceCategory::BasicPhone => "basic_phone",
            DeviceCategory::RuggedPhone => "rugged_phone",
        }
    }
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| CoreError::unknown("device category", s))
    }
}

// =============================================================================
// DEVICE
// =============================================================================

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub brand: String,
    pub model: String,
    /// One-off price in whole currency units.
    pub price: u64,
    /// Monthly plan cost in whole currency units.
    #[serde(default)]
    pub monthly_cost: u64,
    pub availability: Availability,
    pub category: DeviceCategory,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    /// Role levels allowed to see and order this device.
    #[serde(default)]
    pub role_eligibility: BTreeSet<RoleLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Device {
    /// An available smartphone that nobody is eligible for yet.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        brand: impl Into<String>,
        model: impl Into<String>,
        price: u64,
    ) -> Self {
        Self {
            id: id.into(),
            brand: brand.into(),
            model: model.into(),
            price,
            monthly_cost: 0,
            availability: Availability::Available,
            category: DeviceCategory::Smartphone,
            specifications: BTreeMap::new(),
            pros: Vec::new(),
            cons: Vec::new(),
            features: Vec::new(),
            role_eligibility: BTreeSet::new(),
            image_url: None,
        }
    }

    #[must_use]
    pub fn with_eligibility(mut self, roles: impl IntoIterator<Item = RoleLevel>) -> Self {
        self.role_eligibility = roles.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: DeviceCategory) -> Self {
        self.category = category;
        self
    }

    #[must_use]
    pub fn with_spec(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.specifications.insert(key.into(), value.into());
        self
    }

    /// Check if a user holding `role` may see and order this device.
    ///
    /// A user without a role level is eligible for nothing.
    #[must_use]
    pub fn allows(&self, role: Option<RoleLevel>) -> bool {
        role.is_some_and(|r| self.role_eligibility.contains(&r))
    }

    /// Only fully available devices can be ordered.
    #[must_use]
    pub fn is_orderable(&self) -> bool {
        self.availability == Availability::Available
    }

    /// The device image, or a deterministic placeholder keyed by device id.
    #[must_use]
    pub fn image_or_placeholder(&self, size: u32) -> String {
        self.image_url
            .clone()
            .unwrap_or_else(|| format!("https://picsum.photos/seed/device{}/{size}/{size}", self.id))
    }

    /// The six headline specifications, `N/A` where missing.
    #[must_use]
    pub fn headline_specs(&self) -> Vec<SpecRow> {
        HEADLINE_SPECS
            .iter()
            .map(|(key, label)| SpecRow {
                label: (*label).to_string(),
                value: self
                    .specifications
                    .get(*key)
                    .cloned()
                    .unwrap_or_else(|| MISSING_SPEC.to_string()),
            })
            .collect()
    }

    /// Every specification, labelled for display.
    #[must_use]
    pub fn spec_rows(&self) -> Vec<SpecRow> {
        self.specifications
            .iter()
            .map(|(key, value)| SpecRow {
                label: spec_label(key),
                value: value.clone(),
            })
            .collect()
    }
}

/// One labelled specification line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecRow {
    pub label: String,
    pub value: String,
}

/// Only the first underscore becomes a space ("screen_size" -> "screen size").
fn spec_label(key: &str) -> String {
    key.replacen('_', " ", 1)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn allows_requires_role_membership() {
        let device = Device::new("d1", "Apple", "iPhone 15", 3000)
            .with_eligibility([RoleLevel::Premium, RoleLevel::Executive]);

        assert!(device.allows(Some(RoleLevel::Premium)));
        assert!(!device.allows(Some(RoleLevel::Basic)));
        assert!(!device.allows(None));
    }

    #[test]
    fn only_available_is_orderable() {
        let device = Device::new("d1", "Nokia", "105", 150);
        assert!(device.is_orderable());
        assert!(!device.clone().with_availability(Availability::Limited).is_orderable());
        assert!(!device.with_availability(Availability::OutOfStock).is_orderable());
    }

    #[test]
    fn placeholder_image_is_keyed_by_id() {
        let device = Device::new("abc", "Nokia", "105", 150);
        assert_eq!(
            device.image_or_placeholder(400),
            "https://picsum.photos/seed/deviceabc/400/400"
        );
    }

    #[test]
    fn headline_specs_fill_missing_values() {
        let device = Device::new("d1", "Apple", "iPhone 15", 3000).with_spec("storage", "128GB");
        let specs = device.headline_specs();

        assert_eq!(specs.len(), 6);
        assert_eq!(specs[0].value, MISSING_SPEC);
        assert_eq!(specs[1].label, "Storage");
        assert_eq!(specs[1].value, "128GB");
    }

    #[test]
    fn spec_labels_replace_first_underscore_only() {
        let device = Device::new("d1", "Apple", "iPhone 15", 3000)
            .with_spec("operating_system_version", "iOS 17");
        let rows = device.spec_rows();
        assert_eq!(rows[0].label, "operating system_version");
    }

    #[test]
    fn category_parses_wire_names() {
        assert_eq!("rugged_phone".parse::<DeviceCategory>(), Ok(DeviceCategory::RuggedPhone));
        assert!("tablet".parse::<DeviceCategory>().is_err());
    }

    #[test]
    fn device_deserializes_from_platform_json() {
        let json = r#"{
            "id": "d7",
            "brand": "Samsung",
            "model": "Galaxy S24",
            "price": 3200,
            "monthly_cost": 45,
            "availability": "limited",
            "category": "smartphone",
            "role_eligibility": ["executive", "premium"],
            "features": ["5G", "NFC"]
        }"#;
        let device: Device = serde_json::from_str(json).unwrap();

        assert_eq!(device.availability, Availability::Limited);
        assert_eq!(device.role_eligibility.len(), 2);
        assert!(device.pros.is_empty());
    }
}
