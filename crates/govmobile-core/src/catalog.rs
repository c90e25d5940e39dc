//! # Catalog Module
//!
//! Everything the device listing does between "fetch the full catalog" and
//! "render the cards":
//!
//! 1. Drop every device the user's role is not eligible for. Ineligible
//!    devices are removed from the listing, never shown disabled.
//! 2. Apply the search box (case-insensitive substring over model or brand).
//! 3. Apply the brand and category pickers.
//! 4. Sort by price ascending, price descending, or model name.

use crate::CoreError;
use crate::device::{Device, DeviceCategory};
use crate::pricing::{eligible, upgrade_cost};
use crate::user::User;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Picker value meaning "no filter".
pub const ALL: &str = "all";

// =============================================================================
// SORT KEY
// =============================================================================

/// Listing order. Wire names follow the platform's sort syntax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceSort {
    /// `price`: cheapest first.
    #[default]
    #[serde(rename = "price")]
    Price,
    /// `-price`: most expensive first.
    #[serde(rename = "-price")]
    PriceDesc,
    /// `model`: alphabetical by model name.
    #[serde(rename = "model")]
    Model,
}

impl DeviceSort {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceSort::Price => "price",
            DeviceSort::PriceDesc => "-price",
            DeviceSort::Model => "model",
        }
    }

    /// Compare two devices under this key.
    #[must_use]
    pub fn compare(self, a: &Device, b: &Device) -> Ordering {
        match self {
            DeviceSort::Price => a.price.cmp(&b.price),
            DeviceSort::PriceDesc => b.price.cmp(&a.price),
            DeviceSort::Model => a
                .model
                .to_lowercase()
                .cmp(&b.model.to_lowercase())
                .then_with(|| a.model.cmp(&b.model)),
        }
    }
}

impl fmt::Display for DeviceSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceSort {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "price" => Ok(DeviceSort::Price),
            "-price" => Ok(DeviceSort::PriceDesc),
            "model" => Ok(DeviceSort::Model),
            other => Err(CoreError::unknown("device sort key", other)),
        }
    }
}

// =============================================================================
// QUERY
// =============================================================================

/// The listing controls: search box, brand picker, category picker, sort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub brand: Option<String>,
    pub category: Option<DeviceCategory>,
    pub sort: DeviceSort,
}

impl CatalogQuery {
    /// Build a query from raw control values.
    ///
    /// Empty strings and `"all"` mean "no filter"; a missing sort means `price`.
    pub fn parse(
        search: Option<&str>,
        brand: Option<&str>,
        category: Option<&str>,
        sort: Option<&str>,
    ) -> Result<Self, CoreError> {
        let category = match picker(category) {
            Some(c) => Some(c.parse()?),
            None => None,
        };
        let sort = match sort.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => s.parse()?,
            None => DeviceSort::default(),
        };

        Ok(Self {
            search: search
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            brand: picker(brand).map(str::to_string),
            category,
            sort,
        })
    }

    /// Check a single device against search, brand and category.
    #[must_use]
    pub fn matches(&self, device: &Device) -> bool {
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let hit = device.model.to_lowercase().contains(&term)
                || device.brand.to_lowercase().contains(&term);
            if !hit {
                return false;
            }
        }
        if let Some(brand) = &self.brand {
            if device.brand != *brand {
                return false;
            }
        }
        if let Some(category) = self.category {
            if device.category != category {
                return false;
            }
        }
        true
    }

    /// Filter then sort. The sort is stable.
    #[must_use]
    pub fn apply<'a>(&self, devices: &'a [Device]) -> Vec<&'a Device> {
        let mut matched: Vec<&Device> = devices.iter().filter(|d| self.matches(d)).collect();
        matched.sort_by(|a, b| self.sort.compare(a, b));
        matched
    }
}

fn picker(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(ALL))
}

// =============================================================================
// LISTING HELPERS
// =============================================================================

/// Keep only the devices `user` is eligible for, in their original order.
#[must_use]
pub fn eligible_devices(devices: impl IntoIterator<Item = Device>, user: &User) -> Vec<Device> {
    devices.into_iter().filter(|d| eligible(d, user)).collect()
}

/// Distinct brands, sorted.
#[must_use]
pub fn brands(devices: &[Device]) -> Vec<String> {
    devices
        .iter()
        .map(|d| d.brand.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// =============================================================================
// VIEW
// =============================================================================

/// A device in the listing, with what it would cost this user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCard {
    pub device: Device,
    pub upgrade_cost: u64,
    pub image: String,
    /// First three features, as the card shows them.
    pub highlights: Vec<String>,
}

impl DeviceCard {
    #[must_use]
    pub fn new(device: &Device, user: &User) -> Self {
        Self {
            device: device.clone(),
            upgrade_cost: upgrade_cost(device, user),
            image: device.image_or_placeholder(400),
            highlights: device.features.iter().take(3).cloned().collect(),
        }
    }
}

/// The device listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogView {
    pub devices: Vec<DeviceCard>,
    /// Brands present among the eligible devices.
    pub brands: Vec<String>,
    pub shown: usize,
    pub total_eligible: usize,
}

impl CatalogView {
    /// Build the listing of `catalog` for `user` under `query`.
    #[must_use]
    pub fn build(catalog: Vec<Device>, user: &User, query: &CatalogQuery) -> Self {
        let eligible = eligible_devices(catalog, user);
        let devices: Vec<DeviceCard> = query
            .apply(&eligible)
            .into_iter()
            .map(|d| DeviceCard::new(d, user))
            .collect();

        Self {
            shown: devices.len(),
            total_eligible: eligible.len(),
            brands: brands(&eligible),
            devices,
        }
    }

    /// "Showing N of M eligible devices".
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Showing {} of {} eligible devices",
            self.shown, self.total_eligible
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
