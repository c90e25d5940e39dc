//! # Page Module
//!
//! The portal's route table, the redirects page services hand back, and the
//! static navigation and contact content.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

// =============================================================================
// PAGES
// =============================================================================

/// Every page the portal can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Page {
    Dashboard,
    Devices,
    DeviceDetails,
    OrderDevice,
    Orders,
    Profile,
    Home,
    Contact,
    OrderSuccess,
}

impl Page {
    /// Routable pages, in route-table order. The first is the fallback.
    pub const ROUTABLE: [Page; 8] = [
        Page::Dashboard,
        Page::Devices,
        Page::DeviceDetails,
        Page::OrderDevice,
        Page::Orders,
        Page::Profile,
        Page::Home,
        Page::Contact,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Devices => "Devices",
            Page::DeviceDetails => "DeviceDetails",
            Page::OrderDevice => "OrderDevice",
            Page::Orders => "Orders",
            Page::Profile => "Profile",
            Page::Home => "Home",
            Page::Contact => "Contact",
            Page::OrderSuccess => "OrderSuccess",
        }
    }

    /// `/Name`.
    #[must_use]
    pub fn url(self) -> String {
        format!("/{}", self.name())
    }

    /// Resolve the page a location path shows.
    ///
    /// Uses the last path segment, ignoring a trailing slash and any query
    /// string, matched case-insensitively. Unknown paths show the dashboard.
    #[must_use]
    pub fn from_path(path: &str) -> Page {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = path.strip_suffix('/').unwrap_or(path);
        let last = path.rsplit('/').next().unwrap_or_default();

        Page::ROUTABLE
            .into_iter()
            .find(|page| page.name().eq_ignore_ascii_case(last))
            .unwrap_or(Page::Dashboard)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// REDIRECT
// =============================================================================

/// A navigation target: page plus query parameters.
///
/// Serializes as its URL (`/OrderSuccess?orderNumber=ORD-1`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub page: Page,
    pub query: Vec<(String, String)>,
}

impl Redirect {
    #[must_use]
    pub fn to(page: Page) -> Self {
        Self {
            page,
            query: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// After a successful placement.
    #[must_use]
    pub fn order_success(order_number: &str) -> Self {
        Self::to(Page::OrderSuccess).with("orderNumber", order_number)
    }

    #[must_use]
    pub fn device_details(device_id: &str) -> Self {
        Self::to(Page::DeviceDetails).with("id", device_id)
    }

    #[must_use]
    pub fn order_device(device_id: &str) -> Self {
        Self::to(Page::OrderDevice).with("deviceId", device_id)
    }

    #[must_use]
    pub fn url(&self) -> String {
        let mut url = self.page.url();
        for (i, (key, value)) in self.query.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(&format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            ));
        }
        url
    }
}

impl Serialize for Redirect {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.url())
    }
}

// =============================================================================
// NAVIGATION & CONTACT
// =============================================================================

/// One entry of the header navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub name: &'static str,
    pub page: Page,
}

/// Header navigation, in display order.
pub const NAVIGATION: [NavItem; 6] = [
    NavItem { name: "Home", page: Page::Home },
    NavItem { name: "Dashboard", page: Page::Dashboard },
    NavItem { name: "Devices", page: Page::Devices },
    NavItem { name: "My Orders", page: Page::Orders },
    NavItem { name: "Profile", page: Page::Profile },
    NavItem { name: "Contact", page: Page::Contact },
];

/// The support desk's contact card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContactInfo {
    pub office: &'static str,
    pub address: &'static str,
    pub phone: &'static str,
    pub email: &'static str,
    pub hours: [&'static str; 3],
}

pub const CONTACT: ContactInfo = ContactInfo {
    office: "Government Mobile Services HQ",
    address: "Kaplan St 1, Kiryat HaMemshala, Jerusalem, 91130",
    phone: "(02) 123-4567",
    email: "support@gov-mobile.gov.il",
    hours: [
        "Sunday - Thursday: 8:00 AM - 5:00 PM",
        "Friday: 8:00 AM - 12:00 PM",
        "Saturday: Closed",
    ],
};

// =============================================================================
// TESTS
// =============================================================================
