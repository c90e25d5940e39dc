//! # Portal Module
//!
//! Page services: one operation per portal page, each fetching through the
//! [`DataStore`], deriving with `govmobile_core`, and mapping failures the
//! way the pages present them (a redirect for a missing record, a generic
//! message otherwise, field errors for an incomplete form).
//!
//! Failures are logged here with `tracing::error!`; callers only render.

use crate::store::{
    Credentials, DataStore, DeviceFilter, OrderFilter, OrderSort, Session, StoreError,
};
use chrono::{DateTime, Utc};
use govmobile_core::catalog::{CatalogQuery, CatalogView, DeviceCard, DeviceSort};
use govmobile_core::device::SpecRow;
use govmobile_core::directory::{Directory, DirectoryError};
use govmobile_core::order::OrderDraft;
use govmobile_core::page::{Page, Redirect};
use govmobile_core::pricing::{Quote, eligible};
use govmobile_core::status::{OrderStats, StatusStep, StatusTab, status_steps};
use govmobile_core::validation::{FieldErrors, OrderForm};
use govmobile_core::{Device, Order, User, UserPatch};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

// =============================================================================
// MESSAGES
// =============================================================================

pub const LOAD_PROFILE_FAILED: &str = "Failed to load profile data";
pub const LOAD_DASHBOARD_FAILED: &str = "Failed to load dashboard data";
pub const LOAD_DEVICES_FAILED: &str = "Failed to load devices";
pub const LOAD_ORDERS_FAILED: &str = "Failed to load orders";
pub const PLACE_ORDER_FAILED: &str = "Failed to place order. Please try again.";
pub const PROFILE_UPDATED: &str = "Profile updated successfully";
pub const PROFILE_UPDATE_FAILED: &str = "Failed to update profile";
pub const LOGIN_FAILED: &str = "Sign-in failed";
pub const NOT_ELIGIBLE: &str = "This device is not available for your role level. Please contact your system administrator for more information.";
pub const UNAVAILABLE: &str = "Currently Unavailable";

/// Number of devices and orders on the dashboard.
pub const DASHBOARD_ITEMS: usize = 3;

// =============================================================================
// CLOCK
// =============================================================================

/// Source of "now" for order drafting.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always answers the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// How a page operation failed, in the terms the page presents.
#[derive(Debug, Error)]
pub enum PortalError {
    /// The session is missing or no longer valid.
    #[error("not authenticated")]
    Unauthenticated,

    /// A required record is missing; the page navigates away.
    #[error("{what} not found")]
    Missing { what: String, redirect: Redirect },

    /// The order form is incomplete. Nothing was sent to the store.
    #[error("{0}")]
    Invalid(FieldErrors),

    /// A query parameter did not parse.
    #[error("{0}")]
    BadQuery(#[from] govmobile_core::CoreError),

    /// The user's role may not order this device.
    #[error("{}", NOT_ELIGIBLE)]
    NotEligible,

    /// The device exists but cannot be ordered right now.
    #[error("{}", UNAVAILABLE)]
    Unavailable,

    /// The directory refused the sign-in.
    #[error("{0}")]
    Denied(#[from] DirectoryError),

    /// The backend failed; `message` is what the page shows.
    #[error("{message}")]
    Failed {
        message: &'static str,
        #[source]
        source: StoreError,
    },
}

/// Log a store failure and turn it into what the page shows.
fn failure(message: &'static str) -> impl FnOnce(StoreError) -> PortalError {
    move |source| match source {
        StoreError::Unauthenticated => PortalError::Unauthenticated,
        source => {
            tracing::error!(error = %source, "{message}");
            PortalError::Failed { message, source }
        }
    }
}

// =============================================================================
// VIEWS
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub user: User,
    /// The most expensive devices this user may order.
    pub recommended: Vec<DeviceCard>,
    pub recent_orders: Vec<Order>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogPage {
    #[serde(flatten)]
    pub view: CatalogView,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceDetailsView {
    pub device: Device,
    pub image: String,
    pub quote: Quote,
    pub eligible: bool,
    pub orderable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<&'static str>,
    pub headline_specs: Vec<SpecRow>,
    pub specifications: Vec<SpecRow>,
    /// Where the "Order" button leads, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Redirect>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderFormView {
    pub device: Device,
    pub quote: Quote,
    /// Pre-filled from the user's saved shipping address.
    pub form: OrderForm,
    /// Wire name -> label.
    pub order_types: BTreeMap<&'static str, &'static str>,
}

/// Body of an order placement.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrder {
    pub device_id: String,
    #[serde(flatten)]
    pub form: OrderForm,
}

#[derive(Debug, Clone, Serialize)]
pub struct Placed {
    pub order: Order,
    pub redirect: Redirect,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderRow {
    pub order: Order,
    pub device: Device,
    pub order_type_label: &'static str,
    pub steps: Vec<StatusStep>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmptyTab {
    pub title: String,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrdersView {
    pub stats: OrderStats,
    pub orders: Vec<OrderRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty: Option<EmptyTab>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub user: User,
    pub budget_used: u64,
}

/// The fields the profile page lets an employee edit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileEdit {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub job_title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdated {
    pub user: User,
    pub message: &'static str,
}

// =============================================================================
// PORTAL
// =============================================================================

/// The page services over one backend.
#[derive(Clone)]
pub struct Portal {
    store: Arc<dyn DataStore>,
    clock: Arc<dyn Clock>,
}

impl Portal {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn DataStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    // -------------------------------------------------------------------------
    // Authentication
    // -------------------------------------------------------------------------

    pub async fn login(&self, credentials: &Credentials) -> Result<Session, PortalError> {
        self.store
            .login(credentials)
            .await
            .map_err(failure(LOGIN_FAILED))
    }

    /// Sign in by name against the directory exports.
    ///
    /// The verified identity becomes an ordinary backend session; whatever the
    /// ERP knows about the employee is written to their profile.
    pub async fn directory_login(
        &self,
        directory: &Directory,
        name: &str,
    ) -> Result<Session, PortalError> {
        let identity = directory.authorize(name.trim()).inspect_err(|e| {
            tracing::warn!(name = %name.trim(), "directory sign-in refused: {e}");
        })?;

        let credentials =
            Credentials::trusted(identity.login_email(), identity.customer.name.clone());
        let session = self.login(&credentials).await?;

        let patch = identity.profile_patch();
        if !patch.is_empty() {
            self.store
                .update_current_user(&session, &patch)
                .await
                .map_err(failure(LOGIN_FAILED))?;
        }
        Ok(session)
    }

    pub async fn logout(&self, session: &Session) -> Result<(), PortalError> {
        self.store
            .logout(session)
            .await
            .map_err(failure("Failed to sign out"))
    }

    /// The current user, bootstrapped with profile defaults on first visit.
    async fn user_with_defaults(
        &self,
        session: &Session,
        message: &'static str,
    ) -> Result<User, PortalError> {
        let user = self
            .store
            .current_user(session)
            .await
            .map_err(failure(message))?;
        if !user.needs_profile_defaults() {
            return Ok(user);
        }

        tracing::info!(user_id = %user.id, "writing profile defaults");
        self.store
            .update_current_user(session, &UserPatch::profile_defaults())
            .await
            .map_err(failure(message))
    }

    async fn device(
        &self,
        session: &Session,
        id: &str,
        message: &'static str,
    ) -> Result<Device, PortalError> {
        let found = self
            .store
            .filter_devices(session, &DeviceFilter::by_id(id), None, Some(1))
            .await
            .map_err(failure(message))?;
        found.into_iter().next().ok_or_else(|| PortalError::Missing {
            what: format!("device '{id}'"),
            redirect: Redirect::to(Page::Devices),
        })
    }

    // -------------------------------------------------------------------------
    // Pages
    // -------------------------------------------------------------------------

    pub async fn dashboard(&self, session: &Session) -> Result<DashboardView, PortalError> {
        let user = self.user_with_defaults(session, LOAD_DASHBOARD_FAILED).await?;

        let recommended = match user.role_level {
            Some(role) => self
                .store
                .filter_devices(
                    session,
                    &DeviceFilter::eligible_for(role),
                    Some(DeviceSort::PriceDesc),
                    Some(DASHBOARD_ITEMS),
                )
                .await
                .map_err(failure(LOAD_DASHBOARD_FAILED))?,
            None => Vec::new(),
        };

        let recent_orders = self
            .store
            .filter_orders(
                session,
                &OrderFilter::for_user(&user.id),
                Some(OrderSort::Newest),
                Some(DASHBOARD_ITEMS),
            )
            .await
            .map_err(failure(LOAD_DASHBOARD_FAILED))?;

        Ok(DashboardView {
            recommended: recommended
                .iter()
                .map(|d| DeviceCard::new(d, &user))
                .collect(),
            recent_orders,
            user,
        })
    }

    pub async fn catalog(
        &self,
        session: &Session,
        query: &CatalogQuery,
    ) -> Result<CatalogPage, PortalError> {
        let user = self
            .store
            .current_user(session)
            .await
            .map_err(failure(LOAD_DEVICES_FAILED))?;
        let devices = self
            .store
            .list_devices(session)
            .await
            .map_err(failure(LOAD_DEVICES_FAILED))?;

        let view = CatalogView::build(devices, &user, query);
        tracing::debug!(shown = view.shown, total = view.total_eligible, "catalog built");
        Ok(CatalogPage {
            summary: view.summary(),
            view,
        })
    }

    pub async fn device_details(
        &self,
        session: &Session,
        id: &str,
    ) -> Result<DeviceDetailsView, PortalError> {
        let user = self
            .store
            .current_user(session)
            .await
            .map_err(failure(LOAD_DEVICES_FAILED))?;
        let device = self.device(session, id, LOAD_DEVICES_FAILED).await?;

        let is_eligible = eligible(&device, &user);
        let orderable = is_eligible && device.is_orderable();
        let notice = if !is_eligible {
            Some(NOT_ELIGIBLE)
        } else if !device.is_orderable() {
            Some(UNAVAILABLE)
        } else {
            None
        };

        Ok(DeviceDetailsView {
            image: device.image_or_placeholder(600),
            quote: Quote::for_device(&device, &user),
            eligible: is_eligible,
            orderable,
            notice,
            headline_specs: device.headline_specs(),
            specifications: device.spec_rows(),
            order: orderable.then(|| Redirect::order_device(&device.id)),
            device,
        })
    }

    /// Reject devices this user may not order right now.
    fn ensure_orderable(user: &User, device: &Device) -> Result<(), PortalError> {
        if !eligible(device, user) {
            tracing::warn!(
                user_id = %user.id,
                device_id = %device.id,
                "order refused: not eligible"
            );
            return Err(PortalError::NotEligible);
        }
        if !device.is_orderable() {
            tracing::warn!(
                device_id = %device.id,
                availability = %device.availability,
                "order refused: unavailable"
            );
            return Err(PortalError::Unavailable);
        }
        Ok(())
    }

    pub async fn order_form(
        &self,
        session: &Session,
        device_id: &str,
    ) -> Result<OrderFormView, PortalError> {
        let user = self
            .store
            .current_user(session)
            .await
            .map_err(failure(LOAD_DEVICES_FAILED))?;
        let device = self.device(session, device_id, LOAD_DEVICES_FAILED).await?;
        Self::ensure_orderable(&user, &device)?;

        let form = OrderForm {
            shipping_address: user.shipping_address.clone().unwrap_or_default(),
            ..OrderForm::default()
        };
        let order_types = [
            govmobile_core::OrderType::New,
            govmobile_core::OrderType::Upgrade,
            govmobile_core::OrderType::Replacement,
        ]
        .into_iter()
        .map(|t| (t.as_str(), t.label()))
        .collect();

        Ok(OrderFormView {
            quote: Quote::for_device(&device, &user),
            device,
            form,
            order_types,
        })
    }

    /// Validate, check, draft and create an order.
    ///
    /// An incomplete form is rejected before any store call.
    pub async fn place_order(
        &self,
        session: &Session,
        request: &PlaceOrder,
    ) -> Result<Placed, PortalError> {
        request.form.validate().map_err(PortalError::Invalid)?;

        let user = self
            .store
            .current_user(session)
            .await
            .map_err(failure(PLACE_ORDER_FAILED))?;
        let device = self
            .device(session, &request.device_id, PLACE_ORDER_FAILED)
            .await?;
        Self::ensure_orderable(&user, &device)?;

        let draft = OrderDraft::build(&user, &device, &request.form, self.clock.now())
            .map_err(PortalError::Invalid)?;
        let order = self
            .store
            .create_order(session, &draft)
            .await
            .map_err(failure(PLACE_ORDER_FAILED))?;

        tracing::info!(
            order_number = %order.order_number,
            device_id = %order.device_id,
            upgrade_fee = order.upgrade_fee,
            "order placed"
        );
        Ok(Placed {
            redirect: Redirect::order_success(&order.order_number),
            order,
        })
    }

    pub async fn orders(
        &self,
        session: &Session,
        tab: StatusTab,
    ) -> Result<OrdersView, PortalError> {
        let user = self
            .store
            .current_user(session)
            .await
            .map_err(failure(LOAD_ORDERS_FAILED))?;
        let orders = self
            .store
            .filter_orders(
                session,
                &OrderFilter::for_user(&user.id),
                Some(OrderSort::Newest),
                None,
            )
            .await
            .map_err(failure(LOAD_ORDERS_FAILED))?;
        let devices: BTreeMap<String, Device> = self
            .store
            .list_devices(session)
            .await
            .map_err(failure(LOAD_ORDERS_FAILED))?
            .into_iter()
            .map(|d| (d.id.clone(), d))
            .collect();

        let mut visible = Vec::with_capacity(orders.len());
        for order in orders {
            match devices.get(&order.device_id) {
                Some(device) => visible.push((order, device.clone())),
                None => tracing::warn!(
                    order_number = %order.order_number,
                    device_id = %order.device_id,
                    "hiding order whose device no longer exists"
                ),
            }
        }

        let all: Vec<Order> = visible.iter().map(|(o, _)| o.clone()).collect();
        let stats = OrderStats::from_orders(&all);

        let rows: Vec<OrderRow> = visible
            .into_iter()
            .filter(|(order, _)| tab.matches(order))
            .map(|(order, device)| OrderRow {
                order_type_label: order.order_type.label(),
                steps: status_steps(order.status),
                order,
                device,
            })
            .collect();

        let empty = rows.is_empty().then(|| {
            let (title, detail) = tab.empty_message();
            EmptyTab { title, detail }
        });

        Ok(OrdersView {
            stats,
            orders: rows,
            empty,
        })
    }

    pub async fn profile(&self, session: &Session) -> Result<ProfileView, PortalError> {
        let user = self.user_with_defaults(session, LOAD_PROFILE_FAILED).await?;
        Ok(ProfileView {
            budget_used: user.budget_allowance.saturating_sub(user.remaining_budget),
            user,
        })
    }

    pub async fn update_profile(
        &self,
        session: &Session,
        edit: &ProfileEdit,
    ) -> Result<ProfileUpdated, PortalError> {
        let patch = UserPatch::profile_edit(
            edit.full_name.trim(),
            edit.phone_number.trim(),
            edit.department.trim(),
            edit.job_title.trim(),
        );
        let user = self
            .store
            .update_current_user(session, &patch)
            .await
            .map_err(failure(PROFILE_UPDATE_FAILED))?;

        Ok(ProfileUpdated {
            user,
            message: PROFILE_UPDATED,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, Seed};
    use chrono::TimeZone;
    use govmobile_core::{Availability, OrderStatus, RoleLevel, ShippingAddress};

    fn seed() -> Seed {
        Seed {
            devices: vec![
                Device::new("pro", "Apple", "iPhone 15 Pro", 4200)
                    .with_eligibility([RoleLevel::Premium, RoleLevel::Executive]),
                Device::new("s24", "Samsung", "Galaxy S24", 3000)
                    .with_eligibility([RoleLevel::Standard, RoleLevel::Premium]),
                Device::new("a15", "Samsung", "Galaxy A15", 900).with_eligibility(RoleLevel::ALL),
                Device::new("fold", "Samsung", "Galaxy Z Fold", 7000)
                    .with_eligibility([RoleLevel::Executive]),
                Device::new("cat", "Cat", "S62", 2000)
                    .with_eligibility([RoleLevel::Standard])
                    .with_availability(Availability::OutOfStock),
            ],
            users: vec![
                User::new("u1", "dana@gov.il", "Dana")
                    .with_role(RoleLevel::Standard)
                    .with_budget(3000, 2500),
            ],
            orders: Vec::new(),
        }
    }

    async fn portal() -> (Portal, Session) {
        let store: Arc<dyn DataStore> = Arc::new(InMemoryStore::new(seed()));
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let portal = Portal::with_clock(store, Arc::new(FixedClock(now)));
        let session = portal
            .login(&Credentials::password("dana@gov.il", "pw"))
            .await
            .expect("seeded user signs in");
        (portal, session)
    }

    fn request(device_id: &str) -> PlaceOrder {
        PlaceOrder {
            device_id: device_id.to_string(),
            form: OrderForm {
                justification: "Field inspections".to_string(),
                shipping_address: ShippingAddress::new("Herzl 1", "", "Haifa", "31000"),
                ..OrderForm::default()
            },
        }
    }

    #[tokio::test]
    async fn dashboard_bootstraps_profile_and_recommends_eligible_devices() {
        let (portal, session) = portal().await;
        let view = portal.dashboard(&session).await.unwrap();
        // Seeded user had no phone number yet.
        assert_eq!(view.user.phone_number.as_deref(), Some("050-123-4567"));
        let ids: Vec<_> = view.recommended.iter().map(|c| c.device.id.as_str()).collect();
        assert_eq!(ids, vec!["s24", "cat", "a15"]);
    }

    #[tokio::test]
    async fn placing_an_order_redirects_to_success() {
        let (portal, session) = portal().await;
        let placed = portal.place_order(&session, &request("s24")).await.unwrap();
        assert_eq!(placed.order.order_number, "ORD-1709283600000");
        assert_eq!(placed.order.status, OrderStatus::Pending);
        assert_eq!(placed.order.total_cost, 3000);
        assert_eq!(placed.order.upgrade_fee, 500);
        assert_eq!(
            placed.redirect.url(),
            "/OrderSuccess?orderNumber=ORD-1709283600000"
        );

        let orders = portal.orders(&session, StatusTab::All).await.unwrap();
        assert_eq!(orders.stats.pending, 1);
    }

    #[tokio::test]
    async fn incomplete_form_returns_field_errors() {
        let (portal, session) = portal().await;
        let mut bad = request("s24");
        bad.form.justification = "  ".to_string();

        let result = portal.place_order(&session, &bad).await;
        let Err(PortalError::Invalid(errors)) = &result else {
            panic!("expected field errors, got {result:?}");
        };
        assert_eq!(
            errors.get("justification"),
            Some("Please provide a justification for this order")
        );
    }

    #[tokio::test]
    async fn ineligible_and_unavailable_devices_are_refused() {
        let (portal, session) = portal().await;
        assert!(matches!(
            portal.place_order(&session, &request("fold")).await,
            Err(PortalError::NotEligible)
        ));
        assert!(matches!(
            portal.place_order(&session, &request("cat")).await,
            Err(PortalError::Unavailable)
        ));
    }

    #[tokio::test]
    async fn unknown_device_redirects_to_listing() {
        let (portal, session) = portal().await;
        let result = portal.device_details(&session, "nope").await;
        let Err(PortalError::Missing { redirect, .. }) = &result else {
            panic!("expected missing device, got {result:?}");
        };
        assert_eq!(redirect.url(), "/Devices");
    }

    #[tokio::test]
    async fn details_explain_ineligibility() {
        let (portal, session) = portal().await;
        let view = portal.device_details(&session, "pro").await.unwrap();
        assert!(!view.eligible);
        assert_eq!(view.notice, Some(NOT_ELIGIBLE));
    }

    #[tokio::test]
    async fn order_form_prefills_saved_address() {
        let (portal, session) = portal().await;
        let saved = UserPatch {
            shipping_address: Some(ShippingAddress::new("Jaffa 5", "B", "Jerusalem", "94000")),
            ..UserPatch::default()
        };
        portal
            .store
            .update_current_user(&session, &saved)
            .await
            .unwrap();

        let view = portal.order_form(&session, "s24").await.unwrap();
        assert_eq!(view.form.shipping_address.city, "Jerusalem");
    }

    #[tokio::test]
    async fn profile_update_reports_success() {
        let (portal, session) = portal().await;
        let edit = ProfileEdit {
            full_name: "Dana Levi".to_string(),
            phone_number: "052-111-2222".to_string(),
            department: "Health".to_string(),
            job_title: "Nurse".to_string(),
        };
        let updated = portal.update_profile(&session, &edit).await.unwrap();
        assert_eq!(updated.message, PROFILE_UPDATED);
        assert_eq!(updated.user.full_name, "Dana Levi");
    }

    #[tokio::test]
    async fn stale_session_is_unauthenticated() {
        let (portal, session) = portal().await;
        portal.logout(&session).await.unwrap();
        assert!(matches!(
            portal.profile(&session).await,
            Err(PortalError::Unauthenticated)
        ));
    }
}
