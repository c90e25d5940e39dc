//! Property tests for the pricing, catalog and status rules.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use govmobile_core::catalog::{CatalogQuery, CatalogView, DeviceSort, eligible_devices};
use govmobile_core::pricing::{Quote, eligible, upgrade_cost};
use govmobile_core::status::status_steps;
use govmobile_core::{Device, DeviceCategory, OrderStatus, RoleLevel, User};
use proptest::prelude::*;

// =============================================================================
// STRATEGIES
// =============================================================================

fn role() -> impl Strategy<Value = RoleLevel> {
    prop::sample::select(RoleLevel::ALL.to_vec())
}

fn category() -> impl Strategy<Value = DeviceCategory> {
    prop::sample::select(DeviceCategory::ALL.to_vec())
}

fn status() -> impl Strategy<Value = OrderStatus> {
    prop::sample::select(OrderStatus::ALL.to_vec())
}

fn device() -> impl Strategy<Value = Device> {
    (
        "[a-z0-9]{4}",
        prop::sample::select(vec!["Apple", "Samsung", "Nokia", "Cat", "Google"]),
        "[A-Za-z0-9 ]{1,12}",
        0u64..10_000,
        prop::collection::btree_set(role(), 0..=4),
        category(),
    )
        .prop_map(|(id, brand, model, price, roles, category)| {
            Device::new(id, brand, model, price)
                .with_eligibility(roles)
                .with_category(category)
        })
}

fn user() -> impl Strategy<Value = User> {
    (prop::option::of(role()), 0u64..10_000, 0u64..10_000).prop_map(|(role, a, b)| {
        let (remaining, allowance) = if a <= b { (a, b) } else { (b, a) };
        let mut user = User::new("u", "u@gov.il", "U").with_budget(allowance, remaining);
        user.role_level = role;
        user
    })
}

// =============================================================================
// PRICING
// =============================================================================

proptest! {
    #[test]
    fn upgrade_cost_never_exceeds_price(d in device(), u in user()) {
        let fee = upgrade_cost(&d, &u);
        prop_assert!(fee <= d.price);
    }

    #[test]
    fn sufficient_budget_means_no_fee(d in device(), extra in 0u64..5_000) {
        let u = User::new("u", "u@gov.il", "U").with_budget(d.price + extra, d.price + extra);
        prop_assert_eq!(upgrade_cost(&d, &u), 0);
    }

    #[test]
    fn quote_shares_sum_to_total(d in device(), u in user()) {
        let quote = Quote::for_device(&d, &u);
        prop_assert_eq!(quote.covered_by_budget + quote.upgrade_fee, quote.total_cost);
        prop_assert!(quote.covered_by_budget <= u.remaining_budget);
    }
}

// =============================================================================
// CATALOG
// =============================================================================

proptest! {
    #[test]
    fn no_ineligible_device_leaks(devices in prop::collection::vec(device(), 0..30), u in user()) {
        let listed = eligible_devices(devices, &u);
        for d in &listed {
            prop_assert!(eligible(d, &u));
            prop_assert!(u.role_level.is_some_and(|r| d.role_eligibility.contains(&r)));
        }
    }

    #[test]
    fn view_never_shows_more_than_eligible(
        devices in prop::collection::vec(device(), 0..30),
        u in user(),
        search in prop::option::of("[a-z]{0,3}"),
    ) {
        let query = CatalogQuery { search, ..CatalogQuery::default() };
        let view = CatalogView::build(devices, &u, &query);
        prop_assert!(view.shown <= view.total_eligible);
        prop_assert!(view.devices.iter().all(|card| eligible(&card.device, &u)));
    }

    #[test]
    fn price_sort_is_ascending(devices in prop::collection::vec(device(), 0..30)) {
        let query = CatalogQuery { sort: DeviceSort::Price, ..CatalogQuery::default() };
        let sorted = query.apply(&devices);
        prop_assert!(sorted.windows(2).all(|w| w[0].price <= w[1].price));
        prop_assert_eq!(sorted.len(), devices.len());
    }

    #[test]
    fn descending_sort_is_descending(devices in prop::collection::vec(device(), 0..30)) {
        let query = CatalogQuery { sort: DeviceSort::PriceDesc, ..CatalogQuery::default() };
        let sorted = query.apply(&devices);
        prop_assert!(sorted.windows(2).all(|w| w[0].price >= w[1].price));
    }
}

// =============================================================================
// STATUS
// =============================================================================

proptest! {
    #[test]
    fn always_five_steps(s in status()) {
        let steps = status_steps(s);
        prop_assert_eq!(steps.len(), 5);
        prop_assert!(steps.iter().filter(|step| step.current).count() <= 1);
    }

    #[test]
    fn completed_steps_form_a_prefix(s in status()) {
        let steps = status_steps(s);
        let completed: Vec<bool> = steps.iter().map(|step| step.completed).collect();
        let first_incomplete = completed.iter().position(|c| !c).unwrap_or(completed.len());
        prop_assert!(completed[first_incomplete..].iter().all(|c| !c));
    }
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[test]
fn scenario_budget_gap() {
    let device = Device::new("d1", "Apple", "iPhone 15 Pro", 3000);
    let user = User::new("u", "u@gov.il", "U").with_budget(3000, 2500);
    assert_eq!(upgrade_cost(&device, &user), 500);
}

#[test]
fn scenario_search_iphone() {
    let devices = vec![Device::new("d1", "Apple", "iPhone 15", 3000)];
    let query = CatalogQuery::parse(Some("iphone"), None, None, None).unwrap();
    assert_eq!(query.apply(&devices).len(), 1);
}
