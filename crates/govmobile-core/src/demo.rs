//! Demo fixtures: the code that opens a demo session and the user it acts as.

use crate::order::ORDER_NUMBER_PREFIX;
use crate::user::{RoleLevel, User};
use chrono::{NaiveDate, TimeZone, Utc};

/// The code a visitor types to get a demo session.
pub const DEMO_CODE: &str = "770";

/// Shown for any other input.
pub const INVALID_DEMO_CODE: &str = "Invalid demo number. Please enter \"770\".";

pub const DEMO_USER_ID: &str = "demo-user";
pub const DEMO_USER_EMAIL: &str = "demo.user@gov.il";

/// Order numbers fabricated for demo placements.
pub const DEMO_ORDER_PREFIX: &str = "ORD-DEMO-";

/// The fixture user every demo session acts as.
#[must_use]
pub fn demo_user() -> User {
    let mut user = User::new(DEMO_USER_ID, DEMO_USER_EMAIL, "Demo User")
        .with_role(RoleLevel::Premium)
        .with_budget(3000, 2500);
    user.phone_number = Some("050-770-0770".to_string());
    user.employee_id = Some("DEMO-001".to_string());
    user.department = Some("Demo Department".to_string());
    user.job_title = Some("Demo Analyst".to_string());
    user.current_device = Some("iPhone 15".to_string());
    user.device_assigned_date = NaiveDate::from_ymd_opt(2023, 5, 20);
    user.upgrade_eligible = true;
    user.created_date = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).single();
    user
}

/// Rewrite a live order number into its demo form (`ORD-123` -> `ORD-DEMO-123`).
#[must_use]
pub fn demo_order_number(order_number: &str) -> String {
    let suffix = order_number
        .strip_prefix(ORDER_NUMBER_PREFIX)
        .unwrap_or(order_number);
    format!("{DEMO_ORDER_PREFIX}{suffix}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn demo_user_matches_fixture() {
        let user = demo_user();
        assert_eq!(user.id, DEMO_USER_ID);
        assert_eq!(user.role_level, Some(RoleLevel::Premium));
        assert_eq!(user.remaining_budget, 2500);
        assert!(user.budget_consistent());
        assert!(!user.needs_profile_defaults());
    }

    #[test]
    fn demo_order_numbers() {
        assert_eq!(demo_order_number("ORD-1700000000000"), "ORD-DEMO-1700000000000");
        assert_eq!(demo_order_number("X"), "ORD-DEMO-X");
    }
}
