//! # User Module
//!
//! The employee record and its entitlement attributes.
//!
//! The platform creates a user on first authentication with nothing but an
//! identity. Entitlements (role level, budget) are filled in afterwards,
//! either by the profile bootstrap or by an administrator.

use crate::CoreError;
use crate::order::ShippingAddress;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// ROLE LEVEL
// =============================================================================

/// Tier governing which devices a user may order.
///
/// Ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleLevel {
    Basic,
    Standard,
    Premium,
    Executive,
}

impl RoleLevel {
    /// Every role level, least privileged first.
    pub const ALL: [RoleLevel; 4] = [
        RoleLevel::Basic,
        RoleLevel::Standard,
        RoleLevel::Premium,
        RoleLevel::Executive,
    ];

    /// Wire name of the role level.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RoleLevel::Basic => "basic",
            RoleLevel::Standard => "standard",
            RoleLevel::Premium => "premium",
            RoleLevel::Executive => "executive",
        }
    }
}

impl fmt::Display for RoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoleLevel::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::unknown("role level", s))
    }
}

// =============================================================================
// USER
// =============================================================================

/// An employee as stored by the platform.
///
/// Every entitlement field is optional or defaulted: a freshly authenticated
/// user has only `id`, `email` and possibly `full_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_level: Option<RoleLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_assigned_date: Option<NaiveDate>,
    #[serde(default)]
    pub upgrade_eligible: bool,
    #[serde(default)]
    pub budget_allowance: u64,
    #[serde(default)]
    pub remaining_budget: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
}

impl User {
    /// A bare user, as the platform creates it on first sign-in.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            full_name: full_name.into(),
            phone_number: None,
            employee_id: None,
            department: None,
            job_title: None,
            role_level: None,
            current_device: None,
            device_assigned_date: None,
            upgrade_eligible: false,
            budget_allowance: 0,
            remaining_budget: 0,
            shipping_address: None,
            created_date: None,
        }
    }

    /// Set the role level.
    #[must_use]
    pub fn with_role(mut self, role: RoleLevel) -> Self {
        self.role_level = Some(role);
        self
    }

    /// Set allowance and remaining budget.
    #[must_use]
    pub fn with_budget(mut self, allowance: u64, remaining: u64) -> Self {
        self.budget_allowance = allowance;
        self.remaining_budget = remaining;
        self
    }

    /// `remaining_budget <= budget_allowance`.
    #[must_use]
    pub fn budget_consistent(&self) -> bool {
        self.remaining_budget <= self.budget_allowance
    }

    /// A user without a phone number has never been through the profile bootstrap.
    #[must_use]
    pub fn needs_profile_defaults(&self) -> bool {
        self.phone_number
            .as_deref()
            .map(|p| p.trim().is_empty())
            .unwrap_or(true)
    }

    /// Return a copy with every field present in `patch` overwritten.
    #[must_use]
    pub fn merged(&self, patch: &UserPatch) -> Self {
        let mut user = self.clone();
        user.apply(patch);
        user
    }

    /// Overwrite every field present in `patch`.
    pub fn apply(&mut self, patch: &UserPatch) {
        if let Some(v) = &patch.full_name {
            self.full_name.clone_from(v);
        }
        if let Some(v) = &patch.phone_number {
            self.phone_number = Some(v.clone());
        }
        if let Some(v) = &patch.employee_id {
            self.employee_id = Some(v.clone());
        }
        if let Some(v) = &patch.department {
            self.department = Some(v.clone());
        }
        if let Some(v) = &patch.job_title {
            self.job_title = Some(v.clone());
        }
        if let Some(v) = patch.role_level {
            self.role_level = Some(v);
        }
        if let Some(v) = &patch.current_device {
            self.current_device = Some(v.clone());
        }
        if let Some(v) = patch.device_assigned_date {
            self.device_assigned_date = Some(v);
        }
        if let Some(v) = patch.upgrade_eligible {
            self.upgrade_eligible = v;
        }
        if let Some(v) = patch.budget_allowance {
            self.budget_allowance = v;
        }
        if let Some(v) = patch.remaining_budget {
            self.remaining_budget = v;
        }
        if let Some(v) = &patch.shipping_address {
            self.shipping_address = Some(v.clone());
        }
    }
}

// =============================================================================
// USER PATCH
// =============================================================================

/// Partial update of the current user. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_level: Option<RoleLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_assigned_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrade_eligible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_allowance: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_budget: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<ShippingAddress>,
}

impl UserPatch {
    /// Entitlements written for a user who has never completed a profile.
    #[must_use]
    pub fn profile_defaults() -> Self {
        Self {
            phone_number: Some("050-123-4567".to_string()),
            employee_id: Some("EMP001".to_string()),
            department: Some("Ministry of Finance".to_string()),
            job_title: Some("Financial Analyst".to_string()),
            role_level: Some(RoleLevel::Standard),
            current_device: Some("iPhone 13".to_string()),
            device_assigned_date: NaiveDate::from_ymd_opt(2023, 1, 15),
            upgrade_eligible: Some(true),
            budget_allowance: Some(2000),
            remaining_budget: Some(1500),
            ..Self::default()
        }
    }

    /// The fields an employee may edit on their own profile page.
    #[must_use]
    pub fn profile_edit(
        full_name: impl Into<String>,
        phone_number: impl Into<String>,
        department: impl Into<String>,
        job_title: impl Into<String>,
    ) -> Self {
        Self {
            full_name: Some(full_name.into()),
            phone_number: Some(phone_number.into()),
            department: Some(department.into()),
            job_title: Some(job_title.into()),
            ..Self::default()
        }
    }

    /// Check if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check if the patch touches any entitlement field.
    #[must_use]
    pub fn touches_entitlements(&self) -> bool {
        self.role_level.is_some()
            || self.upgrade_eligible.is_some()
            || self.budget_allowance.is_some()
            || self.remaining_budget.is_some()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn role_level_parses_case_insensitively() {
        assert_eq!("Premium".parse::<RoleLevel>(), Ok(RoleLevel::Premium));
        assert_eq!(" basic ".parse::<RoleLevel>(), Ok(RoleLevel::Basic));
        assert!("vip".parse::<RoleLevel>().is_err());
    }

    #[test]
    fn role_levels_are_ordered() {
        assert!(RoleLevel::Basic < RoleLevel::Standard);
        assert!(RoleLevel::Premium < RoleLevel::Executive);
    }

    #[test]
    fn role_level_wire_format() {
        let json = serde_json::to_string(&RoleLevel::Executive).unwrap();
        assert_eq!(json, "\"executive\"");
    }

    #[test]
    fn fresh_user_needs_defaults() {
        let user = User::new("u1", "a@gov.il", "Alice");
        assert!(user.needs_profile_defaults());

        let user = user.merged(&UserPatch::profile_defaults());
        assert!(!user.needs_profile_defaults());
        assert_eq!(user.role_level, Some(RoleLevel::Standard));
        assert_eq!(user.budget_allowance, 2000);
        assert_eq!(user.remaining_budget, 1500);
        assert!(user.budget_consistent());
    }

    #[test]
    fn profile_edit_leaves_entitlements_alone() {
        let user = User::new("u1", "a@gov.il", "Alice")
            .with_role(RoleLevel::Premium)
            .with_budget(3000, 2500);

        let patch = UserPatch::profile_edit("Alice B", "050-000-0000", "Health", "Nurse");
        assert!(!patch.touches_entitlements());

        let updated = user.merged(&patch);
        assert_eq!(updated.full_name, "Alice B");
        assert_eq!(updated.department.as_deref(), Some("Health"));
        assert_eq!(updated.role_level, Some(RoleLevel::Premium));
        assert_eq!(updated.remaining_budget, 2500);
    }

    #[test]
    fn budget_consistency() {
        let ok = User::new("u", "", "").with_budget(2000, 2000);
        let broken = User::new("u", "", "").with_budget(2000, 2001);
        assert!(ok.budget_consistent());
        assert!(!broken.budget_consistent());
    }

    #[test]
    fn empty_patch_detection() {
        assert!(UserPatch::default().is_empty());
        assert!(!UserPatch::profile_defaults().is_empty());
    }

    #[test]
    fn user_deserializes_with_missing_entitlements() {
        let json = r#"{"id":"u9","email":"x@gov.il","full_name":"X"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.remaining_budget, 0);
        assert_eq!(user.role_level, None);
    }
}
