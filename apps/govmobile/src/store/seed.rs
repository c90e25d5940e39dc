//! Seed documents for the in-memory backend, and their consistency checks.

use super::StoreError;
use govmobile_core::{Device, Order, User};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// `{ "devices": [...], "users": [...], "orders": [...] }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub orders: Vec<Order>,
}

impl Seed {
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Every consistency problem in the document, in discovery order.
    pub fn check(&self) -> Vec<SeedIssue> {
        let mut issues = Vec::new();

        let mut device_ids = BTreeSet::new();
        for device in &self.devices {
            if !device_ids.insert(device.id.as_str()) {
                issues.push(SeedIssue::DuplicateId {
                    kind: "device",
                    id: device.id.clone(),
                });
            }
            if device.role_eligibility.is_empty() {
                issues.push(SeedIssue::NoEligibleRole {
                    device_id: device.id.clone(),
                });
            }
        }

        let mut user_ids = BTreeSet::new();
        for user in &self.users {
            if !user_ids.insert(user.id.as_str()) {
                issues.push(SeedIssue::DuplicateId {
                    kind: "user",
                    id: user.id.clone(),
                });
            }
            if !user.budget_consistent() {
                issues.push(SeedIssue::BudgetExceedsAllowance {
                    user_id: user.id.clone(),
                    remaining: user.remaining_budget,
                    allowance: user.budget_allowance,
                });
            }
        }

        let mut order_ids = BTreeSet::new();
        for order in &self.orders {
            if !order_ids.insert(order.id.as_str()) {
                issues.push(SeedIssue::DuplicateId {
                    kind: "order",
                    id: order.id.clone(),
                });
            }
            if !user_ids.contains(order.user_id.as_str()) {
                issues.push(SeedIssue::DanglingReference {
                    order_id: order.id.clone(),
                    field: "user_id",
                    target: order.user_id.clone(),
                });
            }
            if !device_ids.contains(order.device_id.as_str()) {
                issues.push(SeedIssue::DanglingReference {
                    order_id: order.id.clone(),
                    field: "device_id",
                    target: order.device_id.clone(),
                });
            }
        }

        issues
    }
}

/// One problem found by [`Seed::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedIssue {
    DuplicateId {
        kind: &'static str,
        id: String,
    },
    BudgetExceedsAllowance {
        user_id: String,
        remaining: u64,
        allowance: u64,
    },
    DanglingReference {
        order_id: String,
        field: &'static str,
        target: String,
    },
    /// Nobody could ever see this device.
    NoEligibleRole {
        device_id: String,
    },
}

impl fmt::Display for SeedIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedIssue::DuplicateId { kind, id } => write!(f, "duplicate {kind} id '{id}'"),
            SeedIssue::BudgetExceedsAllowance {
                user_id,
                remaining,
                allowance,
            } => write!(
                f,
                "user '{user_id}': remaining budget {remaining} exceeds allowance {allowance}"
            ),
            SeedIssue::DanglingReference {
                order_id,
                field,
                target,
            } => write!(f, "order '{order_id}': {field} '{target}' does not exist"),
            SeedIssue::NoEligibleRole { device_id } => {
                write!(f, "device '{device_id}' is not eligible for any role")
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn clean_seed_has_no_issues() {
        let seed = Seed::from_json(
            r#"{
                "devices": [{"id": "d1", "brand": "Nokia", "model": "105", "price": 150,
                             "availability": "available", "category": "basic_phone",
                             "role_eligibility": ["basic"]}],
                "users": [{"id": "u1", "email": "a@gov.il",
                           "budget_allowance": 100, "remaining_budget": 50}],
                "orders": []
            }"#,
        )
        .unwrap();
        assert!(seed.check().is_empty());
    }

    #[test]
    fn finds_every_kind_of_issue() {
        let seed = Seed::from_json(
            r#"{
                "devices": [
                    {"id": "d1", "brand": "Nokia", "model": "105", "price": 150,
                     "availability": "available", "category": "basic_phone"},
                    {"id": "d1", "brand": "Nokia", "model": "106", "price": 160,
                     "availability": "available", "category": "basic_phone",
                     "role_eligibility": ["basic"]}
                ],
                "users": [{"id": "u1", "budget_allowance": 100, "remaining_budget": 500}],
                "orders": [{"id": "o1", "order_number": "ORD-1",
                            "user_id": "ghost", "device_id": "d1",
                            "order_type": "new", "status": "pending", "total_cost": 150}]
            }"#,
        )
        .unwrap();

        let issues = seed.check();
        assert_eq!(issues.len(), 4);
        assert!(issues.contains(&SeedIssue::NoEligibleRole {
            device_id: "d1".to_string()
        }));
        assert!(issues.iter().any(|i| matches!(i, SeedIssue::DuplicateId { kind: "device", .. })));
        assert!(issues.iter().any(|i| matches!(i, SeedIssue::BudgetExceedsAllowance { .. })));
        assert!(
            issues
                .iter()
                .any(|i| i.to_string() == "order 'o1': user_id 'ghost' does not exist")
        );
    }
}
