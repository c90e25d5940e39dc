//! # Directory Module
//!
//! Sign-in by name against the ERP and CRM exports.
//!
//! The CRM export decides who may sign in (`isEmployee`); the ERP export, when
//! it knows the person, supplies the entitlement attributes that seed the
//! platform profile. A successful lookup is turned into an ordinary platform
//! session by the app crate, so both identity paths end in the same place.

use crate::user::{RoleLevel, UserPatch};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mail domain for directory identities that carry no e-mail of their own.
pub const DIRECTORY_MAIL_DOMAIN: &str = "directory.gov.il";

// =============================================================================
// EXPORT DOCUMENTS
// =============================================================================

/// The CRM export document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrmExport {
    #[serde(default)]
    pub customers: Vec<CrmCustomer>,
}

/// One CRM customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrmCustomer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "isEmployee", default)]
    pub is_employee: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// The ERP export document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErpExport {
    #[serde(default)]
    pub employees: Vec<ErpEmployee>,
}

/// One ERP employee record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErpEmployee {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_level: Option<RoleLevel>,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Why a directory sign-in was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("User not found in CRM")]
    NotFound,

    #[error("Access denied: Not a government employee")]
    NotEmployee,
}

// =============================================================================
// DIRECTORY
// =============================================================================

/// Both exports, loaded.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    crm: CrmExport,
    erp: ErpExport,
}

impl Directory {
    #[must_use]
    pub fn new(crm: CrmExport, erp: ErpExport) -> Self {
        Self { crm, erp }
    }

    /// Number of CRM customers.
    #[must_use]
    pub fn customer_count(&self) -> usize {
        self.crm.customers.len()
    }

    /// Exact-name lookup in the CRM export.
    #[must_use]
    pub fn customer_by_name(&self, name: &str) -> Option<&CrmCustomer> {
        self.crm.customers.iter().find(|c| c.name == name)
    }

    /// Exact-name lookup in the ERP export.
    #[must_use]
    pub fn employee_by_name(&self, name: &str) -> Option<&ErpEmployee> {
        self.erp.employees.iter().find(|e| e.name == name)
    }

    /// `false` for unknown names.
    #[must_use]
    pub fn is_employee(&self, name: &str) -> bool {
        self.customer_by_name(name).is_some_and(|c| c.is_employee)
    }

    /// Decide whether `name` may sign in.
    pub fn authorize(&self, name: &str) -> Result<Identity, DirectoryError> {
        let customer = self.customer_by_name(name).ok_or(DirectoryError::NotFound)?;
        if !customer.is_employee {
            return Err(DirectoryError::NotEmployee);
        }

        Ok(Identity {
            customer: customer.clone(),
            employee: self.employee_by_name(name).cloned(),
        })
    }
}

/// A directory-verified employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub customer: CrmCustomer,
    pub employee: Option<ErpEmployee>,
}

impl Identity {
    /// The e-mail the platform account is keyed by.
    ///
    /// Falls back to `first.last@directory.gov.il` built from the name.
    #[must_use]
    pub fn login_email(&self) -> String {
        if let Some(email) = self.customer.email.as_deref().filter(|e| !e.trim().is_empty()) {
            return email.to_string();
        }
        let local: String = self
            .customer
            .name
            .split_whitespace()
            .map(|part| part.to_lowercase())
            .collect::<Vec<_>>()
            .join(".");
        format!("{local}@{DIRECTORY_MAIL_DOMAIN}")
    }

    /// Profile attributes the exports know about.
    #[must_use]
    pub fn profile_patch(&self) -> UserPatch {
        let mut patch = UserPatch {
            full_name: Some(self.customer.name.clone()),
            phone_number: self.customer.phone.clone(),
            ..UserPatch::default()
        };
        if let Some(employee) = &self.employee {
            patch.employee_id.clone_from(&employee.employee_id);
            patch.department.clone_from(&employee.department);
            patch.job_title.clone_from(&employee.job_title);
            patch.role_level = employee.role_level;
        }
        patch
    }
}

// =============================================================================
// TESTS
// =============================================================================
