//! Employee profile model
//!
//! The backend has shipped several generations of the profile
//! endpoint, each with its own field names (`id`/`user_id`/
//! `employee_id`, `name`/`full_name`/`fullName`, roles as strings or
//! objects). [`RawUserProfile`] absorbs every observed shape;
//! [`RawUserProfile::normalize`] folds it into the canonical
//! [`UserProfile`] exactly once, at the API boundary.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{HrResult, ValidationError};

/// Canonical employee profile.
///
/// Profiles are never deleted, only deactivated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    /// Manager's employee id; `None` for unmanaged accounts
    pub reports_to: Option<String>,
    /// Lowercased role signal strings (role, roles, roleNames, position)
    pub role_tags: BTreeSet<String>,
    #[serde(default)]
    pub can_approve_all: bool,
    pub is_active: bool,
}

/// A role entry as it appears on the wire: a plain string, an object
/// carrying the name under one of two keys, or junk. Junk entries are
/// dropped rather than failing the whole profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawRole {
    Name(String),
    Object {
        #[serde(default, alias = "role_name", alias = "roleName")]
        name: Option<String>,
    },
    Other(serde_json::Value),
}

impl RawRole {
    fn into_name(self) -> Option<String> {
        match self {
            Self::Name(name) => Some(name),
            Self::Object { name } => name,
            Self::Other(_) => None,
        }
    }
}

/// Profile JSON as any backend generation returns it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUserProfile {
    #[serde(default, alias = "_id", alias = "user_id", alias = "userId", alias = "employee_id", alias = "employeeId")]
    pub id: Option<String>,
    #[serde(default, alias = "full_name", alias = "fullName", alias = "username")]
    pub name: Option<String>,
    #[serde(default, alias = "email_id", alias = "emailId")]
    pub email: Option<String>,
    #[serde(default, alias = "dept", alias = "department_name", alias = "departmentName")]
    pub department: Option<String>,
    #[serde(default, alias = "designation", alias = "job_title", alias = "jobTitle")]
    pub position: Option<String>,
    #[serde(default, alias = "reports_to", alias = "reportsTo", alias = "manager_id", alias = "managerId")]
    pub reports_to: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub roles: Vec<RawRole>,
    #[serde(default, alias = "role_names", alias = "roleNames")]
    pub role_names: Vec<String>,
    #[serde(default, alias = "can_approve_all", alias = "canApproveAll")]
    pub can_approve_all: bool,
    #[serde(default, alias = "is_active", alias = "isActive", alias = "active")]
    pub is_active: Option<bool>,
}

impl RawUserProfile {
    /// Fold the raw wire shape into the canonical profile.
    ///
    /// All role signals end up lowercased in `role_tags`; an empty
    /// `reports_to` string is treated as absent. Fails only when no
    /// id alias was present at all.
    pub fn normalize(self) -> HrResult<UserProfile> {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or(ValidationError::MissingField { field: "id" })?;

        let mut role_tags: BTreeSet<String> = BTreeSet::new();
        if let Some(role) = &self.role {
            role_tags.insert(role.to_lowercase());
        }
        for raw in self.roles {
            if let Some(name) = raw.into_name() {
                role_tags.insert(name.to_lowercase());
            }
        }
        for name in self.role_names {
            role_tags.insert(name.to_lowercase());
        }
        if let Some(position) = &self.position {
            role_tags.insert(position.to_lowercase());
        }
        role_tags.retain(|tag| !tag.trim().is_empty());

        Ok(UserProfile {
            name: self.name.unwrap_or_else(|| id.clone()),
            id,
            email: self.email,
            department: self.department,
            position: self.position,
            reports_to: self.reports_to.filter(|m| !m.trim().is_empty()),
            role_tags,
            can_approve_all: self.can_approve_all,
            // Older payloads omit the flag entirely; those accounts
            // are live ones.
            is_active: self.is_active.unwrap_or(true),
        })
    }
}
