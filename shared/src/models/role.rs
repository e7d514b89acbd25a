//! Authorization tier and capability model
//!
//! The tier is derived from the profile on every load, never stored.
//! Capability sets are strictly nested: Admin covers everything HR
//! covers, HR covers everything Employee covers.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::employee::UserProfile;

/// Effective permission level of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AuthorizationTier {
    #[serde(rename = "employee")]
    Employee,
    #[serde(rename = "hr")]
    Hr,
    #[serde(rename = "admin")]
    Admin,
}

/// Actions a session may perform, gated by tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Capability {
    /// Check in / check out on one's own attendance
    TrackOwnAttendance,
    /// Submit a leave request for oneself
    SubmitLeave,
    /// View one's own attendance and leave records
    ViewOwnRecords,
    /// View any employee's attendance
    ViewAllAttendance,
    /// Correct attendance records (times, status, note)
    EditAttendance,
    /// Approve or reject leave requests
    DecideLeave,
    /// Create, edit, and deactivate employee profiles
    ManageEmployees,
}

/// Capabilities every authenticated employee holds.
const EMPLOYEE_CAPABILITIES: &[Capability] = &[
    Capability::TrackOwnAttendance,
    Capability::SubmitLeave,
    Capability::ViewOwnRecords,
];

/// Additional capabilities for HR and Admin.
const ELEVATED_CAPABILITIES: &[Capability] = &[
    Capability::ViewAllAttendance,
    Capability::EditAttendance,
    Capability::DecideLeave,
    Capability::ManageEmployees,
];

impl AuthorizationTier {
    /// The capability set implied by this tier.
    pub fn capabilities(self) -> BTreeSet<Capability> {
        let mut set: BTreeSet<Capability> = EMPLOYEE_CAPABILITIES.iter().copied().collect();
        if matches!(self, Self::Hr | Self::Admin) {
            set.extend(ELEVATED_CAPABILITIES.iter().copied());
        }
        set
    }

    pub fn can(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

/// Resolver knobs.
#[derive(Debug, Clone)]
pub struct RolePolicy {
    /// Treat an account with no manager as Admin. Inherited from the
    /// source system; likely a workaround for incomplete data, so it
    /// is a switch rather than a hard rule.
    pub admin_when_unmanaged: bool,
}

impl Default for RolePolicy {
    fn default() -> Self {
        Self {
            admin_when_unmanaged: true,
        }
    }
}

fn any_tag_contains(profile: &UserProfile, needles: &[&str]) -> bool {
    profile
        .role_tags
        .iter()
        .any(|tag| needles.iter().any(|needle| tag.contains(needle)))
}

/// Derive the authorization tier from a normalized profile.
///
/// Signals are OR'd per tier and the most privileged tier wins; a
/// profile with no usable signals resolves to Employee. Total: never
/// fails, whatever the profile looks like.
pub fn resolve_tier(profile: &UserProfile, policy: &RolePolicy) -> AuthorizationTier {
    let unmanaged = policy.admin_when_unmanaged && profile.reports_to.is_none();
    if any_tag_contains(profile, &["admin"]) || unmanaged || profile.can_approve_all {
        return AuthorizationTier::Admin;
    }

    let hr_needles = ["hr", "human resource"];
    let hr_department = profile
        .department
        .as_deref()
        .map(str::to_lowercase)
        .is_some_and(|dept| hr_needles.iter().any(|needle| dept.contains(needle)));
    if any_tag_contains(profile, &hr_needles) || hr_department {
        return AuthorizationTier::Hr;
    }

    AuthorizationTier::Employee
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(value: serde_json::Value) -> UserProfile {
        let raw: crate::models::employee::RawUserProfile =
            serde_json::from_value(value).unwrap();
        raw.normalize().unwrap()
    }

    #[test]
    fn test_unmanaged_manager_is_admin() {
        let p = profile(json!({"id": "u1", "roles": ["Manager"], "reportsTo": null}));
        assert_eq!(resolve_tier(&p, &RolePolicy::default()), AuthorizationTier::Admin);
    }

    #[test]
    fn test_unmanaged_rule_can_be_disabled() {
        let p = profile(json!({"id": "u1", "roles": ["Manager"]}));
        let policy = RolePolicy {
            admin_when_unmanaged: false,
        };
        assert_eq!(resolve_tier(&p, &policy), AuthorizationTier::Employee);
    }

    #[test]
    fn test_hr_department() {
        let p = profile(json!({"id": "u1", "department": "Human Resources", "reportsTo": "u123"}));
        assert_eq!(resolve_tier(&p, &RolePolicy::default()), AuthorizationTier::Hr);
    }

    #[test]
    fn test_plain_employee() {
        let p = profile(json!({"id": "u1", "roles": ["employee"], "reportsTo": "u123"}));
        assert_eq!(
            resolve_tier(&p, &RolePolicy::default()),
            AuthorizationTier::Employee
        );
    }

    #[test]
    fn test_admin_signals() {
        let p = profile(json!({"id": "u1", "role": "System Administrator", "reportsTo": "u2"}));
        assert_eq!(resolve_tier(&p, &RolePolicy::default()), AuthorizationTier::Admin);

        let p = profile(json!({"id": "u1", "canApproveAll": true, "reportsTo": "u2"}));
        assert_eq!(resolve_tier(&p, &RolePolicy::default()), AuthorizationTier::Admin);
    }

    #[test]
    fn test_empty_profile_is_total() {
        let p = profile(json!({"id": "u1", "reportsTo": "u2"}));
        assert_eq!(
            resolve_tier(&p, &RolePolicy::default()),
            AuthorizationTier::Employee
        );
    }

    #[test]
    fn test_capability_sets_are_nested() {
        let employee = AuthorizationTier::Employee.capabilities();
        let hr = AuthorizationTier::Hr.capabilities();
        let admin = AuthorizationTier::Admin.capabilities();
        assert!(hr.is_superset(&employee));
        assert!(admin.is_superset(&hr));
        assert!(admin.contains(&Capability::DecideLeave));
        assert!(!employee.contains(&Capability::DecideLeave));
    }
}
