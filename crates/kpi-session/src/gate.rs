//! Role-based permission gate consulted before every mutating operation.
//!
//! The gate is pure: it looks only at the role and the scope of the request.
//! Callers treat a deny as a silent no-op.

use kpi_model::ContractCategory;

use crate::role::Role;

/// What a mutating operation touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Cell, note, or create/edit/delete of a contract in this category.
    Contract(ContractCategory),
    /// Contractor management, rollover, credential change, system reset.
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

pub trait PermissionGate: Send + Sync {
    fn decide(&self, role: Role, scope: Scope) -> Decision;
}

/// The fixed role table.
///
/// | role        | medical | non_medical | unknown | admin |
/// |-------------|---------|-------------|---------|-------|
/// | super       | allow   | allow       | allow   | allow |
/// | medical     | allow   | deny        | deny    | deny  |
/// | non_medical | deny    | allow       | deny    | deny  |
/// | viewer      | deny    | deny        | deny    | deny  |
/// | none        | deny    | deny        | deny    | deny  |
#[derive(Debug, Default, Clone, Copy)]
pub struct RoleTableGate;

impl PermissionGate for RoleTableGate {
    fn decide(&self, role: Role, scope: Scope) -> Decision {
        let allowed = match (role, scope) {
            (Role::Super, _) => true,
            (Role::Medical, Scope::Contract(category)) => category == ContractCategory::Medical,
            (Role::NonMedical, Scope::Contract(category)) => {
                category == ContractCategory::NonMedical
            }
            (Role::Medical | Role::NonMedical, Scope::Admin) => false,
            (Role::Viewer | Role::None, _) => false,
        };
        if allowed { Decision::Allow } else { Decision::Deny }
    }
}
