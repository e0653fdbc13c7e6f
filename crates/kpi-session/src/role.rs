use std::fmt;
use std::str::FromStr;

use kpi_model::Passwords;

/// Capability level of the current session. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Role {
    #[default]
    None,
    Super,
    Medical,
    NonMedical,
    Viewer,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::None,
        Role::Super,
        Role::Medical,
        Role::NonMedical,
        Role::Viewer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::None => "none",
            Role::Super => "super",
            Role::Medical => "medical",
            Role::NonMedical => "non_medical",
            Role::Viewer => "viewer",
        }
    }

    pub fn is_authenticated(self) -> bool {
        self != Role::None
    }

    /// Role whose shared password equals `candidate`, tried from most to least privileged.
    ///
    /// This is a UI gate only. The passwords are shared plaintext values
    /// readable by every client.
    pub fn for_password(passwords: &Passwords, candidate: &str) -> Option<Role> {
        if candidate.is_empty() {
            return None;
        }
        let mut table = vec![
            (passwords.super_admin.as_str(), Role::Super),
            (passwords.medical.as_str(), Role::Medical),
            (passwords.non_medical.as_str(), Role::NonMedical),
        ];
        if let Some(viewer) = passwords.viewer.as_deref() {
            table.push((viewer, Role::Viewer));
        }
        table
            .into_iter()
            .find(|(secret, _)| !secret.is_empty() && *secret == candidate)
            .map(|(_, role)| role)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "none" => Ok(Role::None),
            "super" => Ok(Role::Super),
            "medical" => Ok(Role::Medical),
            "non_medical" | "non-medical" => Ok(Role::NonMedical),
            "viewer" => Ok(Role::Viewer),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
