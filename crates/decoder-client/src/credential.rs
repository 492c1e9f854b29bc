//! ---
//! ems_section: "06-security-access-control"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Synthetic bearer credentials understood by the DECODER API."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use strum::Display;

/// Role encoded in the synthetic bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Role {
    /// May read every building.
    Admin,
    /// May only read buildings it owns.
    Owner,
}

/// `(username, role)` pair sent as `Authorization: Bearer username:role`.
///
/// Nothing is verified client side; the API decides what the pair may access.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Credential {
    pub username: String,
    pub role: Role,
}

impl Credential {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    pub fn admin(username: impl Into<String>) -> Self {
        Self::new(username, Role::Admin)
    }

    pub fn owner(username: impl Into<String>) -> Self {
        Self::new(username, Role::Owner)
    }

    /// Bearer token body, without the `Bearer ` scheme prefix.
    pub fn token(&self) -> String {
        format!("{}:{}", self.username, self.role)
    }
}
