//! Login sessions and role tags

use clinic_store::Key;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque role tag carried by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Clinic administrator
    Admin,
    /// Doctor
    Doctor,
    /// Patient
    Patient,
}

impl Role {
    /// Lowercase tag as stored in login records
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Patient => "patient",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "doctor" => Ok(Role::Doctor),
            "patient" => Ok(Role::Patient),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Key of the user's record in their own store (admin, doctor or patient)
    pub user: Key,
    /// Login name
    pub username: String,
    /// Role tag
    pub role: Role,
}

impl Session {
    /// Check role
    #[inline]
    #[must_use]
    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }
}
