use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Roles issued by the authentication service.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Voter,
    Admin,
    Candidate,
}

impl Display for Role {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::Voter => "voter",
                Self::Admin => "admin",
                Self::Candidate => "candidate",
            }
        )
    }
}

/// The class of caller a route admits.
pub trait Access {
    /// The role the caller must hold, if any.
    const REQUIRED: Option<Role>;
}

/// Any caller holding a valid token.
pub struct Authenticated;

impl Access for Authenticated {
    const REQUIRED: Option<Role> = None;
}

/// Administrators only.
pub struct Admin;

impl Access for Admin {
    const REQUIRED: Option<Role> = Some(Role::Admin);
}
