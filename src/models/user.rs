// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile and sign-up models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Account role as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    DefaultUser,
    StaffUser,
    /// Any role this client does not know about
    #[serde(other)]
    Other,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::DefaultUser => "default_user",
            Role::StaffUser => "staff_user",
            Role::Other => "other",
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
            "default_user" => Ok(Role::DefaultUser),
            "staff_user" => Ok(Role::StaffUser),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Snapshot of the signed-in user.
///
/// Never patched in place: each fetch produces a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User ID (`pk` on the dj-rest-auth user endpoint)
    #[serde(default, alias = "pk", skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl UserProfile {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: None,
            username: username.into(),
            role: None,
        }
    }

    /// A new snapshot with `role` filled in.
    pub fn with_role(&self, role: Role) -> Self {
        Self {
            role: Some(role),
            ..self.clone()
        }
    }

    pub fn is_staff(&self) -> bool {
        self.role == Some(Role::StaffUser)
    }
}

/// Sign-up form.
///
/// Checked locally before it is sent; messages mirror the backend's wording
/// so both sources render the same way.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct Registration {
    #[validate(length(min = 1, max = 150, message = "This field may not be blank."))]
    pub username: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(
        min = 8,
        message = "This password is too short. It must contain at least 8 characters."
    ))]
    pub password1: String,
    #[validate(must_match(
        other = "password1",
        message = "The two password fields didn't match."
    ))]
    pub password2: String,
    pub role: Role,
}
