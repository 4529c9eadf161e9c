// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Team model.

use super::Resource;
use serde::{Deserialize, Serialize};

/// Team as returned by `/teams/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Logo image URL
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamForm {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

impl Resource for Team {
    const COLLECTION: &'static str = "teams/";
    type Form = TeamForm;

    fn id(&self) -> u64 {
        self.id
    }
}

impl From<&Team> for TeamForm {
    fn from(team: &Team) -> Self {
        Self {
            name: team.name.clone(),
            description: team.description.clone(),
            logo: team.logo.clone(),
        }
    }
}
