// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Player model.

use super::Resource;
use serde::{Deserialize, Serialize};

/// Player as returned by `/players/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: u64,
    pub name: String,
    /// In-game role (e.g. "support"), not an account role
    #[serde(default)]
    pub role: String,
    /// Avatar URL (uploaded through the image proxy)
    #[serde(default)]
    pub avatar: Option<String>,
    /// Team ID
    #[serde(default)]
    pub team: Option<u64>,
    #[serde(default)]
    pub team_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerForm {
    pub name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Resource for Player {
    const COLLECTION: &'static str = "players/";
    type Form = PlayerForm;

    fn id(&self) -> u64 {
        self.id
    }
}

impl From<&Player> for PlayerForm {
    fn from(player: &Player) -> Self {
        Self {
            name: player.name.clone(),
            role: player.role.clone(),
            team: player.team,
            avatar: player.avatar.clone(),
        }
    }
}
