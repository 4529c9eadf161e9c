// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the GG-EZ API.

pub mod event;
pub mod matches;
pub mod page;
pub mod player;
pub mod team;
pub mod user;

pub use event::{Event, EventFilter, EventForm};
pub use matches::{Match, MatchFilter, MatchForm, MatchStatus};
pub use page::Page;
pub use player::{Player, PlayerForm};
pub use team::{Team, TeamForm};
pub use user::{Registration, Role, UserProfile};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A CRUD collection exposed by the backend.
pub trait Resource: DeserializeOwned + Send + 'static {
    /// Collection path relative to the API root, with trailing slash.
    const COLLECTION: &'static str;

    /// Fields sent on create and update.
    type Form: Serialize + Sync;

    fn id(&self) -> u64;
}
