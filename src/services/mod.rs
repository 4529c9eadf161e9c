// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - session lifecycle and resource access.

pub mod resources;
pub mod session;
pub mod token_expiry;

pub use resources::{MatchFormOptions, ResourceService};
pub use session::{SessionController, SessionSnapshot, SessionState};
