// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Esports event model and list filter.

use super::Resource;
use crate::time_utils::within_days;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Event as returned by `/events/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Start date (ISO 8601)
    pub start_date: String,
    /// End date (ISO 8601)
    pub end_date: String,
    /// Banner image URL
    #[serde(default)]
    pub image: Option<String>,
}

/// Fields for creating or updating an event.
#[derive(Debug, Clone, Serialize)]
pub struct EventForm {
    pub name: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Resource for Event {
    const COLLECTION: &'static str = "events/";
    type Form = EventForm;

    fn id(&self) -> u64 {
        self.id
    }
}

/// Current values, as the starting point for an edit.
impl From<&Event> for EventForm {
    fn from(event: &Event) -> Self {
        Self {
            name: event.name.clone(),
            description: event.description.clone(),
            start_date: event.start_date.clone(),
            end_date: event.end_date.clone(),
            image: event.image.clone(),
        }
    }
}

/// Filter for the public events list.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Case-insensitive substring of the event name
    pub search: Option<String>,
    /// Keep events starting on or after this day
    pub start_date: Option<NaiveDate>,
    /// Keep events ending on or before this day
    pub end_date: Option<NaiveDate>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            if !event.name.to_lowercase().contains(&term.to_lowercase()) {
                return false;
            }
        }
        within_days(&event.start_date, self.start_date, None)
            && within_days(&event.end_date, None, self.end_date)
    }

    pub fn apply<'a>(&self, events: &'a [Event]) -> Vec<&'a Event> {
        events.iter().filter(|e| self.matches(e)).collect()
    }
}
