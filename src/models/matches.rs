// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Match model and list filter.

use super::Resource;
use crate::time_utils::within_days;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Match lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Upcoming,
    InProgress,
    Completed,
    #[serde(other)]
    Other,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Upcoming => "upcoming",
            MatchStatus::InProgress => "in_progress",
            MatchStatus::Completed => "completed",
            MatchStatus::Other => "other",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(MatchStatus::Upcoming),
            "in_progress" => Ok(MatchStatus::InProgress),
            "completed" => Ok(MatchStatus::Completed),
            other => Err(format!("unknown match status: {}", other)),
        }
    }
}

/// Match as returned by `/matches/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    /// Event ID
    #[serde(default)]
    pub event: Option<u64>,
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub team1: Option<u64>,
    pub team1_name: String,
    #[serde(default)]
    pub team2: Option<u64>,
    pub team2_name: String,
    /// Scheduled start (ISO 8601)
    pub scheduled_time: String,
    pub status: MatchStatus,
    /// Free-form result, e.g. "2-1"
    #[serde(default)]
    pub result: Option<String>,
}

/// Fields for creating or updating a match.
#[derive(Debug, Clone, Serialize)]
pub struct MatchForm {
    pub event: u64,
    pub team1: u64,
    pub team2: u64,
    pub scheduled_time: String,
    pub status: MatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl Resource for Match {
    const COLLECTION: &'static str = "matches/";
    type Form = MatchForm;

    fn id(&self) -> u64 {
        self.id
    }
}

/// Filter for the public matches list.
#[derive(Debug, Clone, Default)]
pub struct MatchFilter {
    /// Case-insensitive substring of either team name
    pub search: Option<String>,
    pub status: Option<MatchStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl MatchFilter {
    pub fn matches(&self, m: &Match) -> bool {
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let term = term.to_lowercase();
            if !m.team1_name.to_lowercase().contains(&term)
                && !m.team2_name.to_lowercase().contains(&term)
            {
                return false;
            }
        }
        if self.status.is_some_and(|s| s != m.status) {
            return false;
        }
        within_days(&m.scheduled_time, self.start_date, self.end_date)
    }

    pub fn apply<'a>(&self, matches: &'a [Match]) -> Vec<&'a Match> {
        matches.iter().filter(|m| self.matches(m)).collect()
    }
}
