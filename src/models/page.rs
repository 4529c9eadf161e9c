// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Paginated list envelope.

use super::Resource;
use serde::{Deserialize, Serialize};

/// One page of a list endpoint.
///
/// The backend normally wraps lists as `{count, next, previous, results}`;
/// endpoints that return a bare array are read as a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PageBody<T>")]
pub struct Page<T> {
    pub count: Option<u64>,
    /// Absolute URL of the next page
    pub next: Option<String>,
    /// Absolute URL of the previous page
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageBody<T> {
    Envelope {
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
        results: Vec<T>,
    },
    Bare(Vec<T>),
}

impl<T> From<PageBody<T>> for Page<T> {
    fn from(body: PageBody<T>) -> Self {
        match body {
            PageBody::Envelope {
                count,
                next,
                previous,
                results,
            } => Page {
                count,
                next,
                previous,
                results,
            },
            PageBody::Bare(results) => Page {
                count: Some(results.len() as u64),
                next: None,
                previous: None,
                results,
            },
        }
    }
}

impl<T: Resource> Page<T> {
    /// Drop an item locally after a successful delete, without refetching.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.results.len();
        self.results.retain(|item| item.id() != id);
        let removed = self.results.len() != before;
        if removed {
            self.count = self.count.map(|c| c.saturating_sub(1));
        }
        removed
    }
}
