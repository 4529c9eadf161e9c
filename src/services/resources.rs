// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed CRUD over the backend collections.
//!
//! All calls go through the session, so they carry the current credentials
//! and get the refresh-and-retry behaviour for free. Writes are sent as
//! multipart/form-data, the way the admin screens post them.

use crate::api::{endpoints, ApiRequest, FormField};
use crate::error::{ApiError, Result};
use crate::models::{Event, Page, Resource, Team};
use crate::services::session::SessionController;
use serde::Deserialize;
use std::sync::Arc;

/// Stop following `next` links after this many pages.
const MAX_PAGES: usize = 100;

/// Field name the image proxy expects the file under.
const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

/// Choices for the match editor, loaded together.
#[derive(Debug, Clone)]
pub struct MatchFormOptions {
    pub teams: Vec<Team>,
    pub events: Vec<Event>,
}

/// Resource access for views.
#[derive(Clone)]
pub struct ResourceService {
    session: Arc<SessionController>,
}

impl ResourceService {
    pub fn new(session: Arc<SessionController>) -> Self {
        Self { session }
    }

    /// Fetch one page. `page` is a `next`/`previous` link from an earlier page.
    pub async fn list<R: Resource>(&self, page: Option<&str>) -> Result<Page<R>> {
        let path = page.unwrap_or(R::COLLECTION);
        self.session.send(&ApiRequest::get(path)).await?.json()
    }

    /// Fetch page `number` (1-based) of a collection.
    pub async fn list_page<R: Resource>(&self, number: u32) -> Result<Page<R>> {
        let request = ApiRequest::get(R::COLLECTION).query("page", number.to_string());
        self.session.send(&request).await?.json()
    }

    /// Fetch every page of a collection.
    pub async fn list_all<R: Resource>(&self) -> Result<Vec<R>> {
        let mut page = self.list::<R>(None).await?;
        let mut items = std::mem::take(&mut page.results);
        let mut fetched = 1;

        while let Some(next) = page.next.take() {
            if fetched >= MAX_PAGES {
                tracing::warn!(collection = R::COLLECTION, pages = fetched, "Too many pages, stopping");
                break;
            }
            page = self.list::<R>(Some(&next)).await?;
            items.append(&mut page.results);
            fetched += 1;
        }

        Ok(items)
    }

    /// Fetch one item. A missing item is `ApiError::NotFound`.
    pub async fn get<R: Resource>(&self, id: u64) -> Result<R> {
        self.session.send(&ApiRequest::get(item_path::<R>(id))).await?.json()
    }

    pub async fn create<R: Resource>(&self, form: &R::Form) -> Result<R> {
        let request = ApiRequest::post(R::COLLECTION).form(form)?;
        let created: R = self.session.send(&request).await?.json()?;
        tracing::info!(collection = R::COLLECTION, id = created.id(), "Created");
        Ok(created)
    }

    pub async fn update<R: Resource>(&self, id: u64, form: &R::Form) -> Result<R> {
        let request = ApiRequest::put(item_path::<R>(id)).form(form)?;
        let updated = self.session.send(&request).await?.json()?;
        tracing::info!(collection = R::COLLECTION, id, "Updated");
        Ok(updated)
    }

    pub async fn delete<R: Resource>(&self, id: u64) -> Result<()> {
        self.session.send(&ApiRequest::delete(item_path::<R>(id))).await?;
        tracing::info!(collection = R::COLLECTION, id, "Deleted");
        Ok(())
    }

    /// Upload an image through the backend's image proxy; returns its URL.
    pub async fn upload_image(&self, filename: &str, mime: &str, bytes: Vec<u8>) -> Result<String> {
        let size = bytes.len();
        let request = ApiRequest::post(endpoints::IMAGE_UPLOAD)
            .multipart(vec![FormField::file(UPLOAD_FIELD, filename, mime, bytes)]);
        let uploaded: UploadResponse = self.session.send(&request).await?.json()?;

        let url = uploaded
            .secure_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ApiError::Decode("Upload response has no secure_url".to_string()))?;
        tracing::info!(filename, size, "Image uploaded");
        Ok(url)
    }

    /// Load teams and events for the match editor concurrently.
    pub async fn load_match_form_options(&self) -> Result<MatchFormOptions> {
        let (teams, events) = tokio::try_join!(self.list_all::<Team>(), self.list_all::<Event>())?;
        Ok(MatchFormOptions { teams, events })
    }
}

fn item_path<R: Resource>(id: u64) -> String {
    format!("{}{}/", R::COLLECTION, id)
}
