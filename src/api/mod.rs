// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP plumbing for the GG-EZ REST API.

pub mod client;
pub mod request;

pub use client::{ApiClient, ApiResponse};
pub use request::{ApiRequest, FieldValue, FormField, RequestBody};

/// Endpoint paths, relative to the API base URL.
pub mod endpoints {
    pub const LOGIN: &str = "dj-rest-auth/login/";
    pub const LOGOUT: &str = "dj-rest-auth/logout/";
    pub const USER: &str = "dj-rest-auth/user/";
    pub const REGISTRATION: &str = "dj-rest-auth/registration/";
    pub const TOKEN_REFRESH: &str = "dj-rest-auth/token/refresh/";
    pub const CURRENT_USER_ROLE: &str = "users/current-user-role/";
    pub const IMAGE_UPLOAD: &str = "cloudinary-proxy/";
}
