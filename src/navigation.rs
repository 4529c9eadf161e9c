// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Role-gated navigation.
//!
//! The current user is the only input: signed-in state decides between the
//! sign-in and sign-out links, and `staff_user` unlocks the admin panel.

use crate::models::UserProfile;
use serde::Serialize;

/// Application routes a view can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Home,
    Events,
    EventDetail(u64),
    Matches,
    MatchDetail(u64),
    SignIn,
    SignUp,
    SignOut,
    Admin,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Events => "/events".to_string(),
            Route::EventDetail(id) => format!("/events/{}", id),
            Route::Matches => "/matches".to_string(),
            Route::MatchDetail(id) => format!("/matches/{}", id),
            Route::SignIn => "/signin".to_string(),
            Route::SignUp => "/signup".to_string(),
            Route::SignOut => "/signout".to_string(),
            Route::Admin => "/admin".to_string(),
        }
    }
}

/// A link in the navigation bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub label: &'static str,
    pub route: Route,
}

/// Whether `user` may open `route`.
pub fn can_access(route: Route, user: Option<&UserProfile>) -> bool {
    match route {
        Route::Admin => user.is_some_and(UserProfile::is_staff),
        Route::SignOut => user.is_some(),
        Route::SignIn | Route::SignUp => user.is_none(),
        Route::Home
        | Route::Events
        | Route::EventDetail(_)
        | Route::Matches
        | Route::MatchDetail(_) => true,
    }
}

/// Navigation bar links for `user`, in display order.
pub fn nav_items(user: Option<&UserProfile>) -> Vec<NavItem> {
    [
        NavItem { label: "Home", route: Route::Home },
        NavItem { label: "Events", route: Route::Events },
        NavItem { label: "Matches", route: Route::Matches },
        NavItem { label: "Admin", route: Route::Admin },
        NavItem { label: "Sign In", route: Route::SignIn },
        NavItem { label: "Sign Up", route: Route::SignUp },
        NavItem { label: "Sign Out", route: Route::SignOut },
    ]
    .into_iter()
    .filter(|item| can_access(item.route, user))
    .collect()
}
