// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in, sign-out, restore and registration against a stub backend.

use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use ggez_client::error::ApiError;
use ggez_client::models::{Registration, Role};
use ggez_client::services::SessionState;
use ggez_client::store::{keys, TokenStore};
use serde_json::{json, Value};
use std::time::Duration;

mod common;
use common::{bearer, signed_in_app, spawn, test_app, Recorder};

/// User endpoint that only answers to `Bearer tok`.
fn user_route(recorder: Recorder, user: Value) -> axum::routing::MethodRouter {
    get(move |headers: HeaderMap| async move {
        if recorder.hit(&headers) == bearer("tok") {
            (StatusCode::OK, Json(user)).into_response()
        } else {
            StatusCode::UNAUTHORIZED.into_response()
        }
    })
}

fn login_route(recorder: Recorder) -> axum::routing::MethodRouter {
    post(move |headers: HeaderMap, Json(body): Json<Value>| async move {
        recorder.hit(&headers);
        if body["username"] == "testuser" && body["password"] == "testpassword" {
            (StatusCode::OK, Json(json!({ "access_token": "tok" })))
        } else {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "non_field_errors": ["Unable to log in with provided credentials."]
                })),
            )
        }
    })
}

#[tokio::test]
async fn test_login_stores_token_and_publishes_user() {
    let user_calls = Recorder::new();
    let base = spawn(
        Router::new()
            .route("/dj-rest-auth/login/", login_route(Recorder::new()))
            .route(
                "/dj-rest-auth/user/",
                user_route(user_calls.clone(), json!({ "pk": 1, "username": "testuser" })),
            ),
    )
    .await;
    let (app, tokens) = test_app(&base);
    let mut updates = app.session.subscribe();

    let user = app.session.login("testuser", "testpassword").await.unwrap();

    assert_eq!(user.username, "testuser");
    assert_eq!(user.id, Some(1));
    // No role endpoint on this backend: the profile is kept without a role.
    assert_eq!(user.role, None);
    assert_eq!(tokens.get(keys::ACCESS_TOKEN).as_deref(), Some("tok"));
    assert_eq!(tokens.get(keys::REFRESH_TOKEN), None);
    assert_eq!(user_calls.auth_headers(), vec![bearer("tok")]);

    assert_eq!(app.session.state(), SessionState::Authenticated);
    assert!(updates.has_changed().unwrap());
    let seen = updates.borrow_and_update().clone();
    assert_eq!(seen.state, SessionState::Authenticated);
    assert_eq!(seen.user, Some(user));
}

#[tokio::test]
async fn test_login_fetches_role_when_user_payload_lacks_it() {
    let role_calls = Recorder::new();
    let role = role_calls.clone();
    let base = spawn(
        Router::new()
            .route("/dj-rest-auth/login/", login_route(Recorder::new()))
            .route(
                "/dj-rest-auth/user/",
                user_route(Recorder::new(), json!({ "pk": 2, "username": "testuser" })),
            )
            .route(
                "/users/current-user-role/",
                get(move |headers: HeaderMap| async move {
                    role.hit(&headers);
                    Json(json!({ "role": "staff_user" }))
                }),
            ),
    )
    .await;
    let (app, _tokens) = test_app(&base);

    let user = app.session.login("testuser", "testpassword").await.unwrap();

    assert_eq!(user.role, Some(Role::StaffUser));
    assert!(user.is_staff());
    assert_eq!(role_calls.auth_headers(), vec![bearer("tok")]);
}

#[tokio::test]
async fn test_login_skips_role_lookup_when_user_has_role() {
    let role_calls = Recorder::new();
    let role = role_calls.clone();
    let base = spawn(
        Router::new()
            .route("/dj-rest-auth/login/", login_route(Recorder::new()))
            .route(
                "/dj-rest-auth/user/",
                user_route(
                    Recorder::new(),
                    json!({ "username": "testuser", "role": "default_user" }),
                ),
            )
            .route(
                "/users/current-user-role/",
                get(move |headers: HeaderMap| async move {
                    role.hit(&headers);
                    Json(json!({ "role": "staff_user" }))
                }),
            ),
    )
    .await;
    let (app, _tokens) = test_app(&base);

    let user = app.session.login("testuser", "testpassword").await.unwrap();

    assert_eq!(user.role, Some(Role::DefaultUser));
    assert_eq!(role_calls.count(), 0);
}

#[tokio::test]
async fn test_login_rejected_reports_non_field_error() {
    let user_calls = Recorder::new();
    let base = spawn(
        Router::new()
            .route("/dj-rest-auth/login/", login_route(Recorder::new()))
            .route(
                "/dj-rest-auth/user/",
                user_route(user_calls.clone(), json!({ "username": "testuser" })),
            ),
    )
    .await;
    let (app, tokens) = test_app(&base);

    let err = app.session.login("testuser", "wrong").await.unwrap_err();

    match err {
        ApiError::Validation(errors) => {
            assert_eq!(
                errors.non_field_errors(),
                ["Unable to log in with provided credentials."]
            );
        }
        other => panic!("Expected validation error, got {:?}", other),
    }
    assert_eq!(app.session.state(), SessionState::Anonymous);
    assert!(app.session.current_user().is_none());
    assert!(tokens.entries().is_empty());
    assert_eq!(user_calls.count(), 0);
}

#[tokio::test]
async fn test_login_with_unreachable_backend_stays_anonymous() {
    let (app, tokens) = test_app("http://127.0.0.1:9/");

    let err = app.session.login("testuser", "testpassword").await.unwrap_err();

    assert!(matches!(err, ApiError::Network(_)), "got {:?}", err);
    assert_eq!(app.session.state(), SessionState::Anonymous);
    assert!(tokens.entries().is_empty());
}

#[tokio::test]
async fn test_logout_clears_session_and_notifies_backend() {
    let logout_calls = Recorder::new();
    let logout = logout_calls.clone();
    let base = spawn(
        Router::new()
            .route("/dj-rest-auth/login/", login_route(Recorder::new()))
            .route(
                "/dj-rest-auth/user/",
                user_route(Recorder::new(), json!({ "username": "testuser" })),
            )
            .route(
                "/dj-rest-auth/logout/",
                post(move |headers: HeaderMap| async move {
                    logout.hit(&headers);
                    Json(json!({ "detail": "Successfully logged out." }))
                }),
            ),
    )
    .await;
    let (app, tokens) = test_app(&base);
    app.session.login("testuser", "testpassword").await.unwrap();

    app.session.logout().await;

    assert_eq!(logout_calls.auth_headers(), vec![bearer("tok")]);
    assert_eq!(app.session.state(), SessionState::Anonymous);
    assert!(app.session.current_user().is_none());
    assert!(tokens.entries().is_empty());
}

#[tokio::test]
async fn test_logout_while_login_in_flight_wins() {
    let base = spawn(
        Router::new()
            .route("/dj-rest-auth/login/", login_route(Recorder::new()))
            .route(
                "/dj-rest-auth/user/",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Json(json!({ "username": "testuser" }))
                }),
            )
            .route("/dj-rest-auth/logout/", post(|| async { StatusCode::OK })),
    )
    .await;
    let (app, tokens) = test_app(&base);

    let (login, ()) = tokio::join!(app.session.login("testuser", "testpassword"), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        app.session.logout().await;
    });

    assert!(login.is_err());
    assert_eq!(app.session.state(), SessionState::Anonymous);
    assert!(app.session.current_user().is_none());
    assert!(tokens.entries().is_empty());
}

#[tokio::test]
async fn test_restore_with_valid_stored_token() {
    let user_calls = Recorder::new();
    let base = spawn(Router::new().route(
        "/dj-rest-auth/user/",
        user_route(user_calls.clone(), json!({ "username": "testuser", "role": "staff_user" })),
    ))
    .await;
    let (app, _tokens) = signed_in_app(&base, "tok", None);

    let user = app.session.restore().await.expect("session should restore");

    assert_eq!(user.username, "testuser");
    assert_eq!(app.session.state(), SessionState::Authenticated);
    assert_eq!(app.session.current_user(), Some(user));
    assert_eq!(user_calls.count(), 1);
}

#[tokio::test]
async fn test_restore_with_rejected_token_clears_store() {
    let base = spawn(
        Router::new()
            .route(
                "/dj-rest-auth/user/",
                get(|| async { StatusCode::UNAUTHORIZED }),
            )
            .route(
                "/dj-rest-auth/token/refresh/",
                post(|| async {
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({ "detail": "Token is invalid or expired" })),
                    )
                }),
            ),
    )
    .await;
    let (app, tokens) = signed_in_app(&base, "stale", Some("also-stale"));

    assert!(app.session.restore().await.is_none());

    assert_eq!(app.session.state(), SessionState::Anonymous);
    assert!(tokens.entries().is_empty());
}

#[tokio::test]
async fn test_restore_without_credentials_sends_nothing() {
    let user_calls = Recorder::new();
    let base = spawn(Router::new().route(
        "/dj-rest-auth/user/",
        user_route(user_calls.clone(), json!({ "username": "testuser" })),
    ))
    .await;
    let (app, _tokens) = test_app(&base);

    assert!(app.session.restore().await.is_none());
    assert_eq!(user_calls.count(), 0);
    assert_eq!(app.session.state(), SessionState::Anonymous);
}

fn registration(password2: &str) -> Registration {
    Registration {
        username: "newplayer".to_string(),
        email: "new@example.com".to_string(),
        password1: "hunter2hunter2".to_string(),
        password2: password2.to_string(),
        role: Role::DefaultUser,
    }
}

#[tokio::test]
async fn test_register_rejects_mismatched_passwords_locally() {
    let calls = Recorder::new();
    let recorder = calls.clone();
    let base = spawn(Router::new().route(
        "/dj-rest-auth/registration/",
        post(move |headers: HeaderMap| async move {
            recorder.hit(&headers);
            StatusCode::CREATED
        }),
    ))
    .await;
    let (app, _tokens) = test_app(&base);

    let err = app
        .session
        .register(&registration("something-else"))
        .await
        .unwrap_err();

    let errors = err.into_validation_errors();
    assert_eq!(errors.field("password2"), ["The two password fields didn't match."]);
    assert_eq!(calls.count(), 0);
}

#[tokio::test]
async fn test_register_sends_form_and_does_not_sign_in() {
    let base = spawn(Router::new().route(
        "/dj-rest-auth/registration/",
        post(|Json(body): Json<Value>| async move {
            if body["username"] == "newplayer"
                && body["password1"] == body["password2"]
                && body["role"] == "default_user"
            {
                (StatusCode::CREATED, Json(json!({ "detail": "Verification e-mail sent." })))
            } else {
                (StatusCode::BAD_REQUEST, Json(json!({ "username": ["Bad form."] })))
            }
        }),
    ))
    .await;
    let (app, tokens) = test_app(&base);

    app.session
        .register(&registration("hunter2hunter2"))
        .await
        .unwrap();

    assert_eq!(app.session.state(), SessionState::Anonymous);
    assert!(tokens.entries().is_empty());
}

#[tokio::test]
async fn test_register_surfaces_backend_field_errors() {
    let base = spawn(Router::new().route(
        "/dj-rest-auth/registration/",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "username": ["A user with that username already exists."] })),
            )
        }),
    ))
    .await;
    let (app, _tokens) = test_app(&base);

    let err = app
        .session
        .register(&registration("hunter2hunter2"))
        .await
        .unwrap_err();

    let errors = err.into_validation_errors();
    assert_eq!(
        errors.field("username"),
        ["A user with that username already exists."]
    );
}

#[tokio::test]
async fn test_login_over_existing_session_logs_out_first() {
    let logout_calls = Recorder::new();
    let logout = logout_calls.clone();
    let base = spawn(
        Router::new()
            .route("/dj-rest-auth/login/", login_route(Recorder::new()))
            .route(
                "/dj-rest-auth/user/",
                user_route(Recorder::new(), json!({ "username": "testuser" })),
            )
            .route(
                "/dj-rest-auth/logout/",
                post(move |headers: HeaderMap| async move {
                    logout.hit(&headers);
                    StatusCode::OK
                }),
            ),
    )
    .await;
    let (app, tokens) = signed_in_app(&base, "tok", None);
    app.session.restore().await.expect("session should restore");
    assert_eq!(app.session.state(), SessionState::Authenticated);

    let err = app.session.login("testuser", "wrong").await.unwrap_err();

    assert!(matches!(err, ApiError::Validation(_)), "got {:?}", err);
    // The earlier session was ended explicitly, not left half replaced.
    assert_eq!(logout_calls.auth_headers(), vec![bearer("tok")]);
    assert_eq!(app.session.state(), SessionState::Anonymous);
    assert!(app.session.current_user().is_none());
    assert!(tokens.entries().is_empty());
}
