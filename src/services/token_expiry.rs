// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reading the expiry of JWT access tokens.
//!
//! The client cannot verify signatures (it has no key) and does not need
//! to: the expiry is only used to refresh a little early. Tokens that are
//! not JWTs have no known expiry.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
use serde::Deserialize;

#[derive(Deserialize)]
struct ExpiryClaims {
    exp: i64,
}

/// Expiry time of a JWT access token, or `None` for opaque tokens.
pub fn access_token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let header = decode_header(token).ok()?;

    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
    DateTime::from_timestamp(data.claims.exp, 0)
}

/// Whether `token` expires before `now + margin`.
pub fn expires_within(token: &str, margin: Duration, now: DateTime<Utc>) -> bool {
    access_token_expiry(token).is_some_and(|exp| exp <= now + margin)
}
