// ABOUTME: Opaque token authentication and password hashing
// ABOUTME: Issues random tokens, stores keyed digests, and resolves Authorization headers to principals
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

//! # Authentication
//!
//! Clients authenticate with `Authorization: Token <key>`. Keys are 40 hex characters
//! drawn from the OS random source and are returned exactly once; the database only
//! keeps an HMAC-SHA256 digest keyed by `SECRET_KEY`, so a leaked table cannot be
//! replayed against the API.
//!
//! Passwords are hashed with bcrypt on the blocking thread pool.

use std::str;

use http::header::AUTHORIZATION;
use http::HeaderMap;
use rand::RngCore;
use ring::hmac;
use tokio::task;
use tracing::{debug, warn};

use crate::config::SecretKey;
use crate::constants::messages;
use crate::database::TokensManager;
use crate::errors::{AppError, AppResult};
use crate::permissions::Principal;

/// Authorization scheme keyword
pub const TOKEN_KEYWORD: &str = "Token";

/// Raw token length in bytes (hex encoded to 40 characters)
const TOKEN_BYTES: usize = 20;

/// Token and password operations
#[derive(Clone)]
pub struct AuthManager {
    key: hmac::Key,
    bcrypt_cost: u32,
}

impl AuthManager {
    /// Create an auth manager keyed by the server secret
    #[must_use]
    pub fn new(secret: &SecretKey, bcrypt_cost: u32) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes()),
            bcrypt_cost,
        }
    }

    /// Generate a fresh raw token
    #[must_use]
    pub fn generate_token() -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Storage digest of a raw token
    #[must_use]
    pub fn token_digest(&self, token: &str) -> String {
        hex::encode(hmac::sign(&self.key, token.as_bytes()).as_ref())
    }

    /// Generate a token and its digest
    #[must_use]
    pub fn issue_token(&self) -> (String, String) {
        let token = Self::generate_token();
        let digest = self.token_digest(&token);
        (token, digest)
    }

    /// Hash a password with the configured bcrypt cost
    ///
    /// # Errors
    ///
    /// Returns an internal error if hashing fails
    pub async fn hash_password(&self, password: &str) -> AppResult<String> {
        let password = password.to_owned();
        let cost = self.bcrypt_cost;
        task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
    }

    /// Check a password against a stored hash; malformed hashes never verify
    ///
    /// # Errors
    ///
    /// Returns an internal error if the blocking task panics
    pub async fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
            .await
            .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))
    }

    /// Resolve the request's `Authorization` header
    ///
    /// A missing header or a different scheme yields an anonymous request. A `Token`
    /// header that is malformed or unknown, or that belongs to an inactive account,
    /// fails with 401.
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` for rejected credentials or a database error
    pub async fn authenticate(
        &self,
        tokens: &TokensManager,
        headers: &HeaderMap,
    ) -> AppResult<Option<Principal>> {
        let Some(header) = headers.get(AUTHORIZATION) else {
            return Ok(None);
        };
        let Some(token) = parse_token_header(header.as_bytes())? else {
            return Ok(None);
        };

        let owner = tokens
            .find_owner(&self.token_digest(token))
            .await?
            .ok_or_else(|| {
                debug!("Rejected unknown token");
                AppError::auth_invalid(messages::INVALID_TOKEN)
            })?;

        if !owner.is_active {
            warn!(user.id = owner.principal.user_id, "Token presented for inactive user");
            return Err(AppError::auth_invalid(messages::USER_INACTIVE));
        }
        Ok(Some(owner.principal))
    }
}

/// Split an `Authorization` header value into its token
///
/// Returns `Ok(None)` when the scheme is not `Token`.
///
/// # Errors
///
/// Returns `AuthInvalid` when the scheme matches but the credentials are missing,
/// contain spaces, or are not valid text
pub fn parse_token_header(value: &[u8]) -> AppResult<Option<&str>> {
    let mut parts = value.split(u8::is_ascii_whitespace).filter(|p| !p.is_empty());
    let Some(scheme) = parts.next() else {
        return Ok(None);
    };
    if !scheme.eq_ignore_ascii_case(TOKEN_KEYWORD.as_bytes()) {
        return Ok(None);
    }

    let token = parts
        .next()
        .ok_or_else(|| AppError::auth_invalid(messages::INVALID_TOKEN_HEADER))?;
    if parts.next().is_some() {
        return Err(AppError::auth_invalid(
            "Invalid token header. Token string should not contain spaces.",
        ));
    }
    str::from_utf8(token)
        .map(Some)
        .map_err(|_| {
            AppError::auth_invalid(
                "Invalid token header. Token string should not contain invalid characters.",
            )
        })
}
