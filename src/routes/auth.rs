// ABOUTME: Account route handlers for registration and token login
// ABOUTME: Creates user, profile, and token in one step and exchanges credentials for fresh tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

//! Authentication routes
//!
//! Both endpoints are public and carry their own scoped throttle instead of the
//! default anon/user pair.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use crate::constants::{limits, messages};
use crate::database::NewUser;
use crate::errors::AppError;
use crate::logging::AppLogger;
use crate::middleware::Caller;
use crate::models::ProfileType;
use crate::rate_limiting::ThrottleScope;
use crate::resources::ServerResources;
use crate::routes::payload::{parse_body, FieldReader};

/// Token handed out by registration and login
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Raw token for the `Authorization: Token` header
    pub token: String,
    /// Account name
    pub username: String,
    /// Account email
    pub email: String,
    /// Profile id, `null` for accounts without a profile
    pub user_id: Option<i64>,
}

/// Registration and login routes
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/registration", post(Self::handle_register))
            .route("/api/login", post(Self::handle_login))
            .with_state(resources)
    }

    /// Handle POST /api/registration/
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        caller: Caller,
        body: Bytes,
    ) -> Result<Response, AppError> {
        resources.throttler.enforce_scope(
            ThrottleScope::Registration,
            caller.principal(),
            &caller.client_ip,
        )?;

        let payload = parse_body(&body)?;
        let users = resources.database.users();

        let mut reader = FieldReader::new(&payload);
        let username = reader.required_string("username", Some(limits::USERNAME_MAX_LENGTH));
        let password = reader.required_string("password", None);
        let repeated_password = reader.required_string("repeated_password", None);
        let email = reader.email("email", limits::EMAIL_MAX_LENGTH);
        let profile_type = reader.choice("type", true, ProfileType::parse);

        if let Some(name) = &username {
            if users.username_exists(name).await? {
                reader.error("username", messages::USERNAME_EXISTS);
            }
        }
        if let Some(address) = &email {
            if users.email_exists(address).await? {
                reader.error("email", messages::EMAIL_EXISTS);
            }
        }
        reader.finish()?;

        let (
            Some(username),
            Some(password),
            Some(repeated_password),
            Some(email),
            Some(profile_type),
        ) = (username, password, repeated_password, email, profile_type)
        else {
            return Err(AppError::internal("Registration fields missing after validation"));
        };
        if password != repeated_password {
            return Err(AppError::non_field(messages::PASSWORDS_DO_NOT_MATCH));
        }

        let password_hash = resources.auth.hash_password(&password).await?;
        let (token, digest) = resources.auth.issue_token();
        let new_user = NewUser {
            username,
            email,
            password_hash,
            is_staff: false,
            is_superuser: false,
        };
        let (user, profile) = users
            .create(&new_user, Some(profile_type), Some(&digest))
            .await?;

        AppLogger::log_auth_event(&user.username, "registration", true, &caller.client_ip);
        info!(user.id = user.id, profile.kind = %profile_type, "Registered account");

        let response = TokenResponse {
            token,
            username: user.username,
            email: user.email,
            user_id: profile.map(|p| p.id),
        };
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle POST /api/login/
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        caller: Caller,
        body: Bytes,
    ) -> Result<Response, AppError> {
        resources.throttler.enforce_scope(
            ThrottleScope::Login,
            caller.principal(),
            &caller.client_ip,
        )?;

        let payload = parse_body(&body)?;
        let mut reader = FieldReader::new(&payload);
        let username = reader.required_string("username", None);
        let password = reader.untrimmed_string("password");
        reader.finish()?;
        let (Some(username), Some(password)) = (username, password) else {
            return Err(AppError::internal("Login fields missing after validation"));
        };

        let users = resources.database.users();
        let user = match users.get_by_username(&username).await? {
            Some(user) if user.is_active => user,
            _ => {
                AppLogger::log_auth_event(&username, "login", false, &caller.client_ip);
                return Err(AppError::non_field(messages::INVALID_CREDENTIALS));
            }
        };
        if !resources
            .auth
            .verify_password(&password, &user.password_hash)
            .await?
        {
            AppLogger::log_auth_event(&username, "login", false, &caller.client_ip);
            return Err(AppError::non_field(messages::INVALID_CREDENTIALS));
        }

        let (token, digest) = resources.auth.issue_token();
        resources.database.tokens().create(&digest, user.id).await?;
        let profile = users.get_profile_for_user(user.id).await?;

        AppLogger::log_auth_event(&user.username, "login", true, &caller.client_ip);

        let response = TokenResponse {
            token,
            username: user.username,
            email: user.email,
            user_id: profile.map(|p| p.id),
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
