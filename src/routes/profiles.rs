// ABOUTME: Profile route handlers for viewing, editing, and listing marketplace profiles
// ABOUTME: Merges account fields and profile fields into a single flat profile view
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::constants::limits;
use crate::database::{ProfileAccount, ProfileChanges};
use crate::errors::AppError;
use crate::middleware::Caller;
use crate::models::{wire_datetime, ProfileType};
use crate::permissions::{require_authenticated, require_profile_owner};
use crate::resources::ServerResources;
use crate::routes::links::Links;
use crate::routes::payload::{parse_body, FieldReader, Payload};
use crate::routes::{authorize, no_match, parse_id};

const MODEL: &str = "UserProfile";

/// Flattened profile and account view
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    /// Profile id
    pub user: i64,
    /// Account name
    pub username: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Absolute URL of the profile file
    pub file: Option<String>,
    /// Location text
    pub location: String,
    /// Phone number
    pub tel: String,
    /// Free text
    pub description: String,
    /// Availability
    pub working_hours: String,
    /// Profile role
    #[serde(rename = "type")]
    pub profile_type: ProfileType,
    /// Account email
    pub email: String,
    /// Profile creation time
    #[serde(serialize_with = "wire_datetime")]
    pub created_at: DateTime<Utc>,
}

impl ProfileResponse {
    fn new(account: ProfileAccount, links: &Links) -> Self {
        let ProfileAccount { profile, user } = account;
        Self {
            user: profile.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            file: links.media_opt(profile.file.as_deref()),
            location: profile.location,
            tel: profile.tel,
            description: profile.description,
            working_hours: profile.working_hours,
            profile_type: profile.profile_type,
            email: user.email,
            created_at: profile.created_at,
        }
    }
}

/// Profile routes
pub struct ProfileRoutes;

impl ProfileRoutes {
    /// Create all profile routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/profile/:pk",
                get(Self::handle_get)
                    .patch(Self::handle_update)
                    .put(Self::handle_update),
            )
            .route("/api/profiles/business", get(Self::handle_list_business))
            .route("/api/profiles/customer", get(Self::handle_list_customer))
            .with_state(resources)
    }

    /// Handle GET /api/profile/{pk}/
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        caller: Caller,
        Path(pk): Path<String>,
    ) -> Result<Response, AppError> {
        authorize(
            require_authenticated(caller.principal()),
            &caller,
            "profile",
            "read",
        )?;
        caller.throttle(&resources)?;

        let profile_id = parse_id(&pk, MODEL)?;
        let account = resources
            .database
            .users()
            .get_profile(profile_id)
            .await?
            .ok_or_else(|| no_match(MODEL))?;

        let links = Links::for_request(&resources.config, &headers);
        Ok((StatusCode::OK, Json(ProfileResponse::new(account, &links))).into_response())
    }

    /// Handle PATCH and PUT /api/profile/{pk}/; both apply a partial update
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        caller: Caller,
        Path(pk): Path<String>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let principal = authorize(
            require_authenticated(caller.principal()),
            &caller,
            "profile",
            "update",
        )?;
        caller.throttle(&resources)?;

        let profile_id = parse_id(&pk, MODEL)?;
        let users = resources.database.users();
        let account = users
            .get_profile(profile_id)
            .await?
            .ok_or_else(|| no_match(MODEL))?;
        authorize(
            require_profile_owner(principal, account.user.id),
            &caller,
            "profile",
            "update",
        )?;

        let payload = parse_body(&body)?;
        let changes = read_profile_changes(&payload)?;
        users.update_profile(&account, &changes).await?;
        info!(profile.id = profile_id, "Profile updated");

        let account = users
            .get_profile(profile_id)
            .await?
            .ok_or_else(|| no_match(MODEL))?;
        let links = Links::for_request(&resources.config, &headers);
        Ok((StatusCode::OK, Json(ProfileResponse::new(account, &links))).into_response())
    }

    /// Handle GET /api/profiles/business/
    async fn handle_list_business(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        caller: Caller,
    ) -> Result<Response, AppError> {
        Self::list(&resources, &headers, &caller, ProfileType::Business).await
    }

    /// Handle GET /api/profiles/customer/
    async fn handle_list_customer(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        caller: Caller,
    ) -> Result<Response, AppError> {
        Self::list(&resources, &headers, &caller, ProfileType::Customer).await
    }

    async fn list(
        resources: &ServerResources,
        headers: &HeaderMap,
        caller: &Caller,
        profile_type: ProfileType,
    ) -> Result<Response, AppError> {
        authorize(
            require_authenticated(caller.principal()),
            caller,
            "profiles",
            "list",
        )?;
        caller.throttle(resources)?;

        let links = Links::for_request(&resources.config, headers);
        let profiles: Vec<ProfileResponse> = resources
            .database
            .users()
            .list_profiles(profile_type)
            .await?
            .into_iter()
            .map(|account| ProfileResponse::new(account, &links))
            .collect();
        Ok((StatusCode::OK, Json(profiles)).into_response())
    }
}

/// Validate the writable profile and account fields; `id`, `user` and `created_at` are ignored
fn read_profile_changes(payload: &Payload) -> Result<ProfileChanges, AppError> {
    let mut reader = FieldReader::partial(payload);
    let changes = ProfileChanges {
        first_name: reader.optional_string("first_name", Some(limits::NAME_MAX_LENGTH)),
        last_name: reader.optional_string("last_name", Some(limits::NAME_MAX_LENGTH)),
        email: reader.optional_email("email", limits::EMAIL_MAX_LENGTH),
        profile_type: reader.choice("type", false, ProfileType::parse),
        file: reader.nullable_string("file"),
        location: reader.optional_string("location", Some(limits::LOCATION_MAX_LENGTH)),
        tel: reader.optional_string("tel", Some(limits::TEL_MAX_LENGTH)),
        description: reader.optional_string("description", None),
        working_hours: reader
            .optional_string("working_hours", Some(limits::WORKING_HOURS_MAX_LENGTH)),
    };
    reader.finish()?;
    Ok(changes)
}
