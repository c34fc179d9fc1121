// ABOUTME: Review route handlers for rating businesses and managing one's own reviews
// ABOUTME: Public reads with filters and ordering; customer-only writes limited to one review per business
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use url::form_urlencoded;

use crate::constants::{limits, messages};
use crate::database::{Review, ReviewChanges, ReviewOrderField, ReviewQuery};
use crate::errors::{AppError, AppResult, ValidationErrors};
use crate::middleware::Caller;
use crate::models::{wire_datetime, ProfileType};
use crate::permissions::{require_authenticated, require_customer, require_reviewer};
use crate::resources::ServerResources;
use crate::routes::payload::{parse_body, FieldReader, Payload};
use crate::routes::{authorize, no_match, parse_id};

const MODEL: &str = "Review";

/// Review representation
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    /// Review id
    pub id: i64,
    /// Reviewed business profile id
    pub business_user: i64,
    /// Authoring customer profile id
    pub reviewer: i64,
    /// Stars
    pub rating: i64,
    /// Review text
    pub description: String,
    /// Creation time
    #[serde(serialize_with = "wire_datetime")]
    pub created_at: DateTime<Utc>,
    /// Last modification time
    #[serde(serialize_with = "wire_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            business_user: review.business_profile_id,
            reviewer: review.reviewer_profile_id,
            rating: review.rating,
            description: review.description,
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}

/// Review routes
pub struct ReviewRoutes;

impl ReviewRoutes {
    /// Create all review routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/reviews",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route(
                "/api/reviews/:id",
                get(Self::handle_get)
                    .patch(Self::handle_patch)
                    .put(Self::handle_put)
                    .delete(Self::handle_delete),
            )
            .with_state(resources)
    }

    /// Handle GET /api/reviews/
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        caller: Caller,
        RawQuery(raw_query): RawQuery,
    ) -> Result<Response, AppError> {
        caller.throttle(&resources)?;

        let query = parse_review_query(raw_query.as_deref())?;
        let reviews: Vec<ReviewResponse> = resources
            .database
            .reviews()
            .list(&query)
            .await?
            .into_iter()
            .map(ReviewResponse::from)
            .collect();
        Ok((StatusCode::OK, Json(reviews)).into_response())
    }

    /// Handle POST /api/reviews/
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        caller: Caller,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let principal = authorize(
            require_customer(caller.principal()),
            &caller,
            "review",
            "create",
        )?;
        caller.throttle(&resources)?;

        let payload = parse_body(&body)?;
        let mut reader = FieldReader::new(&payload);
        let business_user = reader.integer("business_user", true, None, None);
        let rating = reader.integer(
            "rating",
            true,
            Some(limits::MIN_RATING),
            Some(limits::MAX_RATING),
        );
        let description = reader.optional_string("description", None).unwrap_or_default();
        if let Some(profile_id) = business_user {
            let profile_type = resources.database.users().profile_type(profile_id).await?;
            if profile_type != Some(ProfileType::Business) {
                reader.error(
                    "business_user",
                    format!("Invalid pk \"{profile_id}\" - object does not exist."),
                );
            }
        }
        reader.finish()?;
        let (Some(business_profile_id), Some(rating), Some(reviewer_profile_id)) =
            (business_user, rating, principal.profile_id())
        else {
            return Err(AppError::internal("Review fields missing after validation"));
        };

        let reviews = resources.database.reviews();
        if reviews
            .exists_for_pair(business_profile_id, reviewer_profile_id)
            .await?
        {
            return Err(AppError::invalid_input(messages::DUPLICATE_REVIEW));
        }
        let review = reviews
            .create(business_profile_id, reviewer_profile_id, rating, &description)
            .await?;
        info!(
            review.id = review.id,
            business.id = business_profile_id,
            reviewer.id = reviewer_profile_id,
            "Review created"
        );

        Ok((StatusCode::CREATED, Json(ReviewResponse::from(review))).into_response())
    }

    /// Handle GET /api/reviews/{id}/
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        caller: Caller,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        caller.throttle(&resources)?;

        let review_id = parse_id(&id, MODEL)?;
        let review = resources
            .database
            .reviews()
            .get(review_id)
            .await?
            .ok_or_else(|| no_match(MODEL))?;
        Ok((StatusCode::OK, Json(ReviewResponse::from(review))).into_response())
    }

    /// Handle PATCH /api/reviews/{id}/
    async fn handle_patch(
        State(resources): State<Arc<ServerResources>>,
        caller: Caller,
        Path(id): Path<String>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        Self::update(&resources, &caller, &id, &body, true).await
    }

    /// Handle PUT /api/reviews/{id}/
    async fn handle_put(
        State(resources): State<Arc<ServerResources>>,
        caller: Caller,
        Path(id): Path<String>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        Self::update(&resources, &caller, &id, &body, false).await
    }

    async fn update(
        resources: &ServerResources,
        caller: &Caller,
        id: &str,
        body: &[u8],
        partial: bool,
    ) -> Result<Response, AppError> {
        let principal = authorize(
            require_authenticated(caller.principal()),
            caller,
            "review",
            "update",
        )?;
        caller.throttle(resources)?;

        let review_id = parse_id(id, MODEL)?;
        let reviews = resources.database.reviews();
        let review = reviews.get(review_id).await?.ok_or_else(|| no_match(MODEL))?;
        authorize(
            require_reviewer(principal, review.reviewer_profile_id),
            caller,
            "review",
            "update",
        )?;

        let payload = parse_body(body)?;
        let changes = read_review_changes(&payload, partial)?;
        let review = reviews.update(&review, &changes).await?;
        info!(review.id = review_id, partial, "Review updated");

        Ok((StatusCode::OK, Json(ReviewResponse::from(review))).into_response())
    }

    /// Handle DELETE /api/reviews/{id}/
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        caller: Caller,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let principal = authorize(
            require_authenticated(caller.principal()),
            &caller,
            "review",
            "delete",
        )?;
        caller.throttle(&resources)?;

        let review_id = parse_id(&id, MODEL)?;
        let reviews = resources.database.reviews();
        let review = reviews.get(review_id).await?.ok_or_else(|| no_match(MODEL))?;
        authorize(
            require_reviewer(principal, review.reviewer_profile_id),
            &caller,
            "review",
            "delete",
        )?;

        if !reviews.delete(review_id).await? {
            return Err(no_match(MODEL));
        }
        info!(review.id = review_id, "Review deleted");
        Ok(StatusCode::NO_CONTENT.into_response())
    }
}

/// Build list filters from the query string; later duplicates win
fn parse_review_query(raw_query: Option<&str>) -> AppResult<ReviewQuery> {
    let mut query = ReviewQuery::default();
    let mut errors = ValidationErrors::new();

    let pairs = raw_query
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect::<Vec<_>>())
        .unwrap_or_default();
    for (key, value) in pairs {
        let value = value.trim();
        match key.as_str() {
            "business_user_id" | "reviewer_id" if value.is_empty() => {}
            "business_user_id" | "reviewer_id" => {
                let Ok(id) = value.parse::<i64>() else {
                    errors.add(&key, messages::ENTER_A_NUMBER);
                    continue;
                };
                if key == "business_user_id" {
                    query.business_user_id = Some(id);
                } else {
                    query.reviewer_id = Some(id);
                }
            }
            "ordering" => {
                if let Some(ordering) = value.split(',').map(str::trim).find_map(|term| {
                    let (descending, field) = term
                        .strip_prefix('-')
                        .map_or((false, term), |field| (true, field));
                    ReviewOrderField::parse(field).map(|field| (field, descending))
                }) {
                    query.ordering = ordering;
                }
            }
            _ => {}
        }
    }

    errors.into_result()?;
    Ok(query)
}

fn read_review_changes(payload: &Payload, partial: bool) -> AppResult<ReviewChanges> {
    let mut reader = if partial {
        FieldReader::partial(payload)
    } else {
        FieldReader::new(payload)
    };
    let changes = ReviewChanges {
        rating: reader.integer(
            "rating",
            true,
            Some(limits::MIN_RATING),
            Some(limits::MAX_RATING),
        ),
        description: reader.blankable_string("description", None),
    };
    reader.finish()?;
    Ok(changes)
}
