// ABOUTME: Role and ownership policies for marketplace resources
// ABOUTME: Maps denied checks to 401 for anonymous callers and 403 for authenticated ones
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

//! # Access policies
//!
//! Every policy takes the resolved caller (`None` for anonymous requests) and returns
//! `Ok` or the error the endpoint must answer with. Anonymous callers always receive
//! `401 Authentication credentials were not provided.`; authenticated callers that fail
//! a check receive `403`.

use crate::constants::messages;
use crate::errors::{AppError, AppResult};
use crate::models::ProfileType;

/// The caller's marketplace profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileRef {
    /// Profile id (the id exposed as `user` in the API)
    pub id: i64,
    /// Customer or business
    pub profile_type: ProfileType,
}

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Account id
    pub user_id: i64,
    /// Login name
    pub username: String,
    /// Staff or superuser
    pub is_staff: bool,
    /// Marketplace profile, absent for back-office accounts
    pub profile: Option<ProfileRef>,
}

impl Principal {
    /// Profile id when the caller has one
    #[must_use]
    pub fn profile_id(&self) -> Option<i64> {
        self.profile.map(|p| p.id)
    }

    /// Whether the caller has a profile of the given type
    #[must_use]
    pub fn has_profile_type(&self, profile_type: ProfileType) -> bool {
        self.profile.is_some_and(|p| p.profile_type == profile_type)
    }
}

/// The two profiles an order connects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderParties {
    /// Profile that placed the order
    pub customer_profile_id: i64,
    /// Profile owning the ordered offer
    pub business_profile_id: i64,
}

fn deny(principal: Option<&Principal>) -> AppError {
    match principal {
        None => AppError::auth_required(),
        Some(_) => AppError::permission_denied(messages::PERMISSION_DENIED),
    }
}

/// Any authenticated caller
///
/// # Errors
///
/// Returns 401 for anonymous callers
pub fn require_authenticated(principal: Option<&Principal>) -> AppResult<&Principal> {
    principal.ok_or_else(AppError::auth_required)
}

/// Authenticated caller with a business profile (offer creation)
///
/// # Errors
///
/// Returns 401 for anonymous callers and 403 for everyone else without a business profile
pub fn require_business(principal: Option<&Principal>) -> AppResult<&Principal> {
    match principal {
        Some(p) if p.has_profile_type(ProfileType::Business) => Ok(p),
        _ => Err(deny(principal)),
    }
}

/// Authenticated caller with a customer profile (review creation)
///
/// # Errors
///
/// Returns 401 for anonymous callers and 403 for everyone else without a customer profile
pub fn require_customer(principal: Option<&Principal>) -> AppResult<&Principal> {
    match principal {
        Some(p) if p.has_profile_type(ProfileType::Customer) => Ok(p),
        _ => Err(deny(principal)),
    }
}

/// Caller is the account behind a profile (`profile_user_id` is the profile's account id)
///
/// # Errors
///
/// Returns 403 when the profile belongs to someone else
pub fn require_profile_owner(principal: &Principal, profile_user_id: i64) -> AppResult<()> {
    if principal.user_id == profile_user_id {
        Ok(())
    } else {
        Err(deny(Some(principal)))
    }
}

/// Caller's profile published the offer
///
/// # Errors
///
/// Returns 403 for anyone but the publishing business
pub fn require_offer_owner(principal: &Principal, offer_profile_id: i64) -> AppResult<()> {
    if principal.profile_id() == Some(offer_profile_id) {
        Ok(())
    } else {
        Err(deny(Some(principal)))
    }
}

/// Whether the caller may read an order: staff, the ordering profile, or the offering business
#[must_use]
pub fn is_order_party(principal: &Principal, parties: OrderParties) -> bool {
    principal.is_staff
        || principal.profile_id().is_some_and(|id| {
            id == parties.customer_profile_id || id == parties.business_profile_id
        })
}

/// Read access to an order
///
/// # Errors
///
/// Returns 403 when the caller is not a party to the order
pub fn require_order_read(principal: &Principal, parties: OrderParties) -> AppResult<()> {
    if is_order_party(principal, parties) {
        Ok(())
    } else {
        Err(deny(Some(principal)))
    }
}

/// Status updates: staff or the business owning the ordered offer
///
/// # Errors
///
/// Returns 403 for customers and unrelated businesses
pub fn require_order_write(principal: &Principal, parties: OrderParties) -> AppResult<()> {
    let is_owner = principal.has_profile_type(ProfileType::Business)
        && principal.profile_id() == Some(parties.business_profile_id);
    if principal.is_staff || is_owner {
        Ok(())
    } else {
        Err(deny(Some(principal)))
    }
}

/// Order deletion is reserved to staff
///
/// # Errors
///
/// Returns 403 for non-staff callers
pub fn require_staff(principal: &Principal) -> AppResult<()> {
    if principal.is_staff {
        Ok(())
    } else {
        Err(deny(Some(principal)))
    }
}

/// Caller's profile authored the review
///
/// # Errors
///
/// Returns 403 for anyone but the reviewer
pub fn require_reviewer(principal: &Principal, reviewer_profile_id: i64) -> AppResult<()> {
    if principal.profile_id() == Some(reviewer_profile_id) {
        Ok(())
    } else {
        Err(deny(Some(principal)))
    }
}
