// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Client-facing messages, pagination limits, throttle defaults, and validation bounds
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

//! Constants grouped by domain.

/// Client-facing messages that are part of the public API contract
pub mod messages {
    /// Missing required field
    pub const FIELD_REQUIRED: &str = "This field is required.";
    /// Field present with a null value
    pub const FIELD_NULL: &str = "This field may not be null.";
    /// Blank string in a required text field
    pub const FIELD_BLANK: &str = "This field may not be blank.";
    /// Value is not a string
    pub const NOT_A_STRING: &str = "Not a valid string.";
    /// Value is not an integer
    pub const NOT_AN_INTEGER: &str = "A valid integer is required.";
    /// Value is not a decimal number
    pub const NOT_A_NUMBER: &str = "A valid number is required.";
    /// Query filter value is not numeric
    pub const ENTER_A_NUMBER: &str = "Enter a number.";
    /// Value is not a list
    pub const NOT_A_LIST: &str = "Expected a list of items.";
    /// Malformed email address
    pub const INVALID_EMAIL: &str = "Enter a valid email address.";
    /// Username already registered
    pub const USERNAME_EXISTS: &str = "This username already exists.";
    /// Email already registered
    pub const EMAIL_EXISTS: &str = "This email already exists.";
    /// Registration password confirmation mismatch
    pub const PASSWORDS_DO_NOT_MATCH: &str = "Passwords do not match.";
    /// Login failure
    pub const INVALID_CREDENTIALS: &str = "Unable to log in with provided credentials.";
    /// Missing credentials on a protected endpoint
    pub const NOT_AUTHENTICATED: &str = "Authentication credentials were not provided.";
    /// Unknown token
    pub const INVALID_TOKEN: &str = "Invalid token.";
    /// Malformed `Authorization: Token` header
    pub const INVALID_TOKEN_HEADER: &str = "Invalid token header. No credentials provided.";
    /// Token owner deactivated
    pub const USER_INACTIVE: &str = "User inactive or deleted.";
    /// Generic permission failure
    pub const PERMISSION_DENIED: &str = "You do not have permission to perform this action.";
    /// Caller has no marketplace profile
    pub const PROFILE_NOT_FOUND: &str = "User profile not found.";
    /// Caller has no marketplace profile while creating a record
    pub const PROFILE_DOES_NOT_EXIST: &str = "User Profile does not exist.";
    /// Offer package could not be created
    pub const CREATE_DETAIL_FAILED: &str = "Create Detail failed.";
    /// Order target missing
    pub const OFFER_DETAIL_NOT_FOUND: &str = "OfferDetail not found.";
    /// Business profile id unknown for order counters
    pub const ID_DOES_NOT_EXIST: &str = "This id does not exist";
    /// Second review for the same business
    pub const DUPLICATE_REVIEW: &str =
        "You have already submitted a review for this business user.";
    /// Generic 404
    pub const NOT_FOUND: &str = "No record matches the given query.";
    /// Pagination past the last page
    pub const INVALID_PAGE: &str = "Invalid page.";
    /// Host header rejected
    pub const INVALID_HOST: &str = "Invalid HTTP_HOST header.";
    /// Masked 5xx message
    pub const SERVER_ERROR: &str = "A server error occurred.";
}

/// Offer list pagination
pub mod pagination {
    /// Page size when the client does not request one
    pub const DEFAULT_PAGE_SIZE: u32 = 6;
    /// Upper bound for the `page_size` query parameter
    pub const MAX_PAGE_SIZE: u32 = 100;
    /// Query parameter selecting the page
    pub const PAGE_QUERY_PARAM: &str = "page";
    /// Query parameter selecting the page size
    pub const PAGE_SIZE_QUERY_PARAM: &str = "page_size";
}

/// Default throttle rates
pub mod throttle {
    /// Anonymous callers across all endpoints
    pub const ANON: &str = "100/day";
    /// Authenticated callers across all endpoints
    pub const USER: &str = "1000/day";
    /// Login attempts
    pub const LOGIN: &str = "5/min";
    /// Account registrations
    pub const REGISTRATION: &str = "3/min";
    /// Order placements
    pub const ORDER_CREATE: &str = "20/hour";
}

/// Field bounds
pub mod limits {
    /// Maximum username length
    pub const USERNAME_MAX_LENGTH: usize = 150;
    /// Maximum email length
    pub const EMAIL_MAX_LENGTH: usize = 254;
    /// Maximum first/last name length
    pub const NAME_MAX_LENGTH: usize = 150;
    /// Maximum offer and package title length
    pub const TITLE_MAX_LENGTH: usize = 255;
    /// Maximum profile location length
    pub const LOCATION_MAX_LENGTH: usize = 255;
    /// Maximum profile telephone length
    pub const TEL_MAX_LENGTH: usize = 50;
    /// Maximum profile working hours length
    pub const WORKING_HOURS_MAX_LENGTH: usize = 255;
    /// Lowest review rating
    pub const MIN_RATING: i64 = 1;
    /// Highest review rating
    pub const MAX_RATING: i64 = 5;
    /// Digits allowed in a package price (including cents)
    pub const PRICE_MAX_DIGITS: usize = 10;
}

/// Wire formats
pub mod formats {
    /// Timestamp format for every datetime in responses
    pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
}
