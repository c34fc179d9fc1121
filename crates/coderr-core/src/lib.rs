// ABOUTME: Core types and constants for the Coderr marketplace API
// ABOUTME: Foundation crate with error handling, domain enums, pagination, and access policies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

#![deny(unsafe_code)]

//! # Coderr Core
//!
//! Foundation crate providing shared types for the Coderr freelancer marketplace.
//! It changes rarely and has no storage or HTTP server dependencies of its own.
//!
//! ## Modules
//!
//! - **errors**: `AppError`, `ErrorCode`, and field-level `ValidationErrors`
//! - **constants**: Client-facing messages, limits, and defaults
//! - **models**: Profile types, package tiers, order status, and prices
//! - **pagination**: Page-number pagination with absolute links
//! - **permissions**: Role and ownership checks with 401/403 semantics

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Domain enums and value types
pub mod models;

/// Page-number pagination for list endpoints
pub mod pagination;

/// Role and ownership policies
pub mod permissions;
