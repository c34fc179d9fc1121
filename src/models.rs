// ABOUTME: Re-exports domain enums and value types from coderr-core
// ABOUTME: Profile types, package tiers, order status, and prices
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

pub use coderr_core::models::*;
