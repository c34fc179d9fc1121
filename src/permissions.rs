// ABOUTME: Re-exports access policies from coderr-core
// ABOUTME: Principal, profile references, and role/ownership checks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

pub use coderr_core::permissions::*;
