// ABOUTME: Re-exports the unified error types from coderr-core
// ABOUTME: Keeps AppError and ErrorCode the same type across the workspace
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

pub use coderr_core::errors::*;
