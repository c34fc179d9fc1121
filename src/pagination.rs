// ABOUTME: Re-exports pagination types from coderr-core for unified type identity
// ABOUTME: Ensures Page/PageParams are the same type across all workspace crates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coderr

pub use coderr_core::pagination::*;
