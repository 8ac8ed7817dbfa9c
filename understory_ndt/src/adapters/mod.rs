// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapters to feed geometry from other crates into maps.
//!
//! Enabled via feature flags so the core only depends on `nalgebra`.

#[cfg(feature = "kurbo")]
pub mod kurbo;
