// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The event dispatcher: runner callbacks in, test results out.
//!
//! Each worker follows `NotStarted -> Running -> Finished` for a test that runs, or
//! `NotStarted -> Ignored` for one that is skipped. The identity bound when a test starts is used
//! for every mutation of its result and released exactly once, on whichever terminal callback
//! arrives.

mod context;
mod events;
mod imp;

pub use context::*;
pub use events::*;
pub use imp::*;
