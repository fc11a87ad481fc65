// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The identity registry: which result a worker is currently building.
//!
//! Each worker owns its own [`IdentityContext`], so one worker can never observe another's token.
//! Sub-work spawned while a test runs takes a copy with [`IdentityContext::fork`].

use allure_model::TestResultUuid;
use tracing::debug;

/// The test identity bound to one worker.
#[derive(Clone, Debug, Default)]
pub struct IdentityContext {
    current: Option<TestResultUuid>,
}

impl IdentityContext {
    /// Creates a context with no identity bound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bound identity, generating a fresh random one on first access.
    pub fn current_identity(&mut self) -> TestResultUuid {
        *self.current.get_or_insert_with(|| {
            let uuid = TestResultUuid::new_v4();
            debug!("identity: bound {uuid}");
            uuid
        })
    }

    /// Returns the bound identity without generating one.
    pub fn peek(&self) -> Option<TestResultUuid> {
        self.current
    }

    /// Removes the binding, returning the identity that was bound.
    pub fn release(&mut self) -> Option<TestResultUuid> {
        let released = self.current.take();
        if let Some(uuid) = released {
            debug!("identity: released {uuid}");
        }
        released
    }

    /// Derives a child context holding a copy of the identity bound right now.
    ///
    /// Later changes to either context are not seen by the other.
    pub fn fork(&self) -> Self {
        Self {
            current: self.current,
        }
    }
}
