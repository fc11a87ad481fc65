// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use newtype_uuid::{TypedUuid, TypedUuidKind, TypedUuidTag};

/// A kind for [`TestResultUuid`].
pub enum TestResultKind {}

impl TypedUuidKind for TestResultKind {
    #[inline]
    fn tag() -> TypedUuidTag {
        const TAG: TypedUuidTag = TypedUuidTag::new("test_result");
        TAG
    }
}

/// The identity token of a single test result.
///
/// A fresh v4 uuid is allocated for every test. The same value names the result file on disk.
pub type TestResultUuid = TypedUuid<TestResultKind>;
