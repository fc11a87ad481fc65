// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

mod concurrency;
mod filesystem;
mod fixtures;
mod scenarios;
