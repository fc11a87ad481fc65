// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! History ids: stable keys that group the same logical test across independent runs.
//!
//! A history id is a pure function of the class name and the method name. The digest is selected
//! once, from configuration; an unknown name is rejected when the configuration is loaded.

use crate::errors::HistoryIdAlgorithmParseError;
use sha2::{Digest, Sha256};
use std::{fmt, str::FromStr};
use xxhash_rust::xxh3::Xxh3;

/// The digest used to compute history ids.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum HistoryIdAlgorithm {
    /// SHA-256, rendered as 64 hex digits.
    #[default]
    Sha256,

    /// 128-bit XXH3, rendered as 32 hex digits.
    Xxh3_128,
}

impl HistoryIdAlgorithm {
    /// Returns the names of all known algorithms.
    pub fn variants() -> &'static [&'static str] {
        &["sha256", "xxh3-128"]
    }

    /// Returns the configuration name of this algorithm.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Xxh3_128 => "xxh3-128",
        }
    }

    /// The length of the hex string this algorithm produces.
    pub const fn hex_len(self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Xxh3_128 => 32,
        }
    }
}

impl fmt::Display for HistoryIdAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryIdAlgorithm {
    type Err = HistoryIdAlgorithmParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha256" => Ok(Self::Sha256),
            "xxh3-128" => Ok(Self::Xxh3_128),
            other => Err(HistoryIdAlgorithmParseError::new(other)),
        }
    }
}

/// Computes history ids with a fixed algorithm.
#[derive(Copy, Clone, Debug, Default)]
pub struct HistoryIdComputer {
    algorithm: HistoryIdAlgorithm,
}

impl HistoryIdComputer {
    /// Creates a new computer using the given algorithm.
    pub fn new(algorithm: HistoryIdAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Returns the algorithm in use.
    pub fn algorithm(&self) -> HistoryIdAlgorithm {
        self.algorithm
    }

    /// Computes the history id of `class_name` concatenated with `method_name`.
    ///
    /// Class-level descriptors have no method; the class name alone is hashed.
    pub fn history_id(&self, class_name: &str, method_name: Option<&str>) -> String {
        let method_name = method_name.unwrap_or_default();
        match self.algorithm {
            HistoryIdAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(class_name.as_bytes());
                hasher.update(method_name.as_bytes());
                hex::encode(hasher.finalize())
            }
            HistoryIdAlgorithm::Xxh3_128 => {
                let mut hasher = Xxh3::new();
                hasher.update(class_name.as_bytes());
                hasher.update(method_name.as_bytes());
                // Pad to 32 hex digits (128 bits).
                format!("{:032x}", hasher.digest128())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;
    use test_strategy::proptest;

    #[test_case(HistoryIdAlgorithm::Sha256 ; "sha256")]
    #[test_case(HistoryIdAlgorithm::Xxh3_128 ; "xxh3")]
    fn fixed_length_lowercase_hex(algorithm: HistoryIdAlgorithm) {
        let computer = HistoryIdComputer::new(algorithm);
        for (class_name, method_name) in [
            ("com.example.Foo", Some("shouldWork")),
            ("", None),
            ("Foo", Some("")),
        ] {
            let id = computer.history_id(class_name, method_name);
            assert_eq!(id.len(), algorithm.hex_len(), "{id} has the expected length");
            assert!(
                id.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')),
                "{id} is lowercase hex"
            );
        }
    }

    #[test]
    fn sha256_matches_known_digest() {
        let computer = HistoryIdComputer::new(HistoryIdAlgorithm::Sha256);
        // sha256("abc")
        assert_eq!(
            computer.history_id("a", Some("bc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn missing_method_hashes_class_alone() {
        let computer = HistoryIdComputer::default();
        assert_eq!(
            computer.history_id("com.example.Foo", None),
            computer.history_id("com.example.Foo", Some("")),
        );
    }

    #[test_case("sha256", Some(HistoryIdAlgorithm::Sha256))]
    #[test_case("xxh3-128", Some(HistoryIdAlgorithm::Xxh3_128))]
    #[test_case("md5", None)]
    #[test_case("SHA256", None)]
    fn parse_algorithm(input: &str, expected: Option<HistoryIdAlgorithm>) {
        match (input.parse::<HistoryIdAlgorithm>(), expected) {
            (Ok(actual), Some(expected)) => assert_eq!(actual, expected),
            (Err(error), None) => assert_eq!(error.input(), input),
            (actual, expected) => panic!("for {input}, got {actual:?}, expected {expected:?}"),
        }
    }

    #[proptest(cases = 64)]
    fn history_id_is_deterministic(class_name: String, method_name: Option<String>) {
        for algorithm in [HistoryIdAlgorithm::Sha256, HistoryIdAlgorithm::Xxh3_128] {
            let computer = HistoryIdComputer::new(algorithm);
            assert_eq!(
                computer.history_id(&class_name, method_name.as_deref()),
                computer.history_id(&class_name, method_name.as_deref()),
            );
        }
    }

    #[proptest(cases = 64)]
    fn distinct_methods_get_distinct_ids(
        class_name: String,
        method_a: String,
        #[filter(#method_a != #method_b)] method_b: String,
    ) {
        let computer = HistoryIdComputer::default();
        assert_ne!(
            computer.history_id(&class_name, Some(&method_a)),
            computer.history_id(&class_name, Some(&method_b)),
        );
    }
}
