// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Listener configuration.
//!
//! Configuration is read from `allure.toml` and layered over an embedded default. A few settings
//! can also be overridden through environment variables, which take precedence over the file.

use crate::{
    errors::ConfigError,
    history::{HistoryIdAlgorithm, HistoryIdComputer},
    metadata::{CustomLabelKind, LinkPatterns, MetadataExtractor},
};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::Deserialize;
use std::{
    collections::{BTreeSet, HashSet},
    io,
};
use tracing::{debug, warn};

/// The config file looked up in the working directory by [`ListenerConfigLocation::Default`].
pub const DEFAULT_CONFIG_FILE: &str = "allure.toml";

/// Special value for [`ListenerConfigLocation::from_cli_or_env`] that skips loading a config file.
pub const CONFIG_NONE: &str = "none";

/// Specifies where to load configuration from.
#[derive(Clone, Copy, Debug)]
pub enum ListenerConfigLocation<'a> {
    /// Read [`DEFAULT_CONFIG_FILE`] from the working directory, if it exists.
    Default,

    /// Skip loading a config file, using only built-in defaults.
    Isolated,

    /// Load configuration from an explicit path.
    ///
    /// Returns an error if the file does not exist.
    Explicit(&'a Utf8Path),
}

impl<'a> ListenerConfigLocation<'a> {
    /// Creates a location from the value of an environment variable or CLI option.
    ///
    /// Returns `Default` if `None`, `Isolated` if `"none"`, otherwise `Explicit` with the path.
    pub fn from_cli_or_env(s: Option<&'a str>) -> Self {
        match s {
            None => Self::Default,
            Some(s) if s == CONFIG_NONE => Self::Isolated,
            Some(s) => Self::Explicit(Utf8Path::new(s)),
        }
    }
}

/// Settings taken from environment variables.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EnvOverrides {
    /// From `ALLURE_RESULTS_DIRECTORY`.
    pub results_directory: Option<Utf8PathBuf>,

    /// From `ALLURE_HOST_NAME`.
    pub host_name: Option<String>,

    /// From `ALLURE_THREAD_NAME`.
    pub thread_name: Option<String>,
}

impl EnvOverrides {
    /// Environment variable overriding `results-directory`.
    pub const RESULTS_DIRECTORY_ENV: &'static str = "ALLURE_RESULTS_DIRECTORY";

    /// Environment variable overriding `host-name`.
    pub const HOST_NAME_ENV: &'static str = "ALLURE_HOST_NAME";

    /// Environment variable overriding `thread-name`.
    pub const THREAD_NAME_ENV: &'static str = "ALLURE_THREAD_NAME";

    /// Reads overrides from the process environment. Empty values are ignored.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|value| !value.is_empty());
        Self {
            results_directory: var(Self::RESULTS_DIRECTORY_ENV).map(Utf8PathBuf::from),
            host_name: var(Self::HOST_NAME_ENV),
            thread_name: var(Self::THREAD_NAME_ENV),
        }
    }
}

/// Listener configuration after defaults, the config file and environment overrides have been
/// applied.
#[derive(Clone, Debug)]
pub struct ListenerConfig {
    results_directory: Utf8PathBuf,
    history_id_algorithm: HistoryIdAlgorithm,
    host_name: Option<String>,
    thread_name: Option<String>,
    link_patterns: LinkPatterns,
    custom_labels: Vec<CustomLabelKind>,
}

impl ListenerConfig {
    /// Loads configuration from `location`, applying overrides from the process environment.
    pub fn load(location: ListenerConfigLocation<'_>) -> Result<Self, ConfigError> {
        Self::load_with_env(location, &EnvOverrides::from_env())
    }

    /// Loads configuration from `location`, applying the given overrides.
    pub fn load_with_env(
        location: ListenerConfigLocation<'_>,
        env: &EnvOverrides,
    ) -> Result<Self, ConfigError> {
        let config = DeserializedListenerConfig::from_location_with_warnings(
            location,
            &mut DefaultConfigWarnings,
        )?;
        Self::resolve(DefaultListenerConfig::from_embedded(), config, env)
    }

    fn resolve(
        default: DefaultListenerConfig,
        config: Option<DeserializedListenerConfig>,
        env: &EnvOverrides,
    ) -> Result<Self, ConfigError> {
        let config = config.unwrap_or_default();

        let history_id_algorithm = config
            .history_id_algorithm
            .as_deref()
            .unwrap_or(&default.history_id_algorithm)
            .parse()
            .map_err(ConfigError::HistoryIdAlgorithm)?;

        let mut link_patterns = LinkPatterns::new();
        for (link_type, pattern) in default.link_patterns.into_iter().chain(config.link_patterns) {
            link_patterns.insert(link_type, pattern)?;
        }

        let mut seen = HashSet::new();
        for custom in &config.custom_labels {
            if !seen.insert(custom.kind.as_str()) {
                return Err(ConfigError::DuplicateCustomLabel {
                    kind: custom.kind.clone(),
                });
            }
        }

        let results_directory = env
            .results_directory
            .clone()
            .or(config.results_directory)
            .unwrap_or(default.results_directory);

        Ok(Self {
            results_directory,
            history_id_algorithm,
            host_name: env.host_name.clone().or(config.host_name),
            thread_name: env.thread_name.clone().or(config.thread_name),
            link_patterns,
            custom_labels: config.custom_labels,
        })
    }

    /// The directory results are written to.
    pub fn results_directory(&self) -> &Utf8Path {
        &self.results_directory
    }

    /// The history id digest.
    pub fn history_id_algorithm(&self) -> HistoryIdAlgorithm {
        self.history_id_algorithm
    }

    /// The host label override, if any.
    pub fn host_name(&self) -> Option<&str> {
        self.host_name.as_deref()
    }

    /// The thread label override, if any.
    pub fn thread_name(&self) -> Option<&str> {
        self.thread_name.as_deref()
    }

    /// URL patterns per link type.
    pub fn link_patterns(&self) -> &LinkPatterns {
        &self.link_patterns
    }

    /// Custom annotation kinds that produce labels, in declaration order.
    pub fn custom_labels(&self) -> &[CustomLabelKind] {
        &self.custom_labels
    }

    /// Returns a history id computer using the configured digest.
    pub fn history_id_computer(&self) -> HistoryIdComputer {
        HistoryIdComputer::new(self.history_id_algorithm)
    }

    /// Returns a metadata extractor using the configured link patterns and custom labels.
    pub fn metadata_extractor(&self) -> MetadataExtractor {
        MetadataExtractor::new(self.link_patterns.clone(), &self.custom_labels)
    }
}

impl Default for ListenerConfig {
    /// The embedded defaults, with no config file and no environment overrides.
    fn default() -> Self {
        Self::resolve(
            DefaultListenerConfig::from_embedded(),
            None,
            &EnvOverrides::default(),
        )
        .expect("embedded default config should resolve")
    }
}

/// Handles warnings produced while loading a config file.
trait ConfigWarnings {
    /// Handle unknown configuration keys found in a config file.
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>);
}

/// Logs warnings through `tracing`.
struct DefaultConfigWarnings;

impl ConfigWarnings for DefaultConfigWarnings {
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>) {
        let unknown_str = if unknown.len() == 1 {
            // Print this on the same line.
            format!("key: {}", unknown.iter().map(String::as_str).collect::<String>())
        } else {
            let mut s = String::from("keys:\n");
            for ignored_key in unknown {
                s.push_str("\n  - ");
                s.push_str(ignored_key);
            }
            s
        };

        warn!("in config file {config_file}, ignoring unknown configuration {unknown_str}");
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DeserializedListenerConfig {
    #[serde(default)]
    results_directory: Option<Utf8PathBuf>,

    #[serde(default)]
    history_id_algorithm: Option<String>,

    #[serde(default)]
    host_name: Option<String>,

    #[serde(default)]
    thread_name: Option<String>,

    #[serde(default)]
    link_patterns: IndexMap<String, String>,

    #[serde(default)]
    custom_labels: Vec<CustomLabelKind>,
}

impl DeserializedListenerConfig {
    fn from_location_with_warnings(
        location: ListenerConfigLocation<'_>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Option<Self>, ConfigError> {
        match location {
            ListenerConfigLocation::Isolated => {
                debug!("listener config: skipping (isolated)");
                Ok(None)
            }
            ListenerConfigLocation::Explicit(path) => {
                debug!("listener config: loading from explicit path {path}");
                match Self::from_path_with_warnings(path, warnings)? {
                    Some(config) => Ok(Some(config)),
                    None => Err(ConfigError::FileNotFound {
                        path: path.to_owned(),
                    }),
                }
            }
            ListenerConfigLocation::Default => {
                Self::from_path_with_warnings(Utf8Path::new(DEFAULT_CONFIG_FILE), warnings)
            }
        }
    }

    /// Returns `Ok(None)` if the file does not exist.
    fn from_path_with_warnings(
        path: &Utf8Path,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Option<Self>, ConfigError> {
        debug!("listener config: attempting to load from {path}");
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!("listener config: file does not exist at {path}");
                return Ok(None);
            }
            Err(error) => {
                return Err(ConfigError::Read {
                    path: path.to_owned(),
                    error,
                });
            }
        };

        let (config, unknown) =
            Self::deserialize_toml(&contents).map_err(|error| ConfigError::Parse {
                path: path.to_owned(),
                error,
            })?;

        if !unknown.is_empty() {
            warnings.unknown_config_keys(path, &unknown);
        }

        debug!("listener config: loaded successfully from {path}");
        Ok(Some(config))
    }

    fn deserialize_toml(contents: &str) -> Result<(Self, BTreeSet<String>), toml::de::Error> {
        let deserializer = toml::Deserializer::parse(contents)?;
        let mut unknown = BTreeSet::new();
        let config: DeserializedListenerConfig =
            serde_ignored::deserialize(deserializer, |path| {
                unknown.insert(path.to_string());
            })?;
        Ok((config, unknown))
    }
}

/// Default configuration parsed from the embedded TOML. Every setting is required.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DefaultListenerConfig {
    results_directory: Utf8PathBuf,
    history_id_algorithm: String,
    #[serde(default)]
    link_patterns: IndexMap<String, String>,
}

impl DefaultListenerConfig {
    const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Panics if the embedded TOML is invalid or contains unknown keys.
    fn from_embedded() -> Self {
        let deserializer = toml::Deserializer::parse(Self::DEFAULT_CONFIG)
            .expect("embedded default config should parse");
        let mut unknown = BTreeSet::new();
        let config: DefaultListenerConfig =
            serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
                unknown.insert(path.to_string());
            })
            .expect("embedded default config should be valid");

        if !unknown.is_empty() {
            panic!(
                "found unknown keys in default config: {}",
                unknown.into_iter().collect::<Vec<_>>().join(", ")
            );
        }

        config
    }
}
