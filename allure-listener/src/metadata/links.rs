// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::annotation::LinkAnnotation;
use crate::errors::ConfigError;
use allure_model::Link;
use indexmap::IndexMap;

static PLACEHOLDER: &str = "{}";

/// URL patterns per link type, used for links declared without a URL.
///
/// A pattern such as `https://tracker.example.com/browse/{}` has `{}` replaced by the link name.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LinkPatterns {
    patterns: IndexMap<String, String>,
}

impl LinkPatterns {
    /// Creates an empty set of patterns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the pattern for a link type, replacing any previous one.
    pub fn insert(
        &mut self,
        link_type: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Result<&mut Self, ConfigError> {
        let link_type = link_type.into();
        let pattern = pattern.into();
        if !pattern.contains(PLACEHOLDER) {
            return Err(ConfigError::InvalidLinkPattern { link_type, pattern });
        }
        self.patterns.insert(link_type, pattern);
        Ok(self)
    }

    /// Returns the pattern registered for a link type.
    pub fn get(&self, link_type: &str) -> Option<&str> {
        self.patterns.get(link_type).map(String::as_str)
    }

    /// Builds the URL for a link of this type and name, if a pattern is registered.
    pub fn url_for(&self, link_type: &str, name: &str) -> Option<String> {
        self.get(link_type)
            .map(|pattern| pattern.replace(PLACEHOLDER, name))
    }

    /// Iterates over `(link type, pattern)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.patterns
            .iter()
            .map(|(link_type, pattern)| (link_type.as_str(), pattern.as_str()))
    }
}

/// Builds a link from a generic link annotation.
///
/// Returns `None` if the annotation has neither a name nor a URL.
pub(super) fn link_from_annotation(
    annotation: &LinkAnnotation,
    patterns: &LinkPatterns,
) -> Option<Link> {
    let link_type = non_empty(annotation.link_type.as_deref()).unwrap_or(Link::CUSTOM_TYPE);
    create_link(
        non_empty(annotation.name.as_deref()),
        non_empty(annotation.url.as_deref()),
        link_type,
        patterns,
    )
}

/// Builds a link whose URL comes from the pattern for `link_type`.
pub(super) fn typed_link(name: &str, link_type: &str, patterns: &LinkPatterns) -> Option<Link> {
    create_link(non_empty(Some(name)), None, link_type, patterns)
}

fn create_link(
    name: Option<&str>,
    url: Option<&str>,
    link_type: &str,
    patterns: &LinkPatterns,
) -> Option<Link> {
    let url = match (url, name) {
        (Some(url), _) => Some(url.to_owned()),
        (None, Some(name)) => patterns.url_for(link_type, name),
        (None, None) => return None,
    };
    Some(Link {
        name: name.map(str::to_owned),
        url,
        link_type: Some(link_type.to_owned()),
    })
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}
