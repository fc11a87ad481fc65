// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    annotation::{Annotation, CustomLabelKind, Scope, TestDescriptor},
    links::{LinkPatterns, link_from_annotation, typed_link},
};
use crate::errors::ExtractError;
use allure_model::{Label, Link};
use indexmap::IndexSet;
use tracing::debug;

/// Everything the extractor derives from a descriptor's annotations.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ExtractedMetadata {
    /// Method-scope display name override.
    pub display_name: Option<String>,

    /// Class-scope display name, used as the suite name.
    pub suite_name: Option<String>,

    /// Method-scope description, falling back to class scope.
    pub description: Option<String>,

    /// Links from both scopes, deduplicated.
    pub links: IndexSet<Link>,

    /// Annotation-derived labels, grouped by kind.
    pub labels: Vec<Label>,
}

/// Resolves labels, links and overrides from a [`TestDescriptor`].
///
/// Labels are produced by a table of rules, one per annotation kind. Each rule reads
/// method-scope values first. Repeatable kinds then append class-scope values; other kinds only
/// fall back to class scope when the method declared nothing.
#[derive(Clone, Debug)]
pub struct MetadataExtractor {
    label_rules: Vec<LabelRule>,
    link_patterns: LinkPatterns,
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new(LinkPatterns::new(), &[])
    }
}

impl MetadataExtractor {
    /// Creates an extractor with the built-in label kinds followed by `custom_labels`.
    pub fn new(link_patterns: LinkPatterns, custom_labels: &[CustomLabelKind]) -> Self {
        let mut label_rules = vec![
            LabelRule::builtin(Label::EPIC, true, LabelSource::Epic),
            LabelRule::builtin(Label::FEATURE, true, LabelSource::Feature),
            LabelRule::builtin(Label::STORY, true, LabelSource::Story),
            LabelRule::builtin(Label::SEVERITY, false, LabelSource::Severity),
            LabelRule::builtin(Label::OWNER, false, LabelSource::Owner),
            LabelRule::builtin(Label::TAG, true, LabelSource::Tag),
        ];
        label_rules.extend(custom_labels.iter().map(|custom| LabelRule {
            label: custom.label.clone(),
            repeatable: custom.repeatable,
            source: LabelSource::Custom {
                kind: custom.kind.clone(),
                field: custom.field.clone(),
            },
        }));

        Self {
            label_rules,
            link_patterns,
        }
    }

    /// Runs every extraction over the descriptor.
    pub fn extract(&self, descriptor: &TestDescriptor) -> Result<ExtractedMetadata, ExtractError> {
        Ok(ExtractedMetadata {
            display_name: self.display_name(descriptor).map(str::to_owned),
            suite_name: self.suite_name(descriptor).map(str::to_owned),
            description: self.description(descriptor).map(str::to_owned),
            links: self.links(descriptor),
            labels: self.labels(descriptor)?,
        })
    }

    /// The method-scope display name, if any. The last one declared wins.
    pub fn display_name<'a>(&self, descriptor: &'a TestDescriptor) -> Option<&'a str> {
        last_text(descriptor.annotations(Scope::Method), |annotation| {
            match annotation {
                Annotation::DisplayName(name) => Some(name),
                _ => None,
            }
        })
    }

    /// The class-scope display name, if any.
    pub fn suite_name<'a>(&self, descriptor: &'a TestDescriptor) -> Option<&'a str> {
        last_text(descriptor.annotations(Scope::Class), |annotation| {
            match annotation {
                Annotation::DisplayName(name) => Some(name),
                _ => None,
            }
        })
    }

    /// The description: method scope first, then class scope.
    pub fn description<'a>(&self, descriptor: &'a TestDescriptor) -> Option<&'a str> {
        let read = |annotation: &'a Annotation| match annotation {
            Annotation::Description(text) => Some(text),
            _ => None,
        };
        last_text(descriptor.annotations(Scope::Method), read)
            .or_else(|| last_text(descriptor.annotations(Scope::Class), read))
    }

    /// The ignore reason, if the test is marked ignored with a non-empty one.
    pub fn ignore_reason<'a>(&self, descriptor: &'a TestDescriptor) -> Option<&'a str> {
        let read = |annotation: &'a Annotation| match annotation {
            Annotation::Ignore {
                reason: Some(reason),
            } => Some(reason),
            _ => None,
        };
        last_text(descriptor.annotations(Scope::Method), read)
            .or_else(|| last_text(descriptor.annotations(Scope::Class), read))
    }

    /// Links from both scopes, in the order link, issue, tms with class before method for each,
    /// with duplicates removed.
    pub fn links(&self, descriptor: &TestDescriptor) -> IndexSet<Link> {
        let mut links = IndexSet::new();
        for source in LinkSource::ALL {
            for scope in [Scope::Class, Scope::Method] {
                links.extend(
                    descriptor
                        .annotations(scope)
                        .iter()
                        .filter_map(|annotation| source.read(annotation, &self.link_patterns)),
                );
            }
        }
        links
    }

    /// Annotation-derived labels, one group per rule in table order.
    pub fn labels(&self, descriptor: &TestDescriptor) -> Result<Vec<Label>, ExtractError> {
        let mut labels = Vec::new();
        for rule in &self.label_rules {
            labels.extend(rule.resolve(descriptor)?);
        }
        self.log_unknown_kinds(descriptor);
        Ok(labels)
    }

    fn log_unknown_kinds(&self, descriptor: &TestDescriptor) {
        for scope in [Scope::Class, Scope::Method] {
            for annotation in descriptor.annotations(scope) {
                if let Annotation::Custom(custom) = annotation {
                    let known = self
                        .label_rules
                        .iter()
                        .any(|rule| rule.matches_custom(&custom.kind));
                    if !known {
                        debug!(
                            "{descriptor}: ignoring annotation of unknown kind `{}` ({scope:?} scope)",
                            annotation.kind_name(),
                        );
                    }
                }
            }
        }
    }
}

/// Returns the last non-empty text produced by `read`.
fn last_text<'a>(
    annotations: &'a [Annotation],
    read: impl Fn(&'a Annotation) -> Option<&'a String>,
) -> Option<&'a str> {
    annotations
        .iter()
        .filter_map(read)
        .filter(|text| !text.is_empty())
        .next_back()
        .map(String::as_str)
}

#[derive(Clone, Debug)]
struct LabelRule {
    label: String,
    repeatable: bool,
    source: LabelSource,
}

#[derive(Clone, Debug)]
enum LabelSource {
    Epic,
    Feature,
    Story,
    Severity,
    Owner,
    Tag,
    Custom { kind: String, field: String },
}

impl LabelRule {
    fn builtin(label: &str, repeatable: bool, source: LabelSource) -> Self {
        Self {
            label: label.to_owned(),
            repeatable,
            source,
        }
    }

    fn matches_custom(&self, kind: &str) -> bool {
        matches!(&self.source, LabelSource::Custom { kind: rule_kind, .. } if rule_kind == kind)
    }

    fn resolve(&self, descriptor: &TestDescriptor) -> Result<Vec<Label>, ExtractError> {
        let mut labels = self.collect(descriptor.annotations(Scope::Method))?;
        if self.repeatable || labels.is_empty() {
            labels.extend(self.collect(descriptor.annotations(Scope::Class))?);
        }
        Ok(labels)
    }

    fn collect(&self, annotations: &[Annotation]) -> Result<Vec<Label>, ExtractError> {
        let mut labels = Vec::new();
        for annotation in annotations {
            if let Some(value) = self.read(annotation)? {
                labels.push(Label::new(self.label.as_str(), value));
            }
        }
        Ok(labels)
    }

    fn read(&self, annotation: &Annotation) -> Result<Option<String>, ExtractError> {
        let value = match (&self.source, annotation) {
            (LabelSource::Epic, Annotation::Epic(value))
            | (LabelSource::Feature, Annotation::Feature(value))
            | (LabelSource::Story, Annotation::Story(value))
            | (LabelSource::Owner, Annotation::Owner(value))
            | (LabelSource::Tag, Annotation::Tag(value)) => value.clone(),
            (LabelSource::Severity, Annotation::Severity(level)) => level.as_str().to_owned(),
            (LabelSource::Custom { kind, field }, Annotation::Custom(custom))
                if custom.kind == *kind =>
            {
                custom
                    .fields
                    .get(field)
                    .cloned()
                    .ok_or_else(|| ExtractError::MissingField {
                        kind: kind.clone(),
                        field: field.clone(),
                    })?
            }
            _ => return Ok(None),
        };
        Ok(Some(value))
    }
}

#[derive(Copy, Clone, Debug)]
enum LinkSource {
    Link,
    Issue,
    Tms,
}

impl LinkSource {
    const ALL: [LinkSource; 3] = [LinkSource::Link, LinkSource::Issue, LinkSource::Tms];

    fn read(self, annotation: &Annotation, patterns: &LinkPatterns) -> Option<Link> {
        match (self, annotation) {
            (LinkSource::Link, Annotation::Link(link)) => link_from_annotation(link, patterns),
            (LinkSource::Issue, Annotation::Issue(name)) => {
                typed_link(name, Link::ISSUE_TYPE, patterns)
            }
            (LinkSource::Tms, Annotation::TmsLink(name)) => {
                typed_link(name, Link::TMS_TYPE, patterns)
            }
            _ => None,
        }
    }
}
