// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use indexmap::IndexMap;
use serde::Deserialize;
use std::fmt;

/// Where an annotation was declared.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Scope {
    /// On the test class.
    Class,

    /// On the test method.
    Method,
}

/// A declarative piece of metadata attached to a test class or method.
///
/// Repeatable kinds are expressed by listing the annotation several times in the same scope.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Annotation {
    /// Overrides the test name (method scope) or the suite name (class scope).
    DisplayName(String),

    /// Free-text description.
    Description(String),

    /// A generic link.
    Link(LinkAnnotation),

    /// An issue tracker reference. The URL is built from the `issue` link pattern.
    Issue(String),

    /// A test management system reference. The URL is built from the `tms` link pattern.
    TmsLink(String),

    /// Top level of the behaviour hierarchy.
    Epic(String),

    /// Middle level of the behaviour hierarchy.
    Feature(String),

    /// Bottom level of the behaviour hierarchy.
    Story(String),

    /// Severity of the test.
    Severity(SeverityLevel),

    /// Owner of the test.
    Owner(String),

    /// A free-form tag.
    Tag(String),

    /// Marks the test as ignored, with an optional reason.
    Ignore {
        /// Why the test is ignored.
        reason: Option<String>,
    },

    /// An annotation kind registered through configuration.
    Custom(CustomAnnotation),
}

impl Annotation {
    /// Creates a generic link annotation with the given name and URL.
    pub fn link(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::Link(LinkAnnotation {
            name: Some(name.into()),
            url: Some(url.into()),
            link_type: None,
        })
    }

    /// Creates an ignore annotation with the given reason.
    pub fn ignore(reason: impl Into<String>) -> Self {
        Self::Ignore {
            reason: Some(reason.into()),
        }
    }

    /// Returns the name of this annotation's kind.
    pub fn kind_name(&self) -> &str {
        match self {
            Self::DisplayName(_) => "display-name",
            Self::Description(_) => "description",
            Self::Link(_) => "link",
            Self::Issue(_) => "issue",
            Self::TmsLink(_) => "tms-link",
            Self::Epic(_) => "epic",
            Self::Feature(_) => "feature",
            Self::Story(_) => "story",
            Self::Severity(_) => "severity",
            Self::Owner(_) => "owner",
            Self::Tag(_) => "tag",
            Self::Ignore { .. } => "ignore",
            Self::Custom(custom) => &custom.kind,
        }
    }
}

/// The fields of a generic link annotation.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LinkAnnotation {
    /// The display name. Also substituted into the link pattern when `url` is absent.
    pub name: Option<String>,

    /// The URL.
    pub url: Option<String>,

    /// The link type. Defaults to `custom`.
    pub link_type: Option<String>,
}

/// The severity of a test.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum SeverityLevel {
    /// Blocks further work.
    Blocker,

    /// Critical.
    Critical,

    /// The default.
    #[default]
    Normal,

    /// Minor.
    Minor,

    /// Trivial.
    Trivial,
}

impl SeverityLevel {
    /// Returns the label value for this level.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blocker => "blocker",
            Self::Critical => "critical",
            Self::Normal => "normal",
            Self::Minor => "minor",
            Self::Trivial => "trivial",
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An annotation whose kind is defined by configuration rather than built in.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CustomAnnotation {
    /// The kind, matched against [`CustomLabelKind::kind`].
    pub kind: String,

    /// The declared fields.
    pub fields: IndexMap<String, String>,
}

impl CustomAnnotation {
    /// Creates a custom annotation with no fields.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: IndexMap::new(),
        }
    }

    /// Adds a field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// Registers a custom annotation kind as a source of labels.
///
/// ```toml
/// [[custom-labels]]
/// kind = "layer"
/// label = "layer"
/// repeatable = true
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CustomLabelKind {
    /// The annotation kind to match.
    pub kind: String,

    /// The label name to produce.
    pub label: String,

    /// The field holding the label value.
    #[serde(default = "default_value_field")]
    pub field: String,

    /// Whether class-scope values accumulate with method-scope ones.
    #[serde(default)]
    pub repeatable: bool,
}

impl CustomLabelKind {
    /// Creates a non-repeatable kind reading the `value` field.
    pub fn new(kind: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            label: label.into(),
            field: default_value_field(),
            repeatable: false,
        }
    }
}

fn default_value_field() -> String {
    "value".to_owned()
}

/// The runner-supplied identity and metadata of one test.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestDescriptor {
    class_name: String,
    method_name: Option<String>,
    class_annotations: Vec<Annotation>,
    method_annotations: Vec<Annotation>,
}

impl TestDescriptor {
    /// Creates a descriptor for a test method.
    pub fn new(class_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: Some(method_name.into()),
            class_annotations: vec![],
            method_annotations: vec![],
        }
    }

    /// Creates a descriptor for a whole class, with no method.
    pub fn for_class(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: None,
            class_annotations: vec![],
            method_annotations: vec![],
        }
    }

    /// Attaches an annotation at class scope.
    pub fn with_class_annotation(mut self, annotation: Annotation) -> Self {
        self.class_annotations.push(annotation);
        self
    }

    /// Attaches an annotation at method scope.
    pub fn with_method_annotation(mut self, annotation: Annotation) -> Self {
        self.method_annotations.push(annotation);
        self
    }

    /// Attaches several annotations at the given scope, in order.
    pub fn with_annotations(
        mut self,
        scope: Scope,
        annotations: impl IntoIterator<Item = Annotation>,
    ) -> Self {
        match scope {
            Scope::Class => self.class_annotations.extend(annotations),
            Scope::Method => self.method_annotations.extend(annotations),
        }
        self
    }

    /// The qualified class name.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The method name, if this describes a method.
    pub fn method_name(&self) -> Option<&str> {
        self.method_name.as_deref()
    }

    /// The annotations declared at the given scope, in declaration order.
    pub fn annotations(&self, scope: Scope) -> &[Annotation] {
        match scope {
            Scope::Class => &self.class_annotations,
            Scope::Method => &self.method_annotations,
        }
    }

    /// The package of the class: everything before the last `.`, or `""` if there is none.
    pub fn package_name(&self) -> &str {
        self.class_name
            .rsplit_once('.')
            .map_or("", |(package, _)| package)
    }

    /// The method name, or the class name for class-level descriptors.
    pub fn name(&self) -> &str {
        self.method_name.as_deref().unwrap_or(&self.class_name)
    }

    /// `<class>.<method>`, or the class name for class-level descriptors.
    pub fn full_name(&self) -> String {
        match &self.method_name {
            Some(method_name) => format!("{}.{}", self.class_name, method_name),
            None => self.class_name.clone(),
        }
    }
}

impl fmt::Display for TestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.method_name {
            Some(method_name) => write!(f, "{}.{}", self.class_name, method_name),
            None => f.write_str(&self.class_name),
        }
    }
}
