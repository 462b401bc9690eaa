//! The strongly-typed attribute record.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Explicit column type tag carried by an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Free-text values
    String,
    /// Floating point values
    Number,
    /// Whole-number values
    Integer,
    /// Boolean values
    Boolean,
}

impl ColumnType {
    /// JSON-Schema type name for this column type.
    pub fn json_type(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Number => "number",
            ColumnType::Integer => "integer",
            ColumnType::Boolean => "boolean",
        }
    }
}

/// Validation rules attached to an attribute: either one flat rule string or
/// a per-component override map.
///
/// The flat form is by far the most common; the map form lets a schema author
/// hand different rule strings to different component manifests without the
/// inline `#Component` scoping syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidationRules {
    /// One rule string applying wherever the attribute appears
    Flat(String),
    /// Component name to rule string
    PerComponent(BTreeMap<String, String>),
}

impl ValidationRules {
    /// Resolves the raw rule string for a target component.
    ///
    /// For the map form, only an exact component match applies; a component
    /// absent from the map has no rule string at all.
    pub fn raw_for(&self, component: &str) -> Option<&str> {
        match self {
            ValidationRules::Flat(raw) => Some(raw.as_str()),
            ValidationRules::PerComponent(map) => map.get(component).map(String::as_str),
        }
    }
}

impl From<&str> for ValidationRules {
    fn from(raw: &str) -> Self {
        ValidationRules::Flat(raw.to_string())
    }
}

/// A named node in the schema graph.
///
/// Unknown/extra schema fields are preserved in the `extra` side map for
/// forward compatibility rather than dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Canonical label, unique within one schema graph
    pub name: String,
    /// Human label; may contain characters illegal in some contexts
    pub display_name: String,
    /// Whether the attribute is required by default
    pub required: bool,
    /// Enumerated valid values; empty means unconstrained
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub valid_values: Vec<String>,
    /// Child attributes, conditionally required
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    /// Attached validation rules, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_rules: Option<ValidationRules>,
    /// Explicit type tag, if the schema declares one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_type: Option<ColumnType>,
    /// Unrecognized schema fields, preserved verbatim
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Attribute {
    /// Creates a minimal attribute with the display name equal to the name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            required: false,
            valid_values: Vec::new(),
            depends_on: Vec::new(),
            validation_rules: None,
            column_type: None,
            extra: BTreeMap::new(),
        }
    }

    /// Sets the display name.
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Marks the attribute required by default.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the enumerated valid values.
    pub fn valid_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the dependent child attributes.
    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Attaches a flat rule string.
    pub fn rules(mut self, raw: impl Into<String>) -> Self {
        self.validation_rules = Some(ValidationRules::Flat(raw.into()));
        self
    }

    /// Attaches a per-component rule map.
    pub fn rules_per_component<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.validation_rules = Some(ValidationRules::PerComponent(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ));
        self
    }

    /// Sets the explicit column type.
    pub fn column_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = Some(column_type);
        self
    }

    /// Preserves an unrecognized schema field.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Resolves the raw rule string for the given component, if any.
    pub fn raw_rules_for(&self, component: &str) -> Option<&str> {
        self.validation_rules
            .as_ref()
            .and_then(|rules| rules.raw_for(component))
    }
}
