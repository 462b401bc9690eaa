//! The compiled per-component validation schema.

use crate::error::Result;
use crate::rules::{parse, InferredType, RuleKind};
use crate::schema::{Attribute, AttributeGraph};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// Constraint compiled for one manifest column.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyConstraint {
    /// Canonical attribute name
    pub attribute: String,
    /// Human column header
    pub display_name: String,
    /// Whether the column must be present and non-null
    pub required: bool,
    /// Enumerated valid values; empty means unconstrained
    pub valid_values: Vec<String>,
    /// Whether values are comma-delimited lists (enum moves inside items)
    pub is_list: bool,
    /// Inferred or declared column type
    pub inferred_type: Option<InferredType>,
}

/// One `if {parent == value} then {dependent: required}` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalRule {
    /// The enum-valued parent attribute
    pub parent: String,
    /// The parent value that triggers the clause
    pub value: String,
    /// The attribute that becomes required
    pub dependent: String,
}

/// Compiled artifact for one `(schema, component)` pair.
///
/// Immutable once built: any schema change produces a new artifact through
/// recompilation, never an in-place patch.
#[derive(Debug, Clone)]
pub struct ValidationSchema {
    component: String,
    graph_fingerprint: String,
    columns: Vec<String>,
    properties: HashMap<String, PropertyConstraint>,
    conditionals: Vec<ConditionalRule>,
}

impl ValidationSchema {
    /// The component this schema validates.
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Fingerprint of the attribute graph this schema was compiled from.
    pub fn graph_fingerprint(&self) -> &str {
        &self.graph_fingerprint
    }

    /// Manifest columns in traversal discovery order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The constraint for one column, if the column belongs to the schema.
    pub fn property(&self, attribute: &str) -> Option<&PropertyConstraint> {
        self.properties.get(attribute)
    }

    /// Names of required columns, in discovery order.
    pub fn required(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|name| {
                self.properties
                    .get(name.as_str())
                    .map(|p| p.required)
                    .unwrap_or(false)
            })
            .map(String::as_str)
            .collect()
    }

    /// Conditional if/then clauses in discovery order.
    pub fn conditionals(&self) -> &[ConditionalRule] {
        &self.conditionals
    }

    /// Renders the JSON-Schema-like document consumed by the spreadsheet
    /// layer: `properties`, `required`, and `allOf` if/then clauses.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for name in &self.columns {
            let constraint = &self.properties[name];
            properties.insert(name.clone(), property_json(constraint));
        }

        let all_of: Vec<Value> = self
            .conditionals
            .iter()
            .map(|clause| {
                let mut if_props = Map::new();
                if_props.insert(clause.parent.clone(), json!({ "const": clause.value }));
                let mut then_props = Map::new();
                then_props.insert(
                    clause.dependent.clone(),
                    json!({ "not": { "type": "null" } }),
                );
                json!({
                    "if": { "properties": Value::Object(if_props) },
                    "then": {
                        "properties": Value::Object(then_props),
                        "required": [clause.dependent],
                    }
                })
            })
            .collect();

        let mut doc = json!({
            "$id": format!("#{}", self.component),
            "title": self.component,
            "type": "object",
            "properties": Value::Object(properties),
            "required": self.required(),
        });
        if !all_of.is_empty() {
            doc["allOf"] = Value::Array(all_of);
        }
        doc
    }
}

fn property_json(constraint: &PropertyConstraint) -> Value {
    let enum_json = (!constraint.valid_values.is_empty())
        .then(|| json!(constraint.valid_values));

    if constraint.is_list {
        let mut items = Map::new();
        if let Some(values) = enum_json {
            items.insert("enum".to_string(), values);
        }
        return json!({ "type": "array", "items": Value::Object(items) });
    }

    let mut body = Map::new();
    if let Some(values) = enum_json {
        body.insert("enum".to_string(), values);
    }
    match constraint.inferred_type {
        Some(InferredType::Array) => {
            body.insert("type".to_string(), json!("array"));
        }
        Some(InferredType::String) => {
            body.insert("type".to_string(), json!("string"));
        }
        Some(InferredType::DateString) => {
            body.insert("type".to_string(), json!("string"));
            body.insert("format".to_string(), json!("date"));
        }
        Some(InferredType::UriString) => {
            body.insert("type".to_string(), json!("string"));
            body.insert("format".to_string(), json!("uri"));
        }
        Some(InferredType::Number) => {
            body.insert("type".to_string(), json!("number"));
        }
        Some(InferredType::Integer) => {
            body.insert("type".to_string(), json!("integer"));
        }
        None => {}
    }
    Value::Object(body)
}

/// Compiles the validation schema for one component.
///
/// Traverses `depends_on` from the component root, resolves each attribute's
/// rules for this component (a `required` pseudo-rule beats the attribute's
/// own flag), and emits conditional clauses for dependents of valid-value
/// child nodes in discovery order.
#[instrument(skip(graph), fields(component = %component))]
pub fn compile(graph: &AttributeGraph, component: &str) -> Result<ValidationSchema> {
    let closure = graph.dependency_closure(component)?;

    let mut columns: Vec<String> = Vec::new();
    let mut properties: HashMap<String, PropertyConstraint> = HashMap::new();
    let mut conditionals: Vec<ConditionalRule> = Vec::new();
    let mut seen_clauses: HashSet<(String, String)> = HashSet::new();

    for attribute in &closure {
        let constraint = compile_property(attribute, component)?;
        columns.push(attribute.name.clone());
        properties.insert(attribute.name.clone(), constraint);
    }

    // Valid-value children: `if parent == value then dependent required`.
    // Dependent attributes join the column set in discovery order.
    for attribute in &closure {
        for value in &attribute.valid_values {
            let Some(child) = graph.attribute(value) else {
                continue;
            };
            for dependent in &child.depends_on {
                if !seen_clauses.insert((value.clone(), dependent.clone())) {
                    continue;
                }
                conditionals.push(ConditionalRule {
                    parent: attribute.name.clone(),
                    value: value.clone(),
                    dependent: dependent.clone(),
                });
                if !properties.contains_key(dependent) {
                    let dep_attr = graph.require_attribute(dependent)?;
                    let constraint = compile_property(dep_attr, component)?;
                    columns.push(dep_attr.name.clone());
                    properties.insert(dep_attr.name.clone(), constraint);
                }
            }
        }
    }

    debug!(
        component = %component,
        columns = columns.len(),
        conditionals = conditionals.len(),
        "compiled validation schema"
    );

    Ok(ValidationSchema {
        component: component.to_string(),
        graph_fingerprint: graph.fingerprint(),
        columns,
        properties,
        conditionals,
    })
}

fn compile_property(attribute: &Attribute, component: &str) -> Result<PropertyConstraint> {
    let resolution = match attribute.raw_rules_for(component) {
        Some(raw) => parse(raw, component)?,
        None => crate::rules::RuleResolution::Rules(Vec::new()),
    };

    let required = resolution
        .required_override()
        .unwrap_or(attribute.required);

    let invocations = resolution.invocations();
    let is_list = invocations.iter().any(|inv| inv.kind == RuleKind::List);

    let inferred_type = match attribute.column_type {
        Some(explicit) => Some(match explicit {
            crate::schema::ColumnType::String => InferredType::String,
            crate::schema::ColumnType::Number => InferredType::Number,
            crate::schema::ColumnType::Integer => InferredType::Integer,
            crate::schema::ColumnType::Boolean => InferredType::String,
        }),
        None => invocations.iter().find_map(|inv| inv.kind.inferred_type()),
    };

    Ok(PropertyConstraint {
        attribute: attribute.name.clone(),
        display_name: attribute.display_name.clone(),
        required,
        valid_values: attribute.valid_values.clone(),
        is_list,
        inferred_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attribute;

    fn file_graph() -> AttributeGraph {
        let mut graph = AttributeGraph::new();
        graph.add_attribute(
            Attribute::new("BulkRNAseq").depends_on(["Filename", "FileFormat", "GenomeBuild"]),
        );
        graph.add_attribute(Attribute::new("Filename").required(true));
        graph.add_attribute(
            Attribute::new("FileFormat")
                .required(true)
                .valid_values(["BAM", "CRAM", "FASTQ"]),
        );
        graph.add_attribute(Attribute::new("GenomeBuild").rules("recommended"));
        // Valid-value children with their own dependents.
        graph.add_attribute(Attribute::new("BAM").depends_on(["GenomeBuild"]));
        graph.add_attribute(Attribute::new("CRAM").depends_on(["GenomeFASTA"]));
        graph.add_attribute(Attribute::new("GenomeFASTA"));
        graph.add_component("BulkRNAseq");
        graph
    }

    #[test]
    fn test_columns_in_discovery_order() {
        let schema = compile(&file_graph(), "BulkRNAseq").unwrap();
        assert_eq!(
            schema.columns(),
            &["Filename", "FileFormat", "GenomeBuild", "GenomeFASTA"]
        );
    }

    #[test]
    fn test_required_from_attribute_flag() {
        let schema = compile(&file_graph(), "BulkRNAseq").unwrap();
        assert_eq!(schema.required(), vec!["Filename", "FileFormat"]);
    }

    #[test]
    fn test_required_pseudo_rule_overrides_flag() {
        let mut graph = file_graph();
        graph.add_attribute(
            Attribute::new("GenomeBuild").rules("#BulkRNAseq required^^recommended"),
        );
        let schema = compile(&graph, "BulkRNAseq").unwrap();
        assert!(schema.property("GenomeBuild").unwrap().required);

        // An explicitly blank scope disables even the attribute's own flag.
        graph.add_attribute(Attribute::new("Filename").required(true).rules("#BulkRNAseq^^"));
        let schema = compile(&graph, "BulkRNAseq").unwrap();
        assert!(!schema.property("Filename").unwrap().required);
    }

    #[test]
    fn test_conditional_clauses_in_discovery_order() {
        let schema = compile(&file_graph(), "BulkRNAseq").unwrap();
        assert_eq!(
            schema.conditionals(),
            &[
                ConditionalRule {
                    parent: "FileFormat".to_string(),
                    value: "BAM".to_string(),
                    dependent: "GenomeBuild".to_string(),
                },
                ConditionalRule {
                    parent: "FileFormat".to_string(),
                    value: "CRAM".to_string(),
                    dependent: "GenomeFASTA".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_enum_moves_inside_array_for_list_rule() {
        let mut graph = file_graph();
        graph.add_attribute(
            Attribute::new("FileFormat")
                .required(true)
                .valid_values(["BAM", "CRAM"])
                .rules("list strict"),
        );
        let schema = compile(&graph, "BulkRNAseq").unwrap();
        let doc = schema.to_json_schema();
        assert_eq!(doc["properties"]["FileFormat"]["type"], "array");
        assert_eq!(
            doc["properties"]["FileFormat"]["items"]["enum"],
            serde_json::json!(["BAM", "CRAM"])
        );
    }

    #[test]
    fn test_type_inference_first_typed_rule_wins() {
        let mut graph = file_graph();
        graph.add_attribute(Attribute::new("GenomeBuild").rules("int"));
        let schema = compile(&graph, "BulkRNAseq").unwrap();
        assert_eq!(
            schema.property("GenomeBuild").unwrap().inferred_type,
            Some(InferredType::Integer)
        );

        // Explicit column_type beats inference.
        graph.add_attribute(
            Attribute::new("GenomeBuild")
                .rules("int")
                .column_type(crate::schema::ColumnType::String),
        );
        let schema = compile(&graph, "BulkRNAseq").unwrap();
        assert_eq!(
            schema.property("GenomeBuild").unwrap().inferred_type,
            Some(InferredType::String)
        );
    }

    #[test]
    fn test_json_schema_if_then_shape() {
        let schema = compile(&file_graph(), "BulkRNAseq").unwrap();
        let doc = schema.to_json_schema();
        assert_eq!(
            doc["allOf"][0]["if"]["properties"]["FileFormat"]["const"],
            "BAM"
        );
        assert_eq!(doc["allOf"][0]["then"]["required"][0], "GenomeBuild");
    }

    #[test]
    fn test_rule_syntax_error_surfaces_at_compile_time() {
        let mut graph = file_graph();
        graph.add_attribute(Attribute::new("GenomeBuild").rules("inRange 50"));
        assert!(compile(&graph, "BulkRNAseq").unwrap_err().is_schema_error());
    }
}
