//! The attribute graph and its traversal.

use super::{Attribute, ValidationRules};
use crate::error::{GuardError, Result};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// A schema graph: every attribute of a data model plus the component roots
/// manifests are generated from.
///
/// Attribute insertion order is preserved; all traversals visit `depends_on`
/// edges in declaration order so compiled artifacts are deterministic.
#[derive(Debug, Clone, Default)]
pub struct AttributeGraph {
    attributes: Vec<Attribute>,
    index: HashMap<String, usize>,
    components: Vec<String>,
}

impl AttributeGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an attribute to the graph.
    ///
    /// Re-adding a name replaces the earlier record but keeps its position.
    pub fn add_attribute(&mut self, attribute: Attribute) {
        match self.index.get(&attribute.name) {
            Some(&pos) => self.attributes[pos] = attribute,
            None => {
                self.index
                    .insert(attribute.name.clone(), self.attributes.len());
                self.attributes.push(attribute);
            }
        }
    }

    /// Marks an existing attribute as a component root.
    pub fn add_component(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.components.contains(&name) {
            self.components.push(name);
        }
    }

    /// Looks up an attribute by canonical name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.index.get(name).map(|&pos| &self.attributes[pos])
    }

    /// Looks up an attribute, raising `AttributeNotFound` when absent.
    pub fn require_attribute(&self, name: &str) -> Result<&Attribute> {
        self.attribute(name)
            .ok_or_else(|| GuardError::AttributeNotFound {
                attribute: name.to_string(),
            })
    }

    /// All attributes in declaration order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Component root names in declaration order.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// True if `name` is a known component root.
    pub fn is_component(&self, name: &str) -> bool {
        self.components.iter().any(|c| c == name)
    }

    /// Collects the transitive `depends_on` closure of a component in
    /// deterministic discovery order (depth-first, declaration order, with a
    /// visited set so shared attributes appear once).
    ///
    /// Returns `CyclicSchema` if the traversal re-enters an attribute that is
    /// still on the current path; the schema is unusable in that case.
    pub fn dependency_closure(&self, component: &str) -> Result<Vec<&Attribute>> {
        self.require_attribute(component)?;

        let mut ordered = Vec::new();
        let mut visited = HashSet::new();
        let mut on_path = HashSet::new();
        self.visit(component, component, &mut ordered, &mut visited, &mut on_path)?;

        debug!(
            component = %component,
            columns = ordered.len(),
            "collected dependency closure"
        );
        Ok(ordered)
    }

    fn visit<'a>(
        &'a self,
        name: &str,
        root: &str,
        ordered: &mut Vec<&'a Attribute>,
        visited: &mut HashSet<String>,
        on_path: &mut HashSet<String>,
    ) -> Result<()> {
        if on_path.contains(name) {
            return Err(GuardError::CyclicSchema {
                attribute: name.to_string(),
            });
        }
        if !visited.insert(name.to_string()) {
            return Ok(());
        }
        on_path.insert(name.to_string());

        let attribute = self.require_attribute(name)?;
        if name != root {
            ordered.push(attribute);
        }
        for dep in &attribute.depends_on {
            self.visit(dep, root, ordered, visited, on_path)?;
        }

        on_path.remove(name);
        Ok(())
    }

    /// Computes a stable fingerprint of the graph's contents.
    ///
    /// Used as the compiled-schema cache key; any change to an attribute,
    /// edge, or rule string changes the fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for attribute in &self.attributes {
            hasher.update(attribute.name.as_bytes());
            hasher.update([0]);
            hasher.update(attribute.display_name.as_bytes());
            hasher.update([0]);
            hasher.update([attribute.required as u8]);
            for value in &attribute.valid_values {
                hasher.update(value.as_bytes());
                hasher.update([1]);
            }
            for dep in &attribute.depends_on {
                hasher.update(dep.as_bytes());
                hasher.update([2]);
            }
            match &attribute.validation_rules {
                Some(ValidationRules::Flat(raw)) => {
                    hasher.update(raw.as_bytes());
                }
                Some(ValidationRules::PerComponent(map)) => {
                    for (component, raw) in map {
                        hasher.update(component.as_bytes());
                        hasher.update([3]);
                        hasher.update(raw.as_bytes());
                    }
                }
                None => {}
            }
            if let Some(column_type) = attribute.column_type {
                hasher.update(column_type.json_type().as_bytes());
            }
            for (key, value) in &attribute.extra {
                hasher.update(key.as_bytes());
                hasher.update([4]);
                hasher.update(value.as_bytes());
            }
            hasher.update([255]);
        }
        for component in &self.components {
            hasher.update(component.as_bytes());
            hasher.update([5]);
        }
        hex::encode(hasher.finalize())
    }
}
