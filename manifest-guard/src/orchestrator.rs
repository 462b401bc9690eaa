//! Validation orchestrator: structural gate, per-column rule dispatch,
//! deterministic aggregation.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tracing::{debug, info, instrument};

use crate::compile::{SchemaCache, ValidationSchema};
use crate::error::{GuardError, Result};
use crate::executors::{execute_chain, ExecContext};
use crate::manifest::{Manifest, COMPONENT_COLUMN, ENTITY_ID_COLUMN};
use crate::report::{Finding, Level, ValidationReport};
use crate::resolver::CrossManifestResolver;
use crate::rules::parse;
use crate::schema::AttributeGraph;

/// Validates manifests against an attribute graph.
///
/// Owns the compiled-schema cache and the optional cross-manifest resolver.
/// Validation runs as a state machine: a structural check gates per-column
/// rule execution, findings aggregate into an order-stable
/// [`ValidationReport`], and the manifest is valid for submission iff the
/// error partition is empty.
pub struct ManifestValidator {
    graph: AttributeGraph,
    cache: SchemaCache,
    resolver: Option<CrossManifestResolver>,
}

impl ManifestValidator {
    /// Creates a validator over the given attribute graph.
    pub fn new(graph: AttributeGraph) -> Self {
        Self {
            graph,
            cache: SchemaCache::new(),
            resolver: None,
        }
    }

    /// Attaches a resolver for cross-manifest and file-listing rules.
    pub fn with_resolver(mut self, resolver: CrossManifestResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Replaces the attribute graph, dropping schemas compiled from the old
    /// one.
    pub async fn set_graph(&mut self, graph: AttributeGraph) {
        let old = self.graph.fingerprint();
        self.cache.invalidate(&old).await;
        self.graph = graph;
    }

    /// The compiled validation schema for a component, from cache when warm.
    pub async fn schema_for(&self, component: &str) -> Result<Arc<ValidationSchema>> {
        self.cache.get_or_compile(&self.graph, component).await
    }

    /// Validates a manifest, returning the aggregated report.
    ///
    /// Findings are data; an `Err` here means the run itself failed (schema
    /// error or resolver failure) and says nothing about manifest validity.
    #[instrument(skip(self, manifest), fields(rows = manifest.num_rows()))]
    pub async fn validate(&self, manifest: &Manifest) -> Result<ValidationReport> {
        let started = Instant::now();
        let mut report = ValidationReport::new();

        // Structural gate: any finding here rejects the manifest before a
        // single per-column rule runs.
        let component = match self.structural_check(manifest, &mut report).await? {
            Some(component) => component,
            None => {
                report.sort();
                report.metrics.execution_time_ms = started.elapsed().as_millis() as u64;
                info!(
                    errors = report.errors.len(),
                    "manifest rejected by structural check"
                );
                return Ok(report);
            }
        };

        let schema = self.schema_for(&component).await?;
        let entity_cells = manifest.column_values(ENTITY_ID_COLUMN).ok();

        let mut futures = Vec::new();
        for name in schema.columns() {
            if !manifest.has_column(name) {
                continue;
            }
            futures.push(self.validate_column(manifest, &schema, &component, name, &entity_cells));
        }
        let columns_validated = futures.len();

        let mut rules_evaluated = 0;
        for outcome in join_all(futures).await {
            let (findings, evaluated) = outcome?;
            report.extend(findings);
            rules_evaluated += evaluated;
        }
        report.extend(conditional_findings(manifest, &schema)?);

        report.sort();
        report.metrics.columns_validated = columns_validated;
        report.metrics.rules_evaluated = rules_evaluated;
        report.metrics.execution_time_ms = started.elapsed().as_millis() as u64;
        info!(
            component = %component,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            valid = report.is_valid(),
            "manifest validation finished"
        );
        Ok(report)
    }

    /// Backfills `entityId` from the dataset file listing, then validates.
    ///
    /// The backfill mutates the manifest and is idempotent: rerunning with
    /// the same listing leaves the column unchanged.
    #[instrument(skip(self, manifest), fields(dataset = %dataset_scope))]
    pub async fn validate_for_submission(
        &self,
        manifest: &mut Manifest,
        dataset_scope: &str,
    ) -> Result<ValidationReport> {
        let resolver = self.resolver.as_ref().ok_or_else(|| {
            GuardError::resolver("submission validation requires an asset store")
        })?;
        let listing = resolver.file_listing(dataset_scope).await?;
        let filled = manifest.backfill_entity_ids(&listing)?;
        debug!(filled, "entityId backfill complete");
        self.validate(manifest).await
    }

    /// Runs the structural check, pushing findings into the report.
    ///
    /// Returns the declared component when per-column validation may
    /// proceed, `None` on rejection.
    async fn structural_check(
        &self,
        manifest: &Manifest,
        report: &mut ValidationReport,
    ) -> Result<Option<String>> {
        if !manifest.has_column(COMPONENT_COLUMN) {
            report.add(Finding::column_scoped(
                COMPONENT_COLUMN,
                "structure",
                Level::Error,
                "manifest is missing the 'Component' column",
            ));
            return Ok(None);
        }
        if manifest.num_rows() == 0 {
            report.add(Finding::column_scoped(
                COMPONENT_COLUMN,
                "structure",
                Level::Error,
                "manifest contains no data rows",
            ));
            return Ok(None);
        }

        let mut component: Option<String> = None;
        for (row, value) in manifest.column_values(COMPONENT_COLUMN)? {
            match value {
                Some(value) => {
                    if component.is_none() {
                        component = Some(value);
                    }
                }
                None => report.add(Finding::row_scoped(
                    COMPONENT_COLUMN,
                    row,
                    "structure",
                    Level::Error,
                    format!(
                        "row {} has an empty Component value",
                        crate::report::spreadsheet_row(row)
                    ),
                    None,
                )),
            }
        }
        let Some(component) = component else {
            return Ok(None);
        };

        // A typo'd component name is bad manifest data, not a schema error.
        if !self.graph.is_component(&component) {
            report.add(Finding::column_scoped(
                COMPONENT_COLUMN,
                "structure",
                Level::Error,
                format!("'{component}' is not a known component"),
            ));
            return Ok(None);
        }

        let schema = self.schema_for(&component).await?;
        for name in schema.required() {
            if !manifest.has_column(name) {
                report.add(Finding::column_scoped(
                    name,
                    "structure",
                    Level::Error,
                    format!("manifest is missing required column '{name}'"),
                ));
            }
        }

        if report.is_valid() {
            Ok(Some(component))
        } else {
            Ok(None)
        }
    }

    /// Validates one column: required default, enumerated values, then the
    /// attribute's parsed rule chain.
    async fn validate_column(
        &self,
        manifest: &Manifest,
        schema: &ValidationSchema,
        component: &str,
        name: &str,
        entity_cells: &Option<Vec<(usize, Option<String>)>>,
    ) -> Result<(Vec<Finding>, usize)> {
        let cells = manifest.column_values(name)?;
        let mut findings = Vec::new();
        let mut evaluated = 0;

        if let Some(property) = schema.property(name) {
            if property.required {
                for (row, value) in &cells {
                    if value.is_none() {
                        findings.push(Finding::row_scoped(
                            name,
                            *row,
                            "required",
                            Level::Error,
                            format!("column '{name}' is required but no value was provided"),
                            None,
                        ));
                    }
                }
            }
            if !property.valid_values.is_empty() {
                for (row, value) in &cells {
                    let Some(value) = value else { continue };
                    // List-valued columns carry the enum per element.
                    if property.is_list {
                        for element in crate::executors::split_elements(value) {
                            if !property.valid_values.contains(&element) {
                                findings.push(Finding::row_scoped(
                                    name,
                                    *row,
                                    "validValues",
                                    Level::Error,
                                    format!(
                                        "'{element}' is not a valid value for column '{name}'"
                                    ),
                                    Some(element),
                                ));
                            }
                        }
                    } else if !property.valid_values.contains(value) {
                        findings.push(Finding::row_scoped(
                            name,
                            *row,
                            "validValues",
                            Level::Error,
                            format!("'{value}' is not a valid value for column '{name}'"),
                            Some(value.clone()),
                        ));
                    }
                }
            }
        }

        let attribute = self.graph.require_attribute(name)?;
        if let Some(raw) = attribute.raw_rules_for(component) {
            let resolution = parse(raw, component)?;
            let chain = resolution.executable();
            if !chain.is_empty() {
                evaluated = chain.len();
                let needs_entities = chain
                    .iter()
                    .any(|inv| inv.kind == crate::rules::RuleKind::FilenameExists);
                let ctx = ExecContext {
                    attribute: name,
                    resolver: self.resolver.as_ref(),
                    entity_ids: if needs_entities {
                        entity_cells.as_deref()
                    } else {
                        None
                    },
                };
                findings.extend(execute_chain(&chain, &cells, &ctx).await?);
            }
        }

        Ok((findings, evaluated))
    }
}

/// Enforces `if parent == value then dependent required` clauses row-wise.
fn conditional_findings(
    manifest: &Manifest,
    schema: &ValidationSchema,
) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();
    for clause in schema.conditionals() {
        if !manifest.has_column(&clause.parent) {
            continue;
        }
        for (row, value) in manifest.column_values(&clause.parent)? {
            if value.as_deref() != Some(clause.value.as_str()) {
                continue;
            }
            let dependent_empty = !manifest.has_column(&clause.dependent)
                || manifest.cell(&clause.dependent, row)?.is_none();
            if dependent_empty {
                findings.push(Finding::row_scoped(
                    &clause.dependent,
                    row,
                    "required",
                    Level::Error,
                    format!(
                        "column '{}' is required when '{}' is '{}'",
                        clause.dependent, clause.parent, clause.value
                    ),
                    None,
                ));
            }
        }
    }
    Ok(findings)
}
