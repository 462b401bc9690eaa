//! End-to-end validation tests: attribute graph in, report out.

use manifest_guard::compile::SchemaCache;
use manifest_guard::formatters::{FormatterConfig, HumanFormatter, JsonFormatter, ReportFormatter};
use manifest_guard::manifest::Manifest;
use manifest_guard::orchestrator::ManifestValidator;
use manifest_guard::report::Level;
use manifest_guard::schema::{Attribute, AttributeGraph};

/// A graph close to the real curation schemas: a Patient component with
/// typed, scoped, and chained rules, plus a conditional dependency hanging
/// off an enum value.
fn curation_graph() -> AttributeGraph {
    let mut graph = AttributeGraph::new();
    graph.add_component("Patient");
    graph.add_component("Biospecimen");

    graph.add_attribute(
        Attribute::new("Patient").depends_on(["PatientID", "Sex", "Age", "Diagnosis", "Markers"]),
    );
    graph.add_attribute(
        Attribute::new("Biospecimen").depends_on(["SampleID", "PatientID"]),
    );

    graph.add_attribute(
        Attribute::new("PatientID")
            .required(true)
            .rules("#Patient unique error^^#Biospecimen unique warning"),
    );
    graph.add_attribute(
        Attribute::new("Sex").valid_values(["Male", "Female", "Other"]).rules("recommended"),
    );
    graph.add_attribute(Attribute::new("Age").rules("inRange 0 120 error"));
    graph.add_attribute(Attribute::new("Diagnosis").valid_values(["Cancer", "Healthy"]));
    graph.add_attribute(Attribute::new("Markers").rules("list like::regex search [A-Z]+"));
    graph.add_attribute(Attribute::new("SampleID").required(true).rules("unique error"));

    // "Cancer" as a valid-value child: picking it requires a stage.
    graph.add_attribute(Attribute::new("Cancer").depends_on(["CancerStage"]));
    graph.add_attribute(Attribute::new("CancerStage"));

    graph
}

fn manifest(columns: Vec<(&str, Vec<Option<&str>>)>) -> Manifest {
    Manifest::from_columns(columns).expect("manifest construction")
}

#[tokio::test]
async fn test_clean_manifest_is_valid() {
    let validator = ManifestValidator::new(curation_graph());
    let manifest = manifest(vec![
        ("Component", vec![Some("Patient"), Some("Patient")]),
        ("PatientID", vec![Some("P1"), Some("P2")]),
        ("Sex", vec![Some("Male"), Some("Female")]),
        ("Age", vec![Some("45"), Some("67")]),
        ("Diagnosis", vec![Some("Healthy"), Some("Cancer")]),
        ("Markers", vec![Some("BRCA1,TP53"), Some("EGFR")]),
        ("CancerStage", vec![None, Some("II")]),
    ]);

    let report = validator.validate(&manifest).await.expect("validation run");
    assert!(report.is_valid(), "unexpected errors: {:?}", report.errors);
    assert!(report.warnings.is_empty());
}

#[tokio::test]
async fn test_findings_accumulate_across_columns() {
    let validator = ManifestValidator::new(curation_graph());
    let manifest = manifest(vec![
        ("Component", vec![Some("Patient"), Some("Patient"), Some("Patient")]),
        ("PatientID", vec![Some("P1"), Some("P1"), None]),
        ("Sex", vec![Some("Male"), Some("Unknown"), None]),
        ("Age", vec![Some("45"), Some("130"), Some("abc")]),
        ("Diagnosis", vec![Some("Healthy"), Some("Healthy"), Some("Healthy")]),
        ("Markers", vec![Some("BRCA1"), Some("lower"), None]),
        ("CancerStage", vec![None, None, None]),
    ]);

    let report = validator.validate(&manifest).await.expect("validation run");
    let messages: Vec<&str> = report.errors.iter().map(|f| f.message.as_str()).collect();

    assert!(messages.contains(&"'P1' duplicates the value in row 2"));
    assert!(messages.contains(&"'Unknown' is not a valid value for column 'Sex'"));
    assert!(messages.contains(&"'130' is not between 0 and 120"));
    assert!(messages.contains(&"'abc' is not a number and cannot be range checked"));
    assert!(messages
        .contains(&"column 'PatientID' is required but no value was provided"));
    assert!(messages.contains(&"'lower' does not contain the pattern '[A-Z]+'"));

    // The recommended rule defaults to warning and never blocks.
    assert!(report
        .warnings
        .iter()
        .any(|f| f.message == "column 'Sex' is recommended but no value was provided"));
}

#[tokio::test]
async fn test_component_scoped_rule_levels() {
    let validator = ManifestValidator::new(curation_graph());
    // Duplicate PatientIDs in a Biospecimen manifest: the scoped rule there
    // is unique at warning, not error.
    let manifest = manifest(vec![
        ("Component", vec![Some("Biospecimen"), Some("Biospecimen")]),
        ("SampleID", vec![Some("S1"), Some("S2")]),
        ("PatientID", vec![Some("P1"), Some("P1")]),
    ]);

    let report = validator.validate(&manifest).await.expect("validation run");
    assert!(report.is_valid());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].level, Level::Warning);
    assert_eq!(
        report.warnings[0].message,
        "'P1' duplicates the value in row 2"
    );
}

#[tokio::test]
async fn test_conditional_dependency_is_enforced_row_wise() {
    let validator = ManifestValidator::new(curation_graph());
    let manifest = manifest(vec![
        ("Component", vec![Some("Patient"), Some("Patient")]),
        ("PatientID", vec![Some("P1"), Some("P2")]),
        ("Sex", vec![Some("Male"), Some("Male")]),
        ("Age", vec![Some("45"), Some("46")]),
        ("Diagnosis", vec![Some("Cancer"), Some("Healthy")]),
        ("Markers", vec![Some("X"), Some("Y")]),
        ("CancerStage", vec![None, None]),
    ]);

    let report = validator.validate(&manifest).await.expect("validation run");
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].attribute, "CancerStage");
    assert_eq!(report.errors[0].row, Some(2));
    assert_eq!(
        report.errors[0].message,
        "column 'CancerStage' is required when 'Diagnosis' is 'Cancer'"
    );
}

#[tokio::test]
async fn test_structural_rejection_short_circuits_rules() {
    let validator = ManifestValidator::new(curation_graph());
    // Age "abc" would produce an inRange finding if rules ran.
    let manifest = manifest(vec![
        ("PatientID", vec![Some("P1")]),
        ("Age", vec![Some("abc")]),
    ]);

    let report = validator.validate(&manifest).await.expect("validation run");
    assert_eq!(report.errors.len(), 1);
    assert_eq!(
        report.errors[0].message,
        "manifest is missing the 'Component' column"
    );
    assert_eq!(report.metrics.rules_evaluated, 0);
}

#[tokio::test]
async fn test_schema_cache_hits_and_invalidation() {
    let graph = curation_graph();
    let fingerprint = graph.fingerprint();
    let cache = SchemaCache::new();

    let first = cache.get_or_compile(&graph, "Patient").await.expect("compile");
    let second = cache.get_or_compile(&graph, "Patient").await.expect("compile");
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len().await, 1);

    cache.invalidate(&fingerprint).await;
    assert!(cache.is_empty().await);

    let third = cache.get_or_compile(&graph, "Patient").await.expect("compile");
    assert!(!std::sync::Arc::ptr_eq(&first, &third));
}

#[tokio::test]
async fn test_compiled_schema_document_shape() {
    let cache = SchemaCache::new();
    let graph = curation_graph();
    let schema = cache.get_or_compile(&graph, "Patient").await.expect("compile");

    let document = schema.to_json_schema();
    assert!(document["properties"]["PatientID"].is_object());
    assert_eq!(document["required"][0], "PatientID");
    // Markers carries a list rule, so its enum-free type is array.
    assert_eq!(document["properties"]["Markers"]["type"], "array");
    // The Diagnosis=Cancer clause appears as an if/then.
    let all_of = document["allOf"].as_array().expect("allOf array");
    assert_eq!(all_of.len(), 1);
    assert_eq!(all_of[0]["if"]["properties"]["Diagnosis"]["const"], "Cancer");
}

#[tokio::test]
async fn test_report_renders_in_both_formats() {
    let validator = ManifestValidator::new(curation_graph());
    let manifest = manifest(vec![
        ("Component", vec![Some("Patient")]),
        ("PatientID", vec![None]),
        ("Sex", vec![Some("Male")]),
        ("Age", vec![Some("45")]),
        ("Diagnosis", vec![Some("Healthy")]),
        ("Markers", vec![Some("X")]),
        ("CancerStage", vec![None]),
    ]);
    let report = validator.validate(&manifest).await.expect("validation run");

    let json = JsonFormatter::new().with_pretty(false).format(&report).expect("json");
    let parsed: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(parsed["errors"][0][0], 2);
    assert_eq!(parsed["errors"][0][1], "PatientID");

    let human = HumanFormatter::with_config(FormatterConfig::ci())
        .format(&report)
        .expect("human");
    assert!(human.contains("Manifest INVALID"));
    assert!(human.contains("row 2, column 'PatientID'"));
}
