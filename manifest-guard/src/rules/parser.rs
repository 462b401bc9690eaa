//! Recursive-descent parser for the component-scoped rule micro-grammar.
//!
//! Grammar, informally:
//!
//! ```text
//! rule_string := segment ("^^" segment)*
//! segment     := ["#" component_name] chain
//! chain       := part ("::" part)*
//! part        := rule_word token* [level]
//! level       := "error" | "warning"
//! ```
//!
//! Scope precedence for a target component: exact `#Component` match beats an
//! unscoped segment, which beats "no rule applies". A scoped segment with no
//! rule text (`#Component^^...`) means "no rule for this component, even if a
//! default exists", which is distinct from an empty rule string.

use super::kind::RuleKind;
use crate::error::{GuardError, Result};
use crate::report::Level;
use tracing::trace;

/// One parsed, executable rule with arguments and message level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleInvocation {
    /// The rule kind
    pub kind: RuleKind,
    /// Positional arguments, meaning rule-kind-specific
    pub arguments: Vec<String>,
    /// Message level for findings this rule produces
    pub level: Level,
}

impl RuleInvocation {
    /// Joined pattern argument for `regex` rules (the pattern may contain
    /// spaces and was tokenized on whitespace).
    pub fn joined_arguments_from(&self, start: usize) -> String {
        self.arguments[start..].join(" ")
    }
}

/// The outcome of resolving a rule string for one target component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleResolution {
    /// Rules apply in the given order (possibly empty: the attribute has no
    /// rules, but structural defaults such as `required` still stand)
    Rules(Vec<RuleInvocation>),
    /// An explicitly scoped empty segment: no rule applies to this component
    /// and any structural `required` default derived elsewhere is disabled
    NoRule,
}

impl RuleResolution {
    /// The invocations, treating `NoRule` as none.
    pub fn invocations(&self) -> &[RuleInvocation] {
        match self {
            RuleResolution::Rules(invocations) => invocations,
            RuleResolution::NoRule => &[],
        }
    }

    /// True when the resolution disables the structural `required` default.
    pub fn disables_required_default(&self) -> bool {
        matches!(self, RuleResolution::NoRule)
    }

    /// The `required` pseudo-rule override, if one was parsed.
    pub fn required_override(&self) -> Option<bool> {
        if self.disables_required_default() {
            return Some(false);
        }
        self.invocations()
            .iter()
            .any(|inv| inv.kind == RuleKind::Required)
            .then_some(true)
    }

    /// The invocations rule executors dispatch on (`required` filtered out).
    pub fn executable(&self) -> Vec<&RuleInvocation> {
        self.invocations()
            .iter()
            .filter(|inv| inv.kind != RuleKind::Required)
            .collect()
    }
}

/// Parses a raw rule string for a target component.
///
/// Deterministic: repeated calls with the same inputs return an equal
/// resolution. All syntax errors surface here, before any manifest row is
/// touched.
pub fn parse(raw: &str, target_component: &str) -> Result<RuleResolution> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(RuleResolution::Rules(Vec::new()));
    }

    let segment = match select_segment(raw, target_component) {
        SegmentSelection::Unscoped(text) => {
            if text.is_empty() {
                return Ok(RuleResolution::Rules(Vec::new()));
            }
            text
        }
        SegmentSelection::Scoped(text) => {
            if text.is_empty() {
                return Ok(RuleResolution::NoRule);
            }
            text
        }
        SegmentSelection::None => return Ok(RuleResolution::NoRule),
    };

    let invocations = parse_chain(segment)?;
    trace!(
        component = %target_component,
        stages = invocations.len(),
        "parsed rule segment"
    );
    Ok(RuleResolution::Rules(invocations))
}

enum SegmentSelection<'a> {
    /// Chain text from a segment scoped exactly to the target component
    Scoped(&'a str),
    /// Chain text from an unscoped segment
    Unscoped(&'a str),
    /// No segment applies to the target component
    None,
}

/// Splits on `^^` and applies scope precedence.
fn select_segment<'a>(raw: &'a str, target_component: &str) -> SegmentSelection<'a> {
    let segments: Vec<&str> = raw.split("^^").map(str::trim).collect();

    let any_scoped = segments.iter().any(|s| s.starts_with('#'));
    if !any_scoped {
        // The whole string is unscoped; a stray `^^` without scopes selects
        // the first segment.
        return SegmentSelection::Unscoped(segments[0]);
    }

    let mut unscoped: Option<&str> = None;
    for segment in &segments {
        match segment.strip_prefix('#') {
            Some(rest) => {
                let (scope, chain) = match rest.find(char::is_whitespace) {
                    Some(at) => (&rest[..at], rest[at..].trim_start()),
                    None => (rest, ""),
                };
                if scope == target_component {
                    return SegmentSelection::Scoped(chain);
                }
            }
            None => {
                if unscoped.is_none() {
                    unscoped = Some(segment);
                }
            }
        }
    }

    match unscoped {
        Some(text) => SegmentSelection::Unscoped(text),
        None => SegmentSelection::None,
    }
}

/// Parses a `::`-combined chain and validates the stage combination.
fn parse_chain(segment: &str) -> Result<Vec<RuleInvocation>> {
    let parts: Vec<&str> = segment.split("::").map(str::trim).collect();
    let mut invocations = Vec::with_capacity(parts.len());

    for part in &parts {
        invocations.push(parse_part(part, segment)?);
    }

    if invocations.len() > 1 {
        // The pseudo-rule never participates in combination, and any stage
        // pair outside the allow-list is a schema error rather than a guess.
        for invocation in &invocations {
            if invocation.kind == RuleKind::Required {
                return Err(GuardError::rule_syntax(
                    segment,
                    "required cannot be combined with other rules",
                ));
            }
        }
        for stage in &invocations[..invocations.len() - 1] {
            if stage.kind != RuleKind::List {
                return Err(GuardError::rule_syntax(
                    segment,
                    format!(
                        "'{}' cannot feed a downstream rule; only list can",
                        stage.kind
                    ),
                ));
            }
        }
        let last = &invocations[invocations.len() - 1].kind;
        if !last.element_applicable() {
            return Err(GuardError::rule_syntax(
                segment,
                format!("'{last}' cannot be applied to list elements"),
            ));
        }
    }

    Ok(invocations)
}

/// Parses one whitespace-tokenized rule part.
fn parse_part(part: &str, segment: &str) -> Result<RuleInvocation> {
    let mut tokens: Vec<&str> = part.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(GuardError::rule_syntax(segment, "empty rule part"));
    }

    let word = tokens.remove(0);
    let kind = RuleKind::from_token(word)
        .ok_or_else(|| GuardError::unknown_rule(word, segment))?;

    let mut level = kind.default_level();
    if let Some(last) = tokens.last() {
        if let Some(parsed) = Level::from_token(last) {
            if kind == RuleKind::Required {
                return Err(GuardError::rule_syntax(
                    segment,
                    "required does not accept a message level",
                ));
            }
            // For regex, the final token is the level only when a pattern
            // token remains; otherwise it is the pattern itself.
            if kind != RuleKind::Regex || tokens.len() > 2 {
                level = parsed;
                tokens.pop();
            }
        }
    }

    let arguments: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
    kind.validate_arguments(&arguments, segment)?;

    Ok(RuleInvocation {
        kind,
        arguments,
        level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(resolution: RuleResolution) -> Vec<RuleInvocation> {
        match resolution {
            RuleResolution::Rules(invocations) => invocations,
            RuleResolution::NoRule => panic!("expected rules, got NoRule"),
        }
    }

    #[test]
    fn test_empty_string_is_empty_rules() {
        assert_eq!(
            parse("", "Patient").unwrap(),
            RuleResolution::Rules(Vec::new())
        );
        assert_eq!(
            parse("   ", "Patient").unwrap(),
            RuleResolution::Rules(Vec::new())
        );
    }

    #[test]
    fn test_single_rule_with_level() {
        let parsed = rules(parse("unique warning", "Patient").unwrap());
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].kind, RuleKind::Unique);
        assert_eq!(parsed[0].level, Level::Warning);
        assert!(parsed[0].arguments.is_empty());
    }

    #[test]
    fn test_default_level_is_rule_specific() {
        let unique = rules(parse("unique", "Patient").unwrap());
        assert_eq!(unique[0].level, Level::Error);

        let recommended = rules(parse("recommended", "Patient").unwrap());
        assert_eq!(recommended[0].level, Level::Warning);
    }

    #[test]
    fn test_component_scope_precedence() {
        let raw = "#Patient unique warning^^#Biospecimen unique error";

        let patient = rules(parse(raw, "Patient").unwrap());
        assert_eq!(patient[0].kind, RuleKind::Unique);
        assert_eq!(patient[0].level, Level::Warning);

        let biospecimen = rules(parse(raw, "Biospecimen").unwrap());
        assert_eq!(biospecimen[0].level, Level::Error);

        assert_eq!(parse(raw, "Demographics").unwrap(), RuleResolution::NoRule);
    }

    #[test]
    fn test_unscoped_segment_is_fallback() {
        let raw = "#Patient int^^num warning";

        let patient = rules(parse(raw, "Patient").unwrap());
        assert_eq!(patient[0].kind, RuleKind::Int);

        let other = rules(parse(raw, "Biospecimen").unwrap());
        assert_eq!(other[0].kind, RuleKind::Num);
        assert_eq!(other[0].level, Level::Warning);
    }

    #[test]
    fn test_bare_scope_disables_rule_and_default() {
        let resolution = parse("#Patient^^int", "Patient").unwrap();
        assert_eq!(resolution, RuleResolution::NoRule);
        assert!(resolution.disables_required_default());
        assert_eq!(resolution.required_override(), Some(false));
    }

    #[test]
    fn test_chain_parses_in_order() {
        let parsed = rules(parse("list strict::regex match [a-f]", "Patient").unwrap());
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].kind, RuleKind::List);
        assert_eq!(parsed[0].arguments, vec!["strict"]);
        assert_eq!(parsed[1].kind, RuleKind::Regex);
        assert_eq!(parsed[1].arguments, vec!["match", "[a-f]"]);
    }

    #[test]
    fn test_chain_outside_allow_list_is_schema_error() {
        let err = parse("unique::regex match [a-f]", "Patient").unwrap_err();
        assert!(matches!(err, GuardError::RuleSyntax { .. }));

        let err = parse("list strict::unique", "Patient").unwrap_err();
        assert!(matches!(err, GuardError::RuleSyntax { .. }));
    }

    #[test]
    fn test_unknown_rule_word() {
        let err = parse("regexx match [a-f]", "Patient").unwrap_err();
        match err {
            GuardError::UnknownRule { rule, .. } => assert_eq!(rule, "regexx"),
            other => panic!("expected UnknownRule, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_arguments_fail_at_parse_time() {
        assert!(parse("inRange 50", "Patient").is_err());
        assert!(parse("inRange 50 abc", "Patient").is_err());
        assert!(parse("list both", "Patient").is_err());
        assert!(parse("regex match [a-", "Patient").is_err());
    }

    #[test]
    fn test_regex_pattern_with_spaces() {
        let parsed = rules(parse("regex search foo bar error", "Patient").unwrap());
        assert_eq!(parsed[0].arguments, vec!["search", "foo", "bar"]);
        assert_eq!(parsed[0].level, Level::Error);
        assert_eq!(parsed[0].joined_arguments_from(1), "foo bar");
    }

    #[test]
    fn test_regex_level_like_pattern_stays_pattern() {
        // Only two tokens after the module: "warning" is the pattern, not a level.
        let parsed = rules(parse("regex search warning", "Patient").unwrap());
        assert_eq!(parsed[0].arguments, vec!["search", "warning"]);
        assert_eq!(parsed[0].level, Level::Error);
    }

    #[test]
    fn test_required_pseudo_rule() {
        let resolution = parse("required", "Patient").unwrap();
        assert_eq!(resolution.required_override(), Some(true));
        assert!(resolution.executable().is_empty());

        assert!(parse("required error", "Patient").is_err());
        assert!(parse("required::list strict", "Patient").is_err());
    }

    #[test]
    fn test_scoped_required_override() {
        let raw = "#Biospecimen required^^unique";
        let bio = parse(raw, "Biospecimen").unwrap();
        assert_eq!(bio.required_override(), Some(true));

        let patient = parse(raw, "Patient").unwrap();
        assert_eq!(patient.required_override(), None);
        assert_eq!(patient.invocations()[0].kind, RuleKind::Unique);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let raw = "#Patient list like::regex search [a-f]^^unique error";
        let first = parse(raw, "Patient").unwrap();
        for _ in 0..10 {
            assert_eq!(parse(raw, "Patient").unwrap(), first);
        }
    }

    #[test]
    fn test_match_rules_parse() {
        let parsed = rules(parse(
            "matchExactlyOne Patient.PatientID set warning",
            "Biospecimen",
        )
        .unwrap());
        assert_eq!(parsed[0].kind, RuleKind::MatchExactlyOne);
        assert_eq!(parsed[0].arguments, vec!["Patient.PatientID", "set"]);
        assert_eq!(parsed[0].level, Level::Warning);
    }

    #[test]
    fn test_filename_exists_parses() {
        let parsed = rules(parse("filenameExists syn12345", "BulkRNAseq").unwrap());
        assert_eq!(parsed[0].kind, RuleKind::FilenameExists);
        assert_eq!(parsed[0].arguments, vec!["syn12345"]);
        assert_eq!(parsed[0].level, Level::Error);
    }
}
