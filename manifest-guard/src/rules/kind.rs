//! The rule-kind registry: tokens, default levels, arities, type inference.

use crate::error::{GuardError, Result};
use crate::report::Level;
use regex::Regex;
use std::fmt;

/// Every validation rule the engine knows, plus the `required` pseudo-rule.
///
/// `Required` is consumed by the validation-schema compiler, never by rule
/// executors: its effect is to override the attribute's required-ness for the
/// target component only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// Comma-delimited list parsing (`list <strict|like> [level]`)
    List,
    /// Pattern matching (`regex <search|match> <pattern> [level]`)
    Regex,
    /// Float coercion check
    Float,
    /// Integer coercion check
    Int,
    /// Numeric (int or float) coercion check
    Num,
    /// String check (always passes for present values; pins column type)
    Str,
    /// Well-formed URL check (`url [substrings...] [level]`)
    Url,
    /// Inclusive numeric range (`inRange <min> <max> [level]`)
    InRange,
    /// Permissive date parse check
    Date,
    /// Pairwise distinctness of the column's non-null values
    Unique,
    /// Warn when a value is missing, regardless of required-ness
    Recommended,
    /// Flag ages <18 or >89 for censorship
    ProtectAges,
    /// Value must appear in at least one comparison manifest
    MatchAtLeastOne,
    /// Value must appear exactly once across comparison manifests
    MatchExactlyOne,
    /// Value must appear in no comparison manifest
    MatchNone,
    /// `(Filename, entityId)` pairs must match a remote file listing
    FilenameExists,
    /// Pseudo-rule overriding the attribute's required flag
    Required,
}

/// Column type a rule implies for the compiled validation schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferredType {
    /// `array` (from `list`)
    Array,
    /// plain `string`
    String,
    /// `string` with `format: date`
    DateString,
    /// `string` with `format: uri`
    UriString,
    /// `number`
    Number,
    /// `integer`
    Integer,
}

impl RuleKind {
    /// Parses a rule word into a kind.
    pub fn from_token(token: &str) -> Option<RuleKind> {
        Some(match token {
            "list" => RuleKind::List,
            "regex" => RuleKind::Regex,
            "float" => RuleKind::Float,
            "int" => RuleKind::Int,
            "num" => RuleKind::Num,
            "string" => RuleKind::Str,
            "url" => RuleKind::Url,
            "inRange" => RuleKind::InRange,
            "date" => RuleKind::Date,
            "unique" => RuleKind::Unique,
            "recommended" => RuleKind::Recommended,
            "protectAges" => RuleKind::ProtectAges,
            "matchAtLeastOne" => RuleKind::MatchAtLeastOne,
            "matchExactlyOne" => RuleKind::MatchExactlyOne,
            "matchNone" => RuleKind::MatchNone,
            "filenameExists" => RuleKind::FilenameExists,
            "required" => RuleKind::Required,
            _ => return None,
        })
    }

    /// The rule word as it appears in rule strings and findings.
    pub fn token(&self) -> &'static str {
        match self {
            RuleKind::List => "list",
            RuleKind::Regex => "regex",
            RuleKind::Float => "float",
            RuleKind::Int => "int",
            RuleKind::Num => "num",
            RuleKind::Str => "string",
            RuleKind::Url => "url",
            RuleKind::InRange => "inRange",
            RuleKind::Date => "date",
            RuleKind::Unique => "unique",
            RuleKind::Recommended => "recommended",
            RuleKind::ProtectAges => "protectAges",
            RuleKind::MatchAtLeastOne => "matchAtLeastOne",
            RuleKind::MatchExactlyOne => "matchExactlyOne",
            RuleKind::MatchNone => "matchNone",
            RuleKind::FilenameExists => "filenameExists",
            RuleKind::Required => "required",
        }
    }

    /// The message level used when a rule string carries no level suffix.
    pub fn default_level(&self) -> Level {
        match self {
            RuleKind::Recommended | RuleKind::ProtectAges => Level::Warning,
            _ => Level::Error,
        }
    }

    /// The column type this rule implies, if any. First typed rule wins.
    pub fn inferred_type(&self) -> Option<InferredType> {
        match self {
            RuleKind::List => Some(InferredType::Array),
            RuleKind::Regex | RuleKind::Str => Some(InferredType::String),
            RuleKind::Float | RuleKind::Num => Some(InferredType::Number),
            RuleKind::Int => Some(InferredType::Integer),
            RuleKind::InRange => Some(InferredType::Number),
            RuleKind::Date => Some(InferredType::DateString),
            RuleKind::Url => Some(InferredType::UriString),
            _ => None,
        }
    }

    /// True if the rule may appear as the final stage of a `list::` chain,
    /// applied per list element.
    pub fn element_applicable(&self) -> bool {
        matches!(
            self,
            RuleKind::Regex
                | RuleKind::Float
                | RuleKind::Int
                | RuleKind::Num
                | RuleKind::Str
                | RuleKind::Url
                | RuleKind::Date
                | RuleKind::InRange
        )
    }

    /// True if the rule needs the cross-manifest resolver to execute.
    pub fn requires_resolver(&self) -> bool {
        matches!(
            self,
            RuleKind::MatchAtLeastOne
                | RuleKind::MatchExactlyOne
                | RuleKind::MatchNone
                | RuleKind::FilenameExists
        )
    }

    /// Validates the positional arguments for this rule kind.
    ///
    /// Called at parse time; `segment` is only used in error messages.
    pub fn validate_arguments(&self, arguments: &[String], segment: &str) -> Result<()> {
        let syntax = |message: String| GuardError::rule_syntax(segment, message);
        match self {
            RuleKind::List => {
                if arguments.len() > 1 {
                    return Err(syntax(format!(
                        "list takes at most one mode argument, found {}",
                        arguments.len()
                    )));
                }
                if let Some(mode) = arguments.first() {
                    if mode != "strict" && mode != "like" {
                        return Err(syntax(format!(
                            "list mode must be 'strict' or 'like', found '{mode}'"
                        )));
                    }
                }
            }
            RuleKind::Regex => {
                if arguments.len() < 2 {
                    return Err(syntax(
                        "regex requires a module ('search' or 'match') and a pattern".to_string(),
                    ));
                }
                let module = &arguments[0];
                if module != "search" && module != "match" {
                    return Err(syntax(format!(
                        "regex module must be 'search' or 'match', found '{module}'"
                    )));
                }
                let pattern = arguments[1..].join(" ");
                Regex::new(&pattern).map_err(|e| {
                    syntax(format!("invalid regular expression '{pattern}': {e}"))
                })?;
            }
            RuleKind::InRange => {
                if arguments.len() != 2 {
                    return Err(syntax(format!(
                        "inRange requires exactly 2 numeric bounds, found {}",
                        arguments.len()
                    )));
                }
                let min: f64 = arguments[0]
                    .parse()
                    .map_err(|_| syntax(format!("'{}' is not a numeric bound", arguments[0])))?;
                let max: f64 = arguments[1]
                    .parse()
                    .map_err(|_| syntax(format!("'{}' is not a numeric bound", arguments[1])))?;
                if min > max {
                    return Err(syntax(format!("inRange lower bound {min} exceeds {max}")));
                }
            }
            RuleKind::MatchAtLeastOne | RuleKind::MatchExactlyOne | RuleKind::MatchNone => {
                if arguments.is_empty() || arguments.len() > 2 {
                    return Err(syntax(format!(
                        "{} requires a Component.Attribute target and an optional 'value'/'set' scope",
                        self.token()
                    )));
                }
                let target = &arguments[0];
                if !target.contains('.') || target.starts_with('.') || target.ends_with('.') {
                    return Err(syntax(format!(
                        "'{target}' is not a Component.Attribute reference"
                    )));
                }
                if let Some(scope) = arguments.get(1) {
                    if scope != "value" && scope != "set" {
                        return Err(syntax(format!(
                            "match scope must be 'value' or 'set', found '{scope}'"
                        )));
                    }
                }
            }
            RuleKind::FilenameExists => {
                if arguments.len() != 1 {
                    return Err(syntax(format!(
                        "filenameExists requires exactly one dataset scope, found {}",
                        arguments.len()
                    )));
                }
            }
            RuleKind::Url => {
                // Any number of substring arguments is valid.
            }
            RuleKind::Float
            | RuleKind::Int
            | RuleKind::Num
            | RuleKind::Str
            | RuleKind::Date
            | RuleKind::Unique
            | RuleKind::Recommended
            | RuleKind::ProtectAges => {
                if !arguments.is_empty() {
                    return Err(syntax(format!(
                        "{} takes no arguments, found {}",
                        self.token(),
                        arguments.len()
                    )));
                }
            }
            RuleKind::Required => {
                if !arguments.is_empty() {
                    return Err(syntax(
                        "required is a pseudo-rule and takes no arguments".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
