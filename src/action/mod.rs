//! # Actions
//!
//! An `Action` is one entry of the store's operation catalog: what kind of
//! statement it performs, how users select it, which stored procedure it
//! calls and which typed parameters that procedure takes.
//!
//! Actions are pure data. Per-type behaviour (string conversion) lives in
//! `crate::invoke::binder`, keyed by `SemanticType`.
//!
//! ## Procedure bindings
//!
//! A binding has the form `schema.procedure(?, ?, ...)`. Each `?` is one
//! positional slot. Parameters fill slots `1..=N` in declared order; a
//! `MutateReturnId` action reserves one trailing slot `N + 1` for the
//! generated identifier.

pub mod catalog;
pub mod requirement;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use self::requirement::{validate_all, Rejection, Requirement};
use crate::error::BindingError;
use crate::value::SemanticType;

pub use catalog::{Catalog, CatalogError};

/// How an action's call is dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Row-returning call
    Query,
    /// Insert/update/delete with no returned value
    Mutate,
    /// Insert that returns a generated identifier through its last slot
    MutateReturnId,
}

impl Classification {
    /// Number of trailing output slots the binding reserves
    pub fn output_slots(self) -> usize {
        match self {
            Classification::MutateReturnId => 1,
            Classification::Query | Classification::Mutate => 0,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Query => write!(f, "query"),
            Classification::Mutate => write!(f, "mutate"),
            Classification::MutateReturnId => write!(f, "mutate_return_id"),
        }
    }
}

/// The SQL statement an action corresponds to. Presentation only: dispatch
/// depends on `Classification` alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementKind::Select => write!(f, "select"),
            StatementKind::Insert => write!(f, "insert"),
            StatementKind::Update => write!(f, "update"),
            StatementKind::Delete => write!(f, "delete"),
        }
    }
}

/// An argument the user must provide to an action
#[derive(Debug)]
pub struct Parameter {
    /// Which conversion applies to the raw string
    pub semantic_type: SemanticType,
    /// The name the stored procedure gives this argument
    pub binding_name: &'static str,
    /// The name shown to the user
    pub display_label: &'static str,
    /// Checks applied to the raw string, in order
    pub requirements: Vec<&'static Requirement>,
}

impl Parameter {
    pub fn new(
        semantic_type: SemanticType,
        binding_name: &'static str,
        display_label: &'static str,
        requirements: &[&'static Requirement],
    ) -> Self {
        Parameter {
            semantic_type,
            binding_name,
            display_label,
            requirements: requirements.to_vec(),
        }
    }

    /// Run the validation pipeline over a raw input string
    pub fn validate(&self, raw: &str) -> Result<(), Rejection> {
        validate_all(&self.requirements, raw)
    }
}

/// One catalog entry describing an invocable database operation
#[derive(Debug)]
pub struct Action {
    pub classification: Classification,
    pub kind: StatementKind,
    /// Short blurb about what this action does
    pub description: &'static str,
    /// The selector typed by users, a few letters
    pub token: &'static str,
    /// `schema.procedure(?, ...)`
    pub binding: &'static str,
    pub parameters: Vec<Parameter>,
}

impl Action {
    pub fn new(
        classification: Classification,
        kind: StatementKind,
        description: &'static str,
        token: &'static str,
        binding: &'static str,
        parameters: Vec<Parameter>,
    ) -> Self {
        Action {
            classification,
            kind,
            description,
            token,
            binding,
            parameters,
        }
    }

    /// Find a parameter by its binding name
    pub fn parameter(&self, binding_name: &str) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.binding_name == binding_name)
    }

    /// Case-insensitive token match
    pub fn matches(&self, token: &str) -> bool {
        self.token.eq_ignore_ascii_case(token.trim())
    }

    /// Parse the binding and check its placeholder count against the
    /// declared parameters
    pub fn procedure(&self) -> Result<ProcedureBinding, BindingError> {
        let procedure: ProcedureBinding = self.binding.parse()?;
        let expected = self.parameters.len() + self.classification.output_slots();
        if procedure.placeholders != expected {
            return Err(BindingError::ArityMismatch {
                binding: self.binding.to_string(),
                placeholders: procedure.placeholders,
                expected,
            });
        }
        Ok(procedure)
    }
}

/// A parsed `schema.procedure(?, ...)` binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureBinding {
    pub schema: String,
    pub procedure: String,
    /// Number of positional `?` slots
    pub placeholders: usize,
}

impl ProcedureBinding {
    /// `schema.procedure`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.procedure)
    }
}

impl fmt::Display for ProcedureBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = vec!["?"; self.placeholders].join(", ");
        write!(f, "{}.{}({slots})", self.schema, self.procedure)
    }
}

impl FromStr for ProcedureBinding {
    type Err = BindingError;

    fn from_str(binding: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| BindingError::MalformedBinding {
            binding: binding.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = binding.trim();
        let open = trimmed
            .find('(')
            .ok_or_else(|| malformed("missing '(' before the placeholder list"))?;
        let args = trimmed[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| malformed("placeholder list must end with ')'"))?;

        let (schema, procedure) = trimmed[..open]
            .trim()
            .split_once('.')
            .ok_or_else(|| malformed("procedure must be qualified as schema.name"))?;
        if !is_identifier(schema) || !is_identifier(procedure) {
            return Err(malformed("schema and procedure names must be identifiers"));
        }

        let placeholders = if args.trim().is_empty() {
            0
        } else {
            let slots: Vec<&str> = args.split(',').map(str::trim).collect();
            if slots.iter().any(|slot| *slot != "?") {
                return Err(malformed("placeholder list may contain only '?' slots"));
            }
            slots.len()
        };

        Ok(ProcedureBinding {
            schema: schema.to_string(),
            procedure: procedure.to_string(),
            placeholders,
        })
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::requirement::{NONEMPTY, POSITIVE_INTEGER};
    use super::*;

    fn follow_action() -> Action {
        Action::new(
            Classification::Mutate,
            StatementKind::Insert,
            "have userA follow userB",
            "fu",
            "vapor.insert_follow(?, ?, ?)",
            vec![
                Parameter::new(SemanticType::Integer, "follower_id", "follower id", &[&NONEMPTY]),
                Parameter::new(SemanticType::Integer, "followed_id", "followed id", &[&NONEMPTY]),
                Parameter::new(SemanticType::Date, "date", "date", &[]),
            ],
        )
    }

    #[test]
    fn test_parse_binding() {
        let binding: ProcedureBinding = "vapor.insert_user(?, ?, ?)".parse().unwrap();
        assert_eq!(binding.schema, "vapor");
        assert_eq!(binding.procedure, "insert_user");
        assert_eq!(binding.placeholders, 3);
        assert_eq!(binding.qualified_name(), "vapor.insert_user");
    }

    #[test]
    fn test_parse_binding_without_slots() {
        let binding: ProcedureBinding = "vapor.games_by_review()".parse().unwrap();
        assert_eq!(binding.placeholders, 0);
    }

    #[test]
    fn test_parse_binding_compact_slots() {
        let binding: ProcedureBinding = "dbo.InsertGame(?,?,?)".parse().unwrap();
        assert_eq!(binding.placeholders, 3);
        assert_eq!(binding.to_string(), "dbo.InsertGame(?, ?, ?)");
    }

    #[test]
    fn test_parse_binding_rejects_malformed() {
        for bad in [
            "vapor.insert_comment(?,?,?",
            "insert_comment(?)",
            "vapor.insert comment(?)",
            "[dbo].[InsertComment(?,?)]",
            "vapor.insert_comment(?, x)",
            "vapor.insert_comment(?,,?)",
            ".proc(?)",
        ] {
            let result = bad.parse::<ProcedureBinding>();
            assert!(
                matches!(result, Err(BindingError::MalformedBinding { .. })),
                "expected {bad} to be rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn test_procedure_arity_matches() {
        let action = follow_action();
        let procedure = action.procedure().unwrap();
        assert_eq!(procedure.placeholders, 3);
    }

    #[test]
    fn test_procedure_arity_counts_output_slot() {
        let mut action = follow_action();
        action.classification = Classification::MutateReturnId;
        let err = action.procedure().unwrap_err();
        assert!(matches!(
            err,
            BindingError::ArityMismatch {
                placeholders: 3,
                expected: 4,
                ..
            }
        ));
    }

    #[test]
    fn test_parameter_lookup_by_binding_name() {
        let action = follow_action();
        assert_eq!(
            action.parameter("followed_id").map(|p| p.display_label),
            Some("followed id")
        );
        assert!(action.parameter("missing").is_none());
    }

    #[test]
    fn test_matches_ignores_case_and_whitespace() {
        let action = follow_action();
        assert!(action.matches("FU"));
        assert!(action.matches("  fu "));
        assert!(!action.matches("f"));
        assert!(!action.matches("have userA follow userB"));
    }

    #[test]
    fn test_parameter_validate_uses_pipeline() {
        let param = Parameter::new(
            SemanticType::Integer,
            "user_id",
            "user id",
            &[&NONEMPTY, &POSITIVE_INTEGER],
        );
        assert_eq!(param.validate("").unwrap_err().requirement, "NONEMPTY");
        assert_eq!(param.validate("x").unwrap_err().requirement, "POSITIVE_INTEGER");
        assert!(param.validate("7").is_ok());
    }

    #[test]
    fn test_classification_output_slots() {
        assert_eq!(Classification::Query.output_slots(), 0);
        assert_eq!(Classification::Mutate.output_slots(), 0);
        assert_eq!(Classification::MutateReturnId.output_slots(), 1);
    }
}
