//! Core structures and parsing logic for Tree-sitter grammars.
//!
//! This module defines the internal representation of a grammar as parsed from
//! Tree-sitter's JSON format. It uses [`serde_json`] for deserialization and
//! provides ergonomic accessors for inspecting rule properties and structure.

mod rules;

pub use rules::{Rule, RuleType, RuleValue};

use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

/// Represents a full Tree-sitter grammar definition.
///
/// This structure directly mirrors the `src/grammar.json` artifact produced by
/// `tree-sitter generate`. It captures the complete rule set along with
/// auxiliary metadata such as precedences, conflicts, and supertypes.
///
/// Rules keep their document order: the first rule is the start rule.
///
/// See <https://tree-sitter.github.io/tree-sitter/assets/schemas/grammar.schema.json>
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Grammar {
    /// Optional `$schema` field from the JSON, typically used for schema
    /// validation or editor integration.
    #[serde(rename = "$schema", default)]
    pub schema: Option<String>,

    /// The short name of the grammar (e.g. `"sakurae"`).
    pub name: String,

    /// Optional name of a base grammar that this one inherits from.
    #[serde(default)]
    pub inherits: Option<String>,

    /// All rule identifiers with their definitions, in definition order.
    pub rules: IndexMap<String, Rule>,

    /// “Extras” that may appear between other tokens, such as whitespace or comments.
    #[serde(default)]
    pub extras: Vec<Rule>,

    /// Rules implemented externally via a scanner.
    #[serde(default)]
    pub externals: Vec<Rule>,

    /// Names of rules that should be inlined into other rules.
    #[serde(default)]
    pub inline: Vec<String>,

    /// Precedence orderings; each entry is a `STRING` or `SYMBOL` rule.
    #[serde(default)]
    pub precedences: Vec<Vec<Rule>>,

    /// Explicit conflict groups expected during parsing.
    #[serde(default)]
    pub conflicts: Vec<Vec<String>>,

    /// Context-specific reserved word definitions.
    #[serde(default)]
    pub reserved: HashMap<String, Vec<Rule>>,

    /// The special rule name used to identify word tokens (keywords, identifiers, etc.).
    #[serde(default)]
    pub word: Option<String>,

    /// A list of node supertypes, grouping related syntactic forms.
    #[serde(default)]
    pub supertypes: Vec<String>,
}

impl Grammar {
    /// Returns the name and definition of the start rule.
    #[must_use]
    pub fn start_rule(&self) -> Option<(&str, &Rule)> {
        self.rules.first().map(|(name, rule)| (name.as_str(), rule))
    }

    /// Names of symbols provided by the external scanner.
    pub fn external_names(&self) -> impl Iterator<Item = &str> {
        self.externals
            .iter()
            .filter_map(|rule| rule.name.as_deref().or_else(|| rule.string_value()))
    }

    /// Returns `true` if `name` is a rule or an external token.
    #[must_use]
    pub fn defines(&self, name: &str) -> bool {
        self.rules.contains_key(name) || self.external_names().any(|ext| ext == name)
    }
}

/// Parse a JSON grammar definition into a strongly typed [`Grammar`] structure.
///
/// # Errors
///
/// Returns [`GrammarError::JsonParse`] if the provided string is not valid JSON
/// or fails schema deserialization.
pub fn parse_grammar(json: &str) -> Result<Grammar, GrammarError> {
    Ok(serde_json::from_str(json)?)
}

/// Possible errors raised during grammar parsing.
#[derive(Debug, Error)]
pub enum GrammarError {
    /// The input JSON was syntactically invalid or structurally mismatched.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}
