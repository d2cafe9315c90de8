//! Validation routines for Tree-sitter grammars.
//!
//! This module performs structural checks over parsed [`Grammar`](crate::grammar::Grammar)
//! definitions, such as verifying symbol references, ensuring all rules are reachable,
//! noting left recursion, and confirming precedence consistency. It runs on every
//! declarative load so that a corrupted artifact never yields a usable handle.

use crate::grammar::{Grammar, Rule, RuleType, RuleValue};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use thiserror::Error;

/// Represents a validation failure encountered when checking a grammar.
///
/// Validation errors indicate issues such as undefined symbols or malformed
/// rule nodes that make the grammar unusable by a parsing engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The grammar defines no rules at all.
    #[error("grammar has no rules")]
    NoRules,

    /// A `SYMBOL` rule references a name that is neither a rule nor an external.
    #[error("undefined symbol '{symbol}' referenced in rule '{rule}'")]
    UndefinedSymbol {
        /// The missing symbol.
        symbol: String,
        /// The rule containing the reference.
        rule: String,
    },

    /// A wrapper rule (`REPEAT`, `PREC`, `FIELD`, ...) has no `content`.
    #[error("{rule_type} rule in '{rule}' has no content")]
    MissingContent {
        /// The canonical name of the wrapper type.
        rule_type: &'static str,
        /// The rule containing the wrapper.
        rule: String,
    },

    /// A rule node lacks a field its type requires: a `SYMBOL` or `FIELD`
    /// without a name, a `STRING`, `PATTERN` or `ALIAS` without a string value,
    /// or a `CHOICE` without members.
    #[error("malformed {rule_type} rule in '{rule}'")]
    MalformedRule {
        /// The canonical name of the rule type.
        rule_type: &'static str,
        /// The rule containing the node.
        rule: String,
    },

    /// A top-level grammar section names an undefined rule.
    #[error("{section} refers to undefined rule '{name}'")]
    UnknownReference {
        /// The grammar section (`word`, `inline`, `supertypes`, `conflicts`,
        /// `precedences`).
        section: &'static str,
        /// The missing rule name.
        name: String,
    },
}

/// A non-fatal finding: the grammar still loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// The rule cannot be reached from the start rule, the extras, or the word rule.
    UnreachableRule(String),

    /// The rule uses more than one distinct numeric precedence level.
    MixedPrecedence {
        /// The rule in question.
        rule: String,
        /// The distinct levels, ascending.
        levels: Vec<i32>,
    },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValidationWarning::UnreachableRule(rule) => write!(f, "unreachable rule '{rule}'"),
            ValidationWarning::MixedPrecedence { rule, levels } => {
                write!(f, "rule '{rule}' has multiple precedence levels: {levels:?}")
            }
        }
    }
}

/// Performs semantic validation of a parsed [`Grammar`](crate::grammar::Grammar).
///
/// This function runs several consistency passes over the grammar:
///
/// - Checks that the grammar has rules and every rule node is well formed.
/// - Checks that all referenced symbols are defined.
/// - Checks the `word`, `inline`, `supertypes`, `conflicts`, `precedences` and
///   `reserved` sections.
/// - Warns about unreachable rules.
/// - Warns about inconsistent precedence usage.
///
/// Warnings are returned (and logged at debug level); they never reject the
/// grammar.
///
/// # Errors
///
/// Returns a [`ValidationError`] if any structural rule violation is detected.
pub fn validate(grammar: &Grammar) -> Result<Vec<ValidationWarning>, ValidationError> {
    if grammar.rules.is_empty() {
        return Err(ValidationError::NoRules);
    }

    for (rule_name, rule) in &grammar.rules {
        check_rule_symbols(grammar, rule, rule_name)?;
    }
    for extra in &grammar.extras {
        check_rule_symbols(grammar, extra, "extras")?;
    }
    check_sections(grammar)?;

    let mut warnings = check_unreachable_rules(grammar);
    check_left_recursion(grammar);
    warnings.extend(check_precedence(grammar));

    for warning in &warnings {
        tracing::debug!(grammar = %grammar.name, "{warning}");
    }

    Ok(warnings)
}

fn check_rule_symbols(grammar: &Grammar, rule: &Rule, context: &str) -> Result<(), ValidationError> {
    let malformed = || ValidationError::MalformedRule {
        rule_type: rule.type_name(),
        rule: context.to_string(),
    };

    match rule.rule_type {
        RuleType::Symbol => {
            let name = rule.name.as_deref().ok_or_else(malformed)?;
            if !grammar.defines(name) {
                return Err(ValidationError::UndefinedSymbol {
                    symbol: name.to_string(),
                    rule: context.to_string(),
                });
            }
        }

        RuleType::String | RuleType::Pattern => {
            if !matches!(rule.value, Some(RuleValue::String(_))) {
                return Err(malformed());
            }
        }

        RuleType::Choice if rule.members.is_empty() => return Err(malformed()),

        RuleType::Choice | RuleType::Seq => {
            for member in &rule.members {
                check_rule_symbols(grammar, member, context)?;
            }
        }

        wrapper if wrapper.is_wrapper() => {
            let named_ok = match wrapper {
                RuleType::Field => rule.name.is_some(),
                RuleType::Alias => matches!(rule.value, Some(RuleValue::String(_))),
                _ => true,
            };
            if !named_ok {
                return Err(malformed());
            }
            let content = rule.content.as_deref().ok_or_else(|| ValidationError::MissingContent {
                rule_type: rule.type_name(),
                rule: context.to_string(),
            })?;
            check_rule_symbols(grammar, content, context)?;
        }

        _ => {
            // blank: nothing to traverse
        }
    }
    Ok(())
}

fn check_sections(grammar: &Grammar) -> Result<(), ValidationError> {
    let sections = grammar
        .word
        .iter()
        .map(|name| ("word", name.as_str()))
        .chain(grammar.inline.iter().map(|name| ("inline", name.as_str())))
        .chain(grammar.supertypes.iter().map(|name| ("supertypes", name.as_str())))
        .chain(grammar.conflicts.iter().flatten().map(|name| ("conflicts", name.as_str())))
        .chain(
            grammar
                .precedences
                .iter()
                .flatten()
                .filter_map(Rule::symbol_name)
                .map(|name| ("precedences", name)),
        );

    for (section, name) in sections {
        if !grammar.defines(name) {
            return Err(ValidationError::UnknownReference {
                section,
                name: name.to_string(),
            });
        }
    }

    for words in grammar.reserved.values() {
        for word in words {
            check_rule_symbols(grammar, word, "reserved")?;
        }
    }
    Ok(())
}

fn check_unreachable_rules(grammar: &Grammar) -> Vec<ValidationWarning> {
    // Roots: the start rule (first in document order), extras, externals and the word rule
    let mut to_visit: Vec<String> = grammar.rules.keys().take(1).cloned().collect();
    for extra in &grammar.extras {
        collect_referenced_symbols(extra, &mut to_visit);
    }
    for external in &grammar.externals {
        collect_referenced_symbols(external, &mut to_visit);
    }
    to_visit.extend(grammar.word.iter().cloned());

    let mut reachable = HashSet::new();
    while let Some(rule_name) = to_visit.pop() {
        if !reachable.insert(rule_name.clone()) {
            continue; // Already visited
        }

        if let Some(rule) = grammar.rules.get(&rule_name) {
            collect_referenced_symbols(rule, &mut to_visit);
        }
    }

    grammar
        .rules
        .keys()
        .filter(|name| !reachable.contains(*name) && !grammar.inline.contains(*name))
        .map(|name| ValidationWarning::UnreachableRule(name.clone()))
        .collect()
}

fn collect_referenced_symbols(rule: &Rule, symbols: &mut Vec<String>) {
    if let Some(name) = rule.symbol_name() {
        symbols.push(name.to_string());
    }
    for child in rule.children() {
        collect_referenced_symbols(child, symbols);
    }
}

fn check_left_recursion(grammar: &Grammar) {
    // LR tables handle left recursion; only surface it for debugging
    for (rule_name, rule) in &grammar.rules {
        if has_immediate_left_recursion(rule, rule_name) {
            tracing::debug!(grammar = %grammar.name, rule = %rule_name, "left-recursive rule");
        }
    }
}

fn has_immediate_left_recursion(rule: &Rule, target: &str) -> bool {
    match rule.rule_type {
        RuleType::Symbol => rule.name.as_deref() == Some(target),

        RuleType::Seq => rule
            .members
            .first()
            .is_some_and(|first| has_immediate_left_recursion(first, target)),

        RuleType::Choice => rule
            .members
            .iter()
            .any(|member| has_immediate_left_recursion(member, target)),

        RuleType::Prec
        | RuleType::PrecLeft
        | RuleType::PrecRight
        | RuleType::PrecDynamic
        | RuleType::Field
        | RuleType::Alias => rule
            .content
            .as_deref()
            .is_some_and(|content| has_immediate_left_recursion(content, target)),

        _ => false,
    }
}

fn check_precedence(grammar: &Grammar) -> Vec<ValidationWarning> {
    let mut prec_levels: BTreeMap<&str, BTreeSet<i32>> = BTreeMap::new();

    for (rule_name, rule) in &grammar.rules {
        collect_precedence_levels(rule, &mut prec_levels, rule_name);
    }

    prec_levels
        .into_iter()
        .filter(|(_, levels)| levels.len() > 1)
        .map(|(rule, levels)| ValidationWarning::MixedPrecedence {
            rule: rule.to_string(),
            levels: levels.into_iter().collect(),
        })
        .collect()
}

fn collect_precedence_levels<'g>(
    rule: &Rule,
    levels: &mut BTreeMap<&'g str, BTreeSet<i32>>,
    context: &'g str,
) {
    if let Some(p) = rule.precedence() {
        levels.entry(context).or_default().insert(p);
    }
    for child in rule.children() {
        collect_precedence_levels(child, levels, context);
    }
}
