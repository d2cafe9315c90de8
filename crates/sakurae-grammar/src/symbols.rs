//! Symbol tables derived from a grammar.
//!
//! A loaded language answers the same questions a compiled parser does: how
//! many node kinds there are, which id a kind has, which fields exist and which
//! string tokens are keywords. Ids are assigned deterministically from rule
//! order so that repeated loads of one artifact agree.

use crate::grammar::{Grammar, Rule, RuleType, RuleValue};
use regex::Regex;
use std::collections::HashMap;

/// The reserved kind at id 0.
pub const END_KIND: &str = "end";

/// One entry of the node-kind table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeKind {
    /// The rule name, literal text or alias.
    pub name: String,
    /// `true` for rules and named aliases, `false` for literal tokens.
    pub named: bool,
    /// Hidden rules (leading `_`) never appear in syntax trees.
    pub visible: bool,
}

/// Node kinds, fields and keywords of a grammar.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    kinds: Vec<NodeKind>,
    ids: HashMap<(String, bool), u16>,
    fields: Vec<String>,
    keywords: Vec<String>,
}

impl SymbolTable {
    /// Derives the table for `grammar`.
    ///
    /// Returns `None` if the grammar has more kinds or fields than fit a `u16` id.
    #[must_use]
    pub fn build(grammar: &Grammar) -> Option<Self> {
        let mut table = SymbolTable::default();
        table.push(END_KIND, false, false)?;

        for name in grammar.rules.keys() {
            table.push(name, true, !name.starts_with('_'))?;
        }

        let mut tokens = Vec::new();
        let mut fields = Vec::new();
        for rule in grammar.rules.values() {
            collect_tokens(rule, false, &mut tokens, &mut fields);
        }
        for (name, named) in tokens {
            table.push(&name, named, true)?;
        }

        fields.sort();
        fields.dedup();
        u16::try_from(fields.len()).ok()?;
        table.fields = fields;

        table.keywords = keywords(grammar, &table.kinds);
        Some(table)
    }

    fn push(&mut self, name: &str, named: bool, visible: bool) -> Option<()> {
        let key = (name.to_string(), named);
        if self.ids.contains_key(&key) {
            return Some(());
        }
        let id = u16::try_from(self.kinds.len()).ok()?;
        self.ids.insert(key, id);
        self.kinds.push(NodeKind {
            name: name.to_string(),
            named,
            visible,
        });
        Some(())
    }

    /// Total number of node kinds, including [`END_KIND`].
    #[must_use]
    pub fn kind_count(&self) -> usize {
        self.kinds.len()
    }

    /// Looks up the id of a node kind.
    #[must_use]
    pub fn id_for_kind(&self, name: &str, named: bool) -> Option<u16> {
        self.ids.get(&(name.to_string(), named)).copied()
    }

    /// Looks up the node kind with the given id.
    #[must_use]
    pub fn kind(&self, id: u16) -> Option<&NodeKind> {
        self.kinds.get(usize::from(id))
    }

    /// Iterates over every node kind in id order.
    pub fn kinds(&self) -> impl Iterator<Item = &NodeKind> {
        self.kinds.iter()
    }

    /// Number of distinct field names.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Field ids start at 1; 0 means "no field".
    #[must_use]
    pub fn field_id(&self, name: &str) -> Option<u16> {
        let index = self.fields.binary_search_by(|f| f.as_str().cmp(name)).ok()?;
        u16::try_from(index + 1).ok()
    }

    /// The name of the field with the given id.
    #[must_use]
    pub fn field_name(&self, id: u16) -> Option<&str> {
        let index = usize::from(id).checked_sub(1)?;
        self.fields.get(index).map(String::as_str)
    }

    /// Literal tokens matched by the grammar's `word` rule.
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

fn collect_tokens(
    rule: &Rule,
    in_token: bool,
    tokens: &mut Vec<(String, bool)>,
    fields: &mut Vec<String>,
) {
    match rule.rule_type {
        RuleType::String if !in_token => {
            if let Some(text) = rule.string_value() {
                tokens.push((text.to_string(), false));
            }
        }
        RuleType::Alias => {
            if let (Some(text), false) = (alias_name(rule), in_token) {
                tokens.push((text.to_string(), rule.named.unwrap_or(false)));
            }
        }
        RuleType::Field => {
            if let Some(name) = &rule.name {
                fields.push(name.clone());
            }
        }
        _ => {}
    }

    let in_token = in_token || matches!(rule.rule_type, RuleType::Token | RuleType::ImmediateToken);
    for child in rule.children() {
        collect_tokens(child, in_token, tokens, fields);
    }
}

fn keywords(grammar: &Grammar, kinds: &[NodeKind]) -> Vec<String> {
    let Some(pattern) = grammar.word.as_deref().and_then(|word| word_pattern(grammar, word)) else {
        return Vec::new();
    };
    let regex = match Regex::new(&format!("^(?:{pattern})$")) {
        Ok(regex) => regex,
        Err(err) => {
            tracing::warn!(grammar = %grammar.name, %err, "word pattern is not a valid regex; no keywords extracted");
            return Vec::new();
        }
    };

    kinds
        .iter()
        .filter(|kind| !kind.named && kind.visible && regex.is_match(&kind.name))
        .map(|kind| kind.name.clone())
        .collect()
}

/// Follows `SYMBOL` indirections from the word rule to its `PATTERN`.
fn word_pattern<'g>(grammar: &'g Grammar, word: &str) -> Option<&'g str> {
    let mut rule = grammar.rules.get(word)?;
    for _ in 0..grammar.rules.len() {
        if let Some(pattern) = rule.pattern_value() {
            return Some(pattern);
        }
        rule = match rule.rule_type {
            RuleType::Symbol => grammar.rules.get(rule.name.as_deref()?)?,
            RuleType::Token => rule.content.as_deref()?,
            _ => return None,
        };
    }
    None
}

/// Alias rules carry their display name in `value`.
fn alias_name(rule: &Rule) -> Option<&str> {
    match &rule.value {
        Some(RuleValue::String(text)) => Some(text),
        _ => rule.name.as_deref(),
    }
}
