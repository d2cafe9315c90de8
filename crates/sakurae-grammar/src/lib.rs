//! The Sakurae tree-sitter grammar and its load-time validator.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::multiple_crate_versions)]
// Loading runs inside editors and test harnesses; report through tracing
#![deny(clippy::print_stderr, clippy::print_stdout)]

/// Core structures and parsing logic for Tree-sitter grammars.
///
/// This module defines how a `grammar.json` artifact is understood: the
/// declarative shape of a language. Everything else in the crate builds upon
/// these types.
pub mod grammar;

/// Grammar validation and consistency checking utilities.
///
/// Validation protects callers from malformed artifacts. It enforces
/// Tree-sitter's invariants and ensures that what's decoded is also
/// semantically meaningful.
pub mod validate;

/// Node-kind, field and keyword tables.
pub mod symbols;

/// Language handles and the entry-point trait.
pub mod language;

/// Artifact search paths and accepted ABI versions.
pub mod config;

/// Entry points backed by `grammar.json` artifacts.
pub mod loader;

/// Checks that an entry point yields a usable language.
pub mod check;

/// Error types.
pub mod error;

/// Entry points for compiled C parsers.
#[cfg(feature = "native")]
#[cfg_attr(docsrs, doc(cfg(feature = "native")))]
pub mod native;

pub use check::{load_checked, validate_entry_point, validate_grammar_load};
pub use config::LoaderConfig;
pub use error::{ArtifactError, GrammarLoadError};
pub use grammar::{parse_grammar, Grammar, GrammarError, Rule};
pub use language::{GrammarEntryPoint, Language, LanguageHandle};
pub use loader::{BuiltinGrammar, FnEntryPoint, GrammarFile};
#[cfg(feature = "native")]
pub use native::{LibraryEntryPoint, NativeEntryPoint};
pub use validate::{validate, ValidationError, ValidationWarning};

/// The name of the grammar shipped with this crate.
pub const GRAMMAR_NAME: &str = "sakurae";

/// The Sakurae grammar artifact, as emitted by `tree-sitter generate`.
pub const GRAMMAR_JSON: &str = include_str!("grammar.json");
