//! Load-time validation of grammar entry points.
//!
//! Parsing must not start on a language that failed to load. These checks call
//! an entry point once, inspect the handle it returns and turn an invalid handle
//! into a [`GrammarLoadError`] naming the grammar.

use crate::error::GrammarLoadError;
use crate::language::{GrammarEntryPoint, Language};
use crate::loader::BuiltinGrammar;

/// Checks that the builtin Sakurae grammar loads.
///
/// # Errors
///
/// Returns [`GrammarLoadError`] if the embedded artifact does not yield a
/// usable language.
pub fn validate_grammar_load() -> Result<(), GrammarLoadError> {
    validate_entry_point(&BuiltinGrammar)
}

/// Checks that `entry` yields a usable language, then releases it.
///
/// # Errors
///
/// Returns [`GrammarLoadError`] if the handle returned by `entry` is invalid.
pub fn validate_entry_point<E>(entry: &E) -> Result<(), GrammarLoadError>
where
    E: GrammarEntryPoint + ?Sized,
{
    load_checked(entry).map(drop)
}

/// Loads `entry` and returns the language only if the handle is valid.
///
/// # Errors
///
/// Returns [`GrammarLoadError`] carrying the entry point's failure cause, if
/// it reported one.
pub fn load_checked<E>(entry: &E) -> Result<Language, GrammarLoadError>
where
    E: GrammarEntryPoint + ?Sized,
{
    let name = entry.grammar_name();
    entry.load().into_result().map_err(|cause| {
        tracing::debug!(grammar = name, has_cause = cause.is_some(), "language handle is invalid");
        GrammarLoadError::new(name, cause)
    })
}
