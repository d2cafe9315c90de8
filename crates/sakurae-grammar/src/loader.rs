//! Entry points backed by `grammar.json` artifacts.
//!
//! Each entry point re-reads and re-validates its artifact on every
//! [`load`](GrammarEntryPoint::load), so loads are independent of each other
//! and safe to run in parallel.

use crate::config::LoaderConfig;
use crate::error::ArtifactError;
use crate::grammar::parse_grammar;
use crate::language::{GrammarEntryPoint, Language, LanguageHandle};
use crate::{GRAMMAR_JSON, GRAMMAR_NAME};
use std::io;
use std::path::{Path, PathBuf};

/// Decodes `json`, checks it describes `expected_name`, and validates it.
///
/// # Errors
///
/// Returns [`ArtifactError::Malformed`] for undecodable input,
/// [`ArtifactError::NameMismatch`] if the artifact is for another grammar, and
/// the errors of [`Language::from_grammar`].
pub fn language_from_json(expected_name: &str, json: &str) -> Result<Language, ArtifactError> {
    let grammar = parse_grammar(json)?;
    if grammar.name != expected_name {
        return Err(ArtifactError::NameMismatch {
            expected: expected_name.to_string(),
            found: grammar.name,
        });
    }
    Language::from_grammar(grammar)
}

fn finish(name: &str, result: Result<Language, ArtifactError>) -> LanguageHandle {
    if let Err(err) = &result {
        tracing::warn!(grammar = name, %err, "grammar artifact rejected");
    }
    result.into()
}

/// The Sakurae grammar compiled into this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinGrammar;

impl GrammarEntryPoint for BuiltinGrammar {
    fn grammar_name(&self) -> &str {
        GRAMMAR_NAME
    }

    fn load(&self) -> LanguageHandle {
        finish(GRAMMAR_NAME, language_from_json(GRAMMAR_NAME, GRAMMAR_JSON))
    }
}

#[derive(Debug, Clone)]
enum Location {
    Path(PathBuf),
    Search(LoaderConfig),
}

/// A `grammar.json` artifact on disk.
#[derive(Debug, Clone)]
pub struct GrammarFile {
    name: String,
    location: Location,
}

impl GrammarFile {
    /// The artifact at `path`, expected to describe grammar `name`.
    #[must_use]
    pub fn at(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            location: Location::Path(path.into()),
        }
    }

    /// The artifact `<dir>/<name>.json` in the first search path that has one.
    ///
    /// Resolution happens on each load, so artifacts installed later are seen.
    #[must_use]
    pub fn search(name: impl Into<String>, config: LoaderConfig) -> Self {
        Self {
            name: name.into(),
            location: Location::Search(config),
        }
    }

    /// The artifact file name used for search-path lookups.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.json", self.name)
    }

    fn resolve(&self) -> Result<PathBuf, ArtifactError> {
        match &self.location {
            Location::Path(path) => Ok(path.clone()),
            Location::Search(config) => config
                .resolve(&self.file_name())
                .ok_or_else(|| ArtifactError::NotInSearchPath(self.file_name())),
        }
    }

    fn load_language(&self) -> Result<Language, ArtifactError> {
        let path = self.resolve()?;
        tracing::debug!(grammar = %self.name, path = %path.display(), "reading grammar artifact");
        let json = read_artifact(&path)?;
        language_from_json(&self.name, &json)
    }
}

fn read_artifact(path: &Path) -> Result<String, ArtifactError> {
    std::fs::read_to_string(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => ArtifactError::NotFound(path.to_path_buf()),
        _ => ArtifactError::Io(err),
    })
}

impl GrammarEntryPoint for GrammarFile {
    fn grammar_name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> LanguageHandle {
        finish(&self.name, self.load_language())
    }
}

/// An entry point backed by a caller-supplied function.
pub struct FnEntryPoint<F> {
    name: String,
    load: F,
}

impl<F> FnEntryPoint<F>
where
    F: Fn() -> LanguageHandle,
{
    /// Wraps `load` as the entry point of grammar `name`.
    pub fn new(name: impl Into<String>, load: F) -> Self {
        Self {
            name: name.into(),
            load,
        }
    }
}

impl<F> GrammarEntryPoint for FnEntryPoint<F>
where
    F: Fn() -> LanguageHandle,
{
    fn grammar_name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> LanguageHandle {
        (self.load)()
    }
}
