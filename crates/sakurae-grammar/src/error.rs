//! Error types for grammar loading.

use crate::grammar::GrammarError;
use crate::validate::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

/// Why an entry point could not produce a usable language.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The artifact path does not exist.
    #[error("grammar artifact not found: {}", .0.display())]
    NotFound(PathBuf),

    /// No configured search path contains the artifact.
    #[error("no '{0}' artifact in any grammar search path")]
    NotInSearchPath(String),

    /// The artifact exists but could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The artifact is not a well-formed grammar.
    #[error("malformed grammar artifact: {0}")]
    Malformed(#[from] GrammarError),

    /// The artifact describes a different grammar.
    #[error("artifact declares grammar '{found}', expected '{expected}'")]
    NameMismatch {
        /// The name the entry point was asked for.
        expected: String,
        /// The name recorded in the artifact.
        found: String,
    },

    /// The grammar is structurally broken.
    #[error("invalid grammar: {0}")]
    Invalid(#[from] ValidationError),

    /// The grammar needs more node kinds or fields than ids can address.
    #[error("grammar exceeds the symbol id space")]
    TooManySymbols,

    /// The language function returned a null pointer.
    #[error("language function returned null")]
    Null,

    /// The compiled parser was generated for an incompatible runtime.
    #[error("language ABI version {found} is outside the supported range {min}..={max}")]
    AbiMismatch {
        /// The version recorded in the parser.
        found: u32,
        /// Oldest supported version.
        min: u32,
        /// Newest supported version.
        max: u32,
    },

    /// The shared library could not be opened.
    #[error("failed to load grammar library: {0}")]
    Library(String),

    /// The shared library does not export the language function.
    #[error("grammar library missing language function: {0}")]
    MissingSymbol(String),
}

/// The grammar's entry point did not yield a usable language handle.
///
/// Displays as `Error loading <name> grammar`; the underlying
/// [`ArtifactError`], when the entry point reported one, is the [`source`].
///
/// [`source`]: std::error::Error::source
#[derive(Debug, Error)]
#[error("Error loading {name} grammar")]
pub struct GrammarLoadError {
    name: String,
    #[source]
    cause: Option<ArtifactError>,
}

impl GrammarLoadError {
    pub(crate) fn new(name: impl Into<String>, cause: Option<ArtifactError>) -> Self {
        Self {
            name: name.into(),
            cause,
        }
    }

    /// The name of the grammar that failed to load.
    #[must_use]
    pub fn grammar_name(&self) -> &str {
        &self.name
    }

    /// The reported cause, if the entry point gave one.
    #[must_use]
    pub fn cause(&self) -> Option<&ArtifactError> {
        self.cause.as_ref()
    }
}
