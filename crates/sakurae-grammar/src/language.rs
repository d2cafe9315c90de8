//! Language handles and the entry points that produce them.
//!
//! A grammar binding exposes one function that hands out a language. Whatever
//! mechanism sits behind it (an embedded artifact, a file on disk, a compiled C
//! parser), callers only see a [`GrammarEntryPoint`] returning a
//! [`LanguageHandle`] they must inspect before parsing anything.

use crate::error::ArtifactError;
use crate::grammar::Grammar;
use crate::symbols::{NodeKind, SymbolTable};
use crate::validate::{validate, ValidationWarning};
use std::fmt;
use std::sync::Arc;

/// A function supplied by a grammar binding that loads its language.
///
/// Implementations must not keep state between calls: loading the same
/// artifact twice yields equivalent handles.
pub trait GrammarEntryPoint {
    /// The grammar's short name, used in diagnostics.
    fn grammar_name(&self) -> &str;

    /// Loads the language. A failed load returns an invalid handle, never panics.
    fn load(&self) -> LanguageHandle;
}

impl<E: GrammarEntryPoint + ?Sized> GrammarEntryPoint for &E {
    fn grammar_name(&self) -> &str {
        (**self).grammar_name()
    }

    fn load(&self) -> LanguageHandle {
        (**self).load()
    }
}

impl<E: GrammarEntryPoint + ?Sized> GrammarEntryPoint for Box<E> {
    fn grammar_name(&self) -> &str {
        (**self).grammar_name()
    }

    fn load(&self) -> LanguageHandle {
        (**self).load()
    }
}

/// The raw result of calling an entry point: a language, or nothing.
#[derive(Debug)]
pub struct LanguageHandle {
    inner: Result<Language, Option<ArtifactError>>,
}

impl LanguageHandle {
    /// A handle with no language and no recorded cause.
    #[must_use]
    pub fn null() -> Self {
        Self { inner: Err(None) }
    }

    /// A handle with no language, recording why.
    #[must_use]
    pub fn failed(cause: ArtifactError) -> Self {
        Self {
            inner: Err(Some(cause)),
        }
    }

    /// Returns `true` if the handle holds a language.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.inner.is_ok()
    }

    /// Borrows the language, if present.
    #[must_use]
    pub fn language(&self) -> Option<&Language> {
        self.inner.as_ref().ok()
    }

    /// The recorded failure, if the handle is invalid and a cause was given.
    #[must_use]
    pub fn failure(&self) -> Option<&ArtifactError> {
        self.inner.as_ref().err().and_then(Option::as_ref)
    }

    /// Converts into the language, or the optional failure cause.
    ///
    /// # Errors
    ///
    /// Returns the recorded cause (possibly `None`) if the handle is invalid.
    pub fn into_result(self) -> Result<Language, Option<ArtifactError>> {
        self.inner
    }

    /// Converts into the language, discarding any failure cause.
    #[must_use]
    pub fn into_language(self) -> Option<Language> {
        self.inner.ok()
    }
}

impl From<Language> for LanguageHandle {
    fn from(language: Language) -> Self {
        Self {
            inner: Ok(language),
        }
    }
}

impl From<Result<Language, ArtifactError>> for LanguageHandle {
    fn from(result: Result<Language, ArtifactError>) -> Self {
        match result {
            Ok(language) => language.into(),
            Err(cause) => Self::failed(cause),
        }
    }
}

/// A loaded grammar, ready to drive parsing.
///
/// Cloning is cheap; all clones share the loaded tables, which are released
/// once the last clone is dropped.
#[derive(Clone)]
pub struct Language {
    inner: Arc<LanguageInner>,
}

struct LanguageInner {
    name: String,
    repr: Repr,
}

enum Repr {
    Declarative {
        grammar: Grammar,
        symbols: SymbolTable,
        warnings: Vec<ValidationWarning>,
    },
    #[cfg(feature = "native")]
    Native(crate::native::NativeLanguage),
}

impl Language {
    /// Validates `grammar` and derives its tables.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Invalid`] if validation rejects the grammar and
    /// [`ArtifactError::TooManySymbols`] if its tables cannot be addressed.
    pub fn from_grammar(grammar: Grammar) -> Result<Self, ArtifactError> {
        let warnings = validate(&grammar)?;
        let symbols = SymbolTable::build(&grammar).ok_or(ArtifactError::TooManySymbols)?;
        tracing::debug!(
            grammar = %grammar.name,
            node_kinds = symbols.kind_count(),
            fields = symbols.field_count(),
            "loaded declarative grammar"
        );
        Ok(Self::new(
            grammar.name.clone(),
            Repr::Declarative {
                grammar,
                symbols,
                warnings,
            },
        ))
    }

    #[cfg(feature = "native")]
    pub(crate) fn from_native(name: impl Into<String>, native: crate::native::NativeLanguage) -> Self {
        Self::new(name.into(), Repr::Native(native))
    }

    fn new(name: String, repr: Repr) -> Self {
        Self {
            inner: Arc::new(LanguageInner { name, repr }),
        }
    }

    /// The grammar's short name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The ABI version of a compiled parser; `None` for declarative grammars.
    #[must_use]
    pub fn abi_version(&self) -> Option<u32> {
        match &self.inner.repr {
            Repr::Declarative { .. } => None,
            #[cfg(feature = "native")]
            Repr::Native(native) => Some(native.abi_version()),
        }
    }

    /// The `TSLanguage` pointer of a compiled parser, for handing to a
    /// tree-sitter runtime.
    #[cfg(feature = "native")]
    #[must_use]
    pub fn as_raw(&self) -> Option<*const ()> {
        match &self.inner.repr {
            Repr::Declarative { .. } => None,
            Repr::Native(native) => Some(native.as_ptr()),
        }
    }

    /// Number of node kinds, including the reserved end kind and aliases.
    #[must_use]
    pub fn node_kind_count(&self) -> usize {
        match &self.inner.repr {
            Repr::Declarative { symbols, .. } => symbols.kind_count(),
            #[cfg(feature = "native")]
            Repr::Native(native) => native.node_kind_count(),
        }
    }

    /// Number of distinct field names.
    #[must_use]
    pub fn field_count(&self) -> usize {
        match &self.inner.repr {
            Repr::Declarative { symbols, .. } => symbols.field_count(),
            #[cfg(feature = "native")]
            Repr::Native(native) => native.field_count(),
        }
    }

    /// Looks up a node kind's id. Only declarative grammars carry kind names.
    #[must_use]
    pub fn id_for_node_kind(&self, kind: &str, named: bool) -> Option<u16> {
        self.symbols()?.id_for_kind(kind, named)
    }

    /// Looks up the node kind with the given id.
    #[must_use]
    pub fn node_kind_for_id(&self, id: u16) -> Option<&NodeKind> {
        self.symbols()?.kind(id)
    }

    /// Looks up a field's id; ids start at 1.
    #[must_use]
    pub fn field_id_for_name(&self, name: &str) -> Option<u16> {
        self.symbols()?.field_id(name)
    }

    /// Looks up the field name with the given id.
    #[must_use]
    pub fn field_name_for_id(&self, id: u16) -> Option<&str> {
        self.symbols()?.field_name(id)
    }

    /// Literal tokens matched by the grammar's word rule.
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        self.symbols().map(SymbolTable::keywords).unwrap_or_default()
    }

    /// The grammar definition behind a declarative language.
    #[must_use]
    pub fn grammar(&self) -> Option<&Grammar> {
        match &self.inner.repr {
            Repr::Declarative { grammar, .. } => Some(grammar),
            #[cfg(feature = "native")]
            Repr::Native(_) => None,
        }
    }

    /// Non-fatal validation findings recorded when the grammar was loaded.
    #[must_use]
    pub fn warnings(&self) -> &[ValidationWarning] {
        match &self.inner.repr {
            Repr::Declarative { warnings, .. } => warnings.as_slice(),
            #[cfg(feature = "native")]
            Repr::Native(_) => &[],
        }
    }

    fn symbols(&self) -> Option<&SymbolTable> {
        match &self.inner.repr {
            Repr::Declarative { symbols, .. } => Some(symbols),
            #[cfg(feature = "native")]
            Repr::Native(_) => None,
        }
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.name())
            .field("abi_version", &self.abi_version())
            .field("node_kind_count", &self.node_kind_count())
            .field("field_count", &self.field_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::parse_grammar;

    fn tiny() -> Grammar {
        parse_grammar(
            r#"{
                "name": "tiny",
                "rules": {
                    "program": {"type": "FIELD", "name": "body", "content": {"type": "STRING", "value": "ok"}}
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_null_handle_is_invalid() {
        let handle = LanguageHandle::null();
        assert!(!handle.is_valid());
        assert!(handle.language().is_none());
        assert!(handle.failure().is_none());
        assert!(matches!(handle.into_result(), Err(None)));
    }

    #[test]
    fn test_failed_handle_keeps_cause() {
        let handle = LanguageHandle::failed(ArtifactError::Null);
        assert!(!handle.is_valid());
        assert!(matches!(handle.failure(), Some(ArtifactError::Null)));
        assert!(handle.into_language().is_none());
    }

    #[test]
    fn test_language_from_grammar() {
        let language = Language::from_grammar(tiny()).unwrap();
        assert_eq!(language.name(), "tiny");
        assert_eq!(language.abi_version(), None);
        assert_eq!(language.node_kind_count(), 3);
        assert_eq!(language.id_for_node_kind("program", true), Some(1));
        assert_eq!(language.node_kind_for_id(2).map(|k| k.name.as_str()), Some("ok"));
        assert_eq!(language.field_id_for_name("body"), Some(1));
        assert_eq!(language.field_name_for_id(1), Some("body"));
        assert!(language.warnings().is_empty());
        assert!(language.keywords().is_empty());
        assert_eq!(language.grammar().map(|g| g.name.as_str()), Some("tiny"));
    }

    #[test]
    fn test_invalid_grammar_has_no_language() {
        let mut grammar = tiny();
        grammar.rules.clear();
        let handle = LanguageHandle::from(Language::from_grammar(grammar));
        assert!(!handle.is_valid());
        assert!(matches!(handle.failure(), Some(ArtifactError::Invalid(_))));
    }

    #[test]
    fn test_clones_share_tables() {
        let language = Language::from_grammar(tiny()).unwrap();
        let clone = language.clone();
        assert!(Arc::ptr_eq(&language.inner, &clone.inner));
    }

    #[test]
    fn test_language_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Language>();
    }
}
