//! Entry points for compiled tree-sitter parsers.
//!
//! A generated `parser.c` exports `const TSLanguage *tree_sitter_<name>(void)`.
//! Grammar crates publish it as a [`LanguageFn`]; editors load it from a shared
//! library. Either way the pointer is inspected before use: null means the
//! parser is missing, and the ABI version in the header must be one the
//! runtime accepts.
#![allow(unsafe_code)]

use crate::config::LoaderConfig;
use crate::error::ArtifactError;
use crate::language::{GrammarEntryPoint, Language, LanguageHandle};
use libloading::{Library, Symbol};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::ptr::NonNull;
use std::sync::Arc;
use tree_sitter_language::LanguageFn;

type RawLanguageFn = unsafe extern "C" fn() -> *const ();

/// Leading fields of `TSLanguage`, identical for ABI 13 through 15.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
#[allow(dead_code)] // layout mirror; not every field is consulted
struct RawLanguageHeader {
    abi_version: u32,
    symbol_count: u32,
    alias_count: u32,
    token_count: u32,
    external_token_count: u32,
    state_count: u32,
    large_state_count: u32,
    production_id_count: u32,
    field_count: u32,
}

/// A compiled parser's language, pinned together with the library it lives in.
pub(crate) struct NativeLanguage {
    raw: NonNull<RawLanguageHeader>,
    header: RawLanguageHeader,
    _library: Option<Arc<Library>>,
}

// SAFETY: parse tables are immutable static data, and the owning library is
// kept loaded for as long as any handle exists.
unsafe impl Send for NativeLanguage {}
unsafe impl Sync for NativeLanguage {}

impl NativeLanguage {
    pub(crate) fn abi_version(&self) -> u32 {
        self.header.abi_version
    }

    pub(crate) fn node_kind_count(&self) -> usize {
        (self.header.symbol_count as usize).saturating_add(self.header.alias_count as usize)
    }

    pub(crate) fn field_count(&self) -> usize {
        self.header.field_count as usize
    }

    pub(crate) fn as_ptr(&self) -> *const () {
        self.raw.as_ptr().cast_const().cast()
    }
}

/// Inspects the pointer returned by a language function.
///
/// # Safety
///
/// `ptr` must be null or point to a `TSLanguage` that outlives `library`.
unsafe fn inspect(
    name: &str,
    ptr: *const (),
    library: Option<Arc<Library>>,
    abi_versions: &RangeInclusive<u32>,
) -> LanguageHandle {
    let Some(raw) = NonNull::new(ptr.cast_mut().cast::<RawLanguageHeader>()) else {
        tracing::warn!(grammar = name, "language function returned null");
        return LanguageHandle::null();
    };

    let abi_version = raw.cast::<u32>().as_ptr().read();
    if !abi_versions.contains(&abi_version) {
        tracing::warn!(grammar = name, abi_version, "incompatible parser ABI");
        return LanguageHandle::failed(ArtifactError::AbiMismatch {
            found: abi_version,
            min: *abi_versions.start(),
            max: *abi_versions.end(),
        });
    }

    let header = raw.as_ptr().read();
    tracing::debug!(grammar = name, abi_version, symbols = header.symbol_count, "loaded native parser");
    Language::from_native(
        name,
        NativeLanguage {
            raw,
            header,
            _library: library,
        },
    )
    .into()
}

/// A parser linked into the binary, exposed through its [`LanguageFn`].
#[derive(Debug, Clone)]
pub struct NativeEntryPoint {
    name: String,
    language_fn: RawLanguageFn,
    abi_versions: RangeInclusive<u32>,
}

impl NativeEntryPoint {
    /// Wraps the language function of grammar `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, language_fn: LanguageFn) -> Self {
        Self {
            name: name.into(),
            language_fn: language_fn.into_raw(),
            abi_versions: LoaderConfig::default().abi_versions,
        }
    }

    /// Replaces the accepted ABI range.
    #[must_use]
    pub fn with_abi_versions(mut self, versions: RangeInclusive<u32>) -> Self {
        self.abi_versions = versions;
        self
    }
}

impl GrammarEntryPoint for NativeEntryPoint {
    fn grammar_name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> LanguageHandle {
        // SAFETY: a `LanguageFn` returns null or a static `TSLanguage`.
        unsafe {
            let ptr = (self.language_fn)();
            inspect(&self.name, ptr, None, &self.abi_versions)
        }
    }
}

#[derive(Debug, Clone)]
enum LibraryLocation {
    Path(PathBuf),
    Search(LoaderConfig),
}

/// A parser compiled into a shared library exporting `tree_sitter_<name>`.
#[derive(Debug, Clone)]
pub struct LibraryEntryPoint {
    name: String,
    location: LibraryLocation,
    abi_versions: RangeInclusive<u32>,
}

impl LibraryEntryPoint {
    /// The library at `path`.
    #[must_use]
    pub fn at(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            location: LibraryLocation::Path(path.into()),
            abi_versions: LoaderConfig::default().abi_versions,
        }
    }

    /// `<dir>/<name>.<so|dylib|dll>` in the first search path that has it.
    #[must_use]
    pub fn search(name: impl Into<String>, config: LoaderConfig) -> Self {
        let abi_versions = config.abi_versions.clone();
        Self {
            name: name.into(),
            location: LibraryLocation::Search(config),
            abi_versions,
        }
    }

    /// Platform file name of the library, e.g. `sakurae.so`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, std::env::consts::DLL_EXTENSION)
    }

    /// The exported symbol: `tree_sitter_` plus the name with `-` as `_`.
    #[must_use]
    pub fn symbol_name(&self) -> String {
        format!("tree_sitter_{}", self.name.replace('-', "_"))
    }

    fn resolve(&self) -> Result<PathBuf, ArtifactError> {
        let path = match &self.location {
            LibraryLocation::Path(path) => path.clone(),
            LibraryLocation::Search(config) => config
                .resolve(&self.file_name())
                .ok_or_else(|| ArtifactError::NotInSearchPath(self.file_name()))?,
        };
        if path.exists() {
            Ok(path)
        } else {
            Err(ArtifactError::NotFound(path))
        }
    }

    fn load_library(&self) -> Result<LanguageHandle, ArtifactError> {
        let path = self.resolve()?;
        let symbol = self.symbol_name();
        tracing::debug!(grammar = %self.name, path = %path.display(), %symbol, "opening grammar library");

        // SAFETY: grammar libraries have no initialisers with preconditions,
        // and the symbol is the generated `tree_sitter_<name>` function.
        unsafe {
            let library = Library::new(&path).map_err(|e| ArtifactError::Library(e.to_string()))?;
            let language_fn: RawLanguageFn = {
                let entry: Symbol<RawLanguageFn> = library
                    .get(symbol.as_bytes())
                    .map_err(|_| ArtifactError::MissingSymbol(symbol.clone()))?;
                *entry
            };
            let ptr = language_fn();
            Ok(inspect(&self.name, ptr, Some(Arc::new(library)), &self.abi_versions))
        }
    }
}

impl GrammarEntryPoint for LibraryEntryPoint {
    fn grammar_name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> LanguageHandle {
        self.load_library().unwrap_or_else(|err| {
            tracing::warn!(grammar = %self.name, %err, "grammar library rejected");
            LanguageHandle::failed(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::validate_entry_point;

    static HEADER_V14: [u32; 9] = [14, 40, 2, 20, 0, 100, 10, 5, 3];
    static HEADER_V9: [u32; 9] = [9, 40, 2, 20, 0, 100, 10, 5, 3];
    static HEADER_HUGE: [u32; 9] = [14, u32::MAX, u32::MAX, 0, 0, 0, 0, 0, 0];

    unsafe extern "C" fn language_v14() -> *const () {
        HEADER_V14.as_ptr().cast()
    }

    unsafe extern "C" fn language_v9() -> *const () {
        HEADER_V9.as_ptr().cast()
    }

    unsafe extern "C" fn language_huge() -> *const () {
        HEADER_HUGE.as_ptr().cast()
    }

    unsafe extern "C" fn language_null() -> *const () {
        std::ptr::null()
    }

    fn entry(f: RawLanguageFn) -> NativeEntryPoint {
        NativeEntryPoint::new("sakurae", unsafe { LanguageFn::from_raw(f) })
    }

    #[test]
    fn test_native_language_reads_header() {
        let language = entry(language_v14).load().into_language().unwrap();
        assert_eq!(language.abi_version(), Some(14));
        assert_eq!(language.node_kind_count(), 42);
        assert_eq!(language.field_count(), 3);
        assert!(language.grammar().is_none());
        assert!(language.keywords().is_empty());
    }

    #[test]
    fn test_node_kind_count_does_not_overflow() {
        let language = entry(language_huge).load().into_language().unwrap();
        let expected = usize::try_from(2 * u64::from(u32::MAX)).unwrap_or(usize::MAX);
        assert_eq!(language.node_kind_count(), expected);
    }

    #[test]
    fn test_null_language_is_invalid() {
        let handle = entry(language_null).load();
        assert!(!handle.is_valid());
        assert!(handle.failure().is_none());

        let err = validate_entry_point(&entry(language_null)).unwrap_err();
        assert_eq!(err.to_string(), "Error loading sakurae grammar");
    }

    #[test]
    fn test_old_abi_is_rejected() {
        let handle = entry(language_v9).load();
        assert!(matches!(
            handle.failure(),
            Some(ArtifactError::AbiMismatch { found: 9, min: 13, max: 15 })
        ));
    }

    #[test]
    fn test_abi_range_is_configurable() {
        let handle = entry(language_v14).with_abi_versions(15..=15).load();
        assert!(!handle.is_valid());
    }

    #[test]
    fn test_missing_library_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let handle = LibraryEntryPoint::at("sakurae", dir.path().join("sakurae.so")).load();
        assert!(matches!(handle.failure(), Some(ArtifactError::NotFound(_))));
    }

    #[test]
    fn test_non_library_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sakurae.so");
        std::fs::write(&path, b"not a shared object").unwrap();
        let handle = LibraryEntryPoint::at("sakurae", &path).load();
        assert!(matches!(handle.failure(), Some(ArtifactError::Library(_))));
    }

    #[test]
    fn test_symbol_and_file_names() {
        let entry = LibraryEntryPoint::search("sakurae-lang", LoaderConfig::default());
        assert_eq!(entry.symbol_name(), "tree_sitter_sakurae_lang");
        assert!(entry.file_name().starts_with("sakurae-lang."));
        assert!(matches!(
            entry.load().failure(),
            Some(ArtifactError::NotInSearchPath(_))
        ));
    }
}
