//! `sakurae-grammar`: check that a Sakurae grammar artifact loads.
//!
//! Exit status is 0 when the language handle is valid, 1 when loading fails
//! and 2 on bad arguments.

use facet::Facet;
use sakurae_grammar::loader::language_from_json;
use sakurae_grammar::{
    load_checked, BuiltinGrammar, FnEntryPoint, GrammarEntryPoint, GrammarFile, GrammarLoadError,
    Language, LoaderConfig, GRAMMAR_JSON, GRAMMAR_NAME,
};
use std::error::Error;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable read for the log filter.
const LOG_ENV: &str = "SAKURAE_LOG";

#[derive(Facet)]
struct Args {
    /// Path to a `grammar.json` artifact; the builtin grammar when absent.
    #[facet(named, short = 'g', default)]
    grammar: Option<String>,

    /// Grammar name the artifact must declare; applies to the builtin too.
    #[facet(named, short = 'n', default)]
    name: Option<String>,

    /// Look the artifact up in the grammar search paths.
    #[facet(named, short = 's', default)]
    search: bool,

    /// Print a JSON report on stdout.
    #[facet(named, short = 'j', default)]
    json: bool,

    /// Log loader activity at debug level.
    #[facet(named, short = 'v', default)]
    verbose: bool,
}

#[derive(Facet)]
struct LoadReport {
    grammar: String,
    ok: bool,
    abi_version: Option<u32>,
    node_kinds: usize,
    fields: usize,
    keywords: Vec<String>,
    warnings: Vec<String>,
    error: Option<String>,
}

impl LoadReport {
    fn loaded(language: &Language) -> Self {
        Self {
            grammar: language.name().to_string(),
            ok: true,
            abi_version: language.abi_version(),
            node_kinds: language.node_kind_count(),
            fields: language.field_count(),
            keywords: language.keywords().to_vec(),
            warnings: language.warnings().iter().map(ToString::to_string).collect(),
            error: None,
        }
    }

    fn failed(err: &GrammarLoadError) -> Self {
        Self {
            grammar: err.grammar_name().to_string(),
            ok: false,
            abi_version: None,
            node_kinds: 0,
            fields: 0,
            keywords: Vec::new(),
            warnings: Vec::new(),
            error: Some(error_chain(err)),
        }
    }
}

fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn entry_point(args: &Args) -> Box<dyn GrammarEntryPoint> {
    let name = args.name.clone().unwrap_or_else(|| GRAMMAR_NAME.to_string());
    match (&args.grammar, args.search) {
        (Some(path), _) => Box::new(GrammarFile::at(name, path)),
        (None, true) => Box::new(GrammarFile::search(name, LoaderConfig::from_env())),
        (None, false) if name == GRAMMAR_NAME => Box::new(BuiltinGrammar),
        (None, false) => {
            let expected = name.clone();
            Box::new(FnEntryPoint::new(name, move || {
                language_from_json(&expected, GRAMMAR_JSON).into()
            }))
        }
    }
}

fn main() -> ExitCode {
    let args: Args = match facet_args::from_std_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };
    init_logging(args.verbose);

    let entry = entry_point(&args);
    let result = load_checked(&entry);

    if args.json {
        let report = match &result {
            Ok(language) => LoadReport::loaded(language),
            Err(err) => LoadReport::failed(err),
        };
        println!("{}", facet_json::to_string(&report));
    } else {
        match &result {
            Ok(language) => {
                println!(
                    "{}: ok ({} node kinds, {} fields, {} keywords)",
                    language.name(),
                    language.node_kind_count(),
                    language.field_count(),
                    language.keywords().len()
                );
                for warning in language.warnings() {
                    println!("warning: {warning}");
                }
            }
            Err(err) => eprintln!("{}", error_chain(err)),
        }
    }

    if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
