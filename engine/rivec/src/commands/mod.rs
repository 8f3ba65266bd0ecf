//! Command handlers for the rive CLI.
//!
//! Each submodule implements one command. Option parsing, script loading
//! and diagnostics shared between them live here.

use std::ops::Range;
use std::path::Path;
use std::sync::{Arc, Once};
use std::time::Duration;

use ariadne::{Label, Report, ReportKind, Source};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rive_eval::{Engine, EngineConfig, LoadReport};
use rive_ir::ScriptDocument;
use rive_macros::SubprocessHandler;
use rive_parse::{parse_script, ParseError};

mod check;
mod reply;
mod shell;

pub use check::check_script;
pub use reply::reply_once;
pub use shell::run_shell;

/// Session id used by `shell` when `--user` is not given.
const DEFAULT_USER: &str = "localuser";

static TRACING_INIT: Once = Once::new();

/// Initialize tracing from `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set. `RIVE_LOG_TREE` switches to an
/// indented span tree, which reads well for nested macro calls.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let filter = EnvFilter::from_default_env();
        let registry = tracing_subscriber::registry().with(filter);
        if std::env::var("RIVE_LOG_TREE").is_ok() {
            registry
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            registry
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    });
}

/// `--handler=<lang>:<command>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandlerSpec {
    pub language: String,
    pub command: String,
}

impl HandlerSpec {
    fn parse(value: &str) -> Result<Self, String> {
        match value.split_once(':') {
            Some((language, command)) if !language.is_empty() && !command.trim().is_empty() => {
                Ok(HandlerSpec {
                    language: language.to_lowercase(),
                    command: command.trim().to_string(),
                })
            }
            _ => Err(format!(
                "invalid handler `{value}`, expected <lang>:<command>"
            )),
        }
    }
}

/// Options shared by every command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CliOptions {
    pub handlers: Vec<HandlerSpec>,
    pub timeout: Option<Duration>,
    pub strict: bool,
    pub seed: Option<u64>,
    pub user: String,
}

impl Default for CliOptions {
    fn default() -> Self {
        CliOptions {
            handlers: Vec::new(),
            timeout: EngineConfig::default().macro_timeout,
            strict: false,
            seed: None,
            user: DEFAULT_USER.to_string(),
        }
    }
}

impl CliOptions {
    /// Split `args` into options and positional arguments.
    pub fn parse(args: &[String]) -> Result<(Self, Vec<String>), String> {
        let mut options = CliOptions::default();
        let mut positional = Vec::new();
        for arg in args {
            if let Some(value) = arg.strip_prefix("--handler=") {
                options.handlers.push(HandlerSpec::parse(value)?);
            } else if let Some(value) = arg.strip_prefix("--timeout=") {
                let millis: u64 = value
                    .parse()
                    .map_err(|_| format!("invalid timeout `{value}`"))?;
                options.timeout = (millis > 0).then(|| Duration::from_millis(millis));
            } else if let Some(value) = arg.strip_prefix("--seed=") {
                let seed = value
                    .parse()
                    .map_err(|_| format!("invalid seed `{value}`"))?;
                options.seed = Some(seed);
            } else if let Some(value) = arg.strip_prefix("--user=") {
                if value.is_empty() {
                    return Err("empty user id".to_string());
                }
                options.user = value.to_string();
            } else if arg == "--strict" {
                options.strict = true;
            } else if arg.starts_with("--") {
                return Err(format!("unknown option `{arg}`"));
            } else {
                positional.push(arg.clone());
            }
        }
        Ok((options, positional))
    }

    fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_macro_timeout(self.timeout)
            .with_strict_tags(self.strict)
    }
}

/// Why a script could not be turned into a document.
#[derive(Debug)]
pub(crate) enum DocumentError {
    Parse(ParseError),
    Json(serde_json::Error),
}

/// Parse `source` as a script, or as a JSON document for `.json` paths.
pub(crate) fn parse_document(path: &str, source: &str) -> Result<ScriptDocument, DocumentError> {
    let is_json = Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(source).map_err(DocumentError::Json)
    } else {
        parse_script(source).map_err(DocumentError::Parse)
    }
}

/// Build an engine with the requested handlers and load `document` into it.
pub(crate) fn build_engine(options: &CliOptions, document: &ScriptDocument) -> (Engine, LoadReport) {
    let mut engine = Engine::new(options.engine_config());
    if let Some(seed) = options.seed {
        engine = engine.with_rng(StdRng::seed_from_u64(seed));
    }
    for spec in &options.handlers {
        match SubprocessHandler::from_command_line(&spec.command) {
            Some(handler) => {
                engine.register_handler(&spec.language, Arc::new(handler));
            }
            None => tracing::warn!(language = %spec.language, "empty handler command"),
        }
    }
    let report = engine.load(document);
    (engine, report)
}

/// Read, parse and load a script, exiting with a report on failure.
pub(crate) fn load_or_exit(path: &str, options: &CliOptions) -> (Engine, LoadReport) {
    let source = read_file(path);
    let document = match parse_document(path, &source) {
        Ok(document) => document,
        Err(DocumentError::Parse(error)) => {
            report_parse_error(path, &source, &error);
            std::process::exit(1);
        }
        Err(DocumentError::Json(error)) => {
            eprintln!("error: {path}: invalid script document: {error}");
            std::process::exit(1);
        }
    };
    build_engine(options, &document)
}

pub(crate) fn read_file(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            let msg = match e.kind() {
                std::io::ErrorKind::NotFound => format!("cannot find file '{path}'"),
                std::io::ErrorKind::PermissionDenied => {
                    format!("permission denied reading '{path}'")
                }
                std::io::ErrorKind::InvalidData => {
                    format!("'{path}' contains invalid UTF-8 data")
                }
                _ => format!("error reading '{path}': {e}"),
            };
            eprintln!("{msg}");
            std::process::exit(1);
        }
    }
}

/// Render a parse error against its source line.
fn report_parse_error(path: &str, source: &str, error: &ParseError) {
    let span: Range<usize> = error.span.clone();
    let mut report = Report::build(ReportKind::Error, path, span.start)
        .with_message(format!("{} (line {})", error.kind.title(), error.line))
        .with_label(Label::new((path, span)).with_message(error.kind.to_string()));
    if let Some(hint) = error.kind.hint() {
        report = report.with_help(hint);
    }
    if report.finish().eprint((path, Source::from(source))).is_err() {
        eprintln!("error: {path}: {error}");
    }
}

#[cfg(test)]
mod tests;
