//! The `check` command: parse and load a script, report what was skipped.

use super::{load_or_exit, CliOptions};

/// Load a script and summarize it.
///
/// Skipped triggers and rejected macros are printed as warnings; only a
/// parse failure makes the command fail.
pub fn check_script(path: &str, options: &CliOptions) {
    let (engine, report) = load_or_exit(path, options);

    for error in &report.errors {
        eprintln!("warning: {path}: {error}");
    }
    let topics = engine.topic_names().join(", ");
    println!(
        "OK: {path} ({} triggers in {} topics [{topics}], {} objects, {} skipped)",
        report.triggers,
        report.topics,
        report.objects,
        report.errors.len()
    );
}
