//! The `shell` command: an interactive chat loop on stdin.

use std::io::{self, BufRead, Write};

use rive_eval::Engine;

use super::{load_or_exit, CliOptions};

const QUIT: &str = "/quit";

pub fn run_shell(path: &str, options: &CliOptions) {
    let (engine, report) = load_or_exit(path, options);
    for error in &report.errors {
        eprintln!("warning: {path}: {error}");
    }
    println!("Loaded {path}. Type {QUIT} to exit.");

    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(e) = chat(&engine, &options.user, stdin.lock(), stdout.lock()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Reply to each input line until end of input or `/quit`.
pub(crate) fn chat<R: BufRead, W: Write>(
    engine: &Engine,
    user: &str,
    input: R,
    mut output: W,
) -> io::Result<()> {
    write!(output, "You> ")?;
    output.flush()?;
    for line in input.lines() {
        let line = line?;
        let message = line.trim();
        if message == QUIT {
            break;
        }
        if !message.is_empty() {
            writeln!(output, "Bot> {}", engine.reply(user, message))?;
        }
        write!(output, "You> ")?;
        output.flush()?;
    }
    writeln!(output)?;
    Ok(())
}
