//! Rive CLI
//!
//! Check scripts, ask for a single reply, or chat interactively.

mod commands;

use commands::{check_script, init_tracing, reply_once, run_shell, CliOptions};

fn main() {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];
    let (options, positional) = match CliOptions::parse(&args[2..]) {
        Ok(parsed) => parsed,
        Err(message) => {
            eprintln!("error: {message}");
            std::process::exit(1);
        }
    };

    match command.as_str() {
        "check" => {
            let [path] = positional.as_slice() else {
                eprintln!("Usage: rive check <file.rive>");
                std::process::exit(1);
            };
            check_script(path, &options);
        }
        "reply" => {
            let [path, user, message @ ..] = positional.as_slice() else {
                eprintln!("Usage: rive reply <file.rive> <user> <message...>");
                std::process::exit(1);
            };
            if message.is_empty() {
                eprintln!("error: missing message");
                eprintln!("Usage: rive reply <file.rive> <user> <message...>");
                std::process::exit(1);
            }
            reply_once(path, user, &message.join(" "), &options);
        }
        "shell" => {
            let [path] = positional.as_slice() else {
                eprintln!("Usage: rive shell <file.rive> [--user=<id>]");
                std::process::exit(1);
            };
            run_shell(path, &options);
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "version" | "--version" | "-v" => {
            println!("Rive {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("Rive reply engine");
    println!();
    println!("Usage: rive <command> [options]");
    println!();
    println!("Commands:");
    println!("  check <file>                  Parse and load a script, report skipped triggers");
    println!("  reply <file> <user> <msg...>  Print one reply");
    println!("  shell <file>                  Chat interactively (/quit to exit)");
    println!("  help                          Show this help message");
    println!("  version                       Show version information");
    println!();
    println!("Scripts are `.rive` text, or `.json` script documents.");
    println!();
    println!("Options:");
    println!("  --handler=<lang>:<command>    Run `<lang>` object macros with an external command");
    println!("  --timeout=<ms>                Macro deadline in milliseconds (0: none, default 5000)");
    println!("  --strict                      Fail replies on unknown tags instead of skipping them");
    println!("  --seed=<n>                    Seed response selection");
    println!("  --user=<id>                   Session id for `shell` (default: localuser)");
    println!();
    println!("Environment:");
    println!("  RUST_LOG=<filter>             Enable logging, e.g. RUST_LOG=rive_eval=debug");
    println!("  RIVE_LOG_TREE=1               Render logs as an indented span tree");
    println!();
    println!("Examples:");
    println!("  rive check brain.rive");
    println!("  rive reply brain.rive alice encode hello in md5");
    println!("  rive shell brain.rive \"--handler=perl:perl rsp4j.pl\"");
}
