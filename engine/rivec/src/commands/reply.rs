//! The `reply` command: answer one message and exit.

use super::{load_or_exit, CliOptions};

pub fn reply_once(path: &str, user: &str, message: &str, options: &CliOptions) {
    let (engine, _) = load_or_exit(path, options);
    println!("{}", engine.reply(user, message));
}
