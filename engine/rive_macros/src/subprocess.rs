//! Macros executed by an external interpreter.
//!
//! Each call spawns the configured command, writes one JSON request to its
//! stdin and reads one JSON response from its stdout:
//!
//! ```text
//! -> {"id": "alice", "message": "a b", "args": ["a", "b"], "code": "...", "vars": {"name": "Alice"}}
//! <- {"status": "ok", "reply": "...", "vars": {"name": "Bob"}}
//! <- {"status": "error", "message": "..."}
//! ```
//!
//! Variables in the response are written back to the calling session.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dispatcher::POLL_INTERVAL;
use crate::{MacroContext, MacroError, MacroHandler, ObjectMacro};

#[derive(Debug, Serialize)]
struct Request<'a> {
    id: &'a str,
    message: String,
    args: &'a [String],
    code: &'a str,
    vars: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Response {
    status: String,
    #[serde(default)]
    reply: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    vars: serde_json::Map<String, Value>,
}

/// Handler that runs each call through an external program.
#[derive(Clone, Debug)]
pub struct SubprocessHandler {
    program: String,
    args: Vec<String>,
}

impl SubprocessHandler {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        SubprocessHandler {
            program: program.into(),
            args,
        }
    }

    /// Parse a shell-free command line such as `perl rsp4j.pl --json`.
    ///
    /// Returns `None` for a blank command.
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut words = command.split_whitespace().map(str::to_string);
        let program = words.next()?;
        Some(Self::new(program, words.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn spawn(&self, name: &str) -> Result<Child, MacroError> {
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MacroError::failed(name, format!("cannot start `{}`: {e}", self.program)))
    }
}

impl MacroHandler for SubprocessHandler {
    #[tracing::instrument(level = "debug", skip_all, fields(name = object.name(), program = %self.program))]
    fn call(&self, object: &ObjectMacro, ctx: &MacroContext) -> Result<String, MacroError> {
        let name = object.name();
        let request = Request {
            id: ctx.session_id(),
            message: ctx.message(),
            args: ctx.args(),
            code: object.body(),
            vars: ctx
                .get_uservars(ctx.session_id())
                .unwrap_or_default()
                .into_iter()
                .collect(),
        };
        let mut payload = serde_json::to_vec(&request)
            .map_err(|e| MacroError::failed(name, format!("cannot encode request: {e}")))?;
        payload.push(b'\n');

        let mut child = self.spawn(name)?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        feed(child.stdin.take(), payload);

        let status = loop {
            if ctx.is_cancelled() {
                // Either may fail if the child exited meanwhile.
                let _ = child.kill();
                let _ = child.wait();
                return Err(MacroError::Cancelled {
                    name: name.to_string(),
                });
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(MacroError::failed(name, format!("cannot wait: {e}"))),
            }
        };

        let output = collect(name, stdout)?;
        if !status.success() {
            let errors = collect(name, stderr)?;
            return Err(MacroError::failed(
                name,
                format!("exited with {status}: {}", errors.trim()),
            ));
        }

        let response: Response = serde_json::from_str(output.trim())
            .map_err(|e| MacroError::failed(name, format!("malformed response: {e}")))?;
        if response.status != "ok" {
            return Err(MacroError::failed(
                name,
                response
                    .message
                    .unwrap_or_else(|| format!("status `{}`", response.status)),
            ));
        }
        for (key, value) in &response.vars {
            let value = match value {
                Value::String(text) => text.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            ctx.set_uservar(ctx.session_id(), key, &value)?;
        }
        Ok(response.reply)
    }
}

/// Write the request on its own thread; a child that never reads its input
/// must not keep the caller from seeing cancellation.
fn feed<W: Write + Send + 'static>(pipe: Option<W>, payload: Vec<u8>) {
    let Some(mut pipe) = pipe else {
        return;
    };
    thread::spawn(move || {
        // Fails with a broken pipe once the child exits or is killed.
        if let Err(error) = pipe.write_all(&payload) {
            tracing::debug!(%error, "subprocess did not accept the request");
        }
    });
}

type Drain = Option<JoinHandle<std::io::Result<String>>>;

/// Read a pipe to the end on its own thread so the child never blocks on it.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Drain {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut text = String::new();
            pipe.read_to_string(&mut text)?;
            Ok(text)
        })
    })
}

fn collect(name: &str, drain: Drain) -> Result<String, MacroError> {
    let Some(handle) = drain else {
        return Ok(String::new());
    };
    match handle.join() {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(MacroError::failed(name, format!("cannot read output: {e}"))),
        Err(_) => Err(MacroError::failed(name, "output reader panicked")),
    }
}
