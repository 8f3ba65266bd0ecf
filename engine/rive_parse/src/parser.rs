//! The line parser.

use std::ops::Range;

use rive_ir::{ObjectDef, ScriptDocument, TriggerDef, DEFAULT_TOPIC};

use crate::{ParseError, ParseErrorKind};

/// Parse a whole script.
///
/// Stops at the first error.
pub fn parse_script(source: &str) -> Result<ScriptDocument, ParseError> {
    let mut parser = Parser::default();
    let mut offset = 0;
    for (index, raw) in source.split_inclusive('\n').enumerate() {
        let line = raw.trim_end_matches(['\n', '\r']);
        let span = offset..offset + line.len();
        offset += raw.len();
        parser
            .line(line, index + 1, &span)
            .map_err(|kind| ParseError::new(kind, index + 1, span))?;
    }
    parser.finish()
}

/// What a `^` line continues.
#[derive(Copy, Clone)]
enum Last {
    Trigger,
    Response,
    Redirect,
    Condition,
    Definition(Table),
    Array,
}

/// The `name = value` tables of a document.
#[derive(Copy, Clone)]
enum Table {
    Var,
    Global,
    Sub,
    Person,
}

struct OpenObject {
    name: String,
    language: String,
    body: Vec<String>,
    /// Line number and span of the `> object` line.
    line: usize,
    span: Range<usize>,
}

struct Parser {
    document: ScriptDocument,
    topic: String,
    /// The current topic has a trigger that can take responses.
    has_trigger: bool,
    last: Option<Last>,
    object: Option<OpenObject>,
}

impl Default for Parser {
    fn default() -> Self {
        Parser {
            document: ScriptDocument::default(),
            topic: DEFAULT_TOPIC.to_string(),
            has_trigger: false,
            last: None,
            object: None,
        }
    }
}

impl Parser {
    fn line(&mut self, line: &str, number: usize, span: &Range<usize>) -> Result<(), ParseErrorKind> {
        if is_close(line, "object") {
            if self.object.is_none() {
                return Err(ParseErrorKind::UnexpectedClose("object".to_string()));
            }
            self.close_object();
            return Ok(());
        }
        if let Some(object) = &mut self.object {
            object.body.push(line.to_string());
            return Ok(());
        }

        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            return Ok(());
        }
        let mut chars = line.chars();
        let Some(command) = chars.next() else {
            return Ok(());
        };
        let rest = chars.as_str().trim();

        match command {
            '+' => self.trigger(rest),
            '-' => self.response(rest),
            '@' => self.redirect(rest),
            '*' => self.condition(rest),
            '^' => self.continuation(rest),
            '>' => self.open(rest, number, span),
            '<' => self.close(rest),
            '!' => self.definition(rest),
            other => Err(ParseErrorKind::UnknownCommand(other)),
        }
    }

    fn trigger(&mut self, pattern: &str) -> Result<(), ParseErrorKind> {
        if pattern.is_empty() {
            return Err(ParseErrorKind::MissingArgument {
                command: '+',
                expected: "a pattern",
            });
        }
        self.document
            .topic_mut(&self.topic)
            .triggers
            .push(TriggerDef::new(pattern));
        self.has_trigger = true;
        self.last = Some(Last::Trigger);
        Ok(())
    }

    fn response(&mut self, template: &str) -> Result<(), ParseErrorKind> {
        let trigger = self.current_trigger()?;
        trigger.responses.push(template.to_string());
        self.last = Some(Last::Response);
        Ok(())
    }

    fn redirect(&mut self, target: &str) -> Result<(), ParseErrorKind> {
        if target.is_empty() {
            return Err(ParseErrorKind::MissingArgument {
                command: '@',
                expected: "a redirect target",
            });
        }
        let trigger = self.current_trigger()?;
        trigger.redirect = Some(target.to_string());
        self.last = Some(Last::Redirect);
        Ok(())
    }

    fn condition(&mut self, condition: &str) -> Result<(), ParseErrorKind> {
        if !condition.contains("=>") {
            return Err(ParseErrorKind::MalformedCondition);
        }
        let trigger = self.current_trigger()?;
        trigger.conditions.push(condition.to_string());
        self.last = Some(Last::Condition);
        Ok(())
    }

    fn continuation(&mut self, text: &str) -> Result<(), ParseErrorKind> {
        let last = self.last.ok_or(ParseErrorKind::DanglingContinuation)?;
        let target = match last {
            Last::Array => {
                let (_, entries) = self
                    .document
                    .arrays
                    .last_mut()
                    .ok_or(ParseErrorKind::DanglingContinuation)?;
                entries.extend(array_entries(text));
                return Ok(());
            }
            Last::Definition(table) => {
                let (_, value) = self
                    .table(table)
                    .last_mut()
                    .ok_or(ParseErrorKind::DanglingContinuation)?;
                value
            }
            Last::Trigger | Last::Response | Last::Redirect | Last::Condition => {
                let trigger = self
                    .current_trigger()
                    .map_err(|_| ParseErrorKind::DanglingContinuation)?;
                match last {
                    Last::Trigger => &mut trigger.pattern,
                    Last::Redirect => trigger
                        .redirect
                        .as_mut()
                        .ok_or(ParseErrorKind::DanglingContinuation)?,
                    Last::Condition => trigger
                        .conditions
                        .last_mut()
                        .ok_or(ParseErrorKind::DanglingContinuation)?,
                    _ => trigger
                        .responses
                        .last_mut()
                        .ok_or(ParseErrorKind::DanglingContinuation)?,
                }
            }
        };
        target.push_str(text);
        Ok(())
    }

    fn current_trigger(&mut self) -> Result<&mut TriggerDef, ParseErrorKind> {
        if !self.has_trigger {
            return Err(ParseErrorKind::ResponseWithoutTrigger);
        }
        self.document
            .topic_mut(&self.topic)
            .triggers
            .last_mut()
            .ok_or(ParseErrorKind::ResponseWithoutTrigger)
    }

    fn open(&mut self, rest: &str, line: usize, span: &Range<usize>) -> Result<(), ParseErrorKind> {
        let mut words = rest.split_whitespace();
        match words.next() {
            Some("topic") => {
                let name = words.next().ok_or(ParseErrorKind::MissingArgument {
                    command: '>',
                    expected: "a topic name",
                })?;
                self.enter_topic(name.to_lowercase());
                Ok(())
            }
            Some("object") => {
                let (Some(name), Some(language)) = (words.next(), words.next()) else {
                    return Err(ParseErrorKind::MissingArgument {
                        command: '>',
                        expected: "an object name and language",
                    });
                };
                self.object = Some(OpenObject {
                    name: name.to_string(),
                    language: language.to_lowercase(),
                    body: Vec::new(),
                    line,
                    span: span.clone(),
                });
                Ok(())
            }
            Some(label) => Err(ParseErrorKind::UnknownLabel(label.to_string())),
            None => Err(ParseErrorKind::MissingArgument {
                command: '>',
                expected: "a label",
            }),
        }
    }

    fn close(&mut self, rest: &str) -> Result<(), ParseErrorKind> {
        match rest {
            "topic" if self.topic != DEFAULT_TOPIC => {
                self.enter_topic(DEFAULT_TOPIC.to_string());
                Ok(())
            }
            other => Err(ParseErrorKind::UnexpectedClose(other.to_string())),
        }
    }

    fn enter_topic(&mut self, name: String) {
        tracing::trace!(topic = %name, "entering topic");
        self.topic = name;
        self.has_trigger = false;
        self.last = None;
    }

    fn definition(&mut self, rest: &str) -> Result<(), ParseErrorKind> {
        let (kind, assignment) = rest
            .split_once(char::is_whitespace)
            .ok_or(ParseErrorKind::MalformedDefinition)?;
        // The script format version carries no meaning here.
        if kind == "version" {
            return Ok(());
        }
        let (name, value) = assignment
            .split_once('=')
            .map(|(name, value)| (name.trim(), value.trim()))
            .filter(|(name, _)| !name.is_empty())
            .ok_or(ParseErrorKind::MalformedDefinition)?;
        let table = match kind {
            "var" => Table::Var,
            "global" => Table::Global,
            "sub" => Table::Sub,
            "person" => Table::Person,
            "array" => {
                self.document
                    .arrays
                    .push((name.to_string(), array_entries(value)));
                self.last = Some(Last::Array);
                return Ok(());
            }
            "local" => {
                tracing::debug!(option = name, value, "ignoring parser option");
                self.last = None;
                return Ok(());
            }
            other => {
                tracing::warn!(kind = other, name, "skipping unknown definition type");
                self.last = None;
                return Ok(());
            }
        };
        self.table(table)
            .push((name.to_string(), value.to_string()));
        self.last = Some(Last::Definition(table));
        Ok(())
    }

    fn table(&mut self, table: Table) -> &mut Vec<(String, String)> {
        match table {
            Table::Var => &mut self.document.bot_vars,
            Table::Global => &mut self.document.globals,
            Table::Sub => &mut self.document.substitutions,
            Table::Person => &mut self.document.person,
        }
    }

    fn close_object(&mut self) {
        if let Some(object) = self.object.take() {
            let body = object.body.join("\n");
            self.document
                .objects
                .push(ObjectDef::new(object.name, object.language, body));
        }
    }

    fn finish(self) -> Result<ScriptDocument, ParseError> {
        match self.object {
            Some(object) => Err(ParseError::new(
                ParseErrorKind::UnterminatedObject(object.name),
                object.line,
                object.span,
            )),
            None => Ok(self.document),
        }
    }
}

/// Entries of an `! array` value: split on `|` when present, else on
/// whitespace. `\s` stands for a space inside an entry.
fn array_entries(value: &str) -> Vec<String> {
    let parts: Vec<&str> = if value.contains('|') {
        value.split('|').collect()
    } else {
        value.split_whitespace().collect()
    };
    parts
        .into_iter()
        .map(|part| part.replace("\\s", " ").trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

/// Returns `true` for `< label`, with any spacing after `<`.
fn is_close(line: &str, label: &str) -> bool {
    line.trim()
        .strip_prefix('<')
        .is_some_and(|rest| rest.trim() == label)
}
