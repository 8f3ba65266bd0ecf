#![allow(
    clippy::unwrap_used,
    reason = "test code uses unwrap for concise assertions"
)]

use pretty_assertions::assert_eq;

use super::shell::chat;
use super::*;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|a| (*a).to_string()).collect()
}

const SCRIPT: &str = "\
! var name = Aiden
+ hello
- Hi, I am <bot name>.
+ my name is *
- <set name=<formal>>Nice to meet you, <get name>.
";

#[test]
fn options_and_positionals_are_separated() {
    let (options, positional) = CliOptions::parse(&args(&[
        "brain.rive",
        "--handler=Perl:perl rsp4j.pl",
        "alice",
        "--timeout=250",
        "--strict",
        "--seed=9",
        "hello",
    ]))
    .unwrap();
    assert_eq!(positional, vec!["brain.rive", "alice", "hello"]);
    assert_eq!(
        options.handlers,
        vec![HandlerSpec {
            language: "perl".into(),
            command: "perl rsp4j.pl".into(),
        }]
    );
    assert_eq!(options.timeout, Some(Duration::from_millis(250)));
    assert!(options.strict);
    assert_eq!(options.seed, Some(9));
    assert_eq!(options.user, "localuser");
}

#[test]
fn zero_timeout_disables_the_deadline() {
    let (options, _) = CliOptions::parse(&args(&["--timeout=0", "--user=bob"])).unwrap();
    assert_eq!(options.timeout, None);
    assert_eq!(options.user, "bob");
}

#[test]
fn bad_options_are_rejected() {
    assert!(CliOptions::parse(&args(&["--handler=perl"])).is_err());
    assert!(CliOptions::parse(&args(&["--handler=:cmd"])).is_err());
    assert!(CliOptions::parse(&args(&["--timeout=soon"])).is_err());
    assert!(CliOptions::parse(&args(&["--user="])).is_err());
    assert_eq!(
        CliOptions::parse(&args(&["--verbose"])).unwrap_err(),
        "unknown option `--verbose`"
    );
}

#[test]
fn script_documents_load_into_an_engine() {
    let document = parse_document("brain.rive", SCRIPT).unwrap();
    let options = CliOptions {
        seed: Some(1),
        ..CliOptions::default()
    };
    let (engine, report) = build_engine(&options, &document);
    assert!(report.is_clean());
    assert_eq!(report.triggers, 2);
    assert_eq!(engine.reply("alice", "hello"), "Hi, I am Aiden.");
}

#[test]
fn json_documents_are_accepted() {
    let json = r#"{
        "topics": [
            {"name": "random", "triggers": [{"pattern": "ping", "responses": ["pong"]}]}
        ]
    }"#;
    let document = parse_document("brain.JSON", json).unwrap();
    let (engine, _) = build_engine(&CliOptions::default(), &document);
    assert_eq!(engine.reply("alice", "ping"), "pong");

    assert!(matches!(
        parse_document("brain.json", "{"),
        Err(DocumentError::Json(_))
    ));
}

#[test]
fn parse_errors_carry_their_line() {
    let Err(DocumentError::Parse(error)) = parse_document("bad.rive", "+ hi\n? what\n") else {
        panic!("expected a parse error");
    };
    assert_eq!(error.line, 2);
}

#[test]
fn chat_loop_replies_until_quit() {
    let document = parse_document("brain.rive", SCRIPT).unwrap();
    let (engine, _) = build_engine(&CliOptions::default(), &document);

    let input = b"hello\n\nmy name is ada lovelace\n/quit\nhello\n";
    let mut output = Vec::new();
    chat(&engine, "alice", &input[..], &mut output).unwrap();

    let transcript = String::from_utf8(output).unwrap();
    assert_eq!(
        transcript,
        "You> Bot> Hi, I am Aiden.\n\
         You> You> Bot> Nice to meet you, Ada Lovelace.\n\
         You> \n"
    );
    assert_eq!(
        engine.get_uservar("alice", "name").as_deref(),
        Some("Ada Lovelace")
    );
}
