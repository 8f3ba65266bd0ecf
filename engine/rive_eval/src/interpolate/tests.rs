#![allow(
    clippy::unwrap_used,
    reason = "test code uses unwrap for concise assertions"
)]

use std::sync::Arc;

use pretty_assertions::assert_eq;
use rive_macros::{MacroError, MacroRegistry, NativeHandler, ObjectMacro};
use rive_patterns::compile_template;

use super::*;

struct Fixture {
    store: Arc<VariableStore>,
    dispatcher: Dispatcher,
    bot_vars: FxHashMap<String, String>,
    messages: Messages,
}

impl Fixture {
    fn new() -> Self {
        let store = Arc::new(VariableStore::new());
        let dispatcher = Dispatcher::new(Arc::new(MacroRegistry::new()), Arc::clone(&store));
        let native = NativeHandler::new()
            .with("md5", |ctx| Ok(format!("md5({})", ctx.message())))
            .with("nametest", |ctx| {
                let name = ctx.args()[1..].join(" ");
                ctx.set_uservar(ctx.session_id(), "name", &name)?;
                Ok(String::new())
            })
            .with("greeting", |ctx| {
                let name = ctx
                    .get_uservar(ctx.session_id(), "name")
                    .unwrap_or_default();
                Ok(format!("hello {name}"))
            })
            .with("broken", |ctx| Err(MacroError::failed(ctx.name(), "boom")));
        dispatcher.register_handler("perl", Arc::new(native));
        for name in ["md5", "nametest", "greeting", "broken"] {
            dispatcher.define(ObjectMacro::new(name, "perl", "")).unwrap();
        }
        let mut bot_vars = FxHashMap::default();
        bot_vars.insert("name".to_string(), "Aiden".to_string());
        Fixture {
            store,
            dispatcher,
            bot_vars,
            messages: Messages::default(),
        }
    }

    fn interpolator(&self) -> Interpolator<'_> {
        Interpolator::new(&self.store, &self.dispatcher, &self.bot_vars, &self.messages)
    }

    fn render(&self, source: &str, captures: &[&str]) -> Result<String, RenderError> {
        let captures: Vec<String> = captures.iter().map(|c| (*c).to_string()).collect();
        self.interpolator()
            .render(&compile_template(source), &captures, "alice")
    }
}

#[test]
fn stars_and_id() {
    let fx = Fixture::new();
    assert_eq!(
        fx.render("<id> said <star2> then <star1>", &["one", "two"])
            .unwrap(),
        "alice said two then one"
    );
    assert_eq!(fx.render("<star>", &["john smith"]).unwrap(), "john smith");
    assert_eq!(fx.render("<formal>", &["john smith"]).unwrap(), "John Smith");
    assert_eq!(fx.render("<uppercase>", &["john"]).unwrap(), "JOHN");
}

#[test]
fn call_substitutes_macro_output() {
    let fx = Fixture::new();
    assert_eq!(
        fx.render("\"<star>\" in MD5 is: <call>md5 <star></call>", &["hello"])
            .unwrap(),
        "\"hello\" in MD5 is: md5(hello)"
    );
}

#[test]
fn macro_writes_are_visible_to_later_tags() {
    let fx = Fixture::new();
    let out = fx
        .render(
            "<call>nametest <id> <formal></call>Hi <get name>, <call>greeting</call>",
            &["john smith"],
        )
        .unwrap();
    assert_eq!(out, "Hi John Smith, hello John Smith");
    assert_eq!(fx.store.get("alice", "name").as_deref(), Some("John Smith"));
}

#[test]
fn get_set_and_bot() {
    let fx = Fixture::new();
    assert_eq!(fx.render("<get mood>", &[]).unwrap(), "undefined");
    assert_eq!(
        fx.render("<set mood=<star>>I am <bot name>, you are <get mood>", &["happy"])
            .unwrap(),
        "I am Aiden, you are happy"
    );
    assert_eq!(fx.render("<bot age>", &[]).unwrap(), "undefined");
}

#[test]
fn lenient_mode_renders_broken_tags_as_empty() {
    let fx = Fixture::new();
    assert_eq!(fx.render("a<star3>b", &["x"]).unwrap(), "ab");
    assert_eq!(fx.render("a<frobnicate>b", &[]).unwrap(), "ab");
    assert_eq!(fx.render("a<call>md5 <call>md5</call></call>b", &[]).unwrap(), "ab");
}

#[test]
fn strict_mode_reports_broken_tags() {
    let fx = Fixture::new();
    let strict = fx.interpolator().strict(true);
    let captures = vec!["x".to_string()];
    assert_eq!(
        strict.render(&compile_template("<star2>"), &captures, "alice"),
        Err(RenderError::CaptureIndex {
            index: 2,
            available: 1
        })
    );
    assert_eq!(
        strict.render(&compile_template("<frobnicate>"), &captures, "alice"),
        Err(RenderError::UnknownTag("frobnicate".into()))
    );
}

#[test]
fn macro_failures_propagate_by_default() {
    let fx = Fixture::new();
    assert_eq!(
        fx.render("<call>sha1 x</call>", &[]),
        Err(RenderError::MacroInvocation(MacroError::NotRegistered(
            "sha1".into()
        )))
    );
    assert_eq!(
        fx.render("<call>broken</call>", &[]),
        Err(RenderError::MacroInvocation(MacroError::failed(
            "broken", "boom"
        )))
    );
}

#[test]
fn macro_failures_can_be_substituted() {
    let fx = Fixture::new();
    let interpolator = fx.interpolator().policy(MacroFailurePolicy::Substitute);
    let out = interpolator
        .render(
            &compile_template("a <call>sha1 x</call> b <call>broken</call>"),
            &[],
            "alice",
        )
        .unwrap();
    assert_eq!(out, "a [ERR: Object Not Found] b [ERR: Object Failed]");
}

#[test]
fn cancelled_render_does_not_run_macros() {
    let fx = Fixture::new();
    let cancel = CancelToken::new();
    cancel.cancel();
    let result = fx
        .interpolator()
        .cancel(cancel)
        .render(&compile_template("<call>md5 x</call>"), &[], "alice");
    assert_eq!(
        result,
        Err(RenderError::MacroInvocation(MacroError::Cancelled {
            name: "md5".into()
        }))
    );
}

#[test]
fn math_updates_the_variable() {
    let fx = Fixture::new();
    assert_eq!(
        fx.render("<add points=5><mult points=3><sub points=1>", &[]).unwrap(),
        ""
    );
    assert_eq!(fx.store.get("alice", "points").as_deref(), Some("14"));
    assert_eq!(fx.render("<div points=<star>>", &["2"]).unwrap(), "");
    assert_eq!(fx.store.get("alice", "points").as_deref(), Some("7"));
}

#[test]
fn math_failures_render_their_message() {
    let fx = Fixture::new();
    fx.store.set("alice", "points", "10");
    assert_eq!(
        fx.render("<div points=0>", &[]).unwrap(),
        "[ERR: Can't Divide By Zero]"
    );
    assert_eq!(
        fx.render("<add points=lots>", &[]).unwrap(),
        "[ERR: Can't perform math operation on non-numeric value]"
    );
    fx.store.set("alice", "mood", "happy");
    assert_eq!(
        fx.render("<add mood=1>", &[]).unwrap(),
        "[ERR: Can't perform math operation on non-numeric variable]"
    );
    fx.store.set("alice", "big", &i64::MAX.to_string());
    assert_eq!(
        fx.render("<add big=1>", &[]).unwrap(),
        "[ERR: Can't perform math operation on non-numeric value]"
    );
    assert_eq!(fx.store.get("alice", "points").as_deref(), Some("10"));
}

#[test]
fn env_reads_globals() {
    let fx = Fixture::new();
    let mut globals = FxHashMap::default();
    globals.insert("host".to_string(), "example.org".to_string());
    let out = fx
        .interpolator()
        .globals(&globals)
        .render(&compile_template("<env host> <env port>"), &[], "alice")
        .unwrap();
    assert_eq!(out, "example.org undefined");
    assert_eq!(fx.render("<env host>", &[]).unwrap(), "undefined");
}

#[test]
fn format_and_person_blocks() {
    let fx = Fixture::new();
    let person = Substitutions::new([("i", "you"), ("my", "your"), ("you", "I")]);
    let captures = vec!["i love my dog".to_string()];
    let out = fx
        .interpolator()
        .person(&person)
        .render(
            &compile_template("{sentence}<person>{/sentence}? {uppercase}ok{/uppercase}"),
            &captures,
            "alice",
        )
        .unwrap();
    assert_eq!(out, "You love your dog? OK");
    assert_eq!(fx.render("<person>", &["i am"]).unwrap(), "i am");
}

#[test]
fn random_blocks_use_the_shared_rng() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    let fx = Fixture::new();
    let template = compile_template("{random}a|b|c{/random}");
    let pick = |seed| {
        let rng: SharedRng = Mutex::new(Box::new(StdRng::seed_from_u64(seed)));
        let interpolator = fx.interpolator().rng(&rng);
        (0..16)
            .map(|_| interpolator.render(&template, &[], "alice").unwrap())
            .collect::<Vec<_>>()
    };
    let first = pick(9);
    assert_eq!(first, pick(9));
    assert!(first.iter().all(|choice| ["a", "b", "c"].contains(&choice.as_str())));
}

#[test]
fn inline_redirect_calls_the_hook() {
    let fx = Fixture::new();
    let hook = |text: &str| format!("<{text}>");
    let out = fx
        .interpolator()
        .redirect(&hook)
        .render(&compile_template("{@ hello <star> } and <@>"), &["bob".to_string()], "alice")
        .unwrap();
    assert_eq!(out, "<hello bob> and <bob>");
}

#[test]
fn inline_redirect_without_a_hook_is_a_broken_tag() {
    let fx = Fixture::new();
    assert_eq!(fx.render("a{@hello}b", &[]).unwrap(), "ab");
    assert_eq!(
        fx.interpolator()
            .strict(true)
            .render(&compile_template("{@hello}"), &[], "alice"),
        Err(RenderError::RedirectUnavailable("hello".into()))
    );
}
