//! Tests for the response template compiler.

use super::*;
use pretty_assertions::assert_eq;

fn text(s: &str) -> Piece {
    Piece::Text(s.to_string())
}

fn star(index: usize) -> Piece {
    Piece::Tag(Tag::Star {
        index,
        case: CaseFormat::Verbatim,
    })
}

// Plain text

#[test]
fn plain_text_is_one_piece() {
    let template = compile_template("Hello there.");
    assert_eq!(template.pieces(), &[text("Hello there.")]);
    assert_eq!(template.weight(), 1);
    assert_eq!(template.source(), "Hello there.");
}

#[test]
fn lone_angle_brackets_are_text() {
    let template = compile_template("1 < 2 and 3 > 2, <3");
    assert_eq!(template.pieces(), &[text("1 < 2 and 3 > 2, <3")]);
}

// Star and id

#[test]
fn star_forms() {
    let template = compile_template("<star> <star2> <STAR10>");
    assert_eq!(
        template.pieces(),
        &[star(1), text(" "), star(2), text(" "), star(10)]
    );
}

#[test]
fn case_shorthands_refer_to_first_capture() {
    let template = compile_template("<formal><uppercase>");
    assert_eq!(
        template.pieces(),
        &[
            Piece::Tag(Tag::Star {
                index: 1,
                case: CaseFormat::Formal
            }),
            Piece::Tag(Tag::Star {
                index: 1,
                case: CaseFormat::Uppercase
            }),
        ]
    );
}

#[test]
fn id_tag() {
    let template = compile_template("You are <id>.");
    assert_eq!(
        template.pieces(),
        &[text("You are "), Piece::Tag(Tag::Id), text(".")]
    );
}

// Variables

#[test]
fn get_bot_and_set() {
    let template = compile_template("<set name=<formal>>Hi <get name>, I am <bot name>");
    assert_eq!(
        template.pieces(),
        &[
            Piece::Tag(Tag::Set {
                name: "name".into(),
                value: vec![Piece::Tag(Tag::Star {
                    index: 1,
                    case: CaseFormat::Formal
                })],
            }),
            text("Hi "),
            Piece::Tag(Tag::Get("name".into())),
            text(", I am "),
            Piece::Tag(Tag::Bot("name".into())),
        ]
    );
}

#[test]
fn set_without_name_is_malformed() {
    let template = compile_template("<set =x>");
    assert_eq!(
        template.pieces(),
        &[Piece::Tag(Tag::Malformed("set =x".into()))]
    );
}

// Calls

#[test]
fn call_with_star_argument() {
    let template = compile_template("\"<star>\" in MD5 is: <call>md5 <star></call>");
    assert_eq!(
        template.pieces(),
        &[
            text("\""),
            star(1),
            text("\" in MD5 is: "),
            Piece::Tag(Tag::Call {
                name: "md5".into(),
                args: vec![vec![star(1)]],
            }),
        ]
    );
    assert!(template.has_calls());
}

#[test]
fn call_without_arguments() {
    let template = compile_template("Perl RS version: <call>perlver</call>");
    assert_eq!(
        template.pieces(),
        &[
            text("Perl RS version: "),
            Piece::Tag(Tag::Call {
                name: "perlver".into(),
                args: Vec::new(),
            }),
        ]
    );
}

#[test]
fn call_arguments_split_on_whitespace_and_quotes() {
    let template = compile_template("<call>nametest <id> <formal> \"two words\" \"\"</call>!");
    let Piece::Tag(Tag::Call { name, args }) = &template.pieces()[0] else {
        panic!("expected a call, got {:?}", template.pieces());
    };
    assert_eq!(name, "nametest");
    assert_eq!(
        args,
        &vec![
            vec![Piece::Tag(Tag::Id)],
            vec![Piece::Tag(Tag::Star {
                index: 1,
                case: CaseFormat::Formal
            })],
            vec![text("two words")],
            Vec::new(),
        ]
    );
    assert_eq!(template.pieces()[1], text("!"));
}

#[test]
fn nested_call_is_malformed() {
    let template = compile_template("x <call>a <call>b</call></call> y");
    assert_eq!(
        template.pieces(),
        &[
            text("x "),
            Piece::Tag(Tag::Malformed("<call>a <call>b</call></call>".into())),
            text(" y"),
        ]
    );
}

#[test]
fn unterminated_call_is_malformed() {
    let template = compile_template("oops <call>md5 <star>");
    assert_eq!(
        template.pieces(),
        &[
            text("oops "),
            Piece::Tag(Tag::Malformed("<call>md5 <star>".into())),
        ]
    );
}

#[test]
fn empty_call_is_malformed() {
    let template = compile_template("<call> </call>");
    assert_eq!(
        template.pieces(),
        &[Piece::Tag(Tag::Malformed("<call> </call>".into()))]
    );
}

// Unknown tags and weight

#[test]
fn unknown_tag_keeps_inner_text() {
    let template = compile_template("<input> says hi");
    assert_eq!(
        template.pieces(),
        &[Piece::Tag(Tag::Unknown("input".into())), text(" says hi")]
    );
}

// Variables, math and blocks

#[test]
fn env_and_math_tags() {
    let template = compile_template("<env host><add points=5><div points=<get n>>");
    assert_eq!(
        template.pieces(),
        &[
            Piece::Tag(Tag::Env("host".into())),
            Piece::Tag(Tag::Math {
                op: MathOp::Add,
                name: "points".into(),
                value: vec![text("5")],
            }),
            Piece::Tag(Tag::Math {
                op: MathOp::Div,
                name: "points".into(),
                value: vec![Piece::Tag(Tag::Get("n".into()))],
            }),
        ]
    );
    assert_eq!(
        compile_template("<mult points>").pieces(),
        &[Piece::Tag(Tag::Malformed("mult points".into()))]
    );
}

#[test]
fn random_block_splits_on_bars_or_spaces() {
    let template = compile_template("{random}Hi there|Hello <star>{/random}!");
    assert_eq!(
        template.pieces(),
        &[
            Piece::Tag(Tag::Random(vec![
                vec![text("Hi there")],
                vec![text("Hello "), star(1)],
            ])),
            text("!"),
        ]
    );
    assert_eq!(
        compile_template("{random}a b{/random}").pieces(),
        &[Piece::Tag(Tag::Random(vec![vec![text("a")], vec![text("b")]]))]
    );
}

#[test]
fn format_and_person_blocks() {
    let template = compile_template("{formal}<get name>{/formal} said {person}<star2>{/person}");
    assert_eq!(
        template.pieces(),
        &[
            Piece::Tag(Tag::Format {
                case: CaseFormat::Formal,
                body: vec![Piece::Tag(Tag::Get("name".into()))],
            }),
            text(" said "),
            Piece::Tag(Tag::Person(vec![star(2)])),
        ]
    );
    assert_eq!(
        compile_template("<person>").pieces(),
        &[Piece::Tag(Tag::Person(vec![star(1)]))]
    );
}

#[test]
fn unterminated_block_is_malformed() {
    assert_eq!(
        compile_template("{random}a|b").pieces(),
        &[Piece::Tag(Tag::Malformed("{random}a|b".into()))]
    );
}

#[test]
fn redirects_and_topic_blocks() {
    assert_eq!(
        compile_template("{@hello <star>} and <@>").pieces(),
        &[
            Piece::Tag(Tag::Redirect(vec![text("hello "), star(1)])),
            text(" and "),
            Piece::Tag(Tag::Redirect(vec![star(1)])),
        ]
    );
    assert_eq!(
        compile_template("{topic=cave}Welcome.").pieces(),
        &[
            Piece::Tag(Tag::Set {
                name: "topic".into(),
                value: vec![text("cave")],
            }),
            text("Welcome."),
        ]
    );
}

#[test]
fn unknown_braces_are_text() {
    assert_eq!(
        compile_template("a {b} c {").pieces(),
        &[text("a {b} c {")]
    );
}

#[test]
fn weight_is_extracted() {
    let template = compile_template("Hello! {weight=5}");
    assert_eq!(template.weight(), 5);
    assert_eq!(template.pieces(), &[text("Hello!")]);
    assert_eq!(template.source(), "Hello! {weight=5}");
}

#[test]
fn non_positive_weight_counts_as_one() {
    let template = compile_template("hi there {weight=-2}");
    assert_eq!(template.weight(), 1);
    assert_eq!(template.pieces(), &[text("hi there")]);
    assert_eq!(compile_template("hi {weight=0}").weight(), 1);
}

#[test]
fn malformed_weight_stays_in_text() {
    let template = compile_template("Hi {weight=lots}");
    assert_eq!(template.weight(), 1);
    assert_eq!(template.pieces(), &[text("Hi {weight=lots}")]);
}
