//! End-to-end interpreter scenarios over sorted comment lists

use danmaku_core::{
    sort_comments, Color, Comment, CommentSize, Interpreter, Lane, ScriptState, StyleConfig,
    StyledComment,
};
use proptest::prelude::*;

fn interpret(mut comments: Vec<Comment>) -> (Vec<StyledComment>, ScriptState) {
    sort_comments(&mut comments);
    let config = StyleConfig::default();
    let interpreter = Interpreter::new(&config);
    let mut state = ScriptState::new();
    let styled = comments
        .iter()
        .map(|comment| interpreter.apply(&mut state, comment))
        .collect();
    (styled, state)
}

#[test]
fn ban_directive_with_duration() {
    let (styled, state) = interpret(vec![
        Comment::new(1, 120, "hello"),
        Comment::new(2, 50, "@コメント禁止").as_owner().with_mail(["@200"]),
    ]);

    let directive = styled.iter().find(|c| c.id == 2).unwrap();
    assert!(directive.invisible);
    assert!(!state.is_banned(49));
    assert!(state.is_banned(50));
    assert!(state.is_banned(120));
    assert!(state.is_banned(20_049));
    assert!(!state.is_banned(20_050));
}

#[test]
fn ban_directive_with_inline_tick_duration() {
    let (_, state) = interpret(vec![Comment::new(1, 50, "@コメント禁止 @200").as_owner()]);
    assert!(state.is_banned(50));
    assert!(state.is_banned(249));
    assert!(!state.is_banned(250));
}

#[test]
fn replace_directive_rewrites_following_comments_only() {
    let (styled, _) = interpret(vec![
        Comment::new(1, 0, "foo before"),
        Comment::new(2, 10, "@置換 \"foo\" \"bar\"").as_owner(),
        Comment::new(3, 20, "foo after"),
    ]);
    assert_eq!(styled[0].content, "foo before");
    assert_eq!(styled[2].content, "bar after");
}

#[test]
fn replace_all_range_swaps_whole_content() {
    let (styled, _) = interpret(vec![
        Comment::new(1, 0, "@置換 草 見えない 全 全 部分一致").as_owner(),
        Comment::new(2, 5, "大草原").as_owner(),
        Comment::new(3, 5, "草"),
    ]);
    assert_eq!(styled[1].content, "見えない");
    assert_eq!(styled[2].content, "見えない");
}

#[test]
fn default_and_replace_styles_layer_in_order() {
    let (styled, _) = interpret(vec![
        Comment::new(1, 0, "@デフォルト").as_owner().with_mail(["shita", "small", "red"]),
        Comment::new(2, 0, "@置換 x y").as_owner().with_mail(["ue"]),
        Comment::new(3, 10, "x marks").with_mail(["big"]),
        Comment::new(4, 10, "plain"),
    ]);
    let replaced = &styled[2];
    assert_eq!(replaced.lane, Lane::Top);
    assert_eq!(replaced.size, CommentSize::Big);
    assert_eq!(replaced.color, Color::rgb(0xFF, 0, 0));

    let plain = &styled[3];
    assert_eq!(plain.lane, Lane::Bottom);
    assert_eq!(plain.size, CommentSize::Small);
}

proptest! {
    #[test]
    fn interpreter_never_panics_on_arbitrary_content(
        content in "[@＠]?(置換|逆|デフォルト|コメント禁止)?[ a-z\"'「」\\\\全コメ投]{0,24}",
        owner in any::<bool>(),
        mail in prop::collection::vec("[a-z0-9@#.]{0,8}", 0..6),
    ) {
        let mut comment = Comment::new(0, 0, content).with_mail(mail);
        comment.owner = owner;
        let (styled, _) = interpret(vec![comment]);
        prop_assert_eq!(styled.len(), 1);
        prop_assert!(styled[0].long >= 0);
        prop_assert!(styled[0].line_count >= 1);
    }

    #[test]
    fn first_lane_token_wins(tokens in prop::collection::vec(prop_oneof![Just("ue"), Just("shita"), Just("naka")], 1..5)) {
        let expected = match tokens[0] {
            "ue" => Lane::Top,
            "shita" => Lane::Bottom,
            _ => Lane::Scrolling,
        };
        let (styled, _) = interpret(vec![Comment::new(0, 0, "x").with_mail(tokens)]);
        prop_assert_eq!(styled[0].lane, expected);
    }
}
