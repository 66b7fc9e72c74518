//! Nicoscript interpreter
//!
//! Owner comments starting with a directive marker install rules that restyle
//! or rewrite the comments that follow them in vpos order. The interpreter is
//! a fold over the sorted comment list: [`ScriptState`] is the accumulator and
//! [`Interpreter::apply`] consumes one comment at a time.
//!
//! Reverse and ban rules only take effect at paint time; they are collected
//! here and read back through [`ScriptState::is_banned`] and
//! [`ScriptState::is_reversed`].

pub mod rules;
pub mod syntax;

use log::debug;

use crate::command::{parse_commands, Color, CommentSize, FontFace, Lane, StyleDirective};
use crate::comment::Comment;
use crate::config::StyleConfig;
use crate::segment::{line_count, segment_flash, Segment, Segments};
use crate::utils::ScriptError;

use rules::{BanRule, DefaultStyleRule, ReplaceRule, ReverseRule, RuleList};
use syntax::{inline_duration, parse_replace, parse_reverse_target, split_marker, Marker};

/// Display duration when no `@n` token is given, in ticks
pub const DEFAULT_DURATION: i64 = 300;

/// Lifetime of reverse and ban rules without a duration, in seconds
pub const DEFAULT_SCRIPT_DURATION_SEC: f64 = 30.0;

/// Longest display duration a comment can ask for, in ticks (ten minutes)
pub const MAX_DURATION: i64 = 60_000;

/// Longest lifetime of a script rule, in ticks (one day)
pub const MAX_SCRIPT_DURATION: i64 = 8_640_000;

/// Tabs are widened to two em spaces before measuring
const TAB_REPLACEMENT: &str = "\u{2003}\u{2003}";

fn seconds_to_ticks(seconds: f64) -> i64 {
    ((seconds * 100.0).floor() as i64).clamp(0, MAX_SCRIPT_DURATION)
}

/// Rule lists accumulated over one rendering session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptState {
    defaults: RuleList<DefaultStyleRule>,
    reverses: RuleList<ReverseRule>,
    bans: RuleList<BanRule>,
    replaces: RuleList<ReplaceRule>,
}

impl ScriptState {
    /// Empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Installed style fallbacks, newest first
    pub fn defaults(&self) -> &RuleList<DefaultStyleRule> {
        &self.defaults
    }

    /// Installed reversals, newest first
    pub fn reverses(&self) -> &RuleList<ReverseRule> {
        &self.reverses
    }

    /// Installed bans, newest first
    pub fn bans(&self) -> &RuleList<BanRule> {
        &self.bans
    }

    /// Installed replacements in `(start, order)` order
    pub fn replaces(&self) -> &RuleList<ReplaceRule> {
        &self.replaces
    }

    /// Whether painting is suppressed at `vpos`
    pub fn is_banned(&self, vpos: i64) -> bool {
        self.bans.iter().any(|ban| ban.covers(vpos))
    }

    /// Whether scrolling comments with `owner` travel left to right at `vpos`
    pub fn is_reversed(&self, vpos: i64, owner: bool) -> bool {
        self.reverses.iter().any(|rule| rule.applies(vpos, owner))
    }
}

/// Fully resolved styling of one comment
#[derive(Debug, Clone, PartialEq)]
pub struct StyledComment {
    /// Source comment id
    pub id: u64,
    /// Display start in ticks
    pub vpos: i64,
    /// Display duration in ticks
    pub long: i64,
    /// Posted by the video owner
    pub owner: bool,
    /// Collision layer
    pub layer: i32,
    /// Original mail tokens
    pub mail: Vec<String>,
    /// Content after replacement
    pub content: String,
    /// Content split into font runs
    pub segments: Segments,
    /// Number of lines
    pub line_count: usize,
    /// Baseline shift for flash super/subscripts, in lines
    pub line_offset: f32,
    /// Placement lane
    pub lane: Lane,
    /// Size class
    pub size: CommentSize,
    /// Fill colour
    pub color: Color,
    /// Font face
    pub font: FontFace,
    /// Wide width budget on fixed lanes
    pub full_width: bool,
    /// Exempt from line-count shrinking
    pub ender: bool,
    /// Semi-transparent fill
    pub live: bool,
    /// Never drawn
    pub invisible: bool,
    /// Installed a nicoscript rule
    pub directive: bool,
    /// Rendered with flash-era metrics
    pub flash: bool,
}

#[derive(Default)]
struct Fallback {
    color: Option<Color>,
    size: Option<CommentSize>,
    font: Option<FontFace>,
    lane: Option<Lane>,
}

impl Fallback {
    fn fill(&mut self, rule: &DefaultStyleRule) {
        self.color = self.color.or(rule.color);
        self.size = self.size.or(rule.size);
        self.font = self.font.or(rule.font);
        self.lane = self.lane.or(rule.lane);
    }

    fn complete(&self) -> bool {
        self.color.is_some() && self.size.is_some() && self.font.is_some() && self.lane.is_some()
    }
}

/// Applies mail commands and nicoscript rules in comment order
#[derive(Debug, Clone, Copy)]
pub struct Interpreter<'a> {
    config: &'a StyleConfig,
}

impl<'a> Interpreter<'a> {
    /// Interpreter over the given style tables
    pub fn new(config: &'a StyleConfig) -> Self {
        Self { config }
    }

    /// Resolve one comment, installing its rule if it is a directive
    ///
    /// Comments must be fed in `(vpos, date, date_usec)` order.
    pub fn apply(&self, state: &mut ScriptState, comment: &Comment) -> StyledComment {
        let directive = parse_commands(comment, &self.config.colors);

        if comment.owner {
            if let Ok((marker, args)) = split_marker(&comment.content) {
                if let Err(err) = install(state, marker, args, comment, &directive) {
                    debug!("skipping nicoscript in comment {}: {err}", comment.id);
                }
                let content = comment.content.clone();
                return self.resolve(comment, content, &directive, Fallback::default(), true);
            }
        }

        state.defaults.evict_expired(comment.vpos);
        state.replaces.evict_expired(comment.vpos);

        let mut fallback = Fallback::default();
        for rule in &state.defaults {
            fallback.fill(rule);
            if fallback.complete() {
                break;
            }
        }

        let mut content = comment.content.clone();
        let mut overrides = directive.clone();
        if let Some(rule) = state
            .replaces
            .iter()
            .find(|rule| rule.covers(comment.vpos) && rule.matches(&content, comment.owner))
        {
            content = rule.rewrite(&content);
            overrides.color = rule.color.or(overrides.color);
            overrides.size = rule.size.or(overrides.size);
            overrides.font = rule.font.or(overrides.font);
            overrides.lane = rule.lane.or(overrides.lane);
        }

        self.resolve(comment, content, &overrides, fallback, false)
    }

    fn resolve(
        &self,
        comment: &Comment,
        content: String,
        directive: &StyleDirective,
        fallback: Fallback,
        is_directive: bool,
    ) -> StyledComment {
        let flash = comment.is_flash(self.config.mode, self.config.flash_threshold);
        let content = content.replace('\t', TAB_REPLACEMENT);

        let mut font = directive.font.or(fallback.font).unwrap_or_default();
        let segments = if flash {
            let segments = segment_flash(&content, &self.config.flash_chars, self.config.flash_mode);
            if let Some(first) = segments.first().and_then(|s| s.font) {
                font = first;
            }
            segments
        } else {
            Segments::from_iter([Segment::plain(content.as_str())])
        };
        let line_offset = if flash {
            self.config.flash_script_chars.line_offset(&content)
        } else {
            0.0
        };

        StyledComment {
            id: comment.id,
            vpos: comment.vpos,
            long: match directive.duration_sec.map(seconds_to_ticks) {
                Some(0) | None => DEFAULT_DURATION,
                Some(ticks) => ticks.min(MAX_DURATION),
            },
            owner: comment.owner,
            layer: comment.layer,
            mail: comment.mail.clone(),
            line_count: line_count(&segments),
            segments,
            content,
            line_offset,
            lane: directive.lane.or(fallback.lane).unwrap_or_default(),
            size: directive.size.or(fallback.size).unwrap_or_default(),
            color: directive.color.or(fallback.color).unwrap_or(Color::WHITE),
            font,
            full_width: directive.full_width,
            ender: directive.ender,
            live: directive.live,
            invisible: directive.invisible || is_directive,
            directive: is_directive,
            flash,
        }
    }
}

fn install(
    state: &mut ScriptState,
    marker: Marker,
    args: &str,
    comment: &Comment,
    directive: &StyleDirective,
) -> Result<(), ScriptError> {
    let start = comment.vpos;
    let script_end = || {
        start.saturating_add(inline_duration(args).unwrap_or_else(|| {
            seconds_to_ticks(directive.duration_sec.unwrap_or(DEFAULT_SCRIPT_DURATION_SEC))
        }))
    };
    match marker {
        Marker::Default => {
            state.defaults.push_front(DefaultStyleRule {
                start,
                long: directive.duration_sec.map(seconds_to_ticks),
                color: directive.color,
                size: directive.size,
                font: directive.font,
                lane: directive.lane,
            });
            debug!("installed default style rule at {start}");
        }
        Marker::Reverse => {
            let target = parse_reverse_target(args)?;
            let end = script_end();
            state.reverses.push_front(ReverseRule { start, end, target });
            debug!("installed reverse rule [{start}, {end}) for {target:?}");
        }
        Marker::Ban => {
            let end = script_end();
            state.bans.push_front(BanRule { start, end });
            debug!("installed ban rule [{start}, {end})");
        }
        Marker::Replace => {
            let args = parse_replace(args)?;
            state.replaces.insert_sorted_by_key(
                ReplaceRule {
                    start,
                    long: directive.duration_sec.map(seconds_to_ticks),
                    keyword: args.keyword,
                    replacement: args.replacement,
                    range: args.range,
                    target: args.target,
                    condition: args.condition,
                    color: directive.color,
                    size: directive.size,
                    font: directive.font,
                    lane: directive.lane,
                    order: comment.id,
                },
                |rule| (rule.start, rule.order),
            );
            debug!("installed replace rule at {start}");
        }
        Marker::SeekBan | Marker::Jump => {
            debug!("player control directive {marker:?} hidden without effect");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(comments: &[Comment]) -> (Vec<StyledComment>, ScriptState) {
        let config = StyleConfig::default();
        let interpreter = Interpreter::new(&config);
        let mut state = ScriptState::new();
        let styled = comments.iter().map(|c| interpreter.apply(&mut state, c)).collect();
        (styled, state)
    }

    #[test]
    fn hard_defaults() {
        let (styled, _) = run(&[Comment::new(0, 100, "hi").with_date(2_000_000_000, 0)]);
        let c = &styled[0];
        assert_eq!(c.lane, Lane::Scrolling);
        assert_eq!(c.size, CommentSize::Medium);
        assert_eq!(c.font, FontFace::Defont);
        assert_eq!(c.color, Color::WHITE);
        assert_eq!(c.long, DEFAULT_DURATION);
        assert!(!c.invisible);
        assert!(!c.flash);
    }

    #[test]
    fn duration_is_floored_to_ticks() {
        let (styled, _) = run(&[Comment::new(0, 0, "x").with_mail(["@1.239"])]);
        assert_eq!(styled[0].long, 123);
    }

    #[test]
    fn newest_default_rule_wins_and_mail_beats_it() {
        let comments = [
            Comment::new(1, 0, "@デフォルト").as_owner().with_mail(["red", "big"]),
            Comment::new(2, 10, "@デフォルト").as_owner().with_mail(["blue"]),
            Comment::new(3, 20, "x"),
            Comment::new(4, 30, "y").with_mail(["green"]),
        ];
        let (styled, state) = run(&comments);
        assert_eq!(state.defaults().len(), 2);
        assert!(styled[0].invisible && styled[1].invisible);
        assert_eq!(styled[2].color, Color::rgb(0, 0, 0xFF));
        assert_eq!(styled[2].size, CommentSize::Big);
        assert_eq!(styled[3].color, Color::rgb(0, 0xFF, 0));
    }

    #[test]
    fn timed_default_rule_expires() {
        let comments = [
            Comment::new(1, 0, "@デフォルト").as_owner().with_mail(["red", "@1"]),
            Comment::new(2, 100, "inside"),
            Comment::new(3, 101, "outside"),
        ];
        let (styled, state) = run(&comments);
        assert_eq!(styled[1].color, Color::rgb(0xFF, 0, 0));
        assert_eq!(styled[2].color, Color::WHITE);
        assert!(state.defaults().is_empty());
    }

    #[test]
    fn viewer_directives_are_plain_text() {
        let (styled, state) = run(&[Comment::new(1, 0, "@コメント禁止")]);
        assert!(!styled[0].invisible);
        assert!(state.bans().is_empty());
    }

    #[test]
    fn ban_window_uses_duration() {
        let comments = [Comment::new(1, 50, "@コメント禁止").as_owner().with_mail(["@2"])];
        let (_, state) = run(&comments);
        assert!(!state.is_banned(49));
        assert!(state.is_banned(50));
        assert!(state.is_banned(249));
        assert!(!state.is_banned(250));
    }

    #[test]
    fn inline_ban_duration_is_in_ticks() {
        let (styled, state) = run(&[Comment::new(1, 50, "@コメント禁止 @200").as_owner()]);
        assert!(styled[0].invisible);
        assert_eq!(state.bans().iter().next(), Some(&BanRule { start: 50, end: 250 }));
    }

    #[test]
    fn zero_duration_falls_back_to_default() {
        let (styled, _) = run(&[Comment::new(0, 0, "x").with_mail(["@0"])]);
        assert_eq!(styled[0].long, DEFAULT_DURATION);
    }

    #[test]
    fn huge_durations_are_clamped() {
        let comments = [
            Comment::new(1, 50, "@コメント禁止 @9223372036854775807").as_owner(),
            Comment::new(2, i64::MAX - 10, "@逆 全").as_owner().with_mail(["@99999999999999999999"]),
            Comment::new(3, 60, "x").with_mail(["@99999999999999999999"]),
            Comment::new(4, 70, "y").with_mail(["@100000"]),
        ];
        let (styled, state) = run(&comments);
        assert_eq!(
            state.bans().iter().next(),
            Some(&BanRule {
                start: 50,
                end: 50 + MAX_SCRIPT_DURATION
            })
        );
        assert!(state.is_reversed(i64::MAX - 1, false));
        assert_eq!(styled[2].long, MAX_DURATION);
        assert_eq!(styled[3].long, MAX_DURATION);
    }

    #[test]
    fn reverse_defaults_to_thirty_seconds() {
        let (_, state) = run(&[Comment::new(1, 0, "@逆 投コメ").as_owner()]);
        assert!(state.is_reversed(2999, true));
        assert!(!state.is_reversed(2999, false));
        assert!(!state.is_reversed(3000, true));
    }

    #[test]
    fn malformed_directive_is_hidden_but_installs_nothing() {
        let (styled, state) = run(&[
            Comment::new(1, 0, "@逆").as_owner(),
            Comment::new(2, 0, "@置換 \"open").as_owner(),
        ]);
        assert!(styled.iter().all(|c| c.invisible && c.directive));
        assert!(state.reverses().is_empty());
        assert!(state.replaces().is_empty());
    }

    #[test]
    fn replace_rewrites_and_restyles() {
        let comments = [
            Comment::new(1, 0, "@置換 \"foo\" \"bar\"").as_owner().with_mail(["ue"]),
            Comment::new(2, 10, "foo and foo"),
            Comment::new(3, 10, "foo").as_owner(),
            Comment::new(4, 10, "nothing"),
        ];
        let (styled, _) = run(&comments);
        assert_eq!(styled[1].content, "bar and foo");
        assert_eq!(styled[1].lane, Lane::Top);
        assert_eq!(styled[2].content, "foo");
        assert_eq!(styled[3].content, "nothing");
        assert_eq!(styled[3].lane, Lane::Scrolling);
    }

    #[test]
    fn first_matching_replace_rule_applies() {
        let comments = [
            Comment::new(5, 0, "@置換 a X 全").as_owner(),
            Comment::new(2, 0, "@置換 a Y 全").as_owner(),
            Comment::new(9, 10, "abc"),
        ];
        let (styled, state) = run(&comments);
        let orders: Vec<u64> = state.replaces().iter().map(|r| r.order).collect();
        assert_eq!(orders, vec![2, 5]);
        assert_eq!(styled[2].content, "Y");
    }

    #[test]
    fn tabs_widen_and_lines_count() {
        let (styled, _) = run(&[Comment::new(0, 0, "a\tb\nc")]);
        assert_eq!(styled[0].content, "a\u{2003}\u{2003}b\nc");
        assert_eq!(styled[0].line_count, 2);
    }

    #[test]
    fn flash_comment_takes_first_segment_font() {
        let comments = [Comment::new(0, 0, "안녕 hi").with_date(1_000, 0)];
        let (styled, _) = run(&comments);
        assert!(styled[0].flash);
        assert_eq!(styled[0].font, FontFace::Gulim);
        assert!(styled[0].segments.len() >= 2);
    }
}
