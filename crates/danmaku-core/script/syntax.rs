//! Surface syntax of nicoscript directives

use crate::utils::ScriptError;

use super::rules::{ReplaceCondition, ReplaceRange, ScriptTarget};
use super::MAX_SCRIPT_DURATION;

/// Directive keyword following the `@` sigil
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `@デフォルト`
    Default,
    /// `@置換`
    Replace,
    /// `@逆`
    Reverse,
    /// `@コメント禁止`
    Ban,
    /// `@シーク禁止`, player control only
    SeekBan,
    /// `@ジャンプ`, player control only
    Jump,
}

const MARKERS: [(&str, Marker); 6] = [
    ("デフォルト", Marker::Default),
    ("置換", Marker::Replace),
    ("逆", Marker::Reverse),
    ("コメント禁止", Marker::Ban),
    ("シーク禁止", Marker::SeekBan),
    ("ジャンプ", Marker::Jump),
];

/// Split a directive into its marker and the remaining argument text
///
/// # Errors
///
/// [`ScriptError::NotADirective`] when the content has no marker prefix.
pub fn split_marker(content: &str) -> Result<(Marker, &str), ScriptError> {
    let body = content
        .strip_prefix('@')
        .or_else(|| content.strip_prefix('＠'))
        .ok_or(ScriptError::NotADirective)?;
    MARKERS
        .iter()
        .find_map(|&(word, marker)| body.strip_prefix(word).map(|rest| (marker, rest)))
        .ok_or(ScriptError::NotADirective)
}

/// Read the target of `@逆`; one optional ASCII space precedes it
///
/// # Errors
///
/// Missing or unrecognized target.
pub fn parse_reverse_target(args: &str) -> Result<ScriptTarget, ScriptError> {
    let args = args.strip_prefix(' ').unwrap_or(args);
    for token in ["投コメ", "コメ", "全"] {
        if args.starts_with(token) {
            return ScriptTarget::from_reverse_token(token)
                .ok_or_else(|| ScriptError::invalid("target", token));
        }
    }
    if args.trim().is_empty() {
        Err(ScriptError::MissingArgument("target"))
    } else {
        Err(ScriptError::invalid("target", args.trim()))
    }
}

/// Inline `@N` lifetime argument of `@逆`/`@コメント禁止`, in ticks
pub fn inline_duration(args: &str) -> Option<i64> {
    args.split_whitespace()
        .filter_map(|token| token.strip_prefix('@').or_else(|| token.strip_prefix('＠')))
        .find(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .map(|digits| digits.parse::<i64>().unwrap_or(i64::MAX).min(MAX_SCRIPT_DURATION))
}

/// Split replace arguments on whitespace and quotes
///
/// `"…"`, `'…'` and `「…」` group text; inside `"`/`'` a backslash escapes the
/// closing quote and a literal `\n` becomes a line break.
///
/// # Errors
///
/// [`ScriptError::UnterminatedQuote`] when a quote is left open.
pub fn tokenize(args: &str) -> Result<Vec<String>, ScriptError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<(char, usize)> = None;
    let mut chars = args.chars().enumerate().peekable();

    while let Some((idx, c)) = chars.next() {
        match quote {
            None => match c {
                '"' | '\'' | '「' => quote = Some((c, idx)),
                c if c.is_whitespace() => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                }
                c => current.push(c),
            },
            Some(('「', _)) => {
                if c == '」' {
                    tokens.push(std::mem::take(&mut current));
                    quote = None;
                } else {
                    current.push(c);
                }
            }
            Some((open, _)) => {
                if c == '\\' {
                    match chars.peek() {
                        Some(&(_, next)) if next == open => {
                            current.push(next);
                            chars.next();
                        }
                        Some(&(_, 'n')) => {
                            current.push('\n');
                            chars.next();
                        }
                        _ => current.push(c),
                    }
                } else if c == open {
                    tokens.push(std::mem::take(&mut current));
                    quote = None;
                } else {
                    current.push(c);
                }
            }
        }
    }

    if let Some((_, start)) = quote {
        return Err(ScriptError::UnterminatedQuote(start));
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Positional arguments of `@置換`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceArgs {
    /// Text to look for
    pub keyword: String,
    /// Text to put in
    pub replacement: String,
    /// Rewrite scope
    pub range: ReplaceRange,
    /// Ownership filter
    pub target: ScriptTarget,
    /// Match mode
    pub condition: ReplaceCondition,
}

/// Parse `keyword replacement [range] [target] [condition]`
///
/// # Errors
///
/// Missing keyword/replacement, unknown vocabulary, or tokenizer errors.
pub fn parse_replace(args: &str) -> Result<ReplaceArgs, ScriptError> {
    let mut tokens = tokenize(args)?.into_iter();
    let keyword = tokens.next().ok_or(ScriptError::MissingArgument("keyword"))?;
    let replacement = tokens
        .next()
        .ok_or(ScriptError::MissingArgument("replacement"))?;

    let range = match tokens.next() {
        Some(t) => ReplaceRange::from_token(&t).ok_or_else(|| ScriptError::invalid("range", t))?,
        None => ReplaceRange::default(),
    };
    let target = match tokens.next() {
        Some(t) => {
            ScriptTarget::from_replace_token(&t).ok_or_else(|| ScriptError::invalid("target", t))?
        }
        None => ScriptTarget::User,
    };
    let condition = match tokens.next() {
        Some(t) => {
            ReplaceCondition::from_token(&t).ok_or_else(|| ScriptError::invalid("condition", t))?
        }
        None => ReplaceCondition::default(),
    };

    Ok(ReplaceArgs {
        keyword,
        replacement,
        range,
        target,
        condition,
    })
}
