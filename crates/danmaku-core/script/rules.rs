//! Nicoscript rule types and the ordered lists that hold them

use crate::command::{Color, CommentSize, FontFace, Lane};

/// Which comments a rule applies to, by ownership
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptTarget {
    /// Every comment
    All,
    /// Viewer comments only
    User,
    /// Owner comments only
    Owner,
}

impl ScriptTarget {
    /// Target vocabulary of `@逆`
    pub fn from_reverse_token(token: &str) -> Option<Self> {
        match token {
            "全" => Some(Self::All),
            "コメ" => Some(Self::User),
            "投コメ" => Some(Self::Owner),
            _ => None,
        }
    }

    /// Target vocabulary of `@置換`
    pub fn from_replace_token(token: &str) -> Option<Self> {
        match token {
            "全" | "含む" => Some(Self::All),
            "コメ" | "含まない" => Some(Self::User),
            "投コメ" => Some(Self::Owner),
            _ => None,
        }
    }

    /// Whether a comment with the given ownership is targeted
    pub fn matches(self, owner: bool) -> bool {
        match self {
            Self::All => true,
            Self::User => !owner,
            Self::Owner => owner,
        }
    }
}

/// Rules that stop mattering once the scan passes them
pub trait Expiring {
    /// Whether the rule no longer covers `vpos` or anything after it
    fn expired_at(&self, vpos: i64) -> bool;
}

fn lifetime_expired(start: i64, long: Option<i64>, vpos: i64) -> bool {
    long.is_some_and(|long| start.saturating_add(long) < vpos)
}

/// Style fallback installed by `@デフォルト`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DefaultStyleRule {
    /// First covered vpos
    pub start: i64,
    /// Lifetime in ticks, `None` lasts forever
    pub long: Option<i64>,
    /// Colour fallback
    pub color: Option<Color>,
    /// Size fallback
    pub size: Option<CommentSize>,
    /// Font fallback
    pub font: Option<FontFace>,
    /// Lane fallback
    pub lane: Option<Lane>,
}

impl Expiring for DefaultStyleRule {
    fn expired_at(&self, vpos: i64) -> bool {
        lifetime_expired(self.start, self.long, vpos)
    }
}

/// Direction flip installed by `@逆`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReverseRule {
    /// First affected vpos
    pub start: i64,
    /// First unaffected vpos
    pub end: i64,
    /// Ownership filter
    pub target: ScriptTarget,
}

impl ReverseRule {
    /// Whether a comment with `owner` is flipped at `vpos`
    pub fn applies(&self, vpos: i64, owner: bool) -> bool {
        self.start <= vpos && vpos < self.end && self.target.matches(owner)
    }
}

/// Display suppression installed by `@コメント禁止`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BanRule {
    /// First banned vpos
    pub start: i64,
    /// First allowed vpos
    pub end: i64,
}

impl BanRule {
    /// Whether `vpos` falls inside the window
    pub fn covers(&self, vpos: i64) -> bool {
        self.start <= vpos && vpos < self.end
    }
}

/// How much of the content a replacement rewrites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplaceRange {
    /// Substitute the first keyword occurrence (`単`)
    #[default]
    Single,
    /// Replace the whole content (`全`)
    All,
}

impl ReplaceRange {
    /// Parse `単`/`全`
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "単" => Some(Self::Single),
            "全" => Some(Self::All),
            _ => None,
        }
    }
}

/// Keyword matching mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplaceCondition {
    /// Content contains the keyword (`部分一致`)
    #[default]
    Substring,
    /// Content equals the keyword (`完全一致`)
    Exact,
}

impl ReplaceCondition {
    /// Parse `部分一致`/`完全一致`
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "部分一致" => Some(Self::Substring),
            "完全一致" => Some(Self::Exact),
            _ => None,
        }
    }
}

/// Content rewrite installed by `@置換`
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceRule {
    /// First covered vpos
    pub start: i64,
    /// Lifetime in ticks, `None` lasts forever
    pub long: Option<i64>,
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
    /// Colour override
    pub color: Option<Color>,
    /// Size override
    pub size: Option<CommentSize>,
    /// Font override
    pub font: Option<FontFace>,
    /// Lane override
    pub lane: Option<Lane>,
    /// Installing comment's id, breaks ties between equal starts
    pub order: u64,
}

impl ReplaceRule {
    /// Whether the rule's window includes `vpos`
    pub fn covers(&self, vpos: i64) -> bool {
        self.start <= vpos && !self.expired_at(vpos)
    }

    /// Whether a comment's content and ownership select this rule
    pub fn matches(&self, content: &str, owner: bool) -> bool {
        self.target.matches(owner)
            && match self.condition {
                ReplaceCondition::Exact => content == self.keyword,
                ReplaceCondition::Substring => content.contains(self.keyword.as_str()),
            }
    }

    /// Rewritten content
    pub fn rewrite(&self, content: &str) -> String {
        match self.range {
            ReplaceRange::Single => content.replacen(self.keyword.as_str(), &self.replacement, 1),
            ReplaceRange::All => self.replacement.clone(),
        }
    }
}

impl Expiring for ReplaceRule {
    fn expired_at(&self, vpos: i64) -> bool {
        lifetime_expired(self.start, self.long, vpos)
    }
}

/// Ordered rule collection
#[derive(Debug, Clone, PartialEq)]
pub struct RuleList<T> {
    rules: Vec<T>,
}

impl<T> Default for RuleList<T> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<T> RuleList<T> {
    /// Empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert as the highest-priority rule
    pub fn push_front(&mut self, rule: T) {
        self.rules.insert(0, rule);
    }

    /// Insert keeping the list sorted by `key`, after existing equal keys
    pub fn insert_sorted_by_key<K: Ord>(&mut self, rule: T, key: impl Fn(&T) -> K) {
        let k = key(&rule);
        let at = self.rules.partition_point(|r| key(r) <= k);
        self.rules.insert(at, rule);
    }

    /// Rules in priority order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.rules.iter()
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<T: Expiring> RuleList<T> {
    /// Drop every rule expired at `vpos`, keeping relative order
    ///
    /// Returns how many rules were removed.
    pub fn evict_expired(&mut self, vpos: i64) -> usize {
        let before = self.rules.len();
        self.rules.retain(|rule| !rule.expired_at(vpos));
        before - self.rules.len()
    }
}

impl<'a, T> IntoIterator for &'a RuleList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_rule(start: i64, long: Option<i64>) -> DefaultStyleRule {
        DefaultStyleRule {
            start,
            long,
            ..DefaultStyleRule::default()
        }
    }

    #[test]
    fn eviction_preserves_order() {
        let mut list = RuleList::new();
        list.push_front(default_rule(0, Some(10)));
        list.push_front(default_rule(5, None));
        list.push_front(default_rule(8, Some(100)));
        list.push_front(default_rule(9, Some(1)));

        assert_eq!(list.evict_expired(11), 2);
        let starts: Vec<i64> = list.iter().map(|r| r.start).collect();
        assert_eq!(starts, vec![8, 5]);
    }

    #[test]
    fn lifetime_boundary_is_inclusive() {
        let rule = default_rule(100, Some(50));
        assert!(!rule.expired_at(150));
        assert!(rule.expired_at(151));
    }

    #[test]
    fn sorted_insert_is_stable_for_ties() {
        let mut list: RuleList<(i64, u64)> = RuleList::new();
        for item in [(10, 3), (5, 9), (10, 1), (5, 2)] {
            list.insert_sorted_by_key(item, |&(start, order)| (start, order));
        }
        let items: Vec<_> = list.iter().copied().collect();
        assert_eq!(items, vec![(5, 2), (5, 9), (10, 1), (10, 3)]);
    }

    #[test]
    fn windows_are_half_open() {
        let ban = BanRule { start: 50, end: 250 };
        assert!(!ban.covers(49));
        assert!(ban.covers(50));
        assert!(ban.covers(249));
        assert!(!ban.covers(250));

        let reverse = ReverseRule {
            start: 0,
            end: 100,
            target: ScriptTarget::Owner,
        };
        assert!(reverse.applies(99, true));
        assert!(!reverse.applies(99, false));
        assert!(!reverse.applies(100, true));
    }

    #[test]
    fn replace_targets_and_ranges() {
        let mut rule = ReplaceRule {
            start: 0,
            long: None,
            keyword: "foo".into(),
            replacement: "bar".into(),
            range: ReplaceRange::Single,
            target: ScriptTarget::User,
            condition: ReplaceCondition::Substring,
            color: None,
            size: None,
            font: None,
            lane: None,
            order: 0,
        };
        assert!(rule.matches("a foo b", false));
        assert!(!rule.matches("a foo b", true));
        assert_eq!(rule.rewrite("foo foo"), "bar foo");

        rule.range = ReplaceRange::All;
        assert_eq!(rule.rewrite("foo foo"), "bar");

        rule.condition = ReplaceCondition::Exact;
        assert!(!rule.matches("foo foo", false));
        assert!(rule.matches("foo", false));
    }
}
