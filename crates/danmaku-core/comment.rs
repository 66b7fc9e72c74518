//! Canonical comment record
//!
//! Every input encoding is normalized into [`Comment`] upstream. The renderer
//! only relies on the fields listed here and on the `(vpos, date, date_usec)`
//! ordering established by [`sort_comments`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::RenderMode;

/// Mail tokens that pin a comment to the html5 font set
const HTML5_FONT_TOKENS: [&str; 3] = ["gothic", "defont", "mincho"];

/// Mail token that forces flash-era rendering
const FLASH_TOKEN: &str = "nico:flash";

/// A single normalized comment
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Comment {
    /// Comment number within the thread
    pub id: u64,
    /// Display time in hundredths of a second
    pub vpos: i64,
    /// Raw text, may contain line breaks
    pub content: String,
    /// Posting time, unix seconds
    pub date: i64,
    /// Sub-second part of the posting time
    pub date_usec: i64,
    /// Posted by the video owner
    pub owner: bool,
    /// Posted by a premium account
    pub premium: bool,
    /// Style command tokens, in posting order
    pub mail: Vec<String>,
    /// Numeric poster id
    pub user_id: u64,
    /// Collision layer, comments on different layers never push each other
    pub layer: i32,
}

impl Comment {
    /// Create a plain user comment
    pub fn new(id: u64, vpos: i64, content: impl Into<String>) -> Self {
        Self {
            id,
            vpos,
            content: content.into(),
            ..Self::default()
        }
    }

    /// Replace the mail tokens
    #[must_use]
    pub fn with_mail<I, S>(mut self, mail: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mail = mail.into_iter().map(Into::into).collect();
        self
    }

    /// Mark as posted by the video owner
    #[must_use]
    pub fn as_owner(mut self) -> Self {
        self.owner = true;
        self
    }

    /// Mark as posted by a premium account
    #[must_use]
    pub fn as_premium(mut self) -> Self {
        self.premium = true;
        self
    }

    /// Set posting time
    #[must_use]
    pub fn with_date(mut self, date: i64, date_usec: i64) -> Self {
        self.date = date;
        self.date_usec = date_usec;
        self
    }

    /// Set collision layer
    #[must_use]
    pub fn with_layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    /// Whether any mail token equals `token` (case-insensitive)
    pub fn has_mail(&self, token: &str) -> bool {
        self.mail.iter().any(|m| m.eq_ignore_ascii_case(token))
    }

    /// Whether this comment is rendered with flash-era metrics
    ///
    /// Explicit html5 font tokens always opt out in [`RenderMode::Default`].
    pub fn is_flash(&self, mode: RenderMode, flash_threshold: i64) -> bool {
        match mode {
            RenderMode::Flash => true,
            RenderMode::Html5 => false,
            RenderMode::Default => {
                !HTML5_FONT_TOKENS.iter().any(|t| self.has_mail(t))
                    && (self.date < flash_threshold || self.has_mail(FLASH_TOKEN))
            }
        }
    }

    /// Mail tokens in sorted order, used for cache identity
    pub fn sorted_mail(&self) -> Vec<&str> {
        let mut mail: Vec<&str> = self.mail.iter().map(String::as_str).collect();
        mail.sort_unstable();
        mail
    }
}

/// Stable sort by `(vpos, date, date_usec)`
pub fn sort_comments(comments: &mut [Comment]) {
    comments.sort_by_key(|c| (c.vpos, c.date, c.date_usec));
}
