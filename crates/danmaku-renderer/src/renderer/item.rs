//! Renderable comment variants

use std::sync::Arc;

use danmaku_core::StyledComment;
use tiny_skia::Pixmap;

use crate::layout::{LayoutBox, Position};
use crate::measure::MeasuredComment;

/// Bitmap state of one comment
#[derive(Debug, Clone, Default)]
pub enum BitmapSlot {
    /// Not rasterized, or released by eviction
    #[default]
    Empty,
    /// Ready to blit
    Ready(Arc<Pixmap>),
    /// Rasterization failed; never retried
    Failed,
}

/// Comment drawn from a cached bitmap
#[derive(Debug, Clone)]
pub struct BitmapComment {
    /// Measured geometry
    pub measured: MeasuredComment,
    /// Layout input
    pub layout: LayoutBox,
    /// Vertical placement
    pub position: Option<Position>,
    /// Bitmap state
    pub slot: BitmapSlot,
}

/// One entry of the renderer's comment list
#[derive(Debug, Clone)]
pub enum CommentItem {
    /// Regular comment
    Bitmap(BitmapComment),
    /// Nicoscript directive, never drawn
    Directive(StyledComment),
}

impl CommentItem {
    /// Resolved styling
    pub fn styled(&self) -> &StyledComment {
        match self {
            Self::Bitmap(comment) => &comment.measured.styled,
            Self::Directive(styled) => styled,
        }
    }

    /// Whether painting should skip this item
    pub fn invisible(&self) -> bool {
        match self {
            Self::Bitmap(comment) => {
                comment.measured.styled.invisible || matches!(comment.slot, BitmapSlot::Failed)
            }
            Self::Directive(_) => true,
        }
    }

    /// The bitmap variant, if any
    pub fn as_bitmap(&self) -> Option<&BitmapComment> {
        match self {
            Self::Bitmap(comment) => Some(comment),
            Self::Directive(_) => None,
        }
    }

    pub(crate) fn as_bitmap_mut(&mut self) -> Option<&mut BitmapComment> {
        match self {
            Self::Bitmap(comment) => Some(comment),
            Self::Directive(_) => None,
        }
    }
}
