//! Collision-avoiding vertical placement
//!
//! Comments are placed one at a time in sorted order. Each comment scans the
//! occupancy lanes for the ticks it will be visible at and moves below any
//! conflicting occupant, repeating for at most [`MAX_PASSES`] passes. A
//! comment that never settles, or that would leave the canvas, is centred.
//!
//! Scrolling comments only compete at the ticks where they straddle one of
//! the two collision boundaries; fixed comments compete within their lane for
//! their whole lifetime.

mod timeline;

pub use timeline::{CollisionLanes, TickIndex};

use std::time::Instant;

use danmaku_core::script::MAX_DURATION;
use danmaku_core::Lane;
use log::debug;

use crate::config::CollisionRange;
use crate::measure::MeasuredComment;

/// Relaxation passes before a comment is centred
pub const MAX_PASSES: usize = 10;

/// Ticks at the end of a fixed comment's lifetime that do not block its lane
pub const FIXED_RELEASE_TICKS: i64 = 19;

/// Geometry and scoping the layout engine needs from a comment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutBox {
    /// Start tick
    pub vpos: i64,
    /// Lifetime in ticks
    pub long: i64,
    /// Lane
    pub lane: Lane,
    /// Owner comments only collide with owner comments
    pub owner: bool,
    /// Comments only collide within a layer
    pub layer: i32,
    /// Width, pixels
    pub width: f32,
    /// Height, pixels
    pub height: f32,
    /// Not placed at all
    pub invisible: bool,
}

impl From<&MeasuredComment> for LayoutBox {
    fn from(measured: &MeasuredComment) -> Self {
        let styled = &measured.styled;
        Self {
            vpos: styled.vpos,
            long: styled.long,
            lane: styled.lane,
            owner: styled.owner,
            layer: styled.layer,
            width: measured.width_px,
            height: measured.height_px,
            invisible: styled.invisible,
        }
    }
}

impl LayoutBox {
    /// Left edge of a scrolling comment at `vpos`
    ///
    /// Moves from the right edge of the canvas at `self.vpos` to fully past
    /// the left edge at `self.vpos + self.long`.
    pub fn pos_x(&self, vpos: i64, canvas_width: f32) -> f32 {
        let elapsed = vpos.saturating_sub(self.vpos) as f32;
        canvas_width - (canvas_width + self.width) * elapsed / self.lifetime().max(1) as f32
    }

    /// Left edge at `vpos` for any lane
    pub fn x_at(&self, vpos: i64, canvas_width: f32) -> f32 {
        match self.lane {
            Lane::Scrolling => self.pos_x(vpos, canvas_width),
            Lane::Top | Lane::Bottom => (canvas_width - self.width) / 2.0,
        }
    }

    fn lifetime(&self) -> i64 {
        self.long.clamp(0, MAX_DURATION)
    }

    fn visible_ticks(&self) -> std::ops::Range<i64> {
        self.vpos..self.vpos.saturating_add(self.lifetime())
    }
}

/// How the vertical offset was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Stacked clear of every conflicting occupant
    #[default]
    Stacked,
    /// Centred after overflow or running out of passes
    Centered,
}

/// Final vertical position of one comment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// Top edge on the canvas, pixels
    pub pos_y: f32,
    /// Distance from the lane origin (top, or bottom for bottom comments)
    pub stack_y: f32,
    /// Placement outcome
    pub placement: Placement,
}

/// Result of laying out a comment list
#[derive(Debug, Clone, Default)]
pub struct Layout {
    /// Position per comment, `None` for invisible comments
    pub positions: Vec<Option<Position>>,
    /// Comments active at every tick, owner comments first
    pub timeline: TickIndex,
    /// Occupancy used while placing
    pub lanes: CollisionLanes,
}

/// Places comments on a canvas
#[derive(Debug, Clone, Copy)]
pub struct LayoutEngine {
    canvas_width: f32,
    canvas_height: f32,
    range: CollisionRange,
}

impl LayoutEngine {
    /// Engine for a canvas of the given pixel size
    pub fn new(canvas_width: f32, canvas_height: f32, range: CollisionRange) -> Self {
        Self {
            canvas_width,
            canvas_height,
            range,
        }
    }

    /// Place every box in order
    pub fn layout(&self, boxes: &[LayoutBox]) -> Layout {
        let started = Instant::now();
        let mut layout = Layout {
            positions: vec![None; boxes.len()],
            ..Layout::default()
        };

        for (index, item) in boxes.iter().enumerate() {
            if item.invisible {
                continue;
            }
            let position = self.place(item, boxes, &layout);
            layout.positions[index] = Some(position);
            self.record(index, item, &mut layout);
        }

        layout.timeline.partition_stable(|index| boxes[index].owner);
        debug!(
            "layout of {} comments over {} ticks in {:?}",
            boxes.len(),
            layout.timeline.len(),
            started.elapsed()
        );
        layout
    }

    fn centered(&self, item: &LayoutBox) -> Position {
        let y = (self.canvas_height - item.height) / 2.0;
        Position {
            pos_y: y,
            stack_y: y,
            placement: Placement::Centered,
        }
    }

    fn place(&self, item: &LayoutBox, boxes: &[LayoutBox], layout: &Layout) -> Position {
        if item.height > self.canvas_height {
            return self.centered(item);
        }

        let mut y = 0.0;
        for _ in 0..MAX_PASSES {
            let (next, moved) = self.relax(item, y, boxes, layout);
            if next + item.height > self.canvas_height {
                return self.centered(item);
            }
            if !moved {
                let pos_y = match item.lane {
                    Lane::Bottom => self.canvas_height - next - item.height,
                    Lane::Top | Lane::Scrolling => next,
                };
                return Position {
                    pos_y,
                    stack_y: next,
                    placement: Placement::Stacked,
                };
            }
            y = next;
        }
        self.centered(item)
    }

    /// One pass over every relevant occupant, moving `y` below conflicts
    fn relax(&self, item: &LayoutBox, mut y: f32, boxes: &[LayoutBox], layout: &Layout) -> (f32, bool) {
        let mut moved = false;
        let mut check = |lane: &TickIndex, tick: i64, y: &mut f32| {
            for &other in lane.get(tick) {
                let Some(placed) = layout.positions[other] else {
                    continue;
                };
                let occupant = &boxes[other];
                if occupant.owner != item.owner || occupant.layer != item.layer {
                    continue;
                }
                let top = placed.stack_y;
                if *y < top + occupant.height && top < *y + item.height {
                    *y = top + occupant.height;
                    moved = true;
                }
            }
        };

        match item.lane {
            Lane::Top | Lane::Bottom => {
                let lane = if item.lane == Lane::Top {
                    &layout.lanes.top
                } else {
                    &layout.lanes.bottom
                };
                for tick in item.visible_ticks() {
                    check(lane, tick, &mut y);
                }
            }
            Lane::Scrolling => {
                for tick in item.visible_ticks() {
                    let left = item.pos_x(tick, self.canvas_width);
                    let right = left + item.width;
                    if left < self.range.right && right > self.range.right {
                        check(&layout.lanes.right, tick, &mut y);
                    }
                    if left < self.range.left && right > self.range.left {
                        check(&layout.lanes.left, tick, &mut y);
                    }
                }
            }
        }
        (y, moved)
    }

    fn record(&self, index: usize, item: &LayoutBox, layout: &mut Layout) {
        for tick in item.visible_ticks() {
            layout.timeline.push(tick, index);
        }

        match item.lane {
            Lane::Scrolling => {
                for tick in item.visible_ticks() {
                    let left = item.pos_x(tick, self.canvas_width);
                    if left + item.width >= self.range.right {
                        layout.lanes.right.push(tick, index);
                    }
                    if left <= self.range.left {
                        layout.lanes.left.push(tick, index);
                    }
                }
            }
            Lane::Top | Lane::Bottom => {
                let lane = if item.lane == Lane::Top {
                    &mut layout.lanes.top
                } else {
                    &mut layout.lanes.bottom
                };
                let held = (item.lifetime() - FIXED_RELEASE_TICKS).max(0);
                for tick in item.vpos..item.vpos.saturating_add(held) {
                    lane.push(tick, index);
                }
            }
        }
    }
}
