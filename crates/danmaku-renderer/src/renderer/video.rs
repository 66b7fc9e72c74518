//! Video frames drawn beneath the comments

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use tiny_skia::Pixmap;

/// Supplier of the frame currently on screen
pub trait VideoSource {
    /// Latest decoded frame, `None` while nothing is available
    fn frame(&self) -> Option<Arc<Pixmap>>;
}

/// Shared handle to a [`VideoSource`] owned by the embedding application
#[derive(Clone)]
pub struct VideoHandle(Rc<dyn VideoSource>);

impl VideoHandle {
    /// Wrap a source
    pub fn new(source: impl VideoSource + 'static) -> Self {
        Self(Rc::new(source))
    }

    /// Latest frame of the wrapped source
    pub fn frame(&self) -> Option<Arc<Pixmap>> {
        self.0.frame()
    }
}

impl fmt::Debug for VideoHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VideoHandle(..)")
    }
}

/// Scale and offset placing a video frame on a surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoFit {
    /// Uniform scale
    pub scale: f32,
    /// Horizontal offset, surface pixels
    pub offset_x: f32,
    /// Vertical offset, surface pixels
    pub offset_y: f32,
}

/// Letterbox or pillarbox `video` inside `surface`
///
/// The frame is fitted inside the surface; `legacy` flips the aspect
/// comparison so the frame covers the surface instead, cropping overflow.
pub fn fit_video(surface: (f32, f32), video: (f32, f32), legacy: bool) -> VideoFit {
    let (surface_w, surface_h) = surface;
    let (video_w, video_h) = (video.0.max(1.0), video.1.max(1.0));
    let by_width = surface_w / video_w;
    let by_height = surface_h / video_h;
    let scale = if legacy {
        by_width.max(by_height)
    } else {
        by_width.min(by_height)
    };
    VideoFit {
        scale,
        offset_x: (surface_w - video_w * scale) / 2.0,
        offset_y: (surface_h - video_h * scale) / 2.0,
    }
}
