use crate::geometry::{Rect, Viewport};

pub const DEFAULT_PARALLAX_SPEED: f32 = 0.2;

/// Vertical drift of a region's content as the region scrolls through the
/// viewport. Positive speeds lag behind the scroll, negative ones lead it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParallaxTrack {
    speed: f32,
}

impl Default for ParallaxTrack {
    fn default() -> Self {
        Self::new(DEFAULT_PARALLAX_SPEED)
    }
}

impl ParallaxTrack {
    pub fn new(speed: f32) -> Self {
        Self { speed }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// 0 when the region's top meets the viewport bottom, 1 when its bottom
    /// meets the viewport top.
    pub fn progress(&self, region: &Rect, viewport: &Viewport) -> f32 {
        let travel = viewport.height + region.height;
        if travel <= 0.0 {
            return 0.0;
        }
        let covered = viewport.scroll_y + viewport.height - region.y;
        (covered / travel).clamp(0.0, 1.0)
    }

    /// Translation in pixels for a given progress.
    pub fn offset(&self, progress: f32) -> f32 {
        self.speed * 100.0 * progress.clamp(0.0, 1.0)
    }

    pub fn offset_for(&self, region: &Rect, viewport: &Viewport) -> f32 {
        self.offset(self.progress(region, viewport))
    }
}
