//! Pointer-following cursor state. Each tracker is owned by the component
//! that renders the cursor and is fed events from that component's own
//! listeners, so nothing outlives an unmount.

use crate::animation::Offset;

pub const CURSOR_DIAMETER: f32 = 20.0;
pub const LINK_HOVER_DIAMETER: f32 = 50.0;
pub const VIDEO_HOVER_DIAMETER: f32 = 70.0;
pub const VIDEO_HOVER_LABEL: &str = "Play";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverTarget {
    Link,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorStyle {
    pub position: Offset,
    pub diameter: f32,
    pub label: Option<&'static str>,
    pub hover: Option<HoverTarget>,
}

#[derive(Debug, Default, Clone)]
pub struct CursorTracker {
    position: Offset,
    moved: bool,
    link_hovers: u32,
    video_hovers: u32,
}

impl CursorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.position = Offset::new(x, y);
        self.moved = true;
    }

    // Counted, since a link inside a video card produces nested enter/leave pairs.
    pub fn hover_entered(&mut self, target: HoverTarget) {
        match target {
            HoverTarget::Link => self.link_hovers += 1,
            HoverTarget::Video => self.video_hovers += 1,
        }
    }

    pub fn hover_left(&mut self, target: HoverTarget) {
        match target {
            HoverTarget::Link => self.link_hovers = self.link_hovers.saturating_sub(1),
            HoverTarget::Video => self.video_hovers = self.video_hovers.saturating_sub(1),
        }
    }

    pub fn hover(&self) -> Option<HoverTarget> {
        if self.video_hovers > 0 {
            Some(HoverTarget::Video)
        } else if self.link_hovers > 0 {
            Some(HoverTarget::Link)
        } else {
            None
        }
    }

    /// `None` until the pointer has moved at least once.
    pub fn style(&self) -> Option<CursorStyle> {
        if !self.moved {
            return None;
        }

        let hover = self.hover();
        let (diameter, label) = match hover {
            Some(HoverTarget::Video) => (VIDEO_HOVER_DIAMETER, Some(VIDEO_HOVER_LABEL)),
            Some(HoverTarget::Link) => (LINK_HOVER_DIAMETER, None),
            None => (CURSOR_DIAMETER, None),
        };
        Some(CursorStyle {
            position: self.position,
            diameter,
            label,
            hover,
        })
    }
}
