use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    animation::{Offset, RevealAnimationSpec, RevealPose},
    easing::EasingFunction,
    error::RevealError,
};

pub const DEFAULT_THRESHOLD: f32 = 0.1;
pub const DEFAULT_DISTANCE: f32 = 50.0;
pub const DEFAULT_DURATION: Duration = Duration::from_millis(600);
pub const DEFAULT_DELAY: Duration = Duration::from_millis(200);
/// Media starts loading this far before it scrolls into view.
pub const LAZY_MEDIA_MARGIN_PX: f32 = 300.0;

/// Direction the content travels while being revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Starting displacement of hidden content; it moves from here to `(0, 0)`.
    pub fn offset(self, distance: f32) -> Offset {
        match self {
            Direction::Up => Offset::new(0.0, distance),
            Direction::Down => Offset::new(0.0, -distance),
            Direction::Left => Offset::new(distance, 0.0),
            Direction::Right => Offset::new(-distance, 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginLength {
    Px(f32),
    Percent(f32),
}

impl MarginLength {
    pub fn is_finite(self) -> bool {
        match self {
            MarginLength::Px(value) | MarginLength::Percent(value) => value.is_finite(),
        }
    }

    fn resolve(self, basis: f32) -> f32 {
        match self {
            MarginLength::Px(px) => px,
            MarginLength::Percent(pct) => basis * pct / 100.0,
        }
    }
}

impl fmt::Display for MarginLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginLength::Px(px) => write!(f, "{px}px"),
            MarginLength::Percent(pct) => write!(f, "{pct}%"),
        }
    }
}

/// Resolved margin in pixels, positive values grow the observed root.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Insets {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

/// Pre-trigger margin around the viewport, written like a CSS `margin`
/// shorthand: `"300px"`, `"10px 20px"`, `"0px 0px -10% 0px"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RootMargin {
    pub top: MarginLength,
    pub right: MarginLength,
    pub bottom: MarginLength,
    pub left: MarginLength,
}

impl Default for RootMargin {
    fn default() -> Self {
        Self::uniform(MarginLength::Px(0.0))
    }
}

impl RootMargin {
    pub fn uniform(length: MarginLength) -> Self {
        Self {
            top: length,
            right: length,
            bottom: length,
            left: length,
        }
    }

    pub fn px(px: f32) -> Self {
        Self::uniform(MarginLength::Px(px))
    }

    pub fn is_finite(&self) -> bool {
        [self.top, self.right, self.bottom, self.left]
            .into_iter()
            .all(MarginLength::is_finite)
    }

    /// Percentages resolve against the root height (top/bottom) and width
    /// (left/right).
    pub fn resolve(&self, root_width: f32, root_height: f32) -> Insets {
        Insets {
            top: self.top.resolve(root_height),
            right: self.right.resolve(root_width),
            bottom: self.bottom.resolve(root_height),
            left: self.left.resolve(root_width),
        }
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

impl FromStr for RootMargin {
    type Err = RevealError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| RevealError::InvalidRootMargin {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let lengths = input
            .split_whitespace()
            .map(|token| parse_length(token).ok_or_else(|| invalid("expected <number>px or <number>%")))
            .collect::<Result<Vec<_>, _>>()?;

        match lengths.as_slice() {
            [all] => Ok(Self::uniform(*all)),
            [vertical, horizontal] => Ok(Self {
                top: *vertical,
                right: *horizontal,
                bottom: *vertical,
                left: *horizontal,
            }),
            [top, horizontal, bottom] => Ok(Self {
                top: *top,
                right: *horizontal,
                bottom: *bottom,
                left: *horizontal,
            }),
            [top, right, bottom, left] => Ok(Self {
                top: *top,
                right: *right,
                bottom: *bottom,
                left: *left,
            }),
            [] => Err(invalid("empty margin")),
            _ => Err(invalid("at most four lengths are allowed")),
        }
    }
}

fn parse_length(token: &str) -> Option<MarginLength> {
    let (number, ctor): (&str, fn(f32) -> MarginLength) = if let Some(n) = token.strip_suffix("px")
    {
        (n, MarginLength::Px)
    } else if let Some(n) = token.strip_suffix('%') {
        (n, MarginLength::Percent)
    } else if token == "0" {
        ("0", MarginLength::Px)
    } else {
        return None;
    };

    let value = number.parse::<f32>().ok().filter(|v| v.is_finite())?;
    Some(ctor(value))
}

/// What a visibility source needs to decide whether a region counts as visible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserveOptions {
    pub threshold_fraction: f32,
    pub root_margin: RootMargin,
}

/// Full configuration of one reveal region: the observation parameters and
/// the animation played when it enters the viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealOptions {
    pub threshold_fraction: f32,
    pub root_margin: RootMargin,
    pub trigger_once: bool,
    pub direction: Direction,
    pub distance: f32,
    pub duration: Duration,
    pub delay: Duration,
    pub easing: EasingFunction,
}

impl Default for RevealOptions {
    fn default() -> Self {
        Self::section()
    }
}

impl RevealOptions {
    /// Fly-in used by content blocks inside a section.
    pub fn section() -> Self {
        Self {
            threshold_fraction: DEFAULT_THRESHOLD,
            root_margin: RootMargin::default(),
            trigger_once: true,
            direction: Direction::Up,
            distance: DEFAULT_DISTANCE,
            duration: DEFAULT_DURATION,
            delay: DEFAULT_DELAY,
            easing: EasingFunction::Ease,
        }
    }

    /// Section headings rise with an ease-out curve.
    pub fn heading() -> Self {
        Self {
            easing: EasingFunction::EaseOut,
            ..Self::section()
        }
    }

    /// Images and video thumbnails: fade in, start early, never replay.
    pub fn lazy_media() -> Self {
        Self {
            threshold_fraction: 0.0,
            root_margin: RootMargin::px(LAZY_MEDIA_MARGIN_PX),
            trigger_once: true,
            direction: Direction::Up,
            distance: 0.0,
            duration: Duration::from_millis(500),
            delay: Duration::ZERO,
            easing: EasingFunction::Ease,
        }
    }

    pub fn threshold(mut self, threshold_fraction: f32) -> Self {
        self.threshold_fraction = threshold_fraction;
        self
    }

    pub fn root_margin(mut self, root_margin: RootMargin) -> Self {
        self.root_margin = root_margin;
        self
    }

    pub fn trigger_once(mut self, trigger_once: bool) -> Self {
        self.trigger_once = trigger_once;
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn distance(mut self, distance: f32) -> Self {
        self.distance = distance;
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }

    /// Rejects out-of-range values instead of clamping them.
    pub fn validate(&self) -> Result<(), RevealError> {
        if !(0.0..=1.0).contains(&self.threshold_fraction) {
            return Err(RevealError::InvalidThreshold(self.threshold_fraction));
        }
        if !self.distance.is_finite() {
            return Err(RevealError::InvalidDistance(self.distance));
        }
        if !self.root_margin.is_finite() {
            return Err(RevealError::InvalidRootMargin {
                input: self.root_margin.to_string(),
                reason: "lengths must be finite".to_string(),
            });
        }
        if !self.easing.is_valid() {
            return Err(RevealError::InvalidEasing(self.easing));
        }
        Ok(())
    }

    pub fn observe_options(&self) -> ObserveOptions {
        ObserveOptions {
            threshold_fraction: self.threshold_fraction,
            root_margin: self.root_margin,
        }
    }

    pub fn hidden_pose(&self) -> RevealPose {
        RevealPose::hidden(self.direction.offset(self.distance))
    }

    /// Animation that brings the region to its resting, fully visible pose.
    pub fn animation_spec(&self) -> RevealAnimationSpec {
        RevealAnimationSpec::resting(self.duration, self.delay, self.easing)
    }
}

#[cfg(test)]
#[path = "tests/options_tests.rs"]
mod tests;
