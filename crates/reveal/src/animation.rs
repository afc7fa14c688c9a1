use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::easing::EasingFunction;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub x: f32,
    pub y: f32,
}

impl Offset {
    pub const ZERO: Offset = Offset { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn lerp(self, to: Offset, t: f32) -> Offset {
        Offset::new(self.x + (to.x - self.x) * t, self.y + (to.y - self.y) * t)
    }
}

/// Visual state of a region at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevealPose {
    pub opacity: f32,
    pub offset: Offset,
}

impl Default for RevealPose {
    fn default() -> Self {
        Self::RESTING
    }
}

impl RevealPose {
    pub const RESTING: RevealPose = RevealPose {
        opacity: 1.0,
        offset: Offset::ZERO,
    };

    pub fn hidden(offset: Offset) -> Self {
        Self {
            opacity: 0.0,
            offset,
        }
    }
}

/// Target state and timing handed to the animation capability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevealAnimationSpec {
    pub opacity: f32,
    pub offset: Offset,
    pub duration: Duration,
    pub delay: Duration,
    pub easing: EasingFunction,
}

impl RevealAnimationSpec {
    pub fn resting(duration: Duration, delay: Duration, easing: EasingFunction) -> Self {
        Self {
            opacity: RevealPose::RESTING.opacity,
            offset: RevealPose::RESTING.offset,
            duration,
            delay,
            easing,
        }
    }

    pub fn target(&self) -> RevealPose {
        RevealPose {
            opacity: self.opacity,
            offset: self.offset,
        }
    }

    pub fn total(&self) -> Duration {
        self.delay + self.duration
    }

    /// Pose reached `elapsed` after the animation was started from `from`.
    pub fn sample(&self, from: &RevealPose, elapsed: Duration) -> RevealPose {
        let Some(running) = elapsed.checked_sub(self.delay) else {
            return *from;
        };
        if self.duration.is_zero() || running >= self.duration {
            return self.target();
        }

        let linear = running.as_secs_f32() / self.duration.as_secs_f32();
        let t = self.easing.evaluate(linear);
        RevealPose {
            opacity: from.opacity + (self.opacity - from.opacity) * t,
            offset: from.offset.lerp(self.offset, t),
        }
    }
}
