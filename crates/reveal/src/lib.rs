//! Scroll-triggered reveal engine for the showreel site.
//!
//! [`VisibilityRevealController`] watches page regions through a
//! [`VisibilitySource`] and plays reveal animations through an [`Animator`],
//! firing trigger-once regions at most once and coalescing re-entries of
//! repeatable regions while their animation is still playing. When the host
//! cannot observe visibility, regions are revealed straight away.

pub mod animation;
pub mod capability;
pub mod controller;
pub mod cursor;
pub mod easing;
pub mod error;
pub mod geometry;
pub mod options;
pub mod parallax;
pub mod timeline;
pub mod viewport;

pub use animation::{Offset, RevealAnimationSpec, RevealPose};
pub use capability::{
    AnimationDone, Animator, ElementId, NoVisibilitySource, Subscription, VisibilityNotifier,
    VisibilitySource,
};
pub use controller::{RegionHandle, RegionState, RevealEntry, VisibilityRevealController};
pub use easing::EasingFunction;
pub use error::{ObserveError, RevealError};
pub use geometry::{Rect, Viewport};
pub use options::{Direction, MarginLength, ObserveOptions, RevealOptions, RootMargin};
pub use parallax::ParallaxTrack;
pub use timeline::FrameAnimator;
pub use viewport::ScrollViewport;
