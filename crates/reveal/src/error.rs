use thiserror::Error;

use crate::{easing::EasingFunction, ElementId};

/// Configuration errors surfaced synchronously by `observe`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RevealError {
    #[error("threshold fraction must be within [0, 1], got {0}")]
    InvalidThreshold(f32),
    #[error("invalid root margin '{input}': {reason}")]
    InvalidRootMargin { input: String, reason: String },
    #[error("reveal distance must be finite, got {0}")]
    InvalidDistance(f32),
    #[error("cubic-bezier x control points must be within [0, 1] and all points finite, got {0:?}")]
    InvalidEasing(EasingFunction),
    #[error("element {0} is not attached to the document")]
    DetachedElement(ElementId),
    #[error("region {0} is not registered")]
    UnknownRegion(u64),
}

/// Failures reported by a visibility source when subscribing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObserveError {
    #[error("element is not attached")]
    Detached,
    #[error("visibility observation unsupported: {0}")]
    Unsupported(String),
    #[error("visibility observation failed: {0}")]
    Failed(String),
}
