//! Host capabilities consumed by the reveal controller: a visibility source
//! that reports when elements cross their threshold, and an animator that
//! plays reveal animations.

use std::fmt;

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

use crate::{
    animation::{RevealAnimationSpec, RevealPose},
    error::ObserveError,
    options::ObserveOptions,
};

/// Host node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) enum RevealEvent {
    Visibility { region: u64, visible: bool },
    SourceFailed { region: u64, reason: String },
    AnimationFinished { region: u64, run: u64 },
    FailOpen { region: u64 },
}

/// Handed to a [`VisibilitySource`] on subscription. Every call posts to the
/// controller's queue; nothing is dispatched until the controller is pumped.
#[derive(Clone)]
pub struct VisibilityNotifier {
    region: u64,
    tx: Sender<RevealEvent>,
}

impl VisibilityNotifier {
    pub(crate) fn new(region: u64, tx: Sender<RevealEvent>) -> Self {
        Self { region, tx }
    }

    pub fn notify(&self, visible: bool) {
        let _ = self.tx.send(RevealEvent::Visibility {
            region: self.region,
            visible,
        });
    }

    /// Reports that the source can no longer observe this element.
    pub fn fail(&self, reason: impl Into<String>) {
        let _ = self.tx.send(RevealEvent::SourceFailed {
            region: self.region,
            reason: reason.into(),
        });
    }
}

/// Completion token for one started animation. Completion is reported when
/// the token is finished or dropped, so an animator that loses track of it
/// cannot leave the region stuck in flight.
pub struct AnimationDone {
    region: u64,
    run: u64,
    tx: Option<Sender<RevealEvent>>,
}

impl AnimationDone {
    pub(crate) fn new(region: u64, run: u64, tx: Sender<RevealEvent>) -> Self {
        Self {
            region,
            run,
            tx: Some(tx),
        }
    }

    pub fn finish(mut self) {
        self.send();
    }

    fn send(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(RevealEvent::AnimationFinished {
                region: self.region,
                run: self.run,
            });
        }
    }
}

impl Drop for AnimationDone {
    fn drop(&mut self) {
        self.send();
    }
}

impl fmt::Debug for AnimationDone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationDone")
            .field("region", &self.region)
            .field("run", &self.run)
            .field("pending", &self.tx.is_some())
            .finish()
    }
}

pub trait Subscription {
    /// Stop delivering visibility changes. Called at most once per subscription.
    fn unsubscribe(&mut self);
}

pub trait VisibilitySource {
    fn observe_visibility(
        &mut self,
        element: ElementId,
        options: &ObserveOptions,
        notifier: VisibilityNotifier,
    ) -> Result<Box<dyn Subscription>, ObserveError>;
}

pub trait Animator {
    /// Jump to `pose` without animating.
    fn apply(&mut self, element: ElementId, pose: &RevealPose);

    /// Start animating towards `spec`. Fire-and-forget: the animator reports
    /// completion through `done` whenever playback ends.
    fn start_animation(&mut self, element: ElementId, spec: &RevealAnimationSpec, done: AnimationDone);
}

/// Source for hosts without any visibility observation; every region falls
/// back to being shown immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVisibilitySource;

impl VisibilitySource for NoVisibilitySource {
    fn observe_visibility(
        &mut self,
        _element: ElementId,
        _options: &ObserveOptions,
        _notifier: VisibilityNotifier,
    ) -> Result<Box<dyn Subscription>, ObserveError> {
        Err(ObserveError::Unsupported(
            "no visibility source available".to_string(),
        ))
    }
}
