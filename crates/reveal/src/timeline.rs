use std::{collections::HashMap, time::Duration};

use tracing::trace;

use crate::{
    animation::{RevealAnimationSpec, RevealPose},
    capability::{AnimationDone, Animator, ElementId},
};

struct Track {
    element: ElementId,
    from: RevealPose,
    spec: RevealAnimationSpec,
    elapsed: Duration,
    done: Option<AnimationDone>,
}

/// Animator driven by the host's frame clock: every [`advance`](Self::advance)
/// moves all tracks forward and reports finished ones.
///
/// Starting a new animation on an element that is already animating retargets
/// it from the current pose; the superseded track counts as finished.
#[derive(Default)]
pub struct FrameAnimator {
    poses: HashMap<ElementId, RevealPose>,
    tracks: Vec<Track>,
    started: u64,
}

impl FrameAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current pose; elements never touched rest at the default pose.
    pub fn pose(&self, element: ElementId) -> RevealPose {
        self.poses.get(&element).copied().unwrap_or_default()
    }

    pub fn is_animating(&self, element: ElementId) -> bool {
        self.tracks.iter().any(|track| track.element == element)
    }

    pub fn active_count(&self) -> usize {
        self.tracks.len()
    }

    /// Total number of animations started so far.
    pub fn started(&self) -> u64 {
        self.started
    }

    /// Returns how many tracks completed during this step.
    pub fn advance(&mut self, dt: Duration) -> usize {
        let mut finished = 0;
        let poses = &mut self.poses;
        self.tracks.retain_mut(|track| {
            track.elapsed += dt;
            poses.insert(track.element, track.spec.sample(&track.from, track.elapsed));
            if track.elapsed < track.spec.total() {
                return true;
            }
            if let Some(done) = track.done.take() {
                done.finish();
            }
            finished += 1;
            false
        });
        finished
    }
}

impl Animator for FrameAnimator {
    fn apply(&mut self, element: ElementId, pose: &RevealPose) {
        self.poses.insert(element, *pose);
    }

    fn start_animation(&mut self, element: ElementId, spec: &RevealAnimationSpec, done: AnimationDone) {
        let from = self.pose(element);
        if let Some(index) = self.tracks.iter().position(|track| track.element == element) {
            trace!(%element, "retargeting running animation");
            self.tracks.swap_remove(index);
        }

        self.started += 1;
        self.tracks.push(Track {
            element,
            from,
            spec: *spec,
            elapsed: Duration::ZERO,
            done: Some(done),
        });
    }
}

#[cfg(test)]
#[path = "tests/timeline_tests.rs"]
mod tests;
