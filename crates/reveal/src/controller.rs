use std::collections::HashMap;

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::{
    animation::RevealAnimationSpec,
    capability::{
        AnimationDone, Animator, ElementId, RevealEvent, Subscription, VisibilityNotifier,
        VisibilitySource,
    },
    error::{ObserveError, RevealError},
    options::RevealOptions,
};

/// Identifies one observed region. Handles are never reused, so a stale
/// handle cannot address a region registered later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionHandle(u64);

impl RegionHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionState {
    Idle,
    /// Repeatable region with an animation in flight.
    Animating,
    /// Terminal: the reveal fired and the region no longer observes.
    Triggered,
}

/// Passed to enter callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealEntry {
    pub handle: RegionHandle,
    pub element: ElementId,
    pub spec: RevealAnimationSpec,
}

type EnterCallback = Box<dyn FnMut(&RevealEntry)>;

struct Region {
    element: ElementId,
    options: RevealOptions,
    state: RegionState,
    visible: bool,
    revealed: bool,
    run: u64,
    subscription: Option<Box<dyn Subscription>>,
    on_enter: Option<EnterCallback>,
}

impl Region {
    fn unsubscribe(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

/// Bridges visibility signals to reveal animations.
///
/// Signals and animation completions are queued and handled on the owning
/// thread by [`pump`](Self::pump). Each region starts `Idle`; on its first
/// entry a trigger-once region becomes `Triggered` and drops its subscription,
/// while a repeatable region plays and ignores further entries until the
/// animation reports completion.
pub struct VisibilityRevealController<S, A> {
    source: S,
    animator: A,
    regions: HashMap<u64, Region>,
    next_region: u64,
    tx: Sender<RevealEvent>,
    rx: Receiver<RevealEvent>,
}

impl<S, A> VisibilityRevealController<S, A>
where
    S: VisibilitySource,
    A: Animator,
{
    pub fn new(source: S, animator: A) -> Self {
        let (tx, rx) = unbounded();
        Self {
            source,
            animator,
            regions: HashMap::new(),
            next_region: 1,
            tx,
            rx,
        }
    }

    pub fn observe(
        &mut self,
        element: ElementId,
        options: RevealOptions,
    ) -> Result<RegionHandle, RevealError> {
        options.validate()?;

        let id = self.next_region;
        self.next_region += 1;

        let notifier = VisibilityNotifier::new(id, self.tx.clone());
        let subscription =
            match self
                .source
                .observe_visibility(element, &options.observe_options(), notifier)
            {
                Ok(subscription) => Some(subscription),
                Err(ObserveError::Detached) => return Err(RevealError::DetachedElement(element)),
                Err(error) => {
                    warn!(region = id, %element, %error, "visibility source unavailable; revealing immediately");
                    let _ = self.tx.send(RevealEvent::FailOpen { region: id });
                    None
                }
            };

        self.animator.apply(element, &options.hidden_pose());
        debug!(region = id, %element, trigger_once = options.trigger_once, "observing reveal region");
        self.regions.insert(
            id,
            Region {
                element,
                options,
                state: RegionState::Idle,
                visible: false,
                revealed: false,
                run: 0,
                subscription,
                on_enter: None,
            },
        );
        Ok(RegionHandle(id))
    }

    /// Registers the function invoked each time the region is revealed,
    /// replacing any earlier one.
    pub fn on_enter<F>(&mut self, handle: RegionHandle, callback: F) -> Result<(), RevealError>
    where
        F: FnMut(&RevealEntry) + 'static,
    {
        let region = self
            .regions
            .get_mut(&handle.0)
            .ok_or(RevealError::UnknownRegion(handle.0))?;
        region.on_enter = Some(Box::new(callback));
        Ok(())
    }

    /// Stops observing. Queued signals for the region are discarded and its
    /// callback never runs again; an animation already playing is left alone.
    /// Releasing twice, or after a trigger-once self-release, is a no-op.
    pub fn release(&mut self, handle: RegionHandle) {
        if let Some(mut region) = self.regions.remove(&handle.0) {
            region.unsubscribe();
            debug!(region = handle.0, element = %region.element, "released reveal region");
        }
    }

    pub fn state(&self, handle: RegionHandle) -> Option<RegionState> {
        self.regions.get(&handle.0).map(|region| region.state)
    }

    pub fn is_observing(&self, handle: RegionHandle) -> bool {
        self.regions
            .get(&handle.0)
            .is_some_and(|region| region.subscription.is_some())
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Handles queued events until the queue is empty, including completions
    /// posted while handling. Returns the number of events handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.dispatch(event);
            handled += 1;
        }
        handled
    }

    pub fn animator(&self) -> &A {
        &self.animator
    }

    pub fn animator_mut(&mut self) -> &mut A {
        &mut self.animator
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    fn dispatch(&mut self, event: RevealEvent) {
        match event {
            RevealEvent::Visibility { region, visible } => self.on_visibility(region, visible),
            RevealEvent::AnimationFinished { region, run } => self.on_finished(region, run),
            RevealEvent::SourceFailed { region, reason } => self.on_source_failed(region, &reason),
            RevealEvent::FailOpen { region } => {
                if let Some(entry) = self.regions.get_mut(&region) {
                    entry.visible = true;
                    if entry.state != RegionState::Triggered {
                        self.reveal(region, true);
                    }
                }
            }
        }
    }

    fn on_visibility(&mut self, id: u64, visible: bool) {
        let Some(region) = self.regions.get_mut(&id) else {
            trace!(region = id, "dropping signal for released region");
            return;
        };

        let was_visible = std::mem::replace(&mut region.visible, visible);
        if !visible {
            if !region.options.trigger_once && region.state == RegionState::Idle && region.revealed {
                region.revealed = false;
                self.animator.apply(region.element, &region.options.hidden_pose());
            }
            return;
        }
        if was_visible {
            return;
        }

        let state = region.state;
        match state {
            RegionState::Idle => {
                let terminal = region.options.trigger_once;
                self.reveal(id, terminal);
            }
            RegionState::Animating => {
                debug!(region = id, "entry coalesced while animation in flight");
            }
            RegionState::Triggered => {
                trace!(region = id, "ignoring signal after trigger-once reveal");
            }
        }
    }

    fn on_finished(&mut self, id: u64, run: u64) {
        let Some(region) = self.regions.get_mut(&id) else {
            return;
        };
        if region.state != RegionState::Animating || region.run != run {
            return;
        }

        region.state = RegionState::Idle;
        if !region.visible {
            region.revealed = false;
            self.animator.apply(region.element, &region.options.hidden_pose());
        }
    }

    fn on_source_failed(&mut self, id: u64, reason: &str) {
        let Some(region) = self.regions.get_mut(&id) else {
            return;
        };
        warn!(region = id, element = %region.element, reason, "visibility source failed; revealing region");
        region.unsubscribe();

        let state = region.state;
        match state {
            RegionState::Triggered => {}
            RegionState::Idle if !region.revealed => {
                region.visible = true;
                self.reveal(id, true);
            }
            RegionState::Idle | RegionState::Animating => {
                region.state = RegionState::Triggered;
            }
        }
    }

    fn reveal(&mut self, id: u64, terminal: bool) {
        let Some(region) = self.regions.get_mut(&id) else {
            return;
        };

        region.run += 1;
        region.revealed = true;
        if terminal {
            region.state = RegionState::Triggered;
            region.unsubscribe();
        } else {
            region.state = RegionState::Animating;
        }

        let spec = region.options.animation_spec();
        debug!(region = id, element = %region.element, run = region.run, terminal, "revealing region");

        let done = AnimationDone::new(id, region.run, self.tx.clone());
        self.animator.start_animation(region.element, &spec, done);

        if let Some(callback) = region.on_enter.as_mut() {
            callback(&RevealEntry {
                handle: RegionHandle(id),
                element: region.element,
                spec,
            });
        }
    }
}

impl<S, A> Drop for VisibilityRevealController<S, A> {
    fn drop(&mut self) {
        for region in self.regions.values_mut() {
            region.unsubscribe();
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
