use std::{cell::RefCell, rc::Rc, time::Duration};

use super::*;
use crate::{
    animation::{Offset, RevealPose},
    options::{Direction, ObserveOptions, RootMargin},
};

#[derive(Default)]
struct FakeSource {
    notifiers: HashMap<ElementId, VisibilityNotifier>,
    observed: Vec<(ElementId, ObserveOptions)>,
    unsubscribed: Rc<RefCell<Vec<ElementId>>>,
    fail_with: Option<ObserveError>,
}

impl FakeSource {
    fn failing(error: ObserveError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::default()
        }
    }

    fn emit(&self, element: ElementId, signals: &[bool]) {
        let notifier = self.notifiers.get(&element).expect("subscribed element");
        for visible in signals {
            notifier.notify(*visible);
        }
    }

    fn unsubscribe_count(&self, element: ElementId) -> usize {
        self.unsubscribed
            .borrow()
            .iter()
            .filter(|e| **e == element)
            .count()
    }
}

struct FakeSubscription {
    element: ElementId,
    log: Rc<RefCell<Vec<ElementId>>>,
}

impl Subscription for FakeSubscription {
    fn unsubscribe(&mut self) {
        self.log.borrow_mut().push(self.element);
    }
}

impl VisibilitySource for FakeSource {
    fn observe_visibility(
        &mut self,
        element: ElementId,
        options: &ObserveOptions,
        notifier: VisibilityNotifier,
    ) -> Result<Box<dyn Subscription>, ObserveError> {
        if let Some(error) = self.fail_with.clone() {
            return Err(error);
        }
        self.observed.push((element, *options));
        self.notifiers.insert(element, notifier);
        Ok(Box::new(FakeSubscription {
            element,
            log: Rc::clone(&self.unsubscribed),
        }))
    }
}

#[derive(Default)]
struct FakeAnimator {
    applied: Vec<(ElementId, RevealPose)>,
    started: Vec<(ElementId, RevealAnimationSpec)>,
    in_flight: Vec<AnimationDone>,
}

impl FakeAnimator {
    fn finish_all(&mut self) {
        for done in self.in_flight.drain(..) {
            done.finish();
        }
    }

    fn starts_for(&self, element: ElementId) -> usize {
        self.started.iter().filter(|(e, _)| *e == element).count()
    }
}

impl Animator for FakeAnimator {
    fn apply(&mut self, element: ElementId, pose: &RevealPose) {
        self.applied.push((element, *pose));
    }

    fn start_animation(&mut self, element: ElementId, spec: &RevealAnimationSpec, done: AnimationDone) {
        self.started.push((element, *spec));
        self.in_flight.push(done);
    }
}

type Controller = VisibilityRevealController<FakeSource, FakeAnimator>;

fn controller() -> Controller {
    VisibilityRevealController::new(FakeSource::default(), FakeAnimator::default())
}

fn count_entries(ctl: &mut Controller, handle: RegionHandle) -> Rc<RefCell<Vec<RevealEntry>>> {
    let entries = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&entries);
    ctl.on_enter(handle, move |entry| sink.borrow_mut().push(*entry))
        .expect("registered");
    entries
}

const HERO: ElementId = ElementId(1);
const ABOUT: ElementId = ElementId(2);

#[test]
fn trigger_once_fires_exactly_once_under_rapid_toggling() {
    let mut ctl = controller();
    let handle = ctl.observe(HERO, RevealOptions::section()).expect("observe");
    let entries = count_entries(&mut ctl, handle);

    ctl.source().emit(HERO, &[true, false, true, false, true, true]);
    ctl.pump();
    ctl.source().emit(HERO, &[false, true]);
    ctl.animator_mut().finish_all();
    ctl.pump();

    assert_eq!(entries.borrow().len(), 1);
    assert_eq!(ctl.animator().starts_for(HERO), 1);
    assert_eq!(ctl.state(handle), Some(RegionState::Triggered));
    assert!(!ctl.is_observing(handle));
    assert_eq!(ctl.source().unsubscribe_count(HERO), 1);
}

#[test]
fn portfolio_scenario_starts_one_resting_animation_after_first_entry() {
    let mut ctl = controller();
    let options = RevealOptions::section()
        .threshold(0.1)
        .root_margin("300px".parse().expect("margin"))
        .trigger_once(true)
        .direction(Direction::Up)
        .distance(50.0);
    let handle = ctl.observe(HERO, options).expect("observe");

    let (_, observed) = ctl.source().observed[0];
    assert_eq!(observed.threshold_fraction, 0.1);
    assert_eq!(observed.root_margin, RootMargin::px(300.0));
    assert_eq!(
        ctl.animator().applied,
        vec![(HERO, RevealPose::hidden(Offset::new(0.0, 50.0)))]
    );

    ctl.source().emit(HERO, &[false]);
    ctl.pump();
    assert!(ctl.animator().started.is_empty());

    ctl.source().emit(HERO, &[true, false, true]);
    ctl.pump();

    assert_eq!(ctl.animator().started.len(), 1);
    let (element, spec) = ctl.animator().started[0];
    assert_eq!(element, HERO);
    assert_eq!(spec.opacity, 1.0);
    assert_eq!(spec.offset, Offset::ZERO);
    assert_eq!(spec.duration, Duration::from_millis(600));
    assert_eq!(spec.delay, Duration::from_millis(200));
    assert_eq!(ctl.state(handle), Some(RegionState::Triggered));
}

#[test]
fn repeatable_region_coalesces_entries_while_animating() {
    let mut ctl = controller();
    let handle = ctl
        .observe(HERO, RevealOptions::section().trigger_once(false))
        .expect("observe");
    let entries = count_entries(&mut ctl, handle);

    ctl.source().emit(HERO, &[true]);
    ctl.pump();
    assert_eq!(ctl.state(handle), Some(RegionState::Animating));

    ctl.source().emit(HERO, &[false, true, false, true]);
    ctl.pump();
    assert_eq!(entries.borrow().len(), 1);
    assert_eq!(ctl.animator().starts_for(HERO), 1);

    ctl.animator_mut().finish_all();
    ctl.pump();
    assert_eq!(ctl.state(handle), Some(RegionState::Idle));
    assert_eq!(ctl.animator().starts_for(HERO), 1);

    ctl.source().emit(HERO, &[false, true]);
    ctl.pump();
    assert_eq!(entries.borrow().len(), 2);
    assert_eq!(ctl.animator().starts_for(HERO), 2);
    assert!(ctl.is_observing(handle));
}

#[test]
fn repeatable_region_hides_again_after_leaving() {
    let mut ctl = controller();
    let options = RevealOptions::section().trigger_once(false).direction(Direction::Right);
    let hidden = options.hidden_pose();
    ctl.observe(HERO, options).expect("observe");

    ctl.source().emit(HERO, &[true]);
    ctl.pump();
    ctl.animator_mut().finish_all();
    ctl.pump();
    ctl.source().emit(HERO, &[false]);
    ctl.pump();

    assert_eq!(ctl.animator().applied.last(), Some(&(HERO, hidden)));
    assert_eq!(hidden.offset, Offset::new(-50.0, 0.0));
}

#[test]
fn leaving_mid_animation_hides_only_after_completion() {
    let mut ctl = controller();
    ctl.observe(HERO, RevealOptions::section().trigger_once(false))
        .expect("observe");

    ctl.source().emit(HERO, &[true, false]);
    ctl.pump();
    assert_eq!(ctl.animator().applied.len(), 1, "only the initial hidden pose");

    ctl.animator_mut().finish_all();
    ctl.pump();
    assert_eq!(ctl.animator().applied.len(), 2);
}

#[test]
fn double_release_is_a_noop_and_drops_pending_signals() {
    let mut ctl = controller();
    let handle = ctl.observe(HERO, RevealOptions::section()).expect("observe");
    let entries = count_entries(&mut ctl, handle);

    ctl.source().emit(HERO, &[true]);
    ctl.release(handle);
    ctl.release(handle);
    ctl.pump();

    assert!(entries.borrow().is_empty());
    assert!(ctl.animator().started.is_empty());
    assert_eq!(ctl.source().unsubscribe_count(HERO), 1);
    assert_eq!(ctl.state(handle), None);
    assert_eq!(ctl.region_count(), 0);
}

#[test]
fn release_after_self_release_does_not_unsubscribe_twice() {
    let mut ctl = controller();
    let handle = ctl.observe(HERO, RevealOptions::section()).expect("observe");

    ctl.source().emit(HERO, &[true]);
    ctl.pump();
    assert_eq!(ctl.source().unsubscribe_count(HERO), 1);

    ctl.release(handle);
    ctl.release(handle);
    assert_eq!(ctl.source().unsubscribe_count(HERO), 1);
}

#[test]
fn completion_after_release_is_ignored() {
    let mut ctl = controller();
    let handle = ctl
        .observe(HERO, RevealOptions::section().trigger_once(false))
        .expect("observe");
    ctl.source().emit(HERO, &[true]);
    ctl.pump();

    ctl.release(handle);
    ctl.animator_mut().finish_all();
    assert_eq!(ctl.pump(), 1);
    assert_eq!(ctl.animator().applied.len(), 1);
}

#[test]
fn unsupported_source_fails_open_within_one_pump() {
    let source = FakeSource::failing(ObserveError::Unsupported("no observer".into()));
    let mut ctl = VisibilityRevealController::new(source, FakeAnimator::default());
    let handle = ctl
        .observe(HERO, RevealOptions::section().trigger_once(false))
        .expect("handle despite missing source");
    let entries = count_entries(&mut ctl, handle);
    assert!(entries.borrow().is_empty());

    ctl.pump();
    assert_eq!(entries.borrow().len(), 1);
    assert_eq!(ctl.state(handle), Some(RegionState::Triggered));

    ctl.animator_mut().finish_all();
    ctl.pump();
    assert_eq!(entries.borrow().len(), 1);

    ctl.release(handle);
    ctl.release(handle);
}

#[test]
fn runtime_source_error_reveals_hidden_region() {
    let mut ctl = controller();
    let handle = ctl.observe(HERO, RevealOptions::section()).expect("observe");
    let entries = count_entries(&mut ctl, handle);

    ctl.source().notifiers[&HERO].fail("observer disconnected");
    ctl.source().emit(HERO, &[true]);
    ctl.pump();

    assert_eq!(entries.borrow().len(), 1);
    assert_eq!(ctl.source().unsubscribe_count(HERO), 1);
}

#[test]
fn runtime_source_error_while_animating_keeps_single_run() {
    let mut ctl = controller();
    let handle = ctl
        .observe(HERO, RevealOptions::section().trigger_once(false))
        .expect("observe");
    ctl.source().emit(HERO, &[true]);
    ctl.pump();

    ctl.source().notifiers[&HERO].fail("gone");
    ctl.pump();
    ctl.animator_mut().finish_all();
    ctl.pump();

    assert_eq!(ctl.animator().starts_for(HERO), 1);
    assert_eq!(ctl.state(handle), Some(RegionState::Triggered));
}

#[test]
fn detached_element_is_rejected() {
    let source = FakeSource::failing(ObserveError::Detached);
    let mut ctl = VisibilityRevealController::new(source, FakeAnimator::default());
    let err = ctl
        .observe(HERO, RevealOptions::section())
        .expect_err("detached");
    assert_eq!(err, RevealError::DetachedElement(HERO));
    assert_eq!(ctl.region_count(), 0);
    assert_eq!(ctl.pump(), 0);
}

#[test]
fn invalid_threshold_is_rejected_before_subscribing() {
    let mut ctl = controller();
    let err = ctl
        .observe(HERO, RevealOptions::section().threshold(-0.1))
        .expect_err("negative threshold");
    assert!(matches!(err, RevealError::InvalidThreshold(_)));
    assert!(ctl.source().observed.is_empty());
    assert!(ctl.animator().applied.is_empty());
}

#[test]
fn non_finite_root_margin_is_rejected_before_subscribing() {
    let mut ctl = controller();
    let err = ctl
        .observe(HERO, RevealOptions::section().root_margin(RootMargin::px(f32::NAN)))
        .expect_err("nan margin");
    assert!(matches!(err, RevealError::InvalidRootMargin { .. }));
    assert!(ctl.source().observed.is_empty());
    assert_eq!(ctl.region_count(), 0);
    assert_eq!(ctl.pump(), 0);
}

#[test]
fn regions_fire_independently() {
    let mut ctl = controller();
    let hero = ctl.observe(HERO, RevealOptions::section()).expect("hero");
    let about = ctl.observe(ABOUT, RevealOptions::heading()).expect("about");
    let hero_entries = count_entries(&mut ctl, hero);
    let about_entries = count_entries(&mut ctl, about);

    ctl.source().emit(HERO, &[true]);
    ctl.pump();
    assert_eq!(hero_entries.borrow().len(), 1);
    assert!(about_entries.borrow().is_empty());
    assert_eq!(ctl.state(about), Some(RegionState::Idle));

    ctl.source().emit(ABOUT, &[true]);
    ctl.pump();
    assert_eq!(hero_entries.borrow().len(), 1);
    assert_eq!(about_entries.borrow().len(), 1);
    assert_eq!(about_entries.borrow()[0].element, ABOUT);
    assert_eq!(about_entries.borrow()[0].handle, about);
}

#[test]
fn on_enter_for_released_region_errors() {
    let mut ctl = controller();
    let handle = ctl.observe(HERO, RevealOptions::section()).expect("observe");
    ctl.release(handle);
    let err = ctl.on_enter(handle, |_| {}).expect_err("released");
    assert_eq!(err, RevealError::UnknownRegion(handle.id()));
}

#[test]
fn dropping_controller_releases_subscriptions() {
    let mut ctl = controller();
    ctl.observe(HERO, RevealOptions::section()).expect("hero");
    ctl.observe(ABOUT, RevealOptions::section()).expect("about");
    let log = Rc::clone(&ctl.source().unsubscribed);

    drop(ctl);
    let mut released = log.borrow().clone();
    released.sort();
    assert_eq!(released, vec![HERO, ABOUT]);
}
