//! Geometry-backed visibility source for hosts that know element layout
//! (or for driving the controller from recorded scroll traces).

use std::{
    cell::RefCell,
    collections::HashMap,
    rc::{Rc, Weak},
};

use tracing::trace;

use crate::{
    capability::{ElementId, Subscription, VisibilityNotifier, VisibilitySource},
    error::ObserveError,
    geometry::{Rect, Viewport},
    options::ObserveOptions,
};

struct Watcher {
    element: ElementId,
    options: ObserveOptions,
    notifier: VisibilityNotifier,
    last: Option<bool>,
}

#[derive(Default)]
struct Inner {
    viewport: Viewport,
    elements: HashMap<ElementId, Rect>,
    watchers: HashMap<u64, Watcher>,
    next_watcher: u64,
}

impl Inner {
    fn evaluate(&mut self) {
        let viewport = self.viewport;
        for watcher in self.watchers.values_mut() {
            let visible = self
                .elements
                .get(&watcher.element)
                .is_some_and(|rect| is_visible(rect, &viewport, &watcher.options));
            if watcher.last != Some(visible) {
                watcher.last = Some(visible);
                watcher.notifier.notify(visible);
            }
        }
    }
}

/// Slack on the visible-area ratio; the overlap is rebuilt from edges in f32,
/// so a fully contained rect can compute to just under 1.0.
const RATIO_TOLERANCE: f32 = 1e-4;

/// Whether `rect` counts as visible inside `viewport` grown by the root margin.
pub fn is_visible(rect: &Rect, viewport: &Viewport, options: &ObserveOptions) -> bool {
    let insets = options.root_margin.resolve(viewport.width, viewport.height);
    let root = Rect::new(
        viewport.scroll_x - insets.left,
        viewport.scroll_y - insets.top,
        viewport.width + insets.left + insets.right,
        viewport.height + insets.top + insets.bottom,
    );

    let Some(overlap) = rect.intersection(&root) else {
        return false;
    };
    if options.threshold_fraction <= 0.0 {
        return true;
    }
    let area = rect.area();
    if area <= 0.0 {
        return true;
    }
    overlap.area() / area >= options.threshold_fraction - RATIO_TOLERANCE
}

/// Scrollable page whose element rectangles are known. Visibility is
/// re-evaluated after every layout, scroll or resize, and watchers are
/// notified only when their boolean changes.
///
/// Clones share state, so the host can keep one to scroll while the
/// controller owns another.
#[derive(Clone, Default)]
pub struct ScrollViewport {
    inner: Rc<RefCell<Inner>>,
}

impl ScrollViewport {
    pub fn new(viewport: Viewport) -> Self {
        let inner = Inner {
            viewport,
            ..Inner::default()
        };
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.inner.borrow().viewport
    }

    pub fn set_element_rect(&self, element: ElementId, rect: Rect) {
        let mut inner = self.inner.borrow_mut();
        inner.elements.insert(element, rect);
        inner.evaluate();
    }

    /// Detaches an element; its watchers see it leave the viewport.
    pub fn remove_element(&self, element: ElementId) {
        let mut inner = self.inner.borrow_mut();
        inner.elements.remove(&element);
        inner.evaluate();
    }

    pub fn scroll_to(&self, x: f32, y: f32) {
        let mut inner = self.inner.borrow_mut();
        inner.viewport.scroll_x = x;
        inner.viewport.scroll_y = y;
        inner.evaluate();
    }

    pub fn resize(&self, width: f32, height: f32) {
        let mut inner = self.inner.borrow_mut();
        inner.viewport.width = width;
        inner.viewport.height = height;
        inner.evaluate();
    }

    pub fn watcher_count(&self) -> usize {
        self.inner.borrow().watchers.len()
    }
}

struct ViewportSubscription {
    id: u64,
    inner: Weak<RefCell<Inner>>,
}

impl Subscription for ViewportSubscription {
    fn unsubscribe(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.borrow_mut().watchers.remove(&self.id);
            trace!(watcher = self.id, "viewport watcher removed");
        }
    }
}

impl VisibilitySource for ScrollViewport {
    fn observe_visibility(
        &mut self,
        element: ElementId,
        options: &ObserveOptions,
        notifier: VisibilityNotifier,
    ) -> Result<Box<dyn Subscription>, ObserveError> {
        let mut inner = self.inner.borrow_mut();
        if !inner.elements.contains_key(&element) {
            return Err(ObserveError::Detached);
        }

        let id = inner.next_watcher;
        inner.next_watcher += 1;
        inner.watchers.insert(
            id,
            Watcher {
                element,
                options: *options,
                notifier,
                last: None,
            },
        );
        inner.evaluate();

        Ok(Box::new(ViewportSubscription {
            id,
            inner: Rc::downgrade(&self.inner),
        }))
    }
}

#[cfg(test)]
#[path = "tests/viewport_tests.rs"]
mod tests;
