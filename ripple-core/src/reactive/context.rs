//! Tracking Context
//!
//! The tracking context records which effect is currently running and whether
//! reads should be tracked against it. `track` consults it to find the
//! implicit subscriber, so the interception layer never has to pass the
//! running effect around.
//!
//! # Implementation
//!
//! Each runtime keeps a stack of frames. Running an effect pushes a frame
//! with tracking enabled; [`untracked`](crate::reactive::untracked) pushes a
//! frame for the same effect with tracking disabled. Frames are popped by a
//! guard when the run returns or unwinds.
//!
//! Because frames are stacked, a nested effect run that completes hands the
//! context back to the outer effect exactly as it was, tracking gate
//! included. Outside every run the stack is empty and nothing is tracked.

use std::cell::RefCell;
use std::rc::Rc;

use super::{EffectId, Reactive};

/// One entry in the context stack.
struct Frame {
    /// The effect that reads are attributed to.
    effect: Option<Rc<dyn Reactive>>,

    /// Whether reads in this frame subscribe the effect.
    should_track: bool,
}

/// Per-runtime stack of running effects.
#[derive(Default)]
pub(crate) struct TrackingContext {
    stack: RefCell<Vec<Frame>>,
}

impl TrackingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `effect` the active effect with tracking enabled.
    ///
    /// The previous state is restored when the returned guard is dropped.
    pub fn enter(&self, effect: Rc<dyn Reactive>) -> ContextGuard<'_> {
        self.push(Frame {
            effect: Some(effect),
            should_track: true,
        })
    }

    /// Turn the tracking gate off while keeping the active effect.
    pub fn pause(&self) -> ContextGuard<'_> {
        let effect = self.active_effect();
        self.push(Frame {
            effect,
            should_track: false,
        })
    }

    fn push(&self, frame: Frame) -> ContextGuard<'_> {
        let mut stack = self.stack.borrow_mut();
        stack.push(frame);
        ContextGuard {
            context: self,
            depth: stack.len(),
        }
    }

    /// The effect currently running, if any.
    pub fn active_effect(&self) -> Option<Rc<dyn Reactive>> {
        self.stack
            .borrow()
            .last()
            .and_then(|frame| frame.effect.clone())
    }

    pub fn active_effect_id(&self) -> Option<EffectId> {
        self.stack
            .borrow()
            .last()
            .and_then(|frame| frame.effect.as_ref().map(|effect| effect.effect_id()))
    }

    /// The effect reads should be attributed to, or `None` when tracking is
    /// not currently permitted.
    pub fn tracking_effect(&self) -> Option<Rc<dyn Reactive>> {
        self.stack
            .borrow()
            .last()
            .filter(|frame| frame.should_track)
            .and_then(|frame| frame.effect.clone())
    }

    pub fn is_tracking(&self) -> bool {
        self.stack
            .borrow()
            .last()
            .is_some_and(|frame| frame.should_track && frame.effect.is_some())
    }

    pub fn depth(&self) -> usize {
        self.stack.borrow().len()
    }
}

/// Guard that pops its frame when dropped.
///
/// This keeps the stack balanced even if the computation panics.
pub(crate) struct ContextGuard<'a> {
    context: &'a TrackingContext,
    depth: usize,
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        let frame = {
            let mut stack = self.context.stack.borrow_mut();
            debug_assert_eq!(
                stack.len(),
                self.depth,
                "tracking context popped out of order"
            );
            stack.pop()
        };

        // The frame may hold the last reference to an effect; release it
        // after the stack borrow ends.
        drop(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::dep::tests::MockReactive;

    #[test]
    fn context_tracks_effect() {
        let context = TrackingContext::new();
        let effect = MockReactive::new();
        let id = effect.effect_id();

        assert!(!context.is_tracking());
        assert!(context.active_effect_id().is_none());

        {
            let _guard = context.enter(effect);

            assert!(context.is_tracking());
            assert_eq!(context.active_effect_id(), Some(id));
            assert!(context.tracking_effect().is_some());
        }

        assert!(!context.is_tracking());
        assert!(context.active_effect_id().is_none());
        assert_eq!(context.depth(), 0);
    }

    #[test]
    fn nested_enter_restores_outer() {
        let context = TrackingContext::new();
        let outer = MockReactive::new();
        let inner = MockReactive::new();
        let outer_id = outer.effect_id();
        let inner_id = inner.effect_id();

        let _outer = context.enter(outer);
        {
            let _inner = context.enter(inner);
            assert_eq!(context.active_effect_id(), Some(inner_id));
        }

        assert_eq!(context.active_effect_id(), Some(outer_id));
        assert!(context.is_tracking());
    }

    #[test]
    fn pause_keeps_effect_but_disables_tracking() {
        let context = TrackingContext::new();
        let effect = MockReactive::new();
        let id = effect.effect_id();

        let _running = context.enter(effect);
        {
            let _paused = context.pause();
            assert_eq!(context.active_effect_id(), Some(id));
            assert!(!context.is_tracking());
            assert!(context.tracking_effect().is_none());
        }

        assert!(context.is_tracking());
    }

    #[test]
    fn pause_outside_effect_is_harmless() {
        let context = TrackingContext::new();
        {
            let _paused = context.pause();
            assert_eq!(context.depth(), 1);
            assert!(context.active_effect().is_none());
        }
        assert_eq!(context.depth(), 0);
    }
}
