use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::Serialize;

use crate::model::{Binding, CursorPosition, TextSource};
use crate::surface::{EditingSurface, SurfaceEvent};

/// Receives view-originated changes that made it past suppression.
pub trait SurfaceObserver {
    fn cursor_positions_changed(&mut self, _positions: &[CursorPosition]) {}

    fn text_changed(&mut self, _text: &str) {}

    /// Called once when the coordinator is torn down.
    fn destroyed(&mut self) {}
}

/// What happened to the external cursor positions during a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorSync {
    /// The external positions were pushed into the surface.
    Pushed,
    /// The positions came from the surface itself; nothing was pushed.
    Suppressed,
    /// The surface is gone.
    Skipped,
}

/// Mediates between the surface and the external state owner.
///
/// Holds only a weak reference to the surface. The two latches break
/// the surface → state → reconcile → surface feedback loop; they are
/// single-slot booleans, so several cursor notifications between two
/// cycles collapse into one suppressed push. That is only sound while
/// notifications and cycles run on one thread, one at a time.
pub struct Coordinator<S> {
    controller: Weak<RefCell<S>>,
    text: TextSource,
    cursor_positions: Binding<Vec<CursorPosition>>,
    originated_from_view: bool,
    originated_from_state: bool,
    observers: Vec<Box<dyn SurfaceObserver>>,
    torn_down: bool,
}

impl<S: EditingSurface> Coordinator<S> {
    pub fn new(
        controller: &Rc<RefCell<S>>,
        text: TextSource,
        cursor_positions: Binding<Vec<CursorPosition>>,
    ) -> Self {
        Self {
            controller: Rc::downgrade(controller),
            text,
            cursor_positions,
            originated_from_view: false,
            originated_from_state: false,
            observers: Vec::new(),
            torn_down: false,
        }
    }

    /// The surface, if it is still alive.
    pub fn controller(&self) -> Option<Rc<RefCell<S>>> {
        self.controller.upgrade()
    }

    /// Set when the surface changed the cursor and the external binding
    /// has already been updated to match.
    pub const fn originated_from_view(&self) -> bool {
        self.originated_from_view
    }

    /// Set only while external positions are being pushed into the surface.
    pub const fn originated_from_state(&self) -> bool {
        self.originated_from_state
    }

    pub const fn text_source(&self) -> &TextSource {
        &self.text
    }

    pub fn add_observer(&mut self, observer: Box<dyn SurfaceObserver>) {
        self.observers.push(observer);
    }

    /// Deliver everything the surface has queued.
    ///
    /// Returns the number of events handled, 0 when the surface is gone.
    pub fn pump(&mut self) -> usize {
        let Some(controller) = self.controller() else {
            return 0;
        };
        let mut surface = controller.borrow_mut();
        self.deliver(&mut *surface)
    }

    /// Like [`pump`](Self::pump), for a surface the caller already holds.
    pub fn deliver(&mut self, surface: &mut S) -> usize {
        let events = surface.take_events();
        let count = events.len();
        for event in events {
            self.handle_event(surface, event);
        }
        count
    }

    /// The surface → state edge.
    pub fn handle_event(&mut self, surface: &S, event: SurfaceEvent) {
        match event {
            SurfaceEvent::CursorsMoved(positions) => {
                if self.originated_from_state {
                    tracing::trace!(count = positions.len(), "dropping cursor echo");
                    return;
                }
                tracing::trace!(count = positions.len(), "cursor moved in surface");
                self.originated_from_view = true;
                for observer in &mut self.observers {
                    observer.cursor_positions_changed(&positions);
                }
                self.cursor_positions.set(positions);
            }
            SurfaceEvent::TextChanged => {
                let text = surface.text();
                if let TextSource::Binding(binding) = &self.text {
                    binding.set(text.clone());
                }
                for observer in &mut self.observers {
                    observer.text_changed(&text);
                }
            }
        }
    }

    /// The state → surface edge for cursor positions.
    ///
    /// Skips the push and clears the view latch when the positions came
    /// from the surface. Otherwise pushes them with the state latch held,
    /// discarding the cursor notifications the push itself produces.
    pub fn sync_cursors_inbound(&mut self, surface: &mut S, positions: &[CursorPosition]) -> CursorSync {
        if self.originated_from_view {
            self.originated_from_view = false;
            return CursorSync::Suppressed;
        }

        self.originated_from_state = true;
        surface.set_cursor_positions(positions);
        self.deliver(surface);
        self.originated_from_state = false;
        CursorSync::Pushed
    }

    /// Scroll to 1-based `line` on behalf of the state owner.
    ///
    /// The selection the scroll makes is written straight into the cursor
    /// binding within the same cycle. The view latch is left alone, so a
    /// later external cursor change is still pushed.
    pub fn scroll_inbound(&mut self, surface: &mut S, line: i64) {
        self.originated_from_state = true;
        surface.scroll_to_line_and_select(line);
        for event in surface.take_events() {
            match event {
                SurfaceEvent::CursorsMoved(positions) => {
                    tracing::trace!(line, "scroll selection written to binding");
                    self.cursor_positions.set(positions);
                }
                other => self.handle_event(surface, other),
            }
        }
        self.originated_from_state = false;
    }

    /// Notify observers and release the surface reference.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        for observer in &mut self.observers {
            observer.destroyed();
        }
        self.controller = Weak::new();
        tracing::debug!("coordinator torn down");
    }
}

impl<S> Drop for Coordinator<S> {
    fn drop(&mut self) {
        if !self.torn_down {
            for observer in &mut self.observers {
                observer.destroyed();
            }
        }
    }
}

impl<S> std::fmt::Debug for Coordinator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("attached", &(self.controller.strong_count() > 0))
            .field("originated_from_view", &self.originated_from_view)
            .field("originated_from_state", &self.originated_from_state)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}
