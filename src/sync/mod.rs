//! Reconciliation between external declarative state and a live surface.
//!
//! The flow follows the external state owner's re-evaluation loop:
//! - [`ExternalState`]: what the owner holds (1-based positions)
//! - [`Reconciler::reconcile`]: one cycle, diffing a snapshot against the surface
//! - [`Coordinator`]: the surface → state edge and its feedback latches
//! - [`SourceEditor`]: owns the surface and wires the pieces together

mod coordinator;
mod reconciler;

pub use coordinator::{Coordinator, CursorSync, SurfaceObserver};
pub use reconciler::{CycleInput, CycleOutcome, CycleReport, Reconciler, apply_parameters};

use std::cell::RefCell;
use std::rc::Rc;

use crate::model::{
    Binding, Breakpoint, ConfigurationSnapshot, CursorPosition, ExternalBreakpoint, TextSource,
};
use crate::surface::{EditingSurface, TextSurface};

/// The external state owner's side of the contract.
#[derive(Debug, Clone)]
pub struct ExternalState {
    pub snapshot: ConfigurationSnapshot,
    /// Two-way bound; the coordinator writes surface cursor moves here.
    pub cursor_positions: Binding<Vec<CursorPosition>>,
    /// 1-based lines.
    pub breakpoints: Vec<ExternalBreakpoint>,
    pub scroll_target: Option<i64>,
    pub text: TextSource,
}

impl ExternalState {
    pub fn new(text: TextSource) -> Self {
        Self {
            snapshot: ConfigurationSnapshot::default(),
            cursor_positions: Binding::new(vec![CursorPosition::start()]),
            breakpoints: Vec::new(),
            scroll_target: None,
            text,
        }
    }

    /// State bound to a fresh string binding holding `text`.
    pub fn with_text(text: &str) -> Self {
        Self::new(TextSource::Binding(Binding::new(text.to_string())))
    }

    /// Build this cycle's input, converting breakpoints to 0-based lines.
    pub fn cycle_input(&self) -> CycleInput {
        CycleInput {
            snapshot: self.snapshot.clone(),
            cursor_positions: self.cursor_positions.get(),
            breakpoints: self
                .breakpoints
                .iter()
                .copied()
                .map(Breakpoint::from)
                .collect(),
            scroll_target: self.scroll_target,
        }
    }
}

/// Owns a surface and keeps it in step with an [`ExternalState`].
///
/// The surface is built once from the state's [`TextSource`]; later
/// cycles only ever patch it.
pub struct SourceEditor<S> {
    controller: Rc<RefCell<S>>,
    coordinator: Coordinator<S>,
    reconciler: Reconciler,
}

impl SourceEditor<TextSurface> {
    pub fn new(state: &ExternalState) -> Self {
        Self::with_controller(state, |source, snapshot| {
            TextSurface::new(source, snapshot.clone())
        })
    }
}

impl<S: EditingSurface> SourceEditor<S> {
    /// Build the surface with `make` and push the initial cursor positions.
    pub fn with_controller(
        state: &ExternalState,
        make: impl FnOnce(&TextSource, &ConfigurationSnapshot) -> S,
    ) -> Self {
        let controller = Rc::new(RefCell::new(make(&state.text, &state.snapshot)));
        let mut coordinator = Coordinator::new(
            &controller,
            state.text.clone(),
            state.cursor_positions.clone(),
        );
        {
            let positions = state.cursor_positions.get();
            let mut surface = controller.borrow_mut();
            coordinator.sync_cursors_inbound(&mut *surface, &positions);
        }
        tracing::debug!(binding = state.text.is_binding(), "surface created");
        Self {
            controller,
            coordinator,
            reconciler: Reconciler::new(),
        }
    }

    /// Reconcile the surface with `state`.
    pub fn update(&mut self, state: &ExternalState) -> CycleReport {
        self.reconciler
            .reconcile(&mut self.coordinator, &state.cycle_input())
    }

    /// Run a user interaction against the surface, then deliver its
    /// notifications synchronously.
    pub fn interact<R>(&mut self, f: impl FnOnce(&mut S) -> R) -> R {
        let result = f(&mut self.controller.borrow_mut());
        self.coordinator.pump();
        result
    }

    /// Deliver whatever the surface has queued.
    pub fn pump_events(&mut self) -> usize {
        self.coordinator.pump()
    }

    pub const fn controller(&self) -> &Rc<RefCell<S>> {
        &self.controller
    }

    pub const fn coordinator(&self) -> &Coordinator<S> {
        &self.coordinator
    }

    pub const fn coordinator_mut(&mut self) -> &mut Coordinator<S> {
        &mut self.coordinator
    }

    pub const fn cycles(&self) -> u64 {
        self.reconciler.cycles()
    }

    /// Tear down the coordinator and drop the surface.
    pub fn teardown(mut self) {
        self.coordinator.teardown();
    }
}

impl<S> std::fmt::Debug for SourceEditor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceEditor")
            .field("coordinator", &self.coordinator)
            .field("reconciler", &self.reconciler)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
