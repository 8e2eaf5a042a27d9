use serde::Serialize;

use crate::model::{Breakpoint, ConfigurationSnapshot, CursorPosition, Field, params_equal};
use crate::surface::EditingSurface;

use super::coordinator::{Coordinator, CursorSync};

/// Everything the external state owner supplies for one cycle.
///
/// Breakpoint lines are already 0-based here.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleInput {
    pub snapshot: ConfigurationSnapshot,
    pub cursor_positions: Vec<CursorPosition>,
    pub breakpoints: Vec<Breakpoint>,
    pub scroll_target: Option<i64>,
}

impl CycleInput {
    pub fn new(snapshot: ConfigurationSnapshot) -> Self {
        Self {
            snapshot,
            cursor_positions: Vec::new(),
            breakpoints: Vec::new(),
            scroll_target: None,
        }
    }
}

/// How the parameter phase of a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    /// The snapshot matched the surface; nothing was written.
    Unchanged,
    /// Deltas were written and the surface converged.
    Patched,
    /// Deltas were written but the surface still differed, so it was reloaded.
    Reloaded,
    /// The surface no longer exists.
    Detached,
}

/// What one reconciliation cycle did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub outcome: CycleOutcome,
    pub cursor_sync: CursorSync,
    pub fields_written: Vec<Field>,
    pub breakpoints_pushed: usize,
    pub scrolled_to: Option<i64>,
}

impl CycleReport {
    const fn detached(cycle: u64) -> Self {
        Self {
            cycle,
            outcome: CycleOutcome::Detached,
            cursor_sync: CursorSync::Skipped,
            fields_written: Vec::new(),
            breakpoints_pushed: 0,
            scrolled_to: None,
        }
    }

    pub fn reloaded(&self) -> bool {
        self.outcome == CycleOutcome::Reloaded
    }
}

/// Drives reconciliation cycles.
///
/// Stateless apart from a cycle counter: the previous snapshot is always
/// read back from the surface, never cached, so values the surface
/// coerced are seen as they really are.
#[derive(Debug, Default)]
pub struct Reconciler {
    cycles: u64,
}

impl Reconciler {
    pub const fn new() -> Self {
        Self { cycles: 0 }
    }

    /// Number of cycles run so far, including detached ones.
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run one cycle against the coordinator's surface.
    pub fn reconcile<S: EditingSurface>(
        &mut self,
        coordinator: &mut Coordinator<S>,
        input: &CycleInput,
    ) -> CycleReport {
        self.cycles += 1;
        let cycle = self.cycles;
        let _scope = crate::perf::scope("reconcile.cycle");
        let span = tracing::debug_span!("reconcile", cycle);
        let _guard = span.enter();

        let Some(controller) = coordinator.controller() else {
            tracing::debug!("surface dropped, skipping cycle");
            crate::perf::log_event("cycle.detached", format!("cycle={cycle}"));
            return CycleReport::detached(cycle);
        };
        let mut surface = controller.borrow_mut();

        // Notifications are synchronous; anything still queued predates this cycle
        let pending = coordinator.deliver(&mut *surface);
        if pending > 0 {
            tracing::trace!(pending, "delivered queued surface events");
        }

        let cursor_sync = coordinator.sync_cursors_inbound(&mut *surface, &input.cursor_positions);
        let (outcome, fields_written) =
            apply_parameters(&mut *surface, &input.snapshot, &input.breakpoints);

        let scrolled_to = input.scroll_target.inspect(|&line| {
            coordinator.scroll_inbound(&mut *surface, line);
        });

        tracing::debug!(
            ?outcome,
            ?cursor_sync,
            writes = fields_written.len(),
            breakpoints = input.breakpoints.len(),
            "cycle complete"
        );
        crate::perf::log_event(
            "cycle.complete",
            format!(
                "cycle={cycle} outcome={outcome:?} cursors={cursor_sync:?} fields=[{}]",
                fields_written
                    .iter()
                    .map(|f| f.name())
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        );

        CycleReport {
            cycle,
            outcome,
            cursor_sync,
            fields_written,
            breakpoints_pushed: input.breakpoints.len(),
            scrolled_to,
        }
    }
}

/// Diff `candidate` against the surface's live values and write the deltas.
///
/// Breakpoints are pushed whether or not anything else changed. After
/// writing, the comparator runs again against the live values; a surface
/// that coerced or cascaded a write gets a full reload.
pub fn apply_parameters<S: EditingSurface + ?Sized>(
    surface: &mut S,
    candidate: &ConfigurationSnapshot,
    breakpoints: &[Breakpoint],
) -> (CycleOutcome, Vec<Field>) {
    let previous = surface.live_snapshot();
    if params_equal(&previous, candidate) {
        surface.set_breakpoints(breakpoints.to_vec());
        return (CycleOutcome::Unchanged, Vec::new());
    }

    let mut written = Vec::new();
    for field in Field::ALL {
        let wanted = candidate.get(field);
        if surface.read_field(field) != wanted {
            tracing::trace!(%field, "writing field");
            surface.write_field(wanted);
            written.push(field);
        }
    }
    surface.set_breakpoints(breakpoints.to_vec());

    if params_equal(candidate, &surface.live_snapshot()) {
        (CycleOutcome::Patched, written)
    } else {
        tracing::debug!("surface did not converge, reloading");
        surface.reload_ui();
        (CycleOutcome::Reloaded, written)
    }
}
