use std::cell::RefCell;
use std::rc::Rc;

use crate::model::{
    Binding, Breakpoint, ConfigurationSnapshot, CursorPosition, ExternalBreakpoint, Field,
    FieldValue, Font, SharedBuffer, TextSource, Theme,
};
use crate::surface::{Direction, EditingSurface, SurfaceEvent, TextSurface};

use super::{
    Coordinator, CursorSync, CycleInput, CycleOutcome, ExternalState, Reconciler, SourceEditor,
    SurfaceObserver, apply_parameters,
};

/// A surface that records every call made on it.
#[derive(Debug, Default)]
struct RecordingSurface {
    config: ConfigurationSnapshot,
    cursors: Vec<CursorPosition>,
    writes: Vec<Field>,
    breakpoint_pushes: Vec<Vec<Breakpoint>>,
    cursor_pushes: Vec<Vec<CursorPosition>>,
    reloads: usize,
    scrolls: Vec<i64>,
    events: Vec<SurfaceEvent>,
    /// Applied on every write, to imitate a surface that coerces values.
    coerce: Option<fn(&mut ConfigurationSnapshot)>,
}

impl RecordingSurface {
    fn with_config(config: ConfigurationSnapshot) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Simulate the user moving the cursor inside the surface.
    fn user_moves_cursor(&mut self, position: CursorPosition) {
        self.cursors = vec![position];
        self.events.push(SurfaceEvent::CursorsMoved(vec![position]));
    }
}

impl EditingSurface for RecordingSurface {
    fn read_field(&self, field: Field) -> FieldValue {
        self.config.get(field)
    }

    fn write_field(&mut self, value: FieldValue) {
        self.writes.push(value.field());
        self.config.set(value);
        if let Some(coerce) = self.coerce {
            coerce(&mut self.config);
        }
    }

    fn set_breakpoints(&mut self, breakpoints: Vec<Breakpoint>) {
        self.breakpoint_pushes.push(breakpoints);
    }

    fn set_cursor_positions(&mut self, positions: &[CursorPosition]) {
        self.cursor_pushes.push(positions.to_vec());
        self.cursors = positions.to_vec();
        self.events
            .push(SurfaceEvent::CursorsMoved(positions.to_vec()));
    }

    fn cursor_positions(&self) -> Vec<CursorPosition> {
        self.cursors.clone()
    }

    fn reload_ui(&mut self) {
        self.reloads += 1;
    }

    fn scroll_to_line_and_select(&mut self, line: i64) {
        self.scrolls.push(line);
        self.cursors = vec![CursorPosition::new(line, 1)];
        self.events.push(SurfaceEvent::CursorsMoved(self.cursors.clone()));
    }

    fn text(&self) -> String {
        String::new()
    }

    fn take_events(&mut self) -> Vec<SurfaceEvent> {
        std::mem::take(&mut self.events)
    }
}

fn create_recording_editor(state: &ExternalState) -> SourceEditor<RecordingSurface> {
    let editor = SourceEditor::with_controller(state, |_, snapshot| {
        RecordingSurface::with_config(snapshot.clone())
    });
    // Forget the construction-time cursor push
    editor.controller().borrow_mut().cursor_pushes.clear();
    editor
}

fn pos(line: i64, column: i64) -> CursorPosition {
    CursorPosition::new(line, column)
}

// --- Parameter diffing ---

#[test]
fn test_unchanged_snapshot_writes_nothing() {
    let state = ExternalState::with_text("");
    let mut editor = create_recording_editor(&state);

    let report = editor.update(&state);

    assert_eq!(report.outcome, CycleOutcome::Unchanged);
    assert!(report.fields_written.is_empty());
    let surface = editor.controller().borrow();
    assert!(surface.writes.is_empty());
    assert_eq!(surface.reloads, 0);
}

#[test]
fn test_each_single_field_change_writes_only_that_field() {
    let changed = ConfigurationSnapshot {
        font: Font::new("Iosevka", 14.0),
        theme: Theme::named("dracula"),
        tab_width: 2,
        indent_option: crate::model::IndentOption::Tab,
        line_height: 1.6,
        wrap_lines: false,
        editor_overscroll: 0.5,
        content_insets: Some(crate::model::EdgeInsets::new(8.0, 0.0, 8.0, 0.0)),
        is_editable: false,
        is_selectable: false,
        letter_spacing: 1.2,
        bracket_pair_highlight: Some(crate::model::BracketPairHighlight::Flash),
        use_system_cursor: true,
        language: crate::model::Language::new("swift"),
        use_theme_background: false,
    };

    for field in Field::ALL {
        let mut state = ExternalState::with_text("");
        let mut editor = create_recording_editor(&state);
        state.snapshot.set(changed.get(field));

        let report = editor.update(&state);

        assert_eq!(report.fields_written, vec![field], "field {field}");
        assert_eq!(report.outcome, CycleOutcome::Patched, "field {field}");
        let surface = editor.controller().borrow();
        assert_eq!(surface.writes, vec![field]);
        assert_eq!(surface.reloads, 0);
    }
}

#[test]
fn test_several_changes_write_each_once() {
    let mut state = ExternalState::with_text("");
    let mut editor = create_recording_editor(&state);
    state.snapshot.tab_width = 8;
    state.snapshot.wrap_lines = false;

    let report = editor.update(&state);

    assert_eq!(report.fields_written, vec![Field::TabWidth, Field::WrapLines]);
    assert_eq!(editor.update(&state).outcome, CycleOutcome::Unchanged);
    assert_eq!(editor.controller().borrow().writes.len(), 2);
}

#[test]
fn test_coercing_surface_triggers_reload() {
    let mut state = ExternalState::with_text("");
    let mut editor = create_recording_editor(&state);
    editor.controller().borrow_mut().coerce = Some(|config| config.tab_width = config.tab_width.max(1));
    state.snapshot.tab_width = 0;

    let report = editor.update(&state);

    assert_eq!(report.outcome, CycleOutcome::Reloaded);
    assert!(report.reloaded());
    assert_eq!(report.fields_written, vec![Field::TabWidth]);
    assert_eq!(editor.controller().borrow().reloads, 1);
}

#[test]
fn test_cascading_write_triggers_reload() {
    let mut state = ExternalState::with_text("");
    let mut editor = create_recording_editor(&state);
    // Turning off editing also turns off selection in this surface
    editor.controller().borrow_mut().coerce = Some(|config| {
        if !config.is_editable {
            config.is_selectable = false;
        }
    });
    state.snapshot.is_editable = false;

    let report = editor.update(&state);

    // The selectable write is undone by the surface straight away
    assert_eq!(
        report.fields_written,
        vec![Field::IsEditable, Field::IsSelectable]
    );
    assert_eq!(report.outcome, CycleOutcome::Reloaded);
    assert!(!editor.controller().borrow().config.is_selectable);
}

#[test]
fn test_apply_parameters_reads_live_values_not_cached_ones() {
    let mut surface = RecordingSurface::default();
    let candidate = ConfigurationSnapshot {
        letter_spacing: 2.0,
        ..ConfigurationSnapshot::default()
    };

    let (outcome, written) = apply_parameters(&mut surface, &candidate, &[]);
    assert_eq!(outcome, CycleOutcome::Patched);
    assert_eq!(written, vec![Field::LetterSpacing]);

    // Someone else resets the surface behind the reconciler's back
    surface.config.letter_spacing = 1.0;
    let (_, written) = apply_parameters(&mut surface, &candidate, &[]);
    assert_eq!(written, vec![Field::LetterSpacing]);
}

// --- Breakpoints ---

#[test]
fn test_breakpoints_pushed_every_cycle() {
    let mut state = ExternalState::with_text("");
    state.breakpoints = vec![ExternalBreakpoint::new(3, true)];
    let mut editor = create_recording_editor(&state);

    editor.update(&state);
    editor.update(&state);
    state.snapshot.wrap_lines = false;
    editor.update(&state);

    let surface = editor.controller().borrow();
    assert_eq!(surface.breakpoint_pushes.len(), 3);
    assert!(
        surface
            .breakpoint_pushes
            .iter()
            .all(|bps| bps == &vec![Breakpoint::new(2, true)])
    );
}

#[test]
fn test_breakpoints_converted_to_zero_based() {
    let mut state = ExternalState::with_text("");
    state.breakpoints = vec![
        ExternalBreakpoint::new(1, true),
        ExternalBreakpoint::new(5, false),
    ];
    let input = state.cycle_input();
    assert_eq!(
        input.breakpoints,
        vec![Breakpoint::new(0, true), Breakpoint::new(4, false)]
    );
}

#[test]
fn test_empty_breakpoint_list_is_still_pushed() {
    let state = ExternalState::with_text("");
    let mut editor = create_recording_editor(&state);

    let report = editor.update(&state);

    assert_eq!(report.breakpoints_pushed, 0);
    assert_eq!(editor.controller().borrow().breakpoint_pushes, vec![Vec::new()]);
}

// --- Cursor feedback suppression ---

#[test]
fn test_view_originated_cursor_is_not_pushed_back() {
    let state = ExternalState::with_text("");
    let mut editor = create_recording_editor(&state);

    editor.interact(|surface| surface.user_moves_cursor(pos(3, 1)));
    assert_eq!(state.cursor_positions.get(), vec![pos(3, 1)]);
    assert!(editor.coordinator().originated_from_view());

    let report = editor.update(&state);

    assert_eq!(report.cursor_sync, CursorSync::Suppressed);
    assert!(editor.controller().borrow().cursor_pushes.is_empty());
    assert!(!editor.coordinator().originated_from_view());
}

#[test]
fn test_state_originated_cursor_is_pushed() {
    let state = ExternalState::with_text("");
    let mut editor = create_recording_editor(&state);

    state.cursor_positions.set(vec![pos(5, 1)]);
    let report = editor.update(&state);

    assert_eq!(report.cursor_sync, CursorSync::Pushed);
    assert_eq!(
        editor.controller().borrow().cursor_pushes,
        vec![vec![pos(5, 1)]]
    );
}

#[test]
fn test_suppression_lasts_one_cycle() {
    let state = ExternalState::with_text("");
    let mut editor = create_recording_editor(&state);

    editor.interact(|surface| surface.user_moves_cursor(pos(2, 4)));
    assert_eq!(editor.update(&state).cursor_sync, CursorSync::Suppressed);
    assert_eq!(editor.update(&state).cursor_sync, CursorSync::Pushed);
}

#[test]
fn test_overlapping_cursor_moves_collapse_to_one_suppression() {
    let state = ExternalState::with_text("");
    let mut editor = create_recording_editor(&state);

    editor.interact(|surface| {
        surface.user_moves_cursor(pos(1, 2));
        surface.user_moves_cursor(pos(1, 3));
        surface.user_moves_cursor(pos(1, 4));
    });
    assert_eq!(state.cursor_positions.get(), vec![pos(1, 4)]);

    assert_eq!(editor.update(&state).cursor_sync, CursorSync::Suppressed);
    assert_eq!(editor.update(&state).cursor_sync, CursorSync::Pushed);
}

#[test]
fn test_push_echo_does_not_set_view_latch() {
    let state = ExternalState::with_text("");
    let mut editor = create_recording_editor(&state);
    state.cursor_positions.set(vec![pos(7, 2)]);

    editor.update(&state);

    assert!(!editor.coordinator().originated_from_view());
    assert!(!editor.coordinator().originated_from_state());
    assert!(editor.controller().borrow().events.is_empty());
    assert_eq!(editor.update(&state).cursor_sync, CursorSync::Pushed);
}

#[test]
fn test_undelivered_move_is_delivered_before_push() {
    let state = ExternalState::with_text("");
    let mut editor = create_recording_editor(&state);

    // Queued without going through `interact`
    editor
        .controller()
        .borrow_mut()
        .user_moves_cursor(pos(9, 9));
    let report = editor.update(&state);

    assert_eq!(report.cursor_sync, CursorSync::Suppressed);
    assert_eq!(state.cursor_positions.get(), vec![pos(9, 9)]);
}

// --- Scroll requests ---

#[test]
fn test_scroll_request_is_not_diffed() {
    let mut state = ExternalState::with_text("");
    state.scroll_target = Some(10);
    let mut editor = create_recording_editor(&state);

    let first = editor.update(&state);
    let second = editor.update(&state);

    assert_eq!(first.scrolled_to, Some(10));
    assert_eq!(second.scrolled_to, Some(10));
    assert_eq!(editor.controller().borrow().scrolls, vec![10, 10]);
}

#[test]
fn test_no_scroll_without_target() {
    let state = ExternalState::with_text("");
    let mut editor = create_recording_editor(&state);
    assert_eq!(editor.update(&state).scrolled_to, None);
    assert!(editor.controller().borrow().scrolls.is_empty());
}

// --- Weak controller reference ---

#[test]
fn test_dropped_surface_detaches_cycle() {
    let controller = Rc::new(RefCell::new(RecordingSurface::default()));
    let mut coordinator = Coordinator::new(
        &controller,
        TextSource::Binding(Binding::default()),
        Binding::default(),
    );
    let mut reconciler = Reconciler::new();
    let input = CycleInput::new(ConfigurationSnapshot::default());

    assert_eq!(
        reconciler.reconcile(&mut coordinator, &input).outcome,
        CycleOutcome::Unchanged
    );
    drop(controller);

    let report = reconciler.reconcile(&mut coordinator, &input);
    assert_eq!(report.outcome, CycleOutcome::Detached);
    assert_eq!(report.cursor_sync, CursorSync::Skipped);
    assert_eq!(report.cycle, 2);
    assert_eq!(coordinator.pump(), 0);
}

#[test]
fn test_coordinator_does_not_keep_surface_alive() {
    let controller = Rc::new(RefCell::new(RecordingSurface::default()));
    let coordinator = Coordinator::new(
        &controller,
        TextSource::Binding(Binding::default()),
        Binding::default(),
    );
    assert_eq!(Rc::strong_count(&controller), 1);
    drop(controller);
    assert!(coordinator.controller().is_none());
}

// --- Observers and teardown ---

#[derive(Default)]
struct Tally {
    cursor_changes: usize,
    texts: Vec<String>,
    destroyed: usize,
}

struct TallyObserver(Rc<RefCell<Tally>>);

impl SurfaceObserver for TallyObserver {
    fn cursor_positions_changed(&mut self, _positions: &[CursorPosition]) {
        self.0.borrow_mut().cursor_changes += 1;
    }

    fn text_changed(&mut self, text: &str) {
        self.0.borrow_mut().texts.push(text.to_string());
    }

    fn destroyed(&mut self) {
        self.0.borrow_mut().destroyed += 1;
    }
}

#[test]
fn test_observers_see_view_changes_but_not_echoes() {
    let state = ExternalState::with_text("abc");
    let mut editor = SourceEditor::new(&state);
    let tally = Rc::new(RefCell::new(Tally::default()));
    editor
        .coordinator_mut()
        .add_observer(Box::new(TallyObserver(Rc::clone(&tally))));

    state.cursor_positions.set(vec![pos(1, 3)]);
    editor.update(&state);
    assert_eq!(tally.borrow().cursor_changes, 0);

    editor.interact(|surface| surface.insert_str("!"));
    assert_eq!(tally.borrow().cursor_changes, 1);
    assert_eq!(tally.borrow().texts, vec!["ab!c".to_string()]);
}

#[test]
fn test_teardown_notifies_observers_once() {
    let state = ExternalState::with_text("");
    let mut editor = SourceEditor::new(&state);
    let tally = Rc::new(RefCell::new(Tally::default()));
    editor
        .coordinator_mut()
        .add_observer(Box::new(TallyObserver(Rc::clone(&tally))));

    editor.teardown();
    assert_eq!(tally.borrow().destroyed, 1);
}

#[test]
fn test_dropping_editor_notifies_observers() {
    let state = ExternalState::with_text("");
    let mut editor = SourceEditor::new(&state);
    let tally = Rc::new(RefCell::new(Tally::default()));
    editor
        .coordinator_mut()
        .add_observer(Box::new(TallyObserver(Rc::clone(&tally))));

    drop(editor);
    assert_eq!(tally.borrow().destroyed, 1);
}

// --- Text sources with the rope-backed surface ---

#[test]
fn test_binding_receives_typed_text() {
    let binding = Binding::new("hello".to_string());
    let state = ExternalState::new(TextSource::Binding(binding.clone()));
    let mut editor = SourceEditor::new(&state);

    editor.interact(|surface| {
        surface.move_cursor(Direction::Right);
        surface.insert_str("__")
    });

    assert_eq!(binding.get(), "h__ello");
    assert_eq!(state.cursor_positions.get(), vec![pos(1, 4)]);
}

#[test]
fn test_external_buffer_is_edited_without_binding_write() {
    let buffer = SharedBuffer::from_text("hello");
    let state = ExternalState::new(TextSource::ExternalBuffer(buffer.clone()));
    let mut editor = SourceEditor::new(&state);

    editor.interact(|surface| surface.insert_str("> "));

    assert_eq!(buffer.text(), "> hello");
    assert_eq!(editor.coordinator().text_source().text(), "> hello");
}

#[test]
fn test_initial_cursor_positions_reach_surface() {
    let state = ExternalState::with_text("one\ntwo\nthree");
    state.cursor_positions.set(vec![pos(2, 3)]);
    let editor = SourceEditor::new(&state);

    assert_eq!(editor.controller().borrow().cursor_positions(), vec![pos(2, 3)]);
    assert!(!editor.coordinator().originated_from_view());
}

#[test]
fn test_scroll_selection_reaches_state_within_the_cycle() {
    let mut state = ExternalState::with_text("a\nb\nc\nd\ne");
    let mut editor = SourceEditor::new(&state);
    state.scroll_target = Some(4);

    editor.update(&state);
    assert_eq!(state.cursor_positions.get(), vec![pos(4, 1)]);
    assert!(!editor.coordinator().originated_from_view());
    assert!(!editor.coordinator().originated_from_state());
    assert_eq!(editor.pump_events(), 0);
}

#[test]
fn test_external_cursor_change_after_scroll_is_pushed() {
    let mut state = ExternalState::with_text("a\nb\nc\nd\ne\nf");
    let mut editor = SourceEditor::new(&state);
    state.scroll_target = Some(2);
    editor.update(&state);

    state.scroll_target = None;
    state.cursor_positions.set(vec![pos(5, 1)]);
    let report = editor.update(&state);

    assert_eq!(report.cursor_sync, CursorSync::Pushed);
    assert_eq!(state.cursor_positions.get(), vec![pos(5, 1)]);
    assert_eq!(
        editor.controller().borrow().cursor_positions(),
        vec![pos(5, 1)]
    );
}

#[test]
fn test_kept_scroll_target_does_not_block_cursor_pushes() {
    let mut state = ExternalState::with_text("");
    state.scroll_target = Some(2);
    let mut editor = create_recording_editor(&state);
    editor.update(&state);
    assert_eq!(state.cursor_positions.get(), vec![pos(2, 1)]);

    state.cursor_positions.set(vec![pos(5, 1)]);
    let report = editor.update(&state);

    assert_eq!(report.cursor_sync, CursorSync::Pushed);
    let surface = editor.controller().borrow();
    assert_eq!(surface.cursor_pushes.last(), Some(&vec![pos(5, 1)]));
    // The scroll runs after the push and reselects its line
    assert_eq!(surface.scrolls, vec![2, 2]);
    assert_eq!(state.cursor_positions.get(), vec![pos(2, 1)]);
}

#[test]
fn test_scroll_selection_is_not_reported_to_observers() {
    let mut state = ExternalState::with_text("a\nb\nc");
    let mut editor = SourceEditor::new(&state);
    let tally = Rc::new(RefCell::new(Tally::default()));
    editor
        .coordinator_mut()
        .add_observer(Box::new(TallyObserver(Rc::clone(&tally))));

    state.scroll_target = Some(3);
    editor.update(&state);
    assert_eq!(tally.borrow().cursor_changes, 0);
}

#[test]
fn test_end_to_end_breakpoint_then_font() {
    let mut state = ExternalState::with_text("fn main() {}\n");
    let mut editor = SourceEditor::new(&state);
    editor.controller().borrow_mut().reset_stats();

    // Cycle 1: S0 plus one breakpoint
    state.breakpoints = vec![ExternalBreakpoint::new(1, true)];
    let report = editor.update(&state);
    {
        let surface = editor.controller().borrow();
        assert_eq!(surface.breakpoints(), &[Breakpoint::new(0, true)]);
        assert!(surface.stats().field_writes.is_empty());
        assert_eq!(surface.stats().reloads, 0);
    }
    assert_eq!(report.outcome, CycleOutcome::Unchanged);

    // Cycle 2: S1 = S0 with the font changed
    state.snapshot.font = Font::new("JetBrains Mono", 13.0);
    let report = editor.update(&state);
    let surface = editor.controller().borrow();
    assert_eq!(report.fields_written, vec![Field::Font]);
    assert_eq!(surface.stats().field_writes, vec![Field::Font]);
    assert_eq!(surface.stats().reloads, 0);
    assert_eq!(surface.stats().breakpoint_pushes, 2);
    assert_eq!(surface.breakpoints(), &[Breakpoint::new(0, true)]);
}

#[test]
fn test_text_surface_coercion_reloads_every_cycle() {
    let mut state = ExternalState::with_text("");
    let mut editor: SourceEditor<TextSurface> = SourceEditor::new(&state);
    state.snapshot.line_height = 0.1;

    assert_eq!(editor.update(&state).outcome, CycleOutcome::Reloaded);
    // The surface keeps disagreeing, so the fallback runs again
    assert_eq!(editor.update(&state).outcome, CycleOutcome::Reloaded);
    assert_eq!(editor.controller().borrow().layout_generation(), 2);
}
