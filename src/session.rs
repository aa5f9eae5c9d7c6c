//! The single aggregate that owns the surface, history and tool state.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::config::SketchConfig;
use crate::error::SketchResult;
use crate::geometry::{Color, SurfacePoint};
use crate::history::{HistoryStack, HistoryStatus, HistoryStep};
use crate::import::{self, ImportCompletion, ImportOutcome, ImportPipeline, ImportSource, ImportTask};
use crate::resize::{ResizeCoordinator, ResizeOutcome};
use crate::surface::{FontRasterizer, GlyphRasterizer, PixelSurface, StrokeStyle, SurfaceError};
use crate::tools::{PointerAffordance, ToolEffect, ToolEvent, ToolMachine, ToolOptions, ToolState};

/// Called with the new affordance state after every history change.
pub type HistoryObserver = Box<dyn FnMut(&HistoryStatus)>;

pub struct DrawingSession {
    surface: PixelSurface,
    history: HistoryStack,
    tools: ToolMachine,
    options: ToolOptions,
    resize: ResizeCoordinator,
    imports: ImportPipeline,
    observers: Vec<HistoryObserver>,
}

impl fmt::Debug for DrawingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawingSession")
            .field("surface", &self.surface)
            .field("history", &self.history.status())
            .field("tools", &self.tools)
            .field("options", &self.options)
            .field("resize", &self.resize)
            .field("imports", &self.imports)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl DrawingSession {
    pub fn new(width: u32, height: u32) -> Self {
        let mut surface = PixelSurface::new(width, height);
        surface.set_stroke_style(StrokeStyle::ROUND);
        tracing::info!(width, height, "drawing session created");
        Self {
            surface,
            history: HistoryStack::new(),
            tools: ToolMachine::new(),
            options: ToolOptions::default(),
            resize: ResizeCoordinator::default(),
            imports: ImportPipeline::new(),
            observers: Vec::new(),
        }
    }

    pub fn from_config(config: &SketchConfig) -> Self {
        let mut session = Self::new(config.surface_width, config.surface_height);
        session.options = config.tool_options();
        session.history = HistoryStack::with_capacity_limit(config.history_capacity);
        session.resize = ResizeCoordinator::new(config.resize_restore);

        if let Some(path) = config.font_path.as_deref() {
            match FontRasterizer::from_path(path) {
                Ok(rasterizer) => session.set_rasterizer(Some(Arc::new(rasterizer))),
                Err(err) => {
                    tracing::warn!(%err, ?path, "font unavailable; text placement disabled");
                }
            }
        }
        session
    }

    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn GlyphRasterizer>) -> Self {
        self.set_rasterizer(Some(rasterizer));
        self
    }

    pub fn set_rasterizer(&mut self, rasterizer: Option<Arc<dyn GlyphRasterizer>>) {
        self.surface.set_rasterizer(rasterizer);
    }

    pub fn surface(&self) -> &PixelSurface {
        &self.surface
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn tool_state(&self) -> &ToolState {
        self.tools.state()
    }

    pub fn options(&self) -> ToolOptions {
        self.options
    }

    pub fn pointer_affordance(&self) -> PointerAffordance {
        self.tools.affordance()
    }

    pub fn subscribe(&mut self, observer: HistoryObserver) {
        self.observers.push(observer);
    }

    pub fn set_color(&mut self, color: Color) {
        self.options.set_color(color);
    }

    pub fn set_stroke_width(&mut self, stroke_width: u8) {
        self.options.set_stroke_width(stroke_width);
    }

    pub fn set_font_size(&mut self, font_size: u8) {
        self.options.set_font_size(font_size);
    }

    pub fn handle_event(&mut self, event: ToolEvent) -> SketchResult<()> {
        if self.needs_font(&event) {
            self.tools.next(&event)?;
            if !self.surface.has_rasterizer() {
                tracing::warn!(event = ?event, "text placement needs a font");
                return Err(SurfaceError::FontUnavailable.into());
            }
        }

        let effect = self.tools.handle(event)?;
        self.apply_effect(effect)
    }

    pub fn pointer_press(&mut self, x: f32, y: f32) -> SketchResult<()> {
        self.handle_event(ToolEvent::Press(SurfacePoint::new(x, y)))
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) -> SketchResult<()> {
        self.handle_event(ToolEvent::Move(SurfacePoint::new(x, y)))
    }

    pub fn pointer_release(&mut self) -> SketchResult<()> {
        self.handle_event(ToolEvent::Release)
    }

    pub fn pointer_leave(&mut self) -> SketchResult<()> {
        self.handle_event(ToolEvent::Leave)
    }

    /// Enters text placement mode; the next press places `content`.
    pub fn request_text(&mut self, content: &str) -> SketchResult<()> {
        self.handle_event(ToolEvent::RequestText {
            content: content.to_string(),
            font_size: self.options.font_size(),
        })
    }

    pub fn cancel_text(&mut self) -> SketchResult<()> {
        self.handle_event(ToolEvent::CancelText)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_status(&self) -> HistoryStatus {
        self.history.status()
    }

    pub fn undo(&mut self) -> bool {
        let step = self.history.undo();
        self.apply_step(step)
    }

    pub fn redo(&mut self) -> bool {
        let step = self.history.redo();
        self.apply_step(step)
    }

    /// Blanks the surface as an undoable commit.
    pub fn clear(&mut self) {
        self.surface.clear();
        self.commit("clear");
    }

    /// Ends any stroke in progress before the buffer is replaced.
    pub fn resize(&mut self, width: u32, height: u32) -> ResizeOutcome {
        if self.tools.state().is_drawing() {
            if let Err(err) = self.handle_event(ToolEvent::Leave) {
                tracing::warn!(%err, "could not end stroke before resize");
            }
        }

        let outcome = self
            .resize
            .apply(&mut self.surface, &mut self.history, width, height);
        self.notify();
        outcome
    }

    pub fn encode_to_image_bytes(&self) -> SketchResult<Vec<u8>> {
        Ok(self.surface.encode_png()?)
    }

    pub fn import_bytes(&mut self, bytes: &[u8]) -> SketchResult<ImportOutcome> {
        let ticket = self.imports.begin();
        let result = import::decode(bytes);
        self.finish_import(ImportCompletion { ticket, result })
    }

    pub fn import_file(&mut self, path: &Path) -> SketchResult<ImportOutcome> {
        let ticket = self.imports.begin();
        let result = import::read(path).and_then(|bytes| import::decode(&bytes));
        self.finish_import(ImportCompletion { ticket, result })
    }

    /// Starts a background decode; superseded by any later import request.
    pub fn begin_import(&mut self, source: ImportSource) -> ImportTask {
        let task = self.imports.spawn(source);
        tracing::info!(request = task.ticket().id(), "import started");
        task
    }

    pub fn cancel_import(&mut self, task: &ImportTask) {
        task.cancel();
        self.imports.cancel(task.ticket());
    }

    /// Applies a finished decode if it answers the most recent request.
    pub fn finish_import(&mut self, completion: ImportCompletion) -> SketchResult<ImportOutcome> {
        let ticket = completion.ticket;
        if !self.imports.settle(ticket) {
            tracing::warn!(request = ticket.id(), "discarding stale import result");
            return Ok(ImportOutcome::Stale);
        }

        let image = completion.result.inspect_err(|err| {
            tracing::warn!(request = ticket.id(), %err, "import failed");
        })?;

        self.surface.blit_image(&image);
        self.commit("import");
        tracing::info!(
            request = ticket.id(),
            width = image.width(),
            height = image.height(),
            "import applied"
        );
        Ok(ImportOutcome::Applied {
            width: image.width(),
            height: image.height(),
        })
    }

    fn apply_effect(&mut self, effect: ToolEffect) -> SketchResult<()> {
        match effect {
            ToolEffect::None => {}
            ToolEffect::Segment { from, to } => {
                self.surface.draw_segment(from, to, self.options.brush());
            }
            ToolEffect::CommitStroke => self.commit("stroke"),
            ToolEffect::PlaceText {
                content,
                font_size,
                anchor,
            } => {
                let spec = self.options.text_spec(content, font_size, anchor);
                self.surface.draw_text(&spec)?;
                self.commit("text");
            }
        }
        Ok(())
    }

    /// Text placement and text requests fail early without a rasterizer.
    fn needs_font(&self, event: &ToolEvent) -> bool {
        match event {
            ToolEvent::RequestText { .. } => true,
            ToolEvent::Press(_) => self.tools.state().pending_text().is_some(),
            _ => false,
        }
    }

    fn apply_step(&mut self, step: HistoryStep) -> bool {
        match step {
            HistoryStep::Restore(snapshot) => self.surface.restore(&snapshot),
            HistoryStep::Clear => self.surface.clear(),
            HistoryStep::Unchanged => return false,
        }
        self.notify();
        true
    }

    fn commit(&mut self, kind: &'static str) {
        self.history.push(self.surface.snapshot());
        tracing::debug!(kind, pointer = ?self.history.pointer(), "mutation committed");
        self.notify();
    }

    fn notify(&mut self) {
        let status = self.history.status();
        for observer in &mut self.observers {
            observer(&status);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use image::Rgba;

    use super::*;
    use crate::error::{ErrorKind, SketchError};
    use crate::import::test_support::solid_png;
    use crate::surface::test_support::BlockRasterizer;
    use crate::surface::Snapshot;

    const BLANK: Rgba<u8> = Rgba([0, 0, 0, 0]);

    fn session() -> DrawingSession {
        DrawingSession::new(100, 100).with_rasterizer(Arc::new(BlockRasterizer))
    }

    fn horizontal_stroke(session: &mut DrawingSession, y: f32) {
        session.pointer_press(10.0, y).expect("press");
        session.pointer_move(50.0, y).expect("move");
        session.pointer_move(90.0, y).expect("move");
        session.pointer_release().expect("release");
    }

    fn inked(session: &DrawingSession, x: u32, y: u32) -> bool {
        session
            .surface()
            .pixel(x, y)
            .is_some_and(|pixel| pixel.0[3] > 0)
    }

    #[test]
    fn branch_scenario_keeps_a_and_c_but_never_b() {
        let mut session = session();
        assert_eq!(session.history().pointer(), None);
        assert!(session.surface().is_blank());

        horizontal_stroke(&mut session, 20.0);
        assert_eq!(session.history().pointer(), Some(0));
        horizontal_stroke(&mut session, 50.0);
        assert_eq!(session.history().pointer(), Some(1));

        assert!(session.undo());
        assert_eq!(session.history().pointer(), Some(0));
        assert!(inked(&session, 50, 20));
        assert!(!inked(&session, 50, 50));

        horizontal_stroke(&mut session, 80.0);
        assert_eq!(session.history().pointer(), Some(1));
        assert_eq!(session.history().len(), 2);

        assert!(!session.redo());
        assert_eq!(session.history().pointer(), Some(1));

        assert!(inked(&session, 50, 20), "A is visible");
        assert!(!inked(&session, 50, 50), "B was discarded");
        assert!(inked(&session, 50, 80), "C is visible");
    }

    #[test]
    fn n_undos_then_n_redos_restore_identical_pixels() {
        let mut session = session();
        session.resize(100, 100);
        let ys = [10.0, 30.0, 45.0, 60.0, 75.0, 90.0];
        for (index, y) in ys.iter().enumerate() {
            session.set_color(Color::new(40 * index as u8, 0, 200));
            session.set_stroke_width(2 + index as u8);
            horizontal_stroke(&mut session, *y);
        }
        let after_last = session.surface().snapshot();

        for _ in 0..ys.len() {
            assert!(session.undo());
        }
        for _ in 0..ys.len() {
            assert!(session.redo());
        }
        assert_eq!(session.surface().snapshot(), after_last);
        assert!(!session.redo());
    }

    #[test]
    fn undo_past_first_commit_clears_and_redo_brings_it_back() {
        let mut session = session();
        horizontal_stroke(&mut session, 40.0);
        let drawn = session.surface().snapshot();

        assert!(session.undo());
        assert!(session.surface().is_blank());
        assert!(!session.can_undo());
        assert!(session.can_redo());
        assert!(!session.undo());

        assert!(session.redo());
        assert_eq!(session.surface().snapshot(), drawn);
    }

    #[test]
    fn press_and_release_without_movement_commits_nothing() {
        let mut session = session();
        session.pointer_press(5.0, 5.0).expect("press");
        session.pointer_release().expect("release");
        assert!(session.history().is_empty());
        assert!(session.surface().is_blank());
    }

    #[test]
    fn leaving_the_surface_mid_stroke_commits_it() {
        let mut session = session();
        session.pointer_press(10.0, 10.0).expect("press");
        session.pointer_move(40.0, 10.0).expect("move");
        session.pointer_leave().expect("leave");

        assert_eq!(session.history().pointer(), Some(0));
        assert!(inked(&session, 25, 10));
        assert!(session.tool_state().is_idle());
    }

    #[test]
    fn later_color_changes_do_not_alter_past_strokes() {
        let mut session = session();
        session.set_color(Color::new(255, 0, 0));
        horizontal_stroke(&mut session, 20.0);
        session.set_color(Color::new(0, 255, 0));
        horizontal_stroke(&mut session, 60.0);

        assert_eq!(session.surface().pixel(50, 20), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(session.surface().pixel(50, 60), Some(Rgba([0, 255, 0, 255])));
    }

    #[test]
    fn empty_text_request_is_rejected_without_state_or_history_change() {
        let mut session = session();
        horizontal_stroke(&mut session, 20.0);
        let status = session.history_status();

        let err = session
            .request_text("   ")
            .expect_err("whitespace-only text must be rejected");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(matches!(err, SketchError::Tool(_)));
        assert!(session.tool_state().is_idle());
        assert_eq!(session.history_status(), status);
        assert_eq!(session.pointer_affordance(), PointerAffordance::Default);
    }

    #[test]
    fn text_placement_draws_on_next_press_and_commits() {
        let mut session = session();
        session.set_color(Color::new(0, 0, 255));
        session.set_font_size(10);
        session.request_text("hi").expect("non-empty text");
        assert_eq!(session.pointer_affordance(), PointerAffordance::TextPlacement);
        assert!(session.history().is_empty());

        session.pointer_press(20.0, 40.0).expect("placement press");
        assert!(session.tool_state().is_idle());
        assert_eq!(session.pointer_affordance(), PointerAffordance::Default);
        assert_eq!(session.history().pointer(), Some(0));
        assert_eq!(session.surface().pixel(20, 39), Some(Rgba([0, 0, 255, 255])));
        assert_eq!(session.surface().pixel(20, 40), Some(BLANK));

        session.pointer_move(60.0, 60.0).expect("move after placement");
        session.pointer_release().expect("release after placement");
        assert_eq!(session.history().len(), 1, "placement press does not start a stroke");
    }

    #[test]
    fn text_request_without_font_is_refused_before_entering_text_mode() {
        let mut session = DrawingSession::new(50, 50);
        let err = session.request_text("hello").expect_err("no font configured");
        assert!(matches!(
            err,
            SketchError::Surface(SurfaceError::FontUnavailable)
        ));
        assert!(session.tool_state().is_idle());

        let err = session.request_text("").expect_err("validation runs first");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn cancel_text_leaves_text_mode_without_drawing() {
        let mut session = session();
        session.request_text("note").expect("non-empty text");
        session.cancel_text().expect("cancel");
        assert_eq!(session.tool_state().pending_text(), None);

        session.pointer_press(10.0, 10.0).expect("press");
        assert!(session.tool_state().is_drawing());
        assert!(session.surface().is_blank());
    }

    #[test]
    fn first_resize_seeds_blank_entry_so_undo_degenerates_to_clear() {
        let mut session = session();
        assert_eq!(session.resize(100, 100), ResizeOutcome::InitialSnapshot);
        assert_eq!(session.history().pointer(), Some(0));

        horizontal_stroke(&mut session, 50.0);
        assert!(session.undo());
        assert!(session.surface().is_blank());
        assert_eq!(session.history().pointer(), Some(0));
        assert!(session.undo());
        assert_eq!(session.history().pointer(), None);
        assert!(session.surface().is_blank());
    }

    #[test]
    fn resize_then_undo_restores_fitted_pre_resize_content() {
        let mut session = session();
        session.resize(100, 100);
        horizontal_stroke(&mut session, 30.0);
        let first = session.surface().snapshot();
        horizontal_stroke(&mut session, 70.0);

        session.resize(200, 100);
        assert_eq!((session.surface().width(), session.surface().height()), (200, 100));
        assert!(inked(&session, 100, 70));

        assert!(session.undo());
        let mut expected = PixelSurface::new(200, 100);
        expected.restore(&first);
        assert_eq!(session.surface().snapshot(), expected.snapshot());
        assert!(inked(&session, 100, 30));
        assert!(!inked(&session, 100, 70));
        assert!(!inked(&session, 20, 30), "left margin stays blank");
    }

    #[test]
    fn strokes_after_resize_use_round_caps() {
        let mut session = session();
        session.resize(60, 60);
        assert_eq!(session.surface().stroke_style(), StrokeStyle::ROUND);
    }

    #[test]
    fn import_400x200_into_100x100_is_centered_with_25px_margin() {
        let mut session = session();
        let outcome = session
            .import_bytes(&solid_png(400, 200, [7, 7, 7, 255]))
            .expect("valid png imports");
        assert_eq!(
            outcome,
            ImportOutcome::Applied {
                width: 400,
                height: 200
            }
        );
        assert_eq!(session.history().pointer(), Some(0));

        let surface = session.surface();
        assert_eq!(surface.pixel(50, 24), Some(BLANK));
        assert_eq!(surface.pixel(50, 25), Some(Rgba([7, 7, 7, 255])));
        assert_eq!(surface.pixel(0, 74), Some(Rgba([7, 7, 7, 255])));
        assert_eq!(surface.pixel(99, 74), Some(Rgba([7, 7, 7, 255])));
        assert_eq!(surface.pixel(50, 75), Some(BLANK));
    }

    #[test]
    fn failed_imports_leave_surface_and_history_untouched() {
        let mut session = session();
        horizontal_stroke(&mut session, 50.0);
        let before = session.surface().snapshot();
        let status = session.history_status();

        let decode = session
            .import_bytes(b"not an image at all")
            .expect_err("garbage bytes fail");
        assert_eq!(decode.kind(), ErrorKind::Decode);

        let read = session
            .import_file(Path::new("/nonexistent/sketchpad/picture.png"))
            .expect_err("missing file fails");
        assert_eq!(read.kind(), ErrorKind::Read);
        assert_ne!(decode.user_message(), read.user_message());

        assert_eq!(session.surface().snapshot(), before);
        assert_eq!(session.history_status(), status);
    }

    #[test]
    fn import_is_undoable_like_any_commit() {
        let mut session = session();
        horizontal_stroke(&mut session, 50.0);
        let stroked = session.surface().snapshot();
        session
            .import_bytes(&solid_png(10, 10, [1, 1, 1, 255]))
            .expect("valid png imports");

        assert!(session.undo());
        assert_eq!(session.surface().snapshot(), stroked);
    }

    #[test]
    fn only_the_latest_background_import_is_applied() {
        let mut session = session();
        let older = session.begin_import(ImportSource::Bytes(solid_png(4, 4, [255, 0, 0, 255])));
        let newer = session.begin_import(ImportSource::Bytes(solid_png(4, 4, [0, 0, 255, 255])));

        let newer_done = newer.wait();
        let older_done = older.wait();

        assert_eq!(
            session.finish_import(newer_done).expect("newest import applies"),
            ImportOutcome::Applied {
                width: 4,
                height: 4
            }
        );
        assert_eq!(
            session.finish_import(older_done).expect("stale import is not an error"),
            ImportOutcome::Stale
        );
        assert_eq!(session.surface().pixel(50, 50), Some(Rgba([0, 0, 255, 255])));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn stale_result_arriving_first_is_discarded() {
        let mut session = session();
        let older = session.begin_import(ImportSource::Bytes(solid_png(4, 4, [255, 0, 0, 255])));
        let newer = session.begin_import(ImportSource::Bytes(solid_png(4, 4, [0, 255, 0, 255])));

        assert_eq!(
            session.finish_import(older.wait()).expect("stale is ok"),
            ImportOutcome::Stale
        );
        assert!(session.surface().is_blank());
        assert!(session.history().is_empty());

        session.finish_import(newer.wait()).expect("latest applies");
        assert_eq!(session.surface().pixel(50, 50), Some(Rgba([0, 255, 0, 255])));
    }

    #[test]
    fn cancelled_import_is_never_applied() {
        let mut session = session();
        let task = session.begin_import(ImportSource::Bytes(solid_png(4, 4, [9, 9, 9, 255])));
        session.cancel_import(&task);

        let outcome = session
            .finish_import(task.wait())
            .expect("cancelled request resolves as stale");
        assert_eq!(outcome, ImportOutcome::Stale);
        assert!(session.surface().is_blank());
        assert!(session.history().is_empty());
    }

    #[test]
    fn exported_png_reimports_to_identical_pixels() {
        let mut session = session();
        session.set_color(Color::new(12, 200, 99));
        horizontal_stroke(&mut session, 33.0);
        let drawn = session.surface().snapshot();
        let bytes = session.encode_to_image_bytes().expect("export succeeds");

        session.clear();
        assert!(session.surface().is_blank());

        session.import_bytes(&bytes).expect("exported png reimports");
        assert_eq!(session.surface().snapshot(), drawn);
    }

    #[test]
    fn clear_is_a_separate_undoable_commit() {
        let mut session = session();
        horizontal_stroke(&mut session, 50.0);
        let drawn = session.surface().snapshot();

        session.clear();
        assert!(session.surface().is_blank());
        assert_eq!(session.history().pointer(), Some(1));

        assert!(session.undo());
        assert_eq!(session.surface().snapshot(), drawn);
    }

    #[test]
    fn observers_see_every_history_change() {
        let mut session = session();
        let seen: Rc<RefCell<Vec<HistoryStatus>>> = Rc::default();
        let sink = Rc::clone(&seen);
        session.subscribe(Box::new(move |status| sink.borrow_mut().push(*status)));

        horizontal_stroke(&mut session, 20.0);
        session.undo();
        session.undo();
        session.redo();

        let seen = seen.borrow();
        let pointers: Vec<_> = seen.iter().map(|status| status.pointer).collect();
        assert_eq!(pointers, vec![Some(0), None, Some(0)]);
        assert!(!seen[1].can_undo);
        assert!(seen[1].can_redo);
    }

    #[test]
    fn from_config_applies_brush_capacity_and_missing_font_fallback() {
        let config = SketchConfig {
            surface_width: 64,
            surface_height: 32,
            brush_color: [10, 20, 30],
            stroke_width: 6,
            history_capacity: std::num::NonZeroUsize::new(2),
            font_path: Some("/nonexistent/sketchpad/font.ttf".into()),
            ..SketchConfig::default()
        };
        let mut session = DrawingSession::from_config(&config);

        assert_eq!((session.surface().width(), session.surface().height()), (64, 32));
        assert_eq!(session.options().color(), Color::new(10, 20, 30));
        assert_eq!(session.options().stroke_width(), 6);
        assert!(!session.surface().has_rasterizer());

        for y in [5.0, 15.0, 25.0] {
            session.pointer_press(2.0, y).expect("press");
            session.pointer_move(60.0, y).expect("move");
            session.pointer_release().expect("release");
        }
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history().pointer(), Some(1));
        assert!(session.history().get(0).is_some_and(|entry| entry != &Snapshot::blank(64, 32)));
    }

    #[test]
    fn resize_mid_stroke_keeps_the_ink_drawn_so_far() {
        let mut session = session();
        session.pointer_press(10.0, 10.0).expect("press");
        session.pointer_move(90.0, 10.0).expect("move");

        session.resize(100, 100);
        assert!(session.tool_state().is_idle(), "resize ends the stroke");
        assert_eq!(session.history().pointer(), Some(0));
        assert!(inked(&session, 50, 10), "ink survives the resize");

        session.pointer_move(90.0, 90.0).expect("move after resize");
        session.pointer_release().expect("release after resize");
        assert_eq!(session.history().len(), 1);

        let committed = session.history().current().expect("stroke was committed");
        assert!(committed.pixels().get_pixel(50, 10).0[3] > 0);
        assert!(session.undo());
        assert!(session.surface().is_blank());
    }

    #[test]
    fn placement_press_without_font_keeps_pending_text() {
        let mut session = session();
        session.request_text("keep me").expect("non-empty text");
        session.set_rasterizer(None);

        let err = session
            .pointer_press(20.0, 40.0)
            .expect_err("font was removed");
        assert!(matches!(
            err,
            SketchError::Surface(SurfaceError::FontUnavailable)
        ));
        assert_eq!(session.tool_state().pending_text(), Some("keep me"));
        assert_eq!(session.pointer_affordance(), PointerAffordance::TextPlacement);
        assert!(session.history().is_empty());

        session.set_rasterizer(Some(Arc::new(BlockRasterizer)));
        session.pointer_press(20.0, 40.0).expect("font is back");
        assert!(session.tool_state().is_idle());
        assert_eq!(session.history().pointer(), Some(0));
        assert!(inked(&session, 20, 39));
    }

    #[test]
    fn import_file_fits_and_centers_the_image() {
        let dir = std::env::temp_dir().join(format!("sketchpad-import-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        let path = dir.join("wide.png");
        std::fs::write(&path, solid_png(400, 200, [3, 60, 90, 255])).expect("png should be writable");

        let mut session = session();
        let outcome = session.import_file(&path).expect("file imports");
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(
            outcome,
            ImportOutcome::Applied {
                width: 400,
                height: 200
            }
        );
        assert_eq!(session.surface().pixel(50, 24), Some(BLANK));
        assert_eq!(session.surface().pixel(50, 25), Some(Rgba([3, 60, 90, 255])));
        assert_eq!(session.surface().pixel(50, 74), Some(Rgba([3, 60, 90, 255])));
        assert_eq!(session.surface().pixel(50, 75), Some(BLANK));
        assert_eq!(session.history().pointer(), Some(0));
    }

    #[test]
    fn polled_background_import_is_applied_once_ready() {
        let mut session = session();
        let task = session.begin_import(ImportSource::Bytes(solid_png(8, 8, [70, 0, 70, 255])));

        let mut completion = None;
        for _ in 0..500 {
            completion = task.try_complete();
            if completion.is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        let completion = completion.expect("worker should finish within five seconds");
        assert_eq!(completion.ticket, task.ticket());

        assert_eq!(
            session.finish_import(completion).expect("latest import applies"),
            ImportOutcome::Applied {
                width: 8,
                height: 8
            }
        );
        assert_eq!(session.surface().pixel(50, 50), Some(Rgba([70, 0, 70, 255])));
        assert_eq!(session.history().len(), 1);
    }
}
