//! Per-surface frame state, host input handling, and the frame scheduler.
//!
//! One [`Surface`] exists per window. It owns the scheduling phase, pointer
//! state, input focus, registered chrome widgets, and the listener dispatch
//! table: window-scoped mutable state with an explicit lifecycle, not a
//! process-wide singleton.

mod events;
mod widgets;

pub use events::DispatchTable;
pub use events::EventKind;
pub use events::InputEvent;
pub use events::Key;
pub use events::PointerButton;
pub use widgets::ButtonId;
pub use widgets::InputId;

use crate::widgets::ButtonWidget;
use crate::widgets::InputWidget;
use core::fmt;
use flint_core::EngineResult;
use flint_dom::Document;
use flint_dom::NodeId;
use flint_dom::RenderBox;
use flint_layout::LayoutPass;
use flint_layout::Viewport;
use flint_paint::PaintPass;
use flint_paint::PixelBuffer;
use log::debug;
use std::time::Instant;

const WHEEL_SCROLL_STEP: f64 = 24.0;
const ARROW_SCROLL_STEP: f64 = 40.0;

/// Frame scheduling phase. The first frame always lays out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    Idle,
    ReflowPending,
}

/// Cursor shape the host window should display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorShape {
    Arrow,
    Pointer,
}

/// How the host should wait for input before the next tick.
///
/// After a reflow-driven frame nothing further is expected, so the host may
/// block on the next event; after repaint-only or idle frames it polls so
/// widget updates keep progressing. This is a performance policy, not a
/// correctness requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollMode {
    WaitEvents,
    PollEvents,
}

/// What one scheduler tick actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOutcome {
    pub laid_out: bool,
    pub painted: bool,
    pub presented: bool,
    pub poll: PollMode,
}

/// The GPU presentation collaborator.
///
/// Each presenting frame uploads the entire buffer as a texture sized to the
/// surface and then draws a full-surface quad. Failures are fatal to the
/// window; the scheduler propagates them without recovery.
pub trait PresentBackend {
    fn upload_pixels(&mut self, width: u32, height: u32, pixels: &[u8]) -> EngineResult<()>;
    fn present(&mut self) -> EngineResult<()>;
}

/// Window-scoped frame state and scheduler.
pub struct Surface {
    phase: FramePhase,
    width: u32,
    height: u32,
    pointer_x: f64,
    pointer_y: f64,
    cursor: CursorShape,
    poll: PollMode,
    buttons: Vec<ButtonWidget>,
    inputs: Vec<InputWidget>,
    active_input: Option<usize>,
    hovered_button: Option<usize>,
    listeners: DispatchTable,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            phase: FramePhase::ReflowPending,
            width,
            height,
            pointer_x: 0.0,
            pointer_y: 0.0,
            cursor: CursorShape::Arrow,
            poll: PollMode::PollEvents,
            buttons: Vec::new(),
            inputs: Vec::new(),
            active_input: None,
            hovered_button: None,
            listeners: DispatchTable::new(),
        }
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pointer_position(&self) -> (f64, f64) {
        (self.pointer_x, self.pointer_y)
    }

    pub fn cursor_shape(&self) -> CursorShape {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: CursorShape) {
        self.cursor = cursor;
    }

    pub fn poll_mode(&self) -> PollMode {
        self.poll
    }

    /// Schedules a full relayout on the next tick. Resizes, structural
    /// document mutations, and explicit requests all funnel through here.
    pub fn request_reflow(&mut self) {
        self.phase = FramePhase::ReflowPending;
    }

    /// Appends a listener to the dispatch table for `kind`.
    pub fn attach_listener(&mut self, kind: EventKind, handler: impl FnMut(&InputEvent) + 'static) {
        self.listeners.attach(kind, handler);
    }

    /// Registers a chrome button with its click callback.
    pub fn register_button(
        &mut self,
        bounds: RenderBox,
        label: impl Into<String>,
        on_click: impl FnMut() + 'static,
    ) -> ButtonId {
        self.buttons.push(ButtonWidget {
            bounds,
            label: label.into(),
            needs_repaint: true,
            on_click: Box::new(on_click),
        });
        ButtonId(self.buttons.len() - 1)
    }

    /// Registers a chrome text input.
    pub fn register_input(&mut self, bounds: RenderBox) -> InputId {
        let mut widget = InputWidget::new(bounds);
        widget.needs_repaint = true;
        self.inputs.push(widget);
        InputId(self.inputs.len() - 1)
    }

    pub fn input_value(&self, id: InputId) -> Option<&str> {
        self.inputs.get(id.0).map(|input| input.value.as_str())
    }

    pub fn set_input_value(&mut self, id: InputId, value: impl Into<String>) {
        if let Some(input) = self.inputs.get_mut(id.0) {
            input.set_value(value);
        }
    }

    pub fn focus_input(&mut self, id: InputId) {
        self.focus_input_index(Some(id.0));
    }

    pub fn focused_input(&self) -> Option<InputId> {
        self.active_input.map(InputId)
    }

    pub fn button_label(&self, id: ButtonId) -> Option<&str> {
        self.buttons.get(id.0).map(|button| button.label.as_str())
    }

    // --- host event handlers ---

    pub fn on_resize(&mut self, width: u32, height: u32) {
        if (self.width, self.height) == (width, height) {
            return;
        }
        debug!("surface resized to {width}x{height}");
        self.width = width;
        self.height = height;
        self.request_reflow();
    }

    /// Updates pointer state, refreshes hover/cursor feedback, and notifies
    /// pointer-move listeners.
    pub fn on_pointer_move(&mut self, x: f64, y: f64, document: Option<&Document>) {
        self.pointer_x = x;
        self.pointer_y = y;

        let hovered = self
            .buttons
            .iter()
            .position(|button| button.bounds.contains(x, y));
        if hovered != self.hovered_button {
            if let Some(previous) = self.hovered_button {
                if let Some(button) = self.buttons.get_mut(previous) {
                    button.needs_repaint = true;
                }
            }
            if let Some(current) = hovered {
                if let Some(button) = self.buttons.get_mut(current) {
                    button.needs_repaint = true;
                }
            }
            self.hovered_button = hovered;
        }

        let over_link = document
            .and_then(|doc| doc.hit_test(x, y).map(|node| (doc, node)))
            .is_some_and(|(doc, node)| is_link_target(doc, node));
        self.cursor = if over_link || hovered.is_some() {
            CursorShape::Pointer
        } else {
            CursorShape::Arrow
        };

        self.listeners
            .dispatch(&InputEvent::PointerMove { x, y });
    }

    /// Routes a pointer click. Chrome widgets get first claim; otherwise the
    /// document is hit-tested and click listeners run with the resolved
    /// target. A miss dismisses input focus rather than erroring.
    ///
    /// Returns the document node the click landed on, if any.
    pub fn on_click(
        &mut self,
        button: PointerButton,
        pressed: bool,
        document: Option<&Document>,
    ) -> Option<NodeId> {
        if button != PointerButton::Primary || pressed {
            return None;
        }

        let (x, y) = (self.pointer_x, self.pointer_y);

        if let Some(index) = self
            .inputs
            .iter()
            .position(|input| input.bounds.contains(x, y))
        {
            self.focus_input_index(Some(index));
            return None;
        }

        if let Some(index) = self
            .buttons
            .iter()
            .position(|candidate| candidate.bounds.contains(x, y))
        {
            if let Some(widget) = self.buttons.get_mut(index) {
                widget.needs_repaint = true;
                (widget.on_click)();
            }
            return None;
        }

        let target = document.and_then(|doc| doc.hit_test(x, y));
        if target.is_none() {
            self.focus_input_index(None);
        }

        self.listeners.dispatch(&InputEvent::Click { x, y, target });
        target
    }

    /// Scrolls the document (coarse whole-document repaint) and notifies
    /// scroll listeners.
    pub fn on_scroll(&mut self, dx: f64, dy: f64, document: Option<&mut Document>) {
        if let Some(doc) = document {
            doc.scroll_y = (doc.scroll_y - dy * WHEEL_SCROLL_STEP).max(0.0);
            doc.request_repaint();
        }
        self.listeners.dispatch(&InputEvent::Scroll { dx, dy });
    }

    /// Handles keyboard input: text editing on the focused input, Escape to
    /// blur, Enter to submit, arrows to move the caret or scroll.
    pub fn on_key(&mut self, key: Key, document: Option<&mut Document>) {
        match key {
            Key::Char(character) => {
                if let Some(input) = self.active_input_mut() {
                    input.insert_char(character);
                }
            }
            Key::Backspace => {
                if let Some(input) = self.active_input_mut() {
                    input.delete_before_cursor();
                }
            }
            Key::Left => {
                if let Some(input) = self.active_input_mut() {
                    input.move_cursor_left();
                }
            }
            Key::Right => {
                if let Some(input) = self.active_input_mut() {
                    input.move_cursor_right();
                }
            }
            Key::Escape => self.focus_input_index(None),
            Key::Enter => {
                let value = self
                    .active_input
                    .and_then(|index| self.inputs.get(index))
                    .map(|input| input.value.clone());
                if let Some(value) = value {
                    self.listeners.dispatch(&InputEvent::Submit { value });
                }
            }
            Key::Up => self.scroll_by_arrow(-ARROW_SCROLL_STEP, document),
            Key::Down => self.scroll_by_arrow(ARROW_SCROLL_STEP, document),
        }
    }

    /// Runs one frame: layout if a reflow is pending, then paint/present if
    /// anything needs pixels, then pick the input wait mode.
    ///
    /// Within a tick the ordering is invariant: layout completes before
    /// paint, and paint completes before presentation. A missing document is
    /// not an error; a cleared buffer is presented instead. Backend failures
    /// are fatal and propagate to the caller.
    pub fn tick(
        &mut self,
        mut document: Option<&mut Document>,
        layout: &mut dyn LayoutPass,
        paint: &mut dyn PaintPass,
        backend: &mut dyn PresentBackend,
    ) -> EngineResult<FrameOutcome> {
        let reflow = self.phase == FramePhase::ReflowPending;
        let mut laid_out = false;

        if reflow {
            if let Some(doc) = document.as_deref_mut() {
                let viewport = Viewport {
                    width: f64::from(self.width),
                    height: f64::from(self.height),
                };
                let started = Instant::now();
                layout.layout(doc, viewport);
                if doc.debug {
                    doc.profiler.record("layout", started.elapsed());
                }
                doc.clear_reflow();
                laid_out = true;
            }
            self.phase = FramePhase::Idle;
            debug!("tick: reflow frame ({}x{})", self.width, self.height);
        }

        let widgets_dirty = self.buttons.iter().any(|button| button.needs_repaint)
            || self.inputs.iter().any(|input| input.needs_repaint);
        let document_dirty = document.as_deref().is_some_and(Document::needs_repaint);

        let mut painted = false;
        if reflow || widgets_dirty || document_dirty {
            let mut buffer = match document.as_deref_mut() {
                Some(doc) => {
                    let started = Instant::now();
                    let buffer = paint.paint(doc, self.width, self.height);
                    if doc.debug {
                        doc.profiler.record("paint", started.elapsed());
                    }
                    doc.clear_repaint();
                    buffer
                }
                None => PixelBuffer::cleared(self.width, self.height),
            };
            self.paint_widgets(&mut buffer);

            backend.upload_pixels(buffer.width, buffer.height, &buffer.pixels)?;
            backend.present()?;

            for button in &mut self.buttons {
                button.needs_repaint = false;
            }
            for input in &mut self.inputs {
                input.needs_repaint = false;
            }
            painted = true;
        }

        self.poll = if reflow {
            PollMode::WaitEvents
        } else {
            PollMode::PollEvents
        };

        Ok(FrameOutcome {
            laid_out,
            painted,
            presented: painted,
            poll: self.poll,
        })
    }

    /// Draws the chrome widgets over the painted document. Widgets are
    /// surface-owned, so the document paint pass never sees them.
    fn paint_widgets(&self, buffer: &mut PixelBuffer) {
        for (index, button) in self.buttons.iter().enumerate() {
            let bounds = button.bounds;
            let fill = if self.hovered_button == Some(index) {
                [208, 208, 208, 255]
            } else {
                [226, 226, 226, 255]
            };
            buffer.fill_rect(bounds.left, bounds.top, bounds.right(), bounds.bottom(), fill);
            buffer.stroke_rect(
                bounds.left,
                bounds.top,
                bounds.right(),
                bounds.bottom(),
                [128, 128, 128, 255],
            );
        }

        for input in &self.inputs {
            let bounds = input.bounds;
            buffer.fill_rect(
                bounds.left,
                bounds.top,
                bounds.right(),
                bounds.bottom(),
                [255, 255, 255, 255],
            );
            let border = if input.active {
                [66, 133, 244, 255]
            } else {
                [150, 150, 150, 255]
            };
            buffer.stroke_rect(bounds.left, bounds.top, bounds.right(), bounds.bottom(), border);
        }
    }

    fn scroll_by_arrow(&mut self, delta: f64, document: Option<&mut Document>) {
        if self.active_input.is_some() {
            return;
        }
        if let Some(doc) = document {
            doc.scroll_y = (doc.scroll_y + delta).max(0.0);
            doc.request_repaint();
        }
    }

    fn active_input_mut(&mut self) -> Option<&mut InputWidget> {
        let index = self.active_input?;
        self.inputs.get_mut(index)
    }

    fn focus_input_index(&mut self, index: Option<usize>) {
        if self.active_input == index {
            return;
        }

        if let Some(previous) = self.active_input {
            if let Some(input) = self.inputs.get_mut(previous) {
                input.active = false;
                input.needs_repaint = true;
            }
        }
        if let Some(current) = index {
            if let Some(input) = self.inputs.get_mut(current) {
                input.active = true;
                input.needs_repaint = true;
            }
        }
        self.active_input = index;
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("phase", &self.phase)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("buttons", &self.buttons.len())
            .field("inputs", &self.inputs.len())
            .field("active_input", &self.active_input)
            .finish_non_exhaustive()
    }
}

/// True when the node or one of its ancestors carries an `href` attribute.
fn is_link_target(document: &Document, node: NodeId) -> bool {
    let tree = document.tree();
    let mut current = Some(node);
    while let Some(id) = current {
        if tree.attribute(id, "href").is_some() {
            return true;
        }
        current = tree.parent(id);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::CursorShape;
    use super::EventKind;
    use super::FramePhase;
    use super::FrameOutcome;
    use super::InputEvent;
    use super::Key;
    use super::PointerButton;
    use super::PollMode;
    use super::PresentBackend;
    use super::Surface;
    use flint_core::EngineError;
    use flint_core::EngineResult;
    use flint_dom::Document;
    use flint_dom::RenderBox;
    use flint_layout::LayoutPass;
    use flint_layout::Viewport;
    use flint_paint::PaintPass;
    use flint_paint::Painter;
    use flint_paint::PixelBuffer;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct CountingLayout {
        calls: usize,
    }

    impl LayoutPass for CountingLayout {
        fn layout(&mut self, document: &mut Document, viewport: Viewport) {
            self.calls += 1;
            if let Some(root) = document.root() {
                document.tree_mut().set_render_box(
                    root,
                    Some(RenderBox {
                        width: viewport.width,
                        height: viewport.height,
                        ..RenderBox::default()
                    }),
                );
            }
        }
    }

    #[derive(Default)]
    struct CountingPaint {
        calls: usize,
    }

    impl PaintPass for CountingPaint {
        fn paint(&mut self, _document: &Document, width: u32, height: u32) -> PixelBuffer {
            self.calls += 1;
            PixelBuffer::cleared(width, height)
        }
    }

    #[derive(Default)]
    struct RecordingBackend {
        uploads: Vec<(u32, u32, usize)>,
        presents: usize,
        fail_upload: bool,
    }

    impl PresentBackend for RecordingBackend {
        fn upload_pixels(&mut self, width: u32, height: u32, pixels: &[u8]) -> EngineResult<()> {
            if self.fail_upload {
                return Err(EngineError::new(
                    "surface.texture_failed",
                    "texture creation failed",
                ));
            }
            self.uploads.push((width, height, pixels.len()));
            Ok(())
        }

        fn present(&mut self) -> EngineResult<()> {
            self.presents += 1;
            Ok(())
        }
    }

    fn simple_document() -> Document {
        let mut document = Document::new();
        let root = document.tree_mut().create("html");
        document.set_root(Some(root));
        document
    }

    fn run_tick(
        surface: &mut Surface,
        document: Option<&mut Document>,
        layout: &mut CountingLayout,
        paint: &mut CountingPaint,
        backend: &mut RecordingBackend,
    ) -> FrameOutcome {
        match surface.tick(document, layout, paint, backend) {
            Ok(outcome) => outcome,
            Err(error) => panic!("tick failed: {error}"),
        }
    }

    #[test]
    fn first_tick_lays_out_paints_and_presents_once() {
        let mut surface = Surface::new(640, 480);
        let mut document = simple_document();
        let mut layout = CountingLayout::default();
        let mut paint = CountingPaint::default();
        let mut backend = RecordingBackend::default();

        assert_eq!(surface.phase(), FramePhase::ReflowPending);
        let outcome = run_tick(
            &mut surface,
            Some(&mut document),
            &mut layout,
            &mut paint,
            &mut backend,
        );

        assert!(outcome.laid_out && outcome.painted && outcome.presented);
        assert_eq!(outcome.poll, PollMode::WaitEvents);
        assert_eq!(surface.phase(), FramePhase::Idle);
        assert_eq!(layout.calls, 1);
        assert_eq!(paint.calls, 1);
        assert_eq!(backend.presents, 1);
        assert_eq!(backend.uploads, vec![(640, 480, 640 * 480 * 4)]);
    }

    #[test]
    fn idle_tick_with_nothing_dirty_does_no_work() {
        let mut surface = Surface::new(640, 480);
        let mut document = simple_document();
        let mut layout = CountingLayout::default();
        let mut paint = CountingPaint::default();
        let mut backend = RecordingBackend::default();

        run_tick(
            &mut surface,
            Some(&mut document),
            &mut layout,
            &mut paint,
            &mut backend,
        );
        let outcome = run_tick(
            &mut surface,
            Some(&mut document),
            &mut layout,
            &mut paint,
            &mut backend,
        );

        assert!(!outcome.laid_out && !outcome.painted);
        assert_eq!(outcome.poll, PollMode::PollEvents);
        assert_eq!(layout.calls, 1);
        assert_eq!(paint.calls, 1);
        assert_eq!(backend.presents, 1);
    }

    #[test]
    fn resize_schedules_another_reflow_frame() {
        let mut surface = Surface::new(640, 480);
        let mut document = simple_document();
        let mut layout = CountingLayout::default();
        let mut paint = CountingPaint::default();
        let mut backend = RecordingBackend::default();

        run_tick(
            &mut surface,
            Some(&mut document),
            &mut layout,
            &mut paint,
            &mut backend,
        );
        surface.on_resize(800, 600);
        assert_eq!(surface.phase(), FramePhase::ReflowPending);

        let outcome = run_tick(
            &mut surface,
            Some(&mut document),
            &mut layout,
            &mut paint,
            &mut backend,
        );
        assert!(outcome.laid_out);
        assert_eq!(layout.calls, 2);
        assert_eq!(backend.uploads.last(), Some(&(800, 600, 800 * 600 * 4)));
    }

    #[test]
    fn widget_dirt_causes_repaint_without_layout() {
        let mut surface = Surface::new(320, 240);
        let mut document = simple_document();
        let mut layout = CountingLayout::default();
        let mut paint = CountingPaint::default();
        let mut backend = RecordingBackend::default();

        run_tick(
            &mut surface,
            Some(&mut document),
            &mut layout,
            &mut paint,
            &mut backend,
        );

        let input = surface.register_input(RenderBox {
            width: 100.0,
            height: 20.0,
            ..RenderBox::default()
        });
        surface.set_input_value(input, "https://example.com");

        let outcome = run_tick(
            &mut surface,
            Some(&mut document),
            &mut layout,
            &mut paint,
            &mut backend,
        );
        assert!(!outcome.laid_out && outcome.painted);
        assert_eq!(layout.calls, 1);
        assert_eq!(paint.calls, 2);
        assert_eq!(outcome.poll, PollMode::PollEvents);
    }

    #[test]
    fn scroll_causes_a_repaint_only_frame() {
        let mut surface = Surface::new(320, 240);
        let mut document = simple_document();
        let mut layout = CountingLayout::default();
        let mut paint = CountingPaint::default();
        let mut backend = RecordingBackend::default();

        run_tick(
            &mut surface,
            Some(&mut document),
            &mut layout,
            &mut paint,
            &mut backend,
        );

        document.scroll_y = 100.0;
        surface.on_scroll(0.0, 2.0, Some(&mut document));
        assert!(document.scroll_y < 100.0);
        assert!(document.needs_repaint());

        let outcome = run_tick(
            &mut surface,
            Some(&mut document),
            &mut layout,
            &mut paint,
            &mut backend,
        );
        assert!(!outcome.laid_out && outcome.painted);
        assert!(!document.needs_repaint());
    }

    #[test]
    fn missing_document_presents_a_cleared_buffer() {
        let mut surface = Surface::new(16, 8);
        let mut layout = CountingLayout::default();
        let mut paint = CountingPaint::default();
        let mut backend = RecordingBackend::default();

        let outcome = run_tick(&mut surface, None, &mut layout, &mut paint, &mut backend);
        assert!(!outcome.laid_out && outcome.presented);
        assert_eq!(layout.calls, 0);
        assert_eq!(paint.calls, 0);
        assert_eq!(backend.uploads, vec![(16, 8, 16 * 8 * 4)]);
    }

    #[test]
    fn backend_failure_is_fatal_to_the_tick() {
        let mut surface = Surface::new(32, 32);
        let mut document = simple_document();
        let mut layout = CountingLayout::default();
        let mut paint = CountingPaint::default();
        let mut backend = RecordingBackend {
            fail_upload: true,
            ..RecordingBackend::default()
        };

        let error = match surface.tick(
            Some(&mut document),
            &mut layout,
            &mut paint,
            &mut backend,
        ) {
            Ok(_) => panic!("upload failure must propagate"),
            Err(error) => error,
        };
        assert_eq!(error.code, "surface.texture_failed");
        assert_eq!(backend.presents, 0);
    }

    #[test]
    fn layout_runs_before_paint_within_one_tick() {
        struct OrderedLayout {
            trace: Rc<RefCell<Vec<&'static str>>>,
        }
        impl LayoutPass for OrderedLayout {
            fn layout(&mut self, _document: &mut Document, _viewport: Viewport) {
                self.trace.borrow_mut().push("layout");
            }
        }
        struct OrderedPaint {
            trace: Rc<RefCell<Vec<&'static str>>>,
        }
        impl PaintPass for OrderedPaint {
            fn paint(&mut self, _document: &Document, width: u32, height: u32) -> PixelBuffer {
                self.trace.borrow_mut().push("paint");
                PixelBuffer::cleared(width, height)
            }
        }

        let trace = Rc::new(RefCell::new(Vec::new()));
        let mut surface = Surface::new(8, 8);
        let mut document = simple_document();
        let mut layout = OrderedLayout {
            trace: Rc::clone(&trace),
        };
        let mut paint = OrderedPaint {
            trace: Rc::clone(&trace),
        };
        let mut backend = RecordingBackend::default();

        assert!(
            surface
                .tick(Some(&mut document), &mut layout, &mut paint, &mut backend)
                .is_ok()
        );
        assert_eq!(*trace.borrow(), vec!["layout", "paint"]);
    }

    #[test]
    fn click_focuses_input_then_typing_and_submit_work() {
        let mut surface = Surface::new(640, 480);
        let input = surface.register_input(RenderBox {
            top: 0.0,
            left: 0.0,
            width: 200.0,
            height: 24.0,
            ..RenderBox::default()
        });

        let submitted = Rc::new(RefCell::new(None::<String>));
        {
            let submitted = Rc::clone(&submitted);
            surface.attach_listener(EventKind::Submit, move |event| {
                if let InputEvent::Submit { value } = event {
                    *submitted.borrow_mut() = Some(value.clone());
                }
            });
        }

        surface.on_pointer_move(10.0, 10.0, None);
        assert!(
            surface
                .on_click(PointerButton::Primary, false, None)
                .is_none()
        );
        assert_eq!(surface.focused_input(), Some(input));

        for character in "hi".chars() {
            surface.on_key(Key::Char(character), None);
        }
        surface.on_key(Key::Enter, None);

        assert_eq!(surface.input_value(input), Some("hi"));
        assert_eq!(submitted.borrow().as_deref(), Some("hi"));
    }

    #[test]
    fn escape_blurs_the_focused_input() {
        let mut surface = Surface::new(640, 480);
        let input = surface.register_input(RenderBox {
            width: 100.0,
            height: 20.0,
            ..RenderBox::default()
        });
        surface.focus_input(input);
        assert_eq!(surface.focused_input(), Some(input));

        surface.on_key(Key::Escape, None);
        assert_eq!(surface.focused_input(), None);

        // Typing after blur goes nowhere.
        surface.on_key(Key::Char('x'), None);
        assert_eq!(surface.input_value(input), Some(""));
    }

    #[test]
    fn click_routes_to_the_topmost_document_node() {
        let mut surface = Surface::new(640, 480);
        let mut document = simple_document();
        let root = match document.root() {
            Some(root) => root,
            None => panic!("document has a root"),
        };
        document.tree_mut().set_render_box(
            root,
            Some(RenderBox {
                width: 100.0,
                height: 100.0,
                ..RenderBox::default()
            }),
        );
        let child = document.tree_mut().create("a");
        assert!(document.tree_mut().append_child(root, child).is_ok());
        document.tree_mut().set_render_box(
            child,
            Some(RenderBox {
                top: 10.0,
                left: 10.0,
                width: 50.0,
                height: 50.0,
                ..RenderBox::default()
            }),
        );

        let targets = Rc::new(RefCell::new(Vec::new()));
        {
            let targets = Rc::clone(&targets);
            surface.attach_listener(EventKind::Click, move |event| {
                if let InputEvent::Click { target, .. } = event {
                    targets.borrow_mut().push(*target);
                }
            });
        }

        surface.on_pointer_move(20.0, 20.0, Some(&document));
        let hit = surface.on_click(PointerButton::Primary, false, Some(&document));
        assert_eq!(hit, Some(child));
        assert_eq!(*targets.borrow(), vec![Some(child)]);
    }

    #[test]
    fn click_miss_dismisses_input_focus() {
        let mut surface = Surface::new(640, 480);
        let input = surface.register_input(RenderBox {
            top: 0.0,
            left: 0.0,
            width: 50.0,
            height: 20.0,
            ..RenderBox::default()
        });
        surface.focus_input(input);

        let document = simple_document();
        surface.on_pointer_move(400.0, 400.0, Some(&document));
        let hit = surface.on_click(PointerButton::Primary, false, Some(&document));

        assert_eq!(hit, None);
        assert_eq!(surface.focused_input(), None);
    }

    #[test]
    fn button_click_fires_its_callback_on_release_only() {
        let mut surface = Surface::new(640, 480);
        let clicks = Rc::new(RefCell::new(0_u32));
        {
            let clicks = Rc::clone(&clicks);
            surface.register_button(
                RenderBox {
                    width: 40.0,
                    height: 20.0,
                    ..RenderBox::default()
                },
                "Back",
                move || {
                    *clicks.borrow_mut() += 1;
                },
            );
        }

        surface.on_pointer_move(10.0, 10.0, None);
        surface.on_click(PointerButton::Primary, true, None);
        assert_eq!(*clicks.borrow(), 0);
        surface.on_click(PointerButton::Primary, false, None);
        assert_eq!(*clicks.borrow(), 1);
        surface.on_click(PointerButton::Secondary, false, None);
        assert_eq!(*clicks.borrow(), 1);
    }

    #[test]
    fn pointer_over_link_switches_cursor_to_pointer() {
        let mut surface = Surface::new(640, 480);
        let mut document = simple_document();
        let root = match document.root() {
            Some(root) => root,
            None => panic!("document has a root"),
        };
        document.tree_mut().set_render_box(
            root,
            Some(RenderBox {
                width: 200.0,
                height: 200.0,
                ..RenderBox::default()
            }),
        );
        let link = document.tree_mut().create("a");
        document.tree_mut().push_attribute(link, "href", "/next");
        assert!(document.tree_mut().append_child(root, link).is_ok());
        document.tree_mut().set_render_box(
            link,
            Some(RenderBox {
                top: 20.0,
                left: 20.0,
                width: 40.0,
                height: 10.0,
                ..RenderBox::default()
            }),
        );

        surface.on_pointer_move(30.0, 25.0, Some(&document));
        assert_eq!(surface.cursor_shape(), CursorShape::Pointer);

        surface.on_pointer_move(150.0, 150.0, Some(&document));
        assert_eq!(surface.cursor_shape(), CursorShape::Arrow);
    }

    #[test]
    fn chrome_widgets_are_drawn_over_the_buffer() {
        let mut surface = Surface::new(20, 20);
        surface.register_button(
            RenderBox {
                top: 2.0,
                left: 2.0,
                width: 8.0,
                height: 8.0,
                ..RenderBox::default()
            },
            "Go",
            || {},
        );

        let mut buffer = PixelBuffer::cleared(20, 20);
        surface.paint_widgets(&mut buffer);

        assert_ne!(buffer.pixel(5, 5), Some([255, 255, 255, 255]));
        assert_eq!(buffer.pixel(15, 15), Some([255, 255, 255, 255]));
    }

    #[test]
    fn paint_collaborator_integrates_with_the_real_painter() {
        let mut surface = Surface::new(64, 64);
        let mut document = simple_document();
        let mut layout = CountingLayout::default();
        let mut painter = Painter;
        let mut backend = RecordingBackend::default();

        let outcome = match surface.tick(
            Some(&mut document),
            &mut layout,
            &mut painter,
            &mut backend,
        ) {
            Ok(outcome) => outcome,
            Err(error) => panic!("tick failed: {error}"),
        };
        assert!(outcome.presented);
        assert_eq!(backend.uploads, vec![(64, 64, 64 * 64 * 4)]);
    }
}
