//! Surface-owned interactive widgets.
//!
//! Widgets live outside the document tree (browser chrome rather than page
//! content) and self-report repaint through their own dirty flag, independent
//! of document reflow.

use core::fmt;
use flint_dom::RenderBox;

/// Handle to a registered button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonId(pub(crate) usize);

/// Handle to a registered text input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputId(pub(crate) usize);

pub(crate) struct ButtonWidget {
    pub(crate) bounds: RenderBox,
    pub(crate) label: String,
    pub(crate) needs_repaint: bool,
    pub(crate) on_click: Box<dyn FnMut()>,
}

impl fmt::Debug for ButtonWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ButtonWidget")
            .field("bounds", &self.bounds)
            .field("label", &self.label)
            .field("needs_repaint", &self.needs_repaint)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub(crate) struct InputWidget {
    pub(crate) bounds: RenderBox,
    pub(crate) value: String,
    /// Caret position in characters from the start of `value`.
    pub(crate) cursor: usize,
    pub(crate) active: bool,
    pub(crate) needs_repaint: bool,
}

impl InputWidget {
    pub(crate) fn new(bounds: RenderBox) -> Self {
        Self {
            bounds,
            value: String::new(),
            cursor: 0,
            active: false,
            needs_repaint: false,
        }
    }

    pub(crate) fn insert_char(&mut self, character: char) {
        let byte = self.byte_offset(self.cursor);
        self.value.insert(byte, character);
        self.cursor += 1;
        self.needs_repaint = true;
    }

    pub(crate) fn delete_before_cursor(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let byte = self.byte_offset(self.cursor - 1);
        self.value.remove(byte);
        self.cursor -= 1;
        self.needs_repaint = true;
    }

    pub(crate) fn move_cursor_left(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.needs_repaint = true;
        }
    }

    pub(crate) fn move_cursor_right(&mut self) {
        if self.cursor < self.value.chars().count() {
            self.cursor += 1;
            self.needs_repaint = true;
        }
    }

    pub(crate) fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.chars().count();
        self.needs_repaint = true;
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map_or(self.value.len(), |(offset, _)| offset)
    }
}

#[cfg(test)]
mod tests {
    use super::InputWidget;
    use flint_dom::RenderBox;

    fn input() -> InputWidget {
        InputWidget::new(RenderBox {
            width: 100.0,
            height: 20.0,
            ..RenderBox::default()
        })
    }

    #[test]
    fn typing_inserts_at_the_caret() {
        let mut widget = input();
        for character in "flint".chars() {
            widget.insert_char(character);
        }
        widget.move_cursor_left();
        widget.move_cursor_left();
        widget.insert_char('!');

        assert_eq!(widget.value, "fli!nt");
        assert_eq!(widget.cursor, 4);
    }

    #[test]
    fn backspace_respects_utf8_boundaries() {
        let mut widget = input();
        widget.set_value("caf\u{e9}s");
        widget.move_cursor_left();
        widget.delete_before_cursor();

        assert_eq!(widget.value, "cafs");
        assert_eq!(widget.cursor, 3);
    }

    #[test]
    fn backspace_at_start_is_a_no_op() {
        let mut widget = input();
        widget.set_value("x");
        widget.move_cursor_left();
        widget.needs_repaint = false;
        widget.delete_before_cursor();

        assert_eq!(widget.value, "x");
        assert!(!widget.needs_repaint);
    }

    #[test]
    fn cursor_stays_within_the_value() {
        let mut widget = input();
        widget.set_value("ab");
        widget.move_cursor_right();
        assert_eq!(widget.cursor, 2);
        widget.move_cursor_left();
        widget.move_cursor_left();
        widget.move_cursor_left();
        assert_eq!(widget.cursor, 0);
    }
}
