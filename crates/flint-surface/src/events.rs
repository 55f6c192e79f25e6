//! Input event kinds and the listener dispatch table.

use core::fmt;
use flint_dom::NodeId;
use std::collections::HashMap;

/// Host pointer buttons the surface distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// Host key events delivered to [`crate::Surface::on_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
    Escape,
    Up,
    Down,
    Left,
    Right,
}

/// Listener event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerMove,
    Scroll,
    Click,
    Submit,
}

/// Payload handed to registered listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerMove { x: f64, y: f64 },
    Scroll { dx: f64, dy: f64 },
    Click { x: f64, y: f64, target: Option<NodeId> },
    Submit { value: String },
}

impl InputEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::PointerMove { .. } => EventKind::PointerMove,
            Self::Scroll { .. } => EventKind::Scroll,
            Self::Click { .. } => EventKind::Click,
            Self::Submit { .. } => EventKind::Submit,
        }
    }
}

type EventHandler = Box<dyn FnMut(&InputEvent)>;

/// Explicit event-kind → ordered-handler-list table.
///
/// Handlers run in registration order; keeping the table explicit (instead of
/// ad hoc closures scattered over the host glue) makes ordering observable
/// and testable.
#[derive(Default)]
pub struct DispatchTable {
    handlers: HashMap<EventKind, Vec<EventHandler>>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler to the end of `kind`'s list.
    pub fn attach(&mut self, kind: EventKind, handler: impl FnMut(&InputEvent) + 'static) {
        self.handlers.entry(kind).or_default().push(Box::new(handler));
    }

    /// Invokes every handler registered for the event's kind, in order.
    pub fn dispatch(&mut self, event: &InputEvent) {
        let Some(handlers) = self.handlers.get_mut(&event.kind()) else {
            return;
        };
        for handler in handlers.iter_mut() {
            handler(event);
        }
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<(EventKind, usize)> = self
            .handlers
            .iter()
            .map(|(kind, handlers)| (*kind, handlers.len()))
            .collect();
        counts.sort_by_key(|(kind, _)| format!("{kind:?}"));
        f.debug_struct("DispatchTable")
            .field("handlers", &counts)
            .finish()
    }
}
