//! Input Module - Event conversion, polling and routing
//!
//! Bridges crossterm's event system with the document.
//!
//! # API
//!
//! - `convert_mouse_event` - crossterm mouse event to [`MouseEvent`]
//! - `convert_key_event` - crossterm key event to [`KeyEvent`]
//! - `poll_event` - Non-blocking event check with timeout
//! - `read_event` - Blocking event read
//! - [`InputRouter`] - Dispatch events into the document
//!
//! # Example
//!
//! ```ignore
//! use spark_dom::state::input::{poll_event, InputRouter};
//! use std::time::Duration;
//!
//! let mut router = InputRouter::default();
//! loop {
//!     if let Ok(Some(event)) = poll_event(Duration::from_millis(16)) {
//!         router.route(&document, container, &hits, &event);
//!     }
//! }
//! ```

use std::time::Duration;

use crossterm::event::{
    poll, read, Event as CrosstermEvent, KeyCode, KeyEvent as CrosstermKeyEvent, KeyEventKind,
    KeyModifiers, MouseButton as CrosstermMouseButton, MouseEvent as CrosstermMouseEvent,
    MouseEventKind,
};

use super::mouse::{HitGrid, MouseAction, MouseEvent, PointerState};
use crate::dom::{Document, EventDetail, Modifiers, MouseButton, NativeEvent, NodeId};

// =============================================================================
// EVENT TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Press,
    Repeat,
    Release,
}

/// Keyboard event with a DOM-style key name (`"a"`, `"Enter"`, `"ArrowUp"`).
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    pub key: String,
    pub modifiers: Modifiers,
    pub state: KeyState,
}

impl KeyEvent {
    pub fn press(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            modifiers: Modifiers::default(),
            state: KeyState::Press,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Ctrl+C.
    pub fn is_interrupt(&self) -> bool {
        self.modifiers.ctrl && self.key.eq_ignore_ascii_case("c") && self.state != KeyState::Release
    }
}

/// Unified terminal event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Mouse(MouseEvent),
    Key(KeyEvent),
    Resize(u16, u16),
    None,
}

// =============================================================================
// CONVERSION
// =============================================================================

pub fn convert_mouse_event(event: CrosstermMouseEvent) -> MouseEvent {
    let (action, button) = match event.kind {
        MouseEventKind::Down(btn) => (MouseAction::Down, convert_mouse_button(btn)),
        MouseEventKind::Up(btn) => (MouseAction::Up, convert_mouse_button(btn)),
        MouseEventKind::Drag(btn) => (MouseAction::Drag, convert_mouse_button(btn)),
        MouseEventKind::Moved => (MouseAction::Move, MouseButton::None),
        MouseEventKind::ScrollUp
        | MouseEventKind::ScrollDown
        | MouseEventKind::ScrollLeft
        | MouseEventKind::ScrollRight => (MouseAction::Scroll, MouseButton::None),
    };
    MouseEvent::new(action, button, event.column, event.row)
        .with_modifiers(convert_modifiers(event.modifiers))
}

fn convert_mouse_button(btn: CrosstermMouseButton) -> MouseButton {
    match btn {
        CrosstermMouseButton::Left => MouseButton::Left,
        CrosstermMouseButton::Right => MouseButton::Right,
        CrosstermMouseButton::Middle => MouseButton::Middle,
    }
}

pub fn convert_key_event(event: CrosstermKeyEvent) -> KeyEvent {
    let key = match event.code {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "Tab".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Delete => "Delete".to_string(),
        KeyCode::Esc => "Escape".to_string(),
        KeyCode::Up => "ArrowUp".to_string(),
        KeyCode::Down => "ArrowDown".to_string(),
        KeyCode::Left => "ArrowLeft".to_string(),
        KeyCode::Right => "ArrowRight".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::F(n) => format!("F{n}"),
        KeyCode::Insert => "Insert".to_string(),
        _ => String::new(),
    };
    let state = match event.kind {
        KeyEventKind::Press => KeyState::Press,
        KeyEventKind::Repeat => KeyState::Repeat,
        KeyEventKind::Release => KeyState::Release,
    };
    KeyEvent {
        key,
        modifiers: convert_modifiers(event.modifiers),
        state,
    }
}

fn convert_modifiers(mods: KeyModifiers) -> Modifiers {
    Modifiers {
        ctrl: mods.contains(KeyModifiers::CONTROL),
        alt: mods.contains(KeyModifiers::ALT),
        shift: mods.contains(KeyModifiers::SHIFT),
        meta: mods.intersects(KeyModifiers::SUPER | KeyModifiers::META),
    }
}

// =============================================================================
// EVENT POLLING
// =============================================================================

/// Poll for an event, returning `None` when nothing arrives within `timeout`.
pub fn poll_event(timeout: Duration) -> std::io::Result<Option<InputEvent>> {
    if poll(timeout)? {
        Ok(Some(read_event()?))
    } else {
        Ok(None)
    }
}

/// Read the next event (blocking).
pub fn read_event() -> std::io::Result<InputEvent> {
    Ok(match read()? {
        CrosstermEvent::Mouse(mouse) => InputEvent::Mouse(convert_mouse_event(mouse)),
        CrosstermEvent::Key(key) => InputEvent::Key(convert_key_event(key)),
        CrosstermEvent::Resize(w, h) => InputEvent::Resize(w, h),
        _ => InputEvent::None,
    })
}

// =============================================================================
// ROUTING
// =============================================================================

/// Routes terminal input into the document under a container.
///
/// Mouse events go to the element under the pointer. Key events go to the
/// element clicked last, or the container when that element is gone.
#[derive(Debug, Default)]
pub struct InputRouter {
    pointer: PointerState,
    focused: Option<NodeId>,
}

impl InputRouter {
    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    /// Dispatch `event`. Returns true if a document event was dispatched.
    pub fn route(
        &mut self,
        document: &Document,
        container: NodeId,
        hits: &HitGrid,
        event: &InputEvent,
    ) -> bool {
        match event {
            InputEvent::Mouse(mouse) => {
                let over = hits.get(mouse.x, mouse.y).is_some();
                if let Some(clicked) = self.pointer.dispatch(document, hits, mouse) {
                    self.focused = Some(clicked);
                }
                over
            }
            InputEvent::Key(key) => {
                let target = self
                    .focused
                    .filter(|&node| document.exists(node) && document.contains(container, node))
                    .unwrap_or(container);
                let name = match key.state {
                    KeyState::Press | KeyState::Repeat => "keydown",
                    KeyState::Release => "keyup",
                };
                let native = NativeEvent::new(name).with_detail(EventDetail::Key {
                    key: key.key.clone(),
                    modifiers: key.modifiers,
                });
                document.dispatch_event(target, &native);
                true
            }
            InputEvent::Resize(..) | InputEvent::None => false,
        }
    }
}
