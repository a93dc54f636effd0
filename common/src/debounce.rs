//! Per-line debouncing of raw button edges.
//!
//! A transition is accepted only if the line has been quiet for the whole
//! window since its last accepted transition; anything inside the window is a
//! bounce and is dropped. Lines never share state.

use crate::types::{ButtonEvent, ButtonId, Edge, Level};

#[derive(Debug, Clone)]
pub struct LineDebouncer {
    button: ButtonId,
    window_ms: u64,
    last_accepted_ms: Option<i64>,
}

impl LineDebouncer {
    pub fn new(button: ButtonId, window_ms: u64) -> Self {
        Self {
            button,
            window_ms,
            last_accepted_ms: None,
        }
    }

    /// `level` is the line's logical level read when the edge fired, so the
    /// event tells a press from a release.
    pub fn accept(&mut self, level: Level, at_ms: i64) -> Option<ButtonEvent> {
        if let Some(last) = self.last_accepted_ms {
            // A wall clock stepping backwards restarts the window.
            let elapsed = at_ms.saturating_sub(last);
            let window = i64::try_from(self.window_ms).unwrap_or(i64::MAX);
            if (0..window).contains(&elapsed) {
                return None;
            }
        }

        self.last_accepted_ms = Some(at_ms);
        Some(ButtonEvent {
            button: self.button,
            edge: Edge::from(level),
            at_ms,
        })
    }
}

/// One [`LineDebouncer`] per button, for sources that deliver every line
/// through a single callback.
#[derive(Debug, Clone)]
pub struct Debouncer {
    lines: [LineDebouncer; 4],
}

impl Debouncer {
    pub fn new(window_ms: u64) -> Self {
        Self {
            lines: ButtonId::ALL.map(|button| LineDebouncer::new(button, window_ms)),
        }
    }

    pub fn accept(&mut self, button: ButtonId, level: Level, at_ms: i64) -> Option<ButtonEvent> {
        self.lines[button.index()].accept(level, at_ms)
    }
}
