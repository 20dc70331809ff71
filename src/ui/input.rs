/// Keyboard state tracker.
///
/// Tracks which keys are currently held down, enabling:
///   - Continuous movement while a direction key is held
///   - Edge-triggered reset / confirm (only fire on initial press)
///
/// Edge presses are latched: a press seen on any drain stays pending until
/// `take_frame_input` hands it to the simulation, so a tap between two ticks
/// is never lost.
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::FrameInput;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

// ── Bindings ──

const LEFT: [KeyCode; 2] = [KeyCode::Left, KeyCode::Char('a')];
const RIGHT: [KeyCode; 2] = [KeyCode::Right, KeyCode::Char('d')];
const UP: [KeyCode; 2] = [KeyCode::Up, KeyCode::Char('w')];
const DOWN: [KeyCode; 2] = [KeyCode::Down, KeyCode::Char('s')];
const RESET: [KeyCode; 1] = [KeyCode::Char('r')];
const CONFIRM: [KeyCode; 2] = [KeyCode::Char(' '), KeyCode::Enter];
const QUIT: [KeyCode; 2] = [KeyCode::Esc, KeyCode::Char('q')];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the latest drain.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for modifier checks.
    raw_events: Vec<KeyEvent>,

    pending_reset: bool,
    pending_confirm: bool,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            pending_reset: false,
            pending_confirm: false,
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.handle_key(key, Instant::now());
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        let code = normalize(key.code);

        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&code);
            }
            KeyEventKind::Release => {
                // Enhancement not confirmed; rely on timeout expiry
            }
            _ => {
                let was_held = self.is_held_at(code, now);
                self.last_active.insert(code, now);
                if !was_held {
                    self.fresh_presses.push(code);
                    if RESET.contains(&code) { self.pending_reset = true; }
                    if CONFIRM.contains(&code) { self.pending_confirm = true; }
                }
            }
        }
    }

    /// Snapshot for one tick. Consumes latched reset / confirm presses.
    pub fn take_frame_input(&mut self) -> FrameInput {
        let now = Instant::now();
        let held = |codes: &[KeyCode]| codes.iter().any(|&c| self.is_held_at(c, now));
        let input = FrameInput {
            left: held(&LEFT),
            right: held(&RIGHT),
            up: held(&UP),
            down: held(&DOWN),
            reset: self.pending_reset,
            confirm: self.pending_confirm,
        };
        self.pending_reset = false;
        self.pending_confirm = false;
        input
    }

    /// Esc, Q or Ctrl-C during the latest drain.
    pub fn quit_requested(&self) -> bool {
        QUIT.iter().any(|c| self.fresh_presses.contains(c)) || self.ctrl_c_pressed()
    }

    fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    // ── Internal ──

    fn is_held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active.get(&code)
            .map(|t| now.duration_since(*t) < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}

/// Letter bindings ignore shift / caps lock.
fn normalize(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}
