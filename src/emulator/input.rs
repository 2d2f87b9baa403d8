//! The keyboard-event collaborator.

/// An input device over the 16-key CHIP-8 keypad (key codes 0x0-0xF).
///
/// The session loop calls [`poll`](EmulatorInput::poll) once per iteration to
/// let the device drain its event source; the remaining methods answer from
/// that drained state.
pub trait EmulatorInput {
    /// Drain pending events from the underlying source.
    fn poll(&mut self) {}

    /// Take the next key-down event, if one arrived. Consuming: each press is
    /// reported once, which is what resolves an awaited key exactly once.
    fn key_down(&mut self) -> Option<u8>;

    /// Whether the given key is currently held.
    fn is_held(&self, key: u8) -> bool;

    /// Whether the user asked to stop the session.
    fn quit_requested(&self) -> bool {
        false
    }

    /// Whether the user asked to snapshot the machine state. Consuming.
    fn save_requested(&mut self) -> bool {
        false
    }
}

/// An input device that never provides any input.
pub struct DummyInput;

impl EmulatorInput for DummyInput {
    fn key_down(&mut self) -> Option<u8> {
        None
    }

    fn is_held(&self, _key: u8) -> bool {
        false
    }
}

/// A scripted input device for tests: replays a fixed sequence of key-down
/// events and holds nothing.
pub struct ScriptedInput {
    presses: std::collections::VecDeque<u8>,
}

impl ScriptedInput {
    pub fn new(presses: &[u8]) -> ScriptedInput {
        ScriptedInput {
            presses: presses.iter().copied().collect(),
        }
    }
}

impl EmulatorInput for ScriptedInput {
    fn key_down(&mut self) -> Option<u8> {
        self.presses.pop_front()
    }

    fn is_held(&self, _key: u8) -> bool {
        false
    }
}
