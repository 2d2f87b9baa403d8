//! The pixel-renderer collaborator.

use crate::emulator::machine::SCREEN_SIZE;

/// A renderer for the 64x32 monochrome framebuffer.
///
/// The engine mutates the framebuffer in place and hands it over read-only
/// after every step that changed it (render-after-mutate). Renderers keep
/// whatever caches they need to draw cheaply.
pub trait EmulatorOutput {
    fn render(&mut self, screen: &[u8; SCREEN_SIZE]);
}

/// An output device that discards everything.
pub struct DummyOutput;

impl EmulatorOutput for DummyOutput {
    fn render(&mut self, _screen: &[u8; SCREEN_SIZE]) {}
}

/// An output device for tests that remembers the last rendered frame and
/// counts render calls.
pub struct RecordingOutput {
    pub last_frame: Option<[u8; SCREEN_SIZE]>,
    pub renders: usize,
}

impl RecordingOutput {
    pub fn new() -> RecordingOutput {
        RecordingOutput {
            last_frame: None,
            renders: 0,
        }
    }
}

impl Default for RecordingOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl EmulatorOutput for RecordingOutput {
    fn render(&mut self, screen: &[u8; SCREEN_SIZE]) {
        self.last_frame = Some(*screen);
        self.renders += 1;
    }
}
