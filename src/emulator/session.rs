//! Composes the engine, input, and the rate gates into a running session.
//!
//! One poll is one loop iteration, always in the same order: pump input
//! (which may resolve an awaited key, request a snapshot, or end the
//! session), then the instruction gate, then the 60 Hz timer gate. Both
//! gates fire at most once per poll, so a stalled loop catches up
//! deterministically.

use crate::emulator::input::EmulatorInput;
use crate::emulator::output::EmulatorOutput;
use crate::emulator::random::RandomSource;
use crate::emulator::savestate::{self, DEFAULT_STATE_PATH};
use crate::emulator::timing::{Clock, Ticker, DEFAULT_TICKS_PER_SECOND, TIMER_HZ};
use crate::emulator::Emulator;
use std::path::PathBuf;
use std::time::Duration;

pub struct Session<I: EmulatorInput, O: EmulatorOutput, R: RandomSource, C: Clock> {
    emulator: Emulator<I, O, R>,
    clock: C,
    instruction_gate: Ticker,
    timer_gate: Ticker,
    state_path: PathBuf,
}

impl<I: EmulatorInput, O: EmulatorOutput, R: RandomSource, C: Clock> Session<I, O, R, C> {
    /// A session at the default instruction rate.
    pub fn new(emulator: Emulator<I, O, R>, clock: C) -> Self {
        Session::with_rate(emulator, clock, DEFAULT_TICKS_PER_SECOND)
    }

    /// A session executing `ticks_per_second` instructions per second. The
    /// timer registers always count down at 60 Hz regardless.
    pub fn with_rate(emulator: Emulator<I, O, R>, clock: C, ticks_per_second: u64) -> Self {
        let now = clock.now_us();
        Session {
            emulator,
            instruction_gate: Ticker::from_hz(ticks_per_second, now),
            timer_gate: Ticker::from_hz(TIMER_HZ, now),
            clock,
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
        }
    }

    /// Where snapshot requests from the input source are written.
    pub fn set_state_path(&mut self, path: impl Into<PathBuf>) {
        self.state_path = path.into();
    }

    pub fn emulator(&self) -> &Emulator<I, O, R> {
        &self.emulator
    }

    pub fn emulator_mut(&mut self) -> &mut Emulator<I, O, R> {
        &mut self.emulator
    }

    /// One loop iteration. Returns `false` once the session should end,
    /// either because the user asked to quit or because the machine halted.
    pub fn poll(&mut self) -> bool {
        self.emulator.poll_input();
        if self.emulator.input().quit_requested() {
            log::info!("quit requested after {} cycles", self.emulator.machine().cycles());
            return false;
        }
        if self.emulator.input_mut().save_requested() {
            match savestate::save_to_path(self.emulator.machine(), &self.state_path) {
                Ok(()) => log::info!("saved machine state to {}", self.state_path.display()),
                Err(error) => log::error!("failed to save machine state: {}", error),
            }
        }

        let now = self.clock.now_us();
        if self.instruction_gate.poll(now) {
            self.emulator.step();
        }
        if self.timer_gate.poll(now) {
            self.emulator.tick_timers();
        }

        !self.emulator.machine().halted()
    }

    /// Poll until the session ends.
    pub fn run(&mut self) {
        while self.poll() {
            // The gates pace the actual work; a short sleep keeps the poll
            // loop from monopolizing a core.
            std::thread::sleep(Duration::from_micros(200));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::input::DummyInput;
    use crate::emulator::output::DummyOutput;
    use crate::emulator::savestate::SNAPSHOT_LEN;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone)]
    struct FakeClock(Rc<Cell<u64>>);

    impl FakeClock {
        fn new() -> FakeClock {
            FakeClock(Rc::new(Cell::new(0)))
        }

        fn advance(&self, us: u64) {
            self.0.set(self.0.get() + us);
        }
    }

    impl Clock for FakeClock {
        fn now_us(&self) -> u64 {
            self.0.get()
        }
    }

    fn looping_emulator() -> Emulator<DummyInput, DummyOutput, crate::emulator::random::ThreadRandom>
    {
        let mut emulator = Emulator::new();
        emulator.load_program(&[0x12, 0x00]).unwrap(); // jump to self
        emulator
    }

    #[test]
    fn instruction_gate_paces_execution() {
        let clock = FakeClock::new();
        let mut session = Session::with_rate(looping_emulator(), clock.clone(), 1000);

        session.poll();
        assert_eq!(session.emulator().machine().cycles(), 0);

        clock.advance(1001);
        session.poll();
        assert_eq!(session.emulator().machine().cycles(), 1);

        // Same instant again: the gate already fired.
        session.poll();
        assert_eq!(session.emulator().machine().cycles(), 1);
    }

    #[test]
    fn timer_gate_runs_at_sixty_hertz() {
        let clock = FakeClock::new();
        let mut session = Session::with_rate(looping_emulator(), clock.clone(), 1000);
        session.emulator_mut().machine_mut().delay = 5;

        clock.advance(16_667);
        session.poll();
        assert_eq!(session.emulator().machine().delay(), 4);

        session.poll();
        assert_eq!(session.emulator().machine().delay(), 4);

        clock.advance(16_667);
        session.poll();
        assert_eq!(session.emulator().machine().delay(), 3);
    }

    #[test]
    fn poll_ends_the_session_when_the_machine_halts() {
        let clock = FakeClock::new();
        let mut emulator = Emulator::new();
        emulator.load_program(&[0x00, 0x00]).unwrap(); // halt sentinel
        let mut session = Session::with_rate(emulator, clock.clone(), 1000);

        clock.advance(1001);
        assert!(!session.poll());
        assert!(session.emulator().machine().halted());
    }

    #[test]
    fn quit_request_ends_the_session_before_stepping() {
        struct QuitNow;
        impl EmulatorInput for QuitNow {
            fn key_down(&mut self) -> Option<u8> {
                None
            }
            fn is_held(&self, _key: u8) -> bool {
                false
            }
            fn quit_requested(&self) -> bool {
                true
            }
        }

        let clock = FakeClock::new();
        let mut emulator = Emulator::with_io(QuitNow, DummyOutput);
        emulator.load_program(&[0x12, 0x00]).unwrap();
        let mut session = Session::with_rate(emulator, clock.clone(), 1000);

        clock.advance(1001);
        assert!(!session.poll());
        assert_eq!(session.emulator().machine().cycles(), 0);
    }

    #[test]
    fn awaited_key_is_resolved_by_the_input_pump() {
        // Delivers one key-down event after a few polls, like a user
        // pressing a key a moment later.
        struct DelayedKey {
            key: Option<u8>,
            countdown: usize,
        }
        impl EmulatorInput for DelayedKey {
            fn poll(&mut self) {
                if self.countdown > 0 {
                    self.countdown -= 1;
                }
            }
            fn key_down(&mut self) -> Option<u8> {
                if self.countdown == 0 {
                    self.key.take()
                } else {
                    None
                }
            }
            fn is_held(&self, _key: u8) -> bool {
                false
            }
        }

        let clock = FakeClock::new();
        let input = DelayedKey {
            key: Some(0x7),
            countdown: 3,
        };
        let mut emulator = Emulator::with_io(input, DummyOutput);
        emulator
            .load_program(&[0xF2, 0x0A, 0x60, 0x01]) // await into v2, then v0 = 1
            .unwrap();
        let mut session = Session::with_rate(emulator, clock.clone(), 1000);

        clock.advance(1001);
        session.poll();
        assert!(session.emulator().machine().awaiting_input());

        // Stepping stays suppressed while the key is outstanding.
        clock.advance(1001);
        session.poll();
        assert_eq!(session.emulator().machine().pc(), 0x202);
        assert_eq!(session.emulator().machine().cycles(), 1);

        clock.advance(1001);
        session.poll();
        assert!(!session.emulator().machine().awaiting_input());
        assert_eq!(session.emulator().machine().v()[2], 0x7);
        assert_eq!(session.emulator().machine().v()[0], 0x01);
    }

    #[test]
    fn save_request_writes_a_snapshot() {
        struct SaveOnce {
            pending: bool,
        }
        impl EmulatorInput for SaveOnce {
            fn key_down(&mut self) -> Option<u8> {
                None
            }
            fn is_held(&self, _key: u8) -> bool {
                false
            }
            fn save_requested(&mut self) -> bool {
                std::mem::replace(&mut self.pending, false)
            }
        }

        let clock = FakeClock::new();
        let mut emulator = Emulator::with_io(SaveOnce { pending: true }, DummyOutput);
        emulator.load_program(&[0x12, 0x00]).unwrap();
        let mut session = Session::with_rate(emulator, clock, 1000);

        let path = std::env::temp_dir().join("chip8-vm-session-test.ch8");
        session.set_state_path(&path);
        session.poll();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), SNAPSHOT_LEN);
        std::fs::remove_file(&path).unwrap();
    }
}
