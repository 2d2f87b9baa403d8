//! The CHIP-8 virtual machine engine and its collaborators.
//!
//! [`Machine`] is the plain state aggregate; [`Emulator`] wraps it together
//! with the input, output and random collaborators and drives single
//! fetch-decode-execute steps. [`session::Session`] adds the rate gates on
//! top for real-time use.

pub mod input;
pub mod instruction;
pub mod machine;
pub mod output;
pub mod quirks;
pub mod random;
pub mod savestate;
pub mod session;
pub mod timing;

mod execute;

use crate::emulator::input::{DummyInput, EmulatorInput};
use crate::emulator::machine::{LoadError, Machine, MEM_SIZE, NUM_REGISTERS};
use crate::emulator::output::{DummyOutput, EmulatorOutput};
use crate::emulator::quirks::Quirks;
use crate::emulator::random::{RandomSource, ThreadRandom};
use crate::emulator::savestate::SnapshotError;

pub use crate::emulator::instruction::Instruction;

/// The execution engine: machine state plus external collaborators.
///
/// One call to [`step`](Emulator::step) is an indivisible
/// fetch-decode-execute; nothing here suspends or spins. The only
/// blocking-like behavior is the cooperative await-input flag, which
/// suppresses stepping until [`key_press`](Emulator::key_press) resolves it.
pub struct Emulator<I: EmulatorInput, O: EmulatorOutput, R: RandomSource> {
    machine: Machine,
    quirks: Quirks,
    input: I,
    output: O,
    random: R,
    render_pending: bool,
}

impl Emulator<DummyInput, DummyOutput, ThreadRandom> {
    /// An emulator with dummy input and output, useful for tests and for
    /// driving the machine manually.
    pub fn new() -> Self {
        Emulator::with_io(DummyInput, DummyOutput)
    }
}

impl Default for Emulator<DummyInput, DummyOutput, ThreadRandom> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: EmulatorInput, O: EmulatorOutput> Emulator<I, O, ThreadRandom> {
    /// An emulator with the given input and output and default conventions.
    pub fn with_io(input: I, output: O) -> Self {
        Emulator::with_parts(input, output, ThreadRandom, Quirks::default())
    }
}

impl<I: EmulatorInput, O: EmulatorOutput, R: RandomSource> Emulator<I, O, R> {
    /// Full control over every collaborator and the opcode conventions.
    /// The conventions are resolved here, once, for the machine's lifetime.
    pub fn with_parts(input: I, output: O, random: R, quirks: Quirks) -> Self {
        Emulator {
            machine: Machine::new(),
            quirks,
            input,
            output,
            random,
            render_pending: false,
        }
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    pub fn quirks(&self) -> Quirks {
        self.quirks
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// Copy a program into machine memory at 0x200.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), LoadError> {
        self.machine.load_program(program)
    }

    /// Copy font glyph data into machine memory at 0x50.
    pub fn load_font(&mut self, font: &[u8]) -> Result<(), LoadError> {
        self.machine.load_font(font)
    }

    /// Perform one fetch-decode-execute step.
    ///
    /// Does nothing while halted or awaiting input; those are checked here
    /// so every caller gets the same contract. An unrecognized instruction
    /// halts the machine, since executing misinterpreted bytes would corrupt
    /// state silently.
    pub fn step(&mut self) {
        if self.machine.halt || self.machine.await_input {
            return;
        }
        if self.machine.pc as usize + 1 >= MEM_SIZE {
            log::error!(
                "program counter {:#06x} ran past the end of memory, halting",
                self.machine.pc
            );
            self.machine.halt = true;
            return;
        }

        let instruction = self.machine.fetch();
        log::trace!(
            "{:#06x}: {:#06x} {}",
            self.machine.pc.wrapping_sub(2),
            instruction.word(),
            instruction.describe()
        );

        if !self.execute(instruction) {
            log::error!(
                "unknown instruction {:#06x}, halting",
                instruction.word()
            );
            self.machine.halt = true;
        }
        self.machine.cycles += 1;

        if self.render_pending {
            self.output.render(&self.machine.screen);
            self.render_pending = false;
        }
    }

    /// Decrement the 60 Hz timer registers.
    pub fn tick_timers(&mut self) {
        self.machine.tick_timers();
    }

    /// Feed one key-down event into the machine. If the machine is awaiting
    /// input this resolves it: the key lands in the target register and the
    /// flag clears, exactly once.
    pub fn key_press(&mut self, key: u8) {
        if self.machine.await_input {
            let register = self.machine.input_register as usize % NUM_REGISTERS;
            self.machine.v[register] = key;
            self.machine.await_input = false;
        }
    }

    /// Pump the input source and feed any key-down event into the machine.
    pub fn poll_input(&mut self) {
        self.input.poll();
        if let Some(key) = self.input.key_down() {
            self.key_press(key);
        }
    }

    /// Serialize the machine state into the fixed snapshot layout.
    pub fn snapshot(&self) -> Vec<u8> {
        savestate::serialize(&self.machine)
    }

    /// Replace the machine with one decoded from a snapshot. The swap only
    /// happens after a successful decode; on error the running machine is
    /// untouched. Conventions are not part of the snapshot and stay as
    /// configured.
    pub fn restore(&mut self, snapshot: &[u8]) -> Result<(), SnapshotError> {
        let machine = savestate::deserialize(snapshot)?;
        self.machine = machine;
        Ok(())
    }
}
