//! The CHIP-8 machine state: registers, memory, stack, timers and framebuffer.
//!
//! This is plain data. It is owned by whoever drives the machine and is only
//! mutated through the engine's operations, never through hidden globals.

use crate::emulator::instruction::Instruction;
use std::fmt;
use thiserror::Error;

pub const MEM_SIZE: usize = 4096;
pub const NUM_REGISTERS: usize = 16;
/// 16 call frames of two bytes each. The stack stores raw bytes, not
/// addresses, so a return address occupies two slots.
pub const STACK_SIZE: usize = 32;
pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;
pub const SCREEN_SIZE: usize = SCREEN_WIDTH * SCREEN_HEIGHT;
pub const PC_START: u16 = 0x200;
/// Where the 80 bytes of font glyph data live (5 bytes per hex digit).
pub const FONT_START: usize = 0x50;
pub const FONT_SIZE: usize = 80;

/// The standard glyph set for hex digits 0-F, usable when no font file is
/// supplied.
pub const DEFAULT_FONT: [u8; FONT_SIZE] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Errors from placing external data into machine memory.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("program is {size} bytes, at most {max} bytes fit in memory")]
    ProgramTooLarge { size: usize, max: usize },
    #[error("font data is {size} bytes, expected at least 80")]
    FontTooSmall { size: usize },
}

/// The full state of a CHIP-8 machine.
#[derive(Debug)]
pub struct Machine {
    pub(crate) pc: u16,
    pub(crate) i: u16,
    pub(crate) delay: u8,
    pub(crate) sound: u8,
    pub(crate) v: [u8; NUM_REGISTERS],

    pub(crate) memory: [u8; MEM_SIZE],
    pub(crate) screen: [u8; SCREEN_SIZE],

    pub(crate) stack: [u8; STACK_SIZE],
    pub(crate) sp: usize,

    pub(crate) cycles: u64,
    pub(crate) halt: bool,
    pub(crate) await_input: bool,
    pub(crate) input_register: u8,
}

impl Machine {
    /// A machine with cleared memory and the program counter at 0x200,
    /// where programs are loaded. Lower memory belonged to the interpreter
    /// on the original hardware.
    pub fn new() -> Machine {
        Machine {
            pc: PC_START,
            i: 0,
            delay: 0,
            sound: 0,
            v: [0; NUM_REGISTERS],
            memory: [0; MEM_SIZE],
            screen: [0; SCREEN_SIZE],
            stack: [0; STACK_SIZE],
            sp: 0,
            cycles: 0,
            halt: false,
            await_input: false,
            input_register: 0,
        }
    }

    /// Copy a program into memory at 0x200.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), LoadError> {
        let max = MEM_SIZE - PC_START as usize;
        if program.len() > max {
            return Err(LoadError::ProgramTooLarge {
                size: program.len(),
                max,
            });
        }
        let start = PC_START as usize;
        self.memory[start..start + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Copy 80 bytes of glyph data into memory at 0x50. Extra bytes are
    /// ignored, as with the original font files.
    pub fn load_font(&mut self, font: &[u8]) -> Result<(), LoadError> {
        if font.len() < FONT_SIZE {
            return Err(LoadError::FontTooSmall { size: font.len() });
        }
        self.memory[FONT_START..FONT_START + FONT_SIZE].copy_from_slice(&font[..FONT_SIZE]);
        Ok(())
    }

    /// Assemble the big-endian instruction word at `pc` and advance `pc`
    /// past it. Advancing is part of the fetch, not of execution.
    pub(crate) fn fetch(&mut self) -> Instruction {
        let higher = self.memory[self.pc as usize];
        let lower = self.memory[self.pc as usize + 1];
        self.pc = self.pc.wrapping_add(2);
        Instruction::new(((higher as u16) << 8) | lower as u16)
    }

    /// Push a byte onto the call stack. Overflow is reported and dropped so
    /// a misbehaving program cannot take the host down with it.
    pub(crate) fn push(&mut self, byte: u8) {
        if self.sp >= STACK_SIZE {
            log::warn!("push onto a full stack, dropping {:#04x}", byte);
            return;
        }
        self.stack[self.sp] = byte;
        self.sp += 1;
    }

    /// Pop a byte off the call stack. Underflow is reported and yields 0.
    pub(crate) fn pop(&mut self) -> u8 {
        if self.sp == 0 {
            log::warn!("pop from an empty stack");
            return 0;
        }
        self.sp -= 1;
        self.stack[self.sp]
    }

    /// Flip the pixel at (x, y) and return its new state.
    pub(crate) fn toggle_pixel(&mut self, x: usize, y: usize) -> u8 {
        let pixel = &mut self.screen[y * SCREEN_WIDTH + x];
        *pixel ^= 1;
        *pixel
    }

    pub(crate) fn clear_screen(&mut self) {
        self.screen = [0; SCREEN_SIZE];
    }

    /// Decrement the delay and sound timers if non-zero. Meant to be called
    /// at 60 Hz, independently of the instruction rate.
    pub fn tick_timers(&mut self) {
        if self.delay > 0 {
            self.delay -= 1;
        }
        if self.sound > 0 {
            self.sound -= 1;
        }
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn i_register(&self) -> u16 {
        self.i
    }

    pub fn v(&self) -> &[u8; NUM_REGISTERS] {
        &self.v
    }

    pub fn delay(&self) -> u8 {
        self.delay
    }

    pub fn sound(&self) -> u8 {
        self.sound
    }

    pub fn screen(&self) -> &[u8; SCREEN_SIZE] {
        &self.screen
    }

    /// Current call stack depth in frames.
    pub fn stack_depth(&self) -> usize {
        self.sp / 2
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn halted(&self) -> bool {
        self.halt
    }

    pub fn awaiting_input(&self) -> bool {
        self.await_input
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.screen.chunks(SCREEN_WIDTH) {
            for pixel in row {
                write!(f, "{}", if *pixel == 1 { '#' } else { ' ' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_machine_starts_at_0x200() {
        let machine = Machine::new();
        assert_eq!(machine.pc, PC_START);
        assert_eq!(machine.cycles, 0);
        assert!(!machine.halt);
    }

    #[test]
    fn load_program_copies_to_0x200() {
        let mut machine = Machine::new();
        machine.load_program(&[0x60, 0x05, 0x12, 0x00]).unwrap();
        assert_eq!(&machine.memory[0x200..0x204], &[0x60, 0x05, 0x12, 0x00]);
    }

    #[test]
    fn oversized_program_is_rejected() {
        let mut machine = Machine::new();
        let too_big = vec![0u8; MEM_SIZE - PC_START as usize + 1];
        assert!(machine.load_program(&too_big).is_err());
        // Nothing was written
        assert!(machine.memory.iter().all(|b| *b == 0));
    }

    #[test]
    fn load_font_copies_to_0x50_and_truncates() {
        let mut machine = Machine::new();
        let mut font = DEFAULT_FONT.to_vec();
        font.push(0xAB); // extra byte should be ignored
        machine.load_font(&font).unwrap();
        assert_eq!(&machine.memory[FONT_START..FONT_START + FONT_SIZE], &DEFAULT_FONT[..]);
        assert_eq!(machine.memory[FONT_START + FONT_SIZE], 0);
    }

    #[test]
    fn undersized_font_is_rejected() {
        let mut machine = Machine::new();
        assert!(machine.load_font(&[0xF0; 79]).is_err());
    }

    #[test]
    fn fetch_assembles_big_endian_and_advances_pc() {
        let mut machine = Machine::new();
        machine.load_program(&[0xAA, 0xBB]).unwrap();
        let instruction = machine.fetch();
        assert_eq!(instruction.word(), 0xAABB);
        assert_eq!(machine.pc, PC_START + 2);
    }

    #[test]
    fn push_onto_full_stack_is_dropped() {
        let mut machine = Machine::new();
        for byte in 0..STACK_SIZE as u8 {
            machine.push(byte);
        }
        assert_eq!(machine.sp, STACK_SIZE);
        machine.push(0xFF);
        assert_eq!(machine.sp, STACK_SIZE);
        assert_eq!(machine.stack[STACK_SIZE - 1], STACK_SIZE as u8 - 1);
    }

    #[test]
    fn pop_from_empty_stack_yields_zero() {
        let mut machine = Machine::new();
        assert_eq!(machine.pop(), 0);
        assert_eq!(machine.sp, 0);
    }

    #[test]
    fn toggle_pixel_flips_and_reports_new_state() {
        let mut machine = Machine::new();
        assert_eq!(machine.toggle_pixel(3, 2), 1);
        assert_eq!(machine.screen[2 * SCREEN_WIDTH + 3], 1);
        assert_eq!(machine.toggle_pixel(3, 2), 0);
        assert_eq!(machine.screen[2 * SCREEN_WIDTH + 3], 0);
    }

    #[test]
    fn timers_stop_at_zero() {
        let mut machine = Machine::new();
        machine.delay = 2;
        machine.sound = 1;
        machine.tick_timers();
        machine.tick_timers();
        machine.tick_timers();
        assert_eq!(machine.delay, 0);
        assert_eq!(machine.sound, 0);
    }
}
