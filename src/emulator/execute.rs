//! Opcode semantics.
//!
//! One arm per recognized instruction, dispatched over the four nibbles of
//! the fetched word. Every path yields a definite recognized/unrecognized
//! verdict; on `false` the machine is untouched apart from the program
//! counter, which the fetch has already moved past the word.

use crate::emulator::input::EmulatorInput;
use crate::emulator::machine::{FONT_START, MEM_SIZE, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::emulator::output::EmulatorOutput;
use crate::emulator::quirks::{BlockTransfer, IndexOverflow, JumpOffset, ShiftSource};
use crate::emulator::random::RandomSource;
use crate::emulator::{Emulator, Instruction};

impl<I: EmulatorInput, O: EmulatorOutput, R: RandomSource> Emulator<I, O, R> {
    /// Apply one instruction to the machine and report whether it was
    /// recognized. The engine never guesses: anything outside the known
    /// combinations returns `false` without side effects.
    pub fn execute(&mut self, instruction: Instruction) -> bool {
        let x = instruction.x() as usize;
        let y = instruction.y() as usize;

        match (
            instruction.family(),
            instruction.x(),
            instruction.y(),
            instruction.n(),
        ) {
            // 0x0000 stops the machine. Not an original instruction; this
            // interpreter uses the all-zero word as a halt sentinel so that
            // running off into cleared memory stops cleanly.
            (0x0, 0x0, 0x0, 0x0) => {
                self.machine.halt = true;
            }

            (0x0, 0x0, 0xE, 0x0) => {
                self.machine.clear_screen();
                self.render_pending = true;
            }

            // Return: pop the address pushed by the call, low byte first
            // since it was pushed last.
            (0x0, 0x0, 0xE, 0xE) => {
                let lower = self.machine.pop();
                let higher = self.machine.pop();
                self.machine.pc = ((higher as u16) << 8) | lower as u16;
            }

            // 0x0NNN ran a routine on the host machine of the original
            // hardware. No host to run it on here; report and move on.
            (0x0, _, _, _) => {
                log::warn!("ignoring host routine {:#06x}", instruction.word());
            }

            (0x1, _, _, _) => {
                self.machine.pc = instruction.nnn();
            }

            // Call: the return address goes onto the byte stack high byte
            // first, one frame per two slots.
            (0x2, _, _, _) => {
                let pc = self.machine.pc;
                self.machine.push((pc >> 8) as u8);
                self.machine.push(pc as u8);
                self.machine.pc = instruction.nnn();
            }

            (0x3, _, _, _) => {
                if self.machine.v[x] == instruction.nn() {
                    self.machine.pc = self.machine.pc.wrapping_add(2);
                }
            }

            (0x4, _, _, _) => {
                if self.machine.v[x] != instruction.nn() {
                    self.machine.pc = self.machine.pc.wrapping_add(2);
                }
            }

            (0x5, _, _, 0x0) => {
                if self.machine.v[x] == self.machine.v[y] {
                    self.machine.pc = self.machine.pc.wrapping_add(2);
                }
            }

            (0x6, _, _, _) => {
                self.machine.v[x] = instruction.nn();
            }

            // Wraps without touching the flag, unlike 8XY4.
            (0x7, _, _, _) => {
                self.machine.v[x] = self.machine.v[x].wrapping_add(instruction.nn());
            }

            (0x8, _, _, 0x0) => {
                self.machine.v[x] = self.machine.v[y];
            }

            (0x8, _, _, 0x1) => {
                self.machine.v[x] |= self.machine.v[y];
            }

            (0x8, _, _, 0x2) => {
                self.machine.v[x] &= self.machine.v[y];
            }

            (0x8, _, _, 0x3) => {
                self.machine.v[x] ^= self.machine.v[y];
            }

            // The flag is written last throughout this family so that it
            // wins when x is 0xF.
            (0x8, _, _, 0x4) => {
                let (sum, carried) = self.machine.v[x].overflowing_add(self.machine.v[y]);
                self.machine.v[x] = sum;
                self.machine.v[0xF] = carried as u8;
            }

            // Borrow-inverted: the flag is 1 when no borrow happened.
            (0x8, _, _, 0x5) => {
                let no_borrow = (self.machine.v[x] >= self.machine.v[y]) as u8;
                self.machine.v[x] = self.machine.v[x].wrapping_sub(self.machine.v[y]);
                self.machine.v[0xF] = no_borrow;
            }

            (0x8, _, _, 0x6) => {
                let operand = self.shift_operand(x, y);
                self.machine.v[x] = operand >> 1;
                self.machine.v[0xF] = operand & 1;
            }

            (0x8, _, _, 0x7) => {
                let no_borrow = (self.machine.v[y] >= self.machine.v[x]) as u8;
                self.machine.v[x] = self.machine.v[y].wrapping_sub(self.machine.v[x]);
                self.machine.v[0xF] = no_borrow;
            }

            (0x8, _, _, 0xE) => {
                let operand = self.shift_operand(x, y);
                self.machine.v[x] = operand << 1;
                self.machine.v[0xF] = operand >> 7;
            }

            (0x8, _, _, _) => return false,

            (0x9, _, _, 0x0) => {
                if self.machine.v[x] != self.machine.v[y] {
                    self.machine.pc = self.machine.pc.wrapping_add(2);
                }
            }

            (0xA, _, _, _) => {
                self.machine.i = instruction.nnn();
            }

            (0xB, _, _, _) => {
                let offset = match self.quirks.jump_offset {
                    JumpOffset::V0 => self.machine.v[0],
                    JumpOffset::HighNibbleRegister => {
                        self.machine.v[(instruction.nnn() >> 8) as usize]
                    }
                };
                self.machine.pc = instruction.nnn().wrapping_add(offset as u16);
            }

            (0xC, _, _, _) => {
                self.machine.v[x] = self.random.random_byte() & instruction.nn();
            }

            (0xD, _, _, _) => {
                self.draw_sprite(x, y, instruction.n() as usize);
            }

            (0xE, _, 0x9, 0xE) => {
                if self.input.is_held(self.machine.v[x]) {
                    self.machine.pc = self.machine.pc.wrapping_add(2);
                }
            }

            (0xE, _, 0xA, 0x1) => {
                if !self.input.is_held(self.machine.v[x]) {
                    self.machine.pc = self.machine.pc.wrapping_add(2);
                }
            }

            (0xE, _, _, _) => return false,

            (0xF, _, 0x0, 0x7) => {
                self.machine.v[x] = self.machine.delay;
            }

            // Await a key. Only the flag is set here; the engine never
            // spins. The session loop suppresses stepping until a key-down
            // event resolves it.
            (0xF, _, 0x0, 0xA) => {
                self.machine.await_input = true;
                self.machine.input_register = x as u8;
            }

            (0xF, _, 0x1, 0x5) => {
                self.machine.delay = self.machine.v[x];
            }

            (0xF, _, 0x1, 0x8) => {
                self.machine.sound = self.machine.v[x];
            }

            (0xF, _, 0x1, 0xE) => {
                self.machine.i = self.machine.i.wrapping_add(self.machine.v[x] as u16);
                if let IndexOverflow::SetFlag = self.quirks.index_overflow {
                    if self.machine.i >= 0x1000 {
                        self.machine.v[0xF] = 1;
                    }
                }
            }

            // Glyphs are 5 bytes tall, stored in order from FONT_START.
            (0xF, _, 0x2, 0x9) => {
                self.machine.i = FONT_START as u16 + 5 * (self.machine.v[x] & 0xF) as u16;
            }

            (0xF, _, 0x3, 0x3) => {
                self.store_bcd(x);
            }

            (0xF, _, 0x5, 0x5) => {
                self.block_transfer(x, true);
            }

            (0xF, _, 0x6, 0x5) => {
                self.block_transfer(x, false);
            }

            _ => return false,
        }
        true
    }

    fn shift_operand(&self, x: usize, y: usize) -> u8 {
        match self.quirks.shift {
            ShiftSource::OperandVy => self.machine.v[y],
            ShiftSource::OperandVx => self.machine.v[x],
        }
    }

    /// XOR an N-row sprite onto the screen. The anchor wraps around the
    /// screen; individual bits that land outside are clipped, not wrapped.
    /// `v[0xF]` reports whether any pixel was toggled off.
    fn draw_sprite(&mut self, x: usize, y: usize, height: usize) {
        let anchor_x = self.machine.v[x] as usize % SCREEN_WIDTH;
        let anchor_y = self.machine.v[y] as usize % SCREEN_HEIGHT;
        self.machine.v[0xF] = 0;

        for row in 0..height {
            let address = self.machine.i as usize + row;
            if address >= MEM_SIZE {
                log::warn!(
                    "sprite row at {:#06x} is outside memory, dropping the rest",
                    address
                );
                break;
            }
            let row_data = self.machine.memory[address];
            for bit in 0..8 {
                if (row_data >> (7 - bit)) & 1 == 0 {
                    continue;
                }
                let pixel_x = anchor_x + bit;
                let pixel_y = anchor_y + row;
                if pixel_x >= SCREEN_WIDTH || pixel_y >= SCREEN_HEIGHT {
                    continue;
                }
                if self.machine.toggle_pixel(pixel_x, pixel_y) == 0 {
                    self.machine.v[0xF] = 1;
                }
            }
        }
        self.render_pending = true;
    }

    /// Write v[x] as three decimal digits to memory[i..i+3].
    fn store_bcd(&mut self, x: usize) {
        let value = self.machine.v[x];
        let digits = [value / 100, (value / 10) % 10, value % 10];
        for (offset, digit) in digits.iter().enumerate() {
            let address = self.machine.i as usize + offset;
            if address >= MEM_SIZE {
                log::warn!("BCD write at {:#06x} is outside memory, dropping", address);
                break;
            }
            self.machine.memory[address] = *digit;
        }
    }

    /// Store or load v[0..=x] at memory[i..]. Whether `i` moves afterwards
    /// is a convention difference, resolved by the configured quirks.
    fn block_transfer(&mut self, x: usize, store: bool) {
        for register in 0..=x {
            let address = self.machine.i as usize + register;
            if address >= MEM_SIZE {
                log::warn!(
                    "register block at {:#06x} runs outside memory, dropping the rest",
                    address
                );
                break;
            }
            if store {
                self.machine.memory[address] = self.machine.v[register];
            } else {
                self.machine.v[register] = self.machine.memory[address];
            }
        }
        if let BlockTransfer::IncrementIndex = self.quirks.block_transfer {
            self.machine.i = self.machine.i.wrapping_add(x as u16);
        }
    }
}
