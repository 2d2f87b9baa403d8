//! A decoded view of a 16-bit CHIP-8 instruction word.
//!
//! Two bytes written in hexadecimal, with the following special characters:
//! - NNN: address
//! - NN: 8-bit constant
//! - N: 4-bit constant
//! - X and Y: 4-bit register identifiers
//!
//! The view performs no validation; unknown combinations are detected during
//! execution, which keeps the recognized/unrecognized verdict in one place.

use crate::util::bit_splitter::BitSplitter;

/// A transient view over one instruction word. Produced by a fetch, consumed
/// once by the engine, then discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    word: u16,
}

impl Instruction {
    pub fn new(word: u16) -> Instruction {
        Instruction { word }
    }

    pub fn word(&self) -> u16 {
        self.word
    }

    /// The top nibble, selecting the opcode family.
    pub fn family(&self) -> u8 {
        BitSplitter::from_u16(self.word).as_four_u8().0
    }

    pub fn x(&self) -> u8 {
        BitSplitter::from_u16(self.word).as_four_u8().1
    }

    pub fn y(&self) -> u8 {
        BitSplitter::from_u16(self.word).as_four_u8().2
    }

    pub fn n(&self) -> u8 {
        BitSplitter::from_u16(self.word).as_four_u8().3
    }

    pub fn nn(&self) -> u8 {
        BitSplitter::from_u16(self.word).last_8_bits()
    }

    pub fn nnn(&self) -> u16 {
        BitSplitter::from_u16(self.word).last_12_bits()
    }

    /// A human-readable description of the instruction, used for the debug
    /// trace. Unknown words still get a description; only execution decides
    /// what is recognized.
    pub fn describe(&self) -> String {
        let (x, y, n, nn, nnn) = (self.x(), self.y(), self.n(), self.nn(), self.nnn());
        match (self.family(), x, y, n) {
            (0x0, 0x0, 0x0, 0x0) => "halt".to_string(),
            (0x0, 0x0, 0xE, 0x0) => "clear screen".to_string(),
            (0x0, 0x0, 0xE, 0xE) => "return from subroutine".to_string(),
            (0x0, _, _, _) => format!("host routine {:#05x}", nnn),
            (0x1, _, _, _) => format!("jump to {:#05x}", nnn),
            (0x2, _, _, _) => format!("call subroutine at {:#05x}", nnn),
            (0x3, _, _, _) => format!("skip if v{:X} == {:#04x}", x, nn),
            (0x4, _, _, _) => format!("skip if v{:X} != {:#04x}", x, nn),
            (0x5, _, _, 0x0) => format!("skip if v{:X} == v{:X}", x, y),
            (0x6, _, _, _) => format!("v{:X} = {:#04x}", x, nn),
            (0x7, _, _, _) => format!("v{:X} += {:#04x}", x, nn),
            (0x8, _, _, 0x0) => format!("v{:X} = v{:X}", x, y),
            (0x8, _, _, 0x1) => format!("v{:X} |= v{:X}", x, y),
            (0x8, _, _, 0x2) => format!("v{:X} &= v{:X}", x, y),
            (0x8, _, _, 0x3) => format!("v{:X} ^= v{:X}", x, y),
            (0x8, _, _, 0x4) => format!("v{:X} += v{:X}", x, y),
            (0x8, _, _, 0x5) => format!("v{:X} -= v{:X}", x, y),
            (0x8, _, _, 0x6) => format!("v{:X} >>= 1", x),
            (0x8, _, _, 0x7) => format!("v{:X} = v{:X} - v{:X}", x, y, x),
            (0x8, _, _, 0xE) => format!("v{:X} <<= 1", x),
            (0x9, _, _, 0x0) => format!("skip if v{:X} != v{:X}", x, y),
            (0xA, _, _, _) => format!("i = {:#05x}", nnn),
            (0xB, _, _, _) => format!("jump with offset to {:#05x}", nnn),
            (0xC, _, _, _) => format!("v{:X} = random & {:#04x}", x, nn),
            (0xD, _, _, _) => format!("draw {} rows at (v{:X}, v{:X})", n, x, y),
            (0xE, _, 0x9, 0xE) => format!("skip if key v{:X} held", x),
            (0xE, _, 0xA, 0x1) => format!("skip if key v{:X} not held", x),
            (0xF, _, 0x0, 0x7) => format!("v{:X} = delay", x),
            (0xF, _, 0x0, 0xA) => format!("v{:X} = await key", x),
            (0xF, _, 0x1, 0x5) => format!("delay = v{:X}", x),
            (0xF, _, 0x1, 0x8) => format!("sound = v{:X}", x),
            (0xF, _, 0x1, 0xE) => format!("i += v{:X}", x),
            (0xF, _, 0x2, 0x9) => format!("i = glyph address of v{:X}", x),
            (0xF, _, 0x3, 0x3) => format!("store BCD of v{:X}", x),
            (0xF, _, 0x5, 0x5) => format!("store v0..=v{:X}", x),
            (0xF, _, 0x6, 0x5) => format!("load v0..=v{:X}", x),
            _ => format!("unknown instruction {:#06x}", self.word),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_extracted_with_fixed_masks() {
        let instruction = Instruction::new(0xABCD);
        assert_eq!(instruction.family(), 0xA);
        assert_eq!(instruction.x(), 0xB);
        assert_eq!(instruction.y(), 0xC);
        assert_eq!(instruction.n(), 0xD);
        assert_eq!(instruction.nn(), 0xCD);
        assert_eq!(instruction.nnn(), 0xBCD);
    }

    #[test]
    fn views_share_the_same_word() {
        let instruction = Instruction::new(0xD125);
        assert_eq!(instruction.word(), 0xD125);
        assert_eq!(instruction.x(), 0x1);
        assert_eq!(instruction.y(), 0x2);
        assert_eq!(instruction.n(), 0x5);
    }

    #[test]
    fn describe_names_common_instructions() {
        assert_eq!(Instruction::new(0x00E0).describe(), "clear screen");
        assert_eq!(Instruction::new(0x1200).describe(), "jump to 0x200");
        assert_eq!(Instruction::new(0x6A05).describe(), "vA = 0x05");
        assert_eq!(Instruction::new(0x0123).describe(), "host routine 0x123");
    }

    #[test]
    fn describe_handles_unknown_words() {
        assert_eq!(
            Instruction::new(0x8AB9).describe(),
            "unknown instruction 0x8ab9"
        );
    }
}
