//! Selectable opcode conventions.
//!
//! Several opcodes diverged across historical CHIP-8 interpreters. Instead of
//! scattering runtime branches through the decoder, the divergent behaviors
//! are named here and resolved once when the engine is constructed.

/// Which register the shift instructions (8XY6/8XYE) operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftSource {
    /// Copy `v[y]` into `v[x]` before shifting (original interpreter).
    OperandVy,
    /// Shift `v[x]` in place, ignoring `v[y]` (later interpreters).
    OperandVx,
}

/// What happens to `i` after a block store/load (FX55/FX65).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTransfer {
    /// Advance `i` by `x` afterwards (original interpreter).
    IncrementIndex,
    /// Leave `i` untouched (later interpreters).
    LeaveIndex,
}

/// Which register BNNN adds to the jump target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpOffset {
    /// `pc = NNN + v[0]`, the correct convention.
    V0,
    /// `pc = NNN + v[NNN >> 8]`, a misreading of the opcode found in some
    /// descendants. Kept as a named alternate, never the default.
    HighNibbleRegister,
}

/// Whether FX1E reports overflow of the address space in `v[0xF]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOverflow {
    /// Set `v[0xF]` to 1 when `i` reaches 0x1000. Not part of the canonical
    /// instruction set, but widely adopted and relied upon by some programs.
    SetFlag,
    /// Leave `v[0xF]` alone.
    Ignore,
}

/// The resolved set of conventions for one machine. Construct via
/// [`Quirks::modern`] or [`Quirks::classic`] and override fields as needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quirks {
    pub shift: ShiftSource,
    pub block_transfer: BlockTransfer,
    pub jump_offset: JumpOffset,
    pub index_overflow: IndexOverflow,
}

impl Quirks {
    /// The behavior of later interpreters. This is the default profile.
    pub fn modern() -> Quirks {
        Quirks {
            shift: ShiftSource::OperandVx,
            block_transfer: BlockTransfer::LeaveIndex,
            jump_offset: JumpOffset::V0,
            index_overflow: IndexOverflow::SetFlag,
        }
    }

    /// The behavior of the original interpreter.
    pub fn classic() -> Quirks {
        Quirks {
            shift: ShiftSource::OperandVy,
            block_transfer: BlockTransfer::IncrementIndex,
            jump_offset: JumpOffset::V0,
            index_overflow: IndexOverflow::SetFlag,
        }
    }
}

impl Default for Quirks {
    fn default() -> Self {
        Quirks::modern()
    }
}
