//! Fixed-layout serialization of the machine state.
//!
//! The byte layout is a compatibility contract, so field order and endianness
//! are spelled out here rather than derived: `pc` and `i` big-endian, then
//! `delay`, `sound`, the sixteen registers, all of memory, the framebuffer,
//! the full stack area regardless of depth, the stack index as a
//! platform-word little-endian integer, the cycle counter as eight
//! little-endian bytes, and finally the `halt`/`await_input`/`input_register`
//! bytes.

use crate::emulator::machine::{Machine, MEM_SIZE, NUM_REGISTERS, SCREEN_SIZE, STACK_SIZE};
use std::fs;
use std::io;
use std::mem::size_of;
use std::path::Path;
use thiserror::Error;

/// Default location for snapshots, relative to the working directory.
pub const DEFAULT_STATE_PATH: &str = "states/state.ch8";

const REGISTER_BYTES: usize = 2 + 2 + 1 + 1 + NUM_REGISTERS;
const TRAILER_BYTES: usize = size_of::<usize>() + 8 + 3;

/// Exact size of a serialized snapshot in bytes.
pub const SNAPSHOT_LEN: usize =
    REGISTER_BYTES + MEM_SIZE + SCREEN_SIZE + STACK_SIZE + TRAILER_BYTES;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is {len} bytes, expected {expected}")]
    UnexpectedLength { len: usize, expected: usize },
    #[error("snapshot stack pointer {sp} exceeds stack capacity {capacity}")]
    StackPointerOutOfRange { sp: usize, capacity: usize },
    #[error("snapshot input register {register} is not a valid register index")]
    InputRegisterOutOfRange { register: u8 },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Encode the machine into the fixed layout.
pub fn serialize(machine: &Machine) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(SNAPSHOT_LEN);

    bytes.extend_from_slice(&machine.pc.to_be_bytes());
    bytes.extend_from_slice(&machine.i.to_be_bytes());
    bytes.push(machine.delay);
    bytes.push(machine.sound);
    bytes.extend_from_slice(&machine.v);

    bytes.extend_from_slice(&machine.memory);
    bytes.extend_from_slice(&machine.screen);

    // The whole stack area is written, not just the live frames; restoring
    // must reproduce the machine bit for bit.
    bytes.extend_from_slice(&machine.stack);
    bytes.extend_from_slice(&machine.sp.to_le_bytes());

    bytes.extend_from_slice(&machine.cycles.to_le_bytes());
    bytes.push(machine.halt as u8);
    bytes.push(machine.await_input as u8);
    bytes.push(machine.input_register);

    debug_assert_eq!(bytes.len(), SNAPSHOT_LEN);
    bytes
}

/// Decode a snapshot into a fresh machine.
///
/// Nothing live is touched here: callers swap the returned machine in only
/// after the decode succeeded, so a malformed snapshot can never leave a
/// half-restored state behind.
pub fn deserialize(bytes: &[u8]) -> Result<Machine, SnapshotError> {
    if bytes.len() != SNAPSHOT_LEN {
        return Err(SnapshotError::UnexpectedLength {
            len: bytes.len(),
            expected: SNAPSHOT_LEN,
        });
    }

    let mut machine = Machine::new();
    machine.pc = u16::from_be_bytes([bytes[0], bytes[1]]);
    machine.i = u16::from_be_bytes([bytes[2], bytes[3]]);
    machine.delay = bytes[4];
    machine.sound = bytes[5];
    machine.v.copy_from_slice(&bytes[6..6 + NUM_REGISTERS]);

    let mut offset = REGISTER_BYTES;
    machine.memory.copy_from_slice(&bytes[offset..offset + MEM_SIZE]);
    offset += MEM_SIZE;
    machine.screen.copy_from_slice(&bytes[offset..offset + SCREEN_SIZE]);
    offset += SCREEN_SIZE;
    machine.stack.copy_from_slice(&bytes[offset..offset + STACK_SIZE]);
    offset += STACK_SIZE;

    let mut word = [0u8; size_of::<usize>()];
    word.copy_from_slice(&bytes[offset..offset + size_of::<usize>()]);
    let sp = usize::from_le_bytes(word);
    if sp > STACK_SIZE {
        return Err(SnapshotError::StackPointerOutOfRange {
            sp,
            capacity: STACK_SIZE,
        });
    }
    machine.sp = sp;
    offset += size_of::<usize>();

    let mut cycles = [0u8; 8];
    cycles.copy_from_slice(&bytes[offset..offset + 8]);
    machine.cycles = u64::from_le_bytes(cycles);
    offset += 8;

    machine.halt = bytes[offset] != 0;
    machine.await_input = bytes[offset + 1] != 0;
    let register = bytes[offset + 2];
    if register as usize >= NUM_REGISTERS {
        return Err(SnapshotError::InputRegisterOutOfRange { register });
    }
    machine.input_register = register;

    Ok(machine)
}

/// Write a snapshot to disk, creating the parent directory if needed.
pub fn save_to_path(machine: &Machine, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serialize(machine))
}

/// Read and decode a snapshot from disk.
pub fn load_from_path(path: &Path) -> Result<Machine, SnapshotError> {
    let bytes = fs::read(path)?;
    deserialize(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn busy_machine() -> Machine {
        let mut machine = Machine::new();
        machine.pc = 0x0246;
        machine.i = 0x0ABC;
        machine.delay = 17;
        machine.sound = 3;
        for (index, register) in machine.v.iter_mut().enumerate() {
            *register = index as u8 * 3;
        }
        machine.memory[0x200] = 0x12;
        machine.memory[0xFFF] = 0x34;
        machine.screen[0] = 1;
        machine.screen[SCREEN_SIZE - 1] = 1;
        machine.push(0x02);
        machine.push(0x46);
        machine.cycles = 0x0102_0304_0506_0708;
        machine.halt = true;
        machine.await_input = true;
        machine.input_register = 0xE;
        machine
    }

    #[test]
    fn snapshot_has_the_fixed_length() {
        assert_eq!(serialize(&Machine::new()).len(), SNAPSHOT_LEN);
    }

    #[test]
    fn round_trip_reproduces_every_field() {
        let machine = busy_machine();
        let restored = deserialize(&serialize(&machine)).unwrap();
        assert_eq!(restored.pc, machine.pc);
        assert_eq!(restored.i, machine.i);
        assert_eq!(restored.delay, machine.delay);
        assert_eq!(restored.sound, machine.sound);
        assert_eq!(restored.v, machine.v);
        assert_eq!(&restored.memory[..], &machine.memory[..]);
        assert_eq!(&restored.screen[..], &machine.screen[..]);
        assert_eq!(restored.stack, machine.stack);
        assert_eq!(restored.sp, machine.sp);
        assert_eq!(restored.cycles, machine.cycles);
        assert_eq!(restored.halt, machine.halt);
        assert_eq!(restored.await_input, machine.await_input);
        assert_eq!(restored.input_register, machine.input_register);
        // And the re-serialization is bit identical.
        assert_eq!(serialize(&restored), serialize(&machine));
    }

    #[test]
    fn register_fields_are_big_endian() {
        let machine = busy_machine();
        let bytes = serialize(&machine);
        assert_eq!(&bytes[0..2], &[0x02, 0x46]); // pc high then low
        assert_eq!(&bytes[2..4], &[0x0A, 0xBC]); // i high then low
        assert_eq!(bytes[4], 17);
        assert_eq!(bytes[5], 3);
        assert_eq!(bytes[6 + 4], 4 * 3); // v[4]
    }

    #[test]
    fn trailer_fields_are_little_endian() {
        let machine = busy_machine();
        let bytes = serialize(&machine);
        let sp_offset = REGISTER_BYTES + MEM_SIZE + SCREEN_SIZE + STACK_SIZE;
        assert_eq!(bytes[sp_offset], 2); // sp low byte first
        let cycle_offset = sp_offset + size_of::<usize>();
        assert_eq!(
            &bytes[cycle_offset..cycle_offset + 8],
            &[0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]
        );
        assert_eq!(&bytes[cycle_offset + 8..], &[1, 1, 0xE]);
    }

    #[test]
    fn disk_round_trip_creates_the_directory_and_reloads() {
        let machine = busy_machine();
        let dir = std::env::temp_dir().join("chip8-vm-savestate-test");
        let path = dir.join("state.ch8");
        save_to_path(&machine, &path).unwrap();
        let restored = load_from_path(&path).unwrap();
        assert_eq!(serialize(&restored), serialize(&machine));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn truncated_snapshot_is_rejected() {
        let bytes = serialize(&busy_machine());
        let error = deserialize(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(error, SnapshotError::UnexpectedLength { .. }));
    }

    #[test]
    fn out_of_range_stack_pointer_is_rejected() {
        let mut bytes = serialize(&Machine::new());
        let sp_offset = REGISTER_BYTES + MEM_SIZE + SCREEN_SIZE + STACK_SIZE;
        bytes[sp_offset] = STACK_SIZE as u8 + 1;
        let error = deserialize(&bytes).unwrap_err();
        assert!(matches!(error, SnapshotError::StackPointerOutOfRange { .. }));
    }

    #[test]
    fn out_of_range_input_register_is_rejected() {
        let mut bytes = serialize(&Machine::new());
        let len = bytes.len();
        bytes[len - 1] = 16;
        let error = deserialize(&bytes).unwrap_err();
        assert!(matches!(error, SnapshotError::InputRegisterOutOfRange { .. }));
    }
}
