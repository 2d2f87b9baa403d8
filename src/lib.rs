/*!

A CHIP-8 virtual machine as specified at https://en.wikipedia.org/wiki/CHIP-8.

# Crossterm frontend

To run a ROM in the terminal, use
`cargo run --release --bin crossterm_frontend -- <rom>`.
The 1234/QWER/ASDF/ZXCV block maps onto the 16-key pad, Esc quits and F5
writes a snapshot of the machine state. `--classic` selects the original
interpreter's shift and block-transfer conventions, `--tps` changes the
instruction rate, and `--restore` resumes from a saved snapshot.

# Library

The engine itself never touches I/O; keyboard, display, clock and random
bytes are traits you can implement. With the dummy implementations you can
drive the machine directly:

```rust
use chip8_vm::emulator::Emulator;

let mut emulator = Emulator::new();

// v0 = 42, then the halt sentinel.
emulator.load_program(&[0x60, 0x2A, 0x00, 0x00]).unwrap();
emulator.step();
emulator.step();

assert_eq!(emulator.machine().v()[0], 42);
assert!(emulator.machine().halted());
```

The historical opcode conventions are resolved once at construction:

```rust
use chip8_vm::emulator::input::DummyInput;
use chip8_vm::emulator::output::DummyOutput;
use chip8_vm::emulator::quirks::Quirks;
use chip8_vm::emulator::random::ThreadRandom;
use chip8_vm::emulator::Emulator;

let emulator = Emulator::with_parts(DummyInput, DummyOutput, ThreadRandom, Quirks::classic());
assert_eq!(emulator.quirks(), Quirks::classic());
```

For real-time execution, a [`emulator::session::Session`] gates stepping at a
configurable instruction rate and counts the timer registers down at 60 Hz:

```rust
use chip8_vm::emulator::session::Session;
use chip8_vm::emulator::timing::SystemClock;
use chip8_vm::emulator::Emulator;

let mut emulator = Emulator::new();
emulator.load_program(&[0x12, 0x00]).unwrap(); // loop forever
let mut session = Session::new(emulator, SystemClock::new());
session.poll(); // one loop iteration
```

Machine state can be serialized to a fixed binary layout and restored later;
see [`emulator::savestate`].

*/

pub mod emulator;
pub mod util;
