use std::path::PathBuf;

use structopt::StructOpt;

use chip8_vm::emulator::machine::DEFAULT_FONT;
use chip8_vm::emulator::session::Session;
use chip8_vm::emulator::timing::SystemClock;
use chip8_vm::emulator::Emulator;

/// The program options.
#[derive(StructOpt)]
struct Opt {
    /// The ROM to execute
    #[structopt(parse(from_os_str))]
    rom: PathBuf,

    /// Instructions per second
    #[structopt(long, default_value = "1000")]
    tps: u64,
}

/// Runs a ROM with no keyboard or display until the machine halts, then
/// prints the final framebuffer. ROMs that never halt run forever.
fn main() -> std::io::Result<()> {
    env_logger::init();

    let opt = Opt::from_args();
    if opt.tps == 0 {
        eprintln!("--tps must be at least 1");
        std::process::exit(1);
    }

    log::info!("executing {:?}", &opt.rom);
    let program = std::fs::read(&opt.rom)?;

    let mut emulator = Emulator::new();
    if let Err(error) = emulator
        .load_font(&DEFAULT_FONT)
        .and_then(|()| emulator.load_program(&program))
    {
        eprintln!("{}", error);
        std::process::exit(1);
    }

    let mut session = Session::with_rate(emulator, SystemClock::new(), opt.tps);
    session.run();

    println!("{}", session.emulator().machine());
    println!("halted after {} cycles", session.emulator().machine().cycles());
    Ok(())
}
