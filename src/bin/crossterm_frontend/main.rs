use std::path::PathBuf;
use std::process;

use structopt::StructOpt;

use chip8_vm::emulator::machine::DEFAULT_FONT;
use chip8_vm::emulator::quirks::Quirks;
use chip8_vm::emulator::random::ThreadRandom;
use chip8_vm::emulator::savestate;
use chip8_vm::emulator::session::Session;
use chip8_vm::emulator::timing::SystemClock;
use chip8_vm::emulator::Emulator;

mod crossterm_io;
use crossterm_io::{CrosstermInput, CrosstermOutput};

/// The program options.
#[derive(StructOpt)]
struct Opt {
    /// The ROM to execute
    #[structopt(parse(from_os_str))]
    rom: PathBuf,

    /// Font file (80 bytes); the built-in glyphs are used if not given
    #[structopt(short, long, parse(from_os_str))]
    font: Option<PathBuf>,

    /// Trace every executed instruction to stderr
    #[structopt(short, long)]
    debug: bool,

    /// Use the original interpreter's shift and block-transfer conventions
    #[structopt(long)]
    classic: bool,

    /// Instructions per second
    #[structopt(long, default_value = "1000")]
    tps: u64,

    /// Where F5 snapshots are written
    #[structopt(long, default_value = "states/state.ch8", parse(from_os_str))]
    state: PathBuf,

    /// Restore the state file before starting
    #[structopt(long)]
    restore: bool,
}

fn main() {
    let opt = Opt::from_args();
    init_logging(opt.debug);

    if let Err(error) = run(opt) {
        // The terminal has been restored by the time we get here; the
        // session and its raw-mode guard are dropped inside run.
        eprintln!("{}", error);
        process::exit(1);
    }
}

fn run(opt: Opt) -> Result<(), Box<dyn std::error::Error>> {
    if opt.tps == 0 {
        return Err("--tps must be at least 1".into());
    }

    log::info!("executing {:?}", &opt.rom);
    let program = std::fs::read(&opt.rom)?;
    let font = match &opt.font {
        Some(path) => std::fs::read(path)?,
        None => DEFAULT_FONT.to_vec(),
    };

    let quirks = if opt.classic {
        Quirks::classic()
    } else {
        Quirks::modern()
    };
    let mut emulator = Emulator::with_parts(
        CrosstermInput::new(),
        CrosstermOutput::new(),
        ThreadRandom,
        quirks,
    );
    emulator.load_font(&font)?;
    emulator.load_program(&program)?;
    if opt.restore {
        *emulator.machine_mut() = savestate::load_from_path(&opt.state)?;
    }

    let mut session = Session::with_rate(emulator, SystemClock::new(), opt.tps);
    session.set_state_path(opt.state);
    session.run();

    Ok(())
}

fn init_logging(debug: bool) {
    let mut builder = pretty_env_logger::formatted_builder();
    if let Ok(filter) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    } else if debug {
        builder.filter_level(log::LevelFilter::Trace);
    } else {
        builder.filter_level(log::LevelFilter::Warn);
    }
    builder.init();
}
