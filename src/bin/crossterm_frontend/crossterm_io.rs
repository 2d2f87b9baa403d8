use chip8_vm::emulator::input::EmulatorInput;
use chip8_vm::emulator::machine::{SCREEN_HEIGHT, SCREEN_SIZE, SCREEN_WIDTH};
use chip8_vm::emulator::output::EmulatorOutput;

use crossterm::event::{self, Event, KeyCode, KeyEvent};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use std::collections::VecDeque;
use std::io::{stdout, Write};
use std::time::{Duration, Instant};

/// Terminals report key presses but no releases, so a key counts as held
/// for a short window after its last press.
const HELD_WINDOW: Duration = Duration::from_millis(250);

pub struct CrosstermInput {
    presses: VecDeque<u8>,
    last_press: Option<(u8, Instant)>,
    quit: bool,
    save: bool,
}

impl CrosstermInput {
    pub fn new() -> CrosstermInput {
        CrosstermInput {
            presses: VecDeque::new(),
            last_press: None,
            quit: false,
            save: false,
        }
    }
}

impl EmulatorInput for CrosstermInput {
    fn poll(&mut self) {
        while let Ok(true) = event::poll(Duration::from_millis(0)) {
            let event = match event::read() {
                Ok(event) => event,
                Err(_) => return,
            };
            if let Event::Key(KeyEvent { code, .. }) = event {
                match code {
                    KeyCode::Esc => self.quit = true,
                    KeyCode::F(5) => self.save = true,
                    KeyCode::Char(c) => {
                        if let Some(key) = char_to_key(c) {
                            self.presses.push_back(key);
                            self.last_press = Some((key, Instant::now()));
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    fn key_down(&mut self) -> Option<u8> {
        self.presses.pop_front()
    }

    fn is_held(&self, key: u8) -> bool {
        match self.last_press {
            Some((k, at)) => k == key && at.elapsed() < HELD_WINDOW,
            None => false,
        }
    }

    fn quit_requested(&self) -> bool {
        self.quit
    }

    fn save_requested(&mut self) -> bool {
        std::mem::replace(&mut self.save, false)
    }
}

/// Maps the left-hand block of a QWERTY keyboard onto the 4x4 hex pad.
fn char_to_key(c: char) -> Option<u8> {
    let key = match c.to_ascii_lowercase() {
        '1' => 0x1,
        '2' => 0x2,
        '3' => 0x3,
        '4' => 0xC,
        'q' => 0x4,
        'w' => 0x5,
        'e' => 0x6,
        'r' => 0xD,
        'a' => 0x7,
        's' => 0x8,
        'd' => 0x9,
        'f' => 0xE,
        'z' => 0xA,
        'x' => 0x0,
        'c' => 0xB,
        'v' => 0xF,
        _ => return None,
    };
    Some(key)
}

pub struct CrosstermOutput {
    cells: [u8; SCREEN_SIZE],
}

impl CrosstermOutput {
    pub fn new() -> CrosstermOutput {
        execute!(stdout(), EnterAlternateScreen).ok();
        execute!(stdout(), cursor::Hide).ok();
        terminal::enable_raw_mode().ok();
        execute!(stdout(), Clear(ClearType::All)).ok();

        // Each pixel is two columns wide so the display is roughly square.
        let bottom = SCREEN_HEIGHT + 2;
        let right = 2 * SCREEN_WIDTH + 2;
        for y in 1..=bottom {
            for x in 1..=right {
                if y == 1 || y == bottom || x == 1 || x == right {
                    let c = if y == 1 && x == 1 {
                        '┏'
                    } else if y == 1 && x == right {
                        '┓'
                    } else if y == bottom && x == 1 {
                        '┗'
                    } else if y == bottom && x == right {
                        '┛'
                    } else if y == 1 || y == bottom {
                        '━'
                    } else {
                        '┃'
                    };
                    execute!(stdout(), cursor::MoveTo(x as u16, y as u16)).ok();
                    write!(stdout(), "{}", c).ok();
                }
            }
        }
        stdout().flush().ok();

        CrosstermOutput {
            cells: [0; SCREEN_SIZE],
        }
    }

    fn draw(&self, x: usize, y: usize, state: u8) {
        execute!(stdout(), cursor::MoveTo(2 * x as u16 + 2, y as u16 + 2)).ok();
        write!(stdout(), "{}", if state != 0 { "██" } else { "  " }).ok();
    }
}

impl Drop for CrosstermOutput {
    fn drop(&mut self) {
        terminal::disable_raw_mode().ok();
        execute!(stdout(), LeaveAlternateScreen).ok();
        execute!(stdout(), cursor::Show).ok();
    }
}

impl EmulatorOutput for CrosstermOutput {
    fn render(&mut self, screen: &[u8; SCREEN_SIZE]) {
        for index in 0..SCREEN_SIZE {
            if self.cells[index] != screen[index] {
                self.cells[index] = screen[index];
                self.draw(index % SCREEN_WIDTH, index / SCREEN_WIDTH, screen[index]);
            }
        }
        stdout().flush().ok();
    }
}
