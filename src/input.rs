use crate::keypad::KEY_COUNT;
use crossterm::event::{poll, read, Event, KeyCode};
use crossterm::terminal;
use log::debug;
use std::collections::HashMap;
use std::io;
use std::time::Duration;

/// keys as printed on the COSMAC keypad, '0' => 0x00 ... 'f' => 0x0f
const CHIP8_LITERAL_KEYMAP: [(char, u8); 16] = [
    ('0', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('4', 0x04),
    ('5', 0x05),
    ('6', 0x06),
    ('7', 0x07),
    ('8', 0x08),
    ('9', 0x09),
    ('a', 0x0a),
    ('b', 0x0b),
    ('c', 0x0c),
    ('d', 0x0d),
    ('e', 0x0e),
    ('f', 0x0f),
];

/// ditto using the 4x4 block at the left-hand side of a qwerty keyboard
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// the same physical keys on a dvorak keyboard
const CHIP8_DVORAK_KEYMAP: [(char, u8); 16] = [
    ('q', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('\'', 0x04),
    (',', 0x05),
    ('.', 0x06),
    ('a', 0x07),
    ('o', 0x08),
    ('e', 0x09),
    (';', 0x0a),
    ('j', 0x0b),
    ('4', 0x0c),
    ('p', 0x0d),
    ('u', 0x0e),
    ('k', 0x0f),
];

/// which keymap to read the keyboard with
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum KeyLayout {
    Qwerty,
    Dvorak,
    Hex,
}

impl KeyLayout {
    pub fn keymap(&self) -> HashMap<char, u8> {
        match self {
            KeyLayout::Qwerty => HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
            KeyLayout::Dvorak => HashMap::from(CHIP8_DVORAK_KEYMAP),
            KeyLayout::Hex => HashMap::from(CHIP8_LITERAL_KEYMAP),
        }
    }
}

/// Things the user can ask of the host, besides pressing keypad keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// keypad key went down
    Key(u8),
    Quit,
    TogglePause,
    /// run one instruction and stay paused
    Step,
    Reset,
    ToggleMute,
}

/// reads keypresses
pub trait Input {
    /// everything that happened since the last call, oldest first
    fn poll_events(&mut self) -> Result<Vec<HostEvent>, io::Error>;
}

/// Terminals report key presses but (mostly) not releases, so a key counts
/// as held for a few frames after each press. Auto-repeat keeps a held key
/// topped up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLatch {
    hold_frames: u8,
    remaining: [u8; KEY_COUNT],
}

impl KeyLatch {
    pub fn new(hold_frames: u8) -> Self {
        KeyLatch {
            hold_frames,
            remaining: [0; KEY_COUNT],
        }
    }

    pub fn press(&mut self, key: u8) {
        self.remaining[(key & 0x0f) as usize] = self.hold_frames;
    }

    /// which keys are down this frame; then age every key by one frame
    pub fn next_frame(&mut self) -> [bool; KEY_COUNT] {
        let mut keys = [false; KEY_COUNT];
        for (held, left) in keys.iter_mut().zip(self.remaining.iter_mut()) {
            *held = *left > 0;
            *left = left.saturating_sub(1);
        }
        keys
    }
}

/// simple implementation of Input, reading the terminal in raw mode
pub struct StdinInput {
    keymap: HashMap<char, u8>,
}

impl StdinInput {
    pub fn new(layout: KeyLayout) -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(StdinInput {
            keymap: layout.keymap(),
        })
    }

    fn translate(&self, code: KeyCode) -> Option<HostEvent> {
        match code {
            KeyCode::Esc => Some(HostEvent::Quit),
            KeyCode::Char(' ') => Some(HostEvent::TogglePause),
            KeyCode::Enter => Some(HostEvent::Step),
            KeyCode::Backspace => Some(HostEvent::Reset),
            KeyCode::Tab => Some(HostEvent::ToggleMute),
            KeyCode::Char(key) => match self.keymap.get(&key.to_ascii_lowercase()) {
                Some(mapped_key) => Some(HostEvent::Key(*mapped_key)),
                None => {
                    debug!("can't map {:?} to a COSMAC key", key);
                    None
                }
            },
            _ => None,
        }
    }
}

impl Drop for StdinInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Input for StdinInput {
    fn poll_events(&mut self) -> Result<Vec<HostEvent>, io::Error> {
        let mut events = Vec::new();
        while poll(Duration::from_millis(0))? {
            if let Event::Key(evt) = read()? {
                events.extend(self.translate(evt.code));
            }
        }
        Ok(events)
    }
}

/// dummy Input implementation for testing; hands out one batch per poll
pub struct DummyInput {
    batches: Vec<Vec<HostEvent>>,
}

impl DummyInput {
    pub fn new(batches: Vec<Vec<HostEvent>>) -> Self {
        let mut batches = batches;
        batches.reverse();
        DummyInput { batches }
    }
}

impl Input for DummyInput {
    fn poll_events(&mut self) -> Result<Vec<HostEvent>, io::Error> {
        Ok(self.batches.pop().unwrap_or_default())
    }
}
