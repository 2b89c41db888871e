/// number of keys on the COSMAC hex keypad, 0x0-0xF
pub const KEY_COUNT: usize = 16;

/// Snapshot of which keys are held down. The host overwrites it wholesale;
/// there's no notion of press or release events in here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Keypad {
    keys: [bool; KEY_COUNT],
}

impl Keypad {
    pub fn new() -> Self {
        Keypad::default()
    }

    pub fn set(&mut self, keys: [bool; KEY_COUNT]) {
        self.keys = keys;
    }

    /// only the low nibble of `key` counts, like on the real hardware
    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys[(key & 0x0f) as usize]
    }

    pub fn any_pressed(&self) -> bool {
        self.keys.iter().any(|&k| k)
    }

    /// lowest numbered key held down, if any
    pub fn first_pressed(&self) -> Option<u8> {
        self.keys.iter().position(|&k| k).map(|k| k as u8)
    }

    pub fn as_array(&self) -> &[bool; KEY_COUNT] {
        &self.keys
    }
}
