/// how often the host should call `Timers::tick`
pub const TIMER_HZ: u32 = 60;

/// 8-bit countdown that sticks at zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timer(u8);

impl Timer {
    pub fn set(&mut self, value: u8) {
        self.0 = value;
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    pub fn tick(&mut self) {
        self.0 = self.0.saturating_sub(1);
    }

    pub fn is_running(&self) -> bool {
        self.0 != 0
    }
}

/// The delay and sound timers. Only `tick` counts them down; executing
/// instructions never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timers {
    pub delay: Timer,
    pub sound: Timer,
}

impl Timers {
    pub fn tick(&mut self) {
        self.delay.tick();
        self.sound.tick();
    }

    /// the buzzer sounds for exactly as long as the sound timer is non-zero
    pub fn should_beep(&self) -> bool {
        self.sound.is_running()
    }
}
