use crate::error::Chip8Error;
use crate::interpreter::Chip8Interpreter;
use crate::keypad::KEY_COUNT;
use log::debug;
use rand::RngCore;

/// instructions per 60Hz frame unless told otherwise
pub const DEFAULT_SPEED: u32 = 10;

/// What a host should do after a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameReport {
    /// instructions actually executed
    pub steps: u32,
    /// at least one of them touched the screen
    pub redraw: bool,
    /// the buzzer should be on (always false while muted)
    pub beep: bool,
}

/// Host-side state that isn't part of the machine: which keys are down,
/// whether we're paused or muted, and how fast to run. The host owns one of
/// these and hands the interpreter to it once per frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub keys: [bool; KEY_COUNT],
    pub paused: bool,
    pub muted: bool,
    /// instructions per frame
    pub speed: u32,
    single_step: bool,
}

impl Session {
    pub fn new(speed: u32) -> Self {
        Session {
            keys: [false; KEY_COUNT],
            paused: false,
            muted: false,
            speed,
            single_step: false,
        }
    }

    pub fn press(&mut self, key: u8) {
        self.keys[(key & 0x0f) as usize] = true;
    }

    pub fn release(&mut self, key: u8) {
        self.keys[(key & 0x0f) as usize] = false;
    }

    pub fn release_all(&mut self) {
        self.keys = [false; KEY_COUNT];
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        debug!("paused: {}", self.paused);
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        debug!("muted: {}", self.muted);
    }

    /// pause, and run exactly one instruction on the next frame
    pub fn request_step(&mut self) {
        self.paused = true;
        self.single_step = true;
    }

    /// Drive the interpreter for one 60Hz frame: `speed` instructions (or a
    /// single one if a step was requested), each seeing the current keys,
    /// then one timer tick. Nothing runs and the timers stand still while
    /// paused.
    pub fn run_frame<R: RngCore>(
        &mut self,
        interpreter: &mut Chip8Interpreter<R>,
    ) -> Result<FrameReport, Chip8Error> {
        let count = if self.single_step {
            self.single_step = false;
            1
        } else if self.paused {
            return Ok(FrameReport {
                beep: !self.muted && interpreter.should_beep(),
                ..FrameReport::default()
            });
        } else {
            self.speed
        };

        let mut report = FrameReport::default();
        for _ in 0..count {
            interpreter.update_keys(self.keys);
            let outcome = interpreter.step()?;
            report.steps += 1;
            report.redraw |= outcome.redraw;
        }
        interpreter.tick_timers();
        report.beep = !self.muted && interpreter.should_beep();
        Ok(report)
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new(DEFAULT_SPEED)
    }
}
