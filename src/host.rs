use crate::display::{DebugInfo, Display};
use crate::error::Chip8Error;
use crate::input::{HostEvent, Input, KeyLatch};
use crate::interpreter::Chip8Interpreter;
use crate::session::Session;
use crate::sound::Sound;
use crate::timer::TIMER_HZ;
use anyhow::Context;
use log::{error, warn};
use rand::RngCore;
use std::time::{Duration, Instant};

/// one 60Hz frame
pub fn frame_duration() -> Duration {
    Duration::from_secs(1) / TIMER_HZ
}

/// How a run of the host loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostExit {
    pub frames: u64,
    /// the fault the machine was halted on when we left, if any
    pub fault: Option<Chip8Error>,
}

/// Glues an interpreter to a screen, a keyboard and a buzzer, and keeps the
/// whole lot running at 60 frames a second.
pub struct Host<D: Display, I: Input, S: Sound> {
    display: D,
    input: I,
    sound: S,
    latch: KeyLatch,
    frame_time: Duration,
    sound_broken: bool,
}

impl<D: Display, I: Input, S: Sound> Host<D, I, S> {
    pub fn new(display: D, input: I, sound: S, latch: KeyLatch, frame_time: Duration) -> Self {
        Host {
            display,
            input,
            sound,
            latch,
            frame_time,
            sound_broken: false,
        }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn sound(&self) -> &S {
        &self.sound
    }

    /// Run frames until the user quits or `max_frames` go by. A fault pauses
    /// the session rather than ending the loop, so the user can still look at
    /// the debug panel and reset.
    pub fn run<R: RngCore + Clone>(
        &mut self,
        interpreter: &mut Chip8Interpreter<R>,
        session: &mut Session,
        max_frames: Option<u64>,
    ) -> anyhow::Result<HostExit> {
        let mut frames = 0;
        let mut dirty = true;
        while max_frames.map_or(true, |max| frames < max) {
            let start = Instant::now();
            frames += 1;

            for event in self.input.poll_events().context("reading keyboard")? {
                dirty = true;
                match event {
                    HostEvent::Key(key) => self.latch.press(key),
                    HostEvent::Quit => return Ok(self.exit(interpreter, frames)),
                    HostEvent::TogglePause => session.toggle_pause(),
                    HostEvent::Step => session.request_step(),
                    HostEvent::Reset => interpreter.reset(),
                    HostEvent::ToggleMute => session.toggle_mute(),
                }
            }
            session.keys = self.latch.next_frame();

            let beep = match session.run_frame(interpreter) {
                Ok(report) => {
                    dirty |= report.redraw || report.steps > 0;
                    report.beep
                }
                Err(e) => {
                    if !session.paused {
                        error!("{}", e);
                        session.paused = true;
                    }
                    dirty = true;
                    false
                }
            };
            self.sync_sound(beep);

            if dirty {
                let info = DebugInfo::capture(interpreter, session);
                self.display
                    .draw(interpreter.framebuffer(), &info)
                    .context("drawing screen")?;
                dirty = false;
            }

            let elapsed = start.elapsed();
            if elapsed < self.frame_time {
                spin_sleep::sleep(self.frame_time - elapsed);
            }
        }
        Ok(self.exit(interpreter, frames))
    }

    fn sync_sound(&mut self, on: bool) {
        if self.sound_broken {
            return;
        }
        if let Err(e) = self.sound.sync(on) {
            warn!("sound disabled: {}", e);
            self.sound_broken = true;
        }
    }

    fn exit<R: RngCore>(&mut self, interpreter: &Chip8Interpreter<R>, frames: u64) -> HostExit {
        self.sync_sound(false);
        let fault = interpreter.halted_on().cloned();
        HostExit { frames, fault }
    }
}
