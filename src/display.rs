use crate::framebuffer::{FrameBuffer, HEIGHT, WIDTH};
use crate::interpreter::Chip8Interpreter;
use crate::session::Session;
use rand::RngCore;
use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::{Constraint, Direction, Layout, Rect};
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::text::{Span, Spans};
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders, Paragraph};
use tui::Terminal;

/// Display is used by the host to put the machine's screen somewhere. It
/// should abstract the implementation details, so a variety of kinds of
/// screen would work.
pub trait Display {
    /// draw the frame buffer, plus whatever debug info the display has room for
    fn draw(&mut self, frame: &FrameBuffer, info: &DebugInfo) -> Result<(), io::Error>;
}

/// register dump for the side panel, captured once per frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugInfo {
    pub pc: u16,
    pub i: u16,
    pub sp: u8,
    pub delay: u8,
    pub sound: u8,
    pub v: [u8; 16],
    /// disassembly of the instruction at PC
    pub next: String,
    /// paused / muted / halted
    pub status: String,
}

impl DebugInfo {
    pub fn capture<R: RngCore>(interpreter: &Chip8Interpreter<R>, session: &Session) -> Self {
        let next = match interpreter.current_instruction() {
            Some((_, Some(i))) => i.describe(interpreter.quirks()),
            Some((opcode, None)) => format!("DW {:#06x}", opcode),
            None => String::from("??"),
        };
        let status = match interpreter.fault() {
            Some(kind) => format!("HALTED: {}", kind),
            None if session.paused => String::from("paused"),
            None => String::from("running"),
        };
        DebugInfo {
            pc: interpreter.pc(),
            i: interpreter.index(),
            sp: interpreter.sp(),
            delay: interpreter.delay_timer(),
            sound: interpreter.sound_timer(),
            v: *interpreter.registers(),
            next,
            status: if session.muted {
                format!("{} (muted)", status)
            } else {
                status
            },
        }
    }

    /// one string per panel line
    fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("PC={:04x} I={:04x} SP={:02x}", self.pc, self.i, self.sp),
            format!("DT={:02x} ST={:02x}", self.delay, self.sound),
        ];
        for r in 0..8 {
            lines.push(format!(
                "V{:X}={:02x}  V{:X}={:02x}",
                r,
                self.v[r],
                r + 8,
                self.v[r + 8]
            ));
        }
        lines.push(String::new());
        lines.push(self.next.clone());
        lines.push(self.status.clone());
        lines
    }
}

// store useful metadata about the screen
struct Resolution(usize, usize);

impl Resolution {
    fn pixel_count(&self) -> usize {
        self.0 * self.1
    }

    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    /// coordinates of every pixel whose value is `bitplane`, in canvas space
    fn bitplane_from_data<'a>(
        &self,
        data: &'a [u8],
        bitplane: u8,
    ) -> impl std::iter::Iterator<Item = (f64, f64)> + 'a {
        let mut count = self.pixel_count().min(data.len());
        let w = self.0;
        std::iter::from_fn(move || {
            while count > 0 {
                count -= 1;
                if data[count] == bitplane {
                    return Some((
                        (count % w) as f64,        // x
                        -1.0 * (count / w) as f64, // y
                    ));
                }
            }
            None
        })
    }
}

/// monochrome display in a terminal, rendered using TUI and crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
}

impl MonoTermDisplay {
    pub fn new() -> Result<MonoTermDisplay, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(MonoTermDisplay {
            terminal,
            resolution: Resolution(WIDTH, HEIGHT),
        })
    }
}

impl Drop for MonoTermDisplay {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, frame: &FrameBuffer, info: &DebugInfo) -> Result<(), io::Error> {
        let data = frame.as_slice();
        let resolution = &self.resolution;
        let lines: Vec<Spans> = info
            .lines()
            .into_iter()
            .map(|l| Spans::from(Span::raw(l)))
            .collect();

        // for now this assumes a 1:1 ratio between terminal cells, chip8
        // pixels and the internal TUI canvas
        self.terminal.draw(|f| {
            let screen = Rect::new(0, 0, 2 + resolution.0 as u16, 2 + resolution.1 as u16);
            let area = f.size();
            let height = screen.height.min(area.height);
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(screen.width), Constraint::Min(24)].as_ref())
                .split(area);

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(resolution.x_bounds())
                .y_bounds(resolution.y_bounds())
                .marker(Marker::Block)
                .paint(|ctx| {
                    // expand each bitplane into x, y float coords, suitable for
                    // rendering with TUI. this just prints blocky points for now
                    ctx.draw(&Points {
                        coords: &resolution.bitplane_from_data(data, 0).collect::<Vec<_>>(),
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &resolution.bitplane_from_data(data, 1).collect::<Vec<_>>(),
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, Rect { height, ..chunks[0] });

            let panel = Paragraph::new(lines.clone())
                .block(Block::default().title("debug").borders(Borders::ALL));
            f.render_widget(panel, Rect { height, ..chunks[1] });
        })?;
        Ok(())
    }
}

/// useful for testing host loops without a terminal; remembers what it drew
#[derive(Default)]
pub struct DummyDisplay {
    pub frames: usize,
    pub last: Option<DebugInfo>,
}

impl DummyDisplay {
    pub fn new() -> Self {
        DummyDisplay::default()
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, _frame: &FrameBuffer, info: &DebugInfo) -> Result<(), io::Error> {
        self.frames += 1;
        self.last = Some(info.clone());
        Ok(())
    }
}
