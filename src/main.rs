use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use env_logger::{Env, Target};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use chip8vm::display::MonoTermDisplay;
use chip8vm::host::{frame_duration, Host};
use chip8vm::input::{KeyLatch, KeyLayout, StdinInput};
use chip8vm::session::DEFAULT_SPEED;
use chip8vm::sound::SimpleBeep;
use chip8vm::{disassemble, Chip8Interpreter, Quirks, Session, UnknownOpcodePolicy, PROGRAM_ADDR};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum QuirkPreset {
    /// RCA COSMAC VIP
    Vip,
    /// SUPER-CHIP on the HP48
    Schip,
}

#[derive(Parser, Debug)]
#[command(name = "chip8vm", about = "Run a CHIP-8 program in the terminal.")]
struct Args {
    /// Program image to load at 0x200.
    #[arg(value_name = "ROM")]
    rom: PathBuf,

    /// Instructions executed per 60Hz frame.
    #[arg(long, default_value_t = DEFAULT_SPEED)]
    speed: u32,

    /// Which keyboard keys stand in for the 4x4 keypad.
    #[arg(long, value_enum, default_value_t = KeyLayout::Qwerty)]
    layout: KeyLayout,

    /// Frames a key stays down after the terminal reports a press.
    #[arg(long, default_value_t = 6)]
    hold_frames: u8,

    /// Start with the buzzer off (Tab toggles).
    #[arg(long, default_value_t = false)]
    muted: bool,

    /// Start paused (Space resumes, Enter steps).
    #[arg(long, default_value_t = false)]
    paused: bool,

    /// Base set of quirks; the --quirk-* flags override single entries.
    #[arg(long, value_enum, default_value_t = QuirkPreset::Vip)]
    quirks: QuirkPreset,

    /// 8XY1/8XY2/8XY3 clear VF.
    #[arg(long = "quirk-vf-reset", value_name = "BOOL")]
    vf_reset: Option<bool>,

    /// 8XY6/8XYE shift VY into VX.
    #[arg(long = "quirk-shift-uses-vy", value_name = "BOOL")]
    shift_uses_vy: Option<bool>,

    /// BNNN adds VX instead of V0.
    #[arg(long = "quirk-jump-uses-vx", value_name = "BOOL")]
    jump_uses_vx: Option<bool>,

    /// FX55/FX65 advance I past the registers transferred.
    #[arg(long = "quirk-index-increment", value_name = "BOOL")]
    index_increment: Option<bool>,

    /// Addresses wrap at 4K; when false, reaching past the end halts.
    #[arg(long = "quirk-wrap-memory", value_name = "BOOL")]
    wrap_memory: Option<bool>,

    /// Skip unknown opcodes with a warning instead of halting.
    #[arg(long, default_value_t = false)]
    ignore_unknown: bool,

    /// Seed for CXNN, for repeatable runs.
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Write logs here (RUST_LOG picks the level); nothing is logged otherwise.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print a listing of the program and exit.
    #[arg(long, default_value_t = false)]
    disassemble: bool,
}

impl Args {
    fn quirks(&self) -> Quirks {
        let mut quirks = match self.quirks {
            QuirkPreset::Vip => Quirks::cosmac_vip(),
            QuirkPreset::Schip => Quirks::super_chip(),
        };
        if let Some(on) = self.vf_reset {
            quirks.vf_reset = on;
        }
        if let Some(on) = self.shift_uses_vy {
            quirks.shift_uses_vy = on;
        }
        if let Some(on) = self.jump_uses_vx {
            quirks.jump_uses_vx = on;
        }
        if let Some(on) = self.index_increment {
            quirks.index_increment = on;
        }
        if let Some(on) = self.wrap_memory {
            quirks.wrap_memory = on;
        }
        if self.ignore_unknown {
            quirks.unknown_opcode = UnknownOpcodePolicy::Ignore;
        }
        quirks
    }
}

fn init_logging(log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    // stderr belongs to the TUI, so without a file the default is silence
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            env_logger::Builder::from_env(Env::default().default_filter_or("info"))
                .target(Target::Pipe(Box::new(file)))
                .init();
        }
        None => env_logger::Builder::from_env(Env::default().default_filter_or("off")).init(),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    let program = fs::read(&args.rom)
        .with_context(|| format!("reading program {}", args.rom.display()))?;

    if args.disassemble {
        for line in disassemble(&program, PROGRAM_ADDR) {
            println!("{}", line);
        }
        return Ok(());
    }

    let quirks = args.quirks();
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut interpreter = Chip8Interpreter::with_rng(&program, quirks, rng)
        .with_context(|| format!("loading {}", args.rom.display()))?;
    info!("running {} with {:?}", args.rom.display(), quirks);

    let mut session = Session::new(args.speed);
    session.muted = args.muted;
    session.paused = args.paused;

    // the host owns the terminal; it must be gone before we print anything
    let exit = {
        let mut host = Host::new(
            MonoTermDisplay::new().context("setting up the terminal")?,
            StdinInput::new(args.layout).context("setting up the keyboard")?,
            SimpleBeep::new(),
            KeyLatch::new(args.hold_frames),
            frame_duration(),
        );
        host.run(&mut interpreter, &mut session, None)?
    };
    info!("quit after {} frames", exit.frames);

    if let Some(fault) = exit.fault {
        bail!(fault);
    }
    Ok(())
}
