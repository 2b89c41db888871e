/// What to do with an opcode the decoder does not recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownOpcodePolicy {
    /// stop the machine with an `UnknownInstruction` fault
    #[default]
    Halt,
    /// log a warning and carry on with the next instruction
    Ignore,
}

/// Behaviour that historical CHIP-8 interpreters disagree on. None of it is
/// implied by the opcode encoding, so every choice is spelled out here.
///
/// `Default` follows the COSMAC VIP interpreter, which is what most of the
/// classic ROM library was written against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quirks {
    /// 8XY1, 8XY2 and 8XY3 clear VF after the operation
    pub vf_reset: bool,
    /// 8XY6 and 8XYE shift VY into VX; otherwise VX is shifted in place
    pub shift_uses_vy: bool,
    /// BNNN jumps to NNN + VX (X being the top nibble of NNN) instead of NNN + V0
    pub jump_uses_vx: bool,
    /// FX55 and FX65 leave I pointing just past the last register transferred
    pub index_increment: bool,
    /// memory addresses wrap at 4K; otherwise reaching past the end is a fault
    pub wrap_memory: bool,
    pub unknown_opcode: UnknownOpcodePolicy,
}

impl Quirks {
    /// the interpreter that shipped with the RCA COSMAC VIP
    pub const fn cosmac_vip() -> Self {
        Quirks {
            vf_reset: true,
            shift_uses_vy: true,
            jump_uses_vx: false,
            index_increment: true,
            wrap_memory: true,
            unknown_opcode: UnknownOpcodePolicy::Halt,
        }
    }

    /// SUPER-CHIP 1.1 as found on the HP48
    pub const fn super_chip() -> Self {
        Quirks {
            vf_reset: false,
            shift_uses_vy: false,
            jump_uses_vx: true,
            index_increment: false,
            wrap_memory: true,
            unknown_opcode: UnknownOpcodePolicy::Halt,
        }
    }
}

impl Default for Quirks {
    fn default() -> Self {
        Quirks::cosmac_vip()
    }
}
