//! Property-based tests for the machine-level guarantees: reset, sprite XOR,
//! timers, screen wrap and the call stack.

use chip8vm::{Chip8Interpreter, FaultKind, Quirks, UnknownOpcodePolicy, WIDTH};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn interp(program: &[u8], quirks: Quirks) -> Chip8Interpreter<StdRng> {
    Chip8Interpreter::with_rng(program, quirks, StdRng::seed_from_u64(0x5eed)).unwrap()
}

/// `code` at 0x200, `data` at 0x300
fn image(code: &[u8], data: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0; 0x100];
    bytes[..code.len()].copy_from_slice(code);
    bytes.extend_from_slice(data);
    bytes
}

fn run(i: &mut Chip8Interpreter<StdRng>, steps: usize) {
    for _ in 0..steps {
        i.step().unwrap();
    }
}

proptest! {
    /// Property: whatever a program did, reset leaves the same machine a
    /// fresh load of that program would
    #[test]
    fn prop_reset_matches_fresh_load(
        program in prop::collection::vec(any::<u8>(), 0..64),
        steps in 0usize..100,
        keys in any::<[bool; 16]>(),
        ticks in 0usize..5,
    ) {
        let quirks = Quirks {
            unknown_opcode: UnknownOpcodePolicy::Ignore,
            ..Quirks::default()
        };
        let fresh = interp(&program, quirks);
        let mut i = interp(&program, quirks);
        i.update_keys(keys);
        for _ in 0..steps {
            if i.step().is_err() {
                break;
            }
        }
        for _ in 0..ticks {
            i.tick_timers();
        }
        i.reset();
        prop_assert_eq!(i.machine(), fresh.machine());
        prop_assert!(!i.is_halted());
    }

    /// Property: drawing the same sprite twice at the same place restores the
    /// screen, and the second draw collides iff the sprite has any bit set
    #[test]
    fn prop_draw_twice_restores_screen(
        x in any::<u8>(),
        y in any::<u8>(),
        sprite in prop::collection::vec(any::<u8>(), 1..=15),
    ) {
        let n = sprite.len() as u8;
        // V0 = x; V1 = y; I = 0x300; DRW V0, V1, n; DRW V0, V1, n
        let code = [0x60, x, 0x61, y, 0xa3, 0x00, 0xd0, 0x10 | n, 0xd0, 0x10 | n];
        let mut i = interp(&image(&code, &sprite), Quirks::default());
        run(&mut i, 4);
        prop_assert_eq!(i.v(0xf), 0, "nothing to collide with on a blank screen");
        let drew_something = !i.framebuffer().is_blank();
        prop_assert_eq!(drew_something, sprite.iter().any(|&b| b != 0));

        run(&mut i, 1);
        prop_assert!(i.framebuffer().is_blank());
        prop_assert_eq!(i.v(0xf), drew_something as u8);
        prop_assert!(i.should_redraw());
    }

    /// Property: a timer set to v is zero after exactly v ticks and stays there
    #[test]
    fn prop_delay_timer_counts_down(v in any::<u8>(), extra in 0usize..10) {
        // V0 = v; LD DT, V0
        let mut i = interp(&[0x60, v, 0xf0, 0x15], Quirks::default());
        run(&mut i, 2);
        prop_assert_eq!(i.delay_timer(), v);
        for _ in 1..v {
            i.tick_timers();
        }
        if v > 0 {
            prop_assert_eq!(i.delay_timer(), 1);
            i.tick_timers();
        }
        prop_assert_eq!(i.delay_timer(), 0);
        for _ in 0..extra {
            i.tick_timers();
        }
        prop_assert_eq!(i.delay_timer(), 0);
    }

    /// Property: sprite columns past the right edge land at the left edge of
    /// the same row
    #[test]
    fn prop_sprite_wraps_horizontally(x in 57u8..64, y in 0u8..32) {
        // V0 = x; V1 = y; I = 0x300; DRW V0, V1, 1
        let code = [0x60, x, 0x61, y, 0xa3, 0x00, 0xd0, 0x11];
        let mut i = interp(&image(&code, &[0xff]), Quirks::default());
        run(&mut i, 4);
        let fb = i.framebuffer();
        for k in 0..8 {
            let col = (x as usize + k) % WIDTH;
            prop_assert!(fb.pixel(col, y as usize), "column {} should be lit", col);
        }
        let lit = fb.as_slice().iter().filter(|&&p| p == 1).count();
        prop_assert_eq!(lit, 8);
    }

    /// Property: n nested calls followed by n returns come back to just after
    /// the first call with an empty stack; one more return underflows
    #[test]
    fn prop_calls_and_returns_balance(n in 1usize..=16) {
        // 200: CALL 300; 202: RET
        // 300 + 4k: CALL 300 + 4(k + 1); RET
        // the innermost level is a bare RET
        let code = [0x23, 0x00, 0x00, 0xee];
        let mut chain = Vec::new();
        for k in 0..n - 1 {
            let target = 0x300 + 4 * (k as u16 + 1);
            chain.extend_from_slice(&[0x20 | (target >> 8) as u8, target as u8, 0x00, 0xee]);
        }
        chain.extend_from_slice(&[0x00, 0xee]);
        let mut i = interp(&image(&code, &chain), Quirks::default());

        run(&mut i, n);
        prop_assert_eq!(i.sp() as usize, n);
        run(&mut i, n);
        prop_assert_eq!(i.pc(), 0x202);
        prop_assert_eq!(i.sp(), 0);

        let err = i.step().unwrap_err();
        prop_assert_eq!(err.fault_kind(), Some(FaultKind::StackUnderflow));
        prop_assert_eq!(i.pc(), 0x202);
    }

    /// Property: 7XNN adds modulo 256 and never touches VF
    #[test]
    fn prop_add_immediate_leaves_flag(x in 0u8..15, a in any::<u8>(), b in any::<u8>(), flag in any::<u8>()) {
        // VF = flag; VX = a; ADD VX, b
        let mut i = interp(&[0x6f, flag, 0x60 | x, a, 0x70 | x, b], Quirks::default());
        run(&mut i, 3);
        prop_assert_eq!(i.v(x as usize), a.wrapping_add(b));
        prop_assert_eq!(i.v(0xf), flag);
    }

    /// Property: FX33 writes the three decimal digits of VX
    #[test]
    fn prop_bcd_digits(v in any::<u8>()) {
        // V5 = v; I = 0x300; LD B, V5
        let mut i = interp(&[0x65, v, 0xa3, 0x00, 0xf5, 0x33], Quirks::default());
        run(&mut i, 3);
        let digits = &i.memory()[0x300..0x303];
        prop_assert_eq!(digits, &[v / 100, (v / 10) % 10, v % 10][..]);
        prop_assert_eq!(i.index(), 0x300);
    }
}

#[test]
fn recursion_past_sixteen_overflows() {
    // 200: CALL 200
    let mut i = interp(&[0x22, 0x00], Quirks::default());
    run(&mut i, 16);
    let err = i.step().unwrap_err();
    assert_eq!(err.fault_kind(), Some(FaultKind::StackOverflow));
    assert_eq!(i.pc(), 0x200);
    assert_eq!(i.sp(), 16);
}
