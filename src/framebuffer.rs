pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;

/// Monochrome 64x32 screen memory, one byte (0 or 1) per pixel, row-major.
///
/// Sprites are XOR-ed on and wrap around both edges rather than clipping.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: [u8; WIDTH * HEIGHT],
}

impl FrameBuffer {
    pub fn new() -> Self {
        FrameBuffer {
            pixels: [0; WIDTH * HEIGHT],
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// XOR a sprite onto the screen with its top left corner at (x, y).
    ///
    /// Each byte is one 8 pixel row, most significant bit leftmost. Returns
    /// true if any pixel that was on got switched off.
    pub fn blit(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let x = x % WIDTH;
        let y = y % HEIGHT;
        let mut collision = false;
        for (row, bits) in sprite.iter().enumerate() {
            let py = (y + row) % HEIGHT;
            for col in 0..8 {
                if bits & (0x80 >> col) == 0 {
                    continue;
                }
                let px = (x + col) % WIDTH;
                let cell = &mut self.pixels[py * WIDTH + px];
                collision |= *cell == 1;
                *cell ^= 1;
            }
        }
        collision
    }

    /// pixel state at (x, y); coordinates wrap
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[(y % HEIGHT) * WIDTH + (x % WIDTH)] == 1
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.pixels
    }

    /// one slice of `WIDTH` pixels per screen row, top first
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.pixels.chunks(WIDTH)
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&p| p == 0)
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        FrameBuffer::new()
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for row in self.rows() {
            let line: String = row.iter().map(|&p| if p == 1 { '#' } else { '.' }).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
