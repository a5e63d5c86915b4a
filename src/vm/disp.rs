pub const DISPLAY_WIDTH: u8 = 64;
pub const DISPLAY_HEIGHT: u8 = 32;
pub const VIP_DISPLAY_HEIGHT: u8 = 64;

const CLEAR_DISPLAY: DisplayBuffer = [0; VIP_DISPLAY_HEIGHT as usize];

// Each u64 represents a row of the display with each bit representing whether that pixel should be on or not
// Only the first `height` rows are in use
// NOTE: The most signficant bit corresponds to the left-most pixel on the row
pub type DisplayBuffer = [u64; VIP_DISPLAY_HEIGHT as usize];

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum DisplayMode {
    #[default]
    Default,

    // 64x64 mode used by a handful of COSMAC VIP programs
    Vip,
}

impl DisplayMode {
    pub fn dimensions(&self) -> (u8, u8) {
        match self {
            Self::Default => (DISPLAY_WIDTH, DISPLAY_HEIGHT),
            Self::Vip => (DISPLAY_WIDTH, VIP_DISPLAY_HEIGHT),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Display {
    mode: DisplayMode,
    buffer: DisplayBuffer,
}

impl Default for Display {
    fn default() -> Self {
        Display {
            mode: DisplayMode::Default,
            buffer: CLEAR_DISPLAY,
        }
    }
}

impl Display {
    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn width(&self) -> u8 {
        self.mode.dimensions().0
    }

    pub fn height(&self) -> u8 {
        self.mode.dimensions().1
    }

    pub fn set_mode(&mut self, mode: DisplayMode) {
        self.mode = mode;
        self.clear();
    }

    pub fn clear(&mut self) {
        self.buffer = CLEAR_DISPLAY;
    }

    pub fn rows(&self) -> &[u64] {
        &self.buffer[..self.height() as usize]
    }

    pub fn pixel(&self, x: u8, y: u8) -> bool {
        let (width, height) = self.mode.dimensions();
        if x >= width || y >= height {
            return false;
        }
        self.buffer[y as usize] >> (width - 1 - x) & 1 == 1
    }

    pub fn is_blank(&self) -> bool {
        self.rows().iter().all(|&row| row == 0)
    }

    /// XORs `sprite` onto the display with its top-left corner at (`x`, `y`).
    /// Both coordinates and every sprite pixel wrap around the display edges.
    /// Returns true if any lit pixel was turned off.
    pub fn draw(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let (width, height) = self.mode.dimensions();
        let pos_x = (x % width) as u32;
        let pos_y = y % height;

        let mut collided = false;

        for (row_i, &sprite_byte) in sprite.iter().enumerate() {
            let row = (pos_y as usize + row_i) % height as usize;

            // place the byte in the left-most 8 bits then rotate so bits leaving the right edge reappear on the left
            let sprite_row = ((sprite_byte as u64) << (u64::BITS - u8::BITS)).rotate_right(pos_x);

            let display_row = self.buffer[row];
            if display_row & sprite_row != 0 {
                collided = true;
            }

            self.buffer[row] = display_row ^ sprite_row;
        }

        collided
    }
}

impl std::fmt::Display for Display {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = self.width();
        for (y, _) in self.rows().iter().enumerate() {
            let line: String = (0..width)
                .map(|x| if self.pixel(x, y as u8) { '█' } else { ' ' })
                .collect();
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}
