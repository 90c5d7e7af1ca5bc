//! Render collaborator contract and the fixed menu palette.
//!
//! The menu core never touches pixels; every position is computed from
//! measured text widths/heights against the fixed screen metrics below.

/// Screen metrics of the handheld's native framebuffer.
pub const SCREEN_WIDTH: u32 = 320;
pub const SCREEN_HEIGHT: u32 = 240;

/// Pack an 8-bit-per-channel color into RGB565.
pub const fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    (((r as u16) & 0xF8) << 8) | (((g as u16) & 0xFC) << 3) | ((b as u16) >> 3)
}

pub const COLOR_BACKGROUND: u16 = rgb565(0, 48, 0);
pub const COLOR_INACTIVE_TEXT: u16 = rgb565(64, 160, 64);
pub const COLOR_INACTIVE_OUTLINE: u16 = rgb565(0, 0, 0);
pub const COLOR_ACTIVE_TEXT: u16 = rgb565(255, 255, 255);
pub const COLOR_ACTIVE_OUTLINE: u16 = rgb565(0, 0, 0);
pub const COLOR_TITLE_TEXT: u16 = rgb565(128, 255, 128);
pub const COLOR_TITLE_OUTLINE: u16 = rgb565(0, 96, 0);
pub const COLOR_ERROR_TEXT: u16 = rgb565(255, 64, 64);
pub const COLOR_ERROR_OUTLINE: u16 = rgb565(80, 0, 0);

/// Render collaborator: text measurement, outlined text, fill and present.
pub trait Surface {
    /// Rendered width of `text` in pixels.
    fn text_width(&self, text: &str) -> u32;

    /// Rendered height of `text` in pixels. Row layout uses `" "` as the
    /// reference glyph.
    fn text_height(&self, text: &str) -> u32;

    /// Draw `text` with a one-pixel outline at the given pixel position.
    fn print_outline(&mut self, text: &str, text_color: u16, outline_color: u16, x: u32, y: u32);

    /// Fill the whole surface with a solid color.
    fn fill(&mut self, color: u16);

    /// Present the frame. On backends without synchronized flips the caller
    /// paces itself with a short sleep.
    fn flip(&mut self);
}
