//! Emulator collaborator: the core being paused while the menu runs.

/// Live counters displayed read-only by the debug menus.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmuStats {
    /// Translation cache bytes at peak, [read-only region, writable region].
    pub translation_bytes_peak: [u64; 2],
    /// Translation cache bytes flushed, [read-only region, writable region].
    pub translation_bytes_flushed: [u64; 2],
    /// Full-cache flushes, [read-only region, writable region].
    pub full_cache_flushes: [u64; 2],
    pub partial_clears: u64,
    pub sound_underruns: u64,
    pub frames_emulated: u64,
}

/// Metadata of the loaded ROM, read-only strings.
#[derive(Clone, Debug, Default)]
pub struct RomInfo {
    pub title: String,
    pub game_code: String,
    pub maker_code: String,
}

pub trait Emulator {
    /// Reset the emulated machine; the menu exits afterwards.
    fn reset(&mut self);

    /// Request application shutdown; the menu exits afterwards.
    fn quit(&mut self);

    fn stats(&self) -> EmuStats;

    fn rom_info(&self) -> &RomInfo;
}
