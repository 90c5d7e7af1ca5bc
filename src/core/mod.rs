pub mod emu;
pub mod gfx;
pub mod input;
