//! In-application settings menu core for an embedded emulator.
//!
//! The menu is a static, data-driven tree of [`menu::Menu`]s and
//! [`menu::Entry`]s built once at startup. [`menu::navigate::run`] drives the
//! interactive loop against the platform collaborators in [`core`], and
//! [`settings`] persists the tree's option entries to a line-oriented
//! `key = value #comment` file.

pub mod core;
pub mod menu;
pub mod settings;
pub mod tree;
