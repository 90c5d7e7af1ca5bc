//! Persistence driver: save the whole tree's option entries to a settings
//! file, load one back, and fix up impossible remap states afterwards.
//!
//! Load and save run only outside the navigation loop, so they own the value
//! store for the duration of a call; there is no concurrent access.

pub mod codec;

use crate::core::input::Buttons;
use crate::menu::{MenuTree, ValueId, ValueStore};
use log::warn;
use std::fs;
use std::io;
use std::path::Path;

/// After a load, if any `required` remap slot is unbound the whole table is
/// reset to `defaults`, all-or-nothing, so the control scheme can never end
/// up half default, half custom.
///
/// The required list is deliberately explicit: rapid-fire style slots that
/// are allowed to stay unbound are simply left out of it.
pub struct RemapFixup {
    pub required: Vec<ValueId>,
    pub defaults: Vec<(ValueId, Buttons)>,
}

/// Serialize every option entry, in pre-order tree order, to settings text.
pub fn render_settings(tree: &MenuTree, values: &ValueStore) -> String {
    let mut out = String::new();
    for eid in tree.options_preorder() {
        if let Some(line) = (tree.entry(eid).save_fn())(tree, values, eid) {
            out.push_str(&line);
        }
    }
    out
}

/// Write the settings file. A failure is logged and returned; the caller
/// decides how to report it.
pub fn save_settings(tree: &MenuTree, values: &ValueStore, path: &Path) -> io::Result<()> {
    let text = render_settings(tree, values);
    fs::write(path, text).inspect_err(|e| {
        log::error!("couldn't write settings file {}: {e}", path.display());
    })
}

/// Apply settings text line by line. Unknown keys and malformed lines are
/// skipped with a warning; they never abort the rest of the file.
pub fn apply_settings_text(tree: &MenuTree, values: &mut ValueStore, text: &str) {
    for line in text.lines() {
        let Some((name, token)) = codec::parse_line(line) else {
            continue;
        };
        match tree.find_option(name) {
            Some(eid) => (tree.entry(eid).load_fn())(tree, values, eid, token),
            None => warn!("option '{name}' not found; ignored"),
        }
    }
}

/// Load the settings file and run the fix-up pass. A missing or unreadable
/// file means "no settings": the in-memory defaults stand, and the fix-up
/// still runs.
pub fn load_settings(tree: &MenuTree, values: &mut ValueStore, path: &Path, fixup: &RemapFixup) {
    match fs::read_to_string(path) {
        Ok(text) => apply_settings_text(tree, values, &text),
        Err(e) => warn!(
            "couldn't open settings file {} for loading: {e}",
            path.display()
        ),
    }
    fix_up(values, fixup);
}

/// The post-load fix-up pass (see [`RemapFixup`]).
pub fn fix_up(values: &mut ValueStore, fixup: &RemapFixup) {
    let broken = fixup
        .required
        .iter()
        .any(|&id| values.mask(id).unwrap_or_default().is_empty());
    if broken {
        warn!("a required remap slot is unbound; restoring the default control scheme");
        for &(id, mask) in &fixup.defaults {
            values.set_mask(id, mask);
        }
    }
}
