//! Interactive button capture used while editing a remap or hotkey.
//!
//! Both variants share one wait/accumulate skeleton ([`grab`]) parameterized
//! by the per-frame merge rule; only the merge and the caller's resolution
//! policy differ between single-button and combination capture.

use crate::core::gfx::{
    COLOR_ACTIVE_OUTLINE, COLOR_ACTIVE_TEXT, COLOR_BACKGROUND, SCREEN_HEIGHT, SCREEN_WIDTH,
};
use crate::core::input::Buttons;
use crate::menu::behavior::{Ctx, Cursor};
use crate::menu::{Target, pace_wait};
use log::warn;

/// Folds one frame's pressed set into the running total.
pub type MergeFn = fn(total: Buttons, sample: Buttons) -> Buttons;

/// Pressing this alone while capturing a hotkey clears it.
pub const HOTKEY_CANCEL: Buttons = Buttons::FACE_DOWN;

/// Single-binding accumulation: the total is the union of every button seen
/// at any point during the gesture.
pub fn union_merge(total: Buttons, sample: Buttons) -> Buttons {
    total | sample
}

/// Hotkey accumulation. Growing the same combination replaces the total;
/// releasing part of it keeps the total; diverging onto a different
/// combination (say R+X turning into R+Y) replaces it entirely.
pub fn combo_merge(total: Buttons, sample: Buttons) -> Buttons {
    if sample.contains(total) {
        sample
    } else if total.contains(sample) {
        total
    } else {
        sample
    }
}

fn draw_prompt(ctx: &mut Ctx<'_>, lines: &[String; 4]) {
    let line_height = ctx.video.text_height(" ");
    let top = (SCREEN_HEIGHT - line_height * 4) / 2;
    for (i, line) in lines.iter().enumerate() {
        let width = ctx.video.text_width(line);
        if width <= SCREEN_WIDTH - 2 {
            ctx.video.print_outline(
                line,
                COLOR_ACTIVE_TEXT,
                COLOR_ACTIVE_OUTLINE,
                (SCREEN_WIDTH - width) / 2,
                top + line_height * i as u32,
            );
        } else {
            warn!("capture prompt line '{line}' does not fit the screen");
        }
    }
}

fn idle_frame(ctx: &mut Ctx<'_>) {
    ctx.video.fill(COLOR_BACKGROUND);
    ctx.video.flip();
    pace_wait(ctx.pace);
}

/// The capture state machine: await-release, await-press, then accumulate
/// with `merge` until all buttons are released again. Returns the final
/// accumulated set; resolution is the caller's policy.
pub fn grab(ctx: &mut Ctx<'_>, lines: &[String; 4], merge: MergeFn) -> Buttons {
    // Wait for the buttons that triggered the action to be released.
    while !ctx.input.pressed().is_empty() {
        idle_frame(ctx);
    }

    // Wait until a button is pressed, showing the prompt meanwhile.
    let mut total;
    loop {
        let sample = ctx.input.pressed();
        if !sample.is_empty() {
            total = sample;
            break;
        }
        ctx.video.fill(COLOR_BACKGROUND);
        draw_prompt(ctx, lines);
        ctx.video.flip();
        pace_wait(ctx.pace);
    }

    // Accumulate until the physical state returns to empty.
    loop {
        let sample = ctx.input.pressed();
        if sample.is_empty() {
            break;
        }
        total = merge(total, sample);
        idle_frame(ctx);
    }
    total
}

/// The active entry's name, current mask cell and value, if it has one.
fn capture_target(ctx: &Ctx<'_>, cur: &Cursor) -> Option<(String, crate::menu::ValueId, Buttons)> {
    let menu = cur.menu?;
    let eid = ctx.tree.entry_at(menu, cur.entry)?;
    let entry = ctx.tree.entry(eid);
    let Target::Value(vid) = entry.target else {
        return None;
    };
    let mask = ctx.values.mask(vid)?;
    Some((entry.name.clone(), vid, mask))
}

/// On-enter: capture a new single-button mapping. Exactly one resolved
/// button commits; anything else (two pressed to cancel) leaves the mapping
/// unchanged.
pub fn action_set_mapping(ctx: &mut Ctx<'_>, cur: &mut Cursor) {
    let Some((name, vid, current)) = capture_target(ctx, cur) else {
        return;
    };
    let lines = [
        format!("Setting mapping for {name}"),
        format!("Currently {}", current.single_name().unwrap_or("Invalid")),
        "Press the new button or".to_string(),
        "two at once to leave alone".to_string(),
    ];
    let total = grab(ctx, &lines, union_merge);
    if total.bits().count_ones() == 1 {
        ctx.values.set_mask(vid, total);
    }
}

/// On-enter variant for rapid-fire mappings: anything other than exactly one
/// resolved button clears the mapping instead of leaving it alone.
pub fn action_set_or_clear_mapping(ctx: &mut Ctx<'_>, cur: &mut Cursor) {
    let Some((name, vid, current)) = capture_target(ctx, cur) else {
        return;
    };
    let lines = [
        format!("Setting mapping for {name}"),
        format!("Currently {}", current.single_name().unwrap_or("Invalid")),
        "Press the new button or".to_string(),
        "two at once to clear".to_string(),
    ];
    let total = grab(ctx, &lines, union_merge);
    ctx.values.set_mask(
        vid,
        if total.bits().count_ones() == 1 {
            total
        } else {
            Buttons::empty()
        },
    );
}

/// On-enter: capture a button combination. Resolving to the cancel button
/// alone clears the hotkey; any other combination is committed whole.
pub fn action_set_or_clear_hotkey(ctx: &mut Ctx<'_>, cur: &mut Cursor) {
    let Some((name, vid, current)) = capture_target(ctx, cur) else {
        return;
    };
    let lines = [
        format!("Setting hotkey for {name}"),
        format!("Currently {}", current.combo_name()),
        "Press the new buttons or".to_string(),
        format!("{} to clear", HOTKEY_CANCEL.combo_name()),
    ];
    let total = grab(ctx, &lines, combo_merge);
    ctx.values.set_mask(
        vid,
        if total == HOTKEY_CANCEL {
            Buttons::empty()
        } else {
            total
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::behavior::{EntryOps, MenuOps};
    use crate::menu::fixtures::{RecordingSurface, ScriptPort, StubEmu};
    use crate::menu::{Entry, MenuTree, Value, ValueId, ValueStore};
    use std::time::Duration;

    const A: Buttons = Buttons::FACE_RIGHT;
    const B: Buttons = Buttons::FACE_DOWN;
    const C: Buttons = Buttons::TRIGGER_R;

    fn mask_tree(initial: Buttons, on_enter: crate::menu::behavior::NavFn) -> (MenuTree, ValueStore, ValueId) {
        let mut b = crate::menu::TreeBuilder::new();
        let root = b.alloc_menu();
        let cell = b.value(Value::Mask(initial));
        let entry = b.entry(
            Entry::option("Pad A", "pad_a", 0, cell, &[]).with_ops(EntryOps {
                on_enter: Some(on_enter),
                ..EntryOps::default()
            }),
        );
        b.define_menu(root, None, "Input settings", vec![entry], MenuOps::default());
        let (tree, values) = b.build(root).expect("tree should build");
        (tree, values, cell)
    }

    fn run_capture(
        tree: &MenuTree,
        values: &mut ValueStore,
        frames: &[Buttons],
        action: crate::menu::behavior::NavFn,
    ) {
        let mut video = RecordingSurface::default();
        let mut input = ScriptPort::with_frames(frames);
        let mut emu = StubEmu::default();
        let mut ctx = Ctx {
            tree,
            values,
            video: &mut video,
            input: &mut input,
            emu: &mut emu,
            pace: Duration::ZERO,
        };
        let mut cur = Cursor {
            menu: Some(tree.root()),
            entry: 0,
        };
        action(&mut ctx, &mut cur);
    }

    #[test]
    fn combo_merge_keeps_growing_combinations() {
        // {A} -> {A,B} -> {A,B,C} -> {B,C} -> {} resolves to {A,B,C}.
        let (tree, mut values, cell) = mask_tree(Buttons::empty(), action_set_or_clear_hotkey);
        let frames = [
            Buttons::empty(), // activation button released
            A,
            A | B,
            A | B | C,
            B | C, // releasing, proper subset: total keeps {A,B,C}
            Buttons::empty(),
        ];
        run_capture(&tree, &mut values, &frames, action_set_or_clear_hotkey);
        assert_eq!(values.mask(cell), Some(A | B | C));
    }

    #[test]
    fn combo_merge_replaces_on_divergence() {
        // {A} -> {B} -> {} resolves to {B}.
        let (tree, mut values, cell) = mask_tree(Buttons::empty(), action_set_or_clear_hotkey);
        let frames = [Buttons::empty(), A, B, Buttons::empty()];
        run_capture(&tree, &mut values, &frames, action_set_or_clear_hotkey);
        assert_eq!(values.mask(cell), Some(B));
    }

    #[test]
    fn hotkey_cancel_button_clears() {
        let (tree, mut values, cell) = mask_tree(A | C, action_set_or_clear_hotkey);
        let frames = [Buttons::empty(), HOTKEY_CANCEL, Buttons::empty()];
        run_capture(&tree, &mut values, &frames, action_set_or_clear_hotkey);
        assert_eq!(values.mask(cell), Some(Buttons::empty()));
    }

    #[test]
    fn single_capture_commits_one_button() {
        let (tree, mut values, cell) = mask_tree(C, action_set_mapping);
        let frames = [Buttons::empty(), A, Buttons::empty()];
        run_capture(&tree, &mut values, &frames, action_set_mapping);
        assert_eq!(values.mask(cell), Some(A));
    }

    #[test]
    fn single_capture_two_buttons_leaves_mapping_alone() {
        // {A} -> {A,B} -> {} accumulates two bits: no change.
        let (tree, mut values, cell) = mask_tree(C, action_set_mapping);
        let frames = [Buttons::empty(), A, A | B, Buttons::empty()];
        run_capture(&tree, &mut values, &frames, action_set_mapping);
        assert_eq!(values.mask(cell), Some(C), "two-button gesture cancels");
    }

    #[test]
    fn rapid_fire_variant_clears_on_cancel_gesture() {
        let (tree, mut values, cell) = mask_tree(C, action_set_or_clear_mapping);
        let frames = [Buttons::empty(), A, A | B, Buttons::empty()];
        run_capture(&tree, &mut values, &frames, action_set_or_clear_mapping);
        assert_eq!(values.mask(cell), Some(Buttons::empty()));
    }

    #[test]
    fn grab_waits_out_the_activating_press() {
        // The button that opened the capture is still held for two frames;
        // it must not leak into the accumulated result.
        let (tree, mut values, cell) = mask_tree(Buttons::empty(), action_set_mapping);
        let frames = [
            Buttons::START,
            Buttons::START,
            Buttons::empty(),
            A,
            Buttons::empty(),
        ];
        run_capture(&tree, &mut values, &frames, action_set_mapping);
        assert_eq!(values.mask(cell), Some(A));
    }
}
