//! The interactive navigation loop.
//!
//! State is the (active menu, active entry index) pair; the loop renders the
//! active menu, consumes exactly one discrete action per pass, dispatches it
//! to the resolved operation, and terminates once the active menu becomes
//! `None`.

use crate::core::emu::Emulator;
use crate::core::gfx::Surface;
use crate::core::input::{GuiAction, InputPort};
use crate::menu::behavior::{Ctx, Cursor};
use crate::menu::{MenuTree, ValueStore, pace_wait};
use log::warn;
use std::time::Duration;

/// Per-iteration pacing sleep, for platforms whose flips don't wait for
/// vertical sync.
pub const FRAME_DELAY: Duration = Duration::from_millis(5);

/// Run the menu until the user exits the tree, at the default pacing.
pub fn run(
    tree: &MenuTree,
    values: &mut ValueStore,
    video: &mut dyn Surface,
    input: &mut dyn InputPort,
    emu: &mut dyn Emulator,
) {
    run_paced(tree, values, video, input, emu, FRAME_DELAY)
}

pub fn run_paced(
    tree: &MenuTree,
    values: &mut ValueStore,
    video: &mut dyn Surface,
    input: &mut dyn InputPort,
    emu: &mut dyn Emulator,
    pace: Duration,
) {
    let mut ctx = Ctx {
        tree,
        values,
        video,
        input,
        emu,
        pace,
    };
    let mut cur = Cursor {
        menu: Some(tree.root()),
        entry: 0,
    };
    if let Some(init) = tree.menu(tree.root()).ops.on_init {
        init(&mut ctx, tree.root());
    }

    while let Some(menu_id) = cur.menu {
        let menu = tree.menu(menu_id);

        // Draw: background, title, then every entry's name and value.
        (menu.draw_background_fn())(&mut ctx, menu_id);
        (menu.draw_title_fn())(&mut ctx, menu_id);
        let Some(active) = tree.entry_at(menu_id, cur.entry) else {
            // The invariant is that the cursor always indexes a live entry;
            // recover rather than crash if an override broke it.
            warn!(
                "active entry index {} is out of range in menu '{}'",
                cur.entry, menu.title
            );
            cur.entry = 0;
            continue;
        };
        (menu.draw_data_fn())(&mut ctx, menu_id, active);
        ctx.video.flip();
        pace_wait(pace);

        // Exactly one action per pass.
        match ctx.input.poll_action() {
            GuiAction::Enter => (tree.entry(active).enter_fn())(&mut ctx, &mut cur),
            GuiAction::Leave => (menu.leave_fn())(&mut ctx, &mut cur),
            GuiAction::Up => (menu.up_fn())(&mut ctx, &mut cur),
            GuiAction::Down => (menu.down_fn())(&mut ctx, &mut cur),
            GuiAction::Left => (tree.entry(active).left_fn())(&mut ctx, menu_id, active),
            GuiAction::Right => (tree.entry(active).right_fn())(&mut ctx, menu_id, active),
            GuiAction::None => {}
        }

        // Finalise the old menu and initialise the new one, in that order.
        if cur.menu != Some(menu_id) {
            if let Some(end) = menu.ops.on_end {
                end(&mut ctx, menu_id);
            }
            if let Some(next) = cur.menu {
                cur.entry = 0;
                if let Some(init) = tree.menu(next).ops.on_init {
                    init(&mut ctx, next);
                }
            }
        }
    }

    // Don't leak a still-held button into whatever resumes after the menu.
    while !ctx.input.pressed().is_empty() {
        ctx.video.flip();
        pace_wait(pace);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::Buttons;
    use crate::menu::behavior::{HookFn, MenuOps};
    use crate::menu::fixtures::{RecordingSurface, ScriptPort, StubEmu};
    use crate::menu::{Choice, Entry, TreeBuilder, Value};
    use std::sync::Mutex;

    const TOGGLE: &[Choice] = &[
        Choice {
            label: "Hide",
            token: "hide",
        },
        Choice {
            label: "Show",
            token: "show",
        },
    ];

    fn three_entry_tree() -> (MenuTree, ValueStore) {
        let mut b = TreeBuilder::new();
        let root = b.alloc_menu();
        let child = b.alloc_menu();
        let cell = b.value(Value::Index(0));
        let e0 = b.entry(Entry::option("FPS counter", "fps_counter", 0, cell, TOGGLE));
        let e1 = b.entry(Entry::submenu("More...", 1, child));
        let e2 = b.entry(Entry::custom("Return", 2, |_, cur| cur.menu = None));
        let c0 = b.entry(Entry::custom("Back out", 0, |ctx, cur| {
            cur.menu = ctx.tree.menu(cur.menu.unwrap()).parent;
        }));
        b.define_menu(child, Some(root), "Child", vec![c0], MenuOps::default());
        b.define_menu(root, None, "Main Menu", vec![e0, e1, e2], MenuOps::default());
        b.build(root).expect("tree should build")
    }

    fn run_script(tree: &MenuTree, values: &mut ValueStore, actions: &[GuiAction]) -> RecordingSurface {
        let mut video = RecordingSurface::default();
        let mut input = ScriptPort::with_actions(actions);
        let mut emu = StubEmu::default();
        run_paced(tree, values, &mut video, &mut input, &mut emu, Duration::ZERO);
        video
    }

    #[test]
    fn down_wraps_after_one_full_cycle() {
        use GuiAction::{Down, Leave};
        let (tree, mut values) = three_entry_tree();
        // Three downs in a three-entry menu must land back on entry 0, whose
        // active styling is visible in the draw log of the final frame.
        let video = run_script(&tree, &mut values, &[Down, Down, Down, Leave]);
        let last_frame: Vec<_> = video
            .draws
            .iter()
            .rev()
            .take_while(|d| d.0 != "Main Menu")
            .collect();
        let active_rows: Vec<&str> = last_frame
            .iter()
            .filter(|d| d.1 == crate::core::gfx::COLOR_ACTIVE_TEXT)
            .map(|d| d.0.as_str())
            .collect();
        assert!(
            active_rows.contains(&"FPS counter"),
            "after N downs the first entry is active again; active rows: {active_rows:?}"
        );
    }

    #[test]
    fn up_from_the_top_wraps_to_the_bottom() {
        use GuiAction::{Leave, Up};
        let (tree, mut values) = three_entry_tree();
        let video = run_script(&tree, &mut values, &[Up, Leave]);
        let active_rows: Vec<&str> = video
            .draws
            .iter()
            .rev()
            .take_while(|d| d.0 != "Main Menu")
            .filter(|d| d.1 == crate::core::gfx::COLOR_ACTIVE_TEXT)
            .map(|d| d.0.as_str())
            .collect();
        assert!(active_rows.contains(&"Return"));
    }

    #[test]
    fn enter_descends_and_leave_returns_to_parent() {
        use GuiAction::{Down, Enter, Leave};
        let (tree, mut values) = three_entry_tree();
        let video = run_script(&tree, &mut values, &[Down, Enter, Leave, Leave]);
        let titles: Vec<&str> = video
            .draws
            .iter()
            .filter(|d| d.0 == "Main Menu" || d.0 == "Child")
            .map(|d| d.0.as_str())
            .collect();
        assert_eq!(titles, vec!["Main Menu", "Main Menu", "Child", "Main Menu"]);
    }

    #[test]
    fn leave_at_the_root_terminates() {
        let (tree, mut values) = three_entry_tree();
        let video = run_script(&tree, &mut values, &[GuiAction::Leave]);
        assert_eq!(video.flips, 1, "one frame drawn, then the loop exits");
    }

    #[test]
    fn custom_enter_runs_instead_of_the_default() {
        use GuiAction::{Down, Enter};
        let (tree, mut values) = three_entry_tree();
        // Entry 2 is the custom "Return" action: the loop must exit without
        // a Leave ever being scripted.
        let video = run_script(&tree, &mut values, &[Down, Down, Enter]);
        assert!(video.flips >= 3);
    }

    #[test]
    fn left_right_cycle_the_active_option() {
        use GuiAction::{Leave, Right};
        let (tree, mut values) = three_entry_tree();
        run_script(&tree, &mut values, &[Right, Leave]);
        let eid = tree.find_option("fps_counter").unwrap();
        let crate::menu::Target::Value(vid) = tree.entry(eid).target else {
            unreachable!()
        };
        assert_eq!(values.index(vid), Some(1));
        run_script(&tree, &mut values, &[Right, Leave]);
        assert_eq!(values.index(vid), Some(0), "a second right wraps to the start");
    }

    static HOOK_LOG: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

    #[test]
    fn hooks_run_end_before_init_and_entry_resets() {
        use GuiAction::{Enter, Leave};
        let end_root: HookFn = |_, _| HOOK_LOG.lock().unwrap().push("end root");
        let init_child: HookFn = |_, _| HOOK_LOG.lock().unwrap().push("init child");

        let mut b = TreeBuilder::new();
        let root = b.alloc_menu();
        let child = b.alloc_menu();
        let link = b.entry(Entry::submenu("Child...", 0, child));
        let noop = b.entry(Entry::custom("Nothing", 0, |_, _| {}));
        b.define_menu(
            child,
            Some(root),
            "Child",
            vec![noop],
            MenuOps {
                on_init: Some(init_child),
                ..MenuOps::default()
            },
        );
        b.define_menu(
            root,
            None,
            "Root",
            vec![link],
            MenuOps {
                on_end: Some(end_root),
                ..MenuOps::default()
            },
        );
        let (tree, mut values) = b.build(root).expect("tree should build");

        HOOK_LOG.lock().unwrap().clear();
        run_script(&tree, &mut values, &[Enter, Leave, Leave]);
        assert_eq!(*HOOK_LOG.lock().unwrap(), vec!["end root", "init child"]);
    }

    #[test]
    fn residual_input_is_drained_before_returning() {
        let (tree, mut values) = three_entry_tree();
        let mut video = RecordingSurface::default();
        let mut input = ScriptPort::with_actions(&[GuiAction::Leave]);
        // The exit button stays held for three frames after the menu closes.
        input.frames.extend([
            Buttons::FACE_DOWN,
            Buttons::FACE_DOWN,
            Buttons::FACE_DOWN,
            Buttons::empty(),
        ]);
        let mut emu = StubEmu::default();
        run_paced(&tree, &mut values, &mut video, &mut input, &mut emu, Duration::ZERO);
        assert!(
            input.frames.is_empty(),
            "the drain loop must consume every held frame"
        );
        assert_eq!(video.flips, 1 + 3, "one menu frame plus three drain flips");
    }
}
