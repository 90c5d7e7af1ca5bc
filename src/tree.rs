//! The emulator's configuration tree: the concrete menus, entries and value
//! cells wired onto the generic model in [`crate::menu`].
//!
//! [`MenuSystem`] owns the built tree, its value store and the remap fix-up
//! table, and is the handle the platform layer keeps for the lifetime of the
//! process.

use crate::core::input::Buttons;
use crate::menu::behavior::{
    Ctx, Cursor, EntryOps, MenuOps, NavFn, draw_hotkey_value, draw_mapping_value, load_hotkey,
    load_mapping, null_entry_fn, save_hotkey, save_mapping,
};
use crate::menu::capture::{
    action_set_mapping, action_set_or_clear_hotkey, action_set_or_clear_mapping,
};
use crate::menu::navigate;
use crate::menu::{
    Choice, Entry, EntryId, MenuId, MenuTree, Target, TreeBuilder, TreeError, Value, ValueId,
    ValueStore,
};
use crate::settings::{self, RemapFixup};
use std::io;
use std::path::Path;

/* ------------------------------ choices ------------------------------- */

const BOOT_SOURCE: &[Choice] = &[
    Choice {
        label: "Cartridge ROM",
        token: "cartridge",
    },
    Choice {
        label: "GBA BIOS",
        token: "gba_bios",
    },
];

const FPS_COUNTER: &[Choice] = &[
    Choice {
        label: "Hide",
        token: "hide",
    },
    Choice {
        label: "Show",
        token: "show",
    },
];

const IMAGE_SIZE: &[Choice] = &[
    Choice {
        label: "Aspect",
        token: "aspect",
    },
    Choice {
        label: "Full screen",
        token: "fullscreen",
    },
    Choice {
        label: "Original",
        token: "original",
    },
];

const FRAMESKIP: &[Choice] = &[
    Choice {
        label: "Automatic",
        token: "auto",
    },
    Choice {
        label: "0 (~60 FPS)",
        token: "0",
    },
    Choice {
        label: "1 (~30 FPS)",
        token: "1",
    },
    Choice {
        label: "2 (~20 FPS)",
        token: "2",
    },
    Choice {
        label: "3 (~15 FPS)",
        token: "3",
    },
];

const FAST_FORWARD_TARGET: &[Choice] = &[
    Choice {
        label: "2x",
        token: "2",
    },
    Choice {
        label: "3x",
        token: "3",
    },
    Choice {
        label: "4x",
        token: "4",
    },
    Choice {
        label: "5x",
        token: "5",
    },
    Choice {
        label: "6x",
        token: "6",
    },
];

const ANALOG_SENSITIVITY: &[Choice] = &[
    Choice {
        label: "Lowest",
        token: "lowest",
    },
    Choice {
        label: "Low",
        token: "low",
    },
    Choice {
        label: "Medium",
        token: "medium",
    },
    Choice {
        label: "High",
        token: "high",
    },
    Choice {
        label: "Highest",
        token: "highest",
    },
];

/* ---------------------------- remap table ----------------------------- */

/// One slot of the emulated pad's remap table, in persistence order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum RemapSlot {
    A,
    B,
    Select,
    Start,
    Right,
    Left,
    Up,
    Down,
    TriggerR,
    TriggerL,
    RapidA,
    RapidB,
    MenuToggle,
}

pub const REMAP_COUNT: usize = 13;

const RAPID_A_SLOT: usize = RemapSlot::RapidA as usize;
const RAPID_B_SLOT: usize = RemapSlot::RapidB as usize;

/// Menu label and settings key for each slot.
const REMAP_SLOTS: [(&str, &str); REMAP_COUNT] = [
    ("GBA A", "pad_a"),
    ("GBA B", "pad_b"),
    ("GBA Select", "pad_select"),
    ("GBA Start", "pad_start"),
    ("GBA D-pad Right", "pad_right"),
    ("GBA D-pad Left", "pad_left"),
    ("GBA D-pad Up", "pad_up"),
    ("GBA D-pad Down", "pad_down"),
    ("GBA R", "pad_r"),
    ("GBA L", "pad_l"),
    ("Rapid-fire A", "rapid_a"),
    ("Rapid-fire B", "rapid_b"),
    ("Menu toggle", "menu_toggle"),
];

/// The stock control scheme restored by the fix-up pass. The two rapid-fire
/// slots ship unbound and are allowed to stay that way.
pub const REMAP_DEFAULTS: [Buttons; REMAP_COUNT] = [
    Buttons::FACE_RIGHT,
    Buttons::FACE_DOWN,
    Buttons::SELECT,
    Buttons::START,
    Buttons::DPAD_RIGHT,
    Buttons::DPAD_LEFT,
    Buttons::DPAD_UP,
    Buttons::DPAD_DOWN,
    Buttons::TRIGGER_R,
    Buttons::TRIGGER_L,
    Buttons::empty(),
    Buttons::empty(),
    Buttons::FACE_UP,
];

/* ---------------------------- debug menus ----------------------------- */

/// Identifies which live counter a debug display entry shows; stored in the
/// entry's opaque `user` tag so the shared refresh hook can decode it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
enum StatTag {
    CodePeakRo = 1,
    CodePeakRw,
    CodeFlushedRo,
    CodeFlushedRw,
    FullFlushesRo,
    FullFlushesRw,
    PartialClears,
    SoundUnderruns,
    FramesEmulated,
    RomTitle,
    RomGameCode,
    RomMakerCode,
}

impl StatTag {
    const ALL: [StatTag; 12] = [
        StatTag::CodePeakRo,
        StatTag::CodePeakRw,
        StatTag::CodeFlushedRo,
        StatTag::CodeFlushedRw,
        StatTag::FullFlushesRo,
        StatTag::FullFlushesRw,
        StatTag::PartialClears,
        StatTag::SoundUnderruns,
        StatTag::FramesEmulated,
        StatTag::RomTitle,
        StatTag::RomGameCode,
        StatTag::RomMakerCode,
    ];

    fn from_user(user: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|&t| t as u32 == user)
    }
}

/// Menu init hook shared by every debug menu: snapshots the emulator's
/// counters into the menu's display cells so they are current on entry.
fn refresh_stats(ctx: &mut Ctx<'_>, menu: MenuId) {
    let tree = ctx.tree;
    let stats = ctx.emu.stats();
    let rom = ctx.emu.rom_info().clone();
    for &eid in &tree.menu(menu).entries {
        let entry = tree.entry(eid);
        let Target::Value(vid) = entry.target else {
            continue;
        };
        let Some(tag) = StatTag::from_user(entry.user) else {
            continue;
        };
        let value = match tag {
            StatTag::CodePeakRo => Value::U64(stats.translation_bytes_peak[0]),
            StatTag::CodePeakRw => Value::U64(stats.translation_bytes_peak[1]),
            StatTag::CodeFlushedRo => Value::U64(stats.translation_bytes_flushed[0]),
            StatTag::CodeFlushedRw => Value::U64(stats.translation_bytes_flushed[1]),
            StatTag::FullFlushesRo => Value::U64(stats.full_cache_flushes[0]),
            StatTag::FullFlushesRw => Value::U64(stats.full_cache_flushes[1]),
            StatTag::PartialClears => Value::U64(stats.partial_clears),
            StatTag::SoundUnderruns => Value::U64(stats.sound_underruns),
            StatTag::FramesEmulated => Value::U64(stats.frames_emulated),
            StatTag::RomTitle => Value::Str(rom.title.clone()),
            StatTag::RomGameCode => Value::Str(rom.game_code.clone()),
            StatTag::RomMakerCode => Value::Str(rom.maker_code.clone()),
        };
        ctx.values.set(vid, value);
    }
}

/* ---------------------------- main actions ---------------------------- */

fn action_reset(ctx: &mut Ctx<'_>, cur: &mut Cursor) {
    ctx.emu.reset();
    cur.menu = None;
}

fn action_return(_ctx: &mut Ctx<'_>, cur: &mut Cursor) {
    cur.menu = None;
}

fn action_exit(ctx: &mut Ctx<'_>, cur: &mut Cursor) {
    ctx.emu.quit();
    cur.menu = None;
}

/* ----------------------------- the system ----------------------------- */

/// The built configuration tree plus the handles the platform layer needs to
/// read settings out of it between menu invocations.
pub struct MenuSystem {
    pub tree: MenuTree,
    pub values: ValueStore,
    pub fixup: RemapFixup,
    pub boot_source: ValueId,
    pub fps_counter: ValueId,
    pub image_size: ValueId,
    pub frameskip: ValueId,
    pub fast_forward_target: ValueId,
    pub analog_sensitivity: ValueId,
    pub remaps: [ValueId; REMAP_COUNT],
    pub fast_forward_hotkey: ValueId,
}

impl MenuSystem {
    pub fn new() -> Result<Self, TreeError> {
        let mut b = TreeBuilder::new();

        let main = b.alloc_menu();
        let display = b.alloc_menu();
        let input = b.alloc_menu();
        let hotkeys = b.alloc_menu();
        let debug = b.alloc_menu();
        let code_stats = b.alloc_menu();
        let meta_stats = b.alloc_menu();
        let exec_stats = b.alloc_menu();
        let rom_info = b.alloc_menu();

        // Display settings.
        let boot_source = b.value(Value::Index(0));
        let fps_counter = b.value(Value::Index(0));
        let image_size = b.value(Value::Index(0));
        let frameskip = b.value(Value::Index(0));
        let fast_forward_target = b.value(Value::Index(0));
        let display_entries = vec![
            b.entry(Entry::option("Boot from", "boot_from", 0, boot_source, BOOT_SOURCE)),
            b.entry(Entry::option("FPS counter", "fps_counter", 1, fps_counter, FPS_COUNTER)),
            b.entry(Entry::option("Image scaling", "image_size", 2, image_size, IMAGE_SIZE)),
            b.entry(Entry::option("Frame skipping", "frameskip", 3, frameskip, FRAMESKIP)),
            b.entry(Entry::option(
                "Fast-forward target",
                "fast_forward_target",
                4,
                fast_forward_target,
                FAST_FORWARD_TARGET,
            )),
        ];
        b.define_menu(display, Some(main), "Display settings", display_entries, MenuOps::default());

        // Input settings: the remap table plus the analog option.
        let remaps: [ValueId; REMAP_COUNT] =
            std::array::from_fn(|i| b.value(Value::Mask(REMAP_DEFAULTS[i])));
        let mut input_entries = Vec::with_capacity(REMAP_COUNT + 1);
        for (i, &(name, key)) in REMAP_SLOTS.iter().enumerate() {
            // Rapid-fire slots may be cleared from capture; the rest only
            // ever change to another single button.
            let on_enter: NavFn = if i == RAPID_A_SLOT || i == RAPID_B_SLOT {
                action_set_or_clear_mapping
            } else {
                action_set_mapping
            };
            input_entries.push(b.entry(
                Entry::option(name, key, i as u32, remaps[i], &[]).with_ops(EntryOps {
                    on_enter: Some(on_enter),
                    on_left: Some(null_entry_fn),
                    on_right: Some(null_entry_fn),
                    draw_value: Some(draw_mapping_value),
                    load: Some(load_mapping),
                    save: Some(save_mapping),
                    ..EntryOps::default()
                }),
            ));
        }
        let analog_sensitivity = b.value(Value::Index(2));
        input_entries.push(b.entry(Entry::option(
            "Analog sensitivity",
            "analog_sensitivity",
            REMAP_COUNT as u32,
            analog_sensitivity,
            ANALOG_SENSITIVITY,
        )));
        b.define_menu(input, Some(main), "Input settings", input_entries, MenuOps::default());

        // Hotkeys.
        let fast_forward_hotkey = b.value(Value::Mask(Buttons::empty()));
        let hotkey_entries = vec![b.entry(
            Entry::option("Fast-forward", "hotkey_fast_forward", 0, fast_forward_hotkey, &[])
                .with_ops(EntryOps {
                    on_enter: Some(action_set_or_clear_hotkey),
                    on_left: Some(null_entry_fn),
                    on_right: Some(null_entry_fn),
                    draw_value: Some(draw_hotkey_value),
                    load: Some(load_hotkey),
                    save: Some(save_hotkey),
                    ..EntryOps::default()
                }),
        )];
        b.define_menu(hotkeys, Some(main), "Hotkeys", hotkey_entries, MenuOps::default());

        // Debug menus, all read-only and refreshed on entry.
        let code_entries = vec![
            stat_entry(&mut b, "Code bytes at peak (RO)", 0, StatTag::CodePeakRo),
            stat_entry(&mut b, "Code bytes at peak (RW)", 1, StatTag::CodePeakRw),
            stat_entry(&mut b, "Bytes flushed (RO)", 2, StatTag::CodeFlushedRo),
            stat_entry(&mut b, "Bytes flushed (RW)", 3, StatTag::CodeFlushedRw),
        ];
        b.define_menu(
            code_stats,
            Some(debug),
            "Native code statistics",
            code_entries,
            refresh_on_init(),
        );

        let meta_entries = vec![
            stat_entry(&mut b, "Full flushes (RO)", 0, StatTag::FullFlushesRo),
            stat_entry(&mut b, "Full flushes (RW)", 1, StatTag::FullFlushesRw),
            stat_entry(&mut b, "Partial clears", 2, StatTag::PartialClears),
        ];
        b.define_menu(
            meta_stats,
            Some(debug),
            "Metadata clear statistics",
            meta_entries,
            refresh_on_init(),
        );

        let exec_entries = vec![
            stat_entry(&mut b, "Sound buffer underruns", 0, StatTag::SoundUnderruns),
            stat_entry(&mut b, "Frames emulated", 1, StatTag::FramesEmulated),
        ];
        b.define_menu(
            exec_stats,
            Some(debug),
            "Execution statistics",
            exec_entries,
            refresh_on_init(),
        );

        let rom_entries = vec![
            rom_entry(&mut b, "ROM title", 0, StatTag::RomTitle),
            rom_entry(&mut b, "Game code", 1, StatTag::RomGameCode),
            rom_entry(&mut b, "Maker code", 2, StatTag::RomMakerCode),
        ];
        b.define_menu(
            rom_info,
            Some(debug),
            "ROM information",
            rom_entries,
            refresh_on_init(),
        );

        let debug_entries = vec![
            b.entry(Entry::submenu("Native code statistics...", 0, code_stats)),
            b.entry(Entry::submenu("Metadata clear statistics...", 1, meta_stats)),
            b.entry(Entry::submenu("Execution statistics...", 2, exec_stats)),
            b.entry(Entry::submenu("ROM information...", 3, rom_info)),
        ];
        b.define_menu(
            debug,
            Some(main),
            "Performance and debugging",
            debug_entries,
            MenuOps::default(),
        );

        // The main menu.
        let main_entries = vec![
            b.entry(Entry::submenu("Display settings...", 0, display)),
            b.entry(Entry::submenu("Input settings...", 1, input)),
            b.entry(Entry::submenu("Hotkeys...", 2, hotkeys)),
            b.entry(Entry::submenu("Performance and debugging...", 3, debug)),
            b.entry(Entry::custom("Reset the game", 4, action_reset)),
            b.entry(Entry::custom("Return to the game", 5, action_return)),
            b.entry(Entry::custom("Exit", 6, action_exit)),
        ];
        b.define_menu(main, None, "Main Menu", main_entries, MenuOps::default());

        let (tree, values) = b.build(main)?;
        let fixup = RemapFixup {
            required: remaps
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != RAPID_A_SLOT && i != RAPID_B_SLOT)
                .map(|(_, &vid)| vid)
                .collect(),
            defaults: remaps.into_iter().zip(REMAP_DEFAULTS).collect(),
        };
        Ok(Self {
            tree,
            values,
            fixup,
            boot_source,
            fps_counter,
            image_size,
            frameskip,
            fast_forward_target,
            analog_sensitivity,
            remaps,
            fast_forward_hotkey,
        })
    }

    pub fn remap(&self, slot: RemapSlot) -> ValueId {
        self.remaps[slot as usize]
    }

    /// Run the interactive menu until the user exits it.
    pub fn run(
        &mut self,
        video: &mut dyn crate::core::gfx::Surface,
        input: &mut dyn crate::core::input::InputPort,
        emu: &mut dyn crate::core::emu::Emulator,
    ) {
        navigate::run(&self.tree, &mut self.values, video, input, emu);
    }

    pub fn load(&mut self, path: &Path) {
        settings::load_settings(&self.tree, &mut self.values, path, &self.fixup);
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        settings::save_settings(&self.tree, &self.values, path)
    }
}

fn stat_entry(b: &mut TreeBuilder, name: &str, position: u32, tag: StatTag) -> EntryId {
    let cell = b.value(Value::U64(0));
    b.entry(Entry::display(name, position, cell).with_user(tag as u32))
}

fn rom_entry(b: &mut TreeBuilder, name: &str, position: u32, tag: StatTag) -> EntryId {
    let cell = b.value(Value::Str(String::new()));
    b.entry(Entry::display(name, position, cell).with_user(tag as u32))
}

fn refresh_on_init() -> MenuOps {
    MenuOps {
        on_init: Some(refresh_stats),
        ..MenuOps::default()
    }
}
