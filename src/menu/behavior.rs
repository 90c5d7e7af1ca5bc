//! Per-slot menu operations and their default behaviors.
//!
//! Every overridable slot is an `Option` of a plain function pointer; an
//! override fully replaces the default for that slot, there is no chaining.
//! The `*_fn` accessors on [`Entry`] and [`Menu`] resolve a slot to the
//! override or the default.

use crate::core::emu::Emulator;
use crate::core::gfx::{
    COLOR_ACTIVE_OUTLINE, COLOR_ACTIVE_TEXT, COLOR_BACKGROUND, COLOR_ERROR_OUTLINE,
    COLOR_ERROR_TEXT, COLOR_INACTIVE_OUTLINE, COLOR_INACTIVE_TEXT, COLOR_TITLE_OUTLINE,
    COLOR_TITLE_TEXT, SCREEN_WIDTH, Surface,
};
use crate::core::input::InputPort;
use crate::menu::{Entry, EntryId, EntryKind, Menu, MenuId, MenuTree, Target, Value, ValueStore};
use crate::settings::codec;
use log::warn;
use std::time::Duration;

/// Everything a menu operation may touch: the immutable tree, the mutable
/// value cells, and the platform collaborators.
pub struct Ctx<'a> {
    pub tree: &'a MenuTree,
    pub values: &'a mut ValueStore,
    pub video: &'a mut dyn Surface,
    pub input: &'a mut dyn InputPort,
    pub emu: &'a mut dyn Emulator,
    /// Sleep inserted once per polling iteration so flip-less backends still
    /// run at a steady cadence.
    pub pace: Duration,
}

/// The navigation position: active menu (or `None` once the tree has been
/// exited) and the active entry's index within it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub menu: Option<MenuId>,
    pub entry: usize,
}

/// Acts on the cursor itself; may switch the active menu and/or entry.
pub type NavFn = fn(&mut Ctx<'_>, &mut Cursor);
/// Acts on the active entry without moving the cursor (left/right).
pub type EntryNavFn = fn(&mut Ctx<'_>, MenuId, EntryId);
/// Draws one element of an entry; arguments are (drawn, active).
pub type DrawEntryFn = fn(&mut Ctx<'_>, EntryId, EntryId);
/// Draws a whole-menu element (background, title).
pub type MenuDrawFn = fn(&mut Ctx<'_>, MenuId);
/// Draws the menu's data rows; second argument is the active entry.
pub type MenuDataFn = fn(&mut Ctx<'_>, MenuId, EntryId);
/// Menu init/teardown hook.
pub type HookFn = fn(&mut Ctx<'_>, MenuId);
/// Applies one persisted token to an entry's value cell.
pub type LoadFn = fn(&MenuTree, &mut ValueStore, EntryId, &str);
/// Produces one `name = token #comment\n` line, or `None` to skip the entry.
pub type SaveFn = fn(&MenuTree, &ValueStore, EntryId) -> Option<String>;

#[derive(Clone, Copy, Default)]
pub struct EntryOps {
    pub on_enter: Option<NavFn>,
    pub on_left: Option<EntryNavFn>,
    pub on_right: Option<EntryNavFn>,
    pub draw_name: Option<DrawEntryFn>,
    pub draw_value: Option<DrawEntryFn>,
    pub load: Option<LoadFn>,
    pub save: Option<SaveFn>,
}

#[derive(Clone, Copy, Default)]
pub struct MenuOps {
    pub draw_background: Option<MenuDrawFn>,
    pub draw_title: Option<MenuDrawFn>,
    pub draw_data: Option<MenuDataFn>,
    pub on_up: Option<NavFn>,
    pub on_down: Option<NavFn>,
    pub on_leave: Option<NavFn>,
    pub on_init: Option<HookFn>,
    pub on_end: Option<HookFn>,
}

impl Entry {
    pub fn enter_fn(&self) -> NavFn {
        self.ops.on_enter.unwrap_or(default_enter)
    }

    pub fn left_fn(&self) -> EntryNavFn {
        self.ops.on_left.unwrap_or(default_left)
    }

    pub fn right_fn(&self) -> EntryNavFn {
        self.ops.on_right.unwrap_or(default_right)
    }

    pub fn draw_name_fn(&self) -> DrawEntryFn {
        self.ops.draw_name.unwrap_or(default_draw_name)
    }

    pub fn draw_value_fn(&self) -> DrawEntryFn {
        self.ops.draw_value.unwrap_or(default_draw_value)
    }

    pub fn load_fn(&self) -> LoadFn {
        self.ops.load.unwrap_or(default_load)
    }

    pub fn save_fn(&self) -> SaveFn {
        self.ops.save.unwrap_or(default_save)
    }
}

impl Menu {
    pub fn up_fn(&self) -> NavFn {
        self.ops.on_up.unwrap_or(default_up)
    }

    pub fn down_fn(&self) -> NavFn {
        self.ops.on_down.unwrap_or(default_down)
    }

    pub fn leave_fn(&self) -> NavFn {
        self.ops.on_leave.unwrap_or(default_leave)
    }

    pub fn draw_background_fn(&self) -> MenuDrawFn {
        self.ops.draw_background.unwrap_or(default_draw_background)
    }

    pub fn draw_title_fn(&self) -> MenuDrawFn {
        self.ops.draw_title.unwrap_or(default_draw_title)
    }

    pub fn draw_data_fn(&self) -> MenuDataFn {
        self.ops.draw_data.unwrap_or(default_draw_data)
    }
}

/* ----------------------------- navigation ----------------------------- */

pub fn default_up(ctx: &mut Ctx<'_>, cur: &mut Cursor) {
    let Some(menu) = cur.menu else { return };
    let count = ctx.tree.menu(menu).entries.len();
    cur.entry = if cur.entry == 0 { count - 1 } else { cur.entry - 1 };
}

pub fn default_down(ctx: &mut Ctx<'_>, cur: &mut Cursor) {
    let Some(menu) = cur.menu else { return };
    let count = ctx.tree.menu(menu).entries.len();
    cur.entry = if cur.entry + 1 >= count { 0 } else { cur.entry + 1 };
}

pub fn default_enter(ctx: &mut Ctx<'_>, cur: &mut Cursor) {
    let Some(menu) = cur.menu else { return };
    let Some(eid) = ctx.tree.entry_at(menu, cur.entry) else {
        return;
    };
    if let Target::Submenu(child) = ctx.tree.entry(eid).target {
        cur.menu = Some(child);
    }
}

pub fn default_leave(ctx: &mut Ctx<'_>, cur: &mut Cursor) {
    let Some(menu) = cur.menu else { return };
    cur.menu = ctx.tree.menu(menu).parent;
}

pub fn default_left(ctx: &mut Ctx<'_>, _menu: MenuId, entry: EntryId) {
    let e = ctx.tree.entry(entry);
    if e.kind != EntryKind::Option || e.choices.is_empty() {
        return;
    }
    let Target::Value(vid) = e.target else { return };
    let Some(index) = ctx.values.index(vid) else {
        return;
    };
    let count = e.choices.len() as u32;
    ctx.values
        .set_index(vid, if index == 0 { count - 1 } else { index - 1 });
}

pub fn default_right(ctx: &mut Ctx<'_>, _menu: MenuId, entry: EntryId) {
    let e = ctx.tree.entry(entry);
    if e.kind != EntryKind::Option || e.choices.is_empty() {
        return;
    }
    let Target::Value(vid) = e.target else { return };
    let Some(index) = ctx.values.index(vid) else {
        return;
    };
    let count = e.choices.len() as u32;
    ctx.values
        .set_index(vid, if index + 1 >= count { 0 } else { index + 1 });
}

/// Left/right override for entries whose value is set through capture.
pub fn null_entry_fn(_ctx: &mut Ctx<'_>, _menu: MenuId, _entry: EntryId) {}

/* ------------------------------ display ------------------------------- */

fn entry_row_y(video: &dyn Surface, position: u32) -> u32 {
    video.text_height(" ") * (position + 2) + 1
}

fn row_colors(is_active: bool, error: bool) -> (u16, u16) {
    if error {
        (COLOR_ERROR_TEXT, COLOR_ERROR_OUTLINE)
    } else if is_active {
        (COLOR_ACTIVE_TEXT, COLOR_ACTIVE_OUTLINE)
    } else {
        (COLOR_INACTIVE_TEXT, COLOR_INACTIVE_OUTLINE)
    }
}

/// Right-aligned value text with the width-hide-with-warning policy.
pub(crate) fn draw_value_text(
    ctx: &mut Ctx<'_>,
    text: &str,
    position: u32,
    is_active: bool,
    error: bool,
) {
    let width = ctx.video.text_width(text);
    if width <= SCREEN_WIDTH - 2 {
        let (text_color, outline_color) = row_colors(is_active, error);
        let y = entry_row_y(ctx.video, position);
        ctx.video
            .print_outline(text, text_color, outline_color, SCREEN_WIDTH - width - 1, y);
    } else {
        warn!("hid value '{text}' from the menu; it is too wide for the screen");
    }
}

pub fn default_draw_name(ctx: &mut Ctx<'_>, drawn: EntryId, active: EntryId) {
    let entry = ctx.tree.entry(drawn);
    let width = ctx.video.text_width(&entry.name);
    if width <= SCREEN_WIDTH - 2 {
        let (text_color, outline_color) = row_colors(drawn == active, false);
        let y = entry_row_y(ctx.video, entry.position);
        ctx.video
            .print_outline(&entry.name, text_color, outline_color, 1, y);
    } else {
        warn!(
            "hid name '{}' from the menu; it is too wide for the screen",
            entry.name
        );
    }
}

pub fn default_draw_value(ctx: &mut Ctx<'_>, drawn: EntryId, active: EntryId) {
    let entry = ctx.tree.entry(drawn);
    let (text, error): (String, bool) = match entry.kind {
        EntryKind::Option => {
            let index = match entry.target {
                Target::Value(vid) => ctx.values.index(vid),
                _ => None,
            };
            match index {
                Some(i) if (i as usize) < entry.choices.len() => {
                    (entry.choices[i as usize].label.to_string(), false)
                }
                _ => ("Out of bounds".to_string(), true),
            }
        }
        EntryKind::Display => {
            let Target::Value(vid) = entry.target else {
                return;
            };
            match ctx.values.get(vid) {
                Value::Str(s) => (s.clone(), false),
                Value::I32(v) => (v.to_string(), false),
                Value::U32(v) => (v.to_string(), false),
                Value::I64(v) => (fmt_i64(*v), false),
                Value::U64(v) => (fmt_u64(*v), false),
                Value::Index(_) | Value::Mask(_) => ("Unknown type".to_string(), true),
            }
        }
        _ => return,
    };
    draw_value_text(ctx, &text, entry.position, drawn == active, error);
}

pub fn default_draw_background(ctx: &mut Ctx<'_>, _menu: MenuId) {
    ctx.video.fill(COLOR_BACKGROUND);
}

pub fn default_draw_title(ctx: &mut Ctx<'_>, menu: MenuId) {
    let title = &ctx.tree.menu(menu).title;
    let width = ctx.video.text_width(title);
    if width <= SCREEN_WIDTH - 2 {
        ctx.video.print_outline(
            title,
            COLOR_TITLE_TEXT,
            COLOR_TITLE_OUTLINE,
            (SCREEN_WIDTH - width) / 2,
            1,
        );
    } else {
        warn!("hid title '{title}' from the menu; it is too wide for the screen");
    }
}

pub fn default_draw_data(ctx: &mut Ctx<'_>, menu: MenuId, active: EntryId) {
    let tree = ctx.tree;
    for &eid in &tree.menu(menu).entries {
        (tree.entry(eid).draw_name_fn())(ctx, eid, active);
        (tree.entry(eid).draw_value_fn())(ctx, eid, active);
    }
}

/* ---------------------------- persistence ----------------------------- */

pub fn default_load(tree: &MenuTree, values: &mut ValueStore, entry: EntryId, token: &str) {
    let e = tree.entry(entry);
    for (i, choice) in e.choices.iter().enumerate() {
        if choice.token.eq_ignore_ascii_case(token) {
            if let Target::Value(vid) = e.target {
                values.set_index(vid, i as u32);
            }
            return;
        }
    }
    warn!(
        "value '{token}' for option '{}' not valid; ignored",
        e.persistent_name.as_deref().unwrap_or(&e.name)
    );
}

pub fn default_save(tree: &MenuTree, values: &ValueStore, entry: EntryId) -> Option<String> {
    let e = tree.entry(entry);
    let key = e.persistent_name.as_deref()?;
    let Target::Value(vid) = e.target else {
        return None;
    };
    let index = values.index(vid)? as usize;
    let Some(choice) = e.choices.get(index) else {
        warn!("not saving option '{key}'; its choice index {index} is out of bounds");
        return None;
    };
    Some(format!("{key} = {} #{}\n", choice.token, choice.label))
}

/* ---------------------- button-mapping entries ------------------------ */
//
// Display, load and save for entries whose value cell is a button mask
// rather than a choice index. Their on-enter overrides live in `capture`.

pub fn draw_mapping_value(ctx: &mut Ctx<'_>, drawn: EntryId, active: EntryId) {
    let entry = ctx.tree.entry(drawn);
    let Target::Value(vid) = entry.target else {
        return;
    };
    let Some(mask) = ctx.values.mask(vid) else {
        return;
    };
    let (text, error) = match mask.single_name() {
        Some(name) => (name, false),
        None => ("Invalid", true),
    };
    draw_value_text(ctx, text, entry.position, drawn == active, error);
}

pub fn draw_hotkey_value(ctx: &mut Ctx<'_>, drawn: EntryId, active: EntryId) {
    let entry = ctx.tree.entry(drawn);
    let Target::Value(vid) = entry.target else {
        return;
    };
    let Some(mask) = ctx.values.mask(vid) else {
        return;
    };
    let text = mask.combo_name();
    draw_value_text(ctx, &text, entry.position, drawn == active, false);
}

pub fn load_mapping(tree: &MenuTree, values: &mut ValueStore, entry: EntryId, token: &str) {
    if let Target::Value(vid) = tree.entry(entry).target {
        values.set_mask(vid, codec::decode_single(token));
    }
}

pub fn save_mapping(tree: &MenuTree, values: &ValueStore, entry: EntryId) -> Option<String> {
    let e = tree.entry(entry);
    let key = e.persistent_name.as_deref()?;
    let Target::Value(vid) = e.target else {
        return None;
    };
    let mask = values.mask(vid)?;
    Some(format!("{key} = {}\n", codec::encode_single(mask)))
}

pub fn load_hotkey(tree: &MenuTree, values: &mut ValueStore, entry: EntryId, token: &str) {
    if let Target::Value(vid) = tree.entry(entry).target {
        values.set_mask(vid, codec::decode_combo(token));
    }
}

pub fn save_hotkey(tree: &MenuTree, values: &ValueStore, entry: EntryId) -> Option<String> {
    let e = tree.entry(entry);
    let key = e.persistent_name.as_deref()?;
    let Target::Value(vid) = e.target else {
        return None;
    };
    let mask = values.mask(vid)?;
    Some(format!("{key} = {}\n", codec::encode_combo(mask)))
}

/* ----------------------- 64-bit decimal output ------------------------ */

pub(crate) fn fmt_u64(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = [0u8; 20];
    let mut len = 0;
    while value > 0 {
        digits[len] = b'0' + (value % 10) as u8;
        value /= 10;
        len += 1;
    }
    digits[..len].reverse();
    String::from_utf8_lossy(&digits[..len]).into_owned()
}

pub(crate) fn fmt_i64(value: i64) -> String {
    // i64::MIN has no positive counterpart; negating it would overflow.
    if value == i64::MIN {
        return "-9223372036854775808".to_string();
    }
    if value < 0 {
        format!("-{}", fmt_u64(value.unsigned_abs()))
    } else {
        fmt_u64(value as u64)
    }
}
