//! The static menu/entry data model.
//!
//! The whole tree is an arena of immutable [`Menu`] and [`Entry`] definitions
//! built once at startup by [`TreeBuilder`] and addressed by [`MenuId`] /
//! [`EntryId`]. The only mutable state is the [`ValueStore`] holding every
//! entry's current value, and the navigation cursor owned by
//! [`navigate::run`].

pub mod behavior;
pub mod capture;
pub mod navigate;

use crate::core::input::Buttons;
use behavior::{EntryOps, MenuOps, NavFn};
use log::warn;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MenuId(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntryId(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValueId(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    /// An index into a fixed list of labeled choices (or a button mask for
    /// capture-driven entries, which leave the choice list empty).
    Option,
    /// Activating switches the active menu to a child menu.
    Submenu,
    /// A read-only live scalar or string.
    Display,
    /// Behavior is entirely the entry's on-enter override.
    Custom,
}

/// Closed union of every type an entry's target cell can hold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Str(String),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    /// Choice index of an option entry.
    Index(u32),
    /// Current value of a remap or hotkey entry.
    Mask(Buttons),
}

impl Value {
    fn variant_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "Str",
            Value::I32(_) => "I32",
            Value::U32(_) => "U32",
            Value::I64(_) => "I64",
            Value::U64(_) => "U64",
            Value::Index(_) => "Index",
            Value::Mask(_) => "Mask",
        }
    }
}

/// Arena of mutable value cells. Typed accessors keep the entry-kind/value
/// pairing checked: a mismatched access warns and leaves the cell unchanged
/// instead of reinterpreting it.
#[derive(Debug, Default)]
pub struct ValueStore {
    cells: Vec<Value>,
}

impl ValueStore {
    fn push(&mut self, value: Value) -> ValueId {
        let id = ValueId(self.cells.len() as u32);
        self.cells.push(value);
        id
    }

    pub fn get(&self, id: ValueId) -> &Value {
        &self.cells[id.0 as usize]
    }

    pub fn index(&self, id: ValueId) -> Option<u32> {
        match self.cells[id.0 as usize] {
            Value::Index(i) => Some(i),
            _ => None,
        }
    }

    pub fn mask(&self, id: ValueId) -> Option<Buttons> {
        match self.cells[id.0 as usize] {
            Value::Mask(m) => Some(m),
            _ => None,
        }
    }

    pub fn set_index(&mut self, id: ValueId, index: u32) {
        match &mut self.cells[id.0 as usize] {
            Value::Index(i) => *i = index,
            other => warn!(
                "refusing to store a choice index in a {} cell",
                other.variant_name()
            ),
        }
    }

    pub fn set_mask(&mut self, id: ValueId, mask: Buttons) {
        match &mut self.cells[id.0 as usize] {
            Value::Mask(m) => *m = mask,
            other => warn!(
                "refusing to store a button mask in a {} cell",
                other.variant_name()
            ),
        }
    }

    /// Replace a cell's value; the variant must match the cell's.
    pub fn set(&mut self, id: ValueId, value: Value) {
        let cell = &mut self.cells[id.0 as usize];
        if std::mem::discriminant(cell) == std::mem::discriminant(&value) {
            *cell = value;
        } else {
            warn!(
                "refusing to replace a {} cell with a {} value",
                cell.variant_name(),
                value.variant_name()
            );
        }
    }
}

/// One `(human-readable label, persisted token)` choice of an option entry.
#[derive(Clone, Copy, Debug)]
pub struct Choice {
    pub label: &'static str,
    pub token: &'static str,
}

/// Where an entry's current value lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    None,
    Value(ValueId),
    Submenu(MenuId),
}

/// A single line in a menu. Defined once, immutable for the process's
/// lifetime; only the value cell it targets is mutated during navigation.
pub struct Entry {
    pub kind: EntryKind,
    pub name: String,
    pub persistent_name: Option<String>,
    /// 0-based line number under the default display functions. Custom
    /// display overrides may give it a new meaning.
    pub position: u32,
    pub target: Target,
    pub choices: &'static [Choice],
    pub ops: EntryOps,
    /// Opaque application tag, unused by the generic model.
    pub user: u32,
}

impl Entry {
    pub fn option(
        name: impl Into<String>,
        persistent_name: impl Into<String>,
        position: u32,
        target: ValueId,
        choices: &'static [Choice],
    ) -> Self {
        Self {
            kind: EntryKind::Option,
            name: name.into(),
            persistent_name: Some(persistent_name.into()),
            position,
            target: Target::Value(target),
            choices,
            ops: EntryOps::default(),
            user: 0,
        }
    }

    pub fn submenu(name: impl Into<String>, position: u32, menu: MenuId) -> Self {
        Self {
            kind: EntryKind::Submenu,
            name: name.into(),
            persistent_name: None,
            position,
            target: Target::Submenu(menu),
            choices: &[],
            ops: EntryOps::default(),
            user: 0,
        }
    }

    pub fn display(name: impl Into<String>, position: u32, target: ValueId) -> Self {
        Self {
            kind: EntryKind::Display,
            name: name.into(),
            persistent_name: None,
            position,
            target: Target::Value(target),
            choices: &[],
            ops: EntryOps::default(),
            user: 0,
        }
    }

    pub fn custom(name: impl Into<String>, position: u32, on_enter: NavFn) -> Self {
        Self {
            kind: EntryKind::Custom,
            name: name.into(),
            persistent_name: None,
            position,
            target: Target::None,
            choices: &[],
            ops: EntryOps {
                on_enter: Some(on_enter),
                ..EntryOps::default()
            },
            user: 0,
        }
    }

    pub fn with_ops(mut self, ops: EntryOps) -> Self {
        self.ops = ops;
        self
    }

    pub fn with_user(mut self, user: u32) -> Self {
        self.user = user;
        self
    }
}

/// An ordered list of entries with a back-reference to its parent.
pub struct Menu {
    pub parent: Option<MenuId>,
    pub title: String,
    pub entries: SmallVec<[EntryId; 8]>,
    pub ops: MenuOps,
}

/// Validation failures raised by [`TreeBuilder::build`].
#[derive(Debug)]
pub enum TreeError {
    UndefinedMenu(u32),
    EmptyMenu(String),
    DanglingSubmenu { entry: String },
    OptionWithoutKey { entry: String },
    OptionTargetMismatch { entry: String },
    DisplayTargetMissing { entry: String },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::UndefinedMenu(id) => write!(f, "menu #{id} was allocated but never defined"),
            TreeError::EmptyMenu(title) => write!(f, "menu '{title}' has no entries"),
            TreeError::DanglingSubmenu { entry } => {
                write!(f, "submenu entry '{entry}' does not target a menu")
            }
            TreeError::OptionWithoutKey { entry } => {
                write!(f, "option entry '{entry}' has no persistent name")
            }
            TreeError::OptionTargetMismatch { entry } => write!(
                f,
                "option entry '{entry}' must target a choice-index or button-mask cell"
            ),
            TreeError::DisplayTargetMissing { entry } => {
                write!(f, "display entry '{entry}' does not target a value cell")
            }
        }
    }
}

impl std::error::Error for TreeError {}

/// The fixed configuration tree: arenas of immutable definitions plus the
/// depth-first, first-match-wins index of option entries by persistent name.
pub struct MenuTree {
    menus: Vec<Menu>,
    entries: Vec<Entry>,
    root: MenuId,
    options_by_name: FxHashMap<String, EntryId>,
}

impl MenuTree {
    pub fn root(&self) -> MenuId {
        self.root
    }

    pub fn menu(&self, id: MenuId) -> &Menu {
        &self.menus[id.0 as usize]
    }

    pub fn entry(&self, id: EntryId) -> &Entry {
        &self.entries[id.0 as usize]
    }

    /// The entry at `index` within `menu`, if the index is live.
    pub fn entry_at(&self, menu: MenuId, index: usize) -> Option<EntryId> {
        self.menu(menu).entries.get(index).copied()
    }

    /// Case-insensitive lookup of an option entry by persistent name.
    /// Only option-kind entries are ever returned; the index is built that
    /// way, so a hit can always be loaded into.
    pub fn find_option(&self, persistent_name: &str) -> Option<EntryId> {
        self.options_by_name
            .get(&persistent_name.to_ascii_lowercase())
            .copied()
    }

    /// All option entries in save order: a pre-order walk from the root that
    /// descends into submenu entries as it meets them.
    pub fn options_preorder(&self) -> Vec<EntryId> {
        let mut out = Vec::new();
        self.collect_options(self.root, &mut out);
        out
    }

    fn collect_options(&self, menu: MenuId, out: &mut Vec<EntryId>) {
        for &eid in &self.menu(menu).entries {
            let entry = self.entry(eid);
            match entry.kind {
                EntryKind::Submenu => {
                    if let Target::Submenu(child) = entry.target {
                        self.collect_options(child, out);
                    }
                }
                EntryKind::Option => out.push(eid),
                _ => {}
            }
        }
    }
}

/// Builds the arena. Menus are allocated up front so entries can reference
/// child menus before those are defined.
#[derive(Default)]
pub struct TreeBuilder {
    menus: Vec<Option<Menu>>,
    entries: Vec<Entry>,
    values: ValueStore,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&mut self, value: Value) -> ValueId {
        self.values.push(value)
    }

    pub fn alloc_menu(&mut self) -> MenuId {
        let id = MenuId(self.menus.len() as u32);
        self.menus.push(None);
        id
    }

    pub fn define_menu(
        &mut self,
        id: MenuId,
        parent: Option<MenuId>,
        title: impl Into<String>,
        entries: Vec<EntryId>,
        ops: MenuOps,
    ) {
        self.menus[id.0 as usize] = Some(Menu {
            parent,
            title: title.into(),
            entries: entries.into_iter().collect(),
            ops,
        });
    }

    pub fn entry(&mut self, entry: Entry) -> EntryId {
        let id = EntryId(self.entries.len() as u32);
        self.entries.push(entry);
        id
    }

    pub fn build(self, root: MenuId) -> Result<(MenuTree, ValueStore), TreeError> {
        let mut menus = Vec::with_capacity(self.menus.len());
        for (i, slot) in self.menus.into_iter().enumerate() {
            menus.push(slot.ok_or(TreeError::UndefinedMenu(i as u32))?);
        }

        for menu in &menus {
            if menu.entries.is_empty() {
                return Err(TreeError::EmptyMenu(menu.title.clone()));
            }
        }

        for entry in &self.entries {
            match entry.kind {
                EntryKind::Submenu => {
                    if !matches!(entry.target, Target::Submenu(_)) {
                        return Err(TreeError::DanglingSubmenu {
                            entry: entry.name.clone(),
                        });
                    }
                }
                EntryKind::Option => {
                    if entry.persistent_name.is_none() {
                        return Err(TreeError::OptionWithoutKey {
                            entry: entry.name.clone(),
                        });
                    }
                    let ok = matches!(entry.target, Target::Value(id)
                        if matches!(self.values.get(id), Value::Index(_) | Value::Mask(_)));
                    if !ok {
                        return Err(TreeError::OptionTargetMismatch {
                            entry: entry.name.clone(),
                        });
                    }
                }
                EntryKind::Display => {
                    if !matches!(entry.target, Target::Value(_)) {
                        return Err(TreeError::DisplayTargetMissing {
                            entry: entry.name.clone(),
                        });
                    }
                }
                EntryKind::Custom => {}
            }
        }

        let mut tree = MenuTree {
            menus,
            entries: self.entries,
            root,
            options_by_name: FxHashMap::default(),
        };
        let mut index = FxHashMap::default();
        for eid in tree.options_preorder() {
            if let Some(name) = &tree.entry(eid).persistent_name {
                index.entry(name.to_ascii_lowercase()).or_insert(eid);
            }
        }
        tree.options_by_name = index;
        Ok((tree, self.values))
    }
}

pub(crate) fn pace_wait(pace: Duration) {
    if !pace.is_zero() {
        std::thread::sleep(pace);
    }
}


#[cfg(test)]
mod tests {
    use super::behavior::MenuOps;
    use super::*;

    const YES_NO: &[Choice] = &[
        Choice {
            label: "No",
            token: "no",
        },
        Choice {
            label: "Yes",
            token: "yes",
        },
    ];

    #[test]
    fn builder_validates_option_entries() {
        let mut b = TreeBuilder::new();
        let root = b.alloc_menu();
        let cell = b.value(Value::Str("not an index".into()));
        let bad = b.entry(Entry::option("Broken", "broken", 0, cell, YES_NO));
        b.define_menu(root, None, "Root", vec![bad], MenuOps::default());
        let err = b.build(root).err().expect("build should reject the tree");
        assert!(
            matches!(err, TreeError::OptionTargetMismatch { .. }),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn builder_rejects_undefined_menus() {
        let mut b = TreeBuilder::new();
        let root = b.alloc_menu();
        let orphan = b.alloc_menu();
        let link = b.entry(Entry::submenu("Child...", 0, orphan));
        b.define_menu(root, None, "Root", vec![link], MenuOps::default());
        let err = b.build(root).err().expect("build should reject the tree");
        assert!(matches!(err, TreeError::UndefinedMenu(_)));
    }

    #[test]
    fn find_option_is_case_insensitive_and_first_match_wins() {
        let mut b = TreeBuilder::new();
        let root = b.alloc_menu();
        let child = b.alloc_menu();
        let first = b.value(Value::Index(0));
        let second = b.value(Value::Index(1));
        let in_child = b.entry(Entry::option("Nested", "Shared_Key", 0, first, YES_NO));
        let link = b.entry(Entry::submenu("Child...", 0, child));
        let later = b.entry(Entry::option("Shadowed", "shared_key", 1, second, YES_NO));
        b.define_menu(child, Some(root), "Child", vec![in_child], MenuOps::default());
        b.define_menu(root, None, "Root", vec![link, later], MenuOps::default());
        let (tree, _values) = b.build(root).expect("tree should build");

        let hit = tree.find_option("SHARED_KEY").expect("lookup should hit");
        assert_eq!(
            tree.entry(hit).name, "Nested",
            "depth-first match must win over the shallower duplicate"
        );
    }

    #[test]
    fn value_store_rejects_mismatched_writes() {
        let mut store = ValueStore::default();
        let id = store.push(Value::Index(1));
        store.set_mask(id, Buttons::START);
        assert_eq!(store.index(id), Some(1), "mismatched write must not land");
        store.set_index(id, 2);
        assert_eq!(store.index(id), Some(2));
    }
}
