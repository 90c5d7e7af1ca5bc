use bitflags::bitflags;

bitflags! {
    /// One frame's worth of pressed physical buttons.
    ///
    /// Bit order matches [`crate::settings::codec::BUTTON_CODES`]; the codec
    /// and the human-readable names below index by bit position.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Buttons: u32 {
        const TRIGGER_L    = 1 << 0;
        const TRIGGER_R    = 1 << 1;
        const DPAD_DOWN    = 1 << 2;
        const DPAD_UP      = 1 << 3;
        const DPAD_LEFT    = 1 << 4;
        const DPAD_RIGHT   = 1 << 5;
        const START        = 1 << 6;
        const SELECT       = 1 << 7;
        const FACE_DOWN    = 1 << 8;
        const FACE_RIGHT   = 1 << 9;
        const FACE_LEFT    = 1 << 10;
        const FACE_UP      = 1 << 11;
        const ANALOG_DOWN  = 1 << 12;
        const ANALOG_UP    = 1 << 13;
        const ANALOG_LEFT  = 1 << 14;
        const ANALOG_RIGHT = 1 << 15;
    }
}

pub const BUTTON_COUNT: usize = 16;

/// Human-readable button names, by bit position.
pub const BUTTON_NAMES: [&str; BUTTON_COUNT] = [
    "L",
    "R",
    "D-pad Down",
    "D-pad Up",
    "D-pad Left",
    "D-pad Right",
    "Start",
    "Select",
    "B",
    "A",
    "Y",
    "X",
    "Analog Down",
    "Analog Up",
    "Analog Left",
    "Analog Right",
];

impl Buttons {
    #[inline(always)]
    pub fn bit(i: usize) -> Self {
        Self::from_bits_truncate(1 << i)
    }

    /// Name for a mask expected to hold at most one button.
    ///
    /// `Some("None")` for an empty mask, `Some(name)` for exactly one bit,
    /// `None` for a multi-bit mask (callers render that as an error state).
    pub fn single_name(self) -> Option<&'static str> {
        if self.is_empty() {
            return Some("None");
        }
        (0..BUTTON_COUNT)
            .find(|&i| self == Self::bit(i))
            .map(|i| BUTTON_NAMES[i])
    }

    /// `+`-joined names of every set bit in table order, or "None".
    pub fn combo_name(self) -> String {
        if self.is_empty() {
            return "None".to_string();
        }
        let mut out = String::new();
        for i in 0..BUTTON_COUNT {
            if self.contains(Self::bit(i)) {
                if !out.is_empty() {
                    out.push('+');
                }
                out.push_str(BUTTON_NAMES[i]);
            }
        }
        out
    }
}

/// One discrete navigation action, consumed once per main-loop pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuiAction {
    None,
    Enter,
    Leave,
    Up,
    Down,
    Left,
    Right,
}

/// Input collaborator: the platform layer owns debouncing and repeat; this
/// core only sees per-frame masks and one discrete action per loop pass.
pub trait InputPort {
    /// The buttons physically held down this frame.
    fn pressed(&mut self) -> Buttons;

    /// Translate recent input into at most one navigation action.
    fn poll_action(&mut self) -> GuiAction;
}

#[cfg(test)]
mod tests {
    use super::{BUTTON_NAMES, Buttons};

    #[test]
    fn single_name_distinguishes_none_one_and_many() {
        assert_eq!(Buttons::empty().single_name(), Some("None"));
        assert_eq!(Buttons::START.single_name(), Some("Start"));
        assert_eq!(
            (Buttons::START | Buttons::SELECT).single_name(),
            None,
            "a two-button mask is not a valid single mapping"
        );
    }

    #[test]
    fn combo_name_joins_in_table_order() {
        let mask = Buttons::FACE_RIGHT | Buttons::TRIGGER_L | Buttons::START;
        assert_eq!(mask.combo_name(), "L+Start+A");
        assert_eq!(Buttons::empty().combo_name(), "None");
    }

    #[test]
    fn every_bit_has_a_name() {
        for (i, name) in BUTTON_NAMES.iter().enumerate() {
            assert_eq!(Buttons::bit(i).single_name(), Some(*name));
        }
    }
}
