//! Textual encodings for the settings file.
//!
//! Ordinary options persist their choice token; remaps and hotkeys persist
//! one code character per button from the fixed table below, or `x` for
//! "unbound"/"empty". Comments after `#` are for the human editing the file
//! and are ignored on load.

use crate::core::input::{BUTTON_COUNT, BUTTON_NAMES, Buttons};

/// One-character persistence codes, by bit position. Must stay in step with
/// [`BUTTON_NAMES`].
pub const BUTTON_CODES: [char; BUTTON_COUNT] = [
    'L', 'R', // triggers
    'v', '^', '<', '>', // d-pad
    'S', 's', // Start, Select
    'B', 'A', 'Y', 'X', // face buttons
    'd', 'u', 'l', 'r', // analog nub
];

/// Split one configuration line into `(name, token)`.
///
/// Whitespace around the `=` and around both fields is insignificant; a `#`
/// starts a trailing comment; lines without both a name and a token yield
/// `None` and are skipped by the loader.
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let body = match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    };
    let (name, token) = body.split_once('=')?;
    let name = name.trim();
    let token = token.trim();
    if name.is_empty() || token.is_empty() {
        return None;
    }
    Some((name, token))
}

/// Decode a single-button token. Only the first character is consulted; `x`
/// or anything not in the code table means "unbound".
pub fn decode_single(token: &str) -> Buttons {
    let Some(first) = token.chars().next() else {
        return Buttons::empty();
    };
    BUTTON_CODES
        .iter()
        .position(|&code| code == first)
        .map(Buttons::bit)
        .unwrap_or_default()
}

/// Encode a single-button mask as `code #Name`, or `x #None` when unbound.
/// A multi-bit mask cannot be produced by capture, but if one appears it is
/// saved as unbound rather than inventing a code for it.
pub fn encode_single(mask: Buttons) -> String {
    for i in 0..BUTTON_COUNT {
        if mask == Buttons::bit(i) {
            return format!("{} #{}", BUTTON_CODES[i], BUTTON_NAMES[i]);
        }
    }
    "x #None".to_string()
}

/// Decode a multi-button token: every recognised character ORs its button
/// in, unrecognised ones are skipped. A leading `x` means "empty".
pub fn decode_combo(token: &str) -> Buttons {
    if token.starts_with('x') {
        return Buttons::empty();
    }
    let mut mask = Buttons::empty();
    for c in token.chars() {
        if let Some(i) = BUTTON_CODES.iter().position(|&code| code == c) {
            mask |= Buttons::bit(i);
        }
    }
    mask
}

/// Encode a multi-button mask as concatenated codes in table order plus a
/// `+`-joined name comment, or `x #None` when empty.
pub fn encode_combo(mask: Buttons) -> String {
    let mut codes = String::new();
    for i in 0..BUTTON_COUNT {
        if mask.contains(Buttons::bit(i)) {
            codes.push(BUTTON_CODES[i]);
        }
    }
    if codes.is_empty() {
        "x #None".to_string()
    } else {
        format!("{codes} #{}", mask.combo_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_line_tolerates_whitespace_and_comments() {
        assert_eq!(
            parse_line("  image_size =  aspect  # keep the ratio"),
            Some(("image_size", "aspect"))
        );
        assert_eq!(parse_line("frameskip=auto"), Some(("frameskip", "auto")));
        assert_eq!(parse_line("# full-line comment"), None);
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("name ="), None, "blank token is skipped");
        assert_eq!(parse_line(" = value"), None, "blank name is skipped");
        assert_eq!(parse_line("no equals sign"), None);
    }

    #[test]
    fn single_codec_round_trips_every_button() {
        for i in 0..BUTTON_COUNT {
            let mask = Buttons::bit(i);
            let encoded = encode_single(mask);
            let token = encoded.split(' ').next().unwrap();
            assert_eq!(decode_single(token), mask, "code {token:?} must round-trip");
        }
    }

    #[test]
    fn unbound_encodes_as_x_and_back() {
        assert_eq!(encode_single(Buttons::empty()), "x #None");
        assert_eq!(decode_single("x"), Buttons::empty());
        assert_eq!(
            decode_single("?"),
            Buttons::empty(),
            "unknown codes load as unbound"
        );
    }

    #[test]
    fn multibit_single_mask_saves_as_unbound() {
        assert_eq!(encode_single(Buttons::START | Buttons::SELECT), "x #None");
    }

    #[test]
    fn single_decode_consults_only_the_first_character() {
        assert_eq!(decode_single("ABC"), Buttons::FACE_RIGHT);
        assert_eq!(decode_single("xA"), Buttons::empty());
    }

    #[test]
    fn combo_codec_concatenates_in_table_order() {
        let mask = Buttons::TRIGGER_R | Buttons::FACE_UP | Buttons::START;
        assert_eq!(encode_combo(mask), "RSX #R+Start+X");
        assert_eq!(decode_combo("RSX"), mask);
        assert_eq!(decode_combo("XSR"), mask, "decode order does not matter");
    }

    #[test]
    fn combo_decode_skips_unknown_characters() {
        assert_eq!(decode_combo("R?S!"), Buttons::TRIGGER_R | Buttons::START);
        assert_eq!(decode_combo("x"), Buttons::empty());
        assert_eq!(encode_combo(Buttons::empty()), "x #None");
    }
}
