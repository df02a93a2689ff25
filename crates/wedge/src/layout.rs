//! US keyboard layout shared by the virtual keyboards
//!
//! Text is resolved to physical key caps plus a shift flag. Each keyboard
//! backend maps the caps onto its own key codes.

use crate::emit::EmitError;

/// A physical key on a US ANSI keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCap {
    /// Letter key, `0` is A and `25` is Z
    Letter(u8),
    /// Digit key on the top row
    Digit(u8),
    /// Space bar
    Space,
    /// Enter / Return
    Enter,
    /// Tab
    Tab,
    /// `-` and `_`
    Minus,
    /// `=` and `+`
    Equal,
    /// `[` and `{`
    LeftBracket,
    /// `]` and `}`
    RightBracket,
    /// `\` and `|`
    Backslash,
    /// `;` and `:`
    Semicolon,
    /// `'` and `"`
    Apostrophe,
    /// `` ` `` and `~`
    Grave,
    /// `,` and `<`
    Comma,
    /// `.` and `>`
    Dot,
    /// `/` and `?`
    Slash,
}

/// One key press, optionally with shift held
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stroke {
    /// Key to press
    pub key: KeyCap,
    /// Whether shift is held around the press
    pub shift: bool,
}

impl Stroke {
    const fn plain(key: KeyCap) -> Self {
        Self { key, shift: false }
    }

    const fn shifted(key: KeyCap) -> Self {
        Self { key, shift: true }
    }
}

/// Stroke producing `c`, or `None` when the layout has no key for it
pub const fn stroke_for(c: char) -> Option<Stroke> {
    use KeyCap::*;

    let stroke = match c {
        'a'..='z' => Stroke::plain(Letter(c as u8 - b'a')),
        'A'..='Z' => Stroke::shifted(Letter(c as u8 - b'A')),
        '0'..='9' => Stroke::plain(Digit(c as u8 - b'0')),
        ' ' => Stroke::plain(Space),
        '\n' | '\r' => Stroke::plain(Enter),
        '\t' => Stroke::plain(Tab),
        '-' => Stroke::plain(Minus),
        '_' => Stroke::shifted(Minus),
        '=' => Stroke::plain(Equal),
        '+' => Stroke::shifted(Equal),
        '[' => Stroke::plain(LeftBracket),
        '{' => Stroke::shifted(LeftBracket),
        ']' => Stroke::plain(RightBracket),
        '}' => Stroke::shifted(RightBracket),
        '\\' => Stroke::plain(Backslash),
        '|' => Stroke::shifted(Backslash),
        ';' => Stroke::plain(Semicolon),
        ':' => Stroke::shifted(Semicolon),
        '\'' => Stroke::plain(Apostrophe),
        '"' => Stroke::shifted(Apostrophe),
        '`' => Stroke::plain(Grave),
        '~' => Stroke::shifted(Grave),
        ',' => Stroke::plain(Comma),
        '<' => Stroke::shifted(Comma),
        '.' => Stroke::plain(Dot),
        '>' => Stroke::shifted(Dot),
        '/' => Stroke::plain(Slash),
        '?' => Stroke::shifted(Slash),
        '!' => Stroke::shifted(Digit(1)),
        '@' => Stroke::shifted(Digit(2)),
        '#' => Stroke::shifted(Digit(3)),
        '$' => Stroke::shifted(Digit(4)),
        '%' => Stroke::shifted(Digit(5)),
        '^' => Stroke::shifted(Digit(6)),
        '&' => Stroke::shifted(Digit(7)),
        '*' => Stroke::shifted(Digit(8)),
        '(' => Stroke::shifted(Digit(9)),
        ')' => Stroke::shifted(Digit(0)),
        _ => return None,
    };
    Some(stroke)
}

/// Resolve all of `text`, failing on the first character without a key
///
/// Resolving up front means an unmappable character types nothing.
pub fn strokes(text: &str) -> Result<Vec<Stroke>, EmitError> {
    text.chars()
        .map(|c| stroke_for(c).ok_or(EmitError::Unmappable(c)))
        .collect()
}

/// Every key cap the layout can produce, for registering with a device
pub fn all_key_caps() -> impl Iterator<Item = KeyCap> {
    use KeyCap::*;

    (0..26).map(Letter).chain((0..10).map(Digit)).chain([
        Space,
        Enter,
        Tab,
        Minus,
        Equal,
        LeftBracket,
        RightBracket,
        Backslash,
        Semicolon,
        Apostrophe,
        Grave,
        Comma,
        Dot,
        Slash,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_and_decimal_characters() {
        assert_eq!(stroke_for('0'), Some(Stroke::plain(KeyCap::Digit(0))));
        assert_eq!(stroke_for('a'), Some(Stroke::plain(KeyCap::Letter(0))));
        assert_eq!(stroke_for('F'), Some(Stroke::shifted(KeyCap::Letter(5))));
        assert_eq!(stroke_for('\n'), Some(Stroke::plain(KeyCap::Enter)));
        assert_eq!(stroke_for(':'), Some(Stroke::shifted(KeyCap::Semicolon)));
        assert_eq!(stroke_for('é'), None);
    }

    #[test]
    fn test_unmappable_text_resolves_nothing() {
        assert!(matches!(strokes("04A1é"), Err(EmitError::Unmappable('é'))));
        assert_eq!(strokes("ID:1\n").unwrap().len(), 5);
    }

    #[test]
    fn test_every_printable_key_is_listed() {
        let caps: Vec<_> = all_key_caps().collect();
        for c in (0x20u8..0x7F).map(char::from).chain(['\n', '\t']) {
            let stroke = stroke_for(c).unwrap_or_else(|| panic!("{c:?} has no key"));
            assert!(caps.contains(&stroke.key), "{c:?} maps to unlisted {stroke:?}");
        }
    }
}
