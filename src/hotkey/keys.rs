//! Physical key definitions
//!
//! Key codes are macOS virtual key codes. They name physical keys, not symbols:
//! shifted symbols (`@`, `|`, `_` ...) share the code of their unshifted key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HotkeyError;

macro_rules! keys {
    ($($variant:ident => ($code:literal, $name:literal, $display:literal)),+ $(,)?) => {
        /// A physical keyboard key
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub enum Key {
            $($variant,)+
        }

        impl Key {
            /// Every key, in declaration order
            pub const ALL: &'static [Key] = &[$(Key::$variant,)+];

            /// macOS virtual key code
            pub fn code(self) -> u16 {
                match self {
                    $(Key::$variant => $code,)+
                }
            }

            /// Canonical lowercase name, as accepted by [`Key::from_name`]
            pub fn name(self) -> &'static str {
                match self {
                    $(Key::$variant => $name,)+
                }
            }

            /// Label used when rendering a shortcut
            pub fn display(self) -> &'static str {
                match self {
                    $(Key::$variant => $display,)+
                }
            }

            /// Look up a key by its virtual key code
            pub fn from_code(code: u16) -> Option<Self> {
                match code {
                    $($code => Some(Key::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

keys! {
    // Letters
    A => (0, "a", "A"),
    S => (1, "s", "S"),
    D => (2, "d", "D"),
    F => (3, "f", "F"),
    H => (4, "h", "H"),
    G => (5, "g", "G"),
    Z => (6, "z", "Z"),
    X => (7, "x", "X"),
    C => (8, "c", "C"),
    V => (9, "v", "V"),
    B => (11, "b", "B"),
    Q => (12, "q", "Q"),
    W => (13, "w", "W"),
    E => (14, "e", "E"),
    R => (15, "r", "R"),
    Y => (16, "y", "Y"),
    T => (17, "t", "T"),
    O => (31, "o", "O"),
    U => (32, "u", "U"),
    I => (34, "i", "I"),
    P => (35, "p", "P"),
    L => (37, "l", "L"),
    J => (38, "j", "J"),
    K => (40, "k", "K"),
    N => (45, "n", "N"),
    M => (46, "m", "M"),

    // Top row numbers
    One => (18, "1", "1"),
    Two => (19, "2", "2"),
    Three => (20, "3", "3"),
    Four => (21, "4", "4"),
    Six => (22, "6", "6"),
    Five => (23, "5", "5"),
    Nine => (25, "9", "9"),
    Seven => (26, "7", "7"),
    Eight => (28, "8", "8"),
    Zero => (29, "0", "0"),

    // Punctuation
    Equal => (24, "=", "="),
    Minus => (27, "-", "-"),
    RightBracket => (30, "]", "]"),
    LeftBracket => (33, "[", "["),
    Quote => (39, "'", "'"),
    Semicolon => (41, ";", ";"),
    Backslash => (42, "\\", "\\"),
    Comma => (43, ",", ","),
    Slash => (44, "/", "/"),
    Period => (47, ".", "."),
    Grave => (50, "`", "`"),

    // Keypad
    KeypadDecimal => (65, "pad_decimal", "Keypad ."),
    KeypadMultiply => (67, "pad_multiply", "Keypad *"),
    KeypadPlus => (69, "pad_plus", "Keypad +"),
    KeypadClear => (71, "pad_clear", "⌧"),
    KeypadDivide => (75, "pad_divide", "Keypad /"),
    KeypadEnter => (76, "pad_enter", "⌤"),
    KeypadMinus => (78, "pad_minus", "Keypad -"),
    KeypadEquals => (81, "pad_equals", "Keypad ="),
    Keypad0 => (82, "pad_0", "Keypad 0"),
    Keypad1 => (83, "pad_1", "Keypad 1"),
    Keypad2 => (84, "pad_2", "Keypad 2"),
    Keypad3 => (85, "pad_3", "Keypad 3"),
    Keypad4 => (86, "pad_4", "Keypad 4"),
    Keypad5 => (87, "pad_5", "Keypad 5"),
    Keypad6 => (88, "pad_6", "Keypad 6"),
    Keypad7 => (89, "pad_7", "Keypad 7"),
    Keypad8 => (91, "pad_8", "Keypad 8"),
    Keypad9 => (92, "pad_9", "Keypad 9"),

    // Function keys
    F1 => (122, "f1", "F1"),
    F2 => (120, "f2", "F2"),
    F3 => (99, "f3", "F3"),
    F4 => (118, "f4", "F4"),
    F5 => (96, "f5", "F5"),
    F6 => (97, "f6", "F6"),
    F7 => (98, "f7", "F7"),
    F8 => (100, "f8", "F8"),
    F9 => (101, "f9", "F9"),
    F10 => (109, "f10", "F10"),
    F11 => (103, "f11", "F11"),
    F12 => (111, "f12", "F12"),
    F13 => (105, "f13", "F13"),
    F14 => (107, "f14", "F14"),
    F15 => (113, "f15", "F15"),
    F16 => (106, "f16", "F16"),
    F17 => (64, "f17", "F17"),
    F18 => (79, "f18", "F18"),
    F19 => (80, "f19", "F19"),
    F20 => (90, "f20", "F20"),

    // Navigation
    LeftArrow => (123, "left", "←"),
    RightArrow => (124, "right", "→"),
    DownArrow => (125, "down", "↓"),
    UpArrow => (126, "up", "↑"),
    Home => (115, "home", "↖"),
    End => (119, "end", "↘"),
    PageUp => (116, "pageup", "⇞"),
    PageDown => (121, "pagedown", "⇟"),

    // Special keys
    Return => (36, "return", "↩"),
    Tab => (48, "tab", "⇥"),
    Space => (49, "space", "Space"),
    Delete => (51, "delete", "⌫"),
    Escape => (53, "esc", "⎋"),
    ForwardDelete => (117, "forwarddelete", "⌦"),
    Help => (114, "help", "Help"),
    VolumeUp => (72, "volumeup", "Volume Up"),
    VolumeDown => (73, "volumedown", "Volume Down"),
    Mute => (74, "mute", "Mute"),
}

impl Key {
    /// Look up a key by name (case-insensitive, common aliases accepted)
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        let canonical = match name.as_str() {
            "enter" => "return",
            "backspace" => "delete",
            "escape" => "esc",
            "del" | "forward_delete" => "forwarddelete",
            "page_up" => "pageup",
            "page_down" => "pagedown",
            "pad_return" => "pad_enter",
            "pad_equal" => "pad_equals",
            "minus" | "underscore" | "_" => "-",
            "equal" | "equals" | "plus" => "=",
            "leftbracket" => "[",
            "rightbracket" => "]",
            "backslash" => "\\",
            "semicolon" => ";",
            "quote" => "'",
            "comma" => ",",
            "period" => ".",
            "slash" => "/",
            "grave" | "backtick" => "`",
            other => other,
        };

        Key::ALL.iter().copied().find(|key| key.name() == canonical)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

impl FromStr for Key {
    type Err = HotkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Key::from_name(s).ok_or_else(|| HotkeyError::InvalidShortcut(format!("unknown key '{s}'")))
    }
}
