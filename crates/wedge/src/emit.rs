//! Keystroke emission
//!
//! A [`Keyboard`] turns text into key presses. The [`Emitter`] composes
//! `prefix + uid + suffix` and hands it to the keyboard.

use std::fmt;
use std::io::{self, Write};
use tapwedge_apdu_core::Uid;
use thiserror::Error;
use tracing::info;

use crate::config::{Config, UidFormat};

/// Errors while producing keystrokes
#[derive(Debug, Error)]
pub enum EmitError {
    /// The output device could not be created or written
    #[error("Keyboard I/O error: {0}")]
    Io(#[from] io::Error),

    /// The text contains a character with no key on the emulated layout
    #[error("No key for character {0:?}")]
    Unmappable(char),

    /// The platform refused a synthesized key event
    #[error("Failed to simulate key event")]
    Simulate,

    /// No virtual keyboard exists on this platform
    #[error("Virtual keyboard is not supported on this platform, use --dry-run")]
    Unsupported,
}

/// Sink that types text as if entered on a keyboard
pub trait Keyboard: fmt::Debug {
    /// Type `text` into the focused application
    fn type_text(&mut self, text: &str) -> Result<(), EmitError>;
}

impl<K: Keyboard + ?Sized> Keyboard for Box<K> {
    fn type_text(&mut self, text: &str) -> Result<(), EmitError> {
        (**self).type_text(text)
    }
}

/// Writes the text to a stream instead of injecting keys
#[derive(Debug)]
pub struct StdoutKeyboard<W = io::Stdout> {
    out: W,
}

impl StdoutKeyboard {
    /// Keyboard printing to standard output
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> StdoutKeyboard<W> {
    /// Keyboard printing to an arbitrary writer
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Consume the keyboard and return the writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + fmt::Debug> Keyboard for StdoutKeyboard<W> {
    fn type_text(&mut self, text: &str) -> Result<(), EmitError> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

/// Open the platform's virtual keyboard
#[cfg(target_os = "linux")]
pub fn system_keyboard() -> Result<Box<dyn Keyboard>, EmitError> {
    Ok(Box::new(uinput::UinputKeyboard::new()?))
}

/// Open the platform's virtual keyboard
#[cfg(any(target_os = "macos", target_os = "windows"))]
pub fn system_keyboard() -> Result<Box<dyn Keyboard>, EmitError> {
    Ok(Box::new(simulate::SimulatedKeyboard::new()))
}

/// Open the platform's virtual keyboard
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub fn system_keyboard() -> Result<Box<dyn Keyboard>, EmitError> {
    Err(EmitError::Unsupported)
}

/// Composes the typed text for a UID and sends it to a keyboard
#[derive(Debug)]
pub struct Emitter<K> {
    keyboard: K,
    prefix: String,
    suffix: String,
    format: UidFormat,
}

impl<K: Keyboard> Emitter<K> {
    /// Create an emitter with explicit decoration
    pub const fn new(keyboard: K, prefix: String, suffix: String, format: UidFormat) -> Self {
        Self {
            keyboard,
            prefix,
            suffix,
            format,
        }
    }

    /// Create an emitter using the prefix, suffix and format of `config`
    pub fn from_config(keyboard: K, config: &Config) -> Self {
        Self::new(
            keyboard,
            config.prefix.clone(),
            config.suffix.clone(),
            config.format.clone(),
        )
    }

    /// The exact text typed for `uid`
    pub fn compose(&self, uid: &Uid) -> String {
        compose_text(&self.prefix, &self.format.render(uid), &self.suffix)
    }

    /// Type `uid` with its prefix and suffix
    pub fn emit(&mut self, uid: &Uid) -> Result<(), EmitError> {
        let text = self.compose(uid);
        info!("Typing: {}", text.trim());
        self.keyboard.type_text(&text)
    }

    /// Access the underlying keyboard
    pub const fn keyboard(&self) -> &K {
        &self.keyboard
    }

    /// Consume the emitter and return its keyboard
    pub fn into_keyboard(self) -> K {
        self.keyboard
    }
}

/// Concatenate `prefix`, `uid` and `suffix` without any separator
pub fn compose_text(prefix: &str, uid: &str, suffix: &str) -> String {
    let mut text = String::with_capacity(prefix.len() + uid.len() + suffix.len());
    text.push_str(prefix);
    text.push_str(uid);
    text.push_str(suffix);
    text
}

#[cfg(target_os = "linux")]
mod uinput {
    use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
    use evdev::{AttributeSet, EventType, InputEvent, Key};
    use std::fmt;
    use tracing::debug;

    use super::{EmitError, Keyboard};
    use crate::layout::{self, KeyCap};

    const DEVICE_NAME: &str = "tapwedge virtual keyboard";

    #[rustfmt::skip]
    const LETTERS: [Key; 26] = [
        Key::KEY_A, Key::KEY_B, Key::KEY_C, Key::KEY_D, Key::KEY_E, Key::KEY_F,
        Key::KEY_G, Key::KEY_H, Key::KEY_I, Key::KEY_J, Key::KEY_K, Key::KEY_L,
        Key::KEY_M, Key::KEY_N, Key::KEY_O, Key::KEY_P, Key::KEY_Q, Key::KEY_R,
        Key::KEY_S, Key::KEY_T, Key::KEY_U, Key::KEY_V, Key::KEY_W, Key::KEY_X,
        Key::KEY_Y, Key::KEY_Z,
    ];

    #[rustfmt::skip]
    const DIGITS: [Key; 10] = [
        Key::KEY_0, Key::KEY_1, Key::KEY_2, Key::KEY_3, Key::KEY_4,
        Key::KEY_5, Key::KEY_6, Key::KEY_7, Key::KEY_8, Key::KEY_9,
    ];

    /// Virtual keyboard backed by `/dev/uinput`
    pub(super) struct UinputKeyboard {
        device: VirtualDevice,
    }

    impl fmt::Debug for UinputKeyboard {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("UinputKeyboard").finish_non_exhaustive()
        }
    }

    impl UinputKeyboard {
        pub(super) fn new() -> Result<Self, EmitError> {
            let mut keys = AttributeSet::<Key>::new();
            keys.insert(Key::KEY_LEFTSHIFT);
            for cap in layout::all_key_caps() {
                keys.insert(key_code(cap));
            }

            let device = VirtualDeviceBuilder::new()?
                .name(DEVICE_NAME)
                .with_keys(&keys)?
                .build()?;
            debug!("Created uinput keyboard");

            Ok(Self { device })
        }

        fn press(&mut self, key: Key, shift: bool) -> Result<(), EmitError> {
            if shift {
                self.set(Key::KEY_LEFTSHIFT, true)?;
            }
            self.set(key, true)?;
            self.set(key, false)?;
            if shift {
                self.set(Key::KEY_LEFTSHIFT, false)?;
            }
            Ok(())
        }

        fn set(&mut self, key: Key, down: bool) -> Result<(), EmitError> {
            let event = InputEvent::new(EventType::KEY, key.code(), i32::from(down));
            self.device.emit(&[event])?;
            Ok(())
        }
    }

    impl Keyboard for UinputKeyboard {
        fn type_text(&mut self, text: &str) -> Result<(), EmitError> {
            for stroke in layout::strokes(text)? {
                self.press(key_code(stroke.key), stroke.shift)?;
            }
            Ok(())
        }
    }

    /// evdev code of a US layout key cap
    pub(super) const fn key_code(cap: KeyCap) -> Key {
        match cap {
            KeyCap::Letter(i) => LETTERS[i as usize],
            KeyCap::Digit(i) => DIGITS[i as usize],
            KeyCap::Space => Key::KEY_SPACE,
            KeyCap::Enter => Key::KEY_ENTER,
            KeyCap::Tab => Key::KEY_TAB,
            KeyCap::Minus => Key::KEY_MINUS,
            KeyCap::Equal => Key::KEY_EQUAL,
            KeyCap::LeftBracket => Key::KEY_LEFTBRACE,
            KeyCap::RightBracket => Key::KEY_RIGHTBRACE,
            KeyCap::Backslash => Key::KEY_BACKSLASH,
            KeyCap::Semicolon => Key::KEY_SEMICOLON,
            KeyCap::Apostrophe => Key::KEY_APOSTROPHE,
            KeyCap::Grave => Key::KEY_GRAVE,
            KeyCap::Comma => Key::KEY_COMMA,
            KeyCap::Dot => Key::KEY_DOT,
            KeyCap::Slash => Key::KEY_SLASH,
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_key_codes() {
            assert_eq!(key_code(KeyCap::Letter(0)), Key::KEY_A);
            assert_eq!(key_code(KeyCap::Letter(25)), Key::KEY_Z);
            assert_eq!(key_code(KeyCap::Digit(0)), Key::KEY_0);
            assert_eq!(key_code(KeyCap::Enter), Key::KEY_ENTER);
            assert_eq!(key_code(KeyCap::Semicolon), Key::KEY_SEMICOLON);
        }
    }
}

/// Keyboard for macOS and Windows, synthesizing events through the OS input APIs
#[cfg(any(target_os = "macos", target_os = "windows"))]
mod simulate {
    use rdev::{EventType, Key};
    use std::thread;
    use std::time::Duration;
    use tracing::debug;

    use super::{EmitError, Keyboard};
    use crate::layout::{self, KeyCap};

    /// Pause after each event so the OS input queue keeps the order
    const EVENT_DELAY: Duration = Duration::from_millis(20);

    #[rustfmt::skip]
    const LETTERS: [Key; 26] = [
        Key::KeyA, Key::KeyB, Key::KeyC, Key::KeyD, Key::KeyE, Key::KeyF,
        Key::KeyG, Key::KeyH, Key::KeyI, Key::KeyJ, Key::KeyK, Key::KeyL,
        Key::KeyM, Key::KeyN, Key::KeyO, Key::KeyP, Key::KeyQ, Key::KeyR,
        Key::KeyS, Key::KeyT, Key::KeyU, Key::KeyV, Key::KeyW, Key::KeyX,
        Key::KeyY, Key::KeyZ,
    ];

    #[rustfmt::skip]
    const DIGITS: [Key; 10] = [
        Key::Num0, Key::Num1, Key::Num2, Key::Num3, Key::Num4,
        Key::Num5, Key::Num6, Key::Num7, Key::Num8, Key::Num9,
    ];

    #[derive(Debug, Default)]
    pub(super) struct SimulatedKeyboard;

    impl SimulatedKeyboard {
        pub(super) const fn new() -> Self {
            Self
        }

        fn send(event: &EventType) -> Result<(), EmitError> {
            rdev::simulate(event).map_err(|e| {
                debug!(error = ?e, ?event, "Key event rejected");
                EmitError::Simulate
            })?;
            thread::sleep(EVENT_DELAY);
            Ok(())
        }

        fn press(key: Key, shift: bool) -> Result<(), EmitError> {
            if shift {
                Self::send(&EventType::KeyPress(Key::ShiftLeft))?;
            }
            Self::send(&EventType::KeyPress(key))?;
            Self::send(&EventType::KeyRelease(key))?;
            if shift {
                Self::send(&EventType::KeyRelease(Key::ShiftLeft))?;
            }
            Ok(())
        }
    }

    impl Keyboard for SimulatedKeyboard {
        fn type_text(&mut self, text: &str) -> Result<(), EmitError> {
            for stroke in layout::strokes(text)? {
                Self::press(key_code(stroke.key), stroke.shift)?;
            }
            Ok(())
        }
    }

    /// rdev key of a US layout key cap
    pub(super) const fn key_code(cap: KeyCap) -> Key {
        match cap {
            KeyCap::Letter(i) => LETTERS[i as usize],
            KeyCap::Digit(i) => DIGITS[i as usize],
            KeyCap::Space => Key::Space,
            KeyCap::Enter => Key::Return,
            KeyCap::Tab => Key::Tab,
            KeyCap::Minus => Key::Minus,
            KeyCap::Equal => Key::Equal,
            KeyCap::LeftBracket => Key::LeftBracket,
            KeyCap::RightBracket => Key::RightBracket,
            KeyCap::Backslash => Key::BackSlash,
            KeyCap::Semicolon => Key::SemiColon,
            KeyCap::Apostrophe => Key::Quote,
            KeyCap::Grave => Key::BackQuote,
            KeyCap::Comma => Key::Comma,
            KeyCap::Dot => Key::Dot,
            KeyCap::Slash => Key::Slash,
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    /// Keyboard recording everything it was asked to type
    #[derive(Debug, Default)]
    struct RecordingKeyboard {
        typed: Vec<String>,
    }

    impl Keyboard for RecordingKeyboard {
        fn type_text(&mut self, text: &str) -> Result<(), EmitError> {
            self.typed.push(text.to_string());
            Ok(())
        }
    }

    fn uid() -> Uid {
        Uid::new(vec![0x04, 0xA1, 0xB2, 0xC3]).unwrap()
    }

    #[test]
    fn test_compose_text() {
        assert_eq!(compose_text("ID:", "04A1B2C3", ""), "ID:04A1B2C3");
        assert_eq!(compose_text("", "04A1B2C3", "\n"), "04A1B2C3\n");
    }

    #[test]
    fn test_emit_types_decorated_uid() {
        let mut emitter = Emitter::new(
            RecordingKeyboard::default(),
            "ID:".into(),
            String::new(),
            UidFormat::Hex,
        );
        emitter.emit(&uid()).unwrap();
        assert_eq!(emitter.keyboard().typed, vec!["ID:04A1B2C3"]);
    }

    #[test]
    fn test_emitter_from_config() {
        let config = Config {
            format: UidFormat::Dec,
            ..Config::default()
        };
        let emitter = Emitter::from_config(RecordingKeyboard::default(), &config);
        assert_eq!(emitter.compose(&uid()), "77705923\n");
    }

    #[test]
    fn test_stdout_keyboard_writes_text() {
        let mut keyboard = StdoutKeyboard::new(Vec::new());
        keyboard.type_text("04A1B2C3\n").unwrap();
        assert_eq!(keyboard.into_inner(), b"04A1B2C3\n");
    }
}
