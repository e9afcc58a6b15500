//! The closed alphabet of editing keys and the raw-byte decoder.
//!
//! One terminal read produces one [`DecodedInput`]: a [`Key`] plus the
//! normalized byte payload. There is no multi-read assembly; a batch that
//! ends in the middle of a known escape sequence decodes as
//! [`Key::NotDefined`].

mod decode;

pub use decode::{DecodedInput, decode, normalize};

/// Every key the decoder can report.
///
/// `NotDefined` covers printable input (the payload carries the bytes) and
/// unrecognized escape sequences. `Ignore` is reserved for sequences that
/// must be swallowed without any effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Key {
    Escape,

    ControlA,
    ControlB,
    ControlC,
    ControlD,
    ControlE,
    ControlF,
    ControlG,
    ControlH,
    ControlI,
    ControlJ,
    ControlK,
    ControlL,
    ControlM,
    ControlN,
    ControlO,
    ControlP,
    ControlQ,
    ControlR,
    ControlS,
    ControlT,
    ControlU,
    ControlV,
    ControlW,
    ControlX,
    ControlY,
    ControlZ,

    ControlSpace,
    ControlBackslash,
    ControlSquareClose,
    ControlCircumflex,
    ControlUnderscore,

    Up,
    Down,
    Right,
    Left,

    ShiftUp,
    ShiftDown,
    ShiftRight,
    ShiftLeft,

    AltUp,
    AltDown,
    AltRight,
    AltLeft,

    ControlUp,
    ControlDown,
    ControlRight,
    ControlLeft,

    Home,
    End,
    PageUp,
    PageDown,

    Insert,
    Delete,
    ShiftDelete,
    ControlDelete,

    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    F13,
    F14,
    F15,
    F16,
    F17,
    F18,
    F19,
    F20,
    F21,
    F22,
    F23,
    F24,

    Tab,
    BackTab,
    Enter,
    Backspace,
    AltBackspace,

    Ignore,
    #[default]
    NotDefined,
}
