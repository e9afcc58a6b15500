//! Byte-sequence matching and input normalization.

use crate::Key;

/// The indent unit is always a plain space; tabs never reach the buffer.
pub const INDENT_UNIT: u8 = b' ';

/// Literal escape-sequence table. Matched by exact equality against one whole
/// read, so ordering only matters where two entries share a pattern — the
/// first one wins.
const SEQUENCES: &[(&[u8], Key)] = &[
    (b"\x1b", Key::Escape),

    (&[0x00], Key::ControlSpace),
    (&[0x01], Key::ControlA),
    (&[0x02], Key::ControlB),
    (&[0x03], Key::ControlC),
    (&[0x04], Key::ControlD),
    (&[0x05], Key::ControlE),
    (&[0x06], Key::ControlF),
    (&[0x07], Key::ControlG),
    (&[0x08], Key::ControlH),
    // 0x09 is handled before the table: a lone Tab is a keybinding event.
    (&[0x0a], Key::ControlJ),
    (&[0x0b], Key::ControlK),
    (&[0x0c], Key::ControlL),
    (&[0x0d], Key::ControlM),
    (&[0x0e], Key::ControlN),
    (&[0x0f], Key::ControlO),
    (&[0x10], Key::ControlP),
    (&[0x11], Key::ControlQ),
    (&[0x12], Key::ControlR),
    (&[0x13], Key::ControlS),
    (&[0x14], Key::ControlT),
    (&[0x15], Key::ControlU),
    (&[0x16], Key::ControlV),
    (&[0x17], Key::ControlW),
    (&[0x18], Key::ControlX),
    (&[0x19], Key::ControlY),
    (&[0x1a], Key::ControlZ),
    (&[0x1c], Key::ControlBackslash),
    (&[0x1d], Key::ControlSquareClose),
    (&[0x1e], Key::ControlCircumflex),
    (&[0x1f], Key::ControlUnderscore),
    (&[0x7f], Key::Backspace),
    (b"\x1b\x7f", Key::AltBackspace),

    (b"\x1b[A", Key::Up),
    (b"\x1b[B", Key::Down),
    (b"\x1b[C", Key::Right),
    (b"\x1b[D", Key::Left),
    (b"\x1bOA", Key::Up),
    (b"\x1bOB", Key::Down),
    (b"\x1bOC", Key::Right),
    (b"\x1bOD", Key::Left),

    (b"\x1b[1;2A", Key::ShiftUp),
    (b"\x1b[1;2B", Key::ShiftDown),
    (b"\x1b[1;2C", Key::ShiftRight),
    (b"\x1b[1;2D", Key::ShiftLeft),
    (b"\x1b[1;3A", Key::AltUp),
    (b"\x1b[1;3B", Key::AltDown),
    (b"\x1b[1;3C", Key::AltRight),
    (b"\x1b[1;3D", Key::AltLeft),
    (b"\x1b[1;5A", Key::ControlUp),
    (b"\x1b[1;5B", Key::ControlDown),
    (b"\x1b[1;5C", Key::ControlRight),
    (b"\x1b[1;5D", Key::ControlLeft),

    (b"\x1b[H", Key::Home),
    (b"\x1b[1~", Key::Home),
    (b"\x1bOH", Key::Home),
    (b"\x1b[F", Key::End),
    (b"\x1b[4~", Key::End),
    (b"\x1bOF", Key::End),

    (b"\x1b[2~", Key::Insert),
    (b"\x1b[3~", Key::Delete),
    (b"\x1b[3;2~", Key::ShiftDelete),
    (b"\x1b[3;5~", Key::ControlDelete),
    (b"\x1b[5~", Key::PageUp),
    (b"\x1b[6~", Key::PageDown),
    (b"\x1b[Z", Key::BackTab),

    (b"\x1bOP", Key::F1),
    (b"\x1bOQ", Key::F2),
    (b"\x1bOR", Key::F3),
    (b"\x1bOS", Key::F4),
    (b"\x1b[11~", Key::F1),
    (b"\x1b[12~", Key::F2),
    (b"\x1b[13~", Key::F3),
    (b"\x1b[14~", Key::F4),
    (b"\x1b[15~", Key::F5),
    (b"\x1b[17~", Key::F6),
    (b"\x1b[18~", Key::F7),
    (b"\x1b[19~", Key::F8),
    (b"\x1b[20~", Key::F9),
    (b"\x1b[21~", Key::F10),
    (b"\x1b[23~", Key::F11),
    (b"\x1b[24~", Key::F12),
    (b"\x1b[25~", Key::F13),
    (b"\x1b[26~", Key::F14),
    (b"\x1b[28~", Key::F15),
    (b"\x1b[29~", Key::F16),
    (b"\x1b[31~", Key::F17),
    (b"\x1b[32~", Key::F18),
    (b"\x1b[33~", Key::F19),
    (b"\x1b[34~", Key::F20),
    (b"\x1b[23;2~", Key::F21),
    (b"\x1b[24;2~", Key::F22),
    (b"\x1b[1;2P", Key::F23),
    (b"\x1b[1;2Q", Key::F24),
];

/// One decoded terminal read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedInput {
    pub key: Key,
    /// Normalized payload: what would be inserted if the key carries text.
    pub text: Vec<u8>,
}

/// Paste-mode normalization: raw-mode `\r` becomes `\n` so multi-line pastes
/// keep their line structure, and `\t` expands to `indent_size` spaces so
/// cursor arithmetic never sees a tab stop.
pub fn normalize(input: &[u8], indent_size: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    for &b in input {
        match b {
            b'\r' => out.push(b'\n'),
            b'\t' => out.extend(std::iter::repeat_n(INDENT_UNIT, indent_size)),
            _ => out.push(b),
        }
    }
    out
}

/// Decode one read into a key plus its normalized payload.
///
/// Identical input bytes always produce the identical key. A read that is a
/// strict prefix of a known sequence has no entry of its own and therefore
/// decodes as `NotDefined`.
pub fn decode(input: &[u8], indent_size: usize) -> DecodedInput {
    if input == [b'\t'] {
        return DecodedInput {
            key: Key::Tab,
            text: vec![INDENT_UNIT; indent_size],
        };
    }

    let text = normalize(input, indent_size);
    let key = SEQUENCES
        .iter()
        .find(|(seq, _)| *seq == text.as_slice())
        .map(|&(_, key)| key)
        .unwrap_or(Key::NotDefined);
    tracing::trace!(target: "prompt.input", ?key, len = input.len(), "decode");
    DecodedInput { key, text }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lone_tab_is_a_keybinding_event() {
        let d = decode(b"\t", 2);
        assert_eq!(d.key, Key::Tab);
        assert_eq!(d.text, b"  ");
    }

    #[test]
    fn carriage_return_becomes_newline() {
        let d = decode(b"\r", 2);
        assert_eq!(d.key, Key::ControlJ);
        assert_eq!(d.text, b"\n");
    }

    #[test]
    fn embedded_tab_expands_in_payload() {
        let d = decode(b"a\tb", 4);
        assert_eq!(d.key, Key::NotDefined);
        assert_eq!(d.text, b"a    b");
    }

    #[test]
    fn arrow_sequences() {
        assert_eq!(decode(b"\x1b[A", 2).key, Key::Up);
        assert_eq!(decode(b"\x1b[B", 2).key, Key::Down);
        assert_eq!(decode(b"\x1b[1;3D", 2).key, Key::AltLeft);
        assert_eq!(decode(b"\x1b[1;5C", 2).key, Key::ControlRight);
        assert_eq!(decode(b"\x1bOA", 2).key, Key::Up);
    }

    #[test]
    fn navigation_and_function_keys() {
        assert_eq!(decode(b"\x1b[H", 2).key, Key::Home);
        assert_eq!(decode(b"\x1b[4~", 2).key, Key::End);
        assert_eq!(decode(b"\x1b[3~", 2).key, Key::Delete);
        assert_eq!(decode(b"\x1b[Z", 2).key, Key::BackTab);
        assert_eq!(decode(b"\x1bOP", 2).key, Key::F1);
        assert_eq!(decode(b"\x1b[24;2~", 2).key, Key::F22);
    }

    #[test]
    fn partial_escape_sequence_is_not_defined() {
        assert_eq!(decode(b"\x1b[", 2).key, Key::NotDefined);
        assert_eq!(decode(b"\x1b[1;2", 2).key, Key::NotDefined);
    }

    #[test]
    fn printable_text_is_not_defined() {
        let d = decode("héllo".as_bytes(), 2);
        assert_eq!(d.key, Key::NotDefined);
        assert_eq!(d.text, "héllo".as_bytes());
    }

    #[test]
    fn decoding_is_deterministic() {
        for input in [&b"\x1b[A"[..], b"\x03", b"abc", b"\x1b[99z"] {
            assert_eq!(decode(input, 2), decode(input, 2));
        }
    }
}
