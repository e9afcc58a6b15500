//! Nominal numeric domains for prompt text arithmetic.
//!
//! Cursor and layout math mixes three units that are all "just numbers" but
//! must never cross without an explicit conversion:
//!
//! * [`ByteIdx`] — offset into the UTF-8 byte array.
//! * [`RuneIdx`] — ordinal count of code points.
//! * [`Width`] — terminal cells occupied (East-Asian wide = 2, combining and
//!   control = 0).
//!
//! Each is a distinct newtype so that, e.g., adding a byte offset to a rune
//! count fails to compile instead of corrupting the cursor.

use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use unicode_width::UnicodeWidthChar;

pub mod position;

pub use position::{
    Position, WrapCursor, WrapStep, index_of_first_token_on_line, position_at_end_of_string,
};

macro_rules! index_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(pub usize);

        impl $name {
            pub const ZERO: Self = Self(0);

            pub fn min(self, rhs: Self) -> Self {
                Self(self.0.min(rhs.0))
            }
        }

        impl Add for $name {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                Self(self.0 + rhs.0)
            }
        }

        impl AddAssign for $name {
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        // Subtraction saturates at zero: every caller is computing a clamped
        // cursor distance, never a signed delta.
        impl Sub for $name {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                Self(self.0.saturating_sub(rhs.0))
            }
        }

        impl SubAssign for $name {
            fn sub_assign(&mut self, rhs: Self) {
                self.0 = self.0.saturating_sub(rhs.0);
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self(v)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

index_newtype!(
    /// Offset into a UTF-8 byte array.
    ByteIdx
);
index_newtype!(
    /// Ordinal count of Unicode code points.
    RuneIdx
);
index_newtype!(
    /// Number of terminal cells.
    Width
);

/// Number of runes in `s`.
pub fn rune_count(s: &str) -> RuneIdx {
    RuneIdx(s.chars().count())
}

/// Byte offset of the rune at ordinal `idx`, clamped to `s.len()`.
pub fn rune_to_byte(s: &str, idx: RuneIdx) -> ByteIdx {
    ByteIdx(
        s.char_indices()
            .nth(idx.0)
            .map(|(b, _)| b)
            .unwrap_or(s.len()),
    )
}

/// Slice `s` by rune ordinals, clamped on both ends.
pub fn rune_slice(s: &str, from: RuneIdx, to: RuneIdx) -> &str {
    if to <= from {
        return "";
    }
    let start = rune_to_byte(s, from);
    let end = rune_to_byte(s, to);
    &s[start.0..end.0]
}

/// Terminal cells occupied by one rune. Control characters (including `\n`
/// and `\r`) and combining marks occupy no cells.
pub fn char_width(c: char) -> Width {
    if c.is_control() {
        return Width(0);
    }
    Width(UnicodeWidthChar::width(c).unwrap_or(0))
}

/// Terminal cells occupied by `s` when printed on one unbounded row.
pub fn str_width(s: &str) -> Width {
    s.chars().fold(Width(0), |acc, c| acc + char_width(c))
}

/// Rune ordinal of the first rune of `s` not contained in `set`.
pub fn index_not_any(s: &str, set: &[char]) -> Option<RuneIdx> {
    s.chars().position(|c| !set.contains(&c)).map(RuneIdx)
}

/// Rune ordinal of the last rune of `s` not contained in `set`.
pub fn last_index_not_any(s: &str, set: &[char]) -> Option<RuneIdx> {
    let count = s.chars().count();
    s.chars()
        .rev()
        .position(|c| !set.contains(&c))
        .map(|rev| RuneIdx(count - 1 - rev))
}

/// Rune ordinal of the last rune of `s` contained in `set`.
pub fn last_index_any(s: &str, set: &[char]) -> Option<RuneIdx> {
    let count = s.chars().count();
    s.chars()
        .rev()
        .position(|c| set.contains(&c))
        .map(|rev| RuneIdx(count - 1 - rev))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths() {
        assert_eq!(str_width("foo"), Width(3));
        assert_eq!(str_width("日本語"), Width(6));
        assert_eq!(str_width("a\nb"), Width(2));
        assert_eq!(char_width('\t'), Width(0));
        assert_eq!(char_width('e'), Width(1));
        assert_eq!(char_width('\u{0301}'), Width(0));
    }

    #[test]
    fn rune_byte_conversions() {
        let s = "a日b";
        assert_eq!(rune_count(s), RuneIdx(3));
        assert_eq!(rune_to_byte(s, RuneIdx(0)), ByteIdx(0));
        assert_eq!(rune_to_byte(s, RuneIdx(1)), ByteIdx(1));
        assert_eq!(rune_to_byte(s, RuneIdx(2)), ByteIdx(4));
        assert_eq!(rune_to_byte(s, RuneIdx(99)), ByteIdx(5));
    }

    #[test]
    fn rune_slice_clamps() {
        let s = "hello";
        assert_eq!(rune_slice(s, RuneIdx(1), RuneIdx(3)), "el");
        assert_eq!(rune_slice(s, RuneIdx(3), RuneIdx(1)), "");
        assert_eq!(rune_slice(s, RuneIdx(2), RuneIdx(50)), "llo");
    }

    #[test]
    fn set_searches() {
        assert_eq!(index_not_any("golang", &['g', 'l', 'o']), Some(RuneIdx(3)));
        assert_eq!(index_not_any("golang", &['g', 'l']), Some(RuneIdx(1)));
        assert_eq!(index_not_any("golang", &['g', 'o', 'l', 'a', 'n']), None);
        assert_eq!(
            last_index_not_any("golang", &['a', 'g', 'n']),
            Some(RuneIdx(2))
        );
        assert_eq!(
            last_index_not_any("golang", &['a', 'n']),
            Some(RuneIdx(5))
        );
        assert_eq!(last_index_any("hello world", &[' ']), Some(RuneIdx(5)));
        assert_eq!(last_index_any("hello", &[' ']), None);
    }

    #[test]
    fn saturating_index_math() {
        assert_eq!(RuneIdx(1) - RuneIdx(3), RuneIdx(0));
        let mut w = Width(2);
        w -= Width(5);
        assert_eq!(w, Width(0));
    }
}
