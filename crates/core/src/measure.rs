//! The wide-character text measurement capability.
//!
//! Measurement follows the partial-extent convention of the classic GDI call: for a UTF-16
//! string of `n` code units the measurer fills `n` **cumulative** extents, where entry `i` is the
//! width of the first `i + 1` code units. The values are therefore non-decreasing, and the last
//! one is normally the width of the whole string.

use crate::Utf8TextError;

/// Width and height of a piece of text, in device units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Extent {
    pub cx: i32,
    pub cy: i32,
}

impl Extent {
    pub const ZERO: Self = Self { cx: 0, cy: 0 };

    pub fn new(cx: i32, cy: i32) -> Self {
        Self { cx, cy }
    }
}

/// Something that can measure UTF-16 text.
pub trait TextMeasure {
    /// Measure `text`, writing one cumulative extent per code unit into `partial`.
    ///
    /// `partial` has exactly `text.len()` entries.
    fn partial_extents(&self, text: &[u16], partial: &mut [i32]) -> Result<Extent, Utf8TextError>;

    /// Measure `text` as a whole.
    fn extent(&self, text: &[u16]) -> Result<Extent, Utf8TextError> {
        let mut partial = vec![0; text.len()];
        self.partial_extents(text, &mut partial)
    }
}

impl<M: TextMeasure + ?Sized> TextMeasure for &M {
    fn partial_extents(&self, text: &[u16], partial: &mut [i32]) -> Result<Extent, Utf8TextError> {
        (**self).partial_extents(text, partial)
    }

    fn extent(&self, text: &[u16]) -> Result<Extent, Utf8TextError> {
        (**self).extent(text)
    }
}

/// A measurer that gives every code point the same advance.
///
/// Wide code points (CJK ideographs, Hangul, fullwidth forms and anything outside the BMP) take
/// `wide_advance` instead. The advance of a surrogate pair is attributed to its low half, so the
/// high half's cumulative extent equals the extent before the pair.
///
/// Useful as a stand-in where no real font is available, e.g. in terminals and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedAdvance {
    pub advance: i32,
    pub wide_advance: i32,
    pub height: i32,
}

impl FixedAdvance {
    pub fn new(advance: i32, height: i32) -> Self {
        Self {
            advance,
            wide_advance: advance * 2,
            height,
        }
    }

    fn advance_of(&self, ch: char) -> i32 {
        if is_wide(ch) {
            self.wide_advance
        } else {
            self.advance
        }
    }
}

impl Default for FixedAdvance {
    fn default() -> Self {
        Self::new(8, 16)
    }
}

impl TextMeasure for FixedAdvance {
    fn partial_extents(&self, text: &[u16], partial: &mut [i32]) -> Result<Extent, Utf8TextError> {
        let mut x = 0i32;
        let mut unit = 0usize;
        for r in char::decode_utf16(text.iter().copied()) {
            let (ch, len) = match r {
                Ok(ch) => (ch, ch.len_utf16()),
                Err(_) => (char::REPLACEMENT_CHARACTER, 1),
            };
            if len == 2 {
                partial[unit] = x;
            }
            x = x.saturating_add(self.advance_of(ch));
            partial[unit + len - 1] = x;
            unit += len;
        }
        Ok(Extent::new(x, self.height))
    }
}

/// Rough East Asian Wide/Fullwidth classification, plus everything outside the BMP.
fn is_wide(ch: char) -> bool {
    matches!(
        u32::from(ch),
        0x1100..=0x115F
            | 0x2E80..=0x303E
            | 0x3041..=0x33FF
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xA000..=0xA4CF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
            | 0x1_0000..
    )
}
