//! UTF-8 decoding with byte/code point/UTF-16 indexes.
//!
//! [`DecodedText`] turns a byte buffer declared as UTF-8 into its UTF-16 encoding and, in the
//! same forward pass, records three parallel indexes:
//!
//! - byte offset -> ordinal of the code point the byte belongs to,
//! - code point ordinal -> exclusive byte end,
//! - code point ordinal -> offset of its **last** UTF-16 code unit.
//!
//! These are what the extent mapper needs to re-project per-code-unit measurements onto bytes.
//!
//! Decoding never fails. A leading byte consumes its full 2/3/4-byte sequence only if every
//! continuation byte is present and well-formed and the value lies in the range valid for that
//! length (no overlong forms, no surrogates, nothing above U+10FFFF). Anything else consumes a
//! single byte and yields U+FFFD, and decoding resumes at the next byte.

use std::ops::Range;

use crate::Utf8TextError;

/// How many bytes of a caller buffer make up the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextLen {
    /// Exactly this many bytes. Must not exceed the buffer length.
    Explicit(usize),
    /// Up to (not including) the first NUL byte, or the whole buffer if there is none.
    Terminated,
}

impl TextLen {
    /// Interpret a legacy signed count: negative means "up to the terminator".
    pub fn from_legacy(count: i32) -> Self {
        match usize::try_from(count) {
            Ok(n) => Self::Explicit(n),
            Err(_) => Self::Terminated,
        }
    }

    /// Resolve the text length against `buf`.
    pub fn resolve(self, buf: &[u8]) -> Result<usize, Utf8TextError> {
        match self {
            Self::Explicit(count) if count > buf.len() => Err(Utf8TextError::CountOutOfRange {
                count,
                len: buf.len(),
            }),
            Self::Explicit(count) => Ok(count),
            Self::Terminated => Ok(buf.iter().position(|&b| b == 0).unwrap_or(buf.len())),
        }
    }

    /// Return the text slice of `buf`.
    pub fn slice(self, buf: &[u8]) -> Result<&[u8], Utf8TextError> {
        let len = self.resolve(buf)?;
        Ok(&buf[..len])
    }
}

/// A byte buffer decoded as UTF-8, together with its offset indexes.
///
/// The buffers can be reused across calls with [`DecodedText::decode_into`], which keeps their
/// allocations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedText {
    /// UTF-16 encoding of the decoded code points.
    wide: Vec<u16>,
    /// For each code point, the exclusive byte offset where it ends.
    codepoint_byte_ends: Vec<usize>,
    /// For each code point, the offset of its last UTF-16 code unit.
    codepoint_wide_ends: Vec<usize>,
    /// For each input byte, the ordinal of its code point.
    byte_to_codepoint: Vec<usize>,
}

impl DecodedText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes` into a fresh buffer.
    pub fn decode(bytes: &[u8]) -> Self {
        let mut out = Self::new();
        out.decode_into(bytes);
        out
    }

    /// Decode `bytes`, replacing the current contents.
    pub fn decode_into(&mut self, bytes: &[u8]) {
        self.wide.clear();
        self.codepoint_byte_ends.clear();
        self.codepoint_wide_ends.clear();
        self.byte_to_codepoint.clear();

        // Worst case is one code point (and one code unit) per byte.
        self.wide.reserve(bytes.len());
        self.codepoint_byte_ends.reserve(bytes.len());
        self.codepoint_wide_ends.reserve(bytes.len());
        self.byte_to_codepoint.reserve(bytes.len());

        let mut index = 0usize;
        let mut units = [0u16; 2];
        while index < bytes.len() {
            let (ch, len) = decode_one(&bytes[index..]);
            let ordinal = self.codepoint_byte_ends.len();

            self.byte_to_codepoint.extend(std::iter::repeat_n(ordinal, len));
            index += len;
            self.codepoint_byte_ends.push(index);

            self.wide.extend_from_slice(ch.encode_utf16(&mut units));
            self.codepoint_wide_ends.push(self.wide.len() - 1);
        }
    }

    /// UTF-16 encoding of the text.
    pub fn wide(&self) -> &[u16] {
        &self.wide
    }

    /// Number of input bytes.
    pub fn byte_len(&self) -> usize {
        self.byte_to_codepoint.len()
    }

    /// Number of decoded code points.
    pub fn codepoint_count(&self) -> usize {
        self.codepoint_byte_ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wide.is_empty()
    }

    /// Ordinal of the code point containing `byte`, or `None` past the end.
    pub fn codepoint_for_byte(&self, byte: usize) -> Option<usize> {
        self.byte_to_codepoint.get(byte).copied()
    }

    /// Offset of the last UTF-16 code unit of code point `ordinal`.
    pub fn codepoint_wide_end(&self, ordinal: usize) -> Option<usize> {
        self.codepoint_wide_ends.get(ordinal).copied()
    }

    /// Exclusive byte end of code point `ordinal`.
    pub fn codepoint_byte_end(&self, ordinal: usize) -> Option<usize> {
        self.codepoint_byte_ends.get(ordinal).copied()
    }

    /// Byte range covered by code point `ordinal`.
    pub fn codepoint_byte_range(&self, ordinal: usize) -> Option<Range<usize>> {
        let end = self.codepoint_byte_end(ordinal)?;
        let start = match ordinal {
            0 => 0,
            _ => self.codepoint_byte_ends[ordinal - 1],
        };
        Some(start..end)
    }

    /// Offsets of the last code unit of every code point, in order.
    pub fn codepoint_wide_ends(&self) -> &[usize] {
        &self.codepoint_wide_ends
    }

    /// Exclusive byte ends of every code point, in order.
    pub fn codepoint_byte_ends(&self) -> &[usize] {
        &self.codepoint_byte_ends
    }

    /// Map a count of leading UTF-16 code units back to a byte offset.
    ///
    /// Only whole code points are counted: a count that ends inside a surrogate pair clamps to
    /// the start of that code point. Counts past the end clamp to [`DecodedText::byte_len`].
    pub fn byte_offset_for_wide(&self, units: usize) -> usize {
        // Code points whose last unit lies before `units` are complete.
        let complete = self.codepoint_wide_ends.partition_point(|&end| end < units);
        match complete {
            0 => 0,
            n => self.codepoint_byte_ends[n - 1],
        }
    }

    /// Iterate the decoded code points.
    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        char::decode_utf16(self.wide.iter().copied())
            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    /// Re-encode the decoded text as UTF-8.
    ///
    /// For well-formed input this reproduces the original bytes.
    pub fn to_utf8(&self) -> String {
        self.chars().collect()
    }
}

/// Decode the code point at the start of `bytes` (which must be non-empty).
///
/// Returns the code point and the number of bytes it consumed.
fn decode_one(bytes: &[u8]) -> (char, usize) {
    const INVALID: (char, usize) = (char::REPLACEMENT_CHARACTER, 1);

    let lead = bytes[0];
    let (len, initial, min) = match lead {
        0x00..=0x7F => return (char::from(lead), 1),
        _ if lead & 0xE0 == 0xC0 => (2, u32::from(lead & 0x1F), 0x80),
        _ if lead & 0xF0 == 0xE0 => (3, u32::from(lead & 0x0F), 0x800),
        _ if lead & 0xF8 == 0xF0 => (4, u32::from(lead & 0x07), 0x1_0000),
        _ => return INVALID,
    };

    let Some(tail) = bytes.get(1..len) else {
        return INVALID;
    };

    let mut code = initial;
    for &b in tail {
        if b & 0xC0 != 0x80 {
            return INVALID;
        }
        code = (code << 6) | u32::from(b & 0x3F);
    }

    if code < min {
        return INVALID;
    }
    // Rejects surrogates and values above U+10FFFF.
    match char::from_u32(code) {
        Some(ch) => (ch, len),
        None => INVALID,
    }
}
