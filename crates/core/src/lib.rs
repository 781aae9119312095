//! UTF-8 aware narrow-text measurement and drawing.
//!
//! This crate lets callers that hold byte strings declared as UTF-8 measure and draw them through
//! a wide-character (UTF-16) text capability, and re-projects the wide results (extents, fit
//! counts, partial extents) back onto byte offsets. When the process text encoding is not UTF-8
//! the bytes are forwarded untouched to the legacy narrow-text capability.
//!
//! Entry points:
//!
//! - [`surface`] contains [`Utf8Text`], the narrow-text surface with UTF-8/legacy strategy
//!   selection per call.
//! - [`extent`] contains the pure extent/fit mapper.
//!
//! Internals:
//!
//! - [`decode`] decodes bytes into UTF-16 plus the byte/code point/code unit indexes.
//! - [`measure`] defines the measurement capability and a fixed-advance measurer.
//! - [`backend`] defines the wide and legacy text capabilities the surface delegates to.
//! - [`encoding`] holds the process-wide "active encoding is UTF-8" flag.
//! - `win32` (Windows only) implements the capabilities on top of GDI.

pub mod backend;
pub mod decode;
pub mod encoding;
pub mod extent;
pub mod measure;
pub mod surface;
#[cfg(windows)]
pub mod win32;

pub use backend::{DrawFormat, DrawTextParams, NarrowText, Rect, TextOutOptions, WideText};
pub use decode::{DecodedText, TextLen};
pub use encoding::{EncodingPolicy, utf8_active};
pub use extent::{ExtentEx, MaxExtent, measure_extent, measure_extent_ex};
pub use measure::{Extent, FixedAdvance, TextMeasure};
pub use surface::{Utf8Text, Utf8TextConfig};

/// Errors that can occur while measuring or drawing text.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Utf8TextError {
    #[error("{function} failed (error {code:#010x})")]
    Measure { function: &'static str, code: u32 },

    #[error("text host error: {0}")]
    Host(String),

    #[error("count {count} exceeds buffer length {len}")]
    CountOutOfRange { count: usize, len: usize },

    #[error("spacing array has {len} entries, text needs {needed}")]
    SpacingTooShort { needed: usize, len: usize },
}
