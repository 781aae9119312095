//! Extent and fit mapping from UTF-16 measurements back onto UTF-8 bytes.
//!
//! The measurer only ever sees the decoded UTF-16 string. Its per-code-unit cumulative extents
//! are re-projected with the indexes in [`DecodedText`]:
//!
//! - each code point takes the cumulative extent at its **last** code unit,
//! - each byte takes the value of the code point it belongs to.
//!
//! Fit is counted in whole code points. A code point fits when the cumulative extent at its last
//! code unit is within the maximum, so a surrogate pair whose first half would still fit but
//! whose second half would not is excluded as a whole, and a multi-byte sequence is never split.

use crate::{
    Utf8TextError,
    decode::DecodedText,
    measure::{Extent, TextMeasure},
};

/// Maximum width for a fit query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxExtent {
    /// Everything fits.
    Unbounded,
    /// Fit within this many device units. Zero fits nothing.
    Pixels(u32),
}

impl MaxExtent {
    /// Interpret a legacy signed maximum: negative means unbounded.
    pub fn from_legacy(max_extent: i32) -> Self {
        match u32::try_from(max_extent) {
            Ok(px) => Self::Pixels(px),
            Err(_) => Self::Unbounded,
        }
    }
}

/// Result of a measure-and-fit query, projected onto bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtentEx {
    /// Extent of the whole string.
    pub extent: Extent,
    /// Number of leading bytes that fit.
    pub fit: usize,
    /// For each byte, the cumulative extent at the end of its code point.
    pub partial_extents: Vec<i32>,
    /// For each byte, the advance width of its code point.
    pub advances: Vec<i32>,
}

impl ExtentEx {
    /// Copy the per-byte partial extents into `dx`, zero-filling entries past the text.
    pub fn write_partial_extents(&self, dx: &mut [i32]) {
        let n = dx.len().min(self.partial_extents.len());
        dx[..n].copy_from_slice(&self.partial_extents[..n]);
        dx[n..].fill(0);
    }
}

/// Measure the whole decoded string.
///
/// Empty text is still measured, so the result carries the measurer's line height.
pub fn measure_extent<M: TextMeasure + ?Sized>(
    measure: &M,
    decoded: &DecodedText,
) -> Result<Extent, Utf8TextError> {
    measure.extent(decoded.wide())
}

/// Measure the decoded string, compute how many bytes fit in `max`, and project per-code-unit
/// extents onto bytes.
///
/// `limit` is the caller's byte-count limit; the fit never exceeds it.
pub fn measure_extent_ex<M: TextMeasure + ?Sized>(
    measure: &M,
    decoded: &DecodedText,
    max: MaxExtent,
    limit: usize,
) -> Result<ExtentEx, Utf8TextError> {
    if decoded.is_empty() {
        return Ok(ExtentEx {
            partial_extents: vec![0; decoded.byte_len()],
            advances: vec![0; decoded.byte_len()],
            ..ExtentEx::default()
        });
    }

    let mut wide_partial = vec![0; decoded.wide().len()];
    let extent = measure.partial_extents(decoded.wide(), &mut wide_partial)?;

    // Cumulative extent at the end of each code point.
    let codepoint_ends: Vec<i32> = decoded
        .codepoint_wide_ends()
        .iter()
        .map(|&unit| wide_partial[unit])
        .collect();

    let fit = fit_bytes(decoded, &codepoint_ends, max).min(limit);

    let mut partial_extents = Vec::with_capacity(decoded.byte_len());
    let mut advances = Vec::with_capacity(decoded.byte_len());
    for byte in 0..decoded.byte_len() {
        match decoded.codepoint_for_byte(byte) {
            Some(cp) => {
                let end = codepoint_ends[cp];
                let start = match cp {
                    0 => 0,
                    _ => codepoint_ends[cp - 1],
                };
                partial_extents.push(end);
                advances.push(end.saturating_sub(start));
            }
            None => {
                partial_extents.push(0);
                advances.push(0);
            }
        }
    }

    Ok(ExtentEx {
        extent,
        fit,
        partial_extents,
        advances,
    })
}

/// Number of leading bytes whose code points fit within `max`.
fn fit_bytes(decoded: &DecodedText, codepoint_ends: &[i32], max: MaxExtent) -> usize {
    let max = match max {
        MaxExtent::Unbounded => return decoded.byte_len(),
        MaxExtent::Pixels(0) => return 0,
        MaxExtent::Pixels(px) => i64::from(px),
    };

    // Extents are cumulative, so the fitting code points form a prefix.
    let fitting = codepoint_ends
        .iter()
        .take_while(|&&end| i64::from(end) <= max)
        .count();
    match fitting {
        0 => 0,
        n => decoded.codepoint_byte_ends()[n - 1],
    }
}
