//! Narrow-text surface with UTF-8 support.
//!
//! [`Utf8Text`] exposes byte-string equivalents of the classic text calls (text out, extended
//! text out, extent, extent with fit, draw in rectangle). Every call picks its strategy up front:
//!
//! - **UTF-8 path**: when the encoding policy says narrow text is UTF-8, the bytes are decoded and
//!   the wide capability is used. Results that are positions in the text (fit counts, partial
//!   extents, lengths drawn) are mapped back to byte offsets.
//! - **Legacy path**: otherwise, or when the wide call fails, the caller's bytes are forwarded
//!   unmodified to the narrow capability.
//!
//! Nothing is retried and no state is kept between calls.

use crate::{
    Utf8TextError,
    backend::{DrawFormat, DrawTextParams, NarrowText, Rect, TextOutOptions, WideText},
    decode::{DecodedText, TextLen},
    encoding::EncodingPolicy,
    extent::{MaxExtent, measure_extent, measure_extent_ex},
    measure::Extent,
};

/// Spare code units handed to the wide capability when it may rewrite the text
/// (room for an ellipsis and a terminator).
const MODIFY_PADDING: usize = 4;

/// Configuration for a [`Utf8Text`] surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Utf8TextConfig {
    /// How to choose between the UTF-8 and legacy paths.
    pub encoding: EncodingPolicy,
}

/// Byte-string text calls over a backend providing both wide and legacy capabilities.
#[derive(Debug, Clone)]
pub struct Utf8Text<B> {
    backend: B,
    config: Utf8TextConfig,
}

impl<B: WideText + NarrowText> Utf8Text<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, Utf8TextConfig::default())
    }

    pub fn with_config(backend: B, config: Utf8TextConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &Utf8TextConfig {
        &self.config
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Whether calls on this surface take the UTF-8 path.
    pub fn is_utf8(&self) -> bool {
        self.config.encoding.is_utf8()
    }

    /// Draw `text` at `(x, y)`.
    pub fn text_out(&self, x: i32, y: i32, text: &[u8], len: TextLen) -> Result<(), Utf8TextError> {
        let bytes = len.slice(text)?;
        if !self.is_utf8() {
            return self.backend.text_out_a(x, y, bytes);
        }

        let decoded = DecodedText::decode(bytes);
        match self.backend.text_out_w(x, y, decoded.wide()) {
            Ok(()) => Ok(()),
            Err(err) => {
                log::debug!("text_out: wide call failed ({err}), using legacy path");
                self.backend.text_out_a(x, y, bytes)
            }
        }
    }

    /// Draw `text` at `(x, y)` with `options`, an optional clipping/opaquing rectangle and
    /// optional per-byte cell spacing.
    ///
    /// On the UTF-8 path `dx` is re-projected onto code units: each code point gets the sum of
    /// its bytes' spacing on its first code unit, and the low half of a surrogate pair gets zero.
    pub fn ext_text_out(
        &self,
        x: i32,
        y: i32,
        options: TextOutOptions,
        rect: Option<&Rect>,
        text: &[u8],
        len: TextLen,
        dx: Option<&[i32]>,
    ) -> Result<(), Utf8TextError> {
        let bytes = len.slice(text)?;
        if let Some(dx) = dx {
            if dx.len() < bytes.len() {
                return Err(Utf8TextError::SpacingTooShort {
                    needed: bytes.len(),
                    len: dx.len(),
                });
            }
        }
        if !self.is_utf8() {
            return self.backend.ext_text_out_a(x, y, options, rect, bytes, dx);
        }

        let decoded = DecodedText::decode(bytes);
        let wide_dx = dx.map(|dx| spacing_per_unit(&decoded, dx));
        match self
            .backend
            .ext_text_out_w(x, y, options, rect, decoded.wide(), wide_dx.as_deref())
        {
            Ok(()) => Ok(()),
            Err(err) => {
                log::debug!("ext_text_out: wide call failed ({err}), using legacy path");
                self.backend.ext_text_out_a(x, y, options, rect, bytes, dx)
            }
        }
    }

    /// Measure `text` as a whole.
    pub fn text_extent(&self, text: &[u8], len: TextLen) -> Result<Extent, Utf8TextError> {
        let bytes = len.slice(text)?;
        if !self.is_utf8() {
            return self.backend.text_extent_a(bytes);
        }

        let decoded = DecodedText::decode(bytes);
        match measure_extent(&self.backend, &decoded) {
            Ok(extent) => Ok(extent),
            Err(err) => {
                log::debug!("text_extent: wide call failed ({err}), using legacy path");
                self.backend.text_extent_a(bytes)
            }
        }
    }

    /// Measure `text`, returning its extent and how many leading bytes fit in `max_extent`
    /// (negative: unbounded, zero: nothing).
    ///
    /// When `dx` is given it receives, per byte, the cumulative extent at the end of the byte's
    /// code point; entries past the text are zeroed.
    pub fn text_extent_ex(
        &self,
        text: &[u8],
        len: TextLen,
        max_extent: i32,
        dx: Option<&mut [i32]>,
    ) -> Result<(Extent, usize), Utf8TextError> {
        let bytes = len.slice(text)?;
        if !self.is_utf8() {
            return self.backend.text_extent_ex_a(bytes, max_extent, dx);
        }

        let decoded = DecodedText::decode(bytes);
        let max = MaxExtent::from_legacy(max_extent);
        match measure_extent_ex(&self.backend, &decoded, max, bytes.len()) {
            Ok(ex) => {
                if let Some(dx) = dx {
                    ex.write_partial_extents(dx);
                }
                Ok((ex.extent, ex.fit))
            }
            Err(err) => {
                log::debug!("text_extent_ex: wide call failed ({err}), using legacy path");
                self.backend.text_extent_ex_a(bytes, max_extent, dx)
            }
        }
    }

    /// Draw `text` formatted in `rect`, returning the height of the drawn text.
    pub fn draw_text(
        &self,
        text: &[u8],
        len: TextLen,
        rect: &mut Rect,
        format: DrawFormat,
    ) -> Result<i32, Utf8TextError> {
        let bytes = len.slice(text)?;
        if !self.is_utf8() {
            return self.backend.draw_text_a(bytes, rect, format);
        }

        let decoded = DecodedText::decode(bytes);
        match self.backend.draw_text_w(decoded.wide(), rect, format) {
            Ok(height) => Ok(height),
            Err(err) => {
                log::debug!("draw_text: wide call failed ({err}), using legacy path");
                self.backend.draw_text_a(bytes, rect, format)
            }
        }
    }

    /// Draw `text` formatted in `rect` with extra parameters, returning the text height.
    ///
    /// With [`DrawFormat::MODIFY_STRING`] the rewritten text is stored back into `text` as UTF-8:
    /// the longest run of whole code points that leaves room for a NUL terminator, followed by
    /// the terminator. The whole of `text` is available for this, not just the first `len`
    /// bytes. `params.length_drawn` is reported in bytes.
    pub fn draw_text_ex(
        &self,
        text: &mut [u8],
        len: TextLen,
        rect: &mut Rect,
        format: DrawFormat,
        params: Option<&mut DrawTextParams>,
    ) -> Result<i32, Utf8TextError> {
        let count = len.resolve(text)?;
        if !self.is_utf8() {
            return self.backend.draw_text_ex_a(text, count, rect, format, params);
        }

        let decoded = DecodedText::decode(&text[..count]);
        let units = decoded.wide().len();
        let mut wide = Vec::with_capacity(units + MODIFY_PADDING);
        wide.extend_from_slice(decoded.wide());
        wide.resize(units + MODIFY_PADDING, 0);

        let mut wide_params = params.as_deref().copied();
        match self
            .backend
            .draw_text_ex_w(&mut wide, units, rect, format, wide_params.as_mut())
        {
            Ok(height) => {
                if let (Some(params), Some(wide_params)) = (params, wide_params) {
                    let drawn = decoded.byte_offset_for_wide(wide_params.length_drawn as usize);
                    *params = DrawTextParams {
                        length_drawn: u32::try_from(drawn).unwrap_or(u32::MAX),
                        ..wide_params
                    };
                }
                if format.contains(DrawFormat::MODIFY_STRING) {
                    store_narrow(&wide, text);
                }
                Ok(height)
            }
            Err(err) => {
                log::debug!("draw_text_ex: wide call failed ({err}), using legacy path");
                self.backend.draw_text_ex_a(text, count, rect, format, params)
            }
        }
    }
}

/// Re-project per-byte cell spacing onto code units.
fn spacing_per_unit(decoded: &DecodedText, dx: &[i32]) -> Vec<i32> {
    let mut out = vec![0; decoded.wide().len()];
    let mut first_unit = 0usize;
    for cp in 0..decoded.codepoint_count() {
        let (Some(range), Some(last_unit)) = (
            decoded.codepoint_byte_range(cp),
            decoded.codepoint_wide_end(cp),
        ) else {
            break;
        };
        out[first_unit] = dx[range].iter().sum();
        first_unit = last_unit + 1;
    }
    out
}

/// Encode the NUL-terminated (or full) wide string `wide` into `out` as UTF-8, terminated.
///
/// Only whole code points are written. Returns the number of bytes before the terminator.
fn store_narrow(wide: &[u16], out: &mut [u8]) -> usize {
    let Some(room) = out.len().checked_sub(1) else {
        return 0;
    };
    let end = wide.iter().position(|&u| u == 0).unwrap_or(wide.len());

    let mut written = 0usize;
    for r in char::decode_utf16(wide[..end].iter().copied()) {
        let ch = r.unwrap_or(char::REPLACEMENT_CHARACTER);
        let n = ch.len_utf8();
        if written + n > room {
            break;
        }
        ch.encode_utf8(&mut out[written..written + n]);
        written += n;
    }
    out[written] = 0;
    written
}
