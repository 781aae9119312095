//! wasm-bindgen exports.
//!
//! This module exposes the UTF-8 extent mapper to JavaScript via `wasm-bindgen`. The host passes
//! a measuring callback which receives a (UTF-16) JS string and returns one cumulative extent per
//! code unit, e.g. built from `CanvasRenderingContext2D.measureText` on growing prefixes. The
//! underlying logic lives in `utf8-extent`.

use js_sys::{Array, Function, JsString};
use wasm_bindgen::{JsCast, prelude::*};

use utf8_extent::{
    DecodedText, Extent, ExtentEx, MaxExtent, TextMeasure, Utf8TextError, measure_extent_ex,
};

/// Options for [`measure_utf8`].
#[derive(Debug, Clone, Copy, Default, serde::Deserialize, tsify::Tsify)]
#[tsify(from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct MeasureOptions {
    /// Maximum width for the fit count. Omitted or negative means unbounded.
    #[serde(default)]
    #[tsify(optional)]
    pub max_extent: Option<i32>,
    /// Reported as the height of the extent.
    #[serde(default)]
    pub line_height: i32,
}

/// Measurement of a UTF-8 byte string, in bytes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, tsify::Tsify)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct MeasureOutput {
    pub width: i32,
    pub height: i32,
    /// Number of leading bytes that fit in `maxExtent`.
    pub fit: u32,
    /// Per byte, the cumulative extent at the end of its code point.
    pub partial_extents: Vec<i32>,
    /// Per byte, the advance width of its code point.
    pub advances: Vec<i32>,
}

impl From<ExtentEx> for MeasureOutput {
    fn from(ex: ExtentEx) -> Self {
        Self {
            width: ex.extent.cx,
            height: ex.extent.cy,
            fit: u32::try_from(ex.fit).unwrap_or(u32::MAX),
            partial_extents: ex.partial_extents,
            advances: ex.advances,
        }
    }
}

/// Result of [`decode_utf8`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, tsify::Tsify)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct DecodeOutput {
    pub text: String,
    /// Per byte, the ordinal of its code point.
    pub byte_to_codepoint: Vec<u32>,
    /// Per code point, the byte offset where it ends.
    pub codepoint_byte_ends: Vec<u32>,
    /// Per code point, the offset of its last UTF-16 code unit.
    pub codepoint_wide_ends: Vec<u32>,
}

impl From<&DecodedText> for DecodeOutput {
    fn from(decoded: &DecodedText) -> Self {
        let to_u32 = |v: usize| u32::try_from(v).unwrap_or(u32::MAX);
        Self {
            text: decoded.to_utf8(),
            byte_to_codepoint: (0..decoded.byte_len())
                .filter_map(|b| decoded.codepoint_for_byte(b))
                .map(to_u32)
                .collect(),
            codepoint_byte_ends: decoded
                .codepoint_byte_ends()
                .iter()
                .copied()
                .map(to_u32)
                .collect(),
            codepoint_wide_ends: decoded
                .codepoint_wide_ends()
                .iter()
                .copied()
                .map(to_u32)
                .collect(),
        }
    }
}

/// A [`TextMeasure`] backed by a JS callback.
struct JsMeasure<'a> {
    callback: &'a Function,
    line_height: i32,
}

impl TextMeasure for JsMeasure<'_> {
    fn partial_extents(&self, text: &[u16], partial: &mut [i32]) -> Result<Extent, Utf8TextError> {
        let s = JsString::from_char_code(text);
        let result = self
            .callback
            .call1(&JsValue::NULL, &s)
            .map_err(|e| Utf8TextError::Host(describe(&e)))?;

        let extents = Array::from(&result);
        if extents.length() as usize != text.len() {
            return Err(Utf8TextError::Host(format!(
                "measure returned {} extents for {} code units",
                extents.length(),
                text.len()
            )));
        }
        let values = (0..extents.length()).map(|i| extents.get(i).as_f64());
        let width = copy_extents(values, partial)?;
        Ok(Extent::new(width, self.line_height))
    }
}

/// Round host-reported cumulative extents into `partial`, returning the last one.
///
/// Extents must be numbers and must not decrease.
fn copy_extents(
    values: impl Iterator<Item = Option<f64>>,
    partial: &mut [i32],
) -> Result<i32, Utf8TextError> {
    let mut previous = 0;
    for (i, (value, slot)) in values.zip(partial.iter_mut()).enumerate() {
        let value = value
            .ok_or_else(|| Utf8TextError::Host(format!("extent {i} is not a number")))?
            .round() as i32;
        if value < previous {
            return Err(Utf8TextError::Host(format!(
                "extent {i} ({value}) is less than the previous extent ({previous})"
            )));
        }
        *slot = value;
        previous = value;
    }
    Ok(previous)
}

fn describe(err: &JsValue) -> String {
    if let Some(s) = err.as_string() {
        return s;
    }
    match err.dyn_ref::<js_sys::Error>() {
        Some(e) => String::from(e.message()),
        None => "measure callback threw".to_owned(),
    }
}

/// Measure UTF-8 `bytes` with the JS `measure` callback.
///
/// `measure(text)` must return an array of cumulative extents, one per UTF-16 code unit of
/// `text`. Results are reported per byte of the input.
#[wasm_bindgen]
pub fn measure_utf8(
    bytes: &[u8],
    measure: &Function,
    options: MeasureOptions,
) -> Result<MeasureOutput, JsValue> {
    console_error_panic_hook::set_once();

    let decoded = DecodedText::decode(bytes);
    let measurer = JsMeasure {
        callback: measure,
        line_height: options.line_height,
    };
    let max = options
        .max_extent
        .map_or(MaxExtent::Unbounded, MaxExtent::from_legacy);

    let ex = measure_extent_ex(&measurer, &decoded, max, bytes.len())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(ex.into())
}

/// Decode UTF-8 `bytes` and return the text with its byte/code point/code unit indexes.
///
/// Malformed sequences decode to U+FFFD, one byte each.
#[wasm_bindgen]
pub fn decode_utf8(bytes: &[u8]) -> DecodeOutput {
    console_error_panic_hook::set_once();

    DecodeOutput::from(&DecodedText::decode(bytes))
}
