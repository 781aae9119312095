//! Text capabilities the narrow surface delegates to.
//!
//! [`WideText`] is the UTF-16 capability (the "W" family of the classic text APIs) and
//! [`NarrowText`] the legacy byte capability (the "A" family), which interprets bytes in the
//! process's active code page. Both take `&self`: a backend is a thin handle onto a device
//! context or similar and holds no state of its own between calls.

use crate::{
    Utf8TextError,
    measure::{Extent, TextMeasure},
};

/// A rectangle in device units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Options for [`WideText::ext_text_out_w`] and its narrow counterpart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextOutOptions(pub u32);

impl TextOutOptions {
    pub const OPAQUE: Self = Self(0x0002);
    pub const CLIPPED: Self = Self(0x0004);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for TextOutOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Formatting flags for rectangle drawing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DrawFormat(pub u32);

impl DrawFormat {
    pub const LEFT: Self = Self(0x0000);
    pub const CENTER: Self = Self(0x0001);
    pub const RIGHT: Self = Self(0x0002);
    pub const VCENTER: Self = Self(0x0004);
    pub const SINGLELINE: Self = Self(0x0020);
    pub const NOPREFIX: Self = Self(0x0800);
    pub const CALCRECT: Self = Self(0x0400);
    pub const PATH_ELLIPSIS: Self = Self(0x4000);
    pub const END_ELLIPSIS: Self = Self(0x8000);
    /// The call may rewrite the text buffer (e.g. to insert an ellipsis).
    pub const MODIFY_STRING: Self = Self(0x1_0000);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for DrawFormat {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Extra parameters for rectangle drawing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DrawTextParams {
    pub tab_length: i32,
    pub left_margin: i32,
    pub right_margin: i32,
    /// Set by the call: how much of the text was processed.
    ///
    /// Backends report this in their own units (code units for [`WideText`], bytes for
    /// [`NarrowText`]); the narrow surface always hands bytes back to its caller.
    pub length_drawn: u32,
}

/// UTF-16 text capability.
pub trait WideText: TextMeasure {
    fn text_out_w(&self, x: i32, y: i32, text: &[u16]) -> Result<(), Utf8TextError>;

    fn ext_text_out_w(
        &self,
        x: i32,
        y: i32,
        options: TextOutOptions,
        rect: Option<&Rect>,
        text: &[u16],
        dx: Option<&[i32]>,
    ) -> Result<(), Utf8TextError>;

    /// Draw `text` in `rect`, returning the height of the drawn text.
    fn draw_text_w(
        &self,
        text: &[u16],
        rect: &mut Rect,
        format: DrawFormat,
    ) -> Result<i32, Utf8TextError>;

    /// Draw the first `count` units of `text` in `rect`, returning the text height.
    ///
    /// With [`DrawFormat::MODIFY_STRING`] the backend may rewrite `text`, using the spare units
    /// past `count`, and terminates the result with a NUL unit if there is room.
    fn draw_text_ex_w(
        &self,
        text: &mut [u16],
        count: usize,
        rect: &mut Rect,
        format: DrawFormat,
        params: Option<&mut DrawTextParams>,
    ) -> Result<i32, Utf8TextError>;
}

/// Legacy narrow text capability.
pub trait NarrowText {
    fn text_out_a(&self, x: i32, y: i32, text: &[u8]) -> Result<(), Utf8TextError>;

    fn ext_text_out_a(
        &self,
        x: i32,
        y: i32,
        options: TextOutOptions,
        rect: Option<&Rect>,
        text: &[u8],
        dx: Option<&[i32]>,
    ) -> Result<(), Utf8TextError>;

    fn text_extent_a(&self, text: &[u8]) -> Result<Extent, Utf8TextError>;

    /// Measure `text`, returning the extent and the number of bytes fitting `max_extent`
    /// (negative: everything), and writing cumulative extents per byte into `dx` when given.
    fn text_extent_ex_a(
        &self,
        text: &[u8],
        max_extent: i32,
        dx: Option<&mut [i32]>,
    ) -> Result<(Extent, usize), Utf8TextError>;

    fn draw_text_a(
        &self,
        text: &[u8],
        rect: &mut Rect,
        format: DrawFormat,
    ) -> Result<i32, Utf8TextError>;

    fn draw_text_ex_a(
        &self,
        text: &mut [u8],
        count: usize,
        rect: &mut Rect,
        format: DrawFormat,
        params: Option<&mut DrawTextParams>,
    ) -> Result<i32, Utf8TextError>;
}
