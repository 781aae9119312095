// ── Win32 GDI backend ─────────────────────────────────────────────────────────
//
// The only module in the crate with `unsafe` code. Every `unsafe` block carries
// a `// SAFETY:` comment naming the invariant that makes the call sound.
//
// `Gdi` borrows a device context owned by the caller; it never selects objects
// into it or releases it.

#![allow(unsafe_code)]

use windows::{
    Win32::{
        Foundation::{GetLastError, RECT, SIZE},
        Globalization::{CP_UTF8, GetACP},
        Graphics::Gdi::{
            DRAW_TEXT_FORMAT, DRAWTEXTPARAMS, DrawTextA, DrawTextExA, DrawTextExW, DrawTextW,
            ETO_OPTIONS, ExtTextOutA, ExtTextOutW, GetTextExtentExPointA, GetTextExtentExPointW,
            GetTextExtentPoint32A, GetTextExtentPoint32W, HDC, TextOutA, TextOutW,
        },
    },
    core::{PCSTR, PCWSTR, PSTR, PWSTR},
};

use crate::{
    Utf8TextError,
    backend::{DrawFormat, DrawTextParams, NarrowText, Rect, TextOutOptions, WideText},
    measure::{Extent, TextMeasure},
};

/// Whether the active ANSI code page is UTF-8.
pub(crate) fn active_code_page_is_utf8() -> bool {
    // SAFETY: GetACP takes no parameters and cannot fail.
    unsafe { GetACP() == CP_UTF8 }
}

/// Text calls on a GDI device context.
#[derive(Debug, Clone, Copy)]
pub struct Gdi {
    hdc: HDC,
}

impl Gdi {
    /// Wrap `hdc`.
    ///
    /// # Safety
    ///
    /// `hdc` must be a valid device context for as long as the returned value is used.
    pub unsafe fn new(hdc: HDC) -> Self {
        Self { hdc }
    }

    pub fn hdc(&self) -> HDC {
        self.hdc
    }
}

fn last_error(function: &'static str) -> Utf8TextError {
    // SAFETY: GetLastError only reads thread-local state.
    let code = unsafe { GetLastError() };
    Utf8TextError::Measure {
        function,
        code: code.0,
    }
}

fn check(ok: bool, function: &'static str) -> Result<(), Utf8TextError> {
    if ok { Ok(()) } else { Err(last_error(function)) }
}

fn check_height(height: i32, function: &'static str) -> Result<i32, Utf8TextError> {
    if height != 0 {
        Ok(height)
    } else {
        Err(last_error(function))
    }
}

fn count_i32(len: usize, function: &'static str) -> Result<i32, Utf8TextError> {
    i32::try_from(len).map_err(|_| Utf8TextError::Measure {
        function,
        code: 0x57, // ERROR_INVALID_PARAMETER
    })
}

fn to_rect(r: &Rect) -> RECT {
    RECT {
        left: r.left,
        top: r.top,
        right: r.right,
        bottom: r.bottom,
    }
}

fn from_rect(r: &RECT) -> Rect {
    Rect::new(r.left, r.top, r.right, r.bottom)
}

fn to_params(p: &DrawTextParams) -> DRAWTEXTPARAMS {
    DRAWTEXTPARAMS {
        cbSize: std::mem::size_of::<DRAWTEXTPARAMS>() as u32,
        iTabLength: p.tab_length,
        iLeftMargin: p.left_margin,
        iRightMargin: p.right_margin,
        uiLengthDrawn: p.length_drawn,
    }
}

impl TextMeasure for Gdi {
    fn partial_extents(&self, text: &[u16], partial: &mut [i32]) -> Result<Extent, Utf8TextError> {
        let count = count_i32(text.len(), "GetTextExtentExPointW")?;
        let mut size = SIZE::default();
        // SAFETY: `text` and `partial` both hold `count` elements; `size` is a valid out pointer.
        let ok = unsafe {
            GetTextExtentExPointW(
                self.hdc,
                PCWSTR(text.as_ptr()),
                count,
                0,
                None,
                Some(partial.as_mut_ptr()),
                &mut size,
            )
        };
        check(ok.as_bool(), "GetTextExtentExPointW")?;
        Ok(Extent::new(size.cx, size.cy))
    }

    fn extent(&self, text: &[u16]) -> Result<Extent, Utf8TextError> {
        let mut size = SIZE::default();
        // SAFETY: the slice length is passed along with its pointer.
        let ok = unsafe { GetTextExtentPoint32W(self.hdc, text, &mut size) };
        check(ok.as_bool(), "GetTextExtentPoint32W")?;
        Ok(Extent::new(size.cx, size.cy))
    }
}

impl WideText for Gdi {
    fn text_out_w(&self, x: i32, y: i32, text: &[u16]) -> Result<(), Utf8TextError> {
        // SAFETY: the slice length is passed along with its pointer.
        let ok = unsafe { TextOutW(self.hdc, x, y, text) };
        check(ok.as_bool(), "TextOutW")
    }

    fn ext_text_out_w(
        &self,
        x: i32,
        y: i32,
        options: TextOutOptions,
        rect: Option<&Rect>,
        text: &[u16],
        dx: Option<&[i32]>,
    ) -> Result<(), Utf8TextError> {
        let count = count_i32(text.len(), "ExtTextOutW")? as u32;
        let rect = rect.map(to_rect);
        // SAFETY: `dx`, when present, holds one entry per code unit (built by the surface);
        // `rect` outlives the call.
        let ok = unsafe {
            ExtTextOutW(
                self.hdc,
                x,
                y,
                ETO_OPTIONS(options.0),
                rect.as_ref().map(|r| r as *const RECT),
                PCWSTR(text.as_ptr()),
                count,
                dx.map(|dx| dx.as_ptr()),
            )
        };
        check(ok.as_bool(), "ExtTextOutW")
    }

    fn draw_text_w(
        &self,
        text: &[u16],
        rect: &mut Rect,
        format: DrawFormat,
    ) -> Result<i32, Utf8TextError> {
        // DrawTextW wants a mutable buffer even when it does not modify it.
        let mut buf = text.to_vec();
        let mut r = to_rect(rect);
        // SAFETY: `buf` is a live, owned buffer; `r` is a valid RECT.
        let height = unsafe { DrawTextW(self.hdc, &mut buf, &mut r, DRAW_TEXT_FORMAT(format.0)) };
        *rect = from_rect(&r);
        check_height(height, "DrawTextW")
    }

    fn draw_text_ex_w(
        &self,
        text: &mut [u16],
        count: usize,
        rect: &mut Rect,
        format: DrawFormat,
        params: Option<&mut DrawTextParams>,
    ) -> Result<i32, Utf8TextError> {
        let count = count_i32(count, "DrawTextExW")?;
        let mut r = to_rect(rect);
        let mut native = params.as_deref().map(to_params);
        // SAFETY: `text` is writable past `count` for MODIFY_STRING; `r` and `native` are valid.
        let height = unsafe {
            DrawTextExW(
                self.hdc,
                PWSTR(text.as_mut_ptr()),
                count,
                &mut r,
                DRAW_TEXT_FORMAT(format.0),
                native.as_mut().map(|p| p as *const DRAWTEXTPARAMS),
            )
        };
        *rect = from_rect(&r);
        if let (Some(params), Some(native)) = (params, native) {
            params.length_drawn = native.uiLengthDrawn;
        }
        check_height(height, "DrawTextExW")
    }
}

impl NarrowText for Gdi {
    fn text_out_a(&self, x: i32, y: i32, text: &[u8]) -> Result<(), Utf8TextError> {
        // SAFETY: the slice length is passed along with its pointer.
        let ok = unsafe { TextOutA(self.hdc, x, y, text) };
        check(ok.as_bool(), "TextOutA")
    }

    fn ext_text_out_a(
        &self,
        x: i32,
        y: i32,
        options: TextOutOptions,
        rect: Option<&Rect>,
        text: &[u8],
        dx: Option<&[i32]>,
    ) -> Result<(), Utf8TextError> {
        let count = count_i32(text.len(), "ExtTextOutA")? as u32;
        let rect = rect.map(to_rect);
        // SAFETY: the surface checked that `dx` holds at least one entry per byte.
        let ok = unsafe {
            ExtTextOutA(
                self.hdc,
                x,
                y,
                ETO_OPTIONS(options.0),
                rect.as_ref().map(|r| r as *const RECT),
                PCSTR(text.as_ptr()),
                count,
                dx.map(|dx| dx.as_ptr()),
            )
        };
        check(ok.as_bool(), "ExtTextOutA")
    }

    fn text_extent_a(&self, text: &[u8]) -> Result<Extent, Utf8TextError> {
        let mut size = SIZE::default();
        // SAFETY: the slice length is passed along with its pointer.
        let ok = unsafe { GetTextExtentPoint32A(self.hdc, text, &mut size) };
        check(ok.as_bool(), "GetTextExtentPoint32A")?;
        Ok(Extent::new(size.cx, size.cy))
    }

    fn text_extent_ex_a(
        &self,
        text: &[u8],
        max_extent: i32,
        dx: Option<&mut [i32]>,
    ) -> Result<(Extent, usize), Utf8TextError> {
        let count = count_i32(text.len(), "GetTextExtentExPointA")?;
        // The API writes one entry per byte, so measure into a buffer of exactly that size.
        let mut scratch = vec![0i32; if dx.is_some() { text.len() } else { 0 }];
        let dx_ptr = dx.is_some().then(|| scratch.as_mut_ptr());
        let mut fit = 0i32;
        let mut size = SIZE::default();
        // SAFETY: `dx_ptr`, when present, points at `count` writable entries; the other out
        // pointers are valid locals.
        let ok = unsafe {
            GetTextExtentExPointA(
                self.hdc,
                PCSTR(text.as_ptr()),
                count,
                max_extent.max(0),
                (max_extent >= 0).then_some(&mut fit as *mut i32),
                dx_ptr,
                &mut size,
            )
        };
        check(ok.as_bool(), "GetTextExtentExPointA")?;
        if let Some(dx) = dx {
            let n = dx.len().min(scratch.len());
            dx[..n].copy_from_slice(&scratch[..n]);
            dx[n..].fill(0);
        }
        let fit = if max_extent < 0 {
            text.len()
        } else {
            usize::try_from(fit).unwrap_or(0)
        };
        Ok((Extent::new(size.cx, size.cy), fit))
    }

    fn draw_text_a(
        &self,
        text: &[u8],
        rect: &mut Rect,
        format: DrawFormat,
    ) -> Result<i32, Utf8TextError> {
        let mut buf = text.to_vec();
        let mut r = to_rect(rect);
        // SAFETY: `buf` is a live, owned buffer; `r` is a valid RECT.
        let height = unsafe { DrawTextA(self.hdc, &mut buf, &mut r, DRAW_TEXT_FORMAT(format.0)) };
        *rect = from_rect(&r);
        check_height(height, "DrawTextA")
    }

    fn draw_text_ex_a(
        &self,
        text: &mut [u8],
        count: usize,
        rect: &mut Rect,
        format: DrawFormat,
        params: Option<&mut DrawTextParams>,
    ) -> Result<i32, Utf8TextError> {
        let count = count_i32(count, "DrawTextExA")?;
        let mut r = to_rect(rect);
        let mut native = params.as_deref().map(to_params);
        // SAFETY: `text` holds at least `count` bytes; `r` and `native` are valid.
        let height = unsafe {
            DrawTextExA(
                self.hdc,
                PSTR(text.as_mut_ptr()),
                count,
                &mut r,
                DRAW_TEXT_FORMAT(format.0),
                native.as_mut().map(|p| p as *const DRAWTEXTPARAMS),
            )
        };
        *rect = from_rect(&r);
        if let (Some(params), Some(native)) = (params, native) {
            params.length_drawn = native.uiLengthDrawn;
        }
        check_height(height, "DrawTextExA")
    }
}
