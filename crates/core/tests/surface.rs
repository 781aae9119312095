use std::cell::RefCell;

use utf8_extent::{
    DrawFormat, DrawTextParams, EncodingPolicy, Extent, FixedAdvance, NarrowText, Rect,
    TextLen, TextMeasure, TextOutOptions, Utf8Text, Utf8TextConfig, Utf8TextError, WideText,
};

const HEIGHT: i32 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    MeasureW(Vec<u16>),
    TextOutW(Vec<u16>),
    ExtTextOutW(Vec<u16>, Option<Vec<i32>>),
    DrawW(Vec<u16>),
    DrawExW(Vec<u16>),
    TextOutA(Vec<u8>),
    ExtTextOutA(Vec<u8>, Option<Vec<i32>>),
    ExtentA(Vec<u8>),
    ExtentExA(Vec<u8>, i32),
    DrawA(Vec<u8>),
    DrawExA(Vec<u8>),
}

/// Records every call. The wide side measures with a fixed advance of 10 (20 for wide code
/// points); the legacy side treats every byte as one 10-unit character.
#[derive(Default)]
struct Recorder {
    calls: RefCell<Vec<Call>>,
    fail_wide: bool,
}

impl Recorder {
    fn failing_wide() -> Self {
        Self {
            fail_wide: true,
            ..Self::default()
        }
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn wide_result(&self) -> Result<(), Utf8TextError> {
        if self.fail_wide {
            Err(Utf8TextError::Measure {
                function: "wide",
                code: 1,
            })
        } else {
            Ok(())
        }
    }
}

impl TextMeasure for Recorder {
    fn partial_extents(&self, text: &[u16], partial: &mut [i32]) -> Result<Extent, Utf8TextError> {
        self.record(Call::MeasureW(text.to_vec()));
        self.wide_result()?;
        FixedAdvance::new(10, HEIGHT).partial_extents(text, partial)
    }
}

impl WideText for Recorder {
    fn text_out_w(&self, _: i32, _: i32, text: &[u16]) -> Result<(), Utf8TextError> {
        self.record(Call::TextOutW(text.to_vec()));
        self.wide_result()
    }

    fn ext_text_out_w(
        &self,
        _: i32,
        _: i32,
        _: TextOutOptions,
        _: Option<&Rect>,
        text: &[u16],
        dx: Option<&[i32]>,
    ) -> Result<(), Utf8TextError> {
        self.record(Call::ExtTextOutW(text.to_vec(), dx.map(<[i32]>::to_vec)));
        self.wide_result()
    }

    fn draw_text_w(
        &self,
        text: &[u16],
        _: &mut Rect,
        _: DrawFormat,
    ) -> Result<i32, Utf8TextError> {
        self.record(Call::DrawW(text.to_vec()));
        self.wide_result()?;
        Ok(HEIGHT)
    }

    fn draw_text_ex_w(
        &self,
        text: &mut [u16],
        count: usize,
        _: &mut Rect,
        format: DrawFormat,
        params: Option<&mut DrawTextParams>,
    ) -> Result<i32, Utf8TextError> {
        self.record(Call::DrawExW(text[..count].to_vec()));
        self.wide_result()?;
        if format.contains(DrawFormat::MODIFY_STRING) {
            // Keep two code units and append an ellipsis.
            let mut modified: Vec<u16> = text[..count.min(2)].to_vec();
            modified.extend("...".encode_utf16());
            modified.push(0);
            text[..modified.len()].copy_from_slice(&modified);
        }
        if let Some(params) = params {
            params.length_drawn = count as u32;
        }
        Ok(HEIGHT)
    }
}

impl NarrowText for Recorder {
    fn text_out_a(&self, _: i32, _: i32, text: &[u8]) -> Result<(), Utf8TextError> {
        self.record(Call::TextOutA(text.to_vec()));
        Ok(())
    }

    fn ext_text_out_a(
        &self,
        _: i32,
        _: i32,
        _: TextOutOptions,
        _: Option<&Rect>,
        text: &[u8],
        dx: Option<&[i32]>,
    ) -> Result<(), Utf8TextError> {
        self.record(Call::ExtTextOutA(text.to_vec(), dx.map(<[i32]>::to_vec)));
        Ok(())
    }

    fn text_extent_a(&self, text: &[u8]) -> Result<Extent, Utf8TextError> {
        self.record(Call::ExtentA(text.to_vec()));
        Ok(Extent::new(text.len() as i32 * 10, HEIGHT))
    }

    fn text_extent_ex_a(
        &self,
        text: &[u8],
        max_extent: i32,
        dx: Option<&mut [i32]>,
    ) -> Result<(Extent, usize), Utf8TextError> {
        self.record(Call::ExtentExA(text.to_vec(), max_extent));
        if let Some(dx) = dx {
            for (i, slot) in dx.iter_mut().enumerate().take(text.len()) {
                *slot = (i as i32 + 1) * 10;
            }
        }
        let fit = if max_extent < 0 {
            text.len()
        } else {
            (max_extent as usize / 10).min(text.len())
        };
        Ok((Extent::new(text.len() as i32 * 10, HEIGHT), fit))
    }

    fn draw_text_a(
        &self,
        text: &[u8],
        _: &mut Rect,
        _: DrawFormat,
    ) -> Result<i32, Utf8TextError> {
        self.record(Call::DrawA(text.to_vec()));
        Ok(HEIGHT)
    }

    fn draw_text_ex_a(
        &self,
        text: &mut [u8],
        count: usize,
        _: &mut Rect,
        _: DrawFormat,
        params: Option<&mut DrawTextParams>,
    ) -> Result<i32, Utf8TextError> {
        self.record(Call::DrawExA(text[..count].to_vec()));
        if let Some(params) = params {
            params.length_drawn = count as u32;
        }
        Ok(HEIGHT)
    }
}

fn utf8_surface(backend: Recorder) -> Utf8Text<Recorder> {
    Utf8Text::with_config(
        backend,
        Utf8TextConfig {
            encoding: EncodingPolicy::ForceUtf8,
        },
    )
}

fn legacy_surface(backend: Recorder) -> Utf8Text<Recorder> {
    Utf8Text::with_config(
        backend,
        Utf8TextConfig {
            encoding: EncodingPolicy::ForceLegacy,
        },
    )
}

fn utf16(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

#[test]
fn extent_uses_wide_measurement_for_utf8() {
    let surface = utf8_surface(Recorder::default());
    let extent = surface
        .text_extent("aあ".as_bytes(), TextLen::Terminated)
        .unwrap();
    assert_eq!(extent, Extent::new(30, HEIGHT));
    assert_eq!(surface.backend().calls(), vec![Call::MeasureW(utf16("aあ"))]);
}

#[test]
fn legacy_policy_forwards_raw_bytes() {
    let surface = legacy_surface(Recorder::default());
    let bytes = "aあ".as_bytes();
    let extent = surface.text_extent(bytes, TextLen::Explicit(4)).unwrap();
    assert_eq!(extent, Extent::new(40, HEIGHT));
    assert_eq!(surface.backend().calls(), vec![Call::ExtentA(bytes.to_vec())]);
}

#[test]
/// Fit and partial extents are reported per byte.
fn extent_ex_projects_onto_bytes() {
    let surface = utf8_surface(Recorder::default());
    let text = "Hi😀".as_bytes();

    let mut dx = [-1; 8];
    let (extent, fit) = surface
        .text_extent_ex(text, TextLen::Explicit(6), 25, Some(&mut dx))
        .unwrap();
    assert_eq!(extent, Extent::new(40, HEIGHT));
    assert_eq!(fit, 2);
    assert_eq!(dx, [10, 20, 40, 40, 40, 40, 0, 0]);

    let (_, fit) = surface
        .text_extent_ex(text, TextLen::Explicit(6), 0, None)
        .unwrap();
    assert_eq!(fit, 0);

    let (_, fit) = surface
        .text_extent_ex(text, TextLen::Explicit(6), -1, None)
        .unwrap();
    assert_eq!(fit, 6);

    // A count that cuts the emoji leaves two stray bytes, each its own code point.
    let (extent, fit) = surface
        .text_extent_ex(text, TextLen::Explicit(4), -1, None)
        .unwrap();
    assert_eq!(fit, 4);
    assert_eq!(extent.cx, 40);
}

#[test]
fn empty_text_does_not_reach_the_backend() {
    let surface = utf8_surface(Recorder::default());
    let mut dx = [7; 2];
    let (extent, fit) = surface
        .text_extent_ex(b"\0junk", TextLen::Terminated, 100, Some(&mut dx))
        .unwrap();
    assert_eq!(extent, Extent::ZERO);
    assert_eq!(fit, 0);
    assert_eq!(dx, [0, 0]);
    assert!(surface.backend().calls().is_empty());
}

#[test]
/// A failing wide call degrades to the legacy call with the original bytes.
fn wide_failure_falls_back_to_legacy() {
    let surface = utf8_surface(Recorder::failing_wide());
    let text = "né".as_bytes();

    let (extent, fit) = surface
        .text_extent_ex(text, TextLen::Explicit(3), 15, None)
        .unwrap();
    assert_eq!(extent, Extent::new(30, HEIGHT));
    assert_eq!(fit, 1);
    assert_eq!(
        surface.backend().calls(),
        vec![
            Call::MeasureW(utf16("né")),
            Call::ExtentExA(text.to_vec(), 15)
        ]
    );

    let surface = utf8_surface(Recorder::failing_wide());
    surface.text_out(0, 0, text, TextLen::Explicit(3)).unwrap();
    assert_eq!(
        surface.backend().calls(),
        vec![Call::TextOutW(utf16("né")), Call::TextOutA(text.to_vec())]
    );
}

#[test]
fn text_extent_falls_back_to_legacy() {
    let surface = utf8_surface(Recorder::failing_wide());
    let text = "né".as_bytes();
    let extent = surface.text_extent(text, TextLen::Explicit(3)).unwrap();
    assert_eq!(extent, Extent::new(30, HEIGHT));
    assert_eq!(
        surface.backend().calls(),
        vec![Call::MeasureW(utf16("né")), Call::ExtentA(text.to_vec())]
    );
}

#[test]
/// The legacy call gets the raw bytes and the caller's per-byte spacing.
fn ext_text_out_falls_back_to_legacy() {
    let surface = utf8_surface(Recorder::failing_wide());
    let text = "aé".as_bytes();
    let dx = [5, 3, 4];
    surface
        .ext_text_out(
            0,
            0,
            TextOutOptions::OPAQUE,
            None,
            text,
            TextLen::Explicit(3),
            Some(&dx),
        )
        .unwrap();
    assert_eq!(
        surface.backend().calls(),
        vec![
            Call::ExtTextOutW(utf16("aé"), Some(vec![5, 7])),
            Call::ExtTextOutA(text.to_vec(), Some(dx.to_vec())),
        ]
    );
}

#[test]
fn draw_text_falls_back_to_legacy() {
    let surface = utf8_surface(Recorder::failing_wide());
    let text = "né".as_bytes();
    let mut rect = Rect::new(0, 0, 100, 20);
    let height = surface
        .draw_text(text, TextLen::Explicit(3), &mut rect, DrawFormat::LEFT)
        .unwrap();
    assert_eq!(height, HEIGHT);
    assert_eq!(
        surface.backend().calls(),
        vec![Call::DrawW(utf16("né")), Call::DrawA(text.to_vec())]
    );
}

#[test]
/// After a failed wide call the buffer is untouched and the drawn length comes from the legacy
/// call, in bytes.
fn draw_text_ex_falls_back_to_legacy() {
    let surface = utf8_surface(Recorder::failing_wide());
    let mut buf = [0u8; 12];
    let source = "héllo".as_bytes();
    buf[..source.len()].copy_from_slice(source);
    let before = buf;

    let mut rect = Rect::new(0, 0, 40, 20);
    let mut params = DrawTextParams {
        tab_length: 4,
        ..DrawTextParams::default()
    };
    let height = surface
        .draw_text_ex(
            &mut buf,
            TextLen::Terminated,
            &mut rect,
            DrawFormat::END_ELLIPSIS | DrawFormat::MODIFY_STRING,
            Some(&mut params),
        )
        .unwrap();

    assert_eq!(height, HEIGHT);
    assert_eq!(buf, before);
    assert_eq!(params.tab_length, 4);
    assert_eq!(params.length_drawn, 6);
    assert_eq!(
        surface.backend().calls(),
        vec![Call::DrawExW(utf16("héllo")), Call::DrawExA(source.to_vec())]
    );
}

#[test]
/// Empty text reports the line height on both paths.
fn empty_text_extent_matches_legacy_height() {
    let utf8 = utf8_surface(Recorder::default())
        .text_extent(b"", TextLen::Terminated)
        .unwrap();
    let legacy = legacy_surface(Recorder::default())
        .text_extent(b"", TextLen::Terminated)
        .unwrap();
    assert_eq!(utf8, Extent::new(0, HEIGHT));
    assert_eq!(utf8, legacy);
}

#[test]
fn text_out_stops_at_terminator() {
    let surface = utf8_surface(Recorder::default());
    surface.text_out(1, 2, b"ab\0cd", TextLen::Terminated).unwrap();
    assert_eq!(surface.backend().calls(), vec![Call::TextOutW(utf16("ab"))]);
}

#[test]
fn explicit_count_beyond_buffer_is_rejected() {
    let surface = utf8_surface(Recorder::default());
    let err = surface.text_extent(b"ab", TextLen::Explicit(3)).unwrap_err();
    assert_eq!(err, Utf8TextError::CountOutOfRange { count: 3, len: 2 });
    assert!(surface.backend().calls().is_empty());
}

#[test]
/// Per-byte spacing is summed per code point on the UTF-8 path and forwarded as-is otherwise.
fn ext_text_out_reprojects_spacing() {
    let text = "aé😀".as_bytes();
    let dx = [5, 3, 4, 1, 1, 1, 1];
    let len = TextLen::Explicit(7);

    let surface = utf8_surface(Recorder::default());
    surface
        .ext_text_out(0, 0, TextOutOptions::CLIPPED, None, text, len, Some(&dx))
        .unwrap();
    assert_eq!(
        surface.backend().calls(),
        vec![Call::ExtTextOutW(utf16("aé😀"), Some(vec![5, 7, 4, 0]))]
    );

    let surface = legacy_surface(Recorder::default());
    surface
        .ext_text_out(0, 0, TextOutOptions::default(), None, text, len, Some(&dx))
        .unwrap();
    assert_eq!(
        surface.backend().calls(),
        vec![Call::ExtTextOutA(text.to_vec(), Some(dx.to_vec()))]
    );

    let surface = utf8_surface(Recorder::default());
    let short = &dx[..3];
    let err = surface
        .ext_text_out(0, 0, TextOutOptions::CLIPPED, None, text, len, Some(short))
        .unwrap_err();
    assert_eq!(err, Utf8TextError::SpacingTooShort { needed: 7, len: 3 });
    assert!(surface.backend().calls().is_empty());
}

#[test]
fn draw_text_uses_decoded_text() {
    let surface = utf8_surface(Recorder::default());
    let mut rect = Rect::new(0, 0, 100, 20);
    let height = surface
        .draw_text(
            &[b'x', 0xC2, b' '],
            TextLen::Explicit(3),
            &mut rect,
            DrawFormat::SINGLELINE,
        )
        .unwrap();
    assert_eq!(height, HEIGHT);
    assert_eq!(
        surface.backend().calls(),
        vec![Call::DrawW(vec![b'x' as u16, 0xFFFD, b' ' as u16])]
    );
}

#[test]
/// Rewritten text comes back as UTF-8 and the drawn length is reported in bytes.
fn draw_text_ex_stores_modified_text_as_utf8() {
    let surface = utf8_surface(Recorder::default());
    let mut buf = [0u8; 20];
    let source = "héllo wörld".as_bytes();
    buf[..source.len()].copy_from_slice(source);

    let mut rect = Rect::new(0, 0, 40, 20);
    let mut params = DrawTextParams::default();
    let height = surface
        .draw_text_ex(
            &mut buf,
            TextLen::Explicit(source.len()),
            &mut rect,
            DrawFormat::END_ELLIPSIS | DrawFormat::MODIFY_STRING,
            Some(&mut params),
        )
        .unwrap();

    assert_eq!(height, HEIGHT);
    assert_eq!(&buf[..7], "hé...\0".as_bytes());
    assert_eq!(params.length_drawn, 13);
}

#[test]
fn draw_text_ex_without_modify_leaves_buffer() {
    let surface = utf8_surface(Recorder::default());
    let mut buf = *b"hello\0";
    let mut rect = Rect::new(0, 0, 40, 20);
    surface
        .draw_text_ex(
            &mut buf,
            TextLen::Terminated,
            &mut rect,
            DrawFormat::END_ELLIPSIS,
            None,
        )
        .unwrap();
    assert_eq!(&buf, b"hello\0");
    assert_eq!(surface.backend().calls(), vec![Call::DrawExW(utf16("hello"))]);
}

#[test]
fn draw_text_ex_legacy_passes_buffer_through() {
    let surface = legacy_surface(Recorder::default());
    let mut buf = *b"abc\0";
    let mut rect = Rect::default();
    let mut params = DrawTextParams::default();
    surface
        .draw_text_ex(
            &mut buf,
            TextLen::Terminated,
            &mut rect,
            DrawFormat::LEFT,
            Some(&mut params),
        )
        .unwrap();
    assert_eq!(params.length_drawn, 3);
    assert_eq!(surface.backend().calls(), vec![Call::DrawExA(b"abc".to_vec())]);
}
