#![no_main]

use libfuzzer_sys::fuzz_target;
use utf8_extent::{DecodedText, FixedAdvance, MaxExtent, measure_extent_ex};

fuzz_target!(|data: &[u8]| {
    // First two bytes pick the maximum width; the rest is the text.
    let (max, text) = match data {
        [a, b, rest @ ..] => (i16::from_le_bytes([*a, *b]), rest),
        _ => return,
    };
    let text = if text.len() > 64 * 1024 {
        &text[..64 * 1024]
    } else {
        text
    };

    let measurer = FixedAdvance::new(3, 10);
    let decoded = DecodedText::decode(text);
    let max = MaxExtent::from_legacy(i32::from(max));
    let ex = measure_extent_ex(&measurer, &decoded, max, text.len())
        .expect("fixed advance never fails");

    assert_eq!(ex.partial_extents.len(), text.len());
    assert_eq!(ex.advances.len(), text.len());
    assert!(ex.fit <= text.len());
    assert!(ex.partial_extents.windows(2).all(|w| w[0] <= w[1]));

    // The fit never splits a code point, and the fitting prefix is within the maximum.
    if ex.fit > 0 {
        let last = decoded.codepoint_for_byte(ex.fit - 1).expect("mapped");
        assert_eq!(decoded.codepoint_byte_end(last), Some(ex.fit));
        if let MaxExtent::Pixels(px) = max {
            assert!(i64::from(ex.partial_extents[ex.fit - 1]) <= i64::from(px));
        }
    }
});
