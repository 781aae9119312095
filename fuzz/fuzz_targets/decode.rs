#![no_main]

use libfuzzer_sys::fuzz_target;
use utf8_extent::DecodedText;

fuzz_target!(|data: &[u8]| {
    // Limit input size to keep the fuzzer fast.
    let data = if data.len() > 64 * 1024 {
        &data[..64 * 1024]
    } else {
        data
    };

    let decoded = DecodedText::decode(data);

    // Every byte belongs to exactly one code point, and the code points tile the input.
    assert_eq!(decoded.byte_len(), data.len());
    assert_eq!(
        decoded.codepoint_byte_ends().last().copied().unwrap_or(0),
        data.len()
    );
    for byte in 0..data.len() {
        let cp = decoded.codepoint_for_byte(byte).expect("byte must be mapped");
        let range = decoded.codepoint_byte_range(cp).expect("code point must exist");
        assert!(range.contains(&byte));
    }
    assert_eq!(decoded.codepoint_for_byte(data.len()), None);

    // Wide ends strictly increase and cover the whole UTF-16 buffer.
    let ends = decoded.codepoint_wide_ends();
    assert!(ends.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(ends.last().map(|&e| e + 1).unwrap_or(0), decoded.wide().len());

    // Valid input must survive a round trip.
    if let Ok(s) = std::str::from_utf8(data) {
        assert_eq!(decoded.to_utf8(), s);
    }
});
