use std::{fs, path::PathBuf};

use clap::Parser;
use utf8_extent::{DecodedText, FixedAdvance, MaxExtent, measure_extent_ex};

#[derive(Parser, Debug)]
#[command(name = "measure")]
#[command(
    about = "Measure UTF-8 text with a fixed-advance font and report per-byte extents",
    long_about = None
)]
struct Args {
    /// Text to measure (ignored when --input is given)
    text: Option<String>,

    /// Read raw bytes from this file instead
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Maximum width for the fit count (negative: unbounded)
    #[arg(long, short, default_value_t = -1, allow_negative_numbers = true)]
    max_extent: i32,

    /// Advance of a narrow code point
    #[arg(long, default_value_t = 8)]
    advance: i32,

    /// Advance of a wide (CJK, fullwidth, astral) code point
    #[arg(long)]
    wide_advance: Option<i32>,

    /// Line height
    #[arg(long, default_value_t = 16)]
    height: i32,

    /// Print one line per byte with its code point and extents
    #[arg(long)]
    per_byte: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let bytes = match (&args.input, &args.text) {
        (Some(path), _) => fs::read(path)?,
        (None, Some(text)) => text.clone().into_bytes(),
        (None, None) => {
            return Err(std::io::Error::other("provide TEXT or --input").into());
        }
    };

    let mut measurer = FixedAdvance::new(args.advance, args.height);
    if let Some(wide) = args.wide_advance {
        measurer.wide_advance = wide;
    }

    let decoded = DecodedText::decode(&bytes);
    let ex = measure_extent_ex(
        &measurer,
        &decoded,
        MaxExtent::from_legacy(args.max_extent),
        bytes.len(),
    )?;

    println!(
        "bytes: {}  code points: {}  code units: {}",
        decoded.byte_len(),
        decoded.codepoint_count(),
        decoded.wide().len()
    );
    println!("extent: {}x{}", ex.extent.cx, ex.extent.cy);
    println!("fit: {} bytes", ex.fit);

    if args.per_byte {
        for (byte, &value) in bytes.iter().enumerate() {
            let cp = decoded
                .codepoint_for_byte(byte)
                .map_or_else(|| "-".to_owned(), |cp| cp.to_string());
            println!(
                "{byte:>6}  0x{value:02x}  cp {cp:>6}  advance {:>4}  partial {:>6}",
                ex.advances[byte], ex.partial_extents[byte]
            );
        }
    }

    Ok(())
}
