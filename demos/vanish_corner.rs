//! Remove a mark from the bottom-right corner of a single image.
//!
//! Usage:
//! ```sh
//! GEMINI_API_KEY=... cargo run --example vanish_corner -- input.png output.png
//! ```

use std::env;
use std::path::Path;
use std::process;

use mark_vanish::files::write_png;
use mark_vanish::{remove_watermark, Config, Corner, EncodedImage, GeminiClient, Size};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <input> <output>", args[0]);
        process::exit(1);
    }

    let bytes = std::fs::read(&args[1]).expect("failed to read input");
    let image = EncodedImage::sniff(&bytes).expect("input is not an image");
    let container = Size::from(image.dimensions().expect("unreadable image header"));
    let selection = Corner::BottomRight.preset(container);

    let client = GeminiClient::new(&Config::from_env()).expect("failed to initialize client");
    match remove_watermark(&client, &image, &selection, container) {
        Ok(cleaned) => {
            write_png(&cleaned, Path::new(&args[2])).expect("failed to save output");
            println!("Done: {}", args[2]);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
