//! # Options Codec
//!
//! Encodes normalized transform options into the token that addresses a
//! derivative: `prefix+value` segments joined by `-`, in a fixed order.
//!
//! The prefix table and its order are part of every derivative URL ever
//! issued. Changing either invalidates all existing derivative addresses.
//!
//! Decoding is the job of whatever serves derivatives; it is not done here.

use super::options::{NormalizedOptions, TransformOptions};

/// Segment prefixes, in emission order
pub const PREFIXES: [(char, &str); 15] = [
    ('w', "width"),
    ('h', "height"),
    ('c', "crop"),
    ('f', "fit"),
    ('m', "flip"),
    ('r', "rotate"),
    ('s', "sharpen"),
    ('k', "contrast"),
    ('g', "grayscale"),
    ('q', "quality"),
    ('b', "background"),
    ('p', "progressive"),
    ('i', "interlace"),
    ('l', "blur"),
    ('a', "align"),
];

const SEPARATOR: &str = "-";

/// Transform options → derivative token
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionsCodec;

impl OptionsCodec {
    /// Encode normalized options. Identical input gives a byte-identical token.
    pub fn encode(options: &NormalizedOptions) -> String {
        // crop/fit already carry the geometry; width/height would be redundant
        let has_geometry = options.crop().is_some() || options.fit().is_some();

        let segments = PREFIXES.iter().filter_map(|(prefix, _)| {
            let value = match prefix {
                'w' if !has_geometry => options.width().map(|v| v.to_string()),
                'h' if !has_geometry => options.height().map(|v| v.to_string()),
                'c' => options.crop().map(str::to_string),
                'f' => options.fit().map(str::to_string),
                'm' => options.flip().map(str::to_string),
                'r' => options.rotate().map(|v| v.to_string()),
                's' => options.sharpen().map(|v| v.to_string()),
                'k' => options.contrast().map(|v| v.to_string()),
                'g' => flag(options.grayscale()),
                'q' => options.quality().map(|v| v.to_string()),
                'b' => options.background().map(str::to_string),
                'p' => flag(options.progressive()),
                'i' => flag(options.interlace()),
                'l' => options.blur().map(|v| v.to_string()),
                'a' => options.align().map(str::to_string),
                _ => None,
            };
            value.map(|v| format!("{}{}", prefix, v))
        });

        segments.collect::<Vec<_>>().join(SEPARATOR)
    }

    /// Normalize and encode in one step
    pub fn encode_options(options: &TransformOptions) -> String {
        Self::encode(&options.normalize())
    }
}

fn flag(on: bool) -> Option<String> {
    if on {
        Some("1".to_string())
    } else {
        None
    }
}
