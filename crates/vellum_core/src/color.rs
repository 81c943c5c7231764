//! Color parsing utilities for paint definitions.
//!
//! Paint colors are stored as non-linear sRGB with alpha. This module
//! parses the hex notations used by style definitions.

use palette::Srgba;

/// Parse a hex color string into an sRGB color with alpha.
///
/// Supports `#RGB`, `#RGBA`, `#RRGGBB` and `#RRGGBBAA`, with or without
/// the leading `#`. Returns `None` for anything else.
pub fn parse_hex_color(value: &str) -> Option<Srgba<f32>> {
    let hex = value.trim().trim_start_matches('#');

    let (r, g, b, a) = match hex.len() {
        3 => {
            let r = nibble(hex, 0)?;
            let g = nibble(hex, 1)?;
            let b = nibble(hex, 2)?;
            (r * 17, g * 17, b * 17, 255)
        }
        4 => {
            let r = nibble(hex, 0)?;
            let g = nibble(hex, 1)?;
            let b = nibble(hex, 2)?;
            let a = nibble(hex, 3)?;
            (r * 17, g * 17, b * 17, a * 17)
        }
        6 => {
            let r = byte(hex, 0)?;
            let g = byte(hex, 2)?;
            let b = byte(hex, 4)?;
            (r, g, b, 255)
        }
        8 => {
            let r = byte(hex, 0)?;
            let g = byte(hex, 2)?;
            let b = byte(hex, 4)?;
            let a = byte(hex, 6)?;
            (r, g, b, a)
        }
        _ => return None,
    };

    Some(Srgba::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        a as f32 / 255.0,
    ))
}

fn nibble(hex: &str, index: usize) -> Option<u8> {
    u8::from_str_radix(hex.get(index..index + 1)?, 16).ok()
}

fn byte(hex: &str, index: usize) -> Option<u8> {
    u8::from_str_radix(hex.get(index..index + 2)?, 16).ok()
}
