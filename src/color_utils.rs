//! Color utility functions shared across the application.
//!
//! Shapes get a deterministic display color derived from their label text, so
//! the same class always renders with the same color across sessions.

/// An RGBA color with 8-bit channels.
pub type Rgba = [u8; 4];

/// Alpha used for label-derived colors.
pub const LABEL_COLOR_ALPHA: u8 = 100;

/// Convert HSV to RGB.
///
/// # Arguments
/// * `h` - Hue in degrees (0-360)
/// * `s` - Saturation (0.0-1.0)
/// * `v` - Value/brightness (0.0-1.0)
///
/// # Returns
/// RGB tuple with values in range 0.0-1.0
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (r + m, g + m, b + m)
}

/// 64-bit FNV-1a hash of the label bytes, stable across processes.
fn label_hash(text: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    text.bytes()
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}

/// Deterministic color for a label.
pub fn color_for_label(label: &str) -> Rgba {
    let hash = label_hash(label);
    let hue = (hash % 360) as f32;
    // Spread saturation and value a little so neighbouring hues stay distinct
    let saturation = 0.6 + ((hash >> 16) % 4) as f32 * 0.1;
    let value = 0.75 + ((hash >> 24) % 3) as f32 * 0.1;
    let (r, g, b) = hsv_to_rgb(hue, saturation, value);

    [
        to_channel(r),
        to_channel(g),
        to_channel(b),
        LABEL_COLOR_ALPHA,
    ]
}

fn to_channel(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
