//! Seven-segment digit geometry.
//!
//! Segments are indexed A..G clockwise from the top, with G in the middle.
//! Geometry is expressed in plain floats so it can be laid out and tested
//! without a canvas.

/// Lit segments per digit, bit 0 = A through bit 6 = G.
const SEGMENT_MASKS: [u8; 10] = [0x3F, 0x06, 0x5B, 0x4F, 0x66, 0x6D, 0x7D, 0x07, 0x7F, 0x6F];

/// Width of a digit cell relative to its height.
pub const ASPECT: f32 = 0.55;
/// Segment stroke relative to the cell height.
pub const STROKE: f32 = 0.12;
/// Gap between neighbouring digits relative to the cell height.
pub const SPACING: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// One positioned digit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DigitCell {
    pub digit: u8,
    pub x: f32,
    pub y: f32,
}

pub fn cell_size(height: f32) -> (f32, f32) {
    (height * ASPECT, height)
}

/// Rectangles for the lit segments of `digit`, relative to the cell origin.
/// Digits above 9 light nothing.
pub fn segments(digit: u8, height: f32) -> Vec<SegmentRect> {
    let Some(&mask) = SEGMENT_MASKS.get(digit as usize) else {
        return Vec::new();
    };
    let (w, h) = cell_size(height);
    let t = h * STROKE;
    let half = h / 2.0;
    let upright = half - 1.5 * t;
    let all = [
        rect(t, 0.0, w - 2.0 * t, t),
        rect(w - t, t, t, upright),
        rect(w - t, half + t / 2.0, t, upright),
        rect(t, h - t, w - 2.0 * t, t),
        rect(0.0, half + t / 2.0, t, upright),
        rect(0.0, t, t, upright),
        rect(t, half - t / 2.0, w - 2.0 * t, t),
    ];
    all.into_iter()
        .enumerate()
        .filter(|(bit, _)| mask & (1 << bit) != 0)
        .map(|(_, rect)| rect)
        .collect()
}

const fn rect(x: f32, y: f32, w: f32, h: f32) -> SegmentRect {
    SegmentRect { x, y, w, h }
}

/// Lays out the decimal digits of `value` centred on `center`.
pub fn layout_number(value: u64, center: (f32, f32), height: f32) -> Vec<DigitCell> {
    let digits: Vec<u8> = value.to_string().bytes().map(|b| b - b'0').collect();
    let (w, h) = cell_size(height);
    let gap = height * SPACING;
    let n = digits.len() as f32;
    let total = n * w + (n - 1.0) * gap;
    let x0 = center.0 - total / 2.0;
    let y = center.1 - h / 2.0;
    digits
        .into_iter()
        .enumerate()
        .map(|(i, digit)| DigitCell {
            digit,
            x: x0 + i as f32 * (w + gap),
            y,
        })
        .collect()
}
