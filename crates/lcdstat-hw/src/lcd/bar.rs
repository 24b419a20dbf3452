//! Horizontal bar graph built from custom glyphs.
//!
//! A character cell is five dots wide. Full cells use the solid glyph, a
//! partially filled cell uses one of the 1-4 dot glyphs, and the empty run
//! after the fill is framed by a leading marker and a closing marker.

/// Dot columns per character cell.
pub const CELL_DOTS: usize = 5;

/// Empty interior cell.
pub const GLYPH_EMPTY: u8 = 0;

/// Completely filled cell. Slots 1-4 hold cells with that many dots filled.
pub const GLYPH_FULL: u8 = 5;

/// First cell of an empty run.
pub const GLYPH_LEAD: u8 = 6;

/// Last cell of the bar when it is empty.
pub const GLYPH_CLOSE: u8 = 7;

/// Bar glyph bitmaps, indexed by CGRAM slot. Rows are 5 bits wide, MSB left.
pub const BAR_GLYPHS: [[u8; 7]; 8] = [
    [0x15, 0x00, 0x00, 0x00, 0x00, 0x00, 0x15],
    [0x15, 0x10, 0x10, 0x10, 0x10, 0x10, 0x15],
    [0x1D, 0x18, 0x18, 0x18, 0x18, 0x18, 0x1D],
    [0x1D, 0x1C, 0x1C, 0x1C, 0x1C, 0x1C, 0x1D],
    [0x1B, 0x1A, 0x1A, 0x1A, 0x1A, 0x1A, 0x1B],
    [0x1B, 0x1B, 0x1B, 0x1B, 0x1B, 0x1B, 0x1B],
    [0x15, 0x00, 0x10, 0x00, 0x10, 0x00, 0x15],
    [0x15, 0x00, 0x01, 0x00, 0x01, 0x00, 0x15],
];

/// Glyph codes for a bar of `filled` dots out of `max` dots.
///
/// The bar occupies `max / 5` cells. `filled` is clamped to that width.
pub fn cells(filled: usize, max: usize) -> Vec<u8> {
    let total = max / CELL_DOTS;
    let filled = filled.min(total * CELL_DOTS);
    let full = filled / CELL_DOTS;
    let partial = filled % CELL_DOTS;

    let mut out = Vec::with_capacity(total);
    out.extend(std::iter::repeat_n(GLYPH_FULL, full));

    let mut empty = total - full;
    if partial > 0 {
        out.push(partial as u8);
        empty -= 1;
    }

    let run = empty;
    while empty > 0 {
        // closing marker takes precedence over the leading marker
        let glyph = if empty == 1 {
            GLYPH_CLOSE
        } else if empty == run {
            GLYPH_LEAD
        } else {
            GLYPH_EMPTY
        };
        out.push(glyph);
        empty -= 1;
    }

    out
}
