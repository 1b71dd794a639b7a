use super::types::{Mode, Segment, PADDING_CODEWORDS};
use crate::common::bitstream::BitStream;

// Segment writer
//------------------------------------------------------------------------------

// Characters packed together: digit triples, alphanumeric pairs, single
// bytes and kanji pairs (two Shift JIS bytes)
fn group_len(mode: Mode) -> usize {
    match mode {
        Mode::Numeric => 3,
        Mode::Alphanumeric | Mode::Kanji => 2,
        Mode::Byte => 1,
    }
}

/// Appends the mode indicator, the character count and the packed data.
pub fn write_segment(seg: &Segment, out: &mut BitStream) {
    let count = seg.char_count();
    debug_assert!(count < 1 << seg.len_bits, "Count {count} overflows {} bits", seg.len_bits);
    debug_assert!(seg.mode != Mode::Kanji || seg.data.len() % 2 == 0, "Odd kanji data");

    out.push_bits(seg.mode as u8, seg.mode_bits);
    out.push_bits(count as u16, seg.len_bits);
    for group in seg.data.chunks(group_len(seg.mode)) {
        out.push_bits(seg.mode.encode_chunk(group), seg.mode.encoded_len(group.len()));
    }
}

/// Fills the rest of the stream: a terminator of up to four zeros, zeros to
/// the next byte boundary, then the alternating pad codewords.
pub fn close_stream(out: &mut BitStream) {
    let terminator = out.remaining().min(4);
    let to_boundary = (8 - (out.len() + terminator) % 8) % 8;
    out.push_bits(0u16, terminator + to_boundary.min(out.remaining() - terminator));

    let pad_len = out.remaining() / 8;
    PADDING_CODEWORDS.iter().cycle().take(pad_len).for_each(|&cw| out.push_bits(cw, 8));
}
