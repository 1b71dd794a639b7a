use std::ops::Deref;

use crate::common::bitstream::BitStream;
use crate::common::ec::Block;
use crate::common::metadata::Version;

// Tiler
//------------------------------------------------------------------------------

/// Interleaves codeword i of every block, skipping blocks shorter than i.
pub fn interleave<T: Copy, V: Deref<Target = [T]>>(blocks: &[V]) -> Vec<T> {
    let max_block_size = blocks.iter().map(|b| b.len()).max().unwrap_or(0);
    let total_size = blocks.iter().map(|b| b.len()).sum::<usize>();
    let mut res = Vec::with_capacity(total_size);
    for i in 0..max_block_size {
        for b in blocks {
            if i < b.len() {
                res.push(b[i]);
            }
        }
    }
    res
}

/// Lays out interleaved data codewords, then interleaved EC codewords, then
/// the version's zero remainder bits.
pub fn tile(blocks: &[Block], ver: Version) -> BitStream {
    let total_codewords = ver.total_codewords();
    let remainder_bits = ver.remainder_bits();
    debug_assert_eq!(
        blocks.iter().map(Block::len).sum::<usize>(),
        total_codewords,
        "Blocks don't cover the total codewords of version {ver}"
    );

    let data = blocks.iter().map(Block::data).collect::<Vec<_>>();
    let ecc = blocks.iter().map(Block::ecc).collect::<Vec<_>>();

    let mut payload = BitStream::new((total_codewords << 3) + remainder_bits);
    payload.extend_bytes(&interleave(&data));
    payload.extend_bytes(&interleave(&ecc));
    payload.push_bits(0u8, remainder_bits);
    payload
}
