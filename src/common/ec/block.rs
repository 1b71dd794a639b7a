use tracing::debug;

use super::galois::{G, GENERATOR_POLYNOMIALS};
use crate::common::metadata::{ECLevel, Version};

// Block
//------------------------------------------------------------------------------

/// One Reed-Solomon block: a run of data codewords and the EC codewords
/// computed over it.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Block {
    data: Vec<u8>,
    ecc: Vec<u8>,
}

impl Block {
    pub fn new(data: &[u8], ec_len: usize) -> Self {
        let ecc = compute_ecc(data, ec_len);
        Self { data: data.to_vec(), ecc }
    }

    pub fn len(&self) -> usize {
        self.data.len() + self.ecc.len()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn ecc(&self) -> &[u8] {
        &self.ecc
    }
}

#[cfg(test)]
impl Block {
    pub(crate) fn data_len(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn ec_len(&self) -> usize {
        self.ecc.len()
    }

    /// Evaluates the full codeword polynomial at α^0..α^(ec_len - 1). All
    /// zero for an intact block.
    pub(crate) fn syndromes(&self) -> Vec<G> {
        let full = self.data.iter().chain(self.ecc.iter()).copied().map(G).collect::<Vec<_>>();
        (0..self.ec_len())
            .map(|i| {
                let x = G::gen_pow(i);
                full.iter().fold(G::ZERO, |acc, &c| acc * x + c)
            })
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

// Performs polynomial long division of data(x)·x^n by the generator
// polynomial of degree n. The remainder coefficients are the ecc.
fn compute_ecc(data: &[u8], ec_len: usize) -> Vec<u8> {
    let gen_poly = &GENERATOR_POLYNOMIALS[ec_len];
    let len = data.len();

    let mut res = data.iter().copied().map(G).collect::<Vec<_>>();
    res.resize(len + ec_len, G::ZERO);

    for i in 0..len {
        let lead = res[i];
        if lead.is_zero() {
            continue;
        }
        for (u, &v) in res[i + 1..].iter_mut().zip(gen_poly[1..].iter()) {
            *u += v * lead;
        }
    }

    res[len..].iter().map(|&g| g.into()).collect()
}

// Blocks
//------------------------------------------------------------------------------

/// Splits data codewords into group 1 blocks followed by the one codeword
/// longer group 2 blocks.
pub fn blockify(data: &[u8], version: Version, ec_level: ECLevel) -> Vec<&[u8]> {
    let (block1_size, block1_count, block2_size, block2_count) =
        version.data_codewords_per_block(ec_level);

    let total_blocks = block1_count + block2_count;
    let total_block1_size = block1_size * block1_count;
    let total_size = total_block1_size + block2_size * block2_count;

    debug_assert!(
        total_size == data.len(),
        "Data len doesn't match total size of blocks: Data len {}, Total block size {}",
        data.len(),
        total_size
    );

    let mut data_blocks = Vec::with_capacity(total_blocks);
    data_blocks.extend(data[..total_block1_size].chunks(block1_size));
    if block2_size > 0 {
        data_blocks.extend(data[total_block1_size..].chunks(block2_size));
    }
    data_blocks
}

pub fn compute_blocks(data: &[u8], version: Version, ec_level: ECLevel) -> Vec<Block> {
    let ec_len = version.ecc_per_block(ec_level);
    let blocks = blockify(data, version, ec_level)
        .into_iter()
        .map(|b| Block::new(b, ec_len))
        .collect::<Vec<_>>();

    let (s1, c1, s2, c2) = version.data_codewords_per_block(ec_level);
    debug!(
        version = *version,
        ?ec_level,
        ec_len,
        "Blocks: {c1} x {s1} data codewords, {c2} x {s2} data codewords"
    );

    blocks
}

#[cfg(test)]
mod block_tests {

    use proptest::prelude::*;
    use test_case::test_case;

    use super::{blockify, compute_blocks, compute_ecc, Block};
    use crate::common::metadata::{ECLevel, Version};

    #[test_case(b" [\x0bx\xd1r\xdcMC@\xec\x11\xec\x11\xec\x11", b"\xc4#'w\xeb\xd7\xe7\xe2]\x17"; "1-M")]
    #[test_case(b" [\x0bx\xd1r\xdcMC@\xec\x11\xec", b"\xa8H\x16R\xd96\x9c\x00.\x0f\xb4z\x10"; "1-Q")]
    #[test_case(b"CUF\x86W&U\xc2w2\x06\x12\x06g&", b"\xd5\xc7\x0b-s\xf7\xf1\xdf\xe5\xf8\x9au\x9aoV\xa1o'"; "5-Q first block")]
    fn test_compute_ecc(data: &[u8], exp: &[u8]) {
        assert_eq!(compute_ecc(data, exp.len()), exp);
    }

    #[test]
    fn test_compute_blocks_simple() {
        let msg = b" [\x0bx\xd1r\xdcMC@\xec\x11\xec\x11\xec\x11";
        let blocks = compute_blocks(msg, Version(1), ECLevel::M);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].data(), msg);
        assert_eq!(blocks[0].ecc(), b"\xc4\x23\x27\x77\xeb\xd7\xe7\xe2\x5d\x17");
    }

    #[test]
    fn test_compute_blocks_complex() {
        let msg = b"CUF\x86W&U\xc2w2\x06\x12\x06g&\xf6\xf6B\x07v\x86\xf2\x07&V\x16\xc6\xc7\x92\x06\
                    \xb6\xe6\xf7w2\x07v\x86W&R\x06\x86\x972\x07F\xf7vV\xc2\x06\x972\x10\xec\x11\xec\
                    \x11\xec\x11\xec";
        let expected_ec = [
            b"\xd5\xc7\x0b\x2d\x73\xf7\xf1\xdf\xe5\xf8\x9a\x75\x9a\x6f\x56\xa1\x6f\x27",
            b"\x57\xcc\x60\x3c\xca\xb6\x7c\x9d\xc8\x86\x1b\x81\xd1\x11\xa3\xa3\x78\x85",
            b"\x94\x74\xb1\xd4\x4c\x85\x4b\xf2\xee\x4c\xc3\xe6\xbd\x0a\x6c\xf0\xc0\x8d",
            b"\xeb\x9f\x05\xad\x18\x93\x3b\x21\x6a\x28\xff\xac\x52\x02\x83\x20\xb2\xec",
        ];
        let blocks = compute_blocks(msg, Version(5), ECLevel::Q);
        let data_lens = blocks.iter().map(Block::data_len).collect::<Vec<_>>();
        assert_eq!(data_lens, vec![15, 15, 16, 16]);
        let ecc = blocks.iter().map(Block::ecc).collect::<Vec<_>>();
        assert_eq!(ecc, &expected_ec[..]);
    }

    #[test]
    fn test_blockify_groups() {
        let ver = Version(5);
        let data = (0..ver.data_codewords(ECLevel::Q) as u8).collect::<Vec<_>>();
        let blocks = blockify(&data, ver, ECLevel::Q);
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[1][0], 15);
        assert_eq!(blocks[2][0], 30);
        assert_eq!(*blocks[3].last().unwrap(), 61);
    }

    #[test]
    fn test_corrupted_block_has_nonzero_syndromes() {
        let mut block = Block::new(b"CUF\x86W&U\xc2w2\x06\x12\x06g&", 18);
        assert!(block.syndromes().iter().all(|s| s.is_zero()));
        block.data_mut()[3] ^= 0x5A;
        assert!(block.syndromes().iter().any(|s| !s.is_zero()));
    }

    fn block_strategy() -> impl Strategy<Value = (Vec<u8>, usize)> {
        (prop::collection::vec(any::<u8>(), 1..=120), 7usize..=30)
    }

    proptest! {
        #[test]
        fn proptest_syndromes_vanish((data, ec_len) in block_strategy()) {
            let block = Block::new(&data, ec_len);
            prop_assert_eq!(block.ec_len(), ec_len);
            prop_assert!(block.syndromes().iter().all(|s| s.is_zero()));
        }
    }
}
