use std::mem;

use num_traits::{PrimInt, Unsigned};

// Bit stream
//------------------------------------------------------------------------------

/// Append-only bit buffer bounded by a bit capacity. Bits fill each byte from
/// the most significant end, so a byte aligned stream reads back as plain
/// codewords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitStream {
    bytes: Vec<u8>,
    len: usize,
    capacity: usize,
}

impl BitStream {
    pub fn new(capacity: usize) -> Self {
        Self { bytes: Vec::with_capacity(capacity.div_ceil(8)), len: 0, capacity }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.len
    }

    /// Written bytes. A partial last byte is zero filled.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Bits in write order.
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.bytes[i / 8] & (0x80 >> (i % 8)) != 0)
    }

    pub fn push(&mut self, bit: bool) {
        assert!(self.len < self.capacity, "Bit stream full at {} bits", self.capacity);
        if self.len % 8 == 0 {
            self.bytes.push(0);
        }
        if bit {
            if let Some(last) = self.bytes.last_mut() {
                *last |= 0x80 >> (self.len % 8);
            }
        }
        self.len += 1;
    }

    /// Pushes the low `width` bits of `value`, most significant first.
    pub fn push_bits<T: PrimInt + Unsigned>(&mut self, value: T, width: usize) {
        let type_bits = mem::size_of::<T>() * 8;
        debug_assert!(width <= type_bits, "Width {width} exceeds {type_bits} bit type");
        debug_assert!(
            type_bits - (value.leading_zeros() as usize) <= width,
            "Value doesn't fit in {width} bits"
        );
        (0..width).rev().for_each(|i| self.push((value >> i) & T::one() == T::one()));
    }

    /// Appends whole bytes. Aligned streams copy them directly.
    pub fn extend_bytes(&mut self, bytes: &[u8]) {
        if self.len % 8 != 0 {
            bytes.iter().for_each(|&b| self.push_bits(b, 8));
            return;
        }
        assert!(bytes.len() * 8 <= self.remaining(), "Bit stream full at {} bits", self.capacity);
        self.bytes.extend_from_slice(bytes);
        self.len += bytes.len() * 8;
    }
}
