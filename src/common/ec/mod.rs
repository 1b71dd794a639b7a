mod block;
mod galois;

pub use block::{compute_blocks, Block};
