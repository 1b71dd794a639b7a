mod encoder;
mod types;
mod writer;

pub use encoder::{encode, encode_with_version, to_shift_jis};
pub use types::Mode;

// Codec proptesting
//------------------------------------------------------------------------------
