//! # qrforge
//!
//! A Rust library for generating Model 2 QR codes with Reed-Solomon error correction.
//!
//! ## Features
//!
//! - **Optimal segmentation**: Input is split into numeric, alphanumeric, byte and kanji
//!   segments with the fewest total bits
//! - **Version selection**: Picks the smallest of the 40 versions that fits the data
//! - **Reed-Solomon Error Correction**: Configurable levels (L, M, Q, H)
//! - **Mask selection**: Scores all eight masks in parallel and keeps the lowest penalty
//! - **Rendering**: Terminal text or grayscale images
//!
//! ## Quick Start
//!
//! ```rust
//! use qrforge::QRBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Simplest usage - provide only data, all other settings are automatically chosen
//! let qr = QRBuilder::new(b"Hello, World!").build()?;
//!
//! let img = qr.to_image(4); // 4x scale factor
//! assert_eq!(img.width(), (qr.width() as u32 + 8) * 4);
//! # Ok(())
//! # }
//! ```
//!
//! ### Full Configuration
//!
//! ```rust
//! use qrforge::{ECLevel, MaskPattern, QRBuilder, Version};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let qr = QRBuilder::new("Hello, World!".as_bytes())
//!     .version(Version::new(2)?)     // if not provided, finds smallest version to fit data
//!     .ec_level(ECLevel::M)          // if not provided, defaults to ECLevel::M
//!     .mask(MaskPattern::new(3)?)    // if not provided, finds best mask based on penalty score
//!     .kanji(false)                  // Shift JIS kanji packing, off by default
//!     .build()?;
//!
//! println!("{}", qr.to_str(1));
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Correction Levels
//! - **L (Low)**: ~7% error correction
//! - **M (Medium)**: ~15% error correction
//! - **Q (Quartile)**: ~25% error correction
//! - **H (High)**: ~30% error correction

#![allow(clippy::items_after_test_module)]

pub mod builder;
pub(crate) mod common;

pub use builder::{Module, QRBuilder, Role, QR};
pub use common::codec::Mode;
pub use common::error::{QRError, QRResult};
pub use common::iter::EncRegionIter;
pub use common::mask::MaskPattern;
pub use common::metadata::{format_info, parse_format_info, Color, ECLevel, Version};
