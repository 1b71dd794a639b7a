mod qr;
mod tiler;

pub use qr::{Module, Role, QR};
use tiler::tile;

use std::borrow::Cow;

use tracing::debug;

use crate::common::{
    codec::{encode, encode_with_version, to_shift_jis},
    ec::compute_blocks,
    error::{QRError, QRResult},
    mask::{apply_best_mask, MaskPattern},
    metadata::{ECLevel, Version},
};

/// Configures and builds a [`QR`].
///
/// ```
/// use qrforge::{ECLevel, QRBuilder};
///
/// let qr = QRBuilder::new(b"HELLO WORLD").ec_level(ECLevel::Q).build().unwrap();
/// assert_eq!(*qr.version(), 1);
/// ```
pub struct QRBuilder<'a> {
    data: &'a [u8],
    version: Option<Version>,
    ec_level: ECLevel,
    mask: Option<MaskPattern>,
    kanji: bool,
}

impl<'a> QRBuilder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, version: None, ec_level: ECLevel::M, mask: None, kanji: false }
    }

    pub fn data(&mut self, data: &'a [u8]) -> &mut Self {
        self.data = data;
        self
    }

    /// Forces the version. Without one the smallest version that fits is used.
    /// A forced version too small for the data fails with
    /// [`QRError::InvalidVersion`].
    pub fn version(&mut self, version: Version) -> &mut Self {
        self.version = Some(version);
        self
    }

    pub fn unset_version(&mut self) -> &mut Self {
        self.version = None;
        self
    }

    pub fn ec_level(&mut self, ec_level: ECLevel) -> &mut Self {
        self.ec_level = ec_level;
        self
    }

    /// Forces the mask. Without one the mask with the lowest penalty is used.
    pub fn mask(&mut self, mask: MaskPattern) -> &mut Self {
        self.mask = Some(mask);
        self
    }

    /// Transcodes UTF-8 input to Shift JIS so double byte characters can be
    /// packed in kanji mode. Input that doesn't become plain ASCII and kanji
    /// pairs, half width katakana for one, is kept as UTF-8 bytes.
    pub fn kanji(&mut self, kanji: bool) -> &mut Self {
        self.kanji = kanji;
        self
    }

    pub fn metadata(&self) -> String {
        match self.version {
            Some(v) => format!(
                "{{ Version: {}, Ec level: {:?}, Kanji: {} }}",
                *v, self.ec_level, self.kanji
            ),
            None => {
                format!("{{ Version: None, Ec level: {:?}, Kanji: {} }}", self.ec_level, self.kanji)
            }
        }
    }
}

impl QRBuilder<'_> {
    pub fn build(&self) -> QRResult<QR> {
        debug!(metadata = %self.metadata(), len = self.data.len(), "Generating QR");
        if self.data.is_empty() {
            return Err(QRError::InvalidInput);
        }

        let (data, kanji) = self.payload_bytes();

        let (encoded, version) = match self.version {
            Some(v) => (encode_with_version(&data, v, self.ec_level, kanji)?, v),
            None => encode(&data, self.ec_level, kanji)?,
        };
        debug!(version = *version, bits = encoded.len(), "Encoded data");

        let blocks = compute_blocks(encoded.as_bytes(), version, self.ec_level);
        let payload = tile(&blocks, version);

        let mut qr = QR::new(version, self.ec_level);
        qr.draw_function_patterns()?;
        qr.draw_encoding_region(&payload)?;

        let mask = match self.mask {
            Some(m) => {
                qr.apply_mask(m);
                m
            }
            None => apply_best_mask(&mut qr),
        };
        debug!(version = *version, mask = *mask, dark = qr.count_dark_modules(), "QR generated");

        Ok(qr)
    }

    fn payload_bytes(&self) -> (Cow<'_, [u8]>, bool) {
        if !self.kanji {
            return (Cow::Borrowed(self.data), false);
        }
        match to_shift_jis(self.data) {
            Some(sjis) => (Cow::Owned(sjis), true),
            None => {
                debug!("Input isn't ASCII and kanji in Shift JIS, kanji mode disabled");
                (Cow::Borrowed(self.data), false)
            }
        }
    }
}


#[cfg(test)]
mod builder_tests {
    use test_case::test_case;

    use super::QRBuilder;
    use crate::common::error::QRError;
    use crate::common::mask::MaskPattern;
    use crate::common::metadata::{ECLevel, Version};

    fn decode(img: &image::GrayImage) -> (usize, String) {
        let (w, h) = (img.width() as usize, img.height() as usize);
        let mut img = rqrr::PreparedImage::prepare_from_greyscale(w, h, |x, y| {
            img.get_pixel(x as u32, y as u32).0[0]
        });
        let grids = img.detect_grids();
        assert_eq!(grids.len(), 1);
        let (meta, content) = grids[0].decode().unwrap();
        (meta.version.0, content)
    }

    #[test_case("Hello, world!🌎".to_string(), Version(1), ECLevel::L)]
    #[test_case("TEST".to_string(), Version(1), ECLevel::M)]
    #[test_case("12345".to_string(), Version(1), ECLevel::Q)]
    #[test_case("OK".to_string(), Version(1), ECLevel::H)]
    #[test_case("B3@j🎮#Z%8v🍣K!🔑3zC^8📖&r💾F9*🔐b6🌼".repeat(3), Version(7), ECLevel::L)]
    #[test_case("A11111111111111".repeat(11), Version(7), ECLevel::M)]
    #[test_case("aAAAAAA1111111111111AAAAAAa".repeat(3), Version(7), ECLevel::Q)]
    #[test_case("1234567890".repeat(15), Version(7), ECLevel::H)]
    #[test_case("B3@j🎮#Z%8v🍣K!🔑3zC^8📖&r💾F9*🔐b6🌼".repeat(4), Version(10), ECLevel::L)]
    #[test_case("A11111111111111".repeat(20), Version(10), ECLevel::M)]
    #[test_case("aAAAAAAAAA1111111111111111AAAAAAAAAAa".repeat(4), Version(10), ECLevel::Q)]
    #[test_case("1234567890".repeat(28), Version(10), ECLevel::H)]
    #[test_case("B3@j🎮#Z%8v🍣K!🔑3zC^8📖&r💾F9*🔐b6🌼".repeat(22), Version(27), ECLevel::L)]
    #[test_case("A111111111111111".repeat(100), Version(27), ECLevel::M)]
    #[test_case("aAAAAAAAAA111111111111111111AAAAAAAAAAa".repeat(20), Version(27), ECLevel::Q)]
    #[test_case("1234567890".repeat(145), Version(27), ECLevel::H)]
    #[test_case("B3@j🎮#Z%8v🍣K!🔑3zC^8📖&r💾F9*🔐b6🌼".repeat(57), Version(40), ECLevel::L)]
    #[test_case("A111111111111111".repeat(97), Version(40), ECLevel::M)]
    #[test_case("aAAAAAAAAA111111111111111111AAAAAAAAAAa".repeat(42), Version(40), ECLevel::Q)]
    #[test_case("1234567890".repeat(305), Version(40), ECLevel::H)]
    fn test_builder(data: String, version: Version, ec_level: ECLevel) {
        let mut builder = QRBuilder::new(data.as_bytes());
        let qr = builder.version(version).ec_level(ec_level).build().unwrap();
        assert_eq!(qr.version(), version);
        assert_eq!(qr.ec_level(), ec_level);

        let (ver, content) = decode(&qr.to_image(10));
        assert_eq!(*version as usize, ver);
        assert_eq!(data, content);
    }

    #[test]
    fn test_builder_smallest_version() {
        let data = "HELLO WORLD";
        let qr = QRBuilder::new(data.as_bytes()).ec_level(ECLevel::Q).build().unwrap();
        assert_eq!(*qr.version(), 1);
        assert_eq!(qr.width(), 21);

        let (ver, content) = decode(&qr.to_image(8));
        assert_eq!(ver, 1);
        assert_eq!(content, data);
    }

    #[test]
    fn test_builder_forced_mask() {
        let data = "Hello, world!".as_bytes();
        for m in MaskPattern::all() {
            let qr = QRBuilder::new(data).mask(m).build().unwrap();
            assert_eq!(qr.mask(), Some(m));
            let (_, content) = decode(&qr.to_image(8));
            assert_eq!(content, "Hello, world!");
        }
    }

    #[test]
    fn test_builder_empty_data() {
        assert_eq!(QRBuilder::new(b"").build().unwrap_err(), QRError::InvalidInput);
        let res = QRBuilder::new(b"").version(Version(5)).build();
        assert_eq!(res.unwrap_err(), QRError::InvalidInput);
    }

    #[test]
    fn test_builder_data_overflow() {
        let data = "1234567890".repeat(306);
        let res = QRBuilder::new(data.as_bytes()).ec_level(ECLevel::H).build();
        assert_eq!(res.unwrap_err(), QRError::CapacityExceeded);
        // With the version forced, the version is what's at fault
        let res = QRBuilder::new(data.as_bytes()).version(Version(40)).ec_level(ECLevel::H).build();
        assert_eq!(res.unwrap_err(), QRError::InvalidVersion);

        let data = "1".repeat(7090);
        let res = QRBuilder::new(data.as_bytes()).ec_level(ECLevel::L).build();
        assert_eq!(res.unwrap_err(), QRError::CapacityExceeded);
    }

    #[test]
    fn test_builder_forced_version_too_small() {
        let data = "Hello, world! This won't fit in version 1".as_bytes();
        let res = QRBuilder::new(data).version(Version(1)).ec_level(ECLevel::H).build();
        assert_eq!(res.unwrap_err(), QRError::InvalidVersion);
        let qr = QRBuilder::new(data).version(Version(5)).ec_level(ECLevel::H).build().unwrap();
        assert_eq!(*qr.version(), 5);
    }

    #[test]
    fn test_builder_kanji() {
        let data = "点茗点茗点茗点茗";
        let plain = QRBuilder::new(data.as_bytes()).ec_level(ECLevel::H).build().unwrap();
        let mut builder = QRBuilder::new(data.as_bytes());
        let kanji = builder.ec_level(ECLevel::H).kanji(true).build().unwrap();
        // 24 bytes need 204 bits at H, 8 kanji need 116
        assert_eq!(*plain.version(), 3);
        assert_eq!(*kanji.version(), 2);
    }

    #[test_case("ｱ点"; "half width katakana")]
    #[test_case("café 点"; "latin accent")]
    fn test_builder_kanji_round_trip(data: &str) {
        let qr = QRBuilder::new(data.as_bytes()).kanji(true).build().unwrap();
        let (_, content) = decode(&qr.to_image(8));
        assert_eq!(content, data);
    }
}
