// Mode
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum Mode {
    Numeric = 0b0001,
    Alphanumeric = 0b0010,
    Byte = 0b0100,
    Kanji = 0b1000,
}

impl Mode {
    #[inline]
    fn numeric_digit(char: u8) -> u16 {
        debug_assert!(Mode::Numeric.contains(char), "Invalid numeric data: {char}");
        (char - b'0') as u16
    }

    #[inline]
    fn alphanumeric_digit(char: u8) -> u16 {
        debug_assert!(Mode::Alphanumeric.contains(char), "Invalid alphanumeric data: {char}");
        match char {
            b'0'..=b'9' => (char - b'0') as u16,
            b'A'..=b'Z' => (char - b'A' + 10) as u16,
            b' ' => 36,
            b'$' => 37,
            b'%' => 38,
            b'*' => 39,
            b'+' => 40,
            b'-' => 41,
            b'.' => 42,
            b'/' => 43,
            b':' => 44,
            _ => unreachable!("Invalid alphanumeric {char}"),
        }
    }

    // Shift JIS pair to its 13 bit kanji value
    #[inline]
    fn kanji_value(lead: u8, trail: u8) -> u16 {
        debug_assert!(is_kanji_pair(lead, trail), "Invalid kanji data: {lead:#x}{trail:02x}");
        let sjis = u16::from_be_bytes([lead, trail]);
        let offset = if sjis <= 0x9FFC { sjis - 0x8140 } else { sjis - 0xC140 };
        (offset >> 8) * 0xC0 + (offset & 0xFF)
    }

    pub fn encode_chunk(&self, data: &[u8]) -> u16 {
        let len = data.len();
        match self {
            Self::Numeric => {
                debug_assert!(len <= 3, "Data is too long for numeric conver: {len}");
                data.iter().fold(0_u16, |n, b| n * 10 + Self::numeric_digit(*b))
            }
            Self::Alphanumeric => {
                debug_assert!(len <= 2, "Data is too long for alphanumeric conver: {len}");
                data.iter().fold(0_u16, |n, b| n * 45 + Self::alphanumeric_digit(*b))
            }
            Self::Byte => {
                debug_assert!(len == 1, "Data is too long for byte conver: {len}");
                data[0] as u16
            }
            Self::Kanji => {
                debug_assert!(len == 2, "Kanji chunk must be a double byte pair: {len}");
                Self::kanji_value(data[0], data[1])
            }
        }
    }

    /// Whether a single byte character can be encoded in this mode. Kanji
    /// characters are byte pairs, see [`Mode::char_cost`].
    pub fn contains(&self, byte: u8) -> bool {
        match self {
            Self::Numeric => byte.is_ascii_digit(),
            Self::Alphanumeric => {
                byte.is_ascii_digit() || byte.is_ascii_uppercase() || b" $%*+-./:".contains(&byte)
            }
            Self::Byte => true,
            Self::Kanji => false,
        }
    }

    /// Cost of one character unit in sixths of a bit, or None if the unit
    /// can't be encoded in this mode.
    pub fn char_cost(&self, unit: &[u8]) -> Option<usize> {
        match (self, unit) {
            (Self::Numeric, &[b]) if self.contains(b) => Some(20),
            (Self::Alphanumeric, &[b]) if self.contains(b) => Some(33),
            (Self::Byte, _) => Some(48 * unit.len()),
            (Self::Kanji, &[lead, trail]) if is_kanji_pair(lead, trail) => Some(78),
            _ => None,
        }
    }

    /// Bit length of `len` bytes of data in this mode.
    pub fn encoded_len(&self, len: usize) -> usize {
        match *self {
            Self::Numeric => (len * 10).div_ceil(3),
            Self::Alphanumeric => (len * 11).div_ceil(2),
            Self::Byte => len * 8,
            Self::Kanji => (len / 2) * 13,
        }
    }
}

/// Shift JIS double byte character in the ranges encodable in kanji mode.
pub fn is_kanji_pair(lead: u8, trail: u8) -> bool {
    let sjis = u16::from_be_bytes([lead, trail]);
    let in_range = (0x8140..=0x9FFC).contains(&sjis) || (0xE040..=0xEBBF).contains(&sjis);
    in_range && (0x40..=0xFC).contains(&trail) && trail != 0x7F
}

/// Shift JIS lead byte of a double byte character.
pub fn is_sjis_lead(byte: u8) -> bool {
    matches!(byte, 0x81..=0x9F | 0xE0..=0xFC)
}


// Segment
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub mode: Mode,
    pub mode_bits: usize, // Bit len of mode
    pub len_bits: usize,  // Bit len of char count
    pub data: &'a [u8],   // Reference to raw data
}

impl<'a> Segment<'a> {
    pub fn new(mode: Mode, mode_bits: usize, len_bits: usize, data: &'a [u8]) -> Self {
        Self { mode, mode_bits, len_bits, data }
    }

    /// Kanji counts double byte characters, every other mode counts bytes.
    pub fn char_count(&self) -> usize {
        match self.mode {
            Mode::Kanji => self.data.len() / 2,
            _ => self.data.len(),
        }
    }

    pub fn bit_len(&self) -> usize {
        let encoded_bits = self.mode.encoded_len(self.data.len());
        self.mode_bits + self.len_bits + encoded_bits
    }
}


// Global constants
//------------------------------------------------------------------------------

pub static PADDING_CODEWORDS: [u8; 2] = [0b1110_1100, 0b0001_0001];

pub static MODES: [Mode; 4] = [Mode::Numeric, Mode::Alphanumeric, Mode::Byte, Mode::Kanji];
