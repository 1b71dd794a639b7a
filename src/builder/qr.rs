use std::iter;

use image::{GrayImage, Luma};

use crate::common::bitstream::BitStream;
use crate::common::error::{QRError, QRResult};
use crate::common::iter::EncRegionIter;
use crate::common::mask::MaskPattern;
use crate::common::metadata::{format_info, Color, ECLevel, Version};

// Module
//------------------------------------------------------------------------------

/// The part of the symbol a module belongs to.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Role {
    Finder,
    Separator,
    Timing,
    Alignment,
    FixedDark,
    Format,
    Version,
    Data,
}

/// One cell of the symbol: empty until a pattern or a payload bit claims it,
/// then tagged with its role and colour.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Module {
    Empty,
    Placed(Role, Color),
}

impl Module {
    /// Empty modules read as light.
    pub fn color(self) -> Color {
        match self {
            Self::Empty => Color::Light,
            Self::Placed(_, clr) => clr,
        }
    }

    pub fn role(self) -> Option<Role> {
        match self {
            Self::Empty => None,
            Self::Placed(role, _) => Some(role),
        }
    }
}

// Timing and alignment patterns cross on row and column 6 with matching colours
fn shares_module(a: Role, b: Role) -> bool {
    matches!((a, b), (Role::Timing, Role::Alignment) | (Role::Alignment, Role::Timing))
}

// QR
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QR {
    grid: Vec<Module>,
    w: usize,
    ver: Version,
    ecl: ECLevel,
    mask: Option<MaskPattern>,
}

impl QR {
    pub fn new(ver: Version, ecl: ECLevel) -> Self {
        let w = ver.width();
        Self { grid: vec![Module::Empty; w * w], w, ver, ecl, mask: None }
    }

    /// Modules in row-major order.
    pub fn grid(&self) -> &[Module] {
        &self.grid
    }

    pub fn version(&self) -> Version {
        self.ver
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn ec_level(&self) -> ECLevel {
        self.ecl
    }

    pub fn mask(&self) -> Option<MaskPattern> {
        self.mask
    }

    pub fn count_dark_modules(&self) -> usize {
        self.grid.iter().filter(|m| m.color() == Color::Dark).count()
    }

    /// Module at row `r`, column `c`.
    ///
    /// Both coordinates accept `-width..width`. A negative coordinate counts
    /// back from the bottom or right edge, so `get(-1, -1)` is the bottom
    /// right module.
    ///
    /// # Panics
    ///
    /// Panics if either coordinate is outside `-width..width`.
    pub fn get(&self, r: i16, c: i16) -> Module {
        self.grid[self.index(r, c)]
    }

    fn index(&self, r: i16, c: i16) -> usize {
        let w = self.w as i16;
        assert!((-w..w).contains(&r), "Row {r} outside symbol of width {w}");
        assert!((-w..w).contains(&c), "Column {c} outside symbol of width {w}");
        r.rem_euclid(w) as usize * self.w + c.rem_euclid(w) as usize
    }

    // Claims an empty module. Claiming a taken one is an overrun unless
    // the two patterns share it.
    fn place(&mut self, r: i16, c: i16, role: Role, clr: Color) -> QRResult<()> {
        let idx = self.index(r, c);
        match self.grid[idx] {
            Module::Empty => self.grid[idx] = Module::Placed(role, clr),
            Module::Placed(taken, taken_clr) if taken_clr == clr && shares_module(taken, role) => {}
            _ => return Err(QRError::PlacementOverrun),
        }
        Ok(())
    }

    // Changes the colour of a placed module, keeping its role
    fn recolor(&mut self, r: i16, c: i16, clr: Color) {
        let idx = self.index(r, c);
        if let Module::Placed(role, _) = self.grid[idx] {
            self.grid[idx] = Module::Placed(role, clr);
        }
    }

    #[cfg(test)]
    pub(crate) fn set(&mut self, r: i16, c: i16, module: Module) {
        let idx = self.index(r, c);
        self.grid[idx] = module;
    }

    #[cfg(test)]
    fn count_role(&self, role: Role) -> usize {
        self.grid.iter().filter(|m| m.role() == Some(role)).count()
    }
}


// Function patterns
//------------------------------------------------------------------------------

impl QR {
    /// Places the finder, separator, timing and alignment patterns, the fixed
    /// dark module, the reserved format area and, from version 7, the version
    /// information. Fails with [`QRError::PlacementOverrun`] if two patterns
    /// collide.
    pub fn draw_function_patterns(&mut self) -> QRResult<()> {
        let far = self.w as i16 - 4;
        for (r, c) in [(3, 3), (3, far), (far, 3)] {
            self.draw_finder(r, c)?;
        }
        self.draw_timing()?;
        self.place(-8, 8, Role::FixedDark, Color::Dark)?;
        self.draw_alignments()?;
        self.reserve_format_area()?;
        self.draw_version_info()
    }

    // 7x7 finder centred at (r, c) with its light ring clipped to the symbol
    fn draw_finder(&mut self, r: i16, c: i16) -> QRResult<()> {
        let w = self.w as i16;
        for dr in -4..=4_i16 {
            for dc in -4..=4_i16 {
                let (mr, mc) = (r + dr, c + dc);
                if !(0..w).contains(&mr) || !(0..w).contains(&mc) {
                    continue;
                }
                let (role, clr) = match dr.abs().max(dc.abs()) {
                    4 => (Role::Separator, Color::Light),
                    2 => (Role::Finder, Color::Light),
                    _ => (Role::Finder, Color::Dark),
                };
                self.place(mr, mc, role, clr)?;
            }
        }
        Ok(())
    }

    fn draw_timing(&mut self) -> QRResult<()> {
        for i in 8..self.w as i16 - 8 {
            let clr = Color::from(i % 2 == 0);
            self.place(6, i, Role::Timing, clr)?;
            self.place(i, 6, Role::Timing, clr)?;
        }
        Ok(())
    }

    fn draw_alignments(&mut self) -> QRResult<()> {
        let centres = self.ver.alignment_pattern();
        for &r in centres {
            for &c in centres {
                // Three centres fall on finder patterns
                if matches!(self.get(r, c).role(), Some(Role::Finder | Role::Separator)) {
                    continue;
                }
                for dr in -2..=2_i16 {
                    for dc in -2..=2_i16 {
                        let clr = Color::from(dr.abs().max(dc.abs()) != 1);
                        self.place(r + dr, c + dc, Role::Alignment, clr)?;
                    }
                }
            }
        }
        Ok(())
    }
}


// Format & version info
//------------------------------------------------------------------------------

static FORMAT_INFO_BITS: i16 = 15;

static VERSION_INFO_BITS: i16 = 18;

// Both positions of format bit i, least significant first. The first copy
// wraps around the top left finder, the second is split between the other two.
fn format_info_coords(w: i16, i: i16) -> [(i16, i16); 2] {
    let first = match i {
        0..=5 => (i, 8),
        6 => (7, 8),
        7 => (8, 8),
        8 => (8, 7),
        _ => (8, 14 - i),
    };
    let second = if i < 8 { (8, w - 1 - i) } else { (w - 15 + i, 8) };
    [first, second]
}

// Both positions of version bit i: a 6x3 block left of the top right finder
// and its transpose above the bottom left one
fn version_info_coords(w: i16, i: i16) -> [(i16, i16); 2] {
    let (a, b) = (i / 3, w - 11 + i % 3);
    [(a, b), (b, a)]
}

impl QR {
    fn reserve_format_area(&mut self) -> QRResult<()> {
        let w = self.w as i16;
        for i in 0..FORMAT_INFO_BITS {
            for (r, c) in format_info_coords(w, i) {
                self.place(r, c, Role::Format, Color::Light)?;
            }
        }
        Ok(())
    }

    fn draw_format_info(&mut self, info: u32) {
        let w = self.w as i16;
        for i in 0..FORMAT_INFO_BITS {
            let clr = Color::from(info >> i & 1 == 1);
            for (r, c) in format_info_coords(w, i) {
                self.recolor(r, c, clr);
            }
        }
    }

    fn draw_version_info(&mut self) -> QRResult<()> {
        if *self.ver < 7 {
            return Ok(());
        }
        let (w, info) = (self.w as i16, self.ver.info());
        for i in 0..VERSION_INFO_BITS {
            let clr = Color::from(info >> i & 1 == 1);
            for (r, c) in version_info_coords(w, i) {
                self.place(r, c, Role::Version, clr)?;
            }
        }
        Ok(())
    }

    // Reads bits back from one copy, most significant first
    fn read_info(&self, bits: i16, coords: impl Fn(i16) -> (i16, i16)) -> u32 {
        (0..bits).rev().fold(0, |acc, i| {
            let (r, c) = coords(i);
            (acc << 1) | (self.get(r, c).color() == Color::Dark) as u32
        })
    }

    /// Format information as read from the copy around the top left finder.
    pub fn read_format_info(&self) -> u32 {
        let w = self.w as i16;
        self.read_info(FORMAT_INFO_BITS, |i| format_info_coords(w, i)[0])
    }

    /// Version information as read from the copy beside the top right finder.
    /// All zeros below version 7.
    pub fn read_version_info(&self) -> u32 {
        let w = self.w as i16;
        self.read_info(VERSION_INFO_BITS, |i| version_info_coords(w, i)[0])
    }
}


// Encoding region
//------------------------------------------------------------------------------

impl QR {
    /// Walks the payload into the free modules in placement order. The payload
    /// must cover every free module exactly, otherwise the result is
    /// [`QRError::PlacementOverrun`].
    pub fn draw_encoding_region(&mut self, payload: &BitStream) -> QRResult<()> {
        let mut free =
            EncRegionIter::new(self.ver).filter(|&(r, c)| self.get(r, c) == Module::Empty);
        let coords = free.by_ref().take(payload.len()).collect::<Vec<_>>();
        let leftover = free.next().is_some();
        if coords.len() < payload.len() || leftover {
            return Err(QRError::PlacementOverrun);
        }
        for ((r, c), bit) in coords.into_iter().zip(payload.bits()) {
            self.place(r, c, Role::Data, Color::from(bit))?;
        }
        Ok(())
    }

    /// Flips the data modules selected by the pattern and writes the matching
    /// format information.
    pub fn apply_mask(&mut self, pattern: MaskPattern) {
        let mask_fn = pattern.mask_functions();
        let w = self.w as i16;
        for r in 0..w {
            for c in 0..w {
                if let Module::Placed(Role::Data, clr) = self.get(r, c) {
                    if mask_fn(r, c) {
                        self.recolor(r, c, !clr);
                    }
                }
            }
        }
        self.mask = Some(pattern);
        self.draw_format_info(format_info(self.ecl, pattern));
    }
}

#[cfg(test)]
mod encoding_region_tests {
    use super::{Module, Role, QR};
    use crate::common::bitstream::BitStream;
    use crate::common::error::QRError;
    use crate::common::iter::EncRegionIter;
    use crate::common::mask::MaskPattern;
    use crate::common::metadata::{Color, ECLevel, Version};

    fn payload(bits: usize) -> BitStream {
        let mut bs = BitStream::new(bits);
        (0..bits).for_each(|i| bs.push(i % 3 == 0));
        bs
    }

    fn prepared(ver: Version) -> QR {
        let mut qr = QR::new(ver, ECLevel::M);
        qr.draw_function_patterns().unwrap();
        qr
    }

    fn module_bits(ver: Version) -> usize {
        ver.total_codewords() * 8 + ver.remainder_bits()
    }

    #[test]
    fn test_fills_every_free_module() {
        for ver in Version::all() {
            let mut qr = prepared(ver);
            qr.draw_encoding_region(&payload(module_bits(ver))).unwrap();
            assert!(!qr.grid().contains(&Module::Empty), "Version {ver}");
            assert_eq!(qr.count_role(Role::Data), module_bits(ver));
        }
    }

    #[test]
    fn test_placement_order() {
        let ver = Version(1);
        let mut qr = prepared(ver);
        qr.draw_encoding_region(&payload(module_bits(ver))).unwrap();
        let placed = EncRegionIter::new(ver)
            .filter_map(|(r, c)| match qr.get(r, c) {
                Module::Placed(Role::Data, clr) => Some(clr == Color::Dark),
                _ => None,
            })
            .collect::<Vec<_>>();
        let exp = (0..module_bits(ver)).map(|i| i % 3 == 0).collect::<Vec<_>>();
        assert_eq!(placed, exp);
    }

    #[test]
    fn test_short_payload_is_rejected() {
        let ver = Version(2);
        let mut qr = prepared(ver);
        let res = qr.draw_encoding_region(&payload(ver.total_codewords() * 8));
        assert_eq!(res, Err(QRError::PlacementOverrun));
        assert_eq!(qr.count_role(Role::Data), 0);
    }

    #[test]
    fn test_long_payload_is_rejected() {
        let ver = Version(1);
        let mut qr = prepared(ver);
        let res = qr.draw_encoding_region(&payload(module_bits(ver) + 1));
        assert_eq!(res, Err(QRError::PlacementOverrun));
    }

    #[test]
    fn test_payload_without_function_patterns_is_rejected() {
        let ver = Version(1);
        let mut qr = QR::new(ver, ECLevel::M);
        let res = qr.draw_encoding_region(&payload(module_bits(ver)));
        assert_eq!(res, Err(QRError::PlacementOverrun));
    }

    #[test]
    fn test_mask_touches_only_data() {
        let ver = Version(7);
        let mut qr = prepared(ver);
        qr.draw_encoding_region(&payload(module_bits(ver))).unwrap();
        let before = qr.clone();
        qr.apply_mask(MaskPattern::new(0).unwrap());
        let w = ver.width() as i16;
        for r in 0..w {
            for c in 0..w {
                match (before.get(r, c), qr.get(r, c)) {
                    (Module::Placed(Role::Data, a), Module::Placed(Role::Data, b)) => {
                        assert_eq!(a != b, (r + c) % 2 == 0)
                    }
                    (Module::Placed(Role::Format, _), Module::Placed(Role::Format, _)) => {}
                    (a, b) => assert_eq!(a, b),
                }
            }
        }
    }
}

// Render
//------------------------------------------------------------------------------

static QUIET_ZONE: usize = 4;

impl QR {
    // Colour under a pixel of the rendered symbol, quiet zone included
    fn pixel_color(&self, x: usize, y: usize, scale: usize) -> Color {
        let inside = |p: usize| (QUIET_ZONE..QUIET_ZONE + self.w).contains(&(p / scale));
        if !inside(x) || !inside(y) {
            return Color::Light;
        }
        let (r, c) = (y / scale - QUIET_ZONE, x / scale - QUIET_ZONE);
        self.grid[r * self.w + c].color()
    }

    fn rendered_width(&self, scale: usize) -> usize {
        (self.w + 2 * QUIET_ZONE) * scale
    }

    /// Renders to text for dark terminal backgrounds: light modules and the
    /// quiet zone are `█`, dark modules are blank.
    pub fn to_str(&self, module_sz: usize) -> String {
        let side = self.rendered_width(module_sz);
        (0..side)
            .flat_map(|y| {
                (0..side)
                    .map(move |x| self.pixel_color(x, y, module_sz).select(' ', '█'))
                    .chain(iter::once('\n'))
            })
            .collect()
    }

    /// Renders black modules on white with a 4 module quiet zone.
    pub fn to_image(&self, module_sz: u32) -> GrayImage {
        let scale = module_sz as usize;
        let side = self.rendered_width(scale) as u32;
        GrayImage::from_fn(side, side, |x, y| {
            Luma([self.pixel_color(x as usize, y as usize, scale).select(0, 255)])
        })
    }
}
