use std::ops::Deref;

use rayon::prelude::*;
use tracing::{debug, trace};

use super::error::{QRError, QRResult};
use super::metadata::Color;
use crate::builder::QR;

// Mask pattern
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord, Hash)]
pub struct MaskPattern(u8);

impl MaskPattern {
    pub fn new(pattern: u8) -> QRResult<Self> {
        match pattern {
            0..=7 => Ok(Self(pattern)),
            _ => Err(QRError::InvalidMask),
        }
    }

    pub fn all() -> impl Iterator<Item = MaskPattern> {
        (0..8).map(MaskPattern)
    }
}

impl Deref for MaskPattern {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Mask functions take (row, column)
mod mask_functions {
    pub fn checkerboard(r: i16, c: i16) -> bool {
        (r + c) & 1 == 0
    }

    pub fn horizontal_lines(r: i16, _: i16) -> bool {
        r & 1 == 0
    }

    pub fn vertical_lines(_: i16, c: i16) -> bool {
        c % 3 == 0
    }

    pub fn diagonal_lines(r: i16, c: i16) -> bool {
        (r + c) % 3 == 0
    }

    pub fn large_checkerboard(r: i16, c: i16) -> bool {
        ((r >> 1) + (c / 3)) & 1 == 0
    }

    pub fn fields(r: i16, c: i16) -> bool {
        ((r * c) & 1) + ((r * c) % 3) == 0
    }

    pub fn diamonds(r: i16, c: i16) -> bool {
        (((r * c) & 1) + ((r * c) % 3)) & 1 == 0
    }

    pub fn meadow(r: i16, c: i16) -> bool {
        (((r + c) & 1) + ((r * c) % 3)) & 1 == 0
    }
}

impl MaskPattern {
    pub fn mask_functions(self) -> fn(i16, i16) -> bool {
        match *self {
            0b000 => mask_functions::checkerboard,
            0b001 => mask_functions::horizontal_lines,
            0b010 => mask_functions::vertical_lines,
            0b011 => mask_functions::diagonal_lines,
            0b100 => mask_functions::large_checkerboard,
            0b101 => mask_functions::fields,
            0b110 => mask_functions::diamonds,
            _ => mask_functions::meadow,
        }
    }
}


// Mask selection
//------------------------------------------------------------------------------

/// A masked copy of the symbol together with its penalty score.
#[derive(Debug, Clone)]
pub struct MaskCandidate {
    pub mask: MaskPattern,
    pub qr: QR,
    pub penalty: u32,
}

/// Applies each of the 8 masks to its own clone of `qr` and scores it.
/// Candidates come back ordered by mask index.
pub fn compute_candidates(qr: &QR) -> Vec<MaskCandidate> {
    let masks = MaskPattern::all().collect::<Vec<_>>();
    masks
        .into_par_iter()
        .map(|mask| {
            let mut qr = qr.clone();
            qr.apply_mask(mask);
            let penalty = compute_total_penalty(&qr);
            trace!(mask = *mask, penalty, "Scored mask candidate");
            MaskCandidate { mask, qr, penalty }
        })
        .collect()
}

/// Index of the lowest penalty candidate. Ties resolve to the lowest index.
pub fn select_best(candidates: &[MaskCandidate]) -> usize {
    candidates
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, u32)>, (i, cand)| match best {
            Some((_, pen)) if pen <= cand.penalty => best,
            _ => Some((i, cand.penalty)),
        })
        .map_or(0, |(i, _)| i)
}

pub fn apply_best_mask(qr: &mut QR) -> MaskPattern {
    let mut candidates = compute_candidates(qr);
    let best = select_best(&candidates);
    let winner = candidates.swap_remove(best);
    debug!(mask = *winner.mask, penalty = winner.penalty, "Selected mask");
    *qr = winner.qr;
    winner.mask
}

// Penalty
//------------------------------------------------------------------------------

pub fn compute_total_penalty(qr: &QR) -> u32 {
    let adj_pen = compute_adjacent_penalty(qr);
    let blk_pen = compute_block_penalty(qr);
    let fp_pen = compute_finder_pattern_penalty(qr);
    let bal_pen = compute_balance_penalty(qr);
    adj_pen + blk_pen + fp_pen + bal_pen
}

fn rows_and_cols(qr: &QR) -> impl Iterator<Item = Vec<Color>> + '_ {
    let w = qr.width() as i16;
    let rows = (0..w).map(move |r| (0..w).map(|c| qr.get(r, c).color()).collect::<Vec<_>>());
    let cols = (0..w).map(move |c| (0..w).map(|r| qr.get(r, c).color()).collect::<Vec<_>>());
    rows.chain(cols)
}

// N1
fn compute_adjacent_penalty(qr: &QR) -> u32 {
    rows_and_cols(qr).map(|line| run_penalty(&line)).sum()
}

fn run_penalty(line: &[Color]) -> u32 {
    let mut pen = 0;
    let mut run = 0;
    let mut last = None;
    for &clr in line {
        if last == Some(clr) {
            run += 1;
        } else {
            if run >= 5 {
                pen += run - 2;
            }
            last = Some(clr);
            run = 1;
        }
    }
    if run >= 5 {
        pen += run - 2;
    }
    pen
}

// N2
fn compute_block_penalty(qr: &QR) -> u32 {
    let w = qr.width() as i16;
    let clr = |r, c| qr.get(r, c).color();
    let uniform = |r, c| {
        let top_left = clr(r, c);
        [(r + 1, c), (r, c + 1), (r + 1, c + 1)].iter().all(|&(r, c)| clr(r, c) == top_left)
    };
    let blocks = (0..w - 1).flat_map(|r| (0..w - 1).map(move |c| (r, c)));
    blocks.filter(|&(r, c)| uniform(r, c)).count() as u32 * 3
}

// N3
fn compute_finder_pattern_penalty(qr: &QR) -> u32 {
    rows_and_cols(qr).map(|line| finder_like_penalty(&line)).sum()
}

static FINDER_LIKE: [Color; 7] =
    [Color::Dark, Color::Light, Color::Dark, Color::Dark, Color::Dark, Color::Light, Color::Dark];

fn finder_like_penalty(line: &[Color]) -> u32 {
    let w = line.len() as i32;
    // Modules outside the symbol are light
    let is_light = |i: i32| i < 0 || i >= w || line[i as usize] == Color::Light;

    let mut pen = 0;
    for (j, window) in line.windows(7).enumerate() {
        if window != FINDER_LIKE {
            continue;
        }
        let j = j as i32;
        if (j - 4..j).all(is_light) || (j + 7..j + 11).all(is_light) {
            pen += 40;
        }
    }
    pen
}

// N4
fn compute_balance_penalty(qr: &QR) -> u32 {
    let w = qr.width();
    balance_penalty(qr.count_dark_modules(), w * w)
}

// 10 per whole 5% step between the exact dark ratio and one half
fn balance_penalty(dark: usize, total: usize) -> u32 {
    let steps = (20 * dark).abs_diff(10 * total) / total;
    steps as u32 * 10
}

#[cfg(test)]
mod penalty_tests {
    use test_case::test_case;

    use super::{
        apply_best_mask, balance_penalty, compute_adjacent_penalty, compute_balance_penalty,
        compute_block_penalty, compute_candidates, compute_finder_pattern_penalty,
        compute_total_penalty, finder_like_penalty, run_penalty, select_best, MaskCandidate,
        MaskPattern,
    };
    use crate::builder::{Module, Role, QR};
    use crate::common::metadata::{Color, ECLevel, Version};

    fn line(s: &str) -> Vec<Color> {
        s.chars().map(|c| Color::from(c == '1')).collect()
    }

    fn checkerboard() -> QR {
        let mut qr = QR::new(Version(1), ECLevel::L);
        let w = qr.width() as i16;
        for r in 0..w {
            for c in 0..w {
                qr.set(r, c, Module::Placed(Role::Data, Color::from((r + c) % 2 == 0)));
            }
        }
        qr
    }

    #[test_case("1010101010", 0)]
    #[test_case("1111101010", 3)]
    #[test_case("0111111010", 4)]
    #[test_case("0000011111", 6)]
    #[test_case("1111111111", 8)]
    fn test_run_penalty(s: &str, exp: u32) {
        assert_eq!(run_penalty(&line(s)), exp);
    }

    #[test_case("00001011101", 40)]
    #[test_case("1011101", 40)]
    #[test_case("10111010000", 40)]
    #[test_case("0000101110100001011101", 80)]
    #[test_case("110111011", 0)]
    #[test_case("1011001", 0)]
    fn test_finder_like_penalty(s: &str, exp: u32) {
        assert_eq!(finder_like_penalty(&line(s)), exp);
    }

    #[test]
    fn test_all_light_grid() {
        let qr = QR::new(Version(1), ECLevel::L);
        assert_eq!(compute_adjacent_penalty(&qr), 42 * 19);
        assert_eq!(compute_block_penalty(&qr), 20 * 20 * 3);
        assert_eq!(compute_finder_pattern_penalty(&qr), 0);
        assert_eq!(compute_balance_penalty(&qr), 100);
        assert_eq!(compute_total_penalty(&qr), 2098);
    }

    #[test]
    fn test_checkerboard() {
        let qr = checkerboard();
        assert_eq!(compute_adjacent_penalty(&qr), 0);
        assert_eq!(compute_block_penalty(&qr), 0);
        assert_eq!(compute_finder_pattern_penalty(&qr), 0);
        assert_eq!(compute_balance_penalty(&qr), 0);
    }

    fn with_dark_prefix(dark: usize) -> QR {
        let mut qr = QR::new(Version(1), ECLevel::L);
        for i in 0..dark as i16 {
            qr.set(i / 21, i % 21, Module::Placed(Role::Data, Color::Dark));
        }
        qr
    }

    #[test]
    fn test_block_penalty_on_dark_square() {
        // A 3x3 dark square in a checkerboard holds the only 4 uniform blocks
        let mut qr = checkerboard();
        for r in 0..3 {
            for c in 0..3 {
                qr.set(r, c, Module::Placed(Role::Data, Color::Dark));
            }
        }
        assert_eq!(compute_block_penalty(&qr), 12);
        assert_eq!(compute_adjacent_penalty(&qr), 0);
    }

    #[test]
    fn test_block_penalty_single_dark_module() {
        let mut qr = QR::new(Version(1), ECLevel::L);
        qr.set(10, 10, Module::Placed(Role::Data, Color::Dark));
        assert_eq!(compute_block_penalty(&qr), (400 - 4) * 3);
        qr.set(0, 0, Module::Placed(Role::Data, Color::Dark));
        assert_eq!(compute_block_penalty(&qr), (400 - 5) * 3);
    }

    // Out of 441 modules: 198 is 44.9% dark, 199 is 45.1%, 242 is 54.9%
    #[test_case(199, 0)]
    #[test_case(198, 10)]
    #[test_case(221, 0)]
    #[test_case(242, 0)]
    #[test_case(243, 10)]
    #[test_case(155, 20)]
    #[test_case(0, 100)]
    fn test_balance_penalty_on_grid(dark: usize, exp: u32) {
        let qr = with_dark_prefix(dark);
        assert_eq!(qr.count_dark_modules(), dark);
        assert_eq!(compute_balance_penalty(&qr), exp);
    }

    #[test_case(455, 1000, 0; "45.5 percent")]
    #[test_case(450, 1000, 10; "exactly 45 percent")]
    #[test_case(449, 1000, 10; "just under 45 percent")]
    #[test_case(550, 1000, 10; "exactly 55 percent")]
    #[test_case(549, 1000, 0; "just under 55 percent")]
    #[test_case(400, 1000, 20; "exactly 40 percent")]
    #[test_case(1000, 1000, 100; "all dark")]
    fn test_balance_penalty(dark: usize, total: usize, exp: u32) {
        assert_eq!(balance_penalty(dark, total), exp);
    }

    #[test]
    fn test_checkerboard_with_run() {
        let mut qr = checkerboard();
        for c in 0..5 {
            qr.set(0, c, Module::Placed(Role::Data, Color::Dark));
        }
        assert_eq!(compute_adjacent_penalty(&qr), 3);
    }

    #[test]
    fn test_select_best_ties_to_lowest_index() {
        let qr = QR::new(Version(1), ECLevel::L);
        let candidates = [5, 3, 3, 7]
            .into_iter()
            .zip(MaskPattern::all())
            .map(|(penalty, mask)| MaskCandidate { mask, qr: qr.clone(), penalty })
            .collect::<Vec<_>>();
        assert_eq!(select_best(&candidates), 1);
    }

    #[test]
    fn test_candidates_in_mask_order() {
        let mut qr = checkerboard();
        qr.set(0, 0, Module::Placed(Role::Finder, Color::Dark));
        let candidates = compute_candidates(&qr);
        assert_eq!(candidates.len(), 8);
        for (i, cand) in candidates.iter().enumerate() {
            assert_eq!(*cand.mask, i as u8);
            assert_eq!(cand.qr.mask(), Some(cand.mask));
            assert_eq!(cand.penalty, compute_total_penalty(&cand.qr));
        }
    }

    #[test]
    fn test_apply_best_mask_is_idempotent() {
        let qr = checkerboard();
        let mut first = qr.clone();
        let mut second = qr.clone();
        let m1 = apply_best_mask(&mut first);
        let m2 = apply_best_mask(&mut second);
        assert_eq!(m1, m2);
        assert_eq!(first.grid(), second.grid());
        let best = compute_candidates(&qr).into_iter().map(|c| c.penalty).min().unwrap();
        assert_eq!(compute_total_penalty(&first), best);
    }
}
