use std::mem::swap;

use encoding_rs::SHIFT_JIS;
use tracing::debug;

use super::types::{is_kanji_pair, is_sjis_lead, Mode, Segment, MODES};
use super::writer::{close_stream, write_segment};
use crate::common::bitstream::BitStream;
use crate::common::error::{QRError, QRResult};
use crate::common::metadata::{ECLevel, Version};

// Encoder
//------------------------------------------------------------------------------

// Numeric capacity of version 40 at level L. No longer input fits any symbol.
static MAX_CHAR_COUNT: usize = 7089;

fn check_len(data: &[u8]) -> QRResult<()> {
    if data.is_empty() {
        return Err(QRError::InvalidInput);
    }
    if data.len() > MAX_CHAR_COUNT {
        debug!(len = data.len(), max = MAX_CHAR_COUNT, "Data longer than any symbol holds");
        return Err(QRError::CapacityExceeded);
    }
    Ok(())
}

/// Encodes data into the smallest version that fits at the given EC level.
/// The returned stream is padded to the full data capacity of that version.
pub fn encode(data: &[u8], ecl: ECLevel, kanji: bool) -> QRResult<(BitStream, Version)> {
    check_len(data)?;
    let units = char_units(data, kanji);
    let (ver, segs) = find_optimal_version_and_segments(data, &units, ecl)?;
    Ok((write_segments(segs, ver, ecl), ver))
}

/// Encodes data into the given version. Data that doesn't fit is an
/// [`QRError::InvalidVersion`], the version being the setting at fault.
pub fn encode_with_version(
    data: &[u8],
    ver: Version,
    ecl: ECLevel,
    kanji: bool,
) -> QRResult<BitStream> {
    check_len(data)?;
    let units = char_units(data, kanji);
    let segs = compute_optimal_segments(data, &units, ver);
    let sz: usize = segs.iter().map(|s| s.bit_len()).sum();
    let bcap = ver.data_bit_capacity(ecl);
    if sz > bcap {
        debug!(version = *ver, ?ecl, bits = sz, capacity = bcap, "Data doesn't fit forced version");
        return Err(QRError::InvalidVersion);
    }
    Ok(write_segments(segs, ver, ecl))
}

fn write_segments(segs: Vec<Segment>, ver: Version, ecl: ECLevel) -> BitStream {
    debug!(
        version = *ver,
        segments = ?segs.iter().map(|s| (s.mode, s.char_count())).collect::<Vec<_>>(),
        "Segmented data"
    );
    let mut bs = BitStream::new(ver.data_bit_capacity(ecl));
    segs.iter().for_each(|seg| write_segment(seg, &mut bs));
    close_stream(&mut bs);
    debug_assert_eq!(bs.len(), bs.capacity(), "Stream not filled for version {ver}");
    bs
}

/// Transcodes UTF-8 text to Shift JIS. None if the data isn't UTF-8, or if
/// any character becomes something other than ASCII or a kanji mode pair.
/// Other Shift JIS bytes, such as half width katakana, would end up in byte
/// segments that readers decode as UTF-8.
pub fn to_shift_jis(data: &[u8]) -> Option<Vec<u8>> {
    let text = std::str::from_utf8(data).ok()?;
    let (sjis, _, had_errors) = SHIFT_JIS.encode(text);
    if had_errors || !is_ascii_or_kanji(&sjis) {
        return None;
    }
    Some(sjis.into_owned())
}

fn is_ascii_or_kanji(sjis: &[u8]) -> bool {
    let mut i = 0;
    while i < sjis.len() {
        match sjis[i] {
            b if b.is_ascii() => i += 1,
            lead if i + 1 < sjis.len() && is_kanji_pair(lead, sjis[i + 1]) => i += 2,
            _ => return false,
        }
    }
    true
}

// Splits data into character units. With kanji enabled a Shift JIS double
// byte character is one unit, otherwise every byte is.
fn char_units(data: &[u8], kanji: bool) -> Vec<&[u8]> {
    if !kanji {
        return data.chunks(1).collect();
    }
    let mut units = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        let len = if is_sjis_lead(data[i]) && i + 1 < data.len() { 2 } else { 1 };
        units.push(&data[i..i + len]);
        i += len;
    }
    units
}

fn find_optimal_version_and_segments<'a>(
    data: &'a [u8],
    units: &[&[u8]],
    ecl: ECLevel,
) -> QRResult<(Version, Vec<Segment<'a>>)> {
    let mut segs = vec![];
    let mut sz = 0;
    for ver in Version::all() {
        let bcap = ver.data_bit_capacity(ecl);
        // Char count indicator widths change at versions 10 and 27
        if matches!(*ver, 1 | 10 | 27) {
            segs = compute_optimal_segments(data, units, ver);
            sz = segs.iter().map(|s| s.bit_len()).sum();
        }
        if sz <= bcap {
            debug!(version = *ver, ?ecl, bits = sz, capacity = bcap, "Selected version");
            return Ok((ver, segs));
        }
    }
    debug!(?ecl, bits = sz, "Data exceeds capacity of version 40");
    Err(QRError::CapacityExceeded)
}

// Dynamic programming to compute optimum mode segments. Costs are in sixths
// of a bit so numeric and alphanumeric chars have integral costs.
fn compute_optimal_segments<'a>(data: &'a [u8], units: &[&[u8]], ver: Version) -> Vec<Segment<'a>> {
    debug_assert!(!units.is_empty(), "Empty data");

    let len = units.len();
    let mut prev_cost = [0usize; 4];
    MODES.iter().enumerate().for_each(|(i, &m)| prev_cost[i] = (4 + ver.char_cnt_bits(m)) * 6);
    let mut cur_cost = [usize::MAX; 4];
    let mut min_path = vec![[usize::MAX; 4]; len];
    for (i, unit) in units.iter().enumerate() {
        for (j, to_mode) in MODES.iter().enumerate() {
            let Some(encoded_char_size) = to_mode.char_cost(unit) else {
                continue;
            };
            for (k, from_mode) in MODES.iter().enumerate() {
                if prev_cost[k] == usize::MAX {
                    continue;
                }
                let mut cost = 0;
                if to_mode != from_mode {
                    cost += prev_cost[k].div_ceil(6) * 6;
                    cost += (4 + ver.char_cnt_bits(*to_mode)) * 6;
                } else {
                    cost += prev_cost[k];
                }
                cost += encoded_char_size;
                if cost < cur_cost[j] {
                    cur_cost[j] = cost;
                    min_path[i][j] = k;
                }
            }
        }
        swap(&mut prev_cost, &mut cur_cost);
        cur_cost.fill(usize::MAX);
    }

    let char_modes = trace_optimal_modes(min_path, prev_cost);
    build_segments(ver, char_modes, units, data)
}

// Backtrack min_path and identify optimal char mode
fn trace_optimal_modes(min_path: Vec<[usize; 4]>, prev_cost: [usize; 4]) -> Vec<Mode> {
    let len = min_path.len();
    let mut mode_index = 0;
    for i in 1..4 {
        if prev_cost[i] < prev_cost[mode_index] {
            mode_index = i;
        }
    }
    (0..len)
        .rev()
        .scan(mode_index, |mi, i| {
            let old_mi = *mi;
            *mi = min_path[i][*mi];
            Some(MODES[old_mi])
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect()
}

// Merges consecutive units of the same mode into segments. Units are
// contiguous in data, so a segment borrows one slice spanning its units.
fn build_segments<'a>(
    ver: Version,
    char_modes: Vec<Mode>,
    units: &[&[u8]],
    data: &'a [u8],
) -> Vec<Segment<'a>> {
    let mode_bits = ver.mode_bits();
    let mut segs: Vec<Segment> = vec![];
    let mut seg_start = 0;
    let mut offset = 0;
    let mut seg_mode = char_modes[0];
    for (&m, unit) in char_modes.iter().zip(units) {
        if seg_mode != m {
            let len_bits = ver.char_cnt_bits(seg_mode);
            segs.push(Segment::new(seg_mode, mode_bits, len_bits, &data[seg_start..offset]));
            seg_mode = m;
            seg_start = offset;
        }
        offset += unit.len();
    }
    let len_bits = ver.char_cnt_bits(seg_mode);
    segs.push(Segment::new(seg_mode, mode_bits, len_bits, &data[seg_start..offset]));

    segs
}
