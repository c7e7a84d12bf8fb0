//! UTF-16 surrogate-pair codec and the wide-string boundary.
//!
//! Decoding never fails: an unpaired surrogate becomes `RUNE_ERROR`.
//! Encoding splits code points at or above `0x10000` into a high/low pair;
//! surrogates and out-of-range values encode as `RUNE_ERROR`.

use crate::str::Str;
use crate::utf8::{Rune, MAX_RUNE, RUNE_ERROR};

const SURR1: Rune = 0xD800;
const SURR2: Rune = 0xDC00;
const SURR3: Rune = 0xE000;
const SURR_SELF: Rune = 0x10000;

#[inline]
pub fn is_high_surrogate(u: u16) -> bool {
    (SURR1..SURR2).contains(&(u as Rune))
}

#[inline]
pub fn is_low_surrogate(u: u16) -> bool {
    (SURR2..SURR3).contains(&(u as Rune))
}

/// Merge a high/low surrogate pair; anything else yields `RUNE_ERROR`.
pub fn decode_pair(r1: Rune, r2: Rune) -> Rune {
    if (SURR1..SURR2).contains(&r1) && (SURR2..SURR3).contains(&r2) {
        ((r1 - SURR1) << 10 | (r2 - SURR2)) + SURR_SELF
    } else {
        RUNE_ERROR
    }
}

/// Split `r` into a surrogate pair, or `(RUNE_ERROR, RUNE_ERROR)` when `r`
/// does not need one.
pub fn encode_pair(r: Rune) -> (Rune, Rune) {
    if !(SURR_SELF..=MAX_RUNE).contains(&r) {
        return (RUNE_ERROR, RUNE_ERROR);
    }
    let r = r - SURR_SELF;
    (SURR1 + ((r >> 10) & 0x3FF), SURR2 + (r & 0x3FF))
}

/// Decode UTF-16 units into runes. A merged pair yields one rune.
pub fn decode(units: &[u16]) -> Vec<Rune> {
    let mut out = Vec::with_capacity(units.len());
    let mut i = 0;
    while i < units.len() {
        let u = units[i];
        if !(SURR1..SURR3).contains(&(u as Rune)) {
            out.push(u as Rune);
        } else if is_high_surrogate(u) && i + 1 < units.len() && is_low_surrogate(units[i + 1]) {
            out.push(decode_pair(u as Rune, units[i + 1] as Rune));
            i += 1;
        } else {
            out.push(RUNE_ERROR);
        }
        i += 1;
    }
    out
}

/// Append the UTF-16 encoding of `r` to `out`.
pub fn append_rune(out: &mut Vec<u16>, r: Rune) {
    if (0..SURR1).contains(&r) || (SURR3..SURR_SELF).contains(&r) {
        out.push(r as u16);
    } else if (SURR_SELF..=MAX_RUNE).contains(&r) {
        let (r1, r2) = encode_pair(r);
        out.push(r1 as u16);
        out.push(r2 as u16);
    } else {
        out.push(RUNE_ERROR as u16);
    }
}

pub fn encode(runes: &[Rune]) -> Vec<u16> {
    let extra = runes.iter().filter(|&&r| r >= SURR_SELF).count();
    let mut out = Vec::with_capacity(runes.len() + extra);
    for &r in runes {
        append_rune(&mut out, r);
    }
    out
}

/// A producer of raw UTF-16 text, such as an OS wide string.
pub trait Utf16Source {
    fn utf16_units(&self) -> Vec<u16>;

    /// Decode the units into a `Str`, stopping at the first NUL if any.
    fn to_str(&self) -> Str {
        let units = self.utf16_units();
        let end = units.iter().position(|&u| u == 0).unwrap_or(units.len());
        Str::from_utf16(&units[..end])
    }
}

impl Utf16Source for [u16] {
    fn utf16_units(&self) -> Vec<u16> {
        self.to_vec()
    }
}

impl Utf16Source for Vec<u16> {
    fn utf16_units(&self) -> Vec<u16> {
        self.clone()
    }
}

#[cfg(windows)]
impl Utf16Source for std::ffi::OsStr {
    fn utf16_units(&self) -> Vec<u16> {
        use std::os::windows::ffi::OsStrExt;
        self.encode_wide().collect()
    }
}
