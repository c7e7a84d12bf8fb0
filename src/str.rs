//! `Str`: owned UTF-8 byte string with value semantics.
//!
//! Unlike `Slice`, a `Str` never aliases: cloning copies the bytes and every
//! mutating operation touches only its own buffer. The contents are not
//! required to be valid UTF-8; decoding helpers substitute `RUNE_ERROR` for
//! malformed bytes.
//!
//! Counted operations (`split`, `replace`) take `n`: negative means no limit,
//! zero returns the input unchanged, positive stops after `n` matches.

use crate::error::RuntimeError;
use crate::panic::Unwind;
use crate::slice::{try_vec, Slice};
use crate::utf16;
use crate::utf8::{self, Rune};
use core::borrow::Borrow;
use core::fmt;
use core::ops::{Add, AddAssign};

#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Str {
    bytes: Vec<u8>,
}

fn find_bytes(hay: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > hay.len() {
        return None;
    }
    hay.windows(needle.len()).position(|w| w == needle)
}

fn rfind_bytes(hay: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(hay.len());
    }
    if needle.len() > hay.len() {
        return None;
    }
    hay.windows(needle.len()).rposition(|w| w == needle)
}

impl Str {
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// The UTF-8 encoding of one rune.
    pub fn from_rune(r: Rune) -> Self {
        let (buf, n) = utf8::encode_rune(r);
        Self::from_bytes(&buf[..n])
    }

    pub fn from_runes(runes: &[Rune]) -> Self {
        let mut bytes = Vec::with_capacity(runes.len());
        for &r in runes {
            utf8::append_rune(&mut bytes, r);
        }
        Self { bytes }
    }

    /// Decode UTF-16 units; unpaired surrogates become `RUNE_ERROR`.
    pub fn from_utf16(units: &[u16]) -> Self {
        Self::from_runes(&utf16::decode(units))
    }

    /// Byte length.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// The contents as `&str` when they are valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.bytes).ok()
    }

    fn check_index(&self, index: isize) -> Result<usize, RuntimeError> {
        if index < 0 || index as usize >= self.bytes.len() {
            return Err(RuntimeError::IndexOutOfRange {
                index,
                len: self.bytes.len(),
            });
        }
        Ok(index as usize)
    }

    pub fn try_byte(&self, index: isize) -> Result<u8, RuntimeError> {
        let i = self.check_index(index)?;
        Ok(self.bytes[i])
    }

    pub fn byte(&self, index: isize) -> u8 {
        self.try_byte(index).or_throw()
    }

    pub fn try_set_byte(&mut self, index: isize, b: u8) -> Result<(), RuntimeError> {
        let i = self.check_index(index)?;
        self.bytes[i] = b;
        Ok(())
    }

    pub fn set_byte(&mut self, index: isize, b: u8) {
        self.try_set_byte(index, b).or_throw()
    }

    pub fn try_slice(&self, lo: isize, hi: isize) -> Result<Str, RuntimeError> {
        if lo < 0 || hi < 0 || lo > hi || hi as usize > self.bytes.len() {
            return Err(RuntimeError::SliceOutOfRange {
                start: lo,
                end: hi,
                cap: self.bytes.len(),
            });
        }
        Ok(Self::from_bytes(&self.bytes[lo as usize..hi as usize]))
    }

    /// Copy of bytes `[lo, hi)`.
    pub fn slice(&self, lo: isize, hi: isize) -> Str {
        self.try_slice(lo, hi).or_throw()
    }

    pub fn slice_from(&self, lo: isize) -> Str {
        self.slice(lo, self.bytes.len() as isize)
    }

    pub fn has_prefix(&self, prefix: impl AsRef<[u8]>) -> bool {
        self.bytes.starts_with(prefix.as_ref())
    }

    pub fn has_suffix(&self, suffix: impl AsRef<[u8]>) -> bool {
        self.bytes.ends_with(suffix.as_ref())
    }

    /// Byte offset of the first occurrence of `sub`, or -1.
    pub fn find(&self, sub: impl AsRef<[u8]>) -> isize {
        find_bytes(&self.bytes, sub.as_ref()).map_or(-1, |i| i as isize)
    }

    /// Byte offset of the last occurrence of `sub`, or -1.
    pub fn rfind(&self, sub: impl AsRef<[u8]>) -> isize {
        rfind_bytes(&self.bytes, sub.as_ref()).map_or(-1, |i| i as isize)
    }

    pub fn contains(&self, sub: impl AsRef<[u8]>) -> bool {
        find_bytes(&self.bytes, sub.as_ref()).is_some()
    }

    /// Strip leading bytes that appear in `set`.
    pub fn trim(&self, set: impl AsRef<[u8]>) -> Str {
        let set = set.as_ref();
        match self.bytes.iter().position(|b| !set.contains(b)) {
            Some(i) => Self::from_bytes(&self.bytes[i..]),
            None => Str::new(),
        }
    }

    /// Strip trailing bytes that appear in `set`.
    pub fn rtrim(&self, set: impl AsRef<[u8]>) -> Str {
        let set = set.as_ref();
        match self.bytes.iter().rposition(|b| !set.contains(b)) {
            Some(i) => Self::from_bytes(&self.bytes[..=i]),
            None => Str::new(),
        }
    }

    /// Split around `sep`.
    ///
    /// With `n < 0` every separator splits and a trailing empty piece is
    /// dropped. With `n > 0` at most `n` pieces are produced, the last
    /// holding the unsplit remainder. `n == 0` yields the input as the only
    /// piece. An empty `sep` splits into runes.
    pub fn split(&self, sep: impl AsRef<[u8]>, n: isize) -> Slice<Str> {
        let sep = sep.as_ref();
        if n == 0 {
            return Slice::from_vec(vec![self.clone()]);
        }
        if sep.is_empty() {
            return self.explode(n);
        }
        let mut parts = Vec::new();
        let mut rest: &[u8] = &self.bytes;
        if n < 0 {
            while let Some(pos) = find_bytes(rest, sep) {
                parts.push(Self::from_bytes(&rest[..pos]));
                rest = &rest[pos + sep.len()..];
            }
            if !rest.is_empty() {
                parts.push(Self::from_bytes(rest));
            }
            return Slice::from_vec(parts);
        }
        let mut count = 0;
        while let Some(pos) = find_bytes(rest, sep) {
            count += 1;
            if count >= n {
                break;
            }
            parts.push(Self::from_bytes(&rest[..pos]));
            rest = &rest[pos + sep.len()..];
        }
        parts.push(Self::from_bytes(rest));
        Slice::from_vec(parts)
    }

    fn explode(&self, n: isize) -> Slice<Str> {
        let mut parts = Vec::new();
        let mut rest: &[u8] = &self.bytes;
        while !rest.is_empty() {
            if n > 0 && parts.len() as isize == n - 1 {
                parts.push(Self::from_bytes(rest));
                break;
            }
            let (_, size) = utf8::decode_rune(rest);
            parts.push(Self::from_bytes(&rest[..size]));
            rest = &rest[size..];
        }
        Slice::from_vec(parts)
    }

    /// Replace occurrences of `old` with `new`, left to right. Replaced text
    /// is never rescanned. An empty `old` leaves the input unchanged.
    pub fn replace(&self, old: impl AsRef<[u8]>, new: impl AsRef<[u8]>, n: isize) -> Str {
        let (old, new) = (old.as_ref(), new.as_ref());
        if n == 0 || old.is_empty() {
            return self.clone();
        }
        let mut out = Vec::with_capacity(self.bytes.len());
        let mut start = 0;
        let mut count = 0;
        while let Some(pos) = find_bytes(&self.bytes[start..], old) {
            out.extend_from_slice(&self.bytes[start..start + pos]);
            out.extend_from_slice(new);
            start += pos + old.len();
            count += 1;
            if n > 0 && count >= n {
                break;
            }
        }
        out.extend_from_slice(&self.bytes[start..]);
        Self { bytes: out }
    }

    pub fn runes(&self) -> utf8::Runes<'_> {
        utf8::runes(&self.bytes)
    }

    pub fn rune_count(&self) -> usize {
        utf8::rune_count(&self.bytes)
    }

    /// `[]byte(s)`: a fresh slice holding a copy of the bytes.
    pub fn to_byte_slice(&self) -> Slice<u8> {
        Slice::from_vec(self.bytes.clone())
    }

    /// `[]rune(s)`.
    pub fn to_rune_slice(&self) -> Slice<Rune> {
        self.runes().collect()
    }

    /// UTF-16 encoding followed by a terminating NUL.
    pub fn to_utf16(&self) -> Vec<u16> {
        let mut out = Vec::with_capacity(self.bytes.len() + 1);
        for r in self.runes() {
            utf16::append_rune(&mut out, r);
        }
        out.push(0);
        out
    }

    pub fn try_push_str(&mut self, other: &Str) -> Result<(), RuntimeError> {
        self.bytes.try_reserve(other.bytes.len()).map_err(|_| {
            log::error!("string growth by {} bytes failed", other.bytes.len());
            RuntimeError::AllocationFailed
        })?;
        self.bytes.extend_from_slice(&other.bytes);
        Ok(())
    }

    pub fn try_concat(&self, other: &Str) -> Result<Str, RuntimeError> {
        let mut bytes = try_vec(self.bytes.len() + other.bytes.len())?;
        bytes.extend_from_slice(&self.bytes);
        bytes.extend_from_slice(&other.bytes);
        Ok(Self { bytes })
    }
}

/// Render any displayable value as a `Str`.
pub fn to_str<T: fmt::Display + ?Sized>(value: &T) -> Str {
    Str::from(value.to_string())
}

impl From<&str> for Str {
    fn from(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }
}

impl From<String> for Str {
    fn from(s: String) -> Self {
        Self {
            bytes: s.into_bytes(),
        }
    }
}

impl From<Vec<u8>> for Str {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl From<&[u8]> for Str {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<&Slice<u8>> for Str {
    fn from(s: &Slice<u8>) -> Self {
        Self { bytes: s.to_vec() }
    }
}

impl From<&Slice<Rune>> for Str {
    fn from(s: &Slice<Rune>) -> Self {
        s.read(Self::from_runes)
    }
}

impl AsRef<[u8]> for Str {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl Borrow<[u8]> for Str {
    fn borrow(&self) -> &[u8] {
        &self.bytes
    }
}

impl PartialEq<str> for Str {
    fn eq(&self, other: &str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl PartialEq<&str> for Str {
    fn eq(&self, other: &&str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl Add<&Str> for Str {
    type Output = Str;

    fn add(mut self, rhs: &Str) -> Str {
        self += rhs;
        self
    }
}

impl Add<&Str> for &Str {
    type Output = Str;

    fn add(self, rhs: &Str) -> Str {
        self.try_concat(rhs).or_throw()
    }
}

impl AddAssign<&Str> for Str {
    fn add_assign(&mut self, rhs: &Str) {
        self.try_push_str(rhs).or_throw()
    }
}

impl AddAssign<&str> for Str {
    fn add_assign(&mut self, rhs: &str) {
        *self += &Str::from(rhs);
    }
}

impl fmt::Display for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&String::from_utf8_lossy(&self.bytes), f)
    }
}

impl fmt::Debug for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&String::from_utf8_lossy(&self.bytes), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(s: &Slice<Str>) -> Vec<String> {
        s.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn split_unbounded_keeps_inner_empties() {
        let s = Str::from("a,b,,c");
        assert_eq!(parts(&s.split(",", -1)), ["a", "b", "", "c"]);
        assert_eq!(parts(&Str::from("a,b,").split(",", -1)), ["a", "b"]);
        assert!(Str::new().split(",", -1).is_nil());
    }

    #[test]
    fn split_bounded_keeps_remainder() {
        let s = Str::from("a,b,c,d");
        assert_eq!(parts(&s.split(",", 1)), ["a,b,c,d"]);
        assert_eq!(parts(&s.split(",", 2)), ["a", "b,c,d"]);
        assert_eq!(parts(&s.split(",", 9)), ["a", "b", "c", "d"]);
        assert_eq!(parts(&Str::from("abc").split(",", 3)), ["abc"]);
        assert_eq!(parts(&Str::from("a,").split(",", 5)), ["a", ""]);
    }

    #[test]
    fn split_zero_and_empty_separator() {
        let s = Str::from("héy");
        assert_eq!(parts(&s.split(",", 0)), ["héy"]);
        assert_eq!(parts(&s.split("", -1)), ["h", "é", "y"]);
        assert_eq!(parts(&s.split("", 2)), ["h", "éy"]);
    }

    #[test]
    fn replace_counts() {
        let s = Str::from("aaa");
        assert_eq!(s.replace("a", "b", 1), "baa");
        assert_eq!(s.replace("a", "b", -1), "bbb");
        assert_eq!(s.replace("a", "b", 0), "aaa");
        assert_eq!(s.replace("", "b", -1), "aaa");
        assert_eq!(s.replace("a", "aa", -1), "aaaaaa");
        assert_eq!(Str::from("xyx").replace("x", "", 5), "y");
    }

    #[test]
    fn find_and_affixes() {
        let s = Str::from("hello world");
        assert_eq!(s.find("o"), 4);
        assert_eq!(s.rfind("o"), 7);
        assert_eq!(s.find("z"), -1);
        assert_eq!(s.find(""), 0);
        assert_eq!(s.rfind(""), 11);
        assert!(s.has_prefix("hell"));
        assert!(s.has_suffix("world"));
        assert!(!s.has_prefix("world"));
    }

    #[test]
    fn trim_against_byte_set() {
        let s = Str::from("  \txy \n");
        assert_eq!(s.trim(" \t"), "xy \n");
        assert_eq!(s.rtrim(" \n"), "  \txy");
        assert_eq!(Str::from("aaa").trim("a"), "");
        assert_eq!(Str::from("aaa").rtrim("a"), "");
    }

    #[test]
    fn indexing_is_bounds_checked() {
        let mut s = Str::from("abc");
        assert_eq!(s.byte(1), b'b');
        s.set_byte(1, b'x');
        assert_eq!(s, "axc");
        assert_eq!(
            s.try_byte(3),
            Err(RuntimeError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert_eq!(s.slice(1, 3), "xc");
        assert!(s.try_slice(2, 1).is_err());
    }

    #[test]
    fn concatenation_copies() {
        let a = Str::from("ab");
        let mut b = a.clone();
        b += "cd";
        assert_eq!(a, "ab");
        assert_eq!(b, "abcd");
        assert_eq!(&a + &b, "ababcd");
        assert_eq!(a.clone() + &Str::from("!"), "ab!");
    }

    #[test]
    fn rune_and_utf16_conversions() {
        let s = Str::from("a€😀");
        let runes = s.to_rune_slice();
        assert_eq!(runes, [0x61, 0x20AC, 0x1F600]);
        assert_eq!(Str::from(&runes), s);
        let units = s.to_utf16();
        assert_eq!(units.last(), Some(&0));
        assert_eq!(Str::from_utf16(&units[..units.len() - 1]), s);
        assert_eq!(Str::from(&s.to_byte_slice()), s);
        assert_eq!(Str::from_rune(0xD800), "\u{FFFD}");
        assert_eq!(to_str(&3.5), "3.5");
    }
}
