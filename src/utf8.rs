//! UTF-8 rune codec.
//!
//! Decoding classifies the lead byte through a 256-entry table and checks
//! the second byte against one of five accept ranges. Malformed input never
//! fails: it decodes to `RUNE_ERROR` and consumes exactly one byte, so a
//! scanner resynchronises on the next byte.

/// A Unicode code point, or `RUNE_ERROR`.
pub type Rune = i32;

pub const RUNE_ERROR: Rune = 0xFFFD;
pub const RUNE_SELF: Rune = 0x80;
pub const MAX_RUNE: Rune = 0x10FFFF;
/// Maximum number of bytes in one encoded rune.
pub const UTF_MAX: usize = 4;

const SURROGATE_MIN: Rune = 0xD800;
const SURROGATE_MAX: Rune = 0xDFFF;

const T1: u8 = 0x00;
const TX: u8 = 0x80;
const T2: u8 = 0xC0;
const T3: u8 = 0xE0;
const T4: u8 = 0xF0;

const MASKX: u8 = 0x3F;
const MASK2: u8 = 0x1F;
const MASK3: u8 = 0x0F;
const MASK4: u8 = 0x07;

const RUNE1_MAX: Rune = (1 << 7) - 1;
const RUNE2_MAX: Rune = (1 << 11) - 1;
const RUNE3_MAX: Rune = (1 << 16) - 1;

const LOCB: u8 = 0x80;
const HICB: u8 = 0xBF;

// Lead-byte classes. High nibble indexes `ACCEPT`, low three bits give the
// sequence width. `AS` is ASCII, `XX` is an invalid lead byte.
const XX: u8 = 0xF1;
const AS: u8 = 0xF0;
const S1: u8 = 0x02;
const S2: u8 = 0x13;
const S3: u8 = 0x03;
const S4: u8 = 0x23;
const S5: u8 = 0x34;
const S6: u8 = 0x04;
const S7: u8 = 0x44;

const fn build_first() -> [u8; 256] {
    let mut t = [XX; 256];
    let mut i = 0;
    while i < 256 {
        t[i] = match i {
            0x00..=0x7F => AS,
            0xC2..=0xDF => S1,
            0xE0 => S2,
            0xE1..=0xEC | 0xEE..=0xEF => S3,
            0xED => S4,
            0xF0 => S5,
            0xF1..=0xF3 => S6,
            0xF4 => S7,
            _ => XX,
        };
        i += 1;
    }
    t
}

static FIRST: [u8; 256] = build_first();

#[derive(Copy, Clone)]
struct AcceptRange {
    lo: u8,
    hi: u8,
}

static ACCEPT: [AcceptRange; 5] = [
    AcceptRange { lo: LOCB, hi: HICB },
    AcceptRange { lo: 0xA0, hi: HICB },
    AcceptRange { lo: LOCB, hi: 0x9F },
    AcceptRange { lo: 0x90, hi: HICB },
    AcceptRange { lo: LOCB, hi: 0x8F },
];

#[inline]
fn continuation(b: u8) -> bool {
    (LOCB..=HICB).contains(&b)
}

/// Decode the first rune of `p`, returning it with its width in bytes.
///
/// Empty input yields `(RUNE_ERROR, 0)`; any malformed prefix yields
/// `(RUNE_ERROR, 1)`.
pub fn decode_rune(p: &[u8]) -> (Rune, usize) {
    let n = p.len();
    if n < 1 {
        return (RUNE_ERROR, 0);
    }
    let p0 = p[0];
    let x = FIRST[p0 as usize];
    if x >= AS {
        return if x == AS {
            (p0 as Rune, 1)
        } else {
            (RUNE_ERROR, 1)
        };
    }
    let sz = (x & 7) as usize;
    let accept = ACCEPT[(x >> 4) as usize];
    if n < sz {
        return (RUNE_ERROR, 1);
    }
    let b1 = p[1];
    if b1 < accept.lo || accept.hi < b1 {
        return (RUNE_ERROR, 1);
    }
    if sz <= 2 {
        return (((p0 & MASK2) as Rune) << 6 | (b1 & MASKX) as Rune, 2);
    }
    let b2 = p[2];
    if !continuation(b2) {
        return (RUNE_ERROR, 1);
    }
    if sz <= 3 {
        return (
            ((p0 & MASK3) as Rune) << 12 | ((b1 & MASKX) as Rune) << 6 | (b2 & MASKX) as Rune,
            3,
        );
    }
    let b3 = p[3];
    if !continuation(b3) {
        return (RUNE_ERROR, 1);
    }
    (
        ((p0 & MASK4) as Rune) << 18
            | ((b1 & MASKX) as Rune) << 12
            | ((b2 & MASKX) as Rune) << 6
            | (b3 & MASKX) as Rune,
        4,
    )
}

/// Decode the last rune of `p`.
pub fn decode_last_rune(p: &[u8]) -> (Rune, usize) {
    let end = p.len();
    if end == 0 {
        return (RUNE_ERROR, 0);
    }
    let last = p[end - 1];
    if (last as Rune) < RUNE_SELF {
        return (last as Rune, 1);
    }
    let lim = end.saturating_sub(UTF_MAX);
    let mut start = end - 1;
    while start > lim {
        if !continuation(p[start]) {
            break;
        }
        start -= 1;
    }
    let (r, size) = decode_rune(&p[start..end]);
    if start + size != end {
        return (RUNE_ERROR, 1);
    }
    (r, size)
}

/// Number of bytes needed to encode `r`, or `None` for an unencodable rune.
pub fn rune_len(r: Rune) -> Option<usize> {
    match r {
        r if r < 0 => None,
        r if r <= RUNE1_MAX => Some(1),
        r if r <= RUNE2_MAX => Some(2),
        SURROGATE_MIN..=SURROGATE_MAX => None,
        r if r <= RUNE3_MAX => Some(3),
        r if r <= MAX_RUNE => Some(4),
        _ => None,
    }
}

/// Encode `r` into a fixed buffer; returns the buffer and the used width.
///
/// Surrogates, negative values and values above `MAX_RUNE` encode as
/// `RUNE_ERROR`.
pub fn encode_rune(r: Rune) -> ([u8; UTF_MAX], usize) {
    let mut buf = [0u8; UTF_MAX];
    let i = r as u32;
    if i <= RUNE1_MAX as u32 {
        buf[0] = T1 | r as u8;
        return (buf, 1);
    }
    if i <= RUNE2_MAX as u32 {
        buf[0] = T2 | (r >> 6) as u8;
        buf[1] = TX | (r as u8 & MASKX);
        return (buf, 2);
    }
    let r = if i > MAX_RUNE as u32 || (SURROGATE_MIN as u32..=SURROGATE_MAX as u32).contains(&i) {
        RUNE_ERROR
    } else {
        r
    };
    if r as u32 <= RUNE3_MAX as u32 {
        buf[0] = T3 | (r >> 12) as u8;
        buf[1] = TX | ((r >> 6) as u8 & MASKX);
        buf[2] = TX | (r as u8 & MASKX);
        return (buf, 3);
    }
    buf[0] = T4 | (r >> 18) as u8;
    buf[1] = TX | ((r >> 12) as u8 & MASKX);
    buf[2] = TX | ((r >> 6) as u8 & MASKX);
    buf[3] = TX | (r as u8 & MASKX);
    (buf, 4)
}

/// Append the encoding of `r` to `out`.
pub fn append_rune(out: &mut Vec<u8>, r: Rune) {
    let (buf, n) = encode_rune(r);
    out.extend_from_slice(&buf[..n]);
}

/// Number of runes in `p`, counting each malformed byte as one rune.
pub fn rune_count(p: &[u8]) -> usize {
    let mut n = 0;
    let mut i = 0;
    while i < p.len() {
        let (_, size) = decode_rune(&p[i..]);
        i += size;
        n += 1;
    }
    n
}

/// Whether `p` consists entirely of well-formed encodings.
pub fn valid(p: &[u8]) -> bool {
    let mut i = 0;
    while i < p.len() {
        let (r, size) = decode_rune(&p[i..]);
        if r == RUNE_ERROR && size == 1 {
            // U+FFFD itself encodes in three bytes.
            return false;
        }
        i += size;
    }
    true
}

/// Iterator over the runes of a byte buffer.
#[derive(Clone, Debug)]
pub struct Runes<'a> {
    rest: &'a [u8],
}

pub fn runes(p: &[u8]) -> Runes<'_> {
    Runes { rest: p }
}

impl Iterator for Runes<'_> {
    type Item = Rune;

    fn next(&mut self) -> Option<Rune> {
        if self.rest.is_empty() {
            return None;
        }
        let (r, size) = decode_rune(self.rest);
        self.rest = &self.rest[size..];
        Some(r)
    }
}
