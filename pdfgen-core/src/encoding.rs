//! WinAnsiEncoding, the single-byte encoding every simple font in this
//! crate declares. Text is turned into bytes here before it reaches a
//! content stream or a width table.

/// Unicode code points for WinAnsiEncoding bytes 0x80..=0x9F.
/// Zero marks an unused code.
const WIN_ANSI_HIGH: [u32; 32] = [
    0x20AC, 0, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, 0x02C6, 0x2030, 0x0160, 0x2039,
    0x0152, 0, 0x017D, 0, 0, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014, 0x02DC,
    0x2122, 0x0161, 0x203A, 0x0153, 0, 0x017E, 0x0178,
];

/// Byte written for characters the encoding has no code for.
pub const REPLACEMENT: u8 = b'?';

/// The Unicode code point a WinAnsiEncoding byte stands for.
pub fn win_ansi_to_unicode(code: u8) -> Option<char> {
    match code {
        0x80..=0x9F => match WIN_ANSI_HIGH[(code - 0x80) as usize] {
            0 => None,
            cp => char::from_u32(cp),
        },
        _ => Some(char::from(code)),
    }
}

/// The WinAnsiEncoding byte for `ch`, if it has one.
///
/// C1 controls (U+0080..U+009F) have no code: those bytes stand for other
/// glyphs in this encoding.
pub fn unicode_to_win_ansi(ch: char) -> Option<u8> {
    match ch as u32 {
        cp @ (0x00..=0x7F | 0xA0..=0xFF) => Some(cp as u8),
        0x80..=0x9F => None,
        cp => WIN_ANSI_HIGH
            .iter()
            .position(|&mapped| mapped == cp)
            .map(|i| 0x80 + i as u8),
    }
}

/// Encode one character, substituting `?` when it is unmappable.
pub fn encode_char(ch: char) -> u8 {
    unicode_to_win_ansi(ch).unwrap_or(REPLACEMENT)
}

/// Encode a whole string, one byte per character.
pub fn encode_str(text: &str) -> Vec<u8> {
    text.chars().map(encode_char).collect()
}

/// True when every character of `text` has a code.
pub fn is_encodable(text: &str) -> bool {
    text.chars().all(|ch| unicode_to_win_ansi(ch).is_some())
}
