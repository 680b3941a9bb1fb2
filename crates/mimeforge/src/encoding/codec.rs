//! Byte-level transcoders for the transfer encodings.

use crate::config::{LineEnding, MAX_ENCODED_LINE_LENGTH, MAX_LINE_LENGTH};
use crate::error::{Error, Incompatibility, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

use super::Encoding;

/// Longest run of source bytes that fits one `utf-8` B encoded word (75 characters).
const ENCODED_WORD_BYTES: usize = 45;

/// Splits content into lines.
///
/// Each item carries the line without its break and whether a break followed it.
pub(crate) struct Lines<'a> {
    rest: &'a [u8],
    lone_lf: bool,
    done: bool,
}

impl<'a> Lines<'a> {
    /// Accepts `\r\n` and lone `\n` as breaks.
    pub(crate) const fn new(content: &'a [u8]) -> Self {
        Self {
            rest: content,
            lone_lf: true,
            done: false,
        }
    }

    /// Accepts only `\r\n` as a break; a lone `\n` stays inside the line.
    pub(crate) const fn crlf(content: &'a [u8]) -> Self {
        Self {
            rest: content,
            lone_lf: false,
            done: false,
        }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = (&'a [u8], bool);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut from = 0;
        while let Some(pos) = self.rest[from..].iter().position(|&b| b == b'\n') {
            let pos = from + pos;
            let crlf = pos > 0 && self.rest[pos - 1] == b'\r';

            if crlf || self.lone_lf {
                let line = &self.rest[..pos];
                let line = if crlf { &line[..pos - 1] } else { line };
                self.rest = &self.rest[pos + 1..];
                return Some((line, true));
            }
            from = pos + 1;
        }

        self.done = true;
        Some((self.rest, false))
    }
}

/// Checks content against the 7bit or 8bit rules.
fn validate_identity(content: &[u8], encoding: Encoding) -> Result<()> {
    let seven_bit = encoding == Encoding::SevenBit;

    for (offset, &byte) in content.iter().enumerate() {
        let reason = match byte {
            0 => Some(Incompatibility::NulByte { offset }),
            b'\r' if content.get(offset + 1) != Some(&b'\n') => {
                Some(Incompatibility::BareCarriageReturn { offset })
            }
            0x80..=0xFF if seven_bit => Some(Incompatibility::NonAscii { offset }),
            _ => None,
        };

        if let Some(reason) = reason {
            return Err(Error::Incompatible { encoding, reason });
        }
    }

    Ok(())
}

/// Passes content through unchanged apart from line handling (7bit and 8bit).
///
/// Line breaks are rewritten to `line_ending` and lines longer than
/// [`MAX_LINE_LENGTH`] are hard-folded.
///
/// # Errors
///
/// Returns [`Error::Incompatible`] if the content holds a NUL byte, a bare
/// carriage return, or (for 7bit) a byte with the high bit set.
pub(crate) fn encode_identity(
    content: &[u8],
    encoding: Encoding,
    line_ending: LineEnding,
) -> Result<Vec<u8>> {
    validate_identity(content, encoding)?;

    let terminator = line_ending.as_bytes();
    let mut out = Vec::with_capacity(content.len() + content.len() / MAX_LINE_LENGTH * 2 + 2);

    for (line, has_break) in Lines::new(content) {
        let mut chunks = line.chunks(MAX_LINE_LENGTH).peekable();
        while let Some(chunk) = chunks.next() {
            out.extend_from_slice(chunk);
            if chunks.peek().is_some() {
                out.extend_from_slice(terminator);
            }
        }
        if has_break {
            out.extend_from_slice(terminator);
        }
    }

    Ok(out)
}

/// Encodes data as Base64, wrapped at 76 characters per line.
#[must_use]
pub fn encode_base64(data: &[u8], line_ending: LineEnding) -> String {
    let encoded = STANDARD.encode(data);
    let mut result =
        String::with_capacity(encoded.len() + encoded.len() / MAX_ENCODED_LINE_LENGTH * 2);

    for (index, chunk) in encoded.as_bytes().chunks(MAX_ENCODED_LINE_LENGTH).enumerate() {
        if index > 0 {
            result.push_str(line_ending.as_str());
        }
        result.extend(chunk.iter().map(|&b| char::from(b)));
    }

    result
}

/// Encodes data using Quoted-Printable encoding (RFC 2045).
///
/// Each `\r\n` in the input becomes a hard break written with `line_ending`;
/// every other byte outside printable ASCII, `=`, and whitespace at the end of
/// a line is escaped as `=XX`, lone `\n` and `\r` included, so decoding gives
/// back the input exactly. Soft breaks keep every output line within 76
/// characters including the trailing `=`.
#[must_use]
pub fn encode_quoted_printable(data: &[u8], line_ending: LineEnding) -> String {
    let mut result = String::with_capacity(data.len() + data.len() / 2);

    for (line, has_break) in Lines::crlf(data) {
        let mut column = 0;

        for (index, &byte) in line.iter().enumerate() {
            let literal = match byte {
                b'!'..=b'<' | b'>'..=b'~' => true,
                // Trailing whitespace is always escaped
                b' ' | b'\t' => index + 1 < line.len(),
                _ => false,
            };
            let width = if literal { 1 } else { 3 };

            // Leave room for the soft break marker
            if column + width > MAX_ENCODED_LINE_LENGTH - 1 {
                result.push('=');
                result.push_str(line_ending.as_str());
                column = 0;
            }

            if literal {
                result.push(char::from(byte));
            } else {
                let _ = write!(result, "={byte:02X}");
            }
            column += width;
        }

        if has_break {
            result.push_str(line_ending.as_str());
        }
    }

    result
}

/// Encodes a header value using RFC 2047 encoding.
///
/// Format: `=?charset?B?encoded-text?=`. Text that is plain ASCII without
/// `=` or `?` is returned unchanged. Long text is split on character
/// boundaries into several encoded words separated by a space.
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> String {
    // Only encode if necessary (contains non-ASCII)
    if text.chars().all(|c| c.is_ascii() && c != '=' && c != '?') {
        return text.to_string();
    }

    let mut words = Vec::new();
    let mut start = 0;
    let mut end = 0;

    for (index, ch) in text.char_indices() {
        let next = index + ch.len_utf8();
        if next - start > ENCODED_WORD_BYTES && end > start {
            words.push(&text[start..end]);
            start = end;
        }
        end = next;
    }
    if end > start {
        words.push(&text[start..end]);
    }

    words
        .into_iter()
        .map(|word| format!("=?{charset}?B?{}?=", STANDARD.encode(word)))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::unreadable_literal,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_split() {
        let lines: Vec<_> = Lines::new(b"a\r\nb\nc").collect();
        assert_eq!(
            lines,
            vec![(&b"a"[..], true), (&b"b"[..], true), (&b"c"[..], false)]
        );

        let lines: Vec<_> = Lines::new(b"").collect();
        assert_eq!(lines, vec![(&b""[..], false)]);
    }

    #[test]
    fn test_lines_split_crlf_only() {
        let lines: Vec<_> = Lines::crlf(b"a\nb\r\nc\r").collect();
        assert_eq!(lines, vec![(&b"a\nb"[..], true), (&b"c\r"[..], false)]);
    }

    #[test]
    fn test_identity_normalizes_breaks() {
        let out = encode_identity(b"one\ntwo\r\nthree", Encoding::SevenBit, LineEnding::Crlf)
            .unwrap();
        assert_eq!(out, b"one\r\ntwo\r\nthree");

        let out = encode_identity(b"one\r\ntwo", Encoding::SevenBit, LineEnding::Lf).unwrap();
        assert_eq!(out, b"one\ntwo");
    }

    #[test]
    fn test_identity_folds_long_lines() {
        let content = vec![b'a'; MAX_LINE_LENGTH * 2 + 5];
        let out = encode_identity(&content, Encoding::EightBit, LineEnding::Crlf).unwrap();
        let lines: Vec<_> = out.split(|&b| b == b'\n').collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), MAX_LINE_LENGTH + 1); // includes '\r'
        assert_eq!(lines[2].len(), 5);
    }

    #[test]
    fn test_identity_rejects() {
        let err = encode_identity("Hello, мир!".as_bytes(), Encoding::SevenBit, LineEnding::Crlf)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Incompatible {
                encoding: Encoding::SevenBit,
                reason: Incompatibility::NonAscii { offset: 7 }
            }
        ));

        assert!(
            encode_identity("Hello, мир!".as_bytes(), Encoding::EightBit, LineEnding::Crlf)
                .is_ok()
        );

        let err = encode_identity(b"a\0b", Encoding::EightBit, LineEnding::Crlf).unwrap_err();
        assert!(matches!(
            err,
            Error::Incompatible {
                reason: Incompatibility::NulByte { offset: 1 },
                ..
            }
        ));

        let err = encode_identity(b"a\rb", Encoding::SevenBit, LineEnding::Crlf).unwrap_err();
        assert!(matches!(
            err,
            Error::Incompatible {
                reason: Incompatibility::BareCarriageReturn { offset: 1 },
                ..
            }
        ));
    }

    #[test]
    fn test_base64_encode() {
        assert_eq!(
            encode_base64(b"Hello, World!", LineEnding::Crlf),
            "SGVsbG8sIFdvcmxkIQ=="
        );
        assert_eq!(encode_base64(b"", LineEnding::Crlf), "");
    }

    #[test]
    fn test_base64_wraps() {
        let data = vec![0xA5u8; 200];
        let encoded = encode_base64(&data, LineEnding::Crlf);
        let lines: Vec<_> = encoded.split("\r\n").collect();
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|line| line.len() <= MAX_ENCODED_LINE_LENGTH));
        assert_eq!(lines[0].len(), MAX_ENCODED_LINE_LENGTH);
    }

    #[test]
    fn test_quoted_printable_encode() {
        assert_eq!(
            encode_quoted_printable(b"Hello, World!", LineEnding::Crlf),
            "Hello, World!"
        );
        assert_eq!(
            encode_quoted_printable("Привет, мир!".as_bytes(), LineEnding::Crlf),
            "=D0=9F=D1=80=D0=B8=D0=B2=D0=B5=D1=82, =D0=BC=D0=B8=D1=80!"
        );
        assert_eq!(encode_quoted_printable(b"a=b", LineEnding::Crlf), "a=3Db");
    }

    #[test]
    fn test_quoted_printable_trailing_whitespace() {
        assert_eq!(
            encode_quoted_printable(b"end \r\nnext\t", LineEnding::Crlf),
            "end=20\r\nnext=09"
        );
        assert_eq!(encode_quoted_printable(b"a b", LineEnding::Crlf), "a b");
    }

    #[test]
    fn test_quoted_printable_soft_breaks() {
        let text = "Текст письма в уникоде";
        let encoded = encode_quoted_printable(text.as_bytes(), LineEnding::Crlf);
        assert_eq!(
            encoded,
            concat!(
                "=D0=A2=D0=B5=D0=BA=D1=81=D1=82 =D0=BF=D0=B8=D1=81=D1=8C=D0=BC=D0=B0 =D0=B2 =\r\n",
                "=D1=83=D0=BD=D0=B8=D0=BA=D0=BE=D0=B4=D0=B5"
            )
        );

        let long = vec![b'x'; 200];
        let encoded = encode_quoted_printable(&long, LineEnding::Lf);
        for line in encoded.split('\n') {
            assert!(line.len() <= MAX_ENCODED_LINE_LENGTH);
        }
    }

    #[test]
    fn test_quoted_printable_bare_cr() {
        assert_eq!(encode_quoted_printable(b"a\rb", LineEnding::Crlf), "a=0Db");
    }

    #[test]
    fn test_quoted_printable_lone_lf() {
        assert_eq!(encode_quoted_printable(b"a\nb", LineEnding::Crlf), "a=0Ab");
        assert_eq!(
            encode_quoted_printable(b"\x01\n\x02", LineEnding::Crlf),
            "=01=0A=02"
        );
        // Space before a lone LF is not at the end of a line
        assert_eq!(encode_quoted_printable(b"a \nb", LineEnding::Crlf), "a =0Ab");
    }

    #[test]
    fn test_quoted_printable_lf_mode() {
        // Hard breaks use the local terminator; lone LF bytes stay escaped
        assert_eq!(
            encode_quoted_printable(b"a\r\nb\nc", LineEnding::Lf),
            "a\nb=0Ac"
        );
    }

    #[test]
    fn test_rfc2047_encode() {
        assert_eq!(encode_rfc2047("Hello", "utf-8"), "Hello");

        let encoded = encode_rfc2047("Héllo", "utf-8");
        assert_eq!(encoded, "=?utf-8?B?SMOpbGxv?=");
    }

    #[test]
    fn test_rfc2047_splits_long_text() {
        let text = "я".repeat(40);
        let encoded = encode_rfc2047(&text, "utf-8");
        let words: Vec<_> = encoded.split(' ').collect();
        assert_eq!(words.len(), 2);
        assert!(words.iter().all(|word| word.len() <= 75));
    }
}
