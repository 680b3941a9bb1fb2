//! Transfer encoding autodetection.

use crate::config::{AutodetectPolicy, MAX_LINE_LENGTH};

use super::Encoding;

/// Statistics gathered by a single pass over the content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Scan {
    /// Total number of bytes.
    pub len: usize,
    /// Bytes with the high bit set.
    pub high_bit: usize,
    /// NUL bytes.
    pub nul: usize,
    /// Carriage returns not followed by a line feed.
    pub bare_cr: usize,
    /// Bytes quoted-printable has to escape.
    pub escaped: usize,
    /// Longest line, without its terminator.
    pub longest_line: usize,
    /// Longest run of consecutive non-text bytes.
    pub longest_binary_run: usize,
}

impl Scan {
    /// Scans `content`; `high_bit_is_text` makes 8-bit bytes count as text for run detection.
    pub(crate) fn new(content: &[u8], high_bit_is_text: bool) -> Self {
        let mut scan = Self {
            len: content.len(),
            ..Self::default()
        };
        let mut line = 0;
        let mut run = 0;

        for (offset, &byte) in content.iter().enumerate() {
            let crlf = byte == b'\r' && content.get(offset + 1) == Some(&b'\n');

            if byte == b'\n' {
                scan.longest_line = scan.longest_line.max(line);
                line = 0;
            } else if !crlf {
                line += 1;
            }

            let control = matches!(byte, 0x00..=0x08 | 0x0B | 0x0C | 0x0E..=0x1F | 0x7F)
                || (byte == b'\r' && !crlf);

            match byte {
                0 => scan.nul += 1,
                b'\r' if !crlf => scan.bare_cr += 1,
                0x80..=0xFF => scan.high_bit += 1,
                _ => {}
            }

            let lone_lf = byte == b'\n' && (offset == 0 || content[offset - 1] != b'\r');

            if control || lone_lf || byte >= 0x80 || byte == b'=' {
                scan.escaped += 1;
            }

            if control || (byte >= 0x80 && !high_bit_is_text) {
                run += 1;
                scan.longest_binary_run = scan.longest_binary_run.max(run);
            } else {
                run = 0;
            }
        }

        scan.longest_line = scan.longest_line.max(line);
        scan
    }

    /// Returns true if the content can travel as 7bit unchanged.
    pub(crate) const fn is_seven_bit_clean(&self) -> bool {
        self.high_bit == 0 && self.nul == 0 && self.bare_cr == 0 && self.longest_line <= MAX_LINE_LENGTH
    }

    /// Picks the transfer encoding for the scanned content.
    pub(crate) const fn classify(&self, policy: &AutodetectPolicy) -> Encoding {
        if self.is_seven_bit_clean() {
            return Encoding::SevenBit;
        }

        // Pure ASCII only needs escaping for control bytes or long lines
        if self.high_bit == 0 {
            return Encoding::QuotedPrintable;
        }

        let mostly_escaped =
            self.escaped.saturating_mul(100) > self.len.saturating_mul(policy.base64_escape_percent);
        if mostly_escaped || self.longest_binary_run >= policy.binary_run_limit {
            Encoding::Base64
        } else {
            Encoding::QuotedPrintable
        }
    }
}

/// Returns true if high-bit bytes are text in `charset`.
pub(crate) fn high_bit_is_text(content: &[u8], charset: &str) -> bool {
    let charset = charset.trim();
    if charset.is_empty() || charset.eq_ignore_ascii_case("us-ascii") {
        false
    } else if charset.eq_ignore_ascii_case("utf-8") || charset.eq_ignore_ascii_case("utf8") {
        std::str::from_utf8(content).is_ok()
    } else {
        true
    }
}
