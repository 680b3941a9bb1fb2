//! Tunable settings shared by the encoders and the assembler.

use std::fmt;

/// Longest line, excluding the terminator, allowed in 7bit and 8bit bodies (RFC 5322).
pub const MAX_LINE_LENGTH: usize = 998;

/// Longest line, including a soft break marker, in quoted-printable and base64 bodies.
pub const MAX_ENCODED_LINE_LENGTH: usize = 76;

/// Share of escaped bytes, in percent, above which autodetection picks base64.
pub const BASE64_ESCAPE_PERCENT: usize = 20;

/// Number of consecutive non-text bytes that marks content as binary.
pub const BINARY_RUN_LIMIT: usize = 8;

/// Line terminator written by every producer in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineEnding {
    /// `\r\n`, as required by RFC 2045.
    #[default]
    Crlf,
    /// Bare `\n`, for local storage or relaxed consumers.
    Lf,
}

impl LineEnding {
    /// Maps the RFC 2045 compliance flag onto a terminator.
    #[must_use]
    pub const fn from_rfc2045(compliant: bool) -> Self {
        if compliant { Self::Crlf } else { Self::Lf }
    }

    /// Returns the terminator bytes.
    #[must_use]
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Crlf => b"\r\n",
            Self::Lf => b"\n",
        }
    }

    /// Returns the terminator as a string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Crlf => "\r\n",
            Self::Lf => "\n",
        }
    }

    /// Returns true if `data` ends with this terminator.
    #[must_use]
    pub fn terminates(self, data: &[u8]) -> bool {
        data.ends_with(self.as_bytes())
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crlf => write!(f, "CRLF"),
            Self::Lf => write!(f, "LF"),
        }
    }
}

/// Thresholds used when the transfer encoding is autodetected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AutodetectPolicy {
    /// Escaped byte share, in percent, above which base64 is chosen.
    pub base64_escape_percent: usize,
    /// Consecutive non-text bytes that force base64.
    pub binary_run_limit: usize,
}

impl AutodetectPolicy {
    /// Sets the escaped byte share cutoff.
    #[must_use]
    pub const fn with_base64_escape_percent(mut self, percent: usize) -> Self {
        self.base64_escape_percent = percent;
        self
    }

    /// Sets the binary run length cutoff.
    #[must_use]
    pub const fn with_binary_run_limit(mut self, limit: usize) -> Self {
        self.binary_run_limit = limit;
        self
    }
}

impl Default for AutodetectPolicy {
    fn default() -> Self {
        Self {
            base64_escape_percent: BASE64_ESCAPE_PERCENT,
            binary_run_limit: BINARY_RUN_LIMIT,
        }
    }
}
