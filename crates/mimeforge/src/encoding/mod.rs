//! Content transfer encoding selection and transcoding.
//!
//! Supports 7bit, 8bit, Quoted-Printable and Base64 (RFC 2045), with an
//! autodetection heuristic over the raw bytes, plus RFC 2047 header words.

mod codec;
mod detect;

use crate::config::{AutodetectPolicy, LineEnding};
use crate::error::Result;
use std::fmt;

pub use codec::{encode_base64, encode_quoted_printable, encode_rfc2047};

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Encoding {
    /// Not specified; consumers interpret a missing header as 7bit.
    Unset,
    /// Pick an encoding by scanning the content.
    #[default]
    Auto,
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit text.
    EightBit,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Base64 encoding.
    Base64,
}

impl Encoding {
    /// Returns the `Content-Transfer-Encoding` token.
    ///
    /// `Unset` maps to `7bit`; `Auto` has no token until it is resolved.
    #[must_use]
    pub const fn header_token(self) -> Option<&'static str> {
        match self {
            Self::Unset | Self::SevenBit => Some("7bit"),
            Self::EightBit => Some("8bit"),
            Self::QuotedPrintable => Some("quoted-printable"),
            Self::Base64 => Some("base64"),
            Self::Auto => None,
        }
    }

    /// Returns true for the encodings that leave bytes untouched.
    #[must_use]
    pub const fn is_identity(self) -> bool {
        matches!(self, Self::Unset | Self::SevenBit | Self::EightBit)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header_token().unwrap_or("auto"))
    }
}

/// Transcoded content together with the encoding actually used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    /// Resolved encoding; never `Auto` or `Unset`.
    pub encoding: Encoding,
    /// Transcoded body, without a final terminator.
    pub body: Vec<u8>,
}

/// Classifies and transcodes raw content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Encoder {
    line_ending: LineEnding,
    policy: AutodetectPolicy,
}

impl Encoder {
    /// Creates an encoder writing `line_ending` with the default policy.
    #[must_use]
    pub fn new(line_ending: LineEnding) -> Self {
        Self {
            line_ending,
            policy: AutodetectPolicy::default(),
        }
    }

    /// Replaces the autodetection policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: AutodetectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the line terminator in use.
    #[must_use]
    pub const fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Returns the autodetection policy in use.
    #[must_use]
    pub const fn policy(&self) -> &AutodetectPolicy {
        &self.policy
    }

    /// Picks a transfer encoding for `content`.
    ///
    /// `charset` is a hint: high-bit bytes that are valid text in it do not
    /// count towards binary runs.
    #[must_use]
    pub fn detect(&self, content: &[u8], charset: &str) -> Encoding {
        let scan = detect::Scan::new(content, detect::high_bit_is_text(content, charset));
        let encoding = scan.classify(&self.policy);

        tracing::trace!(
            len = scan.len,
            high_bit = scan.high_bit,
            escaped = scan.escaped,
            longest_line = scan.longest_line,
            binary_run = scan.longest_binary_run,
            %encoding,
            "Autodetected transfer encoding"
        );

        encoding
    }

    /// Transcodes `content` under `requested`, resolving `Auto` first.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Incompatible`] if an explicit 7bit or 8bit
    /// request does not fit the content. Autodetection never fails.
    pub fn encode(&self, content: &[u8], charset: &str, requested: Encoding) -> Result<Encoded> {
        let encoding = match requested {
            Encoding::Auto => self.detect(content, charset),
            Encoding::Unset => Encoding::SevenBit,
            other => other,
        };

        let body = match encoding {
            Encoding::QuotedPrintable => {
                encode_quoted_printable(content, self.line_ending).into_bytes()
            }
            Encoding::Base64 => encode_base64(content, self.line_ending).into_bytes(),
            Encoding::EightBit => {
                codec::encode_identity(content, Encoding::EightBit, self.line_ending)?
            }
            // Unset and Auto were resolved above
            Encoding::SevenBit | Encoding::Unset | Encoding::Auto => {
                codec::encode_identity(content, Encoding::SevenBit, self.line_ending)?
            }
        };

        tracing::debug!(%requested, %encoding, len = content.len(), encoded = body.len(), "Encoded content");

        Ok(Encoded { encoding, body })
    }
}

/// Transcodes `content` with a CRLF encoder and the default policy.
///
/// # Errors
///
/// See [`Encoder::encode`].
pub fn encode(content: &[u8], charset: &str, requested: Encoding) -> Result<Encoded> {
    Encoder::default().encode(content, charset, requested)
}
