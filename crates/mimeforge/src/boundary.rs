//! Multipart boundary tokens.

use crate::error::{Error, Result};
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default length of a generated boundary.
pub const DEFAULT_BOUNDARY_LENGTH: usize = 48;

/// Shortest generated boundary accepted by [`BoundaryGenerator::with_length`].
pub const MIN_BOUNDARY_LENGTH: usize = 24;

/// Longest generated boundary accepted by [`BoundaryGenerator::with_length`].
pub const MAX_BOUNDARY_LENGTH: usize = 64;

/// Longest boundary RFC 2046 permits.
const RFC2046_MAX_LENGTH: usize = 70;

/// Never produced by quoted-printable (`=` is always followed by hex or a
/// break) nor by base64 (`=` only pads the end of a line).
const BOUNDARY_PREFIX: &str = "=_";

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A validated multipart boundary token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Boundary(String);

impl Boundary {
    /// Wraps a caller-supplied boundary.
    ///
    /// # Errors
    ///
    /// Returns an error unless the token is 1 to 70 RFC 2046 `bchars` and
    /// does not end with a space.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();

        let valid = !token.is_empty()
            && token.len() <= RFC2046_MAX_LENGTH
            && !token.ends_with(' ')
            && token.bytes().all(is_bchar);

        if valid {
            Ok(Self(token))
        } else {
            Err(Error::InvalidBoundary(token))
        }
    }

    /// Returns the token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the token length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the token is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if the token occurs anywhere in `data`.
    #[must_use]
    pub fn occurs_in(&self, data: &[u8]) -> bool {
        let needle = self.0.as_bytes();
        data.windows(needle.len()).any(|window| window == needle)
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Boundary {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// RFC 2046 `bchars`.
const fn is_bchar(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'\'' | b'(' | b')' | b'+' | b'_' | b',' | b'-' | b'.' | b'/' | b':' | b'=' | b'?' | b' '
        )
}

/// Produces boundary tokens that are distinct with overwhelming probability.
///
/// The generator never looks at content; the assembler checks every part
/// against the chosen token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryGenerator {
    length: usize,
}

impl BoundaryGenerator {
    /// Creates a generator with the default length.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            length: DEFAULT_BOUNDARY_LENGTH,
        }
    }

    /// Sets the token length, clamped to the supported range.
    #[must_use]
    pub const fn with_length(mut self, length: usize) -> Self {
        self.length = if length < MIN_BOUNDARY_LENGTH {
            MIN_BOUNDARY_LENGTH
        } else if length > MAX_BOUNDARY_LENGTH {
            MAX_BOUNDARY_LENGTH
        } else {
            length
        };
        self
    }

    /// Returns the configured token length.
    #[must_use]
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Generates a fresh boundary.
    ///
    /// The token is `=_`, the process id and a per-process sequence number in
    /// hex, `_`, then random alphanumerics up to the configured length.
    #[must_use]
    pub fn generate(&self) -> Boundary {
        let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let mut token = format!("{BOUNDARY_PREFIX}{:x}{sequence:x}_", std::process::id());
        token.truncate(self.length);

        let fill = self.length - token.len();
        token.extend(
            rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(fill)
                .map(char::from),
        );

        tracing::debug!(boundary = %token, "Generated multipart boundary");
        Boundary(token)
    }
}

impl Default for BoundaryGenerator {
    fn default() -> Self {
        Self::new()
    }
}
