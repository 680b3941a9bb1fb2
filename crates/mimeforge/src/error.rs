//! Error types for MIME generation.

use crate::encoding::Encoding;
use std::fmt;

/// Result type alias for MIME generation.
pub type Result<T> = std::result::Result<T, Error>;

/// Why content cannot be carried by a requested transfer encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Incompatibility {
    /// A byte with the high bit set.
    NonAscii {
        /// Offset of the first offending byte.
        offset: usize,
    },
    /// A NUL byte.
    NulByte {
        /// Offset of the first offending byte.
        offset: usize,
    },
    /// A carriage return not followed by a line feed.
    BareCarriageReturn {
        /// Offset of the first offending byte.
        offset: usize,
    },
}

impl fmt::Display for Incompatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonAscii { offset } => write!(f, "non-ASCII byte at offset {offset}"),
            Self::NulByte { offset } => write!(f, "NUL byte at offset {offset}"),
            Self::BareCarriageReturn { offset } => {
                write!(f, "bare carriage return at offset {offset}")
            }
        }
    }
}

/// MIME generation error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Multipart content type passed where a single section is built.
    #[error("Multipart type not allowed for a single section: {0}")]
    MultipartSection(String),

    /// Invalid multipart subtype token.
    #[error("Invalid multipart subtype: {0}")]
    InvalidSubtype(String),

    /// Invalid header line.
    #[error("Invalid header line: {0:?}")]
    InvalidHeader(String),

    /// Invalid boundary token.
    #[error("Invalid boundary: {0:?}")]
    InvalidBoundary(String),

    /// Encoding that cannot be advertised on a multipart envelope.
    #[error("Multipart envelope cannot use {0} transfer encoding")]
    InvalidEnvelopeEncoding(Encoding),

    /// Part whose encoding is wider than the envelope allows.
    #[error("Cannot add {part} part to {envelope} multipart")]
    EnvelopeMismatch {
        /// Encoding of the rejected part.
        part: Encoding,
        /// Encoding advertised by the envelope.
        envelope: Encoding,
    },

    /// Part index out of range.
    #[error("Part index {index} out of range ({len} parts)")]
    PartOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of parts held.
        len: usize,
    },

    /// Content cannot be represented under the requested encoding.
    #[error("Content cannot be sent as {encoding}: {reason}")]
    Incompatible {
        /// Requested encoding.
        encoding: Encoding,
        /// First violation found.
        reason: Incompatibility,
    },

    /// Boundary found inside a section.
    #[error("Boundary \"{0}\" occurs inside the section")]
    BoundaryCollision(String),
}

impl Error {
    /// Returns true if the caller passed an invalid combination of arguments.
    #[must_use]
    pub const fn is_contract_violation(&self) -> bool {
        !self.is_encoding_error() && !self.is_boundary_collision()
    }

    /// Returns true if content did not fit a strictly requested encoding.
    #[must_use]
    pub const fn is_encoding_error(&self) -> bool {
        matches!(self, Self::Incompatible { .. })
    }

    /// Returns true if a section contained the multipart boundary.
    ///
    /// The caller may retry with a message built around a fresh boundary.
    #[must_use]
    pub const fn is_boundary_collision(&self) -> bool {
        matches!(self, Self::BoundaryCollision(_))
    }
}
