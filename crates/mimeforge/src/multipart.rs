//! Multipart message assembly.

use crate::boundary::{Boundary, BoundaryGenerator};
use crate::config::LineEnding;
use crate::content_type::{ContentType, is_token};
use crate::encoding::Encoding;
use crate::error::{Error, Result};
use crate::header::{Headers, check_raw_line};
use crate::section::Section;
use std::fmt;

/// Default multipart subtype.
pub const DEFAULT_SUBTYPE: &str = "mixed";

/// Default extra header line written above the multipart headers.
pub const DEFAULT_HEADER_LINE: &str = "MIME-Version: 1.0";

/// Builder for [`MultipartMessage`].
#[derive(Debug, Clone)]
pub struct MultipartBuilder {
    subtype: String,
    encoding: Encoding,
    header_line: String,
    line_ending: LineEnding,
    boundary: Option<String>,
    generator: BoundaryGenerator,
}

impl MultipartBuilder {
    /// Creates a builder with the defaults: `mixed`, 8bit, `MIME-Version: 1.0`, CRLF.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subtype: DEFAULT_SUBTYPE.to_string(),
            encoding: Encoding::EightBit,
            header_line: DEFAULT_HEADER_LINE.to_string(),
            line_ending: LineEnding::Crlf,
            boundary: None,
            generator: BoundaryGenerator::new(),
        }
    }

    /// Sets the multipart subtype (`mixed`, `alternative`, `related`, ...).
    #[must_use]
    pub fn subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = subtype.into();
        self
    }

    /// Sets the advertised transfer encoding; only 7bit and 8bit are valid.
    #[must_use]
    pub const fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sets the extra header line; an empty line is omitted.
    #[must_use]
    pub fn header_line(mut self, header_line: impl Into<String>) -> Self {
        self.header_line = header_line.into();
        self
    }

    /// Selects CRLF (`true`, RFC 2045) or relaxed LF (`false`) terminators.
    #[must_use]
    pub const fn rfc2045(mut self, compliant: bool) -> Self {
        self.line_ending = LineEnding::from_rfc2045(compliant);
        self
    }

    /// Sets the line terminator.
    #[must_use]
    pub const fn line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Uses a fixed boundary instead of generating one.
    #[must_use]
    pub fn boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = Some(boundary.into());
        self
    }

    /// Sets the generator used when no fixed boundary is given.
    #[must_use]
    pub const fn boundary_generator(mut self, generator: BoundaryGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Creates the message, fixing its boundary.
    ///
    /// # Errors
    ///
    /// Returns an error if the subtype is not a token, the encoding is not
    /// 7bit or 8bit, the header line is malformed, or a fixed boundary is
    /// invalid.
    pub fn build(self) -> Result<MultipartMessage> {
        if !is_token(&self.subtype) {
            return Err(Error::InvalidSubtype(self.subtype));
        }

        if !matches!(self.encoding, Encoding::SevenBit | Encoding::EightBit) {
            return Err(Error::InvalidEnvelopeEncoding(self.encoding));
        }

        if !self.header_line.is_empty() {
            check_raw_line(&self.header_line, true)?;
        }

        let boundary = match self.boundary {
            Some(token) => Boundary::new(token)?,
            None => self.generator.generate(),
        };

        tracing::debug!(
            subtype = %self.subtype,
            %boundary,
            line_ending = %self.line_ending,
            "Created multipart message"
        );

        Ok(MultipartMessage::assemble(
            self.subtype.to_lowercase(),
            self.encoding,
            self.line_ending,
            &self.header_line,
            boundary,
        ))
    }
}

impl Default for MultipartBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A multipart MIME message assembled from pre-built sections.
///
/// The boundary is fixed at construction. Parts are only ever appended, and
/// [`Self::message`] is a read-only projection that can be called any number
/// of times.
///
/// # Example
///
/// ```
/// use mimeforge::{Encoding, MultipartMessage, section};
///
/// let mut message = MultipartMessage::builder()
///     .subtype("alternative")
///     .boundary("B")
///     .build()
///     .unwrap();
///
/// message
///     .add(section(b"Hello", "text/plain", Encoding::SevenBit, "", "", "").unwrap())
///     .unwrap();
///
/// let body = message.message(true);
/// assert!(body.ends_with(b"--B--\r\n"));
/// ```
#[derive(Debug, Clone)]
pub struct MultipartMessage {
    subtype: String,
    encoding: Encoding,
    line_ending: LineEnding,
    boundary: Boundary,
    headers: Headers,
    parts: Vec<Section>,
}

impl MultipartMessage {
    /// Creates a `multipart/mixed`, 8bit, CRLF message with a fresh boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::assemble(
            DEFAULT_SUBTYPE.to_string(),
            Encoding::EightBit,
            LineEnding::Crlf,
            DEFAULT_HEADER_LINE,
            BoundaryGenerator::new().generate(),
        )
    }

    /// Formats the envelope headers from validated settings.
    fn assemble(
        subtype: String,
        encoding: Encoding,
        line_ending: LineEnding,
        header_line: &str,
        boundary: Boundary,
    ) -> Self {
        let mut headers = Headers::new();
        if !header_line.is_empty() {
            headers.push_line(header_line.to_string());
        }
        let content_type = ContentType::multipart(subtype.as_str(), boundary.as_str());
        headers.push_line(format!("Content-Type: {content_type}"));
        headers.push_line(format!("Content-Transfer-Encoding: {encoding}"));

        Self {
            subtype,
            encoding,
            line_ending,
            boundary,
            headers,
            parts: Vec::new(),
        }
    }

    /// Creates a builder.
    #[must_use]
    pub fn builder() -> MultipartBuilder {
        MultipartBuilder::new()
    }

    /// Appends a section.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BoundaryCollision`] if the section contains the
    /// boundary, or [`Error::EnvelopeMismatch`] if an 8bit section is added
    /// to a 7bit message. The message is left unchanged on error.
    pub fn add(&mut self, section: impl Into<Section>) -> Result<()> {
        let section = section.into();

        if self.boundary.occurs_in(section.as_bytes()) {
            tracing::warn!(boundary = %self.boundary, len = section.len(), "Section contains boundary");
            return Err(Error::BoundaryCollision(self.boundary.to_string()));
        }

        if let Some(part) = section.encoding()
            && self.encoding == Encoding::SevenBit
            && part == Encoding::EightBit
        {
            tracing::warn!(%part, envelope = %self.encoding, "Section encoding wider than envelope");
            return Err(Error::EnvelopeMismatch {
                part,
                envelope: self.encoding,
            });
        }

        tracing::debug!(index = self.parts.len(), len = section.len(), "Added section");
        self.parts.push(section);
        Ok(())
    }

    /// Returns the assembled message.
    ///
    /// With `include_terminator` the closing delimiter is followed by a line
    /// terminator.
    #[must_use]
    pub fn message(&self, include_terminator: bool) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len(include_terminator));
        self.write_message(&mut out, include_terminator);
        out
    }

    /// Appends the assembled message to `out` and returns the bytes written.
    pub fn write_message(&self, out: &mut Vec<u8>, include_terminator: bool) -> usize {
        let start = out.len();
        let terminator = self.line_ending.as_bytes();
        let boundary = self.boundary.as_str().as_bytes();

        self.headers.write_to(out, self.line_ending);
        out.extend_from_slice(terminator);

        for part in &self.parts {
            out.extend_from_slice(b"--");
            out.extend_from_slice(boundary);
            out.extend_from_slice(terminator);
            out.extend_from_slice(part.as_bytes());
            if !self.line_ending.terminates(part.as_bytes()) {
                out.extend_from_slice(terminator);
            }
        }

        out.extend_from_slice(b"--");
        out.extend_from_slice(boundary);
        out.extend_from_slice(b"--");
        if include_terminator {
            out.extend_from_slice(terminator);
        }

        let written = out.len() - start;
        tracing::debug!(parts = self.parts.len(), len = written, "Assembled multipart message");
        written
    }

    /// Returns the assembled message as a section, for nesting in another multipart.
    #[must_use]
    pub fn to_section(&self, include_terminator: bool) -> Section {
        Section::with_encoding(self.message(include_terminator), self.encoding)
    }

    /// Returns the number of parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns true if no parts were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Returns the part at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PartOutOfRange`] if `index >= self.len()`.
    pub fn part(&self, index: usize) -> Result<&Section> {
        self.parts.get(index).ok_or(Error::PartOutOfRange {
            index,
            len: self.parts.len(),
        })
    }

    /// Returns all parts in insertion order.
    #[must_use]
    pub fn parts(&self) -> &[Section] {
        &self.parts
    }

    /// Returns the boundary.
    #[must_use]
    pub const fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    /// Returns the multipart subtype.
    #[must_use]
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// Returns the advertised transfer encoding.
    #[must_use]
    pub const fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Returns the line terminator.
    #[must_use]
    pub const fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Returns a human-readable summary for diagnostics.
    #[must_use]
    pub fn dump(&self) -> String {
        let sizes: Vec<String> = self.parts.iter().map(|p| p.len().to_string()).collect();
        format!(
            "multipart/{} boundary={:?} encoding={} line_ending={} parts={} sizes=[{}]",
            self.subtype,
            self.boundary.as_str(),
            self.encoding,
            self.line_ending,
            self.parts.len(),
            sizes.join(", ")
        )
    }

    fn encoded_len(&self, include_terminator: bool) -> usize {
        let terminator = self.line_ending.as_bytes().len();
        let delimiter = self.boundary.len() + 2 + terminator;
        let parts: usize = self
            .parts
            .iter()
            .map(|part| {
                let closing = if self.line_ending.terminates(part.as_bytes()) {
                    0
                } else {
                    terminator
                };
                delimiter + part.len() + closing
            })
            .sum();

        self.headers.encoded_len(self.line_ending)
            + terminator
            + parts
            + self.boundary.len()
            + 4
            + if include_terminator { terminator } else { 0 }
    }
}

impl Default for MultipartMessage {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes the assembled message with a final terminator.
///
/// Non-UTF-8 bytes in 8bit parts are replaced; use [`MultipartMessage::message`]
/// for the exact bytes.
impl fmt::Display for MultipartMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.message(true)))
    }
}
