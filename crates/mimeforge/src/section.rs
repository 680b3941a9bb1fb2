//! Single MIME sections.

use crate::config::{AutodetectPolicy, LineEnding};
use crate::content_type::ContentType;
use crate::encoding::{Encoder, Encoding};
use crate::error::{Error, Result};
use crate::header::Headers;

/// A fully formatted MIME section: headers, blank line, encoded body.
///
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    bytes: Vec<u8>,
    encoding: Option<Encoding>,
}

impl Section {
    /// Returns the raw section bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the section length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the section holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the transfer encoding of the body, if known.
    ///
    /// Sections wrapped from raw bytes report `None`.
    #[must_use]
    pub const fn encoding(&self) -> Option<Encoding> {
        self.encoding
    }

    /// Consumes the section and returns its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub(crate) const fn with_encoding(bytes: Vec<u8>, encoding: Encoding) -> Self {
        Self {
            bytes,
            encoding: Some(encoding),
        }
    }
}

impl From<Vec<u8>> for Section {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            encoding: None,
        }
    }
}

impl From<String> for Section {
    fn from(text: String) -> Self {
        text.into_bytes().into()
    }
}

impl From<&str> for Section {
    fn from(text: &str) -> Self {
        text.as_bytes().to_vec().into()
    }
}

impl AsRef<[u8]> for Section {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Builds one MIME section.
///
/// # Example
///
/// ```
/// use mimeforge::{Encoding, SectionBuilder};
///
/// let section = SectionBuilder::new()
///     .mime_type("text/plain")
///     .charset("utf-8")
///     .encoding(Encoding::QuotedPrintable)
///     .build("Héllo".as_bytes())
///     .unwrap();
///
/// assert_eq!(
///     section.as_bytes(),
///     b"Content-Type: text/plain; charset=utf-8\r\n\
///       Content-Transfer-Encoding: quoted-printable\r\n\
///       \r\n\
///       H=C3=A9llo\r\n"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct SectionBuilder {
    mime_type: String,
    encoding: Encoding,
    charset: String,
    name: String,
    extra_headers: Vec<String>,
    line_ending: LineEnding,
    policy: AutodetectPolicy,
}

impl SectionBuilder {
    /// Creates a builder for a `text/plain` section with autodetected encoding.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the MIME type; empty means `text/plain`. Multipart types are rejected at build time.
    #[must_use]
    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Sets the requested transfer encoding.
    #[must_use]
    pub const fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sets the `charset` parameter; also used as an autodetection hint.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Sets the `name` parameter.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds extra header lines, written verbatim after the standard ones.
    ///
    /// A multi-line value adds one header per non-blank line.
    #[must_use]
    pub fn header(mut self, lines: impl Into<String>) -> Self {
        self.extra_headers.push(lines.into());
        self
    }

    /// Sets the line terminator.
    #[must_use]
    pub const fn line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Sets the autodetection policy.
    #[must_use]
    pub const fn policy(mut self, policy: AutodetectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Encodes `content` and formats the section.
    ///
    /// # Errors
    ///
    /// Returns an error if the MIME type is invalid or multipart, an extra
    /// header is malformed, or the content does not fit an explicitly
    /// requested encoding.
    pub fn build(&self, content: &[u8]) -> Result<Section> {
        let mut content_type = if self.mime_type.trim().is_empty() {
            ContentType::text_plain()
        } else {
            ContentType::parse(&self.mime_type)?
        };

        if content_type.is_multipart() {
            return Err(Error::MultipartSection(self.mime_type.clone()));
        }

        if !self.charset.is_empty() {
            content_type.set_parameter("charset", self.charset.as_str());
        }
        if !self.name.is_empty() {
            content_type = content_type.with_name(&self.name);
        }

        let encoder = Encoder::new(self.line_ending).with_policy(self.policy);
        let requested = match self.encoding {
            // Non-text content with high-bit bytes goes base64
            Encoding::Auto if !content_type.is_text() => {
                match encoder.detect(content, &self.charset) {
                    detected if detected.is_identity() || content.is_ascii() => detected,
                    _ => Encoding::Base64,
                }
            }
            other => other,
        };
        let encoded = encoder.encode(content, &self.charset, requested)?;

        let mut headers = Headers::new();
        headers.add("Content-Type", &content_type)?;
        headers.add(
            "Content-Transfer-Encoding",
            encoded.encoding.header_token().unwrap_or("7bit"),
        )?;
        for entry in &self.extra_headers {
            headers.extend_raw(entry)?;
        }

        let terminator = self.line_ending.as_bytes();
        let mut bytes = Vec::with_capacity(
            headers.encoded_len(self.line_ending) + encoded.body.len() + terminator.len() * 2,
        );
        headers.write_to(&mut bytes, self.line_ending);
        bytes.extend_from_slice(terminator);
        bytes.extend_from_slice(&encoded.body);
        bytes.extend_from_slice(terminator);

        tracing::debug!(
            content_type = %content_type,
            encoding = %encoded.encoding,
            len = bytes.len(),
            "Built MIME section"
        );

        Ok(Section::with_encoding(bytes, encoded.encoding))
    }
}

/// Formats one MIME section with CRLF terminators.
///
/// `extra_headers` may hold several lines; each non-blank line is written
/// verbatim after `Content-Transfer-Encoding`.
///
/// # Errors
///
/// See [`SectionBuilder::build`].
pub fn section(
    content: &[u8],
    mime_type: &str,
    encoding: Encoding,
    charset: &str,
    name: &str,
    extra_headers: &str,
) -> Result<Section> {
    SectionBuilder::new()
        .mime_type(mime_type)
        .encoding(encoding)
        .charset(charset)
        .name(name)
        .header(extra_headers)
        .build(content)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn text(section: &Section) -> &str {
        std::str::from_utf8(section.as_bytes()).unwrap()
    }

    #[test]
    fn test_section_seven_bit() {
        let part = section(b"Hello", "text/plain", Encoding::SevenBit, "", "", "").unwrap();
        assert_eq!(
            text(&part),
            concat!(
                "Content-Type: text/plain\r\n",
                "Content-Transfer-Encoding: 7bit\r\n",
                "\r\n",
                "Hello\r\n"
            )
        );
        assert_eq!(part.encoding(), Some(Encoding::SevenBit));
    }

    #[test]
    fn test_section_defaults_to_text_plain() {
        let part = section(b"Hi", "", Encoding::Auto, "", "", "").unwrap();
        assert!(text(&part).starts_with("Content-Type: text/plain\r\n"));
        assert!(text(&part).contains("Content-Transfer-Encoding: 7bit\r\n"));
    }

    #[test]
    fn test_section_unset_encoding_header() {
        let part = section(b"Hi", "text/plain", Encoding::Unset, "", "", "").unwrap();
        assert!(text(&part).contains("Content-Transfer-Encoding: 7bit\r\n"));
    }

    #[test]
    fn test_section_quoted_printable() {
        let part = section(
            "Текст письма в уникоде".as_bytes(),
            "text/plain",
            Encoding::QuotedPrintable,
            "utf-8",
            "",
            "",
        )
        .unwrap();

        assert_eq!(
            text(&part),
            concat!(
                "Content-Type: text/plain; charset=utf-8\r\n",
                "Content-Transfer-Encoding: quoted-printable\r\n",
                "\r\n",
                "=D0=A2=D0=B5=D0=BA=D1=81=D1=82 =D0=BF=D0=B8=D1=81=D1=8C=D0=BC=D0=B0 =D0=B2 =\r\n",
                "=D1=83=D0=BD=D0=B8=D0=BA=D0=BE=D0=B4=D0=B5\r\n"
            )
        );
    }

    #[test]
    fn test_section_base64_with_name_and_headers() {
        let part = section(
            "Текст письма в уникоде".as_bytes(),
            "application/octet-stream",
            Encoding::Base64,
            "",
            "notes.bin",
            "Content-Disposition: attachment\r\nContent-ID: <notes@example.com>",
        )
        .unwrap();

        assert_eq!(
            text(&part),
            concat!(
                "Content-Type: application/octet-stream; name=\"notes.bin\"\r\n",
                "Content-Transfer-Encoding: base64\r\n",
                "Content-Disposition: attachment\r\n",
                "Content-ID: <notes@example.com>\r\n",
                "\r\n",
                "0KLQtdC60YHRgiDQv9C40YHRjNC80LAg0LIg0YPQvdC40LrQvtC00LU=\r\n"
            )
        );
    }

    #[test]
    fn test_section_auto_binary_type() {
        let part = SectionBuilder::new()
            .mime_type("image/png")
            .build(&[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'])
            .unwrap();
        assert_eq!(part.encoding(), Some(Encoding::Base64));

        // Mostly-text bytes in a non-text type still avoid quoted-printable
        let part = SectionBuilder::new()
            .mime_type("application/json")
            .build("{\"city\": \"Zürich\", \"country\": \"Switzerland\"}".as_bytes())
            .unwrap();
        assert_eq!(part.encoding(), Some(Encoding::Base64));

        let part = SectionBuilder::new()
            .mime_type("application/json")
            .build(b"{\"ok\": true}")
            .unwrap();
        assert_eq!(part.encoding(), Some(Encoding::SevenBit));
    }

    #[test]
    fn test_section_auto_ascii_non_text_not_base64() {
        let part = SectionBuilder::new()
            .mime_type("application/json")
            .build(&[b'a'; 1200])
            .unwrap();
        assert_eq!(part.encoding(), Some(Encoding::QuotedPrintable));

        let part = SectionBuilder::new()
            .mime_type("application/octet-stream")
            .build(b"abc\0def")
            .unwrap();
        assert_eq!(part.encoding(), Some(Encoding::QuotedPrintable));
        assert!(part.as_bytes().ends_with(b"\r\n\r\nabc=00def\r\n"));
    }

    #[test]
    fn test_section_body_ending_with_break() {
        let part = section(b"Hello\n", "text/plain", Encoding::SevenBit, "", "", "").unwrap();
        assert!(part.as_bytes().ends_with(b"\r\n\r\nHello\r\n\r\n"));
    }

    #[test]
    fn test_section_auto_text() {
        let part = SectionBuilder::new()
            .charset("utf-8")
            .build("Le café est très bon, merci beaucoup pour tout".as_bytes())
            .unwrap();
        assert_eq!(part.encoding(), Some(Encoding::QuotedPrintable));
    }

    #[test]
    fn test_section_rejects_multipart() {
        let err = section(b"x", "multipart/mixed", Encoding::Auto, "", "", "").unwrap_err();
        assert!(matches!(err, Error::MultipartSection(_)));
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_section_rejects_bad_input() {
        assert!(section(b"x", "not a type", Encoding::Auto, "", "", "").is_err());
        assert!(section(b"x", "text/plain", Encoding::Auto, "", "", "bogus").is_err());

        let err = section("é".as_bytes(), "text/plain", Encoding::SevenBit, "", "", "")
            .unwrap_err();
        assert!(err.is_encoding_error());
    }

    #[test]
    fn test_section_lf() {
        let part = SectionBuilder::new()
            .mime_type("text/plain")
            .encoding(Encoding::SevenBit)
            .line_ending(LineEnding::Lf)
            .build(b"a\r\nb")
            .unwrap();
        assert_eq!(
            text(&part),
            "Content-Type: text/plain\nContent-Transfer-Encoding: 7bit\n\na\nb\n"
        );
    }

    #[test]
    fn test_section_from_raw() {
        let part = Section::from("Content-Type: text/plain\r\n\r\nraw\r\n");
        assert_eq!(part.encoding(), None);
        assert_eq!(part.len(), 33);
        assert!(!part.is_empty());
    }
}
