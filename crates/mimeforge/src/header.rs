//! Ordered MIME header blocks.

use crate::config::LineEnding;
use crate::error::{Error, Result};
use std::fmt;

/// Ordered collection of header lines, written verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    lines: Vec<String>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `Name: value` header.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a valid field name or the value
    /// contains a line break.
    pub fn add(&mut self, name: &str, value: impl fmt::Display) -> Result<()> {
        if !is_field_name(name) {
            return Err(Error::InvalidHeader(name.to_string()));
        }

        let line = format!("{name}: {value}");
        if line.contains(['\r', '\n']) {
            return Err(Error::InvalidHeader(line));
        }

        self.lines.push(line);
        Ok(())
    }

    /// Adds one raw header line.
    ///
    /// Continuation lines (leading space or tab) are accepted as they are;
    /// any other line must look like `Name: value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is empty, contains a line break, or is
    /// neither a field nor a continuation of a previous line.
    pub fn push_raw(&mut self, line: &str) -> Result<()> {
        check_raw_line(line, self.lines.is_empty())?;
        self.lines.push(line.to_string());
        Ok(())
    }

    /// Adds a line this crate formatted from already validated parts.
    pub(crate) fn push_line(&mut self, line: String) {
        self.lines.push(line);
    }

    /// Adds every line of a raw header block, skipping blank lines.
    ///
    /// # Errors
    ///
    /// Returns an error if any line is rejected by [`Self::push_raw`].
    pub fn extend_raw(&mut self, block: &str) -> Result<()> {
        for line in block.lines().filter(|line| !line.trim().is_empty()) {
            self.push_raw(line)?;
        }
        Ok(())
    }

    /// Returns the number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if no lines were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns an iterator over the lines in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Appends every line, each followed by `line_ending`, to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>, line_ending: LineEnding) {
        for line in &self.lines {
            out.extend_from_slice(line.as_bytes());
            out.extend_from_slice(line_ending.as_bytes());
        }
    }

    /// Number of bytes [`Self::write_to`] appends.
    #[must_use]
    pub fn encoded_len(&self, line_ending: LineEnding) -> usize {
        self.lines
            .iter()
            .map(|line| line.len() + line_ending.as_bytes().len())
            .sum()
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            write!(f, "{line}\r\n")?;
        }
        Ok(())
    }
}

/// Validates a raw header line; a continuation cannot open a block.
pub(crate) fn check_raw_line(line: &str, first: bool) -> Result<()> {
    let continuation = line.starts_with([' ', '\t']);
    let field = line
        .split_once(':')
        .is_some_and(|(name, _)| is_field_name(name));

    let valid = !line.trim().is_empty()
        && !line.contains(['\r', '\n'])
        && (field || (continuation && !first));

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidHeader(line.to_string()))
    }
}

/// Checks RFC 5322 field name syntax (printable ASCII except `:`).
fn is_field_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| matches!(b, b'!'..=b'9' | b';'..=b'~'))
}
