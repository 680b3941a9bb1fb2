//! # mimeforge
//!
//! MIME content generation library (RFC 2045, 2046, 2047).
//!
//! ## Features
//!
//! - **Transfer encodings**: 7bit, 8bit, Quoted-Printable and Base64
//! - **Autodetection**: pick an encoding from the raw bytes with a tunable policy
//! - **Sections**: single MIME sections with headers and encoded body
//! - **Multipart**: mixed, alternative, related (or any subtype) with
//!   collision-checked boundaries
//!
//! This is a producer only; it does not parse messages and performs no I/O.
//!
//! ## Quick Start
//!
//! ```
//! use mimeforge::{MultipartMessage, SectionBuilder};
//!
//! let text = SectionBuilder::new()
//!     .mime_type("text/plain")
//!     .charset("utf-8")
//!     .build("Héllo, Wørld!".as_bytes())?;
//!
//! let attachment = SectionBuilder::new()
//!     .mime_type("application/octet-stream")
//!     .name("data.bin")
//!     .header("Content-Disposition: attachment")
//!     .build(&[0u8, 159, 146, 150])?;
//!
//! let mut message = MultipartMessage::builder().subtype("mixed").build()?;
//! message.add(text)?;
//! message.add(attachment)?;
//!
//! let body = message.message(true);
//! assert_eq!(message.len(), 2);
//! assert!(body.starts_with(b"MIME-Version: 1.0\r\n"));
//! # Ok::<(), mimeforge::Error>(())
//! ```
//!
//! ### Encoding Only
//!
//! ```
//! use mimeforge::{Encoding, encode};
//!
//! let encoded = encode(b"\x00\x01\x02binary", "", Encoding::Auto)?;
//! assert_eq!(encoded.encoding, Encoding::Base64);
//! # Ok::<(), mimeforge::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod boundary;
mod content_type;
mod error;
mod header;
mod multipart;
mod section;

pub mod config;
pub mod encoding;

pub use boundary::{
    Boundary, BoundaryGenerator, DEFAULT_BOUNDARY_LENGTH, MAX_BOUNDARY_LENGTH, MIN_BOUNDARY_LENGTH,
};
pub use config::{AutodetectPolicy, LineEnding};
pub use content_type::ContentType;
pub use encoding::{Encoded, Encoder, Encoding, encode};
pub use error::{Error, Incompatibility, Result};
pub use header::Headers;
pub use multipart::{DEFAULT_HEADER_LINE, DEFAULT_SUBTYPE, MultipartBuilder, MultipartMessage};
pub use section::{Section, SectionBuilder, section};
