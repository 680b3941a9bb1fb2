//! Integration tests for section building and multipart assembly.

#![allow(clippy::unwrap_used)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use proptest::prelude::*;

use mimeforge::{
    Encoding, Error, LineEnding, MultipartMessage, SectionBuilder, encode, section,
};

/// Reverses quoted-printable with CRLF hard breaks.
fn decode_quoted_printable(encoded: &[u8]) -> Vec<u8> {
    let text = std::str::from_utf8(encoded).unwrap();
    let lines: Vec<&str> = text.split("\r\n").collect();
    let mut out = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let (line, soft) = line
            .strip_suffix('=')
            .map_or((*line, false), |stripped| (stripped, true));

        let bytes = line.as_bytes();
        let mut pos = 0;
        while pos < bytes.len() {
            if bytes[pos] == b'=' {
                let hex = std::str::from_utf8(&bytes[pos + 1..pos + 3]).unwrap();
                out.push(u8::from_str_radix(hex, 16).unwrap());
                pos += 3;
            } else {
                out.push(bytes[pos]);
                pos += 1;
            }
        }

        if !soft && index + 1 < lines.len() {
            out.extend_from_slice(b"\r\n");
        }
    }

    out
}

fn delimiter_counts(message: &[u8], boundary: &str) -> (usize, usize) {
    let text = String::from_utf8_lossy(message);
    let open = format!("--{boundary}");
    let close = format!("--{boundary}--");
    let opens = text.split("\r\n").filter(|line| *line == open).count();
    let closes = text.split("\r\n").filter(|line| *line == close).count();
    (opens, closes)
}

#[test]
fn test_alternative_message() {
    let mut message = MultipartMessage::builder()
        .subtype("alternative")
        .boundary("B")
        .build()
        .unwrap();

    message
        .add(section(b"Hello", "text/plain", Encoding::SevenBit, "", "", "").unwrap())
        .unwrap();
    message
        .add(section(b"<p>Hello</p>", "text/html", Encoding::SevenBit, "", "", "").unwrap())
        .unwrap();

    let body = String::from_utf8(message.message(true)).unwrap();
    assert!(body.contains("Content-Type: multipart/alternative; boundary=\"B\"\r\n"));

    let plain = body.find("--B\r\nContent-Type: text/plain").unwrap();
    let html = body.find("--B\r\nContent-Type: text/html").unwrap();
    assert!(plain < html);
    assert!(body.ends_with("<p>Hello</p>\r\n--B--\r\n"));
    assert_eq!(delimiter_counts(body.as_bytes(), "B"), (2, 1));
}

#[test]
fn test_mixed_with_attachment() {
    let mut message = MultipartMessage::new();

    let text = SectionBuilder::new()
        .mime_type("text/plain")
        .charset("utf-8")
        .build("Текст письма в уникоде".as_bytes())
        .unwrap();
    let attachment = SectionBuilder::new()
        .mime_type("text/x-csrc")
        .name("example.c")
        .encoding(Encoding::Base64)
        .header("Content-Disposition: attachment; filename=\"example.c\"")
        .build(b"int main() { return 0; }")
        .unwrap();

    message.add(text).unwrap();
    message.add(attachment).unwrap();

    let body = String::from_utf8(message.message(true)).unwrap();
    let boundary = message.boundary().as_str();
    assert!(body.starts_with("MIME-Version: 1.0\r\n"));
    assert!(body.contains("Content-Transfer-Encoding: 8bit\r\n\r\n--"));
    assert!(body.contains(concat!(
        "Content-Type: text/x-csrc; name=\"example.c\"\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "Content-Disposition: attachment; filename=\"example.c\"\r\n",
        "\r\n",
        "aW50IG1haW4oKSB7IHJldHVybiAwOyB9\r\n"
    )));
    assert_eq!(delimiter_counts(body.as_bytes(), boundary), (2, 1));
}

#[test]
fn test_relaxed_line_endings() {
    let mut message = MultipartMessage::builder()
        .rfc2045(false)
        .boundary("B")
        .build()
        .unwrap();
    let part = SectionBuilder::new()
        .line_ending(LineEnding::Lf)
        .build(b"line one\r\nline two")
        .unwrap();
    message.add(part).unwrap();

    let body = message.message(true);
    assert!(!body.contains(&b'\r'));
    assert!(body.ends_with(b"line one\nline two\n--B--\n"));
}

#[test]
fn test_collision_then_retry_with_new_boundary() {
    let mut first = MultipartMessage::builder().boundary("=_fixed").build().unwrap();
    let raw = "Content-Type: text/plain\r\n\r\n--=_fixed\r\n";

    let err = first.add(raw).unwrap_err();
    assert!(matches!(err, Error::BoundaryCollision(ref b) if b == "=_fixed"));

    let mut second = MultipartMessage::new();
    second.add(raw).unwrap();
    assert_eq!(second.len(), 1);
}

#[test]
fn test_binary_quoted_printable_keeps_line_feeds() {
    let part = section(
        b"\x01\n\x02",
        "application/octet-stream",
        Encoding::QuotedPrintable,
        "",
        "",
        "",
    )
    .unwrap();
    assert!(part.as_bytes().ends_with(b"\r\n\r\n=01=0A=02\r\n"));
}

#[test]
fn test_seven_bit_request_is_not_promoted() {
    let err = section(
        "Hello, мир!".as_bytes(),
        "text/plain",
        Encoding::SevenBit,
        "utf-8",
        "",
        "",
    )
    .unwrap_err();
    assert!(err.is_encoding_error());

    let part = section(
        "Hello, мир!".as_bytes(),
        "text/plain",
        Encoding::Auto,
        "utf-8",
        "",
        "",
    )
    .unwrap();
    assert_ne!(part.encoding(), Some(Encoding::SevenBit));
}

proptest! {
    #[test]
    fn prop_base64_roundtrip(data in prop::collection::vec(any::<u8>(), 0..2000)) {
        let encoded = encode(&data, "", Encoding::Base64).unwrap();
        prop_assert_eq!(encoded.encoding, Encoding::Base64);

        let text = std::str::from_utf8(&encoded.body).unwrap();
        prop_assert!(text.split("\r\n").all(|line| line.len() <= 76));

        let joined: String = text.split("\r\n").collect();
        prop_assert_eq!(STANDARD.decode(joined).unwrap(), data);
    }

    #[test]
    fn prop_quoted_printable_roundtrip(data in prop::collection::vec(any::<u8>(), 0..2000)) {
        let encoded = encode(&data, "", Encoding::QuotedPrintable).unwrap();

        let text = std::str::from_utf8(&encoded.body).unwrap();
        prop_assert!(text.split("\r\n").all(|line| line.len() <= 76));
        prop_assert_eq!(decode_quoted_printable(&encoded.body), data);
    }

    #[test]
    fn prop_seven_bit_fidelity(text in "[ -~]{0,300}") {
        let encoded = encode(text.as_bytes(), "", Encoding::SevenBit).unwrap();
        prop_assert_eq!(encoded.body, text.into_bytes());
    }

    #[test]
    fn prop_ascii_never_base64(data in prop::collection::vec(0u8..0x80, 0..2000)) {
        let encoded = encode(&data, "", Encoding::Auto).unwrap();
        prop_assert_ne!(encoded.encoding, Encoding::Base64);
    }

    #[test]
    fn prop_ascii_section_never_base64(
        data in prop::collection::vec(0u8..0x80, 0..2000),
        mime_type in prop::sample::select(vec![
            "application/octet-stream",
            "application/json",
            "image/png",
            "text/plain",
            "",
        ]),
    ) {
        let part = section(&data, mime_type, Encoding::Auto, "", "", "").unwrap();
        prop_assert_ne!(part.encoding(), Some(Encoding::Base64));
    }

    #[test]
    fn prop_framing(bodies in prop::collection::vec("[a-zA-Z0-9 .,]{0,120}", 0..6)) {
        let mut message = MultipartMessage::new();
        for body in &bodies {
            message
                .add(section(body.as_bytes(), "text/plain", Encoding::Auto, "", "", "").unwrap())
                .unwrap();
        }

        let first = message.message(true);
        prop_assert_eq!(&first, &message.message(true));
        prop_assert_eq!(
            delimiter_counts(&first, message.boundary().as_str()),
            (bodies.len(), 1)
        );
        for index in 0..bodies.len() {
            prop_assert!(message.part(index).is_ok());
        }
        prop_assert!(message.part(bodies.len()).is_err());
    }
}
